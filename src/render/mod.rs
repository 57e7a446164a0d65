//! The rendering pipeline.
//!
//! [`Viewport`] owns the buffers and drives a draw call; the other modules are
//! its stages:
//!
//! - [`shader`]: programmable vertex and pixel stages
//! - [`rasterizer`]: edge-function fill with the per-fragment tests
//! - [`state`]: cull, depth, stencil and blend configuration
//! - [`ops`]: the comparison, stencil and blend operators behind that state
//! - [`framebuffer`]: colour, depth and stencil storage

pub mod framebuffer;
pub mod ops;
pub mod rasterizer;
pub mod shader;
pub mod state;
pub mod viewport;

pub use framebuffer::FrameBuffer;
pub use rasterizer::EdgeFunctionRasterizer;
pub use shader::{PixelShader, Transforms, VertexShader};
pub use state::RasterState;
pub use viewport::{DrawStats, Viewport};
