//! A CPU software rasterizer.
//!
//! Triangles go through a programmable vertex stage, near/far clipping, an
//! edge-function rasterizer with depth, stencil and blend state, and a
//! programmable pixel stage, into a frame buffer owned by a [`Viewport`].
//! The optional `window` feature adds an SDL2 window to show the result.
//!
//! # Quick Start
//!
//! ```ignore
//! use softrast::prelude::*;
//!
//! let mut viewport = Viewport::new(ViewportConfig::default())?;
//! viewport.look_at(Vec3::new(0.0, 0.0, 5.0), Vec3::ZERO, Vec3::UP)?;
//!
//! let cube = Mesh::cube();
//! viewport.clear_frame_buffer(Vec3::ZERO);
//! viewport.draw_indexed_triangles(
//!     Mat4::identity(),
//!     &cube.vertices,
//!     &cube.indices,
//!     &Projective,
//!     &VertexColour,
//! )?;
//! ```

pub mod attribute;
pub mod clipper;
pub mod config;
pub mod error;
pub mod math;
pub mod mesh;
pub mod projection;
pub mod render;
pub mod texture;
pub mod transform;
#[cfg(feature = "window")]
pub mod window;

pub use config::ViewportConfig;
pub use error::RenderError;
pub use mesh::{LoadError, Mesh};
pub use projection::Projection;
pub use render::Viewport;
pub use transform::Transform;

/// Prelude module for convenient imports.
///
/// # Example
/// ```ignore
/// use softrast::prelude::*;
/// ```
pub mod prelude {
    // Vertices
    pub use crate::attribute::{Attribute, AttributeList, Vertex, COLOUR, NORMAL, NORMAL0, TEXCOORD};

    // Configuration
    pub use crate::config::ViewportConfig;
    pub use crate::projection::{Projection, ResolutionGate};
    pub use crate::render::state::{
        BlendEquation, BlendFunction, BlendState, Comparison, CullMode, DepthState,
        DepthTestState, RasterState, StencilOperation, StencilState,
    };

    // Errors
    pub use crate::error::RenderError;

    // Assets
    pub use crate::mesh::{LoadError, Mesh};
    pub use crate::texture::Texture;

    // Transform
    pub use crate::transform::Transform;

    // Math
    pub use crate::math::{Mat4, Vec2, Vec3, Vec4};

    // Rendering
    pub use crate::render::shader::{
        NormalPixelShader, NormalVertexShader, PassThrough, Projective, TexturePixelShader,
        VertexColour, White,
    };
    pub use crate::render::{DrawStats, FrameBuffer, PixelShader, Transforms, VertexShader, Viewport};

    // Window & Input
    #[cfg(feature = "window")]
    pub use crate::window::{FrameLimiter, Window, WindowEvent};
}

/// Module exposing internals for benchmarking. Not part of the stable API.
pub mod bench {
    pub use crate::clipper::{classify, PolygonClipper};
    pub use crate::render::{EdgeFunctionRasterizer, FrameBuffer};
}
