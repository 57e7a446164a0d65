//! Clip-space culling and clipping.
//!
//! - [`frustum`]: cheap whole-triangle rejection, and the flag that decides
//!   whether a triangle has to be clipped at all.
//! - [`polygon`]: Sutherland-Hodgman clipping against the near and far planes,
//!   followed by re-triangulation of the resulting polygon.

pub mod frustum;
pub mod polygon;

pub use frustum::{classify, FrustumTest};
pub use polygon::{ClipPlane, PolygonClipper};
