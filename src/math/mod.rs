//! Vector and matrix types used throughout the pipeline.
//!
//! All matrices use the **row-vector** convention: a point is transformed
//! with `v * M`, translation lives in the last row, and transforms compose
//! left to right (`world * view * projection`).

pub mod mat4;
pub mod vec2;
pub mod vec3;
pub mod vec4;

pub use mat4::Mat4;
pub use vec2::Vec2;
pub use vec3::Vec3;
pub use vec4::Vec4;

/// Linear interpolation `(end - start) * alpha + start`.
#[inline]
pub fn lerp(start: f32, end: f32, alpha: f32) -> f32 {
    (end - start) * alpha + start
}

/// Smallest of three values.
#[inline]
pub fn min3(a: f32, b: f32, c: f32) -> f32 {
    a.min(b).min(c)
}

/// Largest of three values.
#[inline]
pub fn max3(a: f32, b: f32, c: f32) -> f32 {
    a.max(b).max(c)
}
