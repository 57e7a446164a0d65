//! Whole-triangle rejection against the homogeneous clip volume.
//!
//! A triangle is only rejected when all three vertices lie beyond the *same*
//! plane. Triangles that merely straddle the near or far plane are flagged so
//! that [`super::polygon::PolygonClipper::clip_triangle`] can cut them;
//! straddling the side planes is left to the rasterizer's bounding-box clamp.
//!
//! ```text
//! -w <= x <= w
//! -w <= y <= w
//! -w <= z <= w
//! ```

use crate::math::Vec4;

/// Outcome of testing a triangle against the clip volume.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrustumTest {
    /// Entirely outside one plane, discard.
    Reject,
    /// Crosses the near or far plane, must be clipped before rasterizing.
    Clip,
    /// Between the near and far planes, rasterize as is.
    Accept,
}

/// Result of the Z test.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ZTest {
    /// All three vertices beyond the near plane, or all three beyond the far plane.
    pub outside: bool,
    /// At least one vertex violates either Z plane.
    pub needs_clipping: bool,
}

/// True when all three vertices are left of `x = -w` or all are right of `x = w`.
pub fn is_x_outside(v0: Vec4, v1: Vec4, v2: Vec4) -> bool {
    (-v0.w > v0.x && -v1.w > v1.x && -v2.w > v2.x) || (v0.x > v0.w && v1.x > v1.w && v2.x > v2.w)
}

/// True when all three vertices are below `y = -w` or all are above `y = w`.
pub fn is_y_outside(v0: Vec4, v1: Vec4, v2: Vec4) -> bool {
    (-v0.w > v0.y && -v1.w > v1.y && -v2.w > v2.y) || (v0.y > v0.w && v1.y > v1.w && v2.y > v2.w)
}

pub fn is_z_outside(v0: Vec4, v1: Vec4, v2: Vec4) -> ZTest {
    let beyond_near = |v: Vec4| -v.w > v.z;
    let beyond_far = |v: Vec4| v.z > v.w;

    let needs_clipping = beyond_near(v0)
        || beyond_near(v1)
        || beyond_near(v2)
        || beyond_far(v0)
        || beyond_far(v1)
        || beyond_far(v2);
    let outside = (beyond_near(v0) && beyond_near(v1) && beyond_near(v2))
        || (beyond_far(v0) && beyond_far(v1) && beyond_far(v2));

    ZTest {
        outside,
        needs_clipping,
    }
}

/// Classifies a clip-space triangle.
pub fn classify(v0: Vec4, v1: Vec4, v2: Vec4) -> FrustumTest {
    if is_x_outside(v0, v1, v2) || is_y_outside(v0, v1, v2) {
        return FrustumTest::Reject;
    }
    let z = is_z_outside(v0, v1, v2);
    if z.outside {
        FrustumTest::Reject
    } else if z.needs_clipping {
        FrustumTest::Clip
    } else {
        FrustumTest::Accept
    }
}
