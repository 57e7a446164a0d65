//! Sutherland-Hodgman clipping against the near and far planes.
//!
//! Clipping happens in homogeneous clip space, before the perspective divide.
//! Only the depth planes are cut:
//!
//! ```text
//! Far:   z <= w
//! Near:  z >= -w
//! ```
//!
//! Each plane is one pass over an ordered vertex list. The far pass runs on
//! the input triangle, the near pass on whatever the far pass produced, so
//! every emitted vertex satisfies both constraints. Side planes are not cut
//! here; the rasterizer clamps the bounding box to the framebuffer instead.

use log::trace;

use crate::attribute::Vertex;
use crate::error::RenderError;
use crate::math::Vec4;

/// A depth plane of the canonical clip volume.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ClipPlane {
    /// Far plane: z <= w
    Far,
    /// Near plane: z >= -w
    Near,
}

impl ClipPlane {
    pub fn is_visible(&self, p: Vec4) -> bool {
        match self {
            Self::Far => p.z <= p.w,
            Self::Near => p.z >= -p.w,
        }
    }

    /// Edge parameter where the segment `prev -> cur` crosses this plane.
    ///
    /// `(w1 - z1) / (z2 - (w2 - w1) - z1)`, with w negated for the near plane.
    pub fn intersection(&self, prev: Vec4, cur: Vec4) -> f32 {
        let (w1, w2) = match self {
            Self::Far => (prev.w, cur.w),
            Self::Near => (-prev.w, -cur.w),
        };
        (w1 - prev.z) / (cur.z - (w2 - w1) - prev.z)
    }

    /// Clips a polygon against this plane.
    ///
    /// Edges are walked from the previous vertex to the current one, starting
    /// with the closing edge (last -> first). For a triangle that is the order
    /// V2->V0, V0->V1, V1->V2. Intersection vertices carry every attribute of
    /// the edge's first endpoint, interpolated at the same parameter as the
    /// position.
    pub fn clip(&self, polygon: &[Vertex]) -> Result<Vec<Vertex>, RenderError> {
        let mut output = Vec::with_capacity(polygon.len() + 1);
        let Some(mut prev) = polygon.last() else {
            return Ok(output);
        };

        for cur in polygon {
            let prev_visible = self.is_visible(prev.position);
            let cur_visible = self.is_visible(cur.position);

            if prev_visible != cur_visible {
                let alpha = self.intersection(prev.position, cur.position);
                output.push(prev.lerp(cur, alpha)?);
            }
            if cur_visible {
                output.push(cur.clone());
            }

            prev = cur;
        }

        Ok(output)
    }
}

/// Clips triangles against the near and far planes, far first.
pub struct PolygonClipper {
    planes: [ClipPlane; 2],
}

impl PolygonClipper {
    pub fn new() -> Self {
        Self {
            planes: [ClipPlane::Far, ClipPlane::Near],
        }
    }

    /// Clips one triangle and re-triangulates the result.
    ///
    /// - exactly 3 vertices survive: one triangle
    /// - more than 3: `N - 2` triangles, see [`triangulate`]
    /// - fewer than 3: the input triangle, unchanged
    ///
    /// The last case is also what a fully-outside triangle produces; the
    /// frustum test is expected to have rejected those already.
    pub fn clip_triangle(
        &self,
        v0: &Vertex,
        v1: &Vertex,
        v2: &Vertex,
    ) -> Result<Vec<[Vertex; 3]>, RenderError> {
        let mut polygon = vec![v0.clone(), v1.clone(), v2.clone()];

        for plane in &self.planes {
            if polygon.len() < 3 {
                break;
            }
            polygon = plane.clip(&polygon)?;
        }

        trace!("clipped triangle into {}-gon", polygon.len());

        match polygon.len() {
            3 => {
                let mut it = polygon.into_iter();
                match (it.next(), it.next(), it.next()) {
                    (Some(a), Some(b), Some(c)) => Ok(vec![[a, b, c]]),
                    _ => Ok(vec![[v0.clone(), v1.clone(), v2.clone()]]),
                }
            }
            n if n > 3 => Ok(triangulate(&polygon)),
            _ => Ok(vec![[v0.clone(), v1.clone(), v2.clone()]]),
        }
    }
}

impl Default for PolygonClipper {
    fn default() -> Self {
        Self::new()
    }
}

/// Index triples covering a convex `n`-gon with `n - 2` triangles.
///
/// The first triangle is `(0, 1, 2)`. After that the walk is anchored at
/// index 2 and the last index and closes in from both ends, alternately
/// advancing the front and retreating the back. Every triple keeps the
/// polygon's winding.
pub fn triangulate_indices(n: usize) -> Vec<[usize; 3]> {
    if n < 3 {
        return Vec::new();
    }

    let mut triangles = Vec::with_capacity(n - 2);
    triangles.push([0, 1, 2]);

    let mut i2 = 2;
    let mut i3 = n - 1;
    loop {
        if i3 == i2 {
            break;
        }
        let next = if i3 + 1 >= n { 0 } else { i3 + 1 };
        triangles.push([i2, i3, next]);
        i2 += 1;

        if i3 == i2 {
            break;
        }
        triangles.push([i2 - 1, i2, i3]);
        i3 -= 1;
    }

    triangles
}

/// Splits a convex polygon into triangles. Each triangle owns its vertices,
/// so vertices shared between triangles are cloned.
pub fn triangulate(polygon: &[Vertex]) -> Vec<[Vertex; 3]> {
    triangulate_indices(polygon.len())
        .into_iter()
        .map(|[a, b, c]| [polygon[a].clone(), polygon[b].clone(), polygon[c].clone()])
        .collect()
}
