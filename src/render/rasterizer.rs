//! Edge function-based triangle rasterization.
//!
//! The rasterizer iterates over the triangle's bounding box and tests each
//! pixel centre against three edge equations. Surviving pixels run through
//! depth and stencil tests, the pixel shader, blending and finally the
//! colour write.
//!
//! # Edge Function
//!
//! For an edge from point A to point B, the edge function at point P is:
//!
//! ```text
//! E(P) = (P.x - A.x) * (B.y - A.y) - (P.y - A.y) * (B.x - A.x)
//! ```
//!
//! E is linear in P, so moving one pixel right adds `B.y - A.y` and moving one
//! row down adds `-(B.x - A.x)`. The loop only ever adds these steps.
//!
//! # Perspective correction
//!
//! Input vertices are in screen space with `w = 1 / w_clip` and every
//! attribute already multiplied by that `w`. Screen-space barycentrics
//! therefore interpolate `attr / w_clip` and `1 / w_clip` linearly;
//! homogenising the interpolated position recovers `w_clip`, and multiplying
//! the interpolated attributes by it undoes the pre-multiplication.
//!
//! # References
//!
//! - Juan Pineda, "A Parallel Algorithm for Polygon Rasterization" (1988)
//! - Scratchapixel: <https://www.scratchapixel.com/lessons/3d-basic-rendering/rasterization-practical-implementation>

use super::framebuffer::FrameBuffer;
use super::ops::{pack_colour, unpack_colour};
use super::shader::PixelShader;
use super::state::{CullMode, DepthTestState, RasterState};
use crate::attribute::{Attribute, Vertex};
use crate::error::RenderError;
use crate::math::{max3, min3, Vec4};

/// Triangle rasterizer using the edge function algorithm.
pub struct EdgeFunctionRasterizer;

impl EdgeFunctionRasterizer {
    /// Creates a new edge function rasterizer instance.
    pub fn new() -> Self {
        EdgeFunctionRasterizer {}
    }

    /// Computes the edge function value for point P relative to edge (A -> B).
    ///
    /// The sign says which side of AB the point is on. For a triangle that
    /// was anticlockwise in NDC (before the Y flip), all three edges are
    /// positive inside it. Zero means P lies exactly on the edge.
    #[inline]
    pub fn edge_function(a: Vec4, b: Vec4, p: Vec4) -> f32 {
        (p.x - a.x) * (b.y - a.y) - (p.y - a.y) * (b.x - a.x)
    }

    /// Rasterizes one screen-space triangle into `buffer`.
    ///
    /// Returns the number of fragments whose colour was written.
    ///
    /// # Arguments
    /// * `triangle` - Screen-space vertices with W-premultiplied attributes
    /// * `state` - Cull, depth, stencil and blend configuration
    /// * `buffer` - Colour, depth and stencil storage
    /// * `shader` - Pixel shader; `Ok(None)` discards, `Err` aborts
    pub fn fill_triangle<P: PixelShader + ?Sized>(
        &self,
        triangle: &[Vertex; 3],
        state: &RasterState,
        buffer: &mut FrameBuffer,
        shader: &P,
    ) -> Result<usize, RenderError> {
        let [v0, v1, v2] = triangle;
        let (p0, p1, p2) = (v0.position, v1.position, v2.position);
        let width = buffer.width();
        let height = buffer.height();
        let max_x = width as f32 - 1.0;
        let max_y = height as f32 - 1.0;

        // ─────────────────────────────────────────────────────────────────────
        // Step 1: Bounding box, clamped to the surface
        // ─────────────────────────────────────────────────────────────────────
        let x_min = min3(p0.x, p1.x, p2.x);
        let x_max = max3(p0.x, p1.x, p2.x);
        let y_min = min3(p0.y, p1.y, p2.y);
        let y_max = max3(p0.y, p1.y, p2.y);

        if x_min > max_x || x_max < 0.0 || y_min > max_y || y_max < 0.0 {
            return Ok(0);
        }

        let x0 = x_min.max(0.0) as i32;
        let x1 = max_x.min(x_max.floor()) as i32;
        let y0 = y_min.max(0.0) as i32;
        let y1 = max_y.min(y_max.floor()) as i32;

        // ─────────────────────────────────────────────────────────────────────
        // Step 2: Signed area (2x triangle area)
        // ─────────────────────────────────────────────────────────────────────
        let signed_area = Self::edge_function(p0, p1, p2);
        if signed_area.abs() < f32::EPSILON || !signed_area.is_finite() {
            return Ok(0); // Degenerate triangle
        }
        let inv_area = 1.0 / signed_area;

        // Attribute triples in v0's key order, looked up once per triangle.
        let channels = v0
            .attributes
            .iter()
            .map(|(key, a0)| {
                let a1 = v1
                    .attributes
                    .get(key)
                    .ok_or_else(|| RenderError::MissingAttribute(key.to_string()))?;
                let a2 = v2
                    .attributes
                    .get(key)
                    .ok_or_else(|| RenderError::MissingAttribute(key.to_string()))?;
                Ok([*a0, *a1, *a2])
            })
            .collect::<Result<Vec<[Attribute; 3]>, RenderError>>()?;
        let mut fragment = Vertex {
            position: Vec4::ZERO,
            attributes: v0.attributes.clone(),
        };

        // ─────────────────────────────────────────────────────────────────────
        // Step 3: Edge functions at the first pixel centre, plus their steps
        // ─────────────────────────────────────────────────────────────────────
        let first_pixel = Vec4::new(x0 as f32 + 0.5, y0 as f32 + 0.5, 0.0, 0.0);
        let mut edges = [
            EdgeStepper::new(p1, p2, first_pixel),
            EdgeStepper::new(p2, p0, first_pixel),
            EdgeStepper::new(p0, p1, first_pixel),
        ];

        let mut written = 0;

        for y in y0..=y1 {
            for x in x0..=x1 {
                let w0 = edges[0].step_x();
                let w1 = edges[1].step_x();
                let w2 = edges[2].step_x();

                let inside_acw = w0 >= 0.0 && w1 >= 0.0 && w2 >= 0.0;
                let inside_cw = w0 <= 0.0 && w1 <= 0.0 && w2 <= 0.0;
                let covered = match state.cull_mode {
                    CullMode::AntiClockwise => inside_acw,
                    CullMode::Clockwise => inside_cw,
                    CullMode::None => inside_acw || inside_cw,
                };
                if !covered {
                    continue;
                }

                let b0 = w0 * inv_area;
                let b1 = w1 * inv_area;
                let b2 = w2 * inv_area;

                // Divide by the interpolated 1/w to get back to w_clip.
                let position = (p0 * b0 + p1 * b1 + p2 * b2).homogenise();
                let index = (y as u32 * width + x as u32) as usize;

                // ─────────────────────────────────────────────────────────
                // Depth and stencil tests
                // ─────────────────────────────────────────────────────────
                let depth_pass = state.depth.test == DepthTestState::Disable
                    || state
                        .depth
                        .function
                        .test(position.z + state.depth.bias, *buffer.depth_mut(index));

                let mut stencil_on_pass = None;
                if state.stencil.enable {
                    let stencil = &state.stencil;
                    let stored = buffer.stencil_mut(index);
                    let src = stencil.reference & stencil.function_mask;
                    let dst = *stored & stencil.function_mask;
                    let stencil_pass = stencil.function.test(src, dst);

                    if !stencil_pass {
                        *stored = stencil.fail.apply(src, *stored, stencil.write_mask);
                        continue;
                    }
                    if !depth_pass {
                        *stored = stencil.depth_fail.apply(src, *stored, stencil.write_mask);
                        continue;
                    }
                    stencil_on_pass = Some(stencil.pass.apply(src, *stored, stencil.write_mask));
                }
                if !depth_pass {
                    continue;
                }

                // ─────────────────────────────────────────────────────────
                // Attribute interpolation and shading
                // ─────────────────────────────────────────────────────────
                for (slot, [a0, a1, a2]) in fragment.attributes.values_mut().zip(&channels) {
                    *slot = a0
                        .scale(b0)
                        .try_add(&a1.scale(b1).try_add(&a2.scale(b2))?)?
                        .scale(position.w);
                }
                fragment.position = position;

                let Some(mut colour) = shader.shade(&fragment)? else {
                    continue;
                };

                if let Some(value) = stencil_on_pass {
                    *buffer.stencil_mut(index) = value;
                }
                if state.depth.test == DepthTestState::Enable {
                    *buffer.depth_mut(index) = position.z;
                }

                let target = buffer.colour_mut(index);
                if state.blend.enable {
                    colour = state.blend.blend(colour, unpack_colour(*target));
                }
                *target = pack_colour(colour);
                written += 1;
            }

            for edge in &mut edges {
                edge.step_y();
            }
        }

        Ok(written)
    }
}

impl Default for EdgeFunctionRasterizer {
    fn default() -> Self {
        Self::new()
    }
}

/// Incremental evaluation of one edge function across the bounding box.
struct EdgeStepper {
    current: f32,
    row_start: f32,
    step_x: f32,
    step_y: f32,
}

impl EdgeStepper {
    fn new(a: Vec4, b: Vec4, first_pixel: Vec4) -> Self {
        let step_x = b.y - a.y;
        let step_y = -(b.x - a.x);
        // Pre-subtract one step so the first step_x lands on the first pixel.
        let start = EdgeFunctionRasterizer::edge_function(a, b, first_pixel) - step_x;
        Self {
            current: start,
            row_start: start,
            step_x,
            step_y,
        }
    }

    #[inline]
    fn step_x(&mut self) -> f32 {
        self.current += self.step_x;
        self.current
    }

    #[inline]
    fn step_y(&mut self) {
        self.row_start += self.step_y;
        self.current = self.row_start;
    }
}
