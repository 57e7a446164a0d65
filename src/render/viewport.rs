//! The viewport: projection, buffers and the per-draw-call pipeline.
//!
//! ```text
//! vertex shader -> W reject -> frustum test -> clip -> perspective divide
//!   -> screen mapping -> edge-function fill -> depth/stencil -> shade -> blend
//! ```
//!
//! A draw call borrows the viewport mutably, so drawing and reading the
//! buffers for presentation can never interleave.

use log::{debug, info, warn};

use super::framebuffer::FrameBuffer;
use super::rasterizer::EdgeFunctionRasterizer;
use super::shader::{PixelShader, Transforms, VertexShader};
use super::state::RasterState;
use crate::attribute::Vertex;
use crate::clipper::{classify, FrustumTest, PolygonClipper};
use crate::config::ViewportConfig;
use crate::error::RenderError;
use crate::math::{Mat4, Vec3};
use crate::projection::Projection;

/// Counters for one draw call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DrawStats {
    /// Index triples processed.
    pub triangles: usize,
    /// Discarded behind the eye or fully outside the frustum.
    pub culled: usize,
    /// Sent through the near/far clipper.
    pub clipped: usize,
    /// Triangles handed to the rasterizer, after clipping.
    pub rasterized: usize,
    pub fragments_written: usize,
}

pub struct Viewport {
    config: ViewportConfig,
    projection: Projection,
    /// Camera (view) transform, identity until [`Viewport::look_at`] or the
    /// caller sets it.
    pub transform: Mat4,
    /// Fragment-stage configuration used by subsequent draw calls.
    pub state: RasterState,
    transforms: Transforms,
    buffer: FrameBuffer,
    clipper: PolygonClipper,
    rasterizer: EdgeFunctionRasterizer,
}

impl Viewport {
    /// Builds the projection and allocates the buffers.
    ///
    /// Buffers start zeroed; call [`Viewport::clear_frame_buffer`] before the
    /// first frame so depth starts at the far plane.
    pub fn new(config: ViewportConfig) -> Result<Self, RenderError> {
        config
            .validate()
            .map_err(|e| RenderError::InvalidConfig(e.to_string()))?;

        let [width, height] = config.device;
        let projection = Projection::new(
            (config.aperture[0], config.aperture[1]),
            (width, height),
            config.focal_length,
            config.near,
            config.far,
            config.gate,
        );
        info!(
            "Viewport {}x{}: focal {}mm, fov {:.1}°, planes {}..{}, {:?}",
            width,
            height,
            config.focal_length,
            projection.field_of_view(),
            config.near,
            config.far,
            config.gate
        );

        Ok(Self {
            config,
            projection,
            transform: Mat4::identity(),
            state: config.state,
            transforms: Transforms::default(),
            buffer: FrameBuffer::new(width, height),
            clipper: PolygonClipper::new(),
            rasterizer: EdgeFunctionRasterizer::new(),
        })
    }

    pub fn width(&self) -> u32 {
        self.buffer.width()
    }

    pub fn height(&self) -> u32 {
        self.buffer.height()
    }

    pub fn config(&self) -> &ViewportConfig {
        &self.config
    }

    pub fn projection(&self) -> &Projection {
        &self.projection
    }

    /// Matrices of the most recent draw call.
    pub fn transforms(&self) -> &Transforms {
        &self.transforms
    }

    pub fn buffer(&self) -> &FrameBuffer {
        &self.buffer
    }

    /// Points the camera at `to` from `from`.
    ///
    /// The camera looks down its local -Z. Fails with
    /// [`RenderError::SingularMatrix`] when `from == to` or `up` is parallel
    /// to the view direction.
    pub fn look_at(&mut self, from: Vec3, to: Vec3, up: Vec3) -> Result<(), RenderError> {
        let forward = (from - to).normalize();
        let right = up.normalize().cross(forward).normalize();
        let up = forward.cross(right);

        let camera = Mat4::new([
            [right.x, right.y, right.z, 0.0],
            [up.x, up.y, up.z, 0.0],
            [forward.x, forward.y, forward.z, 0.0],
            [from.x, from.y, from.z, 1.0],
        ]);
        self.transform = camera.inverse()?;
        Ok(())
    }

    // ============ Clearing ============

    pub fn clear_colour_buffer(&mut self, colour: Vec3) {
        self.buffer.clear_colour(colour);
    }

    /// Resets every depth value to the far plane distance.
    pub fn clear_z_buffer(&mut self) {
        self.buffer.clear_depth(self.config.far);
    }

    pub fn clear_stencil_buffer(&mut self) {
        self.buffer.clear_stencil();
    }

    /// Clears colour, depth and stencil.
    pub fn clear_frame_buffer(&mut self, colour: Vec3) {
        self.clear_colour_buffer(colour);
        self.clear_z_buffer();
        self.clear_stencil_buffer();
    }

    // ============ Drawing ============

    /// Draws an indexed triangle list.
    ///
    /// # Arguments
    /// * `world` - Model-to-world transform for this call
    /// * `vertices` - Source vertices; never modified, each use gets a copy
    /// * `indices` - Flat triangle list, three indices per triangle
    /// * `vertex_shader` - Must output clip-space positions
    /// * `pixel_shader` - Colours fragments or discards them
    ///
    /// Fails on a malformed index buffer, a singular `world * view`, or any
    /// shader or attribute error. Triangles drawn before the failure stay in
    /// the buffers.
    pub fn draw_indexed_triangles<V, P>(
        &mut self,
        world: Mat4,
        vertices: &[Vertex],
        indices: &[u32],
        vertex_shader: &V,
        pixel_shader: &P,
    ) -> Result<DrawStats, RenderError>
    where
        V: VertexShader + ?Sized,
        P: PixelShader + ?Sized,
    {
        if indices.len() % 3 != 0 {
            return Err(RenderError::InvalidIndexBuffer(indices.len()));
        }

        self.transforms = Transforms::new(world, self.transform, self.projection.matrix())
            .inspect_err(|e| warn!("Skipping draw call: {e}"))?;
        let transforms = self.transforms;

        let fetch = |index: u32| -> Result<Vertex, RenderError> {
            vertices
                .get(index as usize)
                .cloned()
                .ok_or(RenderError::IndexOutOfRange {
                    index,
                    len: vertices.len(),
                })
        };

        let mut stats = DrawStats::default();

        for triangle in indices.chunks_exact(3) {
            stats.triangles += 1;

            let v0 = vertex_shader.shade(&transforms, fetch(triangle[0])?)?;
            let v1 = vertex_shader.shade(&transforms, fetch(triangle[1])?)?;
            let v2 = vertex_shader.shade(&transforms, fetch(triangle[2])?)?;
            // Now in clip space

            // Entirely behind the eye
            if v0.position.w <= 0.0 && v1.position.w <= 0.0 && v2.position.w <= 0.0 {
                stats.culled += 1;
                continue;
            }

            match classify(v0.position, v1.position, v2.position) {
                FrustumTest::Reject => {
                    stats.culled += 1;
                }
                FrustumTest::Accept => {
                    stats.fragments_written += self.rasterize([v0, v1, v2], pixel_shader)?;
                    stats.rasterized += 1;
                }
                FrustumTest::Clip => {
                    stats.clipped += 1;
                    for clipped in self.clipper.clip_triangle(&v0, &v1, &v2)? {
                        stats.fragments_written += self.rasterize(clipped, pixel_shader)?;
                        stats.rasterized += 1;
                    }
                }
            }
        }

        debug!(
            "Draw call: {} triangles, {} culled, {} clipped, {} rasterized, {} fragments",
            stats.triangles, stats.culled, stats.clipped, stats.rasterized, stats.fragments_written
        );

        Ok(stats)
    }

    /// Perspective divide, screen mapping and fill for one clip-space triangle.
    fn rasterize<P: PixelShader + ?Sized>(
        &mut self,
        mut triangle: [Vertex; 3],
        pixel_shader: &P,
    ) -> Result<usize, RenderError> {
        let width = self.buffer.width() as f32;
        let height = self.buffer.height() as f32;

        for vertex in &mut triangle {
            let mut p = vertex.position.homogenise();
            // Pre-multiply by 1/w_clip for perspective-correct interpolation
            for attribute in vertex.attributes.values_mut() {
                *attribute = attribute.scale(p.w);
            }
            // NDC to raster space, origin top-left
            p.x = (p.x + 1.0) * 0.5 * width;
            p.y = (1.0 - (p.y + 1.0) * 0.5) * height;
            vertex.position = p;
        }

        self.rasterizer
            .fill_triangle(&triangle, &self.state, &mut self.buffer, pixel_shader)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::Vec4;
    use crate::render::shader::{PassThrough, Projective, White};
    use approx::assert_relative_eq;

    fn viewport(width: u32, height: u32) -> Viewport {
        let config = ViewportConfig {
            device: [width, height],
            ..ViewportConfig::default()
        };
        let mut vp = Viewport::new(config).unwrap();
        vp.clear_frame_buffer(Vec3::ZERO);
        vp
    }

    fn clip_vertex(x: f32, y: f32, z: f32) -> Vertex {
        Vertex::new(Vec4::new(x, y, z, 1.0))
    }

    #[test]
    fn rejects_invalid_config() {
        let config = ViewportConfig {
            near: 0.0,
            ..ViewportConfig::default()
        };
        assert!(matches!(
            Viewport::new(config),
            Err(RenderError::InvalidConfig(_))
        ));
    }

    #[test]
    fn clear_z_uses_far_plane() {
        let vp = viewport(4, 4);
        assert_eq!(vp.buffer().depth_at(0, 0), Some(100.0));
    }

    #[test]
    fn index_buffer_must_be_triangles() {
        let mut vp = viewport(4, 4);
        let vertices = vec![clip_vertex(0.0, 0.0, 0.0); 3];
        let err = vp
            .draw_indexed_triangles(Mat4::identity(), &vertices, &[0, 1], &PassThrough, &White)
            .unwrap_err();
        assert_eq!(err, RenderError::InvalidIndexBuffer(2));

        let err = vp
            .draw_indexed_triangles(Mat4::identity(), &vertices, &[0, 1, 3], &PassThrough, &White)
            .unwrap_err();
        assert_eq!(err, RenderError::IndexOutOfRange { index: 3, len: 3 });
    }

    #[test]
    fn triangle_behind_eye_is_culled() {
        let mut vp = viewport(8, 8);
        let vertices = [
            Vertex::new(Vec4::new(-0.5, -0.5, 0.0, -1.0)),
            Vertex::new(Vec4::new(0.5, -0.5, 0.0, -1.0)),
            Vertex::new(Vec4::new(0.0, 0.5, 0.0, -1.0)),
        ];
        let stats = vp
            .draw_indexed_triangles(Mat4::identity(), &vertices, &[0, 1, 2], &PassThrough, &White)
            .unwrap();
        assert_eq!(stats.culled, 1);
        assert_eq!(stats.fragments_written, 0);
    }

    #[test]
    fn straddling_triangle_is_clipped() {
        let mut vp = viewport(16, 16);
        vp.state.cull_mode = crate::render::state::CullMode::None;
        let vertices = [
            clip_vertex(-0.5, -0.5, -3.0),
            clip_vertex(0.5, -0.5, 0.0),
            clip_vertex(0.0, 0.5, 0.0),
        ];
        let stats = vp
            .draw_indexed_triangles(Mat4::identity(), &vertices, &[0, 1, 2], &PassThrough, &White)
            .unwrap();
        assert_eq!(stats.clipped, 1);
        assert_eq!(stats.rasterized, 2);
        assert!(stats.fragments_written > 0);
    }

    #[test]
    fn look_at_builds_inverse_camera() {
        let mut vp = viewport(4, 4);
        let eye = Vec3::new(0.0, 0.0, 5.0);
        vp.look_at(eye, Vec3::ZERO, Vec3::UP).unwrap();

        // The eye maps to the view-space origin, the target straight ahead.
        let eye_view = Vec4::from_vec3(eye, 1.0) * vp.transform;
        assert_relative_eq!(eye_view.to_vec3().magnitude(), 0.0, epsilon = 1e-6);
        let target = Vec4::point(0.0, 0.0, 0.0) * vp.transform;
        assert_relative_eq!(target.z, -5.0, epsilon = 1e-6);
    }

    #[test]
    fn look_at_same_point_is_singular() {
        let mut vp = viewport(4, 4);
        let p = Vec3::new(1.0, 1.0, 1.0);
        assert!(matches!(
            vp.look_at(p, p, Vec3::UP),
            Err(RenderError::SingularMatrix { .. })
        ));
    }

    #[test]
    fn projected_triangle_in_front_of_camera_is_drawn() {
        let mut vp = viewport(32, 32);
        vp.look_at(Vec3::new(0.0, 0.0, 5.0), Vec3::ZERO, Vec3::UP)
            .unwrap();
        let vertices = [
            Vertex::new(Vec4::point(-1.0, -1.0, 0.0)),
            Vertex::new(Vec4::point(1.0, -1.0, 0.0)),
            Vertex::new(Vec4::point(0.0, 1.0, 0.0)),
        ];
        let stats = vp
            .draw_indexed_triangles(Mat4::identity(), &vertices, &[0, 1, 2], &Projective, &White)
            .unwrap();
        assert_eq!(stats.rasterized, 1);
        assert!(stats.fragments_written > 0);
        assert_eq!(vp.buffer().colour_at(16, 16), Some(0xFFFF_FFFF));
        // Stored depth is clip-space z, between the planes.
        let depth = vp.buffer().depth_at(16, 16).unwrap();
        assert!(depth > 0.1 && depth < 100.0);
    }
}
