//! Programmable stages of the pipeline.
//!
//! The fixed-function parts (clipping, rasterization, depth/stencil, blending)
//! live in the viewport. Per-vertex and per-pixel work is delegated to
//! implementations of [`VertexShader`] and [`PixelShader`].
//!
//! # Architecture
//!
//! The vertex shader sees each source vertex once per triangle, as a deep
//! copy, and must leave its position in clip space. The pixel shader sees a
//! fragment whose position is in screen space and whose attributes have been
//! perspective-correctly interpolated.
//!
//! Plain closures work for both:
//!
//! ```ignore
//! let tint = |fragment: &Vertex| -> Result<Option<Vec4>, RenderError> {
//!     Ok(Some(Vec4::new(1.0, 0.5, 0.0, 1.0)))
//! };
//! ```

use crate::attribute::{Vertex, COLOUR, NORMAL, NORMAL0, TEXCOORD};
use crate::error::RenderError;
use crate::math::{Mat4, Vec4};
use crate::texture::Texture;

/// Matrices composed once per draw call.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Transforms {
    /// `world * view`
    pub world_view: Mat4,
    /// Inverse-transpose of `world_view`, for normals.
    pub world_view_inverse_transposed: Mat4,
    /// `world * view * projection`
    pub world_view_projection: Mat4,
}

impl Transforms {
    /// Composes the per-draw matrices.
    ///
    /// Fails if `world * view` is singular.
    pub fn new(world: Mat4, view: Mat4, projection: Mat4) -> Result<Self, RenderError> {
        let world_view = world * view;
        Ok(Self {
            world_view,
            world_view_inverse_transposed: world_view.transpose().inverse()?,
            world_view_projection: world_view * projection,
        })
    }
}

pub trait VertexShader {
    /// Transform one vertex. The returned position must be in clip space.
    fn shade(&self, transforms: &Transforms, vertex: Vertex) -> Result<Vertex, RenderError>;
}

pub trait PixelShader {
    /// Compute the colour of one fragment.
    ///
    /// `Ok(None)` discards the fragment: no colour, depth or stencil-pass write.
    /// `Err` aborts the whole draw call.
    fn shade(&self, fragment: &Vertex) -> Result<Option<Vec4>, RenderError>;
}

impl<F> VertexShader for F
where
    F: Fn(&Transforms, Vertex) -> Result<Vertex, RenderError>,
{
    fn shade(&self, transforms: &Transforms, vertex: Vertex) -> Result<Vertex, RenderError> {
        self(transforms, vertex)
    }
}

impl<F> PixelShader for F
where
    F: Fn(&Vertex) -> Result<Option<Vec4>, RenderError>,
{
    fn shade(&self, fragment: &Vertex) -> Result<Option<Vec4>, RenderError> {
        self(fragment)
    }
}

// ============ Vertex shaders ============

/// Leaves vertices untouched. Positions must already be in clip space.
pub struct PassThrough;

impl VertexShader for PassThrough {
    fn shade(&self, _transforms: &Transforms, vertex: Vertex) -> Result<Vertex, RenderError> {
        Ok(vertex)
    }
}

/// Transforms the position by world-view-projection.
pub struct Projective;

impl VertexShader for Projective {
    fn shade(&self, transforms: &Transforms, mut vertex: Vertex) -> Result<Vertex, RenderError> {
        vertex.position = vertex.position * transforms.world_view_projection;
        Ok(vertex)
    }
}

/// Projects the position and moves `NORMAL` into view space.
///
/// Also stores the view-space position under `NORMAL0` for
/// [`NormalPixelShader`]. Vertices need a `NORMAL` attribute.
pub struct NormalVertexShader;

impl VertexShader for NormalVertexShader {
    fn shade(&self, transforms: &Transforms, mut vertex: Vertex) -> Result<Vertex, RenderError> {
        let normal = vertex.attributes.get_vec3(NORMAL)?;
        let view_position = (vertex.position * transforms.world_view).to_vec3();

        vertex.attributes.insert(NORMAL0, view_position);
        vertex.attributes.insert(
            NORMAL,
            transforms
                .world_view_inverse_transposed
                .multiply_normal(normal),
        );
        vertex.position = vertex.position * transforms.world_view_projection;
        Ok(vertex)
    }
}

// ============ Pixel shaders ============

/// Outputs the interpolated `COLOUR` attribute, fully opaque.
pub struct VertexColour;

impl PixelShader for VertexColour {
    fn shade(&self, fragment: &Vertex) -> Result<Option<Vec4>, RenderError> {
        let colour = fragment.attributes.get_vec3(COLOUR)?;
        Ok(Some(Vec4::from_vec3(colour, 1.0)))
    }
}

pub struct White;

impl PixelShader for White {
    fn shade(&self, _fragment: &Vertex) -> Result<Option<Vec4>, RenderError> {
        Ok(Some(Vec4::ONE))
    }
}

/// Samples a texture at the interpolated `TEXCOORD`.
pub struct TexturePixelShader {
    pub texture: Texture,
}

impl TexturePixelShader {
    pub fn new(texture: Texture) -> Self {
        Self { texture }
    }
}

impl PixelShader for TexturePixelShader {
    fn shade(&self, fragment: &Vertex) -> Result<Option<Vec4>, RenderError> {
        let uv = fragment.attributes.get_vec2(TEXCOORD)?;
        Ok(Some(self.texture.sample(uv.x, uv.y)))
    }
}

/// Grey level from the angle between the normal and the view direction.
///
/// Pairs with [`NormalVertexShader`].
pub struct NormalPixelShader;

impl PixelShader for NormalPixelShader {
    fn shade(&self, fragment: &Vertex) -> Result<Option<Vec4>, RenderError> {
        let view_direction = (-fragment.attributes.get_vec3(NORMAL0)?).normalize();
        let normal = fragment.attributes.get_vec3(NORMAL)?.normalize();
        let intensity = normal.dot(view_direction).clamp(0.0, 1.0);
        Ok(Some(Vec4::splat(intensity)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::{Vec2, Vec3};
    use approx::assert_relative_eq;

    #[test]
    fn closures_are_shaders() {
        let discard = |_: &Vertex| -> Result<Option<Vec4>, RenderError> { Ok(None) };
        assert_eq!(PixelShader::shade(&discard, &Vertex::default()), Ok(None));

        let shift = |_: &Transforms, mut v: Vertex| -> Result<Vertex, RenderError> {
            v.position.x += 1.0;
            Ok(v)
        };
        let out = VertexShader::shade(&shift, &Transforms::default(), Vertex::default()).unwrap();
        assert_eq!(out.position.x, 1.0);
    }

    #[test]
    fn vertex_colour_requires_attribute() {
        let fragment = Vertex::default();
        assert!(matches!(
            VertexColour.shade(&fragment),
            Err(RenderError::MissingAttribute(_))
        ));

        let fragment = Vertex::default().with(COLOUR, Vec3::new(0.5, 0.25, 1.0));
        assert_eq!(
            VertexColour.shade(&fragment),
            Ok(Some(Vec4::new(0.5, 0.25, 1.0, 1.0)))
        );
    }

    #[test]
    fn normal_shaders_light_facing_surface() {
        let transforms = Transforms::new(
            Mat4::identity(),
            Mat4::translation(0.0, 0.0, -5.0),
            Mat4::perspective_fov(90.0, 0.1, 100.0),
        )
        .unwrap();
        let vertex = Vertex::new(Vec4::point(0.0, 0.0, 0.0)).with(NORMAL, Vec3::new(0.0, 0.0, 1.0));
        let shaded = NormalVertexShader.shade(&transforms, vertex).unwrap();

        let view = shaded.attributes.get_vec3(NORMAL0).unwrap();
        assert_relative_eq!(view.z, -5.0);

        let colour = NormalPixelShader.shade(&shaded).unwrap().unwrap();
        assert_relative_eq!(colour.x, 1.0, epsilon = 1e-6);
    }

    #[test]
    fn texture_shader_reads_texcoord() {
        let texture = Texture::from_rgba8(1, 1, &[0, 255, 0, 255]).unwrap();
        let shader = TexturePixelShader::new(texture);
        let fragment = Vertex::default().with(TEXCOORD, Vec2::new(0.5, 0.5));
        assert_eq!(
            shader.shade(&fragment),
            Ok(Some(Vec4::new(0.0, 1.0, 0.0, 1.0)))
        );
    }
}
