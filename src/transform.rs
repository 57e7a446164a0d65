//! Object placement for draw calls.
//!
//! A [`Transform`] keeps position, Euler rotation and scale separately and
//! composes them into the world matrix passed to
//! [`crate::render::Viewport::draw_indexed_triangles`].

use crate::math::{Mat4, Vec3};

/// Position, rotation (radians about X, Y, Z) and scale of one object.
///
/// Setters chain:
///
/// ```ignore
/// let mut t = Transform::new();
/// t.set_position_xyz(0.0, 0.0, -4.0).rotate_y(0.1).set_scale_uniform(2.0);
/// let world = t.to_matrix();
/// ```
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Transform {
    pub position: Vec3,
    pub rotation: Vec3,
    pub scale: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Vec3::ZERO,
            scale: Vec3::ONE,
        }
    }
}

impl Transform {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_position_xyz(&mut self, x: f32, y: f32, z: f32) -> &mut Self {
        self.position = Vec3::new(x, y, z);
        self
    }

    pub fn translate(&mut self, delta: Vec3) -> &mut Self {
        self.position = self.position + delta;
        self
    }

    pub fn set_rotation_xyz(&mut self, x: f32, y: f32, z: f32) -> &mut Self {
        self.rotation = Vec3::new(x, y, z);
        self
    }

    pub fn rotate_x(&mut self, angle: f32) -> &mut Self {
        self.rotation.x += angle;
        self
    }

    pub fn rotate_y(&mut self, angle: f32) -> &mut Self {
        self.rotation.y += angle;
        self
    }

    pub fn rotate_z(&mut self, angle: f32) -> &mut Self {
        self.rotation.z += angle;
        self
    }

    pub fn set_scale_uniform(&mut self, s: f32) -> &mut Self {
        self.scale = Vec3::splat(s);
        self
    }

    /// World matrix for row vectors (`v * M`).
    ///
    /// Scale is applied first, then rotations about X, Y and Z in that
    /// order, then translation.
    pub fn to_matrix(&self) -> Mat4 {
        Mat4::scaling(self.scale.x, self.scale.y, self.scale.z)
            * Mat4::rotation_x(self.rotation.x)
            * Mat4::rotation_y(self.rotation.y)
            * Mat4::rotation_z(self.rotation.z)
            * Mat4::translation(self.position.x, self.position.y, self.position.z)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::Vec4;
    use approx::assert_relative_eq;
    use std::f32::consts::FRAC_PI_2;

    #[test]
    fn default_is_identity() {
        assert!(Transform::default().to_matrix().is_identity());
    }

    #[test]
    fn setters_chain() {
        let mut t = Transform::new();
        t.set_position_xyz(1.0, 2.0, 3.0)
            .translate(Vec3::new(1.0, 0.0, 0.0))
            .rotate_y(0.5)
            .set_scale_uniform(2.0);

        assert_eq!(t.position, Vec3::new(2.0, 2.0, 3.0));
        assert_relative_eq!(t.rotation.y, 0.5);
        assert_eq!(t.scale, Vec3::splat(2.0));
    }

    #[test]
    fn scale_before_translate() {
        let mut t = Transform::new();
        t.set_scale_uniform(2.0).set_position_xyz(10.0, 0.0, 0.0);
        let p = Vec4::point(1.0, 0.0, 0.0) * t.to_matrix();
        assert_relative_eq!(p.x, 12.0);
        assert_relative_eq!(p.w, 1.0);
    }

    #[test]
    fn rotate_before_translate() {
        let mut t = Transform::new();
        t.rotate_z(FRAC_PI_2).translate(Vec3::new(0.0, 5.0, 0.0));
        let p = Vec4::point(1.0, 0.0, 0.0) * t.to_matrix();
        assert_relative_eq!(p.x, 0.0, epsilon = 1e-6);
        assert_relative_eq!(p.y, 6.0, epsilon = 1e-6);
    }

    #[test]
    fn rotation_order_x_then_y() {
        let mut t = Transform::new();
        t.set_rotation_xyz(FRAC_PI_2, 0.0, 0.0).rotate_y(FRAC_PI_2);
        // X takes +y to +z, then Y takes +z to +x.
        let p = Vec4::point(0.0, 1.0, 0.0) * t.to_matrix();
        assert_relative_eq!(p.x, 1.0, epsilon = 1e-6);
        assert_relative_eq!(p.y, 0.0, epsilon = 1e-6);
        assert_relative_eq!(p.z, 0.0, epsilon = 1e-6);
    }
}
