//! 4x4 transformation matrix using the row-vector convention.
//!
//! # Convention
//! - Vectors are **row vectors** on the left: `Vec4 * Mat4`
//! - Translation is stored in the **last row**
//! - Transforms chain **left-to-right**: `v * A * B` applies A first, then B
//!
//! # Example
//! ```ignore
//! let world_view = world * view;            // world applied first
//! let clip = position * (world_view * projection);
//! ```

use std::ops::Mul;

use super::vec3::Vec3;
use super::vec4::Vec4;
use crate::error::RenderError;

/// Determinants with a magnitude below this are treated as singular.
pub const SINGULAR_EPSILON: f32 = 10.0 * f32::EPSILON;

/// 4x4 matrix stored as `data[row][col]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Mat4 {
    data: [[f32; 4]; 4],
}

impl Default for Mat4 {
    fn default() -> Self {
        Self::identity()
    }
}

impl Mat4 {
    pub const IDENTITY: Mat4 = Mat4 {
        data: [
            [1.0, 0.0, 0.0, 0.0],
            [0.0, 1.0, 0.0, 0.0],
            [0.0, 0.0, 1.0, 0.0],
            [0.0, 0.0, 0.0, 1.0],
        ],
    };

    pub const fn new(data: [[f32; 4]; 4]) -> Self {
        Mat4 { data }
    }

    pub const fn identity() -> Self {
        Self::IDENTITY
    }

    /// Symmetric perspective projection from an angle of view in degrees.
    ///
    /// Maps view-space depth into `[0, far*near/(far-near)]` before the divide
    /// and sets `w = -z`, so the camera looks down negative Z.
    pub fn perspective_fov(angle_of_view: f32, near: f32, far: f32) -> Self {
        let scale = 1.0 / (angle_of_view * 0.5 * std::f32::consts::PI / 180.0).tan();
        Mat4::new([
            [scale, 0.0, 0.0, 0.0],
            [0.0, scale, 0.0, 0.0],
            [0.0, 0.0, -far / (far - near), -1.0],
            [0.0, 0.0, -far * near / (far - near), 0.0],
        ])
    }

    /// Off-center perspective frustum from explicit near-plane extents.
    ///
    /// Used for apertures whose aspect ratio differs from the device.
    pub fn frustum(left: f32, right: f32, top: f32, bottom: f32, near: f32, far: f32) -> Self {
        Mat4::new([
            [2.0 * near / (right - left), 0.0, 0.0, 0.0],
            [0.0, 2.0 * near / (top - bottom), 0.0, 0.0],
            [
                (right + left) / (right - left),
                (top + bottom) / (top - bottom),
                -(far + near) / (far - near),
                -1.0,
            ],
            [0.0, 0.0, -2.0 * far * near / (far - near), 0.0],
        ])
    }

    /// Creates a translation matrix (translation in the last row).
    pub fn translation(x: f32, y: f32, z: f32) -> Self {
        Mat4::new([
            [1.0, 0.0, 0.0, 0.0],
            [0.0, 1.0, 0.0, 0.0],
            [0.0, 0.0, 1.0, 0.0],
            [x, y, z, 1.0],
        ])
    }

    /// Creates a scale matrix.
    pub fn scaling(x: f32, y: f32, z: f32) -> Self {
        Mat4::new([
            [x, 0.0, 0.0, 0.0],
            [0.0, y, 0.0, 0.0],
            [0.0, 0.0, z, 0.0],
            [0.0, 0.0, 0.0, 1.0],
        ])
    }

    /// Creates a rotation matrix around the X axis.
    pub fn rotation_x(angle: f32) -> Self {
        let c = angle.cos();
        let s = angle.sin();
        Mat4::new([
            [1.0, 0.0, 0.0, 0.0],
            [0.0, c, s, 0.0],
            [0.0, -s, c, 0.0],
            [0.0, 0.0, 0.0, 1.0],
        ])
    }

    /// Creates a rotation matrix around the Y axis.
    pub fn rotation_y(angle: f32) -> Self {
        let c = angle.cos();
        let s = angle.sin();
        Mat4::new([
            [c, 0.0, -s, 0.0],
            [0.0, 1.0, 0.0, 0.0],
            [s, 0.0, c, 0.0],
            [0.0, 0.0, 0.0, 1.0],
        ])
    }

    /// Creates a rotation matrix around the Z axis.
    pub fn rotation_z(angle: f32) -> Self {
        let c = angle.cos();
        let s = angle.sin();
        Mat4::new([
            [c, s, 0.0, 0.0],
            [-s, c, 0.0, 0.0],
            [0.0, 0.0, 1.0, 0.0],
            [0.0, 0.0, 0.0, 1.0],
        ])
    }

    // ============ In-place composition ============
    //
    // Each helper post-multiplies: `self = self * T`.

    pub fn translate(&mut self, x: f32, y: f32, z: f32) -> &mut Self {
        *self = *self * Mat4::translation(x, y, z);
        self
    }

    pub fn scale(&mut self, x: f32, y: f32, z: f32) -> &mut Self {
        *self = *self * Mat4::scaling(x, y, z);
        self
    }

    pub fn rotate_x(&mut self, theta: f32) -> &mut Self {
        *self = *self * Mat4::rotation_x(theta);
        self
    }

    pub fn rotate_y(&mut self, theta: f32) -> &mut Self {
        *self = *self * Mat4::rotation_y(theta);
        self
    }

    pub fn rotate_z(&mut self, theta: f32) -> &mut Self {
        *self = *self * Mat4::rotation_z(theta);
        self
    }

    /// Rotates about `pivot`: post-multiplies `T(-pivot) * Rx * T(pivot)`.
    pub fn rotate_x_about(&mut self, theta: f32, pivot: Vec3) -> &mut Self {
        *self = *self * Self::about(Mat4::rotation_x(theta), pivot);
        self
    }

    pub fn rotate_y_about(&mut self, theta: f32, pivot: Vec3) -> &mut Self {
        *self = *self * Self::about(Mat4::rotation_y(theta), pivot);
        self
    }

    pub fn rotate_z_about(&mut self, theta: f32, pivot: Vec3) -> &mut Self {
        *self = *self * Self::about(Mat4::rotation_z(theta), pivot);
        self
    }

    fn about(rotation: Mat4, pivot: Vec3) -> Mat4 {
        Mat4::translation(-pivot.x, -pivot.y, -pivot.z)
            * rotation
            * Mat4::translation(pivot.x, pivot.y, pivot.z)
    }

    // ============ Properties ============

    pub fn is_identity(&self) -> bool {
        *self == Self::IDENTITY
    }

    /// True when the last column is `(0, 0, 0, 1)`.
    pub fn is_affine(&self) -> bool {
        let m = &self.data;
        m[0][3] == 0.0 && m[1][3] == 0.0 && m[2][3] == 0.0 && m[3][3] == 1.0
    }

    pub fn transpose(&self) -> Self {
        let m = &self.data;
        Mat4::new([
            [m[0][0], m[1][0], m[2][0], m[3][0]],
            [m[0][1], m[1][1], m[2][1], m[3][1]],
            [m[0][2], m[1][2], m[2][2], m[3][2]],
            [m[0][3], m[1][3], m[2][3], m[3][3]],
        ])
    }

    pub fn determinant(&self) -> f32 {
        if self.is_identity() {
            return 1.0;
        }
        if self.is_affine() {
            return self.affine_determinant();
        }
        let m = &self.data;
        let y = Minors::upper(m);
        let z30 = m[1][1] * y.y02 - m[2][1] * y.y01 - m[0][1] * y.y12;
        let z20 = m[0][1] * y.y13 - m[1][1] * y.y03 + m[3][1] * y.y01;
        let z10 = m[2][1] * y.y03 - m[3][1] * y.y02 - m[0][1] * y.y23;
        let z00 = m[1][1] * y.y23 - m[2][1] * y.y13 + m[3][1] * y.y12;
        m[3][0] * z30 + m[2][0] * z20 + m[1][0] * z10 + m[0][0] * z00
    }

    fn affine_determinant(&self) -> f32 {
        let m = &self.data;
        let z20 = m[0][1] * m[1][2] - m[1][1] * m[0][2];
        let z10 = m[2][1] * m[0][2] - m[0][1] * m[2][2];
        let z00 = m[1][1] * m[2][2] - m[2][1] * m[1][2];
        m[2][0] * z20 + m[1][0] * z10 + m[0][0] * z00
    }

    /// Computes the inverse.
    ///
    /// Identity returns itself, affine matrices take the cheaper 3x3 cofactor
    /// path, anything else the full 4x4 expansion. Fails with
    /// [`RenderError::SingularMatrix`] when `|det| < 10 * f32::EPSILON`.
    pub fn inverse(&self) -> Result<Mat4, RenderError> {
        if self.is_identity() {
            return Ok(*self);
        }
        if self.is_affine() {
            return self.affine_inverse();
        }

        let m = &self.data;

        // 2x2 determinants of the last two columns
        let y = Minors::upper(m);

        // 3x3 cofactors for the first column
        let z30 = m[1][1] * y.y02 - m[2][1] * y.y01 - m[0][1] * y.y12;
        let z20 = m[0][1] * y.y13 - m[1][1] * y.y03 + m[3][1] * y.y01;
        let z10 = m[2][1] * y.y03 - m[3][1] * y.y02 - m[0][1] * y.y23;
        let z00 = m[1][1] * y.y23 - m[2][1] * y.y13 + m[3][1] * y.y12;

        let det = m[3][0] * z30 + m[2][0] * z20 + m[1][0] * z10 + m[0][0] * z00;
        if det.abs() < SINGULAR_EPSILON {
            return Err(RenderError::SingularMatrix { determinant: det });
        }

        // 3x3 cofactors for the second column
        let z31 = m[0][0] * y.y12 - m[1][0] * y.y02 + m[2][0] * y.y01;
        let z21 = m[1][0] * y.y03 - m[3][0] * y.y01 - m[0][0] * y.y13;
        let z11 = m[0][0] * y.y23 - m[2][0] * y.y03 + m[3][0] * y.y02;
        let z01 = m[2][0] * y.y13 - m[3][0] * y.y12 - m[1][0] * y.y23;

        // 2x2 determinants of the first two columns
        let y = Minors::lower(m);

        // 3x3 cofactors for the last two columns
        let z33 = m[0][2] * y.y12 - m[1][2] * y.y02 + m[2][2] * y.y01;
        let z23 = m[1][2] * y.y03 - m[3][2] * y.y01 - m[0][2] * y.y13;
        let z13 = m[0][2] * y.y23 - m[2][2] * y.y03 + m[3][2] * y.y02;
        let z03 = m[2][2] * y.y13 - m[3][2] * y.y12 - m[1][2] * y.y23;
        let z32 = m[1][3] * y.y02 - m[2][3] * y.y01 - m[0][3] * y.y12;
        let z22 = m[0][3] * y.y13 - m[1][3] * y.y03 + m[3][3] * y.y01;
        let z12 = m[2][3] * y.y03 - m[3][3] * y.y02 - m[0][3] * y.y23;
        let z02 = m[1][3] * y.y23 - m[2][3] * y.y13 + m[3][3] * y.y12;

        let rcp = 1.0 / det;
        Ok(Mat4::new([
            [z00 * rcp, z10 * rcp, z20 * rcp, z30 * rcp],
            [z01 * rcp, z11 * rcp, z21 * rcp, z31 * rcp],
            [z02 * rcp, z12 * rcp, z22 * rcp, z32 * rcp],
            [z03 * rcp, z13 * rcp, z23 * rcp, z33 * rcp],
        ]))
    }

    fn affine_inverse(&self) -> Result<Mat4, RenderError> {
        let m = &self.data;

        let z20 = m[0][1] * m[1][2] - m[1][1] * m[0][2];
        let z10 = m[2][1] * m[0][2] - m[0][1] * m[2][2];
        let z00 = m[1][1] * m[2][2] - m[2][1] * m[1][2];
        let det = m[2][0] * z20 + m[1][0] * z10 + m[0][0] * z00;
        if det.abs() < SINGULAR_EPSILON {
            return Err(RenderError::SingularMatrix { determinant: det });
        }

        let z21 = m[1][0] * m[0][2] - m[0][0] * m[1][2];
        let z11 = m[0][0] * m[2][2] - m[2][0] * m[0][2];
        let z01 = m[2][0] * m[1][2] - m[1][0] * m[2][2];

        let y = Minors::lower(m);

        let z23 = m[1][2] * y.y03 - m[3][2] * y.y01 - m[0][2] * y.y13;
        let z13 = m[0][2] * y.y23 - m[2][2] * y.y03 + m[3][2] * y.y02;
        let z03 = m[2][2] * y.y13 - m[3][2] * y.y12 - m[1][2] * y.y23;
        let z22 = y.y01;
        let z12 = -y.y02;
        let z02 = y.y12;

        let rcp = 1.0 / det;
        Ok(Mat4::new([
            [z00 * rcp, z10 * rcp, z20 * rcp, 0.0],
            [z01 * rcp, z11 * rcp, z21 * rcp, 0.0],
            [z02 * rcp, z12 * rcp, z22 * rcp, 0.0],
            [z03 * rcp, z13 * rcp, z23 * rcp, 1.0],
        ]))
    }

    /// Transforms a direction by the upper-left 3x3 only, ignoring translation.
    ///
    /// Pair with the inverse-transpose of a transform to keep normals
    /// perpendicular under non-uniform scale.
    pub fn multiply_normal(&self, v: Vec3) -> Vec3 {
        let m = &self.data;
        Vec3::new(
            v.x * m[0][0] + v.y * m[1][0] + v.z * m[2][0],
            v.x * m[0][1] + v.y * m[1][1] + v.z * m[2][1],
            v.x * m[0][2] + v.y * m[1][2] + v.z * m[2][2],
        )
    }

    /// Access element at [row][col].
    #[inline]
    pub fn get(&self, row: usize, col: usize) -> f32 {
        self.data[row][col]
    }

    /// Set element at [row][col].
    #[inline]
    pub fn set(&mut self, row: usize, col: usize, value: f32) {
        self.data[row][col] = value;
    }

    pub fn rows(&self) -> &[[f32; 4]; 4] {
        &self.data
    }
}

/// The six 2x2 determinants formed by pairing rows within two columns.
struct Minors {
    y01: f32,
    y02: f32,
    y03: f32,
    y12: f32,
    y13: f32,
    y23: f32,
}

impl Minors {
    /// Minors of columns 2 and 3.
    fn upper(m: &[[f32; 4]; 4]) -> Self {
        Self::of_columns(m, 2, 3)
    }

    /// Minors of columns 0 and 1.
    fn lower(m: &[[f32; 4]; 4]) -> Self {
        Self::of_columns(m, 0, 1)
    }

    fn of_columns(m: &[[f32; 4]; 4], a: usize, b: usize) -> Self {
        let pair = |i: usize, j: usize| m[i][a] * m[j][b] - m[j][a] * m[i][b];
        Self {
            y01: pair(0, 1),
            y02: pair(0, 2),
            y03: pair(0, 3),
            y12: pair(1, 2),
            y13: pair(1, 3),
            y23: pair(2, 3),
        }
    }
}

/// Matrix multiplication: Mat4 * Mat4.
///
/// With row vectors, `v * (A * B)` applies A first, then B. Identity operands
/// return the other side unchanged.
impl Mul<Mat4> for Mat4 {
    type Output = Mat4;

    fn mul(self, rhs: Mat4) -> Self::Output {
        if self.is_identity() {
            return rhs;
        }
        if rhs.is_identity() {
            return self;
        }

        let mut result = [[0.0f32; 4]; 4];
        for (row, out) in result.iter_mut().enumerate() {
            for (col, cell) in out.iter_mut().enumerate() {
                *cell = self.data[row][0] * rhs.data[0][col]
                    + self.data[row][1] * rhs.data[1][col]
                    + self.data[row][2] * rhs.data[2][col]
                    + self.data[row][3] * rhs.data[3][col];
            }
        }

        Mat4::new(result)
    }
}

impl Mul<f32> for Mat4 {
    type Output = Mat4;

    fn mul(self, rhs: f32) -> Self::Output {
        let mut data = self.data;
        data.iter_mut().flatten().for_each(|v| *v *= rhs);
        Mat4::new(data)
    }
}

/// Transform a row vector: Vec4 * Mat4.
impl Mul<Mat4> for Vec4 {
    type Output = Vec4;

    fn mul(self, m: Mat4) -> Self::Output {
        let d = &m.data;
        Vec4::new(
            self.x * d[0][0] + self.y * d[1][0] + self.z * d[2][0] + self.w * d[3][0],
            self.x * d[0][1] + self.y * d[1][1] + self.z * d[2][1] + self.w * d[3][1],
            self.x * d[0][2] + self.y * d[1][2] + self.z * d[2][2] + self.w * d[3][2],
            self.x * d[0][3] + self.y * d[1][3] + self.z * d[2][3] + self.w * d[3][3],
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn assert_mat_eq(a: &Mat4, b: &Mat4, epsilon: f32) {
        for row in 0..4 {
            for col in 0..4 {
                assert_relative_eq!(a.get(row, col), b.get(row, col), epsilon = epsilon);
            }
        }
    }

    fn general_matrix() -> Mat4 {
        Mat4::new([
            [2.0, 0.5, 1.0, 0.25],
            [0.0, 3.0, -1.0, 0.5],
            [1.0, 0.0, 4.0, -0.75],
            [0.5, -2.0, 1.5, 2.0],
        ])
    }

    fn affine_matrix() -> Mat4 {
        let mut m = Mat4::identity();
        m.scale(2.0, 0.5, 3.0)
            .rotate_x(0.3)
            .rotate_y(-1.1)
            .rotate_z(0.7)
            .translate(4.0, -2.0, 9.0);
        m
    }

    #[test]
    fn identity_short_circuits_multiplication() {
        let m = general_matrix();
        assert_eq!(Mat4::identity() * m, m);
        assert_eq!(m * Mat4::identity(), m);
    }

    #[test]
    fn general_inverse_round_trips() {
        let m = general_matrix();
        assert!(!m.is_affine());
        let inv = m.inverse().unwrap();
        assert_mat_eq(&(m * inv), &Mat4::identity(), 1e-5);
        assert_mat_eq(&inv.inverse().unwrap(), &m, 1e-4);
    }

    #[test]
    fn affine_inverse_round_trips() {
        let m = affine_matrix();
        assert!(m.is_affine());
        let inv = m.inverse().unwrap();
        assert!(inv.is_affine());
        assert_mat_eq(&(m * inv), &Mat4::identity(), 1e-5);
        assert_mat_eq(&inv.inverse().unwrap(), &m, 1e-4);
    }

    #[test]
    fn affine_and_general_determinants_agree() {
        let m = affine_matrix();
        // Perturb the last column slightly so the general path is taken.
        let mut general = m;
        general.set(0, 3, 1e-3);
        assert_relative_eq!(m.determinant(), 2.0 * 0.5 * 3.0, epsilon = 1e-4);
        assert_relative_eq!(general.determinant(), m.determinant(), epsilon = 1e-1);
    }

    #[test]
    fn singular_matrix_fails() {
        let singular = Mat4::scaling(1.0, 0.0, 1.0);
        assert!(matches!(
            singular.inverse(),
            Err(RenderError::SingularMatrix { .. })
        ));

        let mut rows = general_matrix();
        for col in 0..4 {
            rows.set(3, col, rows.get(0, col) * 2.0);
        }
        assert!(matches!(
            rows.inverse(),
            Err(RenderError::SingularMatrix { .. })
        ));
    }

    #[test]
    fn translation_lives_in_last_row() {
        let p = Vec4::point(1.0, 2.0, 3.0) * Mat4::translation(10.0, 20.0, 30.0);
        assert_eq!(p, Vec4::point(11.0, 22.0, 33.0));
    }

    #[test]
    fn composition_applies_left_first() {
        // Scale then translate: (1,0,0) -> (2,0,0) -> (3,0,0)
        let m = Mat4::scaling(2.0, 2.0, 2.0) * Mat4::translation(1.0, 0.0, 0.0);
        let p = Vec4::point(1.0, 0.0, 0.0) * m;
        assert_eq!(p, Vec4::point(3.0, 0.0, 0.0));
    }

    #[test]
    fn pivot_rotation_keeps_pivot_fixed() {
        let pivot = Vec3::new(1.0, 2.0, 3.0);
        let mut m = Mat4::identity();
        m.rotate_y_about(1.2, pivot);
        let p = Vec4::from_vec3(pivot, 1.0) * m;
        assert_relative_eq!(p.x, pivot.x, epsilon = 1e-5);
        assert_relative_eq!(p.y, pivot.y, epsilon = 1e-5);
        assert_relative_eq!(p.z, pivot.z, epsilon = 1e-5);
    }

    #[test]
    fn multiply_normal_ignores_translation() {
        let m = Mat4::translation(5.0, 5.0, 5.0);
        assert_eq!(m.multiply_normal(Vec3::UP), Vec3::UP);
    }

    #[test]
    fn perspective_sets_w_to_negative_z() {
        let m = Mat4::perspective_fov(90.0, 1.0, 10.0);
        let clip = Vec4::point(0.0, 0.0, -5.0) * m;
        assert_relative_eq!(clip.w, 5.0);

        let near = Vec4::point(0.0, 0.0, -1.0) * m;
        assert_relative_eq!(near.z, 0.0, epsilon = 1e-6);
    }

    #[test]
    fn symmetric_frustum_maps_near_and_far_to_unit_depth() {
        let m = Mat4::frustum(-1.0, 1.0, 1.0, -1.0, 1.0, 10.0);
        let near = (Vec4::point(0.0, 0.0, -1.0) * m).homogenise();
        let far = (Vec4::point(0.0, 0.0, -10.0) * m).homogenise();
        assert_relative_eq!(near.z, -1.0, epsilon = 1e-5);
        assert_relative_eq!(far.z, 1.0, epsilon = 1e-5);
    }
}
