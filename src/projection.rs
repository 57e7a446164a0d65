//! Physical-camera projection parameters.
//!
//! The [`Projection`] struct derives the projection matrix from a film-back
//! aperture, a focal length and the output device size, the way a real
//! camera maps its gate onto a sensor of a different aspect ratio.

use serde::{Deserialize, Serialize};

use crate::math::mat4::Mat4;

const INCH_TO_MM: f32 = 25.4;

/// How the film aperture is fitted to the device when their aspect ratios differ.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ResolutionGate {
    /// Fit the aperture inside the device; the larger dimension fills it.
    #[default]
    Fill,
    /// Let the aperture overflow the device; the smaller dimension fills it.
    Overscan,
}

/// Perspective projection built from camera intrinsics.
#[derive(Debug, Clone, Copy)]
pub struct Projection {
    /// Near-plane extents after gate fitting.
    left: f32,
    right: f32,
    top: f32,
    bottom: f32,
    z_near: f32,
    z_far: f32,
    /// Horizontal field of view in degrees.
    field_of_view: f32,
    /// Aperture width / height.
    film_aspect_ratio: f32,
    gate: ResolutionGate,
    matrix: Mat4,
}

impl Projection {
    /// Creates a new projection.
    ///
    /// # Arguments
    /// * `aperture` - Film aperture (width, height) in inches
    /// * `device` - Output size (width, height) in pixels
    /// * `focal_length` - Focal length in millimetres
    /// * `z_near` - Near clipping plane distance (must be > 0)
    /// * `z_far` - Far clipping plane distance (must be > z_near)
    /// * `gate` - How to fit the aperture to the device
    pub fn new(
        aperture: (f32, f32),
        device: (u32, u32),
        focal_length: f32,
        z_near: f32,
        z_far: f32,
        gate: ResolutionGate,
    ) -> Self {
        let (aperture_width, aperture_height) = aperture;
        let top = ((aperture_height * INCH_TO_MM / 2.0) / focal_length) * z_near;
        let right = ((aperture_width * INCH_TO_MM / 2.0) / focal_length) * z_near;
        let field_of_view =
            2.0 * 180.0 / std::f32::consts::PI * ((aperture_width * INCH_TO_MM / 2.0) / focal_length).atan();
        let film_aspect_ratio = aperture_width / aperture_height;

        let device_aspect_ratio = device.0 as f32 / device.1 as f32;
        let (xscale, yscale) = Self::gate_scale(gate, film_aspect_ratio, device_aspect_ratio);

        let top = top * yscale;
        let right = right * xscale;
        let (left, bottom) = (-right, -top);
        let matrix = Mat4::frustum(left, right, top, bottom, z_near, z_far);

        Self {
            left,
            right,
            top,
            bottom,
            z_near,
            z_far,
            field_of_view,
            film_aspect_ratio,
            gate,
            matrix,
        }
    }

    /// Scale factors applied to the (right, top) extents.
    fn gate_scale(gate: ResolutionGate, film: f32, device: f32) -> (f32, f32) {
        match gate {
            ResolutionGate::Fill if film > device => (device / film, 1.0),
            ResolutionGate::Fill => (1.0, film / device),
            ResolutionGate::Overscan if film > device => (1.0, film / device),
            ResolutionGate::Overscan => (device / film, 1.0),
        }
    }

    pub fn matrix(&self) -> Mat4 {
        self.matrix
    }

    /// Near-plane extents as (left, right, top, bottom).
    pub fn extents(&self) -> (f32, f32, f32, f32) {
        (self.left, self.right, self.top, self.bottom)
    }

    pub fn z_near(&self) -> f32 {
        self.z_near
    }

    pub fn z_far(&self) -> f32 {
        self.z_far
    }

    /// Horizontal field of view of the unfitted aperture, in degrees.
    pub fn field_of_view(&self) -> f32 {
        self.field_of_view
    }

    pub fn film_aspect_ratio(&self) -> f32 {
        self.film_aspect_ratio
    }

    pub fn gate(&self) -> ResolutionGate {
        self.gate
    }
}
