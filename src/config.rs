//! Viewport construction parameters, loadable from JSON.

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::projection::ResolutionGate;
use crate::render::state::RasterState;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Camera intrinsics and output size for a [`crate::render::Viewport`].
///
/// Missing fields in JSON fall back to [`ViewportConfig::default`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewportConfig {
    /// Film aperture (width, height) in inches.
    pub aperture: [f32; 2],
    /// Output size (width, height) in pixels.
    pub device: [u32; 2],
    /// Focal length in millimetres.
    pub focal_length: f32,
    pub near: f32,
    pub far: f32,
    pub gate: ResolutionGate,
    /// Initial fragment-stage state.
    pub state: RasterState,
}

impl Default for ViewportConfig {
    /// 35mm full aperture on a 640x480 device.
    fn default() -> Self {
        Self {
            aperture: [0.980, 0.735],
            device: [640, 480],
            focal_length: 35.0,
            near: 0.1,
            far: 100.0,
            gate: ResolutionGate::Fill,
            state: RasterState::default(),
        }
    }
}

impl ViewportConfig {
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    /// Checks the invariants the projection and buffers rely on.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let [width, height] = self.device;
        if width == 0 || height == 0 {
            return Err(ConfigError::Invalid(format!(
                "device size must be non-zero, got {width}x{height}"
            )));
        }
        let [aw, ah] = self.aperture;
        if !(aw > 0.0 && ah > 0.0) {
            return Err(ConfigError::Invalid(format!(
                "aperture must be positive, got {aw}x{ah}"
            )));
        }
        if !(self.focal_length > 0.0) {
            return Err(ConfigError::Invalid(format!(
                "focal length must be positive, got {}",
                self.focal_length
            )));
        }
        if !(self.near > 0.0 && self.near < self.far) {
            return Err(ConfigError::Invalid(format!(
                "clip planes must satisfy 0 < near < far, got near {} far {}",
                self.near, self.far
            )));
        }
        Ok(())
    }
}
