use std::path::Path;

use log::info;
use thiserror::Error;

use crate::math::Vec4;

#[derive(Debug, Error)]
pub enum TextureError {
    #[error("failed to decode image: {0}")]
    Image(#[from] image::ImageError),

    #[error("pixel data has {len} bytes, expected {expected} for {width}x{height} RGBA")]
    SizeMismatch {
        width: u32,
        height: u32,
        len: usize,
        expected: usize,
    },
}

/// Represents a 2D texture for texture mapping.
#[derive(Debug, Clone)]
pub struct Texture {
    data: Vec<u32>, // The pixel data of the texture in ARGB format.
    width: u32,     // The width of the texture in pixels.
    height: u32,    // The height of the texture in pixels.
}

impl Texture {
    /// Load a texture from an image file (PNG, JPG, etc.)
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, TextureError> {
        let img = image::open(path.as_ref())?.to_rgba8();
        let (width, height) = img.dimensions();
        info!(
            "Loaded texture {} ({}x{})",
            path.as_ref().display(),
            width,
            height
        );
        Self::from_rgba8(width, height, img.as_raw())
    }

    /// Build a texture from tightly packed RGBA bytes, top row first.
    pub fn from_rgba8(width: u32, height: u32, rgba: &[u8]) -> Result<Self, TextureError> {
        let expected = width as usize * height as usize * 4;
        if rgba.len() != expected {
            return Err(TextureError::SizeMismatch {
                width,
                height,
                len: rgba.len(),
                expected,
            });
        }

        // Convert RGBA bytes to ARGB u32
        let data: Vec<u32> = rgba
            .chunks_exact(4)
            .map(|p| {
                let [r, g, b, a] = [p[0], p[1], p[2], p[3]];
                ((a as u32) << 24) | ((r as u32) << 16) | ((g as u32) << 8) | (b as u32)
            })
            .collect();

        Ok(Self {
            data,
            width,
            height,
        })
    }

    /// Sample the texture at UV coordinates using nearest-neighbor filtering.
    ///
    /// # UV Coordinate Convention
    /// - (0,0) = bottom-left, textures are stored top-left origin, so V is flipped
    /// - NaN or anything outside [0,1] samples as transparent black
    ///
    /// Returns RGBA with every channel in [0, 1].
    #[inline]
    pub fn sample(&self, u: f32, v: f32) -> Vec4 {
        if u.is_nan() || v.is_nan() {
            return Vec4::ZERO;
        }
        if !(0.0..=1.0).contains(&u) || !(0.0..=1.0).contains(&v) {
            return Vec4::ZERO;
        }

        let x = (u * self.width as f32) as u32;
        let y = ((1.0 - v) * self.height as f32) as u32;
        // u == 1 or v == 0 lands one past the edge
        if x >= self.width || y >= self.height {
            return Vec4::ZERO;
        }

        let argb = self.data[(y * self.width + x) as usize];
        Vec4::new(
            ((argb >> 16) & 0xFF) as f32 / 255.0,
            ((argb >> 8) & 0xFF) as f32 / 255.0,
            (argb & 0xFF) as f32 / 255.0,
            ((argb >> 24) & 0xFF) as f32 / 255.0,
        )
    }

    pub fn width(&self) -> u32 {
        self.width
    }
    pub fn height(&self) -> u32 {
        self.height
    }
}
