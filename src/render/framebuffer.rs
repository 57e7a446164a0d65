//! Owned colour, depth and stencil buffers.
//!
//! All three are sized once at construction and addressed row-major,
//! `y * width + x`, with the origin in the top-left corner. Nothing clears
//! them implicitly; callers clear between frames.

use super::ops::{pack_colour, unpack_colour};
use crate::math::{Vec3, Vec4};

/// Colour, depth and stencil storage for one viewport.
///
/// # Colour format
///
/// Each colour word is ARGB8888. On little-endian targets the bytes in memory
/// are B, G, R, A, which is what [`FrameBuffer::as_bytes`] hands to a
/// presentation surface.
#[derive(Debug, Clone)]
pub struct FrameBuffer {
    colour: Vec<u32>,
    depth: Vec<f32>,
    stencil: Vec<u8>,
    width: u32,
    height: u32,
}

impl FrameBuffer {
    /// Allocates zeroed buffers for a `width` x `height` surface.
    pub fn new(width: u32, height: u32) -> Self {
        let len = width as usize * height as usize;
        Self {
            colour: vec![0; len],
            depth: vec![0.0; len],
            stencil: vec![0; len],
            width,
            height,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    #[inline]
    fn index(&self, x: u32, y: u32) -> Option<usize> {
        if x < self.width && y < self.height {
            Some((y * self.width + x) as usize)
        } else {
            None
        }
    }

    // ============ Clearing ============

    /// Fills the colour buffer with an opaque colour.
    pub fn clear_colour(&mut self, colour: Vec3) {
        let packed = pack_colour(Vec4::from_vec3(colour, 1.0));
        self.colour.fill(packed);
    }

    pub fn clear_depth(&mut self, depth: f32) {
        self.depth.fill(depth);
    }

    pub fn clear_stencil(&mut self) {
        self.stencil.fill(0);
    }

    // ============ Pixel access ============

    /// Packed ARGB colour at (x, y), or None if out of bounds.
    pub fn colour_at(&self, x: u32, y: u32) -> Option<u32> {
        self.index(x, y).map(|i| self.colour[i])
    }

    /// Colour at (x, y) as RGBA channels in [0, 1].
    pub fn colour_vec_at(&self, x: u32, y: u32) -> Option<Vec4> {
        self.colour_at(x, y).map(unpack_colour)
    }

    pub fn depth_at(&self, x: u32, y: u32) -> Option<f32> {
        self.index(x, y).map(|i| self.depth[i])
    }

    pub fn stencil_at(&self, x: u32, y: u32) -> Option<u8> {
        self.index(x, y).map(|i| self.stencil[i])
    }

    // The rasterizer has already clamped to the surface, so these index directly.

    #[inline]
    pub(crate) fn colour_mut(&mut self, index: usize) -> &mut u32 {
        &mut self.colour[index]
    }

    #[inline]
    pub(crate) fn depth_mut(&mut self, index: usize) -> &mut f32 {
        &mut self.depth[index]
    }

    #[inline]
    pub(crate) fn stencil_mut(&mut self, index: usize) -> &mut u8 {
        &mut self.stencil[index]
    }

    // ============ Whole-buffer views ============

    pub fn colour(&self) -> &[u32] {
        &self.colour
    }

    pub fn depth(&self) -> &[f32] {
        &self.depth
    }

    pub fn stencil(&self) -> &[u8] {
        &self.stencil
    }

    /// Colour buffer as raw bytes, `width * 4` bytes per row.
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.colour)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clears_are_idempotent() {
        let mut fb = FrameBuffer::new(4, 3);
        fb.clear_colour(Vec3::new(1.0, 0.0, 0.0));
        fb.clear_colour(Vec3::new(1.0, 0.0, 0.0));
        fb.clear_depth(100.0);
        fb.clear_stencil();
        assert!(fb.colour().iter().all(|&c| c == 0xFFFF_0000));
        assert!(fb.depth().iter().all(|&d| d == 100.0));
        assert!(fb.stencil().iter().all(|&s| s == 0));
    }

    #[test]
    fn out_of_bounds_reads_are_none() {
        let fb = FrameBuffer::new(4, 3);
        assert!(fb.colour_at(3, 2).is_some());
        assert_eq!(fb.colour_at(4, 0), None);
        assert_eq!(fb.depth_at(0, 3), None);
        assert_eq!(fb.stencil_at(9, 9), None);
    }

    #[test]
    fn bytes_are_four_per_pixel() {
        let mut fb = FrameBuffer::new(2, 2);
        fb.clear_colour(Vec3::new(0.0, 0.0, 1.0));
        let bytes = fb.as_bytes();
        assert_eq!(bytes.len(), 2 * 2 * 4);
        assert_eq!(u32::from_ne_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]), 0xFF00_00FF);
    }
}
