//! Fragment operations: comparisons, stencil updates, blending and colour
//! packing.

use super::state::{BlendEquation, BlendFunction, BlendState, Comparison, StencilOperation};
use crate::math::Vec4;

impl Comparison {
    /// Evaluates `src OP dst`.
    #[inline]
    pub fn test<T: PartialOrd>(self, src: T, dst: T) -> bool {
        match self {
            Comparison::Never => false,
            Comparison::Less => src < dst,
            Comparison::LessEqual => src <= dst,
            Comparison::Greater => src > dst,
            Comparison::GreaterEqual => src >= dst,
            Comparison::Equal => src == dst,
            Comparison::NotEqual => src != dst,
            Comparison::Always => true,
        }
    }
}

impl StencilOperation {
    /// New stored stencil value.
    ///
    /// # Arguments
    /// * `src` - Masked reference value
    /// * `dst` - Stored value, unmasked
    /// * `write_mask` - Applied by `Replace`
    #[inline]
    pub fn apply(self, src: u8, dst: u8, write_mask: u8) -> u8 {
        match self {
            StencilOperation::Keep => dst,
            StencilOperation::Zero => 0,
            StencilOperation::Replace => src & write_mask,
            StencilOperation::Increment => dst.saturating_add(1),
            StencilOperation::IncrementWrap => dst.wrapping_add(1),
            StencilOperation::Decrement => dst.saturating_sub(1),
            StencilOperation::DecrementWrap => dst.wrapping_sub(1),
            StencilOperation::Invert => !dst,
        }
    }
}

impl BlendFunction {
    /// Per-channel multiplier for this factor.
    pub fn factor(self, src: Vec4, dst: Vec4, constant_colour: Vec4, constant_alpha: f32) -> Vec4 {
        match self {
            BlendFunction::Zero => Vec4::ZERO,
            BlendFunction::One => Vec4::ONE,
            BlendFunction::SrcColour => src,
            BlendFunction::OneMinusSrcColour => Vec4::ONE - src,
            BlendFunction::DstColour => dst,
            BlendFunction::OneMinusDstColour => Vec4::ONE - dst,
            BlendFunction::SrcAlpha => Vec4::splat(src.w),
            BlendFunction::OneMinusSrcAlpha => Vec4::splat(1.0 - src.w),
            BlendFunction::DstAlpha => Vec4::splat(dst.w),
            BlendFunction::OneMinusDstAlpha => Vec4::splat(1.0 - dst.w),
            BlendFunction::ConstantColour => constant_colour,
            BlendFunction::OneMinusConstantColour => Vec4::ONE - constant_colour,
            BlendFunction::ConstantAlpha => Vec4::splat(constant_alpha),
            BlendFunction::OneMinusConstantAlpha => Vec4::splat(1.0 - constant_alpha),
        }
    }
}

impl BlendEquation {
    /// Combines the already weighted source and destination terms.
    #[inline]
    pub fn combine(self, src: Vec4, dst: Vec4) -> Vec4 {
        match self {
            BlendEquation::Add => src + dst,
            BlendEquation::Subtract => src - dst,
            BlendEquation::ReverseSubtract => dst - src,
        }
    }
}

impl BlendState {
    /// Blends the shaded colour `src` onto the stored colour `dst`.
    ///
    /// The result is not clamped; quantisation clamps on write.
    pub fn blend(&self, src: Vec4, dst: Vec4) -> Vec4 {
        let sf = self
            .src
            .factor(src, dst, self.constant_colour, self.constant_alpha);
        let df = self
            .dst
            .factor(src, dst, self.constant_colour, self.constant_alpha);
        self.equation.combine(src * sf, dst * df)
    }
}

// ============ Colour packing ============
//
// The colour buffer stores ARGB8888 words, which are B, G, R, A bytes in
// little-endian memory.

/// Clamps to [0, 1] and scales to the nearest byte.
#[inline]
pub fn quantise(channel: f32) -> u8 {
    (channel.clamp(0.0, 1.0) * 255.0).round() as u8
}

/// Packs an RGBA colour (x = red, w = alpha) into an ARGB word.
#[inline]
pub fn pack_colour(colour: Vec4) -> u32 {
    let r = quantise(colour.x) as u32;
    let g = quantise(colour.y) as u32;
    let b = quantise(colour.z) as u32;
    let a = quantise(colour.w) as u32;
    (a << 24) | (r << 16) | (g << 8) | b
}

/// Unpacks an ARGB word into RGBA channels in [0, 1].
#[inline]
pub fn unpack_colour(argb: u32) -> Vec4 {
    let a = ((argb >> 24) & 0xFF) as f32 / 255.0;
    let r = ((argb >> 16) & 0xFF) as f32 / 255.0;
    let g = ((argb >> 8) & 0xFF) as f32 / 255.0;
    let b = (argb & 0xFF) as f32 / 255.0;
    Vec4::new(r, g, b, a)
}
