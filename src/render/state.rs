//! Per-pixel test and blend configuration.
//!
//! Everything the fragment stage needs to decide whether and how a pixel is
//! written lives in [`RasterState`]. The viewport owns one instance and
//! callers mutate it between draw calls; nothing is global.
//!
//! All types deserialize from JSON. Unknown variant names are rejected by
//! serde at load time, so an out-of-range mode can never reach the pipeline.

use serde::{Deserialize, Serialize};

use crate::math::Vec4;

/// Which screen-space winding gets rejected.
///
/// After the Y flip of the screen mapping, a triangle that is
/// counter-clockwise in NDC has all-positive edge functions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum CullMode {
    /// Keep pixels whose edge functions are all >= 0.
    #[default]
    AntiClockwise,
    /// Keep pixels whose edge functions are all <= 0.
    Clockwise,
    /// Keep either.
    None,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum DepthTestState {
    /// Test and write.
    #[default]
    Enable,
    /// Neither test nor write.
    Disable,
    /// Test without writing.
    ReadOnly,
}

/// Comparison used by the depth and stencil tests, `incoming OP stored`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Comparison {
    Never,
    #[default]
    Less,
    LessEqual,
    Greater,
    GreaterEqual,
    Equal,
    NotEqual,
    Always,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum StencilOperation {
    #[default]
    Keep,
    Zero,
    Replace,
    /// Add one, clamped at 255.
    Increment,
    /// Add one, 255 wraps to 0.
    IncrementWrap,
    /// Subtract one, clamped at 0.
    Decrement,
    /// Subtract one, 0 wraps to 255.
    DecrementWrap,
    Invert,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BlendFunction {
    Zero,
    One,
    SrcColour,
    OneMinusSrcColour,
    DstColour,
    OneMinusDstColour,
    SrcAlpha,
    OneMinusSrcAlpha,
    DstAlpha,
    OneMinusDstAlpha,
    ConstantColour,
    OneMinusConstantColour,
    ConstantAlpha,
    OneMinusConstantAlpha,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum BlendEquation {
    #[default]
    Add,
    Subtract,
    ReverseSubtract,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DepthState {
    pub test: DepthTestState,
    pub function: Comparison,
    /// Added to the fragment depth before the comparison. Never written.
    pub bias: f32,
}

impl Default for DepthState {
    fn default() -> Self {
        Self {
            test: DepthTestState::Enable,
            function: Comparison::Less,
            bias: 0.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StencilState {
    pub enable: bool,
    /// Applied to both the reference and the stored value before comparing.
    pub function_mask: u8,
    /// Applied to the reference by [`StencilOperation::Replace`].
    pub write_mask: u8,
    pub reference: u8,
    pub function: Comparison,
    /// Stencil test failed.
    pub fail: StencilOperation,
    /// Stencil passed, depth failed.
    pub depth_fail: StencilOperation,
    /// Both passed.
    pub pass: StencilOperation,
}

impl Default for StencilState {
    fn default() -> Self {
        Self {
            enable: false,
            function_mask: 0xFF,
            write_mask: 0xFF,
            reference: 0,
            function: Comparison::Always,
            fail: StencilOperation::Keep,
            depth_fail: StencilOperation::Keep,
            pass: StencilOperation::Keep,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BlendState {
    pub enable: bool,
    pub src: BlendFunction,
    pub dst: BlendFunction,
    pub equation: BlendEquation,
    pub constant_colour: Vec4,
    /// Used by the `ConstantAlpha` factors, independent of `constant_colour.w`.
    pub constant_alpha: f32,
}

impl Default for BlendState {
    fn default() -> Self {
        Self {
            enable: false,
            src: BlendFunction::One,
            dst: BlendFunction::Zero,
            equation: BlendEquation::Add,
            constant_colour: Vec4::ZERO,
            constant_alpha: 0.0,
        }
    }
}

impl BlendState {
    /// Classic `src * a + dst * (1 - a)` transparency.
    pub fn alpha() -> Self {
        Self {
            enable: true,
            src: BlendFunction::SrcAlpha,
            dst: BlendFunction::OneMinusSrcAlpha,
            ..Self::default()
        }
    }
}

/// The complete fragment-stage configuration.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RasterState {
    pub cull_mode: CullMode,
    pub depth: DepthState,
    pub stencil: StencilState,
    pub blend: BlendState,
}
