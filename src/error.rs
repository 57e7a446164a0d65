//! Errors raised by the rendering pipeline.
//!
//! Mesh and configuration loading have their own error types
//! ([`crate::mesh::LoadError`], [`crate::config::ConfigError`]); everything
//! that can go wrong while transforming and rasterizing ends up here.

use thiserror::Error;

use crate::attribute::AttributeKind;

/// Errors from matrix math, attribute arithmetic and draw calls.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum RenderError {
    #[error("matrix is singular (determinant {determinant})")]
    SingularMatrix { determinant: f32 },

    #[error("attribute kind mismatch: expected {expected}, found {found}")]
    AttributeMismatch {
        expected: AttributeKind,
        found: AttributeKind,
    },

    #[error("vertex has no attribute named \"{0}\"")]
    MissingAttribute(String),

    #[error("index {index} out of range for {len} vertices")]
    IndexOutOfRange { index: u32, len: usize },

    #[error("index buffer length {0} is not a multiple of 3")]
    InvalidIndexBuffer(usize),

    #[error("invalid viewport configuration: {0}")]
    InvalidConfig(String),
}
