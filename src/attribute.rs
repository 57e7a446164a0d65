//! Per-vertex attributes and the vertex type that carries them.
//!
//! An [`Attribute`] is one of a closed set of vector kinds. Arithmetic between
//! two attributes is only defined when both have the same kind; mixing kinds
//! is reported as [`RenderError::AttributeMismatch`] instead of being coerced.

use std::fmt;
use std::sync::Arc;

use crate::error::RenderError;
use crate::math::{Vec2, Vec3, Vec4};

/// Vertex colour, `Vec3` RGB in [0, 1].
pub const COLOUR: &str = "COLOUR";
/// Surface normal, `Vec3`.
pub const NORMAL: &str = "NORMAL";
/// View-space position written by [`crate::render::shader::NormalVertexShader`], `Vec3`.
pub const NORMAL0: &str = "NORMAL0";
/// Texture coordinate, `Vec2`.
pub const TEXCOORD: &str = "TEXCOORD";

/// The shape of an [`Attribute`] without its value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttributeKind {
    Vec2,
    Vec3,
    Vec4,
}

impl fmt::Display for AttributeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            AttributeKind::Vec2 => "Vec2",
            AttributeKind::Vec3 => "Vec3",
            AttributeKind::Vec4 => "Vec4",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Attribute {
    Vec2(Vec2),
    Vec3(Vec3),
    Vec4(Vec4),
}

impl Attribute {
    pub fn kind(&self) -> AttributeKind {
        match self {
            Attribute::Vec2(_) => AttributeKind::Vec2,
            Attribute::Vec3(_) => AttributeKind::Vec3,
            Attribute::Vec4(_) => AttributeKind::Vec4,
        }
    }

    /// Multiplies every component by `value`.
    pub fn scale(&self, value: f32) -> Attribute {
        match *self {
            Attribute::Vec2(v) => Attribute::Vec2(v * value),
            Attribute::Vec3(v) => Attribute::Vec3(v * value),
            Attribute::Vec4(v) => Attribute::Vec4(v * value),
        }
    }

    pub fn div_scalar(&self, value: f32) -> Attribute {
        match *self {
            Attribute::Vec2(v) => Attribute::Vec2(v / value),
            Attribute::Vec3(v) => Attribute::Vec3(v / value),
            Attribute::Vec4(v) => Attribute::Vec4(v / value),
        }
    }

    /// Component-wise product.
    pub fn try_mul(&self, other: &Attribute) -> Result<Attribute, RenderError> {
        self.zip(other, |a, b| a * b, |a, b| a * b, |a, b| a * b)
    }

    pub fn try_add(&self, other: &Attribute) -> Result<Attribute, RenderError> {
        self.zip(other, |a, b| a + b, |a, b| a + b, |a, b| a + b)
    }

    pub fn try_sub(&self, other: &Attribute) -> Result<Attribute, RenderError> {
        self.zip(other, |a, b| a - b, |a, b| a - b, |a, b| a - b)
    }

    /// Component-wise quotient.
    pub fn try_div(&self, other: &Attribute) -> Result<Attribute, RenderError> {
        self.zip(other, |a, b| a / b, |a, b| a / b, |a, b| a / b)
    }

    /// `(end - start) * alpha + start`.
    ///
    /// At `alpha == 0` the result is `start`, at `alpha == 1` it is `end`, up
    /// to float rounding.
    pub fn lerp(start: &Attribute, end: &Attribute, alpha: f32) -> Result<Attribute, RenderError> {
        end.try_sub(start)?.scale(alpha).try_add(start)
    }

    fn zip(
        &self,
        other: &Attribute,
        f2: impl Fn(Vec2, Vec2) -> Vec2,
        f3: impl Fn(Vec3, Vec3) -> Vec3,
        f4: impl Fn(Vec4, Vec4) -> Vec4,
    ) -> Result<Attribute, RenderError> {
        match (*self, *other) {
            (Attribute::Vec2(a), Attribute::Vec2(b)) => Ok(Attribute::Vec2(f2(a, b))),
            (Attribute::Vec3(a), Attribute::Vec3(b)) => Ok(Attribute::Vec3(f3(a, b))),
            (Attribute::Vec4(a), Attribute::Vec4(b)) => Ok(Attribute::Vec4(f4(a, b))),
            _ => Err(RenderError::AttributeMismatch {
                expected: self.kind(),
                found: other.kind(),
            }),
        }
    }
}

impl From<Vec2> for Attribute {
    fn from(v: Vec2) -> Self {
        Attribute::Vec2(v)
    }
}

impl From<Vec3> for Attribute {
    fn from(v: Vec3) -> Self {
        Attribute::Vec3(v)
    }
}

impl From<Vec4> for Attribute {
    fn from(v: Vec4) -> Self {
        Attribute::Vec4(v)
    }
}

/// Ordered map from attribute name to value.
///
/// Vertices usually carry two or three attributes, so a linear scan over a
/// `Vec` beats hashing. Keys are `Arc<str>` so cloning a vertex shares the
/// names and only copies the values.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AttributeList {
    entries: Vec<(Arc<str>, Attribute)>,
}

impl AttributeList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: Vec::with_capacity(capacity),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Inserts or replaces the attribute stored under `key`.
    pub fn insert(&mut self, key: impl Into<Arc<str>>, value: impl Into<Attribute>) {
        let key = key.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some((_, slot)) => *slot = value,
            None => self.entries.push((key, value)),
        }
    }

    pub fn get(&self, key: &str) -> Option<&Attribute> {
        self.entries
            .iter()
            .find(|(k, _)| k.as_ref() == key)
            .map(|(_, v)| v)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn remove(&mut self, key: &str) -> Option<Attribute> {
        let index = self.entries.iter().position(|(k, _)| k.as_ref() == key)?;
        Some(self.entries.remove(index).1)
    }

    pub fn keys(&self) -> impl Iterator<Item = &Arc<str>> {
        self.entries.iter().map(|(k, _)| k)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Arc<str>, &Attribute)> {
        self.entries.iter().map(|(k, v)| (k, v))
    }

    /// Values in key order, for overwriting in place.
    pub fn values_mut(&mut self) -> impl Iterator<Item = &mut Attribute> {
        self.entries.iter_mut().map(|(_, v)| v)
    }

    pub fn get_vec2(&self, key: &str) -> Result<Vec2, RenderError> {
        match self.require(key)? {
            Attribute::Vec2(v) => Ok(*v),
            other => Err(Self::mismatch(AttributeKind::Vec2, other)),
        }
    }

    pub fn get_vec3(&self, key: &str) -> Result<Vec3, RenderError> {
        match self.require(key)? {
            Attribute::Vec3(v) => Ok(*v),
            other => Err(Self::mismatch(AttributeKind::Vec3, other)),
        }
    }

    pub fn get_vec4(&self, key: &str) -> Result<Vec4, RenderError> {
        match self.require(key)? {
            Attribute::Vec4(v) => Ok(*v),
            other => Err(Self::mismatch(AttributeKind::Vec4, other)),
        }
    }

    fn require(&self, key: &str) -> Result<&Attribute, RenderError> {
        self.get(key)
            .ok_or_else(|| RenderError::MissingAttribute(key.to_string()))
    }

    fn mismatch(expected: AttributeKind, found: &Attribute) -> RenderError {
        RenderError::AttributeMismatch {
            expected,
            found: found.kind(),
        }
    }
}

/// A position plus its named attributes.
///
/// `Clone` is a deep copy: mutating the clone never affects the original.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Vertex {
    pub position: Vec4,
    pub attributes: AttributeList,
}

impl Vertex {
    pub fn new(position: Vec4) -> Self {
        Self {
            position,
            attributes: AttributeList::new(),
        }
    }

    /// Builder-style attribute insertion.
    pub fn with(mut self, key: impl Into<Arc<str>>, value: impl Into<Attribute>) -> Self {
        self.attributes.insert(key, value);
        self
    }

    /// Interpolates position and every attribute of `self` towards `other`.
    ///
    /// Only the keys present on `self` are carried over; a key missing from
    /// `other` fails with [`RenderError::MissingAttribute`].
    pub fn lerp(&self, other: &Vertex, alpha: f32) -> Result<Vertex, RenderError> {
        let mut attributes = AttributeList::with_capacity(self.attributes.len());
        for (key, start) in self.attributes.iter() {
            let end = other
                .attributes
                .get(key)
                .ok_or_else(|| RenderError::MissingAttribute(key.to_string()))?;
            attributes.insert(Arc::clone(key), Attribute::lerp(start, end, alpha)?);
        }
        Ok(Vertex {
            position: self.position.lerp(other.position, alpha),
            attributes,
        })
    }
}
