//! # Attribute Element Kinds
//!
//! The closed set of element types an attribute can hold, and the capability
//! trait the transform and interpolation engine dispatches through.

use std::fmt;

use glam::{IVec2, Mat4, UVec4, Vec2, Vec3, Vec4};

use super::descriptor::InterpolationMode;

/// Tag identifying the element type of an attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ElementKind {
    /// `f32`
    Float,
    /// `Vec2`
    Vec2,
    /// `Vec3`
    Vec3,
    /// `Vec4`
    Vec4,
    /// `UVec4`, used for joint indices.
    UVec4,
    /// `IVec2`, used for valency and edge counts.
    IVec2,
}

impl ElementKind {
    /// Number of scalar components.
    pub fn component_count(self) -> usize {
        match self {
            ElementKind::Float => 1,
            ElementKind::Vec2 | ElementKind::IVec2 => 2,
            ElementKind::Vec3 => 3,
            ElementKind::Vec4 | ElementKind::UVec4 => 4,
        }
    }

    /// Integer kinds are index-like and never transformed.
    pub fn is_transformable(self) -> bool {
        !matches!(self, ElementKind::UVec4 | ElementKind::IVec2)
    }

    /// Integer kinds are never blended.
    pub fn is_interpolatable(self) -> bool {
        self.is_transformable()
    }
}

/// Capability interface of attribute element types.
///
/// Integer kinds implement the float operations as identities. The engine
/// checks [`ElementKind::is_transformable`] and
/// [`ElementKind::is_interpolatable`] once per attribute and never calls
/// them for integer kinds.
pub trait AttributeValue: Copy + Default + PartialEq + fmt::Debug + Send + Sync + 'static {
    /// Element kind tag.
    const KIND: ElementKind;

    /// Multiplies the value, extended to a 4-vector with `w`, by `matrix`
    /// and keeps the original component count.
    fn mat_mul(self, matrix: &Mat4, w: f32) -> Self;

    /// Transforms the xyz part as a direction, normalizes it and keeps w.
    /// Only meaningful for 4-component float values.
    fn mat_mul_xyz_normalize_keep_w(self, matrix: &Mat4) -> Self;

    /// Unit length version of the value, or zero when degenerate.
    fn normalized(self) -> Self;

    /// Returns `self + value * weight`.
    fn add_weighted(self, value: Self, weight: f32) -> Self;

    /// Post-processing applied after a weighted sum.
    fn finish_interpolation(self, mode: InterpolationMode) -> Self {
        let _ = mode;
        self
    }
}

impl AttributeValue for f32 {
    const KIND: ElementKind = ElementKind::Float;

    fn mat_mul(self, matrix: &Mat4, w: f32) -> Self {
        (*matrix * Vec4::new(self, 0.0, 0.0, w)).x
    }

    fn mat_mul_xyz_normalize_keep_w(self, _matrix: &Mat4) -> Self {
        self
    }

    fn normalized(self) -> Self {
        // The unit "vector" of a scalar is its sign.
        if self == 0.0 {
            0.0
        } else {
            self.signum()
        }
    }

    fn add_weighted(self, value: Self, weight: f32) -> Self {
        self + value * weight
    }
}

impl AttributeValue for Vec2 {
    const KIND: ElementKind = ElementKind::Vec2;

    fn mat_mul(self, matrix: &Mat4, w: f32) -> Self {
        let r = *matrix * Vec4::new(self.x, self.y, 0.0, w);
        Vec2::new(r.x, r.y)
    }

    fn mat_mul_xyz_normalize_keep_w(self, _matrix: &Mat4) -> Self {
        self
    }

    fn normalized(self) -> Self {
        self.normalize_or_zero()
    }

    fn add_weighted(self, value: Self, weight: f32) -> Self {
        self + value * weight
    }
}

impl AttributeValue for Vec3 {
    const KIND: ElementKind = ElementKind::Vec3;

    fn mat_mul(self, matrix: &Mat4, w: f32) -> Self {
        (*matrix * self.extend(w)).truncate()
    }

    fn mat_mul_xyz_normalize_keep_w(self, _matrix: &Mat4) -> Self {
        self
    }

    fn normalized(self) -> Self {
        self.normalize_or_zero()
    }

    fn add_weighted(self, value: Self, weight: f32) -> Self {
        self + value * weight
    }

    fn finish_interpolation(self, mode: InterpolationMode) -> Self {
        match mode {
            InterpolationMode::Normalized => self.normalize_or_zero(),
            _ => self,
        }
    }
}

impl AttributeValue for Vec4 {
    const KIND: ElementKind = ElementKind::Vec4;

    fn mat_mul(self, matrix: &Mat4, _w: f32) -> Self {
        // Four component values carry their own w.
        *matrix * self
    }

    fn mat_mul_xyz_normalize_keep_w(self, matrix: &Mat4) -> Self {
        let xyz = (*matrix * self.truncate().extend(0.0)).truncate();
        xyz.normalize_or_zero().extend(self.w)
    }

    fn normalized(self) -> Self {
        self.normalize_or_zero()
    }

    fn add_weighted(self, value: Self, weight: f32) -> Self {
        self + value * weight
    }

    fn finish_interpolation(self, mode: InterpolationMode) -> Self {
        match mode {
            InterpolationMode::NormalizedVec3Float => {
                self.truncate().normalize_or_zero().extend(self.w)
            }
            _ => self,
        }
    }
}

impl AttributeValue for UVec4 {
    const KIND: ElementKind = ElementKind::UVec4;

    fn mat_mul(self, _matrix: &Mat4, _w: f32) -> Self {
        self
    }

    fn mat_mul_xyz_normalize_keep_w(self, _matrix: &Mat4) -> Self {
        self
    }

    fn normalized(self) -> Self {
        self
    }

    fn add_weighted(self, _value: Self, _weight: f32) -> Self {
        self
    }
}

impl AttributeValue for IVec2 {
    const KIND: ElementKind = ElementKind::IVec2;

    fn mat_mul(self, _matrix: &Mat4, _w: f32) -> Self {
        self
    }

    fn mat_mul_xyz_normalize_keep_w(self, _matrix: &Mat4) -> Self {
        self
    }

    fn normalized(self) -> Self {
        self
    }

    fn add_weighted(self, _value: Self, _weight: f32) -> Self {
        self
    }
}
