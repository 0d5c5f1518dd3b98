//! # Transform and Interpolation Engine
//!
//! Generic algorithms driven by each attribute's descriptor policies, never
//! by its name.

use glam::Mat4;

use super::descriptor::{InterpolationMode, TransformMode};
use super::present::AttributePresent;
use super::value::{AttributeValue, ElementKind};

/// Weighted sources of one destination element: `(weight, source_key)`.
pub type KeySources = Vec<(f32, u32)>;

// =============================================================================
// TRANSFORM
// =============================================================================

/// Builds the per-value transform for `mode`, or `None` when values are
/// copied unchanged.
fn value_transform<T: AttributeValue>(
    mode: TransformMode,
    name: &str,
    matrix: &Mat4,
) -> Option<Box<dyn Fn(T) -> T>> {
    if mode == TransformMode::NormalizeMatMulVec3ZeroAndFloat {
        assert!(
            T::KIND == ElementKind::Vec4,
            "attribute `{name}`: transform mode {mode:?} needs 4 component values, got {:?}",
            T::KIND
        );
    }
    if !T::KIND.is_transformable() {
        return None;
    }

    let matrix = *matrix;
    let normal_matrix = matrix.inverse().transpose();
    match mode {
        TransformMode::None => None,
        TransformMode::MatMulVec3One => Some(Box::new(move |v: T| v.mat_mul(&matrix, 1.0))),
        TransformMode::MatMulVec3Zero => Some(Box::new(move |v: T| v.mat_mul(&matrix, 0.0))),
        TransformMode::NormalizeMatMulVec3Zero => {
            Some(Box::new(move |v: T| v.mat_mul(&matrix, 0.0).normalized()))
        }
        TransformMode::NormalizeMatMulVec3ZeroAndFloat => {
            Some(Box::new(move |v: T| v.mat_mul_xyz_normalize_keep_w(&matrix)))
        }
        TransformMode::NormalMatMulVec3Zero => {
            Some(Box::new(move |v: T| v.mat_mul(&normal_matrix, 0.0)))
        }
        TransformMode::NormalizeNormalMatMulVec3Zero => {
            Some(Box::new(move |v: T| v.mat_mul(&normal_matrix, 0.0).normalized()))
        }
    }
}

/// Writes the transformed `source` into `destination`.
///
/// The destination takes the source's length and presence flags. Present
/// values are transformed according to the source descriptor's transform
/// mode; values of integer kinds are copied unchanged.
///
/// # Panics
///
/// Panics if the mode is `NormalizeMatMulVec3ZeroAndFloat` and `T` is not a
/// four component float vector, or if `destination` is unbound.
///
/// # Example
///
/// ```rust
/// use geometry_kernel::attribute::{transform_attribute, AttributeDescriptors, AttributePresent};
/// use glam::{Mat4, Vec3};
///
/// let mut src = AttributePresent::<Vec3>::new(AttributeDescriptors::CENTROID);
/// src.bind(2);
/// src.set(0, Vec3::ZERO);
///
/// let mut dst = AttributePresent::<Vec3>::new(AttributeDescriptors::CENTROID);
/// dst.bind(0);
/// transform_attribute(&src, &mut dst, &Mat4::from_translation(Vec3::X));
/// assert_eq!(dst.get(0), Vec3::X);
/// assert!(!dst.has(1));
/// ```
pub fn transform_attribute<T: AttributeValue>(
    source: &AttributePresent<T>,
    destination: &mut AttributePresent<T>,
    matrix: &Mat4,
) {
    let descriptor = source.descriptor();
    match value_transform::<T>(descriptor.transform_mode, &descriptor.name, matrix) {
        Some(transform) => destination.assign_from(source, transform),
        None => destination.assign_from(source, |v| v),
    }
}

/// Transforms the present values of `attribute` in place.
pub fn transform_attribute_in_place<T: AttributeValue>(attribute: &mut AttributePresent<T>, matrix: &Mat4) {
    let descriptor = attribute.descriptor();
    if let Some(transform) = value_transform::<T>(descriptor.transform_mode, &descriptor.name, matrix) {
        attribute.map_present(transform);
    }
}

/// Copies `source` into `destination`, values and presence.
pub fn copy_attribute<T: AttributeValue>(source: &AttributePresent<T>, destination: &mut AttributePresent<T>) {
    destination.assign_from(source, |v| v);
}

// =============================================================================
// INTERPOLATION
// =============================================================================

/// Computes each destination element as the weighted average of its present
/// sources.
///
/// `sources[dst_key]` lists `(weight, src_key)` pairs. Absent sources are
/// left out of both the sum and the weight total. Destination elements
/// whose present sources weigh nothing keep their old value and presence.
///
/// Attributes with [`InterpolationMode::None`] and integer kinds are left
/// untouched.
///
/// # Example
///
/// ```rust
/// use geometry_kernel::attribute::{interpolate_attribute, AttributeDescriptors, AttributePresent};
/// use glam::Vec2;
///
/// let mut src = AttributePresent::<Vec2>::new(AttributeDescriptors::TEXCOORD_0);
/// src.bind(3);
/// src.set(0, Vec2::new(0.0, 0.0));
/// src.set(1, Vec2::new(1.0, 0.0));
///
/// let mut dst = AttributePresent::<Vec2>::new(AttributeDescriptors::TEXCOORD_0);
/// dst.bind(1);
/// // Source 2 is absent, so only sources 0 and 1 count.
/// interpolate_attribute(&src, &mut dst, &[vec![(1.0, 0), (1.0, 1), (5.0, 2)]]);
/// assert_eq!(dst.get(0), Vec2::new(0.5, 0.0));
/// ```
pub fn interpolate_attribute<T: AttributeValue>(
    source: &AttributePresent<T>,
    destination: &mut AttributePresent<T>,
    sources: &[KeySources],
) {
    let mode = source.descriptor().interpolation_mode;
    if mode == InterpolationMode::None || !T::KIND.is_interpolatable() {
        return;
    }

    for (dst_key, key_sources) in sources.iter().enumerate() {
        let weight_sum: f32 = key_sources
            .iter()
            .filter(|(_, src_key)| source.has(*src_key))
            .map(|(weight, _)| *weight)
            .sum();
        if weight_sum == 0.0 {
            continue;
        }

        let value = key_sources
            .iter()
            .filter_map(|(weight, src_key)| source.try_get(*src_key).map(|v| (*weight, v)))
            .fold(T::default(), |sum, (weight, v)| sum.add_weighted(v, weight / weight_sum));
        destination.set(dst_key as u32, value.finish_interpolation(mode));
    }
}

#[cfg(test)]
mod tests {
    use glam::{IVec2, UVec4, Vec3, Vec4};

    use super::*;
    use crate::attribute::AttributeDescriptors;

    #[test]
    #[should_panic(expected = "needs 4 component values")]
    fn test_tangent_mode_rejects_three_component_values() {
        let mut attribute = AttributePresent::<Vec3>::new(AttributeDescriptors::TANGENT);
        attribute.bind(1);
        attribute.set(0, Vec3::X);
        transform_attribute_in_place(&mut attribute, &Mat4::IDENTITY);
    }

    #[test]
    fn test_integer_kinds_are_copied_verbatim() {
        let mut src = AttributePresent::<IVec2>::new(AttributeDescriptors::VALENCY_EDGE_COUNT);
        src.bind(2);
        src.set(1, IVec2::new(4, 4));
        let mut dst = AttributePresent::<IVec2>::new(AttributeDescriptors::VALENCY_EDGE_COUNT);
        dst.bind(0);
        transform_attribute(&src, &mut dst, &Mat4::from_scale(Vec3::splat(3.0)));
        assert_eq!(dst.get(1), IVec2::new(4, 4));
        assert!(!dst.has(0));
    }

    #[test]
    fn test_integer_kinds_are_not_interpolated() {
        let mut src = AttributePresent::<UVec4>::new(AttributeDescriptors::JOINT_INDICES_0);
        src.bind(1);
        src.set(0, UVec4::new(1, 2, 3, 4));
        let mut dst = AttributePresent::<UVec4>::new(AttributeDescriptors::JOINT_INDICES_0);
        dst.bind(1);
        interpolate_attribute(&src, &mut dst, &[vec![(1.0, 0)]]);
        assert!(!dst.has(0));
    }

    #[test]
    fn test_tangent_interpolation_normalizes_xyz_only() {
        let mut src = AttributePresent::<Vec4>::new(AttributeDescriptors::TANGENT);
        src.bind(2);
        src.set(0, Vec4::new(1.0, 0.0, 0.0, 1.0));
        src.set(1, Vec4::new(0.0, 1.0, 0.0, -1.0));
        let mut dst = AttributePresent::<Vec4>::new(AttributeDescriptors::TANGENT);
        dst.bind(1);
        interpolate_attribute(&src, &mut dst, &[vec![(1.0, 0), (3.0, 1)]]);
        let value = dst.get(0);
        assert!((value.truncate().length() - 1.0).abs() < 1e-6);
        assert!((value.w - (-0.5)).abs() < 1e-6);
    }
}
