//! Tests for attribute stores, descriptors and the engine.

use approx::assert_abs_diff_eq;
use glam::{Mat4, Quat, Vec2, Vec3, Vec4};

use super::*;

// =============================================================================
// HELPERS
// =============================================================================

fn bound<T: AttributeValue>(descriptor: AttributeDescriptor, len: usize) -> AttributePresent<T> {
    let mut attribute = AttributePresent::new(descriptor);
    attribute.bind(len);
    attribute
}

fn custom(mode: TransformMode) -> AttributeDescriptor {
    AttributeDescriptor::named(0, "custom", mode, InterpolationMode::Linear)
}

fn affine() -> Mat4 {
    Mat4::from_scale_rotation_translation(
        Vec3::new(2.0, 0.5, 3.0),
        Quat::from_rotation_y(0.7) * Quat::from_rotation_x(-0.3),
        Vec3::new(1.0, -2.0, 0.5),
    )
}

// =============================================================================
// STORE TESTS
// =============================================================================

#[test]
fn test_bind_sizes_store_with_absent_elements() {
    let attribute = bound::<Vec3>(AttributeDescriptors::NORMAL, 4);
    assert_eq!(attribute.len(), 4);
    assert_eq!(attribute.present_count(), 0);
    assert!(attribute.is_bound());
}

#[test]
fn test_bind_and_unbind_are_idempotent() {
    let mut attribute = bound::<Vec3>(AttributeDescriptors::NORMAL, 2);
    attribute.set(1, Vec3::Y);
    attribute.bind(10);
    assert_eq!(attribute.len(), 2, "second bind must not resize");
    attribute.unbind();
    attribute.unbind();
    assert!(!attribute.is_bound());
    attribute.bind(2);
    assert_eq!(attribute.get(1), Vec3::Y);
}

#[test]
#[should_panic(expected = "used while unbound")]
fn test_set_on_unbound_store_panics() {
    let mut attribute = AttributePresent::<Vec3>::new(AttributeDescriptors::NORMAL);
    attribute.set(0, Vec3::X);
}

#[test]
#[should_panic(expected = "has no value for key 1")]
fn test_get_on_absent_key_panics() {
    let mut attribute = bound::<Vec2>(AttributeDescriptors::TEXCOORD_0, 2);
    attribute.set(0, Vec2::ONE);
    let _ = attribute.get(1);
}

#[test]
fn test_set_grows_store() {
    let mut attribute = bound::<f32>(custom(TransformMode::None), 0);
    attribute.set(5, 2.5);
    assert_eq!(attribute.len(), 6);
    assert!(attribute.has(5));
    assert!(!attribute.has(4));
}

#[test]
fn test_has_and_try_get_are_bounds_checked() {
    let attribute = bound::<Vec3>(AttributeDescriptors::NORMAL, 1);
    assert!(!attribute.has(u32::MAX));
    assert_eq!(attribute.try_get(100), None);
}

#[test]
fn test_fill_marks_everything_present_and_clear_marks_absent() {
    let mut attribute = bound::<Vec4>(AttributeDescriptors::COLOR_0, 3);
    attribute.fill(Vec4::ONE);
    assert_eq!(attribute.present_count(), 3);
    assert_eq!(attribute.get(2), Vec4::ONE);
    attribute.clear();
    assert_eq!(attribute.present_count(), 0);
    assert_eq!(attribute.len(), 3);
}

#[test]
fn test_iter_present_skips_absent() {
    let mut attribute = bound::<f32>(custom(TransformMode::None), 4);
    attribute.set(1, 1.0);
    attribute.set(3, 3.0);
    let items: Vec<_> = attribute.iter_present().collect();
    assert_eq!(items, vec![(1, 1.0), (3, 3.0)]);
}

#[test]
fn test_retain_compacts_in_order() {
    let mut attribute = bound::<f32>(custom(TransformMode::None), 4);
    attribute.set(0, 0.0);
    attribute.set(2, 2.0);
    attribute.set(3, 3.0);
    attribute.retain(&[false, true, true, true]);
    assert_eq!(attribute.len(), 3);
    assert!(!attribute.has(0));
    assert_eq!(attribute.get(1), 2.0);
    assert_eq!(attribute.get(2), 3.0);
}

#[test]
fn test_reverse_range_reverses_values_and_presence() {
    let mut attribute = bound::<f32>(custom(TransformMode::None), 4);
    attribute.set(1, 1.0);
    attribute.set(2, 2.0);
    attribute.reverse_range(1..4);
    assert!(!attribute.has(1));
    assert_eq!(attribute.get(2), 2.0);
    assert_eq!(attribute.get(3), 1.0);
}

// =============================================================================
// REGISTRY TESTS
// =============================================================================

#[test]
fn test_registry_holds_well_known_descriptors() {
    let registry = AttributeDescriptors::new();
    assert_eq!(registry.len(), AttributeDescriptors::WELL_KNOWN.len());
    let centroid = registry.get(0, "centroid").unwrap();
    assert_eq!(centroid.transform_mode, TransformMode::MatMulVec3One);
    let joints = registry.get(1, "joint_indices_1").unwrap();
    assert_eq!(joints.interpolation_mode, InterpolationMode::None);
    assert!(registry.get(0, "unknown").is_none());
}

#[test]
fn test_registry_rejects_duplicates() {
    let mut registry = AttributeDescriptors::new();
    let err = registry.insert(AttributeDescriptors::NORMAL).unwrap_err();
    assert!(err.to_string().contains("normal"));

    let custom = AttributeDescriptor::named(
        2,
        "wear",
        TransformMode::None,
        InterpolationMode::Linear,
    );
    registry.insert(custom.clone()).unwrap();
    assert_eq!(registry.get(2, "wear"), Some(&custom));
}

#[test]
fn test_global_registry_accepts_custom_descriptors() {
    let descriptor = AttributeDescriptor::named(
        9,
        "global_registry_test",
        TransformMode::MatMulVec3Zero,
        InterpolationMode::Linear,
    );
    AttributeDescriptors::register(descriptor.clone()).unwrap();
    assert_eq!(
        AttributeDescriptors::lookup(9, "global_registry_test"),
        Some(descriptor)
    );
    assert!(AttributeDescriptors::lookup(0, "normal").is_some());
}

// =============================================================================
// TRANSFORM TESTS
// =============================================================================

#[test]
fn test_transform_none_copies_verbatim() {
    let mut src = bound::<Vec2>(AttributeDescriptors::TEXCOORD_0, 2);
    src.set(0, Vec2::new(0.25, 0.75));
    let mut dst = bound::<Vec2>(AttributeDescriptors::TEXCOORD_0, 0);
    transform_attribute(&src, &mut dst, &affine());
    assert_eq!(dst.get(0), Vec2::new(0.25, 0.75));
    assert!(!dst.has(1));
}

#[test]
fn test_transform_position_and_direction() {
    let matrix = Mat4::from_translation(Vec3::new(5.0, 0.0, 0.0)) * Mat4::from_scale(Vec3::splat(2.0));
    let mut positions = bound::<Vec3>(custom(TransformMode::MatMulVec3One), 1);
    positions.set(0, Vec3::ONE);
    transform_attribute_in_place(&mut positions, &matrix);
    assert_eq!(positions.get(0), Vec3::new(7.0, 2.0, 2.0));

    let mut directions = bound::<Vec3>(custom(TransformMode::MatMulVec3Zero), 1);
    directions.set(0, Vec3::ONE);
    transform_attribute_in_place(&mut directions, &matrix);
    assert_eq!(directions.get(0), Vec3::splat(2.0));
}

#[test]
fn test_transform_normals_use_normal_matrix() {
    // Non-uniform scale: a 45 degree normal must tilt towards the squashed axis.
    let matrix = Mat4::from_scale(Vec3::new(1.0, 2.0, 1.0));
    let mut normals = bound::<Vec3>(AttributeDescriptors::NORMAL, 1);
    normals.set(0, Vec3::new(1.0, 1.0, 0.0).normalize());
    transform_attribute_in_place(&mut normals, &matrix);
    let n = normals.get(0);
    assert_abs_diff_eq!(n.length(), 1.0, epsilon = 1e-6);
    let expected = Vec3::new(1.0, 0.5, 0.0).normalize();
    assert!(n.abs_diff_eq(expected, 1e-6), "{n:?}");
}

#[test]
fn test_transform_unnormalized_normal_matrix_mode() {
    let matrix = Mat4::from_scale(Vec3::new(2.0, 2.0, 2.0));
    let mut attribute = bound::<Vec3>(custom(TransformMode::NormalMatMulVec3Zero), 1);
    attribute.set(0, Vec3::X);
    transform_attribute_in_place(&mut attribute, &matrix);
    assert!(attribute.get(0).abs_diff_eq(Vec3::new(0.5, 0.0, 0.0), 1e-6));
}

#[test]
fn test_transform_tangent_keeps_handedness() {
    let matrix = Mat4::from_scale(Vec3::new(3.0, 1.0, 1.0));
    let mut tangents = bound::<Vec4>(AttributeDescriptors::TANGENT, 1);
    tangents.set(0, Vec4::new(1.0, 1.0, 0.0, -1.0));
    transform_attribute_in_place(&mut tangents, &matrix);
    let t = tangents.get(0);
    assert_abs_diff_eq!(t.truncate().length(), 1.0, epsilon = 1e-6);
    assert_eq!(t.w, -1.0);
    assert!(t.x > t.y);
}

#[test]
fn test_transform_propagates_absence() {
    let mut src = bound::<Vec3>(AttributeDescriptors::NORMAL, 3);
    src.set(1, Vec3::Z);
    let mut dst = bound::<Vec3>(AttributeDescriptors::NORMAL, 3);
    dst.fill(Vec3::X);
    transform_attribute(&src, &mut dst, &affine());
    assert!(!dst.has(0));
    assert!(dst.has(1));
    assert!(!dst.has(2));
}

// =============================================================================
// INTERPOLATION TESTS
// =============================================================================

#[test]
fn test_interpolation_renormalizes_over_present_sources() {
    let mut src = bound::<f32>(custom(TransformMode::None), 3);
    src.set(0, 10.0);
    src.set(2, 40.0);
    let mut dst = bound::<f32>(custom(TransformMode::None), 1);
    interpolate_attribute(&src, &mut dst, &[vec![(1.0, 0), (2.0, 1), (3.0, 2)]]);
    // Source 1 is absent: (1 * 10 + 3 * 40) / 4
    assert_abs_diff_eq!(dst.get(0), 32.5, epsilon = 1e-5);
}

#[test]
fn test_interpolation_without_present_sources_leaves_sentinel() {
    let src = bound::<Vec3>(AttributeDescriptors::CENTROID, 2);
    let mut dst = bound::<Vec3>(AttributeDescriptors::CENTROID, 2);
    let sentinel = Vec3::splat(-123.0);
    dst.set(0, sentinel);
    interpolate_attribute(&src, &mut dst, &[vec![(1.0, 0), (1.0, 1)], vec![(1.0, 1)]]);
    assert_eq!(dst.get(0), sentinel);
    assert!(!dst.has(1), "absent destination must stay absent");
}

#[test]
fn test_interpolation_zero_weights_leave_destination() {
    let mut src = bound::<f32>(custom(TransformMode::None), 1);
    src.set(0, 1.0);
    let mut dst = bound::<f32>(custom(TransformMode::None), 1);
    interpolate_attribute(&src, &mut dst, &[vec![(0.0, 0)]]);
    assert!(!dst.has(0));
}

#[test]
fn test_interpolation_normalizes_normals() {
    let mut src = bound::<Vec3>(AttributeDescriptors::NORMAL, 2);
    src.set(0, Vec3::X);
    src.set(1, Vec3::Y);
    let mut dst = bound::<Vec3>(AttributeDescriptors::NORMAL, 1);
    interpolate_attribute(&src, &mut dst, &[vec![(0.5, 0), (0.5, 1)]]);
    assert!(dst
        .get(0)
        .abs_diff_eq(Vec3::new(1.0, 1.0, 0.0).normalize(), 1e-6));
}

#[test]
fn test_interpolation_bitangent_is_not_renormalized() {
    // Three component values only renormalize in `Normalized` mode.
    let mut src = bound::<Vec3>(AttributeDescriptors::BITANGENT, 2);
    src.set(0, Vec3::X);
    src.set(1, Vec3::Y);
    let mut dst = bound::<Vec3>(AttributeDescriptors::BITANGENT, 1);
    interpolate_attribute(&src, &mut dst, &[vec![(1.0, 0), (1.0, 1)]]);
    assert!(dst.get(0).abs_diff_eq(Vec3::new(0.5, 0.5, 0.0), 1e-6));
}

#[test]
fn test_interpolation_mode_none_is_noop() {
    let mut src = bound::<Vec4>(AttributeDescriptors::JOINT_WEIGHTS_0, 1);
    src.set(0, Vec4::ONE);
    let mut dst = bound::<Vec4>(AttributeDescriptors::JOINT_WEIGHTS_0, 1);
    interpolate_attribute(&src, &mut dst, &[vec![(1.0, 0)]]);
    assert!(!dst.has(0));
}
