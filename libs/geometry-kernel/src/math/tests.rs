//! Tests for the vector helpers.

use approx::assert_abs_diff_eq;
use glam::Vec3;

use super::*;

#[test]
fn test_min_axis_picks_smallest_component() {
    assert_eq!(min_axis(Vec3::new(0.1, 5.0, -3.0)), Vec3::X);
    assert_eq!(min_axis(Vec3::new(4.0, -0.5, 3.0)), Vec3::Y);
    assert_eq!(min_axis(Vec3::new(4.0, 2.0, 0.0)), Vec3::Z);
}

#[test]
fn test_min_axis_ties_prefer_x() {
    assert_eq!(min_axis(Vec3::ONE), Vec3::X);
    assert_eq!(min_axis(Vec3::new(2.0, 1.0, 1.0)), Vec3::Y);
}

#[test]
fn test_max_axis_index_uses_absolute_values() {
    assert_eq!(max_axis_index(Vec3::new(-9.0, 1.0, 2.0)), 0);
    assert_eq!(max_axis_index(Vec3::new(0.0, -3.0, 2.0)), 1);
    assert_eq!(max_axis_index(Vec3::new(0.0, 0.0, 1.0)), 2);
}

#[test]
fn test_safe_normalize_cross_is_unit_for_regular_input() {
    let c = safe_normalize_cross(Vec3::X, Vec3::new(1.0, 1.0, 0.0).normalize());
    assert_abs_diff_eq!(c.length(), 1.0, epsilon = 1e-6);
    assert_abs_diff_eq!(c.z, 1.0, epsilon = 1e-6);
}

#[test]
fn test_safe_normalize_cross_falls_back_for_parallel_input() {
    let lhs = Vec3::new(0.0, 0.0, 1.0);
    assert_eq!(safe_normalize_cross(lhs, lhs), Vec3::X);
    assert_eq!(safe_normalize_cross(lhs, -lhs), Vec3::X);
}

#[test]
fn test_safe_normalize_cross_falls_back_for_zero_input() {
    assert_eq!(safe_normalize_cross(Vec3::ZERO, Vec3::Y), Vec3::X);
}

#[test]
fn test_project_onto_axis() {
    let p = project(Vec3::new(3.0, 4.0, 5.0), Vec3::new(0.0, 2.0, 0.0));
    assert_eq!(p, Vec3::new(0.0, 4.0, 0.0));
}

#[test]
fn test_gram_schmidt_produces_orthonormal_basis() {
    let (a, b, c) = gram_schmidt(
        Vec3::new(0.0, 0.0, 2.0),
        Vec3::new(1.0, 0.0, 1.0),
        Vec3::new(1.0, 1.0, 1.0),
    );
    for v in [a, b, c] {
        assert_abs_diff_eq!(v.length(), 1.0, epsilon = 1e-6);
    }
    assert_abs_diff_eq!(a.dot(b), 0.0, epsilon = 1e-6);
    assert_abs_diff_eq!(a.dot(c), 0.0, epsilon = 1e-6);
    assert_abs_diff_eq!(b.dot(c), 0.0, epsilon = 1e-6);
    assert_eq!(a, Vec3::Z);
}

#[test]
fn test_vec3_from_index_splits_bytes() {
    let color = vec3_from_index(0x00ff_8000);
    assert_abs_diff_eq!(color.x, 1.0);
    assert_abs_diff_eq!(color.y, 128.0 / 255.0);
    assert_abs_diff_eq!(color.z, 0.0);
    assert_eq!(vec3_from_index(0x0100_0000), Vec3::ZERO);
}
