//! # Math Helpers
//!
//! Small vector helpers shared by the processing steps.

use config::constants::SAFE_NORMALIZE_PARALLEL_DOT;
use glam::Vec3;

/// Returns the unit axis along which `v` has its smallest absolute component.
///
/// Ties prefer X, then Y.
#[inline]
pub fn min_axis(v: Vec3) -> Vec3 {
    let a = v.abs();
    if a.x <= a.y && a.x <= a.z {
        Vec3::X
    } else if a.y <= a.x && a.y <= a.z {
        Vec3::Y
    } else {
        Vec3::Z
    }
}

/// Returns the index of the axis along which `v` has its largest absolute
/// component.
///
/// Ties prefer X, then Y.
#[inline]
pub fn max_axis_index(v: Vec3) -> usize {
    let a = v.abs();
    if a.x >= a.y && a.x >= a.z {
        0
    } else if a.y >= a.x && a.y >= a.z {
        1
    } else {
        2
    }
}

/// Normalized cross product that never returns a degenerate vector.
///
/// Nearly parallel inputs and vanishing cross products fall back to
/// [`min_axis`] of `lhs`.
pub fn safe_normalize_cross(lhs: Vec3, rhs: Vec3) -> Vec3 {
    let d = lhs.dot(rhs);
    if d.abs() > SAFE_NORMALIZE_PARALLEL_DOT {
        return min_axis(lhs);
    }

    let c0 = lhs.cross(rhs);
    if c0.length() < f32::EPSILON {
        return min_axis(lhs);
    }
    c0.normalize()
}

/// Projects `a` onto `b`.
#[inline]
pub fn project(a: Vec3, b: Vec3) -> Vec3 {
    a.dot(b) / b.dot(b) * b
}

/// Orthonormalizes `(a, b, c)` keeping the direction of `a`.
pub fn gram_schmidt(a: Vec3, b: Vec3, c: Vec3) -> (Vec3, Vec3, Vec3) {
    let out_b = b - project(b, a);
    let out_c = c - project(c, out_b) - project(c, a);
    (a.normalize(), out_b.normalize(), out_c.normalize())
}

/// Encodes the low 24 bits of an index as an RGB color in `[0, 1]`.
#[inline]
pub fn vec3_from_index(i: u32) -> Vec3 {
    let r = (i >> 16) & 0xff;
    let g = (i >> 8) & 0xff;
    let b = i & 0xff;
    Vec3::new(r as f32 / 255.0, g as f32 / 255.0, b as f32 / 255.0)
}

#[cfg(test)]
mod tests;
