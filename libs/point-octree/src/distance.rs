//! # Distance Metrics
//!
//! Point coordinate access and the distance policies used by octree queries.
//!
//! A policy works in its own "squared" space: `compute` and `norm` return
//! values comparable with `sqr(radius)`, and `sqrt` maps back. For L2 this
//! avoids square roots in the inner loops; L1 and Max are already linear.

use glam::Vec3;

// =============================================================================
// POINT ACCESS
// =============================================================================

/// Read access to the three coordinates of a point.
pub trait Point3 {
    /// X coordinate.
    fn x(&self) -> f32;
    /// Y coordinate.
    fn y(&self) -> f32;
    /// Z coordinate.
    fn z(&self) -> f32;
}

impl Point3 for Vec3 {
    #[inline]
    fn x(&self) -> f32 {
        self.x
    }

    #[inline]
    fn y(&self) -> f32 {
        self.y
    }

    #[inline]
    fn z(&self) -> f32 {
        self.z
    }
}

impl Point3 for [f32; 3] {
    #[inline]
    fn x(&self) -> f32 {
        self[0]
    }

    #[inline]
    fn y(&self) -> f32 {
        self[1]
    }

    #[inline]
    fn z(&self) -> f32 {
        self[2]
    }
}

// =============================================================================
// DISTANCE POLICIES
// =============================================================================

/// Distance metric plugged into octree queries.
///
/// Custom metrics implement this trait. `norm` receives non-negative
/// per-axis offsets.
pub trait Distance {
    /// Distance between two points, in the metric's comparison space.
    fn compute<P: Point3>(p: &P, q: &P) -> f32;

    /// Norm of an offset vector, in the metric's comparison space.
    fn norm(x: f32, y: f32, z: f32) -> f32;

    /// Maps a radius into the comparison space.
    fn sqr(r: f32) -> f32;

    /// Maps a comparison space value back to a radius.
    fn sqrt(r: f32) -> f32;
}

/// Manhattan distance.
#[derive(Debug, Clone, Copy, Default)]
pub struct L1Distance;

impl Distance for L1Distance {
    #[inline]
    fn compute<P: Point3>(p: &P, q: &P) -> f32 {
        (p.x() - q.x()).abs() + (p.y() - q.y()).abs() + (p.z() - q.z()).abs()
    }

    #[inline]
    fn norm(x: f32, y: f32, z: f32) -> f32 {
        x.abs() + y.abs() + z.abs()
    }

    #[inline]
    fn sqr(r: f32) -> f32 {
        r
    }

    #[inline]
    fn sqrt(r: f32) -> f32 {
        r
    }
}

/// Euclidean distance, compared squared.
#[derive(Debug, Clone, Copy, Default)]
pub struct L2Distance;

impl Distance for L2Distance {
    #[inline]
    fn compute<P: Point3>(p: &P, q: &P) -> f32 {
        let dx = p.x() - q.x();
        let dy = p.y() - q.y();
        let dz = p.z() - q.z();
        dx * dx + dy * dy + dz * dz
    }

    #[inline]
    fn norm(x: f32, y: f32, z: f32) -> f32 {
        x * x + y * y + z * z
    }

    #[inline]
    fn sqr(r: f32) -> f32 {
        r * r
    }

    #[inline]
    fn sqrt(r: f32) -> f32 {
        r.sqrt()
    }
}

/// Chebyshev distance.
#[derive(Debug, Clone, Copy, Default)]
pub struct MaxDistance;

impl Distance for MaxDistance {
    #[inline]
    fn compute<P: Point3>(p: &P, q: &P) -> f32 {
        let dx = (p.x() - q.x()).abs();
        let dy = (p.y() - q.y()).abs();
        let dz = (p.z() - q.z()).abs();
        dx.max(dy).max(dz)
    }

    #[inline]
    fn norm(x: f32, y: f32, z: f32) -> f32 {
        x.max(y).max(z)
    }

    #[inline]
    fn sqr(r: f32) -> f32 {
        r
    }

    #[inline]
    fn sqrt(r: f32) -> f32 {
        r
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_l1_sums_axis_offsets() {
        let p = Vec3::new(1.0, 2.0, 3.0);
        let q = Vec3::new(0.0, 4.0, 3.5);
        assert_eq!(L1Distance::compute(&p, &q), 3.5);
        assert_eq!(L1Distance::sqr(2.0), 2.0);
    }

    #[test]
    fn test_l2_compares_squared() {
        let p = [0.0, 0.0, 0.0];
        let q = [3.0, 4.0, 0.0];
        assert_eq!(L2Distance::compute(&p, &q), 25.0);
        assert_eq!(L2Distance::sqr(5.0), 25.0);
        assert_eq!(L2Distance::sqrt(25.0), 5.0);
        assert_eq!(L2Distance::norm(3.0, 4.0, 0.0), 25.0);
    }

    #[test]
    fn test_max_takes_largest_axis() {
        let p = Vec3::new(1.0, -2.0, 0.5);
        let q = Vec3::ZERO;
        assert_eq!(MaxDistance::compute(&p, &q), 2.0);
        assert_eq!(MaxDistance::norm(0.1, 0.3, 0.2), 0.3);
    }

    #[test]
    fn test_array_and_vec3_points_agree() {
        let a = Vec3::new(0.25, 0.5, 0.75);
        let b = Vec3::new(1.0, 1.0, 1.0);
        assert_eq!(
            L2Distance::compute(&a, &b),
            L2Distance::compute(&a.to_array(), &b.to_array())
        );
    }
}
