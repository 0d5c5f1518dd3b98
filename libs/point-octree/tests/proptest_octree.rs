//! Property-based tests comparing octree queries with brute force scans.

use glam::Vec3;
use point_octree::{Distance, L1Distance, L2Distance, MaxDistance, Octree, OctreeParams};
use proptest::prelude::*;

fn arb_point() -> impl Strategy<Value = Vec3> {
    (-10.0f32..10.0, -10.0f32..10.0, -10.0f32..10.0).prop_map(|(x, y, z)| Vec3::new(x, y, z))
}

fn arb_points() -> impl Strategy<Value = Vec<Vec3>> {
    prop::collection::vec(arb_point(), 1..300)
}

fn arb_params() -> impl Strategy<Value = OctreeParams> {
    (1u32..40, any::<bool>()).prop_map(|(bucket_size, copy_points)| OctreeParams {
        bucket_size,
        copy_points,
        min_extent: 0.0,
    })
}

/// Checks that the octree result equals the brute force set, ignoring points
/// whose distance is within rounding noise of the radius.
fn check_radius<D: Distance>(points: &[Vec3], params: OctreeParams, query: Vec3, radius: f32) {
    let octree = Octree::new(points, params);
    let mut found = Vec::new();
    octree.radius_neighbors::<D>(&query, radius, &mut found);
    found.sort_unstable();

    let mut unique = found.clone();
    unique.dedup();
    assert_eq!(unique.len(), found.len(), "duplicate indices reported");

    let sqr_radius = D::sqr(radius);
    let noise = 1e-4 * sqr_radius.max(1.0);
    for (index, point) in points.iter().enumerate() {
        let distance = D::compute(&query, point);
        if (distance - sqr_radius).abs() <= noise {
            continue;
        }
        let expected = distance < sqr_radius;
        let reported = found.binary_search(&(index as u32)).is_ok();
        assert_eq!(
            expected, reported,
            "point {index} at {distance} vs radius {sqr_radius}"
        );
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(128))]

    #[test]
    fn test_radius_neighbors_l2_matches_brute_force(
        points in arb_points(),
        params in arb_params(),
        query in arb_point(),
        radius in 0.01f32..8.0,
    ) {
        check_radius::<L2Distance>(&points, params, query, radius);
    }

    #[test]
    fn test_radius_neighbors_l1_matches_brute_force(
        points in arb_points(),
        params in arb_params(),
        query in arb_point(),
        radius in 0.01f32..8.0,
    ) {
        check_radius::<L1Distance>(&points, params, query, radius);
    }

    #[test]
    fn test_radius_neighbors_max_matches_brute_force(
        points in arb_points(),
        params in arb_params(),
        query in arb_point(),
        radius in 0.01f32..8.0,
    ) {
        check_radius::<MaxDistance>(&points, params, query, radius);
    }

    #[test]
    fn test_find_neighbor_distance_matches_brute_force(
        points in arb_points(),
        params in arb_params(),
        query in arb_point(),
    ) {
        let octree = Octree::new(&points, params);
        let found = octree.find_neighbor::<L2Distance>(&query, -1.0);
        let best = points
            .iter()
            .map(|p| L2Distance::compute(&query, p))
            .fold(f32::INFINITY, f32::min);
        let Some(found) = found else {
            panic!("non-empty tree must report a neighbor");
        };
        let found_distance = L2Distance::compute(&query, &points[found as usize]);
        prop_assert!((found_distance - best).abs() <= 1e-4 * best.max(1.0));
    }
}
