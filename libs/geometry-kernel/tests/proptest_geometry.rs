//! Property-based tests for attribute propagation, topology, weld and hull.
//!
//! Run with: cargo test -p geometry-kernel --test proptest_geometry

mod common;

use geometry_kernel::attribute::{
    interpolate_attribute, transform_attribute, transform_attribute_in_place, AttributeDescriptor,
    AttributePresent, InterpolationMode, TransformMode,
};
use geometry_kernel::operation::{make_convex_hull, weld};
use geometry_kernel::{Geometry, ProcessFlags};
use glam::{Mat4, Quat, Vec3};
use proptest::prelude::*;

// =============================================================================
// STRATEGIES
// =============================================================================

fn arb_vec3(range: f32) -> impl Strategy<Value = Vec3> {
    (-range..range, -range..range, -range..range).prop_map(|(x, y, z)| Vec3::new(x, y, z))
}

/// Well conditioned affine matrix: scale, rotation, translation.
fn arb_matrix() -> impl Strategy<Value = Mat4> {
    (
        (0.5f32..2.0, 0.5f32..2.0, 0.5f32..2.0),
        arb_vec3(1.0),
        0.0f32..std::f32::consts::TAU,
        arb_vec3(10.0),
    )
        .prop_map(|((sx, sy, sz), axis, angle, translation)| {
            let axis = axis.try_normalize().unwrap_or(Vec3::Z);
            Mat4::from_scale_rotation_translation(
                Vec3::new(sx, sy, sz),
                Quat::from_axis_angle(axis, angle),
                translation,
            )
        })
}

/// Values with a presence mask.
fn arb_sparse_values() -> impl Strategy<Value = Vec<Option<Vec3>>> {
    prop::collection::vec(prop::option::of(arb_vec3(10.0)), 1..40)
}

fn store(mode: TransformMode, values: &[Option<Vec3>]) -> AttributePresent<Vec3> {
    let mut attribute = AttributePresent::new(AttributeDescriptor::new(
        0,
        "value",
        mode,
        InterpolationMode::Linear,
    ));
    attribute.bind(values.len());
    for (key, value) in values.iter().enumerate() {
        if let Some(value) = value {
            attribute.set(key as u32, *value);
        }
    }
    attribute
}

/// Triangles over a coarse grid so that many vertices fall within the weld
/// radius of each other.
fn arb_grid_geometry() -> impl Strategy<Value = Geometry> {
    let position = (0u8..6, 0u8..6, 0u8..3)
        .prop_map(|(x, y, z)| Vec3::new(f32::from(x), f32::from(y), f32::from(z)) * 0.004);
    prop::collection::vec(position, 3..30).prop_flat_map(|positions| {
        let n = positions.len() as u32;
        prop::collection::vec(prop::array::uniform3(0..n), 1..30).prop_map(move |facets| {
            let mut geometry = Geometry::named("grid");
            let mesh = geometry.mesh_mut();
            for &p in &positions {
                mesh.add_vertex(p);
            }
            for facet in &facets {
                mesh.add_facet(facet).unwrap();
            }
            geometry
        })
    })
}

/// Triangles with distinct vertices over a small vertex set.
fn arb_topology_geometry() -> impl Strategy<Value = Geometry> {
    prop::collection::vec(arb_vec3(5.0), 3..12).prop_flat_map(|positions| {
        let n = positions.len() as u32;
        let triangle = prop::sample::subsequence((0..n).collect::<Vec<u32>>(), 3).prop_shuffle();
        prop::collection::vec(triangle, 1..20).prop_map(move |facets| {
            let mut geometry = Geometry::named("random");
            let mesh = geometry.mesh_mut();
            for &p in &positions {
                mesh.add_vertex(p);
            }
            for facet in &facets {
                mesh.add_facet(facet).unwrap();
            }
            geometry
        })
    })
}

// =============================================================================
// ATTRIBUTE PROPERTIES
// =============================================================================

proptest! {
    #[test]
    fn test_position_transform_round_trip(values in arb_sparse_values(), matrix in arb_matrix()) {
        let mut attribute = store(TransformMode::MatMulVec3One, &values);
        transform_attribute_in_place(&mut attribute, &matrix);
        transform_attribute_in_place(&mut attribute, &matrix.inverse());
        for (key, value) in values.iter().enumerate() {
            match value {
                Some(value) => {
                    let back = attribute.get(key as u32);
                    prop_assert!((back - *value).length() < 1e-3, "{back} != {value}");
                }
                None => prop_assert!(!attribute.has(key as u32)),
            }
        }
    }

    #[test]
    fn test_direction_transform_round_trip(values in arb_sparse_values(), matrix in arb_matrix()) {
        let mut attribute = store(TransformMode::MatMulVec3Zero, &values);
        transform_attribute_in_place(&mut attribute, &matrix);
        transform_attribute_in_place(&mut attribute, &matrix.inverse());
        for (key, value) in values.iter().enumerate() {
            if let Some(value) = value {
                prop_assert!((attribute.get(key as u32) - *value).length() < 1e-3);
            }
        }
    }

    #[test]
    fn test_normalized_transform_is_unit(values in arb_sparse_values(), matrix in arb_matrix()) {
        let values: Vec<Option<Vec3>> = values
            .into_iter()
            .map(|v| v.filter(|v| v.length() > 1e-2))
            .collect();
        let source = store(TransformMode::NormalizeMatMulVec3Zero, &values);
        let mut destination = store(TransformMode::NormalizeMatMulVec3Zero, &[]);
        transform_attribute(&source, &mut destination, &matrix);
        for (_, value) in destination.iter_present() {
            prop_assert!((value.length() - 1.0).abs() < 1e-4);
        }
    }

    #[test]
    fn test_transform_keeps_presence(values in arb_sparse_values(), matrix in arb_matrix()) {
        let source = store(TransformMode::MatMulVec3One, &values);
        let mut destination = store(TransformMode::MatMulVec3One, &[]);
        transform_attribute(&source, &mut destination, &matrix);
        prop_assert_eq!(destination.len(), values.len());
        for (key, value) in values.iter().enumerate() {
            prop_assert_eq!(destination.has(key as u32), value.is_some());
        }
    }

    #[test]
    fn test_interpolation_renormalizes_over_present_sources(
        values in arb_sparse_values(),
        picks in prop::collection::vec((0.1f32..2.0, any::<prop::sample::Index>()), 1..6),
    ) {
        let source = store(TransformMode::None, &values);
        let sources: Vec<(f32, u32)> = picks
            .iter()
            .map(|(w, index)| (*w, index.index(values.len()) as u32))
            .collect();

        let sentinel = Vec3::splat(-99.0);
        let mut destination = store(TransformMode::None, &[Some(sentinel)]);
        interpolate_attribute(&source, &mut destination, &[sources.clone()]);

        let present: Vec<(f32, Vec3)> = sources
            .iter()
            .filter_map(|&(w, key)| values[key as usize].map(|v| (w, v)))
            .collect();
        if present.is_empty() {
            prop_assert_eq!(destination.get(0), sentinel);
        } else {
            let total: f32 = present.iter().map(|(w, _)| w).sum();
            let expected = present.iter().fold(Vec3::ZERO, |sum, (w, v)| sum + *v * (*w / total));
            prop_assert!((destination.get(0) - expected).length() < 1e-3);
        }
    }

    #[test]
    fn test_interpolation_presence_is_monotonic(
        values in arb_sparse_values(),
        lists in prop::collection::vec(
            prop::collection::vec((0.1f32..2.0, any::<prop::sample::Index>()), 0..4),
            1..10,
        ),
    ) {
        let source = store(TransformMode::None, &values);
        let sources: Vec<Vec<(f32, u32)>> = lists
            .iter()
            .map(|list| list.iter().map(|(w, i)| (*w, i.index(values.len()) as u32)).collect())
            .collect();
        let mut destination = store(TransformMode::None, &vec![None; sources.len()]);
        interpolate_attribute(&source, &mut destination, &sources);
        for (key, list) in sources.iter().enumerate() {
            let any_present = list.iter().any(|&(_, src)| values[src as usize].is_some());
            prop_assert_eq!(destination.has(key as u32), any_present);
        }
    }
}

// =============================================================================
// TOPOLOGY AND WELD PROPERTIES
// =============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn test_edge_lookup_is_symmetric(mut geometry in arb_topology_geometry()) {
        geometry.process(ProcessFlags::BUILD_EDGES);
        let vertex_count = geometry.mesh().vertex_count() as u32;
        let topology = geometry.topology();
        for a in 0..vertex_count {
            for b in (a + 1)..vertex_count {
                prop_assert_eq!(topology.get_edge(a, b), topology.get_edge(b, a));
            }
        }
        for (index, edge) in topology.edges().iter().enumerate() {
            prop_assert_eq!(topology.get_edge(edge.a, edge.b), Some(index as u32));
        }
    }

    #[test]
    fn test_weld_is_idempotent(geometry in arb_grid_geometry()) {
        let once = weld(&geometry);
        let twice = weld(&once);
        prop_assert_eq!(once.mesh().vertex_count(), twice.mesh().vertex_count());
        prop_assert_eq!(once.mesh().facet_count(), twice.mesh().facet_count());
        prop_assert_eq!(once.mesh().positions(), twice.mesh().positions());
    }

    #[test]
    fn test_weld_output_has_no_collapsed_facets(geometry in arb_grid_geometry()) {
        let welded = weld(&geometry);
        let mesh = welded.mesh();
        for facet in mesh.facets() {
            let vertices = mesh.facet_vertices(facet);
            prop_assert!(vertices.len() >= 3);
            for i in 0..vertices.len() {
                prop_assert_ne!(vertices[i], vertices[(i + 1) % vertices.len()]);
            }
        }
    }
}

// =============================================================================
// CONVEX HULL PROPERTIES
// =============================================================================

proptest! {
    #[test]
    fn test_convex_hull_contains_every_point(positions in prop::collection::vec(arb_vec3(5.0), 4..40)) {
        let mut geometry = Geometry::named("cloud");
        for &p in &positions {
            geometry.mesh_mut().add_vertex(p);
        }
        let Ok(hull) = make_convex_hull(&geometry) else {
            return Ok(());
        };
        prop_assert!(common::is_closed(&hull));
        let mesh = hull.mesh();
        for facet in mesh.facets() {
            let Some(normal) = hull.facet_normal(facet) else {
                continue;
            };
            let origin = mesh.position(mesh.facet_vertices(facet)[0]);
            for &p in &positions {
                prop_assert!(normal.dot(p - origin) <= 1e-3);
            }
        }
        let properties = hull.get_mass_properties();
        prop_assert!(properties.map_or(true, |p| p.signed_volume >= 0.0));
    }
}

#[test]
fn test_weld_translated_cube_copy() {
    let source = common::with_translated_copy(&common::cube(1.0), Vec3::new(0.0001, 0.0, 0.0));
    let welded = weld(&source);
    assert_eq!(welded.mesh().vertex_count(), 8);
    assert_eq!(welded.mesh().facet_count(), 6);
}
