//! Tests for the repair pipeline.

use std::collections::HashSet;

use glam::{Vec3, Vec4};

use super::*;

// =============================================================================
// FIXTURES
// =============================================================================

/// Outward facing quads of a cube with corner index `x + 2y + 4z`.
const CUBE_FACETS: [[u32; 4]; 6] = [
    [0, 2, 3, 1],
    [4, 5, 7, 6],
    [0, 1, 5, 4],
    [2, 6, 7, 3],
    [0, 4, 6, 2],
    [1, 3, 7, 5],
];

/// Top facet in `CUBE_FACETS`.
const TOP: usize = 1;

fn add_cube(geometry: &mut Geometry, min: Vec3, size: f32, skip: Option<usize>, inward: bool) {
    let mesh = geometry.mesh_mut();
    let base = mesh.vertex_count() as u32;
    for i in 0..8u32 {
        let corner = Vec3::new((i & 1) as f32, ((i >> 1) & 1) as f32, ((i >> 2) & 1) as f32);
        mesh.add_vertex(min + corner * size);
    }
    for (index, facet) in CUBE_FACETS.iter().enumerate() {
        if skip == Some(index) {
            continue;
        }
        let mut vertices: Vec<u32> = facet.iter().map(|v| v + base).collect();
        if inward {
            vertices.reverse();
        }
        mesh.add_facet(&vertices).unwrap();
    }
}

fn cube(size: f32, skip: Option<usize>) -> Geometry {
    let mut geometry = Geometry::named("cube");
    add_cube(&mut geometry, Vec3::ZERO, size, skip, false);
    geometry
}

fn is_closed(geometry: &Geometry) -> bool {
    let mesh = geometry.mesh();
    let mut edges = HashSet::new();
    for facet in mesh.facets() {
        let v = mesh.facet_vertices(facet);
        for i in 0..v.len() {
            edges.insert((v[i], v[(i + 1) % v.len()]));
        }
    }
    edges.iter().all(|&(a, b)| edges.contains(&(b, a)))
}

// =============================================================================
// PIPELINE
// =============================================================================

#[test]
fn test_closed_cube_is_unchanged() {
    let source = cube(1.0, None);
    let (repaired, report) = repair_with_report(&source);
    assert_eq!(report, RepairReport::default());
    assert_eq!(repaired.mesh().vertex_count(), 8);
    assert_eq!(repaired.mesh().facet_count(), 6);
    assert_eq!(repaired.get_name(), "repair(cube)");
}

#[test]
fn test_small_hole_is_filled() {
    let source = cube(0.05, Some(TOP));
    let (repaired, report) = repair_with_report(&source);
    assert_eq!(report.filled_holes, 1);
    assert_eq!(report.skipped_holes, 0);
    // The two fill triangles merge back into one quad.
    assert_eq!(report.merged_coplanar_pairs, 1);
    assert_eq!(repaired.mesh().facet_count(), 6);
    assert!(is_closed(&repaired));
}

#[test]
fn test_large_hole_is_skipped() {
    let source = cube(1.0, Some(TOP));
    let (repaired, report) = repair_with_report(&source);
    assert_eq!(report.filled_holes, 0);
    assert_eq!(report.skipped_holes, 1);
    assert_eq!(repaired.mesh().facet_count(), 5);
    assert!(!is_closed(&repaired));
}

#[test]
fn test_hole_area_follows_config() {
    let source = cube(1.0, Some(TOP));
    let config = GeometryConfig::new(0.005, 2.0, 0.99).unwrap();
    let (repaired, report) = repair_with_config(&source, &config);
    assert_eq!(report.filled_holes, 1);
    assert!(is_closed(&repaired));
}

#[test]
fn test_internal_shell_is_removed() {
    let mut source = cube(1.0, None);
    add_cube(&mut source, Vec3::splat(0.4), 0.2, None, false);
    let (repaired, report) = repair_with_report(&source);
    assert_eq!(report.removed_shells, 1);
    assert_eq!(report.removed_isolated_vertices, 8);
    assert_eq!(repaired.mesh().vertex_count(), 8);
    assert_eq!(repaired.mesh().facet_count(), 6);
}

#[test]
fn test_cavity_is_kept() {
    let mut source = cube(1.0, None);
    add_cube(&mut source, Vec3::splat(0.4), 0.2, None, true);
    let (repaired, report) = repair_with_report(&source);
    assert_eq!(report.removed_shells, 0);
    assert_eq!(repaired.mesh().facet_count(), 12);
}

#[test]
fn test_separate_cubes_are_kept() {
    let mut source = cube(1.0, None);
    add_cube(&mut source, Vec3::new(3.0, 0.0, 0.0), 1.0, None, false);
    let (repaired, report) = repair_with_report(&source);
    assert_eq!(report.removed_shells, 0);
    assert_eq!(repaired.mesh().facet_count(), 12);
}

#[test]
fn test_colocated_vertices_merge() {
    let mut source = Geometry::named("pair");
    let mesh = source.mesh_mut();
    for p in [Vec3::ZERO, Vec3::X, Vec3::Y, Vec3::X, Vec3::new(1.0, 1.0, 0.0)] {
        mesh.add_vertex(p);
    }
    mesh.add_facet(&[0, 1, 2]).unwrap();
    mesh.add_facet(&[2, 3, 4]).unwrap();
    let (repaired, report) = repair_with_report(&source);
    assert_eq!(report.merged_vertices, 1);
    assert_eq!(report.removed_isolated_vertices, 1);
    assert_eq!(repaired.mesh().vertex_count(), 4);
}

#[test]
fn test_collapsed_facet_is_removed() {
    let mut source = Geometry::named("sliver");
    let mesh = source.mesh_mut();
    for p in [Vec3::ZERO, Vec3::X, Vec3::Y, Vec3::X] {
        mesh.add_vertex(p);
    }
    mesh.add_facet(&[0, 1, 2]).unwrap();
    mesh.add_facet(&[1, 3, 2]).unwrap();
    let (repaired, report) = repair_with_report(&source);
    assert_eq!(report.removed_degenerate_facets, 1);
    assert_eq!(repaired.mesh().facet_count(), 1);
}

#[test]
fn test_duplicate_facet_is_removed() {
    let mut source = Geometry::named("twice");
    let mesh = source.mesh_mut();
    for p in [Vec3::ZERO, Vec3::X, Vec3::Y] {
        mesh.add_vertex(p);
    }
    mesh.add_facet(&[0, 1, 2]).unwrap();
    mesh.add_facet(&[1, 2, 0]).unwrap();
    let (repaired, report) = repair_with_report(&source);
    assert_eq!(report.removed_duplicate_facets, 1);
    assert_eq!(repaired.mesh().facet_count(), 1);
}

#[test]
fn test_crossing_triangles_are_split() {
    let mut source = Geometry::named("crossing");
    let mesh = source.mesh_mut();
    for p in [
        Vec3::new(0.0, 0.0, 0.0),
        Vec3::new(1.0, 0.0, 0.0),
        Vec3::new(0.0, 1.0, 0.0),
        Vec3::new(0.2, 0.2, -1.0),
        Vec3::new(0.2, 0.2, 1.0),
        Vec3::new(0.3, -1.0, 0.0),
    ] {
        mesh.add_vertex(p);
    }
    mesh.add_facet(&[0, 1, 2]).unwrap();
    mesh.add_facet(&[3, 4, 5]).unwrap();
    let (repaired, report) = repair_with_report(&source);
    assert_eq!(report.resolved_intersections, 1);
    assert_eq!(report.intersecting_pairs, 0);
    // Each triangle becomes two pieces; pieces sharing two cut edges stay apart.
    assert_eq!(repaired.mesh().facet_count(), 4);
    // Both cut ends and the far crossing on the first triangle are new.
    assert_eq!(repaired.mesh().vertex_count(), 9);
    for facet in repaired.mesh().facets() {
        assert!(repaired.facet_normal(facet).is_some());
    }
}

#[test]
fn test_source_is_untouched() {
    let source = cube(0.05, Some(TOP));
    let before = source.mesh().clone();
    let _ = repair(&source);
    assert_eq!(source.mesh(), &before);
}

#[test]
fn test_fill_corners_average_vertex_corners() {
    let mut source = cube(0.05, Some(TOP));
    let corner_count = source.mesh().corner_count();
    let colors = &mut source.attributes_mut().corner.color_0;
    for corner in 0..corner_count as u32 {
        colors.set(corner, Vec4::ONE);
    }

    let repaired = repair(&source);
    let colors = &repaired.attributes().corner.color_0;
    assert_eq!(colors.present_count(), repaired.mesh().corner_count());
    for (_, color) in colors.iter_present() {
        assert!((color - Vec4::ONE).abs().max_element() < 1e-5);
    }
}

#[test]
fn test_fill_corners_include_colocated_vertex_corners() {
    let mut source = Geometry::named("seam");
    let mesh = source.mesh_mut();
    for i in 0..8u32 {
        let corner = Vec3::new((i & 1) as f32, ((i >> 1) & 1) as f32, ((i >> 2) & 1) as f32);
        mesh.add_vertex(corner * 0.05);
    }
    // Facet [0, 1, 5, 4] reaches vertex 4 through its own duplicate.
    let duplicate = mesh.add_vertex(mesh.position(4));
    for (index, facet) in CUBE_FACETS.iter().enumerate() {
        if index == TOP {
            continue;
        }
        let vertices: Vec<u32> = facet
            .iter()
            .map(|&v| if index == 2 && v == 4 { duplicate } else { v })
            .collect();
        mesh.add_facet(&vertices).unwrap();
    }
    for corner in 0..source.mesh().corner_count() as u32 {
        let color = if source.mesh().corner_vertex(corner) == duplicate {
            Vec4::new(1.0, 0.0, 0.0, 1.0)
        } else {
            Vec4::ONE
        };
        source.attributes_mut().corner.color_0.set(corner, color);
    }

    let (repaired, report) = repair_with_report(&source);
    assert_eq!(report.merged_vertices, 1);
    assert_eq!(report.filled_holes, 1);
    // Fill corners at the merged vertex blend the white and red corners.
    let blended = repaired
        .attributes()
        .corner
        .color_0
        .iter_present()
        .filter(|(_, color)| color.y > 0.1 && color.y < 0.9)
        .count();
    assert!(blended > 0);
}

// =============================================================================
// STAGES
// =============================================================================

#[test]
fn test_boundary_loop_winding_closes_the_hole() {
    let source = cube(1.0, Some(TOP));
    let workspace = Workspace::new(&source);
    let loops = holes::detect_holes(&workspace);
    assert_eq!(loops.len(), 1);
    assert_eq!(loops[0].edge_count(), 4);
    assert!(loops[0].is_valid());
    approx::assert_relative_eq!(loops[0].area(&workspace.positions), 1.0, epsilon = 1e-6);

    let mut edges = workspace.directed_edges();
    let n = loops[0].vertices.len();
    for i in 0..n {
        *edges
            .entry((loops[0].vertices[i], loops[0].vertices[(i + 1) % n]))
            .or_insert(0) += 1;
    }
    assert!(edges.keys().all(|&(a, b)| edges.contains_key(&(b, a))));
}

#[test]
fn test_concave_loop_triangulates_inside() {
    // L shape in the xy plane, counterclockwise.
    let positions = [
        Vec3::new(0.0, 0.0, 0.0),
        Vec3::new(2.0, 0.0, 0.0),
        Vec3::new(2.0, 1.0, 0.0),
        Vec3::new(1.0, 1.0, 0.0),
        Vec3::new(1.0, 2.0, 0.0),
        Vec3::new(0.0, 2.0, 0.0),
    ];
    let boundary = holes::BoundaryLoop {
        vertices: (0..6).collect(),
    };
    let triangles = holes::triangulate(&boundary, &positions);
    assert_eq!(triangles.len(), 4);
    let area: f32 = triangles
        .iter()
        .map(|t| {
            let [a, b, c] = t.map(|v| positions[v as usize]);
            0.5 * (b - a).cross(c - a).z
        })
        .sum();
    approx::assert_relative_eq!(area, 3.0, epsilon = 1e-5);
}
