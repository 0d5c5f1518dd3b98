//! Tests for mesh storage.

use glam::Vec3;

use super::*;

fn quad_strip() -> Mesh {
    // 3---2---5
    // |   |   |
    // 0---1---4
    let mut mesh = Mesh::new();
    for p in [
        Vec3::new(0.0, 0.0, 0.0),
        Vec3::new(1.0, 0.0, 0.0),
        Vec3::new(1.0, 1.0, 0.0),
        Vec3::new(0.0, 1.0, 0.0),
        Vec3::new(2.0, 0.0, 0.0),
        Vec3::new(2.0, 1.0, 0.0),
    ] {
        mesh.add_vertex(p);
    }
    mesh.add_facet(&[0, 1, 2, 3]).unwrap();
    mesh.add_facet(&[1, 4, 5, 2]).unwrap();
    mesh
}

#[test]
fn test_add_facet_validates_input() {
    let mut mesh = Mesh::new();
    mesh.add_vertex(Vec3::ZERO);
    mesh.add_vertex(Vec3::X);

    assert_eq!(
        mesh.add_facet(&[0, 1]),
        Err(GeometryError::TooFewCorners { corner_count: 2 })
    );
    assert_eq!(
        mesh.add_facet(&[0, 1, 7]),
        Err(GeometryError::InvalidVertexIndex {
            corner: 2,
            vertex: 7,
            vertex_count: 2
        })
    );
    assert_eq!(mesh.facet_count(), 0);
    assert_eq!(mesh.corner_count(), 0);
}

#[test]
fn test_corners_are_contiguous() {
    let mesh = quad_strip();
    assert_eq!(mesh.facet_corners(0), 0..4);
    assert_eq!(mesh.facet_corners(1), 4..8);
    assert_eq!(mesh.facet_vertices(1), &[1, 4, 5, 2]);
    assert_eq!(mesh.corner_facet(3), 0);
    assert_eq!(mesh.corner_facet(4), 1);
    assert_eq!(mesh.corner_facet(7), 1);
}

#[test]
fn test_next_and_prev_corner_wrap_within_facet() {
    let mesh = quad_strip();
    assert_eq!(mesh.next_corner(3), 0);
    assert_eq!(mesh.prev_corner(0), 3);
    assert_eq!(mesh.next_corner(7), 4);
    assert_eq!(mesh.prev_corner(4), 7);
    assert_eq!(mesh.next_corner(5), 6);
}

#[test]
fn test_structural_changes_bump_serial() {
    let mut mesh = quad_strip();
    let serial = mesh.connectivity_serial();
    mesh.set_vertex_position(0, Vec3::NEG_ONE);
    assert_eq!(mesh.connectivity_serial(), serial);

    mesh.flip_facet(0);
    assert!(mesh.connectivity_serial() > serial);
    assert_eq!(mesh.facet_vertices(0), &[3, 2, 1, 0]);
}

#[test]
fn test_connect_links_shared_edges() {
    let mut mesh = quad_strip();
    mesh.connect();
    assert!(mesh.is_connected());
    // Corner 1 of facet 0 runs 1 -> 2, shared with facet 1.
    assert_eq!(mesh.corner_adjacent_facet(1), Some(1));
    // Corner 7 of facet 1 runs 2 -> 1.
    assert_eq!(mesh.corner_adjacent_facet(7), Some(0));
    assert_eq!(mesh.corner_adjacent_facet(0), None);

    mesh.add_vertex(Vec3::Z);
    assert!(!mesh.is_connected());
    assert_eq!(mesh.corner_adjacent_facet(1), None);
}

#[test]
fn test_delete_facets_compacts_corners() {
    let mut mesh = quad_strip();
    let compaction = mesh.delete_facets(&[true, false]);
    assert_eq!(mesh.facet_count(), 1);
    assert_eq!(mesh.facet_vertices(0), &[1, 4, 5, 2]);
    assert_eq!(compaction.kept_facets, vec![false, true]);
    assert_eq!(
        compaction.kept_corners,
        vec![false, false, false, false, true, true, true, true]
    );
    assert_eq!(mesh.vertex_count(), 6);
}

#[test]
fn test_remove_isolated_vertices_renumbers() {
    let mut mesh = quad_strip();
    mesh.delete_facets(&[true, false]);
    let kept = mesh.remove_isolated_vertices();
    assert_eq!(kept, vec![false, true, true, false, true, true]);
    assert_eq!(mesh.vertex_count(), 4);
    assert_eq!(mesh.facet_vertices(0), &[0, 2, 3, 1]);
    assert_eq!(mesh.position(0), Vec3::new(1.0, 0.0, 0.0));
}

#[test]
fn test_bounding_box_covers_positions() {
    assert_eq!(Mesh::new().bounding_box(), None);
    let (min, max) = quad_strip().bounding_box().unwrap();
    assert_eq!(min, Vec3::ZERO);
    assert_eq!(max, Vec3::new(2.0, 1.0, 0.0));
}
