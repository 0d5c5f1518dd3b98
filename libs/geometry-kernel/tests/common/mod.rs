//! Shared fixtures for the integration tests.

#![allow(dead_code)]

use geometry_kernel::Geometry;
use glam::{Mat4, Vec3};

/// Outward facing quads of a unit cube with corner index `x + 2y + 4z`.
pub const CUBE_FACETS: [[u32; 4]; 6] = [
    [0, 2, 3, 1],
    [4, 5, 7, 6],
    [0, 1, 5, 4],
    [2, 6, 7, 3],
    [0, 4, 6, 2],
    [1, 3, 7, 5],
];

/// Builds a geometry from positions and facet vertex lists.
pub fn geometry_from(name: &str, positions: &[Vec3], facets: &[&[u32]]) -> Geometry {
    let mut geometry = Geometry::named(name);
    let mesh = geometry.mesh_mut();
    for &p in positions {
        mesh.add_vertex(p);
    }
    for facet in facets {
        mesh.add_facet(facet).unwrap();
    }
    geometry
}

/// Single counterclockwise triangle in the xy plane.
pub fn triangle() -> Geometry {
    geometry_from("triangle", &[Vec3::ZERO, Vec3::X, Vec3::Y], &[&[0, 1, 2]])
}

/// Closed cube spanning `[0, size]^3`.
pub fn cube(size: f32) -> Geometry {
    let positions: Vec<Vec3> = (0..8u32)
        .map(|i| Vec3::new((i & 1) as f32, ((i >> 1) & 1) as f32, ((i >> 2) & 1) as f32) * size)
        .collect();
    let facets: Vec<&[u32]> = CUBE_FACETS.iter().map(|f| f.as_slice()).collect();
    geometry_from("cube", &positions, &facets)
}

/// Cube without its top facet.
pub fn open_cube(size: f32) -> Geometry {
    let mut geometry = cube(size);
    let mut delete = vec![false; 6];
    delete[1] = true;
    geometry.delete_facets(&delete);
    geometry
}

/// `source` merged with a copy of itself moved by `offset`.
pub fn with_translated_copy(source: &Geometry, offset: Vec3) -> Geometry {
    let mut combined = source.clone();
    combined.merge_with_transform(source, &Mat4::from_translation(offset));
    combined
}

/// True when every directed edge has a reverse.
pub fn is_closed(geometry: &Geometry) -> bool {
    let mesh = geometry.mesh();
    let mut edges = std::collections::HashSet::new();
    for facet in mesh.facets() {
        let v = mesh.facet_vertices(facet);
        for i in 0..v.len() {
            edges.insert((v[i], v[(i + 1) % v.len()]));
        }
    }
    edges.iter().all(|&(a, b)| edges.contains(&(b, a)))
}
