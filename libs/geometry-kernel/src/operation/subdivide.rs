//! Splits every n-gon into n quads around its centroid.

use std::collections::HashMap;

use tracing::debug;

use super::GeometryOperation;
use crate::geometry::Geometry;

/// Subdivides `source` into a new geometry named `subdivide({name})`.
///
/// Each facet corner becomes a quad made of the corner's vertex, the
/// midpoint of its outgoing edge, the facet centroid and the midpoint of
/// its incoming edge. Edge midpoints are shared between neighboring facets.
///
/// # Example
///
/// ```rust
/// use geometry_kernel::operation::subdivide;
/// use geometry_kernel::Geometry;
/// use glam::Vec3;
///
/// let mut source = Geometry::named("triangle");
/// let mesh = source.mesh_mut();
/// for p in [Vec3::ZERO, Vec3::X, Vec3::Y] {
///     mesh.add_vertex(p);
/// }
/// mesh.add_facet(&[0, 1, 2]).unwrap();
///
/// let result = subdivide(&source);
/// assert_eq!(result.mesh().facet_count(), 3);
/// // 3 original vertices, 3 edge midpoints, 1 centroid.
/// assert_eq!(result.mesh().vertex_count(), 7);
/// ```
pub fn subdivide(source: &Geometry) -> Geometry {
    let mesh = source.mesh();
    let mut operation = GeometryOperation::new(source, format!("subdivide({})", source.get_name()));
    operation.make_dst_vertices_from_src_vertices();

    let mut edge_midpoints: HashMap<(u32, u32), u32> = HashMap::new();
    let mut midpoint = |operation: &mut GeometryOperation<'_>, a: u32, b: u32| -> u32 {
        *edge_midpoints.entry((a.min(b), a.max(b))).or_insert_with(|| {
            let vertex = operation.make_new_dst_vertex();
            operation.add_vertex_source(vertex, 0.5, a);
            operation.add_vertex_source(vertex, 0.5, b);
            vertex
        })
    };

    for src_facet in mesh.facets() {
        let corners: Vec<u32> = mesh.facet_corners(src_facet).collect();
        let n = corners.len();
        let weight = 1.0 / n as f32;

        let centroid = operation.make_new_dst_vertex();
        for &corner in &corners {
            operation.add_vertex_source(centroid, weight, mesh.corner_vertex(corner));
        }

        for i in 0..n {
            let prev = corners[(i + n - 1) % n];
            let corner = corners[i];
            let next = corners[(i + 1) % n];
            let v = mesh.corner_vertex(corner);
            let v_next = mesh.corner_vertex(next);
            let v_prev = mesh.corner_vertex(prev);

            let Some(dst_v) = operation.dst_vertex(v) else {
                continue;
            };
            let m_out = midpoint(&mut operation, v, v_next);
            let m_in = midpoint(&mut operation, v_prev, v);

            let dst_facet = operation.make_new_dst_facet(Some(src_facet), &[dst_v, m_out, centroid, m_in]);
            let dst_corners: Vec<u32> = operation.destination().mesh().facet_corners(dst_facet).collect();

            operation.add_corner_source(dst_corners[0], 1.0, corner);
            operation.add_corner_source(dst_corners[1], 0.5, corner);
            operation.add_corner_source(dst_corners[1], 0.5, next);
            for &c in &corners {
                operation.add_corner_source(dst_corners[2], weight, c);
            }
            operation.add_corner_source(dst_corners[3], 0.5, prev);
            operation.add_corner_source(dst_corners[3], 0.5, corner);
        }
    }

    debug!(
        source = %source.get_name(),
        facets = operation.destination().mesh().facet_count(),
        "subdivided"
    );
    operation.post_processing()
}
