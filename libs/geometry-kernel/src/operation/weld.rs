//! # Weld
//!
//! Merges vertices closer than a radius, then removes duplicate facets and
//! cancels facet pairs that are the same polygon wound both ways.
//!
//! ## Algorithm
//!
//! 1. Octree radius query per vertex; unclaimed neighbors map to the
//!    querying vertex
//! 2. Per facet, rotate the merged corner cycle to start at its smallest
//!    vertex and drop corners that collapsed onto their predecessor
//! 3. Sort facets by first vertex and compare facets sharing it
//! 4. Copy used vertices and surviving facets into a new geometry

use point_octree::{L2Distance, Octree, OctreeParams};
use tracing::{debug, warn};

use super::GeometryOperation;
use crate::config::GeometryConfig;
use crate::geometry::Geometry;

/// Weld operation with its configuration.
///
/// # Example
///
/// ```rust
/// use geometry_kernel::config::GeometryConfig;
/// use geometry_kernel::operation::Weld;
/// use geometry_kernel::Geometry;
/// use glam::Vec3;
///
/// let mut source = Geometry::named("strip");
/// let mesh = source.mesh_mut();
/// for p in [Vec3::ZERO, Vec3::X, Vec3::Y, Vec3::new(1.0, 0.0, 0.01), Vec3::new(1.0, 1.0, 0.0)] {
///     mesh.add_vertex(p);
/// }
/// mesh.add_facet(&[0, 1, 2]).unwrap();
/// mesh.add_facet(&[2, 3, 4]).unwrap();
///
/// let config = GeometryConfig::new(0.05, 0.01, 0.99).unwrap();
/// let welded = Weld::with_config(config).run(&source);
/// assert_eq!(welded.get_name(), "weld(strip)");
/// assert_eq!(welded.mesh().vertex_count(), 4);
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct Weld {
    config: GeometryConfig,
}

/// One facet seen through the vertex merge map.
#[derive(Debug)]
pub(super) struct WeldFacet {
    /// Merged vertices in canonical rotation, collapsed runs removed.
    vertices: Vec<u32>,
    /// Source corner of each entry in `vertices`.
    corners: Vec<u32>,
}

impl WeldFacet {
    pub(super) fn new(source: &Geometry, facet: u32, vertex_map: &[u32]) -> Self {
        let mesh = source.mesh();
        let corners: Vec<u32> = mesh.facet_corners(facet).collect();
        let merged: Vec<u32> = corners
            .iter()
            .map(|&c| vertex_map[mesh.corner_vertex(c) as usize])
            .collect();

        let start = merged
            .iter()
            .enumerate()
            .min_by_key(|&(_, &v)| v)
            .map_or(0, |(i, _)| i);

        let mut facet = Self {
            vertices: Vec::with_capacity(merged.len()),
            corners: Vec::with_capacity(merged.len()),
        };
        for i in (start..merged.len()).chain(0..start) {
            if facet.vertices.last() == Some(&merged[i]) {
                continue;
            }
            facet.vertices.push(merged[i]);
            facet.corners.push(corners[i]);
        }
        // Run wrapping from the end back onto the start.
        while facet.vertices.len() > 1 && facet.vertices.last() == facet.vertices.first() {
            facet.vertices.pop();
            facet.corners.pop();
        }
        facet
    }

    fn first_vertex(&self) -> Option<u32> {
        self.vertices.first().copied()
    }

    fn is_equal(&self, other: &Self) -> bool {
        !self.vertices.is_empty() && self.vertices == other.vertices
    }

    fn is_opposite(&self, other: &Self) -> bool {
        let n = self.vertices.len();
        n >= 3
            && other.vertices.len() == n
            && (0..n).all(|i| self.vertices[i] == other.vertices[(n - i) % n])
    }
}

impl Weld {
    /// Creates a weld using the default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a weld using `config`.
    pub fn with_config(config: GeometryConfig) -> Self {
        Self { config }
    }

    /// Maps each vertex to the representative it merges into.
    fn merge_map(&self, source: &Geometry) -> Vec<u32> {
        let positions = source.mesh().positions();
        let mut vertex_map: Vec<u32> = (0..positions.len() as u32).collect();
        let octree = Octree::new(positions, OctreeParams::default());
        let mut neighbors = Vec::new();

        for vertex in 0..positions.len() {
            if vertex_map[vertex] != vertex as u32 {
                continue;
            }
            octree.radius_neighbors::<L2Distance>(
                &positions[vertex],
                self.config.weld_max_distance,
                &mut neighbors,
            );
            for &neighbor in &neighbors {
                let neighbor = neighbor as usize;
                if neighbor != vertex && vertex_map[neighbor] == neighbor as u32 {
                    vertex_map[neighbor] = vertex as u32;
                }
            }
        }
        vertex_map
    }

    /// Flags facets to drop: collapsed facets, duplicates and cancelling
    /// pairs.
    ///
    /// A left facet keeps scanning after it has been cancelled, so later
    /// copies of it are dropped too. A pair that is both equal and opposite
    /// (a polygon revisiting a vertex) cancels.
    pub(super) fn removed_facets(facets: &[WeldFacet]) -> Vec<bool> {
        let mut removed: Vec<bool> = facets.iter().map(|f| f.vertices.len() < 3).collect();

        let mut order: Vec<usize> = (0..facets.len()).collect();
        order.sort_by_key(|&f| facets[f].first_vertex().unwrap_or(u32::MAX));

        for (i, &left) in order.iter().enumerate() {
            if removed[left] {
                continue;
            }
            let first = facets[left].first_vertex();
            for &right in &order[i + 1..] {
                if facets[right].first_vertex() != first {
                    break;
                }
                if removed[right] || facets[right].vertices.len() != facets[left].vertices.len() {
                    continue;
                }
                let equal = facets[left].is_equal(&facets[right]);
                let opposite = facets[left].is_opposite(&facets[right]);
                if equal && opposite {
                    warn!(left, right, "facet pair is both equal and opposite, cancelling both");
                }
                if opposite {
                    removed[left] = true;
                    removed[right] = true;
                } else if equal {
                    removed[right] = true;
                }
            }
        }
        removed
    }

    /// Welds `source` into a new geometry named `weld({name})`.
    pub fn run(&self, source: &Geometry) -> Geometry {
        let vertex_map = self.merge_map(source);
        let facets: Vec<WeldFacet> = source
            .mesh()
            .facets()
            .map(|f| WeldFacet::new(source, f, &vertex_map))
            .collect();
        let removed = Self::removed_facets(&facets);

        let mut used = vec![false; vertex_map.len()];
        for (facet, _) in facets.iter().zip(&removed).filter(|(_, r)| !**r) {
            for &v in &facet.vertices {
                used[v as usize] = true;
            }
        }

        let mut operation = GeometryOperation::new(source, format!("weld({})", source.get_name()));
        for vertex in (0..used.len()).filter(|&v| used[v]) {
            operation.make_new_dst_vertex_from_src_vertex(vertex as u32);
        }

        let mut dst_vertices = Vec::new();
        for (src_facet, facet) in facets.iter().enumerate() {
            if removed[src_facet] {
                continue;
            }
            dst_vertices.clear();
            dst_vertices.extend(facet.vertices.iter().filter_map(|&v| operation.dst_vertex(v)));
            let dst_facet = operation.make_new_dst_facet(Some(src_facet as u32), &dst_vertices);
            let dst_corners = operation.destination().mesh().facet_corners(dst_facet);
            for (dst_corner, &src_corner) in dst_corners.zip(&facet.corners) {
                operation.add_corner_source(dst_corner, 1.0, src_corner);
            }
        }

        let merged_vertices = vertex_map
            .iter()
            .enumerate()
            .filter(|&(v, &r)| v as u32 != r)
            .count();
        debug!(
            source = %source.get_name(),
            merged_vertices,
            removed_facets = removed.iter().filter(|r| **r).count(),
            "weld"
        );
        operation.post_processing()
    }
}

/// Welds `source` with the default radius.
///
/// # Example
///
/// ```rust
/// use geometry_kernel::operation::weld;
/// use geometry_kernel::Geometry;
/// use glam::Vec3;
///
/// let mut source = Geometry::named("twice");
/// let mesh = source.mesh_mut();
/// for p in [Vec3::ZERO, Vec3::X, Vec3::Y] {
///     mesh.add_vertex(p);
/// }
/// mesh.add_facet(&[0, 1, 2]).unwrap();
/// mesh.add_facet(&[1, 2, 0]).unwrap();
///
/// let welded = weld(&source);
/// assert_eq!(welded.mesh().facet_count(), 1);
/// ```
pub fn weld(source: &Geometry) -> Geometry {
    Weld::new().run(source)
}
