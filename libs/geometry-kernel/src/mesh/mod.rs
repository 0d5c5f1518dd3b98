//! # Mesh Storage
//!
//! Indexed polygon mesh: vertex positions plus facets stored as contiguous
//! runs of corners. Every structural mutation bumps a connectivity serial
//! so derived topology can tell when it is stale.

use std::collections::HashMap;
use std::ops::Range;

use glam::Vec3;

use crate::error::{GeometryError, GeometryResult};

pub mod attributes;

pub use attributes::{CornerAttributes, ElementOffsets, FacetAttributes, MeshAttributes, VertexAttributes};

/// Polygon mesh with contiguous corner storage.
///
/// Facet `f` owns corners `facet_corner_offsets[f]..facet_corner_offsets[f + 1]`
/// and each corner references one vertex.
///
/// # Example
///
/// ```rust
/// use geometry_kernel::Mesh;
/// use glam::Vec3;
///
/// let mut mesh = Mesh::new();
/// mesh.add_vertex(Vec3::ZERO);
/// mesh.add_vertex(Vec3::X);
/// mesh.add_vertex(Vec3::Y);
/// let facet = mesh.add_facet(&[0, 1, 2]).unwrap();
///
/// assert_eq!(mesh.facet_corners(facet), 0..3);
/// assert_eq!(mesh.next_corner(2), 0);
/// assert_eq!(mesh.corner_vertex(1), 1);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Mesh {
    positions: Vec<Vec3>,
    facet_corner_offsets: Vec<u32>,
    corner_vertices: Vec<u32>,
    corner_adjacent_facets: Vec<Option<u32>>,
    connectivity_serial: u64,
}

/// Keep masks produced by [`Mesh::delete_facets`], used to compact
/// attributes the same way.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Compaction {
    /// One flag per old facet.
    pub kept_facets: Vec<bool>,
    /// One flag per old corner.
    pub kept_corners: Vec<bool>,
}

impl Default for Mesh {
    fn default() -> Self {
        Self::new()
    }
}

impl Mesh {
    /// Creates an empty mesh.
    pub fn new() -> Self {
        Self {
            positions: Vec::new(),
            facet_corner_offsets: vec![0],
            corner_vertices: Vec::new(),
            corner_adjacent_facets: Vec::new(),
            connectivity_serial: 0,
        }
    }

    /// Creates an empty mesh with pre-allocated capacity.
    pub fn with_capacity(vertex_count: usize, facet_count: usize, corner_count: usize) -> Self {
        let mut facet_corner_offsets = Vec::with_capacity(facet_count + 1);
        facet_corner_offsets.push(0);
        Self {
            positions: Vec::with_capacity(vertex_count),
            facet_corner_offsets,
            corner_vertices: Vec::with_capacity(corner_count),
            corner_adjacent_facets: Vec::new(),
            connectivity_serial: 0,
        }
    }

    // =========================================================================
    // COUNTS
    // =========================================================================

    /// Number of vertices.
    #[inline]
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    /// Number of facets.
    #[inline]
    pub fn facet_count(&self) -> usize {
        self.facet_corner_offsets.len() - 1
    }

    /// Number of corners over all facets.
    #[inline]
    pub fn corner_count(&self) -> usize {
        self.corner_vertices.len()
    }

    /// Returns true if the mesh has no vertices and no facets.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.positions.is_empty() && self.corner_vertices.is_empty()
    }

    /// Serial bumped on every structural change.
    #[inline]
    pub fn connectivity_serial(&self) -> u64 {
        self.connectivity_serial
    }

    // =========================================================================
    // BUILDERS
    // =========================================================================

    /// Adds a vertex and returns its index.
    pub fn add_vertex(&mut self, position: Vec3) -> u32 {
        let index = self.positions.len() as u32;
        self.positions.push(position);
        self.touch();
        index
    }

    /// Adds a facet over `vertices` in winding order and returns its index.
    ///
    /// # Errors
    ///
    /// Returns an error if fewer than three vertices are given or a vertex
    /// index is out of range. The mesh is unchanged on error.
    pub fn add_facet(&mut self, vertices: &[u32]) -> GeometryResult<u32> {
        if vertices.len() < 3 {
            return Err(GeometryError::TooFewCorners {
                corner_count: vertices.len(),
            });
        }
        if let Some((corner, &vertex)) = vertices
            .iter()
            .enumerate()
            .find(|&(_, &v)| v as usize >= self.positions.len())
        {
            return Err(GeometryError::InvalidVertexIndex {
                corner,
                vertex,
                vertex_count: self.positions.len(),
            });
        }
        Ok(self.push_facet(vertices))
    }

    /// Adds a facet whose vertex indices the caller has already validated.
    pub(crate) fn push_facet(&mut self, vertices: &[u32]) -> u32 {
        debug_assert!(vertices.len() >= 3);
        debug_assert!(vertices.iter().all(|&v| (v as usize) < self.positions.len()));
        let facet = self.facet_count() as u32;
        self.corner_vertices.extend_from_slice(vertices);
        self.facet_corner_offsets.push(self.corner_vertices.len() as u32);
        self.touch();
        facet
    }

    /// Removes all vertices and facets.
    pub fn clear(&mut self) {
        self.positions.clear();
        self.facet_corner_offsets.clear();
        self.facet_corner_offsets.push(0);
        self.corner_vertices.clear();
        self.touch();
    }

    fn touch(&mut self) {
        self.connectivity_serial += 1;
        self.corner_adjacent_facets.clear();
    }

    // =========================================================================
    // ACCESSORS
    // =========================================================================

    /// Vertex positions.
    #[inline]
    pub fn positions(&self) -> &[Vec3] {
        &self.positions
    }

    /// Position of one vertex.
    #[inline]
    pub fn position(&self, vertex: u32) -> Vec3 {
        self.positions[vertex as usize]
    }

    /// Corner index range of a facet.
    #[inline]
    pub fn facet_corners(&self, facet: u32) -> Range<u32> {
        let f = facet as usize;
        self.facet_corner_offsets[f]..self.facet_corner_offsets[f + 1]
    }

    /// Number of corners of a facet.
    #[inline]
    pub fn facet_corner_count(&self, facet: u32) -> usize {
        self.facet_corners(facet).len()
    }

    /// Vertex indices of a facet in winding order.
    #[inline]
    pub fn facet_vertices(&self, facet: u32) -> &[u32] {
        let range = self.facet_corners(facet);
        &self.corner_vertices[range.start as usize..range.end as usize]
    }

    /// Iterates facet indices.
    pub fn facets(&self) -> impl Iterator<Item = u32> {
        0..self.facet_count() as u32
    }

    /// Iterates vertex indices.
    pub fn vertices(&self) -> impl Iterator<Item = u32> {
        0..self.vertex_count() as u32
    }

    /// Vertex referenced by a corner.
    #[inline]
    pub fn corner_vertex(&self, corner: u32) -> u32 {
        self.corner_vertices[corner as usize]
    }

    /// Facet owning a corner.
    pub fn corner_facet(&self, corner: u32) -> u32 {
        // offsets are sorted; the owner is the last facet starting at or before the corner
        let index = self.facet_corner_offsets.partition_point(|&start| start <= corner);
        (index - 1) as u32
    }

    /// Next corner of the same facet, wrapping around.
    pub fn next_corner(&self, corner: u32) -> u32 {
        let range = self.facet_corners(self.corner_facet(corner));
        if corner + 1 == range.end {
            range.start
        } else {
            corner + 1
        }
    }

    /// Previous corner of the same facet, wrapping around.
    pub fn prev_corner(&self, corner: u32) -> u32 {
        let range = self.facet_corners(self.corner_facet(corner));
        if corner == range.start {
            range.end - 1
        } else {
            corner - 1
        }
    }

    /// Facet on the other side of the edge from `corner` to the next corner,
    /// as computed by the last [`Mesh::connect`]. `None` for boundary and
    /// non-manifold edges, or when the links are stale.
    pub fn corner_adjacent_facet(&self, corner: u32) -> Option<u32> {
        self.corner_adjacent_facets.get(corner as usize).copied().flatten()
    }

    /// Returns true if [`Mesh::connect`] ran since the last structural change.
    pub fn is_connected(&self) -> bool {
        self.corner_adjacent_facets.len() == self.corner_vertices.len()
    }

    // =========================================================================
    // MUTATORS
    // =========================================================================

    /// Moves a vertex. Geometry changes only, so the serial is kept.
    pub fn set_vertex_position(&mut self, vertex: u32, position: Vec3) {
        self.positions[vertex as usize] = position;
    }

    /// Points a corner at another vertex.
    pub fn set_corner_vertex(&mut self, corner: u32, vertex: u32) {
        assert!(
            (vertex as usize) < self.positions.len(),
            "corner {corner} set to vertex {vertex}, mesh has {} vertices",
            self.positions.len()
        );
        self.corner_vertices[corner as usize] = vertex;
        self.touch();
    }

    /// Reverses the winding of a facet.
    pub fn flip_facet(&mut self, facet: u32) {
        let range = self.facet_corners(facet);
        self.corner_vertices[range.start as usize..range.end as usize].reverse();
        self.touch();
    }

    /// Removes the facets flagged in `delete` and compacts the remaining
    /// facets and corners in order. Vertices are kept.
    pub fn delete_facets(&mut self, delete: &[bool]) -> Compaction {
        let facet_count = self.facet_count();
        let mut compaction = Compaction {
            kept_facets: Vec::with_capacity(facet_count),
            kept_corners: Vec::with_capacity(self.corner_count()),
        };
        let mut corner_vertices = Vec::with_capacity(self.corner_count());
        let mut offsets = Vec::with_capacity(facet_count + 1);
        offsets.push(0);

        for facet in 0..facet_count as u32 {
            let keep = !delete.get(facet as usize).copied().unwrap_or(false);
            compaction.kept_facets.push(keep);
            let corners = self.facet_corners(facet);
            compaction
                .kept_corners
                .extend(std::iter::repeat(keep).take(corners.len()));
            if keep {
                corner_vertices.extend_from_slice(self.facet_vertices(facet));
                offsets.push(corner_vertices.len() as u32);
            }
        }

        self.corner_vertices = corner_vertices;
        self.facet_corner_offsets = offsets;
        self.touch();
        compaction
    }

    /// Removes vertices no corner references and renumbers the rest.
    /// Returns one keep flag per old vertex.
    pub fn remove_isolated_vertices(&mut self) -> Vec<bool> {
        let mut used = vec![false; self.positions.len()];
        for &v in &self.corner_vertices {
            used[v as usize] = true;
        }
        if used.iter().all(|u| *u) {
            return used;
        }

        let mut remap = vec![u32::MAX; self.positions.len()];
        let mut next = 0u32;
        for (old, &keep) in used.iter().enumerate() {
            if keep {
                remap[old] = next;
                self.positions[next as usize] = self.positions[old];
                next += 1;
            }
        }
        self.positions.truncate(next as usize);
        for v in &mut self.corner_vertices {
            *v = remap[*v as usize];
        }
        self.touch();
        used
    }

    // =========================================================================
    // FACET ADJACENCY
    // =========================================================================

    /// Links each corner to the facet across its outgoing edge.
    ///
    /// Only edges shared by exactly two facets are linked.
    pub fn connect(&mut self) {
        let mut edge_facets: HashMap<(u32, u32), Vec<u32>> = HashMap::new();
        for facet in self.facets() {
            for corner in self.facet_corners(facet) {
                let a = self.corner_vertex(corner);
                let b = self.corner_vertex(self.next_corner(corner));
                let entry = edge_facets.entry((a.min(b), a.max(b))).or_default();
                if entry.last() != Some(&facet) {
                    entry.push(facet);
                }
            }
        }

        let mut links = Vec::with_capacity(self.corner_count());
        for facet in self.facets() {
            for corner in self.facet_corners(facet) {
                let a = self.corner_vertex(corner);
                let b = self.corner_vertex(self.next_corner(corner));
                let link = match edge_facets.get(&(a.min(b), a.max(b))).map(Vec::as_slice) {
                    Some(&[f0, f1]) if f0 == facet => Some(f1),
                    Some(&[f0, f1]) if f1 == facet => Some(f0),
                    _ => None,
                };
                links.push(link);
            }
        }
        self.corner_adjacent_facets = links;
    }

    // =========================================================================
    // GEOMETRY QUERIES
    // =========================================================================

    /// Axis aligned bounds of the vertex positions, `None` when empty.
    pub fn bounding_box(&self) -> Option<(Vec3, Vec3)> {
        let first = *self.positions.first()?;
        Some(
            self.positions
                .iter()
                .fold((first, first), |(min, max), p| (min.min(*p), max.max(*p))),
        )
    }
}

#[cfg(test)]
mod tests;
