//! # Topology
//!
//! Derived adjacency: edges, vertex to corner, vertex to edge, edge to
//! facet and corner to facet. Built from a [`Mesh`] and tagged with the
//! connectivity serial it was built from.

use std::collections::HashMap;

use tracing::{trace, warn};

use crate::mesh::Mesh;

/// Unordered vertex pair, stored with `a < b`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Edge {
    /// Smaller vertex index.
    pub a: u32,
    /// Larger vertex index.
    pub b: u32,
}

/// Adjacency tables derived from a mesh.
///
/// # Example
///
/// ```rust
/// use geometry_kernel::{geometry::Topology, Mesh};
/// use glam::Vec3;
///
/// let mut mesh = Mesh::new();
/// for p in [Vec3::ZERO, Vec3::X, Vec3::Y] {
///     mesh.add_vertex(p);
/// }
/// mesh.add_facet(&[0, 1, 2]).unwrap();
///
/// let topology = Topology::build(&mesh);
/// assert_eq!(topology.edge_count(), 3);
/// assert_eq!(topology.get_edge(2, 0), topology.get_edge(0, 2));
/// ```
#[derive(Debug, Clone, Default)]
pub struct Topology {
    edges_serial: Option<u64>,
    connectivity_serial: Option<u64>,
    edges: Vec<Edge>,
    edge_lookup: HashMap<(u32, u32), u32>,
    edge_facets: Vec<Vec<u32>>,
    vertex_edges: Vec<Vec<u32>>,
    vertex_corners: Vec<Vec<u32>>,
    corner_facets: Vec<u32>,
}

impl Topology {
    /// Builds connectivity and edges for `mesh`.
    pub fn build(mesh: &Mesh) -> Self {
        let mut topology = Self::default();
        topology.update_connectivity(mesh);
        topology.build_edges(mesh);
        topology
    }

    /// Returns true if both tables were built from the current state of
    /// `mesh`.
    pub fn is_current(&self, mesh: &Mesh) -> bool {
        let serial = Some(mesh.connectivity_serial());
        self.edges_serial == serial && self.connectivity_serial == serial
    }

    /// Rebuilds whatever is stale.
    pub fn refresh(&mut self, mesh: &Mesh) {
        let serial = Some(mesh.connectivity_serial());
        if self.connectivity_serial != serial {
            self.update_connectivity(mesh);
        }
        if self.edges_serial != serial {
            self.build_edges(mesh);
        }
    }

    // =========================================================================
    // CONNECTIVITY
    // =========================================================================

    /// Rebuilds vertex to corner and corner to facet tables.
    ///
    /// Corners of each vertex are ordered around the vertex: the next
    /// corner's next vertex is the current corner's previous vertex.
    /// Vertices with fewer than three corners keep discovery order.
    pub fn update_connectivity(&mut self, mesh: &Mesh) {
        self.vertex_corners = vec![Vec::new(); mesh.vertex_count()];
        self.corner_facets = Vec::with_capacity(mesh.corner_count());
        for facet in mesh.facets() {
            for corner in mesh.facet_corners(facet) {
                self.vertex_corners[mesh.corner_vertex(corner) as usize].push(corner);
                self.corner_facets.push(facet);
            }
        }

        for (vertex, corners) in self.vertex_corners.iter_mut().enumerate() {
            if corners.len() < 3 {
                continue;
            }
            if !sort_corners_around_vertex(mesh, corners) {
                trace!(vertex, "corners do not form a single fan, order is partial");
            }
        }

        self.connectivity_serial = Some(mesh.connectivity_serial());
    }

    // =========================================================================
    // EDGES
    // =========================================================================

    /// Rebuilds the edge list, edge to facet and vertex to edge tables.
    ///
    /// Edges from pairs with `a < b` are created first, in facet order, so
    /// a closed manifold gets its edges numbered along its facets. Pairs
    /// that only occur as `a > b` follow. Degenerate pairs are skipped.
    pub fn build_edges(&mut self, mesh: &Mesh) {
        self.edges.clear();
        self.edge_lookup.clear();

        for ascending in [true, false] {
            for facet in mesh.facets() {
                for corner in mesh.facet_corners(facet) {
                    let a = mesh.corner_vertex(corner);
                    let b = mesh.corner_vertex(mesh.next_corner(corner));
                    if a == b {
                        if ascending {
                            warn!(facet, corner, vertex = a, "skipping degenerate edge");
                        }
                        continue;
                    }
                    if (a < b) != ascending {
                        continue;
                    }
                    let key = (a.min(b), a.max(b));
                    if !self.edge_lookup.contains_key(&key) {
                        self.edge_lookup.insert(key, self.edges.len() as u32);
                        self.edges.push(Edge { a: key.0, b: key.1 });
                    }
                }
            }
        }

        self.edge_facets = vec![Vec::new(); self.edges.len()];
        for facet in mesh.facets() {
            for corner in mesh.facet_corners(facet) {
                let a = mesh.corner_vertex(corner);
                let b = mesh.corner_vertex(mesh.next_corner(corner));
                if let Some(&edge) = self.edge_lookup.get(&(a.min(b), a.max(b))) {
                    let facets = &mut self.edge_facets[edge as usize];
                    if !facets.contains(&facet) {
                        facets.push(facet);
                    }
                }
            }
        }

        self.vertex_edges = vec![Vec::new(); mesh.vertex_count()];
        for (index, edge) in self.edges.iter().enumerate() {
            self.vertex_edges[edge.a as usize].push(index as u32);
            self.vertex_edges[edge.b as usize].push(index as u32);
        }

        self.edges_serial = Some(mesh.connectivity_serial());
    }

    // =========================================================================
    // QUERIES
    // =========================================================================

    /// Edge between two vertices, in either order.
    ///
    /// # Panics
    ///
    /// Panics if `v0 == v1`.
    pub fn get_edge(&self, v0: u32, v1: u32) -> Option<u32> {
        assert!(v0 != v1, "edge lookup with equal vertices {v0}");
        self.edge_lookup.get(&(v0.min(v1), v0.max(v1))).copied()
    }

    /// All edges.
    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    /// Number of edges.
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// One edge.
    pub fn edge(&self, edge: u32) -> Edge {
        self.edges[edge as usize]
    }

    /// Facets using an edge.
    pub fn edge_facets(&self, edge: u32) -> &[u32] {
        &self.edge_facets[edge as usize]
    }

    /// Edges touching a vertex.
    pub fn vertex_edges(&self, vertex: u32) -> &[u32] {
        self.vertex_edges
            .get(vertex as usize)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Corners referencing a vertex, ordered around it where possible.
    pub fn vertex_corners(&self, vertex: u32) -> &[u32] {
        self.vertex_corners
            .get(vertex as usize)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Facet owning a corner.
    pub fn corner_facet(&self, corner: u32) -> u32 {
        self.corner_facets[corner as usize]
    }

    /// The facet across the edge starting at `corner`, when that edge has
    /// exactly two facets.
    pub fn facet_across(&self, mesh: &Mesh, corner: u32) -> Option<u32> {
        let facet = self.corner_facet(corner);
        let a = mesh.corner_vertex(corner);
        let b = mesh.corner_vertex(mesh.next_corner(corner));
        if a == b {
            return None;
        }
        let edge = self.get_edge(a, b)?;
        match self.edge_facets(edge) {
            &[f0, f1] if f0 == facet => Some(f1),
            &[f0, f1] if f1 == facet => Some(f0),
            _ => None,
        }
    }
}

/// Orders `corners` into a fan. Returns false when the corners do not form
/// one chain; unchained corners then follow in discovery order.
fn sort_corners_around_vertex(mesh: &Mesh, corners: &mut [u32]) -> bool {
    for i in 0..corners.len() - 1 {
        let current = corners[i];
        let prev_vertex = mesh.corner_vertex(mesh.prev_corner(current));
        let found = corners[i + 1..].iter().position(|&candidate| {
            mesh.corner_vertex(mesh.next_corner(candidate)) == prev_vertex
        });
        match found {
            Some(offset) => corners.swap(i + 1, i + 1 + offset),
            None => return false,
        }
    }
    true
}
