//! Element and index counts for render buffer sizing.

use std::ops::{Add, AddAssign};

/// Counts describing one mesh, or the sum over several.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MeshInfo {
    /// Number of facets.
    pub facet_count: usize,
    /// Number of corners.
    pub corner_count: usize,
    /// Triangles in a fan triangulation of every facet.
    pub triangle_count: usize,
    /// Number of edges.
    pub edge_count: usize,
    /// Vertices when every corner gets its own vertex.
    pub vertex_count_corners: usize,
    /// Vertices for one centroid point per facet.
    pub vertex_count_centroids: usize,
    /// Indices for filled triangles.
    pub index_count_fill_triangles: usize,
    /// Indices for edge lines.
    pub index_count_edge_lines: usize,
    /// Indices for corner points.
    pub index_count_corner_points: usize,
    /// Indices for centroid points.
    pub index_count_centroid_points: usize,
}

impl Add for MeshInfo {
    type Output = MeshInfo;

    fn add(mut self, rhs: MeshInfo) -> MeshInfo {
        self += rhs;
        self
    }
}

impl AddAssign for MeshInfo {
    fn add_assign(&mut self, rhs: MeshInfo) {
        self.facet_count += rhs.facet_count;
        self.corner_count += rhs.corner_count;
        self.triangle_count += rhs.triangle_count;
        self.edge_count += rhs.edge_count;
        self.vertex_count_corners += rhs.vertex_count_corners;
        self.vertex_count_centroids += rhs.vertex_count_centroids;
        self.index_count_fill_triangles += rhs.index_count_fill_triangles;
        self.index_count_edge_lines += rhs.index_count_edge_lines;
        self.index_count_corner_points += rhs.index_count_corner_points;
        self.index_count_centroid_points += rhs.index_count_centroid_points;
    }
}

impl std::iter::Sum for MeshInfo {
    fn sum<I: Iterator<Item = MeshInfo>>(iter: I) -> MeshInfo {
        iter.fold(MeshInfo::default(), Add::add)
    }
}
