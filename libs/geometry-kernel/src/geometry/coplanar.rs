//! Merging of coplanar facet pairs.

use config::constants::COPLANAR_NORMAL_DOT_THRESHOLD;
use tracing::debug;

use super::{Geometry, Topology};
use crate::mesh::Mesh;

/// Walks a facet and its partner across their shared edge, collecting the
/// corners of the merged facet.
struct EdgeCollapseContext<'a> {
    mesh: &'a Mesh,
    topology: &'a Topology,
    first: u32,
    partner: u32,
    corners: Vec<u32>,
}

impl<'a> EdgeCollapseContext<'a> {
    fn new(mesh: &'a Mesh, topology: &'a Topology, first: u32, partner: u32) -> Self {
        Self {
            mesh,
            topology,
            first,
            partner,
            corners: Vec::new(),
        }
    }

    /// Collects every corner of the first facet. At the shared edge the
    /// partner's corners between the two shared vertices are spliced in.
    fn collect(mut self) -> Vec<u32> {
        for corner in self.mesh.facet_corners(self.first) {
            self.corners.push(corner);
            if self.topology.facet_across(self.mesh, corner) == Some(self.partner) {
                let start_vertex = self.mesh.corner_vertex(corner);
                self.collect_partner(start_vertex);
            }
        }
        self.corners
    }

    /// Walks the partner rotated to start at `start_vertex`, stopping at the
    /// corner whose edge leads back into the first facet.
    fn collect_partner(&mut self, start_vertex: u32) {
        let corners = self.mesh.facet_corners(self.partner);
        let Some(start) = corners
            .clone()
            .find(|&c| self.mesh.corner_vertex(c) == start_vertex)
        else {
            return;
        };
        let mut corner = self.mesh.next_corner(start);
        while corner != start {
            if self.topology.facet_across(self.mesh, corner) == Some(self.first) {
                break;
            }
            self.corners.push(corner);
            corner = self.mesh.next_corner(corner);
        }
    }
}

/// Number of edges the two facets share.
fn shared_edge_count(mesh: &Mesh, topology: &Topology, f0: u32, f1: u32) -> usize {
    mesh.facet_corners(f0)
        .filter(|&c| topology.facet_across(mesh, c) == Some(f1))
        .count()
}

impl Geometry {
    /// Merges pairs of neighboring facets whose normals agree within the
    /// default threshold. Returns the number of merged pairs.
    ///
    /// Each facet takes part in at most one merge per call. Facet
    /// attributes of a merged facet come from the first facet of the pair
    /// and corner attributes from the corners they were collected from.
    pub fn merge_coplanar_neighbors(&mut self) -> usize {
        self.merge_coplanar_neighbors_with(COPLANAR_NORMAL_DOT_THRESHOLD)
    }

    /// [`Geometry::merge_coplanar_neighbors`] with an explicit minimum dot
    /// product between unit facet normals.
    pub fn merge_coplanar_neighbors_with(&mut self, min_dot: f32) -> usize {
        self.topology.refresh(&self.mesh);

        let normals: Vec<_> = self.mesh.facets().map(|f| self.facet_normal(f)).collect();
        let mut scheduled = vec![false; self.mesh.facet_count()];
        let mut merged: Vec<(u32, Vec<u32>)> = Vec::new();

        for edge in 0..self.topology.edge_count() as u32 {
            let (f0, f1) = match self.topology.edge_facets(edge) {
                &[f0, f1] => (f0, f1),
                _ => continue,
            };
            if scheduled[f0 as usize] || scheduled[f1 as usize] {
                continue;
            }
            let (Some(n0), Some(n1)) = (normals[f0 as usize], normals[f1 as usize]) else {
                continue;
            };
            if n0.dot(n1) < min_dot {
                continue;
            }
            if shared_edge_count(&self.mesh, &self.topology, f0, f1) != 1 {
                continue;
            }

            let corners = EdgeCollapseContext::new(&self.mesh, &self.topology, f0, f1).collect();
            if corners.len() < 3 {
                continue;
            }
            scheduled[f0 as usize] = true;
            scheduled[f1 as usize] = true;
            merged.push((f0, corners));
        }

        if merged.is_empty() {
            return 0;
        }

        let mut vertices = Vec::new();
        for (source_facet, source_corners) in &merged {
            vertices.clear();
            vertices.extend(source_corners.iter().map(|&c| self.mesh.corner_vertex(c)));
            let facet = self.mesh.push_facet(&vertices);
            self.attributes.facet.copy_element(*source_facet, facet);
            for (corner, &source_corner) in self.mesh.facet_corners(facet).zip(source_corners) {
                self.attributes.corner.copy_element(source_corner, corner);
            }
        }
        scheduled.resize(self.mesh.facet_count(), false);
        self.delete_facets(&scheduled);

        self.update_connectivity();
        self.build_edges();
        debug!(name = %self.name, merged = merged.len(), "merged coplanar facet pairs");
        merged.len()
    }
}
