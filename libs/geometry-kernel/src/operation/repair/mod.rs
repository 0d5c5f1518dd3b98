//! # Repair
//!
//! Clean-up pipeline for meshes meant to be closed solids.
//!
//! ## Pipeline
//!
//! ```text
//! colocate → dedup → fill small holes → split self-intersections
//!          → drop enclosed pieces → remove internal shells → colocate → dedup
//!          → build output (isolated vertices dropped) → merge coplanar facets
//! ```
//!
//! The source geometry is never modified. Intersections that cannot be
//! split (coplanar overlaps) are reported.

use std::collections::{HashMap, HashSet};

use config::constants::{EPSILON, REPAIR_COLOCATE_RELATIVE_EPSILON};
use glam::Vec3;
use point_octree::{L2Distance, Octree, OctreeParams};
use tracing::{debug, info, warn};

use super::{GeometryOperation, POST_PROCESSING_FLAGS};
use crate::attribute::KeySources;
use crate::config::GeometryConfig;
use crate::geometry::Geometry;

mod holes;
mod intersect;
mod resolve;
mod shells;

/// What a repair run changed and found.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RepairReport {
    /// Vertices merged into a colocated representative.
    pub merged_vertices: usize,
    /// Facets dropped because they collapsed below three corners.
    pub removed_degenerate_facets: usize,
    /// Facets dropped as duplicates of another facet's vertex set.
    pub removed_duplicate_facets: usize,
    /// Boundary loops closed with new facets.
    pub filled_holes: usize,
    /// Boundary loops left open because they are too large.
    pub skipped_holes: usize,
    /// Intersecting facet pairs split along their intersection.
    pub resolved_intersections: usize,
    /// Split pieces dropped because they ended up inside another solid.
    pub removed_enclosed_facets: usize,
    /// Pairs of facets that still intersect after splitting.
    pub intersecting_pairs: usize,
    /// Connected components removed because they lie inside another.
    pub removed_shells: usize,
    /// Pairs of coplanar facets merged.
    pub merged_coplanar_pairs: usize,
    /// Vertices not used by any remaining facet.
    pub removed_isolated_vertices: usize,
}

/// Where a work corner takes its attributes from.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum WorkCorner {
    /// A source corner.
    Source(u32),
    /// Weighted source corners of one facet, for corners added by splitting.
    Blend(KeySources),
    /// Corner of a fill facet. Averages the source corners at its vertex.
    Fill,
}

impl WorkCorner {
    fn sources(&self) -> Option<KeySources> {
        match self {
            Self::Source(corner) => Some(vec![(1.0, *corner)]),
            Self::Blend(sources) => Some(sources.clone()),
            Self::Fill => None,
        }
    }

    /// Corner at `t` along the edge from `self` to `other`.
    pub(crate) fn lerp(&self, other: &Self, t: f32) -> Self {
        match (self.sources(), other.sources()) {
            (Some(a), Some(b)) => Self::Blend(lerp_sources(&a, &b, t)),
            _ => Self::Fill,
        }
    }
}

/// `a * (1 - t) + b * t` over weighted source lists. Repeated sources are
/// summed and zero weights dropped.
pub(crate) fn lerp_sources(a: &[(f32, u32)], b: &[(f32, u32)], t: f32) -> KeySources {
    let mut result: KeySources = Vec::with_capacity(a.len() + b.len());
    let scaled = a
        .iter()
        .map(|&(w, src)| (w * (1.0 - t), src))
        .chain(b.iter().map(|&(w, src)| (w * t, src)));
    for (weight, src) in scaled {
        if weight == 0.0 {
            continue;
        }
        match result.iter_mut().find(|(_, existing)| *existing == src) {
            Some(entry) => entry.0 += weight,
            None => result.push((weight, src)),
        }
    }
    result
}

/// Facet being repaired.
#[derive(Debug, Clone)]
pub(crate) struct WorkFacet {
    /// Workspace vertex indices in winding order.
    pub vertices: Vec<u32>,
    /// Attribute source of each corner.
    pub corners: Vec<WorkCorner>,
    /// Source facet; `None` for fill facets.
    pub source: Option<u32>,
}

/// Mesh state between pipeline stages.
///
/// The first vertices are the source's, with the same indices. Vertices
/// appended by intersection splitting interpolate source vertices.
#[derive(Debug)]
pub(crate) struct Workspace {
    pub positions: Vec<Vec3>,
    /// Weighted source vertices of each vertex. A source vertex is its own
    /// origin.
    pub origins: Vec<KeySources>,
    /// Vertices colocated into each vertex.
    pub aliases: Vec<Vec<u32>>,
    pub facets: Vec<WorkFacet>,
}

impl Workspace {
    fn new(source: &Geometry) -> Self {
        let mesh = source.mesh();
        let facets = mesh
            .facets()
            .map(|f| WorkFacet {
                vertices: mesh.facet_vertices(f).to_vec(),
                corners: mesh.facet_corners(f).map(WorkCorner::Source).collect(),
                source: Some(f),
            })
            .collect();
        let vertex_count = mesh.vertex_count();
        Self {
            positions: mesh.positions().to_vec(),
            origins: (0..vertex_count as u32).map(|v| vec![(1.0, v)]).collect(),
            aliases: vec![Vec::new(); vertex_count],
            facets,
        }
    }

    /// Appends a vertex at `t` along `a b`.
    pub(crate) fn add_vertex_between(&mut self, a: u32, b: u32, t: f32, position: Vec3) -> u32 {
        let origin = lerp_sources(&self.origins[a as usize], &self.origins[b as usize], t);
        self.positions.push(position);
        self.origins.push(origin);
        self.aliases.push(Vec::new());
        (self.positions.len() - 1) as u32
    }

    /// Source vertices behind `vertex`, through interpolation and
    /// colocation.
    fn source_vertices(&self, vertex: u32) -> KeySources {
        let mut sources = KeySources::new();
        let mut pending = vec![vertex];
        while let Some(v) = pending.pop() {
            sources.extend_from_slice(&self.origins[v as usize]);
            pending.extend_from_slice(&self.aliases[v as usize]);
        }
        sources
    }

    /// Merges used vertices closer than `REPAIR_COLOCATE_RELATIVE_EPSILON`
    /// times the bounding box diagonal. Returns (merged vertices, dropped
    /// facets).
    fn colocate(&mut self) -> (usize, usize) {
        let Some(diagonal) = bounding_diagonal(&self.positions) else {
            return (0, 0);
        };
        let radius = (diagonal * REPAIR_COLOCATE_RELATIVE_EPSILON).max(EPSILON * EPSILON);

        let used = self.used_vertices();
        let candidates: Vec<u32> = (0..used.len() as u32).filter(|&v| used[v as usize]).collect();
        let octree = Octree::with_indices(&self.positions, &candidates, OctreeParams::default());
        let mut vertex_map: Vec<u32> = (0..self.positions.len() as u32).collect();
        let mut neighbors = Vec::new();
        let mut merged = 0;
        for &vertex in &candidates {
            if vertex_map[vertex as usize] != vertex {
                continue;
            }
            octree.radius_neighbors::<L2Distance>(&self.positions[vertex as usize], radius, &mut neighbors);
            for &neighbor in &neighbors {
                if neighbor != vertex && vertex_map[neighbor as usize] == neighbor {
                    vertex_map[neighbor as usize] = vertex;
                    self.aliases[vertex as usize].push(neighbor);
                    merged += 1;
                }
            }
        }

        let before = self.facets.len();
        for facet in &mut self.facets {
            remap_facet(facet, &vertex_map);
        }
        self.facets.retain(|f| f.vertices.len() >= 3);
        (merged, before - self.facets.len())
    }

    /// Drops facets whose vertex set repeats an earlier facet's. Returns the
    /// number dropped.
    fn remove_duplicate_facets(&mut self) -> usize {
        let before = self.facets.len();
        let mut seen: HashSet<Vec<u32>> = HashSet::new();
        self.facets.retain(|facet| {
            let mut key = facet.vertices.clone();
            key.sort_unstable();
            seen.insert(key)
        });
        before - self.facets.len()
    }

    /// Directed edge use counts.
    pub(crate) fn directed_edges(&self) -> HashMap<(u32, u32), usize> {
        let mut edges = HashMap::new();
        for facet in &self.facets {
            let n = facet.vertices.len();
            for i in 0..n {
                *edges
                    .entry((facet.vertices[i], facet.vertices[(i + 1) % n]))
                    .or_insert(0) += 1;
            }
        }
        edges
    }

    /// Vertices used by any facet.
    fn used_vertices(&self) -> Vec<bool> {
        let mut used = vec![false; self.positions.len()];
        for facet in &self.facets {
            for &v in &facet.vertices {
                used[v as usize] = true;
            }
        }
        used
    }
}

/// Applies a vertex map and drops corners that collapsed onto their
/// predecessor, cyclically.
fn remap_facet(facet: &mut WorkFacet, vertex_map: &[u32]) {
    let corners = std::mem::take(&mut facet.corners);
    let mut vertices = Vec::with_capacity(facet.vertices.len());
    let mut kept = Vec::with_capacity(corners.len());
    for (&v, corner) in facet.vertices.iter().zip(corners) {
        let v = vertex_map[v as usize];
        if vertices.last() != Some(&v) {
            vertices.push(v);
            kept.push(corner);
        }
    }
    while vertices.len() > 1 && vertices.last() == vertices.first() {
        vertices.pop();
        kept.pop();
    }
    facet.vertices = vertices;
    facet.corners = kept;
}

pub(crate) fn bounding_diagonal(positions: &[Vec3]) -> Option<f32> {
    let first = *positions.first()?;
    let (min, max) = positions
        .iter()
        .fold((first, first), |(min, max), p| (min.min(*p), max.max(*p)));
    Some((max - min).length())
}

// =============================================================================
// ENTRY POINTS
// =============================================================================

/// Repairs `source` into a new geometry named `repair({name})`.
pub fn repair(source: &Geometry) -> Geometry {
    repair_with_report(source).0
}

/// Like [`repair`], also returning what was changed.
///
/// # Example
///
/// ```rust
/// use geometry_kernel::operation::repair_with_report;
/// use geometry_kernel::Geometry;
/// use glam::Vec3;
///
/// // Tetrahedron with one missing facet.
/// let mut source = Geometry::named("tetra");
/// let mesh = source.mesh_mut();
/// for p in [Vec3::ZERO, Vec3::new(0.1, 0.0, 0.0), Vec3::new(0.0, 0.1, 0.0), Vec3::new(0.0, 0.0, 0.1)] {
///     mesh.add_vertex(p);
/// }
/// mesh.add_facet(&[0, 2, 1]).unwrap();
/// mesh.add_facet(&[0, 1, 3]).unwrap();
/// mesh.add_facet(&[0, 3, 2]).unwrap();
///
/// let (repaired, report) = repair_with_report(&source);
/// assert_eq!(report.filled_holes, 1);
/// assert_eq!(repaired.mesh().facet_count(), 4);
/// assert_eq!(repaired.get_name(), "repair(tetra)");
/// ```
pub fn repair_with_report(source: &Geometry) -> (Geometry, RepairReport) {
    repair_with_config(source, &GeometryConfig::default())
}

/// [`repair_with_report`] with explicit thresholds.
pub fn repair_with_config(source: &Geometry, config: &GeometryConfig) -> (Geometry, RepairReport) {
    let mut report = RepairReport::default();
    let mut workspace = Workspace::new(source);

    let (merged, degenerate) = workspace.colocate();
    report.merged_vertices += merged;
    report.removed_degenerate_facets += degenerate;
    report.removed_duplicate_facets += workspace.remove_duplicate_facets();

    let (filled, skipped) = holes::fill_holes(&mut workspace, config.hole_fill_max_area);
    report.filled_holes = filled;
    report.skipped_holes = skipped;

    let resolution = resolve::resolve_intersections(&mut workspace);
    report.resolved_intersections = resolution.resolved;
    report.removed_enclosed_facets = resolution.removed_enclosed;

    report.intersecting_pairs = intersect::count_intersecting_pairs(&workspace);
    if report.intersecting_pairs > 0 {
        warn!(
            source = %source.get_name(),
            pairs = report.intersecting_pairs,
            "unresolved self-intersections"
        );
    }
    report.removed_shells = shells::remove_internal_shells(&mut workspace);

    let (merged, degenerate) = workspace.colocate();
    report.merged_vertices += merged;
    report.removed_degenerate_facets += degenerate;
    report.removed_duplicate_facets += workspace.remove_duplicate_facets();

    let mut geometry = build_output(source, &workspace, &mut report);

    report.merged_coplanar_pairs = geometry.merge_coplanar_neighbors_with(config.coplanar_normal_dot);
    if report.merged_coplanar_pairs > 0 {
        geometry.process(POST_PROCESSING_FLAGS);
    }

    info!(source = %source.get_name(), ?report, "repair finished");
    (geometry, report)
}

/// Copies used vertices and the surviving facets. Vertices added by
/// splitting interpolate their origins. Fill corners average the source
/// corners of their vertex, including vertices colocated into it.
fn build_output(source: &Geometry, workspace: &Workspace, report: &mut RepairReport) -> Geometry {
    let mesh = source.mesh();
    let mut operation = GeometryOperation::new(source, format!("repair({})", source.get_name()));

    let source_vertex_count = mesh.vertex_count();
    let used = workspace.used_vertices();
    report.removed_isolated_vertices = used[..source_vertex_count].iter().filter(|u| !**u).count();
    let mut dst_of: Vec<Option<u32>> = vec![None; used.len()];
    for vertex in (0..used.len()).filter(|&v| used[v]) {
        let dst_vertex = if vertex < source_vertex_count {
            operation.make_new_dst_vertex_from_src_vertex(vertex as u32)
        } else {
            let dst_vertex = operation.make_new_dst_vertex();
            for &(weight, src_vertex) in &workspace.origins[vertex] {
                operation.add_vertex_source(dst_vertex, weight, src_vertex);
            }
            dst_vertex
        };
        dst_of[vertex] = Some(dst_vertex);
    }

    let mut fill_vertices = HashSet::new();
    let mut dst_vertices = Vec::new();
    for facet in &workspace.facets {
        dst_vertices.clear();
        dst_vertices.extend(facet.vertices.iter().filter_map(|&v| dst_of[v as usize]));
        let dst_facet = operation.make_new_dst_facet(facet.source, &dst_vertices);
        let dst_corners = operation.destination().mesh().facet_corners(dst_facet);
        for ((dst_corner, corner), &v) in dst_corners.zip(&facet.corners).zip(&facet.vertices) {
            match corner {
                WorkCorner::Source(src_corner) => operation.add_corner_source(dst_corner, 1.0, *src_corner),
                WorkCorner::Blend(sources) => {
                    for &(weight, src_corner) in sources {
                        operation.add_corner_source(dst_corner, weight, src_corner);
                    }
                }
                WorkCorner::Fill => {
                    fill_vertices.insert(v);
                }
            }
        }
    }

    if !fill_vertices.is_empty() {
        let mut topology = crate::geometry::Topology::default();
        topology.update_connectivity(mesh);
        for v in fill_vertices {
            let Some(dst_vertex) = dst_of[v as usize] else {
                continue;
            };
            for (weight, src_vertex) in workspace.source_vertices(v) {
                for &src_corner in topology.vertex_corners(src_vertex) {
                    operation.add_vertex_corner_source(dst_vertex, weight, src_corner);
                }
            }
        }
        operation.distribute_corner_sources();
    }

    debug!(
        source = %source.get_name(),
        facets = workspace.facets.len(),
        added_vertices = used.len() - source_vertex_count,
        "repair output built"
    );
    operation.post_processing()
}

#[cfg(test)]
mod tests;
