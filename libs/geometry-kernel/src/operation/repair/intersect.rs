//! Self-intersection detection.
//!
//! Facets are fan-triangulated. Candidate pairs come from a sweep over the
//! triangles' bounding boxes sorted by minimum x, and each candidate is
//! checked with exact orientation predicates. Facets sharing a vertex are
//! not tested against each other, and coplanar contacts are not reported.

use std::collections::HashSet;

use glam::Vec3;
use robust::{orient3d, Coord3D};
use tracing::debug;

use super::Workspace;

/// Fan triangle of a work facet.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Triangle {
    pub facet: usize,
    pub vertices: [u32; 3],
    /// Position of each vertex within its facet.
    pub corners: [usize; 3],
    min: Vec3,
    max: Vec3,
}

impl Triangle {
    pub fn points(&self, positions: &[Vec3]) -> [Vec3; 3] {
        self.vertices.map(|v| positions[v as usize])
    }

    fn overlaps(&self, other: &Self) -> bool {
        self.min.cmple(other.max).all() && other.min.cmple(self.max).all()
    }
}

fn coord(p: Vec3) -> Coord3D<f64> {
    Coord3D {
        x: f64::from(p.x),
        y: f64::from(p.y),
        z: f64::from(p.z),
    }
}

/// Whether segment `p q` crosses triangle `t`. A segment in the triangle's
/// plane does not count.
pub(crate) fn segment_crosses_triangle(p: Vec3, q: Vec3, t: [Vec3; 3]) -> bool {
    let [a, b, c] = t.map(coord);
    let (p, q) = (coord(p), coord(q));
    let side_p = orient3d(a, b, c, p);
    let side_q = orient3d(a, b, c, q);
    if side_p == 0.0 && side_q == 0.0 {
        return false;
    }
    if side_p * side_q > 0.0 {
        return false;
    }
    let e0 = orient3d(p, q, a, b);
    let e1 = orient3d(p, q, b, c);
    let e2 = orient3d(p, q, c, a);
    (e0 >= 0.0 && e1 >= 0.0 && e2 >= 0.0) || (e0 <= 0.0 && e1 <= 0.0 && e2 <= 0.0)
}

fn triangles_intersect(lhs: [Vec3; 3], rhs: [Vec3; 3]) -> bool {
    (0..3).any(|i| segment_crosses_triangle(lhs[i], lhs[(i + 1) % 3], rhs))
        || (0..3).any(|i| segment_crosses_triangle(rhs[i], rhs[(i + 1) % 3], lhs))
}

/// Fan triangles of every facet, in facet order. A facet of `n` corners
/// yields `n - 2` triangles.
pub(crate) fn fan_triangles(workspace: &Workspace) -> Vec<Triangle> {
    let positions = &workspace.positions;
    let mut triangles = Vec::new();
    for (facet, work) in workspace.facets.iter().enumerate() {
        let v = &work.vertices;
        for k in 1..v.len().saturating_sub(1) {
            let vertices = [v[0], v[k], v[k + 1]];
            let points = vertices.map(|i| positions[i as usize]);
            triangles.push(Triangle {
                facet,
                vertices,
                corners: [0, k, k + 1],
                min: points[0].min(points[1]).min(points[2]),
                max: points[0].max(points[1]).max(points[2]),
            });
        }
    }
    triangles
}

fn facets_share_vertex(workspace: &Workspace, lhs: usize, rhs: usize) -> bool {
    let other = &workspace.facets[rhs].vertices;
    workspace.facets[lhs].vertices.iter().any(|v| other.contains(v))
}

/// Index pairs `(i, j)`, `i < j`, of intersecting triangles.
pub(crate) fn intersecting_triangle_pairs(workspace: &Workspace, triangles: &[Triangle]) -> Vec<(usize, usize)> {
    let positions = &workspace.positions;
    let mut order: Vec<usize> = (0..triangles.len()).collect();
    order.sort_by(|&a, &b| triangles[a].min.x.total_cmp(&triangles[b].min.x));

    let mut pairs = Vec::new();
    let mut candidates = 0usize;
    for (k, &i) in order.iter().enumerate() {
        let lhs = &triangles[i];
        for &j in &order[k + 1..] {
            let rhs = &triangles[j];
            if rhs.min.x > lhs.max.x {
                break;
            }
            if lhs.facet == rhs.facet || !lhs.overlaps(rhs) || facets_share_vertex(workspace, lhs.facet, rhs.facet) {
                continue;
            }
            candidates += 1;
            if triangles_intersect(lhs.points(positions), rhs.points(positions)) {
                pairs.push((i.min(j), i.max(j)));
            }
        }
    }
    pairs.sort_unstable();
    debug!(
        triangles = triangles.len(),
        candidates,
        intersecting = pairs.len(),
        "intersection sweep"
    );
    pairs
}

/// Counts facet pairs that intersect without sharing a vertex.
pub(crate) fn count_intersecting_pairs(workspace: &Workspace) -> usize {
    let triangles = fan_triangles(workspace);
    intersecting_triangle_pairs(workspace, &triangles)
        .into_iter()
        .map(|(i, j)| {
            let (a, b) = (triangles[i].facet, triangles[j].facet);
            (a.min(b), a.max(b))
        })
        .collect::<HashSet<_>>()
        .len()
}
