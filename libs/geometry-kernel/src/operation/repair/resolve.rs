//! Self-intersection resolution.
//!
//! Facets with an intersecting triangle are replaced by their fan triangles,
//! and each triangle is cut into convex pieces along the segments where it
//! crosses other triangles. New vertices are then threaded into every facet
//! edge they lie on. Pieces of a solid that end up inside another solid are
//! dropped, which turns interpenetrating solids into the surface of their
//! union.
//!
//! ## Steps
//!
//! 1. Intersection segment per triangle pair, from the edges of one triangle
//!    crossing the other
//! 2. Cut each triangle by the line of every segment that overlaps a piece
//! 3. Insert new vertices lying inside facet edges (T-junctions)
//! 4. Drop pieces of a solid whose interior point lies inside another solid

use std::collections::{HashMap, HashSet};

use config::constants::{EPSILON, REPAIR_INTERSECTION_RELATIVE_EPSILON};
use glam::Vec3;
use point_octree::{L2Distance, Octree, OctreeParams};
use tracing::debug;

use super::intersect::{self, Triangle};
use super::shells;
use super::{bounding_diagonal, WorkCorner, WorkFacet, Workspace};

/// What resolution changed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct Resolution {
    /// Intersecting facet pairs that were split.
    pub resolved: usize,
    /// Pieces dropped because they lie inside another solid.
    pub removed_enclosed: usize,
}

#[derive(Debug, Clone)]
struct PieceVertex {
    vertex: u32,
    corner: WorkCorner,
}

/// Convex part of a triangle, wound like the triangle.
type Piece = Vec<PieceVertex>;

/// Vertices added by resolution, bucketed on a grid of tolerance sized
/// cells so nearby cuts share them.
#[derive(Debug)]
struct NewVertices {
    tolerance: f32,
    cells: HashMap<[i32; 3], Vec<u32>>,
}

impl NewVertices {
    fn new(tolerance: f32) -> Self {
        Self {
            tolerance,
            cells: HashMap::new(),
        }
    }

    fn cell(&self, p: Vec3) -> [i32; 3] {
        (p / self.tolerance).floor().as_ivec3().to_array()
    }

    fn find(&self, positions: &[Vec3], p: Vec3) -> Option<u32> {
        let [x, y, z] = self.cell(p);
        let mut best: Option<(f32, u32)> = None;
        for dx in -1..=1 {
            for dy in -1..=1 {
                for dz in -1..=1 {
                    let key = [x.saturating_add(dx), y.saturating_add(dy), z.saturating_add(dz)];
                    let Some(bucket) = self.cells.get(&key) else {
                        continue;
                    };
                    for &v in bucket {
                        let distance = positions[v as usize].distance(p);
                        if distance <= self.tolerance && best.map_or(true, |(d, _)| distance < d) {
                            best = Some((distance, v));
                        }
                    }
                }
            }
        }
        best.map(|(_, v)| v)
    }

    /// Vertex at `t` along `a b`. An end within tolerance or a known new
    /// vertex within tolerance is reused.
    fn vertex_on_edge(&mut self, workspace: &mut Workspace, a: u32, b: u32, t: f32) -> u32 {
        let pa = workspace.positions[a as usize];
        let pb = workspace.positions[b as usize];
        let length = pa.distance(pb);
        if t * length <= self.tolerance {
            return a;
        }
        if (1.0 - t) * length <= self.tolerance {
            return b;
        }
        let position = pa.lerp(pb, t);
        if let Some(existing) = self.find(&workspace.positions, position) {
            return existing;
        }
        let vertex = workspace.add_vertex_between(a, b, t, position);
        let cell = self.cell(position);
        self.cells.entry(cell).or_default().push(vertex);
        vertex
    }
}

/// Parameter along `a b` where it meets the plane of `triangle`.
fn plane_crossing(a: Vec3, b: Vec3, [r0, r1, r2]: [Vec3; 3]) -> Option<f32> {
    let (r0, r1, r2) = (r0.as_dvec3(), r1.as_dvec3(), r2.as_dvec3());
    let normal = (r1 - r0).cross(r2 - r0);
    let da = normal.dot(a.as_dvec3() - r0);
    let db = normal.dot(b.as_dvec3() - r0);
    if da == db {
        return None;
    }
    Some((da / (da - db)).clamp(0.0, 1.0) as f32)
}

/// Segment where two triangles cross, as a pair of vertices.
fn intersection_segment(
    lhs: &Triangle,
    rhs: &Triangle,
    workspace: &mut Workspace,
    new_vertices: &mut NewVertices,
) -> Option<(u32, u32)> {
    let mut points: Vec<u32> = Vec::with_capacity(4);
    for (edges, other) in [(lhs, rhs), (rhs, lhs)] {
        let other_points = other.points(&workspace.positions);
        for i in 0..3 {
            let (a, b) = (edges.vertices[i], edges.vertices[(i + 1) % 3]);
            let (pa, pb) = (workspace.positions[a as usize], workspace.positions[b as usize]);
            if !intersect::segment_crosses_triangle(pa, pb, other_points) {
                continue;
            }
            let Some(t) = plane_crossing(pa, pb, other_points) else {
                continue;
            };
            let vertex = new_vertices.vertex_on_edge(workspace, a, b, t);
            if !points.contains(&vertex) {
                points.push(vertex);
            }
        }
    }

    let positions = &workspace.positions;
    let mut best: Option<(f32, (u32, u32))> = None;
    for (i, &p) in points.iter().enumerate() {
        for &q in &points[i + 1..] {
            let length = positions[p as usize].distance(positions[q as usize]);
            if length > new_vertices.tolerance && best.map_or(true, |(l, _)| length > l) {
                best = Some((length, (p, q)));
            }
        }
    }
    best.map(|(_, segment)| segment)
}

/// Whether segment `p q`, in the plane of the piece, overlaps the piece by
/// more than the tolerance. Cyrus-Beck clipping against the piece edges.
fn segment_overlaps(piece: &Piece, p: Vec3, q: Vec3, normal: Vec3, positions: &[Vec3], tolerance: f32) -> bool {
    let direction = q - p;
    let length = direction.length();
    let (mut t0, mut t1) = (0.0_f32, 1.0_f32);
    let n = piece.len();
    for i in 0..n {
        let u = positions[piece[i].vertex as usize];
        let v = positions[piece[(i + 1) % n].vertex as usize];
        let Some(inward) = normal.cross(v - u).try_normalize() else {
            continue;
        };
        let distance = inward.dot(p - u);
        let rate = inward.dot(direction);
        if rate.abs() <= f32::EPSILON * length {
            if distance < -tolerance {
                return false;
            }
            continue;
        }
        let t = -distance / rate;
        if rate > 0.0 {
            t0 = t0.max(t);
        } else {
            t1 = t1.min(t);
        }
        if t0 > t1 {
            return false;
        }
    }
    (t1 - t0) * length > tolerance
}

/// Drops consecutive repeats, cyclically.
fn dedup_cycle(mut piece: Piece) -> Piece {
    piece.dedup_by(|b, a| a.vertex == b.vertex);
    while piece.len() > 1 && piece.last().map(|p| p.vertex) == piece.first().map(|p| p.vertex) {
        piece.pop();
    }
    piece
}

/// Splits a convex piece by the plane through `origin` with normal `side`.
/// `None` when the piece lies on one side within tolerance.
fn split(
    piece: &Piece,
    origin: Vec3,
    side: Vec3,
    workspace: &mut Workspace,
    new_vertices: &mut NewVertices,
) -> Option<(Piece, Piece)> {
    let tolerance = new_vertices.tolerance;
    let distances: Vec<f32> = piece
        .iter()
        .map(|pv| side.dot(workspace.positions[pv.vertex as usize] - origin))
        .collect();
    if distances.iter().all(|&d| d >= -tolerance) || distances.iter().all(|&d| d <= tolerance) {
        return None;
    }

    let (mut front, mut back) = (Piece::new(), Piece::new());
    let n = piece.len();
    for i in 0..n {
        let j = (i + 1) % n;
        let (di, dj) = (distances[i], distances[j]);
        if di > tolerance {
            front.push(piece[i].clone());
        } else if di < -tolerance {
            back.push(piece[i].clone());
        } else {
            front.push(piece[i].clone());
            back.push(piece[i].clone());
        }
        if (di > tolerance && dj < -tolerance) || (di < -tolerance && dj > tolerance) {
            let t = di / (di - dj);
            let vertex = new_vertices.vertex_on_edge(workspace, piece[i].vertex, piece[j].vertex, t);
            let crossing = PieceVertex {
                vertex,
                corner: piece[i].corner.lerp(&piece[j].corner, t),
            };
            front.push(crossing.clone());
            back.push(crossing);
        }
    }
    let (front, back) = (dedup_cycle(front), dedup_cycle(back));
    (front.len() >= 3 && back.len() >= 3).then_some((front, back))
}

/// Cuts a fan triangle of `facet` along `segments`.
fn cut_triangle(
    triangle: &Triangle,
    facet: &WorkFacet,
    segments: &[(u32, u32)],
    workspace: &mut Workspace,
    new_vertices: &mut NewVertices,
) -> Vec<Piece> {
    let initial: Piece = (0..3)
        .map(|k| PieceVertex {
            vertex: triangle.vertices[k],
            corner: facet.corners[triangle.corners[k]].clone(),
        })
        .collect();
    let [p0, p1, p2] = triangle.points(&workspace.positions);
    let Some(normal) = (p1 - p0).cross(p2 - p0).try_normalize() else {
        return vec![initial];
    };

    let mut pieces = vec![initial];
    for &(p, q) in segments {
        let (pp, pq) = (workspace.positions[p as usize], workspace.positions[q as usize]);
        let Some(side) = normal.cross(pq - pp).try_normalize() else {
            continue;
        };
        let mut next = Vec::with_capacity(pieces.len() + 1);
        for piece in pieces {
            if !segment_overlaps(&piece, pp, pq, normal, &workspace.positions, new_vertices.tolerance) {
                next.push(piece);
                continue;
            }
            match split(&piece, pp, side, workspace, new_vertices) {
                Some((front, back)) => {
                    next.push(front);
                    next.push(back);
                }
                None => next.push(piece),
            }
        }
        pieces = next;
    }
    pieces
}

/// Inserts vertices from `first_new_vertex` on that lie strictly inside a
/// facet edge. Returns the number of insertions.
fn insert_t_junctions(facets: &mut [WorkFacet], positions: &[Vec3], first_new_vertex: usize, tolerance: f32) -> usize {
    let new: Vec<u32> = (first_new_vertex as u32..positions.len() as u32).collect();
    if new.is_empty() {
        return 0;
    }
    let octree = Octree::with_indices(positions, &new, OctreeParams::default());
    let mut neighbors = Vec::new();
    let mut inserted = 0;
    for facet in facets.iter_mut() {
        let n = facet.vertices.len();
        let mut vertices = Vec::with_capacity(n);
        let mut corners = Vec::with_capacity(n);
        for i in 0..n {
            let j = (i + 1) % n;
            let (a, b) = (facet.vertices[i], facet.vertices[j]);
            vertices.push(a);
            corners.push(facet.corners[i].clone());

            let (pa, pb) = (positions[a as usize], positions[b as usize]);
            let edge = pb - pa;
            let length = edge.length();
            if length <= 2.0 * tolerance {
                continue;
            }
            octree.radius_neighbors::<L2Distance>(&pa.lerp(pb, 0.5), 0.5 * length + tolerance, &mut neighbors);
            let mut on_edge: Vec<(f32, u32)> = neighbors
                .iter()
                .filter_map(|&w| {
                    if facet.vertices.contains(&w) {
                        return None;
                    }
                    let offset = positions[w as usize] - pa;
                    let t = offset.dot(edge) / (length * length);
                    let along = t * length;
                    if along <= tolerance || along >= length - tolerance {
                        return None;
                    }
                    ((offset - edge * t).length() <= tolerance).then_some((t, w))
                })
                .collect();
            on_edge.sort_by(|x, y| x.0.total_cmp(&y.0));
            for (t, w) in on_edge {
                vertices.push(w);
                corners.push(facet.corners[i].lerp(&facet.corners[j], t));
                inserted += 1;
            }
        }
        facet.vertices = vertices;
        facet.corners = corners;
    }
    inserted
}

/// Centroid of the largest fan triangle, a point inside convex facets.
fn interior_point(vertices: &[u32], positions: &[Vec3]) -> Option<Vec3> {
    shells::fan(vertices, positions)
        .map(|[a, b, c]| ((b - a).cross(c - a).length_squared(), (a + b + c) / 3.0))
        .max_by(|x, y| x.0.total_cmp(&y.0))
        .map(|(_, point)| point)
}

/// Splits intersecting facets along their intersections and drops the
/// pieces of each solid that end up inside another solid.
pub(crate) fn resolve_intersections(workspace: &mut Workspace) -> Resolution {
    let triangles = intersect::fan_triangles(workspace);
    let pairs = intersect::intersecting_triangle_pairs(workspace, &triangles);
    if pairs.is_empty() {
        return Resolution::default();
    }
    let Some(diagonal) = bounding_diagonal(&workspace.positions) else {
        return Resolution::default();
    };
    let tolerance = (diagonal * REPAIR_INTERSECTION_RELATIVE_EPSILON).max(EPSILON * EPSILON);

    let mut new_vertices = NewVertices::new(tolerance);
    let first_new_vertex = workspace.positions.len();
    let mut segments: Vec<Vec<(u32, u32)>> = vec![Vec::new(); triangles.len()];
    let mut resolved_pairs = HashSet::new();
    for &(i, j) in &pairs {
        let Some(segment) = intersection_segment(&triangles[i], &triangles[j], workspace, &mut new_vertices) else {
            continue;
        };
        segments[i].push(segment);
        segments[j].push(segment);
        let (a, b) = (triangles[i].facet, triangles[j].facet);
        resolved_pairs.insert((a.min(b), a.max(b)));
    }
    if resolved_pairs.is_empty() {
        return Resolution::default();
    }

    // Solids and their surfaces before splitting.
    let shells = shells::shells(workspace);
    let mut shell_of_facet: Vec<Option<usize>> = vec![None; workspace.facets.len()];
    for (index, shell) in shells.iter().enumerate() {
        for &f in &shell.facets {
            shell_of_facet[f] = Some(index);
        }
    }
    let mut split_facets = vec![false; workspace.facets.len()];
    for (triangle, cuts) in triangles.iter().zip(&segments) {
        if !cuts.is_empty() {
            split_facets[triangle.facet] = true;
        }
    }
    let surfaces: HashMap<usize, Vec<[Vec3; 3]>> = shells
        .iter()
        .enumerate()
        .filter(|(_, shell)| shell.is_solid() && shell.facets.iter().any(|&f| split_facets[f]))
        .map(|(index, shell)| (index, shell.triangles(workspace).collect()))
        .collect();

    let original = std::mem::take(&mut workspace.facets);
    let mut facets = Vec::with_capacity(original.len() + 4 * pairs.len());
    let mut labels = Vec::with_capacity(facets.capacity());
    let mut first_triangle = 0;
    for (index, facet) in original.into_iter().enumerate() {
        let count = facet.vertices.len().saturating_sub(2);
        let range = first_triangle..first_triangle + count;
        first_triangle += count;
        if !split_facets[index] {
            facets.push(facet);
            labels.push(shell_of_facet[index]);
            continue;
        }
        for t in range {
            for piece in cut_triangle(&triangles[t], &facet, &segments[t], workspace, &mut new_vertices) {
                let (vertices, corners) = piece.into_iter().map(|pv| (pv.vertex, pv.corner)).unzip();
                facets.push(WorkFacet {
                    vertices,
                    corners,
                    source: facet.source,
                });
                labels.push(shell_of_facet[index]);
            }
        }
    }
    let split_count = facets.len();

    let inserted = insert_t_junctions(&mut facets, &workspace.positions, first_new_vertex, tolerance);

    let mut enclosed = vec![false; facets.len()];
    for (index, facet) in facets.iter().enumerate() {
        let Some(label) = labels[index] else {
            continue;
        };
        if !surfaces.contains_key(&label) {
            continue;
        }
        let Some(point) = interior_point(&facet.vertices, &workspace.positions) else {
            continue;
        };
        enclosed[index] = surfaces
            .iter()
            .any(|(&other, surface)| other != label && shells::point_inside(point, surface.iter().copied()));
    }
    let removed_enclosed = enclosed.iter().filter(|e| **e).count();
    let mut index = 0;
    facets.retain(|_| {
        let keep = !enclosed[index];
        index += 1;
        keep
    });
    workspace.facets = facets;

    debug!(
        pairs = pairs.len(),
        resolved = resolved_pairs.len(),
        new_vertices = workspace.positions.len() - first_new_vertex,
        facets = split_count,
        inserted,
        removed_enclosed,
        "self-intersections split"
    );
    Resolution {
        resolved: resolved_pairs.len(),
        removed_enclosed,
    }
}
