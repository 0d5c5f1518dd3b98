//! Boundary loop detection and small hole filling.

use std::collections::{HashMap, HashSet};

use glam::{Vec2, Vec3};
use tracing::{debug, warn};

use super::{WorkCorner, WorkFacet, Workspace};
use crate::math::max_axis_index;

/// A closed chain of boundary edges, wound the way a fill facet must be.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct BoundaryLoop {
    /// Vertex indices in fill winding.
    pub vertices: Vec<u32>,
}

impl BoundaryLoop {
    /// Number of edges in the loop.
    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.vertices.len()
    }

    /// Whether the loop can bound a polygon.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.vertices.len() >= 3
    }

    /// Newell normal of the loop; its length is twice the loop area.
    fn newell(&self, positions: &[Vec3]) -> Vec3 {
        let n = self.vertices.len();
        (0..n).fold(Vec3::ZERO, |sum, i| {
            let p = positions[self.vertices[i] as usize];
            let q = positions[self.vertices[(i + 1) % n] as usize];
            sum + p.cross(q)
        })
    }

    /// Area of the loop projected on its best fit plane.
    #[must_use]
    pub fn area(&self, positions: &[Vec3]) -> f32 {
        0.5 * self.newell(positions).length()
    }
}

/// Traces boundary loops. A directed edge `(a, b)` with no `(b, a)` is on
/// the boundary; the fill facet runs it as `b -> a`.
#[must_use]
pub(crate) fn detect_holes(workspace: &Workspace) -> Vec<BoundaryLoop> {
    let edges = workspace.directed_edges();
    let mut hole_next: HashMap<u32, u32> = HashMap::new();
    let mut ambiguous = HashSet::new();
    for &(a, b) in edges.keys() {
        if edges.contains_key(&(b, a)) {
            continue;
        }
        if hole_next.insert(b, a).is_some() {
            ambiguous.insert(b);
        }
    }
    if !ambiguous.is_empty() {
        warn!(vertices = ambiguous.len(), "non-manifold boundary vertices, their loops are skipped");
    }

    let mut starts: Vec<u32> = hole_next.keys().copied().collect();
    starts.sort_unstable();

    let mut visited = HashSet::new();
    let mut loops = Vec::new();
    for start in starts {
        if visited.contains(&start) {
            continue;
        }
        let mut vertices = vec![start];
        visited.insert(start);
        let mut current = start;
        let closed = loop {
            let Some(&next) = hole_next.get(&current) else {
                break false;
            };
            if next == start {
                break true;
            }
            if !visited.insert(next) {
                break false;
            }
            vertices.push(next);
            current = next;
        };
        let boundary = BoundaryLoop { vertices };
        if closed && boundary.is_valid() && !boundary.vertices.iter().any(|v| ambiguous.contains(v)) {
            loops.push(boundary);
        }
    }
    debug!(holes = loops.len(), "boundary loops traced");
    loops
}

/// Fills loops no larger than `max_area`. Returns (filled, skipped).
pub(crate) fn fill_holes(workspace: &mut Workspace, max_area: f32) -> (usize, usize) {
    let mut filled = 0;
    let mut skipped = 0;
    for boundary in detect_holes(workspace) {
        let area = boundary.area(&workspace.positions);
        if area > max_area {
            debug!(edges = boundary.edge_count(), area, "hole too large to fill");
            skipped += 1;
            continue;
        }
        for triangle in triangulate(&boundary, &workspace.positions) {
            workspace.facets.push(WorkFacet {
                vertices: triangle.to_vec(),
                corners: vec![WorkCorner::Fill; 3],
                source: None,
            });
        }
        filled += 1;
    }
    (filled, skipped)
}

/// Ear clipping in the plane of the loop's dominant normal axis. Falls back
/// to a fan when no ear is found.
pub(crate) fn triangulate(boundary: &BoundaryLoop, positions: &[Vec3]) -> Vec<[u32; 3]> {
    let normal = boundary.newell(positions);
    let axis = max_axis_index(normal);
    let (u, v) = ((axis + 1) % 3, (axis + 2) % 3);
    let winding = if normal[axis] < 0.0 { -1.0 } else { 1.0 };
    let project = |vertex: u32| {
        let p = positions[vertex as usize];
        Vec2::new(p[u], p[v])
    };

    let mut remaining = boundary.vertices.clone();
    let mut triangles = Vec::with_capacity(remaining.len().saturating_sub(2));
    while remaining.len() > 3 {
        let n = remaining.len();
        let ear = (0..n).find(|&i| {
            let a = project(remaining[(i + n - 1) % n]);
            let b = project(remaining[i]);
            let c = project(remaining[(i + 1) % n]);
            if (b - a).perp_dot(c - b) * winding <= 0.0 {
                return false;
            }
            !remaining.iter().enumerate().any(|(j, &other)| {
                j != i && j != (i + n - 1) % n && j != (i + 1) % n && in_triangle(project(other), a, b, c)
            })
        });
        let Some(i) = ear else {
            warn!(corners = n, "no ear found, filling with a fan");
            for k in 1..n - 1 {
                triangles.push([remaining[0], remaining[k], remaining[k + 1]]);
            }
            return triangles;
        };
        triangles.push([remaining[(i + n - 1) % n], remaining[i], remaining[(i + 1) % n]]);
        remaining.remove(i);
    }
    if let [a, b, c] = remaining[..] {
        triangles.push([a, b, c]);
    }
    triangles
}

/// Inclusive point in triangle test, either winding.
fn in_triangle(p: Vec2, a: Vec2, b: Vec2, c: Vec2) -> bool {
    let d0 = (b - a).perp_dot(p - a);
    let d1 = (c - b).perp_dot(p - b);
    let d2 = (a - c).perp_dot(p - c);
    let negative = d0 < 0.0 || d1 < 0.0 || d2 < 0.0;
    let positive = d0 > 0.0 || d1 > 0.0 || d2 > 0.0;
    !(negative && positive)
}
