//! Internal shell removal.
//!
//! A shell is a set of facets connected through shared vertices. A closed,
//! outward facing shell whose first facet centroid lies inside another
//! closed shell is redundant and removed. Inward facing shells are cavities
//! and stay.

use config::constants::EPSILON;
use glam::Vec3;
use tracing::debug;

use super::Workspace;
use crate::geometry::MassIntegrals;

/// Ray direction off every axis and diagonal.
const RAY_DIRECTION: Vec3 = Vec3::new(0.267_261_24, 0.534_522_5, 0.801_783_7);

#[derive(Debug)]
pub(crate) struct Shell {
    pub facets: Vec<usize>,
    /// Every directed edge has its reverse.
    pub closed: bool,
    /// Signed enclosed volume; negative for inward facing shells.
    pub volume: f32,
}

impl Shell {
    /// Whether the shell bounds a solid.
    pub fn is_solid(&self) -> bool {
        self.closed && self.volume > 0.0
    }

    /// Fan triangles of the shell's facets.
    pub fn triangles<'a>(&'a self, workspace: &'a Workspace) -> impl Iterator<Item = [Vec3; 3]> + 'a {
        self.facets
            .iter()
            .flat_map(move |&f| fan(&workspace.facets[f].vertices, &workspace.positions))
    }
}

fn find(parent: &mut [usize], mut x: usize) -> usize {
    while parent[x] != x {
        parent[x] = parent[parent[x]];
        x = parent[x];
    }
    x
}

/// Connected components of the facets.
pub(crate) fn shells(workspace: &Workspace) -> Vec<Shell> {
    let positions = &workspace.positions;
    let mut parent: Vec<usize> = (0..positions.len()).collect();
    for facet in &workspace.facets {
        let Some((&first, rest)) = facet.vertices.split_first() else {
            continue;
        };
        for &v in rest {
            let (a, b) = (find(&mut parent, first as usize), find(&mut parent, v as usize));
            if a != b {
                parent[b] = a;
            }
        }
    }

    let mut by_root: Vec<Option<usize>> = vec![None; positions.len()];
    let mut result: Vec<Shell> = Vec::new();
    for (index, facet) in workspace.facets.iter().enumerate() {
        let Some(&first) = facet.vertices.first() else {
            continue;
        };
        let root = find(&mut parent, first as usize);
        let shell = *by_root[root].get_or_insert_with(|| {
            result.push(Shell {
                facets: Vec::new(),
                closed: false,
                volume: 0.0,
            });
            result.len() - 1
        });
        result[shell].facets.push(index);
    }

    let edges = workspace.directed_edges();
    for shell in &mut result {
        shell.closed = shell.facets.iter().all(|&f| {
            let v = &workspace.facets[f].vertices;
            let n = v.len();
            (0..n).all(|i| edges.contains_key(&(v[(i + 1) % n], v[i])))
        });
        let mut integrals = MassIntegrals::default();
        for triangle in shell.triangles(workspace) {
            integrals.add_triangle(triangle);
        }
        shell.volume = integrals.signed_volume() as f32;
    }
    result
}

/// Fan triangles of a polygon as positions.
pub(crate) fn fan<'a>(vertices: &'a [u32], positions: &'a [Vec3]) -> impl Iterator<Item = [Vec3; 3]> + 'a {
    (1..vertices.len().saturating_sub(1)).map(move |k| {
        [
            positions[vertices[0] as usize],
            positions[vertices[k] as usize],
            positions[vertices[k + 1] as usize],
        ]
    })
}

/// Möller–Trumbore ray triangle hit, for `t > EPSILON`.
fn ray_hits_triangle(origin: Vec3, direction: Vec3, [a, b, c]: [Vec3; 3]) -> bool {
    let e1 = b - a;
    let e2 = c - a;
    let p = direction.cross(e2);
    let det = e1.dot(p);
    if det.abs() < EPSILON * EPSILON {
        return false;
    }
    let inv_det = 1.0 / det;
    let s = origin - a;
    let u = s.dot(p) * inv_det;
    if !(0.0..=1.0).contains(&u) {
        return false;
    }
    let q = s.cross(e1);
    let v = direction.dot(q) * inv_det;
    if v < 0.0 || u + v > 1.0 {
        return false;
    }
    e2.dot(q) * inv_det > EPSILON
}

/// Ray parity test of `point` against a closed surface.
pub(crate) fn point_inside(point: Vec3, surface: impl IntoIterator<Item = [Vec3; 3]>) -> bool {
    let hits = surface
        .into_iter()
        .filter(|&triangle| ray_hits_triangle(point, RAY_DIRECTION, triangle))
        .count();
    hits % 2 == 1
}

/// Removes closed outward facing shells that lie inside another closed
/// shell. Returns the number of shells removed.
pub(crate) fn remove_internal_shells(workspace: &mut Workspace) -> usize {
    let shells = shells(workspace);
    if shells.len() < 2 {
        return 0;
    }

    let mut removed_facets = vec![false; workspace.facets.len()];
    let mut removed = 0;
    for (index, shell) in shells.iter().enumerate() {
        if !shell.is_solid() {
            continue;
        }
        let first = &workspace.facets[shell.facets[0]].vertices;
        let sample = first
            .iter()
            .map(|&v| workspace.positions[v as usize])
            .sum::<Vec3>()
            / first.len() as f32;
        let inside = shells.iter().enumerate().any(|(other, outer)| {
            other != index && outer.closed && point_inside(sample, outer.triangles(workspace))
        });
        if inside {
            for &f in &shell.facets {
                removed_facets[f] = true;
            }
            removed += 1;
        }
    }

    if removed > 0 {
        let mut index = 0;
        workspace.facets.retain(|_| {
            let keep = !removed_facets[index];
            index += 1;
            keep
        });
        debug!(shells = shells.len(), removed, "internal shells removed");
    }
    removed
}
