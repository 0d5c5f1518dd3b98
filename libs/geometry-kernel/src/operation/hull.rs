//! # Convex Hull
//!
//! QuickHull over the vertex positions of a geometry.
//!
//! ## Steps
//!
//! 1. Tetrahedron from the extreme points
//! 2. Each remaining point goes to the first face it lies in front of
//! 3. While a face has points in front of it, the farthest becomes a hull
//!    vertex: faces visible from it are replaced by a cone from their
//!    horizon, and their points are reassigned
//!
//! Computed in `f64` with a tolerance relative to the bounding box.

use std::collections::HashSet;

use config::constants::{EPSILON, HULL_RELATIVE_EPSILON};
use glam::DVec3;
use tracing::debug;

use super::GeometryOperation;
use crate::error::{GeometryError, GeometryResult};
use crate::geometry::{Geometry, Topology};

/// Triangle of the hull under construction, wound outward.
#[derive(Debug, Clone)]
struct HullFace {
    vertices: [usize; 3],
    normal: DVec3,
    offset: f64,
    outside: Vec<usize>,
}

impl HullFace {
    fn new(vertices: [usize; 3], points: &[DVec3]) -> Self {
        let [p0, p1, p2] = vertices.map(|v| points[v]);
        let normal = (p1 - p0).cross(p2 - p0).normalize_or_zero();
        Self {
            vertices,
            normal,
            offset: normal.dot(p0),
            outside: Vec::new(),
        }
    }

    fn distance(&self, point: DVec3) -> f64 {
        self.normal.dot(point) - self.offset
    }

    fn edges(&self) -> [(usize, usize); 3] {
        let [a, b, c] = self.vertices;
        [(a, b), (b, c), (c, a)]
    }
}

/// Builds the convex hull of the vertex positions of `source` as a new
/// geometry named `hull({name})`.
///
/// Hull vertices keep the attributes of the source vertex they come from.
/// Their corners average the source corners of that vertex. Facets are
/// triangles.
///
/// # Errors
///
/// [`GeometryError::DegenerateHull`] when there are fewer than four points
/// or all points are collinear or coplanar.
///
/// # Example
///
/// ```rust
/// use geometry_kernel::operation::make_convex_hull;
/// use geometry_kernel::Geometry;
/// use glam::Vec3;
///
/// let mut points = Geometry::named("points");
/// for p in [Vec3::ZERO, Vec3::X, Vec3::Y, Vec3::Z, Vec3::splat(0.1)] {
///     points.mesh_mut().add_vertex(p);
/// }
/// let hull = make_convex_hull(&points)?;
/// assert_eq!(hull.get_name(), "hull(points)");
/// assert_eq!(hull.mesh().vertex_count(), 4);
/// assert_eq!(hull.mesh().facet_count(), 4);
/// # Ok::<(), geometry_kernel::GeometryError>(())
/// ```
pub fn make_convex_hull(source: &Geometry) -> GeometryResult<Geometry> {
    let mesh = source.mesh();
    let points: Vec<DVec3> = mesh.positions().iter().map(|p| p.as_dvec3()).collect();
    let faces = quickhull(&points)?;

    let mut operation = GeometryOperation::new(source, format!("hull({})", source.get_name()));
    let topology = Topology::build(mesh);
    let mut dst_vertices = [0u32; 3];
    for face in &faces {
        for (dst, &src) in dst_vertices.iter_mut().zip(&face.vertices) {
            let src = src as u32;
            *dst = match operation.dst_vertex(src) {
                Some(existing) => existing,
                None => {
                    let vertex = operation.make_new_dst_vertex_from_src_vertex(src);
                    let corners = topology.vertex_corners(src);
                    let weight = 1.0 / corners.len().max(1) as f32;
                    for &corner in corners {
                        operation.add_vertex_corner_source(vertex, weight, corner);
                    }
                    vertex
                }
            };
        }
        operation.make_new_dst_facet(None, &dst_vertices);
    }
    operation.distribute_corner_sources();

    debug!(
        source = %source.get_name(),
        points = points.len(),
        facets = faces.len(),
        "convex hull built"
    );
    Ok(operation.post_processing())
}

fn degenerate(reason: &str) -> GeometryError {
    GeometryError::DegenerateHull {
        reason: reason.to_owned(),
    }
}

fn tolerance(points: &[DVec3]) -> f64 {
    let (min, max) = points
        .iter()
        .fold((DVec3::INFINITY, DVec3::NEG_INFINITY), |(min, max), &p| (min.min(p), max.max(p)));
    let diagonal = (max - min).length();
    (diagonal * f64::from(HULL_RELATIVE_EPSILON)).max(f64::from(EPSILON) * f64::from(EPSILON))
}

/// Hull faces over `points`, wound outward.
fn quickhull(points: &[DVec3]) -> GeometryResult<Vec<HullFace>> {
    if points.len() < 4 {
        return Err(degenerate("fewer than four points"));
    }
    let eps = tolerance(points);
    let mut faces = initial_simplex(points, eps)?;

    let simplex: HashSet<usize> = faces.iter().flat_map(|f| f.vertices).collect();
    let remaining: Vec<usize> = (0..points.len()).filter(|i| !simplex.contains(i)).collect();
    assign(&mut faces, &remaining, points, eps);

    let mut iterations = 0usize;
    while let Some(index) = faces.iter().position(|f| !f.outside.is_empty()) {
        iterations += 1;
        let face = &faces[index];
        let Some(apex) = face
            .outside
            .iter()
            .copied()
            .max_by(|&a, &b| face.distance(points[a]).total_cmp(&face.distance(points[b])))
        else {
            break;
        };
        let apex_point = points[apex];

        let visible: Vec<bool> = faces.iter().map(|f| f.distance(apex_point) > eps).collect();
        let visible_edges: HashSet<(usize, usize)> = faces
            .iter()
            .zip(&visible)
            .filter(|(_, v)| **v)
            .flat_map(|(f, _)| f.edges())
            .collect();
        let horizon: Vec<(usize, usize)> = visible_edges
            .iter()
            .copied()
            .filter(|&(a, b)| !visible_edges.contains(&(b, a)))
            .collect();

        let mut orphans = Vec::new();
        let mut kept = Vec::with_capacity(faces.len());
        for (face, visible) in faces.into_iter().zip(visible) {
            if visible {
                orphans.extend(face.outside.into_iter().filter(|&p| p != apex));
            } else {
                kept.push(face);
            }
        }
        kept.extend(horizon.into_iter().map(|(a, b)| HullFace::new([a, b, apex], points)));
        faces = kept;
        assign(&mut faces, &orphans, points, eps);
    }

    debug!(points = points.len(), faces = faces.len(), iterations, "quickhull finished");
    Ok(faces)
}

/// Gives each point to the first face it lies in front of. Points behind
/// every face are inside and dropped.
fn assign(faces: &mut [HullFace], candidates: &[usize], points: &[DVec3], eps: f64) {
    for &index in candidates {
        if let Some(face) = faces.iter_mut().find(|f| f.distance(points[index]) > eps) {
            face.outside.push(index);
        }
    }
}

fn initial_simplex(points: &[DVec3], eps: f64) -> GeometryResult<Vec<HullFace>> {
    let mut extremes = [0usize; 6];
    for (i, p) in points.iter().enumerate() {
        for axis in 0..3 {
            if p[axis] < points[extremes[2 * axis]][axis] {
                extremes[2 * axis] = i;
            }
            if p[axis] > points[extremes[2 * axis + 1]][axis] {
                extremes[2 * axis + 1] = i;
            }
        }
    }

    let mut pair = (extremes[0], extremes[1]);
    let mut pair_distance = 0.0;
    for (k, &a) in extremes.iter().enumerate() {
        for &b in &extremes[k + 1..] {
            let distance = points[a].distance_squared(points[b]);
            if distance > pair_distance {
                pair_distance = distance;
                pair = (a, b);
            }
        }
    }
    let (p0, p1) = pair;
    if pair_distance.sqrt() <= eps {
        return Err(degenerate("all points coincide"));
    }

    let direction = (points[p1] - points[p0]).normalize();
    let (p2, line_distance) = farthest(points, |p| {
        let offset = p - points[p0];
        (offset - direction * offset.dot(direction)).length()
    });
    if line_distance <= eps {
        return Err(degenerate("all points are collinear"));
    }

    let normal = (points[p1] - points[p0]).cross(points[p2] - points[p0]).normalize();
    let (p3, plane_distance) = farthest(points, |p| normal.dot(p - points[p0]).abs());
    if plane_distance <= eps {
        return Err(degenerate("all points are coplanar"));
    }

    // Wind the base away from the fourth point.
    let base = if normal.dot(points[p3] - points[p0]) > 0.0 {
        [p0, p2, p1]
    } else {
        [p0, p1, p2]
    };
    let [a, b, c] = base;
    Ok(vec![
        HullFace::new([a, b, c], points),
        HullFace::new([a, p3, b], points),
        HullFace::new([b, p3, c], points),
        HullFace::new([c, p3, a], points),
    ])
}

fn farthest(points: &[DVec3], distance: impl Fn(DVec3) -> f64) -> (usize, f64) {
    points
        .iter()
        .enumerate()
        .map(|(i, &p)| (i, distance(p)))
        .fold((0, 0.0), |best, candidate| if candidate.1 > best.1 { candidate } else { best })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cube_points() -> Vec<DVec3> {
        (0..8u32)
            .map(|i| DVec3::new((i & 1) as f64, ((i >> 1) & 1) as f64, ((i >> 2) & 1) as f64))
            .collect()
    }

    fn is_closed(faces: &[HullFace]) -> bool {
        let edges: HashSet<(usize, usize)> = faces.iter().flat_map(|f| f.edges()).collect();
        edges.iter().all(|&(a, b)| edges.contains(&(b, a)))
    }

    #[test]
    fn test_simplex_faces_point_outward() {
        let points = cube_points();
        let faces = initial_simplex(&points, 1e-9).expect("cube is not flat");
        let centroid = faces.iter().flat_map(|f| f.vertices).map(|v| points[v]).sum::<DVec3>() / 12.0;
        for face in &faces {
            assert!(face.distance(centroid) < 0.0);
        }
        assert!(is_closed(&faces));
    }

    #[test]
    fn test_cube_hull_ignores_interior_points() {
        let mut points = cube_points();
        points.push(DVec3::splat(0.5));
        points.push(DVec3::new(0.25, 0.75, 0.5));
        let faces = quickhull(&points).expect("cube is not flat");
        assert_eq!(faces.len(), 12);
        assert!(is_closed(&faces));
        let used: HashSet<usize> = faces.iter().flat_map(|f| f.vertices).collect();
        assert_eq!(used.len(), 8);
        assert!(used.iter().all(|&v| v < 8));
    }

    #[test]
    fn test_coplanar_points_are_rejected() {
        let points = [DVec3::ZERO, DVec3::X, DVec3::Y, DVec3::new(1.0, 1.0, 0.0)];
        assert_eq!(
            quickhull(&points).map(|f| f.len()),
            Err(degenerate("all points are coplanar"))
        );
    }

    #[test]
    fn test_too_few_points_are_rejected() {
        assert!(quickhull(&[DVec3::ZERO, DVec3::X, DVec3::Y]).is_err());
    }
}
