//! # Octree
//!
//! Index-based octree with octants stored in a single arena.
//!
//! Construction relinks a successor list so that the points of every octant
//! form one contiguous chain. Children partition their parent's chain, and the
//! last point of each child links to the first point of the next child, so a
//! parent covers exactly the concatenation of its children.
//!
//! The tree is immutable after construction. Rebuild it when points change.

use std::borrow::Cow;

use config::constants::{OCTREE_DEFAULT_BUCKET_SIZE, OCTREE_DEFAULT_MIN_EXTENT};
use tracing::debug;

use crate::distance::{Distance, Point3};

// =============================================================================
// PARAMETERS
// =============================================================================

/// Construction parameters.
///
/// # Example
///
/// ```rust
/// use point_octree::OctreeParams;
///
/// let params = OctreeParams::default();
/// assert_eq!(params.bucket_size, 32);
/// assert!(!params.copy_points);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OctreeParams {
    /// Octants holding more points than this are subdivided.
    pub bucket_size: u32,
    /// Keep an owned copy of the points instead of borrowing them.
    pub copy_points: bool,
    /// Octants are not subdivided once their half extent drops to twice this.
    pub min_extent: f32,
}

impl Default for OctreeParams {
    fn default() -> Self {
        Self {
            bucket_size: OCTREE_DEFAULT_BUCKET_SIZE,
            copy_points: false,
            min_extent: OCTREE_DEFAULT_MIN_EXTENT,
        }
    }
}

// =============================================================================
// OCTANTS
// =============================================================================

/// Handle of an octant in the arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct OctantIndex(u32);

impl OctantIndex {
    #[inline]
    fn get(self) -> usize {
        self.0 as usize
    }
}

#[derive(Debug, Clone)]
struct Octant {
    is_leaf: bool,
    center: [f32; 3],
    /// Half of the side length.
    extent: f32,
    start: u32,
    end: u32,
    size: u32,
    children: [Option<OctantIndex>; 8],
}

const CHILD_OFFSET: [f32; 2] = [-0.5, 0.5];

#[inline]
fn morton_code<P: Point3>(point: &P, center: &[f32; 3]) -> usize {
    let mut code = 0;
    if point.x() > center[0] {
        code |= 1;
    }
    if point.y() > center[1] {
        code |= 2;
    }
    if point.z() > center[2] {
        code |= 4;
    }
    code
}

// =============================================================================
// OCTREE
// =============================================================================

/// Octree over a point slice.
///
/// Points are borrowed unless [`OctreeParams::copy_points`] is set.
/// Query results are indices into the original point slice.
///
/// # Example
///
/// ```rust
/// use glam::Vec3;
/// use point_octree::{L2Distance, Octree, OctreeParams};
///
/// let points: Vec<Vec3> = (0..100).map(|i| Vec3::new(i as f32, 0.0, 0.0)).collect();
/// let octree = Octree::new(&points, OctreeParams::default());
///
/// let nearest = octree.find_neighbor::<L2Distance>(&Vec3::new(41.2, 0.0, 0.0), -1.0);
/// assert_eq!(nearest, Some(41));
/// ```
#[derive(Debug, Clone)]
pub struct Octree<'a, P: Point3 + Clone> {
    params: OctreeParams,
    points: Cow<'a, [P]>,
    successors: Vec<u32>,
    octants: Vec<Octant>,
    root: Option<OctantIndex>,
}

impl<'a, P: Point3 + Clone> Octree<'a, P> {
    /// Builds an octree over every point.
    ///
    /// An empty slice produces an empty tree that answers every query with
    /// no result.
    pub fn new(points: &'a [P], params: OctreeParams) -> Self {
        let mut octree = Self::empty(points, params);
        let count = points.len() as u32;
        if count == 0 {
            return octree;
        }

        for (index, successor) in octree.successors.iter_mut().enumerate() {
            *successor = index as u32 + 1;
        }

        let (center, extent) = bounding_cube(points.iter());
        octree.root = Some(octree.create_octant(center, extent, 0, count - 1, count));
        debug!(
            points = count,
            octants = octree.octants.len(),
            "octree built"
        );
        octree
    }

    /// Builds an octree over the subset of points named by `indices`.
    ///
    /// Queries only ever report indices from the subset, but still index
    /// into the full `points` slice.
    pub fn with_indices(points: &'a [P], indices: &[u32], params: OctreeParams) -> Self {
        let mut octree = Self::empty(points, params);
        let Some((&first, rest)) = indices.split_first() else {
            return octree;
        };

        let mut last = first;
        for &index in rest {
            octree.successors[last as usize] = index;
            last = index;
        }

        let (center, extent) = bounding_cube(indices.iter().map(|&i| &points[i as usize]));
        octree.root = Some(octree.create_octant(
            center,
            extent,
            first,
            last,
            indices.len() as u32,
        ));
        debug!(
            points = indices.len(),
            octants = octree.octants.len(),
            "octree built over subset"
        );
        octree
    }

    fn empty(points: &'a [P], params: OctreeParams) -> Self {
        let points = if params.copy_points {
            Cow::Owned(points.to_vec())
        } else {
            Cow::Borrowed(points)
        };
        let successors = vec![0; points.len()];
        Self {
            params,
            points,
            successors,
            octants: Vec::new(),
            root: None,
        }
    }

    /// Returns the construction parameters.
    pub fn params(&self) -> &OctreeParams {
        &self.params
    }

    /// Returns true if the tree holds no points.
    pub fn is_empty(&self) -> bool {
        self.root.is_none()
    }

    /// Number of octants in the arena.
    pub fn octant_count(&self) -> usize {
        self.octants.len()
    }

    fn create_octant(
        &mut self,
        center: [f32; 3],
        extent: f32,
        start: u32,
        end: u32,
        size: u32,
    ) -> OctantIndex {
        let index = OctantIndex(self.octants.len() as u32);
        self.octants.push(Octant {
            is_leaf: true,
            center,
            extent,
            start,
            end,
            size,
            children: [None; 8],
        });

        if size <= self.params.bucket_size || extent <= 2.0 * self.params.min_extent {
            return index;
        }

        let mut child_starts = [0u32; 8];
        let mut child_ends = [0u32; 8];
        let mut child_sizes = [0u32; 8];

        // Relink the chain into disjoint per-child chains.
        let mut idx = start;
        for _ in 0..size {
            let code = morton_code(&self.points[idx as usize], &center);
            if child_sizes[code] == 0 {
                child_starts[code] = idx;
            } else {
                self.successors[child_ends[code] as usize] = idx;
            }
            child_sizes[code] += 1;
            child_ends[code] = idx;
            idx = self.successors[idx as usize];
        }

        let child_extent = 0.5 * extent;
        let mut children = [None; 8];
        let mut octant_start = start;
        let mut octant_end = end;
        let mut previous_child_end: Option<u32> = None;
        for code in 0..8 {
            if child_sizes[code] == 0 {
                continue;
            }
            let child_center = [
                center[0] + CHILD_OFFSET[usize::from(code & 1 > 0)] * extent,
                center[1] + CHILD_OFFSET[usize::from(code & 2 > 0)] * extent,
                center[2] + CHILD_OFFSET[usize::from(code & 4 > 0)] * extent,
            ];
            let child = self.create_octant(
                child_center,
                child_extent,
                child_starts[code],
                child_ends[code],
                child_sizes[code],
            );
            let (child_start, child_end) = {
                let octant = &self.octants[child.get()];
                (octant.start, octant.end)
            };

            match previous_child_end {
                None => octant_start = child_start,
                // Child chains are concatenated so the parent stays contiguous.
                Some(previous_end) => self.successors[previous_end as usize] = child_start,
            }
            previous_child_end = Some(child_end);
            octant_end = child_end;
            children[code] = Some(child);
        }

        let octant = &mut self.octants[index.get()];
        octant.is_leaf = false;
        octant.start = octant_start;
        octant.end = octant_end;
        octant.children = children;
        index
    }

    fn octant(&self, index: OctantIndex) -> &Octant {
        &self.octants[index.get()]
    }

    /// Iterates the point indices covered by an octant.
    fn octant_points(&self, octant: &Octant) -> impl Iterator<Item = u32> + '_ {
        let successors = &self.successors;
        std::iter::successors(Some(octant.start), move |&idx| Some(successors[idx as usize]))
            .take(octant.size as usize)
    }

    // =========================================================================
    // RADIUS QUERIES
    // =========================================================================

    /// Collects the indices of all points strictly within `radius` of `query`.
    ///
    /// `result` is cleared first. Order is unspecified.
    pub fn radius_neighbors<D: Distance>(&self, query: &P, radius: f32, result: &mut Vec<u32>) {
        result.clear();
        let Some(root) = self.root else {
            return;
        };
        let sqr_radius = D::sqr(radius);
        self.radius_neighbors_in::<D>(root, query, radius, sqr_radius, &mut |idx, _| {
            result.push(idx)
        });
    }

    /// Like [`Octree::radius_neighbors`], also reporting each point's distance
    /// in the metric's comparison space.
    pub fn radius_neighbors_with_distances<D: Distance>(
        &self,
        query: &P,
        radius: f32,
        result: &mut Vec<u32>,
        distances: &mut Vec<f32>,
    ) {
        result.clear();
        distances.clear();
        let Some(root) = self.root else {
            return;
        };
        let sqr_radius = D::sqr(radius);
        self.radius_neighbors_in::<D>(root, query, radius, sqr_radius, &mut |idx, distance| {
            result.push(idx);
            distances.push(distance);
        });
    }

    fn radius_neighbors_in<D: Distance>(
        &self,
        index: OctantIndex,
        query: &P,
        radius: f32,
        sqr_radius: f32,
        emit: &mut dyn FnMut(u32, f32),
    ) {
        let octant = self.octant(index);

        if contains::<D, P>(query, sqr_radius, octant) {
            for idx in self.octant_points(octant) {
                emit(idx, D::compute(query, &self.points[idx as usize]));
            }
            return;
        }

        if octant.is_leaf {
            for idx in self.octant_points(octant) {
                let distance = D::compute(query, &self.points[idx as usize]);
                if distance < sqr_radius {
                    emit(idx, distance);
                }
            }
            return;
        }

        for child in octant.children.iter().flatten() {
            if !overlaps::<D, P>(query, radius, sqr_radius, self.octant(*child)) {
                continue;
            }
            self.radius_neighbors_in::<D>(*child, query, radius, sqr_radius, emit);
        }
    }

    // =========================================================================
    // NEAREST NEIGHBOR
    // =========================================================================

    /// Finds the point nearest to `query` whose distance exceeds
    /// `min_distance`.
    ///
    /// A negative `min_distance` accepts every point, including one equal
    /// to the query. Returns `None` if no point qualifies.
    pub fn find_neighbor<D: Distance>(&self, query: &P, min_distance: f32) -> Option<u32> {
        let root = self.root?;
        let mut max_distance = f32::INFINITY;
        let mut result = None;
        self.find_neighbor_in::<D>(root, query, min_distance, &mut max_distance, &mut result);
        result
    }

    fn find_neighbor_in<D: Distance>(
        &self,
        index: OctantIndex,
        query: &P,
        min_distance: f32,
        max_distance: &mut f32,
        result: &mut Option<u32>,
    ) -> bool {
        let octant = self.octant(index);

        if octant.is_leaf {
            let mut sqr_max_distance = D::sqr(*max_distance);
            let sqr_min_distance = if min_distance < 0.0 {
                min_distance
            } else {
                D::sqr(min_distance)
            };

            for idx in self.octant_points(octant) {
                let distance = D::compute(query, &self.points[idx as usize]);
                if distance > sqr_min_distance && distance < sqr_max_distance {
                    *result = Some(idx);
                    sqr_max_distance = distance;
                }
            }

            *max_distance = D::sqrt(sqr_max_distance);
            return inside::<P>(query, *max_distance, octant);
        }

        let code = morton_code(query, &octant.center);
        if let Some(child) = octant.children[code] {
            if self.find_neighbor_in::<D>(child, query, min_distance, max_distance, result) {
                return true;
            }
        }

        for (other, child) in octant.children.iter().enumerate() {
            let Some(child) = child else {
                continue;
            };
            if other == code {
                continue;
            }
            let sqr_max_distance = D::sqr(*max_distance);
            if !overlaps::<D, P>(query, *max_distance, sqr_max_distance, self.octant(*child)) {
                continue;
            }
            if self.find_neighbor_in::<D>(*child, query, min_distance, max_distance, result) {
                return true;
            }
        }

        inside::<P>(query, *max_distance, octant)
    }
}

// =============================================================================
// BALL / CUBE TESTS
// =============================================================================

fn bounding_cube<'p, P: Point3 + 'p>(mut points: impl Iterator<Item = &'p P>) -> ([f32; 3], f32) {
    let Some(first) = points.next() else {
        return ([0.0; 3], 0.0);
    };
    let mut min = [first.x(), first.y(), first.z()];
    let mut max = min;
    for p in points {
        for (axis, value) in [p.x(), p.y(), p.z()].into_iter().enumerate() {
            min[axis] = min[axis].min(value);
            max[axis] = max[axis].max(value);
        }
    }

    let mut center = min;
    let mut max_extent = 0.0f32;
    for axis in 0..3 {
        let extent = 0.5 * (max[axis] - min[axis]);
        center[axis] += extent;
        max_extent = max_extent.max(extent);
    }
    (center, max_extent)
}

/// Absolute offset of the query from the octant center.
#[inline]
fn center_offset<P: Point3>(query: &P, octant: &Octant) -> (f32, f32, f32) {
    (
        (query.x() - octant.center[0]).abs(),
        (query.y() - octant.center[1]).abs(),
        (query.z() - octant.center[2]).abs(),
    )
}

/// Tests whether the search ball around `query` can reach any point of the
/// octant's cube.
fn overlaps<D: Distance, P: Point3>(query: &P, radius: f32, sqr_radius: f32, octant: &Octant) -> bool {
    let (x, y, z) = center_offset(query, octant);
    let extent = octant.extent;

    let max_distance = radius + extent;
    if x > max_distance || y > max_distance || z > max_distance {
        return false;
    }

    // Within the slab of at least two axes: the face region touches the ball.
    let num_less_extent =
        u32::from(x < extent) + u32::from(y < extent) + u32::from(z < extent);
    if num_less_extent > 1 {
        return true;
    }

    let x = (x - extent).max(0.0);
    let y = (y - extent).max(0.0);
    let z = (z - extent).max(0.0);
    D::norm(x, y, z) < sqr_radius
}

/// Tests whether the search ball contains the whole octant cube.
fn contains<D: Distance, P: Point3>(query: &P, sqr_radius: f32, octant: &Octant) -> bool {
    let (x, y, z) = center_offset(query, octant);
    let extent = octant.extent;
    D::norm(x + extent, y + extent, z + extent) < sqr_radius
}

/// Tests whether the search ball lies completely inside the octant cube.
fn inside<P: Point3>(query: &P, radius: f32, octant: &Octant) -> bool {
    let (x, y, z) = center_offset(query, octant);
    x + radius <= octant.extent && y + radius <= octant.extent && z + radius <= octant.extent
}
