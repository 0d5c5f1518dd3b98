//! # Point Octree
//!
//! Index-based octree for radius and nearest neighbor queries over a point
//! set. Points are never moved: each octant covers a contiguous run of a
//! successor list, so a node's points are reached by following successor
//! links from `start` for `size` steps.
//!
//! ## Architecture
//!
//! ```text
//! points ──► bounding cube ──► Morton code bucketing ──► arena of octants
//!                                                        (children by index)
//! ```
//!
//! ## Usage
//!
//! ```rust
//! use glam::Vec3;
//! use point_octree::{L2Distance, Octree, OctreeParams};
//!
//! let points = vec![Vec3::ZERO, Vec3::new(0.001, 0.0, 0.0), Vec3::ONE];
//! let octree = Octree::new(&points, OctreeParams::default());
//!
//! let mut neighbors = Vec::new();
//! octree.radius_neighbors::<L2Distance>(&Vec3::ZERO, 0.01, &mut neighbors);
//! neighbors.sort_unstable();
//! assert_eq!(neighbors, vec![0, 1]);
//! ```

pub mod distance;
pub mod octree;

pub use distance::{Distance, L1Distance, L2Distance, MaxDistance, Point3};
pub use octree::{Octree, OctreeParams};
