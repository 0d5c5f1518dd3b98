//! # Geometry Kernel
//!
//! Polygon mesh geometry with sparse per-element attributes, derived
//! topology and clean-up operations.
//!
//! ## Architecture
//!
//! ```text
//! Mesh (positions, facets, corners)
//!   + MeshAttributes (facet / vertex / corner stores with presence)
//!       ↓
//! Geometry ── process(flags) ──► Topology, normals, centroids, texcoords
//!       ↓
//! GeometryOperation (weld / repair / subdivide / hull) ──► new Geometry
//! ```
//!
//! ## Modules
//!
//! - [`attribute`]: typed attribute stores, transform and interpolation
//! - [`mesh`]: connectivity with contiguous facet corners
//! - [`geometry`]: the facade tying mesh, attributes and topology together
//! - [`operation`]: weld, repair, subdivide and convex hull
//! - [`debug`]: debug text and line overlay
//!
//! ## Usage
//!
//! ```rust
//! use geometry_kernel::{Geometry, ProcessFlags};
//! use glam::Vec3;
//!
//! let mut geometry = Geometry::named("quad");
//! let mesh = geometry.mesh_mut();
//! for p in [Vec3::ZERO, Vec3::X, Vec3::new(1.0, 1.0, 0.0), Vec3::Y] {
//!     mesh.add_vertex(p);
//! }
//! mesh.add_facet(&[0, 1, 2, 3])?;
//!
//! geometry.process(ProcessFlags::BUILD_EDGES | ProcessFlags::COMPUTE_FACET_NORMALS);
//! assert_eq!(geometry.topology().edge_count(), 4);
//! assert_eq!(geometry.attributes().facet.normal.get(0), Vec3::Z);
//! # Ok::<(), geometry_kernel::GeometryError>(())
//! ```

pub mod attribute;
pub mod config;
pub mod debug;
pub mod error;
pub mod geometry;
pub mod math;
pub mod mesh;
pub mod operation;

pub use error::{GeometryError, GeometryResult};
pub use geometry::{Geometry, MassProperties, MeshInfo, ProcessFlags};
pub use mesh::{Mesh, MeshAttributes};
pub use operation::{make_convex_hull, repair, subdivide, weld, GeometryOperation, RepairReport};
