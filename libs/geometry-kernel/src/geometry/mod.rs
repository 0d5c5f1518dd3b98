//! # Geometry
//!
//! A named mesh with its attributes, cached topology and debug overlay,
//! plus the processing steps that derive data from it.
//!
//! ## Processing
//!
//! [`Geometry::process`] runs the steps selected by [`ProcessFlags`] in a
//! fixed order:
//!
//! ```text
//! connect → build edges → merge coplanar → facet normals → smooth normals
//!         → centroids → facet texcoords → spherical texcoords
//!         → facet tangents → corner tangents → ids → debug trace
//! ```

use glam::Vec3;
use tracing::trace;

use crate::debug::{DebugLine, DebugOverlay, DebugText};
use crate::mesh::{Mesh, MeshAttributes};

mod coplanar;
mod info;
mod mass;
mod steps;
pub mod topology;
mod transform;

pub use info::MeshInfo;
pub(crate) use mass::MassIntegrals;
pub use mass::MassProperties;
pub use topology::{Edge, Topology};

bitflags::bitflags! {
    /// Selects the steps run by [`Geometry::process`].
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct ProcessFlags: u32 {
        /// Link corners to the facets across their edges.
        const CONNECT = 1 << 0;
        /// Rebuild vertex/corner connectivity and the edge list.
        const BUILD_EDGES = 1 << 1;
        /// Store facet centroids.
        const COMPUTE_FACET_CENTROIDS = 1 << 2;
        /// Store per-vertex averages of facet normals.
        const COMPUTE_SMOOTH_VERTEX_NORMALS = 1 << 3;
        /// Project each facet into its own plane for corner texcoords.
        const GENERATE_FACET_TEXTURE_COORDINATES = 1 << 4;
        /// Log vertices, facets and edges.
        const DEBUG_TRACE = 1 << 5;
        /// Merge pairs of coplanar facets sharing one edge.
        const MERGE_COPLANAR_NEIGHBORS = 1 << 6;
        /// Store facet normals.
        const COMPUTE_FACET_NORMALS = 1 << 7;
        /// Store facet tangents and bitangents from corner texcoords.
        const COMPUTE_FACET_TANGENTS = 1 << 8;
        /// Store facet id colors.
        const COMPUTE_FACET_IDS = 1 << 9;
        /// Map corner texcoords from each vertex direction around the origin.
        const GENERATE_SPHERICAL_TEXTURE_COORDINATES = 1 << 10;
        /// Store smooth per-corner tangents and bitangents.
        const COMPUTE_CORNER_TANGENTS = 1 << 11;
    }
}

/// Named mesh with attributes, cached topology and a debug overlay.
///
/// # Example
///
/// ```rust
/// use geometry_kernel::{Geometry, ProcessFlags};
/// use glam::Vec3;
///
/// let mut geometry = Geometry::named("triangle");
/// let mesh = geometry.mesh_mut();
/// for p in [Vec3::ZERO, Vec3::X, Vec3::Y] {
///     mesh.add_vertex(p);
/// }
/// mesh.add_facet(&[0, 1, 2]).unwrap();
///
/// geometry.process(ProcessFlags::BUILD_EDGES | ProcessFlags::COMPUTE_FACET_NORMALS);
/// assert_eq!(geometry.attributes().facet.normal.get(0), Vec3::Z);
/// assert_eq!(geometry.get_mesh_info().edge_count, 3);
/// ```
#[derive(Debug, Clone)]
pub struct Geometry {
    name: String,
    mesh: Mesh,
    attributes: MeshAttributes,
    topology: Topology,
    debug: DebugOverlay,
}

impl Default for Geometry {
    fn default() -> Self {
        Self::new()
    }
}

impl Geometry {
    /// Creates an empty, unnamed geometry.
    pub fn new() -> Self {
        Self::from_mesh(String::new(), Mesh::new())
    }

    /// Creates an empty geometry with a name.
    pub fn named(name: impl Into<String>) -> Self {
        Self::from_mesh(name, Mesh::new())
    }

    /// Wraps an existing mesh. Attribute stores start bound and empty.
    pub fn from_mesh(name: impl Into<String>, mesh: Mesh) -> Self {
        let mut attributes = MeshAttributes::new();
        attributes.bind(&mesh);
        Self {
            name: name.into(),
            mesh,
            attributes,
            topology: Topology::default(),
            debug: DebugOverlay::default(),
        }
    }

    /// Name of the geometry.
    pub fn get_name(&self) -> &str {
        &self.name
    }

    /// Renames the geometry.
    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    /// The mesh.
    pub fn mesh(&self) -> &Mesh {
        &self.mesh
    }

    /// The mesh, for building and editing.
    pub fn mesh_mut(&mut self) -> &mut Mesh {
        &mut self.mesh
    }

    /// The attribute stores.
    pub fn attributes(&self) -> &MeshAttributes {
        &self.attributes
    }

    /// The attribute stores, for editing.
    pub fn attributes_mut(&mut self) -> &mut MeshAttributes {
        &mut self.attributes
    }

    /// Mesh and attributes borrowed together.
    pub fn mesh_and_attributes_mut(&mut self) -> (&mut Mesh, &mut MeshAttributes) {
        (&mut self.mesh, &mut self.attributes)
    }

    // =========================================================================
    // TOPOLOGY
    // =========================================================================

    /// Topology of the current mesh, rebuilt first if stale.
    pub fn topology(&mut self) -> &Topology {
        self.topology.refresh(&self.mesh);
        &self.topology
    }

    /// Rebuilds vertex to corner and corner to facet tables.
    pub fn update_connectivity(&mut self) {
        self.topology.update_connectivity(&self.mesh);
    }

    /// Rebuilds the edge tables.
    pub fn build_edges(&mut self) {
        self.topology.build_edges(&self.mesh);
    }

    /// Edge between two vertices, in either order.
    ///
    /// # Panics
    ///
    /// Panics if `v0 == v1`.
    pub fn get_edge(&mut self, v0: u32, v1: u32) -> Option<u32> {
        self.topology().get_edge(v0, v1)
    }

    /// Triangles in a fan triangulation of every facet.
    pub fn count_facet_triangles(&self) -> usize {
        self.mesh
            .facets()
            .map(|f| self.mesh.facet_corner_count(f).saturating_sub(2))
            .sum()
    }

    /// Element and index counts.
    pub fn get_mesh_info(&mut self) -> MeshInfo {
        let triangle_count = self.count_facet_triangles();
        let edge_count = self.topology().edge_count();
        let facet_count = self.mesh.facet_count();
        let corner_count = self.mesh.corner_count();
        MeshInfo {
            facet_count,
            corner_count,
            triangle_count,
            edge_count,
            vertex_count_corners: corner_count,
            vertex_count_centroids: facet_count,
            index_count_fill_triangles: 3 * triangle_count,
            index_count_edge_lines: 2 * edge_count,
            index_count_corner_points: corner_count,
            index_count_centroid_points: facet_count,
        }
    }

    /// Deletes the flagged facets and compacts facet and corner attributes.
    pub fn delete_facets(&mut self, delete: &[bool]) {
        let compaction = self.mesh.delete_facets(delete);
        self.attributes
            .retain_facets(&compaction.kept_facets, &compaction.kept_corners);
    }

    /// Removes unreferenced vertices and compacts vertex attributes.
    pub fn remove_isolated_vertices(&mut self) {
        let kept = self.mesh.remove_isolated_vertices();
        self.attributes.retain_vertices(&kept);
    }

    // =========================================================================
    // PROCESSING
    // =========================================================================

    /// Runs the selected steps in their fixed order.
    pub fn process(&mut self, flags: ProcessFlags) {
        trace!(name = %self.name, ?flags, "processing geometry");

        if flags.contains(ProcessFlags::CONNECT) {
            self.mesh.connect();
        }
        if flags.contains(ProcessFlags::BUILD_EDGES) {
            self.update_connectivity();
            self.build_edges();
        }
        if flags.contains(ProcessFlags::MERGE_COPLANAR_NEIGHBORS) {
            self.merge_coplanar_neighbors();
            if flags.contains(ProcessFlags::CONNECT) {
                self.mesh.connect();
            }
        }
        if flags.contains(ProcessFlags::COMPUTE_FACET_NORMALS) {
            self.compute_facet_normals();
        }
        if flags.contains(ProcessFlags::COMPUTE_SMOOTH_VERTEX_NORMALS) {
            self.compute_smooth_vertex_normals();
        }
        if flags.contains(ProcessFlags::COMPUTE_FACET_CENTROIDS) {
            self.compute_facet_centroids();
        }
        if flags.contains(ProcessFlags::GENERATE_FACET_TEXTURE_COORDINATES) {
            self.generate_facet_texture_coordinates();
        }
        if flags.contains(ProcessFlags::GENERATE_SPHERICAL_TEXTURE_COORDINATES) {
            self.generate_texture_coordinates_spherical();
        }
        if flags.contains(ProcessFlags::COMPUTE_FACET_TANGENTS) {
            self.compute_facet_tangents();
        }
        if flags.contains(ProcessFlags::COMPUTE_CORNER_TANGENTS) {
            self.compute_corner_tangents(false);
        }
        if flags.contains(ProcessFlags::COMPUTE_FACET_IDS) {
            self.compute_facet_ids();
        }
        if flags.contains(ProcessFlags::DEBUG_TRACE) {
            self.debug_trace();
        }
    }

    // =========================================================================
    // DEBUG OVERLAY
    // =========================================================================

    /// Adds a debug label.
    pub fn add_debug_text(&mut self, text: DebugText) {
        self.debug.add_debug_text(text);
    }

    /// Adds a debug line.
    pub fn add_debug_line(&mut self, line: DebugLine) {
        self.debug.add_debug_line(line);
    }

    /// Removes every debug entry. The mesh is unaffected.
    pub fn clear_debug(&mut self) {
        self.debug.clear_debug();
    }

    /// Runs `f` with mutable access to the debug entries.
    pub fn access_debug_entries<F, R>(&mut self, f: F) -> R
    where
        F: FnOnce(&mut Vec<DebugText>, &mut Vec<DebugLine>) -> R,
    {
        self.debug.access_debug_entries(f)
    }

    /// The debug overlay.
    pub fn debug_overlay(&self) -> &DebugOverlay {
        &self.debug
    }

    // =========================================================================
    // FACET HELPERS
    // =========================================================================

    /// Mean of a facet's vertex positions.
    pub fn facet_centroid(&self, facet: u32) -> Vec3 {
        let vertices = self.mesh.facet_vertices(facet);
        let sum: Vec3 = vertices.iter().map(|&v| self.mesh.position(v)).sum();
        sum / vertices.len() as f32
    }

    /// Unit normal from the positions of a facet, `None` when degenerate.
    pub fn facet_normal(&self, facet: u32) -> Option<Vec3> {
        let vertices = self.mesh.facet_vertices(facet);
        let p0 = self.mesh.position(vertices[0]);
        let sum: Vec3 = vertices[1..]
            .windows(2)
            .map(|pair| {
                let p1 = self.mesh.position(pair[0]);
                let p2 = self.mesh.position(pair[1]);
                (p1 - p0).cross(p2 - p0)
            })
            .sum();
        sum.try_normalize()
    }
}
