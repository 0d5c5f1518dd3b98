//! # Geometry Operations
//!
//! Operations read a source [`Geometry`] and build a new destination from
//! it. While building, each destination element records weighted source
//! elements; [`GeometryOperation::post_processing`] then interpolates
//! positions and every attribute from those lists.
//!
//! ## Operations
//!
//! - [`weld`]: merge nearby vertices and drop duplicate facets
//! - [`repair`]: close small holes and clean up a solid
//! - [`subdivide`]: split each n-gon into n quads
//! - [`make_convex_hull`]: triangulated convex hull of the vertices

use config::constants::source_list_size_to_include;
use glam::Vec3;
use tracing::trace;

use crate::attribute::KeySources;
use crate::geometry::{Geometry, ProcessFlags};

pub mod hull;
pub mod repair;
pub mod subdivide;
pub mod weld;

pub use hull::make_convex_hull;
pub use repair::{repair, repair_with_report, RepairReport};
pub use subdivide::subdivide;
pub use weld::{weld, Weld};

/// Steps run on every operation result.
pub const POST_PROCESSING_FLAGS: ProcessFlags = ProcessFlags::CONNECT
    .union(ProcessFlags::BUILD_EDGES)
    .union(ProcessFlags::COMPUTE_FACET_CENTROIDS)
    .union(ProcessFlags::COMPUTE_SMOOTH_VERTEX_NORMALS)
    .union(ProcessFlags::GENERATE_FACET_TEXTURE_COORDINATES);

/// Source to destination bookkeeping shared by all operations.
///
/// # Example
///
/// ```rust
/// use geometry_kernel::operation::GeometryOperation;
/// use geometry_kernel::Geometry;
/// use glam::Vec3;
///
/// let mut source = Geometry::named("triangle");
/// let mesh = source.mesh_mut();
/// for p in [Vec3::ZERO, Vec3::X, Vec3::Y] {
///     mesh.add_vertex(p);
/// }
/// mesh.add_facet(&[0, 1, 2]).unwrap();
///
/// let mut operation = GeometryOperation::new(&source, "copy(triangle)");
/// operation.make_dst_vertices_from_src_vertices();
/// operation.make_new_dst_facet_from_src_facet(0);
/// let copy = operation.post_processing();
/// assert_eq!(copy.mesh().facet_vertices(0), &[0, 1, 2]);
/// ```
#[derive(Debug)]
pub struct GeometryOperation<'a> {
    source: &'a Geometry,
    destination: Geometry,
    vertex_src_to_dst: Vec<Option<u32>>,
    vertex_sources: Vec<KeySources>,
    vertex_corner_sources: Vec<KeySources>,
    corner_sources: Vec<KeySources>,
    facet_sources: Vec<KeySources>,
}

/// Appends `(weight, src)` to `lists[dst]`, growing `lists` as needed.
fn push_source(lists: &mut Vec<KeySources>, dst: u32, weight: f32, src: u32) {
    let index = dst as usize;
    if index >= lists.len() {
        let size = source_list_size_to_include(lists.len(), index);
        lists.resize_with(size, Vec::new);
    }
    lists[index].push((weight, src));
}

impl<'a> GeometryOperation<'a> {
    /// Starts an operation producing an empty destination named `name`.
    pub fn new(source: &'a Geometry, name: impl Into<String>) -> Self {
        Self {
            source,
            destination: Geometry::named(name),
            vertex_src_to_dst: vec![None; source.mesh().vertex_count()],
            vertex_sources: Vec::new(),
            vertex_corner_sources: Vec::new(),
            corner_sources: Vec::new(),
            facet_sources: Vec::new(),
        }
    }

    /// The source geometry.
    pub fn source(&self) -> &'a Geometry {
        self.source
    }

    /// The destination under construction.
    pub fn destination(&self) -> &Geometry {
        &self.destination
    }

    /// Destination vertex made from a source vertex, if any.
    pub fn dst_vertex(&self, src_vertex: u32) -> Option<u32> {
        self.vertex_src_to_dst.get(src_vertex as usize).copied().flatten()
    }

    // =========================================================================
    // VERTICES
    // =========================================================================

    /// Copies every source vertex, keeping indices.
    pub fn make_dst_vertices_from_src_vertices(&mut self) {
        for src_vertex in self.source.mesh().vertices() {
            self.make_new_dst_vertex_from_src_vertex(src_vertex);
        }
    }

    /// Creates a destination vertex with `src_vertex` as its only source.
    pub fn make_new_dst_vertex_from_src_vertex(&mut self, src_vertex: u32) -> u32 {
        let dst_vertex = self.make_new_dst_vertex();
        self.add_vertex_source(dst_vertex, 1.0, src_vertex);
        self.vertex_src_to_dst[src_vertex as usize] = Some(dst_vertex);
        dst_vertex
    }

    /// Creates a destination vertex with no sources yet. Its position is
    /// interpolated later.
    pub fn make_new_dst_vertex(&mut self) -> u32 {
        self.destination.mesh_mut().add_vertex(Vec3::ZERO)
    }

    /// Adds a weighted source vertex to a destination vertex.
    pub fn add_vertex_source(&mut self, dst_vertex: u32, weight: f32, src_vertex: u32) {
        push_source(&mut self.vertex_sources, dst_vertex, weight, src_vertex);
    }

    /// Adds a weighted source corner to a destination vertex. Used by
    /// [`GeometryOperation::distribute_corner_sources`].
    pub fn add_vertex_corner_source(&mut self, dst_vertex: u32, weight: f32, src_corner: u32) {
        push_source(&mut self.vertex_corner_sources, dst_vertex, weight, src_corner);
    }

    // =========================================================================
    // FACETS AND CORNERS
    // =========================================================================

    /// Adds a weighted source corner to a destination corner.
    pub fn add_corner_source(&mut self, dst_corner: u32, weight: f32, src_corner: u32) {
        push_source(&mut self.corner_sources, dst_corner, weight, src_corner);
    }

    /// Adds a weighted source facet to a destination facet.
    pub fn add_facet_source(&mut self, dst_facet: u32, weight: f32, src_facet: u32) {
        push_source(&mut self.facet_sources, dst_facet, weight, src_facet);
    }

    /// Adds a destination facet over destination vertices, with `src_facet`
    /// as its source. Corners get no sources.
    pub fn make_new_dst_facet(&mut self, src_facet: Option<u32>, dst_vertices: &[u32]) -> u32 {
        let dst_facet = self.destination.mesh_mut().push_facet(dst_vertices);
        if let Some(src_facet) = src_facet {
            self.add_facet_source(dst_facet, 1.0, src_facet);
        }
        dst_facet
    }

    /// Copies a source facet through the vertex mapping, with each corner
    /// sourced from its counterpart.
    ///
    /// # Panics
    ///
    /// Panics if a vertex of the facet has no destination vertex.
    pub fn make_new_dst_facet_from_src_facet(&mut self, src_facet: u32) -> u32 {
        let source = self.source.mesh();
        let src_corners = source.facet_corners(src_facet);
        let dst_vertices: Vec<u32> = src_corners
            .clone()
            .map(|c| {
                let v = source.corner_vertex(c);
                match self.dst_vertex(v) {
                    Some(dst) => dst,
                    None => panic!("source vertex {v} of facet {src_facet} has no destination"),
                }
            })
            .collect();
        let dst_facet = self.make_new_dst_facet(Some(src_facet), &dst_vertices);
        let dst_corners = self.destination.mesh().facet_corners(dst_facet);
        for (dst_corner, src_corner) in dst_corners.zip(src_corners) {
            self.add_corner_source(dst_corner, 1.0, src_corner);
        }
        dst_facet
    }

    /// Gives destination corners without their own sources the corner
    /// sources collected for their vertex.
    pub fn distribute_corner_sources(&mut self) {
        let mesh = self.destination.mesh();
        let mut additions = Vec::new();
        for dst_corner in 0..mesh.corner_count() as u32 {
            let has_sources = self
                .corner_sources
                .get(dst_corner as usize)
                .is_some_and(|s| !s.is_empty());
            if has_sources {
                continue;
            }
            let dst_vertex = mesh.corner_vertex(dst_corner);
            if let Some(sources) = self.vertex_corner_sources.get(dst_vertex as usize) {
                additions.extend(sources.iter().map(|&(w, src)| (dst_corner, w, src)));
            }
        }
        for (dst_corner, weight, src_corner) in additions {
            self.add_corner_source(dst_corner, weight, src_corner);
        }
    }

    // =========================================================================
    // FINISHING
    // =========================================================================

    /// Sets destination positions and attributes from the source lists.
    ///
    /// Positions are the normalized weighted average of their source
    /// positions. Vertices without sources keep their position.
    pub fn interpolate_mesh_attributes(&mut self) {
        let source = self.source;
        let (mesh, attributes) = self.destination.mesh_and_attributes_mut();

        for dst_vertex in mesh.vertices() {
            let Some(sources) = self.vertex_sources.get(dst_vertex as usize) else {
                continue;
            };
            let weight_sum: f32 = sources.iter().map(|(w, _)| *w).sum();
            if weight_sum == 0.0 {
                continue;
            }
            let position = sources.iter().fold(Vec3::ZERO, |sum, &(w, src)| {
                sum + source.mesh().position(src) * (w / weight_sum)
            });
            mesh.set_vertex_position(dst_vertex, position);
        }

        attributes.bind(mesh);
        attributes.resize_to(mesh);
        source.attributes().interpolate_into(
            attributes,
            &self.vertex_sources,
            &self.corner_sources,
            &self.facet_sources,
        );
    }

    /// Interpolates, then derives connectivity, edges, centroids, smooth
    /// normals and texture coordinates. Returns the destination.
    pub fn post_processing(mut self) -> Geometry {
        self.interpolate_mesh_attributes();
        self.destination.process(POST_PROCESSING_FLAGS);
        trace!(
            source = %self.source.get_name(),
            destination = %self.destination.get_name(),
            vertices = self.destination.mesh().vertex_count(),
            facets = self.destination.mesh().facet_count(),
            "operation finished"
        );
        self.destination
    }
}
