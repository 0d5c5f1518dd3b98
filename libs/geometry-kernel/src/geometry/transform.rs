//! Affine transforms of whole geometries.

use glam::Mat4;
use tracing::trace;

use super::Geometry;
use crate::mesh::{ElementOffsets, MeshAttributes};

impl Geometry {
    /// Appends `source` transformed by `matrix`.
    ///
    /// Appended vertices, facets and corners are numbered after the
    /// existing ones. Positions are transformed as points and every
    /// attribute by its transform mode. A mirroring matrix flips the
    /// winding of the appended facets, corner attributes included.
    ///
    /// # Example
    ///
    /// ```rust
    /// use geometry_kernel::Geometry;
    /// use glam::{Mat4, Vec3};
    ///
    /// let mut triangle = Geometry::named("triangle");
    /// let mesh = triangle.mesh_mut();
    /// for p in [Vec3::ZERO, Vec3::X, Vec3::Y] {
    ///     mesh.add_vertex(p);
    /// }
    /// mesh.add_facet(&[0, 1, 2]).unwrap();
    ///
    /// let mut both = triangle.clone();
    /// both.merge_with_transform(&triangle, &Mat4::from_translation(Vec3::Z));
    /// assert_eq!(both.mesh().vertex_count(), 6);
    /// assert_eq!(both.mesh().facet_vertices(1), &[3, 4, 5]);
    /// assert_eq!(both.mesh().position(3), Vec3::Z);
    /// ```
    pub fn merge_with_transform(&mut self, source: &Geometry, matrix: &Mat4) {
        let offsets = ElementOffsets::end_of(&self.mesh);
        let identity = *matrix == Mat4::IDENTITY;
        let mirrored = matrix.determinant() < 0.0;

        for &position in source.mesh.positions() {
            let position = if identity {
                position
            } else {
                matrix.transform_point3(position)
            };
            self.mesh.add_vertex(position);
        }
        let vertex_offset = offsets.vertex as u32;
        let mut vertices = Vec::new();
        for facet in source.mesh.facets() {
            vertices.clear();
            vertices.extend(source.mesh.facet_vertices(facet).iter().map(|v| v + vertex_offset));
            self.mesh.push_facet(&vertices);
        }

        let mut transformed = MeshAttributes::new();
        transformed.bind(&source.mesh);
        if identity {
            source.attributes.copy_into(&mut transformed);
        } else {
            source.attributes.transform_into(&mut transformed, matrix);
        }
        self.attributes.append(&transformed, offsets);

        if mirrored {
            self.flip_facets_from(offsets.facet as u32);
        }
        trace!(
            name = %self.name,
            source = %source.name,
            mirrored,
            "merged geometry"
        );
    }

    /// Replaces the content with `source` transformed by `matrix`, and takes
    /// its name.
    pub fn copy_with_transform(&mut self, source: &Geometry, matrix: &Mat4) {
        self.mesh.clear();
        self.attributes = MeshAttributes::new();
        self.attributes.bind(&self.mesh);
        self.merge_with_transform(source, matrix);
        self.name.clone_from(&source.name);
    }

    /// Transforms positions and attributes in place.
    pub fn transform(&mut self, matrix: &Mat4) {
        if *matrix == Mat4::IDENTITY {
            return;
        }
        for vertex in self.mesh.vertices() {
            let position = matrix.transform_point3(self.mesh.position(vertex));
            self.mesh.set_vertex_position(vertex, position);
        }
        self.attributes.transform_in_place(matrix);
        if matrix.determinant() < 0.0 {
            self.flip_facets_from(0);
        }
    }

    fn flip_facets_from(&mut self, first: u32) {
        for facet in first..self.mesh.facet_count() as u32 {
            let corners = self.mesh.facet_corners(facet);
            self.mesh.flip_facet(facet);
            self.attributes.reverse_corners(corners);
        }
    }
}
