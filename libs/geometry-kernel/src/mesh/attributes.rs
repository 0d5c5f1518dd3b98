//! # Mesh Attributes
//!
//! The fixed set of attribute stores a mesh carries per domain, with
//! whole-mesh versions of the engine operations.
//!
//! Each domain struct is generated from a field table so every bulk
//! operation visits the same attributes in the same order.

use std::ops::Range;

use glam::{IVec2, Mat4, UVec4, Vec2, Vec3, Vec4};

use crate::attribute::{
    copy_attribute, interpolate_attribute, transform_attribute, transform_attribute_in_place,
    AttributeDescriptor, AttributeDescriptors, AttributePresent, KeySources,
};

use super::Mesh;

/// Generates one domain's attribute struct and its bulk operations.
macro_rules! domain_attributes {
    (
        $(#[$meta:meta])*
        $name:ident {
            $($field:ident: $ty:ty = $descriptor:expr),* $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq)]
        pub struct $name {
            $(
                #[doc = concat!("`", stringify!($field), "` values.")]
                pub $field: AttributePresent<$ty>,
            )*
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl $name {
            /// Creates unbound stores.
            pub fn new() -> Self {
                Self {
                    $($field: AttributePresent::new($descriptor),)*
                }
            }

            /// Descriptors of every store, in field order.
            pub fn descriptors(&self) -> Vec<&AttributeDescriptor> {
                vec![$(self.$field.descriptor(),)*]
            }

            /// Binds every store to `element_count` elements.
            pub fn bind(&mut self, element_count: usize) {
                $(self.$field.bind(element_count);)*
            }

            /// Unbinds every store.
            pub fn unbind(&mut self) {
                $(self.$field.unbind();)*
            }

            /// Marks every element of every store absent.
            pub fn clear(&mut self) {
                $(self.$field.clear();)*
            }

            /// Resizes every store to `element_count` elements.
            pub(crate) fn resize(&mut self, element_count: usize) {
                $(self.$field.resize(element_count);)*
            }

            /// Number of stores with at least one present element.
            pub fn present_attribute_count(&self) -> usize {
                [$(self.$field.present_count() > 0,)*].iter().filter(|p| **p).count()
            }

            /// Transforms every store into `destination`.
            pub fn transform_into(&self, destination: &mut Self, matrix: &Mat4) {
                $(transform_attribute(&self.$field, &mut destination.$field, matrix);)*
            }

            /// Transforms every store in place.
            pub fn transform_in_place(&mut self, matrix: &Mat4) {
                $(transform_attribute_in_place(&mut self.$field, matrix);)*
            }

            /// Copies every store into `destination`.
            pub fn copy_into(&self, destination: &mut Self) {
                $(copy_attribute(&self.$field, &mut destination.$field);)*
            }

            /// Interpolates every store into `destination`.
            pub fn interpolate_into(&self, destination: &mut Self, sources: &[KeySources]) {
                $(interpolate_attribute(&self.$field, &mut destination.$field, sources);)*
            }

            /// Copies one element of every store onto another key.
            pub(crate) fn copy_element(&mut self, from: u32, to: u32) {
                $(self.$field.copy_element(from, to);)*
            }

            /// Appends `source` after element `offset`.
            pub(crate) fn append(&mut self, source: &Self, offset: usize) {
                $(self.$field.append(&source.$field, offset);)*
            }

            /// Keeps the flagged elements, compacting in order.
            pub(crate) fn retain(&mut self, keep: &[bool]) {
                $(self.$field.retain(keep);)*
            }

            /// Reverses element order in `range`.
            pub(crate) fn reverse_range(&mut self, range: Range<usize>) {
                $(self.$field.reverse_range(range.clone());)*
            }
        }
    };
}

domain_attributes! {
    /// Per-facet attributes.
    FacetAttributes {
        id: Vec3 = AttributeDescriptors::ID,
        centroid: Vec3 = AttributeDescriptors::CENTROID,
        normal: Vec3 = AttributeDescriptors::NORMAL,
        tangent: Vec4 = AttributeDescriptors::TANGENT,
        bitangent: Vec3 = AttributeDescriptors::BITANGENT,
        color_0: Vec4 = AttributeDescriptors::COLOR_0,
        color_1: Vec4 = AttributeDescriptors::COLOR_1,
        aniso_control: Vec2 = AttributeDescriptors::ANISO_CONTROL,
    }
}

domain_attributes! {
    /// Per-vertex attributes. Positions live in [`Mesh`].
    VertexAttributes {
        normal: Vec3 = AttributeDescriptors::NORMAL,
        normal_smooth: Vec3 = AttributeDescriptors::NORMAL_SMOOTH,
        texcoord_0: Vec2 = AttributeDescriptors::TEXCOORD_0,
        texcoord_1: Vec2 = AttributeDescriptors::TEXCOORD_1,
        tangent: Vec4 = AttributeDescriptors::TANGENT,
        bitangent: Vec3 = AttributeDescriptors::BITANGENT,
        color_0: Vec4 = AttributeDescriptors::COLOR_0,
        color_1: Vec4 = AttributeDescriptors::COLOR_1,
        joint_indices_0: UVec4 = AttributeDescriptors::JOINT_INDICES_0,
        joint_indices_1: UVec4 = AttributeDescriptors::JOINT_INDICES_1,
        joint_weights_0: Vec4 = AttributeDescriptors::JOINT_WEIGHTS_0,
        joint_weights_1: Vec4 = AttributeDescriptors::JOINT_WEIGHTS_1,
        aniso_control: Vec2 = AttributeDescriptors::ANISO_CONTROL,
        valency_edge_count: IVec2 = AttributeDescriptors::VALENCY_EDGE_COUNT,
    }
}

domain_attributes! {
    /// Per-corner attributes.
    CornerAttributes {
        normal: Vec3 = AttributeDescriptors::NORMAL,
        texcoord_0: Vec2 = AttributeDescriptors::TEXCOORD_0,
        texcoord_1: Vec2 = AttributeDescriptors::TEXCOORD_1,
        tangent: Vec4 = AttributeDescriptors::TANGENT,
        bitangent: Vec3 = AttributeDescriptors::BITANGENT,
        color_0: Vec4 = AttributeDescriptors::COLOR_0,
        color_1: Vec4 = AttributeDescriptors::COLOR_1,
        aniso_control: Vec2 = AttributeDescriptors::ANISO_CONTROL,
    }
}

// =============================================================================
// WHOLE MESH
// =============================================================================

/// Element index offsets at which appended attributes start.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ElementOffsets {
    /// First appended vertex.
    pub vertex: usize,
    /// First appended facet.
    pub facet: usize,
    /// First appended corner.
    pub corner: usize,
}

impl ElementOffsets {
    /// Offsets pointing just past the current elements of `mesh`.
    pub fn end_of(mesh: &Mesh) -> Self {
        Self {
            vertex: mesh.vertex_count(),
            facet: mesh.facet_count(),
            corner: mesh.corner_count(),
        }
    }
}

/// All attribute stores of a mesh, grouped by domain.
///
/// # Example
///
/// ```rust
/// use geometry_kernel::{Mesh, MeshAttributes};
/// use glam::Vec3;
///
/// let mut mesh = Mesh::new();
/// for p in [Vec3::ZERO, Vec3::X, Vec3::Y] {
///     mesh.add_vertex(p);
/// }
/// mesh.add_facet(&[0, 1, 2]).unwrap();
///
/// let mut attributes = MeshAttributes::new();
/// attributes.bind(&mesh);
/// attributes.facet.normal.set(0, Vec3::Z);
/// assert_eq!(attributes.vertex.normal.len(), 3);
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MeshAttributes {
    /// Facet domain.
    pub facet: FacetAttributes,
    /// Vertex domain.
    pub vertex: VertexAttributes,
    /// Corner domain.
    pub corner: CornerAttributes,
}

impl MeshAttributes {
    /// Creates unbound stores for every domain.
    pub fn new() -> Self {
        Self::default()
    }

    /// Binds every store to the element counts of `mesh`.
    pub fn bind(&mut self, mesh: &Mesh) {
        self.facet.bind(mesh.facet_count());
        self.vertex.bind(mesh.vertex_count());
        self.corner.bind(mesh.corner_count());
    }

    /// Unbinds every store.
    pub fn unbind(&mut self) {
        self.facet.unbind();
        self.vertex.unbind();
        self.corner.unbind();
    }

    /// Marks every element absent.
    pub fn clear(&mut self) {
        self.facet.clear();
        self.vertex.clear();
        self.corner.clear();
    }

    /// Resizes bound stores to the element counts of `mesh`.
    pub(crate) fn resize_to(&mut self, mesh: &Mesh) {
        self.facet.resize(mesh.facet_count());
        self.vertex.resize(mesh.vertex_count());
        self.corner.resize(mesh.corner_count());
    }

    /// Writes every attribute of `self` transformed by `matrix` into
    /// `destination`.
    pub fn transform_into(&self, destination: &mut Self, matrix: &Mat4) {
        self.facet.transform_into(&mut destination.facet, matrix);
        self.vertex.transform_into(&mut destination.vertex, matrix);
        self.corner.transform_into(&mut destination.corner, matrix);
    }

    /// Transforms every attribute in place.
    pub fn transform_in_place(&mut self, matrix: &Mat4) {
        self.facet.transform_in_place(matrix);
        self.vertex.transform_in_place(matrix);
        self.corner.transform_in_place(matrix);
    }

    /// Copies every attribute into `destination`.
    pub fn copy_into(&self, destination: &mut Self) {
        self.facet.copy_into(&mut destination.facet);
        self.vertex.copy_into(&mut destination.vertex);
        self.corner.copy_into(&mut destination.corner);
    }

    /// Interpolates every attribute into `destination` from per-domain
    /// source lists.
    pub fn interpolate_into(
        &self,
        destination: &mut Self,
        vertex_sources: &[KeySources],
        corner_sources: &[KeySources],
        facet_sources: &[KeySources],
    ) {
        self.vertex.interpolate_into(&mut destination.vertex, vertex_sources);
        self.corner.interpolate_into(&mut destination.corner, corner_sources);
        self.facet.interpolate_into(&mut destination.facet, facet_sources);
    }

    /// Appends `source` at `offsets`.
    pub(crate) fn append(&mut self, source: &Self, offsets: ElementOffsets) {
        self.facet.append(&source.facet, offsets.facet);
        self.vertex.append(&source.vertex, offsets.vertex);
        self.corner.append(&source.corner, offsets.corner);
    }

    /// Compacts facet and corner stores after facet deletion.
    pub(crate) fn retain_facets(&mut self, kept_facets: &[bool], kept_corners: &[bool]) {
        self.facet.retain(kept_facets);
        self.corner.retain(kept_corners);
    }

    /// Compacts vertex stores after vertex removal.
    pub(crate) fn retain_vertices(&mut self, kept_vertices: &[bool]) {
        self.vertex.retain(kept_vertices);
    }

    /// Reverses corner attributes of one facet to follow a winding flip.
    pub(crate) fn reverse_corners(&mut self, corners: Range<u32>) {
        self.corner
            .reverse_range(corners.start as usize..corners.end as usize);
    }
}
