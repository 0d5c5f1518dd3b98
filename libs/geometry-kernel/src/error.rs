//! # Error Types
//!
//! Error types for geometry construction and configuration.
//!
//! ## Error Policy
//!
//! - Invalid input handed to a builder is returned as an error
//! - Broken internal invariants (reading an absent attribute, using an
//!   unbound store) are contract violations and panic
//! - Expected absence is an `Option` or `bool`, never an error
//! - Degenerate geometry found by an operation is skipped and logged

use config::constants::ConfigError;
use thiserror::Error;

// =============================================================================
// ERROR TYPES
// =============================================================================

/// Errors that can occur while building or configuring geometry.
///
/// ## Example
///
/// ```rust
/// use geometry_kernel::{GeometryError, Mesh};
///
/// let mut mesh = Mesh::new();
/// mesh.add_vertex(glam::Vec3::ZERO);
/// match mesh.add_facet(&[0, 1, 2]) {
///     Err(GeometryError::InvalidVertexIndex { vertex, .. }) => assert_eq!(vertex, 1),
///     other => panic!("unexpected: {other:?}"),
/// }
/// ```
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GeometryError {
    /// A facet corner references a vertex that does not exist.
    #[error("corner {corner} of new facet references vertex {vertex}, but mesh has {vertex_count} vertices")]
    InvalidVertexIndex {
        /// Local corner index within the facet being added.
        corner: usize,
        /// The offending vertex index.
        vertex: u32,
        /// Number of vertices in the mesh.
        vertex_count: usize,
    },

    /// A facet was given fewer than three corners.
    #[error("facet needs at least 3 corners, got {corner_count}")]
    TooFewCorners {
        /// Number of corners supplied.
        corner_count: usize,
    },

    /// An attribute descriptor with the same key is already registered.
    #[error("attribute descriptor ({usage_index}, {name}) is already registered")]
    DuplicateDescriptor {
        /// Usage index of the duplicate.
        usage_index: u32,
        /// Name of the duplicate.
        name: String,
    },

    /// The points of a convex hull do not span a volume.
    #[error("convex hull is degenerate: {reason}")]
    DegenerateHull {
        /// Why no hull could be built.
        reason: String,
    },

    /// A configuration value was rejected.
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),
}

impl GeometryError {
    /// Creates a duplicate descriptor error.
    pub fn duplicate_descriptor(usage_index: u32, name: impl Into<String>) -> Self {
        Self::DuplicateDescriptor {
            usage_index,
            name: name.into(),
        }
    }
}

// =============================================================================
// RESULT TYPE ALIAS
// =============================================================================

/// Result type alias for geometry operations.
pub type GeometryResult<T> = Result<T, GeometryError>;

// =============================================================================
// TESTS
// =============================================================================
