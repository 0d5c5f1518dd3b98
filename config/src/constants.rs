//! # Configuration Constants
//!
//! Centralized constants for the mesh geometry kernel. Tolerances, clean-up
//! thresholds and spatial index defaults are defined here.
//!
//! ## Categories
//!
//! - **Precision**: Floating-point comparison tolerances
//! - **Operations**: Weld, repair and coplanar merge thresholds
//! - **Spatial Index**: Octree construction defaults
//! - **Allocation**: Growth policy for per-element source lists

use std::fmt;

// =============================================================================
// PRECISION CONSTANTS
// =============================================================================

/// Epsilon for single precision floating-point comparisons.
///
/// Mesh positions and attributes are stored as `f32`, so this is scaled
/// for single precision rather than the usual `1e-10` of `f64` kernels.
///
/// # Example
///
/// ```rust
/// use config::constants::EPSILON;
///
/// fn approximately_equal(a: f32, b: f32) -> bool {
///     (a - b).abs() < EPSILON
/// }
///
/// assert!(approximately_equal(1.0, 1.0 + 1e-7));
/// ```
pub const EPSILON: f32 = 1e-6;

/// Absolute dot product above which two unit vectors count as parallel.
///
/// When a cross product is requested for nearly parallel vectors the
/// result direction is numerically meaningless, so helpers fall back to
/// an axis perpendicular to the input instead.
///
/// # Example
///
/// ```rust
/// use config::constants::SAFE_NORMALIZE_PARALLEL_DOT;
///
/// let dot: f32 = 0.9995;
/// assert!(dot.abs() > SAFE_NORMALIZE_PARALLEL_DOT);
/// ```
pub const SAFE_NORMALIZE_PARALLEL_DOT: f32 = 0.999;

/// Minimum squared length every axis of a facet frame must reach before
/// planar texture coordinates are generated for the facet.
///
/// Unit axes have squared length 1. Anything below this threshold means
/// normalization collapsed and the facet gets zero texture coordinates.
///
/// # Example
///
/// ```rust
/// use config::constants::TEXCOORD_DEGENERATE_AXIS_LENGTH2;
///
/// let axis_length2: f32 = 0.0;
/// assert!(axis_length2 < TEXCOORD_DEGENERATE_AXIS_LENGTH2);
/// ```
pub const TEXCOORD_DEGENERATE_AXIS_LENGTH2: f32 = 0.9;

// =============================================================================
// OPERATION CONSTANTS
// =============================================================================

/// Maximum distance between two vertices that weld merges (5 mm).
///
/// # Example
///
/// ```rust
/// use config::constants::WELD_MAX_DISTANCE;
///
/// let offset: f32 = 0.0001;
/// assert!(offset < WELD_MAX_DISTANCE);
/// ```
pub const WELD_MAX_DISTANCE: f32 = 0.005;

/// Largest boundary loop area that repair closes with new facets.
///
/// Larger openings are considered intentional and left alone.
///
/// # Example
///
/// ```rust
/// use config::constants::REPAIR_HOLE_MAX_AREA;
///
/// let small_hole_area: f32 = 0.005;
/// assert!(small_hole_area <= REPAIR_HOLE_MAX_AREA);
/// ```
pub const REPAIR_HOLE_MAX_AREA: f32 = 0.01;

/// Vertex colocation tolerance used by repair, relative to the bounding box
/// diagonal of the mesh being repaired.
///
/// # Example
///
/// ```rust
/// use config::constants::REPAIR_COLOCATE_RELATIVE_EPSILON;
///
/// let diagonal: f32 = 10.0;
/// let tolerance = diagonal * REPAIR_COLOCATE_RELATIVE_EPSILON;
/// assert!(tolerance < 1e-3);
/// ```
pub const REPAIR_COLOCATE_RELATIVE_EPSILON: f32 = 1e-6;

/// Tolerance for splitting self-intersections, relative to the bounding box
/// diagonal. New vertices closer than this to an existing one reuse it.
///
/// # Example
///
/// ```rust
/// use config::constants::{REPAIR_COLOCATE_RELATIVE_EPSILON, REPAIR_INTERSECTION_RELATIVE_EPSILON};
///
/// assert!(REPAIR_INTERSECTION_RELATIVE_EPSILON > REPAIR_COLOCATE_RELATIVE_EPSILON);
/// ```
pub const REPAIR_INTERSECTION_RELATIVE_EPSILON: f32 = 1e-5;

/// Distance in front of a face, relative to the bounding box diagonal, at
/// which a point counts as outside the convex hull under construction.
///
/// # Example
///
/// ```rust
/// use config::constants::HULL_RELATIVE_EPSILON;
///
/// let diagonal: f64 = 2.0;
/// let tolerance = diagonal * f64::from(HULL_RELATIVE_EPSILON);
/// assert!(tolerance < 1e-5);
/// ```
pub const HULL_RELATIVE_EPSILON: f32 = 1e-6;

/// Dot product between unit facet normals at or above which two adjacent
/// facets are merged by coplanar simplification.
///
/// # Example
///
/// ```rust
/// use config::constants::COPLANAR_NORMAL_DOT_THRESHOLD;
///
/// let same_plane: f32 = 1.0;
/// assert!(same_plane >= COPLANAR_NORMAL_DOT_THRESHOLD);
/// ```
pub const COPLANAR_NORMAL_DOT_THRESHOLD: f32 = 0.99;

// =============================================================================
// SPATIAL INDEX CONSTANTS
// =============================================================================

/// Default maximum number of points stored in an octree leaf.
///
/// # Example
///
/// ```rust
/// use config::constants::OCTREE_DEFAULT_BUCKET_SIZE;
///
/// assert!(OCTREE_DEFAULT_BUCKET_SIZE >= 1);
/// ```
pub const OCTREE_DEFAULT_BUCKET_SIZE: u32 = 32;

/// Default minimum octant half extent. Zero means subdivision is limited
/// only by the bucket size.
///
/// # Example
///
/// ```rust
/// use config::constants::OCTREE_DEFAULT_MIN_EXTENT;
///
/// assert_eq!(OCTREE_DEFAULT_MIN_EXTENT, 0.0);
/// ```
pub const OCTREE_DEFAULT_MIN_EXTENT: f32 = 0.0;

// =============================================================================
// ALLOCATION CONSTANTS
// =============================================================================

/// Capacity reserved the first time a per-element source list is indexed.
///
/// # Example
///
/// ```rust
/// use config::constants::SOURCE_LIST_INITIAL_CAPACITY;
///
/// assert!(SOURCE_LIST_INITIAL_CAPACITY > 0);
/// ```
pub const SOURCE_LIST_INITIAL_CAPACITY: usize = 20;

/// Factor a per-element source list grows by when indexed past its end.
///
/// # Example
///
/// ```rust
/// use config::constants::{source_list_size_to_include, SOURCE_LIST_GROWTH_FACTOR};
///
/// assert!(SOURCE_LIST_GROWTH_FACTOR > 1.0);
/// assert!(source_list_size_to_include(0, 100) > 100);
/// ```
pub const SOURCE_LIST_GROWTH_FACTOR: f32 = 1.75;

// =============================================================================
// HELPER FUNCTIONS
// =============================================================================

/// Returns the length a source list of `current_len` elements should grow to
/// so that `index` becomes addressable.
///
/// Starts at [`SOURCE_LIST_INITIAL_CAPACITY`] and multiplies by
/// [`SOURCE_LIST_GROWTH_FACTOR`] until the index fits.
///
/// # Example
///
/// ```rust
/// use config::constants::source_list_size_to_include;
///
/// assert_eq!(source_list_size_to_include(0, 3), 20);
/// assert_eq!(source_list_size_to_include(20, 19), 20);
/// assert_eq!(source_list_size_to_include(20, 20), 35);
/// ```
pub fn source_list_size_to_include(current_len: usize, index: usize) -> usize {
    let mut size = current_len.max(SOURCE_LIST_INITIAL_CAPACITY);
    while size <= index {
        size = ((size as f32) * SOURCE_LIST_GROWTH_FACTOR) as usize;
    }
    size
}

/// Checks if a f32 value is approximately zero within EPSILON.
///
/// # Example
///
/// ```rust
/// use config::constants::approx_zero;
///
/// assert!(approx_zero(1e-7));
/// assert!(!approx_zero(0.1));
/// ```
#[inline]
pub fn approx_zero(value: f32) -> bool {
    value.abs() < EPSILON
}

// =============================================================================
// GLOBAL CONFIGURATION
// =============================================================================

/// Immutable snapshot of the tunable operation thresholds.
///
/// The defaults are the constants above. Callers that need a different weld
/// radius or hole size build their own snapshot.
///
/// # Examples
/// ```
/// use config::constants::GlobalConfig;
/// let config = GlobalConfig::default();
/// assert!(config.weld_max_distance > 0.0);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GlobalConfig {
    /// Vertices closer than this are merged by weld.
    pub weld_max_distance: f32,
    /// Largest hole area closed by repair.
    pub hole_fill_max_area: f32,
    /// Minimum normal dot product for coplanar facet merging.
    pub coplanar_normal_dot: f32,
}

impl GlobalConfig {
    /// Builds a configuration enforcing strict validation of every
    /// threshold.
    ///
    /// # Examples
    /// ```
    /// use config::constants::GlobalConfig;
    /// let cfg = GlobalConfig::new(0.001, 0.05, 0.999).expect("valid config");
    /// assert_eq!(cfg.weld_max_distance, 0.001);
    /// ```
    pub fn new(
        weld_max_distance: f32,
        hole_fill_max_area: f32,
        coplanar_normal_dot: f32,
    ) -> Result<Self, ConfigError> {
        if !(weld_max_distance > 0.0) {
            return Err(ConfigError::InvalidWeldDistance(weld_max_distance));
        }
        if !(hole_fill_max_area >= 0.0) {
            return Err(ConfigError::InvalidHoleArea(hole_fill_max_area));
        }
        if !(coplanar_normal_dot > 0.0 && coplanar_normal_dot <= 1.0) {
            return Err(ConfigError::InvalidCoplanarDot(coplanar_normal_dot));
        }
        Ok(Self {
            weld_max_distance,
            hole_fill_max_area,
            coplanar_normal_dot,
        })
    }
}

impl Default for GlobalConfig {
    fn default() -> Self {
        Self {
            weld_max_distance: WELD_MAX_DISTANCE,
            hole_fill_max_area: REPAIR_HOLE_MAX_AREA,
            coplanar_normal_dot: COPLANAR_NORMAL_DOT_THRESHOLD,
        }
    }
}

/// Error returned when invalid configuration values are provided.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ConfigError {
    /// Raised when the weld distance is zero, negative or NaN.
    InvalidWeldDistance(f32),
    /// Raised when the hole area is negative or NaN.
    InvalidHoleArea(f32),
    /// Raised when the coplanar dot threshold is outside `(0, 1]`.
    InvalidCoplanarDot(f32),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidWeldDistance(value) => {
                write!(f, "weld_max_distance must be positive: {value}")
            }
            ConfigError::InvalidHoleArea(value) => {
                write!(f, "hole_fill_max_area must be >= 0: {value}")
            }
            ConfigError::InvalidCoplanarDot(value) => {
                write!(f, "coplanar_normal_dot must be in (0, 1]: {value}")
            }
        }
    }
}

impl std::error::Error for ConfigError {}
