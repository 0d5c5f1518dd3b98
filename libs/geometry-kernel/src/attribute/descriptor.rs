//! # Attribute Descriptors
//!
//! Describes how an attribute responds to affine transforms and how it is
//! blended from several sources, plus the registry of well-known attributes.

use std::borrow::Cow;
use std::sync::{OnceLock, PoisonError, RwLock};

use crate::error::{GeometryError, GeometryResult};

// =============================================================================
// POLICIES
// =============================================================================

/// How an attribute value responds to an affine 4x4 transform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TransformMode {
    /// Value is copied unchanged.
    #[default]
    None,
    /// Position: multiply with w = 1.
    MatMulVec3One,
    /// Direction: multiply with w = 0.
    MatMulVec3Zero,
    /// Direction, normalized after the multiply.
    NormalizeMatMulVec3Zero,
    /// Tangent with handedness: xyz as a normalized direction, w passed
    /// through. Four component values only.
    NormalizeMatMulVec3ZeroAndFloat,
    /// Multiply by the normal matrix with w = 0.
    NormalMatMulVec3Zero,
    /// Multiply by the normal matrix with w = 0, then normalize.
    NormalizeNormalMatMulVec3Zero,
}

/// How an attribute value is computed from weighted sources.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum InterpolationMode {
    /// Not interpolatable. Interpolation leaves the destination untouched.
    #[default]
    None,
    /// Plain weighted average.
    Linear,
    /// Weighted average, renormalized (three component values).
    Normalized,
    /// Weighted average with xyz renormalized and w averaged (four component
    /// values).
    NormalizedVec3Float,
}

// =============================================================================
// DESCRIPTOR
// =============================================================================

/// Identity and policies of an attribute.
///
/// # Example
///
/// ```rust
/// use geometry_kernel::attribute::{AttributeDescriptors, TransformMode};
///
/// let normal = AttributeDescriptors::NORMAL;
/// assert_eq!(normal.present_name(), "present_normal");
/// assert_eq!(normal.transform_mode, TransformMode::NormalizeNormalMatMulVec3Zero);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AttributeDescriptor {
    /// Channel index for attributes that come in several sets.
    pub usage_index: u32,
    /// Attribute name.
    pub name: Cow<'static, str>,
    /// Transform policy.
    pub transform_mode: TransformMode,
    /// Interpolation policy.
    pub interpolation_mode: InterpolationMode,
}

impl AttributeDescriptor {
    /// Creates a descriptor with a static name.
    pub const fn new(
        usage_index: u32,
        name: &'static str,
        transform_mode: TransformMode,
        interpolation_mode: InterpolationMode,
    ) -> Self {
        Self {
            usage_index,
            name: Cow::Borrowed(name),
            transform_mode,
            interpolation_mode,
        }
    }

    /// Creates a descriptor with a runtime name.
    pub fn named(
        usage_index: u32,
        name: impl Into<String>,
        transform_mode: TransformMode,
        interpolation_mode: InterpolationMode,
    ) -> Self {
        Self {
            usage_index,
            name: Cow::Owned(name.into()),
            transform_mode,
            interpolation_mode,
        }
    }

    /// Name of the parallel presence array.
    pub fn present_name(&self) -> String {
        format!("present_{}", self.name)
    }

    fn matches(&self, usage_index: u32, name: &str) -> bool {
        self.usage_index == usage_index && self.name == name
    }
}

// =============================================================================
// REGISTRY
// =============================================================================

/// Registry mapping `(usage_index, name)` to canonical descriptors.
///
/// A fresh registry holds the well-known descriptors. The process-wide
/// instance behind [`AttributeDescriptors::global`] is where custom
/// descriptors are registered before first use.
///
/// # Example
///
/// ```rust
/// use geometry_kernel::attribute::{AttributeDescriptors, InterpolationMode};
///
/// let registry = AttributeDescriptors::new();
/// let texcoord = registry.get(1, "texcoord_1").unwrap();
/// assert_eq!(texcoord.interpolation_mode, InterpolationMode::Linear);
/// assert!(registry.get(0, "texcoord_1").is_none());
/// ```
#[derive(Debug, Clone)]
pub struct AttributeDescriptors {
    entries: Vec<AttributeDescriptor>,
}

impl AttributeDescriptors {
    /// Facet or vertex/corner normal.
    pub const NORMAL: AttributeDescriptor = AttributeDescriptor::new(
        0,
        "normal",
        TransformMode::NormalizeNormalMatMulVec3Zero,
        InterpolationMode::Normalized,
    );
    /// Tangent with handedness in w.
    pub const TANGENT: AttributeDescriptor = AttributeDescriptor::new(
        0,
        "tangent",
        TransformMode::NormalizeMatMulVec3ZeroAndFloat,
        InterpolationMode::NormalizedVec3Float,
    );
    /// Bitangent.
    pub const BITANGENT: AttributeDescriptor = AttributeDescriptor::new(
        0,
        "bitangent",
        TransformMode::NormalizeMatMulVec3Zero,
        InterpolationMode::NormalizedVec3Float,
    );
    /// First texture coordinate set.
    pub const TEXCOORD_0: AttributeDescriptor =
        AttributeDescriptor::new(0, "texcoord_0", TransformMode::None, InterpolationMode::Linear);
    /// Second texture coordinate set.
    pub const TEXCOORD_1: AttributeDescriptor =
        AttributeDescriptor::new(1, "texcoord_1", TransformMode::None, InterpolationMode::Linear);
    /// First color set.
    pub const COLOR_0: AttributeDescriptor =
        AttributeDescriptor::new(0, "color_0", TransformMode::None, InterpolationMode::Linear);
    /// Second color set.
    pub const COLOR_1: AttributeDescriptor =
        AttributeDescriptor::new(1, "color_1", TransformMode::None, InterpolationMode::Linear);
    /// First skinning joint index set.
    pub const JOINT_INDICES_0: AttributeDescriptor =
        AttributeDescriptor::new(0, "joint_indices_0", TransformMode::None, InterpolationMode::None);
    /// Second skinning joint index set.
    pub const JOINT_INDICES_1: AttributeDescriptor =
        AttributeDescriptor::new(1, "joint_indices_1", TransformMode::None, InterpolationMode::None);
    /// First skinning joint weight set.
    pub const JOINT_WEIGHTS_0: AttributeDescriptor =
        AttributeDescriptor::new(0, "joint_weights_0", TransformMode::None, InterpolationMode::None);
    /// Second skinning joint weight set.
    pub const JOINT_WEIGHTS_1: AttributeDescriptor =
        AttributeDescriptor::new(1, "joint_weights_1", TransformMode::None, InterpolationMode::None);
    /// Vertex valency and edge count.
    pub const VALENCY_EDGE_COUNT: AttributeDescriptor = AttributeDescriptor::new(
        0,
        "valency_edge_count",
        TransformMode::None,
        InterpolationMode::None,
    );
    /// Facet id color.
    pub const ID: AttributeDescriptor =
        AttributeDescriptor::new(0, "id", TransformMode::None, InterpolationMode::None);
    /// Smoothed vertex normal.
    pub const NORMAL_SMOOTH: AttributeDescriptor = AttributeDescriptor::new(
        0,
        "normal_smooth",
        TransformMode::NormalizeNormalMatMulVec3Zero,
        InterpolationMode::Normalized,
    );
    /// Facet centroid.
    pub const CENTROID: AttributeDescriptor = AttributeDescriptor::new(
        0,
        "centroid",
        TransformMode::MatMulVec3One,
        InterpolationMode::Linear,
    );
    /// Anisotropy control.
    pub const ANISO_CONTROL: AttributeDescriptor = AttributeDescriptor::new(
        0,
        "aniso_control",
        TransformMode::None,
        InterpolationMode::Linear,
    );

    /// Every well-known descriptor.
    pub const WELL_KNOWN: [AttributeDescriptor; 16] = [
        Self::NORMAL,
        Self::TANGENT,
        Self::BITANGENT,
        Self::TEXCOORD_0,
        Self::TEXCOORD_1,
        Self::COLOR_0,
        Self::COLOR_1,
        Self::JOINT_INDICES_0,
        Self::JOINT_INDICES_1,
        Self::JOINT_WEIGHTS_0,
        Self::JOINT_WEIGHTS_1,
        Self::VALENCY_EDGE_COUNT,
        Self::ID,
        Self::NORMAL_SMOOTH,
        Self::CENTROID,
        Self::ANISO_CONTROL,
    ];

    /// Creates a registry holding the well-known descriptors.
    pub fn new() -> Self {
        Self {
            entries: Self::WELL_KNOWN.to_vec(),
        }
    }

    /// Process-wide registry.
    pub fn global() -> &'static RwLock<AttributeDescriptors> {
        static GLOBAL: OnceLock<RwLock<AttributeDescriptors>> = OnceLock::new();
        GLOBAL.get_or_init(|| RwLock::new(AttributeDescriptors::new()))
    }

    /// Looks up a descriptor in the process-wide registry.
    pub fn lookup(usage_index: u32, name: &str) -> Option<AttributeDescriptor> {
        Self::global()
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(usage_index, name)
            .cloned()
    }

    /// Registers a descriptor in the process-wide registry.
    pub fn register(descriptor: AttributeDescriptor) -> GeometryResult<()> {
        Self::global()
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(descriptor)
    }

    /// Returns the descriptor registered for `(usage_index, name)`.
    pub fn get(&self, usage_index: u32, name: &str) -> Option<&AttributeDescriptor> {
        self.entries.iter().find(|d| d.matches(usage_index, name))
    }

    /// Registers a custom descriptor.
    pub fn insert(&mut self, descriptor: AttributeDescriptor) -> GeometryResult<()> {
        if self.get(descriptor.usage_index, &descriptor.name).is_some() {
            return Err(GeometryError::duplicate_descriptor(
                descriptor.usage_index,
                descriptor.name.into_owned(),
            ));
        }
        self.entries.push(descriptor);
        Ok(())
    }

    /// Number of registered descriptors.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for AttributeDescriptors {
    fn default() -> Self {
        Self::new()
    }
}
