//! # Attributes
//!
//! Sparse, typed per-element attributes and the generic algorithms that
//! transform and interpolate them.
//!
//! ## Components
//!
//! - [`AttributeDescriptor`]: identity plus transform and interpolation policy
//! - [`AttributeDescriptors`]: registry of well-known and custom descriptors
//! - [`AttributePresent`]: value array with a parallel presence array
//! - [`AttributeValue`]: capability trait of the supported element kinds
//! - [`transform_attribute`] / [`interpolate_attribute`]: the engine

pub mod descriptor;
pub mod engine;
pub mod present;
pub mod value;

pub use descriptor::{AttributeDescriptor, AttributeDescriptors, InterpolationMode, TransformMode};
pub use engine::{
    copy_attribute, interpolate_attribute, transform_attribute, transform_attribute_in_place,
    KeySources,
};
pub use present::AttributePresent;
pub use value::{AttributeValue, ElementKind};

#[cfg(test)]
mod tests;
