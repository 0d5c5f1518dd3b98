//! # Config Crate
//!
//! Centralized configuration constants for the mesh geometry kernel.
//! All magic numbers and tunable thresholds are defined here so the octree,
//! the kernel and its operations agree on them.
//!
//! ## Usage
//!
//! ```rust
//! use config::constants::{EPSILON, WELD_MAX_DISTANCE};
//!
//! // Use EPSILON for floating-point comparisons
//! let value: f32 = 1e-7;
//! assert!(value.abs() < EPSILON);
//!
//! // Vertices closer than the weld distance collapse into one
//! let distance: f32 = 0.0001;
//! assert!(distance < WELD_MAX_DISTANCE);
//! ```
//!
//! ## Design Principles
//!
//! - **Single Source of Truth**: All constants defined once, used everywhere
//! - **Validated Overrides**: `GlobalConfig::new` rejects nonsensical thresholds
//! - **Well-Documented**: Every constant has clear documentation

pub mod constants;
