//! Tests covering kernel configuration behavior.

use config::constants::{
    ConfigError, COPLANAR_NORMAL_DOT_THRESHOLD, REPAIR_HOLE_MAX_AREA, WELD_MAX_DISTANCE,
};

use super::*;
use crate::error::GeometryError;

#[test]
fn test_default_matches_constants() {
    let cfg = GeometryConfig::default();
    assert_eq!(cfg.weld_max_distance, WELD_MAX_DISTANCE);
    assert_eq!(cfg.hole_fill_max_area, REPAIR_HOLE_MAX_AREA);
    assert_eq!(cfg.coplanar_normal_dot, COPLANAR_NORMAL_DOT_THRESHOLD);
}

#[test]
fn test_builder_validates_input() {
    let err = GeometryConfig::new(0.0, 0.01, 0.99).unwrap_err();
    assert_eq!(
        err,
        GeometryError::Config(ConfigError::InvalidWeldDistance(0.0))
    );
}

#[test]
fn test_builder_accepts_overrides() {
    let cfg = GeometryConfig::new(0.02, 0.5, 0.999).unwrap();
    assert_eq!(cfg.hole_fill_max_area, 0.5);
    assert_eq!(cfg.coplanar_normal_dot, 0.999);
}
