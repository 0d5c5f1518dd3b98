//! Kernel-level configuration building on the shared `config` crate.
//!
//! Operations read their thresholds from a [`GeometryConfig`] so a caller can
//! override the weld radius or hole size for one call without touching the
//! workspace constants.

use config::constants::GlobalConfig;

use crate::error::GeometryResult;

/// Geometry kernel configuration wrapper.
///
/// # Examples
/// ```
/// use geometry_kernel::config::GeometryConfig;
/// let cfg = GeometryConfig::default();
/// assert_eq!(cfg.weld_max_distance, 0.005);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeometryConfig {
    /// Vertices closer than this are merged by weld.
    pub weld_max_distance: f32,
    /// Largest boundary loop area closed by repair.
    pub hole_fill_max_area: f32,
    /// Minimum unit normal dot product for coplanar facet merging.
    pub coplanar_normal_dot: f32,
}

impl GeometryConfig {
    /// Creates a new configuration from explicit values.
    ///
    /// # Examples
    /// ```
    /// use geometry_kernel::config::GeometryConfig;
    /// let cfg = GeometryConfig::new(0.01, 0.02, 0.95).unwrap();
    /// assert_eq!(cfg.weld_max_distance, 0.01);
    /// assert!(GeometryConfig::new(-1.0, 0.02, 0.95).is_err());
    /// ```
    pub fn new(
        weld_max_distance: f32,
        hole_fill_max_area: f32,
        coplanar_normal_dot: f32,
    ) -> GeometryResult<Self> {
        let global = GlobalConfig::new(weld_max_distance, hole_fill_max_area, coplanar_normal_dot)?;
        Ok(Self::from(global))
    }
}

impl From<GlobalConfig> for GeometryConfig {
    fn from(global: GlobalConfig) -> Self {
        Self {
            weld_max_distance: global.weld_max_distance,
            hole_fill_max_area: global.hole_fill_max_area,
            coplanar_normal_dot: global.coplanar_normal_dot,
        }
    }
}

impl Default for GeometryConfig {
    fn default() -> Self {
        Self::from(GlobalConfig::default())
    }
}

#[cfg(test)]
mod tests;
