//! Volume, center of mass and inertia of closed surfaces.
//!
//! Integrals of 1, x, y, z, x², y², z², xy, yz and zx over the enclosed
//! solid, summed per triangle through the divergence theorem. Accumulated
//! in `f64`.

use glam::{DVec3, Mat3, Vec3};

use super::Geometry;

/// Mass properties of a closed surface at unit density.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MassProperties {
    /// Enclosed volume, always non-negative.
    pub volume: f32,
    /// Volume with sign; negative when facets face inward.
    pub signed_volume: f32,
    /// Center of mass.
    pub center_of_mass: Vec3,
    /// Inertia tensor about the center of mass.
    pub inertia: Mat3,
}

/// Running sums of the ten volume integrals.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct MassIntegrals {
    sums: [f64; 10],
}

fn subexpressions(w0: f64, w1: f64, w2: f64) -> (f64, f64, f64, f64, f64, f64) {
    let temp0 = w0 + w1;
    let f1 = temp0 + w2;
    let temp1 = w0 * w0;
    let temp2 = temp1 + w1 * temp0;
    let f2 = temp2 + w2 * f1;
    let f3 = w0 * temp1 + w1 * temp2 + w2 * f2;
    let g0 = f2 + w0 * (f1 + w0);
    let g1 = f2 + w1 * (f1 + w1);
    let g2 = f2 + w2 * (f1 + w2);
    (f1, f2, f3, g0, g1, g2)
}

impl MassIntegrals {
    /// Adds a counterclockwise (seen from outside) triangle.
    pub fn add_triangle(&mut self, [p0, p1, p2]: [Vec3; 3]) {
        let (p0, p1, p2) = (p0.as_dvec3(), p1.as_dvec3(), p2.as_dvec3());
        let d = (p1 - p0).cross(p2 - p0);
        let (f1x, f2x, f3x, g0x, g1x, g2x) = subexpressions(p0.x, p1.x, p2.x);
        let (f1y, f2y, f3y, g0y, g1y, g2y) = subexpressions(p0.y, p1.y, p2.y);
        let (f1z, f2z, f3z, g0z, g1z, g2z) = subexpressions(p0.z, p1.z, p2.z);

        let s = &mut self.sums;
        s[0] += d.x * f1x;
        s[1] += d.x * f2x;
        s[2] += d.y * f2y;
        s[3] += d.z * f2z;
        s[4] += d.x * f3x;
        s[5] += d.y * f3y;
        s[6] += d.z * f3z;
        s[7] += d.x * (p0.y * g0x + p1.y * g1x + p2.y * g2x);
        s[8] += d.y * (p0.z * g0y + p1.z * g1y + p2.z * g2y);
        s[9] += d.z * (p0.x * g0z + p1.x * g1z + p2.x * g2z);
    }

    /// Adds a polygon as a fan from its first point.
    pub fn add_polygon(&mut self, points: &[Vec3]) {
        for k in 1..points.len().saturating_sub(1) {
            self.add_triangle([points[0], points[k], points[k + 1]]);
        }
    }

    fn scaled(&self) -> [f64; 10] {
        const MULTIPLIERS: [f64; 10] = [
            1.0 / 6.0,
            1.0 / 24.0,
            1.0 / 24.0,
            1.0 / 24.0,
            1.0 / 60.0,
            1.0 / 60.0,
            1.0 / 60.0,
            1.0 / 120.0,
            1.0 / 120.0,
            1.0 / 120.0,
        ];
        let mut scaled = self.sums;
        for (value, multiplier) in scaled.iter_mut().zip(MULTIPLIERS) {
            *value *= multiplier;
        }
        scaled
    }

    /// Enclosed volume with sign.
    pub fn signed_volume(&self) -> f64 {
        self.sums[0] / 6.0
    }

    /// Mass properties, `None` when the enclosed volume is zero.
    pub fn properties(&self) -> Option<MassProperties> {
        let i = self.scaled();
        let mass = i[0];
        if mass == 0.0 || !mass.is_finite() {
            return None;
        }
        let cm = DVec3::new(i[1], i[2], i[3]) / mass;

        // Products of inertia about the origin, moved to the center of mass.
        let xx = i[5] + i[6] - mass * (cm.y * cm.y + cm.z * cm.z);
        let yy = i[4] + i[6] - mass * (cm.z * cm.z + cm.x * cm.x);
        let zz = i[4] + i[5] - mass * (cm.x * cm.x + cm.y * cm.y);
        let xy = -(i[7] - mass * cm.x * cm.y);
        let yz = -(i[8] - mass * cm.y * cm.z);
        let xz = -(i[9] - mass * cm.z * cm.x);
        let sign = mass.signum();
        let inertia = Mat3::from_cols_array(&[
            (sign * xx) as f32,
            (sign * xy) as f32,
            (sign * xz) as f32,
            (sign * xy) as f32,
            (sign * yy) as f32,
            (sign * yz) as f32,
            (sign * xz) as f32,
            (sign * yz) as f32,
            (sign * zz) as f32,
        ]);

        Some(MassProperties {
            volume: mass.abs() as f32,
            signed_volume: mass as f32,
            center_of_mass: cm.as_vec3(),
            inertia,
        })
    }
}

impl Geometry {
    /// Volume, center of mass and inertia tensor of the enclosed solid, at
    /// unit density.
    ///
    /// Meaningful for closed surfaces. Returns `None` when the surface
    /// encloses no volume.
    pub fn get_mass_properties(&self) -> Option<MassProperties> {
        let mut integrals = MassIntegrals::default();
        let mut points = Vec::new();
        for facet in self.mesh.facets() {
            points.clear();
            points.extend(self.mesh.facet_vertices(facet).iter().map(|&v| self.mesh.position(v)));
            integrals.add_polygon(&points);
        }
        integrals.properties()
    }
}
