//! Processing steps deriving per-element data from positions.

use std::collections::HashMap;
use std::f32::consts::{PI, TAU};

use config::constants::{approx_zero, TEXCOORD_DEGENERATE_AXIS_LENGTH2};
use glam::{Mat4, Vec2, Vec3, Vec4};
use tracing::{info, trace, warn};

use super::Geometry;
use crate::math::{gram_schmidt, min_axis, safe_normalize_cross, vec3_from_index};

impl Geometry {
    /// Stores the unit normal of every facet. Degenerate facets keep their
    /// previous value.
    pub fn compute_facet_normals(&mut self) {
        let mut skipped = 0usize;
        for facet in self.mesh.facets() {
            match self.facet_normal(facet) {
                Some(normal) => self.attributes.facet.normal.set(facet, normal),
                None => skipped += 1,
            }
        }
        if skipped > 0 {
            warn!(name = %self.name, skipped, "facets without a normal");
        }
        trace!(name = %self.name, facets = self.mesh.facet_count(), "computed facet normals");
    }

    /// Stores the centroid of every facet.
    pub fn compute_facet_centroids(&mut self) {
        for facet in self.mesh.facets() {
            let centroid = self.facet_centroid(facet);
            self.attributes.facet.centroid.set(facet, centroid);
        }
        trace!(name = %self.name, facets = self.mesh.facet_count(), "computed facet centroids");
    }

    /// Stores the normalized sum of adjacent unit facet normals in
    /// `normal_smooth` for every vertex used by a facet.
    ///
    /// Stored facet normals are used where present; missing ones are
    /// computed from positions.
    pub fn compute_smooth_vertex_normals(&mut self) {
        let mut sums = vec![Vec3::ZERO; self.mesh.vertex_count()];
        for facet in self.mesh.facets() {
            let normal = match self.attributes.facet.normal.try_get(facet) {
                Some(normal) => normal.normalize_or_zero(),
                None => self.facet_normal(facet).unwrap_or(Vec3::ZERO),
            };
            for &vertex in self.mesh.facet_vertices(facet) {
                sums[vertex as usize] += normal;
            }
        }
        for (vertex, sum) in sums.into_iter().enumerate() {
            if let Some(normal) = sum.try_normalize() {
                self.attributes.vertex.normal_smooth.set(vertex as u32, normal);
            }
        }
        trace!(name = %self.name, vertices = self.mesh.vertex_count(), "computed smooth vertex normals");
    }

    /// Projects every facet onto its own plane and stores the result in
    /// corner `texcoord_0`, scaled so the farthest corner is at distance 1.
    ///
    /// Facets without a usable frame get `(0, 0)` on every corner.
    pub fn generate_facet_texture_coordinates(&mut self) {
        let mut degenerate = 0usize;
        for facet in self.mesh.facets() {
            let corners = self.mesh.facet_corners(facet);
            let Some(facet_from_world) = self.facet_frame(facet) else {
                degenerate += 1;
                for corner in corners {
                    self.attributes.corner.texcoord_0.set(corner, Vec2::ZERO);
                }
                continue;
            };

            let projected: Vec<Vec2> = corners
                .clone()
                .map(|c| {
                    let p = self.mesh.position(self.mesh.corner_vertex(c));
                    facet_from_world.transform_point3(p).truncate()
                })
                .collect();
            let max_distance = projected.iter().map(|uv| uv.length()).fold(0.0, f32::max);
            let scale = if approx_zero(max_distance) { 1.0 } else { 1.0 / max_distance };
            for (corner, uv) in corners.zip(projected) {
                self.attributes.corner.texcoord_0.set(corner, uv * scale);
            }
        }
        if degenerate > 0 {
            warn!(name = %self.name, degenerate, "facets without a texture frame");
        }
        trace!(name = %self.name, "generated facet texture coordinates");
    }

    /// Maps every corner to longitude and latitude of its direction from
    /// the origin and stores the result in corner `texcoord_0`.
    ///
    /// `u` runs from 0 to 1 around the y axis starting at -x, `v` from 0 at
    /// +y to 1 at -y. A vertex at the origin uses the corner normal, then
    /// the vertex normals, then the facet normal.
    pub fn generate_texture_coordinates_spherical(&mut self) {
        for facet in self.mesh.facets() {
            for corner in self.mesh.facet_corners(facet) {
                let direction = self.corner_direction(facet, corner);
                let u = 0.5 + direction.z.atan2(direction.x) / TAU;
                let v = 0.5 - direction.y.clamp(-1.0, 1.0).asin() / PI;
                self.attributes.corner.texcoord_0.set(corner, Vec2::new(u, v));
            }
        }
        trace!(name = %self.name, "generated spherical texture coordinates");
    }

    /// Unit direction of a corner for spherical mapping.
    fn corner_direction(&self, facet: u32, corner: u32) -> Vec3 {
        let vertex = self.mesh.corner_vertex(corner);
        self.mesh
            .position(vertex)
            .try_normalize()
            .unwrap_or_else(|| self.corner_normal(facet, corner))
    }

    /// Normal of a corner: its own, its vertex's, or its facet's, in that
    /// order. +Y when none is available.
    fn corner_normal(&self, facet: u32, corner: u32) -> Vec3 {
        let vertex = self.mesh.corner_vertex(corner);
        let attributes = &self.attributes;
        [
            attributes.corner.normal.try_get(corner),
            attributes.vertex.normal.try_get(vertex),
            attributes.vertex.normal_smooth.try_get(vertex),
            attributes.facet.normal.try_get(facet),
        ]
        .into_iter()
        .flatten()
        .find_map(Vec3::try_normalize)
        .or_else(|| self.facet_normal(facet))
        .unwrap_or(Vec3::Y)
    }

    /// World to facet matrix: x along the first corner seen from the
    /// centroid, z along the normal, origin at the centroid.
    fn facet_frame(&self, facet: u32) -> Option<Mat4> {
        let normal = self.facet_normal(facet)?;
        let centroid = self.facet_centroid(facet);
        let p0 = self.mesh.position(self.mesh.facet_vertices(facet)[0]);
        let edge = (p0 - centroid).normalize_or_zero();
        let side = normal.cross(edge).normalize_or_zero();
        let view = normal;

        if [edge, side, view]
            .iter()
            .any(|axis| axis.length_squared() < TEXCOORD_DEGENERATE_AXIS_LENGTH2)
        {
            return None;
        }

        let world_from_facet = Mat4::from_cols(
            edge.extend(0.0),
            side.extend(0.0),
            view.extend(0.0),
            centroid.extend(1.0),
        );
        Some(world_from_facet.inverse())
    }

    /// Stores a facet tangent (handedness in w) and bitangent derived from
    /// the first three corners' `texcoord_0`, orthonormalized against the
    /// facet normal.
    pub fn compute_facet_tangents(&mut self) {
        let mut skipped = 0usize;
        for facet in self.mesh.facets() {
            match self.facet_tangent_frame(facet) {
                Some((tangent, bitangent)) => {
                    self.attributes.facet.tangent.set(facet, tangent);
                    self.attributes.facet.bitangent.set(facet, bitangent);
                }
                None => skipped += 1,
            }
        }
        if skipped > 0 {
            trace!(name = %self.name, skipped, "facets without texcoords or with a singular uv map");
        }
    }

    fn facet_tangent_frame(&self, facet: u32) -> Option<(Vec4, Vec3)> {
        let normal = self.facet_normal(facet)?;
        let mut corners = self.mesh.facet_corners(facet);
        let triangle = [corners.next()?, corners.next()?, corners.next()?];
        let (t, b) = self.triangle_uv_gradients(triangle)?;

        let (_, tangent, bitangent) = gram_schmidt(normal, t, b);
        if !tangent.is_finite() || !bitangent.is_finite() {
            return None;
        }
        let handedness = if normal.cross(tangent).dot(b) < 0.0 { -1.0 } else { 1.0 };
        Some((tangent.extend(handedness), bitangent))
    }

    /// Stores a tangent (handedness in w) and bitangent on every corner.
    ///
    /// Texture space directions are accumulated over the fan triangles of
    /// each facet, per vertex and texture coordinate so seams stay apart,
    /// or per facet when `make_facets_flat` is set. Each corner's result is
    /// orthonormalized against its normal. Missing corner `texcoord_0` is
    /// generated with [`Geometry::generate_facet_texture_coordinates`].
    ///
    /// Returns the number of corners whose tangent fell back to an
    /// arbitrary direction perpendicular to the normal.
    pub fn compute_corner_tangents(&mut self, make_facets_flat: bool) -> usize {
        if self.attributes.corner.texcoord_0.present_count() < self.mesh.corner_count() {
            self.generate_facet_texture_coordinates();
        }

        let mut per_facet = vec![(Vec3::ZERO, Vec3::ZERO); self.mesh.facet_count()];
        let mut per_vertex: HashMap<(u32, [u32; 2]), (Vec3, Vec3)> = HashMap::new();
        for facet in self.mesh.facets() {
            let corners: Vec<u32> = self.mesh.facet_corners(facet).collect();
            for k in 1..corners.len().saturating_sub(1) {
                let triangle = [corners[0], corners[k], corners[k + 1]];
                let Some((t, b)) = self.triangle_uv_gradients(triangle) else {
                    continue;
                };
                if make_facets_flat {
                    let sums = &mut per_facet[facet as usize];
                    sums.0 += t;
                    sums.1 += b;
                    continue;
                }
                for corner in triangle {
                    let sums = per_vertex.entry(self.tangent_key(corner)).or_default();
                    sums.0 += t;
                    sums.1 += b;
                }
            }
        }

        let mut fallbacks = 0usize;
        for facet in self.mesh.facets() {
            for corner in self.mesh.facet_corners(facet) {
                let (t, b) = if make_facets_flat {
                    per_facet[facet as usize]
                } else {
                    per_vertex.get(&self.tangent_key(corner)).copied().unwrap_or_default()
                };
                let n = self.corner_normal(facet, corner);
                let tangent = match (t - n * n.dot(t)).try_normalize() {
                    Some(tangent) => tangent,
                    None => {
                        fallbacks += 1;
                        safe_normalize_cross(n, min_axis(n))
                    }
                };
                let handedness = if n.cross(tangent).dot(b) < 0.0 { -1.0 } else { 1.0 };
                let bitangent = (b - n * n.dot(b))
                    .try_normalize()
                    .unwrap_or_else(|| n.cross(tangent) * handedness);
                self.attributes.corner.tangent.set(corner, tangent.extend(handedness));
                self.attributes.corner.bitangent.set(corner, bitangent);
            }
        }
        if fallbacks > 0 {
            warn!(name = %self.name, fallbacks, "corners without a texture space tangent");
        }
        trace!(name = %self.name, corners = self.mesh.corner_count(), make_facets_flat, "computed corner tangents");
        fallbacks
    }

    /// Vertex and exact texture coordinate of a corner.
    fn tangent_key(&self, corner: u32) -> (u32, [u32; 2]) {
        let uv = self.attributes.corner.texcoord_0.try_get(corner).unwrap_or(Vec2::ZERO);
        (self.mesh.corner_vertex(corner), [uv.x.to_bits(), uv.y.to_bits()])
    }

    /// Unnormalized position derivatives along u and v over a triangle of
    /// corners, `None` when the uv map is singular.
    fn triangle_uv_gradients(&self, [c0, c1, c2]: [u32; 3]) -> Option<(Vec3, Vec3)> {
        let texcoords = &self.attributes.corner.texcoord_0;
        let (t0, t1, t2) = (texcoords.try_get(c0)?, texcoords.try_get(c1)?, texcoords.try_get(c2)?);
        let position = |c: u32| self.mesh.position(self.mesh.corner_vertex(c));
        let (p0, p1, p2) = (position(c0), position(c1), position(c2));

        let (e1, e2) = (p1 - p0, p2 - p0);
        let (d1, d2) = (t1 - t0, t2 - t0);
        let det = d1.x * d2.y - d2.x * d1.y;
        if approx_zero(det) {
            return None;
        }
        let r = 1.0 / det;
        Some(((e1 * d2.y - e2 * d1.y) * r, (e2 * d1.x - e1 * d2.x) * r))
    }

    /// Stores a unique color per facet, encoding its index.
    pub fn compute_facet_ids(&mut self) {
        for facet in self.mesh.facets() {
            self.attributes.facet.id.set(facet, vec3_from_index(facet));
        }
    }

    /// Logs every vertex, facet and edge.
    pub fn debug_trace(&mut self) {
        self.topology.refresh(&self.mesh);
        info!(
            name = %self.name,
            vertices = self.mesh.vertex_count(),
            facets = self.mesh.facet_count(),
            edges = self.topology.edge_count(),
            "geometry dump"
        );
        for vertex in self.mesh.vertices() {
            info!(
                vertex,
                position = ?self.mesh.position(vertex),
                corners = ?self.topology.vertex_corners(vertex),
                "vertex"
            );
        }
        for facet in self.mesh.facets() {
            info!(facet, vertices = ?self.mesh.facet_vertices(facet), "facet");
        }
        for (index, edge) in self.topology.edges().iter().enumerate() {
            info!(
                edge = index,
                a = edge.a,
                b = edge.b,
                facets = ?self.topology.edge_facets(index as u32),
                "edge"
            );
        }
    }
}
