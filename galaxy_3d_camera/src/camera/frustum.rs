//! Frustum: six clipping planes for visibility culling.
//!
//! Each plane is represented as a Vec4 (A, B, C, D) where:
//! - (A, B, C) is the inward-pointing normal
//! - D is the signed distance
//! - A point P is inside the frustum if dot(plane, P_homogeneous) >= 0 for all planes
//!
//! Planes are extracted from a reverse-Z view-projection matrix with depth
//! in `[0, 1]`, i.e. the clip volume `-w <= x, y <= w`, `0 <= z <= w`.

use glam::{Mat4, Vec3, Vec4};
use crate::geom::AABB;

/// Result of a 3-way frustum/AABB classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrustumTest {
    /// AABB is entirely outside the frustum
    Outside,
    /// AABB is entirely inside the frustum
    Inside,
    /// AABB partially overlaps the frustum
    Partial,
}

/// Frustum plane indices
pub const PLANE_LEFT: usize = 0;
pub const PLANE_RIGHT: usize = 1;
pub const PLANE_BOTTOM: usize = 2;
pub const PLANE_TOP: usize = 3;
pub const PLANE_NEAR: usize = 4;
pub const PLANE_FAR: usize = 5;

/// Six frustum planes for culling.
///
/// Each plane is (A, B, C, D) where Ax + By + Cz + D = 0.
/// Normal (A, B, C) points inward (toward the visible volume).
#[derive(Debug, Clone, Copy)]
pub struct Frustum {
    /// Frustum planes: left, right, bottom, top, near, far
    pub planes: [Vec4; 6],
}

impl Frustum {
    /// Extract frustum planes from a reverse-Z view-projection matrix.
    ///
    /// Gribb & Hartmann, with the depth planes adjusted for reverse-Z:
    /// near is `z <= w` and far is `z >= 0`.
    pub fn from_view_projection(vp: &Mat4) -> Self {
        let r0 = vp.row(0);
        let r1 = vp.row(1);
        let r2 = vp.row(2);
        let r3 = vp.row(3);

        let mut planes = [
            r3 + r0, // left
            r3 - r0, // right
            r3 + r1, // bottom
            r3 - r1, // top
            r3 - r2, // near
            r2,      // far
        ];

        // Normalize so that (A, B, C) is a unit vector
        for plane in &mut planes {
            let normal_len = plane.truncate().length();
            if normal_len > 0.0 {
                *plane /= normal_len;
            }
        }

        Self { planes }
    }

    /// Signed distance of a point to one plane (positive inside).
    pub fn distance(&self, plane: usize, point: Vec3) -> f32 {
        self.planes[plane].dot(point.extend(1.0))
    }

    /// Whether a point lies inside all six planes.
    pub fn contains_point(&self, point: Vec3) -> bool {
        (0..6).all(|i| self.distance(i, point) >= 0.0)
    }

    /// Test if an AABB intersects this frustum.
    ///
    /// Uses the "positive vertex" test: for each plane, find the AABB corner
    /// most in the direction of the plane normal. If that corner is outside,
    /// the AABB is fully outside.
    ///
    /// Conservative: may return false positives, never false negatives.
    pub fn intersects_aabb(&self, aabb: &AABB) -> bool {
        self.classify_aabb(aabb) != FrustumTest::Outside
    }

    /// Classify an AABB against the frustum (3-way test).
    ///
    /// - If the p-vertex is outside any plane → `Outside` (early out)
    /// - If the n-vertex is outside any plane → at least `Partial`
    /// - Otherwise → `Inside`
    pub fn classify_aabb(&self, aabb: &AABB) -> FrustumTest {
        let mut all_inside = true;

        for plane in &self.planes {
            let normal = plane.truncate();

            let p_vertex = Vec3::select(normal.cmpge(Vec3::ZERO), aabb.max, aabb.min);
            if normal.dot(p_vertex) + plane.w < 0.0 {
                return FrustumTest::Outside;
            }

            let n_vertex = Vec3::select(normal.cmpge(Vec3::ZERO), aabb.min, aabb.max);
            if normal.dot(n_vertex) + plane.w < 0.0 {
                all_inside = false;
            }
        }

        if all_inside { FrustumTest::Inside } else { FrustumTest::Partial }
    }
}

#[cfg(test)]
#[path = "frustum_tests.rs"]
mod tests;
