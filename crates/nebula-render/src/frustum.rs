//! View frustum extracted from a view-projection matrix.
//!
//! Used twice per frame: the rebuild scheduler ranks dirty chunks by whether
//! they are in view, and both draw passes skip chunks whose bounds lie fully
//! outside. Planes are rebuilt from the camera matrices on every frame and
//! hold no per-chunk state.

use glam::{Mat4, Vec3, Vec4};
use nebula_math::Aabb;

/// Plane indices into the frustum planes array.
const LEFT: usize = 0;
const RIGHT: usize = 1;
const BOTTOM: usize = 2;
const TOP: usize = 3;
const NEAR: usize = 4;
const FAR: usize = 5;

/// A view frustum defined by six inward-pointing planes.
#[derive(Clone, Debug)]
pub struct Frustum {
    /// Six planes: left, right, bottom, top, near, far.
    /// Each `Vec4(a, b, c, d)` where `(a,b,c)` is the normalized inward
    /// normal and `d` is the signed distance term.
    planes: [Vec4; 6],
}

impl Frustum {
    /// Extract frustum planes from a combined view-projection matrix
    /// using the Griggs-Hartmann method.
    ///
    /// Expects reverse-Z with a `[0, 1]` depth range: near maps to z=1 and
    /// far to z=0, as produced by [`crate::Camera`].
    pub fn from_view_projection(vp: &Mat4) -> Self {
        let rows = [vp.row(0), vp.row(1), vp.row(2), vp.row(3)];

        let mut planes = [Vec4::ZERO; 6];
        planes[LEFT] = rows[3] + rows[0];
        planes[RIGHT] = rows[3] - rows[0];
        planes[BOTTOM] = rows[3] + rows[1];
        planes[TOP] = rows[3] - rows[1];
        // Reverse-Z: depth <= 1 is the near plane, depth >= 0 the far plane.
        planes[NEAR] = rows[3] - rows[2];
        planes[FAR] = rows[2];

        // Normalize each plane so that (a,b,c) is a unit vector.
        for plane in &mut planes {
            let len = plane.truncate().length();
            if len > 0.0 {
                *plane /= len;
            }
        }

        Self { planes }
    }

    /// Convenience for callers holding separate matrices.
    pub fn from_matrices(projection: &Mat4, view: &Mat4) -> Self {
        Self::from_view_projection(&(*projection * *view))
    }

    fn distance(plane: &Vec4, point: Vec3) -> f32 {
        plane.truncate().dot(point) + plane.w
    }

    /// Returns `true` if `point` is inside or on every plane.
    pub fn contains_point(&self, point: Vec3) -> bool {
        self.planes.iter().all(|p| Self::distance(p, point) >= 0.0)
    }

    /// Returns `true` unless the sphere lies fully behind some plane.
    pub fn intersects_sphere(&self, center: Vec3, radius: f32) -> bool {
        self.planes
            .iter()
            .all(|p| Self::distance(p, center) >= -radius)
    }

    /// Test whether an AABB is at least partially inside the frustum.
    ///
    /// Uses the p-vertex (positive vertex) method: for each plane, find
    /// the corner of the AABB furthest along the plane normal. If that
    /// corner is behind the plane, the entire AABB is outside.
    ///
    /// Conservative: boxes near frustum corners may be reported visible
    /// while fully outside, but a visible box is never rejected.
    pub fn intersects_aabb(&self, aabb: &Aabb) -> bool {
        for plane in &self.planes {
            let normal = plane.truncate();

            // Positive vertex: the corner furthest along the plane normal.
            let p = Vec3::select(normal.cmpge(Vec3::ZERO), aabb.max, aabb.min);

            if normal.dot(p) + plane.w < 0.0 {
                return false;
            }
        }
        true
    }
}
