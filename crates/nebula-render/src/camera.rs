//! First-person camera producing view and reverse-Z projection matrices.

use glam::{EulerRot, Mat4, Quat, Vec3};

use crate::frustum::Frustum;

/// A perspective camera positioned in world space.
#[derive(Debug, Clone)]
pub struct Camera {
    pub position: Vec3,
    /// Rotation as a unit quaternion.
    pub rotation: Quat,
    /// Vertical field of view in radians.
    pub fov_y: f32,
    /// Width / height.
    pub aspect_ratio: f32,
    /// Near clip plane distance (always positive).
    pub near: f32,
    /// Far clip plane distance (always positive, > near).
    pub far: f32,
}

impl Camera {
    /// Points the camera by yaw (around +Y) and pitch (around the local +X),
    /// both in radians. Zero yaw and pitch look down -Z.
    pub fn set_yaw_pitch(&mut self, yaw: f32, pitch: f32) {
        let pitch = pitch.clamp(-std::f32::consts::FRAC_PI_2, std::f32::consts::FRAC_PI_2);
        self.rotation = Quat::from_euler(EulerRot::YXZ, yaw, pitch, 0.0);
    }

    /// Compute the view matrix (inverse of camera transform).
    pub fn view_matrix(&self) -> Mat4 {
        Mat4::from_rotation_translation(self.rotation, self.position).inverse()
    }

    /// Compute the projection matrix with reverse-Z.
    pub fn projection_matrix(&self) -> Mat4 {
        // Reverse-Z: near plane maps to z=1, far plane maps to z=0.
        Mat4::perspective_rh(
            self.fov_y,
            self.aspect_ratio,
            self.far,  // swapped: far as "near" parameter
            self.near, // swapped: near as "far" parameter
        )
    }

    /// Compute the combined view-projection matrix.
    pub fn view_projection_matrix(&self) -> Mat4 {
        self.projection_matrix() * self.view_matrix()
    }

    /// The view frustum for this frame.
    pub fn frustum(&self) -> Frustum {
        Frustum::from_view_projection(&self.view_projection_matrix())
    }

    /// The forward direction vector (-Z in camera space).
    pub fn forward(&self) -> Vec3 {
        self.rotation * Vec3::NEG_Z
    }

    /// The up direction vector (+Y in camera space).
    pub fn up(&self) -> Vec3 {
        self.rotation * Vec3::Y
    }

    /// The right direction vector (+X in camera space).
    pub fn right(&self) -> Vec3 {
        self.rotation * Vec3::X
    }

    pub fn set_aspect_ratio(&mut self, width: f32, height: f32) {
        if height > 0.0 {
            self.aspect_ratio = width / height;
        }
    }
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            fov_y: 70.0_f32.to_radians(),
            aspect_ratio: 16.0 / 9.0,
            near: 0.05,
            far: 1000.0,
        }
    }
}
