//! Rigid transform with uniform operations used by the redirectors
//!
//! Mirrors a scene-graph node: world position, rotation and scale. The
//! redirection object, redirector anchors and rooms are all described by one.

use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};

/// World-space transform (position, rotation, scale)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Transform {
    pub position: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Transform {
    pub const IDENTITY: Self = Self {
        position: Vec3::ZERO,
        rotation: Quat::IDENTITY,
        scale: Vec3::ONE,
    };

    pub fn from_position(position: Vec3) -> Self {
        Self {
            position,
            ..Self::IDENTITY
        }
    }

    /// Position plus a heading around world up (degrees)
    pub fn from_position_yaw(position: Vec3, yaw_deg: f32) -> Self {
        Self {
            position,
            rotation: Quat::from_rotation_y(yaw_deg.to_radians()),
            scale: Vec3::ONE,
        }
    }

    /// Local up axis in world space
    #[inline]
    pub fn up(&self) -> Vec3 {
        self.rotation * Vec3::Y
    }

    /// Local forward axis (+Z) in world space
    #[inline]
    pub fn forward(&self) -> Vec3 {
        self.rotation * Vec3::Z
    }

    /// Local point to world space (scale, rotation, translation)
    #[inline]
    pub fn transform_point(&self, local: Vec3) -> Vec3 {
        self.position + self.rotation * (local * self.scale)
    }

    /// Local direction to world space; ignores scale, keeps length
    #[inline]
    pub fn transform_direction(&self, local: Vec3) -> Vec3 {
        self.rotation * local
    }

    /// Local vector to world space; affected by rotation and scale
    #[inline]
    pub fn transform_vector(&self, local: Vec3) -> Vec3 {
        self.rotation * (local * self.scale)
    }

    /// Move by a world-space offset
    #[inline]
    pub fn translate(&mut self, delta: Vec3) {
        self.position += delta;
    }

    /// Rotate around a world-space pivot and axis by `degrees`
    pub fn rotate_around(&mut self, pivot: Vec3, axis: Vec3, degrees: f32) {
        let axis = axis.normalize_or_zero();
        if axis == Vec3::ZERO || degrees == 0.0 {
            return;
        }
        let q = Quat::from_axis_angle(axis, degrees.to_radians());
        self.position = pivot + q * (self.position - pivot);
        self.rotation = (q * self.rotation).normalize();
    }
}

/// Rotate `point` around `pivot` by `rotation`
#[inline]
pub fn rotate_point_around_pivot(point: Vec3, pivot: Vec3, rotation: Quat) -> Vec3 {
    rotation * (point - pivot) + pivot
}
