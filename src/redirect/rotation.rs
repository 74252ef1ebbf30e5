//! Rotation gain
//!
//! The play area is rotated around a pivot while the player turns their head.
//! The player should stay close to the pivot to avoid being dragged along.

use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};

use super::base::{PlayAreaPose, RedirectionFrame, RedirectorBase};
use super::{Redirector, RedirectorKind};
use crate::consts::{AXIS_EPSILON, COMPLETION_EPSILON};
use crate::transform::rotate_point_around_pivot;
use crate::{inverse_lerp, yaw_delta};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RotationParams {
    /// Pivot in anchor space
    pub rotation_point: Vec3,
    /// Total rotation the player is redirected (degrees)
    pub rotation_degrees: f32,
    /// Gain while turning left
    pub left_gain: f32,
    /// Gain while turning right
    pub right_gain: f32,
    /// Scale the gain by how fast the head turns
    pub velocity_dependent_gain: bool,
    /// Head turn speed (degrees/s) at which the full gain applies
    pub rotation_speed_upper_threshold: f32,
}

impl Default for RotationParams {
    fn default() -> Self {
        Self {
            rotation_point: Vec3::new(10.0, 0.0, 10.0),
            rotation_degrees: 0.0,
            left_gain: 0.1,
            right_gain: -0.1,
            velocity_dependent_gain: true,
            rotation_speed_upper_threshold: 350.0,
        }
    }
}

#[derive(Debug, Clone)]
pub struct RotationRedirector {
    base: RedirectorBase,
    pub params: RotationParams,
    target_angle: f32,
    applied_angle: f32,
    progress: f32,
}

impl RotationRedirector {
    pub fn new(base: RedirectorBase, params: RotationParams) -> Self {
        Self {
            base,
            params,
            target_angle: 0.0,
            applied_angle: 0.0,
            progress: 0.0,
        }
    }

    /// Progress of the running session in [0, 1]
    pub fn rotation_progress(&self) -> f32 {
        self.progress
    }

    /// Signed total angle of the running session (degrees)
    pub fn target_angle(&self) -> f32 {
        self.target_angle
    }

    /// World-space pivot
    pub fn pivot(&self) -> Vec3 {
        self.base.anchor.transform_point(self.params.rotation_point)
    }

    /// Gain for a head yaw change of `yaw_delta` degrees over `dt` seconds
    pub fn gain(&self, yaw_delta: f32, dt: f32) -> f32 {
        let mut gain = if yaw_delta > 0.0 {
            self.params.right_gain
        } else {
            self.params.left_gain
        };

        if self.params.velocity_dependent_gain {
            let speed = if dt > 0.0 { (yaw_delta / dt).abs() } else { 0.0 };
            gain *= inverse_lerp(0.0, self.params.rotation_speed_upper_threshold, speed);
        }
        gain
    }

    fn end_rotation(&self) -> Quat {
        self.base.anchor.rotation * Quat::from_rotation_y(self.params.rotation_degrees.to_radians())
    }
}

impl Redirector for RotationRedirector {
    fn base(&self) -> &RedirectorBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut RedirectorBase {
        &mut self.base
    }

    fn kind(&self) -> RedirectorKind {
        RedirectorKind::Rotation
    }

    fn start_redirection(&mut self) {
        let target_angle = yaw_delta(self.base.anchor.rotation, self.end_rotation());
        if self.params.rotation_degrees.abs() <= AXIS_EPSILON || target_angle.abs() <= AXIS_EPSILON
        {
            log::debug!("{}: nothing to rotate, not starting", self.base.name);
            return;
        }
        self.target_angle = target_angle;
        self.applied_angle = 0.0;
        self.progress = 0.0;
        self.base.begin_session();
    }

    fn update(&mut self, frame: &mut RedirectionFrame<'_>) {
        let delta = self.base.advance(frame);
        if !self.base.is_redirecting() {
            return;
        }

        let yaw = delta.yaw();
        let gain = self.gain(yaw, frame.dt);
        let normalized = (yaw.abs() * gain).abs() / self.target_angle.abs();

        self.progress = (self.progress + normalized).clamp(0.0, 1.0);
        if self.progress >= 1.0 - COMPLETION_EPSILON {
            self.progress = 1.0;
        }

        let current_angle = self.progress * self.target_angle;
        let step = current_angle - self.applied_angle;
        if step != 0.0 {
            let pivot = self.pivot();
            let up = self.base.anchor.up();
            match frame.target.as_deref_mut() {
                Some(target) => target.rotate_around(pivot, up, step),
                None => self.base.warn_missing_target(),
            }
        }
        self.applied_angle = current_angle;

        if self.progress == 1.0 {
            self.end_redirection();
        }
    }

    fn end_play_area(&self) -> PlayAreaPose {
        let anchor = &self.base.anchor;
        let turn = Quat::from_axis_angle(
            anchor.up().normalize_or_zero(),
            self.params.rotation_degrees.to_radians(),
        );
        PlayAreaPose {
            position: rotate_point_around_pivot(anchor.position, self.pivot(), turn),
            rotation: self.end_rotation(),
        }
    }
}
