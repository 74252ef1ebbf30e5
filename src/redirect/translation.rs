//! Translation gain
//!
//! The play area is moved along a direction while the player walks along it,
//! so the virtual distance covered differs from the physical one.

use glam::Vec3;
use serde::{Deserialize, Serialize};

use super::base::{PlayAreaPose, RedirectionFrame, RedirectorBase, split_by_direction};
use super::progress::AxisProgress;
use super::{Redirector, RedirectorKind};
use crate::consts::AXIS_EPSILON;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TranslationParams {
    /// Direction of the translation in anchor space
    pub direction: Vec3,
    /// Meters the play area is moved over a full session
    pub amount: f32,
    /// Gain while moving along `direction`
    pub forward_gain: f32,
    /// Gain while moving against `direction`
    pub backward_gain: f32,
}

impl Default for TranslationParams {
    fn default() -> Self {
        Self {
            direction: Vec3::Z,
            amount: 0.0,
            forward_gain: 0.1,
            backward_gain: -0.1,
        }
    }
}

#[derive(Debug, Clone)]
pub struct TranslationRedirector {
    base: RedirectorBase,
    pub params: TranslationParams,
    direction_world: Vec3,
    progress: AxisProgress,
}

impl TranslationRedirector {
    pub fn new(base: RedirectorBase, params: TranslationParams) -> Self {
        Self {
            base,
            params,
            direction_world: Vec3::ZERO,
            progress: AxisProgress::default(),
        }
    }

    /// Per-axis progress of the running session
    pub fn progress(&self) -> Vec3 {
        self.progress.value()
    }

    /// Correction for this frame's world-space head motion
    fn correction(&mut self, delta_world: Vec3) -> Vec3 {
        let (aligned, opposed) = split_by_direction(delta_world, self.direction_world);
        let raw = aligned * self.params.forward_gain + opposed * self.params.backward_gain;

        let mut applied = Vec3::ZERO;
        for axis in 0..3 {
            let c = raw[axis];
            if c == 0.0 {
                continue;
            }
            let accepted = self.progress.advance(axis, c.abs());
            applied[axis] = accepted.copysign(c);
        }
        applied
    }
}

impl Redirector for TranslationRedirector {
    fn base(&self) -> &RedirectorBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut RedirectorBase {
        &mut self.base
    }

    fn kind(&self) -> RedirectorKind {
        RedirectorKind::Translation
    }

    fn start_redirection(&mut self) {
        let direction = self.params.direction.normalize_or_zero();
        if self.params.amount.abs() <= AXIS_EPSILON || direction == Vec3::ZERO {
            log::debug!("{}: nothing to translate, not starting", self.base.name);
            return;
        }
        self.direction_world = self.base.anchor.transform_direction(direction);
        self.progress = AxisProgress::start(self.direction_world, self.params.amount, 0.0);
        self.base.begin_session();
    }

    fn update(&mut self, frame: &mut RedirectionFrame<'_>) {
        let delta = self.base.advance(frame);
        if !self.base.is_redirecting() {
            return;
        }

        let delta_world = frame.tracking_space().transform_vector(delta.translation());
        let correction = self.correction(delta_world);

        match frame.target.as_deref_mut() {
            Some(target) => target.translate(correction),
            None => self.base.warn_missing_target(),
        }

        if self.progress.is_complete() {
            self.end_redirection();
        }
    }

    fn end_play_area(&self) -> PlayAreaPose {
        let anchor = &self.base.anchor;
        PlayAreaPose {
            position: anchor
                .transform_point(self.params.direction.normalize_or_zero() * self.params.amount),
            rotation: anchor.rotation,
        }
    }
}
