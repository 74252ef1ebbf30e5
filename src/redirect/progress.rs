//! Per-axis progress tracking
//!
//! An oblique redirection direction completes each world axis independently.
//! Axes the direction does not move along start (and stay) complete.

use glam::Vec3;

use crate::consts::{AXIS_EPSILON, COMPLETION_EPSILON};

/// Progress of a redirection along each world axis, every component in [0, 1]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AxisProgress {
    value: Vec3,
    /// Meters of accepted motion that complete each axis (0 = untracked)
    span: Vec3,
}

impl Default for AxisProgress {
    fn default() -> Self {
        Self {
            value: Vec3::ZERO,
            span: Vec3::ZERO,
        }
    }
}

impl AxisProgress {
    /// Fresh progress for a world direction scaled to `length` meters.
    /// Tracked axes start at `initial`, untracked axes at 1.0.
    pub fn start(direction_world: Vec3, length: f32, initial: f32) -> Self {
        let span = (direction_world * length).abs();
        let mut value = Vec3::ZERO;
        for axis in 0..3 {
            value[axis] = if span[axis] <= AXIS_EPSILON {
                1.0
            } else {
                initial.clamp(0.0, 1.0)
            };
        }
        Self { value, span }
    }

    #[inline]
    pub fn value(&self) -> Vec3 {
        self.value
    }

    /// Whether the direction moves along `axis`
    #[inline]
    pub fn is_tracked(&self, axis: usize) -> bool {
        self.span[axis] > AXIS_EPSILON
    }

    /// All axes complete
    pub fn is_complete(&self) -> bool {
        self.value.length_squared() >= 3.0
    }

    /// Every tracked axis is at or below `threshold`
    pub fn tracked_at_most(&self, threshold: f32) -> bool {
        (0..3)
            .filter(|&axis| self.is_tracked(axis))
            .all(|axis| self.value[axis] <= threshold)
    }

    /// Smallest progress over tracked axes (1.0 if nothing is tracked)
    pub fn min_tracked(&self) -> f32 {
        (0..3)
            .filter(|&axis| self.is_tracked(axis))
            .map(|axis| self.value[axis])
            .fold(1.0, f32::min)
    }

    /// Feed `meters` of motion into `axis` (negative moves progress back).
    ///
    /// Returns the portion that was accepted: motion past completion, or back
    /// past zero, is cut off so progress never leaves [0, 1]. A completed axis
    /// accepts no further forward motion.
    pub fn advance(&mut self, axis: usize, meters: f32) -> f32 {
        if !self.is_tracked(axis) || meters == 0.0 {
            return 0.0;
        }
        let span = self.span[axis];
        let current = self.value[axis];

        let accepted = if meters > 0.0 {
            meters.min((1.0 - current) * span)
        } else {
            -(-meters).min(current * span)
        };

        let mut next = (current + accepted / span).clamp(0.0, 1.0);
        if next >= 1.0 - COMPLETION_EPSILON {
            next = 1.0;
        }
        self.value[axis] = next;
        accepted
    }
}
