//! Redirected walking for room-scale VR
//!
//! Core modules:
//! - `redirect`: Gain redirectors (translation, curvature, rotation)
//! - `rooms`: Overlapping-room occupancy and transitions
//! - `sim`: Frame-driven world state and tick
//! - `pose`: Head pose sources with stale-sample fallback
//! - `usage_log`: Append-only CSV session log
//! - `config`: JSON rig description
//! - `minimap`: Player pin remapping onto moved minimap rooms

pub mod config;
pub mod error;
pub mod minimap;
pub mod pose;
pub mod redirect;
pub mod rooms;
pub mod sim;
pub mod transform;
pub mod usage_log;

pub use config::RigConfig;
pub use error::{Error, Result};
pub use pose::{HeadPose, PoseSampler, PoseSource};
pub use redirect::{RedirectionEvent, RedirectionEventKind, Redirector, SessionStats};
pub use transform::Transform;
pub use usage_log::{LoggerSlot, UsageLogger};

use glam::{Quat, Vec3};

/// Redirection constants
pub mod consts {
    /// Starting progress of an interruptible session, so "just started" is
    /// distinguishable from "walked back to the start"
    pub const MIN_PROGRESS: f32 = 1e-5;
    /// Progress at or above `1.0 - COMPLETION_EPSILON` counts as complete
    pub const COMPLETION_EPSILON: f32 = 1e-4;
    /// Tolerance for "returned to the start" in interruptible sessions
    pub const INTERRUPT_EPSILON: f32 = 1e-4;
    /// Direction components with a smaller magnitude are treated as zero
    pub const AXIS_EPSILON: f32 = 1e-6;

    /// Default play area (meters, width x depth)
    pub const DEFAULT_PLAY_AREA_WIDTH: f32 = 4.0;
    pub const DEFAULT_PLAY_AREA_DEPTH: f32 = 3.0;

    /// Fixed frame timestep used by the demo (90 Hz headset refresh)
    pub const FRAME_DT: f32 = 1.0 / 90.0;
}

/// Signed shortest difference between two angles in degrees, in (-180, 180]
#[inline]
pub fn delta_angle(from_deg: f32, to_deg: f32) -> f32 {
    let mut delta = (to_deg - from_deg).rem_euclid(360.0);
    if delta > 180.0 {
        delta -= 360.0;
    }
    delta
}

/// Heading of a rotation around world up, in degrees (0 = +Z, 90 = +X)
#[inline]
pub fn yaw_degrees(rotation: Quat) -> f32 {
    let forward = rotation * Vec3::Z;
    forward.x.atan2(forward.z).to_degrees()
}

/// Signed yaw change from `from` to `to`, in degrees
#[inline]
pub fn yaw_delta(from: Quat, to: Quat) -> f32 {
    delta_angle(yaw_degrees(from), yaw_degrees(to))
}

/// Where `value` lies between `a` and `b`, clamped to [0, 1]
#[inline]
pub fn inverse_lerp(a: f32, b: f32, value: f32) -> f32 {
    if a == b {
        return 0.0;
    }
    ((value - a) / (b - a)).clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_delta_angle_wraps() {
        assert!((delta_angle(170.0, -170.0) - 20.0).abs() < 1e-4);
        assert!((delta_angle(-170.0, 170.0) + 20.0).abs() < 1e-4);
        assert!((delta_angle(0.0, 90.0) - 90.0).abs() < 1e-4);
        assert!((delta_angle(10.0, 10.0)).abs() < 1e-4);
    }

    #[test]
    fn test_yaw_of_rotation_about_up() {
        let q = Quat::from_rotation_y(30f32.to_radians());
        assert!((yaw_degrees(q) - 30.0).abs() < 1e-3);
        let q = Quat::from_rotation_y(-120f32.to_radians());
        assert!((yaw_degrees(q) + 120.0).abs() < 1e-3);
    }

    #[test]
    fn test_yaw_ignores_pitch() {
        let q = Quat::from_rotation_y(45f32.to_radians()) * Quat::from_rotation_x(0.3);
        assert!((yaw_degrees(q) - 45.0).abs() < 1e-3);
    }

    #[test]
    fn test_inverse_lerp() {
        assert_eq!(inverse_lerp(0.0, 350.0, 175.0), 0.5);
        assert_eq!(inverse_lerp(0.0, 350.0, 700.0), 1.0);
        assert_eq!(inverse_lerp(0.0, 0.0, 1.0), 0.0);
    }
}
