//! State shared by every redirector and the lifecycle event contract

use glam::{Quat, Vec2, Vec3};
use serde::{Deserialize, Serialize};

use crate::consts::{DEFAULT_PLAY_AREA_DEPTH, DEFAULT_PLAY_AREA_WIDTH};
use crate::pose::{HeadPose, PoseDelta, PoseSampler};
use crate::transform::Transform;

/// Stable identity of a redirector within a rig
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RedirectorId(pub u32);

/// Metrics of one redirection session, reported when it ends
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct SessionStats {
    /// Seconds the session was active
    pub duration_secs: f32,
    /// Sum of absolute physical head yaw changes while active (degrees)
    pub total_real_rotation_deg: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum RedirectionEventKind {
    Started,
    /// Session reached its end (completion or explicit stop)
    Ended(SessionStats),
    /// Player walked back to the start before completion
    Interrupted(SessionStats),
}

/// Lifecycle notification, drained by the host exactly once
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RedirectionEvent {
    pub redirector: RedirectorId,
    pub name: String,
    pub kind: RedirectionEventKind,
}

/// World pose of a play area (its center on the floor and its heading)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlayAreaPose {
    pub position: Vec3,
    pub rotation: Quat,
}

/// Inputs for one redirector update
pub struct RedirectionFrame<'a> {
    /// Fresh head pose in tracking space, `None` if tracking dropped this frame
    pub pose: Option<HeadPose>,
    /// Seconds since the previous frame
    pub dt: f32,
    /// The redirection object. Tracking space is its local space.
    pub target: Option<&'a mut Transform>,
}

impl<'a> RedirectionFrame<'a> {
    pub fn new(pose: Option<HeadPose>, dt: f32, target: Option<&'a mut Transform>) -> Self {
        Self { pose, dt, target }
    }

    /// Tracking space to world space (identity without a target)
    pub fn tracking_space(&self) -> Transform {
        self.target.as_deref().copied().unwrap_or_default()
    }
}

/// Fields every redirector composes
#[derive(Debug, Clone)]
pub struct RedirectorBase {
    pub id: RedirectorId,
    pub name: String,
    /// Start play area; directions and pivots are given in its local space
    pub anchor: Transform,
    /// Play area width x depth (meters)
    pub play_area: Vec2,
    redirecting: bool,
    sampler: PoseSampler,
    session: SessionStats,
    events: Vec<RedirectionEvent>,
    warned_missing_target: bool,
}

impl RedirectorBase {
    pub fn new(id: RedirectorId, name: impl Into<String>, anchor: Transform) -> Self {
        Self {
            id,
            name: name.into(),
            anchor,
            play_area: Vec2::new(DEFAULT_PLAY_AREA_WIDTH, DEFAULT_PLAY_AREA_DEPTH),
            redirecting: false,
            sampler: PoseSampler::default(),
            session: SessionStats::default(),
            events: Vec::new(),
            warned_missing_target: false,
        }
    }

    pub fn with_play_area(mut self, play_area: Vec2) -> Self {
        self.play_area = play_area;
        self
    }

    #[inline]
    pub fn is_redirecting(&self) -> bool {
        self.redirecting
    }

    /// Metrics of the running (or last) session
    pub fn session(&self) -> SessionStats {
        self.session
    }

    /// Last head pose seen by this redirector
    pub fn last_pose(&self) -> Option<HeadPose> {
        self.sampler.last()
    }

    /// Mark the session active and queue `Started`
    pub fn begin_session(&mut self) {
        self.redirecting = true;
        self.session = SessionStats::default();
        self.warned_missing_target = false;
        log::debug!("{}: redirection started", self.name);
        self.push(RedirectionEventKind::Started);
    }

    /// Deactivate and queue `Ended`. No-op if no session is running.
    pub fn finish_session(&mut self) -> bool {
        if !self.redirecting {
            return false;
        }
        self.redirecting = false;
        log::debug!(
            "{}: redirection ended after {:.2}s",
            self.name,
            self.session.duration_secs
        );
        self.push(RedirectionEventKind::Ended(self.session));
        true
    }

    /// Deactivate and queue `Interrupted`. No-op if no session is running.
    pub fn interrupt_session(&mut self) -> bool {
        if !self.redirecting {
            return false;
        }
        self.redirecting = false;
        log::debug!("{}: redirection interrupted", self.name);
        self.push(RedirectionEventKind::Interrupted(self.session));
        true
    }

    /// Sample this frame's pose; accumulates session metrics while active
    pub fn advance(&mut self, frame: &RedirectionFrame<'_>) -> PoseDelta {
        let delta = self.sampler.advance(frame.pose);
        if self.redirecting {
            self.session.duration_secs += frame.dt.max(0.0);
            self.session.total_real_rotation_deg += delta.yaw().abs();
        }
        delta
    }

    /// Warn once per session that the redirection cannot be applied
    pub fn warn_missing_target(&mut self) {
        if !self.warned_missing_target {
            log::warn!(
                "{}: redirection object not set, redirection can not be applied",
                self.name
            );
            self.warned_missing_target = true;
        }
    }

    pub fn drain_events(&mut self) -> Vec<RedirectionEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn start_play_area(&self) -> PlayAreaPose {
        PlayAreaPose {
            position: self.anchor.position,
            rotation: self.anchor.rotation,
        }
    }

    fn push(&mut self, kind: RedirectionEventKind) {
        self.events.push(RedirectionEvent {
            redirector: self.id,
            name: self.name.clone(),
            kind,
        });
    }
}

/// Keep only the components of `delta` whose sign matches `direction` on the
/// same axis. Returns (aligned, opposed).
pub fn split_by_direction(delta: Vec3, direction: Vec3) -> (Vec3, Vec3) {
    let mut aligned = Vec3::ZERO;
    let mut opposed = Vec3::ZERO;
    for axis in 0..3 {
        let d = direction[axis];
        let m = delta[axis];
        if d.abs() <= crate::consts::AXIS_EPSILON || m == 0.0 {
            continue;
        }
        if d.signum() == m.signum() {
            aligned[axis] = m;
        } else {
            opposed[axis] = m;
        }
    }
    (aligned, opposed)
}
