//! Animated hand-off between a room's shown and hidden states
//!
//! The coordinator starts a transition and reports `TransitionStarted` so a
//! door animation or sound can play. The room only changes visibility once the
//! transition ends, either because the observer calls `end_transition` or
//! because the configured duration elapsed.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TransitionSettings {
    /// Finish automatically after this many seconds; `None` waits for an observer
    pub duration_secs: Option<f32>,
}

#[derive(Debug, Clone, Default)]
pub struct RoomTransitionController {
    settings: TransitionSettings,
    target_active: bool,
    in_progress: bool,
    elapsed: f32,
}

impl RoomTransitionController {
    pub fn new(settings: TransitionSettings) -> Self {
        Self {
            settings,
            ..Default::default()
        }
    }

    /// Transition that only ends when an observer says so
    pub fn manual() -> Self {
        Self::default()
    }

    pub fn timed(duration_secs: f32) -> Self {
        Self::new(TransitionSettings {
            duration_secs: Some(duration_secs.max(0.0)),
        })
    }

    /// State the room will have once the transition ends
    pub fn target_active(&self) -> bool {
        self.target_active
    }

    pub fn is_in_progress(&self) -> bool {
        self.in_progress
    }

    /// Start (or retarget) a transition
    pub fn begin_transition(&mut self, active: bool) {
        self.target_active = active;
        self.in_progress = true;
        self.elapsed = 0.0;
    }

    /// Finish the transition, returning the target state
    pub fn end_transition(&mut self) -> Option<bool> {
        if !self.in_progress {
            return None;
        }
        self.in_progress = false;
        Some(self.target_active)
    }

    /// Advance a timed transition; returns the target state when it finishes
    pub fn advance(&mut self, dt: f32) -> Option<bool> {
        let duration = self.settings.duration_secs?;
        if !self.in_progress {
            return None;
        }
        self.elapsed += dt;
        if self.elapsed >= duration {
            return self.end_transition();
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_manual_transition_waits_for_end() {
        let mut t = RoomTransitionController::manual();
        t.begin_transition(true);
        assert_eq!(t.advance(10.0), None);
        assert!(t.is_in_progress());
        assert_eq!(t.end_transition(), Some(true));
        assert_eq!(t.end_transition(), None);
    }

    #[test]
    fn test_timed_transition_finishes() {
        let mut t = RoomTransitionController::timed(0.5);
        t.begin_transition(false);
        assert_eq!(t.advance(0.3), None);
        assert_eq!(t.advance(0.3), Some(false));
        assert!(!t.is_in_progress());
    }

    #[test]
    fn test_retarget_uses_latest_state() {
        let mut t = RoomTransitionController::timed(1.0);
        t.begin_transition(true);
        t.advance(0.9);
        t.begin_transition(false);
        assert_eq!(t.advance(0.9), None);
        assert_eq!(t.advance(0.2), Some(false));
    }
}
