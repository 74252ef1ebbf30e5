//! Redirection gain state machines
//!
//! Each redirector tracks the progress of one redirection session and turns
//! the player's head motion into corrections of the redirection object:
//! - `TranslationRedirector`: walking along a direction moves the object
//! - `CurvatureRedirector`: walking straight rotates the object, bending the real path
//! - `BidirectionalCurvatureRedirector`: curvature that can be walked back and interrupted
//! - `RotationRedirector`: turning the head rotates the object around a pivot
//!
//! `update` must be called every frame, active or not, so the first frame of a
//! session measures motion from the previous frame's pose.

pub mod base;
pub mod curvature;
pub mod progress;
pub mod rotation;
pub mod translation;

pub use base::{
    PlayAreaPose, RedirectionEvent, RedirectionEventKind, RedirectionFrame, RedirectorBase,
    RedirectorId, SessionStats,
};
pub use curvature::{BidirectionalCurvatureRedirector, CurvatureParams, CurvatureRedirector};
pub use progress::AxisProgress;
pub use rotation::{RotationParams, RotationRedirector};
pub use translation::{TranslationParams, TranslationRedirector};

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RedirectorKind {
    Translation,
    Curvature,
    BidirectionalCurvature,
    Rotation,
}

impl RedirectorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            RedirectorKind::Translation => "Translation",
            RedirectorKind::Curvature => "Curvature",
            RedirectorKind::BidirectionalCurvature => "BidirectionalCurvature",
            RedirectorKind::Rotation => "Rotation",
        }
    }
}

/// Common interface of all redirector variants
pub trait Redirector {
    fn base(&self) -> &RedirectorBase;
    fn base_mut(&mut self) -> &mut RedirectorBase;
    fn kind(&self) -> RedirectorKind;

    /// Begin a session. Silently does nothing when there is nothing to redirect.
    fn start_redirection(&mut self);

    /// Stop the running session and queue `Ended`
    fn end_redirection(&mut self) {
        self.base_mut().finish_session();
    }

    /// Advance one frame
    fn update(&mut self, frame: &mut RedirectionFrame<'_>);

    /// Virtual pose of the play area once the session completes
    fn end_play_area(&self) -> PlayAreaPose;

    fn start_play_area(&self) -> PlayAreaPose {
        self.base().start_play_area()
    }

    fn id(&self) -> RedirectorId {
        self.base().id
    }

    fn name(&self) -> &str {
        &self.base().name
    }

    fn is_redirecting(&self) -> bool {
        self.base().is_redirecting()
    }

    fn drain_events(&mut self) -> Vec<RedirectionEvent> {
        self.base_mut().drain_events()
    }
}
