//! Frame-driven world simulation
//!
//! The host calls `tick` once per rendered frame with the head pose and the
//! trigger events its physics step produced. All state changes happen here:
//! - Room occupancy first, so rooms are settled before redirection
//! - Redirector start/stop commands
//! - Per-frame redirector updates against the redirection object
//! - Lifecycle events routed to the usage log

pub mod state;
pub mod tick;

pub use state::{World, WorldEvent};
pub use tick::{RoomCommand, TickInput, tick};
