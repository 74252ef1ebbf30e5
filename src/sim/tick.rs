//! Frame tick
//!
//! Room triggers are handled before redirectors move the redirection object,
//! so a frame never redirects in a room the player already left.

use serde::{Deserialize, Serialize};

use super::state::{World, WorldEvent};
use crate::pose::HeadPose;
use crate::redirect::{RedirectionEventKind, RedirectionFrame, RedirectorId};
use crate::rooms::{RoomId, TriggerEvent};

/// Host request to change a room's visibility
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RoomCommand {
    SetActive { room: RoomId, active: bool },
    SetActiveInstantly { room: RoomId, active: bool },
}

/// Input for a single frame
#[derive(Debug, Clone, Default)]
pub struct TickInput {
    /// Head pose from tracking; `None` reuses the last pose
    pub head_pose: Option<HeadPose>,
    /// Trigger volume events from the physics step, in arrival order
    pub triggers: Vec<TriggerEvent>,
    pub room_commands: Vec<RoomCommand>,
    /// Rooms whose transition animation finished this frame
    pub transitions_finished: Vec<RoomId>,
    /// Redirectors to start
    pub start: Vec<RedirectorId>,
    /// Redirectors to stop
    pub stop: Vec<RedirectorId>,
}

/// Advance the world by one frame
pub fn tick(world: &mut World, input: &TickInput, dt: f32) {
    // Rooms
    for &trigger in &input.triggers {
        world.rooms.enqueue(trigger);
    }
    world.rooms.flush_triggers();

    for command in &input.room_commands {
        match *command {
            RoomCommand::SetActive { room, active } => {
                world.rooms.set_room_active(room, active, false);
            }
            RoomCommand::SetActiveInstantly { room, active } => {
                world.rooms.set_room_active_instantly(room, active);
            }
        }
    }
    for &room in &input.transitions_finished {
        world.rooms.end_transition(room);
    }
    world.rooms.advance_transitions(dt);

    // Redirection commands
    for &id in &input.start {
        match world.redirector_mut(id) {
            Some(redirector) => redirector.start_redirection(),
            None => log::warn!("Start requested for unknown redirector {id:?}"),
        }
    }
    for &id in &input.stop {
        match world.redirector_mut(id) {
            Some(redirector) => redirector.end_redirection(),
            None => log::warn!("Stop requested for unknown redirector {id:?}"),
        }
    }

    // Redirectors see every frame, active or not
    let mut target = world.redirection_object;
    for redirector in world.redirectors_mut() {
        let mut frame = RedirectionFrame::new(input.head_pose, dt, target.as_mut());
        redirector.update(&mut frame);
    }
    world.redirection_object = target;

    // Route events
    for event in world.rooms.drain_events() {
        world.push_event(WorldEvent::Room(event));
    }
    let mut redirection_events = Vec::new();
    for redirector in world.redirectors_mut() {
        redirection_events.extend(redirector.drain_events());
    }
    for event in redirection_events {
        if let RedirectionEventKind::Ended(stats) = &event.kind {
            world.logger.log_session(&event.name, stats);
        }
        world.push_event(WorldEvent::Redirection(event));
    }

    world.time_ticks += 1;
}
