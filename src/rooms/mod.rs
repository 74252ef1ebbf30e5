//! Overlapping rooms sharing one physical play area
//!
//! - `trigger`: enter/exit deduplication for compound trigger volumes
//! - `room`: a room, its areas and the dynamic objects it carries
//! - `transition`: optional animated visibility hand-off
//! - `coordinator`: decides which room the player perceives

pub mod coordinator;
pub mod room;
pub mod transition;
pub mod trigger;

pub use coordinator::{PlayerRoomState, RoomCoordinator, RoomEvent, TriggerEvent};
pub use room::{Body, DynamicObject, ObjectId, Room, RoomArea, RoomId, RoomSettings};
pub use transition::{RoomTransitionController, TransitionSettings};
pub use trigger::{CompoundTriggerCounter, TriggerPhase};
