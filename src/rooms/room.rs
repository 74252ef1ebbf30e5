//! Overlapping room and the dynamic objects it carries

use std::collections::{BTreeSet, HashMap};

use serde::{Deserialize, Serialize};

use super::transition::{RoomTransitionController, TransitionSettings};
use super::trigger::CompoundTriggerCounter;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RoomId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ObjectId(pub u32);

/// Something that can overlap a room's areas
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Body {
    Player,
    Object(ObjectId),
}

/// The two concentric trigger volumes of a room
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RoomArea {
    /// Core area where the room is the only one shown
    Interior,
    /// Buffer ring (doorway) where overlapping rooms may be shown together
    Transition,
}

/// Room description used when building a coordinator
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RoomSettings {
    pub name: String,
    /// Show this room when the player first appears in its interior
    pub player_starts_in_room: bool,
    /// Animated hand-off; `None` toggles visibility instantly
    pub transition: Option<TransitionSettings>,
}

impl RoomSettings {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }
}

/// A movable object that is hidden together with the room it is in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DynamicObject {
    pub id: ObjectId,
    /// Kinematic objects (e.g. carried by the player) are never hidden
    pub kinematic: bool,
    pub active: bool,
}

#[derive(Debug, Clone)]
pub struct Room {
    pub id: RoomId,
    pub name: String,
    pub player_in_interior: bool,
    pub player_in_transition: bool,
    pub transition: Option<RoomTransitionController>,
    visible: bool,
    start_pending: bool,
    objects: BTreeSet<ObjectId>,
    pub(crate) interior: CompoundTriggerCounter<Body>,
    pub(crate) transition_area: CompoundTriggerCounter<Body>,
}

impl Room {
    pub fn new(id: RoomId, settings: &RoomSettings) -> Self {
        Self {
            id,
            name: settings.name.clone(),
            player_in_interior: false,
            player_in_transition: false,
            transition: settings.transition.map(RoomTransitionController::new),
            visible: true,
            start_pending: settings.player_starts_in_room,
            objects: BTreeSet::new(),
            interior: CompoundTriggerCounter::new(),
            transition_area: CompoundTriggerCounter::new(),
        }
    }

    /// Whether the room geometry is currently shown
    #[inline]
    pub fn is_visible(&self) -> bool {
        self.visible
    }

    /// Dynamic objects currently carried by this room
    pub fn objects(&self) -> impl Iterator<Item = ObjectId> + '_ {
        self.objects.iter().copied()
    }

    pub fn contains_object(&self, id: ObjectId) -> bool {
        self.objects.contains(&id)
    }

    pub(crate) fn adopt(&mut self, id: ObjectId) -> bool {
        self.objects.insert(id)
    }

    pub(crate) fn release(&mut self, id: ObjectId) -> bool {
        self.objects.remove(&id)
    }

    /// Consume the one-time "player starts here" flag
    pub(crate) fn take_start_pending(&mut self) -> bool {
        std::mem::take(&mut self.start_pending)
    }

    /// Show or hide the room and its non-kinematic objects right away.
    /// Returns true if visibility changed.
    pub(crate) fn apply_visibility(
        &mut self,
        active: bool,
        objects: &mut HashMap<ObjectId, DynamicObject>,
    ) -> bool {
        let changed = self.visible != active;
        self.visible = active;
        for id in &self.objects {
            if let Some(object) = objects.get_mut(id) {
                if !object.kinematic {
                    object.active = active;
                }
            }
        }
        changed
    }
}
