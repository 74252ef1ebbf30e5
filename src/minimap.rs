//! Minimap player pin
//!
//! The minimap is a scaled copy of the rooms. A copy can be moved, rotated or
//! scaled in the map (to pull overlapping rooms apart), so the player's
//! position is remapped through the difference between the room and its copy.

use std::collections::HashMap;

use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};

use crate::rooms::{RoomCoordinator, RoomId};
use crate::transform::Transform;

/// Position/rotation/scale difference between a room and its minimap copy
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MinimapOffset {
    pub position: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
}

impl Default for MinimapOffset {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            scale: Vec3::ONE,
        }
    }
}

impl MinimapOffset {
    /// Offset that turns `original` into `changed`
    pub fn diff(original: &Transform, changed: &Transform) -> Self {
        Self {
            position: changed.position - original.position,
            rotation: original.rotation.inverse() * changed.rotation,
            scale: changed.scale * original.scale.recip(),
        }
    }

    /// Apply the offset to a copy of the room
    pub fn apply(&self, other: &mut Transform) {
        other.position += self.position;
        other.rotation = (other.rotation * self.rotation).normalize();
        other.scale *= self.scale;
    }

    /// Map a player position inside a room at `room_position` onto the copy
    pub fn transform_room_position(&self, player: Vec3, room_position: Vec3) -> Vec3 {
        let minimap_room = room_position + self.position;
        let local = player - room_position;
        minimap_room + self.rotation * (local * self.scale)
    }
}

/// A room's placement and the edits made to its minimap copy
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MinimapRoom {
    pub original: Transform,
    pub offset: MinimapOffset,
}

impl MinimapRoom {
    pub fn new(original: Transform) -> Self {
        Self {
            original,
            offset: MinimapOffset::default(),
        }
    }

    /// The copy was edited in the map
    pub fn copy_changed(&mut self, copy: &Transform) {
        self.offset = MinimapOffset::diff(&self.original, copy);
    }
}

/// Where to draw the player pin
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MinimapPin {
    /// Pin position on the map floor (y = 0)
    pub position: Vec3,
    /// Vertical offset of the map meshes so they center on the player
    pub container_height: f32,
}

#[derive(Debug, Clone, Default)]
pub struct Minimap {
    rooms: HashMap<RoomId, MinimapRoom>,
}

impl Minimap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, room: RoomId, minimap_room: MinimapRoom) {
        self.rooms.insert(room, minimap_room);
    }

    pub fn room_mut(&mut self, room: RoomId) -> Option<&mut MinimapRoom> {
        self.rooms.get_mut(&room)
    }

    pub fn is_empty(&self) -> bool {
        self.rooms.is_empty()
    }

    /// Remap the head position through every shown room the player stands in
    pub fn player_pin(&self, head: Vec3, rooms: &RoomCoordinator) -> MinimapPin {
        let mut position = head;
        for room in rooms.rooms() {
            if !room.player_in_interior || !room.is_visible() {
                continue;
            }
            if let Some(minimap_room) = self.rooms.get(&room.id) {
                position = minimap_room
                    .offset
                    .transform_room_position(position, minimap_room.original.position);
            }
        }

        MinimapPin {
            position: Vec3::new(position.x, 0.0, position.z),
            container_height: -position.y,
        }
    }
}
