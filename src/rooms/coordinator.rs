//! Which overlapping room the player perceives
//!
//! Rooms share physical space, so only the room whose interior the player is
//! in may be shown. In a doorway (transition area) every room reachable from
//! there is shown. At no point may all rooms be hidden once one was shown.

use std::collections::{BTreeSet, HashMap};

use serde::{Deserialize, Serialize};

use super::room::{Body, DynamicObject, ObjectId, Room, RoomArea, RoomId, RoomSettings};
use super::trigger::TriggerPhase;

/// Raw sub-collider event delivered by the physics step
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TriggerEvent {
    pub room: RoomId,
    pub area: RoomArea,
    pub body: Body,
    pub phase: TriggerPhase,
}

impl TriggerEvent {
    pub fn player(room: RoomId, area: RoomArea, phase: TriggerPhase) -> Self {
        Self {
            room,
            area,
            body: Body::Player,
            phase,
        }
    }

    pub fn object(room: RoomId, area: RoomArea, id: ObjectId, phase: TriggerPhase) -> Self {
        Self {
            room,
            area,
            body: Body::Object(id),
            phase,
        }
    }

    fn same_source(&self, other: &TriggerEvent) -> bool {
        self.room == other.room && self.area == other.area && self.body == other.body
    }
}

/// Notifications for observers (doors, audio, minimap)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RoomEvent {
    /// The player now perceives `room`; `previous` is the last room perceived
    EnteredRoom {
        room: RoomId,
        previous: Option<RoomId>,
    },
    /// The player left the perceived room into a doorway
    LeftRoom { room: RoomId },
    VisibilityChanged { room: RoomId, visible: bool },
    /// An animated hand-off began; call `end_transition` when it finishes
    TransitionStarted { room: RoomId, active: bool },
}

/// Player membership in room areas
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlayerRoomState {
    pub current_room: Option<RoomId>,
    pub rooms_in_transition: BTreeSet<RoomId>,
    pub rooms_in_interior: BTreeSet<RoomId>,
    pub active_rooms: BTreeSet<RoomId>,
    /// Last room the player perceived, survives doorway visits
    pub last_room: Option<RoomId>,
}

#[derive(Debug, Clone, Default)]
pub struct RoomCoordinator {
    rooms: Vec<Room>,
    player: PlayerRoomState,
    objects: HashMap<ObjectId, DynamicObject>,
    owners: HashMap<ObjectId, RoomId>,
    pending: Vec<TriggerEvent>,
    events: Vec<RoomEvent>,
}

impl RoomCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a room; rooms start hidden
    pub fn add_room(&mut self, settings: &RoomSettings) -> RoomId {
        let id = RoomId(self.rooms.len() as u32);
        self.rooms.push(Room::new(id, settings));
        self.set_room_active_instantly(id, false);
        log::debug!("Registered room {} as {id:?}", settings.name);
        id
    }

    /// Register a dynamic object that rooms may carry
    pub fn add_object(&mut self, id: ObjectId, kinematic: bool) {
        self.objects.insert(
            id,
            DynamicObject {
                id,
                kinematic,
                active: true,
            },
        );
    }

    pub fn room(&self, id: RoomId) -> Option<&Room> {
        self.rooms.get(id.0 as usize)
    }

    pub fn room_by_name(&self, name: &str) -> Option<RoomId> {
        self.rooms.iter().find(|r| r.name == name).map(|r| r.id)
    }

    pub fn rooms(&self) -> &[Room] {
        &self.rooms
    }

    pub fn object(&self, id: ObjectId) -> Option<&DynamicObject> {
        self.objects.get(&id)
    }

    /// Room currently carrying an object
    pub fn owner_of(&self, id: ObjectId) -> Option<RoomId> {
        self.owners.get(&id).copied()
    }

    pub fn player(&self) -> &PlayerRoomState {
        &self.player
    }

    pub fn current_room(&self) -> Option<RoomId> {
        self.player.current_room
    }

    pub fn active_rooms(&self) -> &BTreeSet<RoomId> {
        &self.player.active_rooms
    }

    pub fn is_visible(&self, id: RoomId) -> bool {
        self.room(id).is_some_and(Room::is_visible)
    }

    pub fn drain_events(&mut self) -> Vec<RoomEvent> {
        std::mem::take(&mut self.events)
    }

    // === Trigger intake ===

    /// Queue a raw event for this tick
    pub fn enqueue(&mut self, event: TriggerEvent) {
        self.pending.push(event);
    }

    /// Deliver this tick's queued events in order.
    ///
    /// An exit directly followed by an enter from the same source within the
    /// tick cancels out.
    pub fn flush_triggers(&mut self) {
        let mut queued: Vec<Option<TriggerEvent>> = Vec::with_capacity(self.pending.len());
        for event in self.pending.drain(..) {
            if event.phase == TriggerPhase::Enter {
                let open_exit = queued.iter().rposition(|q| {
                    q.is_some_and(|q| q.same_source(&event))
                });
                if let Some(index) = open_exit {
                    if queued[index].is_some_and(|q| q.phase == TriggerPhase::Exit) {
                        queued[index] = None;
                        continue;
                    }
                }
            }
            queued.push(Some(event));
        }

        for event in queued.into_iter().flatten() {
            self.handle_trigger(event);
        }
    }

    /// Feed one raw sub-collider event through the room's counters
    pub fn handle_trigger(&mut self, event: TriggerEvent) {
        let Some(room) = self.rooms.get_mut(event.room.0 as usize) else {
            log::warn!("Trigger event for unknown room {:?}", event.room);
            return;
        };
        let counter = match event.area {
            RoomArea::Interior => &mut room.interior,
            RoomArea::Transition => &mut room.transition_area,
        };
        let Some(phase) = counter.apply(event.body, event.phase) else {
            return;
        };

        match (event.body, event.area, phase) {
            (Body::Player, RoomArea::Interior, TriggerPhase::Enter) => {
                self.rooms[event.room.0 as usize].player_in_interior = true;
                self.on_player_enter_interior(event.room);
                self.simulate_start_in_room(event.room);
            }
            (Body::Player, RoomArea::Interior, TriggerPhase::Exit) => {
                self.rooms[event.room.0 as usize].player_in_interior = false;
                self.on_player_exit_interior(event.room);
            }
            (Body::Player, RoomArea::Transition, TriggerPhase::Enter) => {
                self.rooms[event.room.0 as usize].player_in_transition = true;
                self.on_player_enter_transition(event.room);
            }
            (Body::Player, RoomArea::Transition, TriggerPhase::Exit) => {
                self.rooms[event.room.0 as usize].player_in_transition = false;
                self.on_player_exit_transition(event.room);
            }
            (Body::Object(id), RoomArea::Interior, TriggerPhase::Enter) => {
                self.on_object_enter_interior(event.room, id);
            }
            (Body::Object(id), RoomArea::Interior, TriggerPhase::Exit) => {
                self.on_object_exit_interior(event.room, id);
            }
            (Body::Object(_), RoomArea::Transition, _) => {}
        }
    }

    /// First appearance in a start room acts like walking in through its doorway
    fn simulate_start_in_room(&mut self, id: RoomId) {
        if !self.rooms[id.0 as usize].take_start_pending() {
            return;
        }
        log::debug!("Player starts in {id:?}");
        let room = &mut self.rooms[id.0 as usize];
        room.player_in_transition = true;
        self.on_player_enter_transition(id);
        self.on_player_enter_interior(id);
        self.rooms[id.0 as usize].player_in_transition = false;
        self.on_player_exit_transition(id);
    }

    // === Player state machine ===

    pub fn on_player_enter_interior(&mut self, id: RoomId) {
        self.player.rooms_in_interior.insert(id);

        // Hidden rooms can't be entered, re-entering the current room changes nothing
        if !self.is_visible(id) || self.player.current_room == Some(id) {
            return;
        }

        // Entering through overlapping doorways shows several rooms; hide the
        // one we came from so only the entered room stays visible
        if let Some(previous) = self.player.current_room {
            if self.is_visible(previous) {
                self.set_room_active(previous, false, false);
            }
        }

        self.player.current_room = Some(id);
        self.events.push(RoomEvent::EnteredRoom {
            room: id,
            previous: self.player.last_room,
        });
        self.player.last_room = Some(id);
    }

    pub fn on_player_exit_interior(&mut self, id: RoomId) {
        self.player.rooms_in_interior.remove(&id);

        // Leaving some other room, or peeking through a wall rather than
        // walking out through the doorway: the current room stays
        let in_doorway = self.room(id).is_some_and(|r| r.player_in_transition);
        if self.player.current_room != Some(id) || !in_doorway {
            return;
        }

        self.player.current_room = None;
        self.events.push(RoomEvent::LeftRoom { room: id });

        // Rooms whose doorway we share could not be shown while inside
        let hidden: Vec<RoomId> = self
            .player
            .rooms_in_transition
            .iter()
            .copied()
            .filter(|&r| !self.is_visible(r))
            .collect();
        for room in hidden {
            self.set_room_active(room, true, false);
        }
    }

    pub fn on_player_enter_transition(&mut self, id: RoomId) {
        self.player.rooms_in_transition.insert(id);

        if self.player.current_room.is_some() {
            return;
        }

        // Rooms still shown from earlier but no longer around the player
        let stale: Vec<RoomId> = self
            .player
            .active_rooms
            .iter()
            .copied()
            .filter(|r| {
                !self.player.rooms_in_transition.contains(r)
                    && !self.player.rooms_in_interior.contains(r)
            })
            .collect();
        for room in stale {
            self.set_room_active(room, false, true);
        }

        self.set_room_active(id, true, false);
    }

    pub fn on_player_exit_transition(&mut self, id: RoomId) {
        self.player.rooms_in_transition.remove(&id);

        let in_this_interior = self.room(id).is_some_and(|r| r.player_in_interior);
        if !in_this_interior && self.player.rooms_in_interior.is_empty() {
            self.set_room_active(id, false, false);
        }
    }

    // === Dynamic objects ===

    fn on_object_enter_interior(&mut self, room: RoomId, id: ObjectId) {
        if !self.objects.contains_key(&id) || !self.is_visible(room) {
            return;
        }
        if let Some(owner) = self.owners.get(&id) {
            if *owner != room {
                return;
            }
        }
        self.owners.insert(id, room);
        self.rooms[room.0 as usize].adopt(id);
    }

    fn on_object_exit_interior(&mut self, room: RoomId, id: ObjectId) {
        if self.owners.get(&id) != Some(&room) || !self.is_visible(room) {
            return;
        }
        self.owners.remove(&id);
        self.rooms[room.0 as usize].release(id);
    }

    // === Activation ===

    /// Show or hide a room, through its transition controller if it has one.
    ///
    /// Hiding the last shown room is refused unless `will_activate_another`.
    /// Returns false if the request was refused.
    pub fn set_room_active(&mut self, id: RoomId, active: bool, will_activate_another: bool) -> bool {
        if self.room(id).is_none() {
            log::warn!("Activation request for unknown room {id:?}");
            return false;
        }
        if !active && self.player.active_rooms.len() <= 1 && !will_activate_another {
            log::debug!("Keeping {id:?} shown, it is the last visible room");
            return false;
        }

        if active {
            self.player.active_rooms.insert(id);
        } else {
            self.player.active_rooms.remove(&id);
        }

        let room = &mut self.rooms[id.0 as usize];
        if let Some(transition) = room.transition.as_mut() {
            transition.begin_transition(active);
            self.events.push(RoomEvent::TransitionStarted { room: id, active });
            return true;
        }

        self.set_room_active_instantly(id, active);
        true
    }

    /// Show or hide a room right away, bypassing its transition
    pub fn set_room_active_instantly(&mut self, id: RoomId, active: bool) {
        let Some(room) = self.rooms.get_mut(id.0 as usize) else {
            log::warn!("Activation request for unknown room {id:?}");
            return;
        };
        if room.apply_visibility(active, &mut self.objects) {
            log::debug!("Room {} {}", room.name, if active { "shown" } else { "hidden" });
            self.events.push(RoomEvent::VisibilityChanged {
                room: id,
                visible: active,
            });
        }
    }

    /// Observer finished the room's transition animation
    pub fn end_transition(&mut self, id: RoomId) {
        let target = self
            .rooms
            .get_mut(id.0 as usize)
            .and_then(|r| r.transition.as_mut())
            .and_then(|t| t.end_transition());
        match target {
            Some(active) => self.set_room_active_instantly(id, active),
            None => log::debug!("No transition in progress for {id:?}"),
        }
    }

    /// Advance timed transitions
    pub fn advance_transitions(&mut self, dt: f32) {
        let finished: Vec<(RoomId, bool)> = self
            .rooms
            .iter_mut()
            .filter_map(|room| {
                let active = room.transition.as_mut()?.advance(dt)?;
                Some((room.id, active))
            })
            .collect();
        for (id, active) in finished {
            self.set_room_active_instantly(id, active);
        }
    }
}
