//! World state: the redirection object, its redirectors and the rooms

use std::sync::Arc;

use glam::Vec3;

use crate::config::RigConfig;
use crate::error::Result;
use crate::minimap::{Minimap, MinimapPin, MinimapRoom};
use crate::redirect::{RedirectionEvent, Redirector, RedirectorId};
use crate::rooms::{RoomCoordinator, RoomEvent};
use crate::transform::Transform;
use crate::usage_log::{LoggerSlot, UsageLogger};

/// Everything that happened during a tick, in processing order
#[derive(Debug, Clone, PartialEq)]
pub enum WorldEvent {
    Room(RoomEvent),
    Redirection(RedirectionEvent),
}

pub struct World {
    /// Transform aligning tracking space with the virtual world
    pub redirection_object: Option<Transform>,
    pub rooms: RoomCoordinator,
    pub minimap: Minimap,
    pub logger: LoggerSlot,
    /// Simulation tick counter
    pub time_ticks: u64,
    redirectors: Vec<Box<dyn Redirector>>,
    events: Vec<WorldEvent>,
}

impl Default for World {
    fn default() -> Self {
        Self::new(Some(Transform::IDENTITY))
    }
}

impl World {
    pub fn new(redirection_object: Option<Transform>) -> Self {
        Self {
            redirection_object,
            rooms: RoomCoordinator::new(),
            minimap: Minimap::new(),
            logger: LoggerSlot::new(),
            time_ticks: 0,
            redirectors: Vec::new(),
            events: Vec::new(),
        }
    }

    /// Build a world from a rig description, opening the usage log if enabled
    pub fn from_config(config: &RigConfig) -> Result<Self> {
        config.validate()?;

        let mut world = Self::new(config.redirection_object);
        for redirector in config.build_redirectors() {
            world.add_redirector(redirector);
        }
        for room in &config.rooms {
            world.rooms.add_room(room);
        }
        for copy in &config.minimap {
            if let Some(id) = world.rooms.room_by_name(&copy.room) {
                let mut minimap_room = MinimapRoom::new(copy.original);
                minimap_room.copy_changed(&copy.copy);
                world.minimap.insert(id, minimap_room);
            }
        }

        if config.logging.enabled {
            let logger = UsageLogger::open(&config.logging.directory)?;
            world.logger.install(Arc::new(logger))?;
        }

        log::info!(
            "World ready: {} redirectors, {} rooms",
            world.redirectors.len(),
            world.rooms.rooms().len()
        );
        Ok(world)
    }

    pub fn add_redirector(&mut self, redirector: Box<dyn Redirector>) -> RedirectorId {
        let id = redirector.id();
        if self.redirector(id).is_some() {
            log::warn!("Redirector id {id:?} registered twice");
        }
        self.redirectors.push(redirector);
        id
    }

    pub fn redirector(&self, id: RedirectorId) -> Option<&dyn Redirector> {
        self.redirectors
            .iter()
            .find(|r| r.id() == id)
            .map(|r| r.as_ref())
    }

    pub fn redirector_mut(&mut self, id: RedirectorId) -> Option<&mut (dyn Redirector + 'static)> {
        for redirector in self.redirectors.iter_mut() {
            if redirector.id() == id {
                return Some(redirector.as_mut());
            }
        }
        None
    }

    pub fn redirector_by_name(&self, name: &str) -> Option<RedirectorId> {
        self.redirectors
            .iter()
            .find(|r| r.name() == name)
            .map(|r| r.id())
    }

    pub fn redirectors(&self) -> impl Iterator<Item = &dyn Redirector> + '_ {
        self.redirectors.iter().map(|r| r.as_ref())
    }

    pub(crate) fn redirectors_mut(&mut self) -> &mut [Box<dyn Redirector>] {
        &mut self.redirectors
    }

    pub(crate) fn push_event(&mut self, event: WorldEvent) {
        self.events.push(event);
    }

    /// Events since the last drain
    pub fn drain_events(&mut self) -> Vec<WorldEvent> {
        std::mem::take(&mut self.events)
    }

    /// Where to draw the player on the minimap
    pub fn player_pin(&self, head: Vec3) -> MinimapPin {
        self.minimap.player_pin(head, &self.rooms)
    }
}
