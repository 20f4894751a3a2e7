//! Resource registry.
//!
//! Static description of a hospital's operating capacity: rooms,
//! surgeons, and shared equipment with finite capacity. The registry
//! says nothing about which resources are reserved; that is decided by
//! a `ReservationPolicy` at partition time.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use super::{Room, Surgeon};

/// Rooms, surgeons and equipment of one operating theater.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResourceRegistry {
    /// Operating rooms, in preference order.
    pub rooms: Vec<Room>,
    /// Surgeons, in preference order.
    pub surgeons: Vec<Surgeon>,
    /// Shared equipment type → units available simultaneously.
    #[serde(default)]
    pub equipment: BTreeMap<String, u32>,
}

impl ResourceRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a room.
    pub fn with_room(mut self, room: Room) -> Self {
        self.rooms.push(room);
        self
    }

    /// Adds a surgeon.
    pub fn with_surgeon(mut self, surgeon: Surgeon) -> Self {
        self.surgeons.push(surgeon);
        self
    }

    /// Declares a shared equipment type.
    pub fn with_equipment(mut self, name: impl Into<String>, capacity: u32) -> Self {
        self.equipment.insert(name.into(), capacity);
        self
    }

    /// Looks up a room.
    pub fn room(&self, id: &str) -> Option<&Room> {
        self.rooms.iter().find(|r| r.id == id)
    }

    /// Looks up a surgeon.
    pub fn surgeon(&self, id: &str) -> Option<&Surgeon> {
        self.surgeons.iter().find(|s| s.id == id)
    }

    /// All specialties practiced by at least one surgeon.
    pub fn specialties(&self) -> BTreeSet<&str> {
        self.surgeons
            .iter()
            .flat_map(|s| s.specialties.iter().map(String::as_str))
            .collect()
    }
}
