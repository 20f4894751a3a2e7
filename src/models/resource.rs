//! Resource model.
//!
//! Rooms and surgeons are the two disjunctive resources of an operating
//! theater: each can host at most one surgery at a time. Both are
//! immutable identities; their occupancy lives in the schedule store
//! and in solver timelines, never on the resource itself.

use serde::{Deserialize, Serialize};

/// Room capability tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RoomKind {
    /// Regular operating room.
    #[default]
    Standard,
    /// Trauma bay kept free for emergencies.
    ReservedEmergency,
}

/// An operating room.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Room {
    /// Unique room identifier (e.g. "OR-1").
    pub id: String,
    /// Human-readable name.
    #[serde(default)]
    pub name: String,
    /// Capability tag.
    #[serde(default)]
    pub kind: RoomKind,
    /// Specialties this room is equipped for. Empty = all.
    #[serde(default)]
    pub supported_specialties: Vec<String>,
}

/// A surgeon.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Surgeon {
    /// Unique surgeon identifier (e.g. "Dr. Burke").
    pub id: String,
    /// Specialties practiced.
    pub specialties: Vec<String>,
    /// Whether this surgeon is held on call for emergencies.
    #[serde(default)]
    pub is_reserve: bool,
}

impl Room {
    /// Creates a standard room supporting all specialties.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: String::new(),
            kind: RoomKind::Standard,
            supported_specialties: Vec::new(),
        }
    }

    /// Creates a room tagged for emergency use.
    pub fn emergency(id: impl Into<String>) -> Self {
        Self::new(id).with_kind(RoomKind::ReservedEmergency)
    }

    /// Sets the room name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Sets the capability tag.
    pub fn with_kind(mut self, kind: RoomKind) -> Self {
        self.kind = kind;
        self
    }

    /// Adds a supported specialty.
    pub fn with_specialty(mut self, specialty: impl Into<String>) -> Self {
        self.supported_specialties.push(specialty.into());
        self
    }

    /// Whether a patient of `specialty` may be operated here.
    pub fn supports(&self, specialty: &str) -> bool {
        self.supported_specialties.is_empty()
            || self.supported_specialties.iter().any(|s| s == specialty)
    }
}

impl Surgeon {
    /// Creates a regular surgeon with one specialty.
    pub fn new(id: impl Into<String>, specialty: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            specialties: vec![specialty.into()],
            is_reserve: false,
        }
    }

    /// Adds a specialty.
    pub fn with_specialty(mut self, specialty: impl Into<String>) -> Self {
        self.specialties.push(specialty.into());
        self
    }

    /// Sets the reservation flag.
    pub fn reserve(mut self, is_reserve: bool) -> Self {
        self.is_reserve = is_reserve;
        self
    }

    /// Whether this surgeon practices `specialty`.
    pub fn practices(&self, specialty: &str) -> bool {
        self.specialties.iter().any(|s| s == specialty)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_room_builder() {
        let r = Room::new("OR-3")
            .with_name("OR-3 (Cardio)")
            .with_specialty("Cardiovascular")
            .with_specialty("Thoracic");

        assert_eq!(r.id, "OR-3");
        assert_eq!(r.kind, RoomKind::Standard);
        assert!(r.supports("Thoracic"));
        assert!(!r.supports("Neurological"));
    }

    #[test]
    fn test_room_without_specialties_supports_all() {
        let r = Room::emergency("OR-11");
        assert_eq!(r.kind, RoomKind::ReservedEmergency);
        assert!(r.supports("Neurological"));
        assert!(r.supports("anything"));
    }

    #[test]
    fn test_surgeon_specialties() {
        let s = Surgeon::new("Dr. House", "General").with_specialty("Orthopedic");
        assert!(s.practices("General"));
        assert!(s.practices("Orthopedic"));
        assert!(!s.practices("Cardiovascular"));
        assert!(!s.is_reserve);
        assert!(s.reserve(true).is_reserve);
    }

    #[test]
    fn test_room_kind_serde_tag() {
        let json = serde_json::to_string(&RoomKind::ReservedEmergency).unwrap();
        assert_eq!(json, "\"reserved-emergency\"");
    }
}
