//! Surgical cases and solver input.
//!
//! A `SurgicalCase` wraps an immutable `Patient` with the scheduling
//! state that changes during a session: delay adjustments, readiness,
//! and pins for surgeries that already started.

use std::collections::BTreeMap;

use crate::models::{Horizon, Minutes, Patient};

/// A surgery that already started and must keep its slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pin {
    pub start: Minutes,
    pub room_id: String,
    pub surgeon_id: String,
}

/// A patient plus session-level scheduling constraints.
#[derive(Debug, Clone, PartialEq)]
pub struct SurgicalCase {
    /// The patient record.
    pub patient: Patient,
    /// Minutes added to the predicted duration (overrun or early finish).
    pub extra_minutes: Minutes,
    /// Patient cannot start before this time.
    pub ready_at: Option<Minutes>,
    /// No start before this time (re-optimization floor).
    pub not_before: Option<Minutes>,
    /// Fixed slot for a surgery in progress.
    pub pin: Option<Pin>,
}

impl SurgicalCase {
    /// Creates an unconstrained case.
    pub fn new(patient: Patient) -> Self {
        Self {
            patient,
            extra_minutes: 0,
            ready_at: None,
            not_before: None,
            pin: None,
        }
    }

    /// Patient id.
    #[inline]
    pub fn id(&self) -> &str {
        &self.patient.id
    }

    /// Adds a duration adjustment.
    pub fn with_extra_minutes(mut self, minutes: Minutes) -> Self {
        self.extra_minutes = self.extra_minutes.saturating_add(minutes);
        self
    }

    /// Sets the ready time.
    pub fn with_ready_at(mut self, ready_at: Minutes) -> Self {
        self.ready_at = Some(ready_at);
        self
    }

    /// Sets the start floor.
    pub fn with_not_before(mut self, not_before: Minutes) -> Self {
        self.not_before = Some(not_before);
        self
    }

    /// Pins the case to a slot.
    pub fn pinned(mut self, start: Minutes, room_id: impl Into<String>, surgeon_id: impl Into<String>) -> Self {
        self.pin = Some(Pin {
            start,
            room_id: room_id.into(),
            surgeon_id: surgeon_id.into(),
        });
        self
    }

    /// Earliest permitted start, ignoring resource availability.
    pub fn earliest_start(&self) -> Minutes {
        let mut t = self.patient.arrival;
        if let Some(ready) = self.ready_at {
            t = t.max(ready);
        }
        if let Some(floor) = self.not_before {
            t = t.max(floor);
        }
        t
    }

    /// Surgery length given the predicted duration. Never below one minute.
    pub fn duration(&self, predicted: Minutes) -> Minutes {
        predicted.saturating_add(self.extra_minutes).max(1)
    }
}

/// Resources that are unavailable until a given time.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResourceHolds {
    /// Room id → available from.
    pub rooms: BTreeMap<String, Minutes>,
    /// Surgeon id → available from.
    pub surgeons: BTreeMap<String, Minutes>,
}

impl ResourceHolds {
    /// Creates an empty set of holds.
    pub fn new() -> Self {
        Self::default()
    }

    /// Holds a room until `until`. Keeps the later of two holds.
    pub fn hold_room(&mut self, room_id: impl Into<String>, until: Minutes) {
        let entry = self.rooms.entry(room_id.into()).or_insert(until);
        *entry = (*entry).max(until);
    }

    /// Holds a surgeon until `until`. Keeps the later of two holds.
    pub fn hold_surgeon(&mut self, surgeon_id: impl Into<String>, until: Minutes) {
        let entry = self.surgeons.entry(surgeon_id.into()).or_insert(until);
        *entry = (*entry).max(until);
    }

    /// Time from which a room is usable.
    pub fn room_free_from(&self, room_id: &str) -> Minutes {
        self.rooms.get(room_id).copied().unwrap_or(Minutes::MIN)
    }

    /// Time from which a surgeon is usable.
    pub fn surgeon_free_from(&self, surgeon_id: &str) -> Minutes {
        self.surgeons.get(surgeon_id).copied().unwrap_or(Minutes::MIN)
    }
}

/// Input container for a solver run.
#[derive(Debug, Clone)]
pub struct SolveRequest {
    /// Cases to schedule.
    pub cases: Vec<SurgicalCase>,
    /// Planning horizon.
    pub horizon: Horizon,
    /// Temporary resource unavailability.
    pub holds: ResourceHolds,
    /// Time the request is made; dispatching rules see it as the current
    /// time. Defaults to the horizon start.
    pub now: Option<Minutes>,
}

impl SolveRequest {
    /// Creates a request with no holds.
    pub fn new(cases: Vec<SurgicalCase>, horizon: Horizon) -> Self {
        Self {
            cases,
            horizon,
            holds: ResourceHolds::new(),
            now: None,
        }
    }

    /// Creates a request from plain patients.
    pub fn from_patients(patients: Vec<Patient>, horizon: Horizon) -> Self {
        Self::new(patients.into_iter().map(SurgicalCase::new).collect(), horizon)
    }

    /// Sets resource holds.
    pub fn with_holds(mut self, holds: ResourceHolds) -> Self {
        self.holds = holds;
        self
    }

    /// Sets the time the request is made.
    pub fn at(mut self, now: Minutes) -> Self {
        self.now = Some(now);
        self
    }

    /// Current time for dispatching.
    pub fn current_time(&self) -> Minutes {
        self.now.unwrap_or(self.horizon.start)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_earliest_start_takes_latest_floor() {
        let case = SurgicalCase::new(Patient::new("P1", "General").with_arrival(500));
        assert_eq!(case.earliest_start(), 500);

        let case = case.with_ready_at(540).with_not_before(520);
        assert_eq!(case.earliest_start(), 540);

        let case = case.with_not_before(600);
        assert_eq!(case.earliest_start(), 600);
    }

    #[test]
    fn test_duration_adjustment() {
        let case = SurgicalCase::new(Patient::new("P1", "General"))
            .with_extra_minutes(30)
            .with_extra_minutes(15);
        assert_eq!(case.duration(90), 135);

        let shortened = SurgicalCase::new(Patient::new("P2", "General")).with_extra_minutes(-200);
        assert_eq!(shortened.duration(90), 1);
    }

    #[test]
    fn test_holds_keep_later_time() {
        let mut holds = ResourceHolds::new();
        holds.hold_room("OR-1", 600);
        holds.hold_room("OR-1", 540);
        holds.hold_surgeon("Dr. Yang", 700);
        assert_eq!(holds.room_free_from("OR-1"), 600);
        assert_eq!(holds.surgeon_free_from("Dr. Yang"), 700);
        assert_eq!(holds.room_free_from("OR-2"), Minutes::MIN);
    }
}
