//! Schedule (solution) model.
//!
//! A schedule is the ordered set of patient → room × surgeon × time
//! assignments consumed by presentation. Regular assignments come from
//! the optimizing scheduler; emergency assignments are appended by the
//! admission path.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::{Minutes, TimeWindow};

/// Which path produced an assignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssignmentSource {
    /// Produced by the optimizing scheduler over the regular pool.
    Regular,
    /// Produced by emergency admission into the reserve pool.
    Emergency,
}

/// A patient-room-surgeon-time assignment.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Assignment {
    /// Assigned patient ID.
    pub patient_id: String,
    /// Assigned room ID.
    pub room_id: String,
    /// Assigned surgeon ID.
    pub surgeon_id: String,
    /// Patient specialty (denormalized for query convenience).
    pub specialty: String,
    /// Surgery start.
    pub start: Minutes,
    /// Surgery length (minutes).
    pub duration: Minutes,
    /// Producing path.
    pub source: AssignmentSource,
}

/// A detected breach of the schedule invariants.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Violation {
    /// Type of violation.
    pub violation_type: ViolationType,
    /// Related entity ID (room, surgeon, or patient).
    pub entity_id: String,
    /// Human-readable description.
    pub message: String,
}

/// Classification of schedule violations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ViolationType {
    /// Two surgeries overlap in the same room.
    RoomOverlap,
    /// Two surgeries overlap for the same surgeon.
    SurgeonOverlap,
    /// A patient appears in more than one assignment.
    DuplicatePatient,
}

impl Assignment {
    /// Creates a regular assignment.
    pub fn regular(
        patient_id: impl Into<String>,
        room_id: impl Into<String>,
        surgeon_id: impl Into<String>,
        start: Minutes,
        duration: Minutes,
    ) -> Self {
        Self {
            patient_id: patient_id.into(),
            room_id: room_id.into(),
            surgeon_id: surgeon_id.into(),
            specialty: String::new(),
            start,
            duration,
            source: AssignmentSource::Regular,
        }
    }

    /// Creates an emergency assignment.
    pub fn emergency(
        patient_id: impl Into<String>,
        room_id: impl Into<String>,
        surgeon_id: impl Into<String>,
        start: Minutes,
        duration: Minutes,
    ) -> Self {
        Self {
            source: AssignmentSource::Emergency,
            ..Self::regular(patient_id, room_id, surgeon_id, start, duration)
        }
    }

    /// Sets the denormalized specialty.
    pub fn with_specialty(mut self, specialty: impl Into<String>) -> Self {
        self.specialty = specialty.into();
        self
    }

    /// Surgery end (exclusive).
    #[inline]
    pub fn end(&self) -> Minutes {
        self.start.saturating_add(self.duration)
    }

    /// Surgical interval [start, end).
    #[inline]
    pub fn window(&self) -> TimeWindow {
        TimeWindow::new(self.start, self.end())
    }

    /// Whether this assignment came from the emergency path.
    #[inline]
    pub fn is_emergency(&self) -> bool {
        self.source == AssignmentSource::Emergency
    }
}

impl Violation {
    /// Creates a room overlap violation.
    pub fn room_overlap(room_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            violation_type: ViolationType::RoomOverlap,
            entity_id: room_id.into(),
            message: message.into(),
        }
    }

    /// Creates a surgeon overlap violation.
    pub fn surgeon_overlap(surgeon_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            violation_type: ViolationType::SurgeonOverlap,
            entity_id: surgeon_id.into(),
            message: message.into(),
        }
    }

    /// Creates a duplicate patient violation.
    pub fn duplicate_patient(patient_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            violation_type: ViolationType::DuplicatePatient,
            entity_id: patient_id.into(),
            message: message.into(),
        }
    }
}

/// An ordered sequence of assignments.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Schedule {
    /// Assignments, ordered by start time.
    pub assignments: Vec<Assignment>,
}

impl Schedule {
    /// Creates an empty schedule.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a schedule from assignments, ordering them by start time.
    ///
    /// The sort is stable: assignments with equal starts keep their
    /// input order.
    pub fn from_assignments(mut assignments: Vec<Assignment>) -> Self {
        assignments.sort_by_key(|a| a.start);
        Self { assignments }
    }

    /// Makespan: latest surgery end. Zero if empty.
    pub fn makespan(&self) -> Minutes {
        self.assignments.iter().map(|a| a.end()).max().unwrap_or(0)
    }

    /// Finds the assignment for a given patient.
    pub fn assignment_for_patient(&self, patient_id: &str) -> Option<&Assignment> {
        self.assignments.iter().find(|a| a.patient_id == patient_id)
    }

    /// Returns all assignments in a given room.
    pub fn assignments_for_room(&self, room_id: &str) -> Vec<&Assignment> {
        self.assignments
            .iter()
            .filter(|a| a.room_id == room_id)
            .collect()
    }

    /// Returns all assignments for a given surgeon.
    pub fn assignments_for_surgeon(&self, surgeon_id: &str) -> Vec<&Assignment> {
        self.assignments
            .iter()
            .filter(|a| a.surgeon_id == surgeon_id)
            .collect()
    }

    /// Regular assignments, in schedule order.
    pub fn regular(&self) -> impl Iterator<Item = &Assignment> {
        self.assignments.iter().filter(|a| !a.is_emergency())
    }

    /// Emergency assignments, in schedule order.
    pub fn emergency(&self) -> impl Iterator<Item = &Assignment> {
        self.assignments.iter().filter(|a| a.is_emergency())
    }

    /// Busy minutes per room.
    pub fn room_busy_minutes(&self) -> HashMap<String, Minutes> {
        let mut busy: HashMap<String, Minutes> = HashMap::new();
        for a in &self.assignments {
            *busy.entry(a.room_id.clone()).or_insert(0) += a.duration;
        }
        busy
    }

    /// Busy minutes per surgeon.
    pub fn surgeon_busy_minutes(&self) -> HashMap<String, Minutes> {
        let mut busy: HashMap<String, Minutes> = HashMap::new();
        for a in &self.assignments {
            *busy.entry(a.surgeon_id.clone()).or_insert(0) += a.duration;
        }
        busy
    }

    /// Number of assignments.
    pub fn assignment_count(&self) -> usize {
        self.assignments.len()
    }

    /// Whether the schedule has no assignments.
    pub fn is_empty(&self) -> bool {
        self.assignments.is_empty()
    }
}
