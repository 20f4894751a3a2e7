//! Schedule store.
//!
//! Holds the regular subset and the emergency subset as two independently
//! locked partitions. Re-optimization swaps the whole regular subset in
//! one write; emergency admission appends to its own partition and never
//! touches the regular lock.

use std::sync::{Arc, PoisonError, RwLock};

use crate::models::{Assignment, Schedule};

/// Current assignments, shared by both scheduling paths and by readers.
#[derive(Debug, Default)]
pub struct ScheduleStore {
    regular: RwLock<Arc<Vec<Assignment>>>,
    emergency: RwLock<Vec<Assignment>>,
}

impl ScheduleStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the whole regular subset.
    ///
    /// Readers see either the previous or the new subset, never a mix.
    pub fn replace_regular(&self, assignments: Vec<Assignment>) {
        let next = Arc::new(assignments);
        *self.regular.write().unwrap_or_else(PoisonError::into_inner) = next;
    }

    /// Appends one emergency assignment.
    pub fn append_emergency(&self, assignment: Assignment) {
        self.emergency
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(assignment);
    }

    /// The current regular subset.
    pub fn regular(&self) -> Arc<Vec<Assignment>> {
        Arc::clone(&self.regular.read().unwrap_or_else(PoisonError::into_inner))
    }

    /// Emergency assignments in admission order.
    pub fn emergency(&self) -> Vec<Assignment> {
        self.emergency
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Number of emergency assignments.
    pub fn emergency_len(&self) -> usize {
        self.emergency
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Both subsets merged and ordered by start.
    ///
    /// Regular assignments come before emergency ones with the same start.
    pub fn snapshot(&self) -> Schedule {
        let regular = self.regular();
        let mut all: Vec<Assignment> = regular.as_ref().clone();
        all.extend(self.emergency());
        Schedule::from_assignments(all)
    }
}
