//! Scheduling context for dispatching rule evaluation.

use std::collections::HashMap;

use crate::models::Minutes;

/// Runtime state passed to dispatching rules.
#[derive(Debug, Clone, Default)]
pub struct SchedulingContext {
    /// Current time.
    pub current_time: Minutes,
    /// Surgery length per patient (patient_id → minutes).
    pub durations: HashMap<String, Minutes>,
}

impl SchedulingContext {
    /// Creates a context at the given time.
    pub fn at_time(current_time: Minutes) -> Self {
        Self {
            current_time,
            ..Default::default()
        }
    }

    /// Sets the surgery length for a patient.
    pub fn with_duration(mut self, patient_id: impl Into<String>, minutes: Minutes) -> Self {
        self.durations.insert(patient_id.into(), minutes);
        self
    }

    /// Surgery length for a patient, if known.
    pub fn duration_of(&self, patient_id: &str) -> Option<Minutes> {
        self.durations.get(patient_id).copied()
    }
}
