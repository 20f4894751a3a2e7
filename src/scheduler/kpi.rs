//! Schedule quality metrics (KPIs).
//!
//! # Metrics
//!
//! | Metric | Definition |
//! |--------|-----------|
//! | Makespan | Latest surgery end |
//! | Overtime | Minutes past the end of the regular day, summed per room |
//! | Utilization | Busy minutes / regular-day length, per room and surgeon |
//! | Mean wait | Mean of (start - arrival) over scheduled patients |
//!
//! # Reference
//! Pinedo (2016), "Scheduling", Ch. 1.2: Performance Measures

use std::collections::{BTreeMap, HashMap};

use serde::Serialize;

use crate::config::OperatingRules;
use crate::models::{Minutes, Patient, Schedule};

/// Schedule performance indicators.
///
/// All time values are in minutes.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScheduleKpi {
    /// Latest surgery end.
    pub makespan: Minutes,
    /// Sum over rooms of minutes worked after `day_end`.
    pub overtime_minutes: Minutes,
    /// Mean room utilization over rooms that appear in the schedule.
    pub avg_room_utilization: f64,
    /// Per-room utilization (busy / regular day length).
    pub room_utilization: BTreeMap<String, f64>,
    /// Per-surgeon utilization (busy / regular day length).
    pub surgeon_utilization: BTreeMap<String, f64>,
    /// Mean of (start - arrival) over scheduled patients with a known arrival.
    pub mean_wait_minutes: f64,
    /// Patients in the batch without an assignment.
    pub unscheduled_count: usize,
    /// Assignments made by emergency admission.
    pub emergency_count: usize,
}

impl ScheduleKpi {
    /// Computes KPIs from a schedule and the patients it was built for.
    ///
    /// # Arguments
    /// * `schedule` - Regular and emergency assignments.
    /// * `patients` - Patients that should appear in the schedule.
    /// * `rules` - Supplies the regular day used for overtime and utilization.
    pub fn calculate(schedule: &Schedule, patients: &[Patient], rules: &OperatingRules) -> Self {
        let day = (rules.day_end - rules.day_start).max(1) as f64;

        let mut overtime: HashMap<&str, Minutes> = HashMap::new();
        for a in &schedule.assignments {
            let late = a.end() - a.start.max(rules.day_end);
            if late > 0 {
                *overtime.entry(a.room_id.as_str()).or_insert(0) += late;
            }
        }

        let ratio = |busy: HashMap<String, Minutes>| -> BTreeMap<String, f64> {
            busy.into_iter().map(|(id, m)| (id, m as f64 / day)).collect()
        };
        let room_utilization = ratio(schedule.room_busy_minutes());
        let surgeon_utilization = ratio(schedule.surgeon_busy_minutes());
        let avg_room_utilization = if room_utilization.is_empty() {
            0.0
        } else {
            room_utilization.values().sum::<f64>() / room_utilization.len() as f64
        };

        let mut total_wait = 0.0;
        let mut waited = 0usize;
        let mut unscheduled_count = 0usize;
        for patient in patients {
            match schedule.assignment_for_patient(&patient.id) {
                Some(a) => {
                    total_wait += (a.start - patient.arrival).max(0) as f64;
                    waited += 1;
                }
                None => unscheduled_count += 1,
            }
        }
        let mean_wait_minutes = if waited == 0 {
            0.0
        } else {
            total_wait / waited as f64
        };

        Self {
            makespan: schedule.makespan(),
            overtime_minutes: overtime.values().sum(),
            avg_room_utilization,
            room_utilization,
            surgeon_utilization,
            mean_wait_minutes,
            unscheduled_count,
            emergency_count: schedule.emergency().count(),
        }
    }
}
