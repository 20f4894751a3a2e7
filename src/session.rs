//! Scheduling session.
//!
//! An `OtSession` owns one operating day: the partitioned pools, the
//! schedule store, the memoized duration predictor, and the list of
//! regular cases. Regular operations (`start_day`, `adjust_duration`,
//! `start_delay`) run under the regular lock and replace the regular
//! subset. `code_red` goes straight to the emergency desk and never takes
//! that lock, so an emergency is never held up by a re-optimization.
//!
//! # Re-optimization
//! Every regular case that has already started at `now` is pinned to its
//! current slot. All other cases may not start before `now`. The whole
//! regular subset is then recomputed and swapped in.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::config::{HospitalConfig, OperatingRules};
use crate::dispatching::RuleEngine;
use crate::emergency::EmergencyDesk;
use crate::error::{AdmissionError, ConfigurationError, SessionError};
use crate::models::{Assignment, ClockTime, Minutes, Patient, Schedule};
use crate::partition::{partition, RegularPool, ReservePool};
use crate::predict::{CachedPredictor, DurationPredictor};
use crate::scheduler::{
    Improvement, OptimizingScheduler, ResourceHolds, ScheduleKpi, SolveOutcome, SolveRequest,
    SurgicalCase, Unscheduled,
};
use crate::store::ScheduleStore;

/// Why a regular surgery cannot start on time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DelayReason {
    /// The surgeon is late; all of the surgeon's cases wait.
    SurgeonRunningLate,
    /// The room is still being cleaned or prepared; the room waits.
    RoomNotReady,
    /// The patient is not prepared; only this patient waits.
    PatientNotReady,
    /// Equipment is missing or faulty; only this patient waits.
    EquipmentIssue,
    /// Anything else; only this patient waits.
    Other,
}

impl DelayReason {
    /// Maps an operator label such as "Surgeon Running Late" or
    /// "OT Not Ready" to a reason. Unknown labels map to `Other`.
    pub fn from_label(label: &str) -> Self {
        match label.trim().to_ascii_lowercase().as_str() {
            "surgeon running late" | "surgeon late" => Self::SurgeonRunningLate,
            "room cleaning" | "ot not ready" | "room not ready" => Self::RoomNotReady,
            "patient not ready" => Self::PatientNotReady,
            "equipment issue" | "equipment failure" => Self::EquipmentIssue,
            _ => Self::Other,
        }
    }
}

#[derive(Debug, Default)]
struct RegularState {
    cases: Vec<SurgicalCase>,
    holds: ResourceHolds,
    unscheduled: Vec<Unscheduled>,
}

/// One operating day of scheduling.
pub struct OtSession<P> {
    rules: OperatingRules,
    regular_pool: RegularPool,
    scheduler: OptimizingScheduler,
    desk: EmergencyDesk,
    store: ScheduleStore,
    predictor: CachedPredictor<P>,
    regular: Mutex<RegularState>,
}

impl<P: DurationPredictor> OtSession<P> {
    /// Partitions the configured registry and opens an empty session.
    ///
    /// # Errors
    /// Any `ConfigurationError` from rule validation or partitioning.
    pub fn new(config: HospitalConfig, predictor: P) -> Result<Self, ConfigurationError> {
        config.rules.validate()?;
        let pool = partition(&config.registry, &config.reservation)?;
        info!(
            regular_rooms = pool.regular.rooms.len(),
            reserve_rooms = pool.reserve.rooms.len(),
            "session opened"
        );
        Ok(Self {
            rules: config.rules,
            regular_pool: pool.regular,
            scheduler: OptimizingScheduler::new(config.rules),
            desk: EmergencyDesk::new(pool.reserve),
            store: ScheduleStore::new(),
            predictor: CachedPredictor::new(predictor),
            regular: Mutex::new(RegularState::default()),
        })
    }

    /// Sets the dispatch order of the regular scheduler.
    pub fn with_dispatching(mut self, engine: RuleEngine) -> Self {
        self.scheduler = self.scheduler.with_dispatching(engine);
        self
    }

    /// Enables the seeded improvement pass of the regular scheduler.
    pub fn with_improvement(mut self, improvement: Improvement) -> Self {
        self.scheduler = self.scheduler.with_improvement(improvement);
        self
    }

    /// Operating rules of the day.
    pub fn rules(&self) -> &OperatingRules {
        &self.rules
    }

    /// Capacity visible to the regular scheduler.
    pub fn regular_pool(&self) -> &RegularPool {
        &self.regular_pool
    }

    /// Capacity held back for emergencies.
    pub fn reserve_pool(&self) -> &ReservePool {
        self.desk.reserve()
    }

    /// The duration predictor, with its per-patient cache.
    pub fn predictor(&self) -> &CachedPredictor<P> {
        &self.predictor
    }

    /// Schedules the day's batch, replacing any previous regular subset.
    pub fn start_day(&self, patients: Vec<Patient>) -> SolveOutcome {
        let mut state = self.lock_regular();
        info!(patients = patients.len(), "starting day");
        state.cases = patients.into_iter().map(SurgicalCase::new).collect();
        state.holds = ResourceHolds::new();
        self.solve_and_publish(&mut state, None)
    }

    /// Lengthens (or with a negative `delta`, shortens) a regular surgery
    /// and re-optimizes from `now`.
    ///
    /// # Errors
    /// `UnknownPatient` if the patient is not in the regular batch.
    pub fn adjust_duration(
        &self,
        patient_id: &str,
        delta: Minutes,
        now: Minutes,
    ) -> Result<SolveOutcome, SessionError> {
        let mut state = self.lock_regular();
        let idx = find_case(&state, patient_id)?;
        let case = &mut state.cases[idx];
        case.extra_minutes = case.extra_minutes.saturating_add(delta);
        info!(
            patient = patient_id,
            delta,
            now = %ClockTime(now),
            "duration adjusted"
        );
        Ok(self.reoptimize(&mut state, now))
    }

    /// Records that a regular surgery cannot start before `ready_at` and
    /// re-optimizes from `now`.
    ///
    /// `room` names the room that is not ready; when omitted the room of
    /// the patient's current assignment is used.
    ///
    /// # Errors
    /// * `UnknownPatient` if the patient is not in the regular batch.
    /// * `MissingRoom` for a room delay with no room to hold.
    /// * `UnknownRoom` if `room` is not a regular room.
    pub fn start_delay(
        &self,
        patient_id: &str,
        reason: DelayReason,
        ready_at: Minutes,
        now: Minutes,
        room: Option<&str>,
    ) -> Result<SolveOutcome, SessionError> {
        let mut state = self.lock_regular();
        let idx = find_case(&state, patient_id)?;
        let current = self.store.regular();
        let assigned = current.iter().find(|a| a.patient_id == patient_id);

        match reason {
            DelayReason::SurgeonRunningLate => {
                let surgeon = assigned
                    .map(|a| a.surgeon_id.clone())
                    .or_else(|| state.cases[idx].patient.requested_surgeon.clone());
                match surgeon {
                    Some(surgeon_id) => state.holds.hold_surgeon(surgeon_id, ready_at),
                    None => delay_patient(&mut state.cases[idx], ready_at),
                }
            }
            DelayReason::RoomNotReady => {
                let room_id = room
                    .map(str::to_string)
                    .or_else(|| assigned.map(|a| a.room_id.clone()))
                    .ok_or_else(|| SessionError::MissingRoom(patient_id.to_string()))?;
                if self.regular_pool.room(&room_id).is_none() {
                    return Err(SessionError::UnknownRoom(room_id));
                }
                state.holds.hold_room(room_id, ready_at);
            }
            DelayReason::PatientNotReady | DelayReason::EquipmentIssue | DelayReason::Other => {
                delay_patient(&mut state.cases[idx], ready_at);
            }
        }

        info!(
            patient = patient_id,
            ?reason,
            ready_at = %ClockTime(ready_at),
            now = %ClockTime(now),
            "start delayed"
        );
        Ok(self.reoptimize(&mut state, now))
    }

    /// Admits an emergency into reserved capacity at `now`.
    ///
    /// Does not touch the regular subset or wait for a running
    /// re-optimization.
    pub fn code_red(&self, patient: &Patient, now: Minutes) -> Result<Assignment, AdmissionError> {
        self.desk
            .admit_emergency(patient, &self.store, now, &self.predictor)
    }

    /// Current schedule, regular and emergency, ordered by start.
    pub fn schedule(&self) -> Schedule {
        self.store.snapshot()
    }

    /// The underlying store.
    pub fn store(&self) -> &ScheduleStore {
        &self.store
    }

    /// Regular patients left out of the last solve.
    pub fn unscheduled(&self) -> Vec<Unscheduled> {
        self.lock_regular().unscheduled.clone()
    }

    /// KPIs of the current schedule against the regular batch.
    pub fn kpi(&self) -> ScheduleKpi {
        let patients: Vec<Patient> = self
            .lock_regular()
            .cases
            .iter()
            .map(|c| c.patient.clone())
            .collect();
        ScheduleKpi::calculate(&self.store.snapshot(), &patients, &self.rules)
    }

    /// Pins started cases, floors the rest at `now`, and re-solves.
    fn reoptimize(&self, state: &mut RegularState, now: Minutes) -> SolveOutcome {
        let current = self.store.regular();
        let by_patient: HashMap<&str, &Assignment> = current
            .iter()
            .map(|a| (a.patient_id.as_str(), a))
            .collect();

        let mut pinned = 0usize;
        for case in &mut state.cases {
            case.pin = None;
            case.not_before = None;
            match by_patient.get(case.id()) {
                Some(a) if a.start < now => {
                    *case = case.clone().pinned(a.start, &a.room_id, &a.surgeon_id);
                    pinned += 1;
                }
                _ => *case = case.clone().with_not_before(now),
            }
        }

        info!(now = %ClockTime(now), pinned, "re-optimizing regular schedule");
        self.solve_and_publish(state, Some(now))
    }

    fn solve_and_publish(&self, state: &mut RegularState, now: Option<Minutes>) -> SolveOutcome {
        let mut request =
            SolveRequest::new(state.cases.clone(), self.rules.horizon()).with_holds(state.holds.clone());
        request.now = now;
        let outcome = self
            .scheduler
            .solve_request(&request, &self.regular_pool, &self.predictor);
        self.store
            .replace_regular(outcome.schedule.assignments.clone());
        state.unscheduled = outcome.unscheduled.clone();
        info!(
            scheduled = outcome.schedule.assignment_count(),
            unscheduled = outcome.unscheduled.len(),
            "regular schedule published"
        );
        outcome
    }

    fn lock_regular(&self) -> MutexGuard<'_, RegularState> {
        self.regular.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn find_case(state: &RegularState, patient_id: &str) -> Result<usize, SessionError> {
    state
        .cases
        .iter()
        .position(|c| c.id() == patient_id)
        .ok_or_else(|| SessionError::UnknownPatient(patient_id.to_string()))
}

fn delay_patient(case: &mut SurgicalCase, ready_at: Minutes) {
    case.ready_at = Some(case.ready_at.map_or(ready_at, |r| r.max(ready_at)));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ResourceRegistry, Room, Surgeon};
    use crate::partition::ReservationPolicy;
    use crate::predict::DurationTable;

    fn config() -> HospitalConfig {
        let registry = ResourceRegistry::new()
            .with_room(Room::new("OR-1"))
            .with_room(Room::new("OR-2"))
            .with_room(Room::emergency("OR-11"))
            .with_surgeon(Surgeon::new("Dr. House", "General"))
            .with_surgeon(Surgeon::new("Dr. Kim", "General"))
            .with_surgeon(Surgeon::new("Dr. Grey", "General").reserve(true));
        let policy = ReservationPolicy::new()
            .with_room("OR-11")
            .with_surgeon("General", "Dr. Grey");
        HospitalConfig::new(registry, policy).with_rules(OperatingRules::back_to_back())
    }

    fn session() -> OtSession<DurationTable> {
        let predictor = DurationTable::new()
            .with("P1", 120.0)
            .with("P2", 60.0)
            .with("P3", 60.0)
            .with_fallback(90.0);
        OtSession::new(config(), predictor).unwrap()
    }

    fn batch() -> Vec<Patient> {
        vec![
            Patient::new("P1", "General").with_arrival(480),
            Patient::new("P2", "General").with_arrival(480),
            Patient::new("P3", "General").with_arrival(480),
        ]
    }

    fn start_of(session: &OtSession<DurationTable>, id: &str) -> Minutes {
        session.schedule().assignment_for_patient(id).unwrap().start
    }

    #[test]
    fn test_invalid_config_rejected() {
        let mut cfg = config();
        cfg.reservation = ReservationPolicy::new().with_room("OR-11");
        assert!(matches!(
            OtSession::new(cfg, DurationTable::new()),
            Err(ConfigurationError::MissingReserveSurgeon { .. })
        ));
    }

    #[test]
    fn test_start_day() {
        let s = session();
        let out = s.start_day(batch());
        assert!(out.is_complete());
        // P1 and P2 in parallel, P3 after the shorter P2.
        assert_eq!(start_of(&s, "P1"), 480);
        assert_eq!(start_of(&s, "P2"), 480);
        assert_eq!(start_of(&s, "P3"), 540);
        assert_eq!(s.predictor().cached_len(), 3);
    }

    #[test]
    fn test_adjust_duration_pins_running_case() {
        let s = session();
        s.start_day(batch());
        let out = s.adjust_duration("P1", 60, 500).unwrap();
        assert!(out.is_complete());

        let p1 = s.schedule().assignment_for_patient("P1").cloned().unwrap();
        assert_eq!((p1.start, p1.duration, p1.room_id.as_str()), (480, 180, "OR-1"));
        // P3 had not started at 08:20 and may not start before it.
        assert!(start_of(&s, "P3") >= 500);
        assert_eq!(s.predictor().cached_len(), 3);
    }

    #[test]
    fn test_reoptimize_keeps_arrival_order() {
        let registry = ResourceRegistry::new()
            .with_room(Room::new("OR-1"))
            .with_room(Room::emergency("OR-11"))
            .with_surgeon(Surgeon::new("Dr. House", "General"))
            .with_surgeon(Surgeon::new("Dr. Grey", "General").reserve(true));
        let policy = ReservationPolicy::new()
            .with_room("OR-11")
            .with_surgeon("General", "Dr. Grey");
        let config = HospitalConfig::new(registry, policy).with_rules(OperatingRules::back_to_back());
        let s = OtSession::new(config, DurationTable::new().with_fallback(60.0)).unwrap();
        s.start_day(vec![
            Patient::new("X", "General").with_arrival(480),
            Patient::new("Z", "General").with_arrival(485),
            Patient::new("A", "General").with_arrival(490),
        ]);
        assert_eq!((start_of(&s, "Z"), start_of(&s, "A")), (540, 600));

        // Z and A are both floored at 08:20; Z still arrived first.
        s.adjust_duration("X", 0, 500).unwrap();
        assert_eq!(start_of(&s, "X"), 480);
        assert_eq!((start_of(&s, "Z"), start_of(&s, "A")), (540, 600));
    }

    #[test]
    fn test_unknown_patient() {
        let s = session();
        s.start_day(batch());
        assert_eq!(
            s.adjust_duration("nobody", 10, 500).unwrap_err(),
            SessionError::UnknownPatient("nobody".into())
        );
    }

    #[test]
    fn test_patient_delay_only_moves_patient() {
        let s = session();
        s.start_day(batch());
        s.start_delay("P3", DelayReason::PatientNotReady, 700, 470, None)
            .unwrap();
        assert_eq!(start_of(&s, "P3"), 700);
        assert_eq!(start_of(&s, "P2"), 480);
    }

    #[test]
    fn test_surgeon_late_holds_surgeon() {
        let s = session();
        s.start_day(batch());
        let surgeon = s.schedule().assignment_for_patient("P2").unwrap().surgeon_id.clone();
        s.start_delay("P2", DelayReason::SurgeonRunningLate, 600, 470, None)
            .unwrap();

        let schedule = s.schedule();
        for a in schedule.assignments_for_surgeon(&surgeon) {
            assert!(a.start >= 600, "{} starts at {}", a.patient_id, a.start);
        }
    }

    #[test]
    fn test_room_delay() {
        let s = session();
        s.start_day(batch());
        assert_eq!(
            s.start_delay("P1", DelayReason::RoomNotReady, 600, 470, Some("OR-11"))
                .unwrap_err(),
            SessionError::UnknownRoom("OR-11".into())
        );

        s.start_delay("P1", DelayReason::RoomNotReady, 600, 470, Some("OR-1"))
            .unwrap();
        let schedule = s.schedule();
        for a in schedule.assignments_for_room("OR-1") {
            assert!(a.start >= 600);
        }
    }

    #[test]
    fn test_code_red_leaves_regular_alone() {
        let s = session();
        s.start_day(batch());
        let before: Vec<Assignment> = s.store().regular().as_ref().clone();

        let a = s.code_red(&Patient::new("EMG-001", "General"), 630).unwrap();
        assert_eq!((a.room_id.as_str(), a.surgeon_id.as_str(), a.start), ("OR-11", "Dr. Grey", 630));
        assert_eq!(*s.store().regular(), before);
        assert_eq!(s.kpi().emergency_count, 1);
    }

    #[test]
    fn test_delay_reason_labels() {
        assert_eq!(DelayReason::from_label("Surgeon Running Late"), DelayReason::SurgeonRunningLate);
        assert_eq!(DelayReason::from_label("Room Cleaning"), DelayReason::RoomNotReady);
        assert_eq!(DelayReason::from_label("OT Not Ready"), DelayReason::RoomNotReady);
        assert_eq!(DelayReason::from_label("patient not ready"), DelayReason::PatientNotReady);
        assert_eq!(DelayReason::from_label("Lunch"), DelayReason::Other);
    }
}
