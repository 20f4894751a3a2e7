//! Optimizing scheduler for the regular pool.
//!
//! # Algorithm
//!
//! 1. Drop duplicate patient ids (first occurrence wins).
//! 2. Predict every duration once; failures become unscheduled.
//! 3. Resolve compatible rooms, surgeons and equipment per case.
//! 4. Place pinned cases at their fixed slots.
//! 5. Walk the remaining cases in dispatch order and give each the
//!    (room, surgeon) pair with the earliest feasible start. Ties keep
//!    pool order.
//! 6. Optionally, search over the dispatch order with seeded swap moves.
//!
//! A room stays busy for the surgery plus turnover, a surgeon for the
//! surgery plus break. Equipment is counted over the surgery only.
//!
//! # Complexity
//! O(n · r · s · k) per pass, where k is the number of busy windows a
//! candidate start is probed against.
//!
//! # Reference
//! Pinedo (2016), "Scheduling", Ch. 4: Priority Dispatching

use std::collections::HashSet;

use tracing::{debug, warn};

use super::case::{SolveRequest, SurgicalCase};
use super::improve::{improve_order, Improvement};
use super::timeline::{EquipmentLedger, Timeline};
use crate::config::OperatingRules;
use crate::dispatching::{RuleEngine, SchedulingContext};
use crate::error::InfeasibleAssignmentError;
use crate::models::{Assignment, ClockTime, Horizon, Minutes, Patient, Schedule, TimeWindow};
use crate::partition::RegularPool;
use crate::predict::{predict_minutes, DurationPredictor};

/// Cost of leaving one patient unscheduled, in objective units.
const UNSCHEDULED_PENALTY: f64 = 10_000.0;

/// A patient the solver could not place.
#[derive(Debug, Clone, PartialEq)]
pub struct Unscheduled {
    pub patient_id: String,
    pub reason: InfeasibleAssignmentError,
}

impl Unscheduled {
    fn new(reason: InfeasibleAssignmentError) -> Self {
        Self {
            patient_id: reason.patient_id().to_string(),
            reason,
        }
    }
}

/// Result of a solver run: placed assignments plus everything left over.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SolveOutcome {
    /// Regular assignments, ordered by start.
    pub schedule: Schedule,
    /// Patients that could not be placed, with the reason.
    pub unscheduled: Vec<Unscheduled>,
}

impl SolveOutcome {
    /// Whether every patient was placed.
    pub fn is_complete(&self) -> bool {
        self.unscheduled.is_empty()
    }

    /// Whether `patient_id` was left unscheduled.
    pub fn is_unscheduled(&self, patient_id: &str) -> bool {
        self.unscheduled.iter().any(|u| u.patient_id == patient_id)
    }
}

/// Priority-driven list scheduler over the regular pool.
///
/// # Example
///
/// ```
/// use ot_schedule::config::OperatingRules;
/// use ot_schedule::models::{Patient, ResourceRegistry, Room, Surgeon};
/// use ot_schedule::partition::{partition, ReservationPolicy};
/// use ot_schedule::predict::FixedDuration;
/// use ot_schedule::scheduler::OptimizingScheduler;
///
/// let registry = ResourceRegistry::new()
///     .with_room(Room::new("OR-1"))
///     .with_room(Room::emergency("OR-9"))
///     .with_surgeon(Surgeon::new("Dr. House", "General"))
///     .with_surgeon(Surgeon::new("Dr. Grey", "General").reserve(true));
/// let policy = ReservationPolicy::new()
///     .with_room("OR-9")
///     .with_surgeon("General", "Dr. Grey");
/// let pool = partition(&registry, &policy).unwrap();
///
/// let rules = OperatingRules::default();
/// let patients = vec![Patient::new("P1", "General").with_arrival(480)];
/// let outcome = OptimizingScheduler::new(rules).solve(
///     &patients,
///     &pool.regular,
///     rules.horizon(),
///     &FixedDuration(90.0),
/// );
/// assert!(outcome.is_complete());
/// assert_eq!(outcome.schedule.assignments[0].room_id, "OR-1");
/// ```
#[derive(Debug, Clone)]
pub struct OptimizingScheduler {
    rules: OperatingRules,
    dispatch: RuleEngine,
    improvement: Option<Improvement>,
}

/// A case that passed prediction and compatibility checks.
struct Prepared<'a> {
    case: &'a SurgicalCase,
    predicted: Minutes,
    duration: Minutes,
    rooms: Vec<usize>,
    surgeons: Vec<usize>,
}

struct Occupancy {
    rooms: Vec<Timeline>,
    surgeons: Vec<Timeline>,
    equipment: EquipmentLedger,
}

struct Slot {
    start: Minutes,
    room: usize,
    surgeon: usize,
}

#[derive(Default)]
struct Placement {
    assignments: Vec<Assignment>,
    unscheduled: Vec<Unscheduled>,
    weighted_starts: f64,
}

impl Placement {
    fn cost(&self) -> f64 {
        let makespan = self.assignments.iter().map(Assignment::end).max().unwrap_or(0);
        self.unscheduled.len() as f64 * UNSCHEDULED_PENALTY + makespan as f64 + self.weighted_starts
    }
}

impl OptimizingScheduler {
    /// Creates a scheduler with FIFO dispatching and no improvement pass.
    pub fn new(rules: OperatingRules) -> Self {
        Self {
            rules,
            dispatch: RuleEngine::fifo(),
            improvement: None,
        }
    }

    /// Sets the dispatch order.
    pub fn with_dispatching(mut self, engine: RuleEngine) -> Self {
        self.dispatch = engine;
        self
    }

    /// Enables the seeded order-improvement pass.
    pub fn with_improvement(mut self, improvement: Improvement) -> Self {
        self.improvement = Some(improvement);
        self
    }

    /// Operating rules in effect.
    pub fn rules(&self) -> &OperatingRules {
        &self.rules
    }

    /// Schedules a batch of patients with no pins or holds.
    pub fn solve(
        &self,
        patients: &[Patient],
        pool: &RegularPool,
        horizon: Horizon,
        predictor: &dyn DurationPredictor,
    ) -> SolveOutcome {
        let request = SolveRequest::from_patients(patients.to_vec(), horizon);
        self.solve_request(&request, pool, predictor)
    }

    /// Schedules the cases of `request` on `pool`.
    ///
    /// Never fails as a whole: every case ends up either in the schedule
    /// or in `unscheduled`.
    pub fn solve_request(
        &self,
        request: &SolveRequest,
        pool: &RegularPool,
        predictor: &dyn DurationPredictor,
    ) -> SolveOutcome {
        let mut rejected = Vec::new();
        let mut seen = HashSet::new();
        let mut pinned = Vec::new();
        let mut free = Vec::new();

        for case in &request.cases {
            if !seen.insert(case.id()) {
                rejected.push(Unscheduled::new(InfeasibleAssignmentError::DuplicatePatient {
                    patient_id: case.id().to_string(),
                }));
                continue;
            }
            match self.prepare(case, pool, predictor) {
                Ok(prepared) if case.pin.is_some() => pinned.push(prepared),
                Ok(prepared) => free.push(prepared),
                Err(reason) => rejected.push(Unscheduled::new(reason)),
            }
        }
        pinned.sort_by(|a, b| {
            pin_start(a)
                .cmp(&pin_start(b))
                .then_with(|| a.case.id().cmp(b.case.id()))
        });

        let order = self.dispatch_order(&free, request.current_time());
        let (order, placement) = match self.improvement {
            Some(settings) => {
                let (best, _) = improve_order(order, settings, |candidate| {
                    self.place(&pinned, &free, candidate, request, pool).cost()
                });
                let placement = self.place(&pinned, &free, &best, request, pool);
                (best, placement)
            }
            None => {
                let placement = self.place(&pinned, &free, &order, request, pool);
                (order, placement)
            }
        };

        let mut unscheduled = rejected;
        unscheduled.extend(placement.unscheduled);
        for u in &unscheduled {
            warn!(patient = %u.patient_id, reason = %u.reason, "patient left unscheduled");
        }

        let schedule = Schedule::from_assignments(placement.assignments);
        debug!(
            cases = request.cases.len(),
            pinned = pinned.len(),
            dispatched = order.len(),
            scheduled = schedule.assignment_count(),
            unscheduled = unscheduled.len(),
            makespan = %ClockTime(schedule.makespan()),
            "regular solve finished"
        );

        SolveOutcome {
            schedule,
            unscheduled,
        }
    }

    /// Predicts the duration and resolves candidate resources.
    fn prepare<'a>(
        &self,
        case: &'a SurgicalCase,
        pool: &RegularPool,
        predictor: &dyn DurationPredictor,
    ) -> Result<Prepared<'a>, InfeasibleAssignmentError> {
        let patient = &case.patient;
        let predicted = predict_minutes(predictor, patient)?;
        let duration = case.duration(predicted);

        // A running surgery keeps whatever slot it has.
        if case.pin.is_some() {
            return Ok(Prepared {
                case,
                predicted,
                duration,
                rooms: Vec::new(),
                surgeons: Vec::new(),
            });
        }

        let rooms: Vec<usize> = pool
            .rooms
            .iter()
            .enumerate()
            .filter(|(_, r)| r.supports(&patient.specialty))
            .map(|(i, _)| i)
            .collect();
        if rooms.is_empty() {
            return Err(InfeasibleAssignmentError::NoCompatibleRoom {
                patient_id: patient.id.clone(),
                specialty: patient.specialty.clone(),
            });
        }

        let surgeons: Vec<usize> = match &patient.requested_surgeon {
            Some(requested) => {
                let idx = pool
                    .surgeons
                    .iter()
                    .position(|s| &s.id == requested && s.practices(&patient.specialty));
                match idx {
                    Some(i) => vec![i],
                    None => {
                        return Err(InfeasibleAssignmentError::SurgeonNotInPool {
                            patient_id: patient.id.clone(),
                            specialty: patient.specialty.clone(),
                            surgeon_id: requested.clone(),
                        })
                    }
                }
            }
            None => pool
                .surgeons
                .iter()
                .enumerate()
                .filter(|(_, s)| s.practices(&patient.specialty))
                .map(|(i, _)| i)
                .collect(),
        };
        if surgeons.is_empty() {
            return Err(InfeasibleAssignmentError::NoCompatibleSurgeon {
                patient_id: patient.id.clone(),
                specialty: patient.specialty.clone(),
            });
        }

        if let Some(missing) = patient
            .equipment
            .iter()
            .find(|e| !pool.equipment.get(*e).is_some_and(|&cap| cap > 0))
        {
            return Err(InfeasibleAssignmentError::UnknownEquipment {
                patient_id: patient.id.clone(),
                equipment: missing.clone(),
            });
        }

        Ok(Prepared {
            case,
            predicted,
            duration,
            rooms,
            surgeons,
        })
    }

    fn dispatch_order(&self, free: &[Prepared<'_>], now: Minutes) -> Vec<usize> {
        let context = free
            .iter()
            .fold(SchedulingContext::at_time(now), |ctx, p| {
                ctx.with_duration(p.case.id(), p.predicted)
            });
        let cases: Vec<SurgicalCase> = free.iter().map(|p| p.case.clone()).collect();
        self.dispatch.sort_indices(&cases, &context)
    }

    /// One greedy pass: pins first, then `order` over `free`.
    fn place(
        &self,
        pinned: &[Prepared<'_>],
        free: &[Prepared<'_>],
        order: &[usize],
        request: &SolveRequest,
        pool: &RegularPool,
    ) -> Placement {
        let mut occupancy = Occupancy {
            rooms: vec![Timeline::new(); pool.rooms.len()],
            surgeons: vec![Timeline::new(); pool.surgeons.len()],
            equipment: EquipmentLedger::new(pool.equipment.clone()),
        };
        let mut placement = Placement::default();

        for p in pinned {
            match self.pinned_slot(p, &occupancy, pool) {
                Some(slot) => self.commit(p, slot, &mut occupancy, &mut placement, pool),
                None => {
                    let patient = &p.case.patient;
                    let (start, room_id, surgeon_id) = p
                        .case
                        .pin
                        .as_ref()
                        .map(|pin| (pin.start, pin.room_id.clone(), pin.surgeon_id.clone()))
                        .unwrap_or_default();
                    placement.unscheduled.push(Unscheduled::new(
                        InfeasibleAssignmentError::PinConflict {
                            patient_id: patient.id.clone(),
                            room_id,
                            surgeon_id,
                            start: ClockTime(start),
                        },
                    ));
                }
            }
        }

        for &i in order {
            let p = &free[i];
            match self.earliest_slot(p, &occupancy, request, pool) {
                Some(slot) => self.commit(p, slot, &mut occupancy, &mut placement, pool),
                None => {
                    let patient = &p.case.patient;
                    placement.unscheduled.push(Unscheduled::new(
                        InfeasibleAssignmentError::HorizonExceeded {
                            patient_id: patient.id.clone(),
                            specialty: patient.specialty.clone(),
                            duration: p.duration,
                            horizon_end: ClockTime(request.horizon.end),
                        },
                    ));
                }
            }
        }

        placement
    }

    fn pinned_slot(&self, p: &Prepared<'_>, occupancy: &Occupancy, pool: &RegularPool) -> Option<Slot> {
        let pin = p.case.pin.as_ref()?;
        let room = pool.rooms.iter().position(|r| r.id == pin.room_id)?;
        let surgeon = pool.surgeons.iter().position(|s| s.id == pin.surgeon_id)?;
        self.fits(p, occupancy, room, surgeon, pin.start)
            .then_some(Slot {
                start: pin.start,
                room,
                surgeon,
            })
    }

    fn earliest_slot(
        &self,
        p: &Prepared<'_>,
        occupancy: &Occupancy,
        request: &SolveRequest,
        pool: &RegularPool,
    ) -> Option<Slot> {
        let equipment = &p.case.patient.equipment;
        let earliest = p.case.earliest_start().max(request.horizon.start);
        let mut best: Option<Slot> = None;

        for &room in &p.rooms {
            for &surgeon in &p.surgeons {
                let base = earliest
                    .max(request.holds.room_free_from(&pool.rooms[room].id))
                    .max(request.holds.surgeon_free_from(&pool.surgeons[surgeon].id));

                let mut points: Vec<Minutes> = std::iter::once(base)
                    .chain(occupancy.rooms[room].release_points(base))
                    .chain(occupancy.surgeons[surgeon].release_points(base))
                    .chain(occupancy.equipment.release_points(equipment, base))
                    .collect();
                points.sort_unstable();
                points.dedup();

                for t in points {
                    if best.as_ref().is_some_and(|b| t >= b.start) {
                        break;
                    }
                    if !request
                        .horizon
                        .fits(&TimeWindow::starting_at(t, p.duration))
                    {
                        break;
                    }
                    if self.fits(p, occupancy, room, surgeon, t) {
                        best = Some(Slot {
                            start: t,
                            room,
                            surgeon,
                        });
                        break;
                    }
                }
            }
        }

        best
    }

    fn fits(&self, p: &Prepared<'_>, occupancy: &Occupancy, room: usize, surgeon: usize, start: Minutes) -> bool {
        let surgery = TimeWindow::starting_at(start, p.duration);
        occupancy.rooms[room].is_free(&self.room_window(&surgery))
            && occupancy.surgeons[surgeon].is_free(&self.surgeon_window(&surgery))
            && occupancy
                .equipment
                .fits_all(&p.case.patient.equipment, &surgery)
    }

    fn commit(
        &self,
        p: &Prepared<'_>,
        slot: Slot,
        occupancy: &mut Occupancy,
        placement: &mut Placement,
        pool: &RegularPool,
    ) {
        let patient = &p.case.patient;
        let surgery = TimeWindow::starting_at(slot.start, p.duration);
        occupancy.rooms[slot.room].occupy(self.room_window(&surgery));
        occupancy.surgeons[slot.surgeon].occupy(self.surgeon_window(&surgery));
        occupancy.equipment.occupy(&patient.equipment, surgery);

        placement.weighted_starts += 2.0 * f64::from(patient.asa_score) * slot.start as f64;
        placement.assignments.push(
            Assignment::regular(
                &patient.id,
                &pool.rooms[slot.room].id,
                &pool.surgeons[slot.surgeon].id,
                slot.start,
                p.duration,
            )
            .with_specialty(&patient.specialty),
        );
    }

    fn room_window(&self, surgery: &TimeWindow) -> TimeWindow {
        TimeWindow::new(surgery.start, surgery.end.saturating_add(self.rules.turnover_minutes))
    }

    fn surgeon_window(&self, surgery: &TimeWindow) -> TimeWindow {
        TimeWindow::new(surgery.start, surgery.end.saturating_add(self.rules.surgeon_break_minutes))
    }
}

fn pin_start(p: &Prepared<'_>) -> Minutes {
    p.case.pin.as_ref().map(|pin| pin.start).unwrap_or(Minutes::MAX)
}
