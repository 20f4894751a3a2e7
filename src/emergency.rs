//! Emergency admission ("Code Red").
//!
//! Places a single patient directly into reserved capacity at the current
//! time. The path never invokes the optimizing scheduler and never reads
//! the regular subset: it only consults the reserve pool and its own
//! ledger of emergency occupancy, so its cost does not grow with the
//! size of the regular schedule.
//!
//! # Steps
//! 1. Look up the reserved surgeon for the specialty (hash lookup).
//! 2. Predict the duration.
//! 3. Reject if that surgeon is busy with an earlier emergency.
//! 4. Take the first reserved room that supports the specialty and is free.
//! 5. Append the assignment to the store.
//!
//! Reserved capacity has no turnover or break. Emergencies that collide
//! are rejected, never queued.

use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, PoisonError};

use tracing::{info, warn};

use crate::error::{AdmissionError, NoReserveCapacityError};
use crate::models::{Assignment, ClockTime, Minutes, Patient, TimeWindow};
use crate::partition::ReservePool;
use crate::predict::{predict_minutes, DurationPredictor};
use crate::scheduler::Timeline;
use crate::store::ScheduleStore;

/// Occupancy of reserved rooms and surgeons by admitted emergencies.
#[derive(Debug, Default)]
struct ReserveLedger {
    admitted: HashSet<String>,
    rooms: HashMap<String, Timeline>,
    surgeons: HashMap<String, Timeline>,
}

/// Admits emergencies into the reserve pool.
///
/// Admissions are serialized on the desk's own lock, which is never held
/// by the regular scheduling path.
#[derive(Debug)]
pub struct EmergencyDesk {
    reserve: ReservePool,
    ledger: Mutex<ReserveLedger>,
}

impl EmergencyDesk {
    /// Creates a desk over `reserve` with no admissions.
    pub fn new(reserve: ReservePool) -> Self {
        Self {
            reserve,
            ledger: Mutex::new(ReserveLedger::default()),
        }
    }

    /// The reserve pool this desk admits into.
    pub fn reserve(&self) -> &ReservePool {
        &self.reserve
    }

    /// Number of emergencies admitted so far.
    pub fn admitted_count(&self) -> usize {
        self.lock().admitted.len()
    }

    /// Admits `patient` at `now` and appends the assignment to `store`.
    ///
    /// # Errors
    /// * `AlreadyAdmitted` if the patient was admitted before.
    /// * `NoReserveCapacity` if no surgeon is reserved for the specialty,
    ///   the reserved surgeon is still busy, or no reserved room is free.
    /// * `Prediction` if the duration predictor fails.
    ///
    /// On error nothing is written.
    pub fn admit_emergency(
        &self,
        patient: &Patient,
        store: &ScheduleStore,
        now: Minutes,
        predictor: &dyn DurationPredictor,
    ) -> Result<Assignment, AdmissionError> {
        let mut ledger = self.lock();
        if ledger.admitted.contains(&patient.id) {
            return Err(AdmissionError::AlreadyAdmitted(patient.id.clone()));
        }

        let surgeon = self.reserve.surgeon_for(&patient.specialty).ok_or_else(|| {
            NoReserveCapacityError::NoReservedSurgeon {
                patient_id: patient.id.clone(),
                specialty: patient.specialty.clone(),
            }
        })?;

        let duration = predict_minutes(predictor, patient)?;
        let window = TimeWindow::starting_at(now, duration);

        if let Some(busy_until) = ledger
            .surgeons
            .get(&surgeon.id)
            .and_then(|tl| tl.blocked_until(&window))
        {
            warn!(
                patient = %patient.id,
                specialty = %patient.specialty,
                surgeon = %surgeon.id,
                busy_until = %ClockTime(busy_until),
                "reserved surgeon busy"
            );
            return Err(NoReserveCapacityError::SurgeonBusy {
                patient_id: patient.id.clone(),
                specialty: patient.specialty.clone(),
                surgeon_id: surgeon.id.clone(),
                at: ClockTime(now),
                busy_until: ClockTime(busy_until),
            }
            .into());
        }

        let room = self
            .reserve
            .rooms
            .iter()
            .filter(|r| r.supports(&patient.specialty))
            .find(|r| ledger.rooms.get(&r.id).map_or(true, |tl| tl.is_free(&window)))
            .ok_or_else(|| NoReserveCapacityError::NoRoomFree {
                patient_id: patient.id.clone(),
                specialty: patient.specialty.clone(),
                at: ClockTime(now),
            })?;

        let assignment = Assignment::emergency(&patient.id, &room.id, &surgeon.id, now, duration)
            .with_specialty(&patient.specialty);

        ledger.rooms.entry(room.id.clone()).or_default().occupy(window);
        ledger
            .surgeons
            .entry(surgeon.id.clone())
            .or_default()
            .occupy(window);
        ledger.admitted.insert(patient.id.clone());
        store.append_emergency(assignment.clone());

        info!(
            patient = %patient.id,
            specialty = %patient.specialty,
            room = %room.id,
            surgeon = %surgeon.id,
            start = %ClockTime(now),
            duration,
            "emergency admitted"
        );
        Ok(assignment)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, ReserveLedger> {
        self.ledger.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
