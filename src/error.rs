//! Error types.
//!
//! Configuration and reserve-capacity errors abort the current operation
//! and leave the schedule untouched. Infeasible assignments are soft:
//! they are collected as `Unscheduled` entries alongside a successful
//! solve. Every error names the patient, specialty, or time involved.

use thiserror::Error;

use crate::models::{ClockTime, Minutes};

/// Invalid reservation policy, registry, or operating rules.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigurationError {
    /// A practiced specialty has no surgeon held in reserve.
    #[error("specialty '{specialty}' has no reserved surgeon")]
    MissingReserveSurgeon { specialty: String },

    /// The policy reserves a room the registry does not contain.
    #[error("reserved room '{0}' does not exist in the registry")]
    UnknownRoom(String),

    /// The policy reserves a surgeon the registry does not contain.
    #[error("reserved surgeon '{surgeon_id}' for specialty '{specialty}' does not exist in the registry")]
    UnknownSurgeon {
        specialty: String,
        surgeon_id: String,
    },

    /// A reserved surgeon does not practice the specialty it covers.
    #[error("reserved surgeon '{surgeon_id}' does not practice '{specialty}'")]
    SpecialtyMismatch {
        specialty: String,
        surgeon_id: String,
    },

    /// An id is listed both as a reserved room and a reserved surgeon.
    #[error("'{0}' is listed both as a reserved room and as a reserved surgeon")]
    DoubleReservation(String),

    /// The registry tags a resource as reserved but the policy omits it.
    #[error("{kind} '{id}' is tagged as reserved in the registry but not listed in the reservation policy")]
    UnlistedReserve { kind: &'static str, id: String },

    /// The policy reserves no room at all.
    #[error("reservation policy reserves no room for emergencies")]
    NoReservedRoom,

    /// Two registry entries share an id.
    #[error("duplicate {kind} id '{id}' in registry")]
    DuplicateId { kind: &'static str, id: String },

    /// Operating rules are inconsistent.
    #[error("invalid operating rules: {0}")]
    InvalidRules(String),

    /// Configuration text could not be parsed.
    #[error("failed to parse configuration: {0}")]
    Parse(String),

    /// Configuration file could not be read.
    #[error("failed to read configuration from '{path}': {message}")]
    Io { path: String, message: String },
}

/// The duration predictor failed or returned an unusable value.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum PredictionError {
    #[error("duration prediction failed for patient '{patient_id}': {message}")]
    Failed { patient_id: String, message: String },

    #[error("duration predictor returned {minutes} minutes for patient '{patient_id}'; a positive duration is required")]
    NonPositive { patient_id: String, minutes: f64 },

    #[error("duration predictor returned {minutes} minutes for patient '{patient_id}'; at most {limit} are allowed")]
    TooLong {
        patient_id: String,
        minutes: f64,
        limit: Minutes,
    },
}

/// Why a patient could not be placed in the regular pool.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum InfeasibleAssignmentError {
    #[error("no regular room supports '{specialty}' (patient '{patient_id}')")]
    NoCompatibleRoom {
        patient_id: String,
        specialty: String,
    },

    #[error("no regular surgeon practices '{specialty}' (patient '{patient_id}')")]
    NoCompatibleSurgeon {
        patient_id: String,
        specialty: String,
    },

    #[error("requested surgeon '{surgeon_id}' is not a regular '{specialty}' surgeon (patient '{patient_id}')")]
    SurgeonNotInPool {
        patient_id: String,
        specialty: String,
        surgeon_id: String,
    },

    #[error("equipment '{equipment}' is not available in the regular pool (patient '{patient_id}')")]
    UnknownEquipment {
        patient_id: String,
        equipment: String,
    },

    #[error("no slot for patient '{patient_id}' ({specialty}, {duration} min) before {horizon_end}")]
    HorizonExceeded {
        patient_id: String,
        specialty: String,
        duration: i64,
        horizon_end: ClockTime,
    },

    #[error("pinned slot at {start} in '{room_id}' with '{surgeon_id}' is no longer free (patient '{patient_id}')")]
    PinConflict {
        patient_id: String,
        room_id: String,
        surgeon_id: String,
        start: ClockTime,
    },

    #[error("patient '{patient_id}' appears more than once in the batch")]
    DuplicatePatient { patient_id: String },

    #[error(transparent)]
    Prediction(#[from] PredictionError),
}

/// Emergency admission found no free reserved capacity.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum NoReserveCapacityError {
    #[error("no surgeon is reserved for '{specialty}' (patient '{patient_id}')")]
    NoReservedSurgeon {
        patient_id: String,
        specialty: String,
    },

    #[error("reserved surgeon '{surgeon_id}' for '{specialty}' is busy until {busy_until} (patient '{patient_id}' at {at})")]
    SurgeonBusy {
        patient_id: String,
        specialty: String,
        surgeon_id: String,
        at: ClockTime,
        busy_until: ClockTime,
    },

    #[error("no reserved room supporting '{specialty}' is free at {at} (patient '{patient_id}')")]
    NoRoomFree {
        patient_id: String,
        specialty: String,
        at: ClockTime,
    },
}

/// Emergency admission failed; the schedule is unchanged.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum AdmissionError {
    #[error(transparent)]
    NoReserveCapacity(#[from] NoReserveCapacityError),

    #[error(transparent)]
    Prediction(#[from] PredictionError),

    #[error("patient '{0}' has already been admitted as an emergency")]
    AlreadyAdmitted(String),
}

/// A session operation referenced unknown state.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SessionError {
    #[error("patient '{0}' is not part of the regular schedule")]
    UnknownPatient(String),

    #[error("room '{0}' is not a regular room")]
    UnknownRoom(String),

    #[error("room delay for patient '{0}' requires a room")]
    MissingRoom(String),
}

impl InfeasibleAssignmentError {
    /// The patient this error refers to.
    pub fn patient_id(&self) -> &str {
        match self {
            Self::NoCompatibleRoom { patient_id, .. }
            | Self::NoCompatibleSurgeon { patient_id, .. }
            | Self::SurgeonNotInPool { patient_id, .. }
            | Self::UnknownEquipment { patient_id, .. }
            | Self::HorizonExceeded { patient_id, .. }
            | Self::PinConflict { patient_id, .. }
            | Self::DuplicatePatient { patient_id } => patient_id,
            Self::Prediction(e) => e.patient_id(),
        }
    }
}

impl PredictionError {
    /// The patient this error refers to.
    pub fn patient_id(&self) -> &str {
        match self {
            Self::Failed { patient_id, .. }
            | Self::NonPositive { patient_id, .. }
            | Self::TooLong { patient_id, .. } => patient_id,
        }
    }
}
