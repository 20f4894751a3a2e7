//! Dual-mode operating-theater scheduling.
//!
//! Allocates operating-room time to surgical patients while keeping a
//! slice of capacity free for emergencies that must be served without
//! re-running the allocation.
//!
//! # Modules
//!
//! - **`models`**: Domain types: `Patient`, `Room`, `Surgeon`,
//!   `ResourceRegistry`, `Assignment`, `Schedule`, time primitives
//! - **`partition`**: Splits the registry into a regular and a reserve pool
//! - **`scheduler`**: `OptimizingScheduler` over the regular pool, KPIs
//! - **`dispatching`**: Rule engine that orders cases for the scheduler
//! - **`emergency`**: Constant-time admission into reserved capacity
//! - **`store`**: Schedule store with independently locked partitions
//! - **`session`**: One operating day: start, delays, Code Red
//! - **`predict`**: Duration predictor seam and simple predictors
//! - **`validation`**: Input integrity and conflict checks
//! - **`config`**, **`error`**: Configuration and error types
//!
//! # Architecture
//!
//! ```text
//! registry + policy ──partition──▶ regular pool ──▶ OptimizingScheduler ──▶ store (replace)
//!                              └─▶ reserve pool ──▶ EmergencyDesk ─────────▶ store (append)
//! ```
//!
//! The scheduler only ever receives the regular pool, and the emergency
//! desk only the reserve pool, so neither path can consume the other's
//! capacity.
//!
//! # References
//!
//! - Pinedo (2016), "Scheduling: Theory, Algorithms, and Systems"
//! - Cardoen, Demeulemeester & Beliën (2010), "Operating room planning
//!   and scheduling: A literature review"

pub mod config;
pub mod dispatching;
pub mod emergency;
pub mod error;
pub mod models;
pub mod partition;
pub mod predict;
pub mod scheduler;
pub mod session;
pub mod store;
pub mod validation;

pub use config::{HospitalConfig, OperatingRules};
pub use emergency::EmergencyDesk;
pub use error::{
    AdmissionError, ConfigurationError, InfeasibleAssignmentError, NoReserveCapacityError,
    PredictionError, SessionError,
};
pub use partition::{partition, ReservationPolicy, ResourcePool};
pub use predict::DurationPredictor;
pub use scheduler::{OptimizingScheduler, SolveOutcome, Unscheduled};
pub use session::{DelayReason, OtSession};
pub use store::ScheduleStore;
