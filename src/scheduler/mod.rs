//! Regular-pool scheduling and KPI evaluation.
//!
//! # Algorithm
//!
//! `OptimizingScheduler` is a priority-driven list scheduler: cases are
//! ordered by a dispatching rule engine and each gets the earliest
//! feasible (room, surgeon) pair. An optional seeded local search
//! reorders the list to lower
//! `unscheduled · penalty + makespan + Σ 2 · ASA · start`.
//!
//! The scheduler only ever sees a `RegularPool`; reserved capacity is
//! invisible to it.
//!
//! # KPI
//!
//! `ScheduleKpi` computes makespan, overtime, utilization and waiting.
//!
//! # References
//!
//! - Pinedo (2016), "Scheduling: Theory, Algorithms, and Systems", Ch. 3-4
//! - Baker & Trietsch (2019), "Principles of Sequencing and Scheduling"

mod case;
mod improve;
mod kpi;
mod optimizer;
mod timeline;

pub use case::{Pin, ResourceHolds, SolveRequest, SurgicalCase};
pub use improve::Improvement;
pub use kpi::ScheduleKpi;
pub use optimizer::{OptimizingScheduler, SolveOutcome, Unscheduled};
pub use timeline::{EquipmentLedger, Timeline};
