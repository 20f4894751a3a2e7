//! Operating-theater domain models.
//!
//! Provides the core data types for describing OT capacity, the patients
//! to be operated on, and the resulting schedule.
//!
//! # Domain Mappings
//!
//! | ot-schedule | Generic scheduling |
//! |-------------|--------------------|
//! | Patient | Task (single activity) |
//! | Room, Surgeon | Disjunctive resources |
//! | Equipment | Cumulative resource |
//! | Schedule | Solution |

mod patient;
mod registry;
mod resource;
mod schedule;
mod time;

pub use patient::{Patient, Sex};
pub use registry::ResourceRegistry;
pub use resource::{Room, RoomKind, Surgeon};
pub use schedule::{Assignment, AssignmentSource, Schedule, Violation, ViolationType};
pub use time::{ClockTime, Horizon, Minutes, ParseClockError, TimeWindow};
