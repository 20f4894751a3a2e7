//! Dispatching rules and rule engine for ordering surgical cases.
//!
//! The list scheduler places cases one at a time; the order in which it
//! sees them is decided here. The default order is arrival time with a
//! final tie-break by patient id, which makes every solve reproducible.
//!
//! # Usage
//!
//! ```
//! use ot_schedule::dispatching::{RuleEngine, SchedulingContext, TieBreaker};
//! use ot_schedule::dispatching::rules;
//!
//! let engine = RuleEngine::new()
//!     .with_rule(rules::AsaRisk)
//!     .with_tie_breaker(rules::Fifo)
//!     .with_final_tie_breaker(TieBreaker::ById);
//!
//! let context = SchedulingContext::at_time(480);
//! assert!(engine.sort_indices(&[], &context).is_empty());
//! ```
//!
//! # References
//!
//! - Pinedo (2016), "Scheduling: Theory, Algorithms, and Systems", Ch. 4
//! - Haupt (1989), "A Survey of Priority Rule-Based Scheduling"

mod context;
mod engine;
pub mod rules;

pub use context::SchedulingContext;
pub use engine::{EvaluationMode, RuleEngine, TieBreaker};

use crate::scheduler::SurgicalCase;
use std::fmt::Debug;

/// Score returned by a dispatching rule.
///
/// Lower scores = higher priority (scheduled first).
pub type RuleScore = f64;

/// A dispatching rule that evaluates case priority.
///
/// # Score Convention
/// **Lower score = higher priority.** Rules should return smaller values
/// for cases that should be placed first.
pub trait DispatchingRule: Send + Sync + Debug {
    /// Rule name (e.g., "FIFO", "SPT").
    fn name(&self) -> &'static str;

    /// Evaluates the priority of a case given the current context.
    fn evaluate(&self, case: &SurgicalCase, context: &SchedulingContext) -> RuleScore;

    /// Rule description.
    fn description(&self) -> &'static str {
        self.name()
    }
}
