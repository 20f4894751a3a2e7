//! Dispatching rules for surgical cases.
//!
//! All rules follow the "lower score = placed first" convention.

use super::{DispatchingRule, RuleScore, SchedulingContext};
use crate::scheduler::SurgicalCase;

/// First In First Out.
///
/// Orders cases by patient arrival. Readiness and re-optimization floors
/// do not change the order; they only delay the start.
#[derive(Debug, Clone, Copy)]
pub struct Fifo;

impl DispatchingRule for Fifo {
    fn name(&self) -> &'static str {
        "FIFO"
    }

    fn evaluate(&self, case: &SurgicalCase, _context: &SchedulingContext) -> RuleScore {
        case.patient.arrival as f64
    }

    fn description(&self) -> &'static str {
        "First In First Out"
    }
}

/// Ready cases first.
///
/// Scores the wait from `context.current_time` until the case may start.
/// Every case that is already startable scores zero.
#[derive(Debug, Clone, Copy)]
pub struct Readiness;

impl DispatchingRule for Readiness {
    fn name(&self) -> &'static str {
        "READY"
    }

    fn evaluate(&self, case: &SurgicalCase, context: &SchedulingContext) -> RuleScore {
        (case.earliest_start() - context.current_time).max(0) as f64
    }

    fn description(&self) -> &'static str {
        "Ready Cases First"
    }
}

/// Highest ASA score first.
///
/// Higher-risk patients are operated earlier in the day.
#[derive(Debug, Clone, Copy)]
pub struct AsaRisk;

impl DispatchingRule for AsaRisk {
    fn name(&self) -> &'static str {
        "ASA"
    }

    fn evaluate(&self, case: &SurgicalCase, _context: &SchedulingContext) -> RuleScore {
        -(case.patient.asa_score as f64)
    }

    fn description(&self) -> &'static str {
        "Highest ASA Risk"
    }
}

/// Shortest Processing Time.
///
/// Uses `context.durations`; cases without a known duration go last.
#[derive(Debug, Clone, Copy)]
pub struct Spt;

impl DispatchingRule for Spt {
    fn name(&self) -> &'static str {
        "SPT"
    }

    fn evaluate(&self, case: &SurgicalCase, context: &SchedulingContext) -> RuleScore {
        context
            .duration_of(case.id())
            .map(|d| case.duration(d) as f64)
            .unwrap_or(f64::MAX)
    }

    fn description(&self) -> &'static str {
        "Shortest Processing Time"
    }
}

/// Longest Processing Time.
#[derive(Debug, Clone, Copy)]
pub struct Lpt;

impl DispatchingRule for Lpt {
    fn name(&self) -> &'static str {
        "LPT"
    }

    fn evaluate(&self, case: &SurgicalCase, context: &SchedulingContext) -> RuleScore {
        context
            .duration_of(case.id())
            .map(|d| -(case.duration(d) as f64))
            .unwrap_or(f64::MAX)
    }

    fn description(&self) -> &'static str {
        "Longest Processing Time"
    }
}
