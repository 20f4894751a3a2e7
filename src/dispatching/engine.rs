//! Rule engine for multi-criteria dispatching.
//!
//! Composes multiple dispatching rules with configurable evaluation modes
//! and tie-breaking strategies.
//!
//! # Reference
//! Haupt (1989), "A Survey of Priority Rule-Based Scheduling"

use std::sync::Arc;

use super::{rules, DispatchingRule, RuleScore, SchedulingContext};
use crate::scheduler::SurgicalCase;

/// How multiple rules are combined.
#[derive(Debug, Clone, Default)]
pub enum EvaluationMode {
    /// Apply rules in sequence; use next rule only on ties.
    #[default]
    Sequential,
    /// Compute weighted sum of all rule scores.
    Weighted,
}

/// How ties are broken after all rules are exhausted.
#[derive(Debug, Clone, Default)]
pub enum TieBreaker {
    /// Keep input order (the sort is stable).
    #[default]
    InputOrder,
    /// Deterministic by patient ID (lexicographic).
    ById,
}

#[derive(Clone)]
struct WeightedRule {
    rule: Arc<dyn DispatchingRule>,
    weight: f64,
}

/// A composable rule engine for case prioritization.
///
/// Supports sequential multi-layer evaluation (primary rule → tie-breaker)
/// and weighted combination modes.
#[derive(Clone)]
pub struct RuleEngine {
    rules: Vec<WeightedRule>,
    mode: EvaluationMode,
    tie_breaker: TieBreaker,
    epsilon: f64,
}

impl RuleEngine {
    /// Creates an empty rule engine.
    pub fn new() -> Self {
        Self {
            rules: Vec::new(),
            mode: EvaluationMode::Sequential,
            tie_breaker: TieBreaker::InputOrder,
            epsilon: 1e-9,
        }
    }

    /// Arrival order, ties broken by patient id.
    pub fn fifo() -> Self {
        Self::new()
            .with_rule(rules::Fifo)
            .with_final_tie_breaker(TieBreaker::ById)
    }

    /// Adds a primary rule (weight 1.0).
    pub fn with_rule<R: DispatchingRule + 'static>(mut self, rule: R) -> Self {
        self.rules.push(WeightedRule {
            rule: Arc::new(rule),
            weight: 1.0,
        });
        self
    }

    /// Adds a weighted rule.
    pub fn with_weighted_rule<R: DispatchingRule + 'static>(
        mut self,
        rule: R,
        weight: f64,
    ) -> Self {
        self.rules.push(WeightedRule {
            rule: Arc::new(rule),
            weight,
        });
        self
    }

    /// Adds a tie-breaking rule (weight 0.0, used only in Sequential mode).
    pub fn with_tie_breaker<R: DispatchingRule + 'static>(mut self, rule: R) -> Self {
        self.rules.push(WeightedRule {
            rule: Arc::new(rule),
            weight: 0.0,
        });
        self
    }

    /// Sets the evaluation mode.
    pub fn with_mode(mut self, mode: EvaluationMode) -> Self {
        self.mode = mode;
        self
    }

    /// Sets the final tie-breaking strategy.
    pub fn with_final_tie_breaker(mut self, tie_breaker: TieBreaker) -> Self {
        self.tie_breaker = tie_breaker;
        self
    }

    /// Sorts cases by priority (highest priority first).
    ///
    /// Returns indices into the original case slice.
    pub fn sort_indices(&self, cases: &[SurgicalCase], context: &SchedulingContext) -> Vec<usize> {
        if cases.is_empty() {
            return Vec::new();
        }

        let mut indices: Vec<usize> = (0..cases.len()).collect();

        match &self.mode {
            EvaluationMode::Sequential => {
                indices.sort_by(|&a, &b| self.compare_sequential(&cases[a], &cases[b], context));
            }
            EvaluationMode::Weighted => {
                let scores: Vec<f64> = cases
                    .iter()
                    .map(|c| self.weighted_score(c, context))
                    .collect();
                indices.sort_by(|&a, &b| {
                    scores[a]
                        .partial_cmp(&scores[b])
                        .unwrap_or(std::cmp::Ordering::Equal)
                        .then_with(|| self.final_tie_break(&cases[a], &cases[b]))
                });
            }
        }

        indices
    }

    /// Evaluates a single case and returns weighted scores from each rule.
    pub fn evaluate(&self, case: &SurgicalCase, context: &SchedulingContext) -> Vec<RuleScore> {
        self.rules
            .iter()
            .map(|wr| wr.rule.evaluate(case, context) * wr.weight)
            .collect()
    }

    fn compare_sequential(
        &self,
        a: &SurgicalCase,
        b: &SurgicalCase,
        context: &SchedulingContext,
    ) -> std::cmp::Ordering {
        for wr in &self.rules {
            let score_a = wr.rule.evaluate(a, context);
            let score_b = wr.rule.evaluate(b, context);

            if (score_a - score_b).abs() > self.epsilon {
                return score_a
                    .partial_cmp(&score_b)
                    .unwrap_or(std::cmp::Ordering::Equal);
            }
        }

        self.final_tie_break(a, b)
    }

    fn final_tie_break(&self, a: &SurgicalCase, b: &SurgicalCase) -> std::cmp::Ordering {
        match &self.tie_breaker {
            TieBreaker::InputOrder => std::cmp::Ordering::Equal,
            TieBreaker::ById => a.id().cmp(b.id()),
        }
    }

    fn weighted_score(&self, case: &SurgicalCase, context: &SchedulingContext) -> f64 {
        self.rules
            .iter()
            .map(|wr| wr.rule.evaluate(case, context) * wr.weight)
            .sum()
    }
}

impl Default for RuleEngine {
    fn default() -> Self {
        Self::fifo()
    }
}

impl std::fmt::Debug for RuleEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RuleEngine")
            .field(
                "rules",
                &self
                    .rules
                    .iter()
                    .map(|r| format!("{}(w={})", r.rule.name(), r.weight))
                    .collect::<Vec<_>>(),
            )
            .field("mode", &self.mode)
            .field("tie_breaker", &self.tie_breaker)
            .finish()
    }
}
