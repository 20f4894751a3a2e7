//! Order improvement by seeded local search.
//!
//! The list scheduler is greedy in dispatch order. This pass perturbs the
//! order with swap moves and keeps a move only if it strictly lowers the
//! cost, so the result is never worse than the dispatch order. A fixed
//! seed makes the search reproducible.

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

/// Local search settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Improvement {
    /// Number of swap moves to try.
    pub iterations: usize,
    /// RNG seed.
    pub seed: u64,
}

impl Improvement {
    /// Creates improvement settings.
    pub fn new(iterations: usize, seed: u64) -> Self {
        Self { iterations, seed }
    }
}

/// Swaps two random positions. No-op for fewer than two elements.
pub(crate) fn swap_move<T, R: Rng>(order: &mut [T], rng: &mut R) {
    let len = order.len();
    if len < 2 {
        return;
    }
    let i = rng.random_range(0..len);
    let j = rng.random_range(0..len);
    order.swap(i, j);
}

/// First-improvement local search over `order`.
///
/// Returns the best order found and its cost.
pub(crate) fn improve_order<T, F>(order: Vec<T>, settings: Improvement, mut cost: F) -> (Vec<T>, f64)
where
    T: Clone,
    F: FnMut(&[T]) -> f64,
{
    let mut best = order;
    let mut best_cost = cost(&best);
    if best.len() < 2 {
        return (best, best_cost);
    }

    let mut rng = SmallRng::seed_from_u64(settings.seed);
    for _ in 0..settings.iterations {
        let mut candidate = best.clone();
        swap_move(&mut candidate, &mut rng);
        let candidate_cost = cost(&candidate);
        if candidate_cost < best_cost {
            best = candidate;
            best_cost = candidate_cost;
        }
    }

    (best, best_cost)
}
