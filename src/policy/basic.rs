//! Stateless and near-stateless selection rules.

use std::collections::HashMap;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::arena::actions::Action;
use crate::arena::utility::UtilityModel;
use crate::policy::{normalize, weighted_choice, Strategy};

/// Uniform draw from the legal set.
#[derive(Debug, Clone)]
pub struct UniformRandom {
    rng: ChaCha8Rng,
}

impl UniformRandom {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }
}

impl Strategy for UniformRandom {
    fn select(&mut self, legal: &[Action]) -> Option<Action> {
        if legal.is_empty() {
            return None;
        }
        Some(legal[self.rng.gen_range(0..legal.len())])
    }
}

/// Always the lowest-numbered legal action.
#[derive(Debug, Clone, Copy, Default)]
pub struct FirstAction;

impl Strategy for FirstAction {
    fn select(&mut self, legal: &[Action]) -> Option<Action> {
        legal.iter().copied().min()
    }
}

/// Always the highest-numbered legal action.
#[derive(Debug, Clone, Copy, Default)]
pub struct LastAction;

impl Strategy for LastAction {
    fn select(&mut self, legal: &[Action]) -> Option<Action> {
        legal.iter().copied().max()
    }
}

/// Fixed per-action weights, renormalized over whatever subset of the
/// configured actions is legal this turn. Unconfigured legal actions
/// carry weight zero; abstains when the legal set has no configured
/// weight at all.
#[derive(Debug, Clone)]
pub struct FixedProbabilities {
    probs: HashMap<Action, f64>,
    rng: ChaCha8Rng,
}

impl FixedProbabilities {
    pub fn new(probs: HashMap<Action, f64>, seed: u64) -> Self {
        let mut probs = probs;
        normalize(&mut probs);
        Self {
            probs,
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    /// Uniform weight over `actions`.
    pub fn uniform(actions: &[Action], seed: u64) -> Self {
        let share = 1.0 / actions.len().max(1) as f64;
        Self::new(actions.iter().map(|a| (*a, share)).collect(), seed)
    }
}

impl Strategy for FixedProbabilities {
    fn select(&mut self, legal: &[Action]) -> Option<Action> {
        let restricted: Vec<(Action, f64)> = legal
            .iter()
            .map(|a| (*a, self.probs.get(a).copied().unwrap_or(0.0)))
            .collect();
        weighted_choice(&restricted, &mut self.rng)
    }
}

/// Spam the cheapest legal action every turn.
#[derive(Debug, Clone)]
pub struct CheapestAction {
    utility: UtilityModel,
}

impl CheapestAction {
    pub fn new(utility: UtilityModel) -> Self {
        Self { utility }
    }
}

impl Strategy for CheapestAction {
    fn select(&mut self, legal: &[Action]) -> Option<Action> {
        self.utility.least_expensive(legal)
    }
}
