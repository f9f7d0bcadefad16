//! Aggregate-history randomized selection.
//!
//! Tracks a running probability per action. Each turn the running
//! probabilities are restricted to the legal set, renormalized, and
//! sampled; the chosen action's probability then drops back while the
//! rest drift up, so neglected actions grow more likely over time.

use std::collections::HashMap;

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use crate::arena::actions::Action;
use crate::core::error::{Result, SimError};
use crate::policy::{normalize, weighted_choice, Strategy};

/// How running probabilities move after a pick.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AggregateUpdate {
    /// Add `pct` to every unchosen action; reset the chosen one to its
    /// seed probability.
    Increment { pct: f64 },
    /// Scale the chosen action's probability by `factor` and spread the
    /// freed mass uniformly over the rest. Keeps any one probability
    /// from creeping toward 1 too quickly.
    Decrement { factor: f64 },
}

impl Default for AggregateUpdate {
    fn default() -> Self {
        AggregateUpdate::Decrement { factor: 0.8 }
    }
}

#[derive(Debug, Clone)]
pub struct AggregateHistory {
    seed_probs: HashMap<Action, f64>,
    running: HashMap<Action, f64>,
    update: AggregateUpdate,
    rng: ChaCha8Rng,
}

impl AggregateHistory {
    /// Seeds every action in `actions` uniformly. The update parameter
    /// must lie in (0, 1]; anything else is a configuration error.
    pub fn new(actions: &[Action], update: AggregateUpdate, seed: u64) -> Result<Self> {
        let pct = match update {
            AggregateUpdate::Increment { pct } => pct,
            AggregateUpdate::Decrement { factor } => factor,
        };
        if !(0.0..=1.0).contains(&pct) || pct == 0.0 {
            return Err(SimError::UpdateParameterOutOfRange(pct));
        }
        let share = 1.0 / actions.len().max(1) as f64;
        let seed_probs: HashMap<Action, f64> =
            actions.iter().map(|a| (*a, share)).collect();
        Ok(Self {
            running: seed_probs.clone(),
            seed_probs,
            update,
            rng: ChaCha8Rng::seed_from_u64(seed),
        })
    }

    pub fn running_probabilities(&self) -> &HashMap<Action, f64> {
        &self.running
    }

    fn apply_update(&mut self, chosen: Action, chosen_prob: f64) {
        match self.update {
            AggregateUpdate::Increment { pct } => {
                for (action, p) in self.running.iter_mut() {
                    if *action == chosen {
                        *p = self.seed_probs[action];
                    } else {
                        *p += pct;
                    }
                }
            }
            AggregateUpdate::Decrement { factor } => {
                let scaled = chosen_prob * factor;
                let slack = chosen_prob - scaled;
                let spread = slack / (self.running.len() - 1).max(1) as f64;
                for (action, p) in self.running.iter_mut() {
                    if *action == chosen {
                        *p = scaled;
                    } else {
                        *p += spread;
                    }
                }
            }
        }
        normalize(&mut self.running);
    }
}

impl Strategy for AggregateHistory {
    fn select(&mut self, legal: &[Action]) -> Option<Action> {
        let mut restricted: HashMap<Action, f64> = legal
            .iter()
            .filter_map(|a| self.running.get(a).map(|p| (*a, *p)))
            .collect();
        if restricted.is_empty() {
            return None;
        }
        normalize(&mut restricted);
        let mut ordered: Vec<(Action, f64)> = restricted.into_iter().collect();
        ordered.sort_by_key(|(a, _)| *a);
        let chosen = weighted_choice(&ordered, &mut self.rng)?;
        let chosen_prob = ordered
            .iter()
            .find(|(a, _)| *a == chosen)
            .map(|(_, p)| *p)
            .unwrap_or(0.0);
        self.apply_update(chosen, chosen_prob);
        Some(chosen)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ACTIONS: [Action; 3] = [Action::S0Detect, Action::S1Detect, Action::S2Detect];

    #[test]
    fn test_running_probs_stay_normalized() {
        let mut strat = AggregateHistory::new(&ACTIONS, AggregateUpdate::default(), 9).unwrap();
        for _ in 0..30 {
            strat.select(&ACTIONS).unwrap();
            let total: f64 = strat.running_probabilities().values().sum();
            assert!((total - 1.0).abs() < 1e-9);
        }
    }

    #[test]
    fn test_chosen_action_loses_probability() {
        let mut strat =
            AggregateHistory::new(&ACTIONS, AggregateUpdate::Decrement { factor: 0.5 }, 2)
                .unwrap();
        let chosen = strat.select(&ACTIONS).unwrap();
        let chosen_p = strat.running_probabilities()[&chosen];
        for (action, p) in strat.running_probabilities() {
            if *action != chosen {
                assert!(*p > chosen_p);
            }
        }
    }

    #[test]
    fn test_increment_resets_chosen_to_seed() {
        let mut strat =
            AggregateHistory::new(&ACTIONS, AggregateUpdate::Increment { pct: 0.1 }, 4).unwrap();
        let chosen = strat.select(&ACTIONS).unwrap();
        let probs = strat.running_probabilities();
        // unchosen actions sit at (1/3 + 0.1) / total, chosen at (1/3) / total
        let chosen_p = probs[&chosen];
        for (action, p) in probs {
            if *action != chosen {
                assert!(*p > chosen_p);
            }
        }
    }

    #[test]
    fn test_unknown_legal_actions_ignored() {
        let mut strat = AggregateHistory::new(&ACTIONS, AggregateUpdate::default(), 8).unwrap();
        assert_eq!(strat.select(&[Action::S4DetectStrong]), None);
        assert_eq!(
            strat.select(&[Action::S1Detect, Action::S4DetectStrong]),
            Some(Action::S1Detect)
        );
    }

    #[test]
    fn test_invalid_update_parameter_rejected() {
        assert!(matches!(
            AggregateHistory::new(&ACTIONS, AggregateUpdate::Increment { pct: 1.5 }, 0),
            Err(SimError::UpdateParameterOutOfRange(_))
        ));
        assert!(matches!(
            AggregateHistory::new(&ACTIONS, AggregateUpdate::Decrement { factor: 0.0 }, 0),
            Err(SimError::UpdateParameterOutOfRange(_))
        ));
    }
}
