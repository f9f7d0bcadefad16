//! Stochastic outcome resolution
//!
//! Three tables drive resolution: per-action delay ranges, per-action
//! general-failure chances, and the directed skirmish failure table keyed
//! by defend action. The reverse win table is inferred from the failure
//! table at load; a pair appearing in both directions is a configuration
//! error.

use std::collections::HashMap;

use rand::Rng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use crate::arena::actions::{attack_actions_by_stage, defend_actions_by_stage, Action, NUM_STAGES};
use crate::core::error::{Result, SimError};

/// Inclusive range of delay turns sampled when an action is initiated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DelayRange {
    pub min: u32,
    pub max: u32,
}

impl DelayRange {
    pub const ZERO: DelayRange = DelayRange { min: 0, max: 0 };

    pub const fn new(min: u32, max: u32) -> Self {
        Self { min, max }
    }

    pub fn sample(&self, rng: &mut ChaCha8Rng) -> u32 {
        if self.min == self.max {
            self.min
        } else {
            rng.gen_range(self.min..=self.max)
        }
    }
}

/// Chance of an unspecified failure for actions without a table entry.
const DEFAULT_GENERAL_FAIL: f64 = 0.0;

fn default_delays() -> HashMap<Action, DelayRange> {
    let mut delays = HashMap::new();
    delays.insert(Action::Wait, DelayRange::ZERO);
    delays.insert(Action::InProgress, DelayRange::ZERO);
    for stage in 0..NUM_STAGES {
        if let Some([noisy, camo]) = attack_actions_by_stage(stage) {
            delays.insert(noisy, DelayRange::new(1, 2));
            delays.insert(camo, DelayRange::new(2, 3));
        }
        if let Some([weak, strong]) = defend_actions_by_stage(stage) {
            delays.insert(weak, DelayRange::new(1, 2));
            delays.insert(strong, DelayRange::new(2, 3));
        }
    }
    delays
}

fn default_general_fails() -> HashMap<Action, f64> {
    Action::ALL
        .into_iter()
        .filter(|a| !a.is_noop())
        .map(|a| (a, 0.15))
        .collect()
}

/// Weak detects counter the noisy advance at their stage; strong detects
/// counter the camouflaged one. 10% failure either way.
fn default_skirmish_fails() -> HashMap<Action, HashMap<Action, f64>> {
    let mut fails: HashMap<Action, HashMap<Action, f64>> = HashMap::new();
    for stage in 0..NUM_STAGES {
        let matched = attack_actions_by_stage(stage).zip(defend_actions_by_stage(stage));
        if let Some(([noisy, camo], [weak, strong])) = matched {
            fails.entry(weak).or_default().insert(noisy, 0.10);
            fails.entry(strong).or_default().insert(camo, 0.10);
        }
    }
    fails
}

/// Outcome resolver for one encounter. Holds the validated tables and the
/// feature flags that gate delay sampling and probabilistic draws.
#[derive(Debug, Clone)]
pub struct OutcomeResolver {
    use_timewaits: bool,
    use_chance_fail: bool,
    delays: HashMap<Action, DelayRange>,
    general_fails: HashMap<Action, f64>,
    skirmish_fails: HashMap<Action, HashMap<Action, f64>>,
    skirmish_wins: HashMap<Action, HashMap<Action, f64>>,
}

impl OutcomeResolver {
    pub fn new(use_timewaits: bool, use_chance_fail: bool) -> Result<Self> {
        Self::from_tables(
            default_delays(),
            default_general_fails(),
            default_skirmish_fails(),
            use_timewaits,
            use_chance_fail,
        )
    }

    pub fn from_tables(
        delays: HashMap<Action, DelayRange>,
        general_fails: HashMap<Action, f64>,
        skirmish_fails: HashMap<Action, HashMap<Action, f64>>,
        use_timewaits: bool,
        use_chance_fail: bool,
    ) -> Result<Self> {
        for (&action, range) in &delays {
            if range.min > range.max {
                return Err(SimError::MalformedDelayRange {
                    action,
                    min: range.min,
                    max: range.max,
                });
            }
        }
        for (&action, &chance) in &general_fails {
            if !(0.0..=1.0).contains(&chance) {
                return Err(SimError::ProbabilityOutOfRange(action, chance));
            }
        }
        let mut pairs = Vec::new();
        for (&first, opposing) in &skirmish_fails {
            for (&second, &chance) in opposing {
                if !(0.0..=1.0).contains(&chance) {
                    return Err(SimError::ProbabilityOutOfRange(second, chance));
                }
                pairs.push((first, second));
            }
        }
        for &(first, second) in &pairs {
            if pairs.contains(&(second, first)) {
                return Err(SimError::BidirectionalSkirmish(first, second));
            }
        }

        // invert the failure table into the win table
        let mut skirmish_wins: HashMap<Action, HashMap<Action, f64>> = HashMap::new();
        for (&fail_action, opposing) in &skirmish_fails {
            for (&win_action, &chance) in opposing {
                skirmish_wins
                    .entry(win_action)
                    .or_default()
                    .insert(fail_action, 1.0 - chance);
            }
        }

        Ok(Self {
            use_timewaits,
            use_chance_fail,
            delays,
            general_fails,
            skirmish_fails,
            skirmish_wins,
        })
    }

    pub fn delay(&self, action: Action) -> DelayRange {
        if !self.use_timewaits {
            return DelayRange::ZERO;
        }
        self.delays.get(&action).copied().unwrap_or(DelayRange::ZERO)
    }

    pub fn sample_delay(&self, action: Action, rng: &mut ChaCha8Rng) -> u32 {
        self.delay(action).sample(rng)
    }

    pub fn general_fail_chance(&self, action: Action) -> f64 {
        if !self.use_chance_fail {
            return 0.0;
        }
        self.general_fails
            .get(&action)
            .copied()
            .unwrap_or(DEFAULT_GENERAL_FAIL)
    }

    /// Draw the action's general-failure check. Returns None for no-ops,
    /// which can never fail. Called exactly once per initiated action;
    /// the caller caches the result.
    pub fn action_is_faulty(&self, action: Action, rng: &mut ChaCha8Rng) -> Option<bool> {
        if action.is_noop() {
            return None;
        }
        let chance = self.general_fail_chance(action);
        if chance <= 0.0 {
            return Some(false);
        }
        let draw = rng.gen::<f64>();
        let faulty = draw <= chance;
        if faulty {
            tracing::debug!(%action, draw, chance, "general failure");
        }
        Some(faulty)
    }

    /// Failure chance of `defend` skirmishing against `attack`. Actions
    /// absent from the failure table fall back to the complement of the
    /// inferred win table; absent from both means certain failure. With
    /// chance failure disabled the probability collapses to a 0.5
    /// threshold.
    pub fn skirmish_fail_chance(&self, defend: Action, attack: Action) -> f64 {
        let chance = if let Some(opposing) = self.skirmish_fails.get(&defend) {
            opposing.get(&attack).copied().unwrap_or(1.0)
        } else {
            let win = self
                .skirmish_wins
                .get(&defend)
                .and_then(|m| m.get(&attack))
                .copied()
                .unwrap_or(0.0);
            1.0 - win
        };
        if self.use_chance_fail {
            chance
        } else {
            chance.round()
        }
    }

    /// Resolve one skirmish. Draws at most once; deterministic at the
    /// certain ends of the range, and no-op pairs never succeed.
    pub fn action_succeeds(&self, defend: Action, attack: Action, rng: &mut ChaCha8Rng) -> bool {
        if defend.is_noop() || attack.is_noop() {
            return false;
        }
        let chance = self.skirmish_fail_chance(defend, attack);
        if chance <= 0.0 {
            return true;
        }
        if chance >= 1.0 {
            return false;
        }
        let draw = rng.gen::<f64>();
        let success = draw > chance;
        tracing::trace!(%defend, %attack, draw, chance, success, "skirmish");
        success
    }
}
