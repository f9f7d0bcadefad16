//! Action-selection strategies for both players.
//!
//! A [`Strategy`] picks one action from the legal set and may keep
//! state between turns. A [`Policy`] exposes the OpenSpiel-shaped
//! probability interface over a live encounter; [`StrategyPolicy`]
//! adapts any strategy into one. The singleton `{InProgress}` legal
//! set is always forced without consulting the configured strategy.

pub mod aggregate;
pub mod basic;
pub mod intervals;

use std::collections::HashMap;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use crate::arena::actions::{Action, Player};
use crate::arena::utility::UtilityModel;
use crate::core::error::Result;
use crate::engine::encounter::Encounter;

pub use aggregate::{AggregateHistory, AggregateUpdate};
pub use basic::{CheapestAction, FirstAction, FixedProbabilities, LastAction, UniformRandom};
pub use intervals::{IndependentIntervals, TieBreak};

/// A stateful per-player selection rule. `legal` is never empty and
/// never the forced singleton when a strategy is consulted. `None`
/// means the strategy abstains; the caller falls back to a uniform
/// draw.
pub trait Strategy {
    fn select(&mut self, legal: &[Action]) -> Option<Action>;
}

impl<S: Strategy + ?Sized> Strategy for Box<S> {
    fn select(&mut self, legal: &[Action]) -> Option<Action> {
        (**self).select(legal)
    }
}

/// Distribution interface for drivers. The returned map sums to 1 over
/// the legal set, or is empty when the player has no legal actions.
pub trait Policy {
    fn action_probabilities(
        &mut self,
        encounter: &Encounter,
        player: Player,
    ) -> HashMap<Action, f64>;
}

/// Uniform distribution over the legal set, no state.
#[derive(Debug, Clone, Default)]
pub struct UniformPolicy;

impl Policy for UniformPolicy {
    fn action_probabilities(
        &mut self,
        encounter: &Encounter,
        player: Player,
    ) -> HashMap<Action, f64> {
        let legal = encounter.legal_actions(player);
        let share = 1.0 / legal.len().max(1) as f64;
        legal.into_iter().map(|a| (a, share)).collect()
    }
}

/// Adapts a [`Strategy`] into a [`Policy`]: the chosen action gets
/// probability 1. Keeps its own random stream for the abstention
/// fallback.
#[derive(Debug, Clone)]
pub struct StrategyPolicy<S> {
    strategy: S,
    rng: ChaCha8Rng,
}

impl<S: Strategy> StrategyPolicy<S> {
    pub fn new(strategy: S, seed: u64) -> Self {
        Self {
            strategy,
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    pub fn strategy(&self) -> &S {
        &self.strategy
    }
}

impl<S: Strategy> Policy for StrategyPolicy<S> {
    fn action_probabilities(
        &mut self,
        encounter: &Encounter,
        player: Player,
    ) -> HashMap<Action, f64> {
        let legal = encounter.legal_actions(player);
        if legal.is_empty() {
            return HashMap::new();
        }
        if legal == [Action::InProgress] {
            return HashMap::from([(Action::InProgress, 1.0)]);
        }
        let action = match self.strategy.select(&legal) {
            Some(action) => action,
            None => legal[self.rng.gen_range(0..legal.len())],
        };
        HashMap::from([(action, 1.0)])
    }
}

/// Named strategies a driver can select by configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyKind {
    UniformRandom,
    FirstAction,
    LastAction,
    IndependentIntervals,
    AggregateHistory,
}

impl StrategyKind {
    pub const ALL: [StrategyKind; 5] = [
        StrategyKind::UniformRandom,
        StrategyKind::FirstAction,
        StrategyKind::LastAction,
        StrategyKind::IndependentIntervals,
        StrategyKind::AggregateHistory,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            StrategyKind::UniformRandom => "uniform_random",
            StrategyKind::FirstAction => "first_action",
            StrategyKind::LastAction => "last_action",
            StrategyKind::IndependentIntervals => "independent_intervals",
            StrategyKind::AggregateHistory => "aggregate_history",
        }
    }

    pub fn from_name(name: &str) -> Option<StrategyKind> {
        Self::ALL.iter().copied().find(|k| k.name() == name)
    }

    /// Build the strategy with its default parameters for `player`.
    pub fn build(
        &self,
        player: Player,
        utility: &UtilityModel,
        seed: u64,
    ) -> Result<Box<dyn Strategy>> {
        let actions = player_actions(player);
        Ok(match self {
            StrategyKind::UniformRandom => Box::new(UniformRandom::new(seed)),
            StrategyKind::FirstAction => Box::new(FirstAction),
            StrategyKind::LastAction => Box::new(LastAction),
            StrategyKind::IndependentIntervals => {
                Box::new(IndependentIntervals::with_defaults(actions, utility.clone()))
            }
            StrategyKind::AggregateHistory => Box::new(AggregateHistory::new(
                actions,
                AggregateUpdate::default(),
                seed,
            )?),
        })
    }
}

/// Full combat action set for a player, catalog order.
pub fn player_actions(player: Player) -> &'static [Action] {
    match player {
        Player::Attacker => &Action::ATTACKS,
        Player::Defender => &Action::DEFENDS,
    }
}

/// Cumulative-weight draw over `probs`. `None` when total weight is
/// not positive.
pub(crate) fn weighted_choice(
    probs: &[(Action, f64)],
    rng: &mut ChaCha8Rng,
) -> Option<Action> {
    let total: f64 = probs.iter().map(|(_, p)| p.max(0.0)).sum();
    if total <= 0.0 {
        return None;
    }
    let mut draw = rng.gen::<f64>() * total;
    for &(action, p) in probs {
        draw -= p.max(0.0);
        if draw <= 0.0 {
            return Some(action);
        }
    }
    probs.last().map(|&(a, _)| a)
}

/// Scale `probs` in place so they sum to 1. No-op on a zero total.
pub(crate) fn normalize(probs: &mut HashMap<Action, f64>) {
    let total: f64 = probs.values().sum();
    if total > 0.0 {
        for p in probs.values_mut() {
            *p /= total;
        }
    }
}
