//! Per-action utility model
//!
//! Every action carries a (cost, reward, damage) triple. Costs are always
//! concrete; reward and damage may be `Derived`, meaning the concrete
//! value comes from the opposing action in the resolution where it is
//! needed. Derivation order:
//!
//!   attack damage  -> attack reward
//!   defend reward  -> attack damage
//!   defend damage  -> defend reward -> attack damage
//!
//! An attack reward is the bottom of every chain, so one that is itself
//! `Derived` is a fatal configuration error caught at load.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::arena::actions::{attack_actions_by_stage, Action, NUM_STAGES};
use crate::core::config::{AdvancementRewards, DetectionCosts};
use crate::core::error::{Result, SimError};

/// A reward or damage entry: concrete, or derived from the opposing
/// action at resolution time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UtilityValue {
    Fixed(i64),
    Derived,
}

impl UtilityValue {
    pub fn fixed(self) -> Option<i64> {
        match self {
            UtilityValue::Fixed(v) => Some(v),
            UtilityValue::Derived => None,
        }
    }
}

/// Utility triple for one action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Utility {
    pub cost: i64,
    pub reward: UtilityValue,
    pub damage: UtilityValue,
}

impl Utility {
    pub const fn new(cost: i64, reward: UtilityValue, damage: UtilityValue) -> Self {
        Self { cost, reward, damage }
    }

    /// An attack entry: concrete reward, damage derived from it.
    const fn advance(cost: i64, reward: i64) -> Self {
        Self::new(cost, UtilityValue::Fixed(reward), UtilityValue::Derived)
    }

    /// A detect entry: reward and damage both derived from the detected
    /// attack.
    const fn detect(cost: i64) -> Self {
        Self::new(cost, UtilityValue::Derived, UtilityValue::Derived)
    }

    const fn noop() -> Self {
        Self::new(0, UtilityValue::Fixed(0), UtilityValue::Fixed(0))
    }
}

fn advancement_rewards(preset: AdvancementRewards) -> [(Action, Utility); 10] {
    use Action::*;
    match preset {
        AdvancementRewards::Flat => [
            (S0Advance, Utility::advance(1, 2)),
            (S0AdvanceCamo, Utility::advance(2, 2)),
            (S1Advance, Utility::advance(1, 2)),
            (S1AdvanceCamo, Utility::advance(2, 2)),
            (S2Advance, Utility::advance(1, 2)),
            (S2AdvanceCamo, Utility::advance(2, 2)),
            (S3Advance, Utility::advance(1, 2)),
            (S3AdvanceCamo, Utility::advance(2, 2)),
            (S4Advance, Utility::advance(1, 2)),
            (S4AdvanceCamo, Utility::advance(2, 2)),
        ],
        AdvancementRewards::Escalating => [
            (S0Advance, Utility::advance(1, 1)),
            (S0AdvanceCamo, Utility::advance(2, 1)),
            (S1Advance, Utility::advance(1, 2)),
            (S1AdvanceCamo, Utility::advance(2, 2)),
            (S2Advance, Utility::advance(1, 4)),
            (S2AdvanceCamo, Utility::advance(2, 4)),
            (S3Advance, Utility::advance(1, 8)),
            (S3AdvanceCamo, Utility::advance(2, 8)),
            (S4Advance, Utility::advance(1, 16)),
            (S4AdvanceCamo, Utility::advance(2, 16)),
        ],
        AdvancementRewards::AllOrNothing => [
            (S0Advance, Utility::advance(1, 0)),
            (S0AdvanceCamo, Utility::advance(2, 0)),
            (S1Advance, Utility::advance(2, 0)),
            (S1AdvanceCamo, Utility::advance(3, 0)),
            (S2Advance, Utility::advance(3, 0)),
            (S2AdvanceCamo, Utility::advance(4, 0)),
            (S3Advance, Utility::advance(4, 0)),
            (S3AdvanceCamo, Utility::advance(5, 0)),
            (S4Advance, Utility::advance(5, 40)),
            (S4AdvanceCamo, Utility::advance(6, 40)),
        ],
        AdvancementRewards::KeyGoals => [
            (S0Advance, Utility::advance(1, 0)),
            (S0AdvanceCamo, Utility::advance(2, 0)),
            (S1Advance, Utility::advance(2, 8)),
            (S1AdvanceCamo, Utility::advance(3, 8)),
            (S2Advance, Utility::advance(3, 0)),
            (S2AdvanceCamo, Utility::advance(4, 0)),
            (S3Advance, Utility::advance(4, 0)),
            (S3AdvanceCamo, Utility::advance(5, 0)),
            (S4Advance, Utility::advance(5, 30)),
            (S4AdvanceCamo, Utility::advance(6, 30)),
        ],
        AdvancementRewards::FrontLoaded => [
            (S0Advance, Utility::advance(1, 4)),
            (S0AdvanceCamo, Utility::advance(2, 4)),
            (S1Advance, Utility::advance(2, 20)),
            (S1AdvanceCamo, Utility::advance(3, 20)),
            (S2Advance, Utility::advance(3, 0)),
            (S2AdvanceCamo, Utility::advance(4, 0)),
            (S3Advance, Utility::advance(4, 4)),
            (S3AdvanceCamo, Utility::advance(5, 4)),
            (S4Advance, Utility::advance(5, 10)),
            (S4AdvanceCamo, Utility::advance(6, 10)),
        ],
    }
}

fn detection_costs(preset: DetectionCosts) -> [(Action, Utility); 10] {
    use Action::*;
    match preset {
        DetectionCosts::Flat => [
            (S0Detect, Utility::detect(1)),
            (S0DetectStrong, Utility::detect(2)),
            (S1Detect, Utility::detect(1)),
            (S1DetectStrong, Utility::detect(2)),
            (S2Detect, Utility::detect(1)),
            (S2DetectStrong, Utility::detect(2)),
            (S3Detect, Utility::detect(1)),
            (S3DetectStrong, Utility::detect(2)),
            (S4Detect, Utility::detect(1)),
            (S4DetectStrong, Utility::detect(2)),
        ],
        DetectionCosts::Increasing => [
            (S0Detect, Utility::detect(1)),
            (S0DetectStrong, Utility::detect(2)),
            (S1Detect, Utility::detect(2)),
            (S1DetectStrong, Utility::detect(3)),
            (S2Detect, Utility::detect(3)),
            (S2DetectStrong, Utility::detect(4)),
            (S3Detect, Utility::detect(4)),
            (S3DetectStrong, Utility::detect(5)),
            (S4Detect, Utility::detect(5)),
            (S4DetectStrong, Utility::detect(6)),
        ],
        DetectionCosts::Decreasing => [
            (S0Detect, Utility::detect(5)),
            (S0DetectStrong, Utility::detect(6)),
            (S1Detect, Utility::detect(4)),
            (S1DetectStrong, Utility::detect(5)),
            (S2Detect, Utility::detect(3)),
            (S2DetectStrong, Utility::detect(4)),
            (S3Detect, Utility::detect(2)),
            (S3DetectStrong, Utility::detect(3)),
            (S4Detect, Utility::detect(1)),
            (S4DetectStrong, Utility::detect(2)),
        ],
    }
}

/// Resolved utility table for one encounter. Built once from the chosen
/// presets, validated exhaustively, then read-only.
#[derive(Debug, Clone)]
pub struct UtilityModel {
    table: HashMap<Action, Utility>,
}

impl UtilityModel {
    pub fn new(advancement: AdvancementRewards, detection: DetectionCosts) -> Result<Self> {
        let mut table = HashMap::new();
        table.insert(Action::Wait, Utility::noop());
        table.insert(Action::InProgress, Utility::noop());
        table.extend(advancement_rewards(advancement));
        table.extend(detection_costs(detection));
        Self::from_table(table)
    }

    /// Build from an explicit table. Validates that every catalog action
    /// has an entry, every cost is a concrete non-negative value, and
    /// every attack reward is concrete (the bottom of each derivation
    /// chain).
    pub fn from_table(table: HashMap<Action, Utility>) -> Result<Self> {
        for action in Action::ALL {
            let util = table
                .get(&action)
                .ok_or(SimError::MissingUtility(action))?;
            if util.cost < 0 {
                return Err(SimError::NegativeCost(action, util.cost));
            }
            if action.is_attack() && util.reward.fixed().is_none() {
                return Err(SimError::UnresolvedUtility(action));
            }
            if action.is_noop() && (util.reward.fixed().is_none() || util.damage.fixed().is_none())
            {
                return Err(SimError::UnresolvedUtility(action));
            }
        }
        Ok(Self { table })
    }

    fn get(&self, action: Action) -> &Utility {
        // every catalog action is present after from_table
        &self.table[&action]
    }

    pub fn utility(&self, action: Action) -> Utility {
        *self.get(action)
    }

    pub fn cost(&self, action: Action) -> i64 {
        self.get(action).cost
    }

    /// Reward received for a successful attack action. Concrete by
    /// load-time validation. Defined for attacks and no-ops.
    pub fn attack_reward(&self, action: Action) -> i64 {
        debug_assert!(!action.is_defend(), "{action} is not an attack");
        self.get(action)
            .reward
            .fixed()
            .expect("attack reward validated concrete at load")
    }

    /// Damage dealt by a successful attack; falls back to its reward.
    pub fn attack_damage(&self, action: Action) -> i64 {
        debug_assert!(!action.is_defend(), "{action} is not an attack");
        let util = self.get(action);
        util.damage.fixed().unwrap_or_else(|| self.attack_reward(action))
    }

    /// Reward received when `defend` detects `attack`; falls back to the
    /// detected attack's damage.
    pub fn defend_reward(&self, defend: Action, attack: Action) -> i64 {
        debug_assert!(defend.is_defend(), "{defend} is not a defend");
        let util = self.get(defend);
        util.reward
            .fixed()
            .unwrap_or_else(|| self.attack_damage(attack))
    }

    /// Damage dealt (reward clawed back) when `defend` detects `attack`;
    /// falls back to the defend reward, then to the attack's damage.
    pub fn defend_damage(&self, defend: Action, attack: Action) -> i64 {
        debug_assert!(defend.is_defend(), "{defend} is not a defend");
        let util = self.get(defend);
        util.damage
            .fixed()
            .unwrap_or_else(|| self.defend_reward(defend, attack))
    }

    /// Best net utility the attacker can achieve over a clean run of the
    /// chain: one action per stage, taking the better of the two nets.
    pub fn max_attacker_utility(&self) -> i64 {
        (0..NUM_STAGES)
            .filter_map(attack_actions_by_stage)
            .map(|pair| {
                pair.into_iter()
                    .map(|a| self.attack_reward(a) - self.cost(a))
                    .max()
                    .unwrap_or(0)
            })
            .sum()
    }

    /// Worst case for the attacker: at every stage it pays the dearer
    /// cost and has the larger value clawed back.
    pub fn min_attacker_utility(&self) -> i64 {
        let total: i64 = (0..NUM_STAGES)
            .filter_map(attack_actions_by_stage)
            .map(|pair| {
                pair.into_iter()
                    .map(|a| self.cost(a) + self.attack_damage(a))
                    .max()
                    .unwrap_or(0)
            })
            .sum();
        -total
    }

    /// Cheapest of the given actions; first wins ties.
    pub fn least_expensive(&self, actions: &[Action]) -> Option<Action> {
        let mut best: Option<(Action, i64)> = None;
        for &action in actions {
            let cost = self.cost(action);
            if best.map_or(true, |(_, c)| cost < c) {
                best = Some((action, cost));
            }
        }
        best.map(|(a, _)| a)
    }

    /// Most expensive of the given actions; first wins ties.
    pub fn most_expensive(&self, actions: &[Action]) -> Option<Action> {
        let mut best: Option<(Action, i64)> = None;
        for &action in actions {
            let cost = self.cost(action);
            if best.map_or(true, |(_, c)| cost > c) {
                best = Some((action, cost));
            }
        }
        best.map(|(a, _)| a)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arena::actions::Action::*;

    fn flat() -> UtilityModel {
        UtilityModel::new(AdvancementRewards::Flat, DetectionCosts::Flat).unwrap()
    }

    #[test]
    fn test_all_presets_load() {
        for advancement in AdvancementRewards::ALL {
            for detection in DetectionCosts::ALL {
                let model = UtilityModel::new(advancement, detection).unwrap();
                for action in Action::ALL {
                    assert!(model.cost(action) >= 0);
                }
            }
        }
    }

    #[test]
    fn test_derivation_chain() {
        let model = flat();
        // attack damage falls back to attack reward
        assert_eq!(model.attack_reward(S1Advance), 2);
        assert_eq!(model.attack_damage(S1Advance), 2);
        // defend reward falls back to the detected attack's damage
        assert_eq!(model.defend_reward(S1Detect, S1Advance), 2);
        // defend damage falls back through defend reward
        assert_eq!(model.defend_damage(S1Detect, S1Advance), 2);
    }

    #[test]
    fn test_concrete_values_win_over_derivation() {
        let mut table: HashMap<Action, Utility> = flat().table;
        table.insert(
            S0Detect,
            Utility::new(1, UtilityValue::Fixed(7), UtilityValue::Fixed(3)),
        );
        let model = UtilityModel::from_table(table).unwrap();
        assert_eq!(model.defend_reward(S0Detect, S0Advance), 7);
        assert_eq!(model.defend_damage(S0Detect, S0Advance), 3);
    }

    #[test]
    fn test_unresolved_attack_reward_rejected() {
        let mut table: HashMap<Action, Utility> = flat().table;
        table.insert(
            S2Advance,
            Utility::new(1, UtilityValue::Derived, UtilityValue::Derived),
        );
        match UtilityModel::from_table(table) {
            Err(SimError::UnresolvedUtility(action)) => assert_eq!(action, S2Advance),
            other => panic!("expected unresolved utility error, got {other:?}"),
        }
    }

    #[test]
    fn test_missing_entry_rejected() {
        let mut table: HashMap<Action, Utility> = flat().table;
        table.remove(&S3Detect);
        assert!(matches!(
            UtilityModel::from_table(table),
            Err(SimError::MissingUtility(S3Detect))
        ));
    }

    #[test]
    fn test_negative_cost_rejected() {
        let mut table: HashMap<Action, Utility> = flat().table;
        table.insert(S0Advance, Utility::advance(-1, 2));
        assert!(matches!(
            UtilityModel::from_table(table),
            Err(SimError::NegativeCost(S0Advance, -1))
        ));
    }

    #[test]
    fn test_max_attacker_utility_flat() {
        // flat: the noisy option nets 2-1 = 1 at each of the 5 stages
        assert_eq!(flat().max_attacker_utility(), 5);
        // worst case per stage: camo cost 2 plus clawed-back reward 2
        assert_eq!(flat().min_attacker_utility(), -20);
    }

    #[test]
    fn test_max_attacker_utility_takes_better_option() {
        // escalating: the cheaper noisy option wins every stage,
        // netting (1+2+4+8+16) - 5 costs
        let model =
            UtilityModel::new(AdvancementRewards::Escalating, DetectionCosts::Flat).unwrap();
        assert_eq!(model.max_attacker_utility(), 26);
    }

    #[test]
    fn test_expense_queries() {
        let model = UtilityModel::new(AdvancementRewards::Flat, DetectionCosts::Decreasing).unwrap();
        let actions = [S0Detect, S2Detect, S4Detect];
        assert_eq!(model.least_expensive(&actions), Some(S4Detect));
        assert_eq!(model.most_expensive(&actions), Some(S0Detect));
        assert_eq!(model.least_expensive(&[]), None);
    }
}
