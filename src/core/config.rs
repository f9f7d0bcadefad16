//! Encounter configuration
//!
//! All tunable knobs for one encounter are collected here. A config is
//! validated once, before any table construction, and then owned by the
//! encounter for its entire life.

use serde::{Deserialize, Serialize};

use crate::core::error::{Result, SimError};

/// Named attacker reward presets. Selects which advancement utility
/// table the encounter loads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdvancementRewards {
    Flat,
    Escalating,
    AllOrNothing,
    KeyGoals,
    FrontLoaded,
}

impl AdvancementRewards {
    pub const ALL: [AdvancementRewards; 5] = [
        AdvancementRewards::Flat,
        AdvancementRewards::Escalating,
        AdvancementRewards::AllOrNothing,
        AdvancementRewards::KeyGoals,
        AdvancementRewards::FrontLoaded,
    ];

    pub fn name(self) -> &'static str {
        match self {
            AdvancementRewards::Flat => "flat",
            AdvancementRewards::Escalating => "escalating",
            AdvancementRewards::AllOrNothing => "all_or_nothing",
            AdvancementRewards::KeyGoals => "key_goals",
            AdvancementRewards::FrontLoaded => "front_loaded",
        }
    }

    pub fn from_name(name: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|p| p.name() == name)
            .ok_or_else(|| SimError::UnknownPreset(name.to_string()))
    }
}

/// Named defender cost presets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DetectionCosts {
    Flat,
    Increasing,
    Decreasing,
}

impl DetectionCosts {
    pub const ALL: [DetectionCosts; 3] = [
        DetectionCosts::Flat,
        DetectionCosts::Increasing,
        DetectionCosts::Decreasing,
    ];

    pub fn name(self) -> &'static str {
        match self {
            DetectionCosts::Flat => "flat",
            DetectionCosts::Increasing => "increasing",
            DetectionCosts::Decreasing => "decreasing",
        }
    }

    pub fn from_name(name: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|p| p.name() == name)
            .ok_or_else(|| SimError::UnknownPreset(name.to_string()))
    }
}

/// Utility-sum classification of the encounter.
///
/// `Zero` and `Constant` credit every action cost a player pays to the
/// opposing ledger, so the two running utilities always sum to zero.
/// `General` keeps costs local to the player who paid them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UtilitySum {
    General,
    Zero,
    Constant,
}

impl UtilitySum {
    pub fn shares_costs(self) -> bool {
        !matches!(self, UtilitySum::General)
    }
}

/// Parameters for one encounter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EncounterConfig {
    /// Maximum number of individual turns. Must be even: the encounter
    /// always ends on a defender turn.
    pub num_turns: u32,
    pub advancement_rewards: AdvancementRewards,
    pub detection_costs: DetectionCosts,
    pub utility_sum: UtilitySum,
    /// Include Wait in each player's legal action set.
    pub use_waits: bool,
    /// Sample per-action delay turns; when off every action resolves
    /// immediately.
    pub use_timewaits: bool,
    /// Draw against failure probabilities; when off, probabilities are
    /// replaced by a deterministic 0.5 threshold.
    pub use_chance_fail: bool,
    /// On detection, transfer the detected action's value back to the
    /// defender. When off a detection still ends the encounter but moves
    /// no utility.
    pub use_defender_clawback: bool,
    /// Seed for the encounter's own random stream.
    pub seed: u64,
}

impl Default for EncounterConfig {
    fn default() -> Self {
        Self {
            num_turns: 50,
            advancement_rewards: AdvancementRewards::Flat,
            detection_costs: DetectionCosts::Flat,
            utility_sum: UtilitySum::General,
            use_waits: false,
            use_timewaits: false,
            use_chance_fail: false,
            use_defender_clawback: false,
            seed: 0,
        }
    }
}

impl EncounterConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate for internal consistency.
    pub fn validate(&self) -> Result<()> {
        if self.num_turns == 0 || self.num_turns % 2 != 0 {
            return Err(SimError::OddEncounterLength(self.num_turns));
        }
        Ok(())
    }
}
