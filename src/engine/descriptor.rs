//! Static encounter metadata for host layers.

use serde::Serialize;

use crate::arena::actions::Action;
use crate::arena::utility::UtilityModel;
use crate::core::config::{EncounterConfig, UtilitySum};
use crate::core::error::Result;

/// Summary a host layer can use to register or describe the encounter
/// without instantiating one. Bounds come from the configured utility
/// preset, so two configs with different presets yield different
/// descriptors.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GameDescriptor {
    pub short_name: &'static str,
    pub long_name: &'static str,
    pub num_players: usize,
    pub num_distinct_actions: usize,
    pub utility_sum: UtilitySum,
    /// Upper bound on applied actions before exhaustion.
    pub max_game_length: u32,
    pub min_utility: i64,
    pub max_utility: i64,
    /// The full parameter set the encounter was built with, so a host
    /// can recover the presets and feature flags behind the bounds.
    pub parameters: EncounterConfig,
}

impl GameDescriptor {
    pub fn new(config: &EncounterConfig) -> Result<Self> {
        let utility = UtilityModel::new(config.advancement_rewards, config.detection_costs)?;
        Ok(Self {
            short_name: "killchain",
            long_name: "Kill chain threat hunt",
            num_players: 2,
            num_distinct_actions: Action::ALL.len(),
            utility_sum: config.utility_sum,
            max_game_length: config.num_turns,
            min_utility: utility.min_attacker_utility(),
            max_utility: utility.max_attacker_utility(),
            parameters: config.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::AdvancementRewards;

    #[test]
    fn test_descriptor_defaults() {
        let desc = GameDescriptor::new(&EncounterConfig::default()).unwrap();
        assert_eq!(desc.num_players, 2);
        assert_eq!(desc.num_distinct_actions, 22);
        assert_eq!(desc.max_game_length, 50);
        assert!(desc.max_utility > 0);
        assert!(desc.min_utility < 0);
    }

    #[test]
    fn test_bounds_follow_preset() {
        let flat = GameDescriptor::new(&EncounterConfig::default()).unwrap();
        let escalating = GameDescriptor::new(&EncounterConfig {
            advancement_rewards: AdvancementRewards::Escalating,
            ..EncounterConfig::default()
        })
        .unwrap();
        assert!(escalating.max_utility > flat.max_utility);
    }

    #[test]
    fn test_descriptor_carries_the_parameter_schema() {
        let cfg = EncounterConfig {
            advancement_rewards: AdvancementRewards::KeyGoals,
            use_timewaits: true,
            use_chance_fail: true,
            ..EncounterConfig::default()
        };
        let desc = GameDescriptor::new(&cfg).unwrap();
        assert_eq!(desc.parameters, cfg);
        assert_eq!(desc.parameters.advancement_rewards, AdvancementRewards::KeyGoals);
        assert!(desc.parameters.use_timewaits);
        assert!(desc.parameters.use_chance_fail);
        assert!(!desc.parameters.use_waits);
    }

    #[test]
    fn test_descriptor_serializes() {
        let desc = GameDescriptor::new(&EncounterConfig::default()).unwrap();
        let json = serde_json::to_string(&desc).unwrap();
        assert!(json.contains("\"killchain\""));
        assert!(json.contains("\"num_turns\":50"));
    }
}
