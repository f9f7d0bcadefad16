//! Action definitions and catalog
//!
//! The catalog is closed: every move either player can make is a variant
//! here, partitioned into attack moves, defend moves, and no-ops. All
//! classification is static so tables over actions can be validated
//! exhaustively at load.

use std::fmt;

use serde::{Deserialize, Serialize};

/// The two adversaries. The attacker always moves first in a round.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Player {
    Attacker,
    Defender,
}

impl Player {
    pub fn opponent(self) -> Player {
        match self {
            Player::Attacker => Player::Defender,
            Player::Defender => Player::Attacker,
        }
    }
}

impl fmt::Display for Player {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Player::Attacker => write!(f, "Attacker"),
            Player::Defender => write!(f, "Defender"),
        }
    }
}

/// Number of escalation stages in the kill chain.
pub const NUM_STAGES: usize = 5;

/// Unique action identifier
///
/// Each stage of the chain has a noisy and a camouflaged advance for the
/// attacker, and a weak and a strong detect for the defender. Wait and
/// InProgress are no-ops; InProgress is injected by the engine while a
/// delayed action counts down and is never chosen freely.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    Wait,
    InProgress,
    // attacker
    S0Advance,
    S0AdvanceCamo,
    S1Advance,
    S1AdvanceCamo,
    S2Advance,
    S2AdvanceCamo,
    S3Advance,
    S3AdvanceCamo,
    S4Advance,
    S4AdvanceCamo,
    // defender
    S0Detect,
    S0DetectStrong,
    S1Detect,
    S1DetectStrong,
    S2Detect,
    S2DetectStrong,
    S3Detect,
    S3DetectStrong,
    S4Detect,
    S4DetectStrong,
}

impl Action {
    pub const ALL: [Action; 22] = [
        Action::Wait,
        Action::InProgress,
        Action::S0Advance,
        Action::S0AdvanceCamo,
        Action::S1Advance,
        Action::S1AdvanceCamo,
        Action::S2Advance,
        Action::S2AdvanceCamo,
        Action::S3Advance,
        Action::S3AdvanceCamo,
        Action::S4Advance,
        Action::S4AdvanceCamo,
        Action::S0Detect,
        Action::S0DetectStrong,
        Action::S1Detect,
        Action::S1DetectStrong,
        Action::S2Detect,
        Action::S2DetectStrong,
        Action::S3Detect,
        Action::S3DetectStrong,
        Action::S4Detect,
        Action::S4DetectStrong,
    ];

    pub const ATTACKS: [Action; 10] = [
        Action::S0Advance,
        Action::S0AdvanceCamo,
        Action::S1Advance,
        Action::S1AdvanceCamo,
        Action::S2Advance,
        Action::S2AdvanceCamo,
        Action::S3Advance,
        Action::S3AdvanceCamo,
        Action::S4Advance,
        Action::S4AdvanceCamo,
    ];

    pub const DEFENDS: [Action; 10] = [
        Action::S0Detect,
        Action::S0DetectStrong,
        Action::S1Detect,
        Action::S1DetectStrong,
        Action::S2Detect,
        Action::S2DetectStrong,
        Action::S3Detect,
        Action::S3DetectStrong,
        Action::S4Detect,
        Action::S4DetectStrong,
    ];

    pub const NOOPS: [Action; 2] = [Action::Wait, Action::InProgress];

    pub fn is_noop(self) -> bool {
        matches!(self, Action::Wait | Action::InProgress)
    }

    pub fn is_attack(self) -> bool {
        Action::ATTACKS.contains(&self)
    }

    pub fn is_defend(self) -> bool {
        Action::DEFENDS.contains(&self)
    }

    /// Camouflaged attacks: more expensive, evade weak detections.
    pub fn is_camouflaged(self) -> bool {
        matches!(
            self,
            Action::S0AdvanceCamo
                | Action::S1AdvanceCamo
                | Action::S2AdvanceCamo
                | Action::S3AdvanceCamo
                | Action::S4AdvanceCamo
        )
    }

    /// Noisy attacks: cheaper, visible to weak detections.
    pub fn is_noisy(self) -> bool {
        self.is_attack() && !self.is_camouflaged()
    }

    pub fn is_strong_detect(self) -> bool {
        matches!(
            self,
            Action::S0DetectStrong
                | Action::S1DetectStrong
                | Action::S2DetectStrong
                | Action::S3DetectStrong
                | Action::S4DetectStrong
        )
    }

    pub fn is_weak_detect(self) -> bool {
        self.is_defend() && !self.is_strong_detect()
    }

    /// Kill-chain stage this action belongs to. No-ops have none.
    pub fn stage(self) -> Option<usize> {
        match self {
            Action::Wait | Action::InProgress => None,
            Action::S0Advance | Action::S0AdvanceCamo | Action::S0Detect | Action::S0DetectStrong => Some(0),
            Action::S1Advance | Action::S1AdvanceCamo | Action::S1Detect | Action::S1DetectStrong => Some(1),
            Action::S2Advance | Action::S2AdvanceCamo | Action::S2Detect | Action::S2DetectStrong => Some(2),
            Action::S3Advance | Action::S3AdvanceCamo | Action::S3Detect | Action::S3DetectStrong => Some(3),
            Action::S4Advance | Action::S4AdvanceCamo | Action::S4Detect | Action::S4DetectStrong => Some(4),
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Action::Wait => "Wait",
            Action::InProgress => "In_Progress",
            Action::S0Advance => "S0_Advance",
            Action::S0AdvanceCamo => "S0_Advance_Camo",
            Action::S1Advance => "S1_Advance",
            Action::S1AdvanceCamo => "S1_Advance_Camo",
            Action::S2Advance => "S2_Advance",
            Action::S2AdvanceCamo => "S2_Advance_Camo",
            Action::S3Advance => "S3_Advance",
            Action::S3AdvanceCamo => "S3_Advance_Camo",
            Action::S4Advance => "S4_Advance",
            Action::S4AdvanceCamo => "S4_Advance_Camo",
            Action::S0Detect => "S0_Detect",
            Action::S0DetectStrong => "S0_Detect_Strong",
            Action::S1Detect => "S1_Detect",
            Action::S1DetectStrong => "S1_Detect_Strong",
            Action::S2Detect => "S2_Detect",
            Action::S2DetectStrong => "S2_Detect_Strong",
            Action::S3Detect => "S3_Detect",
            Action::S3DetectStrong => "S3_Detect_Strong",
            Action::S4Detect => "S4_Detect",
            Action::S4DetectStrong => "S4_Detect_Strong",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// The two attack options at a given chain stage: noisy, then
/// camouflaged. None past the end of the chain.
pub fn attack_actions_by_stage(stage: usize) -> Option<[Action; 2]> {
    match stage {
        0 => Some([Action::S0Advance, Action::S0AdvanceCamo]),
        1 => Some([Action::S1Advance, Action::S1AdvanceCamo]),
        2 => Some([Action::S2Advance, Action::S2AdvanceCamo]),
        3 => Some([Action::S3Advance, Action::S3AdvanceCamo]),
        4 => Some([Action::S4Advance, Action::S4AdvanceCamo]),
        _ => None,
    }
}

/// The two detect options aimed at a given chain stage: weak, then
/// strong. None past the end of the chain.
pub fn defend_actions_by_stage(stage: usize) -> Option<[Action; 2]> {
    match stage {
        0 => Some([Action::S0Detect, Action::S0DetectStrong]),
        1 => Some([Action::S1Detect, Action::S1DetectStrong]),
        2 => Some([Action::S2Detect, Action::S2DetectStrong]),
        3 => Some([Action::S3Detect, Action::S3DetectStrong]),
        4 => Some([Action::S4Detect, Action::S4DetectStrong]),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_action_has_exactly_one_role() {
        for action in Action::ALL {
            let roles = [action.is_attack(), action.is_defend(), action.is_noop()];
            assert_eq!(
                roles.iter().filter(|r| **r).count(),
                1,
                "{action} must be exactly one of attack/defend/no-op"
            );
        }
    }

    #[test]
    fn test_subset_partitions() {
        let noisy: Vec<_> = Action::ALL.into_iter().filter(|a| a.is_noisy()).collect();
        let camo: Vec<_> = Action::ALL.into_iter().filter(|a| a.is_camouflaged()).collect();
        assert_eq!(noisy.len(), NUM_STAGES);
        assert_eq!(camo.len(), NUM_STAGES);
        let weak: Vec<_> = Action::ALL.into_iter().filter(|a| a.is_weak_detect()).collect();
        let strong: Vec<_> = Action::ALL.into_iter().filter(|a| a.is_strong_detect()).collect();
        assert_eq!(weak.len(), NUM_STAGES);
        assert_eq!(strong.len(), NUM_STAGES);
    }

    #[test]
    fn test_stage_groups_cover_all_non_noops() {
        let mut seen = Vec::new();
        for stage in 0..NUM_STAGES {
            seen.extend(attack_actions_by_stage(stage).unwrap());
            seen.extend(defend_actions_by_stage(stage).unwrap());
            for action in attack_actions_by_stage(stage).unwrap() {
                assert_eq!(action.stage(), Some(stage));
            }
            for action in defend_actions_by_stage(stage).unwrap() {
                assert_eq!(action.stage(), Some(stage));
            }
        }
        seen.sort();
        let mut expected: Vec<_> = Action::ALL
            .into_iter()
            .filter(|a| !a.is_noop())
            .collect();
        expected.sort();
        assert_eq!(seen, expected);
    }

    #[test]
    fn test_stage_groups_end_with_the_chain() {
        assert_eq!(attack_actions_by_stage(NUM_STAGES), None);
        assert_eq!(defend_actions_by_stage(NUM_STAGES), None);
        assert_eq!(attack_actions_by_stage(usize::MAX), None);
    }
}
