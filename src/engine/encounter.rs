//! Encounter orchestration
//!
//! Drives the strict attacker/defender alternation, applies costs and
//! optional cross-ledger sharing, runs the detection sweep and the
//! undetected-success pass, and arbitrates termination. One applied
//! action advances the turn counter by one; a full round is two turns.

use std::fmt;

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use crate::arena::actions::{attack_actions_by_stage, Action, Player};
use crate::arena::resolver::OutcomeResolver;
use crate::arena::utility::UtilityModel;
use crate::core::config::EncounterConfig;
use crate::core::error::{Result, SimError};
use crate::engine::ledger::PlayerLedger;

/// One adversarial encounter. Exclusively owned by the driver; immutable
/// once terminal.
#[derive(Debug, Clone)]
pub struct Encounter {
    config: EncounterConfig,
    utility: UtilityModel,
    resolver: OutcomeResolver,
    rng: ChaCha8Rng,
    attacker: PlayerLedger,
    defender: PlayerLedger,
    current: Player,
    /// 0-based count of applied actions.
    turn: u32,
    over: bool,
    victor: Option<Player>,
}

impl Encounter {
    pub fn new(config: EncounterConfig) -> Result<Self> {
        let rng = ChaCha8Rng::seed_from_u64(config.seed);
        Self::with_rng(config, rng)
    }

    /// Construct with an externally prepared random stream; the seed in
    /// the config is ignored.
    pub fn with_rng(config: EncounterConfig, rng: ChaCha8Rng) -> Result<Self> {
        config.validate()?;
        let utility = UtilityModel::new(config.advancement_rewards, config.detection_costs)?;
        let resolver = OutcomeResolver::new(config.use_timewaits, config.use_chance_fail)?;
        Ok(Self {
            config,
            utility,
            resolver,
            rng,
            attacker: PlayerLedger::new(Player::Attacker),
            defender: PlayerLedger::new(Player::Defender),
            current: Player::Attacker,
            turn: 0,
            over: false,
            victor: None,
        })
    }

    pub fn config(&self) -> &EncounterConfig {
        &self.config
    }

    pub fn utility_model(&self) -> &UtilityModel {
        &self.utility
    }

    pub fn attacker(&self) -> &PlayerLedger {
        &self.attacker
    }

    pub fn defender(&self) -> &PlayerLedger {
        &self.defender
    }

    pub fn ledger(&self, player: Player) -> &PlayerLedger {
        match player {
            Player::Attacker => &self.attacker,
            Player::Defender => &self.defender,
        }
    }

    /// Player to move, or None once the encounter is terminal.
    pub fn current_player(&self) -> Option<Player> {
        if self.over {
            None
        } else {
            Some(self.current)
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.over
    }

    /// Set only when a detection fired or the chain was completed; an
    /// exhausted encounter has no victor.
    pub fn victor(&self) -> Option<Player> {
        self.victor
    }

    pub fn turns_played(&self) -> u32 {
        self.turn
    }

    /// Running utility totals (attacker, defender).
    pub fn returns(&self) -> (i64, i64) {
        (self.attacker.utility, self.defender.utility)
    }

    /// Legal actions for `player`, in catalog order. Empty once terminal,
    /// and empty for an attacker whose chain is complete. A pending
    /// delayed action forces the singleton InProgress set.
    pub fn legal_actions(&self, player: Player) -> Vec<Action> {
        if self.over {
            return Vec::new();
        }
        let ledger = self.ledger(player);
        if ledger.has_pending() {
            return vec![Action::InProgress];
        }
        let mut actions = Vec::new();
        if self.config.use_waits {
            actions.push(Action::Wait);
        }
        match player {
            Player::Attacker => {
                if self.attacker.chain_complete() {
                    return Vec::new();
                }
                if let Some(pair) = attack_actions_by_stage(self.attacker.stage_position) {
                    actions.extend(pair);
                }
            }
            Player::Defender => actions.extend(Action::DEFENDS),
        }
        actions
    }

    pub fn action_to_string(&self, player: Player, action: Action) -> String {
        format!("{player}: {action}")
    }

    /// Apply the current player's action. Errors are invariant
    /// violations: the encounter is terminal, the action is not legal
    /// this turn, or the delayed-action state machine was misused.
    pub fn apply_action(&mut self, action: Action) -> Result<()> {
        if self.over {
            return Err(SimError::Terminal { turn: self.turn });
        }
        let player = self.current;
        if !self.legal_actions(player).contains(&action) {
            return Err(SimError::IllegalAction { player, action });
        }

        // 1-based, for history entries and logs
        let dsp_turn = self.turn + 1;

        // both ledgers get a trace slot every turn; cross-ledger credits
        // land in the opponent's current slot
        self.attacker.begin_turn_entry();
        self.defender.begin_turn_entry();

        match player {
            Player::Attacker => self.apply_attacker(action, dsp_turn)?,
            Player::Defender => self.apply_defender(action, dsp_turn)?,
        }
        Ok(())
    }

    /// Attacker turn: run the state machine and pay the cost. Resolution
    /// of the action's effect waits for the defender's turn, which always
    /// follows.
    fn apply_attacker(&mut self, action: Action, dsp_turn: u32) -> Result<()> {
        self.attacker
            .apply(action, &self.resolver, &mut self.rng, dsp_turn)?;
        let cost = self.utility.cost(action);
        self.attacker.increment_cost(cost);
        if self.config.utility_sum.shares_costs() {
            self.defender.increment_reward(cost);
        }
        self.attacker.record_utility();
        self.defender.record_utility();
        self.current = Player::Defender;
        self.turn += 1;
        Ok(())
    }

    /// Defender turn: run the state machine, pay the cost, then resolve
    /// the round - detection sweep first, undetected attacker success
    /// otherwise - and arbitrate termination.
    fn apply_defender(&mut self, action: Action, dsp_turn: u32) -> Result<()> {
        self.defender
            .apply(action, &self.resolver, &mut self.rng, dsp_turn)?;
        let cost = self.utility.cost(action);
        self.defender.increment_cost(cost);
        if self.config.utility_sum.shares_costs() {
            self.attacker.increment_reward(cost);
        }

        let primed_defend = self
            .defender
            .last_completed()
            .filter(|s| s.primed())
            .map(|s| s.action);
        let detection = match primed_defend {
            Some(defend_action) => self.sweep_attack_history(defend_action),
            None => None,
        };
        // the defender's completed action is spent, detection or not
        if let Some(state) = self.defender.last_completed_mut() {
            state.expend();
        }

        if detection.is_none() {
            self.resolve_undetected_attack();
        }

        self.defender.record_utility();
        self.attacker.record_utility();
        self.current = Player::Attacker;

        if let Some((defend_action, attack_action)) = detection {
            tracing::debug!(
                turn = dsp_turn,
                defend = %defend_action,
                attack = %attack_action,
                "attack detected, encounter over"
            );
            self.victor = Some(Player::Defender);
            self.over = true;
        } else if self.attacker.chain_complete() {
            tracing::debug!(turn = dsp_turn, "attack chain complete, encounter over");
            self.victor = Some(Player::Attacker);
            self.over = true;
        }

        self.turn += 1;
        if !self.over && self.turn >= self.config.num_turns {
            tracing::debug!(turn = dsp_turn, "turns exhausted, no victor");
            self.victor = None;
            self.over = true;
        }
        Ok(())
    }

    /// Sweep the attacker's completed history, oldest first, for an
    /// action the primed defend action detects. Faulty attacks are not
    /// detectable. At most one detection per defend action: the first
    /// success is marked expended and the sweep stops.
    fn sweep_attack_history(&mut self, defend_action: Action) -> Option<(Action, Action)> {
        let candidates: Vec<usize> = self
            .attacker
            .history
            .iter()
            .enumerate()
            .filter(|(_, s)| {
                s.action != Action::InProgress && s.completed() && !s.faulty && !s.action.is_noop()
            })
            .map(|(idx, _)| idx)
            .collect();

        for idx in candidates {
            let attack_action = self.attacker.history[idx].action;
            if self
                .resolver
                .action_succeeds(defend_action, attack_action, &mut self.rng)
            {
                if self.config.use_defender_clawback {
                    let reward = self.utility.defend_reward(defend_action, attack_action);
                    let damage = self.utility.defend_damage(defend_action, attack_action);
                    self.attacker.increment_damage(damage);
                    self.defender.increment_reward(reward);
                }
                self.attacker.history[idx].expend();
                return Some((defend_action, attack_action));
            }
            // a failed skirmish keeps sweeping
        }
        None
    }

    /// No detection this round: if the attacker's most recent completed
    /// action is still primed it succeeds, yielding its reward, damaging
    /// the defender, and advancing the chain (no-ops advance nothing).
    fn resolve_undetected_attack(&mut self) {
        let Some(state) = self.attacker.last_completed() else {
            return;
        };
        if !state.primed() {
            return;
        }
        let attack_action = state.action;
        let reward = self.utility.attack_reward(attack_action);
        let damage = self.utility.attack_damage(attack_action);
        self.defender.increment_damage(damage);
        self.attacker.increment_reward(reward);
        if !attack_action.is_noop() {
            self.attacker.advance_stage();
        }
        if let Some(state) = self.attacker.last_completed_mut() {
            state.expend();
        }
    }
}

impl fmt::Display for Encounter {
    /// Debug view, no fixed schema.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "turn {}: attacker at stage {} (utility {}), defender utility {}{}",
            self.turn + 1,
            self.attacker.stage_position,
            self.attacker.utility,
            self.defender.utility,
            if self.over { " [terminal]" } else { "" }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::action_state::ActionState;

    fn config() -> EncounterConfig {
        EncounterConfig {
            num_turns: 12,
            ..EncounterConfig::default()
        }
    }

    #[test]
    fn test_alternation_and_turn_counting() {
        let mut enc = Encounter::new(config()).unwrap();
        assert_eq!(enc.current_player(), Some(Player::Attacker));
        enc.apply_action(Action::S0Advance).unwrap();
        assert_eq!(enc.current_player(), Some(Player::Defender));
        assert_eq!(enc.turns_played(), 1);
        enc.apply_action(Action::S4Detect).unwrap();
        assert_eq!(enc.turns_played(), 2);
        assert_eq!(enc.current_player(), Some(Player::Attacker));
    }

    #[test]
    fn test_detection_ends_encounter() {
        let mut enc = Encounter::new(config()).unwrap();
        enc.apply_action(Action::S0Advance).unwrap();
        assert!(!enc.is_terminal());
        // deterministic skirmish: weak detect catches the noisy advance
        enc.apply_action(Action::S0Detect).unwrap();
        assert!(enc.is_terminal());
        assert_eq!(enc.victor(), Some(Player::Defender));
        // no clawback by default: attacker only paid its cost
        assert_eq!(enc.returns(), (-1, -1));
    }

    #[test]
    fn test_clawback_transfers_value_on_detection() {
        let mut cfg = config();
        cfg.use_defender_clawback = true;
        let mut enc = Encounter::new(cfg).unwrap();
        enc.apply_action(Action::S0Advance).unwrap();
        enc.apply_action(Action::S0Detect).unwrap();
        assert_eq!(enc.victor(), Some(Player::Defender));
        // attacker: -1 cost -2 damage; defender: -1 cost +2 reward
        assert_eq!(enc.returns(), (-3, 1));
    }

    #[test]
    fn test_undetected_attack_rewards_and_advances() {
        let mut enc = Encounter::new(config()).unwrap();
        enc.apply_action(Action::S0Advance).unwrap();
        // a detect aimed at the wrong stage never succeeds
        enc.apply_action(Action::S4Detect).unwrap();
        assert!(!enc.is_terminal());
        assert_eq!(enc.attacker().stage_position, 1);
        // attacker: -1 cost +2 reward; defender: -1 cost -2 damage
        assert_eq!(enc.returns(), (1, -3));
        // the resolved attack is consumed
        assert!(enc.attacker().history[0].expended);
    }

    #[test]
    fn test_terminal_is_sticky() {
        let mut enc = Encounter::new(config()).unwrap();
        enc.apply_action(Action::S0Advance).unwrap();
        enc.apply_action(Action::S0Detect).unwrap();
        assert!(enc.is_terminal());
        assert!(enc.legal_actions(Player::Attacker).is_empty());
        assert!(enc.legal_actions(Player::Defender).is_empty());
        assert!(matches!(
            enc.apply_action(Action::S1Advance),
            Err(SimError::Terminal { .. })
        ));
    }

    #[test]
    fn test_illegal_action_rejected() {
        let mut enc = Encounter::new(config()).unwrap();
        // defend action on the attacker's turn
        assert!(matches!(
            enc.apply_action(Action::S0Detect),
            Err(SimError::IllegalAction { player: Player::Attacker, .. })
        ));
        // stage 1 advance while still at stage 0
        assert!(matches!(
            enc.apply_action(Action::S1Advance),
            Err(SimError::IllegalAction { .. })
        ));
    }

    #[test]
    fn test_legal_actions_track_stage() {
        let mut enc = Encounter::new(config()).unwrap();
        assert_eq!(
            enc.legal_actions(Player::Attacker),
            vec![Action::S0Advance, Action::S0AdvanceCamo]
        );
        enc.apply_action(Action::S0Advance).unwrap();
        enc.apply_action(Action::S4Detect).unwrap();
        assert_eq!(
            enc.legal_actions(Player::Attacker),
            vec![Action::S1Advance, Action::S1AdvanceCamo]
        );
        assert_eq!(enc.legal_actions(Player::Defender).len(), 10);
    }

    #[test]
    fn test_wait_legal_only_when_enabled() {
        let mut cfg = config();
        cfg.use_waits = true;
        let enc = Encounter::new(cfg).unwrap();
        assert!(enc.legal_actions(Player::Attacker).contains(&Action::Wait));
        assert!(enc.legal_actions(Player::Defender).contains(&Action::Wait));
        let enc = Encounter::new(config()).unwrap();
        assert!(!enc.legal_actions(Player::Attacker).contains(&Action::Wait));
    }

    #[test]
    fn test_detection_sweep_takes_earliest_eligible() {
        let mut enc = Encounter::new(config()).unwrap();
        // seed an attacker history by hand: a faulty action, then two
        // detectable ones at the same stage
        enc.attacker
            .history
            .push(ActionState::new(Action::S0Advance, 1, true));
        enc.attacker
            .history
            .push(ActionState::new(Action::S0Advance, 3, false));
        enc.attacker
            .history
            .push(ActionState::new(Action::S0Advance, 5, false));
        enc.current = Player::Defender;

        enc.apply_action(Action::S0Detect).unwrap();
        assert_eq!(enc.victor(), Some(Player::Defender));
        assert!(!enc.attacker.history[0].expended, "faulty entry skipped");
        assert!(enc.attacker.history[1].expended, "earliest eligible detected");
        assert!(!enc.attacker.history[2].expended, "sweep stops after first hit");
    }

    #[test]
    fn test_exhaustion_has_no_victor() {
        let mut cfg = config();
        cfg.num_turns = 4;
        cfg.use_waits = true;
        let mut enc = Encounter::new(cfg).unwrap();
        for _ in 0..2 {
            enc.apply_action(Action::Wait).unwrap();
            enc.apply_action(Action::Wait).unwrap();
        }
        assert!(enc.is_terminal());
        assert_eq!(enc.victor(), None);
        assert_eq!(enc.current_player(), None);
        assert_eq!(enc.turns_played(), 4);
        // waits advance no stage
        assert_eq!(enc.attacker().stage_position, 0);
    }

    #[test]
    fn test_replayable_from_seed() {
        let mut cfg = config();
        cfg.use_timewaits = true;
        cfg.use_chance_fail = true;
        cfg.seed = 42;
        let run = |cfg: EncounterConfig| {
            let mut enc = Encounter::new(cfg).unwrap();
            let mut trace = Vec::new();
            while !enc.is_terminal() {
                let player = enc.current_player().unwrap();
                let action = enc.legal_actions(player)[0];
                enc.apply_action(action).unwrap();
                trace.push(enc.returns());
            }
            (trace, enc.victor())
        };
        assert_eq!(run(cfg.clone()), run(cfg));
    }
}
