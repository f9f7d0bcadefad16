//! Per-player ledger: history, running utility, and per-turn traces
//!
//! The history vector is append-only; InProgress pseudo-actions are
//! recorded alongside real actions so the ledger is a complete replay of
//! the player's turns. All views over it (completed history, last primed
//! state) are computed queries, never duplicated state.

use rand_chacha::ChaCha8Rng;

use crate::arena::actions::{Action, Player, NUM_STAGES};
use crate::arena::resolver::OutcomeResolver;
use crate::core::error::{Result, SimError};
use crate::engine::action_state::ActionState;

#[derive(Debug, Clone)]
pub struct PlayerLedger {
    pub player: Player,
    /// Running utility total.
    pub utility: i64,
    /// Every action this player has taken, including InProgress fillers.
    pub history: Vec<ActionState>,
    /// Per-encounter-turn traces; one entry per applied action (either
    /// player's), so cross-ledger credits land in the current turn's slot.
    pub costs: Vec<i64>,
    pub rewards: Vec<i64>,
    pub damages: Vec<i64>,
    pub utilities: Vec<i64>,
    /// Attacker only: escalation stages completed so far.
    pub stage_position: usize,
}

impl PlayerLedger {
    pub fn new(player: Player) -> Self {
        Self {
            player,
            utility: 0,
            history: Vec::new(),
            costs: Vec::new(),
            rewards: Vec::new(),
            damages: Vec::new(),
            utilities: Vec::new(),
            stage_position: 0,
        }
    }

    // --- history queries ---

    pub fn action_history(&self) -> Vec<Action> {
        self.history.iter().map(|s| s.action).collect()
    }

    /// All real (non-InProgress) entries that have finished their delay,
    /// oldest first.
    pub fn completed_history(&self) -> impl Iterator<Item = &ActionState> {
        self.history
            .iter()
            .filter(|s| s.action != Action::InProgress && s.completed())
    }

    /// The most recent real entry, even if still counting down.
    pub fn last_asserted(&self) -> Option<&ActionState> {
        self.history
            .iter()
            .rev()
            .find(|s| s.action != Action::InProgress)
    }

    fn last_asserted_mut(&mut self) -> Option<&mut ActionState> {
        self.history
            .iter_mut()
            .rev()
            .find(|s| s.action != Action::InProgress)
    }

    /// The most recent real entry that has finished its delay.
    pub fn last_completed(&self) -> Option<&ActionState> {
        self.history
            .iter()
            .rev()
            .find(|s| s.action != Action::InProgress && s.completed())
    }

    pub(crate) fn last_completed_mut(&mut self) -> Option<&mut ActionState> {
        self.history
            .iter_mut()
            .rev()
            .find(|s| s.action != Action::InProgress && s.completed())
    }

    /// True while a delayed action is still counting down; the only legal
    /// move is then InProgress.
    pub fn has_pending(&self) -> bool {
        self.last_asserted().is_some_and(|s| s.in_progress())
    }

    // --- attacker chain position ---

    pub fn chain_complete(&self) -> bool {
        self.stage_position == NUM_STAGES
    }

    pub fn advance_stage(&mut self) {
        debug_assert!(self.stage_position < NUM_STAGES);
        self.stage_position += 1;
        tracing::debug!(player = %self.player, stage = self.stage_position, "stage advanced");
    }

    // --- per-turn traces ---

    /// Open this turn's slot in each trace array. Called once per applied
    /// action, for both ledgers.
    pub(crate) fn begin_turn_entry(&mut self) {
        self.costs.push(0);
        self.rewards.push(0);
        self.damages.push(0);
        self.utilities.push(0);
    }

    pub(crate) fn increment_cost(&mut self, inc: i64) {
        let inc = inc.abs();
        if let Some(slot) = self.costs.last_mut() {
            *slot += inc;
        }
        self.utility -= inc;
    }

    pub(crate) fn increment_reward(&mut self, inc: i64) {
        let inc = inc.abs();
        if let Some(slot) = self.rewards.last_mut() {
            *slot += inc;
        }
        self.utility += inc;
    }

    /// Returns the damage actually applied, for mirroring into the
    /// opponent's reward.
    pub(crate) fn increment_damage(&mut self, inc: i64) -> i64 {
        let inc = inc.abs();
        if let Some(slot) = self.damages.last_mut() {
            *slot += inc;
        }
        self.utility -= inc;
        inc
    }

    pub(crate) fn record_utility(&mut self) {
        if let Some(slot) = self.utilities.last_mut() {
            *slot = self.utility;
        }
    }

    pub fn last_cost(&self) -> i64 {
        self.costs.last().copied().unwrap_or(0)
    }

    pub fn last_reward(&self) -> i64 {
        self.rewards.last().copied().unwrap_or(0)
    }

    pub fn last_damage(&self) -> i64 {
        self.damages.last().copied().unwrap_or(0)
    }

    /// Net result of the most recent turn.
    pub fn last_result(&self) -> i64 {
        self.last_reward() - self.last_cost() - self.last_damage()
    }

    // --- the delayed-action state machine entry point ---

    /// Initiate a new action, or advance the pending one with InProgress.
    ///
    /// Initiation draws the general-failure check once and samples the
    /// delay; a zero delay resolves immediately. Initiating while another
    /// action is still counting down is a driver bug, as is advancing
    /// InProgress with nothing pending.
    pub(crate) fn apply(
        &mut self,
        action: Action,
        resolver: &OutcomeResolver,
        rng: &mut ChaCha8Rng,
        turn: u32,
    ) -> Result<()> {
        if action == Action::InProgress {
            // record the filler, then advance the pending action
            self.history.push(ActionState::new(action, turn, false));
            let player = self.player;
            let pending = self
                .last_asserted_mut()
                .filter(|s| s.in_progress())
                .ok_or(SimError::NothingInProgress { player })?;
            pending.take_turn();
            if pending.completed() {
                tracing::debug!(
                    %player,
                    turn,
                    action = %pending.action,
                    from_turn = pending.from_turn,
                    faulty = pending.faulty,
                    "delayed action resolved"
                );
            }
            return Ok(());
        }

        if let Some(pending) = self.last_asserted().filter(|s| s.in_progress()) {
            return Err(SimError::ActionAlreadyPending {
                player: self.player,
                action,
                pending: pending.action,
                remaining: pending.turns_remaining,
            });
        }

        // no-ops never fail; real actions draw exactly once, here
        let faulty = resolver.action_is_faulty(action, rng).unwrap_or(false);
        let mut state = ActionState::new(action, turn, faulty);
        let delay = resolver.sample_delay(action, rng);
        state.set_delay(delay);
        if delay > 0 {
            tracing::debug!(
                player = %self.player,
                turn,
                %action,
                delay,
                "action initiated, resolving after delay"
            );
        }
        self.history.push(state);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    fn fixture() -> (PlayerLedger, OutcomeResolver, ChaCha8Rng) {
        (
            PlayerLedger::new(Player::Attacker),
            OutcomeResolver::new(false, false).unwrap(),
            ChaCha8Rng::seed_from_u64(11),
        )
    }

    #[test]
    fn test_immediate_initiation_is_completed() {
        let (mut ledger, resolver, mut rng) = fixture();
        ledger.apply(Action::S0Advance, &resolver, &mut rng, 1).unwrap();
        assert!(!ledger.has_pending());
        let last = ledger.last_completed().unwrap();
        assert_eq!(last.action, Action::S0Advance);
        assert!(last.primed());
    }

    #[test]
    fn test_delayed_initiation_counts_down() {
        let mut ledger = PlayerLedger::new(Player::Attacker);
        let resolver = OutcomeResolver::new(true, false).unwrap();
        let mut rng = ChaCha8Rng::seed_from_u64(11);
        ledger.apply(Action::S0AdvanceCamo, &resolver, &mut rng, 1).unwrap();
        let delay = ledger.last_asserted().unwrap().initial_delay;
        assert!((2..=3).contains(&delay));
        for step in 0..delay {
            assert!(ledger.has_pending(), "still pending after {step} steps");
            ledger
                .apply(Action::InProgress, &resolver, &mut rng, 3 + 2 * step)
                .unwrap();
        }
        assert!(!ledger.has_pending());
        assert!(ledger.last_completed().unwrap().primed());
        // history keeps the fillers
        assert_eq!(ledger.history.len() as u32, 1 + delay);
    }

    #[test]
    fn test_initiating_over_pending_is_violation() {
        let mut ledger = PlayerLedger::new(Player::Attacker);
        let resolver = OutcomeResolver::new(true, false).unwrap();
        let mut rng = ChaCha8Rng::seed_from_u64(11);
        ledger.apply(Action::S0AdvanceCamo, &resolver, &mut rng, 1).unwrap();
        let result = ledger.apply(Action::S0Advance, &resolver, &mut rng, 3);
        assert!(matches!(
            result,
            Err(SimError::ActionAlreadyPending {
                player: Player::Attacker,
                action: Action::S0Advance,
                pending: Action::S0AdvanceCamo,
                ..
            })
        ));
    }

    #[test]
    fn test_in_progress_without_pending_is_violation() {
        let (mut ledger, resolver, mut rng) = fixture();
        let result = ledger.apply(Action::InProgress, &resolver, &mut rng, 1);
        assert!(matches!(result, Err(SimError::NothingInProgress { .. })));
    }

    #[test]
    fn test_turn_traces_accumulate() {
        let (mut ledger, _, _) = fixture();
        ledger.begin_turn_entry();
        ledger.increment_cost(2);
        ledger.increment_reward(5);
        let applied = ledger.increment_damage(1);
        ledger.record_utility();
        assert_eq!(applied, 1);
        assert_eq!(ledger.utility, 2);
        assert_eq!(ledger.last_result(), 5 - 2 - 1);
        assert_eq!(ledger.utilities, vec![2]);
    }

    #[test]
    fn test_completed_history_excludes_pending_tail() {
        let mut ledger = PlayerLedger::new(Player::Attacker);
        let resolver = OutcomeResolver::new(true, false).unwrap();
        let mut rng = ChaCha8Rng::seed_from_u64(2);
        // force a zero-delay entry by hand, then a delayed one
        ledger.history.push(ActionState::new(Action::S0Advance, 1, false));
        ledger.apply(Action::S1AdvanceCamo, &resolver, &mut rng, 3).unwrap();
        let completed: Vec<_> = ledger.completed_history().map(|s| s.action).collect();
        assert_eq!(completed, vec![Action::S0Advance]);
    }
}
