//! Per-action delay state machine
//!
//! One record per entry in a player's history. An initiated action either
//! resolves immediately (delay 0) or counts down one turn per InProgress
//! application by its owner. Faultiness is drawn once at initiation and
//! never re-rolled; `expended` is set once when a later detection sweep or
//! undetected-success pass consumes the action. Records are never removed
//! from history.

use std::fmt;

use crate::arena::actions::Action;

#[derive(Debug, Clone)]
pub struct ActionState {
    pub action: Action,
    /// 1-based turn number the action was initiated on.
    pub from_turn: u32,
    pub turns_remaining: u32,
    pub initial_delay: u32,
    /// Result of the general-failure draw, cached at initiation.
    pub faulty: bool,
    pub expended: bool,
}

impl ActionState {
    pub fn new(action: Action, from_turn: u32, faulty: bool) -> Self {
        Self {
            action,
            from_turn,
            turns_remaining: 0,
            initial_delay: 0,
            faulty,
            expended: false,
        }
    }

    /// Still counting down. Faulty actions complete their delay sequence
    /// like any other.
    pub fn in_progress(&self) -> bool {
        self.turns_remaining > 0
    }

    pub fn completed(&self) -> bool {
        !self.in_progress()
    }

    pub fn was_delayed(&self) -> bool {
        self.initial_delay > 0
    }

    /// Finished its delay, not faulty, and not yet consumed.
    pub fn primed(&self) -> bool {
        self.completed() && !self.faulty && !self.expended
    }

    pub fn set_delay(&mut self, turns: u32) {
        self.initial_delay = turns;
        self.turns_remaining = turns;
    }

    /// Consume one delay turn. Caller guarantees `in_progress`.
    pub fn take_turn(&mut self) {
        debug_assert!(self.in_progress(), "no delay turns to take");
        self.turns_remaining -= 1;
    }

    pub fn expend(&mut self) {
        self.expended = true;
    }
}

impl fmt::Display for ActionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[ from turn: {} turns left: {} action: {} ]",
            self.from_turn, self.turns_remaining, self.action
        )
    }
}
