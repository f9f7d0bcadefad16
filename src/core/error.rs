use thiserror::Error;

use crate::arena::actions::{Action, Player};

#[derive(Error, Debug)]
pub enum SimError {
    // Configuration errors. These surface at load time, before any
    // encounter runs.
    #[error("unresolved derived utility for {0}")]
    UnresolvedUtility(Action),

    #[error("no utility entry for {0}")]
    MissingUtility(Action),

    #[error("negative cost {1} for {0}")]
    NegativeCost(Action, i64),

    #[error("bidirectional skirmish pair: {0} vs {1}")]
    BidirectionalSkirmish(Action, Action),

    #[error("probability {1} out of range for {0}")]
    ProbabilityOutOfRange(Action, f64),

    #[error("malformed delay range for {action}: min {min} > max {max}")]
    MalformedDelayRange { action: Action, min: u32, max: u32 },

    #[error("encounter length must be a positive even number of turns: {0}")]
    OddEncounterLength(u32),

    #[error("unknown preset name: {0}")]
    UnknownPreset(String),

    #[error("strategy update parameter {0} outside (0, 1]")]
    UpdateParameterOutOfRange(f64),

    // Invariant violations. These indicate a driver bug and abort the
    // encounter.
    #[error("{player} initiated {action} while {pending} still has {remaining} delay turns")]
    ActionAlreadyPending {
        player: Player,
        action: Action,
        pending: Action,
        remaining: u32,
    },

    #[error("{player} advanced InProgress with no action pending")]
    NothingInProgress { player: Player },

    #[error("action applied to terminal encounter (after turn {turn})")]
    Terminal { turn: u32 },

    #[error("{action} is not legal for {player} this turn")]
    IllegalAction { player: Player, action: Action },
}

pub type Result<T> = std::result::Result<T, SimError>;
