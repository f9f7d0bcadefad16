//! Independent-interval selection.
//!
//! Each action carries a period. A per-action counter starts at the
//! period and counts down one per consulted turn; the most overdue
//! legal action (lowest counter, negatives accumulate) is chosen and
//! its counter resets to the period. Co-scheduled actions are split by
//! a configurable tie order.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::arena::actions::Action;
use crate::arena::utility::UtilityModel;
use crate::policy::Strategy;

/// Order applied when several actions are equally overdue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TieBreak {
    /// Lowest-numbered action wins.
    First,
    /// Highest-numbered action wins.
    Last,
    /// Cheapest action wins.
    Cheapest,
    /// Most expensive action wins.
    MostExpensive,
}

#[derive(Debug, Clone)]
pub struct IndependentIntervals {
    intervals: HashMap<Action, u32>,
    staleness: HashMap<Action, i64>,
    tie_break: TieBreak,
    utility: UtilityModel,
}

impl IndependentIntervals {
    /// Zero-period entries are dropped: a period of zero means never
    /// run that action.
    pub fn new(
        intervals: HashMap<Action, u32>,
        tie_break: TieBreak,
        utility: UtilityModel,
    ) -> Self {
        let intervals: HashMap<Action, u32> = intervals
            .into_iter()
            .filter(|(_, period)| *period > 0)
            .collect();
        let staleness = intervals
            .iter()
            .map(|(a, period)| (*a, i64::from(*period)))
            .collect();
        Self {
            intervals,
            staleness,
            tie_break,
            utility,
        }
    }

    /// Default periods: each action's index in `actions`, so earlier
    /// actions run more often and the first (period zero) never runs.
    pub fn with_defaults(actions: &[Action], utility: UtilityModel) -> Self {
        let intervals = actions
            .iter()
            .enumerate()
            .map(|(i, a)| (*a, i as u32))
            .collect();
        Self::new(intervals, TieBreak::First, utility)
    }

    pub fn intervals(&self) -> &HashMap<Action, u32> {
        &self.intervals
    }

    fn break_tie(&self, tied: &[Action]) -> Option<Action> {
        match self.tie_break {
            TieBreak::First => tied.iter().copied().min(),
            TieBreak::Last => tied.iter().copied().max(),
            TieBreak::Cheapest => self.utility.least_expensive(tied),
            TieBreak::MostExpensive => self.utility.most_expensive(tied),
        }
    }
}

impl Strategy for IndependentIntervals {
    fn select(&mut self, legal: &[Action]) -> Option<Action> {
        for count in self.staleness.values_mut() {
            *count -= 1;
        }
        let most_overdue = legal
            .iter()
            .filter_map(|a| self.staleness.get(a).map(|c| *c))
            .min()?;
        let tied: Vec<Action> = legal
            .iter()
            .copied()
            .filter(|a| self.staleness.get(a) == Some(&most_overdue))
            .collect();
        let chosen = self.break_tie(&tied)?;
        let period = i64::from(self.intervals[&chosen]);
        self.staleness.insert(chosen, period);
        Some(chosen)
    }
}
