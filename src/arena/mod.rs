//! Static action catalog and the configurable numeric tables that govern
//! outcome resolution.

pub mod actions;
pub mod resolver;
pub mod utility;

pub use actions::{Action, Player, NUM_STAGES};
pub use resolver::{DelayRange, OutcomeResolver};
pub use utility::{Utility, UtilityModel, UtilityValue};
