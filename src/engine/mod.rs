//! Turn-resolution engine: delayed-action state machine, player ledgers,
//! and the encounter orchestrator.

pub mod action_state;
pub mod descriptor;
pub mod encounter;
pub mod ledger;

pub use action_state::ActionState;
pub use descriptor::GameDescriptor;
pub use encounter::Encounter;
pub use ledger::PlayerLedger;
