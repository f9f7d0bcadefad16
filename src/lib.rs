//! Killchain - adversarial kill-chain encounter simulation core

pub mod arena;
pub mod core;
pub mod engine;
pub mod policy;
