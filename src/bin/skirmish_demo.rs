//! Run one policy-driven encounter and log the turn trace.
//!
//! Usage: skirmish_demo [seed]
//! Set RUST_LOG=debug to see the engine's resolution events.

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use killchain::arena::{Player, UtilityModel};
use killchain::core::config::EncounterConfig;
use killchain::engine::{Encounter, GameDescriptor};
use killchain::policy::{Policy, StrategyKind, StrategyPolicy};

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let seed = std::env::args()
        .nth(1)
        .and_then(|s| s.parse().ok())
        .unwrap_or(0);

    let config = EncounterConfig {
        num_turns: 30,
        use_timewaits: true,
        use_chance_fail: true,
        seed,
        ..EncounterConfig::default()
    };

    if let Err(err) = run(config) {
        tracing::error!(%err, "encounter failed");
        std::process::exit(1);
    }
}

fn run(config: EncounterConfig) -> killchain::core::Result<()> {
    let descriptor = GameDescriptor::new(&config)?;
    tracing::info!(
        name = descriptor.short_name,
        turns = descriptor.max_game_length,
        max_utility = descriptor.max_utility,
        "starting encounter"
    );

    let utility = UtilityModel::new(config.advancement_rewards, config.detection_costs)?;
    let mut attacker = StrategyPolicy::new(
        StrategyKind::UniformRandom.build(Player::Attacker, &utility, config.seed)?,
        config.seed,
    );
    let mut defender = StrategyPolicy::new(
        StrategyKind::IndependentIntervals.build(Player::Defender, &utility, config.seed)?,
        config.seed.wrapping_add(1),
    );
    let mut picker = ChaCha8Rng::seed_from_u64(config.seed.wrapping_add(2));

    let mut enc = Encounter::new(config)?;
    while !enc.is_terminal() {
        let player = match enc.current_player() {
            Some(p) => p,
            None => break,
        };
        let probs = match player {
            Player::Attacker => attacker.action_probabilities(&enc, player),
            Player::Defender => defender.action_probabilities(&enc, player),
        };
        let action = match sample(&probs, &mut picker) {
            Some(action) => action,
            None => break,
        };
        enc.apply_action(action)?;
        tracing::info!(
            turn = enc.turns_played(),
            action = %enc.action_to_string(player, action),
            attacker = enc.attacker().utility,
            defender = enc.defender().utility,
            "applied"
        );
    }

    match enc.victor() {
        Some(player) => tracing::info!(%player, "victory"),
        None => tracing::info!("turns exhausted, no victor"),
    }
    tracing::info!(returns = ?enc.returns(), "{enc}");
    Ok(())
}

fn sample(
    probs: &std::collections::HashMap<killchain::arena::Action, f64>,
    rng: &mut ChaCha8Rng,
) -> Option<killchain::arena::Action> {
    use rand::Rng;
    let total: f64 = probs.values().sum();
    if total <= 0.0 {
        return None;
    }
    let mut draw = rng.gen::<f64>() * total;
    for (action, p) in probs {
        draw -= p;
        if draw <= 0.0 {
            return Some(*action);
        }
    }
    probs.keys().next().copied()
}
