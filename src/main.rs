//! Ooze Arena headless runner
//!
//! Plays a scripted match and prints a JSON summary of the final state.
//!
//! Usage: `ooze-arena [config.json] [ticks] [seed]`

fn main() {
    env_logger::init();
    log::info!("Ooze Arena (headless) starting...");

    if let Err(e) = run() {
        log::error!("{}", e);
        std::process::exit(1);
    }
}

fn run() -> ooze_arena::Result<()> {
    use ooze_arena::consts::TICK_RATE;
    use ooze_arena::game::LogFlow;
    use ooze_arena::sim::{BlobId, PlayerInput, TickInput};
    use ooze_arena::{Game, SimConfig};

    let mut args = std::env::args().skip(1);
    let config = match args.next() {
        Some(path) if path != "-" => SimConfig::load(&path)?,
        _ => SimConfig::default(),
    };
    let ticks: u64 = args
        .next()
        .and_then(|s| s.parse().ok())
        .unwrap_or((TICK_RATE * 60.0) as u64);
    let seed: u64 = args.next().and_then(|s| s.parse().ok()).unwrap_or(12345);

    let players = config.players;
    let mut game = Game::new(config, seed, Box::new(LogFlow))?;

    for t in 0..ticks {
        // Every player circles the arena center and fires periodically
        let center = game.world().arena_center();
        let input = TickInput {
            players: game
                .world()
                .living_players()
                .into_iter()
                .filter_map(|id| {
                    let anchor = game.world().blob(id)?.anchor()?;
                    let pos = game.world().particles()[anchor].pos;
                    let to_center = (center - pos).normalize_or_zero();
                    Some(PlayerInput {
                        blob: id,
                        steer: (to_center + to_center.perp() * 0.8).normalize_or_zero(),
                        fire: (t + id.0 as u64 * 7) % 24 == 0,
                    })
                })
                .collect(),
        };
        game.step(input)?;

        if game.outcome().is_some() {
            log::info!("Match decided after {} ticks", t + 1);
            break;
        }
        if t % 300 == 0 {
            log::debug!(
                "Tick {}: {} particles",
                game.now(),
                game.world().particle_count()
            );
        }
    }

    let snapshot = game.world().snapshot();
    let summary = serde_json::json!({
        "seed": seed,
        "tick": game.now(),
        "players": players,
        "outcome": game.outcome(),
        "particles": snapshot.particles.len(),
        "blobs": snapshot.blobs,
    });
    println!("{}", serde_json::to_string_pretty(&summary)?);

    if let Some(neutral) = game.world().blob(BlobId::NEUTRAL) {
        log::info!("Neutral particles left: {}", neutral.len());
    }
    Ok(())
}
