//! Math Rush Engine
//!
//! Runs a scripted player through a full game and verifies that the
//! recorded transcript replays to the same state hash.
//!
//! Usage: `math-rush [--config <file.json>] [--seed <u64>] [--mode <name>]`

use anyhow::{bail, Context, Result};
use tracing::info;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use math_rush::{
    DeterministicRng, GameEngine, Mode, Profile, SessionConfig, VERSION, TICK_INTERVAL_MS,
    game::{
        events::GameEventData,
        tick::replay_session,
    },
};

/// Upper bound on simulated ticks for one demo game.
const MAX_DEMO_TICKS: u32 = 100_000;

struct Args {
    config: SessionConfig,
    seed: u64,
    mode: Mode,
}

fn main() -> Result<()> {
    // Initialize logging
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to set tracing subscriber")?;

    let args = parse_args()?;

    info!("Math Rush Engine v{}", VERSION);
    info!("Tick interval: {} ms", TICK_INTERVAL_MS);

    demo_game(args)
}

fn parse_args() -> Result<Args> {
    let mut args = Args {
        config: SessionConfig::default(),
        seed: 12345,
        mode: Mode::Mixed,
    };

    let mut iter = std::env::args().skip(1);
    while let Some(flag) = iter.next() {
        let value = iter.next().with_context(|| format!("Missing value for {}", flag))?;
        match flag.as_str() {
            "--config" => {
                let json = std::fs::read_to_string(&value)
                    .with_context(|| format!("Failed to read config {}", value))?;
                args.config = SessionConfig::from_json(&json)
                    .with_context(|| format!("Failed to load config {}", value))?;
            }
            "--seed" => {
                args.seed = value.parse().with_context(|| format!("Invalid seed {}", value))?;
            }
            "--mode" => {
                args.mode = match Mode::ALL.iter().find(|m| m.name().eq_ignore_ascii_case(&value)) {
                    Some(mode) => *mode,
                    None => bail!("Unknown mode {}", value),
                };
            }
            other => bail!("Unknown argument {}", other),
        }
    }

    Ok(args)
}

/// Play one game with a scripted player that slows down as levels rise.
fn demo_game(args: Args) -> Result<()> {
    info!("=== Starting Demo Game ===");
    info!("Seed: {}, mode: {}", args.seed, args.mode);

    let dt = TICK_INTERVAL_MS as f64 / 1000.0;
    let mut engine = GameEngine::new(args.config, Profile::default(), args.seed)
        .context("Invalid session config")?;
    let mut bot = DeterministicRng::new(args.seed ^ 0xB07);

    engine.start_game(args.mode)?;

    let mut think_ticks = 0u32;
    let mut total_events = 0usize;

    for _ in 0..MAX_DEMO_TICKS {
        let snapshot = engine.snapshot();

        if snapshot.is_over {
            break;
        }

        if snapshot.is_awaiting_continue {
            info!("Out of time, spending a continue ({} left)", snapshot.health);
            let events = engine.continue_after_timeout()?;
            total_events += log_events(&events);
            continue;
        }

        if think_ticks == 0 {
            think_ticks = 5 + snapshot.level * 4 + bot.next_int(10);
        }
        think_ticks -= 1;

        if think_ticks == 0 {
            if let Some(problem) = &snapshot.current_problem {
                // One in five answers is a guess
                let value = if bot.next_int(5) == 0 {
                    problem.options[bot.next_int(4) as usize]
                } else {
                    problem.correct_answer
                };
                let events = engine.submit_answer(value)?;
                total_events += log_events(&events);
            }
        }

        let result = engine.tick(dt);
        total_events += log_events(&result.events);
    }

    if !engine.state().is_over() {
        info!("Demo tick budget exhausted, resetting");
        engine.reset_game()?;
    }

    // Print final results
    info!("=== Game Results ===");
    let state = engine.state();
    let hash = state.compute_hash();
    info!(
        "Score {} | level {} | best streak {} | accuracy {:.1}%",
        state.score,
        state.level,
        state.best_streak,
        state.accuracy()
    );
    info!("Rank: {}", state.rank());
    info!("Total events: {}", total_events);
    info!("Final State Hash: {}", hex::encode(hash));

    let profile_json = serde_json::to_string_pretty(engine.profile())
        .context("Failed to serialize profile")?;
    println!("{}", profile_json);

    // Verify determinism by replaying
    info!("=== Verifying Determinism ===");
    let transcript = engine.transcript().context("No transcript recorded")?;
    info!("Replaying {} actions ({} non-tick)", transcript.actions.len(), transcript.user_action_count());

    let (replayed, _) = replay_session(transcript, engine.config());
    let replay_hash = replayed.compute_hash();
    info!("Replay State Hash: {}", hex::encode(replay_hash));

    if hash != replay_hash {
        bail!("Determinism failure: replay hash differs");
    }
    info!("DETERMINISM VERIFIED: Hashes match!");

    Ok(())
}

/// Log the interesting events; returns how many there were.
fn log_events(events: &[math_rush::game::GameEvent]) -> usize {
    for event in events {
        match &event.data {
            GameEventData::LevelUp { new_level, perfect, .. } => {
                info!("Level {}{}", new_level, if *perfect { " (perfect)" } else { "" });
            }
            GameEventData::AchievementUnlocked { id } => {
                info!("Achievement: {} - {}", id.title(), id.description());
            }
            GameEventData::RankChanged { new_rank, .. } => {
                info!("Rank now {}", new_rank);
            }
            GameEventData::ComboActivated { multiplier, streak } => {
                info!("Combo x{} at streak {}", multiplier, streak);
            }
            GameEventData::GameOver { summary } => {
                info!("Game over with {} points", summary.score);
            }
            _ => {}
        }
    }
    events.len()
}
