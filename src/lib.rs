//! # Math Rush Engine
//!
//! Deterministic game-state engine for the Math Rush arithmetic quiz:
//! problem generation, scoring, streaks and combos, levels, the
//! health/continue flow, rank progression and achievements.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      MATH RUSH ENGINE                        │
//! ├─────────────────────────────────────────────────────────────┤
//! │  core/           - Deterministic primitives                  │
//! │  ├── rng.rs      - Deterministic Xorshift128+ PRNG           │
//! │  └── hash.rs     - State hashing for verification            │
//! │                                                              │
//! │  game/           - Session logic (deterministic)             │
//! │  ├── problem.rs  - Problem and distractor generation         │
//! │  ├── state.rs    - Session state and summary                 │
//! │  ├── tick.rs     - Lifecycle, countdown, action dispatch     │
//! │  ├── answer.rs   - Answer scoring and progression            │
//! │  ├── scoring.rs  - Score formulas                            │
//! │  ├── rank.rs     - Rank tiers                                │
//! │  ├── achievement.rs - Achievement milestones                 │
//! │  ├── input.rs    - Actions and transcripts                   │
//! │  └── events.rs   - Events for presentation and profile       │
//! │                                                              │
//! │  engine/         - Host integration (non-deterministic)      │
//! │  ├── profile.rs  - Profile store boundary                    │
//! │  ├── session.rs  - GameEngine facade                         │
//! │  ├── snapshot.rs - Presentation snapshot                     │
//! │  └── runtime.rs  - tokio command loop and tick timer         │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Determinism Guarantee
//!
//! The `core/` and `game/` modules are deterministic:
//! - No HashMap (uses BTreeSet for sorted iteration)
//! - No system time; the countdown only moves with `tick(dt)`
//! - All randomness from seeded Xorshift128+
//!
//! Given the same seed and the same action transcript, a session ends in
//! the same state with the same state hash.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod core;
pub mod game;
pub mod engine;

// Re-export commonly used types
pub use core::rng::DeterministicRng;
pub use game::problem::{generate, Mode, Problem};
pub use game::state::{SessionPhase, SessionState};
pub use game::tick::SessionConfig;
pub use game::input::Action;
pub use engine::{GameEngine, Profile, ProfileStore, EngineSnapshot};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Countdown tick period of the runtime (milliseconds)
pub const TICK_INTERVAL_MS: u64 = 100;
