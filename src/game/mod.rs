//! Game Logic Module
//!
//! The Math Rush session engine. Deterministic given a seed and an action list.
//!
//! ## Module Structure
//!
//! - `problem`: Arithmetic problem generation with distractors
//! - `state`: Session state, phase and summary
//! - `tick`: Lifecycle, countdown and action dispatch
//! - `answer`: Answer scoring, level-ups, achievements, rank
//! - `scoring`: Score and penalty formulas
//! - `rank`: Rank tiers derived from rank points
//! - `achievement`: Achievement ids and milestone checks
//! - `input`: Actions and replay transcripts
//! - `events`: Game events for the presentation and profile

pub mod problem;
pub mod state;
pub mod tick;
pub mod answer;
pub mod scoring;
pub mod rank;
pub mod achievement;
pub mod input;
pub mod events;

// Re-export key types
pub use problem::{generate, Mode, Operation, Problem};
pub use state::{GameSummary, SessionPhase, SessionState};
pub use tick::{
    apply_action, replay_session, ActionError, ActionResult, ConfigError, FeatureFlags,
    SessionConfig, TickResult,
};
pub use rank::{rank_from_points, Rank, Tier};
pub use achievement::AchievementId;
pub use input::{Action, SessionTranscript};
pub use events::{GameEvent, GameEventData};
