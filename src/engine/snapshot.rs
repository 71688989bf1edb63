//! Read-only view of the engine for the presentation layer.

use serde::{Serialize, Deserialize};

use crate::game::achievement::AchievementId;
use crate::game::problem::{Mode, Problem};
use crate::game::rank::Rank;
use crate::game::state::{SessionPhase, SessionState};

/// Everything a screen needs to draw one frame.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EngineSnapshot {
    pub phase: SessionPhase,
    pub mode: Mode,
    pub score: u32,
    pub level: u32,
    pub streak: u32,
    pub combo_multiplier: u32,
    pub combo_active: bool,
    pub time_remaining: f64,
    pub health: u8,
    pub current_problem: Option<Problem>,
    pub is_active: bool,
    pub is_over: bool,
    pub is_awaiting_continue: bool,
    /// Presentation pause flag as last set
    pub paused: bool,
    pub accuracy: f64,
    pub rank: Rank,
    pub unlocked_this_session: Vec<AchievementId>,
    /// Hex SHA-256 of the session state
    pub state_hash: String,
}

impl EngineSnapshot {
    /// Capture the current session.
    pub fn capture(state: &SessionState, paused: bool) -> Self {
        Self {
            phase: state.phase,
            mode: state.mode,
            score: state.score,
            level: state.level,
            streak: state.streak,
            combo_multiplier: state.combo_multiplier,
            combo_active: state.combo_active(),
            time_remaining: state.time_remaining,
            health: state.health,
            current_problem: state.current_problem.clone(),
            is_active: state.is_active(),
            is_over: state.is_over(),
            is_awaiting_continue: state.is_awaiting_continue(),
            paused,
            accuracy: state.accuracy(),
            rank: state.rank(),
            unlocked_this_session: state.unlocked_this_session.iter().copied().collect(),
            state_hash: hex::encode(state.compute_hash()),
        }
    }
}
