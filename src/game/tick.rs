//! Session Lifecycle and Countdown
//!
//! The state machine `NotStarted -> Active -> {AwaitingContinue -> Active | GameOver}`.
//! Every stimulus goes through one function here (answers live in
//! [`crate::game::answer`]); [`apply_action`] is the single dispatch point.

use serde::{Serialize, Deserialize};
use tracing::{debug, info};

use crate::game::answer::submit_answer;
use crate::game::events::GameEvent;
use crate::game::input::{Action, SessionTranscript};
use crate::game::problem::{generate, Mode};
use crate::game::state::{SessionPhase, SessionState};

// =============================================================================
// CONFIGURATION
// =============================================================================

/// Optional features. Turning them off reproduces the earlier, simpler
/// versions of the game.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeatureFlags {
    /// Honour the requested mode (off: every game is `Mixed`)
    pub mode_selection: bool,
    /// Health / continue mechanic (off: time-out ends the game)
    pub health: bool,
    /// Rank point tracking
    pub rank: bool,
    /// Achievement unlocks
    pub achievements: bool,
}

impl Default for FeatureFlags {
    fn default() -> Self {
        Self {
            mode_selection: true,
            health: true,
            rank: true,
            achievements: true,
        }
    }
}

/// Configuration for session simulation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Countdown at game start (seconds)
    pub initial_time: f64,
    /// Countdown ceiling (seconds)
    pub max_time: f64,
    /// Countdown after a continue (seconds)
    pub continue_time: f64,
    /// Seconds added on level-up
    pub level_up_time_bonus: f64,
    /// Correct answers per level
    pub answers_per_level: u32,
    /// Continues at game start
    pub initial_health: u8,
    /// Answers faster than this (seconds) earn the fast bonus
    pub fast_answer_threshold: f64,
    /// Score bonus for a level cleared without mistakes
    pub perfect_level_bonus: u32,
    /// Optional features
    pub features: FeatureFlags,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            initial_time: 30.0,
            max_time: 60.0,
            continue_time: 15.0,
            level_up_time_bonus: 15.0,
            answers_per_level: 5,
            initial_health: 2,
            fast_answer_threshold: 2.0,
            perfect_level_bonus: 200,
            features: FeatureFlags::default(),
        }
    }
}

impl SessionConfig {
    /// Parse a config from JSON. Missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: SessionConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Check value ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.initial_time.is_finite() && self.initial_time > 0.0) {
            return Err(ConfigError::Invalid {
                field: "initial_time",
                requirement: "a positive number of seconds",
            });
        }
        if !(self.max_time.is_finite() && self.max_time >= self.initial_time) {
            return Err(ConfigError::Invalid {
                field: "max_time",
                requirement: "at least initial_time",
            });
        }
        if !(self.continue_time > 0.0 && self.continue_time <= self.max_time) {
            return Err(ConfigError::Invalid {
                field: "continue_time",
                requirement: "positive and at most max_time",
            });
        }
        if !(self.level_up_time_bonus.is_finite() && self.level_up_time_bonus >= 0.0) {
            return Err(ConfigError::Invalid {
                field: "level_up_time_bonus",
                requirement: "zero or more seconds",
            });
        }
        if self.answers_per_level == 0 {
            return Err(ConfigError::Invalid {
                field: "answers_per_level",
                requirement: "at least 1",
            });
        }
        if !(self.fast_answer_threshold.is_finite() && self.fast_answer_threshold >= 0.0) {
            return Err(ConfigError::Invalid {
                field: "fast_answer_threshold",
                requirement: "zero or more seconds",
            });
        }
        Ok(())
    }

    /// Health a new game starts with.
    pub fn starting_health(&self) -> u8 {
        if self.features.health {
            self.initial_health
        } else {
            0
        }
    }
}

/// Config errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Malformed JSON.
    #[error("Invalid config JSON: {0}")]
    Parse(#[from] serde_json::Error),

    /// A value is out of range.
    #[error("Invalid config: {field} must be {requirement}")]
    Invalid {
        field: &'static str,
        requirement: &'static str,
    },
}

/// Action errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ActionError {
    /// The action is not valid in the current phase; nothing changed.
    #[error("{action} ignored while {phase}")]
    InvalidPhase {
        action: &'static str,
        phase: SessionPhase,
    },
}

/// Events produced by one accepted action.
pub type ActionResult = Result<Vec<GameEvent>, ActionError>;

/// Result of a tick.
#[derive(Debug, Default)]
pub struct TickResult {
    /// Events generated this tick
    pub events: Vec<GameEvent>,
    /// Countdown hit zero this tick
    pub expired: bool,
    /// Session ended this tick
    pub game_over: bool,
}

// =============================================================================
// LIFECYCLE
// =============================================================================

/// Start a new session from any phase.
///
/// A running session is discarded without reaching the profile. The caller
/// reseeds the RNG beforehand if it wants a fresh problem sequence.
pub fn start_game(state: &mut SessionState, mode: Mode, config: &SessionConfig) -> ActionResult {
    let stimulus = state.next_stimulus();
    let mode = if config.features.mode_selection { mode } else { Mode::Mixed };

    state.clear_counters();
    state.mode = mode;
    state.time_remaining = config.initial_time;
    state.health = config.starting_health();
    state.phase = SessionPhase::Active;

    state.push_event(GameEvent::game_started(stimulus, mode, state.health, state.time_remaining));
    present_next_problem(state, stimulus);

    info!(%mode, seed = state.rng_seed, "Game started");
    Ok(state.take_events())
}

/// Spend one health point and resume after the countdown ran out.
pub fn continue_after_timeout(state: &mut SessionState, config: &SessionConfig) -> ActionResult {
    require_phase(state, SessionPhase::AwaitingContinue, "continue_after_timeout")?;
    let stimulus = state.next_stimulus();

    state.health = state.health.saturating_sub(1);
    state.time_remaining = config.continue_time.min(config.max_time);
    state.phase = SessionPhase::Active;

    state.push_event(GameEvent::continued(stimulus, state.health, state.time_remaining));
    present_next_problem(state, stimulus);

    info!(health = state.health, "Continued after timeout");
    Ok(state.take_events())
}

/// Give up after the countdown ran out.
pub fn decline_continue(state: &mut SessionState) -> ActionResult {
    require_phase(state, SessionPhase::AwaitingContinue, "decline_continue")?;
    let stimulus = state.next_stimulus();

    end_game(state, stimulus);
    Ok(state.take_events())
}

/// Back to the start screen from any phase. The profile is not touched.
pub fn reset_game(state: &mut SessionState) -> ActionResult {
    let stimulus = state.next_stimulus();

    state.clear_counters();
    state.phase = SessionPhase::NotStarted;
    state.push_event(GameEvent::game_reset(stimulus));

    debug!("Game reset");
    Ok(state.take_events())
}

/// Run one countdown tick.
///
/// Only an active, unpaused session advances. While `paused` (result popup
/// on screen) neither the countdown nor the answer-latency clock moves.
pub fn tick(state: &mut SessionState, dt: f64, paused: bool, config: &SessionConfig) -> TickResult {
    let mut result = TickResult::default();

    match state.phase {
        SessionPhase::Active => {}
        SessionPhase::GameOver => {
            result.game_over = true;
            return result;
        }
        SessionPhase::NotStarted | SessionPhase::AwaitingContinue => return result,
    }

    if paused || !dt.is_finite() || dt <= 0.0 {
        return result;
    }

    let stimulus = state.next_stimulus();
    state.clock += dt;
    state.time_remaining = (state.time_remaining - dt).max(0.0);

    #[cfg(feature = "debug-tracing")]
    tracing::trace!(stimulus, time_remaining = state.time_remaining, "tick");

    if state.time_remaining <= 0.0 {
        result.expired = true;
        expire(state, config, stimulus);
        result.game_over = state.is_over();
    }

    result.events = state.take_events();
    result
}

/// Dispatch one action.
pub fn apply_action(state: &mut SessionState, action: &Action, config: &SessionConfig) -> ActionResult {
    match *action {
        Action::StartGame { mode } => start_game(state, mode, config),
        Action::SubmitAnswer { value } => submit_answer(state, value, config),
        Action::ContinueAfterTimeout => continue_after_timeout(state, config),
        Action::DeclineContinue => decline_continue(state),
        Action::ResetGame => reset_game(state),
        Action::Tick { dt, paused } => Ok(tick(state, dt, paused, config).events),
    }
}

/// Replay a recorded game.
///
/// Returns the final state and every event produced along the way.
/// Rejected actions are skipped exactly as they were live.
pub fn replay_session(
    transcript: &SessionTranscript,
    config: &SessionConfig,
) -> (SessionState, Vec<GameEvent>) {
    let mut state = SessionState::new(transcript.seed);
    state.sync_profile(&transcript.known_achievements, transcript.starting_rank_points);

    let mut all_events = Vec::new();
    for action in &transcript.actions {
        if let Ok(events) = apply_action(&mut state, action, config) {
            all_events.extend(events);
        }
    }

    (state, all_events)
}

// =============================================================================
// INTERNAL
// =============================================================================

pub(crate) fn require_phase(
    state: &SessionState,
    expected: SessionPhase,
    action: &'static str,
) -> Result<(), ActionError> {
    if state.phase == expected {
        Ok(())
    } else {
        Err(ActionError::InvalidPhase { action, phase: state.phase })
    }
}

/// Generate and show the next problem for the current level.
pub(crate) fn present_next_problem(state: &mut SessionState, stimulus: u32) {
    let problem = generate(state.level, state.mode, &mut state.rng);
    state.push_event(GameEvent::problem_presented(stimulus, problem.operation, problem.difficulty));
    state.present_problem(problem);
}

/// Countdown reached zero: offer a continue or end the game.
pub(crate) fn expire(state: &mut SessionState, config: &SessionConfig, stimulus: u32) {
    state.time_remaining = 0.0;

    if config.features.health && state.health > 0 {
        state.phase = SessionPhase::AwaitingContinue;
        state.push_event(GameEvent::time_expired(stimulus, state.health));
        info!(health = state.health, "Time expired, awaiting continue");
    } else {
        end_game(state, stimulus);
    }
}

/// End the session and emit the final summary.
fn end_game(state: &mut SessionState, stimulus: u32) {
    state.phase = SessionPhase::GameOver;
    let summary = state.summary();

    info!(
        score = summary.score,
        level = summary.level,
        best_streak = summary.best_streak,
        correct = summary.total_correct,
        answered = summary.total_answered,
        "Game over"
    );

    state.push_event(GameEvent::game_over(stimulus, summary));
}
