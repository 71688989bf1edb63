//! Session State Definitions
//!
//! The mutable state of one Math Rush session.
//! Uses BTreeSet for deterministic iteration order.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Serialize, Deserialize};

use crate::core::rng::DeterministicRng;
use crate::core::hash::{StateHash, compute_state_hash};
use crate::game::achievement::AchievementId;
use crate::game::events::GameEvent;
use crate::game::problem::{Mode, Problem};
use crate::game::rank::{Rank, rank_from_points};

/// Highest combo multiplier.
pub const MAX_COMBO_MULTIPLIER: u32 = 5;

/// Streak length at which the combo multiplier starts rising.
pub const COMBO_STREAK: u32 = 3;

// =============================================================================
// SESSION PHASE
// =============================================================================

/// Current phase of the session.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SessionPhase {
    /// Start screen, no session running
    #[default]
    NotStarted,
    /// Countdown running, answers accepted
    Active,
    /// Countdown hit zero; waiting for continue / decline
    AwaitingContinue,
    /// Session finished; terminal until reset or restart
    GameOver,
}

impl SessionPhase {
    pub fn name(self) -> &'static str {
        match self {
            SessionPhase::NotStarted => "not_started",
            SessionPhase::Active => "active",
            SessionPhase::AwaitingContinue => "awaiting_continue",
            SessionPhase::GameOver => "game_over",
        }
    }
}

impl fmt::Display for SessionPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// =============================================================================
// GAME SUMMARY
// =============================================================================

/// Final statistics handed to the profile store at game over.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameSummary {
    pub mode: Mode,
    pub score: u32,
    pub level: u32,
    /// Longest streak reached during the session
    pub best_streak: u32,
    pub total_correct: u32,
    pub total_answered: u32,
    /// Achievements unlocked for the first time during the session
    pub new_achievements: Vec<AchievementId>,
    pub rank_points: u32,
}

impl GameSummary {
    /// Accuracy in percent (0 when nothing was answered).
    pub fn accuracy(&self) -> f64 {
        if self.total_answered == 0 {
            0.0
        } else {
            self.total_correct as f64 / self.total_answered as f64 * 100.0
        }
    }
}

// =============================================================================
// SESSION STATE
// =============================================================================

/// Complete state of a session.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SessionState {
    /// RNG seed (for verification)
    pub rng_seed: u64,

    /// Deterministic RNG state
    #[serde(skip)]
    pub rng: DeterministicRng,

    /// Current phase
    pub phase: SessionPhase,

    /// Problem family for this session
    pub mode: Mode,

    pub score: u32,
    /// Starts at 1, never decreases within a session
    pub level: u32,
    pub streak: u32,
    /// Longest streak this session
    pub best_streak: u32,
    /// 1..=5; 1 whenever `streak < 3`
    pub combo_multiplier: u32,

    /// Seconds left on the countdown, never negative
    pub time_remaining: f64,

    /// Continues left
    pub health: u8,

    pub total_answered: u32,
    pub total_correct: u32,

    /// Wrong answers since the last level-up
    pub wrong_in_level: u32,

    /// Problem on screen (None before the first start)
    pub current_problem: Option<Problem>,

    /// Session clock in seconds; advances with unpaused active ticks
    pub clock: f64,

    /// Clock value when the current problem was presented
    pub problem_shown_at: f64,

    /// Achievements unlocked during this session
    pub unlocked_this_session: BTreeSet<AchievementId>,

    /// Achievements the profile already had at session start
    pub known_achievements: BTreeSet<AchievementId>,

    /// Rank points (mirrors the profile)
    pub rank_points: u32,

    /// Stimulus counter (actions + ticks) for event ordering
    pub stimulus: u32,

    /// Events generated by the current stimulus
    #[serde(skip)]
    pub pending_events: Vec<GameEvent>,
}

impl SessionState {
    /// Create a fresh, not-started session.
    pub fn new(rng_seed: u64) -> Self {
        Self {
            rng_seed,
            rng: DeterministicRng::new(rng_seed),
            phase: SessionPhase::NotStarted,
            mode: Mode::default(),
            score: 0,
            level: 1,
            streak: 0,
            best_streak: 0,
            combo_multiplier: 1,
            time_remaining: 0.0,
            health: 0,
            total_answered: 0,
            total_correct: 0,
            wrong_in_level: 0,
            current_problem: None,
            clock: 0.0,
            problem_shown_at: 0.0,
            unlocked_this_session: BTreeSet::new(),
            known_achievements: BTreeSet::new(),
            rank_points: 0,
            stimulus: 0,
            pending_events: Vec::new(),
        }
    }

    /// Reseed the RNG (done at the start of every game).
    pub fn reseed(&mut self, rng_seed: u64) {
        self.rng_seed = rng_seed;
        self.rng = DeterministicRng::new(rng_seed);
    }

    /// Load what the profile carries into a session.
    pub fn sync_profile(&mut self, known: &BTreeSet<AchievementId>, rank_points: u32) {
        self.known_achievements = known.clone();
        self.rank_points = rank_points;
    }

    /// Clear per-session counters. Profile-derived fields survive.
    pub fn clear_counters(&mut self) {
        self.score = 0;
        self.level = 1;
        self.streak = 0;
        self.best_streak = 0;
        self.combo_multiplier = 1;
        self.time_remaining = 0.0;
        self.health = 0;
        self.total_answered = 0;
        self.total_correct = 0;
        self.wrong_in_level = 0;
        self.current_problem = None;
        self.clock = 0.0;
        self.problem_shown_at = 0.0;
        self.unlocked_this_session.clear();
    }

    pub fn is_active(&self) -> bool {
        self.phase == SessionPhase::Active
    }

    pub fn is_over(&self) -> bool {
        self.phase == SessionPhase::GameOver
    }

    pub fn is_awaiting_continue(&self) -> bool {
        self.phase == SessionPhase::AwaitingContinue
    }

    /// Combo is live once the streak reaches 3.
    pub fn combo_active(&self) -> bool {
        self.streak >= COMBO_STREAK
    }

    /// Current rank derived from rank points.
    pub fn rank(&self) -> Rank {
        rank_from_points(self.rank_points)
    }

    /// Seconds since the current problem appeared.
    pub fn answer_latency(&self) -> f64 {
        (self.clock - self.problem_shown_at).max(0.0)
    }

    /// Accuracy in percent (0 when nothing was answered).
    pub fn accuracy(&self) -> f64 {
        if self.total_answered == 0 {
            0.0
        } else {
            self.total_correct as f64 / self.total_answered as f64 * 100.0
        }
    }

    /// Final statistics for the profile store.
    pub fn summary(&self) -> GameSummary {
        GameSummary {
            mode: self.mode,
            score: self.score,
            level: self.level,
            best_streak: self.best_streak,
            total_correct: self.total_correct,
            total_answered: self.total_answered,
            new_achievements: self.unlocked_this_session.iter().copied().collect(),
            rank_points: self.rank_points,
        }
    }

    /// Put a problem on screen and restart the latency clock.
    pub fn present_problem(&mut self, problem: Problem) {
        self.problem_shown_at = self.clock;
        self.current_problem = Some(problem);
    }

    /// Compute hash of current state for verification.
    pub fn compute_hash(&self) -> StateHash {
        compute_state_hash(self.total_answered, self.rng_seed, |hasher| {
            hasher.update_u8(self.phase as u8);
            hasher.update_u8(self.mode as u8);
            hasher.update_u32(self.score);
            hasher.update_u32(self.level);
            hasher.update_u32(self.streak);
            hasher.update_u32(self.best_streak);
            hasher.update_u32(self.combo_multiplier);
            hasher.update_f64(self.time_remaining);
            hasher.update_u8(self.health);
            hasher.update_u32(self.total_correct);
            hasher.update_u32(self.wrong_in_level);
            hasher.update_f64(self.clock);
            hasher.update_f64(self.problem_shown_at);
            hasher.update_u32(self.rank_points);

            hasher.update_bool(self.current_problem.is_some());
            if let Some(problem) = &self.current_problem {
                hasher.update_str(&problem.question_text);
                for option in problem.options {
                    hasher.update_i32(option);
                }
                hasher.update_u32(problem.difficulty);
            }

            // BTreeSet iterates in sorted order
            for id in &self.unlocked_this_session {
                hasher.update_u8(*id as u8);
            }

            for word in self.rng.state() {
                hasher.update_u64(word);
            }
        })
    }

    /// Next stimulus index.
    pub fn next_stimulus(&mut self) -> u32 {
        self.stimulus = self.stimulus.wrapping_add(1);
        self.stimulus
    }

    /// Take pending events (consumes them).
    pub fn take_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.pending_events)
    }

    /// Push a game event.
    pub fn push_event(&mut self, event: GameEvent) {
        self.pending_events.push(event);
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_session_defaults() {
        let state = SessionState::new(1);
        assert_eq!(state.phase, SessionPhase::NotStarted);
        assert_eq!(state.level, 1);
        assert_eq!(state.combo_multiplier, 1);
        assert!(state.current_problem.is_none());
        assert!(!state.is_active() && !state.is_over() && !state.is_awaiting_continue());
    }

    #[test]
    fn test_accuracy_without_answers() {
        let state = SessionState::new(1);
        assert_eq!(state.accuracy(), 0.0);
        assert_eq!(state.summary().accuracy(), 0.0);
    }

    #[test]
    fn test_clear_keeps_profile_fields() {
        let mut state = SessionState::new(1);
        let known: BTreeSet<_> = [AchievementId::Streak5].into_iter().collect();
        state.sync_profile(&known, 420);
        state.score = 900;
        state.level = 4;

        state.clear_counters();

        assert_eq!(state.score, 0);
        assert_eq!(state.level, 1);
        assert_eq!(state.rank_points, 420);
        assert!(state.known_achievements.contains(&AchievementId::Streak5));
    }

    #[test]
    fn test_latency_tracks_clock() {
        let mut rng = DeterministicRng::new(3);
        let mut state = SessionState::new(1);
        state.clock = 4.0;
        state.present_problem(Problem::new(crate::game::problem::Operation::Addition, 1, 2, 1, &mut rng));
        state.clock = 5.5;
        assert!((state.answer_latency() - 1.5).abs() < 1e-9);
    }

    #[test]
    fn test_hash_determinism() {
        let a = SessionState::new(12345);
        let b = SessionState::new(12345);
        assert_eq!(a.compute_hash(), b.compute_hash());

        let mut c = SessionState::new(12345);
        c.score = 10;
        assert_ne!(a.compute_hash(), c.compute_hash());
    }
}
