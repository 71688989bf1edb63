//! Game Events
//!
//! Events emitted per stimulus. The presentation layer schedules popups and
//! feedback from these; the profile store reacts to `GameOver`.

use serde::{Serialize, Deserialize};

use crate::game::achievement::AchievementId;
use crate::game::problem::{Mode, Operation};
use crate::game::rank::Rank;
use crate::game::state::GameSummary;

/// Game event data.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum GameEventData {
    /// A new session began
    GameStarted {
        mode: Mode,
        health: u8,
        time_remaining: f64,
    },

    /// A new problem is on screen
    ProblemPresented {
        operation: Operation,
        difficulty: u32,
    },

    /// An answer was scored
    AnswerEvaluated {
        correct: bool,
        submitted: i32,
        expected: i32,
        /// Difficulty of the answered problem
        difficulty: u32,
        /// Points awarded (0 for wrong answers)
        points: u32,
        new_score: u32,
        latency: f64,
        fast: bool,
    },

    /// Streak crossed into a higher combo multiplier
    ComboActivated {
        multiplier: u32,
        streak: u32,
    },

    /// Wrong answer: streak reset and countdown penalty applied
    Penalized {
        lost_streak: u32,
        time_penalty: f64,
    },

    /// Level increased
    LevelUp {
        new_level: u32,
        time_bonus: f64,
        perfect: bool,
        bonus_points: u32,
    },

    /// Achievement unlocked for the first time on this profile
    AchievementUnlocked {
        id: AchievementId,
    },

    /// Rank tier or sub-level changed
    RankChanged {
        old_rank: Rank,
        new_rank: Rank,
    },

    /// Countdown reached zero while continues remain
    TimeExpired {
        health_remaining: u8,
    },

    /// Player spent a health point to keep going
    Continued {
        health_remaining: u8,
        time_remaining: f64,
    },

    /// Session finished
    GameOver {
        summary: GameSummary,
    },

    /// Session cleared back to the start screen
    GameReset,
}

/// A game event tagged with the stimulus that produced it.
///
/// Events of one stimulus are returned in emission order.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GameEvent {
    /// Index of the stimulus (action or tick) that produced this event
    pub stimulus: u32,

    /// Event data
    pub data: GameEventData,
}

impl GameEvent {
    /// Create a new event.
    pub fn new(stimulus: u32, data: GameEventData) -> Self {
        Self { stimulus, data }
    }

    /// Create game started event.
    pub fn game_started(stimulus: u32, mode: Mode, health: u8, time_remaining: f64) -> Self {
        Self::new(
            stimulus,
            GameEventData::GameStarted { mode, health, time_remaining },
        )
    }

    /// Create problem presented event.
    pub fn problem_presented(stimulus: u32, operation: Operation, difficulty: u32) -> Self {
        Self::new(
            stimulus,
            GameEventData::ProblemPresented { operation, difficulty },
        )
    }

    /// Create answer evaluated event.
    #[allow(clippy::too_many_arguments)]
    pub fn answer_evaluated(
        stimulus: u32,
        correct: bool,
        submitted: i32,
        expected: i32,
        difficulty: u32,
        points: u32,
        new_score: u32,
        latency: f64,
        fast: bool,
    ) -> Self {
        Self::new(
            stimulus,
            GameEventData::AnswerEvaluated {
                correct,
                submitted,
                expected,
                difficulty,
                points,
                new_score,
                latency,
                fast,
            },
        )
    }

    /// Create combo activated event.
    pub fn combo_activated(stimulus: u32, multiplier: u32, streak: u32) -> Self {
        Self::new(
            stimulus,
            GameEventData::ComboActivated { multiplier, streak },
        )
    }

    /// Create penalized event.
    pub fn penalized(stimulus: u32, lost_streak: u32, time_penalty: f64) -> Self {
        Self::new(
            stimulus,
            GameEventData::Penalized { lost_streak, time_penalty },
        )
    }

    /// Create level up event.
    pub fn level_up(
        stimulus: u32,
        new_level: u32,
        time_bonus: f64,
        perfect: bool,
        bonus_points: u32,
    ) -> Self {
        Self::new(
            stimulus,
            GameEventData::LevelUp { new_level, time_bonus, perfect, bonus_points },
        )
    }

    /// Create achievement unlocked event.
    pub fn achievement_unlocked(stimulus: u32, id: AchievementId) -> Self {
        Self::new(stimulus, GameEventData::AchievementUnlocked { id })
    }

    /// Create rank changed event.
    pub fn rank_changed(stimulus: u32, old_rank: Rank, new_rank: Rank) -> Self {
        Self::new(
            stimulus,
            GameEventData::RankChanged { old_rank, new_rank },
        )
    }

    /// Create time expired event.
    pub fn time_expired(stimulus: u32, health_remaining: u8) -> Self {
        Self::new(
            stimulus,
            GameEventData::TimeExpired { health_remaining },
        )
    }

    /// Create continued event.
    pub fn continued(stimulus: u32, health_remaining: u8, time_remaining: f64) -> Self {
        Self::new(
            stimulus,
            GameEventData::Continued { health_remaining, time_remaining },
        )
    }

    /// Create game over event.
    pub fn game_over(stimulus: u32, summary: GameSummary) -> Self {
        Self::new(stimulus, GameEventData::GameOver { summary })
    }

    /// Create game reset event.
    pub fn game_reset(stimulus: u32) -> Self {
        Self::new(stimulus, GameEventData::GameReset)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_equality_covers_data() {
        let streak = GameEvent::achievement_unlocked(1, AchievementId::Streak5);
        let score = GameEvent::achievement_unlocked(1, AchievementId::Score2500);
        assert_ne!(streak, score);
        assert_eq!(streak, GameEvent::achievement_unlocked(1, AchievementId::Streak5));

        // Same data from a different stimulus is a different event
        assert_ne!(streak, GameEvent::achievement_unlocked(2, AchievementId::Streak5));
        assert_ne!(GameEvent::game_reset(4), GameEvent::time_expired(4, 1));
    }

    #[test]
    fn test_event_serializes() {
        let event = GameEvent::achievement_unlocked(1, AchievementId::PerfectLevel);
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("perfect_level"));
    }
}
