//! Scoring Formulas
//!
//! Pure functions; the session applies their results.

use serde::{Serialize, Deserialize};

use crate::game::state::{COMBO_STREAK, MAX_COMBO_MULTIPLIER};

/// Streak bonus cap.
const MAX_STREAK_BONUS: u32 = 100;

/// Answers faster than this many seconds earn speed points.
const SPEED_WINDOW: f64 = 5.0;

/// Points per combo step above 1x.
const COMBO_STEP_POINTS: u32 = 25;

/// Flat bonus for a fast answer.
const FAST_BONUS_POINTS: u32 = 50;

/// Longest countdown penalty for a wrong answer, in seconds.
const MAX_TIME_PENALTY: u32 = 5;

/// Combo multiplier for a streak: `min(streak / 3, 5)` once the streak
/// reaches 3, otherwise 1.
#[inline]
pub fn combo_multiplier(streak: u32) -> u32 {
    if streak >= COMBO_STREAK {
        (streak / COMBO_STREAK).min(MAX_COMBO_MULTIPLIER)
    } else {
        1
    }
}

/// Speed points: `max(0, round((5.0 - latency) * 10))`.
#[inline]
pub fn speed_points(latency: f64) -> u32 {
    let raw = ((SPEED_WINDOW - latency) * 10.0).round();
    if raw > 0.0 {
        raw as u32
    } else {
        0
    }
}

/// Countdown penalty for a wrong answer at `level`: `min(level, 5)` seconds.
#[inline]
pub fn time_penalty(level: u32) -> f64 {
    level.min(MAX_TIME_PENALTY) as f64
}

/// Points for one correct answer, split by source.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreBreakdown {
    /// `difficulty * 10`
    pub base: u32,
    /// `min(streak * 5, 100)`
    pub streak: u32,
    pub speed: u32,
    /// `(multiplier - 1) * 25`
    pub combo: u32,
    pub fast: u32,
}

impl ScoreBreakdown {
    pub fn total(&self) -> u32 {
        self.base + self.streak + self.speed + self.combo + self.fast
    }
}

/// Score a correct answer.
///
/// `streak` and `multiplier` are the values after counting this answer.
pub fn score_answer(
    difficulty: u32,
    streak: u32,
    multiplier: u32,
    latency: f64,
    fast: bool,
) -> ScoreBreakdown {
    ScoreBreakdown {
        base: difficulty * 10,
        streak: (streak * 5).min(MAX_STREAK_BONUS),
        speed: speed_points(latency),
        combo: multiplier.saturating_sub(1) * COMBO_STEP_POINTS,
        fast: if fast { FAST_BONUS_POINTS } else { 0 },
    }
}
