//! Player Profile
//!
//! Cross-session statistics. Persistence format is up to the host; the
//! engine only talks to [`ProfileStore`].

use std::collections::BTreeSet;

use serde::{Serialize, Deserialize};
use tracing::debug;

use crate::game::achievement::AchievementId;
use crate::game::rank::{rank_delta, rank_from_points, Rank};
use crate::game::state::GameSummary;

/// Persisted player statistics.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Profile {
    pub games_played: u32,
    pub best_score: u32,
    pub best_streak: u32,
    pub total_correct_answers: u32,
    pub total_problems_seen: u32,
    pub unlocked_achievements: BTreeSet<AchievementId>,
    pub rank_points: u32,
}

impl Profile {
    /// Lifetime accuracy in percent (0 before the first answer).
    pub fn accuracy(&self) -> f64 {
        if self.total_problems_seen == 0 {
            0.0
        } else {
            self.total_correct_answers as f64 / self.total_problems_seen as f64 * 100.0
        }
    }

    pub fn current_rank(&self) -> Rank {
        rank_from_points(self.rank_points)
    }
}

/// Boundary between the engine and whatever keeps the profile.
pub trait ProfileStore {
    /// Current profile.
    fn profile(&self) -> &Profile;

    /// Fold a finished session into the profile. Called once per session.
    fn record_game_end(&mut self, summary: &GameSummary);

    /// Apply the rank-point change for one answer and return the new rank.
    fn apply_rank_delta(&mut self, is_correct: bool, difficulty: u32) -> Rank;
}

impl ProfileStore for Profile {
    fn profile(&self) -> &Profile {
        self
    }

    fn record_game_end(&mut self, summary: &GameSummary) {
        self.games_played += 1;
        self.best_score = self.best_score.max(summary.score);
        self.best_streak = self.best_streak.max(summary.best_streak);
        self.total_correct_answers += summary.total_correct;
        self.total_problems_seen += summary.total_answered;
        self.unlocked_achievements.extend(summary.new_achievements.iter().copied());

        debug!(
            games_played = self.games_played,
            best_score = self.best_score,
            "Profile updated"
        );
    }

    fn apply_rank_delta(&mut self, is_correct: bool, difficulty: u32) -> Rank {
        self.rank_points = rank_delta(self.rank_points, is_correct, difficulty);
        self.current_rank()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::problem::Mode;
    use crate::game::rank::Tier;

    fn summary(score: u32, best_streak: u32, correct: u32, answered: u32) -> GameSummary {
        GameSummary {
            mode: Mode::Mixed,
            score,
            level: 1,
            best_streak,
            total_correct: correct,
            total_answered: answered,
            new_achievements: vec![AchievementId::Streak5],
            rank_points: 0,
        }
    }

    #[test]
    fn test_accuracy_empty_profile() {
        assert_eq!(Profile::default().accuracy(), 0.0);
    }

    #[test]
    fn test_record_game_end() {
        let mut profile = Profile::default();
        profile.record_game_end(&summary(800, 7, 9, 12));
        profile.record_game_end(&summary(500, 11, 3, 4));

        assert_eq!(profile.games_played, 2);
        assert_eq!(profile.best_score, 800);
        assert_eq!(profile.best_streak, 11);
        assert_eq!(profile.total_correct_answers, 12);
        assert_eq!(profile.total_problems_seen, 16);
        assert_eq!(profile.accuracy(), 75.0);
        assert_eq!(profile.unlocked_achievements.len(), 1);
    }

    #[test]
    fn test_rank_delta_floors_at_zero() {
        let mut profile = Profile { rank_points: 3, ..Default::default() };
        let rank = profile.apply_rank_delta(false, 4);
        assert_eq!(profile.rank_points, 0);
        assert_eq!(rank.tier, Tier::Bronze);
        assert_eq!(rank.sub_level, 1);

        profile.apply_rank_delta(true, 10);
        assert_eq!(profile.rank_points, 30);
    }

    #[test]
    fn test_profile_json_defaults() {
        let profile: Profile = serde_json::from_str(r#"{"best_score": 1200}"#).unwrap();
        assert_eq!(profile.best_score, 1200);
        assert_eq!(profile.games_played, 0);
    }
}
