//! Achievements
//!
//! Fixed catalogue of milestone achievements. Unlock checks are pure; the
//! session decides which ids are new against what the profile already holds.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Serialize, Deserialize};

/// Achievement identifier.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AchievementId {
    Streak5,
    Streak10,
    Streak20,
    Score1000,
    Score2500,
    Level10,
    /// Fast answer while a combo is running
    SpeedDemon,
    /// A full level without a wrong answer
    PerfectLevel,
}

impl AchievementId {
    pub const ALL: [AchievementId; 8] = [
        AchievementId::Streak5,
        AchievementId::Streak10,
        AchievementId::Streak20,
        AchievementId::Score1000,
        AchievementId::Score2500,
        AchievementId::Level10,
        AchievementId::SpeedDemon,
        AchievementId::PerfectLevel,
    ];

    pub fn title(self) -> &'static str {
        match self {
            AchievementId::Streak5 => "On Fire",
            AchievementId::Streak10 => "Unstoppable",
            AchievementId::Streak20 => "Math Machine",
            AchievementId::Score1000 => "Four Digits",
            AchievementId::Score2500 => "High Roller",
            AchievementId::Level10 => "Double Digits",
            AchievementId::SpeedDemon => "Speed Demon",
            AchievementId::PerfectLevel => "Perfect Level",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            AchievementId::Streak5 => "Answer 5 in a row correctly",
            AchievementId::Streak10 => "Answer 10 in a row correctly",
            AchievementId::Streak20 => "Answer 20 in a row correctly",
            AchievementId::Score1000 => "Reach 1000 points in one game",
            AchievementId::Score2500 => "Reach 2500 points in one game",
            AchievementId::Level10 => "Reach level 10",
            AchievementId::SpeedDemon => "Answer in under 2 seconds during a combo",
            AchievementId::PerfectLevel => "Clear a level without a mistake",
        }
    }
}

impl fmt::Display for AchievementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.title())
    }
}

const STREAK_MILESTONES: [(u32, AchievementId); 3] = [
    (5, AchievementId::Streak5),
    (10, AchievementId::Streak10),
    (20, AchievementId::Streak20),
];

const SCORE_MILESTONES: [(u32, AchievementId); 2] = [
    (1000, AchievementId::Score1000),
    (2500, AchievementId::Score2500),
];

const LEVEL_MILESTONES: [(u32, AchievementId); 1] = [(10, AchievementId::Level10)];

/// Counters an achievement check looks at, taken after a correct answer.
#[derive(Clone, Copy, Debug, Default)]
pub struct MilestoneProgress {
    pub streak: u32,
    pub score: u32,
    pub level: u32,
    pub fast_answer: bool,
}

/// Every achievement whose threshold is met by `progress`.
///
/// Already-unlocked ids are included; filter with [`newly_unlocked`].
pub fn earned(progress: &MilestoneProgress) -> Vec<AchievementId> {
    let mut ids = Vec::new();

    for (threshold, id) in STREAK_MILESTONES {
        if progress.streak >= threshold {
            ids.push(id);
        }
    }
    for (threshold, id) in SCORE_MILESTONES {
        if progress.score >= threshold {
            ids.push(id);
        }
    }
    for (threshold, id) in LEVEL_MILESTONES {
        if progress.level >= threshold {
            ids.push(id);
        }
    }
    if progress.fast_answer && progress.streak >= 3 {
        ids.push(AchievementId::SpeedDemon);
    }

    ids
}

/// Ids from `candidates` that appear in neither `known` nor `this_session`.
pub fn newly_unlocked(
    candidates: &[AchievementId],
    known: &BTreeSet<AchievementId>,
    this_session: &BTreeSet<AchievementId>,
) -> Vec<AchievementId> {
    candidates
        .iter()
        .copied()
        .filter(|id| !known.contains(id) && !this_session.contains(id))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_streak_milestones() {
        let progress = MilestoneProgress { streak: 10, ..Default::default() };
        let ids = earned(&progress);
        assert!(ids.contains(&AchievementId::Streak5));
        assert!(ids.contains(&AchievementId::Streak10));
        assert!(!ids.contains(&AchievementId::Streak20));
    }

    #[test]
    fn test_score_and_level_milestones() {
        let progress = MilestoneProgress { score: 2600, level: 10, ..Default::default() };
        let ids = earned(&progress);
        assert!(ids.contains(&AchievementId::Score1000));
        assert!(ids.contains(&AchievementId::Score2500));
        assert!(ids.contains(&AchievementId::Level10));
    }

    #[test]
    fn test_speed_demon_needs_combo() {
        let slow_combo = MilestoneProgress { streak: 3, fast_answer: false, ..Default::default() };
        assert!(!earned(&slow_combo).contains(&AchievementId::SpeedDemon));

        let fast_no_combo = MilestoneProgress { streak: 2, fast_answer: true, ..Default::default() };
        assert!(!earned(&fast_no_combo).contains(&AchievementId::SpeedDemon));

        let fast_combo = MilestoneProgress { streak: 3, fast_answer: true, ..Default::default() };
        assert!(earned(&fast_combo).contains(&AchievementId::SpeedDemon));
    }

    #[test]
    fn test_newly_unlocked_filters_known() {
        let known: BTreeSet<_> = [AchievementId::Streak5].into_iter().collect();
        let session: BTreeSet<_> = [AchievementId::Score1000].into_iter().collect();
        let candidates = [
            AchievementId::Streak5,
            AchievementId::Score1000,
            AchievementId::Level10,
        ];

        assert_eq!(
            newly_unlocked(&candidates, &known, &session),
            vec![AchievementId::Level10]
        );
    }

    #[test]
    fn test_catalogue_has_text() {
        for id in AchievementId::ALL {
            assert!(!id.title().is_empty());
            assert!(!id.description().is_empty());
        }
    }
}
