//! Rank Progression
//!
//! Rank is derived from a single rank-point total and never stored on its
//! own. Points rise with correct answers and decay with mistakes.

use std::fmt;

use serde::{Serialize, Deserialize};

/// Points spanned by one tier.
pub const POINTS_PER_TIER: u32 = 1000;

/// Points spanned by one sub-level within a tier.
pub const POINTS_PER_SUB_LEVEL: u32 = 200;

/// Highest sub-level inside a tier.
pub const MAX_SUB_LEVEL: u8 = 5;

/// Minimum points lost on a wrong answer.
pub const MIN_RANK_PENALTY: u32 = 5;

/// Rank tier, lowest first.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum Tier {
    #[default]
    Bronze = 0,
    Silver = 1,
    Gold = 2,
    Platinum = 3,
    Diamond = 4,
    Master = 5,
    Grandmaster = 6,
}

impl Tier {
    /// All tiers in ascending order.
    pub const ALL: [Tier; 7] = [
        Tier::Bronze,
        Tier::Silver,
        Tier::Gold,
        Tier::Platinum,
        Tier::Diamond,
        Tier::Master,
        Tier::Grandmaster,
    ];

    /// Get tier from index, saturating at the top tier.
    pub fn from_index(index: u32) -> Tier {
        Tier::ALL[(index as usize).min(Tier::ALL.len() - 1)]
    }

    pub fn name(self) -> &'static str {
        match self {
            Tier::Bronze => "Bronze",
            Tier::Silver => "Silver",
            Tier::Gold => "Gold",
            Tier::Platinum => "Platinum",
            Tier::Diamond => "Diamond",
            Tier::Master => "Master",
            Tier::Grandmaster => "Grandmaster",
        }
    }

    /// Next tier (if not max).
    pub fn next(self) -> Option<Tier> {
        Tier::ALL.get(self as usize + 1).copied()
    }
}

/// Derived rank value.
///
/// Ordering compares tier, then sub-level, then points.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Rank {
    pub tier: Tier,
    /// 1..=5 within the tier
    pub sub_level: u8,
    pub points: u32,
}

impl Rank {
    /// Same tier and sub-level, ignoring the exact point total.
    pub fn same_division(&self, other: &Rank) -> bool {
        self.tier == other.tier && self.sub_level == other.sub_level
    }

    /// Points still needed for the next sub-level, `None` at the very top.
    pub fn points_to_next(&self) -> Option<u32> {
        let next = if self.sub_level < MAX_SUB_LEVEL {
            self.tier as u32 * POINTS_PER_TIER + self.sub_level as u32 * POINTS_PER_SUB_LEVEL
        } else {
            self.tier.next()? as u32 * POINTS_PER_TIER
        };
        Some(next.saturating_sub(self.points))
    }
}

impl fmt::Display for Rank {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.tier.name(), self.sub_level)
    }
}

/// Compute the rank for a point total.
///
/// Total and monotonic: past the start of Grandmaster the sub-level
/// saturates at 5 instead of wrapping.
pub fn rank_from_points(points: u32) -> Rank {
    let tier = Tier::from_index(points / POINTS_PER_TIER);
    let within = points - tier as u32 * POINTS_PER_TIER;
    let sub_level = (within / POINTS_PER_SUB_LEVEL + 1).min(MAX_SUB_LEVEL as u32) as u8;

    Rank { tier, sub_level, points }
}

/// Apply one answer to a rank-point total.
///
/// Correct: `+ (10 + 2 * difficulty)`. Incorrect: `- max(5, points / 100)`,
/// floored at 0.
pub fn rank_delta(points: u32, is_correct: bool, difficulty: u32) -> u32 {
    if is_correct {
        points.saturating_add(10 + 2 * difficulty)
    } else {
        let penalty = MIN_RANK_PENALTY.max(points / 100);
        points.saturating_sub(penalty)
    }
}
