//! Session Actions
//!
//! Every stimulus the engine accepts, as a serializable value. A list of
//! these plus the game seed is a complete replay transcript.

use std::collections::BTreeSet;

use serde::{Serialize, Deserialize};

use crate::game::achievement::AchievementId;
use crate::game::problem::Mode;

/// One external stimulus.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Action {
    /// Begin a new session.
    StartGame { mode: Mode },
    /// Pick an answer.
    SubmitAnswer { value: i32 },
    /// Spend a health point after time ran out.
    ContinueAfterTimeout,
    /// Give up after time ran out.
    DeclineContinue,
    /// Back to the start screen.
    ResetGame,
    /// Timer tick; `paused` is the presentation's popup flag.
    Tick { dt: f64, paused: bool },
}

impl Action {
    /// Short action name for logs and errors.
    pub fn name(&self) -> &'static str {
        match self {
            Action::StartGame { .. } => "start_game",
            Action::SubmitAnswer { .. } => "submit_answer",
            Action::ContinueAfterTimeout => "continue_after_timeout",
            Action::DeclineContinue => "decline_continue",
            Action::ResetGame => "reset_game",
            Action::Tick { .. } => "tick",
        }
    }

    /// Ticks are high-frequency and are not logged per call.
    pub fn is_tick(&self) -> bool {
        matches!(self, Action::Tick { .. })
    }
}

/// Recorded actions of one game.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionTranscript {
    /// RNG seed the game was started with
    pub seed: u64,
    /// Profile achievements at game start
    pub known_achievements: BTreeSet<AchievementId>,
    /// Profile rank points at game start
    pub starting_rank_points: u32,
    /// Actions in order, starting with `StartGame`
    pub actions: Vec<Action>,
}

impl SessionTranscript {
    /// Start a transcript for a game.
    pub fn new(seed: u64, known_achievements: BTreeSet<AchievementId>, starting_rank_points: u32) -> Self {
        Self {
            seed,
            known_achievements,
            starting_rank_points,
            actions: Vec::new(),
        }
    }

    /// Append an action.
    pub fn record(&mut self, action: Action) {
        self.actions.push(action);
    }

    /// Number of non-tick actions.
    pub fn user_action_count(&self) -> usize {
        self.actions.iter().filter(|a| !a.is_tick()).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_action_json_shape() {
        let json = serde_json::to_string(&Action::SubmitAnswer { value: 11 }).unwrap();
        assert_eq!(json, r#"{"type":"submit_answer","value":11}"#);

        let back: Action = serde_json::from_str(r#"{"type":"tick","dt":0.1,"paused":false}"#).unwrap();
        assert_eq!(back, Action::Tick { dt: 0.1, paused: false });
    }

    #[test]
    fn test_transcript_counts() {
        let mut t = SessionTranscript::new(1, BTreeSet::new(), 0);
        t.record(Action::StartGame { mode: Mode::Mixed });
        t.record(Action::Tick { dt: 0.1, paused: false });
        t.record(Action::SubmitAnswer { value: 3 });
        assert_eq!(t.actions.len(), 3);
        assert_eq!(t.user_action_count(), 2);
    }
}
