//! Game Engine
//!
//! Owns one session, the config, the profile store and the pause flag.
//! Every accepted action is recorded into a transcript and its events are
//! forwarded to the profile.

use tracing::debug;

use crate::core::rng::derive_session_seed;
use crate::game::answer;
use crate::game::events::{GameEvent, GameEventData};
use crate::game::input::{Action, SessionTranscript};
use crate::game::problem::Mode;
use crate::game::state::SessionState;
use crate::game::tick::{self, ActionResult, ConfigError, SessionConfig, TickResult};
use crate::engine::profile::{Profile, ProfileStore};
use crate::engine::snapshot::EngineSnapshot;

/// Single-session game engine.
pub struct GameEngine<P: ProfileStore = Profile> {
    state: SessionState,
    config: SessionConfig,
    profile: P,
    /// Presentation-owned pause flag, read on every tick
    paused: bool,
    engine_seed: u64,
    /// Games started so far; feeds the per-game seed
    game_index: u32,
    transcript: Option<SessionTranscript>,
}

impl<P: ProfileStore> GameEngine<P> {
    /// Create an engine. `engine_seed` determines every game's problem sequence.
    ///
    /// Fails if the config does not pass [`SessionConfig::validate`].
    pub fn new(config: SessionConfig, profile: P, engine_seed: u64) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            state: SessionState::new(engine_seed),
            config,
            profile,
            paused: false,
            engine_seed,
            game_index: 0,
            transcript: None,
        })
    }

    // =========================================================================
    // ACTIONS
    // =========================================================================

    /// Start a new game, discarding any running one.
    pub fn start_game(&mut self, mode: Mode) -> ActionResult {
        self.game_index = self.game_index.wrapping_add(1);
        let seed = derive_session_seed(self.engine_seed, self.game_index);

        let profile = self.profile.profile();
        self.state.reseed(seed);
        self.state.sync_profile(&profile.unlocked_achievements, profile.rank_points);
        self.paused = false;

        let mut transcript = SessionTranscript::new(
            seed,
            profile.unlocked_achievements.clone(),
            profile.rank_points,
        );
        transcript.record(Action::StartGame { mode });
        self.transcript = Some(transcript);

        let result = tick::start_game(&mut self.state, mode, &self.config);
        self.settle("start_game", result)
    }

    /// Answer the problem on screen.
    pub fn submit_answer(&mut self, value: i32) -> ActionResult {
        self.record(Action::SubmitAnswer { value });
        let result = answer::submit_answer(&mut self.state, value, &self.config);
        self.settle("submit_answer", result)
    }

    /// Spend a health point after the countdown ran out.
    pub fn continue_after_timeout(&mut self) -> ActionResult {
        self.record(Action::ContinueAfterTimeout);
        let result = tick::continue_after_timeout(&mut self.state, &self.config);
        self.settle("continue_after_timeout", result)
    }

    /// End the game instead of continuing.
    pub fn decline_continue(&mut self) -> ActionResult {
        self.record(Action::DeclineContinue);
        let result = tick::decline_continue(&mut self.state);
        self.settle("decline_continue", result)
    }

    /// Back to the start screen. The profile is not touched.
    pub fn reset_game(&mut self) -> ActionResult {
        self.record(Action::ResetGame);
        let result = tick::reset_game(&mut self.state);
        self.paused = false;
        self.settle("reset_game", result)
    }

    /// Advance the countdown by `dt` seconds, honouring the pause flag.
    pub fn tick(&mut self, dt: f64) -> TickResult {
        self.tick_with(dt, self.paused)
    }

    /// Set the presentation pause flag (result popup on screen).
    pub fn set_paused(&mut self, paused: bool) {
        if self.paused != paused {
            debug!(paused, "Pause flag changed");
        }
        self.paused = paused;
    }

    /// Apply any action.
    pub fn apply(&mut self, action: Action) -> ActionResult {
        match action {
            Action::StartGame { mode } => self.start_game(mode),
            Action::SubmitAnswer { value } => self.submit_answer(value),
            Action::ContinueAfterTimeout => self.continue_after_timeout(),
            Action::DeclineContinue => self.decline_continue(),
            Action::ResetGame => self.reset_game(),
            Action::Tick { dt, paused } => Ok(self.tick_with(dt, paused).events),
        }
    }

    // =========================================================================
    // ACCESSORS
    // =========================================================================

    /// Read-only view for the presentation layer.
    pub fn snapshot(&self) -> EngineSnapshot {
        EngineSnapshot::capture(&self.state, self.paused)
    }

    /// Current session state.
    pub fn state(&self) -> &SessionState {
        &self.state
    }

    /// Active session config.
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Player profile as held by the store.
    pub fn profile(&self) -> &Profile {
        self.profile.profile()
    }

    /// The profile store itself.
    pub fn store(&self) -> &P {
        &self.profile
    }

    /// Whether the pause flag is set.
    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// Transcript of the current (or last) game.
    pub fn transcript(&self) -> Option<&SessionTranscript> {
        self.transcript.as_ref()
    }

    /// Consume the engine and hand back the profile store.
    pub fn into_store(self) -> P {
        self.profile
    }

    // =========================================================================
    // INTERNAL
    // =========================================================================

    fn tick_with(&mut self, dt: f64, paused: bool) -> TickResult {
        // Ticks that change nothing (inactive, paused, empty dt) are not recorded
        if self.state.is_active() && !paused && dt.is_finite() && dt > 0.0 {
            self.record(Action::Tick { dt, paused });
        }
        let result = tick::tick(&mut self.state, dt, paused, &self.config);
        self.forward(&result.events);
        result
    }

    fn record(&mut self, action: Action) {
        if let Some(transcript) = self.transcript.as_mut() {
            transcript.record(action);
        }
    }

    fn settle(&mut self, action: &'static str, result: ActionResult) -> ActionResult {
        match &result {
            Ok(events) => {
                debug!(action, events = events.len(), "Action applied");
                self.forward(events);
            }
            Err(err) => debug!(%err, "Action ignored"),
        }
        result
    }

    /// Route events to the profile store.
    fn forward(&mut self, events: &[GameEvent]) {
        for event in events {
            match &event.data {
                GameEventData::AnswerEvaluated { correct, difficulty, .. } => {
                    if self.config.features.rank {
                        self.profile.apply_rank_delta(*correct, *difficulty);
                    }
                }
                GameEventData::GameOver { summary } => {
                    self.profile.record_game_end(summary);
                }
                _ => {}
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::achievement::AchievementId;
    use crate::game::rank::Rank;
    use crate::game::state::{GameSummary, SessionPhase};
    use crate::game::tick::{replay_session, ActionError};
    use rand::{Rng, SeedableRng};
    use rand::rngs::StdRng;

    /// Profile store that counts calls.
    #[derive(Default)]
    struct CountingStore {
        profile: Profile,
        game_ends: u32,
        rank_updates: u32,
    }

    impl ProfileStore for CountingStore {
        fn profile(&self) -> &Profile {
            &self.profile
        }

        fn record_game_end(&mut self, summary: &GameSummary) {
            self.game_ends += 1;
            self.profile.record_game_end(summary);
        }

        fn apply_rank_delta(&mut self, is_correct: bool, difficulty: u32) -> Rank {
            self.rank_updates += 1;
            self.profile.apply_rank_delta(is_correct, difficulty)
        }
    }

    fn engine() -> GameEngine<CountingStore> {
        GameEngine::new(SessionConfig::default(), CountingStore::default(), 42).unwrap()
    }

    fn correct_value(engine: &GameEngine<CountingStore>) -> i32 {
        engine.state().current_problem.as_ref().unwrap().correct_answer
    }

    fn run_out_clock(engine: &mut GameEngine<CountingStore>) {
        while engine.state().is_active() {
            engine.tick(0.1);
        }
    }

    #[test]
    fn test_game_end_recorded_once() {
        let mut engine = engine();
        engine.start_game(Mode::Addition).unwrap();
        for _ in 0..3 {
            let v = correct_value(&engine);
            engine.submit_answer(v).unwrap();
        }

        // Two continues, then the clock runs out for good
        run_out_clock(&mut engine);
        engine.continue_after_timeout().unwrap();
        run_out_clock(&mut engine);
        engine.continue_after_timeout().unwrap();
        run_out_clock(&mut engine);

        assert_eq!(engine.state().phase, SessionPhase::GameOver);
        assert_eq!(engine.store().game_ends, 1);

        // Further stimuli after game over do not record again
        engine.tick(0.1);
        assert!(engine.decline_continue().is_err());
        assert_eq!(engine.store().game_ends, 1);

        let profile = engine.profile();
        assert_eq!(profile.games_played, 1);
        assert_eq!(profile.total_correct_answers, 3);
        assert_eq!(profile.total_problems_seen, 3);
        assert_eq!(profile.best_streak, 3);
    }

    #[test]
    fn test_reset_does_not_touch_profile() {
        let mut engine = engine();
        engine.start_game(Mode::Mixed).unwrap();
        let v = correct_value(&engine);
        engine.submit_answer(v).unwrap();
        engine.reset_game().unwrap();

        assert_eq!(engine.store().game_ends, 0);
        assert_eq!(engine.profile().games_played, 0);
        assert_eq!(engine.state().phase, SessionPhase::NotStarted);
    }

    #[test]
    fn test_rank_delta_per_answer() {
        let mut engine = engine();
        engine.start_game(Mode::Addition).unwrap();
        let v = correct_value(&engine);
        engine.submit_answer(v).unwrap();
        engine.submit_answer(v + 1000).unwrap();

        assert_eq!(engine.store().rank_updates, 2);
        assert_eq!(engine.profile().rank_points, engine.state().rank_points);
    }

    #[test]
    fn test_rank_disabled_skips_store() {
        let mut config = SessionConfig::default();
        config.features.rank = false;
        let mut engine = GameEngine::new(config, CountingStore::default(), 1).unwrap();
        engine.start_game(Mode::Addition).unwrap();
        let v = correct_value(&engine);
        engine.submit_answer(v).unwrap();

        assert_eq!(engine.store().rank_updates, 0);
        assert_eq!(engine.profile().rank_points, 0);
    }

    #[test]
    fn test_achievements_carry_over_games() {
        let mut engine = engine();
        engine.start_game(Mode::Addition).unwrap();
        for _ in 0..5 {
            let v = correct_value(&engine);
            engine.submit_answer(v).unwrap();
        }
        run_out_clock(&mut engine);
        engine.decline_continue().unwrap();
        assert!(engine.profile().unlocked_achievements.contains(&AchievementId::Streak5));

        // Second game: Streak5 is already known
        let mut events = engine.start_game(Mode::Addition).unwrap();
        for _ in 0..5 {
            let v = correct_value(&engine);
            events.extend(engine.submit_answer(v).unwrap());
        }
        assert!(!events.iter().any(|e| matches!(
            e.data,
            GameEventData::AchievementUnlocked { id: AchievementId::Streak5 }
        )));
    }

    #[test]
    fn test_pause_freezes_countdown() {
        let mut engine = engine();
        engine.start_game(Mode::Addition).unwrap();
        engine.set_paused(true);
        for _ in 0..50 {
            engine.tick(0.1);
        }
        assert_eq!(engine.state().time_remaining, 30.0);
        assert!(engine.snapshot().paused);

        engine.set_paused(false);
        engine.tick(0.5);
        assert_eq!(engine.state().time_remaining, 29.5);
    }

    #[test]
    fn test_paused_ticks_not_recorded() {
        let mut engine = engine();
        engine.start_game(Mode::Addition).unwrap();
        let recorded = engine.transcript().unwrap().actions.len();

        engine.set_paused(true);
        for _ in 0..100 {
            engine.tick(0.1);
        }
        engine.apply(Action::Tick { dt: 0.1, paused: true }).unwrap();
        assert_eq!(engine.transcript().unwrap().actions.len(), recorded);

        engine.set_paused(false);
        engine.tick(0.1);
        assert_eq!(engine.transcript().unwrap().actions.len(), recorded + 1);

        let (replayed, _) = replay_session(engine.transcript().unwrap(), engine.config());
        assert_eq!(replayed.compute_hash(), engine.state().compute_hash());
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = SessionConfig { answers_per_level: 0, ..SessionConfig::default() };
        let err = GameEngine::new(config, Profile::default(), 1).err().unwrap();
        assert!(matches!(err, ConfigError::Invalid { field: "answers_per_level", .. }));

        let config = SessionConfig { initial_time: f64::NAN, ..SessionConfig::default() };
        assert!(GameEngine::new(config, Profile::default(), 1).is_err());

        let config = SessionConfig { continue_time: 90.0, ..SessionConfig::default() };
        assert!(GameEngine::new(config, Profile::default(), 1).is_err());
    }

    #[test]
    fn test_ignored_submit_reports_phase() {
        let mut engine = engine();
        let err = engine.submit_answer(3).unwrap_err();
        assert!(matches!(err, ActionError::InvalidPhase { phase: SessionPhase::NotStarted, .. }));
    }

    #[test]
    fn test_each_game_gets_its_own_seed() {
        let mut engine = engine();
        engine.start_game(Mode::Mixed).unwrap();
        let first = engine.state().rng_seed;
        engine.start_game(Mode::Mixed).unwrap();
        assert_ne!(first, engine.state().rng_seed);

        // Same engine seed reproduces the same sequence
        let mut other = GameEngine::new(SessionConfig::default(), Profile::default(), 42).unwrap();
        other.start_game(Mode::Mixed).unwrap();
        assert_eq!(other.state().rng_seed, first);
    }

    #[test]
    fn test_replay_matches_live_session() {
        let mut rng = StdRng::seed_from_u64(99);

        for _ in 0..8 {
            let seed: u64 = rng.gen();
            let mut engine = GameEngine::new(SessionConfig::default(), Profile::default(), seed).unwrap();
            engine.start_game(Mode::Mixed).unwrap();

            for _ in 0..200 {
                match rng.gen_range(0..10) {
                    0..=5 => {
                        engine.tick(0.1);
                    }
                    6 => engine.set_paused(!engine.is_paused()),
                    _ => {
                        let options = engine
                            .state()
                            .current_problem
                            .as_ref()
                            .map(|p| p.options)
                            .unwrap_or([0; 4]);
                        let _ = engine.submit_answer(options[rng.gen_range(0..4)]);
                    }
                }
                if engine.state().is_awaiting_continue() {
                    let _ = engine.continue_after_timeout();
                }
            }

            let transcript = engine.transcript().unwrap();
            let (replayed, _) = replay_session(transcript, engine.config());
            assert_eq!(replayed.compute_hash(), engine.state().compute_hash());
            assert_eq!(replayed.score, engine.state().score);
        }
    }

    #[test]
    fn test_transcript_round_trips_json() {
        let mut engine = engine();
        engine.start_game(Mode::Subtraction).unwrap();
        let v = correct_value(&engine);
        engine.submit_answer(v).unwrap();
        engine.tick(0.1);

        let transcript = engine.transcript().unwrap();
        let json = serde_json::to_string(transcript).unwrap();
        let back: SessionTranscript = serde_json::from_str(&json).unwrap();

        let (replayed, _) = replay_session(&back, engine.config());
        assert_eq!(replayed.compute_hash(), engine.state().compute_hash());
    }
}
