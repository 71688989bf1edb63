//! Answer Scoring
//!
//! Applies one submitted answer: score, streak and combo, level-ups,
//! achievements, rank points, countdown penalty and the next problem.

use tracing::{debug, info};

use crate::game::achievement::{earned, newly_unlocked, AchievementId, MilestoneProgress};
use crate::game::events::GameEvent;
use crate::game::rank::rank_delta;
use crate::game::scoring::{combo_multiplier, score_answer, time_penalty};
use crate::game::state::{SessionPhase, SessionState, COMBO_STREAK};
use crate::game::tick::{
    expire, present_next_problem, require_phase, ActionError, ActionResult, SessionConfig,
};

/// Score a submitted answer.
///
/// Only valid while the session is active. A value that is not among the
/// options is simply a wrong answer.
pub fn submit_answer(state: &mut SessionState, value: i32, config: &SessionConfig) -> ActionResult {
    require_phase(state, SessionPhase::Active, "submit_answer")?;
    let Some(problem) = state.current_problem.clone() else {
        return Err(ActionError::InvalidPhase {
            action: "submit_answer",
            phase: state.phase,
        });
    };

    let stimulus = state.next_stimulus();
    let latency = state.answer_latency();
    let is_correct = problem.is_correct(value);

    state.total_answered += 1;

    if is_correct {
        apply_correct(state, value, problem.correct_answer, problem.difficulty, latency, config, stimulus);
    } else {
        apply_incorrect(state, value, problem.correct_answer, problem.difficulty, latency, stimulus);
    }

    if config.features.rank {
        update_rank(state, is_correct, problem.difficulty, stimulus);
    }

    if state.time_remaining <= 0.0 {
        // Penalty drained the countdown: same outcome as a timer expiry
        expire(state, config, stimulus);
    } else {
        present_next_problem(state, stimulus);
    }

    Ok(state.take_events())
}

fn apply_correct(
    state: &mut SessionState,
    submitted: i32,
    expected: i32,
    difficulty: u32,
    latency: f64,
    config: &SessionConfig,
    stimulus: u32,
) {
    state.total_correct += 1;
    state.streak += 1;
    state.best_streak = state.best_streak.max(state.streak);

    let fast = latency < config.fast_answer_threshold;

    let old_multiplier = state.combo_multiplier;
    state.combo_multiplier = combo_multiplier(state.streak);

    let breakdown = score_answer(difficulty, state.streak, state.combo_multiplier, latency, fast);
    let points = breakdown.total();
    state.score = state.score.saturating_add(points);

    debug!(points, streak = state.streak, latency, fast, "Correct answer");
    state.push_event(GameEvent::answer_evaluated(
        stimulus, true, submitted, expected, difficulty, points, state.score, latency, fast,
    ));

    if state.streak == COMBO_STREAK || state.combo_multiplier > old_multiplier {
        state.push_event(GameEvent::combo_activated(stimulus, state.combo_multiplier, state.streak));
    }

    let mut candidates = Vec::new();

    if state.total_correct % config.answers_per_level == 0 {
        let perfect = level_up(state, config, stimulus);
        if perfect {
            candidates.push(AchievementId::PerfectLevel);
        }
    }

    if config.features.achievements {
        candidates.extend(earned(&MilestoneProgress {
            streak: state.streak,
            score: state.score,
            level: state.level,
            fast_answer: fast,
        }));
        unlock(state, &candidates, stimulus);
    }
}

fn apply_incorrect(
    state: &mut SessionState,
    submitted: i32,
    expected: i32,
    difficulty: u32,
    latency: f64,
    stimulus: u32,
) {
    let lost_streak = state.streak;
    state.streak = 0;
    state.combo_multiplier = 1;
    state.wrong_in_level += 1;

    let penalty = time_penalty(state.level);
    state.time_remaining = (state.time_remaining - penalty).max(0.0);

    debug!(submitted, expected, lost_streak, penalty, "Wrong answer");
    state.push_event(GameEvent::answer_evaluated(
        stimulus, false, submitted, expected, difficulty, 0, state.score, latency, false,
    ));
    state.push_event(GameEvent::penalized(stimulus, lost_streak, penalty));
}

/// Advance one level. Returns whether the level was perfect.
fn level_up(state: &mut SessionState, config: &SessionConfig, stimulus: u32) -> bool {
    state.level += 1;

    let before = state.time_remaining;
    state.time_remaining = (state.time_remaining + config.level_up_time_bonus).min(config.max_time);
    let time_bonus = state.time_remaining - before;

    let perfect = state.wrong_in_level == 0;
    let bonus_points = if perfect { config.perfect_level_bonus } else { 0 };
    state.score = state.score.saturating_add(bonus_points);
    state.wrong_in_level = 0;

    info!(level = state.level, perfect, "Level up");
    state.push_event(GameEvent::level_up(stimulus, state.level, time_bonus, perfect, bonus_points));

    perfect
}

fn unlock(state: &mut SessionState, candidates: &[AchievementId], stimulus: u32) {
    for id in newly_unlocked(candidates, &state.known_achievements, &state.unlocked_this_session) {
        // Candidates may repeat an id; the set insert keeps it to one event
        if state.unlocked_this_session.insert(id) {
            info!(achievement = id.title(), "Achievement unlocked");
            state.push_event(GameEvent::achievement_unlocked(stimulus, id));
        }
    }
}

fn update_rank(state: &mut SessionState, is_correct: bool, difficulty: u32, stimulus: u32) {
    let old_rank = state.rank();
    state.rank_points = rank_delta(state.rank_points, is_correct, difficulty);
    let new_rank = state.rank();

    if !old_rank.same_division(&new_rank) {
        info!(%old_rank, %new_rank, "Rank changed");
        state.push_event(GameEvent::rank_changed(stimulus, old_rank, new_rank));
    }
}
