//! Problem Generation
//!
//! Produces arithmetic problems with one correct answer and three plausible
//! distractors. Pure function of `(level, mode, rng)`.

use std::fmt;

use serde::{Serialize, Deserialize};
use tracing::warn;

use crate::core::rng::DeterministicRng;

/// Highest difficulty a problem can carry.
pub const MAX_DIFFICULTY: u32 = 10;

/// Number of answer options per problem (correct answer included).
pub const OPTION_COUNT: usize = 4;

/// Distractor attempts before the offset range is doubled.
const WIDEN_EVERY: u32 = 16;

/// Distractor attempts before falling back to a deterministic fill.
const MAX_DISTRACTOR_ATTEMPTS: u32 = 64;

// =============================================================================
// OPERATION / MODE
// =============================================================================

/// Arithmetic operation of a single problem.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum Operation {
    Addition = 0,
    Subtraction = 1,
    Multiplication = 2,
    Division = 3,
}

impl Operation {
    /// Symbol shown in the question text.
    pub fn symbol(self) -> &'static str {
        match self {
            Operation::Addition => "+",
            Operation::Subtraction => "-",
            Operation::Multiplication => "×",
            Operation::Division => "÷",
        }
    }

    /// Apply the operation. Division is integer division.
    pub fn apply(self, lhs: i32, rhs: i32) -> i32 {
        match self {
            Operation::Addition => lhs + rhs,
            Operation::Subtraction => lhs - rhs,
            Operation::Multiplication => lhs * rhs,
            Operation::Division => {
                if rhs == 0 {
                    0
                } else {
                    lhs / rhs
                }
            }
        }
    }

    /// Maximum distractor offset from the correct answer.
    ///
    /// Products spread wider than sums, so their distractors do too.
    pub fn distractor_range(self) -> i32 {
        match self {
            Operation::Addition => 10,
            Operation::Subtraction => 8,
            Operation::Multiplication => 20,
            Operation::Division => 8,
        }
    }
}

/// Game mode: which operation family problems are drawn from.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Mode {
    Addition,
    Subtraction,
    Multiplication,
    Division,
    /// Operation chosen by difficulty (the classic progression).
    #[default]
    Mixed,
}

impl Mode {
    /// All modes, in menu order.
    pub const ALL: [Mode; 5] = [
        Mode::Addition,
        Mode::Subtraction,
        Mode::Multiplication,
        Mode::Division,
        Mode::Mixed,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Mode::Addition => "Addition",
            Mode::Subtraction => "Subtraction",
            Mode::Multiplication => "Multiplication",
            Mode::Division => "Division",
            Mode::Mixed => "Mixed",
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// =============================================================================
// PROBLEM
// =============================================================================

/// A single arithmetic question. Immutable once generated.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Problem {
    /// Display text, e.g. `"4 + 7 = ?"`
    pub question_text: String,
    /// Operation applied to the operands
    pub operation: Operation,
    /// Left operand
    pub lhs: i32,
    /// Right operand
    pub rhs: i32,
    /// The one right answer
    pub correct_answer: i32,
    /// Four distinct options in display order, one of which is `correct_answer`
    pub options: [i32; OPTION_COUNT],
    /// Difficulty (1-10) used for scoring and rank points
    pub difficulty: u32,
}

impl Problem {
    /// Build a problem from operands; distractors come from `rng`.
    pub fn new(
        operation: Operation,
        lhs: i32,
        rhs: i32,
        difficulty: u32,
        rng: &mut DeterministicRng,
    ) -> Self {
        let correct_answer = operation.apply(lhs, rhs);
        let options = generate_options(correct_answer, operation.distractor_range(), rng);

        Self {
            question_text: format!("{} {} {} = ?", lhs, operation.symbol(), rhs),
            operation,
            lhs,
            rhs,
            correct_answer,
            options,
            difficulty,
        }
    }

    /// Check a submitted value.
    #[inline]
    pub fn is_correct(&self, value: i32) -> bool {
        value == self.correct_answer
    }
}

// =============================================================================
// GENERATION
// =============================================================================

/// Generate a problem for `level` in `mode`.
pub fn generate(level: u32, mode: Mode, rng: &mut DeterministicRng) -> Problem {
    let difficulty = level.clamp(1, MAX_DIFFICULTY);

    match mode {
        Mode::Addition => addition(difficulty, rng),
        Mode::Subtraction => subtraction(difficulty, rng),
        Mode::Multiplication => multiplication(difficulty, rng),
        Mode::Division => division(difficulty, rng),
        Mode::Mixed => mixed(difficulty, rng),
    }
}

/// Classic progression. At 9+ the operation is re-rolled at a fixed
/// sub-difficulty per operation (3 / 6 / 8), not at the caller's difficulty.
fn mixed(difficulty: u32, rng: &mut DeterministicRng) -> Problem {
    match difficulty {
        1..=3 => addition(difficulty, rng),
        4..=6 => subtraction(difficulty, rng),
        7..=8 => multiplication(difficulty, rng),
        _ => match rng.next_int(3) {
            0 => addition(3, rng),
            1 => subtraction(6, rng),
            _ => multiplication(8, rng),
        },
    }
}

fn addition(difficulty: u32, rng: &mut DeterministicRng) -> Problem {
    let max_num = match difficulty {
        0 | 1 => 10,
        2 => 25,
        _ => 50,
    };
    let lhs = rng.next_int_range(1, max_num);
    let rhs = rng.next_int_range(1, max_num);
    Problem::new(Operation::Addition, lhs, rhs, difficulty, rng)
}

fn subtraction(difficulty: u32, rng: &mut DeterministicRng) -> Problem {
    // Tiers follow the Mixed progression, where subtraction starts at difficulty 4
    let max_num = match difficulty {
        0..=4 => 20,
        5 => 50,
        _ => 100,
    };
    let lhs = rng.next_int_range(10, max_num);
    // rhs < lhs keeps the result positive
    let rhs = rng.next_int_range(1, lhs - 1);
    Problem::new(Operation::Subtraction, lhs, rhs, difficulty, rng)
}

fn multiplication(difficulty: u32, rng: &mut DeterministicRng) -> Problem {
    let (max_lhs, max_rhs) = if difficulty <= 7 { (10, 10) } else { (12, 15) };
    let lhs = rng.next_int_range(2, max_lhs);
    let rhs = rng.next_int_range(2, max_rhs);
    Problem::new(Operation::Multiplication, lhs, rhs, difficulty, rng)
}

fn division(difficulty: u32, rng: &mut DeterministicRng) -> Problem {
    // Tiers reuse the 1-3 / 4-6 / 7+ bands of the Mixed progression
    let max_result = match difficulty {
        0..=3 => 10,
        4..=6 => 15,
        _ => 20,
    };
    let divisor = rng.next_int_range(2, 10);
    let quotient = rng.next_int_range(2, max_result);
    Problem::new(Operation::Division, divisor * quotient, divisor, difficulty, rng)
}

/// Build the shuffled option set around `correct`.
///
/// Random offsets in `[1, range]` are added or subtracted (clamped at 0)
/// until four distinct values exist. The range doubles every
/// [`WIDEN_EVERY`] misses; after [`MAX_DISTRACTOR_ATTEMPTS`] the remaining
/// slots are filled with `correct + 1, correct + 2, ...`.
fn generate_options(correct: i32, range: i32, rng: &mut DeterministicRng) -> [i32; OPTION_COUNT] {
    let mut options = Vec::with_capacity(OPTION_COUNT);
    options.push(correct);

    let mut range = range.max(1);
    let mut attempts = 0;

    while options.len() < OPTION_COUNT && attempts < MAX_DISTRACTOR_ATTEMPTS {
        attempts += 1;
        if attempts % WIDEN_EVERY == 0 {
            range = range.saturating_mul(2);
        }

        let offset = rng.next_int_range(1, range);
        let candidate = if rng.next_bool() {
            correct.saturating_add(offset)
        } else {
            correct.saturating_sub(offset).max(0)
        };

        if !options.contains(&candidate) {
            options.push(candidate);
        }
    }

    if options.len() < OPTION_COUNT {
        warn!(correct, attempts, "distractor pool exhausted, using sequential fill");
        let mut next = correct;
        while options.len() < OPTION_COUNT {
            next = next.saturating_add(1);
            if !options.contains(&next) {
                options.push(next);
            }
        }
    }

    let mut result = [0; OPTION_COUNT];
    result.copy_from_slice(&options);
    rng.shuffle(&mut result);
    result
}

// =============================================================================
// TESTS
// =============================================================================
