//! Core deterministic primitives.
//!
//! Seeded randomness and state hashing. Everything the game layer needs to
//! make a session reproducible from its seed and action transcript.

pub mod rng;
pub mod hash;

// Re-export core types
pub use rng::{DeterministicRng, derive_session_seed};
pub use hash::{StateHash, StateHasher, compute_state_hash};
