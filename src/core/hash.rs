//! State Hashing for Verification
//!
//! Provides deterministic hashing of session state for:
//! - Replay validation (same transcript, same hash)
//! - Cheap equality checks between a live session and a re-run

use sha2::{Sha256, Digest};

/// Hash output type (256 bits / 32 bytes)
pub type StateHash = [u8; 32];

/// Deterministic hasher for session state.
///
/// Wraps SHA-256 with helpers for the primitive types the engine stores.
/// Order of updates is critical for determinism.
pub struct StateHasher {
    hasher: Sha256,
}

impl StateHasher {
    /// Create a new hasher with domain separator.
    pub fn new(domain: &[u8]) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(domain);
        Self { hasher }
    }

    /// Create hasher for session state.
    pub fn for_session_state() -> Self {
        Self::new(b"MATH_RUSH_STATE_V1")
    }

    /// Update with a u8 value.
    #[inline]
    pub fn update_u8(&mut self, value: u8) {
        self.hasher.update([value]);
    }

    /// Update with a u32 value (little-endian).
    #[inline]
    pub fn update_u32(&mut self, value: u32) {
        self.hasher.update(value.to_le_bytes());
    }

    /// Update with a u64 value (little-endian).
    #[inline]
    pub fn update_u64(&mut self, value: u64) {
        self.hasher.update(value.to_le_bytes());
    }

    /// Update with an i32 value (little-endian).
    #[inline]
    pub fn update_i32(&mut self, value: i32) {
        self.hasher.update(value.to_le_bytes());
    }

    /// Update with an f64 by its bit pattern.
    ///
    /// Seconds are accumulated by identical float operations on replay, so
    /// bit equality is the right notion here.
    #[inline]
    pub fn update_f64(&mut self, value: f64) {
        self.update_u64(value.to_bits());
    }

    /// Update with a boolean.
    #[inline]
    pub fn update_bool(&mut self, value: bool) {
        self.update_u8(value as u8);
    }

    /// Update with a length-prefixed string.
    #[inline]
    pub fn update_str(&mut self, value: &str) {
        self.update_u32(value.len() as u32);
        self.hasher.update(value.as_bytes());
    }

    /// Finalize and return the hash.
    pub fn finalize(self) -> StateHash {
        self.hasher.finalize().into()
    }
}

/// Compute state hash for session verification.
///
/// This function is called by `SessionState::compute_hash()`.
/// The closure adds the session-specific fields.
pub fn compute_state_hash<F>(answered: u32, rng_seed: u64, add_state: F) -> StateHash
where
    F: FnOnce(&mut StateHasher),
{
    let mut hasher = StateHasher::for_session_state();

    // Always hash progress counter and seed first
    hasher.update_u32(answered);
    hasher.update_u64(rng_seed);

    add_state(&mut hasher);

    hasher.finalize()
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_hasher_determinism() {
        let make_hash = || {
            let mut hasher = StateHasher::for_session_state();
            hasher.update_u32(100);
            hasher.update_u64(12345);
            hasher.update_f64(29.9);
            hasher.update_i32(-4);
            hasher.update_str("4 + 7 = ?");
            hasher.update_bool(true);
            hasher.finalize()
        };

        assert_eq!(make_hash(), make_hash());
    }

    #[test]
    fn test_hash_order_matters() {
        let hash1 = {
            let mut h = StateHasher::new(b"test");
            h.update_u32(1);
            h.update_u32(2);
            h.finalize()
        };

        let hash2 = {
            let mut h = StateHasher::new(b"test");
            h.update_u32(2);
            h.update_u32(1);
            h.finalize()
        };

        assert_ne!(hash1, hash2);
    }

    #[test]
    fn test_string_length_prefix() {
        let hash1 = {
            let mut h = StateHasher::new(b"test");
            h.update_str("ab");
            h.update_str("c");
            h.finalize()
        };

        let hash2 = {
            let mut h = StateHasher::new(b"test");
            h.update_str("a");
            h.update_str("bc");
            h.finalize()
        };

        assert_ne!(hash1, hash2);
    }

    #[test]
    fn test_domain_separation() {
        let mut a = StateHasher::new(b"DOMAIN_A");
        let mut b = StateHasher::new(b"DOMAIN_B");
        a.update_u32(1234);
        b.update_u32(1234);

        assert_ne!(a.finalize(), b.finalize());
    }

    #[test]
    fn test_compute_state_hash() {
        let hash = compute_state_hash(10, 12345, |hasher| {
            hasher.update_f64(5.0);
            hasher.update_bool(true);
        });

        let hash2 = compute_state_hash(10, 12345, |hasher| {
            hasher.update_f64(5.0);
            hasher.update_bool(true);
        });

        assert_eq!(hash, hash2);

        let hash3 = compute_state_hash(11, 12345, |hasher| {
            hasher.update_f64(5.0);
            hasher.update_bool(true);
        });

        assert_ne!(hash, hash3);
    }
}
