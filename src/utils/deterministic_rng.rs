//! Seeded RNG for tests that need reproducible "randomness" (fixture ids,
//! shuffle order) without depending on wall-clock entropy.

use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};

const CHARSET: &[u8] = b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// A [`StdRng`] pinned to a caller-supplied seed: two instances built from
/// the same seed yield identical output.
pub struct DeterministicRng {
    inner: StdRng,
}

impl DeterministicRng {
    #[must_use]
    pub fn new(seed: u64) -> Self {
        Self {
            inner: StdRng::seed_from_u64(seed),
        }
    }

    pub fn random_u64(&mut self) -> u64 {
        self.inner.next_u64()
    }

    /// Draws a string of `len` alphanumeric characters.
    pub fn random_string(&mut self, len: usize) -> String {
        (0..len)
            .map(|_| {
                let idx = (self.random_u64() % CHARSET.len() as u64) as usize;
                CHARSET[idx] as char
            })
            .collect()
    }
}
