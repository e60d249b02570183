//! Run and session identifier generation.
//!
//! Centralizes ID generation so the format can change in one place; callers
//! should not assume anything about the generated string beyond uniqueness.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use uuid::Uuid;

/// Configuration for [`IdGenerator::with_config`].
///
/// `seed` pins the non-counter part of generated ids (useful for
/// reproducible test fixtures); `use_counter` appends a monotonic suffix so
/// repeated calls on the same generator never collide even with a fixed
/// seed.
#[derive(Clone, Copy, Debug, Default)]
pub struct IdConfig {
    pub seed: Option<u64>,
    pub use_counter: bool,
}

/// Generates unique identifiers for runtime sessions and runs.
#[derive(Clone, Debug, Default)]
pub struct IdGenerator {
    config: IdConfig,
    counter: Arc<AtomicU64>,
}

impl IdGenerator {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a generator whose [`Self::generate_id`] output is shaped by `config`.
    #[must_use]
    pub fn with_config(config: IdConfig) -> Self {
        Self {
            config,
            counter: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Generates a run identifier, used as the default [`RuntimeConfig`](crate::runtimes::RuntimeConfig) session id.
    #[must_use]
    pub fn generate_run_id(&self) -> String {
        format!("run-{}", Uuid::new_v4())
    }

    /// Generates a session identifier for a fresh [`AppRunner`](crate::runtimes::AppRunner) session.
    #[must_use]
    pub fn generate_session_id(&self) -> String {
        format!("session-{}", Uuid::new_v4())
    }

    /// Generates an id honoring this generator's [`IdConfig`]. With a fixed
    /// seed and `use_counter: true`, successive calls share the seed prefix
    /// but never repeat, since each draws the next value off a shared
    /// monotonic counter.
    #[must_use]
    pub fn generate_id(&self) -> String {
        let base = match self.config.seed {
            Some(seed) => format!("id-{seed}"),
            None => format!("id-{}", Uuid::new_v4()),
        };
        if self.config.use_counter {
            let n = self.counter.fetch_add(1, Ordering::Relaxed);
            format!("{base}-{n}")
        } else {
            base
        }
    }
}
