//! Per-node retry policy and backoff computation.
//!
//! Retries are decided and timed here; the scheduler is responsible for
//! actually re-invoking a node and emitting diagnostic events around each
//! attempt.

use std::time::Duration;

use rand::Rng;

use crate::node::NodeError;

/// Strategy for perturbing a computed backoff delay to avoid thundering-herd
/// retries across many concurrently-failing nodes.
#[derive(Clone, Debug, PartialEq)]
pub enum JitterStrategy {
    /// No perturbation; always use the raw computed delay.
    None,
    /// Multiply the delay by a random factor in `[1.0 - fraction, 1.0 + fraction]`.
    Proportional { fraction: f64 },
}

/// Decides whether a given `NodeError` is worth retrying at all.
///
/// Defaults to retrying `Provider` errors (transient upstream failures) and
/// never retrying `ValidationFailed`/`MissingInput` (deterministic, would
/// fail identically on retry).
pub type RetryPredicate = fn(&NodeError) -> bool;

fn default_retry_predicate(error: &NodeError) -> bool {
    matches!(error, NodeError::Provider { .. } | NodeError::Serde(_))
}

/// Configuration for retrying a node's execution after a failure.
///
/// Cloned cheaply and stored per-node by [`crate::graphs::GraphBuilder::with_retry_policy`].
#[derive(Clone, Debug)]
pub struct RetryPolicy {
    /// Maximum number of attempts, including the first. `1` disables retries.
    pub max_attempts: u32,
    /// Delay before the first retry.
    pub initial_interval: Duration,
    /// Multiplier applied to the delay after every subsequent attempt.
    pub backoff_factor: f64,
    /// Upper bound on the computed delay, regardless of attempt count.
    pub max_interval: Duration,
    /// Optional jitter applied on top of the exponential backoff curve.
    pub jitter: Option<JitterStrategy>,
    /// Predicate deciding whether a particular error is retryable at all.
    pub retry_on: RetryPredicate,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 1,
            initial_interval: Duration::from_millis(200),
            backoff_factor: 2.0,
            max_interval: Duration::from_secs(30),
            jitter: Some(JitterStrategy::Proportional { fraction: 0.1 }),
            retry_on: default_retry_predicate,
        }
    }
}

impl RetryPolicy {
    /// A policy allowing `max_attempts` tries with exponential backoff
    /// starting at `initial_interval`, doubling each attempt, capped at
    /// `max_interval`.
    #[must_use]
    pub fn exponential(max_attempts: u32, initial_interval: Duration, max_interval: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            initial_interval,
            backoff_factor: 2.0,
            max_interval,
            ..Default::default()
        }
    }

    /// Disables retries entirely: every node execution gets exactly one attempt.
    #[must_use]
    pub fn none() -> Self {
        Self {
            max_attempts: 1,
            ..Default::default()
        }
    }

    #[must_use]
    pub fn with_jitter(mut self, jitter: JitterStrategy) -> Self {
        self.jitter = Some(jitter);
        self
    }

    #[must_use]
    pub fn with_retry_predicate(mut self, predicate: RetryPredicate) -> Self {
        self.retry_on = predicate;
        self
    }

    /// Given the error from the attempt that just failed (`attempt`, 1-indexed)
    /// decide whether to retry and, if so, how long to wait first.
    #[must_use]
    pub fn decide(&self, attempt: u32, error: &NodeError) -> RetryDecision {
        if attempt >= self.max_attempts || !(self.retry_on)(error) {
            return RetryDecision::Stop;
        }
        RetryDecision::RetryAfter(compute_delay(self, attempt))
    }
}

/// Outcome of consulting a [`RetryPolicy`] after a failed attempt.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum RetryDecision {
    /// Give up; propagate the error as a fatal node failure.
    Stop,
    /// Wait the given duration, then retry.
    RetryAfter(Duration),
}

/// Computes `min(max_interval, initial_interval * backoff_factor^(attempt-1))`,
/// then applies the policy's jitter strategy, if any.
///
/// `attempt` is the 1-indexed attempt number that just failed (the delay
/// returned is how long to wait before attempt `attempt + 1`).
#[must_use]
pub fn compute_delay(policy: &RetryPolicy, attempt: u32) -> Duration {
    let exponent = attempt.saturating_sub(1);
    let raw_secs =
        policy.initial_interval.as_secs_f64() * policy.backoff_factor.powi(exponent as i32);
    let capped_secs = raw_secs.min(policy.max_interval.as_secs_f64()).max(0.0);

    let jittered_secs = match &policy.jitter {
        None | Some(JitterStrategy::None) => capped_secs,
        Some(JitterStrategy::Proportional { fraction }) => {
            let fraction = fraction.clamp(0.0, 1.0);
            let low = capped_secs * (1.0 - fraction);
            let high = capped_secs * (1.0 + fraction);
            if high > low {
                rand::rng().random_range(low..high)
            } else {
                capped_secs
            }
        }
    };

    Duration::from_secs_f64(jittered_secs.min(policy.max_interval.as_secs_f64()))
}
