//! Concurrent super-step scheduling and dependency-aware node execution.
//!
//! A super-step fans a ready "frontier" of [`NodeKind`](crate::types::NodeKind)s
//! out to bounded-concurrency tasks, gating re-execution on whether the
//! relevant channel versions have actually changed since a node last ran.
//! [`crate::runtimes::runner::AppRunner`] drives one super-step per call to
//! `run_step`, feeding the resulting [`scheduler::StepRunResult`] into
//! [`crate::app::App::apply_barrier`].

pub mod retry;
pub mod scheduler;

pub use retry::{RetryDecision, RetryPolicy};
pub use scheduler::{Scheduler, SchedulerError, SchedulerState, StepRunResult};
