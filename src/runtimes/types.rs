//! Small typed identifiers for runtime execution: a session's external id
//! and a monotonic step counter. Kept separate from [`crate::types::NodeKind`]
//! / [`crate::types::ChannelType`] (the graph-shape types) since these two
//! describe a single invocation's progress, not the compiled topology.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Opaque identifier for a checkpointed/resumable session.
///
/// Thin wrapper over `String` so callers don't pass a bare session id where
/// e.g. a node id or user id is expected; `AppRunner` accepts `&str`/`String`
/// directly for ergonomics, construct a `SessionId` at the boundary where a
/// typed id is useful (logging, persistence keys).
#[derive(Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct SessionId(String);

impl SessionId {
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Generates a fresh, random session id (UUID v4).
    #[must_use]
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for SessionId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for SessionId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// A super-step counter. Saturates at `u64::MAX` instead of panicking or
/// wrapping, since a step counter overflowing is a sign something upstream
/// is stuck in a loop, not a value worth corrupting via wraparound.
#[derive(Clone, Copy, Debug, Eq, PartialEq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct StepNumber(u64);

impl StepNumber {
    #[must_use]
    pub fn new(value: u64) -> Self {
        Self(value)
    }

    #[must_use]
    pub fn zero() -> Self {
        Self(0)
    }

    #[must_use]
    pub fn value(&self) -> u64 {
        self.0
    }

    #[must_use]
    pub fn is_initial(&self) -> bool {
        self.0 == 0
    }

    #[must_use]
    pub fn next(&self) -> Self {
        Self(self.0.saturating_add(1))
    }
}

impl fmt::Display for StepNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for StepNumber {
    fn from(value: u64) -> Self {
        Self(value)
    }
}
