//! Message and tool-call ID generation helpers.
//!
//! [`crate::message::Message`]'s own constructors stamp every message with a
//! process-global id, which is all the conversation-append reducer
//! ([`crate::reducers::AddMessages`]) needs to dedup within a single process.
//! [`MessageIdGenerator`] is for callers that want ids correlated to a
//! specific session and super-step instead — useful for external logging,
//! event envelopes, or replay matching across a distributed deployment where
//! a bare counter would collide.
//!
//! # ID Formats
//!
//! - Message IDs: `msg-{session_id}-{step}-{counter}`
//! - Tool Call IDs: `tool-{node_id}-{step}-{counter}`

use std::sync::atomic::{AtomicU64, Ordering};

/// Generates session-scoped message and tool-call ids.
///
/// One generator is meant to live for the lifetime of a session; each call
/// draws from a shared counter so ids stay unique even when message and
/// tool-call ids are interleaved.
#[derive(Debug)]
pub struct MessageIdGenerator {
    session_id: String,
    counter: AtomicU64,
}

impl MessageIdGenerator {
    #[must_use]
    pub fn new(session_id: impl Into<String>) -> Self {
        Self {
            session_id: session_id.into(),
            counter: AtomicU64::new(0),
        }
    }

    /// Next message id for the given super-step.
    #[must_use]
    pub fn next_message_id(&self, step: u64) -> String {
        let n = self.counter.fetch_add(1, Ordering::Relaxed);
        format!("msg-{}-{}-{}", self.session_id, step, n)
    }

    /// Next tool-call id for `node_id` at the given super-step.
    #[must_use]
    pub fn next_tool_call_id(&self, node_id: &str, step: u64) -> String {
        let n = self.counter.fetch_add(1, Ordering::Relaxed);
        format!("tool-{node_id}-{step}-{n}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn message_ids_are_unique_and_formatted() {
        let gen = MessageIdGenerator::new("session-123");
        let a = gen.next_message_id(1);
        let b = gen.next_message_id(1);
        assert_ne!(a, b);
        assert!(a.starts_with("msg-session-123-1-"));
    }

    #[test]
    fn tool_call_ids_embed_node_and_step() {
        let gen = MessageIdGenerator::new("session-123");
        let id = gen.next_tool_call_id("my_node", 4);
        assert!(id.starts_with("tool-my_node-4-"));
    }

    #[test]
    fn message_and_tool_ids_share_one_counter() {
        let gen = MessageIdGenerator::new("s");
        let m = gen.next_message_id(0);
        let t = gen.next_tool_call_id("n", 0);
        assert_ne!(m, t);
    }
}
