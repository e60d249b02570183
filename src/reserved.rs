//! Reserved `extra`-channel keys and their typed accessors.
//!
//! The engine attaches conventional meaning to a handful of keys in
//! `VersionedState::extra` / `StateSnapshot::extra` instead of adding dedicated
//! channels for each: the current user turn, a one-shot prompt override, the
//! latest textual response per node, and the mirrored "last response overall".
//! Callers should prefer the accessors here over raw map indexing, matching
//! this crate's existing convention for `ExtrasChannel` (see
//! `VersionedState::add_extra`).
//!
//! None of these keys carry any special reducer: they are merged like any
//! other `extra` entry, through whichever reducer the `Extra` channel is
//! configured with (`MapMerge` by default, or a `KeyedReducer` wrapping a
//! [`StateSchema`](crate::schema::StateSchema)). Multi-writer keys
//! (`node_responses`) are read-modify-written by the node itself, since a
//! plain `MapMerge` only replaces whole top-level keys.

use rustc_hash::FxHashMap;
use serde_json::{json, Value};

use crate::message::Message;
use crate::state::StateSnapshot;

/// Current user turn content, stored as a plain string.
pub const USER_INPUT: &str = "user_input";
/// One-shot prompt override: a JSON array of `{role, content}`, cleared on consumption.
pub const ONE_SHOT_MESSAGES: &str = "one_shot_messages";
/// Most recent textual assistant output across the whole invocation.
pub const LAST_RESPONSE: &str = "last_response";
/// Map from node id to that node's last textual output.
pub const NODE_RESPONSES: &str = "node_responses";
/// Engine-provided record: invocation id, current node id, step number.
pub const EXEC_CONTEXT: &str = "exec_context";
/// Tool-call requests pending dispatch, consulted by `add_tools_conditional_edge`.
pub const PENDING_TOOL_CALLS: &str = "pending_tool_calls";

/// Runtime-state keys seeded at session creation (§6 invocation surface).
pub const USER_ID: &str = "user_id";
pub const SESSION_ID: &str = "session_id";
pub const REQUEST_TS: &str = "request_ts";

/// Reads `extra["user_input"]` as a string, if present.
#[must_use]
pub fn user_input(snapshot: &StateSnapshot) -> Option<&str> {
    snapshot.extra.get(USER_INPUT).and_then(Value::as_str)
}

/// Reads and parses `extra["one_shot_messages"]` into `Message`s.
///
/// Returns `None` when the key is absent, empty, or not an array of
/// `{role, content}` objects.
#[must_use]
pub fn one_shot_messages(snapshot: &StateSnapshot) -> Option<Vec<Message>> {
    let value = snapshot.extra.get(ONE_SHOT_MESSAGES)?;
    let array = value.as_array()?;
    if array.is_empty() {
        return None;
    }
    let messages = array
        .iter()
        .filter_map(|entry| {
            let role = entry.get("role")?.as_str()?;
            let content = entry.get("content")?.as_str()?;
            Some(Message::new(role, content))
        })
        .collect::<Vec<_>>();
    if messages.is_empty() {
        None
    } else {
        Some(messages)
    }
}

/// Builds the JSON value written to `extra["one_shot_messages"]` for a list of messages.
#[must_use]
pub fn encode_one_shot_messages(messages: &[Message]) -> Value {
    Value::Array(
        messages
            .iter()
            .map(|m| json!({"role": m.role, "content": m.content}))
            .collect(),
    )
}

/// The sentinel value that clears `extra["one_shot_messages"]` once consumed.
#[must_use]
pub fn cleared_one_shot_messages() -> Value {
    Value::Array(Vec::new())
}

/// Reads `extra["last_response"]` as a string, if present.
#[must_use]
pub fn last_response(snapshot: &StateSnapshot) -> Option<&str> {
    snapshot.extra.get(LAST_RESPONSE).and_then(Value::as_str)
}

/// Reads `extra["node_responses"][node_id]` as a string, if present.
#[must_use]
pub fn node_response<'a>(snapshot: &'a StateSnapshot, node_id: &str) -> Option<&'a str> {
    snapshot
        .extra
        .get(NODE_RESPONSES)
        .and_then(Value::as_object)
        .and_then(|map| map.get(node_id))
        .and_then(Value::as_str)
}

/// Produces the merged `node_responses` object for writing back to `extra`,
/// carrying forward every other node's last response alongside this one.
///
/// `MapMerge` only replaces whole top-level keys, so a node that wants to
/// update its own entry without erasing its siblings' must read-modify-write
/// the full object, which is what this helper does.
#[must_use]
pub fn merge_node_response(snapshot: &StateSnapshot, node_id: &str, text: &str) -> Value {
    let mut map = snapshot
        .extra
        .get(NODE_RESPONSES)
        .and_then(Value::as_object)
        .cloned()
        .unwrap_or_default();
    map.insert(node_id.to_string(), json!(text));
    Value::Object(map)
}

/// Reads `extra["exec_context"]`, if present.
#[must_use]
pub fn exec_context(snapshot: &StateSnapshot) -> Option<&Value> {
    snapshot.extra.get(EXEC_CONTEXT)
}

/// Builds the `exec_context` record the engine attaches per node invocation.
#[must_use]
pub fn build_exec_context(invocation_id: &str, node_id: &str, step: u64) -> Value {
    json!({
        "invocation_id": invocation_id,
        "node_id": node_id,
        "step": step,
    })
}

/// Reads `extra["pending_tool_calls"]` as a JSON array, if non-empty.
#[must_use]
pub fn pending_tool_calls(snapshot: &StateSnapshot) -> Option<&[Value]> {
    snapshot
        .extra
        .get(PENDING_TOOL_CALLS)
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .filter(|calls| !calls.is_empty())
}

/// Writes `key` into an extras map, creating the map if `extra` is `None`.
pub fn insert(extra: &mut Option<FxHashMap<String, Value>>, key: &str, value: Value) {
    extra
        .get_or_insert_with(crate::utils::collections::new_extra_map)
        .insert(key.to_string(), value);
}
