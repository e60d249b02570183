//! The tools node (§4.5): dispatches every pending tool call the preceding
//! LLM node queued, one `Tool::invoke` per call, and folds the responses back
//! into the conversation for the LLM node to pick up on its next pass.
//!
//! Generalizes the fixed rig/rmcp tool-dispatch loop this crate's own
//! `demo6_agent_mcp.rs` runs inline into a registry-backed [`Node`], so any
//! mix of [`crate::interfaces::Tool`] implementations can be bound to a
//! graph without writing a bespoke dispatch node each time.

use std::sync::Arc;

use async_trait::async_trait;
use rustc_hash::FxHashMap;
use serde_json::json;

use crate::event_bus::ToolPhase;
use crate::interfaces::tool::{Tool, ToolContext};
use crate::message::{Message, Role};
use crate::node::{Node, NodeContext, NodeError, NodePartial};
use crate::reserved;
use crate::state::StateSnapshot;
use crate::utils::collections::new_extra_map;

/// Role used for tool-response messages appended to the conversation. Not
/// one of [`Message::USER`]/[`Message::ASSISTANT`]/[`Message::SYSTEM`] since
/// it carries a structured payload (call id, tool name, result or error) a
/// model adapter decodes, not freeform text.
pub const TOOL_ROLE: &str = "tool";

/// Runs every tool call left pending by an [`crate::nodes::LlmNode`] in
/// `extra["pending_tool_calls"]`, in order, against a registry of bound
/// [`Tool`] implementations.
pub struct ToolsNode {
    tools: FxHashMap<String, Arc<dyn Tool>>,
}

impl ToolsNode {
    /// Builds the registry from each tool's own [`Tool::descriptor`] name, so
    /// callers don't have to repeat it.
    #[must_use]
    pub fn new(tools: Vec<Arc<dyn Tool>>) -> Self {
        let tools = tools
            .into_iter()
            .map(|tool| (tool.descriptor().name, tool))
            .collect();
        Self { tools }
    }
}

#[async_trait]
impl Node for ToolsNode {
    async fn run(
        &self,
        snapshot: StateSnapshot,
        ctx: NodeContext,
    ) -> Result<NodePartial, NodeError> {
        let Some(calls) = reserved::pending_tool_calls(&snapshot) else {
            return Ok(NodePartial::new());
        };
        let calls = calls.to_vec();

        let mut messages = Vec::with_capacity(calls.len());
        for call in &calls {
            if ctx.is_cancelled() {
                return Err(NodeError::Cancelled {
                    node_id: ctx.node_id.clone(),
                });
            }

            let id = call["id"].as_str().unwrap_or_default().to_string();
            let name = call["name"].as_str().unwrap_or_default().to_string();
            let arguments = call["arguments"].clone();

            let _ = ctx.emit_tool(
                name.clone(),
                id.clone(),
                ToolPhase::Start,
                format!("invoking {name} (call {id})"),
                None,
            );

            let Some(tool) = self.tools.get(&name) else {
                let _ = ctx.emit_tool(
                    name.clone(),
                    id.clone(),
                    ToolPhase::Error,
                    format!("no tool bound for {name} (call {id})"),
                    Some("no such tool bound".to_string()),
                );
                messages.push(tool_response_message(&id, &name, None, Some("no such tool bound")));
                continue;
            };

            let tool_ctx = ToolContext::new(id.clone(), ctx.cancellation.clone());
            match tool.invoke(arguments, tool_ctx).await {
                Ok(result) => {
                    let _ = ctx.emit_tool(
                        name.clone(),
                        id.clone(),
                        ToolPhase::Complete,
                        format!("{name} (call {id}) succeeded"),
                        None,
                    );
                    messages.push(tool_response_message(&id, &name, Some(result), None));
                }
                Err(err) => {
                    let _ = ctx.emit_tool(
                        name.clone(),
                        id.clone(),
                        ToolPhase::Error,
                        format!("{name} (call {id}) failed: {err}"),
                        Some(err.to_string()),
                    );
                    messages.push(tool_response_message(&id, &name, None, Some(&err.to_string())));
                }
            }
        }

        let mut extra = new_extra_map();
        extra.insert(
            reserved::PENDING_TOOL_CALLS.to_string(),
            serde_json::Value::Array(Vec::new()),
        );

        Ok(NodePartial::new()
            .with_messages(messages)
            .with_extra(extra))
    }
}

fn tool_response_message(
    id: &str,
    name: &str,
    result: Option<serde_json::Value>,
    error: Option<&str>,
) -> Message {
    let payload = json!({
        "id": id,
        "name": name,
        "result": result,
        "error": error,
    });
    Message::with_role(Role::Custom(TOOL_ROLE.to_string()), payload.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event_bus::EventBus;
    use crate::interfaces::tool::{ToolDescriptor, ToolError};
    use crate::state::VersionedState;
    use serde_json::Value;

    struct EchoTool;

    #[async_trait]
    impl Tool for EchoTool {
        fn descriptor(&self) -> ToolDescriptor {
            ToolDescriptor::new("echo", "echoes its arguments", json!({}))
        }

        async fn invoke(&self, arguments: Value, _ctx: ToolContext) -> Result<Value, ToolError> {
            Ok(arguments)
        }
    }

    struct FailingTool;

    #[async_trait]
    impl Tool for FailingTool {
        fn descriptor(&self) -> ToolDescriptor {
            ToolDescriptor::new("boom", "always fails", json!({}))
        }

        async fn invoke(&self, _arguments: Value, _ctx: ToolContext) -> Result<Value, ToolError> {
            Err(ToolError::Execution {
                tool: "boom".to_string(),
                message: "simulated failure".to_string(),
            })
        }
    }

    fn ctx() -> NodeContext {
        let bus = EventBus::default();
        NodeContext {
            node_id: "tools".to_string(),
            step: 2,
            event_emitter: bus.get_emitter(),
            cancellation: tokio_util::sync::CancellationToken::new(),
        }
    }

    #[tokio::test]
    async fn invokes_bound_tool_and_clears_pending_calls() {
        let node = ToolsNode::new(vec![Arc::new(EchoTool)]);
        let mut state = VersionedState::new_with_user_message("add 2 and 3");
        state.add_extra(
            reserved::PENDING_TOOL_CALLS,
            json!([{"id": "call_1", "name": "echo", "arguments": {"a": 2}}]),
        );

        let partial = node.run(state.snapshot(), ctx()).await.unwrap();
        let messages = partial.messages.unwrap();
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].role, TOOL_ROLE);
        let payload: Value = serde_json::from_str(&messages[0].content).unwrap();
        assert_eq!(payload["id"], json!("call_1"));
        assert_eq!(payload["result"]["a"], json!(2));

        let extra = partial.extra.unwrap();
        assert_eq!(extra[reserved::PENDING_TOOL_CALLS], json!([]));
    }

    #[tokio::test]
    async fn unbound_and_failing_tools_report_errors_without_aborting() {
        let node = ToolsNode::new(vec![Arc::new(FailingTool)]);
        let mut state = VersionedState::new_with_user_message("do two things");
        state.add_extra(
            reserved::PENDING_TOOL_CALLS,
            json!([
                {"id": "call_1", "name": "boom", "arguments": {}},
                {"id": "call_2", "name": "missing", "arguments": {}},
            ]),
        );

        let partial = node.run(state.snapshot(), ctx()).await.unwrap();
        let messages = partial.messages.unwrap();
        assert_eq!(messages.len(), 2);
        let first: Value = serde_json::from_str(&messages[0].content).unwrap();
        assert_eq!(first["error"], json!("tool boom failed: simulated failure"));
        let second: Value = serde_json::from_str(&messages[1].content).unwrap();
        assert_eq!(second["error"], json!("no such tool bound"));
    }

    #[tokio::test]
    async fn no_pending_calls_is_a_no_op() {
        let node = ToolsNode::new(vec![Arc::new(EchoTool)]);
        let state = VersionedState::new_with_user_message("hi");
        let partial = node.run(state.snapshot(), ctx()).await.unwrap();
        assert!(partial.messages.is_none());
        assert!(partial.extra.is_none());
    }
}
