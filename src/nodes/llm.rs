//! The LLM node (§4.5): prompt assembly, streaming, and the tool-call loop
//! hookup. Bound to a [`Model`] so graph authors supply any conforming
//! implementation (e.g. [`crate::interfaces::RigModel`]) instead of a
//! hard-coded provider, generalizing the ad-hoc pattern in this crate's own
//! `demo3.rs`.

use futures_util::StreamExt;
use serde_json::json;

use crate::interfaces::{Model, ModelChunk, ModelRequest};
use crate::message::Message;
use crate::node::{Node, NodeContext, NodeError, NodePartial};
use crate::reserved;
use crate::state::StateSnapshot;
use crate::utils::collections::new_extra_map;
use async_trait::async_trait;

/// An LLM-backed node: assembles a prompt from state, streams a completion,
/// and either finalizes a textual answer or hands off to a tools-node.
///
/// `tool_declarations` should match the tool ids registered with
/// [`crate::graphs::GraphBuilder::with_llm_tool_bindings`] for this node, so
/// `compile()`'s tool-route validation and the model's actual tool menu stay
/// in sync.
pub struct LlmNode<M: Model> {
    model: M,
    instruction: String,
    tool_declarations: Vec<crate::interfaces::model::ToolDeclaration>,
    /// When `false`, this node's final textual answer updates
    /// `node_responses[nid]` but not `last_response` (§9 Design Notes:
    /// mirroring is always-on, with this as the opt-out).
    mirror_last_response: bool,
}

impl<M: Model> LlmNode<M> {
    #[must_use]
    pub fn new(model: M, instruction: impl Into<String>) -> Self {
        Self {
            model,
            instruction: instruction.into(),
            tool_declarations: Vec::new(),
            mirror_last_response: true,
        }
    }

    #[must_use]
    pub fn with_tools(mut self, tools: Vec<crate::interfaces::model::ToolDeclaration>) -> Self {
        self.tool_declarations = tools;
        self
    }

    #[must_use]
    pub fn without_last_response_mirroring(mut self) -> Self {
        self.mirror_last_response = false;
        self
    }

    fn assemble_messages(&self, snapshot: &StateSnapshot) -> Vec<Message> {
        if let Some(one_shot) = reserved::one_shot_messages(snapshot) {
            return one_shot;
        }

        let mut messages = Vec::with_capacity(snapshot.messages.len() + 2);
        messages.push(Message::system(&self.instruction));
        messages.extend(snapshot.messages.iter().cloned());
        if let Some(user_input) = reserved::user_input(snapshot) {
            messages.push(Message::user(user_input));
        }
        messages
    }
}

#[async_trait]
impl<M: Model> Node for LlmNode<M> {
    async fn run(
        &self,
        snapshot: StateSnapshot,
        ctx: NodeContext,
    ) -> Result<NodePartial, NodeError> {
        if ctx.is_cancelled() {
            return Err(NodeError::Cancelled {
                node_id: ctx.node_id.clone(),
            });
        }

        let consumed_one_shot = reserved::one_shot_messages(&snapshot).is_some();
        let prompt = self.assemble_messages(&snapshot);
        let request = ModelRequest::new(prompt).with_tools(self.tool_declarations.clone());

        let mut stream = self
            .model
            .generate(request)
            .await
            .map_err(|e| NodeError::Provider {
                provider: "model",
                message: e.to_string(),
            })?;

        let mut text = String::new();
        let mut tool_calls = Vec::new();
        let mut stream_error = None;
        let stream_id = format!("{}-{}", ctx.node_id, ctx.step);

        while let Some(chunk) = stream.next().await {
            if ctx.is_cancelled() {
                return Err(NodeError::Cancelled {
                    node_id: ctx.node_id.clone(),
                });
            }
            let ModelChunk {
                content,
                tool_calls: chunk_tool_calls,
                done,
                error,
                ..
            } = chunk;

            if let Some(delta) = content {
                if !delta.is_empty() {
                    ctx.emit_llm_chunk(None, Some(stream_id.clone()), delta.clone(), None)?;
                }
                text.push_str(&delta);
            }
            if !chunk_tool_calls.is_empty() {
                tool_calls = chunk_tool_calls;
            }
            if let Some(err) = error {
                stream_error = Some(err);
            }
            if done {
                break;
            }
        }

        if let Some(err) = stream_error {
            ctx.emit_llm_error(None, Some(stream_id), err.clone())?;
            return Err(NodeError::Provider {
                provider: "model",
                message: err,
            });
        }

        let mut extra = new_extra_map();

        if !tool_calls.is_empty() {
            let encoded = tool_calls
                .iter()
                .map(|call| {
                    json!({
                        "id": call.id,
                        "name": call.name,
                        "arguments": call.arguments,
                    })
                })
                .collect::<Vec<_>>();
            extra.insert(
                reserved::PENDING_TOOL_CALLS.to_string(),
                serde_json::Value::Array(encoded),
            );

            let summary = tool_calls
                .iter()
                .map(|call| call.name.as_str())
                .collect::<Vec<_>>()
                .join(", ");
            let message = Message::assistant(&format!("requesting tool call(s): {summary}"));

            if consumed_one_shot {
                extra.insert(
                    reserved::ONE_SHOT_MESSAGES.to_string(),
                    reserved::cleared_one_shot_messages(),
                );
            }

            ctx.emit_llm_final(None, Some(stream_id), "", None)?;

            return Ok(NodePartial::new()
                .with_messages(vec![message])
                .with_extra(extra));
        }

        ctx.emit_llm_final(None, Some(stream_id), text.clone(), None)?;

        let message = Message::assistant(&text);
        extra.insert(
            reserved::PENDING_TOOL_CALLS.to_string(),
            serde_json::Value::Array(Vec::new()),
        );
        extra.insert(
            reserved::NODE_RESPONSES.to_string(),
            reserved::merge_node_response(&snapshot, &ctx.node_id, &text),
        );
        if self.mirror_last_response {
            extra.insert(
                reserved::LAST_RESPONSE.to_string(),
                serde_json::Value::String(text.clone()),
            );
        }
        extra.insert(
            reserved::USER_INPUT.to_string(),
            serde_json::Value::String(String::new()),
        );
        if consumed_one_shot {
            extra.insert(
                reserved::ONE_SHOT_MESSAGES.to_string(),
                reserved::cleared_one_shot_messages(),
            );
        }

        Ok(NodePartial::new()
            .with_messages(vec![message])
            .with_extra(extra))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channels::Channel;
    use crate::event_bus::EventBus;
    use crate::interfaces::{ModelError, ModelStream};
    use crate::state::VersionedState;
    use async_trait::async_trait;

    struct StubModel {
        chunks: Vec<ModelChunk>,
    }

    #[async_trait]
    impl Model for StubModel {
        async fn generate(&self, _request: ModelRequest) -> Result<ModelStream, ModelError> {
            let chunks = self.chunks.clone();
            Ok(Box::pin(futures_util::stream::iter(chunks)))
        }
    }

    fn ctx(node_id: &str) -> NodeContext {
        let bus = EventBus::default();
        NodeContext {
            node_id: node_id.to_string(),
            step: 1,
            event_emitter: bus.get_emitter(),
            cancellation: tokio_util::sync::CancellationToken::new(),
        }
    }

    #[tokio::test]
    async fn finalizes_text_answer_and_mirrors_last_response() {
        let model = StubModel {
            chunks: vec![
                ModelChunk::delta("the "),
                ModelChunk::final_text("sum is 5", None),
            ],
        };
        let node = LlmNode::new(model, "you are helpful");
        let mut state = VersionedState::new_with_user_message("what is 2+3?");
        state.add_extra(reserved::USER_INPUT, json!("what is 2+3?"));
        let snapshot = state.snapshot();

        let partial = node.run(snapshot, ctx("plan")).await.unwrap();
        let extra = partial.extra.unwrap();
        assert_eq!(extra[reserved::LAST_RESPONSE], json!("the sum is 5"));
        assert_eq!(
            extra[reserved::NODE_RESPONSES]["plan"],
            json!("the sum is 5")
        );
        assert_eq!(extra[reserved::USER_INPUT], json!(""));
    }

    #[tokio::test]
    async fn tool_calls_populate_pending_tool_calls() {
        let model = StubModel {
            chunks: vec![ModelChunk::final_tool_calls(
                vec![crate::interfaces::ToolCallRequest {
                    id: "call_1".into(),
                    name: "sum".into(),
                    arguments: json!({"a": 2, "b": 3}),
                }],
                None,
            )],
        };
        let node = LlmNode::new(model, "you are helpful");
        let state = VersionedState::new_with_user_message("add 2 and 3");
        let partial = node.run(state.snapshot(), ctx("plan")).await.unwrap();
        let extra = partial.extra.unwrap();
        let pending = extra[reserved::PENDING_TOOL_CALLS].as_array().unwrap();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0]["name"], json!("sum"));
        assert!(!extra.contains_key(reserved::LAST_RESPONSE));
    }

    #[tokio::test]
    async fn clears_one_shot_messages_after_consumption() {
        let model = StubModel {
            chunks: vec![ModelChunk::final_text("expert answer", None)],
        };
        let node = LlmNode::new(model, "you are helpful");
        let mut state = VersionedState::new_with_user_message("ignored");
        state.add_extra(
            reserved::ONE_SHOT_MESSAGES,
            reserved::encode_one_shot_messages(&[
                Message::system("expert"),
                Message::user("Explain X"),
            ]),
        );
        let partial = node.run(state.snapshot(), ctx("ask")).await.unwrap();
        let extra = partial.extra.unwrap();
        assert_eq!(extra[reserved::ONE_SHOT_MESSAGES], json!([]));
    }

    #[tokio::test]
    async fn clears_one_shot_messages_on_tool_call_branch_too() {
        let model = StubModel {
            chunks: vec![ModelChunk::final_tool_calls(
                vec![crate::interfaces::ToolCallRequest {
                    id: "call_1".into(),
                    name: "sum".into(),
                    arguments: json!({"a": 2, "b": 3}),
                }],
                None,
            )],
        };
        let node = LlmNode::new(model, "you are helpful");
        let mut state = VersionedState::new_with_user_message("ignored");
        state.add_extra(
            reserved::ONE_SHOT_MESSAGES,
            reserved::encode_one_shot_messages(&[
                Message::system("expert"),
                Message::user("add 2 and 3"),
            ]),
        );
        let partial = node.run(state.snapshot(), ctx("ask")).await.unwrap();
        let extra = partial.extra.unwrap();
        assert_eq!(extra[reserved::ONE_SHOT_MESSAGES], json!([]));
        assert!(extra.contains_key(reserved::PENDING_TOOL_CALLS));
    }
}
