//! The sub-agent node (§4.5): delegates to an external capability bound via
//! [`crate::interfaces::SubAgent`], forwarding its event stream and writing
//! its final assistant text to `node_responses[nid]`, mirroring how
//! [`crate::nodes::LlmNode`] finalizes a textual answer.

use std::sync::Arc;

use async_trait::async_trait;
use futures_util::StreamExt;

use crate::event_bus::Event;
use crate::interfaces::sub_agent::{SubAgent, SubAgentContext};
use crate::node::{Node, NodeContext, NodeError, NodePartial};
use crate::reserved;
use crate::state::StateSnapshot;
use crate::utils::collections::new_extra_map;

/// A node that delegates execution to a bound [`SubAgent`] (e.g. a
/// [`crate::interfaces::GraphSubAgent`] wrapping a compiled sub-graph),
/// forwarding its events under this node's id and step.
pub struct SubAgentNode {
    sub_agent: Arc<dyn SubAgent>,
    /// When `false`, this node's final textual answer updates
    /// `node_responses[nid]` but not `last_response` (§9 Design Notes:
    /// mirroring is always-on, with this as the opt-out).
    mirror_last_response: bool,
}

impl SubAgentNode {
    #[must_use]
    pub fn new(sub_agent: Arc<dyn SubAgent>) -> Self {
        Self {
            sub_agent,
            mirror_last_response: true,
        }
    }

    #[must_use]
    pub fn without_last_response_mirroring(mut self) -> Self {
        self.mirror_last_response = false;
        self
    }
}

#[async_trait]
impl Node for SubAgentNode {
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

        let sub_ctx = SubAgentContext::new(
            ctx.node_id.clone(),
            ctx.node_id.clone(),
            ctx.cancellation.clone(),
        );

        let mut stream = self.sub_agent.run(sub_ctx, snapshot);
        let mut final_text: Option<String> = None;

        while let Some(event) = stream.next().await {
            if ctx.is_cancelled() {
                return Err(NodeError::Cancelled {
                    node_id: ctx.node_id.clone(),
                });
            }

            if let Event::Node(node_event) = &event {
                if node_event.scope() == "sub_agent.complete" {
                    final_text = Some(node_event.message().to_string());
                }
            }

            ctx.emit_node(
                event.scope_label().unwrap_or("sub_agent").to_string(),
                event.message().to_string(),
            )?;
        }

        let Some(text) = final_text else {
            return Ok(NodePartial::new());
        };

        let mut extra = new_extra_map();
        extra.insert(
            reserved::NODE_RESPONSES.to_string(),
            reserved::merge_node_response(&snapshot, &ctx.node_id, &text),
        );
        if self.mirror_last_response {
            extra.insert(
                reserved::LAST_RESPONSE.to_string(),
                serde_json::Value::String(text),
            );
        }

        Ok(NodePartial::new().with_extra(extra))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channels::Channel;
    use crate::event_bus::EventBus;
    use crate::state::VersionedState;
    use futures_util::stream::BoxStream;

    struct StubSubAgent {
        events: Vec<Event>,
    }

    impl SubAgent for StubSubAgent {
        fn run(&self, _ctx: SubAgentContext, _state: StateSnapshot) -> BoxStream<'static, Event> {
            let events = self.events.clone();
            Box::pin(futures_util::stream::iter(events))
        }
    }

    fn ctx() -> NodeContext {
        let bus = EventBus::default();
        NodeContext {
            node_id: "delegate".to_string(),
            step: 3,
            event_emitter: bus.get_emitter(),
            cancellation: tokio_util::sync::CancellationToken::new(),
        }
    }

    #[tokio::test]
    async fn writes_node_response_and_mirrors_last_response() {
        let sub_agent = StubSubAgent {
            events: vec![
                Event::diagnostic("sub_agent.start", "delegating"),
                Event::node_message_with_meta("delegate", 0, "sub_agent.complete", "done"),
            ],
        };
        let node = SubAgentNode::new(Arc::new(sub_agent));
        let state = VersionedState::new_with_user_message("hi");

        let partial = node.run(state.snapshot(), ctx()).await.unwrap();
        let extra = partial.extra.unwrap();
        assert_eq!(extra[reserved::NODE_RESPONSES]["delegate"], "done");
        assert_eq!(extra[reserved::LAST_RESPONSE], "done");
    }

    #[tokio::test]
    async fn without_mirroring_skips_last_response() {
        let sub_agent = StubSubAgent {
            events: vec![Event::node_message_with_meta(
                "delegate",
                0,
                "sub_agent.complete",
                "quiet",
            )],
        };
        let node = SubAgentNode::new(Arc::new(sub_agent)).without_last_response_mirroring();
        let state = VersionedState::new_with_user_message("hi");

        let partial = node.run(state.snapshot(), ctx()).await.unwrap();
        let extra = partial.extra.unwrap();
        assert_eq!(extra[reserved::NODE_RESPONSES]["delegate"], "quiet");
        assert!(!extra.contains_key(reserved::LAST_RESPONSE));
    }

    #[tokio::test]
    async fn no_completion_event_yields_empty_partial() {
        let sub_agent = StubSubAgent {
            events: vec![Event::diagnostic("sub_agent.start", "delegating")],
        };
        let node = SubAgentNode::new(Arc::new(sub_agent));
        let state = VersionedState::new_with_user_message("hi");

        let partial = node.run(state.snapshot(), ctx()).await.unwrap();
        assert!(partial.extra.is_none());
    }
}
