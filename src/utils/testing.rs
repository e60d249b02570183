//! Reusable [`Node`] test doubles and fixtures for exercising the scheduler
//! and runner without standing up real LLM/tool/sub-agent nodes.

use std::sync::Arc;

use async_trait::async_trait;
use rustc_hash::FxHashMap;
use serde_json::json;
use tokio::time::{Duration, sleep};

use crate::message::Message;
use crate::node::{Node, NodeContext, NodeError, NodePartial};
use crate::state::StateSnapshot;
use crate::types::NodeKind;

/// Appends a single assistant message naming itself and the step it ran at.
#[derive(Debug, Clone)]
pub struct TestNode {
    pub name: &'static str,
}

#[async_trait]
impl Node for TestNode {
    async fn run(&self, _snapshot: StateSnapshot, ctx: NodeContext) -> Result<NodePartial, NodeError> {
        Ok(NodePartial::new().with_messages(vec![Message::assistant(&format!(
            "ran:{}:step:{}",
            self.name, ctx.step
        ))]))
    }
}

/// Like [`TestNode`] but sleeps `delay_ms` first, for exercising concurrent
/// super-step scheduling and ordering.
#[derive(Debug, Clone)]
pub struct DelayedNode {
    pub name: &'static str,
    pub delay_ms: u64,
}

#[async_trait]
impl Node for DelayedNode {
    async fn run(&self, _snapshot: StateSnapshot, ctx: NodeContext) -> Result<NodePartial, NodeError> {
        sleep(Duration::from_millis(self.delay_ms)).await;
        Ok(NodePartial::new().with_messages(vec![Message::assistant(&format!(
            "ran:{}:step:{}",
            self.name, ctx.step
        ))]))
    }
}

/// Always fails with [`NodeError::MissingInput`], for exercising error
/// propagation through the scheduler and runner.
#[derive(Debug, Clone)]
pub struct FailingNode {
    pub error_message: &'static str,
}

impl Default for FailingNode {
    fn default() -> Self {
        Self {
            error_message: "test_key",
        }
    }
}

#[async_trait]
impl Node for FailingNode {
    async fn run(&self, _snapshot: StateSnapshot, _ctx: NodeContext) -> Result<NodePartial, NodeError> {
        Err(NodeError::MissingInput {
            what: self.error_message,
        })
    }
}

/// Like [`TestNode`] but optionally writes extra data, for exercising
/// extra-channel version gating.
#[derive(Debug, Clone)]
pub struct RichNode {
    pub name: &'static str,
    pub produce_extra: bool,
}

#[async_trait]
impl Node for RichNode {
    async fn run(&self, _snapshot: StateSnapshot, ctx: NodeContext) -> Result<NodePartial, NodeError> {
        let messages = Some(vec![Message::assistant(&format!(
            "{}:step:{}",
            self.name, ctx.step
        ))]);

        let extra = if self.produce_extra {
            let mut map = FxHashMap::default();
            map.insert(format!("{}_executed", self.name), json!(true));
            map.insert("step".to_string(), json!(ctx.step));
            Some(map)
        } else {
            None
        };

        Ok(NodePartial {
            messages,
            extra,
            errors: None,
            frontier: None,
            commands: None,
        })
    }
}

/// A registry with `Custom("A")`, `Custom("B")`, and `End`, each a [`TestNode`].
#[must_use]
pub fn make_test_registry() -> FxHashMap<NodeKind, Arc<dyn Node>> {
    let mut registry = FxHashMap::default();
    registry.insert(
        NodeKind::Custom("A".into()),
        Arc::new(TestNode { name: "A" }) as Arc<dyn Node>,
    );
    registry.insert(
        NodeKind::Custom("B".into()),
        Arc::new(TestNode { name: "B" }) as Arc<dyn Node>,
    );
    registry.insert(
        NodeKind::End,
        Arc::new(TestNode { name: "END" }) as Arc<dyn Node>,
    );
    registry
}

/// A registry with `Custom("A")` and `Custom("B")`, both [`DelayedNode`]s
/// with different delays, for exercising concurrent completion ordering.
#[must_use]
pub fn make_delayed_registry() -> FxHashMap<NodeKind, Arc<dyn Node>> {
    let mut registry = FxHashMap::default();
    registry.insert(
        NodeKind::Custom("A".into()),
        Arc::new(DelayedNode {
            name: "A",
            delay_ms: 30,
        }) as Arc<dyn Node>,
    );
    registry.insert(
        NodeKind::Custom("B".into()),
        Arc::new(DelayedNode {
            name: "B",
            delay_ms: 1,
        }) as Arc<dyn Node>,
    );
    registry
}

/// Builds an empty [`StateSnapshot`] carrying only the given channel
/// versions, for exercising [`crate::schedulers::Scheduler::should_run`]
/// gating without needing real state.
#[must_use]
pub fn create_test_snapshot(messages_version: u32, extra_version: u32) -> StateSnapshot {
    StateSnapshot {
        messages: vec![],
        messages_version,
        extra: FxHashMap::default(),
        extra_version,
        errors: vec![],
        errors_version: 1,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event_bus::EventBus;

    #[tokio::test]
    async fn test_node_reports_name_and_step() {
        let node = TestNode { name: "example" };
        let bus = EventBus::default();
        let ctx = NodeContext {
            node_id: "test_node".to_string(),
            step: 1,
            event_emitter: bus.get_emitter(),
            cancellation: tokio_util::sync::CancellationToken::new(),
        };
        let result = node.run(create_test_snapshot(1, 1), ctx).await.unwrap();
        assert_eq!(
            result.messages.unwrap()[0].content,
            "ran:example:step:1"
        );
    }

    #[tokio::test]
    async fn failing_node_reports_missing_input() {
        let node = FailingNode::default();
        let bus = EventBus::default();
        let ctx = NodeContext {
            node_id: "fail".to_string(),
            step: 1,
            event_emitter: bus.get_emitter(),
            cancellation: tokio_util::sync::CancellationToken::new(),
        };
        match node.run(create_test_snapshot(1, 1), ctx).await {
            Err(NodeError::MissingInput { what }) => assert_eq!(what, "test_key"),
            other => panic!("expected MissingInput, got {other:?}"),
        }
    }
}
