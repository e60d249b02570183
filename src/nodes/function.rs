//! A thin [`Node`] adapter around a boxed closure.
//!
//! Generalizes the ad-hoc `struct FooNode;` pattern used throughout this
//! crate's own demo programs into a reusable type, for callers who want a
//! function node without defining a new type for it.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use async_trait::async_trait;

use crate::node::{Node, NodeContext, NodeError, NodePartial};
use crate::state::StateSnapshot;

type BoxedRun =
    dyn Fn(StateSnapshot, NodeContext) -> Pin<Box<dyn Future<Output = Result<NodePartial, NodeError>> + Send>>
        + Send
        + Sync;

/// Wraps a closure `Fn(StateSnapshot, NodeContext) -> impl Future<Output = Result<NodePartial, NodeError>>`
/// as a [`Node`].
///
/// # Examples
///
/// ```
/// use weavegraph::nodes::FunctionNode;
/// use weavegraph::node::NodePartial;
/// use weavegraph::message::Message;
///
/// let node = FunctionNode::new(|_snapshot, _ctx| async move {
///     Ok(NodePartial::new().with_messages(vec![Message::assistant("done")]))
/// });
/// ```
#[derive(Clone)]
pub struct FunctionNode {
    run: Arc<BoxedRun>,
}

impl FunctionNode {
    pub fn new<F, Fut>(run: F) -> Self
    where
        F: Fn(StateSnapshot, NodeContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<NodePartial, NodeError>> + Send + 'static,
    {
        Self {
            run: Arc::new(move |snapshot, ctx| Box::pin(run(snapshot, ctx))),
        }
    }
}

#[async_trait]
impl Node for FunctionNode {
    async fn run(
        &self,
        snapshot: StateSnapshot,
        ctx: NodeContext,
    ) -> Result<NodePartial, NodeError> {
        (self.run)(snapshot, ctx).await
    }
}
