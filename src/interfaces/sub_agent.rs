//! The sub-agent interface (§6): `run(context, state) -> stream of events`.

use futures_util::stream::BoxStream;
use tokio_util::sync::CancellationToken;

use crate::event_bus::Event;
use crate::state::StateSnapshot;

/// Per-invocation context handed to a sub-agent: the delegating invocation's
/// id and a cooperative cancellation signal that must be propagated to the
/// sub-agent's own I/O (§5 Cancellation semantics).
#[derive(Clone, Debug)]
pub struct SubAgentContext {
    pub invocation_id: String,
    pub parent_node_id: String,
    pub cancellation: CancellationToken,
}

impl SubAgentContext {
    #[must_use]
    pub fn new(
        invocation_id: impl Into<String>,
        parent_node_id: impl Into<String>,
        cancellation: CancellationToken,
    ) -> Self {
        Self {
            invocation_id: invocation_id.into(),
            parent_node_id: parent_node_id.into(),
            cancellation,
        }
    }
}

/// An external capability that, given the delegating node's state snapshot,
/// streams its own [`Event`]s using the same envelope the engine emits.
///
/// Sub-agents are deliberately not required to return a single final value:
/// [`nodes::agent::SubAgentNode`](crate::nodes::agent::SubAgentNode) observes
/// the stream and extracts the final assistant text itself (mirroring how it
/// extracts an LLM node's final message), so a sub-agent implementation only
/// needs to emit events, not conform to any particular "last event" shape.
pub trait SubAgent: Send + Sync {
    fn run(&self, ctx: SubAgentContext, state: StateSnapshot) -> BoxStream<'static, Event>;
}
