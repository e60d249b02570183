//! Control-flow primitives emitted by nodes to influence subsequent scheduling.
//!
//! Frontier commands are kept separate from state updates so nodes can
//! express routing intent without mutating application state directly. The
//! barrier aggregates these directives in a deterministic order and the runner
//! reconciles them with unconditional / conditional edges.

use crate::types::NodeKind;

/// Route identifier used by frontier commands.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum NodeRoute {
    /// Route to another node in the graph.
    Node(NodeKind),
}

impl NodeRoute {
    /// Return the concrete `NodeKind` for this route.
    #[must_use]
    pub fn kind(&self) -> &NodeKind {
        match self {
            NodeRoute::Node(kind) => kind,
        }
    }

    /// Clone the underlying `NodeKind`.
    #[must_use]
    pub fn to_node_kind(&self) -> NodeKind {
        self.kind().clone()
    }
}

impl From<NodeKind> for NodeRoute {
    fn from(kind: NodeKind) -> Self {
        NodeRoute::Node(kind)
    }
}

/// Command emitted by a node to manipulate the next frontier.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FrontierCommand {
    /// Append additional routes to the existing frontier calculation.
    Append(Vec<NodeRoute>),
    /// Replace the default routes emitted for the node.
    Replace(Vec<NodeRoute>),
}

/// A single fan-out directive: apply `update` to the shared state and,
/// independently, route execution to `goto` (or fall through to the node's
/// normal unconditional/conditional edges if `goto` is `None`).
///
/// Unlike [`FrontierCommand`], which only carries routing, a `Command`
/// bundles a state update with its own routing target so a node can express
/// "send this partial update to node A, and a different partial update to
/// node B" in a single return value. The runner expands `NodePartial.commands`
/// into one routed update per command and folds all of them, plus the node's
/// own top-level update, into the same barrier.
#[derive(Clone, Debug, Default)]
pub struct Command {
    /// The state update this command contributes to the barrier.
    pub update: crate::node::NodePartial,
    /// Where to route next; `None` defers to the node's regular edges.
    pub goto: Option<NodeKind>,
}

impl Command {
    /// Create a command that only updates state, without its own routing.
    #[must_use]
    pub fn update(update: crate::node::NodePartial) -> Self {
        Self { update, goto: None }
    }

    /// Create a command that only routes, carrying no state update.
    #[must_use]
    pub fn goto(target: NodeKind) -> Self {
        Self {
            update: crate::node::NodePartial::default(),
            goto: Some(target),
        }
    }

    /// Attach a routing target to an existing command.
    #[must_use]
    pub fn with_goto(mut self, target: NodeKind) -> Self {
        self.goto = Some(target);
        self
    }
}
