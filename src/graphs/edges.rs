//! Edge types and routing predicates for conditional graph flow.
//!
//! This module contains the types and predicates used for dynamic routing
//! in workflow graphs, including conditional edges that can route based
//! on runtime state evaluation.

use crate::types::NodeKind;
use rustc_hash::FxHashMap;
use std::sync::Arc;

/// Predicate function for conditional edge routing.
///
/// Takes a [`StateSnapshot`] and returns target node names to determine
/// which nodes should be executed next. Predicates are used with
/// [`GraphBuilder::add_conditional_edge`] to create dynamic routing based
/// on the current state.
///
/// # Examples
///
/// ```
/// use weavegraph::graphs::EdgePredicate;
/// use std::sync::Arc;
///
/// // Route based on message count
/// let route_by_messages: EdgePredicate = Arc::new(|snapshot| {
///     if snapshot.messages.len() > 5 {
///         vec!["many_messages".to_string()]
///     } else {
///         vec!["few_messages".to_string()]
///     }
/// });
///
/// // Route based on extra data - fan out to multiple nodes
/// let route_by_error: EdgePredicate = Arc::new(|snapshot| {
///     if snapshot.extra.get("error").is_some() {
///         vec!["error_handler".to_string(), "logger".to_string()]
///     } else {
///         vec!["normal_flow".to_string()]
///     }
/// });
/// ```
pub type EdgePredicate =
    Arc<dyn Fn(crate::state::StateSnapshot) -> Vec<String> + Send + Sync + 'static>;

/// A conditional edge that routes based on a predicate function.
///
/// Conditional edges allow dynamic routing in workflows based on the current
/// state. When the scheduler encounters a conditional edge, it evaluates the
/// predicate function and routes to the returned target nodes.
///
/// # Examples
///
/// ```
/// use weavegraph::graphs::{ConditionalEdge, EdgePredicate};
/// use weavegraph::types::NodeKind;
/// use std::sync::Arc;
///
/// let predicate: EdgePredicate = Arc::new(|snapshot| {
///     if snapshot.messages.len() > 5 {
///         vec!["many_messages".to_string()]
///     } else {
///         vec!["few_messages".to_string()]
///     }
/// });
/// let edge = ConditionalEdge::new(NodeKind::Start, predicate);
/// ```
#[derive(Clone)]
pub struct ConditionalEdge {
    /// The source node for this conditional edge.
    pub from: NodeKind,
    /// The predicate function that determines target node.
    pub predicate: EdgePredicate,
    /// Static label → target map, when the edge's possible outputs are known
    /// ahead of time (e.g. a tools-routing edge with labels "tools"/"end").
    /// `None` for open-ended predicates whose labels are only resolved at
    /// runtime against the live node registry.
    label_to_target: Option<FxHashMap<String, NodeKind>>,
}

impl ConditionalEdge {
    /// Build a conditional edge from an open-ended predicate. Targets are
    /// resolved at runtime by treating each returned label as a node name
    /// (or `"Start"`/`"End"`); compile-time reachability checks are skipped
    /// for this edge since its labels are not statically known.
    #[must_use]
    pub fn new(from: NodeKind, predicate: EdgePredicate) -> Self {
        Self {
            from,
            predicate,
            label_to_target: None,
        }
    }

    /// Build a conditional edge whose labels map to a fixed, statically-known
    /// set of targets. Used for generated edges like the LLM tool-calling
    /// loop, where only "tools" and "end" are ever produced.
    #[must_use]
    pub fn with_labels(
        from: NodeKind,
        predicate: EdgePredicate,
        label_to_target: FxHashMap<String, NodeKind>,
    ) -> Self {
        Self {
            from,
            predicate,
            label_to_target: Some(label_to_target),
        }
    }

    /// The source node this conditional edge fires from.
    #[must_use]
    pub fn from(&self) -> &NodeKind {
        &self.from
    }

    /// The routing predicate for this edge.
    #[must_use]
    pub fn predicate(&self) -> &EdgePredicate {
        &self.predicate
    }

    /// The static label → target map, if this edge was built with one.
    #[must_use]
    pub fn label_to_target(&self) -> Option<&FxHashMap<String, NodeKind>> {
        self.label_to_target.as_ref()
    }
}

/// Wiring for an LLM node's tool-calling loop: route to the tools-node when
/// the model requested tool calls, otherwise fall through to `no_tools_target`.
#[derive(Clone, Debug)]
pub struct ToolsRoute {
    /// The tools-node to run when the LLM requested one or more tool calls.
    pub tools_node: NodeKind,
    /// Where to route when the LLM produced a final answer with no tool calls.
    pub no_tools_target: NodeKind,
}
