//! Graph compilation logic and validation.
//!
//! This module contains the logic for compiling a GraphBuilder into an
//! executable App, including structural validation and error reporting.

use std::collections::VecDeque;

use miette::Diagnostic;
use rustc_hash::FxHashSet;
use thiserror::Error;

use crate::app::App;
use crate::types::NodeKind;

/// Errors that can occur while compiling a [`GraphBuilder`](super::GraphBuilder)
/// into an executable [`App`].
#[derive(Debug, Error, Diagnostic, PartialEq, Eq)]
pub enum GraphCompileError {
    /// The graph has no executable nodes registered.
    #[error("graph has no nodes; add at least one node before compiling")]
    #[diagnostic(
        code(weavegraph::graphs::no_nodes),
        help("Call GraphBuilder::add_node at least once before compile().")
    )]
    NoNodes,

    /// A registered node is not reachable from `NodeKind::Start` via any
    /// unconditional or (statically-labelled) conditional edge.
    #[error("node {node:?} is not reachable from Start")]
    #[diagnostic(
        code(weavegraph::graphs::unreachable_node),
        help("Add an edge (direct or conditional) from Start that eventually reaches this node.")
    )]
    UnreachableNode { node: NodeKind },

    /// A statically-labelled conditional edge routes to a target that is
    /// neither a registered node nor a virtual `Start`/`End` endpoint.
    #[error("conditional edge from {from:?} routes label {label:?} to unknown node {target:?}")]
    #[diagnostic(
        code(weavegraph::graphs::unknown_conditional_target),
        help("Register the target node with add_node before wiring it into a conditional edge, or fix the label mapping.")
    )]
    UnknownConditionalTarget {
        from: NodeKind,
        label: String,
        target: NodeKind,
    },

    /// An LLM node declared tool bindings but no tools-node is reachable from
    /// it via a registered tool-conditional edge.
    #[error("LLM node {llm_node:?} declares tools but no reachable tools-node is wired via add_tools_conditional_edge")]
    #[diagnostic(
        code(weavegraph::graphs::missing_tools_route),
        help("Call add_tools_conditional_edge(llm_node, tools_node, no_tools_target) to wire the tool-calling loop.")
    )]
    MissingToolsRoute { llm_node: NodeKind },
}

/// Compilation logic for GraphBuilder.
impl super::builder::GraphBuilder {
    /// Compiles the graph into an executable application.
    ///
    /// Validates the graph configuration and converts it into an [`App`] that
    /// can execute workflows. This method performs the following checks:
    ///
    /// - every registered node is reachable from `NodeKind::Start`;
    /// - every statically-labelled conditional edge target exists in the
    ///   node registry or is `Start`/`End`;
    /// - every LLM node declaring tool bindings has a reachable tools-node
    ///   wired via `add_tools_conditional_edge`.
    ///
    /// # Errors
    ///
    /// Returns [`GraphCompileError`] if any of the checks above fail.
    ///
    /// # Examples
    ///
    /// ```
    /// use weavegraph::graphs::GraphBuilder;
    /// use weavegraph::types::NodeKind;
    ///
    /// # struct MyNode;
    /// # #[async_trait::async_trait]
    /// # impl weavegraph::node::Node for MyNode {
    /// #     async fn run(&self, _: weavegraph::state::StateSnapshot, _: weavegraph::node::NodeContext) -> Result<weavegraph::node::NodePartial, weavegraph::node::NodeError> {
    /// #         Ok(weavegraph::node::NodePartial::default())
    /// #     }
    /// # }
    ///
    /// let app = GraphBuilder::new()
    ///     .add_node(NodeKind::Custom("process".into()), MyNode)
    ///     .add_edge(NodeKind::Start, NodeKind::Custom("process".into()))
    ///     .add_edge(NodeKind::Custom("process".into()), NodeKind::End)
    ///     .compile()
    ///     .expect("graph should compile");
    ///
    /// // App is ready for execution
    /// ```
    pub fn compile(self) -> Result<App, GraphCompileError> {
        self.validate()?;

        let (nodes, edges, conditional_edges, runtime_config, reducer_registry, retry_policies) =
            self.into_parts();
        Ok(App::from_parts(
            nodes,
            edges,
            conditional_edges,
            runtime_config,
            reducer_registry,
            retry_policies,
        ))
    }

    fn validate(&self) -> Result<(), GraphCompileError> {
        if self.nodes_ref().is_empty() {
            return Err(GraphCompileError::NoNodes);
        }

        self.validate_conditional_targets()?;
        self.validate_reachability()?;
        self.validate_tool_routes()?;
        Ok(())
    }

    fn validate_conditional_targets(&self) -> Result<(), GraphCompileError> {
        for ce in self.conditional_edges_ref() {
            let Some(label_to_target) = ce.label_to_target() else {
                // Open-ended predicates produce arbitrary strings resolved at
                // runtime; the runner skips unknown targets with a warning
                // rather than failing the whole step, so there is nothing to
                // check statically here.
                continue;
            };
            for (label, target) in label_to_target {
                let valid = matches!(target, NodeKind::Start | NodeKind::End)
                    || self.nodes_ref().contains_key(target);
                if !valid {
                    return Err(GraphCompileError::UnknownConditionalTarget {
                        from: ce.from().clone(),
                        label: label.clone(),
                        target: target.clone(),
                    });
                }
            }
        }
        Ok(())
    }

    fn validate_reachability(&self) -> Result<(), GraphCompileError> {
        let mut reachable: FxHashSet<NodeKind> = FxHashSet::default();
        let mut queue: VecDeque<NodeKind> = VecDeque::new();
        queue.push_back(NodeKind::Start);
        reachable.insert(NodeKind::Start);

        while let Some(current) = queue.pop_front() {
            if let Some(dests) = self.edges_ref().get(&current) {
                for dest in dests {
                    if reachable.insert(dest.clone()) {
                        queue.push_back(dest.clone());
                    }
                }
            }
            for ce in self
                .conditional_edges_ref()
                .iter()
                .filter(|ce| *ce.from() == current)
            {
                if let Some(label_to_target) = ce.label_to_target() {
                    for target in label_to_target.values() {
                        if reachable.insert(target.clone()) {
                            queue.push_back(target.clone());
                        }
                    }
                }
            }
            if let Some(tools_route) = self.tool_routes_ref().get(&current) {
                if reachable.insert(tools_route.tools_node.clone()) {
                    queue.push_back(tools_route.tools_node.clone());
                }
                if reachable.insert(tools_route.no_tools_target.clone()) {
                    queue.push_back(tools_route.no_tools_target.clone());
                }
            }
        }

        for node in self.nodes_ref().keys() {
            if !reachable.contains(node) {
                return Err(GraphCompileError::UnreachableNode {
                    node: node.clone(),
                });
            }
        }
        Ok(())
    }

    fn validate_tool_routes(&self) -> Result<(), GraphCompileError> {
        for llm_node in self.llm_tool_bindings_ref().keys() {
            if !self.tool_routes_ref().contains_key(llm_node) {
                return Err(GraphCompileError::MissingToolsRoute {
                    llm_node: llm_node.clone(),
                });
            }
        }
        Ok(())
    }
}
