//! The bounded-concurrency super-step executor.

use std::collections::VecDeque;
use std::sync::Arc;

use futures_util::stream::FuturesUnordered;
use futures_util::StreamExt;
use miette::Diagnostic;
use rustc_hash::{FxHashMap, FxHashSet};
use thiserror::Error;
use tokio::sync::Semaphore;
use tokio::task::JoinError;
use tokio_util::sync::CancellationToken;

use crate::channels::errors::{ErrorEvent, LadderError};
use crate::event_bus::{EventEmitter, NodePhase};
use crate::graphs::ConditionalEdge;
use crate::node::{Node, NodeContext, NodeError, NodePartial};
use crate::schedulers::retry::{RetryDecision, RetryPolicy};
use crate::state::StateSnapshot;
use crate::types::NodeKind;

/// Per-session bookkeeping carried across super-steps.
///
/// Tracks, for every node id seen so far, the channel versions that were
/// present the last time it ran — this is what lets the scheduler skip a
/// node whose inputs have not changed since its last execution.
#[derive(Debug, Clone, Default)]
pub struct SchedulerState {
    pub versions_seen: FxHashMap<String, FxHashMap<String, u64>>,
}

/// Outcome of one super-step: which nodes ran, which were skipped, and the
/// partial state updates they produced (order not guaranteed to match
/// `ran_nodes` — concurrent nodes complete whenever they complete).
#[derive(Debug, Clone, Default)]
pub struct StepRunResult {
    pub ran_nodes: Vec<NodeKind>,
    pub skipped_nodes: Vec<NodeKind>,
    pub outputs: Vec<(NodeKind, NodePartial)>,
    /// Nodes whose final (non-retryable) failure was *avoidable* — some
    /// remaining path still reaches a finish point without them — so the
    /// super-step recorded the failure instead of aborting the invocation.
    /// A node whose failure is unavoidable never reaches this list: it is
    /// surfaced as a [`SchedulerError::NodeRun`] instead.
    pub failed_nodes: Vec<(NodeKind, ErrorEvent)>,
}

#[derive(Debug, Error, Diagnostic)]
pub enum SchedulerError {
    #[error("node {kind:?} failed at step {step}: {source}")]
    #[diagnostic(
        code(weavegraph::schedulers::node_run),
        help("Check the node's implementation and the state it was given at this step.")
    )]
    NodeRun {
        kind: NodeKind,
        step: u64,
        #[source]
        source: NodeError,
    },

    #[error("scheduler task join error: {0}")]
    #[diagnostic(
        code(weavegraph::schedulers::join),
        help("A node task panicked or was cancelled; check surrounding logs for a panic message.")
    )]
    Join(#[from] JoinError),
}

/// Runs one super-step at a time: fans out a frontier of nodes with bounded
/// concurrency, gating execution on per-node version-seen tracking.
#[derive(Debug, Clone)]
pub struct Scheduler {
    concurrency_limit: usize,
}

impl Scheduler {
    /// `concurrency_limit` bounds how many nodes may run truly concurrently
    /// within a single super-step; it does not limit how many are dispatched.
    #[must_use]
    pub fn new(concurrency_limit: usize) -> Self {
        Self {
            concurrency_limit: concurrency_limit.max(1),
        }
    }

    /// Whether a node identified by `id` should run given the current
    /// snapshot's channel versions, compared against what was recorded the
    /// last time this id ran.
    #[must_use]
    pub fn should_run(&self, state: &SchedulerState, id: &str, snapshot: &StateSnapshot) -> bool {
        let Some(seen) = state.versions_seen.get(id) else {
            return true;
        };
        let messages_seen = seen.get("messages").copied().unwrap_or(0);
        let extra_seen = seen.get("extra").copied().unwrap_or(0);
        u64::from(snapshot.messages_version) > messages_seen
            || u64::from(snapshot.extra_version) > extra_seen
    }

    /// Record the channel versions a node observed so future calls to
    /// `should_run` can detect whether anything changed since.
    pub fn record_seen(&self, state: &mut SchedulerState, id: &str, snapshot: &StateSnapshot) {
        let entry = state.versions_seen.entry(id.to_string()).or_default();
        entry.insert("messages".to_string(), u64::from(snapshot.messages_version));
        entry.insert("extra".to_string(), u64::from(snapshot.extra_version));
    }

    /// Execute one super-step over `frontier`, running every version-gated,
    /// non-`End` node concurrently (bounded by `concurrency_limit`) and
    /// collecting their outputs.
    pub async fn superstep(
        &self,
        state: &mut SchedulerState,
        nodes: &FxHashMap<NodeKind, Arc<dyn Node>>,
        frontier: Vec<NodeKind>,
        snapshot: StateSnapshot,
        step: u64,
        emitter: Arc<dyn EventEmitter>,
        retry_policies: &FxHashMap<NodeKind, RetryPolicy>,
        cancellation: &CancellationToken,
        edges: &FxHashMap<NodeKind, Vec<NodeKind>>,
        conditional_edges: &[ConditionalEdge],
    ) -> Result<StepRunResult, SchedulerError> {
        let semaphore = Arc::new(Semaphore::new(self.concurrency_limit));

        let mut ran_nodes = Vec::new();
        let mut skipped_nodes = Vec::new();
        let mut pending: FuturesUnordered<_> = FuturesUnordered::new();

        for kind in frontier {
            if kind == NodeKind::End {
                skipped_nodes.push(kind);
                continue;
            }

            if cancellation.is_cancelled() {
                skipped_nodes.push(kind);
                continue;
            }

            let id = kind.encode();
            if !self.should_run(state, &id, &snapshot) {
                skipped_nodes.push(kind);
                continue;
            }
            self.record_seen(state, &id, &snapshot);
            ran_nodes.push(kind.clone());

            let Some(node) = nodes.get(&kind).cloned() else {
                skipped_nodes.push(kind);
                continue;
            };

            let policy = retry_policies.get(&kind).cloned().unwrap_or_default();
            let ctx = NodeContext {
                node_id: id,
                step,
                event_emitter: emitter.clone(),
                cancellation: cancellation.clone(),
            };
            let snap_for_node = snapshot.clone();
            let permit_source = semaphore.clone();
            let kind_for_task = kind.clone();

            let handle = tokio::spawn(async move {
                let _permit = permit_source
                    .acquire_owned()
                    .await
                    .expect("scheduler semaphore should never be closed mid-superstep");
                run_with_retry(node.as_ref(), snap_for_node, ctx, &policy).await
            });

            pending.push(async move { (kind_for_task, handle.await) });
        }

        let mut outputs = Vec::with_capacity(ran_nodes.len());
        let mut node_failures: Vec<(NodeKind, NodeError)> = Vec::new();
        while let Some((kind, joined)) = pending.next().await {
            match joined {
                Ok(Ok(partial)) => outputs.push((kind, partial)),
                Ok(Err(source)) => node_failures.push((kind, source)),
                Err(join_err) => return Err(SchedulerError::Join(join_err)),
            }
        }

        // Every sibling in this super-step has now finished (or failed); a
        // failed node only aborts the whole invocation when it is the sole
        // remaining path to a finish point. Check in frontier order so the
        // chosen failure (if any) is deterministic across runs.
        node_failures.sort_by_key(|(kind, _)| {
            ran_nodes.iter().position(|k| k == kind).unwrap_or(usize::MAX)
        });

        let mut failed_nodes = Vec::with_capacity(node_failures.len());
        for (kind, source) in node_failures {
            if !is_avoidable(&kind, nodes, edges, conditional_edges) {
                return Err(SchedulerError::NodeRun { kind, step, source });
            }
            failed_nodes.push((
                kind.clone(),
                ErrorEvent::node(kind.encode(), step, LadderError::msg(source.to_string())),
            ));
        }
        ran_nodes.retain(|k| !failed_nodes.iter().any(|(fk, _)| fk == k));

        Ok(StepRunResult {
            ran_nodes,
            skipped_nodes,
            outputs,
            failed_nodes,
        })
    }
}

/// Whether a finish point (`NodeKind::End`) remains reachable from
/// `NodeKind::Start` when `failed` is removed from the graph. If so, the
/// invocation has some remaining path around the failure and it is safe to
/// record the failure without aborting; if not, `failed` sat on every
/// remaining path and the invocation must fail.
///
/// Conditional edges with no statically-known label set (open-ended
/// predicates) are treated as reaching every known node, since their actual
/// targets are only resolved at runtime against live state. This
/// conservatively favors "avoidable" over "unavoidable" when the graph
/// shape can't be proven ahead of time.
fn is_avoidable(
    failed: &NodeKind,
    nodes: &FxHashMap<NodeKind, Arc<dyn Node>>,
    edges: &FxHashMap<NodeKind, Vec<NodeKind>>,
    conditional_edges: &[ConditionalEdge],
) -> bool {
    let mut all_kinds: FxHashSet<NodeKind> = nodes.keys().cloned().collect();
    all_kinds.insert(NodeKind::Start);
    all_kinds.insert(NodeKind::End);

    let neighbors = |from: &NodeKind| -> Vec<NodeKind> {
        let mut out = Vec::new();
        if let Some(dests) = edges.get(from) {
            out.extend(dests.iter().cloned());
        }
        for edge in conditional_edges {
            if edge.from() != from {
                continue;
            }
            match edge.label_to_target() {
                Some(map) => out.extend(map.values().cloned()),
                None => out.extend(all_kinds.iter().cloned()),
            }
        }
        out
    };

    let mut visited: FxHashSet<NodeKind> = FxHashSet::default();
    let mut queue = VecDeque::new();
    queue.push_back(NodeKind::Start);
    visited.insert(NodeKind::Start);
    while let Some(current) = queue.pop_front() {
        if current == NodeKind::End {
            return true;
        }
        if &current == failed {
            continue;
        }
        for next in neighbors(&current) {
            if visited.insert(next.clone()) {
                queue.push_back(next);
            }
        }
    }
    false
}

/// Runs a single node to completion, retrying on failure per `policy`.
///
/// Failed attempts contribute nothing to state: only the partial returned by
/// the attempt that finally succeeds (or the error from the attempt that
/// exhausts the policy) is ever observed by the caller. Each attempt emits a
/// typed [`NodePhase`] event (start/complete/retrying) carrying the attempt
/// number and the delay before the next try, so operators can see retries
/// happening without inspecting node internals or parsing a message string.
async fn run_with_retry(
    node: &dyn Node,
    snapshot: StateSnapshot,
    ctx: NodeContext,
    policy: &RetryPolicy,
) -> Result<NodePartial, NodeError> {
    let mut attempt: u32 = 1;
    let _ = ctx.emit_node_phase(
        NodePhase::Start,
        format!("node {} starting at step {}", ctx.node_id, ctx.step),
        Some(attempt),
        Some(policy.max_attempts),
        Some(false),
        None,
    );
    loop {
        if ctx.is_cancelled() {
            return Err(NodeError::Cancelled {
                node_id: ctx.node_id.clone(),
            });
        }
        match node.run(snapshot.clone(), ctx.clone()).await {
            Ok(partial) => {
                let _ = ctx.emit_node_phase(
                    NodePhase::Complete,
                    format!("node {} completed at step {}", ctx.node_id, ctx.step),
                    Some(attempt),
                    Some(policy.max_attempts),
                    Some(false),
                    None,
                );
                return Ok(partial);
            }
            Err(error) => match policy.decide(attempt, &error) {
                RetryDecision::Stop => return Err(error),
                RetryDecision::RetryAfter(delay) => {
                    let _ = ctx.emit_node_phase(
                        NodePhase::Retrying,
                        format!("node {} attempt {attempt} failed ({error})", ctx.node_id),
                        Some(attempt),
                        Some(policy.max_attempts),
                        Some(true),
                        Some(delay),
                    );
                    tokio::select! {
                        () = tokio::time::sleep(delay) => {}
                        () = ctx.cancellation.cancelled() => {
                            return Err(NodeError::Cancelled { node_id: ctx.node_id.clone() });
                        }
                    }
                    attempt += 1;
                }
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graphs::EdgePredicate;

    fn edges(pairs: &[(NodeKind, &[NodeKind])]) -> FxHashMap<NodeKind, Vec<NodeKind>> {
        pairs
            .iter()
            .map(|(from, tos)| (from.clone(), tos.to_vec()))
            .collect()
    }

    #[test]
    fn avoidable_when_an_alternate_path_reaches_end() {
        let a = NodeKind::Custom("a".into());
        let b = NodeKind::Custom("b".into());
        let edges = edges(&[
            (NodeKind::Start, &[a.clone(), b.clone()]),
            (a.clone(), &[NodeKind::End]),
            (b.clone(), &[NodeKind::End]),
        ]);
        let nodes = FxHashMap::default();
        assert!(is_avoidable(&a, &nodes, &edges, &[]));
    }

    #[test]
    fn unavoidable_when_it_is_the_only_path_to_end() {
        let a = NodeKind::Custom("a".into());
        let edges = edges(&[
            (NodeKind::Start, &[a.clone()]),
            (a.clone(), &[NodeKind::End]),
        ]);
        let nodes = FxHashMap::default();
        assert!(!is_avoidable(&a, &nodes, &edges, &[]));
    }

    #[test]
    fn open_ended_conditional_edge_is_treated_as_reaching_everything() {
        let predicate: EdgePredicate = Arc::new(|_snapshot| Vec::new());
        let conditional = vec![ConditionalEdge::new(NodeKind::Start, predicate)];
        let failed = NodeKind::Custom("unrelated".into());
        let nodes = FxHashMap::default();
        assert!(is_avoidable(&failed, &nodes, &FxHashMap::default(), &conditional));
    }
}
