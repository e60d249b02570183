//! Lets any compiled [`App`] act as a sub-agent of a parent graph, matching
//! the spec's composability intent: delegation doesn't need a special node
//! kind, just an `App` wrapped in this adapter.

use futures_util::stream::BoxStream;

use crate::app::App;
use crate::channels::Channel;
use crate::event_bus::Event;
use crate::interfaces::sub_agent::{SubAgent, SubAgentContext};
use crate::state::StateSnapshot;

/// Wraps a compiled sub-graph so it can be bound to a
/// [`nodes::agent::SubAgentNode`](crate::nodes::agent::SubAgentNode) in a
/// parent graph. The sub-graph runs to completion against a state seeded
/// from the delegating node's snapshot; its own node/model/tool events are
/// re-emitted on the returned stream, followed by a synthetic completion
/// event carrying the sub-graph's final messages.
#[derive(Clone)]
pub struct GraphSubAgent {
    app: App,
}

impl GraphSubAgent {
    #[must_use]
    pub fn new(app: App) -> Self {
        Self { app }
    }
}

impl SubAgent for GraphSubAgent {
    fn run(&self, ctx: SubAgentContext, state: StateSnapshot) -> BoxStream<'static, Event> {
        let app = self.app.clone();
        let parent_node_id = ctx.parent_node_id.clone();

        Box::pin(async_stream::stream! {
            yield Event::diagnostic(
                "sub_agent.start",
                format!("delegating to sub-graph from {parent_node_id}"),
            );

            let mut initial = crate::state::VersionedState {
                messages: crate::channels::MessagesChannel::new(state.messages, state.messages_version),
                extra: crate::channels::ExtrasChannel::default(),
                errors: crate::channels::ErrorsChannel::default(),
            };
            for (key, value) in state.extra {
                initial.add_extra(&key, value);
            }

            if ctx.cancellation.is_cancelled() {
                yield Event::diagnostic("sub_agent.cancelled", parent_node_id.clone());
                return;
            }

            match app.invoke(initial).await {
                Ok(final_state) => {
                    let last_text = final_state
                        .messages
                        .snapshot()
                        .iter()
                        .rev()
                        .find(|m| m.has_role(crate::message::Message::ASSISTANT))
                        .map(|m| m.content.clone())
                        .unwrap_or_default();
                    yield Event::node_message_with_meta(
                        parent_node_id.clone(),
                        0,
                        "sub_agent.complete",
                        last_text,
                    );
                }
                Err(err) => {
                    yield Event::diagnostic("sub_agent.error", err.to_string());
                }
            }
        })
    }
}
