//! External-facing event envelope.
//!
//! [`Event`] (`Node`/`Diagnostic`/`LLM`/`Tool`) is the internal representation
//! `EventSink`s, `EventHub`, and the rest of the bus machinery operate on.
//! [`EventEnvelope`] is a conversion layer built only at the boundary a
//! consumer (an SSE client, a CLI, a log shipper) actually sees: it carries
//! typed retry/phase/tool/model bookkeeping instead of the free-text
//! `message` string a raw `Event` exposes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::event::{
    DiagnosticEvent, Event, LLMStreamingEvent, LLMStreamingEventScope, NodeEvent, NodePhase,
    ToolEvent, ToolPhase,
};

/// Who produced an event, for consumers that fan events from several
/// sources (the executor itself, a node, a model, a sub-agent) into one
/// stream.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub enum EventAuthor {
    GraphExecutor,
    GraphNode(String),
    Model(String),
    SubAgent(String),
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct EventEnvelope {
    pub id: Uuid,
    pub invocation_id: String,
    pub author: EventAuthor,
    pub timestamp: DateTime<Utc>,
    pub state_delta: Option<StateDelta>,
    pub choices: Option<Vec<Choice>>,
    pub response: Option<ModelResponse>,
    pub error: Option<EnvelopeError>,
    pub done: bool,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct StateDelta {
    pub node: Option<NodeDelta>,
    pub tool: Option<ToolDelta>,
    pub model: Option<ModelDelta>,
    pub completion: Option<CompletionDelta>,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct NodeDelta {
    pub node_id: Option<String>,
    pub phase: Option<String>,
    pub step: Option<u64>,
    pub attempt: Option<u32>,
    pub max_attempts: Option<u32>,
    pub retrying: Option<bool>,
    pub next_delay_ms: Option<u64>,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct ToolDelta {
    pub tool_name: String,
    pub tool_id: String,
    pub phase: String,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct ModelDelta {
    pub node_id: Option<String>,
    pub stream_id: Option<String>,
    pub phase: String,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct CompletionDelta {
    pub final_text: String,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Choice {
    pub delta_content: Option<String>,
    pub message_role: Option<String>,
    pub message_content: Option<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct ModelResponse {
    pub content: String,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct EnvelopeError {
    pub code: String,
    pub message: String,
}

impl EventEnvelope {
    /// Converts a raw bus [`Event`] into the envelope consumers at the
    /// external boundary see. `invocation_id` is the session id the caller
    /// is streaming events for.
    pub fn from_event(invocation_id: impl Into<String>, event: &Event) -> Self {
        let invocation_id = invocation_id.into();
        match event {
            Event::Node(node) => Self::from_node(invocation_id, node),
            Event::Tool(tool) => Self::from_tool(invocation_id, tool),
            Event::LLM(llm) => Self::from_llm(invocation_id, llm),
            Event::Diagnostic(diag) => Self::from_diagnostic(invocation_id, diag),
        }
    }

    fn from_node(invocation_id: String, node: &NodeEvent) -> Self {
        let author = node
            .node_id()
            .map(|id| EventAuthor::GraphNode(id.to_string()))
            .unwrap_or(EventAuthor::GraphExecutor);
        let done = matches!(
            node.phase(),
            Some(NodePhase::Complete) | Some(NodePhase::Failed)
        );
        Self {
            id: Uuid::new_v4(),
            invocation_id,
            author,
            timestamp: Utc::now(),
            state_delta: Some(StateDelta {
                node: Some(NodeDelta {
                    node_id: node.node_id().map(str::to_string),
                    phase: node.phase().map(|p| p.as_ref().to_string()),
                    step: node.step(),
                    attempt: node.attempt(),
                    max_attempts: node.max_attempts(),
                    retrying: node.retrying(),
                    next_delay_ms: node.next_delay_ms(),
                }),
                ..Default::default()
            }),
            choices: None,
            response: None,
            error: None,
            done,
        }
    }

    fn from_tool(invocation_id: String, tool: &ToolEvent) -> Self {
        let author = tool
            .node_id()
            .map(|id| EventAuthor::GraphNode(id.to_string()))
            .unwrap_or(EventAuthor::GraphExecutor);
        let error = tool.error().map(|message| EnvelopeError {
            code: "tool_error".to_string(),
            message: message.to_string(),
        });
        let done = matches!(tool.phase(), ToolPhase::Complete | ToolPhase::Error);
        Self {
            id: Uuid::new_v4(),
            invocation_id,
            author,
            timestamp: Utc::now(),
            state_delta: Some(StateDelta {
                tool: Some(ToolDelta {
                    tool_name: tool.tool_name().to_string(),
                    tool_id: tool.tool_id().to_string(),
                    phase: tool.phase().as_ref().to_string(),
                }),
                ..Default::default()
            }),
            choices: None,
            response: None,
            error,
            done,
        }
    }

    fn from_llm(invocation_id: String, llm: &LLMStreamingEvent) -> Self {
        let author = llm
            .node_id()
            .map(|id| EventAuthor::Model(id.to_string()))
            .unwrap_or(EventAuthor::GraphExecutor);
        let error = matches!(llm.scope(), LLMStreamingEventScope::Error).then(|| EnvelopeError {
            code: "model_error".to_string(),
            message: llm.chunk().to_string(),
        });
        let choices = (!llm.is_final() && error.is_none()).then(|| {
            vec![Choice {
                delta_content: Some(llm.chunk().to_string()),
                message_role: None,
                message_content: None,
            }]
        });
        let response = llm
            .is_final()
            .then(|| ModelResponse {
                content: llm.chunk().to_string(),
            });
        let completion = llm.is_final().then(|| CompletionDelta {
            final_text: llm.chunk().to_string(),
        });
        Self {
            id: Uuid::new_v4(),
            invocation_id,
            author,
            timestamp: llm.timestamp(),
            state_delta: Some(StateDelta {
                model: Some(ModelDelta {
                    node_id: llm.node_id().map(str::to_string),
                    stream_id: llm.stream_id().map(str::to_string),
                    phase: llm.scope().as_ref().to_string(),
                }),
                completion,
                ..Default::default()
            }),
            choices,
            response,
            error,
            done: llm.is_final(),
        }
    }

    fn from_diagnostic(invocation_id: String, diag: &DiagnosticEvent) -> Self {
        Self {
            id: Uuid::new_v4(),
            invocation_id,
            author: EventAuthor::GraphExecutor,
            timestamp: Utc::now(),
            state_delta: None,
            choices: None,
            response: None,
            error: None,
            done: false,
        }
        .with_diagnostic_message(diag)
    }

    fn with_diagnostic_message(mut self, diag: &DiagnosticEvent) -> Self {
        if diag.scope().ends_with("error") {
            self.error = Some(EnvelopeError {
                code: diag.scope().to_string(),
                message: diag.message().to_string(),
            });
        }
        self
    }
}
