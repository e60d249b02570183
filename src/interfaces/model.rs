//! The model interface (§6): `generate(request) -> stream of chunks`.

use async_trait::async_trait;
use futures_util::stream::BoxStream;
use miette::Diagnostic;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::message::Message;

/// A tool declaration offered to the model for this request, derived from an
/// [`interfaces::ToolDescriptor`](crate::interfaces::ToolDescriptor).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ToolDeclaration {
    pub name: String,
    pub description: String,
    pub argument_schema: Value,
}

/// A tool-call request the model emitted in lieu of (or alongside) a textual
/// answer.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ToolCallRequest {
    /// Opaque id correlating this call with its eventual tool-response.
    pub id: String,
    /// Name of the tool being invoked; must match a [`ToolDeclaration::name`]
    /// offered in the request.
    pub name: String,
    /// JSON-shaped call arguments.
    pub arguments: Value,
}

/// Token accounting returned with a completed generation, when the provider
/// reports it.
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize)]
pub struct ModelUsage {
    pub prompt_tokens: u64,
    pub completion_tokens: u64,
}

/// Generation parameters; provider-specific knobs beyond these are passed
/// through `extra`.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct GenerationParams {
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
    pub extra: Option<Value>,
}

/// A request to generate a completion: the assembled conversation, the tools
/// the model may call, and generation parameters.
#[derive(Clone, Debug)]
pub struct ModelRequest {
    pub messages: Vec<Message>,
    pub tools: Vec<ToolDeclaration>,
    pub params: GenerationParams,
}

impl ModelRequest {
    #[must_use]
    pub fn new(messages: Vec<Message>) -> Self {
        Self {
            messages,
            tools: Vec::new(),
            params: GenerationParams::default(),
        }
    }

    #[must_use]
    pub fn with_tools(mut self, tools: Vec<ToolDeclaration>) -> Self {
        self.tools = tools;
        self
    }

    #[must_use]
    pub fn with_params(mut self, params: GenerationParams) -> Self {
        self.params = params;
        self
    }
}

/// One chunk of a streamed generation.
///
/// A model may emit any number of chunks carrying partial `content` before a
/// terminal chunk (`done == true`) that carries either the final
/// `tool_calls`, `usage`, or an `error`.
#[derive(Clone, Debug, Default)]
pub struct ModelChunk {
    /// Partial textual content for this chunk, if any.
    pub content: Option<String>,
    /// Tool-call requests; only populated on the terminal chunk, when the
    /// model chose to call tools instead of answering directly.
    pub tool_calls: Vec<ToolCallRequest>,
    /// Usage accounting; only populated on the terminal chunk, when reported.
    pub usage: Option<ModelUsage>,
    /// Whether this is the final chunk of the stream.
    pub done: bool,
    /// A terminal error payload, when the provider failed mid-stream.
    pub error: Option<String>,
}

impl ModelChunk {
    #[must_use]
    pub fn delta(content: impl Into<String>) -> Self {
        Self {
            content: Some(content.into()),
            ..Default::default()
        }
    }

    #[must_use]
    pub fn final_text(content: impl Into<String>, usage: Option<ModelUsage>) -> Self {
        Self {
            content: Some(content.into()),
            usage,
            done: true,
            ..Default::default()
        }
    }

    #[must_use]
    pub fn final_tool_calls(tool_calls: Vec<ToolCallRequest>, usage: Option<ModelUsage>) -> Self {
        Self {
            tool_calls,
            usage,
            done: true,
            ..Default::default()
        }
    }

    #[must_use]
    pub fn final_error(message: impl Into<String>) -> Self {
        Self {
            error: Some(message.into()),
            done: true,
            ..Default::default()
        }
    }
}

/// A boxed stream of [`ModelChunk`]s, as returned by [`Model::generate`].
pub type ModelStream = BoxStream<'static, ModelChunk>;

/// Errors raised by [`Model::generate`] itself (request construction, an
/// unreachable provider before any chunk streamed). Errors that occur mid
/// stream are instead carried as a terminal [`ModelChunk::error`].
#[derive(Debug, Error, Diagnostic)]
pub enum ModelError {
    #[error("model provider error ({provider}): {message}")]
    #[diagnostic(code(weavegraph::interfaces::model::provider))]
    Provider { provider: &'static str, message: String },

    #[error("model request was invalid: {0}")]
    #[diagnostic(code(weavegraph::interfaces::model::invalid_request))]
    InvalidRequest(String),
}

/// The narrow interface an LLM node invokes against; implemented by any
/// concrete provider adapter (e.g. [`crate::interfaces::RigModel`] behind the
/// `llm` feature) or by a test double.
#[async_trait]
pub trait Model: Send + Sync {
    async fn generate(&self, request: ModelRequest) -> Result<ModelStream, ModelError>;
}
