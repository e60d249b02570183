//! The tool interface (§6): `descriptor()` plus `invoke(arguments, context)`.

use async_trait::async_trait;
use miette::Diagnostic;
use serde_json::Value;
use thiserror::Error;
use tokio_util::sync::CancellationToken;

/// Declares a tool's name, human-readable description, and JSON-schema-shaped
/// argument contract, as offered to a model via [`crate::interfaces::ModelRequest`].
#[derive(Clone, Debug)]
pub struct ToolDescriptor {
    pub name: String,
    pub description: String,
    pub argument_schema: Value,
}

impl ToolDescriptor {
    #[must_use]
    pub fn new(name: impl Into<String>, description: impl Into<String>, argument_schema: Value) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            argument_schema,
        }
    }
}

/// Per-call context handed to [`Tool::invoke`]: the invocation this call
/// belongs to and a cooperative cancellation signal.
#[derive(Clone, Debug)]
pub struct ToolContext {
    pub invocation_id: String,
    pub cancellation: CancellationToken,
}

impl ToolContext {
    #[must_use]
    pub fn new(invocation_id: impl Into<String>, cancellation: CancellationToken) -> Self {
        Self {
            invocation_id: invocation_id.into(),
            cancellation,
        }
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancellation.is_cancelled()
    }
}

/// Error returned by a failed tool invocation. Surfaced to the model as a
/// tool-response error payload (§4.5 Tools node) rather than aborting the
/// invocation outright.
#[derive(Debug, Error, Diagnostic, Clone)]
pub enum ToolError {
    #[error("tool {tool} rejected its arguments: {message}")]
    #[diagnostic(code(weavegraph::interfaces::tool::invalid_arguments))]
    InvalidArguments { tool: String, message: String },

    #[error("tool {tool} failed: {message}")]
    #[diagnostic(code(weavegraph::interfaces::tool::execution))]
    Execution { tool: String, message: String },

    #[error("tool {tool} call was cancelled")]
    #[diagnostic(code(weavegraph::interfaces::tool::cancelled))]
    Cancelled { tool: String },
}

/// The narrow interface a tools-node invokes against for every tool call a
/// model requested.
#[async_trait]
pub trait Tool: Send + Sync {
    fn descriptor(&self) -> ToolDescriptor;
    async fn invoke(&self, arguments: Value, ctx: ToolContext) -> Result<Value, ToolError>;
}
