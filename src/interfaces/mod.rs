//! External collaborator interfaces (§6): the narrow traits through which the
//! engine consumes models, tools, and sub-agents without depending on any
//! concrete provider.
//!
//! These traits are deliberately thin. The engine never inspects a model's
//! wire protocol, a tool's transport, or a sub-agent's internals: it only
//! needs a stream of chunks, a descriptor plus an invoke call, and a stream
//! of [`Event`](crate::event_bus::Event)s, respectively. Concrete adapters
//! (`RigModel`, `RmcpTool`, `GraphSubAgent`) live behind the `llm` feature or,
//! for `GraphSubAgent`, are always available since they only depend on
//! `crate::app::App`.

mod graph_sub_agent;
mod model;
mod sub_agent;
mod tool;

#[cfg(feature = "llm")]
mod rig_model;
#[cfg(feature = "llm")]
mod rmcp_tool;

pub use graph_sub_agent::GraphSubAgent;
pub use model::{Model, ModelChunk, ModelError, ModelRequest, ModelStream, ModelUsage, ToolCallRequest};
pub use sub_agent::{SubAgent, SubAgentContext};
pub use tool::{Tool, ToolContext, ToolDescriptor, ToolError};

#[cfg(feature = "llm")]
pub use rig_model::RigModel;
#[cfg(feature = "llm")]
pub use rmcp_tool::RmcpTool;
