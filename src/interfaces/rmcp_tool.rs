//! `rmcp` (Model Context Protocol) adapter for the [`Tool`] interface,
//! grounded in `demo6_agent_mcp.rs`'s MCP child-process / peer pattern —
//! generalized so a tools-node can dispatch to any MCP tool through the
//! engine's [`Tool`] trait instead of `rig`'s `.rmcp_tool()` binding.

use async_trait::async_trait;
use rmcp::model::{CallToolRequestParam, Tool as RmcpToolInfo};
use rmcp::service::{Peer, RoleClient};
use serde_json::Value;

use crate::interfaces::tool::{Tool, ToolContext, ToolDescriptor, ToolError};

/// Binds one MCP tool, discovered via `peer.list_tools()`, to the engine's
/// [`Tool`] interface. One `RmcpTool` per MCP tool, matching how
/// `demo6_agent_mcp.rs` folds each discovered tool into the agent builder.
pub struct RmcpTool {
    info: RmcpToolInfo,
    peer: Peer<RoleClient>,
}

impl RmcpTool {
    #[must_use]
    pub fn new(info: RmcpToolInfo, peer: Peer<RoleClient>) -> Self {
        Self { info, peer }
    }
}

#[async_trait]
impl Tool for RmcpTool {
    fn descriptor(&self) -> ToolDescriptor {
        ToolDescriptor::new(
            self.info.name.to_string(),
            self.info
                .description
                .as_deref()
                .unwrap_or_default()
                .to_string(),
            Value::Object((*self.info.input_schema).clone()),
        )
    }

    async fn invoke(&self, arguments: Value, ctx: ToolContext) -> Result<Value, ToolError> {
        let name = self.info.name.to_string();
        if ctx.is_cancelled() {
            return Err(ToolError::Cancelled { tool: name });
        }

        let arguments = arguments.as_object().cloned();
        let result = self
            .peer
            .call_tool(CallToolRequestParam {
                name: self.info.name.clone(),
                arguments,
            })
            .await
            .map_err(|e| ToolError::Execution {
                tool: name.clone(),
                message: e.to_string(),
            })?;

        serde_json::to_value(result.content).map_err(|e| ToolError::Execution {
            tool: name,
            message: e.to_string(),
        })
    }
}
