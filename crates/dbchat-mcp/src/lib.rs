//! dbchat MCP - Model Context Protocol client
//!
//! This crate speaks the MCP wire protocol to the query server that fronts
//! the business database. It exposes tool discovery (`tools/list`) and tool
//! invocation (`tools/call`) over either a stdio subprocess or plain HTTP.

pub mod client;
pub mod protocol;
pub mod transport;

use serde::{Deserialize, Serialize};

pub use client::{ClientInfo, ContentItem, McpClient, McpError, ServerInfo, ToolCallResult};
pub use transport::{HttpTransport, StdioTransport, Transport};

/// MCP protocol version
pub const PROTOCOL_VERSION: &str = "2024-11-05";

/// Tool definition in MCP format
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct McpTool {
    pub name: String,
    pub description: String,
    #[serde(rename = "inputSchema")]
    pub input_schema: serde_json::Value,
}

/// Server capabilities advertised during initialization
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServerCapabilities {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tools: Option<ToolsCapability>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ToolsCapability {
    #[serde(rename = "listChanged", default)]
    pub list_changed: bool,
}
