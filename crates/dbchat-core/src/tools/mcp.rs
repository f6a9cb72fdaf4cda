//! MCP-backed tool provider
//!
//! Bridges the `dbchat-mcp` client into the [`ToolProvider`] contract so the
//! orchestration loop can drive the query server without knowing about the
//! wire protocol or transport.

use async_trait::async_trait;
use serde_json::Value;
use tracing::info;

use dbchat_mcp::{ClientInfo, McpClient, ServerInfo, Transport};

use super::{ToolProvider, ToolSignature};
use crate::error::{Error, Result, ToolError};

/// Tool provider backed by an MCP server connection
pub struct McpToolProvider<T: Transport> {
    client: McpClient<T>,
    server: ServerInfo,
}

impl<T: Transport> McpToolProvider<T> {
    /// Connect and run the MCP initialization handshake
    pub async fn connect(transport: T) -> Result<Self> {
        let mut client = McpClient::new(transport);
        let server = client
            .initialize(ClientInfo::default())
            .await
            .map_err(|e| Error::ProviderUnavailable(e.to_string()))?;

        info!(server = %server.name, version = %server.version, "Connected to MCP server");
        Ok(Self { client, server })
    }

    pub fn server_info(&self) -> &ServerInfo {
        &self.server
    }
}

#[async_trait]
impl<T: Transport> ToolProvider for McpToolProvider<T> {
    async fn list_tools(&self) -> Result<Vec<ToolSignature>> {
        let tools = self
            .client
            .list_tools()
            .await
            .map_err(|e| Error::ProviderUnavailable(e.to_string()))?;

        Ok(tools
            .into_iter()
            .map(|t| ToolSignature {
                name: t.name,
                description: t.description,
                parameters: t.input_schema,
            })
            .collect())
    }

    async fn call_tool(
        &self,
        name: &str,
        arguments: Value,
    ) -> std::result::Result<String, ToolError> {
        let result = self
            .client
            .call_tool(name, arguments)
            .await
            .map_err(|e| ToolError::Execution(e.to_string()))?;

        if result.is_error {
            Err(ToolError::Execution(result.text()))
        } else {
            Ok(result.text())
        }
    }
}
