//! Tool provider boundary
//!
//! Tools live behind an external provider (the MCP query server in
//! production). This module defines the transport-agnostic contract the
//! orchestration loop talks to: discovery via [`ToolProvider::list_tools`]
//! and invocation via [`ToolProvider::call_tool`]. The loop does not care
//! whether calls cross a network boundary.

mod invoker;
mod registry;

#[cfg(feature = "mcp")]
pub mod mcp;

pub use invoker::{is_error_text, ToolInvoker, TOOL_ERROR_PREFIX};
pub use registry::ToolRegistry;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{Result, ToolError};

/// Call signature advertised to the model's function-calling interface
///
/// Immutable once loaded for a session; mirrors whatever the provider
/// advertised at session start.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolSignature {
    pub name: String,
    pub description: String,
    /// JSON schema for the tool's arguments
    pub parameters: Value,
}

/// External provider of tools
///
/// One explicitly-typed invocation contract: a tool name plus a JSON object
/// of arguments. There is no alternate calling convention to fall back to.
#[async_trait]
pub trait ToolProvider: Send + Sync {
    /// Discover the tools currently offered
    ///
    /// Fails with [`crate::Error::ProviderUnavailable`] when the provider
    /// cannot be reached.
    async fn list_tools(&self) -> Result<Vec<ToolSignature>>;

    /// Execute a single tool call
    ///
    /// Errors here are recovered by the invoker into transcript text; they
    /// never abort the conversation.
    async fn call_tool(
        &self,
        name: &str,
        arguments: Value,
    ) -> std::result::Result<String, ToolError>;
}
