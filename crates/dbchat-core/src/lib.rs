//! dbchat Core - Tool-calling orchestration for a database assistant
//!
//! This crate provides the core functionality for the dbchat application:
//! - Conversation transcripts with tool-call turns
//! - Tool discovery, invocation, and error recovery
//! - The bounded request/act orchestration loop
//! - The model provider boundary, with buffered and streaming completion
//! - A store for concurrent chat sessions

pub mod config;
pub mod error;
pub mod prompts;
pub mod provider;
pub mod session;
pub mod tools;
pub mod transcript;

pub use config::{Config, McpConfig, McpEndpoint, ProviderConfig, MCP_URL_ENV};
pub use error::{Error, Result, ToolError};
pub use prompts::DEFAULT_DB_SYSTEM_PROMPT;
pub use provider::{
    AssistantTurn, GenAiModel, ModelClient, ModelEndpoint, TextStream, DEFAULT_MODEL,
};
pub use session::{
    ChatOutcome, ChatSession, SessionId, SessionInfo, SessionStore, BUDGET_EXHAUSTED_MESSAGE,
    DEFAULT_MAX_ITERATIONS,
};
pub use tools::{
    is_error_text, ToolInvoker, ToolProvider, ToolRegistry, ToolSignature, TOOL_ERROR_PREFIX,
};
pub use transcript::{Role, ToolCallRequest, Transcript, Turn};

#[cfg(feature = "mcp")]
pub use tools::mcp::McpToolProvider;
