//! Error types for dbchat core

use thiserror::Error;

/// Result type alias using the dbchat Error
pub type Result<T> = std::result::Result<T, Error>;

/// dbchat error types
///
/// Only `ProviderUnavailable` escapes the orchestration loop during normal
/// operation; tool-originated failures are absorbed into the transcript as
/// error text so the model can react to them.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Provider unavailable: {0}")]
    ProviderUnavailable(String),

    #[error("Model error: {0}")]
    Model(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

/// Tool-specific errors
///
/// These are recovered locally by the invoker: every variant gets rendered
/// as a tool-turn error string rather than aborting the conversation.
#[derive(Error, Debug)]
pub enum ToolError {
    #[error("Tool not found: {0}")]
    NotFound(String),

    #[error("Invalid arguments: {0}")]
    ArgumentDecode(String),

    #[error("Execution failed: {0}")]
    Execution(String),
}
