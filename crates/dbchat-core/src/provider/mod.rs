//! Model provider boundary
//!
//! The orchestration loop talks to the model through the [`ModelClient`]
//! trait: one buffered call that yields a full assistant turn, and one
//! streaming call that yields text fragments. Provider-specific response
//! shapes are translated to the neutral transcript types here and nowhere
//! else.

mod genai_client;

pub use genai_client::{GenAiModel, DEFAULT_MODEL, OPENROUTER_BASE_URL};

use std::pin::Pin;

use async_trait::async_trait;
use futures::Stream;

use crate::error::Result;
use crate::tools::ToolSignature;
use crate::transcript::{ToolCallRequest, Turn};

/// One assistant turn as produced by the model
#[derive(Debug, Clone, Default)]
pub struct AssistantTurn {
    /// Text content (may be present even alongside tool calls)
    pub content: Option<String>,
    /// Tool calls the model wants executed, in request order
    pub tool_calls: Vec<ToolCallRequest>,
}

impl AssistantTurn {
    pub fn has_tool_calls(&self) -> bool {
        !self.tool_calls.is_empty()
    }

    /// Convert into a transcript turn, verbatim
    pub fn into_turn(self) -> Turn {
        Turn::assistant(self.content, self.tool_calls)
    }
}

/// Lazy, finite sequence of response text fragments
///
/// Not restartable; a new call must be made to regenerate.
pub type TextStream = Pin<Box<dyn Stream<Item = Result<String>> + Send>>;

/// Boundary to the conversational model
#[async_trait]
pub trait ModelClient: Send + Sync {
    /// Request one completion conditioned on the full history and the
    /// advertised tool signatures
    async fn complete(&self, turns: &[Turn], tools: &[ToolSignature]) -> Result<AssistantTurn>;

    /// Open one incremental completion
    ///
    /// No tool signatures are passed: the streaming path is tool-free.
    async fn complete_stream(&self, turns: &[Turn]) -> Result<TextStream>;
}

/// Provider endpoint, decided once at construction from credential shape
///
/// Never switched mid-conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelEndpoint {
    /// Direct provider API
    Direct,
    /// OpenRouter gateway
    OpenRouter,
}

impl ModelEndpoint {
    /// OpenRouter keys are recognizable by their prefix
    pub fn from_credential(api_key: &str) -> Self {
        if api_key.starts_with("sk-or-v1-") {
            Self::OpenRouter
        } else {
            Self::Direct
        }
    }
}

impl std::fmt::Display for ModelEndpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Direct => f.write_str("direct"),
            Self::OpenRouter => f.write_str("openrouter"),
        }
    }
}
