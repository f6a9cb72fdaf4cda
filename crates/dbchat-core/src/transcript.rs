//! Conversation transcript
//!
//! The transcript is the sole shared mutable state of a session: an ordered,
//! append-only log of turns. Provider-specific response shapes never land
//! here; the model and tool boundaries translate to and from these neutral
//! types.

use serde::{Deserialize, Serialize};

/// Who a turn is attributed to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    System,
    User,
    Assistant,
    Tool,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Role::System => "system",
            Role::User => "user",
            Role::Assistant => "assistant",
            Role::Tool => "tool",
        };
        f.write_str(s)
    }
}

/// A structured request from the model to invoke a named tool
///
/// Produced only by the model; the loop never fabricates one. `arguments`
/// is the raw JSON text exactly as the model emitted it — decoding happens
/// in the invoker so malformed arguments can be turned into error text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolCallRequest {
    /// Opaque identifier, unique within the assistant turn
    pub id: String,
    /// Tool name
    pub name: String,
    /// JSON-encoded argument mapping
    pub arguments: String,
}

/// One message in the conversation transcript
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    pub role: Role,
    pub content: Option<String>,
    /// Tool calls carried by an assistant turn
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tool_calls: Vec<ToolCallRequest>,
    /// For tool turns: the id of the request this result answers
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,
}

impl Turn {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: Some(content.into()),
            tool_calls: Vec::new(),
            tool_call_id: None,
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: Some(content.into()),
            tool_calls: Vec::new(),
            tool_call_id: None,
        }
    }

    pub fn assistant(content: Option<String>, tool_calls: Vec<ToolCallRequest>) -> Self {
        Self {
            role: Role::Assistant,
            content,
            tool_calls,
            tool_call_id: None,
        }
    }

    pub fn tool_result(tool_call_id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            role: Role::Tool,
            content: Some(content.into()),
            tool_calls: Vec::new(),
            tool_call_id: Some(tool_call_id.into()),
        }
    }

    /// Content as text, empty string when the model returned null content
    pub fn content_as_text(&self) -> &str {
        self.content.as_deref().unwrap_or("")
    }

    pub fn has_tool_calls(&self) -> bool {
        !self.tool_calls.is_empty()
    }
}

/// Ordered, append-only conversation state
///
/// Grows monotonically except on explicit `reset`, which clears it (and
/// optionally re-seeds a system turn). Owned exclusively by one session.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Transcript {
    turns: Vec<Turn>,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, turn: Turn) {
        self.turns.push(turn);
    }

    pub fn push_system(&mut self, content: impl Into<String>) {
        self.turns.push(Turn::system(content));
    }

    pub fn push_user(&mut self, content: impl Into<String>) {
        self.turns.push(Turn::user(content));
    }

    pub fn push_assistant(&mut self, content: Option<String>, tool_calls: Vec<ToolCallRequest>) {
        self.turns.push(Turn::assistant(content, tool_calls));
    }

    pub fn push_tool_result(&mut self, tool_call_id: impl Into<String>, content: impl Into<String>) {
        self.turns.push(Turn::tool_result(tool_call_id, content));
    }

    /// Clear the transcript, optionally re-seeding a system turn
    pub fn reset(&mut self, system_prompt: Option<&str>) {
        self.turns.clear();
        if let Some(prompt) = system_prompt {
            self.turns.push(Turn::system(prompt));
        }
    }

    /// Snapshot of the conversation (a copy, not a live reference)
    pub fn history(&self) -> Vec<Turn> {
        self.turns.clone()
    }

    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }
}
