//! Chat session - the bounded orchestration loop
//!
//! Drives the request/act cycle between the model and the tool invoker,
//! mutating the transcript at each step. Two execution modes: the buffered
//! loop with tool-call support, and a single-pass streaming variant.

use std::sync::Arc;

use async_stream::try_stream;
use futures::{Stream, StreamExt};
use tracing::{debug, info, warn};

use crate::error::{Result, ToolError};
use crate::provider::ModelClient;
use crate::tools::{ToolInvoker, ToolProvider, ToolRegistry, ToolSignature};
use crate::transcript::{Transcript, Turn};

/// Default iteration budget per user message
pub const DEFAULT_MAX_ITERATIONS: usize = 10;

/// Advisory text returned when the iteration budget is spent
pub const BUDGET_EXHAUSTED_MESSAGE: &str =
    "Maximum iterations reached. Please try again with a simpler request.";

/// Result of one buffered chat turn
///
/// Budget exhaustion is a soft terminal state, not an error: callers that
/// only want a string call [`ChatOutcome::into_text`] and always get one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatOutcome {
    /// The model produced a final answer
    Answered(String),
    /// The iteration budget ran out before a final answer
    BudgetExhausted,
}

impl ChatOutcome {
    pub fn is_answered(&self) -> bool {
        matches!(self, Self::Answered(_))
    }

    /// Render as the caller-facing string
    pub fn into_text(self) -> String {
        match self {
            Self::Answered(text) => text,
            Self::BudgetExhausted => BUDGET_EXHAUSTED_MESSAGE.to_string(),
        }
    }
}

/// Placeholder provider for sessions with no tool server configured
struct NoTools;

#[async_trait::async_trait]
impl ToolProvider for NoTools {
    async fn list_tools(&self) -> Result<Vec<ToolSignature>> {
        Ok(Vec::new())
    }

    async fn call_tool(
        &self,
        name: &str,
        _arguments: serde_json::Value,
    ) -> std::result::Result<String, ToolError> {
        Err(ToolError::NotFound(name.to_string()))
    }
}

/// One conversation: a transcript plus live model and tool connections
///
/// A session is single-threaded by design: calls into the same session must
/// be serialized by the caller (the store hands out a mutex for exactly
/// this). Dropping the session releases the provider connections.
pub struct ChatSession {
    transcript: Transcript,
    model: Arc<dyn ModelClient>,
    invoker: ToolInvoker,
    registry: ToolRegistry,
}

impl ChatSession {
    /// Create a session, discovering tools from the provider
    ///
    /// Tool signatures are loaded here, once, and cached for the session's
    /// lifetime. Fails with `Error::ProviderUnavailable` when the tool
    /// provider cannot be reached.
    pub async fn connect(
        model: Arc<dyn ModelClient>,
        tools: Arc<dyn ToolProvider>,
    ) -> Result<Self> {
        let registry = ToolRegistry::load(tools.as_ref()).await?;
        Ok(Self {
            transcript: Transcript::new(),
            model,
            invoker: ToolInvoker::new(tools),
            registry,
        })
    }

    /// Create a session with no tool provider
    pub fn without_tools(model: Arc<dyn ModelClient>) -> Self {
        Self {
            transcript: Transcript::new(),
            model,
            invoker: ToolInvoker::new(Arc::new(NoTools)),
            registry: ToolRegistry::empty(),
        }
    }

    /// Tool signatures cached for this session
    pub fn signatures(&self) -> &[ToolSignature] {
        self.registry.signatures()
    }

    /// Run one buffered chat turn with the default iteration budget
    pub async fn chat(
        &mut self,
        user_message: &str,
        system_prompt: Option<&str>,
    ) -> Result<ChatOutcome> {
        self.chat_with_budget(user_message, system_prompt, DEFAULT_MAX_ITERATIONS)
            .await
    }

    /// Run one buffered chat turn
    ///
    /// Appends the user message (and the system prompt, if this is the
    /// session's first turn), then alternates model requests and tool
    /// invocations until the model answers without tool calls or the
    /// budget is spent. Tool failures never abort the loop; they are
    /// appended as error-text tool turns for the model to react to.
    pub async fn chat_with_budget(
        &mut self,
        user_message: &str,
        system_prompt: Option<&str>,
        max_iterations: usize,
    ) -> Result<ChatOutcome> {
        if let Some(prompt) = system_prompt {
            if self.transcript.is_empty() {
                self.transcript.push_system(prompt);
            }
        }
        self.transcript.push_user(user_message);

        let mut iteration = 0;
        while iteration < max_iterations {
            iteration += 1;
            debug!(iteration, max_iterations, "Requesting model completion");

            let assistant = self
                .model
                .complete(self.transcript.turns(), self.registry.signatures())
                .await?;

            let content = assistant.content.clone();
            let tool_calls = assistant.tool_calls.clone();

            // The assistant turn goes in verbatim, tool calls and all
            self.transcript.push(assistant.into_turn());

            if tool_calls.is_empty() {
                return Ok(ChatOutcome::Answered(content.unwrap_or_default()));
            }

            // Invoke in arrival order, one at a time: later calls may depend
            // on earlier results being visible in transcript order, and the
            // provider expects one tool turn per call id in request order
            for call in &tool_calls {
                debug!(tool = %call.name, id = %call.id, "Executing tool call");
                let result = self.invoker.invoke(&call.name, &call.arguments).await;
                self.transcript.push_tool_result(&call.id, result);
            }
        }

        warn!(max_iterations, "Iteration budget exhausted");
        Ok(ChatOutcome::BudgetExhausted)
    }

    /// Run one streaming chat turn
    ///
    /// Single pass, no tool calls. Yields text fragments as they arrive;
    /// the concatenated response is committed to the transcript as one
    /// assistant turn only after the stream is fully drained. Abandoning
    /// the stream early commits nothing - no half-turn ends up in history.
    pub fn chat_streaming<'a>(
        &'a mut self,
        user_message: &str,
        system_prompt: Option<&str>,
    ) -> impl Stream<Item = Result<String>> + Send + 'a {
        let user_message = user_message.to_string();
        let system_prompt = system_prompt.map(str::to_string);

        try_stream! {
            if let Some(prompt) = &system_prompt {
                if self.transcript.is_empty() {
                    self.transcript.push_system(prompt.clone());
                }
            }
            self.transcript.push_user(user_message);

            let mut fragments = self.model.complete_stream(self.transcript.turns()).await?;

            let mut full = String::new();
            while let Some(fragment) = fragments.next().await {
                let fragment = fragment?;
                full.push_str(&fragment);
                yield fragment;
            }

            debug!(chars = full.len(), "Streaming response drained, committing");
            let content = if full.is_empty() { None } else { Some(full) };
            self.transcript.push_assistant(content, Vec::new());
        }
    }

    /// Clear the conversation history
    pub fn reset(&mut self) {
        info!("Resetting conversation");
        self.transcript.reset(None);
    }

    /// Clear the conversation history and re-seed a system turn
    pub fn reset_with_system(&mut self, system_prompt: &str) {
        info!("Resetting conversation with system prompt");
        self.transcript.reset(Some(system_prompt));
    }

    /// Copy of the conversation history (not a live reference)
    pub fn history(&self) -> Vec<Turn> {
        self.transcript.history()
    }
}
