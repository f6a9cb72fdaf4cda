//! Tool invoker
//!
//! Translation boundary between typed tool-call requests and textual tool
//! turns. `invoke` never fails: argument-decode errors, provider errors and
//! timeouts all become identifiably-prefixed error text the model can read
//! and react to on its next turn.

use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, warn};

use super::ToolProvider;
use crate::error::ToolError;

/// Prefix marking a tool result as an error
pub const TOOL_ERROR_PREFIX: &str = "Error calling tool";

/// Whether a tool-turn result is the invoker's error rendering
pub fn is_error_text(result: &str) -> bool {
    result.starts_with(TOOL_ERROR_PREFIX)
}

/// Executes single named tool calls against the provider
#[derive(Clone)]
pub struct ToolInvoker {
    provider: Arc<dyn ToolProvider>,
}

impl ToolInvoker {
    pub fn new(provider: Arc<dyn ToolProvider>) -> Self {
        Self { provider }
    }

    /// Execute one tool call, normalizing success and failure into text
    pub async fn invoke(&self, name: &str, raw_arguments: &str) -> String {
        let arguments = match decode_arguments(raw_arguments) {
            Ok(args) => args,
            Err(e) => {
                warn!(tool = name, error = %e, "Tool call arguments failed to decode");
                return render_error(name, &e);
            }
        };

        debug!(tool = name, "Invoking tool");
        match self.provider.call_tool(name, arguments).await {
            Ok(result) => result,
            Err(e) => {
                warn!(tool = name, error = %e, "Tool invocation failed");
                render_error(name, &e)
            }
        }
    }
}

fn render_error(name: &str, error: &ToolError) -> String {
    format!("{TOOL_ERROR_PREFIX} {name}: {error}")
}

/// Decode the model's raw argument text into a JSON object
///
/// Some models emit an empty string for a no-argument call; that is treated
/// as an empty object rather than a decode failure.
fn decode_arguments(raw: &str) -> std::result::Result<Value, ToolError> {
    if raw.trim().is_empty() {
        return Ok(Value::Object(serde_json::Map::new()));
    }

    let value: Value =
        serde_json::from_str(raw).map_err(|e| ToolError::ArgumentDecode(e.to_string()))?;

    if !value.is_object() {
        return Err(ToolError::ArgumentDecode(format!(
            "expected a JSON object, got {value}"
        )));
    }

    Ok(value)
}
