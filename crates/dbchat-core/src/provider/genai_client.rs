//! GenAI-based model client
//!
//! Uses the genai framework so the same code path serves OpenAI-compatible
//! providers directly or through the OpenRouter gateway. Both the buffered
//! and streaming calls go through `exec_chat_stream`; the buffered variant
//! accumulates the whole stream before returning.

use std::time::Duration;

use async_stream::try_stream;
use futures::StreamExt;
use genai::adapter::AdapterKind;
use genai::chat::{ChatMessage, ChatRequest, ChatStreamEvent, Tool, ToolCall, ToolResponse};
use genai::resolver::{AuthData, AuthResolver, Endpoint, ServiceTargetResolver};
use genai::Client;
use genai::WebConfig;
use genai::{ModelIden, ServiceTarget};
use tracing::{debug, error, info};

use async_trait::async_trait;

use super::{AssistantTurn, ModelClient, ModelEndpoint, TextStream};
use crate::error::{Error, Result};
use crate::tools::ToolSignature;
use crate::transcript::{Role, ToolCallRequest, Turn};

/// Default model when none is configured
pub const DEFAULT_MODEL: &str = "gpt-4o";

/// Base URL for the OpenRouter gateway (OpenAI-compatible API)
pub const OPENROUTER_BASE_URL: &str = "https://openrouter.ai/api/v1/";

/// Model client backed by genai
pub struct GenAiModel {
    client: Client,
    model: String,
    endpoint: ModelEndpoint,
}

impl GenAiModel {
    /// Request timeout for model calls (5 minutes)
    const DEFAULT_TIMEOUT: Duration = Duration::from_secs(300);

    fn default_web_config() -> WebConfig {
        WebConfig::default()
            .with_timeout(Self::DEFAULT_TIMEOUT)
            .with_connect_timeout(Duration::from_secs(30))
    }

    /// Create a client using environment variables for auth
    pub fn new(model: Option<&str>) -> Self {
        let client = Client::builder()
            .with_web_config(Self::default_web_config())
            .build();
        Self {
            client,
            model: model.unwrap_or(DEFAULT_MODEL).to_string(),
            endpoint: ModelEndpoint::Direct,
        }
    }

    /// Create a client with an explicit API key
    ///
    /// The endpoint (direct vs. OpenRouter gateway) is derived from the key
    /// shape here, once, and never changes mid-conversation. Gateway keys
    /// retarget every request to the OpenRouter base URL; the model keeps
    /// its OpenAI-shaped wire format either way.
    pub fn with_api_key(api_key: &str, model: Option<&str>) -> Self {
        let endpoint = ModelEndpoint::from_credential(api_key);
        info!(%endpoint, "Model endpoint selected from credential");

        let api_key = api_key.to_string();
        let builder = match endpoint {
            ModelEndpoint::OpenRouter => {
                let target_resolver = ServiceTargetResolver::from_resolver_fn(
                    move |target: ServiceTarget| -> std::result::Result<ServiceTarget, genai::resolver::Error> {
                        let ServiceTarget { model, .. } = target;
                        Ok(ServiceTarget {
                            endpoint: Endpoint::from_static(OPENROUTER_BASE_URL),
                            auth: AuthData::from_single(api_key.clone()),
                            model: ModelIden::new(AdapterKind::OpenAI, model.model_name),
                        })
                    },
                );
                Client::builder().with_service_target_resolver(target_resolver)
            }
            ModelEndpoint::Direct => {
                let auth_resolver = AuthResolver::from_resolver_fn(
                    move |_model_iden| -> std::result::Result<Option<AuthData>, genai::resolver::Error> {
                        Ok(Some(AuthData::from_single(api_key.clone())))
                    },
                );
                Client::builder().with_auth_resolver(auth_resolver)
            }
        };

        let client = builder.with_web_config(Self::default_web_config()).build();

        Self {
            client,
            model: model.unwrap_or(DEFAULT_MODEL).to_string(),
            endpoint,
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn endpoint(&self) -> ModelEndpoint {
        self.endpoint
    }

    /// Translate the neutral transcript into a genai request
    fn build_request(turns: &[Turn], tools: &[ToolSignature]) -> ChatRequest {
        let mut chat_req = ChatRequest::default();

        for turn in turns {
            match turn.role {
                Role::System => {
                    chat_req = chat_req.append_message(ChatMessage::system(turn.content_as_text()));
                }
                Role::User => {
                    chat_req = chat_req.append_message(ChatMessage::user(turn.content_as_text()));
                }
                Role::Assistant => {
                    if turn.has_tool_calls() {
                        // Tool calls must go out as a single assistant message;
                        // any text alongside them is dropped at the wire level
                        let calls: Vec<ToolCall> = turn
                            .tool_calls
                            .iter()
                            .map(|tc| ToolCall {
                                call_id: tc.id.clone(),
                                fn_name: tc.name.clone(),
                                fn_arguments: serde_json::from_str(&tc.arguments)
                                    .unwrap_or(serde_json::Value::String(tc.arguments.clone())),
                                thought_signatures: None,
                            })
                            .collect();
                        chat_req = chat_req.append_message(calls);
                    } else {
                        chat_req =
                            chat_req.append_message(ChatMessage::assistant(turn.content_as_text()));
                    }
                }
                Role::Tool => {
                    if let Some(call_id) = &turn.tool_call_id {
                        let response =
                            ToolResponse::new(call_id.clone(), turn.content_as_text().to_string());
                        chat_req = chat_req.append_message(response);
                    }
                }
            }
        }

        if !tools.is_empty() {
            let genai_tools: Vec<Tool> = tools
                .iter()
                .map(|t| {
                    Tool::new(&t.name)
                        .with_description(&t.description)
                        .with_schema(t.parameters.clone())
                })
                .collect();
            chat_req = chat_req.with_tools(genai_tools);
        }

        chat_req
    }
}

#[async_trait]
impl ModelClient for GenAiModel {
    async fn complete(&self, turns: &[Turn], tools: &[ToolSignature]) -> Result<AssistantTurn> {
        let chat_req = Self::build_request(turns, tools);

        let stream_res = self
            .client
            .exec_chat_stream(&self.model, chat_req, None)
            .await
            .map_err(|e| {
                error!(error = ?e, model = %self.model, "Model request failed");
                Error::ProviderUnavailable(format!("GenAI error: {e:?}"))
            })?;

        let mut content = String::new();
        let mut tool_calls: Vec<ToolCallRequest> = Vec::new();
        let mut stream = stream_res.stream;

        while let Some(event) = stream.next().await {
            match event {
                Ok(ChatStreamEvent::Chunk(chunk)) => {
                    content.push_str(&chunk.content);
                }
                Ok(ChatStreamEvent::ToolCallChunk(tc)) => {
                    // Each chunk carries a complete tool call
                    let call = tc.tool_call;
                    tool_calls.push(ToolCallRequest {
                        id: call.call_id,
                        name: call.fn_name,
                        arguments: serde_json::to_string(&call.fn_arguments)
                            .unwrap_or_else(|_| "{}".to_string()),
                    });
                }
                Ok(ChatStreamEvent::End(_)) => break,
                Ok(_) => {}
                Err(e) => {
                    error!(error = ?e, model = %self.model, "Model stream error");
                    return Err(Error::Model(format!("GenAI stream error: {e:?}")));
                }
            }
        }

        debug!(
            content_len = content.len(),
            tool_calls = tool_calls.len(),
            "Model completion received"
        );

        Ok(AssistantTurn {
            content: if content.is_empty() {
                None
            } else {
                Some(content)
            },
            tool_calls,
        })
    }

    async fn complete_stream(&self, turns: &[Turn]) -> Result<TextStream> {
        let chat_req = Self::build_request(turns, &[]);

        let stream_res = self
            .client
            .exec_chat_stream(&self.model, chat_req, None)
            .await
            .map_err(|e| {
                error!(error = ?e, model = %self.model, "Model stream request failed");
                Error::ProviderUnavailable(format!("GenAI error: {e:?}"))
            })?;

        let mut inner = stream_res.stream;
        let model = self.model.clone();

        let stream = try_stream! {
            while let Some(event) = inner.next().await {
                match event {
                    Ok(ChatStreamEvent::Chunk(chunk)) => {
                        if !chunk.content.is_empty() {
                            yield chunk.content;
                        }
                    }
                    Ok(ChatStreamEvent::End(_)) => break,
                    // Tool-call events are ignored: the streaming path
                    // advertises no tools
                    Ok(_) => {}
                    Err(e) => {
                        error!(error = ?e, model = %model, "Model stream error");
                        Err(Error::Model(format!("GenAI stream error: {e:?}")))?;
                    }
                }
            }
        };

        Ok(Box::pin(stream))
    }
}
