//! Streaming chat integration tests
//!
//! Tests for the single-pass streaming variant:
//! - Fragment delivery and commit-after-drain
//! - Abandoned streams leaving no partial assistant turn
//! - Mid-stream provider errors

use std::sync::Arc;

use async_trait::async_trait;
use futures::StreamExt;
use serde_json::Value;

use dbchat_core::{
    AssistantTurn, ChatSession, Error, ModelClient, Result, Role, TextStream, ToolSignature, Turn,
};

/// Model that streams a fixed sequence of fragments
struct FragmentModel {
    fragments: Vec<Result<String>>,
}

impl FragmentModel {
    fn ok(fragments: &[&str]) -> Arc<Self> {
        Arc::new(Self {
            fragments: fragments.iter().map(|f| Ok(f.to_string())).collect(),
        })
    }

    fn failing_after(fragments: &[&str], message: &str) -> Arc<Self> {
        let mut all: Vec<Result<String>> =
            fragments.iter().map(|f| Ok(f.to_string())).collect();
        all.push(Err(Error::Model(message.to_string())));
        Arc::new(Self { fragments: all })
    }
}

#[async_trait]
impl ModelClient for FragmentModel {
    async fn complete(&self, _turns: &[Turn], _tools: &[ToolSignature]) -> Result<AssistantTurn> {
        Err(Error::Model("buffered mode not supported here".to_string()))
    }

    async fn complete_stream(&self, _turns: &[Turn]) -> Result<TextStream> {
        let fragments: Vec<Result<String>> = self
            .fragments
            .iter()
            .map(|f| match f {
                Ok(text) => Ok(text.clone()),
                Err(Error::Model(msg)) => Err(Error::Model(msg.clone())),
                Err(_) => unreachable!(),
            })
            .collect();
        Ok(Box::pin(futures::stream::iter(fragments)))
    }
}

#[tokio::test]
async fn test_fragments_delivered_then_committed() {
    let model = FragmentModel::ok(&["The ", "answer ", "is ", "42."]);
    let mut session = ChatSession::without_tools(model);

    let mut collected = Vec::new();
    {
        let mut stream = Box::pin(session.chat_streaming("question", None));
        while let Some(fragment) = stream.next().await {
            collected.push(fragment.unwrap());
        }
    }

    assert_eq!(collected, vec!["The ", "answer ", "is ", "42."]);

    // One assistant turn holding the full concatenation
    let history = session.history();
    assert_eq!(history.len(), 2);
    assert_eq!(history[0].role, Role::User);
    assert_eq!(history[1].role, Role::Assistant);
    assert_eq!(history[1].content.as_deref(), Some("The answer is 42."));
}

#[tokio::test]
async fn test_system_prompt_seeded_before_stream() {
    let model = FragmentModel::ok(&["hi"]);
    let mut session = ChatSession::without_tools(model);

    {
        let mut stream = Box::pin(session.chat_streaming("hello", Some("Be brief.")));
        while let Some(fragment) = stream.next().await {
            fragment.unwrap();
        }
    }

    let history = session.history();
    assert_eq!(history[0].role, Role::System);
    assert_eq!(history[0].content.as_deref(), Some("Be brief."));
    assert_eq!(history.len(), 3);
}

#[tokio::test]
async fn test_abandoned_stream_commits_nothing() {
    let model = FragmentModel::ok(&["one", "two", "three", "four", "five"]);
    let mut session = ChatSession::without_tools(model);

    {
        let mut stream = Box::pin(session.chat_streaming("question", None));
        // Consume a single fragment, then drop the stream
        let first = stream.next().await.unwrap().unwrap();
        assert_eq!(first, "one");
    }

    // The user turn stays; no partial assistant turn was committed
    let history = session.history();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].role, Role::User);
}

#[tokio::test]
async fn test_mid_stream_error_commits_nothing() {
    let model = FragmentModel::failing_after(&["partial "], "connection reset");
    let mut session = ChatSession::without_tools(model);

    let mut saw_error = false;
    {
        let mut stream = Box::pin(session.chat_streaming("question", None));
        while let Some(fragment) = stream.next().await {
            match fragment {
                Ok(_) => {}
                Err(err) => {
                    assert!(matches!(err, Error::Model(_)));
                    saw_error = true;
                    break;
                }
            }
        }
    }

    assert!(saw_error);
    let history = session.history();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].role, Role::User);
}

#[tokio::test]
async fn test_streaming_then_buffered_history_is_shared() {
    let model = FragmentModel::ok(&["streamed reply"]);
    let mut session = ChatSession::without_tools(model);

    {
        let mut stream = Box::pin(session.chat_streaming("first", None));
        while let Some(fragment) = stream.next().await {
            fragment.unwrap();
        }
    }

    // The streamed exchange is visible as ordinary history
    let history = session.history();
    assert_eq!(history.len(), 2);
    assert_eq!(history[1].content.as_deref(), Some("streamed reply"));
}
