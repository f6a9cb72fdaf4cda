//! Orchestration loop integration tests
//!
//! Tests for the buffered chat cycle including:
//! - Direct answers and history growth
//! - Tool-call rounds, ordering, and result correlation
//! - Error recovery for failing and unknown tools
//! - Iteration budget exhaustion
//! - Session reset and the session store

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::{json, Value};

use dbchat_core::{
    AssistantTurn, ChatOutcome, ChatSession, Error, ModelClient, Result, Role, SessionStore,
    TextStream, ToolCallRequest, ToolError, ToolProvider, ToolSignature, Turn,
    BUDGET_EXHAUSTED_MESSAGE, TOOL_ERROR_PREFIX,
};

/// Model that replays a fixed script of assistant turns
struct ScriptedModel {
    script: Mutex<VecDeque<AssistantTurn>>,
    /// Transcript snapshots captured at each request
    requests: Mutex<Vec<Vec<Turn>>>,
}

impl ScriptedModel {
    fn new(script: Vec<AssistantTurn>) -> Arc<Self> {
        Arc::new(Self {
            script: Mutex::new(script.into()),
            requests: Mutex::new(Vec::new()),
        })
    }

    fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    fn request(&self, index: usize) -> Vec<Turn> {
        self.requests.lock().unwrap()[index].clone()
    }
}

#[async_trait]
impl ModelClient for ScriptedModel {
    async fn complete(&self, turns: &[Turn], _tools: &[ToolSignature]) -> Result<AssistantTurn> {
        self.requests.lock().unwrap().push(turns.to_vec());
        self.script
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| Error::Model("script exhausted".to_string()))
    }

    async fn complete_stream(&self, _turns: &[Turn]) -> Result<TextStream> {
        Err(Error::Model("not scripted for streaming".to_string()))
    }
}

/// Model that always fails as unreachable
struct UnreachableModel;

#[async_trait]
impl ModelClient for UnreachableModel {
    async fn complete(&self, _turns: &[Turn], _tools: &[ToolSignature]) -> Result<AssistantTurn> {
        Err(Error::ProviderUnavailable("connection refused".to_string()))
    }

    async fn complete_stream(&self, _turns: &[Turn]) -> Result<TextStream> {
        Err(Error::ProviderUnavailable("connection refused".to_string()))
    }
}

/// Tool provider with a fixed signature list and scripted call results
struct ScriptedTools {
    signatures: Vec<ToolSignature>,
    results: Mutex<VecDeque<std::result::Result<String, ToolError>>>,
    calls: Mutex<Vec<(String, Value)>>,
}

impl ScriptedTools {
    fn new(
        signatures: Vec<ToolSignature>,
        results: Vec<std::result::Result<String, ToolError>>,
    ) -> Arc<Self> {
        Arc::new(Self {
            signatures,
            results: Mutex::new(results.into()),
            calls: Mutex::new(Vec::new()),
        })
    }

    fn calls(&self) -> Vec<(String, Value)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl ToolProvider for ScriptedTools {
    async fn list_tools(&self) -> Result<Vec<ToolSignature>> {
        Ok(self.signatures.clone())
    }

    async fn call_tool(
        &self,
        name: &str,
        arguments: Value,
    ) -> std::result::Result<String, ToolError> {
        self.calls
            .lock()
            .unwrap()
            .push((name.to_string(), arguments));
        self.results
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(ToolError::NotFound(name.to_string())))
    }
}

/// Provider that cannot be reached for discovery
struct DownTools;

#[async_trait]
impl ToolProvider for DownTools {
    async fn list_tools(&self) -> Result<Vec<ToolSignature>> {
        Err(Error::ProviderUnavailable("server offline".to_string()))
    }

    async fn call_tool(
        &self,
        _name: &str,
        _arguments: Value,
    ) -> std::result::Result<String, ToolError> {
        Err(ToolError::Execution("server offline".to_string()))
    }
}

fn query_signature() -> ToolSignature {
    ToolSignature {
        name: "execute_select_query".to_string(),
        description: "Run a read-only SQL query".to_string(),
        parameters: json!({
            "type": "object",
            "properties": { "query": { "type": "string" } },
            "required": ["query"]
        }),
    }
}

fn answer(text: &str) -> AssistantTurn {
    AssistantTurn {
        content: Some(text.to_string()),
        tool_calls: Vec::new(),
    }
}

fn tool_call_turn(calls: Vec<(&str, &str, &str)>) -> AssistantTurn {
    AssistantTurn {
        content: None,
        tool_calls: calls
            .into_iter()
            .map(|(id, name, args)| ToolCallRequest {
                id: id.to_string(),
                name: name.to_string(),
                arguments: args.to_string(),
            })
            .collect(),
    }
}

mod chat_tests {
    use super::*;

    #[tokio::test]
    async fn test_direct_answer_grows_history_by_two() {
        let model = ScriptedModel::new(vec![answer("MySQL stores rows in tables.")]);
        let tools = ScriptedTools::new(vec![query_signature()], vec![]);
        let mut session = ChatSession::connect(model.clone(), tools).await.unwrap();

        let outcome = session.chat("What is a table?", None).await.unwrap();

        assert_eq!(
            outcome,
            ChatOutcome::Answered("MySQL stores rows in tables.".to_string())
        );
        let history = session.history();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].role, Role::User);
        assert_eq!(history[1].role, Role::Assistant);
        assert_eq!(model.request_count(), 1);
    }

    #[tokio::test]
    async fn test_system_prompt_seeded_on_first_turn_only() {
        let model = ScriptedModel::new(vec![answer("one"), answer("two")]);
        let tools = ScriptedTools::new(vec![], vec![]);
        let mut session = ChatSession::connect(model, tools).await.unwrap();

        session.chat("hi", Some("You are terse.")).await.unwrap();
        session.chat("again", Some("You are terse.")).await.unwrap();

        let history = session.history();
        let system_turns = history.iter().filter(|t| t.role == Role::System).count();
        assert_eq!(system_turns, 1);
        assert_eq!(history[0].role, Role::System);
        assert_eq!(history.len(), 5);
    }

    #[tokio::test]
    async fn test_tool_round_appends_ordered_results() {
        let model = ScriptedModel::new(vec![
            tool_call_turn(vec![
                ("call_1", "execute_select_query", r#"{"query":"SELECT 1"}"#),
                ("call_2", "execute_select_query", r#"{"query":"SELECT 2"}"#),
            ]),
            answer("Both queries ran."),
        ]);
        let tools = ScriptedTools::new(
            vec![query_signature()],
            vec![Ok("1".to_string()), Ok("2".to_string())],
        );
        let mut session = ChatSession::connect(model.clone(), tools.clone())
            .await
            .unwrap();

        let outcome = session.chat("run both", None).await.unwrap();
        assert_eq!(outcome, ChatOutcome::Answered("Both queries ran.".to_string()));

        // user, assistant(calls), tool, tool, assistant(answer)
        let history = session.history();
        assert_eq!(history.len(), 5);
        assert_eq!(history[1].role, Role::Assistant);
        assert_eq!(history[2].role, Role::Tool);
        assert_eq!(history[2].tool_call_id.as_deref(), Some("call_1"));
        assert_eq!(history[2].content.as_deref(), Some("1"));
        assert_eq!(history[3].tool_call_id.as_deref(), Some("call_2"));
        assert_eq!(history[3].content.as_deref(), Some("2"));

        // Arguments arrive decoded as JSON objects, in request order
        let calls = tools.calls();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0].1, json!({"query": "SELECT 1"}));
        assert_eq!(calls[1].1, json!({"query": "SELECT 2"}));

        // The second request must include the tool results
        let second = model.request(1);
        assert!(second.iter().any(|t| t.role == Role::Tool));
    }

    #[tokio::test]
    async fn test_failing_tool_recovered_as_error_text() {
        let model = ScriptedModel::new(vec![
            tool_call_turn(vec![(
                "call_9",
                "execute_select_query",
                r#"{"query":"SELECT * FROM Missing"}"#,
            )]),
            answer("That table does not exist."),
        ]);
        let tools = ScriptedTools::new(
            vec![query_signature()],
            vec![Err(ToolError::Execution(
                "Table 'Missing' doesn't exist".to_string(),
            ))],
        );
        let mut session = ChatSession::connect(model, tools).await.unwrap();

        let outcome = session.chat("query missing", None).await.unwrap();
        assert!(outcome.is_answered());

        let history = session.history();
        let tool_turn = history.iter().find(|t| t.role == Role::Tool).unwrap();
        let text = tool_turn.content.as_deref().unwrap();
        assert!(text.starts_with(TOOL_ERROR_PREFIX));
        assert!(text.contains("execute_select_query"));
        assert!(text.contains("Table 'Missing' doesn't exist"));
    }

    #[tokio::test]
    async fn test_malformed_arguments_never_reach_provider() {
        let model = ScriptedModel::new(vec![
            tool_call_turn(vec![("call_3", "execute_select_query", "{not json")]),
            answer("done"),
        ]);
        let tools = ScriptedTools::new(vec![query_signature()], vec![]);
        let mut session = ChatSession::connect(model, tools.clone()).await.unwrap();

        let outcome = session.chat("go", None).await.unwrap();
        assert!(outcome.is_answered());
        assert!(tools.calls().is_empty());

        let history = session.history();
        let tool_turn = history.iter().find(|t| t.role == Role::Tool).unwrap();
        assert!(tool_turn
            .content
            .as_deref()
            .unwrap()
            .starts_with(TOOL_ERROR_PREFIX));
    }

    #[tokio::test]
    async fn test_budget_exhaustion_is_soft_terminal() {
        // The model asks for a tool on every round; a budget of one means a
        // single request/act cycle, then the tagged outcome.
        let model = ScriptedModel::new(vec![tool_call_turn(vec![(
            "call_1",
            "execute_select_query",
            r#"{"query":"SELECT 1"}"#,
        )])]);
        let tools = ScriptedTools::new(vec![query_signature()], vec![Ok("1".to_string())]);
        let mut session = ChatSession::connect(model.clone(), tools).await.unwrap();

        let outcome = session.chat_with_budget("loop", None, 1).await.unwrap();
        assert_eq!(outcome, ChatOutcome::BudgetExhausted);
        assert_eq!(outcome.into_text(), BUDGET_EXHAUSTED_MESSAGE);
        assert_eq!(model.request_count(), 1);

        // The partial work stays in history for the next turn
        let history = session.history();
        assert_eq!(history.last().unwrap().role, Role::Tool);
    }

    #[tokio::test]
    async fn test_provider_unavailable_propagates() {
        let tools = ScriptedTools::new(vec![], vec![]);
        let mut session = ChatSession::connect(Arc::new(UnreachableModel), tools)
            .await
            .unwrap();

        let err = session.chat("hello", None).await.unwrap_err();
        assert!(matches!(err, Error::ProviderUnavailable(_)));

        // The user turn was already committed before the request failed
        let history = session.history();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].role, Role::User);
    }

    #[tokio::test]
    async fn test_unreachable_tool_provider_fails_connect() {
        let err = ChatSession::connect(ScriptedModel::new(vec![]), Arc::new(DownTools))
            .await
            .err()
            .unwrap();
        assert!(matches!(err, Error::ProviderUnavailable(_)));
    }

    #[tokio::test]
    async fn test_reset_clears_history() {
        let model = ScriptedModel::new(vec![answer("hi")]);
        let tools = ScriptedTools::new(vec![], vec![]);
        let mut session = ChatSession::connect(model, tools).await.unwrap();

        session.chat("hello", Some("system")).await.unwrap();
        assert!(!session.history().is_empty());

        session.reset();
        assert!(session.history().is_empty());

        session.reset_with_system("fresh prompt");
        let history = session.history();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].role, Role::System);
        assert_eq!(history[0].content.as_deref(), Some("fresh prompt"));
    }

    #[tokio::test]
    async fn test_version_query_end_to_end() {
        let model = ScriptedModel::new(vec![
            tool_call_turn(vec![(
                "call_v",
                "execute_select_query",
                r#"{"query":"SELECT VERSION()"}"#,
            )]),
            answer("The database is running MySQL 8.0.36."),
        ]);
        let tools = ScriptedTools::new(
            vec![query_signature()],
            vec![Ok("8.0.36".to_string())],
        );
        let mut session = ChatSession::connect(model, tools.clone()).await.unwrap();

        let outcome = session
            .chat("What database version is running?", None)
            .await
            .unwrap();

        assert_eq!(
            outcome.into_text(),
            "The database is running MySQL 8.0.36."
        );
        let calls = tools.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].0, "execute_select_query");
        assert_eq!(calls[0].1, json!({"query": "SELECT VERSION()"}));
    }
}

mod store_tests {
    use super::*;

    async fn session() -> ChatSession {
        let model = ScriptedModel::new(vec![answer("ok")]);
        let tools = ScriptedTools::new(vec![], vec![]);
        ChatSession::connect(model, tools).await.unwrap()
    }

    #[tokio::test]
    async fn test_create_and_get() {
        let store = SessionStore::new();
        let id = store.create(session().await).await;
        assert_eq!(store.count().await, 1);

        let handle = store.get(&id).await.unwrap();
        let outcome = handle.lock().await.chat("ping", None).await.unwrap();
        assert_eq!(outcome, ChatOutcome::Answered("ok".to_string()));
    }

    #[tokio::test]
    async fn test_get_unknown_id() {
        let store = SessionStore::new();
        assert!(store.get("nonexistent").await.is_none());
    }

    #[tokio::test]
    async fn test_remove() {
        let store = SessionStore::new();
        let id = store.create(session().await).await;
        assert!(store.remove(&id).await);
        assert!(!store.remove(&id).await);
        assert_eq!(store.count().await, 0);
    }

    #[tokio::test]
    async fn test_list_distinct_ids() {
        let store = SessionStore::new();
        let a = store.create(session().await).await;
        let b = store.create(session().await).await;
        assert_ne!(a, b);

        let infos = store.list().await;
        assert_eq!(infos.len(), 2);
        assert!(infos.iter().any(|info| info.id == a));
        assert!(infos.iter().any(|info| info.id == b));
    }
}
