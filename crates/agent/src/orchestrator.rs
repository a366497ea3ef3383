//! Per-connection conversation state machine.
//!
//! One orchestrator is owned by exactly one connection task. Each user
//! message drives up to [`crate::MAX_TOOL_ROUNDS`] cycles of model
//! streaming, call detection, tool execution, and result injection; the
//! companion direct-call path skips the model entirely.

use std::sync::Arc;

use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, warn};

use crate::detect::{detect_tool_call, ToolCall};
use crate::engine::Engine;
use crate::events::{AgentEvent, EventSink};
use crate::model::{ChatClient, ChatMessage, Role, TokenSink};
use crate::registry::ToolRegistry;
use crate::MAX_TOOL_ROUNDS;

const DEFAULT_PERSONA: &str =
    "You are Hearth, a helpful local assistant. Be concise and friendly.";

/// Durable mirror of the in-memory turn sequence. Conversational
/// continuity comes from memory, so failures here are logged and
/// swallowed, never surfaced to the round.
pub trait TurnStore: Send + Sync {
    fn save_turn(&self, role: Role, content: &str, metadata: Option<&str>) -> anyhow::Result<()>;
    fn load_recent_turns(&self, limit: usize) -> anyhow::Result<Vec<ChatMessage>>;

    /// Standing facts to fold into the system preamble. Stores with no
    /// fact layer keep the default.
    fn context_facts(&self) -> anyhow::Result<Vec<String>> {
        Ok(Vec::new())
    }
}

/// Phase of the round currently in flight. The loop in
/// [`Orchestrator::handle_user_message`] walks these transitions
/// explicitly so each edge stays observable in tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoundState {
    Idle,
    AwaitingModel,
    DetectingCall,
    ExecutingTool,
    Finalizing,
}

/// Client-initiated capability invocation that bypasses model detection.
#[derive(Debug, Clone, Deserialize)]
pub struct DirectCall {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub arguments: Value,
}

impl DirectCall {
    /// `_silent: true` suppresses the intermediate tool notice in favor of
    /// a single tagged reply.
    fn is_silent(&self) -> bool {
        self.arguments
            .get("_silent")
            .and_then(Value::as_bool)
            .unwrap_or(false)
    }

    fn into_tool_call(self) -> ToolCall {
        let mut arguments = self.arguments;
        if let Some(map) = arguments.as_object_mut() {
            map.remove("_silent");
        }
        ToolCall {
            name: self.name,
            arguments,
        }
    }
}

#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
    /// Leading text of the system preamble, before the tool listing.
    pub persona: String,
    pub max_rounds: usize,
    /// How many stored turns to replay into history on connect.
    pub history_limit: usize,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            persona: DEFAULT_PERSONA.to_string(),
            max_rounds: MAX_TOOL_ROUNDS,
            history_limit: 50,
        }
    }
}

pub struct Orchestrator {
    model: Arc<dyn ChatClient>,
    engine: Engine,
    registry: Arc<ToolRegistry>,
    config: OrchestratorConfig,
    history: Vec<ChatMessage>,
    store: Option<Arc<dyn TurnStore>>,
    state: RoundState,
}

impl Orchestrator {
    pub fn new(
        model: Arc<dyn ChatClient>,
        registry: Arc<ToolRegistry>,
        config: OrchestratorConfig,
    ) -> Self {
        Self {
            model,
            engine: Engine::new(registry.clone()),
            registry,
            config,
            history: Vec::new(),
            store: None,
            state: RoundState::Idle,
        }
    }

    pub fn with_store(mut self, store: Arc<dyn TurnStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Replays recent stored turns into the in-memory history. Failures
    /// leave the history empty; the conversation still works.
    pub fn preload_history(&mut self) {
        let Some(store) = &self.store else {
            return;
        };
        match store.load_recent_turns(self.config.history_limit) {
            Ok(turns) => self.history = turns,
            Err(err) => warn!(%err, "failed to preload conversation history"),
        }
    }

    pub fn history(&self) -> &[ChatMessage] {
        &self.history
    }

    pub fn state(&self) -> RoundState {
        self.state
    }

    /// Renders the system preamble: persona, remembered facts from the
    /// store, the registry enumeration, and the two call syntaxes the
    /// detector accepts. Deterministic for a given registration order.
    pub fn build_system_prompt(&self) -> String {
        let mut prompt = self.config.persona.clone();
        if let Some(store) = &self.store {
            match store.context_facts() {
                Ok(facts) if !facts.is_empty() => {
                    prompt.push_str("\n\nThings you remember about the user:\n");
                    for fact in facts {
                        prompt.push_str(&format!("- {fact}\n"));
                    }
                }
                Ok(_) => {}
                Err(err) => warn!(%err, "failed to load context facts for the preamble"),
            }
        }
        prompt.push_str("\n\nAvailable tools:\n");
        for description in self.registry.descriptions() {
            prompt.push_str(&format!(
                "- {}: {}\n",
                description.name, description.description
            ));
        }
        prompt.push_str(
            "\nTo use a tool, respond with a JSON object like: \
             {\"name\": \"tool_name\", \"arguments\": {\"arg1\": \"value1\"}}\n",
        );
        prompt.push_str("Or use the format: tool_name(arg1=\"value1\", arg2=\"value2\")\n");
        prompt
    }

    /// Drives one user input to completion: stream, detect, execute,
    /// inject, bounded by `max_rounds`. Returns `Err` only when the sink
    /// rejects a message the round cannot proceed without.
    pub async fn handle_user_message(
        &mut self,
        content: &str,
        sink: &mut dyn EventSink,
    ) -> anyhow::Result<()> {
        self.history.push(ChatMessage::user(content));
        self.persist(Role::User, content);

        let system = ChatMessage::system(self.build_system_prompt());

        for round in 0..self.config.max_rounds {
            self.state = RoundState::AwaitingModel;
            let mut messages = Vec::with_capacity(self.history.len() + 1);
            messages.push(system.clone());
            messages.extend(self.history.iter().cloned());

            let mut forward = ForwardChunks { sink: &mut *sink };
            let assistant = match self.model.chat(&messages, &mut forward).await {
                Ok(text) => text,
                Err(err) => {
                    // Partial assistant output is dropped, not persisted.
                    self.state = RoundState::Idle;
                    let _ = sink.emit(AgentEvent::error(format!("Error: {err}"))).await;
                    return Ok(());
                }
            };

            self.state = RoundState::DetectingCall;
            let Some(call) = detect_tool_call(&assistant) else {
                self.state = RoundState::Finalizing;
                self.history.push(ChatMessage::assistant(assistant.clone()));
                self.persist(Role::Assistant, &assistant);
                sink.emit(AgentEvent::Assistant { content: assistant }).await?;
                self.state = RoundState::Idle;
                return Ok(());
            };

            self.state = RoundState::ExecutingTool;
            debug!(tool = %call.name, round, "detected tool call");
            let result = match self.engine.execute(&call).await {
                Ok(value) => value,
                Err(err) => {
                    self.state = RoundState::Idle;
                    let _ = sink
                        .emit(AgentEvent::error(format!("Tool error: {err}")))
                        .await;
                    return Ok(());
                }
            };

            let rendered = Engine::format_result(&call.name, &result);
            self.history.push(ChatMessage::assistant(assistant.clone()));
            self.persist(Role::Assistant, &assistant);
            self.history.push(ChatMessage::tool(rendered.clone()));
            self.persist(Role::Tool, &rendered);

            sink.emit(AgentEvent::Tool {
                content: format!("Tool {} executed: {}", call.name, rendered),
            })
            .await?;
        }

        // Soft timeout: the client gets no terminal message for this input.
        self.state = RoundState::Idle;
        warn!(
            max_rounds = self.config.max_rounds,
            "maximum tool rounds reached without a final answer"
        );
        Ok(())
    }

    /// Executes a client-supplied call without model involvement.
    pub async fn handle_direct_call(
        &mut self,
        call: DirectCall,
        sink: &mut dyn EventSink,
    ) -> anyhow::Result<()> {
        let id = call.id.clone();
        let silent = call.is_silent();
        let tool_call = call.into_tool_call();

        self.state = RoundState::ExecutingTool;
        let outcome = self.engine.execute(&tool_call).await;
        self.state = RoundState::Idle;

        match outcome {
            Ok(value) => {
                let rendered = Engine::format_result(&tool_call.name, &value);
                if !silent {
                    sink.emit(AgentEvent::Tool {
                        content: format!("Tool {} executed: {}", tool_call.name, rendered),
                    })
                    .await?;
                }
                sink.emit(AgentEvent::Reply {
                    id,
                    content: rendered,
                })
                .await?;
            }
            Err(err) => {
                sink.emit(AgentEvent::Error {
                    content: format!("Tool error: {err}"),
                    id: Some(id),
                })
                .await?;
            }
        }
        Ok(())
    }

    fn persist(&self, role: Role, content: &str) {
        let Some(store) = &self.store else {
            return;
        };
        if let Err(err) = store.save_turn(role, content, None) {
            warn!(%err, role = role.as_str(), "failed to persist turn; continuing from memory");
        }
    }
}

/// Adapter wrapping the connection sink so model fragments surface as
/// chunk events while streaming.
struct ForwardChunks<'a> {
    sink: &'a mut dyn EventSink,
}

#[async_trait::async_trait]
impl TokenSink for ForwardChunks<'_> {
    async fn token(&mut self, text: &str) -> anyhow::Result<()> {
        self.sink
            .emit(AgentEvent::Chunk {
                content: text.to_string(),
            })
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ChatError;
    use crate::tool::{Tool, ToolDescription, ToolError, ToolResult};
    use async_trait::async_trait;
    use serde_json::json;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::sync::Mutex as TokioMutex;

    struct ScriptedModel {
        responses: TokioMutex<VecDeque<String>>,
        repeat_last: bool,
    }

    impl ScriptedModel {
        fn new(responses: Vec<&str>) -> Arc<Self> {
            Arc::new(Self {
                responses: TokioMutex::new(responses.into_iter().map(String::from).collect()),
                repeat_last: false,
            })
        }

        /// Keeps replaying the final response once the script runs out,
        /// for exercising the round limit.
        fn looping(responses: Vec<&str>) -> Arc<Self> {
            Arc::new(Self {
                responses: TokioMutex::new(responses.into_iter().map(String::from).collect()),
                repeat_last: true,
            })
        }
    }

    #[async_trait]
    impl ChatClient for ScriptedModel {
        async fn chat(
            &self,
            _messages: &[ChatMessage],
            sink: &mut dyn TokenSink,
        ) -> Result<String, ChatError> {
            let mut guard = self.responses.lock().await;
            let next = if self.repeat_last && guard.len() == 1 {
                guard.front().cloned()
            } else {
                guard.pop_front()
            }
            .expect("scripted model ran out of responses");
            drop(guard);

            // Stream in two fragments to exercise accumulation.
            let mid = next.len() / 2;
            let (head, tail) = next.split_at(mid);
            for fragment in [head, tail] {
                if !fragment.is_empty() {
                    sink.token(fragment)
                        .await
                        .map_err(|_| ChatError::SinkClosed)?;
                }
            }
            Ok(next)
        }
    }

    struct FailingModel;

    #[async_trait]
    impl ChatClient for FailingModel {
        async fn chat(
            &self,
            _messages: &[ChatMessage],
            _sink: &mut dyn TokenSink,
        ) -> Result<String, ChatError> {
            Err(ChatError::Transport("connection refused".into()))
        }
    }

    #[derive(Default)]
    struct RecordingSink {
        events: Vec<AgentEvent>,
    }

    #[async_trait]
    impl EventSink for RecordingSink {
        async fn emit(&mut self, event: AgentEvent) -> anyhow::Result<()> {
            self.events.push(event);
            Ok(())
        }
    }

    struct StaticTool {
        description: ToolDescription,
        content: Value,
        invocations: AtomicUsize,
    }

    impl StaticTool {
        fn new(name: &str, content: Value) -> Arc<Self> {
            Arc::new(Self {
                description: ToolDescription::new(name, "test tool", json!({"type": "object"})),
                content,
                invocations: AtomicUsize::new(0),
            })
        }
    }

    #[async_trait]
    impl Tool for StaticTool {
        fn description(&self) -> &ToolDescription {
            &self.description
        }

        async fn invoke(&self, _args: Value) -> Result<ToolResult, ToolError> {
            self.invocations.fetch_add(1, Ordering::SeqCst);
            Ok(ToolResult::new(self.content.clone()))
        }
    }

    struct RejectingTool {
        description: ToolDescription,
    }

    impl RejectingTool {
        fn new(name: &str) -> Arc<Self> {
            Arc::new(Self {
                description: ToolDescription::new(name, "always refuses", json!({})),
            })
        }
    }

    #[async_trait]
    impl Tool for RejectingTool {
        fn description(&self) -> &ToolDescription {
            &self.description
        }

        async fn invoke(&self, _args: Value) -> Result<ToolResult, ToolError> {
            Err(ToolError::NotAllowed("/etc".into()))
        }
    }

    fn registry_with(tools: Vec<Arc<dyn Tool>>) -> Arc<ToolRegistry> {
        let mut registry = ToolRegistry::new();
        for tool in tools {
            registry.register(tool);
        }
        Arc::new(registry)
    }

    fn chunks_joined(events: &[AgentEvent]) -> String {
        events
            .iter()
            .filter_map(|event| match event {
                AgentEvent::Chunk { content } => Some(content.as_str()),
                _ => None,
            })
            .collect()
    }

    #[tokio::test]
    async fn plain_answer_finalizes_without_tools() {
        let model = ScriptedModel::new(vec!["Hello there, how can I help?"]);
        let mut orchestrator =
            Orchestrator::new(model, registry_with(vec![]), OrchestratorConfig::default());
        let mut sink = RecordingSink::default();

        orchestrator
            .handle_user_message("hi", &mut sink)
            .await
            .unwrap();

        assert_eq!(
            sink.events.last(),
            Some(&AgentEvent::Assistant {
                content: "Hello there, how can I help?".into()
            })
        );
        assert_eq!(chunks_joined(&sink.events), "Hello there, how can I help?");
        assert_eq!(orchestrator.history().len(), 2);
        assert_eq!(orchestrator.state(), RoundState::Idle);
    }

    #[tokio::test]
    async fn tool_round_injects_result_and_finishes_on_second_round() {
        let listing = StaticTool::new(
            "list_directory",
            json!([{"name": "README.md", "is_dir": false}]),
        );
        let model = ScriptedModel::new(vec![
            r#"{"name":"list_directory","arguments":{"path":"./docs"}}"#,
            "The docs directory contains README.md.",
        ]);
        let mut orchestrator = Orchestrator::new(
            model,
            registry_with(vec![listing.clone()]),
            OrchestratorConfig::default(),
        );
        let mut sink = RecordingSink::default();

        orchestrator
            .handle_user_message("list files in ./docs", &mut sink)
            .await
            .unwrap();

        assert_eq!(listing.invocations.load(Ordering::SeqCst), 1);

        let tool_events: Vec<_> = sink
            .events
            .iter()
            .filter(|event| matches!(event, AgentEvent::Tool { .. }))
            .collect();
        assert_eq!(tool_events.len(), 1);

        assert_eq!(
            sink.events.last(),
            Some(&AgentEvent::Assistant {
                content: "The docs directory contains README.md.".into()
            })
        );

        // user, call-bearing assistant, tool result, final assistant
        let roles: Vec<Role> = orchestrator.history().iter().map(|turn| turn.role).collect();
        assert_eq!(
            roles,
            vec![Role::User, Role::Assistant, Role::Tool, Role::Assistant]
        );
        assert!(orchestrator.history()[2]
            .content
            .starts_with("Tool list_directory result:"));
    }

    #[tokio::test]
    async fn round_limit_stops_after_five_executions() {
        let echo = StaticTool::new("echo", json!("again"));
        let model = ScriptedModel::looping(vec![r#"{"name":"echo","arguments":{}}"#]);
        let mut orchestrator = Orchestrator::new(
            model,
            registry_with(vec![echo.clone()]),
            OrchestratorConfig::default(),
        );
        let mut sink = RecordingSink::default();

        orchestrator
            .handle_user_message("loop forever", &mut sink)
            .await
            .unwrap();

        assert_eq!(echo.invocations.load(Ordering::SeqCst), MAX_TOOL_ROUNDS);
        let tool_events = sink
            .events
            .iter()
            .filter(|event| matches!(event, AgentEvent::Tool { .. }))
            .count();
        assert_eq!(tool_events, MAX_TOOL_ROUNDS);

        // Soft timeout: no terminal assistant message and no error.
        assert!(!sink
            .events
            .iter()
            .any(|event| matches!(event, AgentEvent::Assistant { .. } | AgentEvent::Error { .. })));
    }

    #[tokio::test]
    async fn sandbox_rejection_surfaces_single_error_and_ends_round() {
        let model = ScriptedModel::new(vec![
            r#"{"name":"list_directory","arguments":{"path":"/etc"}}"#,
        ]);
        let mut orchestrator = Orchestrator::new(
            model,
            registry_with(vec![RejectingTool::new("list_directory")]),
            OrchestratorConfig::default(),
        );
        let mut sink = RecordingSink::default();

        orchestrator
            .handle_user_message("list files in /etc", &mut sink)
            .await
            .unwrap();

        let errors: Vec<_> = sink
            .events
            .iter()
            .filter_map(|event| match event {
                AgentEvent::Error { content, .. } => Some(content.clone()),
                _ => None,
            })
            .collect();
        assert_eq!(errors.len(), 1);
        assert!(errors[0].contains("not in allowed directories"));
        assert!(!sink
            .events
            .iter()
            .any(|event| matches!(event, AgentEvent::Tool { .. })));
    }

    #[tokio::test]
    async fn unknown_tool_is_reported_by_name() {
        let model = ScriptedModel::new(vec![r#"{"name":"ghost","arguments":{}}"#]);
        let mut orchestrator =
            Orchestrator::new(model, registry_with(vec![]), OrchestratorConfig::default());
        let mut sink = RecordingSink::default();

        orchestrator
            .handle_user_message("call something", &mut sink)
            .await
            .unwrap();

        assert!(sink.events.iter().any(|event| matches!(
            event,
            AgentEvent::Error { content, .. } if content.contains("'ghost' not found")
        )));
    }

    #[tokio::test]
    async fn transport_failure_aborts_round_with_error_event() {
        let mut orchestrator = Orchestrator::new(
            Arc::new(FailingModel),
            registry_with(vec![]),
            OrchestratorConfig::default(),
        );
        let mut sink = RecordingSink::default();

        orchestrator
            .handle_user_message("hi", &mut sink)
            .await
            .unwrap();

        assert_eq!(sink.events.len(), 1);
        assert!(matches!(&sink.events[0], AgentEvent::Error { content, .. }
            if content.contains("connection refused")));

        // The failed round leaves only the user turn behind.
        assert_eq!(orchestrator.history().len(), 1);
    }

    #[tokio::test]
    async fn direct_silent_call_emits_exactly_one_tagged_reply() {
        let lister = StaticTool::new("allowed_dirs_list", json!({"allowed": ["/home/demo"]}));
        let model = ScriptedModel::new(vec![]);
        let mut orchestrator = Orchestrator::new(
            model,
            registry_with(vec![lister]),
            OrchestratorConfig::default(),
        );
        let mut sink = RecordingSink::default();

        let call = DirectCall {
            id: "abc".into(),
            name: "allowed_dirs_list".into(),
            arguments: json!({"_silent": true}),
        };
        orchestrator.handle_direct_call(call, &mut sink).await.unwrap();

        assert_eq!(sink.events.len(), 1);
        match &sink.events[0] {
            AgentEvent::Reply { id, content } => {
                assert_eq!(id, "abc");
                assert!(content.contains("/home/demo"));
            }
            other => panic!("expected tagged reply, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn direct_call_without_silent_flag_also_notifies() {
        let lister = StaticTool::new("allowed_dirs_list", json!({"allowed": []}));
        let model = ScriptedModel::new(vec![]);
        let mut orchestrator = Orchestrator::new(
            model,
            registry_with(vec![lister]),
            OrchestratorConfig::default(),
        );
        let mut sink = RecordingSink::default();

        let call = DirectCall {
            id: "xyz".into(),
            name: "allowed_dirs_list".into(),
            arguments: json!({}),
        };
        orchestrator.handle_direct_call(call, &mut sink).await.unwrap();

        assert_eq!(sink.events.len(), 2);
        assert!(matches!(sink.events[0], AgentEvent::Tool { .. }));
        assert!(matches!(&sink.events[1], AgentEvent::Reply { id, .. } if id == "xyz"));
    }

    #[tokio::test]
    async fn direct_call_error_is_tagged_with_request_id() {
        let model = ScriptedModel::new(vec![]);
        let mut orchestrator =
            Orchestrator::new(model, registry_with(vec![]), OrchestratorConfig::default());
        let mut sink = RecordingSink::default();

        let call = DirectCall {
            id: "req-1".into(),
            name: "missing".into(),
            arguments: json!({}),
        };
        orchestrator.handle_direct_call(call, &mut sink).await.unwrap();

        assert_eq!(sink.events.len(), 1);
        assert!(matches!(&sink.events[0], AgentEvent::Error { id: Some(id), .. }
            if id == "req-1"));
    }

    struct FailingStore;

    impl TurnStore for FailingStore {
        fn save_turn(
            &self,
            _role: Role,
            _content: &str,
            _metadata: Option<&str>,
        ) -> anyhow::Result<()> {
            anyhow::bail!("disk full")
        }

        fn load_recent_turns(&self, _limit: usize) -> anyhow::Result<Vec<ChatMessage>> {
            anyhow::bail!("disk full")
        }

        fn context_facts(&self) -> anyhow::Result<Vec<String>> {
            anyhow::bail!("disk full")
        }
    }

    #[tokio::test]
    async fn persistence_failure_never_interrupts_the_round() {
        let model = ScriptedModel::new(vec!["All good."]);
        let mut orchestrator =
            Orchestrator::new(model, registry_with(vec![]), OrchestratorConfig::default())
                .with_store(Arc::new(FailingStore));
        orchestrator.preload_history();
        let mut sink = RecordingSink::default();

        orchestrator
            .handle_user_message("hi", &mut sink)
            .await
            .unwrap();

        assert_eq!(
            sink.events.last(),
            Some(&AgentEvent::Assistant {
                content: "All good.".into()
            })
        );
    }

    struct FactStore {
        facts: Vec<String>,
    }

    impl TurnStore for FactStore {
        fn save_turn(
            &self,
            _role: Role,
            _content: &str,
            _metadata: Option<&str>,
        ) -> anyhow::Result<()> {
            Ok(())
        }

        fn load_recent_turns(&self, _limit: usize) -> anyhow::Result<Vec<ChatMessage>> {
            Ok(Vec::new())
        }

        fn context_facts(&self) -> anyhow::Result<Vec<String>> {
            Ok(self.facts.clone())
        }
    }

    #[test]
    fn system_prompt_includes_remembered_facts() {
        let model = ScriptedModel::new(vec![]);
        let store = Arc::new(FactStore {
            facts: vec!["favorite_color: blue".into(), "timezone: UTC+2".into()],
        });
        let orchestrator =
            Orchestrator::new(model, registry_with(vec![]), OrchestratorConfig::default())
                .with_store(store);

        let prompt = orchestrator.build_system_prompt();
        assert!(prompt.contains("Things you remember about the user:"));
        assert!(prompt.contains("- favorite_color: blue"));
        assert!(prompt.contains("- timezone: UTC+2"));
    }

    #[test]
    fn system_prompt_omits_fact_section_when_store_is_empty() {
        let model = ScriptedModel::new(vec![]);
        let orchestrator =
            Orchestrator::new(model, registry_with(vec![]), OrchestratorConfig::default())
                .with_store(Arc::new(FactStore { facts: Vec::new() }));

        let prompt = orchestrator.build_system_prompt();
        assert!(!prompt.contains("Things you remember"));
    }

    #[test]
    fn system_prompt_lists_tools_and_call_syntaxes() {
        let lister = StaticTool::new("list_directory", json!([]));
        let model = ScriptedModel::new(vec![]);
        let orchestrator = Orchestrator::new(
            model,
            registry_with(vec![lister]),
            OrchestratorConfig::default(),
        );

        let prompt = orchestrator.build_system_prompt();
        assert!(prompt.contains("- list_directory: test tool"));
        assert!(prompt.contains(r#"{"name": "tool_name", "arguments""#));
        assert!(prompt.contains(r#"tool_name(arg1="value1""#));
    }
}
