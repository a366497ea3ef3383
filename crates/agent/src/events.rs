use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Structured messages delivered to the client. Failures ride the same
/// channel as normal output instead of closing the transport.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AgentEvent {
    /// Incremental fragment of an in-flight completion.
    Chunk { content: String },
    /// Terminal answer for the current user input.
    Assistant { content: String },
    /// Intermediate notice that a tool ran and its result was injected.
    Tool { content: String },
    /// Terminal failure for the current round.
    Error {
        content: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        id: Option<String>,
    },
    /// Tagged response to a direct call.
    Reply { id: String, content: String },
}

impl AgentEvent {
    pub fn error(content: impl Into<String>) -> Self {
        Self::Error {
            content: content.into(),
            id: None,
        }
    }
}

/// Transport-facing half of a connection. Implemented over the WebSocket
/// writer in production and by recording sinks in tests.
#[async_trait]
pub trait EventSink: Send {
    async fn emit(&mut self, event: AgentEvent) -> anyhow::Result<()>;
}
