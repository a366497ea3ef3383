use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Role tag for one turn of conversation history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
    /// Synthetic turn carrying a rendered tool result.
    Tool,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::System => "system",
            Self::User => "user",
            Self::Assistant => "assistant",
            Self::Tool => "tool",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "system" => Some(Self::System),
            "user" => Some(Self::User),
            "assistant" => Some(Self::Assistant),
            "tool" => Some(Self::Tool),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::new(Role::System, content)
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }

    pub fn tool(content: impl Into<String>) -> Self {
        Self::new(Role::Tool, content)
    }
}

#[derive(Debug, Error)]
pub enum ChatError {
    #[error("inference request failed: {0}")]
    Transport(String),
    #[error("inference service returned an error: {0}")]
    Service(String),
    #[error("client connection lost while streaming")]
    SinkClosed,
}

/// Receives text fragments as the inference service produces them.
/// Returning an error aborts the stream; the caller discards any partial
/// output rather than persisting it.
#[async_trait]
pub trait TokenSink: Send {
    async fn token(&mut self, text: &str) -> anyhow::Result<()>;
}

/// Streaming inference client. One call per completion: the full message
/// history goes in, fragments come back through the sink, and the
/// accumulated text is returned once the stream finishes.
#[async_trait]
pub trait ChatClient: Send + Sync {
    async fn chat(
        &self,
        messages: &[ChatMessage],
        sink: &mut dyn TokenSink,
    ) -> Result<String, ChatError>;
}
