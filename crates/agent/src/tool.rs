use async_trait::async_trait;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolDescription {
    pub name: String,
    pub description: String,
    #[serde(default)]
    pub input_schema: Value,
    #[serde(default)]
    pub metadata: IndexMap<String, Value>,
}

impl ToolDescription {
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        input_schema: Value,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            input_schema,
            metadata: IndexMap::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolResult {
    pub content: Value,
    #[serde(default)]
    pub metadata: IndexMap<String, Value>,
}

impl ToolResult {
    pub fn new(content: Value) -> Self {
        Self {
            content,
            metadata: IndexMap::default(),
        }
    }
}

#[derive(Debug, Error)]
pub enum ToolError {
    #[error("tool invocation failed: {0}")]
    Invocation(String),
    #[error("tool rejected input: {0}")]
    InvalidInput(String),
    /// The message reveals nothing about the target beyond its absence
    /// from the allow-list.
    #[error("path '{0}' is not in allowed directories")]
    NotAllowed(String),
}

/// A named unit of work exposed to the model. Implementations must be
/// safely invocable from concurrent connections.
#[async_trait]
pub trait Tool: Send + Sync {
    fn description(&self) -> &ToolDescription;
    async fn invoke(&self, args: Value) -> Result<ToolResult, ToolError>;
}
