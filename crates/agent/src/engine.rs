use std::sync::Arc;

use serde_json::Value;
use thiserror::Error;
use tracing::{error, info};

use crate::detect::ToolCall;
use crate::registry::ToolRegistry;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("tool '{name}' not found")]
    NotFound { name: String },
    #[error("tool execution failed: {cause}")]
    Failed { name: String, cause: String },
}

/// Resolves detected calls against the registry and normalizes outcomes.
/// The engine itself performs no I/O; side effects live in the tools.
pub struct Engine {
    registry: Arc<ToolRegistry>,
}

impl Engine {
    pub fn new(registry: Arc<ToolRegistry>) -> Self {
        Self { registry }
    }

    pub async fn execute(&self, call: &ToolCall) -> Result<Value, EngineError> {
        let Some(tool) = self.registry.get(&call.name) else {
            error!(tool = %call.name, "tool call references unknown tool");
            return Err(EngineError::NotFound {
                name: call.name.clone(),
            });
        };

        let arg_keys: Vec<&str> = call
            .arguments
            .as_object()
            .map(|map| map.keys().map(String::as_str).collect())
            .unwrap_or_default();
        info!(tool = %call.name, args = ?arg_keys, "executing tool call");

        match tool.invoke(call.arguments.clone()).await {
            Ok(result) => {
                info!(tool = %call.name, "tool call completed");
                Ok(result.content)
            }
            Err(err) => {
                error!(tool = %call.name, %err, "tool call failed");
                Err(EngineError::Failed {
                    name: call.name.clone(),
                    cause: err.to_string(),
                })
            }
        }
    }

    /// Renders a tool result as the text injected back into the
    /// conversation as a synthetic turn.
    pub fn format_result(name: &str, result: &Value) -> String {
        match serde_json::to_string(result) {
            Ok(json) => format!("Tool {name} result: {json}"),
            Err(_) => format!("Tool {name} returned a result that could not be serialized"),
        }
    }
}
