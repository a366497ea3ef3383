//! Core conversation-loop primitives for the Hearth assistant backend.
//! The crate owns the tool abstraction and registry, the detector that
//! recovers structured tool calls from free-form model output, the
//! execution engine, and the per-connection orchestrator that interleaves
//! model streaming with tool execution and result injection.

pub mod detect;
pub mod engine;
pub mod events;
pub mod model;
pub mod orchestrator;
pub mod registry;
pub mod tool;

pub use detect::{detect_tool_call, ToolCall};
pub use engine::{Engine, EngineError};
pub use events::{AgentEvent, EventSink};
pub use model::{ChatClient, ChatError, ChatMessage, Role, TokenSink};
pub use orchestrator::{
    DirectCall, Orchestrator, OrchestratorConfig, RoundState, TurnStore,
};
pub use registry::ToolRegistry;
pub use tool::{Tool, ToolDescription, ToolError, ToolResult};

/// Maximum number of model -> tool cycles per user message.
pub const MAX_TOOL_ROUNDS: usize = 5;
