use std::sync::Arc;

use indexmap::IndexMap;

use crate::tool::{Tool, ToolDescription};

/// Name-keyed table of tools. Built once at startup, then shared behind an
/// `Arc` and never mutated, so concurrent lookups need no locking.
#[derive(Default)]
pub struct ToolRegistry {
    tools: IndexMap<String, Arc<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a tool under its declared name. Re-registering a name
    /// replaces the previous entry.
    pub fn register(&mut self, tool: Arc<dyn Tool>) {
        let name = tool.description().name.clone();
        self.tools.insert(name, tool);
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.tools.get(name).cloned()
    }

    /// Descriptions in registration order, for prompt rendering.
    pub fn descriptions(&self) -> Vec<ToolDescription> {
        self.tools
            .values()
            .map(|tool| tool.description().clone())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}
