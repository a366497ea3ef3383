//! Allow-list management exposed as tools. These are the only
//! capabilities that mutate the sandbox itself.

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use hearth_agent::{Tool, ToolDescription, ToolError, ToolResult};
use hearth_memory::{sandbox, AllowedDirs, TextIndex};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::info;

use crate::parse_args;

fn allowed_json(dirs: &AllowedDirs) -> Value {
    let listed: Vec<String> = dirs
        .list()
        .iter()
        .map(|path| path.display().to_string())
        .collect();
    json!({ "allowed": listed })
}

pub struct AllowedDirsListTool {
    dirs: Arc<AllowedDirs>,
    description: ToolDescription,
}

impl AllowedDirsListTool {
    pub fn new(dirs: Arc<AllowedDirs>) -> Self {
        Self {
            dirs,
            description: ToolDescription::new(
                "allowed_dirs_list",
                "Lists directories the assistant is allowed to access. Args: none.",
                json!({"type": "object", "properties": {}}),
            ),
        }
    }
}

#[async_trait]
impl Tool for AllowedDirsListTool {
    fn description(&self) -> &ToolDescription {
        &self.description
    }

    async fn invoke(&self, _args: Value) -> Result<ToolResult, ToolError> {
        Ok(ToolResult::new(allowed_json(&self.dirs)))
    }
}

#[derive(Deserialize)]
struct DirArgs {
    path: PathBuf,
}

pub struct AllowedDirsAddTool {
    dirs: Arc<AllowedDirs>,
    description: ToolDescription,
}

impl AllowedDirsAddTool {
    pub fn new(dirs: Arc<AllowedDirs>) -> Self {
        Self {
            dirs,
            description: ToolDescription::new(
                "allowed_dirs_add",
                "Adds a directory to the allowed list. Args: path (string).",
                json!({
                    "type": "object",
                    "properties": {
                        "path": {"type": "string", "description": "Directory path to allow"}
                    },
                    "required": ["path"]
                }),
            ),
        }
    }
}

#[async_trait]
impl Tool for AllowedDirsAddTool {
    fn description(&self) -> &ToolDescription {
        &self.description
    }

    async fn invoke(&self, args: Value) -> Result<ToolResult, ToolError> {
        let args: DirArgs = parse_args(args)?;
        let metadata = tokio::fs::metadata(&args.path).await;
        if !metadata.map(|m| m.is_dir()).unwrap_or(false) {
            return Err(ToolError::InvalidInput(
                "path must be an existing directory".into(),
            ));
        }
        self.dirs
            .add(&args.path)
            .map_err(|err| ToolError::Invocation(err.to_string()))?;
        info!(path = %args.path.display(), "allowed directory added");
        Ok(ToolResult::new(allowed_json(&self.dirs)))
    }
}

pub struct AllowedDirsRemoveTool {
    dirs: Arc<AllowedDirs>,
    index: Arc<TextIndex>,
    description: ToolDescription,
}

impl AllowedDirsRemoveTool {
    pub fn new(dirs: Arc<AllowedDirs>, index: Arc<TextIndex>) -> Self {
        Self {
            dirs,
            index,
            description: ToolDescription::new(
                "allowed_dirs_remove",
                "Removes a directory from the allowed list. Args: path (string).",
                json!({
                    "type": "object",
                    "properties": {
                        "path": {"type": "string", "description": "Directory path to remove"}
                    },
                    "required": ["path"]
                }),
            ),
        }
    }
}

#[async_trait]
impl Tool for AllowedDirsRemoveTool {
    fn description(&self) -> &ToolDescription {
        &self.description
    }

    async fn invoke(&self, args: Value) -> Result<ToolResult, ToolError> {
        let args: DirArgs = parse_args(args)?;
        self.dirs
            .remove(&args.path)
            .map_err(|err| ToolError::Invocation(err.to_string()))?;
        // Indexed documents under a revoked root must not stay searchable.
        let normalized = sandbox::normalize(&args.path)
            .map_err(|err| ToolError::Invocation(err.to_string()))?;
        let pruned = self
            .index
            .delete_by_prefix(&normalized.display().to_string())
            .map_err(|err| ToolError::Invocation(err.to_string()))?;
        info!(path = %args.path.display(), pruned, "allowed directory removed");
        Ok(ToolResult::new(allowed_json(&self.dirs)))
    }
}
