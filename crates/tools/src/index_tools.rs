//! Folder indexing and index search over the literal-text document index.

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use glob::Pattern;
use hearth_agent::{Tool, ToolDescription, ToolError, ToolResult};
use hearth_memory::{sandbox, AllowedDirs, TextIndex};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::debug;
use walkdir::WalkDir;

use crate::{parse_args, rfc3339_mod_time};

fn default_patterns() -> Vec<String> {
    ["*.md", "*.txt", "*.json", "*.yaml", "*.yml"]
        .into_iter()
        .map(String::from)
        .collect()
}

fn default_max_size_mb() -> u64 {
    2
}

fn default_max_files() -> usize {
    500
}

#[derive(Deserialize)]
struct IndexFolderArgs {
    root: PathBuf,
    #[serde(default = "default_patterns")]
    patterns: Vec<String>,
    #[serde(default = "default_max_size_mb")]
    max_size_mb: u64,
    #[serde(default = "default_max_files")]
    max_files: usize,
}

pub struct IndexFolderTool {
    dirs: Arc<AllowedDirs>,
    index: Arc<TextIndex>,
    description: ToolDescription,
}

impl IndexFolderTool {
    pub fn new(dirs: Arc<AllowedDirs>, index: Arc<TextIndex>) -> Self {
        Self {
            dirs,
            index,
            description: ToolDescription::new(
                "index_folder",
                "Indexes text files in a folder. Args: root (string), patterns \
                 ([string], optional), max_size_mb (int), max_files (int).",
                json!({
                    "type": "object",
                    "properties": {
                        "root": {"type": "string", "description": "Root directory to index"},
                        "patterns": {
                            "type": "array",
                            "items": {"type": "string"},
                            "description": "Glob patterns to include (e.g., *.md)"
                        },
                        "max_size_mb": {"type": "integer", "description": "Max file size in MB (default 2)"},
                        "max_files": {"type": "integer", "description": "Max files to index (default 500)"}
                    },
                    "required": ["root"]
                }),
            ),
        }
    }
}

#[async_trait]
impl Tool for IndexFolderTool {
    fn description(&self) -> &ToolDescription {
        &self.description
    }

    async fn invoke(&self, args: Value) -> Result<ToolResult, ToolError> {
        let args: IndexFolderArgs = parse_args(args)?;
        if !self.dirs.is_allowed(&args.root) {
            return Err(ToolError::NotAllowed(args.root.display().to_string()));
        }
        let patterns: Vec<Pattern> = args
            .patterns
            .iter()
            .map(|raw| Pattern::new(raw))
            .collect::<Result<_, _>>()
            .map_err(|err| ToolError::InvalidInput(format!("bad pattern: {err}")))?;
        let max_bytes = args.max_size_mb * 1024 * 1024;

        let mut indexed = 0usize;
        for entry in WalkDir::new(&args.root).into_iter().flatten() {
            if indexed >= args.max_files {
                break;
            }
            if !entry.file_type().is_file() {
                continue;
            }
            let name = entry.file_name().to_string_lossy().into_owned();
            if !patterns.iter().any(|pattern| pattern.matches(&name)) {
                continue;
            }
            let Ok(metadata) = entry.metadata() else {
                continue;
            };
            if metadata.len() > max_bytes {
                continue;
            }
            // Binary files fail UTF-8 decoding and are skipped.
            let Ok(content) = tokio::fs::read_to_string(entry.path()).await else {
                continue;
            };
            let path = entry.path().display().to_string();
            debug!(%path, "indexing document");
            self.index
                .upsert(
                    &path,
                    &name,
                    &rfc3339_mod_time(&metadata),
                    metadata.len() as i64,
                    &content,
                )
                .map_err(|err| ToolError::Invocation(err.to_string()))?;
            indexed += 1;
        }

        Ok(ToolResult::new(json!({
            "indexed": indexed,
            "root": args.root.display().to_string(),
            "patterns": args.patterns,
        })))
    }
}

fn default_limit() -> usize {
    10
}

#[derive(Deserialize)]
struct IndexSearchArgs {
    query: String,
    #[serde(default = "default_limit")]
    limit: usize,
    #[serde(default)]
    path_prefix: Option<PathBuf>,
}

pub struct IndexSearchTool {
    dirs: Arc<AllowedDirs>,
    index: Arc<TextIndex>,
    description: ToolDescription,
}

impl IndexSearchTool {
    pub fn new(dirs: Arc<AllowedDirs>, index: Arc<TextIndex>) -> Self {
        Self {
            dirs,
            index,
            description: ToolDescription::new(
                "index_search",
                "Searches the lightweight index for files/snippets. Args: query (string), \
                 limit (int, optional), path_prefix (string, optional).",
                json!({
                    "type": "object",
                    "properties": {
                        "query": {"type": "string", "description": "Query text"},
                        "limit": {"type": "integer", "description": "Max results (default 10)"},
                        "path_prefix": {"type": "string", "description": "Restrict to paths under this prefix"}
                    },
                    "required": ["query"]
                }),
            ),
        }
    }
}

#[async_trait]
impl Tool for IndexSearchTool {
    fn description(&self) -> &ToolDescription {
        &self.description
    }

    async fn invoke(&self, args: Value) -> Result<ToolResult, ToolError> {
        let args: IndexSearchArgs = parse_args(args)?;
        if args.query.is_empty() {
            return Err(ToolError::InvalidInput("query is required".into()));
        }
        let prefix = match &args.path_prefix {
            Some(prefix) => {
                if !self.dirs.is_allowed(prefix) {
                    return Err(ToolError::NotAllowed(prefix.display().to_string()));
                }
                Some(
                    sandbox::normalize(prefix)
                        .map_err(|err| ToolError::Invocation(err.to_string()))?
                        .display()
                        .to_string(),
                )
            }
            None => None,
        };

        let hits = self
            .index
            .search(&args.query, args.limit, prefix.as_deref())
            .map_err(|err| ToolError::Invocation(err.to_string()))?;
        let value =
            serde_json::to_value(hits).map_err(|err| ToolError::Invocation(err.to_string()))?;
        Ok(ToolResult::new(value))
    }
}
