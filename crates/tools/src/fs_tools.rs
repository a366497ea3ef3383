//! Filesystem capabilities. Every operation validates its target against
//! the directory allow-list before touching the disk.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use glob::{MatchOptions, Pattern};
use hearth_agent::{Tool, ToolDescription, ToolError, ToolResult};
use hearth_memory::AllowedDirs;
use serde::Deserialize;
use serde_json::{json, Value};
use walkdir::WalkDir;

use crate::{parse_args, rfc3339_mod_time};

fn check_allowed(dirs: &AllowedDirs, path: &Path) -> Result<(), ToolError> {
    if dirs.is_allowed(path) {
        Ok(())
    } else {
        Err(ToolError::NotAllowed(path.display().to_string()))
    }
}

fn entry_json(path: &Path, metadata: &std::fs::Metadata) -> Value {
    let name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    json!({
        "name": name,
        "path": path.display().to_string(),
        "is_dir": metadata.is_dir(),
        "size": if metadata.is_dir() { 0 } else { metadata.len() },
        "mod_time": rfc3339_mod_time(metadata),
    })
}

// read_file

#[derive(Deserialize)]
struct ReadFileArgs {
    path: PathBuf,
}

pub struct ReadFileTool {
    dirs: Arc<AllowedDirs>,
    description: ToolDescription,
}

impl ReadFileTool {
    pub fn new(dirs: Arc<AllowedDirs>) -> Self {
        Self {
            dirs,
            description: ToolDescription::new(
                "read_file",
                "Reads the contents of a text file. Requires a file path as input.",
                json!({
                    "type": "object",
                    "properties": {
                        "path": {"type": "string", "description": "The file path to read"}
                    },
                    "required": ["path"]
                }),
            ),
        }
    }
}

#[async_trait]
impl Tool for ReadFileTool {
    fn description(&self) -> &ToolDescription {
        &self.description
    }

    async fn invoke(&self, args: Value) -> Result<ToolResult, ToolError> {
        let args: ReadFileArgs = parse_args(args)?;
        check_allowed(&self.dirs, &args.path)?;
        let content = tokio::fs::read_to_string(&args.path)
            .await
            .map_err(|err| ToolError::Invocation(format!("failed to read file: {err}")))?;
        Ok(ToolResult::new(json!({
            "content": content,
            "path": args.path.display().to_string(),
        })))
    }
}

// write_file

#[derive(Deserialize)]
struct WriteFileArgs {
    path: PathBuf,
    content: String,
}

pub struct WriteFileTool {
    dirs: Arc<AllowedDirs>,
    description: ToolDescription,
}

impl WriteFileTool {
    pub fn new(dirs: Arc<AllowedDirs>) -> Self {
        Self {
            dirs,
            description: ToolDescription::new(
                "write_file",
                "Writes text content to a file. Arguments: 'path' (string), 'content' (string).",
                json!({
                    "type": "object",
                    "properties": {
                        "path": {"type": "string", "description": "The file path to write to"},
                        "content": {"type": "string", "description": "The text content to write"}
                    },
                    "required": ["path", "content"]
                }),
            ),
        }
    }
}

#[async_trait]
impl Tool for WriteFileTool {
    fn description(&self) -> &ToolDescription {
        &self.description
    }

    async fn invoke(&self, args: Value) -> Result<ToolResult, ToolError> {
        let args: WriteFileArgs = parse_args(args)?;
        check_allowed(&self.dirs, &args.path)?;
        if let Some(parent) = args.path.parent() {
            tokio::fs::create_dir_all(parent).await.map_err(|err| {
                ToolError::Invocation(format!("failed to create directories: {err}"))
            })?;
        }
        tokio::fs::write(&args.path, &args.content)
            .await
            .map_err(|err| ToolError::Invocation(format!("failed to write file: {err}")))?;
        Ok(ToolResult::new(json!(format!(
            "Successfully wrote to {}",
            args.path.display()
        ))))
    }
}

// list_directory

fn default_true() -> bool {
    true
}

fn default_max_items() -> usize {
    1000
}

#[derive(Deserialize)]
struct ListDirectoryArgs {
    path: PathBuf,
    #[serde(default)]
    recursive: bool,
    #[serde(default = "default_true")]
    include_files: bool,
    #[serde(default = "default_true")]
    include_dirs: bool,
    #[serde(default = "default_max_items")]
    max_items: usize,
}

pub struct ListDirectoryTool {
    dirs: Arc<AllowedDirs>,
    description: ToolDescription,
}

impl ListDirectoryTool {
    pub fn new(dirs: Arc<AllowedDirs>) -> Self {
        Self {
            dirs,
            description: ToolDescription::new(
                "list_directory",
                "Lists files and folders under a directory. Args: path (string), \
                 recursive (bool, optional), include_files (bool), include_dirs (bool), \
                 max_items (int).",
                json!({
                    "type": "object",
                    "properties": {
                        "path": {"type": "string", "description": "Directory path to list"},
                        "recursive": {"type": "boolean", "description": "Recursively list contents"},
                        "include_files": {"type": "boolean", "description": "Include files in results (default true)"},
                        "include_dirs": {"type": "boolean", "description": "Include directories in results (default true)"},
                        "max_items": {"type": "integer", "description": "Maximum number of items to return (default 1000)"}
                    },
                    "required": ["path"]
                }),
            ),
        }
    }
}

#[async_trait]
impl Tool for ListDirectoryTool {
    fn description(&self) -> &ToolDescription {
        &self.description
    }

    async fn invoke(&self, args: Value) -> Result<ToolResult, ToolError> {
        let args: ListDirectoryArgs = parse_args(args)?;
        check_allowed(&self.dirs, &args.path)?;

        let mut entries = Vec::new();
        let depth = if args.recursive { usize::MAX } else { 1 };
        // The root itself is not part of its own listing.
        for entry in WalkDir::new(&args.path).min_depth(1).max_depth(depth) {
            if entries.len() >= args.max_items {
                break;
            }
            let entry =
                entry.map_err(|err| ToolError::Invocation(format!("failed to list directory: {err}")))?;
            let metadata = match entry.metadata() {
                Ok(metadata) => metadata,
                Err(_) => continue,
            };
            let is_dir = metadata.is_dir();
            if (is_dir && !args.include_dirs) || (!is_dir && !args.include_files) {
                continue;
            }
            entries.push(entry_json(entry.path(), &metadata));
        }
        Ok(ToolResult::new(Value::Array(entries)))
    }
}

// file_metadata

#[derive(Deserialize)]
struct FileMetadataArgs {
    path: PathBuf,
}

pub struct FileMetadataTool {
    dirs: Arc<AllowedDirs>,
    description: ToolDescription,
}

impl FileMetadataTool {
    pub fn new(dirs: Arc<AllowedDirs>) -> Self {
        Self {
            dirs,
            description: ToolDescription::new(
                "file_metadata",
                "Returns basic metadata for a file or directory. Args: path (string).",
                json!({
                    "type": "object",
                    "properties": {
                        "path": {"type": "string", "description": "Path to file or directory"}
                    },
                    "required": ["path"]
                }),
            ),
        }
    }
}

#[async_trait]
impl Tool for FileMetadataTool {
    fn description(&self) -> &ToolDescription {
        &self.description
    }

    async fn invoke(&self, args: Value) -> Result<ToolResult, ToolError> {
        let args: FileMetadataArgs = parse_args(args)?;
        check_allowed(&self.dirs, &args.path)?;
        let metadata = tokio::fs::metadata(&args.path)
            .await
            .map_err(|err| ToolError::Invocation(format!("failed to stat path: {err}")))?;
        let abs = hearth_memory::sandbox::normalize(&args.path)
            .map_err(|err| ToolError::Invocation(err.to_string()))?;
        let mut value = entry_json(&args.path, &metadata);
        if let Some(map) = value.as_object_mut() {
            map.insert("abs_path".into(), json!(abs.display().to_string()));
        }
        Ok(ToolResult::new(value))
    }
}

// search_files_by_name

fn default_max_results() -> usize {
    200
}

#[derive(Deserialize)]
struct SearchFilesArgs {
    root: PathBuf,
    pattern: String,
    #[serde(default = "default_max_results")]
    max_results: usize,
    #[serde(default)]
    include_dirs: bool,
    #[serde(default)]
    case_sensitive: bool,
}

pub struct SearchFilesByNameTool {
    dirs: Arc<AllowedDirs>,
    description: ToolDescription,
}

impl SearchFilesByNameTool {
    pub fn new(dirs: Arc<AllowedDirs>) -> Self {
        Self {
            dirs,
            description: ToolDescription::new(
                "search_files_by_name",
                "Search for files by name under a root directory. Args: root (string), \
                 pattern (string, substring or glob), max_results (int), include_dirs (bool), \
                 case_sensitive (bool).",
                json!({
                    "type": "object",
                    "properties": {
                        "root": {"type": "string", "description": "Root directory to search within"},
                        "pattern": {"type": "string", "description": "Substring or glob pattern to match against names"},
                        "max_results": {"type": "integer", "description": "Maximum number of results (default 200)"},
                        "include_dirs": {"type": "boolean", "description": "Include directories in results (default false)"},
                        "case_sensitive": {"type": "boolean", "description": "Case-sensitive match (default false)"}
                    },
                    "required": ["root", "pattern"]
                }),
            ),
        }
    }
}

#[async_trait]
impl Tool for SearchFilesByNameTool {
    fn description(&self) -> &ToolDescription {
        &self.description
    }

    async fn invoke(&self, args: Value) -> Result<ToolResult, ToolError> {
        let args: SearchFilesArgs = parse_args(args)?;
        check_allowed(&self.dirs, &args.root)?;

        let use_glob = args.pattern.contains(['*', '?']);
        let glob = if use_glob {
            Some(
                Pattern::new(&args.pattern)
                    .map_err(|err| ToolError::InvalidInput(format!("bad pattern: {err}")))?,
            )
        } else {
            None
        };
        let options = MatchOptions {
            case_sensitive: args.case_sensitive,
            ..MatchOptions::new()
        };
        let needle = if args.case_sensitive {
            args.pattern.clone()
        } else {
            args.pattern.to_lowercase()
        };

        let matches = |name: &str| -> bool {
            match &glob {
                Some(pattern) => pattern.matches_with(name, options),
                None if args.case_sensitive => name.contains(&needle),
                None => name.to_lowercase().contains(&needle),
            }
        };

        let mut results = Vec::new();
        for entry in WalkDir::new(&args.root).min_depth(1).into_iter().flatten() {
            if results.len() >= args.max_results {
                break;
            }
            let is_dir = entry.file_type().is_dir();
            if is_dir && !args.include_dirs {
                continue;
            }
            let name = entry.file_name().to_string_lossy();
            if !matches(&name) {
                continue;
            }
            if let Ok(metadata) = entry.metadata() {
                results.push(entry_json(entry.path(), &metadata));
            }
        }
        Ok(ToolResult::new(Value::Array(results)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hearth_memory::Database;

    fn sandboxed(root: &Path) -> Arc<AllowedDirs> {
        let dirs = AllowedDirs::new(Database::open_in_memory().unwrap()).unwrap();
        dirs.add(root).unwrap();
        Arc::new(dirs)
    }

    #[tokio::test]
    async fn write_then_read_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let dirs = sandboxed(dir.path());
        let target = dir.path().join("nested/notes.txt");

        let write = WriteFileTool::new(dirs.clone());
        write
            .invoke(json!({"path": target, "content": "remember the milk"}))
            .await
            .unwrap();

        let read = ReadFileTool::new(dirs);
        let result = read.invoke(json!({"path": target})).await.unwrap();
        assert_eq!(result.content["content"], "remember the milk");
    }

    #[tokio::test]
    async fn paths_outside_sandbox_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let dirs = sandboxed(dir.path());

        let read = ReadFileTool::new(dirs.clone());
        let err = read
            .invoke(json!({"path": "/etc/passwd"}))
            .await
            .unwrap_err();
        assert!(matches!(err, ToolError::NotAllowed(_)));
        assert!(err.to_string().contains("not in allowed directories"));

        let write = WriteFileTool::new(dirs);
        let err = write
            .invoke(json!({"path": "/etc/hosts", "content": "no"}))
            .await
            .unwrap_err();
        assert!(matches!(err, ToolError::NotAllowed(_)));
    }

    #[tokio::test]
    async fn missing_required_argument_is_an_input_error() {
        let dir = tempfile::tempdir().unwrap();
        let read = ReadFileTool::new(sandboxed(dir.path()));
        let err = read.invoke(json!({})).await.unwrap_err();
        assert!(matches!(err, ToolError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn list_directory_flat_and_recursive() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("sub")).unwrap();
        std::fs::write(dir.path().join("top.txt"), "x").unwrap();
        std::fs::write(dir.path().join("sub/inner.txt"), "y").unwrap();

        let tool = ListDirectoryTool::new(sandboxed(dir.path()));

        let flat = tool.invoke(json!({"path": dir.path()})).await.unwrap();
        assert_eq!(flat.content.as_array().unwrap().len(), 2);

        let deep = tool
            .invoke(json!({"path": dir.path(), "recursive": true}))
            .await
            .unwrap();
        assert_eq!(deep.content.as_array().unwrap().len(), 3);

        let files_only = tool
            .invoke(json!({"path": dir.path(), "recursive": true, "include_dirs": false}))
            .await
            .unwrap();
        let entries = files_only.content.as_array().unwrap();
        assert_eq!(entries.len(), 2);
        assert!(entries.iter().all(|entry| entry["is_dir"] == false));
    }

    #[tokio::test]
    async fn list_directory_caps_results() {
        let dir = tempfile::tempdir().unwrap();
        for i in 0..10 {
            std::fs::write(dir.path().join(format!("f{i}.txt")), "x").unwrap();
        }
        let tool = ListDirectoryTool::new(sandboxed(dir.path()));
        let capped = tool
            .invoke(json!({"path": dir.path(), "max_items": 4}))
            .await
            .unwrap();
        assert_eq!(capped.content.as_array().unwrap().len(), 4);
    }

    #[tokio::test]
    async fn metadata_reports_kind_and_size() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("data.bin");
        std::fs::write(&file, [0u8; 16]).unwrap();

        let tool = FileMetadataTool::new(sandboxed(dir.path()));
        let result = tool.invoke(json!({"path": file})).await.unwrap();
        assert_eq!(result.content["name"], "data.bin");
        assert_eq!(result.content["is_dir"], false);
        assert_eq!(result.content["size"], 16);
        assert!(result.content["mod_time"].as_str().unwrap().contains('T'));
    }

    #[tokio::test]
    async fn search_by_substring_and_glob() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("Report-2026.md"), "x").unwrap();
        std::fs::write(dir.path().join("notes.txt"), "x").unwrap();

        let tool = SearchFilesByNameTool::new(sandboxed(dir.path()));

        // Substring, case-insensitive by default.
        let hits = tool
            .invoke(json!({"root": dir.path(), "pattern": "report"}))
            .await
            .unwrap();
        assert_eq!(hits.content.as_array().unwrap().len(), 1);

        let hits = tool
            .invoke(json!({"root": dir.path(), "pattern": "report", "case_sensitive": true}))
            .await
            .unwrap();
        assert!(hits.content.as_array().unwrap().is_empty());

        let hits = tool
            .invoke(json!({"root": dir.path(), "pattern": "*.md"}))
            .await
            .unwrap();
        let entries = hits.content.as_array().unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0]["name"], "Report-2026.md");
    }
}
