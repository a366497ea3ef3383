//! Concrete capabilities exposed to the model: sandboxed filesystem
//! access, allow-list management, the document index, web search, and
//! roleplay entity management.

use std::sync::Arc;

use hearth_agent::{ToolError, ToolRegistry};
use hearth_memory::{AllowedDirs, RpStore, TextIndex};
use serde::de::DeserializeOwned;
use serde_json::Value;

pub mod fs_tools;
pub mod index_tools;
pub mod rp_tools;
pub mod sandbox_tools;
pub mod web_search;

pub use fs_tools::{
    FileMetadataTool, ListDirectoryTool, ReadFileTool, SearchFilesByNameTool, WriteFileTool,
};
pub use index_tools::{IndexFolderTool, IndexSearchTool};
pub use rp_tools::{
    RpCharacterDeleteTool, RpCharacterGetTool, RpCharacterListTool, RpCharacterSaveTool,
    RpStoryCardDeleteTool, RpStoryCardGetTool, RpStoryCardListTool, RpStoryCardSaveTool,
};
pub use sandbox_tools::{AllowedDirsAddTool, AllowedDirsListTool, AllowedDirsRemoveTool};
pub use web_search::WebSearchTool;

/// Registry preloaded with every standard capability.
pub fn standard_registry(
    dirs: Arc<AllowedDirs>,
    index: Arc<TextIndex>,
    rp: Arc<RpStore>,
) -> ToolRegistry {
    let mut registry = ToolRegistry::new();
    registry.register(Arc::new(ReadFileTool::new(dirs.clone())));
    registry.register(Arc::new(WriteFileTool::new(dirs.clone())));
    registry.register(Arc::new(ListDirectoryTool::new(dirs.clone())));
    registry.register(Arc::new(FileMetadataTool::new(dirs.clone())));
    registry.register(Arc::new(SearchFilesByNameTool::new(dirs.clone())));
    registry.register(Arc::new(AllowedDirsListTool::new(dirs.clone())));
    registry.register(Arc::new(AllowedDirsAddTool::new(dirs.clone())));
    registry.register(Arc::new(AllowedDirsRemoveTool::new(
        dirs.clone(),
        index.clone(),
    )));
    registry.register(Arc::new(IndexFolderTool::new(dirs.clone(), index.clone())));
    registry.register(Arc::new(IndexSearchTool::new(dirs, index)));
    registry.register(Arc::new(WebSearchTool::new()));
    registry.register(Arc::new(RpCharacterListTool::new(rp.clone())));
    registry.register(Arc::new(RpCharacterGetTool::new(rp.clone())));
    registry.register(Arc::new(RpCharacterSaveTool::new(rp.clone())));
    registry.register(Arc::new(RpCharacterDeleteTool::new(rp.clone())));
    registry.register(Arc::new(RpStoryCardListTool::new(rp.clone())));
    registry.register(Arc::new(RpStoryCardGetTool::new(rp.clone())));
    registry.register(Arc::new(RpStoryCardSaveTool::new(rp.clone())));
    registry.register(Arc::new(RpStoryCardDeleteTool::new(rp)));
    registry
}

/// Decodes a tool argument object into its typed payload. Missing
/// required fields and wrong types are hard input errors.
pub(crate) fn parse_args<T: DeserializeOwned>(args: Value) -> Result<T, ToolError> {
    serde_json::from_value(args).map_err(|err| ToolError::InvalidInput(err.to_string()))
}

pub(crate) fn rfc3339_mod_time(metadata: &std::fs::Metadata) -> String {
    metadata
        .modified()
        .map(|time| chrono::DateTime::<chrono::Utc>::from(time).to_rfc3339())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use hearth_memory::Database;

    #[test]
    fn standard_registry_carries_every_capability() {
        let db = Database::open_in_memory().unwrap();
        let dirs = Arc::new(AllowedDirs::new(db.clone()).unwrap());
        let index = Arc::new(TextIndex::new(db.clone()));
        let rp = Arc::new(RpStore::new(db));

        let registry = standard_registry(dirs, index, rp);
        for name in [
            "read_file",
            "write_file",
            "list_directory",
            "file_metadata",
            "search_files_by_name",
            "allowed_dirs_list",
            "allowed_dirs_add",
            "allowed_dirs_remove",
            "index_folder",
            "index_search",
            "web_search",
            "rp_character_list",
            "rp_character_get",
            "rp_character_save",
            "rp_character_delete",
            "rp_storycard_list",
            "rp_storycard_get",
            "rp_storycard_save",
            "rp_storycard_delete",
        ] {
            assert!(registry.get(name).is_some(), "missing tool {name}");
        }
        assert_eq!(registry.len(), 19);
    }
}
