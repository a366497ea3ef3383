//! Roleplay entity management exposed as tools: characters and story
//! cards the model can look up and edit while running a roleplay
//! conversation.

use std::sync::Arc;

use async_trait::async_trait;
use hearth_agent::{Tool, ToolDescription, ToolError, ToolResult};
use hearth_memory::{RpCharacter, RpStore, RpStoryCard};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::info;

use crate::parse_args;

/// Timestamp-keyed id for entities the caller did not name.
fn generate_id() -> String {
    format!("rp_{}", chrono::Utc::now().timestamp_micros())
}

#[derive(Deserialize)]
struct ListArgs {
    #[serde(default)]
    query: Option<String>,
    #[serde(default)]
    kind: Option<String>,
    #[serde(default)]
    limit: usize,
    #[serde(default)]
    offset: usize,
}

#[derive(Deserialize)]
struct IdArgs {
    id: String,
}

pub struct RpCharacterListTool {
    store: Arc<RpStore>,
    description: ToolDescription,
}

impl RpCharacterListTool {
    pub fn new(store: Arc<RpStore>) -> Self {
        Self {
            store,
            description: ToolDescription::new(
                "rp_character_list",
                "Lists roleplay characters, most recently updated first. \
                 Args: query (string, optional), limit (number, optional), \
                 offset (number, optional).",
                json!({
                    "type": "object",
                    "properties": {
                        "query": {"type": "string", "description": "Filter on name or summary"},
                        "limit": {"type": "number"},
                        "offset": {"type": "number"}
                    }
                }),
            ),
        }
    }
}

#[async_trait]
impl Tool for RpCharacterListTool {
    fn description(&self) -> &ToolDescription {
        &self.description
    }

    async fn invoke(&self, args: Value) -> Result<ToolResult, ToolError> {
        let args: ListArgs = parse_args(args)?;
        let characters = self
            .store
            .list_characters(args.query.as_deref(), args.limit, args.offset)
            .map_err(|err| ToolError::Invocation(err.to_string()))?;
        Ok(ToolResult::new(json!({
            "count": characters.len(),
            "characters": characters,
        })))
    }
}

pub struct RpCharacterGetTool {
    store: Arc<RpStore>,
    description: ToolDescription,
}

impl RpCharacterGetTool {
    pub fn new(store: Arc<RpStore>) -> Self {
        Self {
            store,
            description: ToolDescription::new(
                "rp_character_get",
                "Fetches one roleplay character by id. Args: id (string). \
                 Returns null when the id is unknown.",
                json!({
                    "type": "object",
                    "properties": {
                        "id": {"type": "string"}
                    },
                    "required": ["id"]
                }),
            ),
        }
    }
}

#[async_trait]
impl Tool for RpCharacterGetTool {
    fn description(&self) -> &ToolDescription {
        &self.description
    }

    async fn invoke(&self, args: Value) -> Result<ToolResult, ToolError> {
        let args: IdArgs = parse_args(args)?;
        let character = self
            .store
            .get_character(&args.id)
            .map_err(|err| ToolError::Invocation(err.to_string()))?;
        let content = match character {
            Some(character) => serde_json::to_value(character)
                .map_err(|err| ToolError::Invocation(err.to_string()))?,
            None => Value::Null,
        };
        Ok(ToolResult::new(content))
    }
}

pub struct RpCharacterSaveTool {
    store: Arc<RpStore>,
    description: ToolDescription,
}

impl RpCharacterSaveTool {
    pub fn new(store: Arc<RpStore>) -> Self {
        Self {
            store,
            description: ToolDescription::new(
                "rp_character_save",
                "Creates or updates a roleplay character. Args: name (string, \
                 required), id (string, omit to create), summary, traits \
                 (string list), background, goals (string list), tags \
                 (string list), notes.",
                json!({
                    "type": "object",
                    "properties": {
                        "id": {"type": "string"},
                        "name": {"type": "string"},
                        "summary": {"type": "string"},
                        "traits": {"type": "array", "items": {"type": "string"}},
                        "background": {"type": "string"},
                        "goals": {"type": "array", "items": {"type": "string"}},
                        "tags": {"type": "array", "items": {"type": "string"}},
                        "notes": {"type": "string"}
                    },
                    "required": ["name"]
                }),
            ),
        }
    }
}

#[async_trait]
impl Tool for RpCharacterSaveTool {
    fn description(&self) -> &ToolDescription {
        &self.description
    }

    async fn invoke(&self, args: Value) -> Result<ToolResult, ToolError> {
        let mut character: RpCharacter = parse_args(args)?;
        if character.name.trim().is_empty() {
            return Err(ToolError::InvalidInput("character name is required".into()));
        }
        if character.id.is_empty() {
            character.id = generate_id();
        }
        // created_at of an existing row wins over whatever the caller sent.
        character.created_at = self
            .store
            .get_character(&character.id)
            .map_err(|err| ToolError::Invocation(err.to_string()))?
            .map(|existing| existing.created_at)
            .unwrap_or_default();

        let stored = self
            .store
            .save_character(&character)
            .map_err(|err| ToolError::Invocation(err.to_string()))?;
        info!(id = %stored.id, name = %stored.name, "roleplay character saved");
        serde_json::to_value(stored)
            .map(ToolResult::new)
            .map_err(|err| ToolError::Invocation(err.to_string()))
    }
}

pub struct RpCharacterDeleteTool {
    store: Arc<RpStore>,
    description: ToolDescription,
}

impl RpCharacterDeleteTool {
    pub fn new(store: Arc<RpStore>) -> Self {
        Self {
            store,
            description: ToolDescription::new(
                "rp_character_delete",
                "Deletes a roleplay character by id. Args: id (string).",
                json!({
                    "type": "object",
                    "properties": {
                        "id": {"type": "string"}
                    },
                    "required": ["id"]
                }),
            ),
        }
    }
}

#[async_trait]
impl Tool for RpCharacterDeleteTool {
    fn description(&self) -> &ToolDescription {
        &self.description
    }

    async fn invoke(&self, args: Value) -> Result<ToolResult, ToolError> {
        let args: IdArgs = parse_args(args)?;
        self.store
            .delete_character(&args.id)
            .map_err(|err| ToolError::Invocation(err.to_string()))?;
        info!(id = %args.id, "roleplay character deleted");
        Ok(ToolResult::new(json!({ "deleted": args.id })))
    }
}

pub struct RpStoryCardListTool {
    store: Arc<RpStore>,
    description: ToolDescription,
}

impl RpStoryCardListTool {
    pub fn new(store: Arc<RpStore>) -> Self {
        Self {
            store,
            description: ToolDescription::new(
                "rp_storycard_list",
                "Lists roleplay story cards, most recently updated first. \
                 Args: query (string, optional), kind (string, optional), \
                 limit (number, optional), offset (number, optional).",
                json!({
                    "type": "object",
                    "properties": {
                        "query": {"type": "string", "description": "Filter on title or content"},
                        "kind": {"type": "string", "description": "Filter on card kind"},
                        "limit": {"type": "number"},
                        "offset": {"type": "number"}
                    }
                }),
            ),
        }
    }
}

#[async_trait]
impl Tool for RpStoryCardListTool {
    fn description(&self) -> &ToolDescription {
        &self.description
    }

    async fn invoke(&self, args: Value) -> Result<ToolResult, ToolError> {
        let args: ListArgs = parse_args(args)?;
        let cards = self
            .store
            .list_story_cards(
                args.query.as_deref(),
                args.kind.as_deref(),
                args.limit,
                args.offset,
            )
            .map_err(|err| ToolError::Invocation(err.to_string()))?;
        Ok(ToolResult::new(json!({
            "count": cards.len(),
            "cards": cards,
        })))
    }
}

pub struct RpStoryCardGetTool {
    store: Arc<RpStore>,
    description: ToolDescription,
}

impl RpStoryCardGetTool {
    pub fn new(store: Arc<RpStore>) -> Self {
        Self {
            store,
            description: ToolDescription::new(
                "rp_storycard_get",
                "Fetches one roleplay story card by id. Args: id (string). \
                 Returns null when the id is unknown.",
                json!({
                    "type": "object",
                    "properties": {
                        "id": {"type": "string"}
                    },
                    "required": ["id"]
                }),
            ),
        }
    }
}

#[async_trait]
impl Tool for RpStoryCardGetTool {
    fn description(&self) -> &ToolDescription {
        &self.description
    }

    async fn invoke(&self, args: Value) -> Result<ToolResult, ToolError> {
        let args: IdArgs = parse_args(args)?;
        let card = self
            .store
            .get_story_card(&args.id)
            .map_err(|err| ToolError::Invocation(err.to_string()))?;
        let content = match card {
            Some(card) => serde_json::to_value(card)
                .map_err(|err| ToolError::Invocation(err.to_string()))?,
            None => Value::Null,
        };
        Ok(ToolResult::new(content))
    }
}

pub struct RpStoryCardSaveTool {
    store: Arc<RpStore>,
    description: ToolDescription,
}

impl RpStoryCardSaveTool {
    pub fn new(store: Arc<RpStore>) -> Self {
        Self {
            store,
            description: ToolDescription::new(
                "rp_storycard_save",
                "Creates or updates a roleplay story card. Args: title \
                 (string, required), kind (string, required, e.g. location, \
                 event, lore), id (string, omit to create), content, tags \
                 (string list), links (string list of related entity ids).",
                json!({
                    "type": "object",
                    "properties": {
                        "id": {"type": "string"},
                        "title": {"type": "string"},
                        "kind": {"type": "string"},
                        "content": {"type": "string"},
                        "tags": {"type": "array", "items": {"type": "string"}},
                        "links": {"type": "array", "items": {"type": "string"}}
                    },
                    "required": ["title", "kind"]
                }),
            ),
        }
    }
}

#[async_trait]
impl Tool for RpStoryCardSaveTool {
    fn description(&self) -> &ToolDescription {
        &self.description
    }

    async fn invoke(&self, args: Value) -> Result<ToolResult, ToolError> {
        let mut card: RpStoryCard = parse_args(args)?;
        if card.title.trim().is_empty() || card.kind.trim().is_empty() {
            return Err(ToolError::InvalidInput(
                "story card title and kind are required".into(),
            ));
        }
        if card.id.is_empty() {
            card.id = generate_id();
        }
        card.created_at = self
            .store
            .get_story_card(&card.id)
            .map_err(|err| ToolError::Invocation(err.to_string()))?
            .map(|existing| existing.created_at)
            .unwrap_or_default();

        let stored = self
            .store
            .save_story_card(&card)
            .map_err(|err| ToolError::Invocation(err.to_string()))?;
        info!(id = %stored.id, title = %stored.title, "roleplay story card saved");
        serde_json::to_value(stored)
            .map(ToolResult::new)
            .map_err(|err| ToolError::Invocation(err.to_string()))
    }
}

pub struct RpStoryCardDeleteTool {
    store: Arc<RpStore>,
    description: ToolDescription,
}

impl RpStoryCardDeleteTool {
    pub fn new(store: Arc<RpStore>) -> Self {
        Self {
            store,
            description: ToolDescription::new(
                "rp_storycard_delete",
                "Deletes a roleplay story card by id. Args: id (string).",
                json!({
                    "type": "object",
                    "properties": {
                        "id": {"type": "string"}
                    },
                    "required": ["id"]
                }),
            ),
        }
    }
}

#[async_trait]
impl Tool for RpStoryCardDeleteTool {
    fn description(&self) -> &ToolDescription {
        &self.description
    }

    async fn invoke(&self, args: Value) -> Result<ToolResult, ToolError> {
        let args: IdArgs = parse_args(args)?;
        self.store
            .delete_story_card(&args.id)
            .map_err(|err| ToolError::Invocation(err.to_string()))?;
        info!(id = %args.id, "roleplay story card deleted");
        Ok(ToolResult::new(json!({ "deleted": args.id })))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hearth_memory::Database;

    fn store() -> Arc<RpStore> {
        Arc::new(RpStore::new(Database::open_in_memory().unwrap()))
    }

    #[tokio::test]
    async fn save_generates_an_id_and_get_returns_it() {
        let store = store();
        let save = RpCharacterSaveTool::new(store.clone());

        let result = save
            .invoke(json!({"name": "Mira", "traits": ["brave"]}))
            .await
            .unwrap();
        let id = result.content["id"].as_str().unwrap().to_string();
        assert!(id.starts_with("rp_"));

        let get = RpCharacterGetTool::new(store);
        let fetched = get.invoke(json!({"id": id})).await.unwrap();
        assert_eq!(fetched.content["name"], "Mira");
        assert_eq!(fetched.content["traits"][0], "brave");
    }

    #[tokio::test]
    async fn save_requires_a_name() {
        let save = RpCharacterSaveTool::new(store());
        let err = save.invoke(json!({"name": "  "})).await.unwrap_err();
        assert!(matches!(err, ToolError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn resave_with_id_updates_in_place() {
        let store = store();
        let save = RpCharacterSaveTool::new(store.clone());

        let first = save.invoke(json!({"name": "Mira"})).await.unwrap();
        let id = first.content["id"].as_str().unwrap().to_string();

        let second = save
            .invoke(json!({"id": id, "name": "Mira", "summary": "retired"}))
            .await
            .unwrap();
        assert_eq!(second.content["summary"], "retired");
        assert_eq!(second.content["created_at"], first.content["created_at"]);

        let list = RpCharacterListTool::new(store);
        let listed = list.invoke(json!({})).await.unwrap();
        assert_eq!(listed.content["count"], 1);
    }

    #[tokio::test]
    async fn get_of_unknown_id_returns_null() {
        let get = RpCharacterGetTool::new(store());
        let result = get.invoke(json!({"id": "rp_none"})).await.unwrap();
        assert!(result.content.is_null());
    }

    #[tokio::test]
    async fn delete_reports_the_removed_id() {
        let store = store();
        let save = RpCharacterSaveTool::new(store.clone());
        let saved = save.invoke(json!({"name": "Mira"})).await.unwrap();
        let id = saved.content["id"].as_str().unwrap().to_string();

        let delete = RpCharacterDeleteTool::new(store.clone());
        let result = delete.invoke(json!({"id": id.clone()})).await.unwrap();
        assert_eq!(result.content["deleted"], id.as_str());

        // A second delete of the same id fails loudly.
        let err = delete.invoke(json!({"id": id})).await.unwrap_err();
        assert!(matches!(err, ToolError::Invocation(_)));
    }

    #[tokio::test]
    async fn story_card_requires_title_and_kind() {
        let save = RpStoryCardSaveTool::new(store());
        let err = save.invoke(json!({"title": "The Keep"})).await.unwrap_err();
        assert!(matches!(err, ToolError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn story_card_list_filters_by_kind() {
        let store = store();
        let save = RpStoryCardSaveTool::new(store.clone());
        save.invoke(json!({"title": "The Keep", "kind": "location"}))
            .await
            .unwrap();
        save.invoke(json!({"title": "The Long Winter", "kind": "event"}))
            .await
            .unwrap();

        let list = RpStoryCardListTool::new(store);
        let events = list.invoke(json!({"kind": "event"})).await.unwrap();
        assert_eq!(events.content["count"], 1);
        assert_eq!(events.content["cards"][0]["title"], "The Long Winter");
    }
}
