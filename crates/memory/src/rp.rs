//! Roleplay entities: named characters and free-form story cards
//! (locations, events, lore). Both are keyed by caller-visible string
//! ids and upserted whole, list fields stored as JSON text columns.

use std::sync::Arc;

use rusqlite::{params, OptionalExtension, Row};
use serde::{Deserialize, Serialize};

use crate::database::{now_rfc3339, Database, StoreError};

pub const DEFAULT_LIST_LIMIT: usize = 100;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RpCharacter {
    #[serde(default)]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub traits: Vec<String>,
    #[serde(default)]
    pub background: String,
    #[serde(default)]
    pub goals: Vec<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub notes: String,
    #[serde(default)]
    pub created_at: String,
    #[serde(default)]
    pub updated_at: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RpStoryCard {
    #[serde(default)]
    pub id: String,
    pub title: String,
    /// Free-form classifier such as "location", "event", or "lore".
    pub kind: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub tags: Vec<String>,
    /// Ids of related characters or cards.
    #[serde(default)]
    pub links: Vec<String>,
    #[serde(default)]
    pub created_at: String,
    #[serde(default)]
    pub updated_at: String,
}

pub struct RpStore {
    db: Arc<Database>,
}

impl RpStore {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// Characters ordered by recency. A non-empty `query` filters on
    /// name or summary.
    pub fn list_characters(
        &self,
        query: Option<&str>,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<RpCharacter>, StoreError> {
        let limit = if limit == 0 { DEFAULT_LIST_LIMIT } else { limit };
        let conn = self.db.conn();
        let rows = match query.filter(|q| !q.is_empty()) {
            Some(q) => {
                let pattern = format!("%{q}%");
                let mut stmt = conn.prepare(
                    "SELECT id, name, summary, traits_json, background, goals_json,
                            tags_json, notes, created_at, updated_at
                     FROM rp_characters
                     WHERE name LIKE ?1 OR summary LIKE ?1
                     ORDER BY updated_at DESC LIMIT ?2 OFFSET ?3",
                )?;
                let rows = stmt.query_map(
                    params![pattern, limit as i64, offset as i64],
                    row_to_character,
                )?;
                rows.collect::<Result<Vec<_>, _>>()?
            }
            None => {
                let mut stmt = conn.prepare(
                    "SELECT id, name, summary, traits_json, background, goals_json,
                            tags_json, notes, created_at, updated_at
                     FROM rp_characters
                     ORDER BY updated_at DESC LIMIT ?1 OFFSET ?2",
                )?;
                let rows =
                    stmt.query_map(params![limit as i64, offset as i64], row_to_character)?;
                rows.collect::<Result<Vec<_>, _>>()?
            }
        };
        Ok(rows)
    }

    pub fn get_character(&self, id: &str) -> Result<Option<RpCharacter>, StoreError> {
        Ok(self
            .db
            .conn()
            .query_row(
                "SELECT id, name, summary, traits_json, background, goals_json,
                        tags_json, notes, created_at, updated_at
                 FROM rp_characters WHERE id = ?1",
                [id],
                row_to_character,
            )
            .optional()?)
    }

    /// Inserts or replaces a character whole, stamping `updated_at` and
    /// preserving `created_at` on conflict. Returns the stored copy.
    pub fn save_character(&self, character: &RpCharacter) -> Result<RpCharacter, StoreError> {
        let now = now_rfc3339();
        let mut stored = character.clone();
        stored.created_at = if stored.created_at.is_empty() {
            now.clone()
        } else {
            stored.created_at
        };
        stored.updated_at = now;

        self.db.conn().execute(
            "INSERT INTO rp_characters
                 (id, name, summary, traits_json, background, goals_json,
                  tags_json, notes, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
             ON CONFLICT(id) DO UPDATE SET
                 name = excluded.name,
                 summary = excluded.summary,
                 traits_json = excluded.traits_json,
                 background = excluded.background,
                 goals_json = excluded.goals_json,
                 tags_json = excluded.tags_json,
                 notes = excluded.notes,
                 updated_at = excluded.updated_at",
            params![
                stored.id,
                stored.name,
                stored.summary,
                encode_list(&stored.traits),
                stored.background,
                encode_list(&stored.goals),
                encode_list(&stored.tags),
                stored.notes,
                stored.created_at,
                stored.updated_at,
            ],
        )?;
        Ok(stored)
    }

    pub fn delete_character(&self, id: &str) -> Result<(), StoreError> {
        let affected = self
            .db
            .conn()
            .execute("DELETE FROM rp_characters WHERE id = ?1", [id])?;
        if affected == 0 {
            return Err(StoreError::NotFound("character"));
        }
        Ok(())
    }

    /// Story cards ordered by recency, optionally filtered by kind
    /// and/or a title/content substring.
    pub fn list_story_cards(
        &self,
        query: Option<&str>,
        kind: Option<&str>,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<RpStoryCard>, StoreError> {
        let limit = if limit == 0 { DEFAULT_LIST_LIMIT } else { limit };
        let mut sql = String::from(
            "SELECT id, title, kind, content, tags_json, links_json, created_at, updated_at
             FROM rp_story_cards WHERE 1=1",
        );
        let mut args: Vec<Box<dyn rusqlite::ToSql>> = Vec::new();
        if let Some(q) = query.filter(|q| !q.is_empty()) {
            sql.push_str(&format!(
                " AND (title LIKE ?{n} OR content LIKE ?{n})",
                n = args.len() + 1
            ));
            args.push(Box::new(format!("%{q}%")));
        }
        if let Some(k) = kind.filter(|k| !k.is_empty()) {
            sql.push_str(&format!(" AND kind = ?{}", args.len() + 1));
            args.push(Box::new(k.to_string()));
        }
        sql.push_str(&format!(
            " ORDER BY updated_at DESC LIMIT ?{} OFFSET ?{}",
            args.len() + 1,
            args.len() + 2
        ));
        args.push(Box::new(limit as i64));
        args.push(Box::new(offset as i64));

        let conn = self.db.conn();
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map(
            rusqlite::params_from_iter(args.iter().map(|arg| arg.as_ref())),
            row_to_story_card,
        )?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    pub fn get_story_card(&self, id: &str) -> Result<Option<RpStoryCard>, StoreError> {
        Ok(self
            .db
            .conn()
            .query_row(
                "SELECT id, title, kind, content, tags_json, links_json, created_at, updated_at
                 FROM rp_story_cards WHERE id = ?1",
                [id],
                row_to_story_card,
            )
            .optional()?)
    }

    pub fn save_story_card(&self, card: &RpStoryCard) -> Result<RpStoryCard, StoreError> {
        let now = now_rfc3339();
        let mut stored = card.clone();
        stored.created_at = if stored.created_at.is_empty() {
            now.clone()
        } else {
            stored.created_at
        };
        stored.updated_at = now;

        self.db.conn().execute(
            "INSERT INTO rp_story_cards
                 (id, title, kind, content, tags_json, links_json, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
             ON CONFLICT(id) DO UPDATE SET
                 title = excluded.title,
                 kind = excluded.kind,
                 content = excluded.content,
                 tags_json = excluded.tags_json,
                 links_json = excluded.links_json,
                 updated_at = excluded.updated_at",
            params![
                stored.id,
                stored.title,
                stored.kind,
                stored.content,
                encode_list(&stored.tags),
                encode_list(&stored.links),
                stored.created_at,
                stored.updated_at,
            ],
        )?;
        Ok(stored)
    }

    pub fn delete_story_card(&self, id: &str) -> Result<(), StoreError> {
        let affected = self
            .db
            .conn()
            .execute("DELETE FROM rp_story_cards WHERE id = ?1", [id])?;
        if affected == 0 {
            return Err(StoreError::NotFound("story card"));
        }
        Ok(())
    }
}

fn row_to_character(row: &Row<'_>) -> rusqlite::Result<RpCharacter> {
    Ok(RpCharacter {
        id: row.get(0)?,
        name: row.get(1)?,
        summary: row.get(2)?,
        traits: decode_list(&row.get::<_, String>(3)?),
        background: row.get(4)?,
        goals: decode_list(&row.get::<_, String>(5)?),
        tags: decode_list(&row.get::<_, String>(6)?),
        notes: row.get(7)?,
        created_at: row.get(8)?,
        updated_at: row.get(9)?,
    })
}

fn row_to_story_card(row: &Row<'_>) -> rusqlite::Result<RpStoryCard> {
    Ok(RpStoryCard {
        id: row.get(0)?,
        title: row.get(1)?,
        kind: row.get(2)?,
        content: row.get(3)?,
        tags: decode_list(&row.get::<_, String>(4)?),
        links: decode_list(&row.get::<_, String>(5)?),
        created_at: row.get(6)?,
        updated_at: row.get(7)?,
    })
}

fn encode_list(items: &[String]) -> String {
    serde_json::to_string(items).unwrap_or_else(|_| "[]".to_string())
}

/// Malformed stored JSON decodes to an empty list instead of failing
/// the whole row.
fn decode_list(raw: &str) -> Vec<String> {
    serde_json::from_str(raw).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> RpStore {
        RpStore::new(Database::open_in_memory().unwrap())
    }

    fn character(id: &str, name: &str) -> RpCharacter {
        RpCharacter {
            id: id.to_string(),
            name: name.to_string(),
            summary: format!("{name} the adventurer"),
            traits: vec!["brave".into(), "curious".into()],
            goals: vec!["find the amulet".into()],
            ..RpCharacter::default()
        }
    }

    #[test]
    fn save_roundtrips_list_fields() {
        let store = store();
        let saved = store.save_character(&character("rp_1", "Mira")).unwrap();
        assert!(!saved.created_at.is_empty());

        let loaded = store.get_character("rp_1").unwrap().unwrap();
        assert_eq!(loaded.name, "Mira");
        assert_eq!(loaded.traits, vec!["brave", "curious"]);
        assert_eq!(loaded.goals, vec!["find the amulet"]);
        assert_eq!(loaded.created_at, saved.created_at);
    }

    #[test]
    fn resave_preserves_created_at() {
        let store = store();
        let first = store.save_character(&character("rp_1", "Mira")).unwrap();

        let mut updated = store.get_character("rp_1").unwrap().unwrap();
        updated.summary = "retired adventurer".into();
        store.save_character(&updated).unwrap();

        let loaded = store.get_character("rp_1").unwrap().unwrap();
        assert_eq!(loaded.summary, "retired adventurer");
        assert_eq!(loaded.created_at, first.created_at);
    }

    #[test]
    fn list_characters_filters_on_name_or_summary() {
        let store = store();
        store.save_character(&character("rp_1", "Mira")).unwrap();
        store.save_character(&character("rp_2", "Toren")).unwrap();

        let hits = store.list_characters(Some("Mira"), 0, 0).unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id, "rp_1");

        // Summary text matches too.
        let hits = store.list_characters(Some("adventurer"), 0, 0).unwrap();
        assert_eq!(hits.len(), 2);

        let all = store.list_characters(None, 0, 0).unwrap();
        assert_eq!(all.len(), 2);
    }

    #[test]
    fn get_missing_character_is_none_and_delete_errors() {
        let store = store();
        assert!(store.get_character("rp_none").unwrap().is_none());
        assert!(matches!(
            store.delete_character("rp_none"),
            Err(StoreError::NotFound(_))
        ));

        store.save_character(&character("rp_1", "Mira")).unwrap();
        store.delete_character("rp_1").unwrap();
        assert!(store.get_character("rp_1").unwrap().is_none());
    }

    #[test]
    fn story_cards_filter_by_kind_and_text() {
        let store = store();
        store
            .save_story_card(&RpStoryCard {
                id: "rp_10".into(),
                title: "The Sunken Keep".into(),
                kind: "location".into(),
                content: "A fortress swallowed by the marsh.".into(),
                ..RpStoryCard::default()
            })
            .unwrap();
        store
            .save_story_card(&RpStoryCard {
                id: "rp_11".into(),
                title: "The Long Winter".into(),
                kind: "event".into(),
                content: "Three years without a thaw.".into(),
                ..RpStoryCard::default()
            })
            .unwrap();

        let locations = store
            .list_story_cards(None, Some("location"), 0, 0)
            .unwrap();
        assert_eq!(locations.len(), 1);
        assert_eq!(locations[0].id, "rp_10");

        let marsh = store.list_story_cards(Some("marsh"), None, 0, 0).unwrap();
        assert_eq!(marsh.len(), 1);
        assert_eq!(marsh[0].title, "The Sunken Keep");

        let winter_events = store
            .list_story_cards(Some("thaw"), Some("event"), 0, 0)
            .unwrap();
        assert_eq!(winter_events.len(), 1);
        assert_eq!(winter_events[0].id, "rp_11");
    }

    #[test]
    fn story_card_delete_and_links_roundtrip() {
        let store = store();
        store
            .save_story_card(&RpStoryCard {
                id: "rp_20".into(),
                title: "Alliance".into(),
                kind: "lore".into(),
                links: vec!["rp_1".into(), "rp_2".into()],
                ..RpStoryCard::default()
            })
            .unwrap();

        let loaded = store.get_story_card("rp_20").unwrap().unwrap();
        assert_eq!(loaded.links, vec!["rp_1", "rp_2"]);

        store.delete_story_card("rp_20").unwrap();
        assert!(store.get_story_card("rp_20").unwrap().is_none());
        assert!(matches!(
            store.delete_story_card("rp_20"),
            Err(StoreError::NotFound(_))
        ));
    }
}
