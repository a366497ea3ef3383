//! Keyed long-term facts with category and importance.

use std::sync::Arc;

use rusqlite::{params, OptionalExtension};
use serde::Serialize;

use crate::database::{now_rfc3339, Database, StoreError};

#[derive(Debug, Clone, Serialize)]
pub struct Memory {
    pub id: i64,
    pub key: String,
    pub content: String,
    pub category: String,
    pub created_at: String,
    pub updated_at: String,
    pub importance: i64,
}

pub struct MemoryStore {
    db: Arc<Database>,
}

impl MemoryStore {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// Upserts by key; an existing row keeps its creation stamp.
    pub fn store(
        &self,
        key: &str,
        content: &str,
        category: &str,
        importance: i64,
    ) -> Result<(), StoreError> {
        let now = now_rfc3339();
        self.db.conn().execute(
            "INSERT INTO memories (key, content, category, created_at, updated_at, importance)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)
             ON CONFLICT(key) DO UPDATE SET
                 content = excluded.content,
                 category = excluded.category,
                 updated_at = excluded.updated_at,
                 importance = excluded.importance",
            params![key, content, category, now, now, importance],
        )?;
        Ok(())
    }

    pub fn get(&self, key: &str) -> Result<Memory, StoreError> {
        self.db
            .conn()
            .query_row(
                "SELECT id, key, content, category, created_at, updated_at, importance
                 FROM memories WHERE key = ?1",
                [key],
                row_to_memory,
            )
            .optional()?
            .ok_or(StoreError::NotFound("memory"))
    }

    /// Facts at or above `min_importance`, optionally restricted to one
    /// category, most important first.
    pub fn search(
        &self,
        category: Option<&str>,
        min_importance: i64,
    ) -> Result<Vec<Memory>, StoreError> {
        let conn = self.db.conn();
        let mut stmt;
        let rows = match category {
            Some(category) => {
                stmt = conn.prepare(
                    "SELECT id, key, content, category, created_at, updated_at, importance
                     FROM memories WHERE importance >= ?1 AND category = ?2
                     ORDER BY importance DESC, updated_at DESC",
                )?;
                stmt.query_map(params![min_importance, category], row_to_memory)?
            }
            None => {
                stmt = conn.prepare(
                    "SELECT id, key, content, category, created_at, updated_at, importance
                     FROM memories WHERE importance >= ?1
                     ORDER BY importance DESC, updated_at DESC",
                )?;
                stmt.query_map(params![min_importance], row_to_memory)?
            }
        };
        Ok(rows.collect::<Result<_, _>>()?)
    }

    pub fn delete(&self, key: &str) -> Result<(), StoreError> {
        self.db
            .conn()
            .execute("DELETE FROM memories WHERE key = ?1", [key])?;
        Ok(())
    }
}

fn row_to_memory(row: &rusqlite::Row<'_>) -> rusqlite::Result<Memory> {
    Ok(Memory {
        id: row.get(0)?,
        key: row.get(1)?,
        content: row.get(2)?,
        category: row.get(3)?,
        created_at: row.get(4)?,
        updated_at: row.get(5)?,
        importance: row.get(6)?,
    })
}
