//! Conversation and message persistence.

use std::sync::Arc;

use rusqlite::{params, OptionalExtension};
use serde::Serialize;

use crate::database::{now_rfc3339, Database, StoreError};

#[derive(Debug, Clone, Serialize)]
pub struct Conversation {
    pub id: i64,
    pub created_at: String,
    pub updated_at: String,
    pub title: Option<String>,
    pub mode: String,
    pub metadata: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct StoredMessage {
    pub id: i64,
    pub conversation_id: i64,
    pub role: String,
    pub content: String,
    pub timestamp: String,
    pub metadata: Option<String>,
}

pub struct ConversationStore {
    db: Arc<Database>,
}

impl ConversationStore {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// `mode` distinguishes plain chat ("normal") from roleplay sessions ("rp").
    pub fn create(&self, mode: &str) -> Result<i64, StoreError> {
        let now = now_rfc3339();
        let mode = if mode.is_empty() { "normal" } else { mode };
        let conn = self.db.conn();
        conn.execute(
            "INSERT INTO conversations (created_at, updated_at, mode) VALUES (?1, ?2, ?3)",
            params![now, now, mode],
        )?;
        Ok(conn.last_insert_rowid())
    }

    pub fn get(&self, id: i64) -> Result<Conversation, StoreError> {
        self.db
            .conn()
            .query_row(
                "SELECT id, created_at, updated_at, title, mode, metadata
                 FROM conversations WHERE id = ?1",
                [id],
                |row| {
                    Ok(Conversation {
                        id: row.get(0)?,
                        created_at: row.get(1)?,
                        updated_at: row.get(2)?,
                        title: row.get(3)?,
                        mode: row.get(4)?,
                        metadata: row.get(5)?,
                    })
                },
            )
            .optional()?
            .ok_or(StoreError::NotFound("conversation"))
    }

    pub fn list(&self, limit: usize, offset: usize) -> Result<Vec<Conversation>, StoreError> {
        let conn = self.db.conn();
        let mut stmt = conn.prepare(
            "SELECT id, created_at, updated_at, title, mode, metadata
             FROM conversations ORDER BY updated_at DESC LIMIT ?1 OFFSET ?2",
        )?;
        let rows = stmt.query_map(params![limit as i64, offset as i64], |row| {
            Ok(Conversation {
                id: row.get(0)?,
                created_at: row.get(1)?,
                updated_at: row.get(2)?,
                title: row.get(3)?,
                mode: row.get(4)?,
                metadata: row.get(5)?,
            })
        })?;
        Ok(rows.collect::<Result<_, _>>()?)
    }

    /// Appends a message and bumps the conversation's recency stamp.
    pub fn add_message(
        &self,
        conversation_id: i64,
        role: &str,
        content: &str,
        metadata: Option<&str>,
    ) -> Result<(), StoreError> {
        let now = now_rfc3339();
        let conn = self.db.conn();
        conn.execute(
            "INSERT INTO messages (conversation_id, role, content, timestamp, metadata)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![conversation_id, role, content, now, metadata],
        )?;
        conn.execute(
            "UPDATE conversations SET updated_at = ?1 WHERE id = ?2",
            params![now, conversation_id],
        )?;
        Ok(())
    }

    pub fn messages(&self, conversation_id: i64) -> Result<Vec<StoredMessage>, StoreError> {
        let conn = self.db.conn();
        let mut stmt = conn.prepare(
            "SELECT id, conversation_id, role, content, timestamp, metadata
             FROM messages WHERE conversation_id = ?1 ORDER BY timestamp ASC, id ASC",
        )?;
        let rows = stmt.query_map([conversation_id], |row| {
            Ok(StoredMessage {
                id: row.get(0)?,
                conversation_id: row.get(1)?,
                role: row.get(2)?,
                content: row.get(3)?,
                timestamp: row.get(4)?,
                metadata: row.get(5)?,
            })
        })?;
        Ok(rows.collect::<Result<_, _>>()?)
    }

    pub fn delete(&self, id: i64) -> Result<(), StoreError> {
        let mut conn = self.db.conn();
        let tx = conn.transaction()?;
        tx.execute("DELETE FROM messages WHERE conversation_id = ?1", [id])?;
        let affected = tx.execute("DELETE FROM conversations WHERE id = ?1", [id])?;
        if affected == 0 {
            return Err(StoreError::NotFound("conversation"));
        }
        tx.commit()?;
        Ok(())
    }

    /// Most recently updated conversation, if any.
    pub fn current(&self) -> Result<Option<i64>, StoreError> {
        Ok(self
            .db
            .conn()
            .query_row(
                "SELECT id FROM conversations ORDER BY updated_at DESC LIMIT 1",
                [],
                |row| row.get(0),
            )
            .optional()?)
    }
}
