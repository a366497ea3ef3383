//! Literal-substring document index. Deliberately not a vector store:
//! lookups are SQL LIKE over file name and content with a naive
//! occurrence score and a context snippet.

use std::sync::Arc;

use serde::Serialize;
use sha2::{Digest, Sha256};

use crate::database::{Database, StoreError};

const SNIPPET_LEN: usize = 160;

#[derive(Debug, Clone, Serialize)]
pub struct SearchHit {
    pub path: String,
    pub name: String,
    pub mod_time: String,
    pub size: i64,
    pub snippet: String,
    pub score: f64,
}

pub struct TextIndex {
    db: Arc<Database>,
}

impl TextIndex {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// Inserts or refreshes one document keyed by path. The content hash
    /// lets callers skip unchanged files on re-index.
    pub fn upsert(
        &self,
        path: &str,
        name: &str,
        mod_time: &str,
        size: i64,
        content: &str,
    ) -> Result<(), StoreError> {
        let hash = hex::encode(Sha256::digest(content.as_bytes()));
        self.db.conn().execute(
            "INSERT INTO text_index(path, name, mod_time, size, hash, content)
             VALUES(?1, ?2, ?3, ?4, ?5, ?6)
             ON CONFLICT(path) DO UPDATE SET
                 name = excluded.name,
                 mod_time = excluded.mod_time,
                 size = excluded.size,
                 hash = excluded.hash,
                 content = excluded.content",
            rusqlite::params![path, name, mod_time, size, hash, content],
        )?;
        Ok(())
    }

    pub fn hash_for(&self, path: &str) -> Result<Option<String>, StoreError> {
        use rusqlite::OptionalExtension;
        Ok(self
            .db
            .conn()
            .query_row("SELECT hash FROM text_index WHERE path = ?1", [path], |row| {
                row.get(0)
            })
            .optional()?)
    }

    /// LIKE search over name and content, newest documents first,
    /// optionally limited to paths under `path_prefix`.
    pub fn search(
        &self,
        query: &str,
        limit: usize,
        path_prefix: Option<&str>,
    ) -> Result<Vec<SearchHit>, StoreError> {
        let limit = if limit == 0 { 10 } else { limit };
        // Stripping % keeps user input out of LIKE metacharacters.
        let like = format!("%{}%", query.replace(['%', '_'], ""));

        let conn = self.db.conn();
        let mut stmt;
        let rows = match path_prefix {
            Some(prefix) => {
                let prefix_like = format!("{}%", prefix.trim_end_matches('/'));
                stmt = conn.prepare(
                    "SELECT path, name, mod_time, size, content FROM text_index
                     WHERE (name LIKE ?1 OR content LIKE ?1) AND path LIKE ?2
                     ORDER BY mod_time DESC LIMIT ?3",
                )?;
                stmt.query_map(
                    rusqlite::params![like, prefix_like, limit as i64],
                    row_to_parts,
                )?
            }
            None => {
                stmt = conn.prepare(
                    "SELECT path, name, mod_time, size, content FROM text_index
                     WHERE name LIKE ?1 OR content LIKE ?1
                     ORDER BY mod_time DESC LIMIT ?2",
                )?;
                stmt.query_map(rusqlite::params![like, limit as i64], row_to_parts)?
            }
        };

        let mut hits = Vec::new();
        for row in rows {
            let (path, name, mod_time, size, content) = row?;
            hits.push(SearchHit {
                snippet: make_snippet(&content, query, SNIPPET_LEN),
                score: score(&name, &content, query),
                path,
                name,
                mod_time,
                size,
            });
        }
        Ok(hits)
    }

    /// Drops everything indexed under `prefix`; used when a sandbox root
    /// is revoked.
    pub fn delete_by_prefix(&self, prefix: &str) -> Result<usize, StoreError> {
        let like = format!("{}%", prefix.trim_end_matches('/'));
        Ok(self
            .db
            .conn()
            .execute("DELETE FROM text_index WHERE path LIKE ?1", [like])?)
    }

    pub fn len(&self) -> Result<usize, StoreError> {
        let count: i64 =
            self.db
                .conn()
                .query_row("SELECT COUNT(1) FROM text_index", [], |row| row.get(0))?;
        Ok(count as usize)
    }
}

type RowParts = (String, String, String, i64, String);

fn row_to_parts(row: &rusqlite::Row<'_>) -> rusqlite::Result<RowParts> {
    Ok((
        row.get(0)?,
        row.get(1)?,
        row.get(2)?,
        row.get(3)?,
        row.get(4)?,
    ))
}

/// Window of roughly `max` bytes around the first case-insensitive match,
/// clamped to char boundaries.
fn make_snippet(content: &str, query: &str, max: usize) -> String {
    if content.is_empty() {
        return String::new();
    }
    let found = content.to_lowercase().find(&query.to_lowercase());
    let (mut start, mut end) = match found {
        Some(idx) => {
            let start = idx.saturating_sub(max / 4);
            (start, (start + max).min(content.len()))
        }
        None => (0, max.min(content.len())),
    };
    while start > 0 && !content.is_char_boundary(start) {
        start -= 1;
    }
    while end < content.len() && !content.is_char_boundary(end) {
        end += 1;
    }
    content[start..end].to_string()
}

/// Name matches weigh five times a content match.
fn score(name: &str, content: &str, query: &str) -> f64 {
    let query = query.to_lowercase();
    if query.is_empty() {
        return 0.0;
    }
    let name_hits = name.to_lowercase().matches(&query).count();
    let content_hits = content.to_lowercase().matches(&query).count();
    (name_hits * 5 + content_hits) as f64
}
