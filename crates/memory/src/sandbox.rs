//! Directory allow-list backing every filesystem capability.
//!
//! Roots are persisted in `allowed_directories` and mirrored in an
//! in-memory cache so `is_allowed` never touches the database. The check
//! is lexical: paths are cleaned without resolving symlinks, then matched
//! per segment against each root.

use std::path::{Component, Path, PathBuf};
use std::sync::{Arc, RwLock};

use tracing::info;

use crate::database::{now_rfc3339, Database, StoreError};

pub struct AllowedDirs {
    db: Arc<Database>,
    cache: RwLock<Vec<PathBuf>>,
}

impl AllowedDirs {
    pub fn new(db: Arc<Database>) -> Result<Self, StoreError> {
        let dirs = Self {
            db,
            cache: RwLock::new(Vec::new()),
        };
        let loaded = dirs.load()?;
        *dirs.cache.write().unwrap_or_else(|p| p.into_inner()) = loaded;
        Ok(dirs)
    }

    /// Inserts `paths` only when the table is empty; existing rows are
    /// authoritative and seeding never adds to them.
    pub fn ensure_seed(&self, paths: &[PathBuf]) -> Result<(), StoreError> {
        let count: i64 =
            self.db
                .conn()
                .query_row("SELECT COUNT(1) FROM allowed_directories", [], |row| {
                    row.get(0)
                })?;
        if count > 0 {
            return Ok(());
        }
        for path in paths {
            self.add(path)?;
        }
        info!(roots = paths.len(), "seeded allowed directories");
        Ok(())
    }

    pub fn list(&self) -> Vec<PathBuf> {
        self.cache
            .read()
            .unwrap_or_else(|p| p.into_inner())
            .clone()
    }

    /// Persists a normalized root and publishes it to the cache before
    /// returning, so a following `is_allowed` on any thread sees it.
    pub fn add(&self, path: &Path) -> Result<(), StoreError> {
        let normalized = normalize(path)?;
        let mut cache = self.cache.write().unwrap_or_else(|p| p.into_inner());
        self.db.conn().execute(
            "INSERT OR IGNORE INTO allowed_directories(path, added_at) VALUES(?1, ?2)",
            rusqlite::params![normalized.to_string_lossy(), now_rfc3339()],
        )?;
        *cache = self.load()?;
        Ok(())
    }

    pub fn remove(&self, path: &Path) -> Result<(), StoreError> {
        let normalized = normalize(path)?;
        let mut cache = self.cache.write().unwrap_or_else(|p| p.into_inner());
        self.db.conn().execute(
            "DELETE FROM allowed_directories WHERE path = ?1",
            [normalized.to_string_lossy()],
        )?;
        *cache = self.load()?;
        Ok(())
    }

    /// True iff the cleaned path equals or descends from a cached root.
    /// `strip_prefix` matches whole segments, so `/data` never admits
    /// `/database`.
    pub fn is_allowed(&self, path: &Path) -> bool {
        let Ok(candidate) = normalize(path) else {
            return false;
        };
        let cache = self.cache.read().unwrap_or_else(|p| p.into_inner());
        cache
            .iter()
            .any(|root| candidate.strip_prefix(root).is_ok())
    }

    fn load(&self) -> Result<Vec<PathBuf>, StoreError> {
        let conn = self.db.conn();
        let mut stmt =
            conn.prepare("SELECT path FROM allowed_directories ORDER BY id ASC")?;
        let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;
        let mut paths = Vec::new();
        for row in rows {
            paths.push(PathBuf::from(row?));
        }
        Ok(paths)
    }
}

/// Absolute, lexically cleaned form of `path`: relative input is anchored
/// at the working directory, `.` drops, `..` pops. Symlinks are not
/// resolved and the path need not exist.
pub fn normalize(path: &Path) -> Result<PathBuf, std::io::Error> {
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()?.join(path)
    };

    let mut cleaned = PathBuf::new();
    for component in absolute.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                cleaned.pop();
            }
            other => cleaned.push(other),
        }
    }
    Ok(cleaned)
}
