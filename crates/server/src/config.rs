//! Process configuration. A JSON file supplies overrides on top of
//! workable local defaults; `HEARTH_CONFIG` points at an alternate file.

use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::{Deserialize, Serialize};
use tracing::info;

const DEFAULT_CONFIG_PATH: &str = "hearth.json";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub ollama_endpoint: String,
    pub model: String,
    pub database_path: PathBuf,
    pub port: u16,
    /// Sandbox roots seeded into an empty allow-list on first start.
    pub allowed_paths: Vec<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            ollama_endpoint: "http://localhost:11434".to_string(),
            model: "llama3.1".to_string(),
            database_path: PathBuf::from("./hearth.db"),
            port: 8080,
            allowed_paths: Vec::new(),
        }
    }
}

impl Config {
    /// Reads the file named by `HEARTH_CONFIG` (default `hearth.json`).
    /// A missing file yields the defaults; a malformed one is an error.
    pub fn load() -> anyhow::Result<Self> {
        let path = std::env::var("HEARTH_CONFIG")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_CONFIG_PATH));
        Self::load_from(&path)
    }

    pub fn load_from(path: &Path) -> anyhow::Result<Self> {
        if !path.exists() {
            info!(path = %path.display(), "no config file, using defaults");
            return Ok(Self::default());
        }
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        let config: Self = serde_json::from_str(&raw)
            .with_context(|| format!("failed to parse config {}", path.display()))?;
        info!(path = %path.display(), model = %config.model, "loaded config");
        Ok(config)
    }
}
