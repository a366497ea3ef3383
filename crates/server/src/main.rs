//! Process entry point: config, storage, sandbox seed, tool registry,
//! then the websocket accept loop.

mod config;
mod ollama;
mod ws;

use std::sync::Arc;

use hearth_memory::{AllowedDirs, Database, MemoryManager, RpStore, TextIndex};
use hearth_tools::standard_registry;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::config::Config;
use crate::ollama::OllamaClient;
use crate::ws::Server;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Config::load()?;

    let db = Database::open(&config.database_path)?;
    let dirs = Arc::new(AllowedDirs::new(db.clone())?);
    dirs.ensure_seed(&config.allowed_paths)?;
    let index = Arc::new(TextIndex::new(db.clone()));
    let rp = Arc::new(RpStore::new(db.clone()));
    let manager = Arc::new(MemoryManager::new(db)?);

    let registry = Arc::new(standard_registry(dirs, index, rp));
    info!(tools = registry.len(), "tool registry ready");

    let model = Arc::new(OllamaClient::new(&config.ollama_endpoint, &config.model));

    Server::new(config.port, model, registry, manager).run().await
}
