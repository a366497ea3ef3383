//! WebSocket front door. Each accepted connection gets its own task and
//! its own orchestrator; events stream back as JSON text frames.

use std::sync::Arc;

use async_trait::async_trait;
use futures_util::stream::SplitSink;
use futures_util::{SinkExt, StreamExt};
use hearth_agent::{
    AgentEvent, ChatClient, DirectCall, EventSink, Orchestrator, OrchestratorConfig, ToolRegistry,
};
use hearth_memory::MemoryManager;
use serde::Deserialize;
use tokio::net::{TcpListener, TcpStream};
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{accept_async, WebSocketStream};
use tracing::{error, info, warn};

/// Client frames: a user utterance or a direct tool invocation.
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum Inbound {
    User { content: String },
    ToolCall(DirectCall),
}

struct WsSink {
    write: SplitSink<WebSocketStream<TcpStream>, Message>,
}

#[async_trait]
impl EventSink for WsSink {
    async fn emit(&mut self, event: AgentEvent) -> anyhow::Result<()> {
        let text = serde_json::to_string(&event)?;
        self.write.send(Message::Text(text)).await?;
        Ok(())
    }
}

pub struct Server {
    port: u16,
    model: Arc<dyn ChatClient>,
    registry: Arc<ToolRegistry>,
    manager: Arc<MemoryManager>,
}

impl Server {
    pub fn new(
        port: u16,
        model: Arc<dyn ChatClient>,
        registry: Arc<ToolRegistry>,
        manager: Arc<MemoryManager>,
    ) -> Self {
        Self {
            port,
            model,
            registry,
            manager,
        }
    }

    pub async fn run(self) -> anyhow::Result<()> {
        let listener = TcpListener::bind(("0.0.0.0", self.port)).await?;
        info!(port = self.port, "listening for websocket connections");

        loop {
            let (stream, peer) = listener.accept().await?;
            let model = self.model.clone();
            let registry = self.registry.clone();
            let manager = self.manager.clone();
            tokio::spawn(async move {
                info!(%peer, "connection opened");
                if let Err(err) = handle_connection(stream, model, registry, manager).await {
                    warn!(%peer, %err, "connection ended with error");
                }
                info!(%peer, "connection closed");
            });
        }
    }
}

async fn handle_connection(
    stream: TcpStream,
    model: Arc<dyn ChatClient>,
    registry: Arc<ToolRegistry>,
    manager: Arc<MemoryManager>,
) -> anyhow::Result<()> {
    let ws = accept_async(stream).await?;
    let (write, mut read) = ws.split();
    let mut sink = WsSink { write };

    let mut orchestrator =
        Orchestrator::new(model, registry, OrchestratorConfig::default()).with_store(manager);
    orchestrator.preload_history();

    while let Some(frame) = read.next().await {
        let frame = frame?;
        let text = match frame {
            Message::Text(text) => text,
            Message::Close(_) => break,
            Message::Ping(_) | Message::Pong(_) | Message::Binary(_) | Message::Frame(_) => {
                continue;
            }
        };

        match serde_json::from_str::<Inbound>(&text) {
            Ok(Inbound::User { content }) => {
                // A sink error here means the client is gone; the round's
                // partial output is discarded with it.
                if let Err(err) = orchestrator.handle_user_message(&content, &mut sink).await {
                    error!(%err, "round aborted");
                    break;
                }
            }
            Ok(Inbound::ToolCall(call)) => {
                if let Err(err) = orchestrator.handle_direct_call(call, &mut sink).await {
                    error!(%err, "direct call aborted");
                    break;
                }
            }
            Err(err) => {
                let _ = sink
                    .emit(AgentEvent::error(format!("invalid message: {err}")))
                    .await;
            }
        }
    }
    Ok(())
}
