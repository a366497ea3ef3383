//! Streaming chat client for a local Ollama instance.
//!
//! `POST {endpoint}/api/chat` with `stream: true` answers newline-delimited
//! JSON chunks; each `message.content` fragment is forwarded through the
//! sink as it arrives and the accumulated text is returned once `done`.

use async_trait::async_trait;
use futures_util::StreamExt;
use hearth_agent::{ChatClient, ChatError, ChatMessage, TokenSink};
use serde::{Deserialize, Serialize};
use tracing::debug;

pub struct OllamaClient {
    http: reqwest::Client,
    endpoint: String,
    model: String,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    stream: bool,
}

#[derive(Deserialize, Default)]
#[serde(default)]
struct ChatChunk {
    message: ChunkMessage,
    done: bool,
}

#[derive(Deserialize, Default)]
#[serde(default)]
struct ChunkMessage {
    content: String,
}

impl OllamaClient {
    pub fn new(endpoint: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            endpoint: endpoint.into(),
            model: model.into(),
        }
    }

    async fn feed_line(
        line: &str,
        accumulated: &mut String,
        sink: &mut dyn TokenSink,
    ) -> Result<bool, ChatError> {
        let chunk: ChatChunk = serde_json::from_str(line)
            .map_err(|err| ChatError::Service(format!("bad stream chunk: {err}")))?;
        if !chunk.message.content.is_empty() {
            accumulated.push_str(&chunk.message.content);
            sink.token(&chunk.message.content)
                .await
                .map_err(|_| ChatError::SinkClosed)?;
        }
        Ok(chunk.done)
    }
}

#[async_trait]
impl ChatClient for OllamaClient {
    async fn chat(
        &self,
        messages: &[ChatMessage],
        sink: &mut dyn TokenSink,
    ) -> Result<String, ChatError> {
        let url = format!("{}/api/chat", self.endpoint);
        debug!(model = %self.model, turns = messages.len(), "requesting completion");

        let response = self
            .http
            .post(&url)
            .json(&ChatRequest {
                model: &self.model,
                messages,
                stream: true,
            })
            .send()
            .await
            .map_err(|err| ChatError::Transport(err.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(ChatError::Service(format!("{status}: {body}")));
        }

        let mut stream = response.bytes_stream();
        let mut buffer = String::new();
        let mut accumulated = String::new();

        while let Some(chunk) = stream.next().await {
            let bytes = chunk.map_err(|err| ChatError::Transport(err.to_string()))?;
            buffer.push_str(&String::from_utf8_lossy(&bytes));

            while let Some(newline) = buffer.find('\n') {
                let line: String = buffer.drain(..=newline).collect();
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }
                if Self::feed_line(line, &mut accumulated, sink).await? {
                    return Ok(accumulated);
                }
            }
        }

        // leftover without a trailing newline
        let line = buffer.trim();
        if !line.is_empty() {
            Self::feed_line(line, &mut accumulated, sink).await?;
        }
        Ok(accumulated)
    }
}
