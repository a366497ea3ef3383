//! Web search over the DuckDuckGo Instant Answer API. No API key, no
//! tracking; results are best-effort summaries capped at five rows.

use async_trait::async_trait;
use hearth_agent::{Tool, ToolDescription, ToolError, ToolResult};
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::Duration;
use tracing::debug;

use crate::parse_args;

const MAX_RESULTS: usize = 5;
const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36";

#[derive(Deserialize)]
struct WebSearchArgs {
    query: String,
}

#[derive(Deserialize, Default)]
#[serde(default)]
struct InstantAnswer {
    #[serde(rename = "AbstractText")]
    abstract_text: String,
    #[serde(rename = "AbstractURL")]
    abstract_url: String,
    #[serde(rename = "AbstractSource")]
    abstract_source: String,
    #[serde(rename = "Heading")]
    heading: String,
    #[serde(rename = "RelatedTopics")]
    related_topics: Vec<Topic>,
    #[serde(rename = "Results")]
    results: Vec<Topic>,
}

#[derive(Deserialize, Default)]
#[serde(default)]
struct Topic {
    #[serde(rename = "Text")]
    text: String,
    #[serde(rename = "FirstURL")]
    first_url: String,
}

pub struct WebSearchTool {
    http: reqwest::Client,
    endpoint: String,
    description: ToolDescription,
}

impl Default for WebSearchTool {
    fn default() -> Self {
        Self::new()
    }
}

impl WebSearchTool {
    pub fn new() -> Self {
        Self::with_endpoint("https://api.duckduckgo.com")
    }

    /// Endpoint override for tests.
    pub fn with_endpoint(endpoint: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::builder()
                .timeout(Duration::from_secs(15))
                .build()
                .unwrap_or_default(),
            endpoint: endpoint.into(),
            description: ToolDescription::new(
                "web_search",
                "Searches the web for a query and returns summarized results.",
                json!({
                    "type": "object",
                    "properties": {
                        "query": {"type": "string", "description": "Search query"}
                    },
                    "required": ["query"]
                }),
            ),
        }
    }
}

#[async_trait]
impl Tool for WebSearchTool {
    fn description(&self) -> &ToolDescription {
        &self.description
    }

    async fn invoke(&self, args: Value) -> Result<ToolResult, ToolError> {
        let args: WebSearchArgs = parse_args(args)?;
        if args.query.is_empty() {
            return Err(ToolError::InvalidInput("query is required".into()));
        }

        let url = format!(
            "{}/?q={}&format=json&no_redirect=1&no_html=1&skip_disambig=1",
            self.endpoint,
            urlencoding::encode(&args.query)
        );
        debug!(query = %args.query, "web search");

        let response = self
            .http
            .get(&url)
            .header(reqwest::header::USER_AGENT, USER_AGENT)
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await
            .map_err(|err| ToolError::Invocation(format!("request failed: {err}")))?;
        let body = response
            .text()
            .await
            .map_err(|err| ToolError::Invocation(format!("failed to read response: {err}")))?;

        // The API sometimes answers with an HTML page instead of JSON.
        if body.trim_start().starts_with('<') {
            return Err(ToolError::Invocation(format!(
                "search returned no structured results for '{}'; try a more specific query",
                args.query
            )));
        }

        let answer: InstantAnswer = serde_json::from_str(&body)
            .map_err(|err| ToolError::Invocation(format!("failed to parse response: {err}")))?;

        let results = collect_results(&answer);
        if results.is_empty() {
            return Err(ToolError::Invocation(format!(
                "no results found for '{}'",
                args.query
            )));
        }
        Ok(ToolResult::new(Value::Array(results)))
    }
}

fn collect_results(answer: &InstantAnswer) -> Vec<Value> {
    let mut results = Vec::new();
    if !answer.abstract_text.is_empty() && !answer.abstract_url.is_empty() {
        results.push(json!({
            "title": answer.heading,
            "snippet": answer.abstract_text,
            "url": answer.abstract_url,
            "source": answer.abstract_source,
        }));
    }
    for topic in answer.related_topics.iter().chain(answer.results.iter()) {
        if results.len() >= MAX_RESULTS {
            break;
        }
        if topic.text.is_empty() || topic.first_url.is_empty() {
            continue;
        }
        results.push(json!({
            "title": extract_title(&topic.text),
            "snippet": topic.text,
            "url": topic.first_url,
            "source": "DuckDuckGo",
        }));
    }
    results.truncate(MAX_RESULTS);
    results
}

/// First sentence when it is short enough, otherwise a truncated prefix.
fn extract_title(text: &str) -> String {
    if text.is_empty() {
        return "Result".to_string();
    }
    if let Some(idx) = text.find('.') {
        if idx > 0 && idx < 60 {
            return text[..idx].to_string();
        }
    }
    if text.chars().count() > 60 {
        let prefix: String = text.chars().take(57).collect();
        return format!("{prefix}...");
    }
    text.to_string()
}
