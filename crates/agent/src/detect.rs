//! Tool-call detection over free-form model output.
//!
//! Three strategies run in a fixed order: a balanced brace-delimited JSON
//! object carrying a name key, a `<tool_call>` tagged envelope, and a
//! loose `identifier(key="value")` form. Structured syntaxes are tried
//! first because prose routinely contains parentheses, which makes the
//! loose form ambiguous. The first successful parse wins; anything
//! unparsable falls through, and a total miss means the text is a final
//! natural-language answer.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;
use serde_json::{Map, Value};

static NAME_KEY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#""(?:tool|function|name)"\s*:"#).expect("static regex"));

static TAGGED: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)<tool_call[^>]*>(.*?)</tool_call>").expect("static regex"));

static FN_CALL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"([A-Za-z_]\w*)\s*\(([^)]*)\)").expect("static regex"));

/// A structured (name, arguments) request recovered from model text or
/// supplied directly by a client.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ToolCall {
    #[serde(alias = "tool", alias = "function")]
    pub name: String,
    #[serde(default = "empty_object", alias = "args")]
    pub arguments: Value,
}

fn empty_object() -> Value {
    Value::Object(Map::new())
}

/// Recovers the first structured tool call from `text`, or `None` when
/// the text should be treated as a final answer.
pub fn detect_tool_call(text: &str) -> Option<ToolCall> {
    detect_json_object(text)
        .or_else(|| detect_tagged(text))
        .or_else(|| detect_fn_syntax(text))
}

/// Strategy 1: the smallest balanced `{...}` span containing a recognized
/// name key that parses into a call.
fn detect_json_object(text: &str) -> Option<ToolCall> {
    let bytes = text.as_bytes();
    let mut best: Option<(usize, ToolCall)> = None;

    for (start, _) in text.char_indices().filter(|&(_, c)| c == '{') {
        let Some(end) = balanced_end(bytes, start) else {
            continue;
        };
        let candidate = &text[start..=end];
        if !NAME_KEY.is_match(candidate) {
            continue;
        }
        let Some(call) = parse_call(candidate) else {
            continue;
        };
        let len = end + 1 - start;
        if best.as_ref().map_or(true, |(best_len, _)| len < *best_len) {
            best = Some((len, call));
        }
    }

    best.map(|(_, call)| call)
}

/// Strategy 2: a `<tool_call>` envelope whose inner text is one JSON call.
fn detect_tagged(text: &str) -> Option<ToolCall> {
    let caps = TAGGED.captures(text)?;
    parse_call(caps.get(1)?.as_str().trim())
}

/// Strategy 3: `name(key="value", key2="value2")`. Best effort only:
/// no nested parentheses, no escaped quotes.
fn detect_fn_syntax(text: &str) -> Option<ToolCall> {
    let caps = FN_CALL.captures(text)?;
    let name = caps.get(1)?.as_str().to_string();
    let raw_args = caps.get(2).map_or("", |m| m.as_str());
    Some(ToolCall {
        name,
        arguments: parse_simple_args(raw_args),
    })
}

fn parse_call(candidate: &str) -> Option<ToolCall> {
    serde_json::from_str::<ToolCall>(candidate)
        .ok()
        .filter(|call| !call.name.is_empty())
}

/// Flat string-keyed, string-valued argument mapping: split on top-level
/// commas and `=`, trim whitespace and surrounding quotes.
fn parse_simple_args(raw: &str) -> Value {
    let mut args = Map::new();
    for part in raw.split(',') {
        let Some((key, value)) = part.split_once('=') else {
            continue;
        };
        let key = key.trim();
        if key.is_empty() {
            continue;
        }
        let value = value.trim().trim_matches(|c| c == '"' || c == '\'');
        args.insert(key.to_string(), Value::String(value.to_string()));
    }
    Value::Object(args)
}

/// Index of the `}` closing the brace opened at `start`, honoring string
/// literals and escapes. `None` when the object never closes.
fn balanced_end(bytes: &[u8], start: usize) -> Option<usize> {
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (idx, &byte) in bytes.iter().enumerate().skip(start) {
        if in_string {
            if escaped {
                escaped = false;
            } else if byte == b'\\' {
                escaped = true;
            } else if byte == b'"' {
                in_string = false;
            }
            continue;
        }
        match byte {
            b'"' => in_string = true,
            b'{' => depth += 1,
            b'}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(idx);
                }
            }
            _ => {}
        }
    }
    None
}
