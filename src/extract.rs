//! JSON recovery from raw model output.
//!
//! Model responses are unreliable: the payload may arrive bare, wrapped in
//! a fenced code block, or buried in prose next to other braced text. Three
//! strategies run in order and the first successful parse wins:
//!
//! 1. Parse the whole trimmed response directly.
//! 2. Parse the interior of each fenced code block, in order of appearance.
//! 3. Scan for top-level `{...}` spans by brace depth and parse each one.

use serde_json::Value;
use thiserror::Error;

/// How much of the offending response an extraction error carries.
const PREVIEW_LEN: usize = 200;

/// No parseable JSON anywhere in the response.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("could not extract valid JSON from response; preview: {preview}")]
pub struct ExtractError {
    /// First ~200 characters of the offending text.
    pub preview: String,
}

/// Extract the first parseable JSON value from a raw model response.
pub fn extract_json(raw: &str) -> Result<Value, ExtractError> {
    let trimmed = raw.trim();

    if let Ok(value) = serde_json::from_str::<Value>(trimmed) {
        return Ok(value);
    }

    for block in fenced_blocks(raw) {
        if let Ok(value) = serde_json::from_str::<Value>(block.trim()) {
            return Ok(value);
        }
    }

    for span in braced_spans(raw) {
        if let Ok(value) = serde_json::from_str::<Value>(span) {
            return Ok(value);
        }
    }

    Err(ExtractError {
        preview: preview(trimmed),
    })
}

/// Bounded preview of a response, for diagnostics.
pub(crate) fn preview(text: &str) -> String {
    let short: String = text.chars().take(PREVIEW_LEN).collect();
    if text.chars().count() > PREVIEW_LEN {
        format!("{short}...")
    } else {
        short
    }
}

/// Interiors of triple-backtick fenced blocks, in order of appearance.
/// A leading language tag line ("json", "JSON", ...) is stripped.
fn fenced_blocks(text: &str) -> Vec<&str> {
    let mut blocks = Vec::new();
    let mut rest = text;
    while let Some(open) = rest.find("```") {
        let after_open = &rest[open + 3..];
        let Some(close) = after_open.find("```") else {
            break;
        };
        let mut inner = &after_open[..close];
        if let Some(newline) = inner.find('\n') {
            let tag = inner[..newline].trim();
            if !tag.is_empty() && tag.chars().all(|c| c.is_ascii_alphanumeric()) {
                inner = &inner[newline + 1..];
            }
        }
        blocks.push(inner);
        rest = &after_open[close + 3..];
    }
    blocks
}

/// Top-level `{...}` spans found by tracking brace nesting depth.
fn braced_spans(text: &str) -> Vec<&str> {
    let mut spans = Vec::new();
    let mut depth = 0usize;
    let mut start = None;
    for (i, ch) in text.char_indices() {
        match ch {
            '{' => {
                if depth == 0 {
                    start = Some(i);
                }
                depth += 1;
            }
            '}' => {
                if depth > 0 {
                    depth -= 1;
                    if depth == 0 {
                        if let Some(s) = start.take() {
                            spans.push(&text[s..=i]);
                        }
                    }
                }
            }
            _ => {}
        }
    }
    spans
}
