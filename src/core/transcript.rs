//! Session history reader.
//!
//! A history is newline-delimited JSON, one entry per line. Entries we cannot
//! decode are skipped: the log is append-only and may be mid-write.

use crate::core::error::GateError;
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

#[derive(Debug, Clone, Deserialize)]
pub struct HistoryEntry {
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub message: Option<Message>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Message {
    #[serde(default)]
    pub content: MessageContent,
}

/// User turns may carry a bare string; assistant turns carry typed blocks.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum MessageContent {
    Text(String),
    Blocks(#[serde(deserialize_with = "decode_blocks")] Vec<ContentBlock>),
}

/// Decode blocks one at a time so a malformed block drops only itself.
fn decode_blocks<'de, D>(deserializer: D) -> Result<Vec<ContentBlock>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Vec::<Value>::deserialize(deserializer)?;
    Ok(raw
        .into_iter()
        .filter_map(|value| match serde_json::from_value(value) {
            Ok(block) => Some(block),
            Err(e) => {
                tracing::trace!("skipping content block: {}", e);
                None
            }
        })
        .collect())
}

impl Default for MessageContent {
    fn default() -> Self {
        MessageContent::Blocks(Vec::new())
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentBlock {
    Text {
        #[serde(default)]
        text: String,
    },
    ToolUse {
        #[serde(default)]
        name: String,
        #[serde(default)]
        input: Value,
    },
    #[serde(other)]
    Other,
}

impl HistoryEntry {
    pub fn is_assistant(&self) -> bool {
        self.kind == "assistant"
    }

    pub fn is_user(&self) -> bool {
        self.kind == "user"
    }

    pub fn blocks(&self) -> &[ContentBlock] {
        match self.message.as_ref().map(|m| &m.content) {
            Some(MessageContent::Blocks(blocks)) => blocks,
            _ => &[],
        }
    }

    /// All plain text in the entry, whether bare or in `text` blocks.
    pub fn texts(&self) -> Vec<&str> {
        match self.message.as_ref().map(|m| &m.content) {
            Some(MessageContent::Text(text)) => vec![text.as_str()],
            Some(MessageContent::Blocks(blocks)) => blocks
                .iter()
                .filter_map(|b| match b {
                    ContentBlock::Text { text } => Some(text.as_str()),
                    _ => None,
                })
                .collect(),
            None => Vec::new(),
        }
    }
}

/// String field of a tool invocation's input, empty when absent.
pub fn input_str<'a>(input: &'a Value, field: &str) -> &'a str {
    input.get(field).and_then(Value::as_str).unwrap_or("")
}

/// Parse history lines, skipping blanks and undecodable entries.
pub fn parse_history<R: BufRead>(reader: R) -> Result<Vec<HistoryEntry>, GateError> {
    let mut entries = Vec::new();
    for (idx, line) in reader.lines().enumerate() {
        let line = line?;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        match serde_json::from_str::<HistoryEntry>(line) {
            Ok(entry) => entries.push(entry),
            Err(e) => tracing::trace!("skipping history line {}: {}", idx + 1, e),
        }
    }
    Ok(entries)
}

pub fn read_history(path: &Path) -> Result<Vec<HistoryEntry>, GateError> {
    let file = File::open(path).map_err(|e| {
        GateError::HistoryUnavailable(format!("{}: {}", path.display(), e))
    })?;
    parse_history(BufReader::new(file))
}
