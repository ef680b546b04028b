//! Evidence extraction: reduce a session history to what the rules inspect.

use crate::core::classify::{self, PathClass};
use crate::core::config::ClassifyConfig;
use crate::core::transcript::{ContentBlock, HistoryEntry, input_str};
use std::collections::BTreeSet;

/// Flat, order-insensitive summary of one session.
#[derive(Debug, Clone, Default)]
pub struct Evidence {
    pub tool_names: BTreeSet<String>,
    /// Skills invoked through the `Skill` tool.
    pub skills: BTreeSet<String>,
    /// One entry per edit invocation, so repeated edits to a file all count.
    pub edits: Vec<String>,
    pub code_edits: Vec<String>,
    /// Lower-cased assistant text, commands and paths.
    pub text: String,
    /// Lower-cased user text.
    pub user_text: String,
}

impl Evidence {
    pub fn collect(history: &[HistoryEntry], config: &ClassifyConfig) -> Self {
        let mut ev = Evidence::default();
        let mut parts: Vec<&str> = Vec::new();
        let mut user_parts: Vec<&str> = Vec::new();

        for entry in history {
            if entry.is_user() {
                user_parts.extend(entry.texts());
                continue;
            }
            if !entry.is_assistant() {
                continue;
            }
            for block in entry.blocks() {
                match block {
                    ContentBlock::ToolUse { name, input } => {
                        ev.tool_names.insert(name.clone());
                        let file_path = input_str(input, "file_path");
                        if !file_path.is_empty() {
                            parts.push(file_path);
                            if config.is_edit_tool(name) {
                                ev.record_edit(file_path, config);
                            }
                        }
                        for field in ["command", "subagent_type"] {
                            let value = input_str(input, field);
                            if !value.is_empty() {
                                parts.push(value);
                            }
                        }
                        if name == "Skill" {
                            let skill = input_str(input, "skill");
                            if !skill.is_empty() {
                                ev.skills.insert(skill.to_string());
                            }
                        }
                    }
                    ContentBlock::Text { text } => parts.push(text),
                    ContentBlock::Other => {}
                }
            }
        }

        ev.text = parts.join(" ").to_lowercase();
        ev.user_text = user_parts.join(" ").to_lowercase();
        ev
    }

    fn record_edit(&mut self, path: &str, config: &ClassifyConfig) {
        match classify::classify_path(path, config) {
            Some(PathClass::Code) => {
                self.edits.push(path.to_string());
                self.code_edits.push(path.to_string());
            }
            Some(PathClass::Doc) => self.edits.push(path.to_string()),
            None => {}
        }
    }

    pub fn code_edit_count(&self) -> usize {
        self.code_edits.len()
    }

    pub fn doc_edit_count(&self) -> usize {
        self.edits.len() - self.code_edits.len()
    }

    /// Case-insensitive phrase search over the assistant blob.
    pub fn mentions(&self, phrase: &str) -> bool {
        self.text.contains(&phrase.to_lowercase())
    }

    pub fn used_tool(&self, name: &str) -> bool {
        self.tool_names.contains(name)
    }
}
