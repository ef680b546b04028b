//! Event records supplied by the agent runtime on stdin.

use crate::core::error::GateError;
use serde::Deserialize;
use std::io::Read;
use std::path::PathBuf;

/// One intercepted action: a pending tool invocation or the end of a session.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct EventRecord {
    pub tool_name: Option<String>,
    pub tool_input: ToolInput,
    #[serde(alias = "transcript_reference")]
    pub transcript_path: Option<String>,
    /// Working directory the host ran the tool in.
    pub cwd: Option<String>,
}

/// The named fields of a tool invocation that the gates inspect.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ToolInput {
    pub file_path: Option<String>,
    pub content: Option<String>,
    pub command: Option<String>,
    pub skill: Option<String>,
    pub subagent_type: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    ToolInvocation,
    SessionEnd,
}

impl EventRecord {
    pub fn kind(&self) -> Option<EventKind> {
        if self.tool_name.as_deref().is_some_and(|t| !t.is_empty()) {
            Some(EventKind::ToolInvocation)
        } else if self
            .transcript_path
            .as_deref()
            .is_some_and(|t| !t.is_empty())
        {
            Some(EventKind::SessionEnd)
        } else {
            None
        }
    }

    pub fn tool(&self) -> &str {
        self.tool_name.as_deref().unwrap_or("")
    }

    pub fn is_tool(&self, name: &str) -> bool {
        self.tool() == name
    }

    pub fn file_path(&self) -> &str {
        self.tool_input.file_path.as_deref().unwrap_or("")
    }

    pub fn command(&self) -> &str {
        self.tool_input.command.as_deref().unwrap_or("")
    }

    pub fn content(&self) -> &str {
        self.tool_input.content.as_deref().unwrap_or("")
    }

    /// Directory identifying the repository the event belongs to.
    pub fn working_dir(&self) -> Result<PathBuf, GateError> {
        match self.cwd.as_deref() {
            Some(cwd) if !cwd.is_empty() => Ok(PathBuf::from(cwd)),
            _ => Ok(std::env::current_dir()?),
        }
    }
}

/// Read one JSON event record. Empty input yields `None`.
pub fn read_event<R: Read>(mut reader: R) -> Result<Option<EventRecord>, GateError> {
    let mut raw = String::new();
    reader.read_to_string(&mut raw)?;
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(None);
    }
    Ok(Some(serde_json::from_str(raw)?))
}
