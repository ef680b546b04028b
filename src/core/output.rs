//! Bordered text frame for hook feedback.
//!
//! Hook output is read by the agent and by whoever watches the terminal, so it
//! is plain ASCII with a fixed-width rule; no colour, no box-drawing glyphs.

const RULE_WIDTH: usize = 70;

/// Which hook phase produced the notice; becomes the frame header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    PreToolUse,
    PostToolUse,
    Stop,
}

impl Phase {
    pub fn header(self) -> &'static str {
        match self {
            Phase::PreToolUse => "PRETOOLUSE HOOK OUTPUT",
            Phase::PostToolUse => "POSTTOOLUSE HOOK OUTPUT",
            Phase::Stop => "[STOP] HOOK OUTPUT",
        }
    }
}

/// Frame `content` under `header`, one `| ` prefixed row per line.
pub fn render_box(header: &str, content: &str) -> String {
    let rule = format!("+{}", "=".repeat(RULE_WIDTH));
    let rows = content
        .split('\n')
        .map(|line| format!("| {}", line))
        .collect::<Vec<_>>()
        .join("\n");
    format!("\n{rule}\n| {header}\n{rule}\n{rows}\n{rule}\n")
}
