//! Fallback tool gate.
//!
//! The fallback tool (rclone by default) is a read-only escape hatch for when
//! the workspace integrations fail. It runs only once the user has approved the
//! fallback and the agent has tagged the command with the approval token.

use crate::core::error::GateError;
use crate::core::event::EventRecord;
use crate::core::gate::{Gate, GateContext, Notice, Verdict};
use crate::core::output::Phase;
use crate::core::rules;

pub struct FallbackToolGate;

impl Gate for FallbackToolGate {
    fn name(&self) -> &'static str {
        "fallback-tool"
    }

    fn evaluate(&self, event: &EventRecord, ctx: &GateContext) -> Result<Verdict, GateError> {
        let fallback = &ctx.config.fallback;
        let command = event.command();
        if !rules::mentions_tool(command, &fallback.tool) {
            return Ok(Verdict::Allow);
        }
        if !fallback.bypass_token.is_empty() && command.contains(&fallback.bypass_token) {
            return Ok(Verdict::Allow);
        }
        let tool = &fallback.tool;
        let token = &fallback.bypass_token;
        Ok(Verdict::Block(Notice::new(
            Phase::PreToolUse,
            format!(
                "BLOCKED: {tool} command detected.\n\
                 \n\
                 {tool} is a READ-ONLY FALLBACK. Required process:\n\
                 1. Use Google Drive/Sheets/Workspace MCP tools FIRST\n\
                 2. If MCP fails -> tell user the failure\n\
                 3. Get explicit user permission to use {tool} as fallback\n\
                 4. Re-run with {token} in the command\n\
                 \n\
                 NEVER use {tool} for write/delete operations (deletefile, move, copy-to-remote).\n\
                 NEVER assume .xlsx on Drive is a standalone file -- Google Sheets appear as .xlsx in {tool}.\n\
                 \n\
                 Example: {tool} lsf gdrive: {token} --max-depth 3"
            ),
        )))
    }
}
