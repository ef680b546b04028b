//! Reminder before outgoing email.

use crate::core::error::GateError;
use crate::core::event::EventRecord;
use crate::core::gate::{Gate, GateContext, Notice, Verdict};
use crate::core::output::Phase;

pub struct EmailReminderGate;

impl Gate for EmailReminderGate {
    fn name(&self) -> &'static str {
        "email-reminder"
    }

    fn evaluate(&self, event: &EventRecord, ctx: &GateContext) -> Result<Verdict, GateError> {
        let tool = event.tool();
        if !ctx.config.drafting.send_tools.iter().any(|t| t == tool) {
            return Ok(Verdict::Allow);
        }
        Ok(Verdict::Advise(Notice::new(
            Phase::PreToolUse,
            "Reminder: You are about to send/draft an email. \
             Ensure you have loaded the message-drafting skill \
             (~/.claude/skills/message-drafting/SKILL.md) and followed its rules: \
             draft review workflow, post-send disposition, GR email addressing, internal email format.",
        )))
    }
}
