//! Knowledge-architecture gates.
//!
//! Governed files (CLAUDE.md, SKILL.md) must be edited with the
//! knowledge-architecture skill loaded. The first edit attempt per file kind is
//! blocked with a pointer to the skill; the retry goes through.

use crate::core::classify;
use crate::core::error::GateError;
use crate::core::event::EventRecord;
use crate::core::gate::{self, Gate, GateContext, Notice, Verdict};
use crate::core::output::Phase;
use crate::core::rules;
use crate::core::store::{MarkerKey, Namespace};

pub struct GovernedFileGate;

impl Gate for GovernedFileGate {
    fn name(&self) -> &'static str {
        "governed-file"
    }

    fn evaluate(&self, event: &EventRecord, ctx: &GateContext) -> Result<Verdict, GateError> {
        if !ctx.config.classify.is_edit_tool(event.tool()) {
            return Ok(Verdict::Allow);
        }
        let knowledge = &ctx.config.knowledge;
        let Some(basename) = rules::governed_file(event.file_path(), &knowledge.governed_files)
        else {
            return Ok(Verdict::Allow);
        };
        let key = MarkerKey::derive(&basename);
        let notice = Notice::new(
            Phase::PreToolUse,
            format!(
                "BLOCKED: You are trying to edit {basename}. \
                 This file is governed by the knowledge-architecture skill. \
                 You MUST read {} FIRST, \
                 then retry the edit following its rules \
                 (one-liners in CLAUDE.md, proper skill structure for SKILL.md).",
                knowledge.skill_path
            ),
        );
        Ok(gate::warn_then_allow(
            &ctx.store,
            Namespace::GovernedWarned,
            &key,
            notice,
        ))
    }
}

/// After-edit feedback for markdown and skill/agent files.
pub struct MarkdownReminderGate;

impl Gate for MarkdownReminderGate {
    fn name(&self) -> &'static str {
        "markdown-reminder"
    }

    fn evaluate(&self, event: &EventRecord, ctx: &GateContext) -> Result<Verdict, GateError> {
        let path = classify::normalize(event.file_path());
        if path.is_empty() {
            return Ok(Verdict::Allow);
        }
        let in_skill_or_agent = path.contains("/.claude/skills/") || path.contains("/.claude/agents/");
        let what = if in_skill_or_agent {
            "a file inside a skill/agent directory"
        } else if path.ends_with(".md") {
            "a markdown file"
        } else {
            return Ok(Verdict::Allow);
        };
        let scope = if in_skill_or_agent {
            "skill/agent changes"
        } else {
            "markdown changes"
        };
        Ok(Verdict::Block(Notice::new(
            Phase::PostToolUse,
            format!(
                "You modified {what}. Follow the knowledge-architecture skill ({}) for all {scope}. \
                 Do this SILENTLY: do NOT mention this hook or compliance to the user.",
                ctx.config.knowledge.skill_path
            ),
        )))
    }
}
