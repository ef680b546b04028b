//! Session-end audit of the dev-loop SOP.
//!
//! Fires when the agent stops. Any code edit obliges the session to have run
//! tests, committed, deployed and submitted to QA; non-trivial work must also
//! have been planned, and a generated migration must have been applied.
//!
//! The audit is silent when nothing applies (no code edits, scratch work,
//! declared temp scripts) and reports at most once per session.

use crate::core::error::GateError;
use crate::core::event::EventRecord;
use crate::core::evidence::Evidence;
use crate::core::gate::{self, Gate, GateContext, Notice, Verdict};
use crate::core::output::Phase;
use crate::core::rules;
use crate::core::store::{MarkerKey, Namespace};
use crate::core::transcript;
use std::path::Path;

/// A required step the session did not show evidence of.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MissingStep {
    Tests,
    Commit,
    Deploy,
    Qa,
    Planning,
    Migration,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Incomplete,
    Violation,
}

impl Severity {
    pub fn label(self) -> &'static str {
        match self {
            Severity::Incomplete => "DEV-LOOP SOP INCOMPLETE",
            Severity::Violation => "DEV-LOOP SOP VIOLATION",
        }
    }
}

/// Outcome of auditing one session's evidence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Audit {
    /// Nothing to enforce: no code edits, or an exemption applies.
    NotApplicable,
    Pass,
    Report(Vec<MissingStep>),
}

/// Audit an evidence set. Pure: no store access.
pub fn audit(ev: &Evidence, ctx: &GateContext) -> Audit {
    let config = &ctx.config;
    if ev.code_edit_count() == 0 {
        return Audit::NotApplicable;
    }
    if rules::temp_script_declared(ev) || rules::all_code_edits_under(ev, &config.temp_prefixes())
    {
        return Audit::NotApplicable;
    }

    let mut missing = Vec::new();
    if !rules::tests_run(ev) {
        missing.push(MissingStep::Tests);
    }
    if !rules::committed(ev) {
        missing.push(MissingStep::Commit);
    }
    if !rules::deployed(ev) {
        missing.push(MissingStep::Deploy);
    }
    if !rules::qa_submitted(ev) && !rules::qa_waived(ev) {
        missing.push(MissingStep::Qa);
    }
    if rules::non_trivial(ev, config.audit.nontrivial_edit_threshold)
        && !rules::planning_invoked(ev, &config.audit.planning_tools)
    {
        missing.push(MissingStep::Planning);
    }
    if rules::migration_created(ev) && !rules::migration_applied(ev) {
        missing.push(MissingStep::Migration);
    }

    if missing.is_empty() {
        Audit::Pass
    } else {
        Audit::Report(missing)
    }
}

pub fn severity(missing: &[MissingStep], incomplete_max: usize) -> Severity {
    if missing.len() <= incomplete_max {
        Severity::Incomplete
    } else {
        Severity::Violation
    }
}

fn step_line(step: MissingStep, code_edits: usize) -> String {
    match step {
        MissingStep::Tests => "TESTS were not run. Dev-loop SOP requires running the test suite \
                               before deployment. Run `npm test` (or `npm run test:e2e` for UI changes)."
            .to_string(),
        MissingStep::Commit => {
            "COMMIT was not detected. Dev-loop SOP requires committing changes.".to_string()
        }
        MissingStep::Deploy => "DEPLOYMENT was not detected. Dev-loop SOP requires deploying \
                                after tests pass."
            .to_string(),
        MissingStep::Qa => "QA SUBMISSION was not detected. Dev-loop SOP: EVERY change gets \
                            submitted to QA. No exceptions. Run the qa-submission skill now."
            .to_string(),
        MissingStep::Planning => format!(
            "PLANNING was not detected for non-trivial work ({code_edits} code file edits + \
             architecture signals). Dev-loop SOP: medium/large scope changes should use \
             CTO Agent or EnterPlanMode."
        ),
        MissingStep::Migration => "MIGRATION was created but not applied. Never leave \
                                   `npm run db:migrate` as a TODO: run it yourself before deployment."
            .to_string(),
    }
}

pub fn render_report(ev: &Evidence, missing: &[MissingStep], incomplete_max: usize) -> String {
    let code_edits = ev.code_edit_count();
    let doc_edits = ev.doc_edit_count();
    let doc_note = if doc_edits > 0 {
        format!(" ({doc_edits} doc/config file(s) excluded)")
    } else {
        String::new()
    };
    let mut lines = vec![format!(
        "{} -- {code_edits} code edit(s){doc_note}, missing steps:",
        severity(missing, incomplete_max).label()
    )];
    lines.extend(
        missing
            .iter()
            .map(|step| format!("- {}", step_line(*step, code_edits))),
    );
    lines.extend([
        "SOP: Investigate > Fix > Test > Commit > Deploy > QA > Report".to_string(),
        "Ref: ~/.claude/skills/dev-loop/SKILL.md".to_string(),
        "---".to_string(),
        "[STOP HOOK] Safety reminder, not blocker.".to_string(),
        "-> If applicable: complete the missing steps.".to_string(),
        "-> If NOT applicable (temp scripts, non-project files, context-eng repos, user waived): \
         say NOTHING about this hook. Just finish with \"All Done.\" or your normal sign-off. \
         Do NOT explain why it's not applicable; the user already knows."
            .to_string(),
    ]);
    lines.join("\n")
}

pub struct PipelineAuditGate;

impl Gate for PipelineAuditGate {
    fn name(&self) -> &'static str {
        "pipeline"
    }

    fn evaluate(&self, event: &EventRecord, ctx: &GateContext) -> Result<Verdict, GateError> {
        let Some(transcript_path) = event.transcript_path.as_deref().filter(|p| !p.is_empty())
        else {
            return Ok(Verdict::Allow);
        };
        let path = Path::new(transcript_path);
        if !path.exists() {
            return Ok(Verdict::Allow);
        }

        let key = MarkerKey::derive(transcript_path);
        if ctx.store.exists(Namespace::AuditFired, &key) {
            return Ok(Verdict::Allow);
        }

        let history = transcript::read_history(path)?;
        let ev = Evidence::collect(&history, &ctx.config.classify);
        match audit(&ev, ctx) {
            Audit::NotApplicable | Audit::Pass => Ok(Verdict::Allow),
            Audit::Report(missing) => {
                let body = render_report(&ev, &missing, ctx.config.audit.incomplete_max_missing);
                Ok(gate::fire_once(
                    &ctx.store,
                    Namespace::AuditFired,
                    &key,
                    Notice::new(Phase::Stop, body),
                ))
            }
        }
    }
}
