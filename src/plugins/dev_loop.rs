//! Dev-loop markers and the push gate.
//!
//! Two post-tool recorders note, per working directory, that code was edited
//! and that tests ran. The pre-tool push gate reads both: a push is refused
//! only when code changed and no test command has run since the repo was
//! first touched.

use crate::core::classify;
use crate::core::error::GateError;
use crate::core::event::EventRecord;
use crate::core::gate::{Gate, GateContext, Notice, Verdict};
use crate::core::output::Phase;
use crate::core::rules;
use crate::core::store::{MarkerKey, Namespace};
use std::path::Path;

fn repo_key(cwd: &Path) -> MarkerKey {
    MarkerKey::for_path(cwd)
}

pub struct MarkCodeEditsGate;

impl Gate for MarkCodeEditsGate {
    fn name(&self) -> &'static str {
        "mark-code-edits"
    }

    fn evaluate(&self, event: &EventRecord, ctx: &GateContext) -> Result<Verdict, GateError> {
        let classify_cfg = &ctx.config.classify;
        let path = event.file_path();
        if !classify_cfg.is_edit_tool(event.tool()) || !classify::is_code(path, classify_cfg) {
            return Ok(Verdict::Allow);
        }
        let cwd = event.working_dir()?;
        ctx.store
            .set(Namespace::CodeEdits, &repo_key(&cwd), path)?;
        Ok(Verdict::Allow)
    }
}

pub struct MarkTestsRunGate;

impl Gate for MarkTestsRunGate {
    fn name(&self) -> &'static str {
        "mark-tests-run"
    }

    fn evaluate(&self, event: &EventRecord, ctx: &GateContext) -> Result<Verdict, GateError> {
        let command = event.command();
        if !event.is_tool("Bash") || !rules::is_test_command(command, &ctx.config.dev_loop) {
            return Ok(Verdict::Allow);
        }
        let cwd = event.working_dir()?;
        ctx.store
            .set(Namespace::TestsRun, &repo_key(&cwd), &command.to_lowercase())?;
        Ok(Verdict::Allow)
    }
}

pub struct PushTestsGate;

impl Gate for PushTestsGate {
    fn name(&self) -> &'static str {
        "push-tests"
    }

    fn evaluate(&self, event: &EventRecord, ctx: &GateContext) -> Result<Verdict, GateError> {
        let command = event.command();
        if !event.is_tool("Bash") || !rules::is_git_push(command) {
            return Ok(Verdict::Allow);
        }
        if command.to_lowercase().contains("--dry-run") {
            return Ok(Verdict::Allow);
        }

        let cwd = event.working_dir()?;
        let cwd_normalized = classify::normalize(&cwd.to_string_lossy());
        if ctx
            .config
            .dev_loop
            .excluded_repos
            .iter()
            .any(|p| cwd_normalized.contains(&p.to_lowercase()))
        {
            return Ok(Verdict::Allow);
        }

        let key = repo_key(&cwd);
        if ctx.store.exists(Namespace::TestsRun, &key) {
            return Ok(Verdict::Allow);
        }
        // Doc/config-only work never set the code marker.
        if !ctx.store.exists(Namespace::CodeEdits, &key) {
            return Ok(Verdict::Allow);
        }

        let repo_name = cwd
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| cwd.display().to_string());
        Ok(Verdict::Block(Notice::new(
            Phase::PreToolUse,
            format!(
                "BLOCKED: git push attempted but no tests were run this session for {repo_name}.\n\
                 \n\
                 Dev-loop SOP requires running the test suite BEFORE pushing code changes.\n\
                 Run the project's test command first (e.g., npm test, pytest).\n\
                 \n\
                 If this repo has no tests, add it to `dev_loop.excluded_repos` in the hookgate config."
            ),
        )))
    }
}
