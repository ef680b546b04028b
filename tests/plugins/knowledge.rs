use hookgate::core::config::GateConfig;
use hookgate::core::event::EventRecord;
use hookgate::core::gate::{Gate, GateContext, Verdict, run_gate};
use hookgate::core::store::{MarkerKey, MarkerStore, Namespace};
use hookgate::plugins::drafting::EmailReminderGate;
use hookgate::plugins::knowledge::GovernedFileGate;
use serde_json::json;
use std::io::Write;
use std::path::Path;
use std::process::{Command, Output, Stdio};
use tempfile::tempdir;

fn run_hookgate(state: &Path, args: &[&str], stdin: &str) -> Output {
    let mut child = Command::new(env!("CARGO_BIN_EXE_hookgate"))
        .current_dir(state)
        .args(args)
        .env("HOOKGATE_STATE_DIR", state)
        .env_remove("HOOKGATE_CONFIG")
        .env_remove("HOOKGATE_LOG")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("spawn hookgate");
    child
        .stdin
        .take()
        .expect("stdin")
        .write_all(stdin.as_bytes())
        .expect("write stdin");
    child.wait_with_output().expect("wait hookgate")
}

fn edit(path: &str) -> EventRecord {
    serde_json::from_value(json!({"tool_name": "Edit", "tool_input": {"file_path": path}})).unwrap()
}

#[test]
fn test_governed_file_warn_allow_cycle_across_processes() {
    let tmp = tempdir().unwrap();
    let event = json!({
        "tool_name": "Edit",
        "tool_input": {"file_path": "/home/dev/project/CLAUDE.md", "old_string": "a", "new_string": "b"}
    })
    .to_string();
    let args = ["pre-tool", "governed-file"];

    let first = run_hookgate(tmp.path(), &args, &event);
    assert_eq!(first.status.code(), Some(2));
    let stderr = String::from_utf8_lossy(&first.stderr);
    assert!(stderr.contains("BLOCKED: You are trying to edit CLAUDE.MD"));
    assert!(stderr.contains("knowledge-architecture/SKILL.md"));

    let second = run_hookgate(tmp.path(), &args, &event);
    assert_eq!(second.status.code(), Some(0));
    assert!(second.stderr.is_empty());

    let third = run_hookgate(tmp.path(), &args, &event);
    assert_eq!(third.status.code(), Some(2));
}

#[test]
fn test_governed_markers_are_per_file_kind() {
    let tmp = tempdir().unwrap();
    let ctx = GateContext::with_store(GateConfig::default(), MarkerStore::new(tmp.path()));

    assert!(GovernedFileGate.evaluate(&edit("/a/CLAUDE.md"), &ctx).unwrap().is_block());
    // A different governed kind has its own warning.
    assert!(GovernedFileGate.evaluate(&edit("/a/skills/x/SKILL.md"), &ctx).unwrap().is_block());
    // Same kind in another directory consumes the first warning.
    assert_eq!(
        GovernedFileGate.evaluate(&edit("/b/claude.md"), &ctx).unwrap(),
        Verdict::Allow
    );
    assert!(!ctx.store.exists(Namespace::GovernedWarned, &MarkerKey::derive("CLAUDE.MD")));
    assert!(ctx.store.exists(Namespace::GovernedWarned, &MarkerKey::derive("SKILL.MD")));

    // Ordinary markdown is not governed.
    assert_eq!(
        GovernedFileGate.evaluate(&edit("/a/README.md"), &ctx).unwrap(),
        Verdict::Allow
    );
}

#[test]
fn test_markdown_reminder_feeds_back() {
    let tmp = tempdir().unwrap();
    let event = json!({"tool_name": "Write", "tool_input": {"file_path": "docs/notes.md"}}).to_string();
    let out = run_hookgate(tmp.path(), &["post-tool", "markdown-reminder"], &event);
    assert_eq!(out.status.code(), Some(2));
    assert!(String::from_utf8_lossy(&out.stderr).contains("| POSTTOOLUSE HOOK OUTPUT"));

    let event = json!({"tool_name": "Write", "tool_input": {"file_path": "src/main.rs"}}).to_string();
    let out = run_hookgate(tmp.path(), &["post-tool", "markdown-reminder"], &event);
    assert_eq!(out.status.code(), Some(0));
}

#[test]
fn test_email_reminder_advises_without_blocking() {
    let tmp = tempdir().unwrap();
    let event = json!({"tool_name": "mcp__gmail__send_email", "tool_input": {}}).to_string();
    let out = run_hookgate(tmp.path(), &["pre-tool", "email-reminder"], &event);
    assert_eq!(out.status.code(), Some(0));
    assert!(String::from_utf8_lossy(&out.stderr).contains("message-drafting"));

    let ctx = GateContext::with_store(GateConfig::default(), MarkerStore::new(tmp.path()));
    let other: EventRecord =
        serde_json::from_value(json!({"tool_name": "mcp__gmail__search"})).unwrap();
    assert_eq!(EmailReminderGate.evaluate(&other, &ctx).unwrap(), Verdict::Allow);
}

#[test]
fn test_governed_file_allows_when_warning_cannot_be_recorded() {
    let tmp = tempdir().unwrap();
    let blocker = tmp.path().join("state-is-a-file");
    std::fs::write(&blocker, "not a directory").unwrap();
    let ctx = GateContext::with_store(GateConfig::default(), MarkerStore::new(&blocker));

    let event = edit("/home/dev/project/CLAUDE.md");
    let exits: Vec<u8> = (0..4)
        .map(|_| run_gate(&GovernedFileGate, &event, &ctx).exit_code())
        .collect();
    assert_eq!(exits, vec![0, 0, 0, 0]);
}
