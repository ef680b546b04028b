use hookgate::core::classify::{PathClass, classify_path};
use hookgate::core::config::{ClassifyConfig, GateConfig};
use hookgate::core::event::EventKind;
use hookgate::core::evidence::Evidence;
use hookgate::core::gate::{GateContext, Verdict};
use hookgate::core::store::{MarkerKey, MarkerStore, Namespace};
use hookgate::core::transcript::read_history;
use hookgate::evaluate_input;
use hookgate::plugins::db_safety::RawSqlGate;
use serde_json::json;
use std::fs;
use std::io::Write;
use std::path::Path;
use std::process::{Command, Output, Stdio};
use std::sync::{Arc, Barrier};
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

#[test]
fn marker_store_converges_under_racing_writers() {
    let tmp = tempdir().expect("tempdir");
    let store = Arc::new(MarkerStore::new(tmp.path()));
    let key = MarkerKey::derive("/home/dev/shared-repo");
    let barrier = Arc::new(Barrier::new(8));

    let handles: Vec<_> = (0..8)
        .map(|i| {
            let store = Arc::clone(&store);
            let barrier = Arc::clone(&barrier);
            let key = key.clone();
            std::thread::spawn(move || {
                barrier.wait();
                store
                    .set(Namespace::TestsRun, &key, &format!("writer-{}", i))
                    .expect("set marker");
            })
        })
        .collect();
    for h in handles {
        h.join().expect("writer thread");
    }

    assert!(store.exists(Namespace::TestsRun, &key));
    let content = store.read(Namespace::TestsRun, &key).expect("marker content");
    assert!(content.starts_with("writer-"));

    let dir = tmp.path().join(Namespace::TestsRun.dir_name());
    let names: Vec<String> = fs::read_dir(dir)
        .expect("read marker dir")
        .filter_map(|e| e.ok())
        .map(|e| e.file_name().to_string_lossy().into_owned())
        .collect();
    assert_eq!(names, vec![format!("tests-run-{}", key.as_str())]);
}

#[test]
fn marker_keys_separate_sessions() {
    let keys: Vec<MarkerKey> = (0..200)
        .map(|i| MarkerKey::derive(&format!("/home/dev/.claude/projects/p/session-{}.jsonl", i)))
        .collect();
    let unique: std::collections::HashSet<_> = keys.iter().collect();
    assert_eq!(unique.len(), keys.len());
    assert_eq!(
        MarkerKey::derive("/Home/Dev/s.jsonl"),
        MarkerKey::derive("/home/dev/s.jsonl")
    );
}

#[test]
fn evidence_from_history_file() {
    let tmp = tempdir().expect("tempdir");
    let path = tmp.path().join("session.jsonl");
    let lines = [
        json!({"type": "user", "message": {"content": "Add the export button"}}),
        json!({"type": "assistant", "message": {"content": [
            {"type": "tool_use", "name": "Edit", "input": {"file_path": "/repo/src/export.tsx"}},
            {"type": "tool_use", "name": "Edit", "input": {"file_path": "/repo/.claude/skills/x/helper.ts"}},
            {"type": "tool_use", "name": "Bash", "input": {"command": "npm test"}}
        ]}}),
    ];
    let raw: Vec<String> = lines.iter().map(|l| l.to_string()).collect();
    fs::write(&path, format!("{}\n{{garbage\n", raw.join("\n"))).expect("write history");

    let history = read_history(&path).expect("read history");
    assert_eq!(history.len(), 2);
    let ev = Evidence::collect(&history, &ClassifyConfig::default());
    assert_eq!(ev.code_edit_count(), 1);
    assert_eq!(ev.doc_edit_count(), 1);
    assert!(ev.mentions("npm test"));
}

#[test]
fn classification_matches_doc_rules() {
    let config = ClassifyConfig::default();
    for doc in ["notes.txt", "data.CSV", "pyproject.toml", "/r/references/a.py"] {
        assert_eq!(classify_path(doc, &config), Some(PathClass::Doc), "{}", doc);
    }
    for code in ["src/app.go", "web/index.tsx", "Makefile", "scripts/run.sh"] {
        assert_eq!(classify_path(code, &config), Some(PathClass::Code), "{}", code);
    }
}

#[test]
fn event_kind_detection() {
    let tool: hookgate::core::event::EventRecord =
        serde_json::from_value(json!({"tool_name": "Edit", "tool_input": {"file_path": "a.rs"}}))
            .expect("tool event");
    assert_eq!(tool.kind(), Some(EventKind::ToolInvocation));
    let stop: hookgate::core::event::EventRecord =
        serde_json::from_value(json!({"transcript_path": "/t/s.jsonl"})).expect("stop event");
    assert_eq!(stop.kind(), Some(EventKind::SessionEnd));
}

#[test]
fn malformed_input_fails_open_in_library() {
    let tmp = tempdir().expect("tempdir");
    let ctx = GateContext::with_store(GateConfig::default(), MarkerStore::new(tmp.path()));
    for input in ["", "{", "[1,2,3]", "{\"tool_input\": \"nope\"}"] {
        assert_eq!(
            evaluate_input(&RawSqlGate, input.as_bytes(), &ctx),
            Verdict::Allow,
            "input {:?}",
            input
        );
    }
}

#[test]
fn malformed_input_and_bad_args_fail_open_in_binary() {
    let tmp = tempdir().expect("tempdir");

    let out = run_hookgate(tmp.path(), &["pre-tool", "raw-sql"], "not json at all");
    assert_eq!(out.status.code(), Some(0));
    // stderr is the agent feedback channel; fail-open noise stays below the default level.
    assert!(out.stderr.is_empty());

    let out = run_hookgate(tmp.path(), &["stop", "pipeline"], "");
    assert_eq!(out.status.code(), Some(0));
    assert!(out.stderr.is_empty());

    let out = run_hookgate(tmp.path(), &["pre-tool", "no-such-check"], "{}");
    assert_eq!(out.status.code(), Some(0));
}

#[test]
fn config_file_overrides_bypass_token() {
    let tmp = tempdir().expect("tempdir");
    let config_path = tmp.path().join("hookgate.toml");
    fs::write(&config_path, "[db]\nbypass_token = \"#SQL-OK\"\n").expect("write config");
    let config_arg = config_path.to_string_lossy().into_owned();

    let event = json!({
        "tool_name": "Bash",
        "tool_input": {"command": "psql \"$URL\" -c \"DELETE FROM t\" #SQL-OK"}
    })
    .to_string();
    let out = run_hookgate(
        tmp.path(),
        &["--config", &config_arg, "pre-tool", "raw-sql"],
        &event,
    );
    assert_eq!(out.status.code(), Some(0));

    let out = run_hookgate(tmp.path(), &["pre-tool", "raw-sql"], &event);
    assert_eq!(out.status.code(), Some(2));
}
