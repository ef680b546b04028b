//! Rule evaluators.
//!
//! Each rule is a pure predicate over an [`Evidence`] set or a single pending
//! command. Phrase rules are named constants so their trigger conditions can be
//! read and tested in one place.
//!
//! The phrase lists are heuristics over noisy transcript text. Some are loose on
//! purpose (`tests-run` accepts "passed" and "test" anywhere in the blob); do not
//! tighten them without changing the policy they encode.

use crate::core::classify;
use crate::core::config::{DbSafetyConfig, DevLoopConfig};
use crate::core::evidence::Evidence;
use regex::Regex;
use std::collections::BTreeSet;
use std::sync::LazyLock;

/// A phrase rule holds when any single phrase appears, or when every phrase of
/// any co-occurrence group appears.
#[derive(Debug, Clone, Copy)]
pub struct PhraseRule {
    pub name: &'static str,
    pub any: &'static [&'static str],
    pub all_of: &'static [&'static [&'static str]],
}

impl PhraseRule {
    /// `text` must already be lower-cased.
    pub fn matches(&self, text: &str) -> bool {
        self.any.iter().any(|p| text.contains(p))
            || self
                .all_of
                .iter()
                .any(|group| group.iter().all(|p| text.contains(p)))
    }
}

pub const TESTS_RUN: PhraseRule = PhraseRule {
    name: "tests-run",
    any: &[
        "npm test",
        "test:free",
        "test:all",
        "test:e2e",
        "tests pass",
        "playwright",
    ],
    all_of: &[&["passed", "test"]],
};

pub const COMMITTED: PhraseRule = PhraseRule {
    name: "committed",
    any: &["git commit", "committed"],
    all_of: &[],
};

pub const DEPLOYED: PhraseRule = PhraseRule {
    name: "deployed",
    any: &["deploy", "pushed to", "vercel", "production"],
    all_of: &[],
};

pub const QA_SUBMITTED: PhraseRule = PhraseRule {
    name: "qa-submitted",
    any: &[
        "qa-submission",
        "qa submitted",
        "submitted slack qa",
        "#cf-qa",
        "pending-qa",
        "submit for qa",
        "skip-qa",
        "no qa-submission skill found",
    ],
    all_of: &[],
};

pub const QA_WAIVED: PhraseRule = PhraseRule {
    name: "qa-waived",
    any: &["skip qa", "don't bother with qa", "no qa needed"],
    all_of: &[&["one-off", "don't matter"], &["gaps", "don't matter"]],
};

pub const PLANNING_INVOKED: PhraseRule = PhraseRule {
    name: "planning-invoked",
    any: &["strategic-cto-planner", "cto agent", "enterplanmode"],
    all_of: &[&["cto", "agent"]],
};

pub const ARCHITECTURE_SIGNAL: PhraseRule = PhraseRule {
    name: "architecture-signal",
    any: &[
        "migration",
        "new component",
        "refactor",
        "new feature",
        "architecture",
    ],
    all_of: &[&["schema", "change"], &["prompt", "update"], &["prompt", "change"]],
};

pub const MIGRATION_CREATED: PhraseRule = PhraseRule {
    name: "migration-created",
    any: &[
        "drizzle-kit generate",
        "drizzle/0",
        "migration file",
        "new migration",
    ],
    all_of: &[],
};

pub const MIGRATION_APPLIED: PhraseRule = PhraseRule {
    name: "migration-applied",
    any: &[
        "db:migrate",
        "drizzle-kit migrate",
        "migration applied",
        "migration complete",
    ],
    all_of: &[],
};

pub const TEMP_SCRIPT: PhraseRule = PhraseRule {
    name: "temp-script",
    any: &[
        "temporary script",
        "one-off script",
        "one-off utility",
        "scratchpad",
        "temp script",
    ],
    all_of: &[],
};

// ===== Process-step evaluators =====

pub fn tests_run(ev: &Evidence) -> bool {
    TESTS_RUN.matches(&ev.text)
}

pub fn committed(ev: &Evidence) -> bool {
    COMMITTED.matches(&ev.text)
}

pub fn deployed(ev: &Evidence) -> bool {
    DEPLOYED.matches(&ev.text)
}

pub fn qa_submitted(ev: &Evidence) -> bool {
    QA_SUBMITTED.matches(&ev.text)
}

pub fn planning_invoked(ev: &Evidence, planning_tools: &[String]) -> bool {
    PLANNING_INVOKED.matches(&ev.text) || planning_tools.iter().any(|t| ev.used_tool(t))
}

pub fn migration_created(ev: &Evidence) -> bool {
    MIGRATION_CREATED.matches(&ev.text)
}

pub fn migration_applied(ev: &Evidence) -> bool {
    MIGRATION_APPLIED.matches(&ev.text)
}

// ===== Exemption evaluators =====

pub fn temp_script_declared(ev: &Evidence) -> bool {
    TEMP_SCRIPT.matches(&ev.text)
}

/// The user waived QA, either directly or as relayed by the assistant.
pub fn qa_waived(ev: &Evidence) -> bool {
    QA_WAIVED.matches(&ev.text) || QA_WAIVED.matches(&ev.user_text)
}

/// Every code edit lies under a scratch location. False when there are none.
pub fn all_code_edits_under(ev: &Evidence, prefixes: &[String]) -> bool {
    !ev.code_edits.is_empty()
        && ev
            .code_edits
            .iter()
            .all(|p| classify::under_any(p, prefixes))
}

// ===== Non-trivial work =====

/// Needs both enough code edits and an architecture signal; edit volume alone
/// is what iterative fix-test loops produce.
pub fn non_trivial(ev: &Evidence, edit_threshold: usize) -> bool {
    ev.code_edit_count() >= edit_threshold && ARCHITECTURE_SIGNAL.matches(&ev.text)
}

// ===== Command-gate evaluators =====

static SHELL_CHAIN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s*(?:&&|\|\||;|\||\n)\s*").expect("valid chain regex"));

static QUOTED_PSQL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"['"]psql['"]"#).expect("valid psql regex"));

static SQL_WRITE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?:UPDATE|INSERT|DELETE|ALTER|DROP|TRUNCATE|CREATE\s+TABLE|CREATE\s+INDEX)\b")
        .expect("valid sql write regex")
});

static GIT_PUSH: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\bgit\s+push\b").expect("valid git push regex"));

/// Executables a shell command actually runs: the leading token of each
/// chained or newline-separated segment, skipping `VAR=value` prefixes. Quoted text is not parsed,
/// so a commit message that mentions `psql` does not count.
pub fn shell_executables(command: &str) -> BTreeSet<String> {
    SHELL_CHAIN
        .split(command)
        .filter_map(|segment| {
            segment
                .split_whitespace()
                .find(|token| !(token.contains('=') && !token.starts_with('-')))
                .map(str::to_lowercase)
        })
        .collect()
}

/// The command runs a SQL CLI, directly or from an interpreter that names it
/// as a subprocess target.
pub fn invokes_sql_cli(command: &str, config: &DbSafetyConfig) -> bool {
    let executables = shell_executables(command);
    if config
        .sql_cli_tools
        .iter()
        .any(|tool| executables.contains(&tool.to_lowercase()))
    {
        return true;
    }
    config
        .script_runners
        .iter()
        .any(|runner| executables.contains(&runner.to_lowercase()))
        && QUOTED_PSQL.is_match(command)
}

pub fn has_sql_write(command: &str) -> bool {
    SQL_WRITE.is_match(command)
}

/// SQL CLI invocation AND a write keyword.
pub fn raw_sql_write(command: &str, config: &DbSafetyConfig) -> bool {
    invokes_sql_cli(command, config) && has_sql_write(command)
}

pub fn is_blessed_file(path: &str, config: &DbSafetyConfig) -> bool {
    let normalized = classify::normalize(path);
    config
        .blessed_files
        .iter()
        .any(|b| normalized.ends_with(&classify::normalize(b)))
}

pub fn is_script_file(path: &str, config: &DbSafetyConfig) -> bool {
    let normalized = classify::normalize(path);
    config
        .script_extensions
        .iter()
        .any(|ext| normalized.ends_with(&ext.to_lowercase()))
}

/// Production reference AND a direct database client construction.
pub fn prod_db_bypass(content: &str, config: &DbSafetyConfig) -> bool {
    let content = content.to_lowercase();
    let contains_any = |patterns: &[String]| {
        patterns
            .iter()
            .any(|p| content.contains(&p.to_lowercase()))
    };
    contains_any(&config.prod_patterns) && contains_any(&config.client_patterns)
}

pub fn mentions_tool(command: &str, tool: &str) -> bool {
    !tool.is_empty() && command.to_lowercase().contains(&tool.to_lowercase())
}

pub fn is_git_push(command: &str) -> bool {
    GIT_PUSH.is_match(command)
}

pub fn is_test_command(command: &str, config: &DevLoopConfig) -> bool {
    let command = command.to_lowercase();
    config
        .test_patterns
        .iter()
        .any(|p| command.contains(&p.to_lowercase()))
}

/// Upper-cased basename of a governed file, if the path names one.
pub fn governed_file(path: &str, governed: &[String]) -> Option<String> {
    let basename = path
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or("")
        .to_uppercase();
    if basename.is_empty() {
        return None;
    }
    governed
        .iter()
        .any(|g| g.to_uppercase() == basename)
        .then_some(basename)
}
