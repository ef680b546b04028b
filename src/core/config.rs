//! Gate configuration.
//!
//! Every allowlist and denylist the gates consult lives here. The defaults are
//! the shipped policy; a TOML file may override any subset of them.

use crate::core::error::GateError;
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Environment variable naming an optional TOML config file.
pub const CONFIG_ENV: &str = "HOOKGATE_CONFIG";
/// Environment variable overriding the marker store root.
pub const STATE_DIR_ENV: &str = "HOOKGATE_STATE_DIR";

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

/// Top-level gate configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct GateConfig {
    /// Root directory for marker namespaces. Falls back to `HOOKGATE_STATE_DIR`,
    /// then the system temp dir.
    pub state_dir: Option<PathBuf>,
    pub classify: ClassifyConfig,
    pub audit: AuditConfig,
    pub db: DbSafetyConfig,
    pub dev_loop: DevLoopConfig,
    pub knowledge: KnowledgeConfig,
    pub fallback: FallbackConfig,
    pub drafting: DraftingConfig,
}

/// Path classification and edit detection.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ClassifyConfig {
    /// Extensions that mark a path as documentation/config.
    pub doc_extensions: Vec<String>,
    /// Path segments that mark a path as documentation/config.
    pub doc_segments: Vec<String>,
    /// Scratch locations; code edits confined to these are exempt from auditing.
    pub temp_prefixes: Vec<String>,
    /// Tools that mutate files.
    pub edit_tools: Vec<String>,
}

impl Default for ClassifyConfig {
    fn default() -> Self {
        Self {
            doc_extensions: strings(&[".md", ".txt", ".json", ".yaml", ".yml", ".toml", ".csv"]),
            doc_segments: strings(&[
                "reference-data/",
                "references/",
                ".claude/skills/",
                ".claude/agents/",
                ".claude/commands/",
                ".vscode/",
            ]),
            temp_prefixes: strings(&["/temp/", "/tmp/", "n:/temp/"]),
            edit_tools: strings(&["Edit", "Write", "MultiEdit"]),
        }
    }
}

impl ClassifyConfig {
    pub fn is_edit_tool(&self, tool_name: &str) -> bool {
        self.edit_tools.iter().any(|t| t == tool_name)
    }
}

/// Session-end audit thresholds.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AuditConfig {
    /// Minimum code edits before architecture signals count as non-trivial work.
    pub nontrivial_edit_threshold: usize,
    /// Reports with more missing steps than this are violations, not just incomplete.
    pub incomplete_max_missing: usize,
    /// Tool names whose presence counts as planning.
    pub planning_tools: Vec<String>,
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            nontrivial_edit_threshold: 10,
            incomplete_max_missing: 2,
            planning_tools: strings(&["EnterPlanMode"]),
        }
    }
}

/// Database safety gates.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DbSafetyConfig {
    pub script_extensions: Vec<String>,
    /// Path suffixes that may legitimately reference production.
    pub blessed_files: Vec<String>,
    pub prod_patterns: Vec<String>,
    pub client_patterns: Vec<String>,
    pub sql_cli_tools: Vec<String>,
    /// Interpreters that may shell out to a SQL CLI.
    pub script_runners: Vec<String>,
    pub bypass_token: String,
}

impl Default for DbSafetyConfig {
    fn default() -> Self {
        Self {
            script_extensions: strings(&[".ts", ".js", ".mts", ".mjs"]),
            blessed_files: strings(&[
                "scripts/migrate.ts",
                "scripts/import-from-xlsx.ts",
                "scripts/import-longs-from-xlsx.ts",
                "scripts/import-cli.ts",
                "scripts/quick-count.ts",
                "api/db/index.ts",
            ]),
            prod_patterns: strings(&[
                "ep-flat-block",
                "PROD_DATABASE_URL",
                "prod_url",
                "production_url",
            ]),
            client_patterns: strings(&["neon(", "new Pool(", "new Client(", "createPool(", "sql`"]),
            sql_cli_tools: strings(&["psql", "mysql", "sqlite3", "pgcli"]),
            script_runners: strings(&["python", "python3", "node"]),
            bypass_token: "--sql-write-confirmed".to_string(),
        }
    }
}

/// Dev-loop markers and the push gate.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DevLoopConfig {
    pub test_patterns: Vec<String>,
    /// Working-directory fragments for repositories without a test suite.
    pub excluded_repos: Vec<String>,
}

impl Default for DevLoopConfig {
    fn default() -> Self {
        Self {
            test_patterns: strings(&[
                "npm test",
                "npm run test",
                "npx vitest",
                "npx jest",
                "npx playwright",
                "test:free",
                "test:all",
                "test:e2e",
                "test:unit",
                "pytest",
                "go test",
                "cargo test",
                "phpunit",
                "playwright test",
            ]),
            excluded_repos: strings(&[
                "gh_coordinator",
                "personalassistant",
                "/.claude",
                "csv_to_gsheets",
            ]),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct KnowledgeConfig {
    /// Upper-cased basenames that require the knowledge-architecture skill.
    pub governed_files: Vec<String>,
    pub skill_path: String,
}

impl Default for KnowledgeConfig {
    fn default() -> Self {
        Self {
            governed_files: strings(&["CLAUDE.MD", "SKILL.MD"]),
            skill_path: "~/.claude/skills/knowledge-architecture/SKILL.md".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FallbackConfig {
    pub tool: String,
    pub bypass_token: String,
}

impl Default for FallbackConfig {
    fn default() -> Self {
        Self {
            tool: "rclone".to_string(),
            bypass_token: "#RCLONE-FALLBACK-APPROVED".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DraftingConfig {
    pub send_tools: Vec<String>,
}

impl Default for DraftingConfig {
    fn default() -> Self {
        Self {
            send_tools: strings(&[
                "mcp__google-workspace__gmail_send",
                "mcp__google-workspace__gmail_createDraft",
                "mcp__google-workspace__gmail_sendDraft",
                "mcp__gmail__send_email",
                "mcp__gmail__draft_email",
            ]),
        }
    }
}

impl GateConfig {
    /// Parse a TOML config file.
    pub fn from_file(path: &Path) -> Result<Self, GateError> {
        let raw = std::fs::read_to_string(path)?;
        toml::from_str(&raw).map_err(|source| GateError::ConfigError {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Resolve config from an explicit path, then `HOOKGATE_CONFIG`, then defaults.
    ///
    /// A broken config never blocks the agent: it is logged and the defaults apply.
    pub fn resolve(explicit: Option<&Path>) -> Self {
        let path = explicit
            .map(Path::to_path_buf)
            .or_else(|| std::env::var_os(CONFIG_ENV).map(PathBuf::from));
        let Some(path) = path else {
            return Self::default();
        };
        match Self::from_file(&path) {
            Ok(config) => config,
            Err(e) => {
                tracing::warn!("ignoring config {}: {}", path.display(), e);
                Self::default()
            }
        }
    }

    /// Directory that holds every marker namespace.
    pub fn state_root(&self) -> PathBuf {
        self.state_dir
            .clone()
            .or_else(|| std::env::var_os(STATE_DIR_ENV).map(PathBuf::from))
            .unwrap_or_else(std::env::temp_dir)
    }

    /// Temp prefixes plus `%LOCALAPPDATA%/temp` when the host defines it.
    pub fn temp_prefixes(&self) -> Vec<String> {
        let mut prefixes = self.classify.temp_prefixes.clone();
        if let Some(local) = std::env::var_os("LOCALAPPDATA") {
            let local = crate::core::classify::normalize(&local.to_string_lossy());
            if !local.is_empty() {
                prefixes.push(format!("{}/temp", local.trim_end_matches('/')));
            }
        }
        prefixes
    }
}
