//! hookgate: policy gates for coding-agent hooks.
//!
//! The agent runtime invokes `hookgate` once per intercepted event, with the
//! event record as JSON on stdin. Each invocation is a fresh process: it reads
//! the event, consults the marker store, evaluates one policy check and exits.
//!
//! - exit `0`: allow (an advisory notice may be printed to stderr)
//! - exit `2`: block, with a framed explanation on stderr
//!
//! Anything that goes wrong on the way (unparseable input, missing history,
//! storage trouble, even a bad command line) exits `0`. Only a deliberate
//! policy verdict blocks.
//!
//! # Examples
//!
//! ```bash
//! # Before a Bash tool call
//! hookgate pre-tool raw-sql < event.json
//!
//! # When the session stops
//! hookgate stop pipeline < stop-event.json
//! ```
//!
//! # Crate Structure
//!
//! - [`core`]: event records, classification, marker store, evidence, rules, decision engine
//! - [`plugins`]: the policy checks wired to subcommands

pub mod core;
pub mod plugins;

use crate::core::config::GateConfig;
use crate::core::event;
use crate::core::gate::{self, Gate, GateContext, Verdict};
use crate::plugins::{db_safety, dev_loop, drafting, fallback, knowledge, retro, verify};

use clap::{Parser, Subcommand};
use std::io::Read;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

/// Environment variable holding the log filter directives.
pub const LOG_ENV: &str = "HOOKGATE_LOG";

#[derive(Parser, Debug)]
#[clap(
    name = "hookgate",
    version = env!("CARGO_PKG_VERSION"),
    about = "Policy gates for coding-agent hooks"
)]
pub struct Cli {
    /// TOML config overriding the built-in allowlists (else $HOOKGATE_CONFIG).
    #[clap(long, global = true)]
    config: Option<PathBuf>,

    #[clap(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Checks run before a tool executes
    #[clap(subcommand)]
    PreTool(PreToolCheck),
    /// Checks run after a tool executes
    #[clap(subcommand)]
    PostTool(PostToolCheck),
    /// Audits run when the session stops
    #[clap(subcommand)]
    Stop(StopCheck),
}

#[derive(Subcommand, Debug, Clone, Copy)]
enum PreToolCheck {
    /// Block Write of scripts that hit the production database directly
    ProdBypass,
    /// Block SQL CLI writes without the bypass token
    RawSql,
    /// Block the fallback tool (rclone) without approval
    FallbackTool,
    /// Warn once before editing CLAUDE.md / SKILL.md, then allow
    GovernedFile,
    /// Block git push when code changed and tests never ran
    PushTests,
    /// Remind about the drafting skill before sending email
    EmailReminder,
}

#[derive(Subcommand, Debug, Clone, Copy)]
enum PostToolCheck {
    /// Record that code was edited in this working directory
    MarkCodeEdits,
    /// Record that a test command ran in this working directory
    MarkTestsRun,
    /// Feedback after editing markdown or skill/agent files
    MarkdownReminder,
}

#[derive(Subcommand, Debug, Clone, Copy)]
enum StopCheck {
    /// Audit the session for skipped dev-loop steps
    Pipeline,
    /// Check that a requested retrospective used the skill
    Retro,
}

impl Command {
    fn gate(&self) -> Box<dyn Gate> {
        match self {
            Command::PreTool(check) => match check {
                PreToolCheck::ProdBypass => Box::new(db_safety::ProdBypassGate),
                PreToolCheck::RawSql => Box::new(db_safety::RawSqlGate),
                PreToolCheck::FallbackTool => Box::new(fallback::FallbackToolGate),
                PreToolCheck::GovernedFile => Box::new(knowledge::GovernedFileGate),
                PreToolCheck::PushTests => Box::new(dev_loop::PushTestsGate),
                PreToolCheck::EmailReminder => Box::new(drafting::EmailReminderGate),
            },
            Command::PostTool(check) => match check {
                PostToolCheck::MarkCodeEdits => Box::new(dev_loop::MarkCodeEditsGate),
                PostToolCheck::MarkTestsRun => Box::new(dev_loop::MarkTestsRunGate),
                PostToolCheck::MarkdownReminder => Box::new(knowledge::MarkdownReminderGate),
            },
            Command::Stop(check) => match check {
                StopCheck::Pipeline => Box::new(verify::PipelineAuditGate),
                StopCheck::Retro => Box::new(retro::RetroAuditGate),
            },
        }
    }
}

/// Install the stderr log subscriber. Safe to call more than once.
pub fn init_logging() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .without_time()
        .with_target(false)
        .try_init();
}

/// Read one event from `input` and run `gate` over it. Unreadable or empty
/// input allows.
pub fn evaluate_input<R: Read>(gate: &dyn Gate, input: R, ctx: &GateContext) -> Verdict {
    match event::read_event(input) {
        Ok(Some(record)) => gate::run_gate(gate, &record, ctx),
        Ok(None) => Verdict::Allow,
        Err(e) => {
            tracing::debug!(gate = gate.name(), "failing open on input: {}", e);
            Verdict::Allow
        }
    }
}

pub fn run() -> ExitCode {
    init_logging();
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            // Help and version are not failures; a bad invocation must not block either.
            let _ = e.print();
            return ExitCode::from(gate::EXIT_ALLOW);
        }
    };

    let config = GateConfig::resolve(cli.config.as_deref());
    let ctx = GateContext::new(config);
    let gate = cli.command.gate();
    let verdict = evaluate_input(gate.as_ref(), std::io::stdin().lock(), &ctx);

    if let Some(rendered) = verdict.render() {
        eprintln!("{}", rendered);
    }
    ExitCode::from(verdict.exit_code())
}
