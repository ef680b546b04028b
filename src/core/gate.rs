//! Gate decision engine.
//!
//! A gate reads one event, consults the marker store, runs its evaluators and
//! returns a [`Verdict`]. Gates are stateless; anything that must survive to
//! the next invocation goes through the store.
//!
//! Exit codes: 0 allows (optionally with an advisory notice on stderr), 2
//! blocks and feeds the notice back to the agent. Only a deliberate verdict
//! may produce 2; every error becomes an allow.

use crate::core::config::GateConfig;
use crate::core::error::GateError;
use crate::core::event::EventRecord;
use crate::core::output::{self, Phase};
use crate::core::store::{MarkerKey, MarkerStore, Namespace};

pub const EXIT_ALLOW: u8 = 0;
pub const EXIT_BLOCK: u8 = 2;

/// Feedback text and the phase it is framed under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub phase: Phase,
    pub body: String,
}

impl Notice {
    pub fn new(phase: Phase, body: impl Into<String>) -> Self {
        Self {
            phase,
            body: body.into(),
        }
    }

    pub fn render(&self) -> String {
        output::render_box(self.phase.header(), &self.body)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    /// Let the action through silently.
    Allow,
    /// Let the action through, showing a reminder.
    Advise(Notice),
    /// Stop the action (or the session end) and feed the notice to the agent.
    Block(Notice),
}

impl Verdict {
    pub fn exit_code(&self) -> u8 {
        match self {
            Verdict::Allow | Verdict::Advise(_) => EXIT_ALLOW,
            Verdict::Block(_) => EXIT_BLOCK,
        }
    }

    pub fn notice(&self) -> Option<&Notice> {
        match self {
            Verdict::Allow => None,
            Verdict::Advise(n) | Verdict::Block(n) => Some(n),
        }
    }

    pub fn render(&self) -> Option<String> {
        self.notice().map(Notice::render)
    }

    pub fn is_block(&self) -> bool {
        matches!(self, Verdict::Block(_))
    }
}

/// Everything a gate may consult besides the event itself.
#[derive(Debug, Clone)]
pub struct GateContext {
    pub config: GateConfig,
    pub store: MarkerStore,
}

impl GateContext {
    pub fn new(config: GateConfig) -> Self {
        let store = MarkerStore::new(config.state_root());
        Self { config, store }
    }

    pub fn with_store(config: GateConfig, store: MarkerStore) -> Self {
        Self { config, store }
    }
}

/// A single policy check.
pub trait Gate {
    fn name(&self) -> &'static str;

    fn evaluate(&self, event: &EventRecord, ctx: &GateContext) -> Result<Verdict, GateError>;
}

/// Evaluate a gate, converting any error into an allow.
pub fn run_gate(gate: &dyn Gate, event: &EventRecord, ctx: &GateContext) -> Verdict {
    match gate.evaluate(event, ctx) {
        Ok(verdict) => {
            tracing::debug!(
                gate = gate.name(),
                exit = verdict.exit_code(),
                "gate evaluated"
            );
            verdict
        }
        Err(e) => {
            tracing::debug!(gate = gate.name(), "failing open: {}", e);
            Verdict::Allow
        }
    }
}

/// Two-phase warn/allow for one governed resource.
///
/// First attempt: record the warning and block. Next attempt: consume the
/// warning and allow. The attempt after that blocks again, so the gate is
/// neither a permanent wall nor a permanent bypass. A store that cannot record
/// the warning allows.
pub fn warn_then_allow(
    store: &MarkerStore,
    ns: Namespace,
    key: &MarkerKey,
    notice: Notice,
) -> Verdict {
    if store.exists(ns, key) {
        store.delete_or_log(ns, key);
        return Verdict::Allow;
    }
    // Blocking without a recorded warning would block every retry.
    if let Err(e) = store.set(ns, key, "warned") {
        tracing::debug!("warning not recorded, allowing: {}", e);
        return Verdict::Allow;
    }
    Verdict::Block(notice)
}

/// Fire-once guard: `Allow` if already reported for `key`, otherwise record the
/// report before returning it so a re-entrant invocation stays silent. If the
/// record cannot be written the report is dropped.
pub fn fire_once(store: &MarkerStore, ns: Namespace, key: &MarkerKey, notice: Notice) -> Verdict {
    if store.exists(ns, key) {
        return Verdict::Allow;
    }
    // An unrecorded report would repeat on every invocation.
    if let Err(e) = store.set(ns, key, "fired") {
        tracing::debug!("report not recorded, allowing: {}", e);
        return Verdict::Allow;
    }
    Verdict::Block(notice)
}
