//! Session-end check that a requested retrospective went through the skill.

use crate::core::error::GateError;
use crate::core::event::EventRecord;
use crate::core::evidence::Evidence;
use crate::core::gate::{self, Gate, GateContext, Notice, Verdict};
use crate::core::output::Phase;
use crate::core::store::{MarkerKey, Namespace};
use crate::core::transcript;
use regex::Regex;
use std::path::Path;
use std::sync::LazyLock;

const RETRO_SKILL: &str = "retrospective";

static RETRO_TRIGGER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(retrospective|retro|introspect|context audit|what went wrong)\b")
        .expect("valid retro trigger regex")
});

pub fn retro_requested(ev: &Evidence) -> bool {
    RETRO_TRIGGER.is_match(&ev.user_text)
}

pub struct RetroAuditGate;

impl Gate for RetroAuditGate {
    fn name(&self) -> &'static str {
        "retro"
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
        if ctx.store.exists(Namespace::RetroFired, &key) {
            return Ok(Verdict::Allow);
        }

        let history = transcript::read_history(path)?;
        let ev = Evidence::collect(&history, &ctx.config.classify);
        if !retro_requested(&ev) || ev.skills.contains(RETRO_SKILL) {
            return Ok(Verdict::Allow);
        }
        Ok(gate::fire_once(
            &ctx.store,
            Namespace::RetroFired,
            &key,
            Notice::new(
                Phase::Stop,
                "RETROSPECTIVE SKILL NOT INVOKED. User asked for a retrospective but you \
                 did ad-hoc analysis instead of calling Skill('retrospective'). \
                 Invoke it now: the skill has a strict output template.",
            ),
        ))
    }
}
