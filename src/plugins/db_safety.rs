//! Database safety gates.
//!
//! - `prod-bypass`: refuse to write a script that talks to the production
//!   database through a raw client instead of the migration tooling.
//! - `raw-sql`: refuse SQL CLI writes unless the command carries the bypass
//!   token, which the agent adds only after confirming no API exists.

use crate::core::error::GateError;
use crate::core::event::EventRecord;
use crate::core::gate::{Gate, GateContext, Notice, Verdict};
use crate::core::output::Phase;
use crate::core::rules;

pub struct ProdBypassGate;

impl Gate for ProdBypassGate {
    fn name(&self) -> &'static str {
        "prod-bypass"
    }

    fn evaluate(&self, event: &EventRecord, ctx: &GateContext) -> Result<Verdict, GateError> {
        let db = &ctx.config.db;
        let path = event.file_path();
        if !event.is_tool("Write") || !rules::is_script_file(path, db) {
            return Ok(Verdict::Allow);
        }
        if rules::is_blessed_file(path, db) {
            return Ok(Verdict::Allow);
        }
        if !rules::prod_db_bypass(event.content(), db) {
            return Ok(Verdict::Allow);
        }
        tracing::debug!(path, "production bypass script detected");
        Ok(Verdict::Block(Notice::new(
            Phase::PreToolUse,
            "BLOCKED: This script directly accesses the production database, \
             bypassing Drizzle ORM migration tracking. \
             All database changes MUST go through `npm run db:migrate` or Vercel CI/CD. \
             See CLAUDE.md: 'Database Migration Tools - Fix Root Causes, Never Workaround'. \
             If you believe this is a false positive, ask the user for permission.",
        )))
    }
}

pub struct RawSqlGate;

impl Gate for RawSqlGate {
    fn name(&self) -> &'static str {
        "raw-sql"
    }

    fn evaluate(&self, event: &EventRecord, ctx: &GateContext) -> Result<Verdict, GateError> {
        let db = &ctx.config.db;
        let command = event.command();
        if !event.is_tool("Bash") || command.is_empty() {
            return Ok(Verdict::Allow);
        }
        if !rules::raw_sql_write(command, db) {
            return Ok(Verdict::Allow);
        }
        if !db.bypass_token.is_empty() && command.contains(&db.bypass_token) {
            tracing::debug!("raw SQL write confirmed with bypass token");
            return Ok(Verdict::Allow);
        }
        Ok(Verdict::Block(Notice::new(
            Phase::PreToolUse,
            raw_sql_message(&db.bypass_token),
        )))
    }
}

fn raw_sql_message(token: &str) -> String {
    format!(
        "BLOCKED: Direct SQL write operation detected (UPDATE/INSERT/DELETE/ALTER/DROP/TRUNCATE via psql).\n\
         \n\
         PREFERRED APPROACH: Use the Admin API instead of raw SQL.\n  \
         - Check if an API endpoint exists for this operation (see the relevant sysadmin skill, Admin API section)\n  \
         - API calls have proper audit trails; direct SQL bypasses logging\n\
         \n\
         IF SQL IS GENUINELY REQUIRED (no API available for this operation):\n  \
         Re-run the command with a comment containing the bypass flag: {token}\n  \
         Example: psql \"$DB_URL\" -c \"/* {token} */ UPDATE org_hooks SET ...\"\n\
         \n\
         The bypass flag confirms you've verified that no API alternative\n\
         exists for this specific write operation."
    )
}
