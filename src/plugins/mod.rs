//! Policy checks, one module per policy family.
//!
//! - `db_safety`: production bypass scripts and raw SQL writes
//! - `fallback`: the approval-gated fallback tool
//! - `knowledge`: governed-file two-phase gate and markdown reminders
//! - `dev_loop`: code-edit/tests-run markers and the push gate
//! - `drafting`: reminder before outgoing email
//! - `verify`: session-end dev-loop audit
//! - `retro`: session-end retrospective check

pub mod db_safety;
pub mod dev_loop;
pub mod drafting;
pub mod fallback;
pub mod knowledge;
pub mod retro;
pub mod verify;
