//! Core primitives shared by every policy check.
//!
//! Leaves first: configuration and errors, event records and path
//! classification, the marker store, session history and evidence, rule
//! evaluators, and the decision engine that ties them together.

pub mod classify;
pub mod config;
pub mod error;
pub mod event;
pub mod evidence;
pub mod gate;
pub mod output;
pub mod rules;
pub mod store;
pub mod transcript;
