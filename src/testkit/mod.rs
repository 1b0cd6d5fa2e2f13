//! Shared test utilities available to both unit and integration tests.
//!
//! Enabled via `#[cfg(test)]` (unit tests) or the `testkit` feature
//! (integration tests).
//!
//! # Modules
//!
//! - [`service`] — Mock [`CompletionService`](crate::port::outbound::completion::CompletionService)
//!   implementations: `ScriptedService`, `SizeLimitedService`.
//! - [`table`] — Builders for in-memory tables.
//! - [`config`] — Canonical test configurations (fast retries, fixed keys).

pub mod config;
pub mod service;
pub mod table;
