//! Versioned state migration engine.
//!
//! Persisted application state carries a schema `version`. When the software
//! ships a new schema, a migration step is appended to the registry; on load,
//! the runner brings older states up to the latest version one step at a time.
//!
//! - **[`core`]**: The engine. State model, step registry and runner. No I/O.
//! - **[`io`]**: State file store and TOML configuration.
//! - **[`wallet`]**: The wallet store's schema history (v1 through v5).
//!
//! [`upgrade`] ties them together for the `migrator` CLI.

pub mod core;
pub mod exit_codes;
pub mod io;
pub mod logging;
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;
pub mod upgrade;
pub mod wallet;
