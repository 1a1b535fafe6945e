//! Migration engine: state model, step registry and the runner.
//!
//! Core modules are free of I/O. They operate on in-memory states and emit
//! `tracing` diagnostics only.

pub mod chain;
pub mod invariants;
pub mod registry;
pub mod state;
pub mod step;

pub use chain::{MigrationFailure, MigrationOutcome, is_migration_needed, run_migrations};
pub use registry::MigrationRegistry;
pub use state::{SchemaVersion, VersionedState};
pub use step::{Migrate, MigrationStep};
