//! Orchestration for `migrator status`, `plan` and `migrate`.
//!
//! Loads a state file, consults the registry, and persists whatever the
//! runner reached. The engine itself never touches the filesystem.

use std::path::Path;

use anyhow::{Context, Result};
use tracing::{info, warn};

use crate::core::chain::{MigrationFailure, is_migration_needed, run_migrations};
use crate::core::registry::MigrationRegistry;
use crate::core::state::SchemaVersion;
use crate::io::state_store::{load_state, write_state};

/// Where a state file stands relative to the registry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StateStatus {
    pub version: SchemaVersion,
    pub latest: SchemaVersion,
    /// `(version, name)` of each step that would run, in order.
    pub pending: Vec<(SchemaVersion, &'static str)>,
}

impl StateStatus {
    pub fn needs_migration(&self) -> bool {
        self.version < self.latest
    }

    /// True if the state was written by a newer build than this registry.
    pub fn is_ahead(&self) -> bool {
        self.version > self.latest
    }
}

/// Options for [`upgrade_file`].
#[derive(Debug, Clone, Copy, Default)]
pub struct UpgradeOptions {
    /// Run the chain but leave the file untouched.
    pub dry_run: bool,
}

/// Result of upgrading one state file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpgradeReport {
    pub from_version: SchemaVersion,
    pub reached_version: SchemaVersion,
    /// Latest version the registry knows about.
    pub latest_version: SchemaVersion,
    pub applied: Vec<SchemaVersion>,
    pub failure: Option<MigrationFailure>,
    /// True if the file on disk was replaced.
    pub written: bool,
}

impl UpgradeReport {
    /// True if the file was left alone because it is newer than the registry.
    pub fn is_ahead(&self) -> bool {
        self.from_version > self.latest_version
    }
}

/// Load a state file and report its version against the registry.
pub fn inspect_file(path: &Path, registry: &MigrationRegistry) -> Result<StateStatus> {
    let state = load_state(path).context("load state for status")?;
    let version = state.version();
    Ok(StateStatus {
        version,
        latest: registry.latest_version(),
        pending: registry
            .pending(version)
            .map(|step| (step.version(), step.name()))
            .collect(),
    })
}

/// Migrate a state file in place.
///
/// A partially migrated state is still written: it is self-consistent and
/// stamped with the version it reached, so the next run resumes from there.
pub fn upgrade_file(
    path: &Path,
    registry: &MigrationRegistry,
    options: UpgradeOptions,
) -> Result<UpgradeReport> {
    let state = load_state(path).context("load state for migration")?;
    let latest_version = registry.latest_version();
    if !is_migration_needed(&state, registry) {
        if state.version() > latest_version {
            warn!(
                version = state.version(),
                latest = latest_version,
                "state is newer than every known migration; leaving it unchanged"
            );
        } else {
            info!(version = state.version(), "state already up to date");
        }
        return Ok(UpgradeReport {
            from_version: state.version(),
            reached_version: state.version(),
            latest_version,
            applied: Vec::new(),
            failure: None,
            written: false,
        });
    }

    let outcome = run_migrations(&state, registry);
    let written = outcome.changed() && !options.dry_run;
    if written {
        write_state(path, &outcome.state).context("persist migrated state")?;
    }
    if let Some(failure) = &outcome.failure {
        warn!(
            reached = outcome.reached_version(),
            failed = failure.version,
            "migration incomplete"
        );
    }

    Ok(UpgradeReport {
        from_version: outcome.from_version,
        reached_version: outcome.reached_version(),
        latest_version,
        applied: outcome.applied,
        failure: outcome.failure,
        written,
    })
}
