//! Migration runner: applies the pending part of a registry to a state.
//!
//! Steps run one at a time in ascending version order. Each step receives a
//! deep copy of the previous step's output (the first one a copy of the input),
//! so the chain is cumulative and the caller's value is never touched.
//!
//! A failing step never aborts the caller: the chain stops, one diagnostic is
//! logged, and the state reached so far is returned together with a
//! [`MigrationFailure`] describing what went wrong.

use std::any::Any;
use std::panic::{AssertUnwindSafe, catch_unwind};

use anyhow::{Result, anyhow};
use tracing::{debug, error, info, instrument, warn};

use crate::core::registry::MigrationRegistry;
use crate::core::state::{SchemaVersion, VersionedState};
use crate::core::step::MigrationStep;

/// Why the chain stopped before reaching the latest version.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationFailure {
    /// Version the failing step would have produced.
    pub version: SchemaVersion,
    /// Name of the failing step.
    pub name: &'static str,
    /// Rendered error chain (or panic message) from the step body.
    pub cause: String,
}

/// Best-effort result of [`run_migrations`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationOutcome {
    /// State stamped with the last version actually reached.
    pub state: VersionedState,
    /// Version of the input state.
    pub from_version: SchemaVersion,
    /// Versions applied, in order.
    pub applied: Vec<SchemaVersion>,
    /// Set when a step failed and the chain stopped early.
    pub failure: Option<MigrationFailure>,
}

impl MigrationOutcome {
    /// Version the returned state is stamped with.
    pub fn reached_version(&self) -> SchemaVersion {
        self.state.version()
    }

    pub fn is_complete(&self) -> bool {
        self.failure.is_none()
    }

    pub fn changed(&self) -> bool {
        !self.applied.is_empty()
    }
}

/// True if `state` is behind the registry's latest version.
pub fn is_migration_needed(state: &VersionedState, registry: &MigrationRegistry) -> bool {
    state.version() < registry.latest_version()
}

/// Bring `state` as close to the latest version as the registry allows.
///
/// Never fails: a step error or panic stops the chain and is reported through
/// [`MigrationOutcome::failure`] and an `error!` event.
#[instrument(skip_all, fields(from = state.version(), latest = registry.latest_version()))]
pub fn run_migrations(state: &VersionedState, registry: &MigrationRegistry) -> MigrationOutcome {
    let from_version = state.version();
    if from_version > registry.latest_version() {
        warn!(
            version = from_version,
            latest = registry.latest_version(),
            "state is newer than every known migration; leaving it unchanged"
        );
    }

    let mut working = state.clone();
    let mut reached = from_version;
    let mut applied = Vec::new();
    let mut failure = None;

    for step in registry.steps() {
        if step.version() <= reached {
            debug!(version = step.version(), step = step.name(), "already applied; skipping");
            continue;
        }

        debug!(version = step.version(), step = step.name(), "applying migration");
        match apply_isolated(step, working.clone()) {
            Ok(next) => {
                working = next.with_version(step.version());
                reached = step.version();
                applied.push(step.version());
            }
            Err(err) => {
                let cause = format!("{:#}", err);
                error!(
                    version = step.version(),
                    step = step.name(),
                    error = %cause,
                    "failed to migrate to v{}",
                    step.version()
                );
                failure = Some(MigrationFailure {
                    version: step.version(),
                    name: step.name(),
                    cause,
                });
                break;
            }
        }
    }

    if !applied.is_empty() {
        info!(from = from_version, to = reached, steps = applied.len(), "migrated state");
    }

    MigrationOutcome {
        state: working,
        from_version,
        applied,
        failure,
    }
}

/// Run one step body, turning a panic into an error.
///
/// The process panic hook is left alone, so a panicking step still prints the
/// default `thread '..' panicked at` message to stderr before the `error!`
/// event. Swapping the hook is process-global and would race with other
/// threads (and the test harness).
fn apply_isolated(step: &MigrationStep, input: VersionedState) -> Result<VersionedState> {
    catch_unwind(AssertUnwindSafe(|| step.apply(input)))
        .unwrap_or_else(|payload| Err(anyhow!("step panicked: {}", panic_message(&*payload))))
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(msg) = payload.downcast_ref::<&'static str>() {
        msg
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.as_str()
    } else {
        "non-string panic payload"
    }
}
