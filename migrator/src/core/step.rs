//! Migration step abstraction.
//!
//! The [`Migrate`] trait decouples the runner from what a migration actually
//! does to the payload. Step bodies are supplied by the application that owns
//! the state shape; tests use counting or failing steps instead.

use std::fmt;

use anyhow::Result;

use crate::core::state::{SchemaVersion, VersionedState};

/// Body of a single schema bump.
///
/// Receives an isolated copy of the state and returns the state in the next
/// schema shape. Implementations must be deterministic for a given input.
pub trait Migrate {
    fn migrate(&self, state: VersionedState) -> Result<VersionedState>;
}

impl<F> Migrate for F
where
    F: Fn(VersionedState) -> Result<VersionedState>,
{
    fn migrate(&self, state: VersionedState) -> Result<VersionedState> {
        self(state)
    }
}

/// Immutable `(version, body)` registry entry.
///
/// `version` is the schema version the step *produces*.
pub struct MigrationStep {
    version: SchemaVersion,
    name: &'static str,
    body: Box<dyn Migrate + Send + Sync>,
}

impl MigrationStep {
    pub fn new(
        version: SchemaVersion,
        name: &'static str,
        body: impl Migrate + Send + Sync + 'static,
    ) -> Self {
        Self {
            version,
            name,
            body: Box::new(body),
        }
    }

    /// Build a step from a closure.
    pub fn from_fn<F>(version: SchemaVersion, name: &'static str, body: F) -> Self
    where
        F: Fn(VersionedState) -> Result<VersionedState> + Send + Sync + 'static,
    {
        Self::new(version, name, body)
    }

    pub fn version(&self) -> SchemaVersion {
        self.version
    }

    /// Short label used in diagnostics.
    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn apply(&self, state: VersionedState) -> Result<VersionedState> {
        self.body.migrate(state)
    }
}

impl fmt::Debug for MigrationStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MigrationStep")
            .field("version", &self.version)
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn closures_are_step_bodies() {
        let step = MigrationStep::from_fn(2, "flag", |mut state| {
            state.insert("flag", json!(true));
            Ok(state)
        });
        let out = step.apply(VersionedState::new()).expect("apply");
        assert_eq!(out.get("flag"), Some(&json!(true)));
        assert_eq!(step.version(), 2);
        assert_eq!(step.name(), "flag");
    }

    #[test]
    fn debug_omits_body() {
        let step = MigrationStep::from_fn(1, "noop", Ok);
        assert_eq!(
            format!("{:?}", step),
            "MigrationStep { version: 1, name: \"noop\", .. }"
        );
    }
}
