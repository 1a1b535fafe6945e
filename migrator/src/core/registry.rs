//! Ordered registry of every schema migration that has shipped.

use crate::core::state::SchemaVersion;
use crate::core::step::MigrationStep;

/// Immutable list of steps, ordered by strictly increasing version.
///
/// Built once (usually at startup) and handed to the runner by reference.
/// Ordering is a construction-time assumption and is not re-checked here;
/// see [`crate::core::invariants::check_registry`].
#[derive(Debug, Default)]
pub struct MigrationRegistry {
    steps: Vec<MigrationStep>,
}

impl MigrationRegistry {
    pub fn new(steps: Vec<MigrationStep>) -> Self {
        Self { steps }
    }

    /// Version produced by the last step, or 0 when no step is registered.
    pub fn latest_version(&self) -> SchemaVersion {
        self.steps.last().map_or(0, MigrationStep::version)
    }

    pub fn steps(&self) -> &[MigrationStep] {
        &self.steps
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Steps that would run for a state currently at `current`, in order.
    pub fn pending(&self, current: SchemaVersion) -> impl Iterator<Item = &MigrationStep> {
        self.steps.iter().filter(move |step| step.version() > current)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::noop_step;

    #[test]
    fn latest_version_is_last_step() {
        let registry = MigrationRegistry::new(vec![noop_step(1), noop_step(2), noop_step(5)]);
        assert_eq!(registry.latest_version(), 5);
        assert_eq!(registry.len(), 3);
    }

    #[test]
    fn empty_registry_latest_is_zero() {
        let registry = MigrationRegistry::default();
        assert!(registry.is_empty());
        assert_eq!(registry.latest_version(), 0);
    }

    #[test]
    fn pending_lists_versions_above_current() {
        let registry = MigrationRegistry::new(vec![noop_step(1), noop_step(2), noop_step(3)]);
        let pending: Vec<_> = registry.pending(1).map(MigrationStep::version).collect();
        assert_eq!(pending, vec![2, 3]);
        assert_eq!(registry.pending(3).count(), 0);
    }
}
