//! Registry invariants the runner assumes but does not enforce.

use std::collections::HashSet;

use crate::core::registry::MigrationRegistry;

/// Check construction-time invariants of a registry:
/// - No step produces version 0 (reserved for legacy state)
/// - No duplicate versions
/// - Versions strictly increasing in registration order
///
/// Gaps between versions are allowed. Returns stable messages in step order.
pub fn check_registry(registry: &MigrationRegistry) -> Vec<String> {
    let mut errors = Vec::new();
    let mut seen = HashSet::new();

    for (index, step) in registry.steps().iter().enumerate() {
        let label = format!("step #{} ({})", index, step.name());
        if step.version() == 0 {
            errors.push(format!("{}: version must be > 0", label));
        }
        if !seen.insert(step.version()) {
            errors.push(format!("{}: duplicate version {}", label, step.version()));
        }
    }

    for (index, pair) in registry.steps().windows(2).enumerate() {
        let (prev, next) = (&pair[0], &pair[1]);
        if next.version() <= prev.version() {
            errors.push(format!(
                "step #{} ({}): version {} must be greater than {}",
                index + 1,
                next.name(),
                next.version(),
                prev.version()
            ));
        }
    }

    errors
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::noop_step;

    #[test]
    fn well_formed_registry_with_gaps_passes() {
        let registry = MigrationRegistry::new(vec![noop_step(1), noop_step(2), noop_step(7)]);
        assert!(check_registry(&registry).is_empty());
    }

    #[test]
    fn reports_zero_duplicate_and_unordered_versions() {
        let registry = MigrationRegistry::new(vec![
            noop_step(0),
            noop_step(3),
            noop_step(3),
            noop_step(2),
        ]);
        let errors = check_registry(&registry);
        assert!(errors.iter().any(|err| err.contains("must be > 0")));
        assert!(errors.iter().any(|err| err.contains("duplicate version 3")));
        assert!(
            errors
                .iter()
                .any(|err| err.contains("version 2 must be greater than 3"))
        );
    }
}
