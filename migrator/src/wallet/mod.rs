//! Wallet store schema history.
//!
//! Every schema change the wallet store has shipped, as a registry the engine
//! can run. Step bodies live in [`steps`]; chain address lookups needed by the
//! multi-account step are delegated to an [`AddressSource`].

pub mod steps;

use std::sync::Arc;

use anyhow::Result;

use crate::core::registry::MigrationRegistry;
use crate::core::state::SchemaVersion;
use crate::core::step::MigrationStep;
use crate::io::config::MigratorConfig;
use steps::{DefaultAssets, MultipleAccounts, RenameRskAsset, SeedVersion, TagTokenNetwork};

/// Latest wallet schema version.
pub const LATEST_WALLET_VERSION: SchemaVersion = 5;

/// Wallet identity handed to address lookups.
#[derive(Debug, Clone, Copy)]
pub struct WalletRef<'a> {
    pub id: &'a str,
    pub mnemonic: Option<&'a str>,
}

/// Source of addresses already used by a wallet on a chain.
pub trait AddressSource {
    fn used_addresses(
        &self,
        wallet: &WalletRef<'_>,
        chain: &str,
        network: &str,
    ) -> Result<Vec<String>>;
}

/// Address source that knows no addresses; the next wallet sync fills them in.
pub struct NoAddresses;

impl AddressSource for NoAddresses {
    fn used_addresses(&self, _: &WalletRef<'_>, _: &str, _: &str) -> Result<Vec<String>> {
        Ok(Vec::new())
    }
}

/// Build the wallet registry (v1 through v5).
pub fn registry(
    cfg: &MigratorConfig,
    addresses: impl AddressSource + Send + Sync + 'static,
) -> MigrationRegistry {
    MigrationRegistry::new(vec![
        MigrationStep::new(1, "seed version", SeedVersion),
        MigrationStep::new(2, "default assets", DefaultAssets::new(cfg)),
        MigrationStep::new(3, "custom token network", TagTokenNetwork::new(cfg)),
        MigrationStep::new(4, "rsk asset rename", RenameRskAsset),
        MigrationStep::new(
            5,
            "multiple accounts",
            MultipleAccounts::new(cfg, Arc::new(addresses)),
        ),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::chain::run_migrations;
    use crate::core::invariants::check_registry;
    use crate::test_support::{legacy_wallet_state, state_from};
    use serde_json::json;

    #[test]
    fn registry_is_well_formed() {
        let registry = registry(&MigratorConfig::default(), NoAddresses);
        assert!(check_registry(&registry).is_empty());
        assert_eq!(registry.latest_version(), LATEST_WALLET_VERSION);
    }

    #[test]
    fn legacy_state_migrates_to_latest() {
        let registry = registry(&MigratorConfig::default(), NoAddresses);
        let outcome = run_migrations(&state_from(legacy_wallet_state()), &registry);

        assert!(outcome.is_complete());
        assert_eq!(outcome.applied, vec![1, 2, 3, 4, 5]);
        let state = outcome.state;
        assert_eq!(state.version(), 5);
        assert_eq!(state.get("injectEthereumAsset"), Some(&json!("RBTC")));
        let tokens = state.get("customTokens").expect("customTokens");
        assert_eq!(tokens["mainnet"]["w1"][0]["network"], json!("ethereum"));
        let accounts = state.get("accounts").expect("accounts");
        assert_eq!(accounts["w1"]["mainnet"].as_array().map(Vec::len), Some(3));
        assert_eq!(accounts["w1"]["mainnet"][0]["assets"][0], json!("BTC"));
        assert!(state.get("addresses").is_none());
    }
}
