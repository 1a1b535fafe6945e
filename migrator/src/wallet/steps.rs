//! Step bodies for each wallet schema version.

use std::collections::BTreeMap;
use std::sync::Arc;

use anyhow::{Context, Result, anyhow, bail};
use serde_json::{Map, Value, json};
use tracing::warn;

use crate::core::state::VersionedState;
use crate::core::step::Migrate;
use crate::io::config::MigratorConfig;
use crate::wallet::{AddressSource, WalletRef};

/// v1: establishes the version tag; payload unchanged.
pub struct SeedVersion;

impl Migrate for SeedVersion {
    fn migrate(&self, state: VersionedState) -> Result<VersionedState> {
        Ok(state)
    }
}

/// v2: enables the configured default assets for the active wallet.
pub struct DefaultAssets {
    networks: Vec<String>,
    assets: BTreeMap<String, Vec<String>>,
}

impl DefaultAssets {
    pub fn new(cfg: &MigratorConfig) -> Self {
        let assets = cfg
            .networks
            .iter()
            .map(|network| (network.clone(), cfg.default_assets_for(network).to_vec()))
            .collect();
        Self {
            networks: cfg.networks.clone(),
            assets,
        }
    }
}

impl Migrate for DefaultAssets {
    fn migrate(&self, mut state: VersionedState) -> Result<VersionedState> {
        let active = state
            .get("activeWalletId")
            .and_then(Value::as_str)
            .map(str::to_owned);

        let mut enabled = Map::new();
        for network in &self.networks {
            let mut per_wallet = Map::new();
            if let Some(wallet_id) = &active {
                let defaults = self.assets.get(network).cloned().unwrap_or_default();
                per_wallet.insert(wallet_id.clone(), json!(defaults));
            }
            enabled.insert(network.clone(), Value::Object(per_wallet));
        }
        state.insert("enabledAssets", Value::Object(enabled));
        Ok(state)
    }
}

/// v3: tags every custom token with the network it lives on.
pub struct TagTokenNetwork {
    network: String,
}

impl TagTokenNetwork {
    pub fn new(cfg: &MigratorConfig) -> Self {
        Self {
            network: cfg.token_network.clone(),
        }
    }
}

impl Migrate for TagTokenNetwork {
    fn migrate(&self, mut state: VersionedState) -> Result<VersionedState> {
        if let Some(custom) = state.as_map_mut().get_mut("customTokens") {
            tag_tokens(custom, &self.network)?;
        }
        Ok(state)
    }
}

/// Walk `customTokens.<network>.<walletId>[]` and set `network` on each token.
fn tag_tokens(custom: &mut Value, token_network: &str) -> Result<()> {
    let networks = match custom {
        Value::Null => return Ok(()),
        Value::Object(networks) => networks,
        _ => bail!("customTokens must be an object"),
    };
    for (network, wallets) in networks.iter_mut() {
        let wallets = wallets
            .as_object_mut()
            .ok_or_else(|| anyhow!("customTokens.{} must be an object", network))?;
        for (wallet_id, tokens) in wallets.iter_mut() {
            let tokens = tokens
                .as_array_mut()
                .ok_or_else(|| anyhow!("customTokens.{}.{} must be an array", network, wallet_id))?;
            for token in tokens.iter_mut() {
                let token = token.as_object_mut().ok_or_else(|| {
                    anyhow!("customTokens.{}.{} entries must be objects", network, wallet_id)
                })?;
                token.insert("network".to_string(), json!(token_network));
            }
        }
    }
    Ok(())
}

/// v4: the injected RSK asset was renamed to RBTC.
pub struct RenameRskAsset;

impl Migrate for RenameRskAsset {
    fn migrate(&self, mut state: VersionedState) -> Result<VersionedState> {
        if state.get("injectEthereumAsset").and_then(Value::as_str) == Some("RSK") {
            state.insert("injectEthereumAsset", json!("RBTC"));
        }
        Ok(state)
    }
}

/// v5: one default account per wallet, network and chain.
///
/// Replaces the legacy top-level `addresses` and `balances` maps with
/// `accounts.<walletId>.<network>[]`.
pub struct MultipleAccounts {
    networks: Vec<String>,
    chains: Vec<String>,
    addresses: Arc<dyn AddressSource + Send + Sync>,
}

impl MultipleAccounts {
    pub fn new(cfg: &MigratorConfig, addresses: Arc<dyn AddressSource + Send + Sync>) -> Self {
        Self {
            networks: cfg.networks.clone(),
            chains: cfg.chains.clone(),
            addresses,
        }
    }
}

impl Migrate for MultipleAccounts {
    fn migrate(&self, mut state: VersionedState) -> Result<VersionedState> {
        let wallets = match state.get("wallets") {
            None | Some(Value::Null) => Vec::new(),
            Some(Value::Array(wallets)) => wallets.clone(),
            Some(_) => bail!("wallets must be an array"),
        };
        let enabled = state.get("enabledAssets").cloned().unwrap_or(Value::Null);

        let mut accounts: BTreeMap<String, BTreeMap<String, Vec<Value>>> = BTreeMap::new();
        for wallet in &wallets {
            let id = wallet
                .get("id")
                .and_then(Value::as_str)
                .ok_or_else(|| anyhow!("wallet entry missing string `id`"))?;
            if accounts.contains_key(id) {
                warn!(wallet = id, "duplicate wallet id; keeping the first entry's accounts");
                continue;
            }
            let wallet_ref = WalletRef {
                id,
                mnemonic: wallet.get("mnemonic").and_then(Value::as_str),
            };
            let per_network = accounts.entry(id.to_string()).or_insert_with(|| {
                self.networks
                    .iter()
                    .map(|network| (network.clone(), Vec::new()))
                    .collect()
            });

            for network in &self.networks {
                let assets = enabled_assets(&enabled, network, id);
                for chain in &self.chains {
                    let addresses = self
                        .addresses
                        .used_addresses(&wallet_ref, chain, network)
                        .with_context(|| {
                            format!("look up {} addresses for wallet {} on {}", chain, id, network)
                        })?;
                    per_network
                        .entry(network.clone())
                        .or_default()
                        .push(default_account(id, network, chain, addresses, &assets));
                }
            }
        }

        state.remove("addresses");
        state.remove("balances");
        state.insert(
            "accounts",
            serde_json::to_value(accounts).context("serialize accounts")?,
        );
        Ok(state)
    }
}

/// Enabled asset codes for a wallet on a network (array entries or object keys).
fn enabled_assets(enabled: &Value, network: &str, wallet_id: &str) -> Vec<String> {
    match enabled.get(network).and_then(|wallets| wallets.get(wallet_id)) {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(Value::as_str)
            .map(str::to_owned)
            .collect(),
        Some(Value::Object(map)) => map.keys().cloned().collect(),
        _ => Vec::new(),
    }
}

fn default_account(
    wallet_id: &str,
    network: &str,
    chain: &str,
    addresses: Vec<String>,
    assets: &[String],
) -> Value {
    json!({
        "id": format!("{}:{}:{}", wallet_id, network, chain),
        "walletId": wallet_id,
        "index": 0,
        "name": format!("{} 1", chain),
        "chain": chain,
        "addresses": addresses,
        "assets": assets,
        "balances": {},
        "type": "default",
    })
}
