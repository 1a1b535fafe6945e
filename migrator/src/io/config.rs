//! Migrator configuration stored in `migrator.toml`.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};

/// Defaults consumed by the wallet migration steps (TOML).
///
/// Missing fields fall back to the values the wallet shipped with.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct MigratorConfig {
    /// Network tag added to custom tokens that predate multi-chain support.
    pub token_network: String,

    /// Networks that get enabled assets and accounts.
    pub networks: Vec<String>,

    /// Chains that get a default account per wallet and network.
    pub chains: Vec<String>,

    /// Assets enabled by default, keyed by network.
    pub default_assets: BTreeMap<String, Vec<String>>,
}

impl Default for MigratorConfig {
    fn default() -> Self {
        let default_assets = BTreeMap::from([
            ("mainnet".to_string(), strings(&["BTC", "ETH", "DAI", "USDC", "USDT", "WBTC", "UNI"])),
            ("testnet".to_string(), strings(&["BTC", "ETH", "DAI", "SOV"])),
        ]);
        Self {
            token_network: "ethereum".to_string(),
            networks: strings(&["mainnet", "testnet"]),
            chains: strings(&["BTC", "ETH", "RBTC"]),
            default_assets,
        }
    }
}

impl MigratorConfig {
    pub fn validate(&self) -> Result<()> {
        if self.token_network.trim().is_empty() {
            return Err(anyhow!("token_network must be non-empty"));
        }
        if self.networks.is_empty() {
            return Err(anyhow!("networks must be a non-empty array"));
        }
        if self.chains.is_empty() {
            return Err(anyhow!("chains must be a non-empty array"));
        }
        for network in &self.networks {
            if !self.default_assets.contains_key(network) {
                return Err(anyhow!("default_assets missing entry for network '{}'", network));
            }
        }
        Ok(())
    }

    /// Default assets for `network` (empty for unknown networks).
    pub fn default_assets_for(&self, network: &str) -> &[String] {
        self.default_assets
            .get(network)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|item| item.to_string()).collect()
}

/// Load config from a TOML file.
///
/// If the file is missing, returns `MigratorConfig::default()`.
pub fn load_config(path: &Path) -> Result<MigratorConfig> {
    if !path.exists() {
        let cfg = MigratorConfig::default();
        cfg.validate()?;
        return Ok(cfg);
    }
    let contents = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    let cfg: MigratorConfig =
        toml::from_str(&contents).with_context(|| format!("parse {}", path.display()))?;
    cfg.validate()
        .with_context(|| format!("invalid config {}", path.display()))?;
    Ok(cfg)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn load_missing_returns_default() {
        let temp = tempfile::tempdir().expect("tempdir");
        let cfg = load_config(&temp.path().join("missing.toml")).expect("load");
        assert_eq!(cfg, MigratorConfig::default());
    }

    #[test]
    fn full_file_overrides_every_field() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("migrator.toml");
        fs::write(
            &path,
            "token_network = \"rsk\"\nnetworks = [\"mainnet\"]\nchains = [\"BTC\", \"BNB\"]\n\n[default_assets]\nmainnet = [\"BTC\"]\n",
        )
        .expect("write");
        let cfg = load_config(&path).expect("load");
        assert_eq!(cfg.token_network, "rsk");
        assert_eq!(cfg.networks, vec!["mainnet".to_string()]);
        assert_eq!(cfg.chains, vec!["BTC".to_string(), "BNB".to_string()]);
        assert_eq!(cfg.default_assets_for("mainnet"), ["BTC".to_string()]);
        assert!(cfg.default_assets_for("testnet").is_empty());
    }

    #[test]
    fn partial_file_keeps_defaults() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("migrator.toml");
        fs::write(&path, "token_network = \"rsk\"\n").expect("write");
        let cfg = load_config(&path).expect("load");
        assert_eq!(cfg.token_network, "rsk");
        assert_eq!(cfg.networks, MigratorConfig::default().networks);
    }

    #[test]
    fn network_without_default_assets_is_rejected() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("migrator.toml");
        fs::write(&path, "networks = [\"mainnet\", \"devnet\"]\n").expect("write");
        let err = load_config(&path).expect_err("invalid");
        assert!(format!("{:#}", err).contains("devnet"));
    }

    #[test]
    fn blank_token_network_is_rejected() {
        let cfg = MigratorConfig {
            token_network: "  ".to_string(),
            ..MigratorConfig::default()
        };
        let err = cfg.validate().expect_err("blank token network");
        assert!(err.to_string().contains("token_network"));
    }

    #[test]
    fn empty_networks_are_rejected() {
        let cfg = MigratorConfig {
            networks: Vec::new(),
            ..MigratorConfig::default()
        };
        let err = cfg.validate().expect_err("no networks");
        assert!(err.to_string().contains("networks"));
    }

    #[test]
    fn empty_chains_are_rejected() {
        let cfg = MigratorConfig {
            chains: Vec::new(),
            ..MigratorConfig::default()
        };
        let err = cfg.validate().expect_err("no chains");
        assert!(err.to_string().contains("chains"));
    }
}
