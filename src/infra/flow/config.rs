//! Flow network configuration.
//!
//! One immutable value built at startup and handed to the gateway and wallet
//! constructors. Nothing here is global.

use std::collections::BTreeMap;
use std::env;

use crate::domain::{Address, ConfigError};

pub const DEFAULT_APP_TITLE: &str = "Flow Name Service";
pub const DEFAULT_APP_ICON: &str = "https://placekitten.com/g/200/200";
pub const TESTNET_ACCESS_NODE: &str = "https://rest-testnet.onflow.org";
pub const TESTNET_WALLET_DISCOVERY: &str = "https://fcl-discovery.onflow.org/testnet/authn";
pub const TESTNET_DOMAINS_ADDRESS: &str = "0x2566f24c5d792f8f";
pub const TESTNET_NFT_ADDRESS: &str = "0x631e88ae7f1d7c20";
pub const TESTNET_FT_ADDRESS: &str = "0x9a0766d93b6608b7";

/// Import placeholders used in the Cadence sources
pub const DOMAINS_ALIAS: &str = "0xDomains";
pub const NFT_ALIAS: &str = "0xNonFungibleToken";
pub const FT_ALIAS: &str = "0xFungibleToken";

/// Endpoints and contract addresses for one Flow network
#[derive(Debug, Clone, PartialEq)]
pub struct FlowNetworkConfig {
    /// Dapp name shown by the wallet when connecting
    pub app_title: String,
    /// Dapp icon shown by the wallet when connecting
    pub app_icon: String,
    /// Access node REST API base URL
    pub access_node_url: String,
    /// Wallet discovery endpoint
    pub wallet_discovery_url: String,
    pub domains_address: Address,
    pub nft_address: Address,
    pub ft_address: Address,
}

impl Default for FlowNetworkConfig {
    fn default() -> Self {
        Self::testnet()
    }
}

impl FlowNetworkConfig {
    /// Flow testnet with the deployed FNS contracts
    #[must_use]
    pub fn testnet() -> Self {
        Self {
            app_title: DEFAULT_APP_TITLE.to_string(),
            app_icon: DEFAULT_APP_ICON.to_string(),
            access_node_url: TESTNET_ACCESS_NODE.to_string(),
            wallet_discovery_url: TESTNET_WALLET_DISCOVERY.to_string(),
            domains_address: fixed_address(TESTNET_DOMAINS_ADDRESS),
            nft_address: fixed_address(TESTNET_NFT_ADDRESS),
            ft_address: fixed_address(TESTNET_FT_ADDRESS),
        }
    }

    /// Point the access node at another URL, keeping everything else
    #[must_use]
    pub fn with_access_node(mut self, url: impl Into<String>) -> Self {
        self.access_node_url = url.into();
        self
    }

    /// Load configuration from environment variables, falling back to testnet
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::testnet();

        let app_title = env::var("FNS_APP_TITLE")
            .ok()
            .filter(|v| !v.is_empty())
            .unwrap_or(defaults.app_title);
        let app_icon = env::var("FNS_APP_ICON")
            .ok()
            .filter(|v| !v.is_empty())
            .unwrap_or(defaults.app_icon);
        let access_node_url = env::var("FLOW_ACCESS_NODE_URL")
            .ok()
            .filter(|v| !v.is_empty())
            .unwrap_or(defaults.access_node_url);
        let wallet_discovery_url = env::var("FLOW_WALLET_DISCOVERY_URL")
            .ok()
            .filter(|v| !v.is_empty())
            .unwrap_or(defaults.wallet_discovery_url);

        Ok(Self {
            app_title,
            app_icon,
            access_node_url: access_node_url.trim_end_matches('/').to_string(),
            wallet_discovery_url,
            domains_address: address_from_env("FNS_DOMAINS_ADDRESS", defaults.domains_address)?,
            nft_address: address_from_env("FNS_NFT_ADDRESS", defaults.nft_address)?,
            ft_address: address_from_env("FNS_FT_ADDRESS", defaults.ft_address)?,
        })
    }

    /// Replace contract import placeholders with the configured addresses.
    #[must_use]
    pub fn resolve_imports(&self, cadence: &str) -> String {
        cadence
            .replace(DOMAINS_ALIAS, self.domains_address.as_str())
            .replace(NFT_ALIAS, self.nft_address.as_str())
            .replace(FT_ALIAS, self.ft_address.as_str())
    }

    /// The fixed key/value settings, keyed the way wallets and tooling name them
    #[must_use]
    pub fn entries(&self) -> BTreeMap<String, String> {
        BTreeMap::from([
            ("app.detail.title".to_string(), self.app_title.clone()),
            ("app.detail.icon".to_string(), self.app_icon.clone()),
            ("accessNode.api".to_string(), self.access_node_url.clone()),
            (
                "discovery.wallet".to_string(),
                self.wallet_discovery_url.clone(),
            ),
            (DOMAINS_ALIAS.to_string(), self.domains_address.to_string()),
            (NFT_ALIAS.to_string(), self.nft_address.to_string()),
            (FT_ALIAS.to_string(), self.ft_address.to_string()),
        ])
    }
}

fn fixed_address(value: &str) -> Address {
    // Compile-time constants, all valid
    value
        .parse()
        .unwrap_or_else(|_| unreachable!("invalid built-in address {value}"))
}

fn address_from_env(key: &str, default: Address) -> Result<Address, ConfigError> {
    match env::var(key).ok().filter(|v| !v.is_empty()) {
        Some(raw) => raw.parse().map_err(|e| ConfigError::Invalid {
            key: key.to_string(),
            message: format!("{}", e),
        }),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_testnet_defaults() {
        let config = FlowNetworkConfig::testnet();
        assert_eq!(config.access_node_url, "https://rest-testnet.onflow.org");
        assert_eq!(config.domains_address.as_str(), "0x2566f24c5d792f8f");
        assert_eq!(config.nft_address.as_str(), "0x631e88ae7f1d7c20");
        assert_eq!(config.ft_address.as_str(), "0x9a0766d93b6608b7");
        assert_eq!(config.app_title, "Flow Name Service");
    }

    #[test]
    fn test_resolve_imports_replaces_every_alias() {
        let config = FlowNetworkConfig::testnet();
        let cadence = "import Domains from 0xDomains\n\
                       import NonFungibleToken from 0xNonFungibleToken\n\
                       import FungibleToken from 0xFungibleToken\n";
        let resolved = config.resolve_imports(cadence);

        assert!(resolved.contains("import Domains from 0x2566f24c5d792f8f"));
        assert!(resolved.contains("import NonFungibleToken from 0x631e88ae7f1d7c20"));
        assert!(resolved.contains("import FungibleToken from 0x9a0766d93b6608b7"));
        assert!(!resolved.contains("0xDomains"));
    }

    #[test]
    fn test_entries_lists_all_keys() {
        let entries = FlowNetworkConfig::testnet().entries();
        assert_eq!(entries.len(), 7);
        assert_eq!(
            entries.get("discovery.wallet").map(String::as_str),
            Some("https://fcl-discovery.onflow.org/testnet/authn")
        );
        assert_eq!(
            entries.get("0xDomains").map(String::as_str),
            Some("0x2566f24c5d792f8f")
        );
    }

    #[test]
    fn test_with_access_node_overrides_url_only() {
        let config = FlowNetworkConfig::testnet().with_access_node("http://127.0.0.1:8888");
        assert_eq!(config.access_node_url, "http://127.0.0.1:8888");
        assert_eq!(config.domains_address, FlowNetworkConfig::testnet().domains_address);
    }
}
