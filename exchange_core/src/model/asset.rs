//! Asset registry entries.

use std::collections::BTreeMap;

use exchange_common::Network;
use serde::{Deserialize, Serialize};

/// A tradable token as listed in the registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Asset {
    /// Unique ticker symbol, case-sensitive (`USDTz` and `USDT` are different assets).
    pub symbol: String,
    /// Display name.
    pub name: String,
    /// Native decimal precision of the token contract.
    pub decimals: u8,
    /// Inline icon: an emoji glyph or an image path starting with `/`.
    pub icon: String,
    /// Larger icon for hero displays.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_icon: Option<String>,
    /// Contract address per network.
    #[serde(default)]
    pub contracts: BTreeMap<Network, String>,
}

impl Asset {
    /// Build an asset without contract addresses.
    pub fn new(symbol: &str, name: &str, decimals: u8, icon: &str) -> Self {
        Asset {
            symbol: symbol.to_string(),
            name: name.to_string(),
            decimals,
            icon: icon.to_string(),
            display_icon: None,
            contracts: BTreeMap::new(),
        }
    }

    /// Attach a large display icon.
    pub fn with_display_icon(mut self, icon: &str) -> Self {
        self.display_icon = Some(icon.to_string());
        self
    }

    /// Attach the contract address on `network`.
    pub fn with_contract(mut self, network: Network, address: &str) -> Self {
        self.contracts.insert(network, address.to_string());
        self
    }

    /// Display icon, falling back to the inline icon.
    pub fn display_icon_or_inline(&self) -> &str {
        self.display_icon.as_deref().unwrap_or(&self.icon)
    }
}

/// Dropdown entry for an asset selector.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AssetOption {
    /// `"{icon} {symbol}"` for known assets, the bare symbol otherwise.
    pub display: String,
    /// Asset symbol.
    pub symbol: String,
    /// Asset name, empty for unknown symbols.
    pub name: String,
}
