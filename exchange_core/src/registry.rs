//! Asset registry.
//!
//! A read-only table of assets keyed by symbol, built once from configuration. Lookups
//! for unknown symbols return `None` or an empty value instead of failing, because
//! forms routinely ask about symbols that are not (yet) selected or listed.

use std::collections::HashMap;

use exchange_common::address::is_evm_address;
use exchange_common::{ExchangeError, Network, Result};

use crate::model::asset::{Asset, AssetOption};

/// Immutable symbol → `Asset` table preserving listing order.
#[derive(Debug, Clone)]
pub struct Registry {
    assets: Vec<Asset>,
    index: HashMap<String, usize>,
    swap_assets: Vec<String>,
    bridge_assets: Vec<String>,
}

impl Registry {
    /// Build a registry. Symbols must be unique and contract addresses well-formed.
    ///
    /// `swap_assets` and `bridge_assets` restrict the selector lists; symbols in them
    /// that are not registered are dropped.
    pub fn new(assets: Vec<Asset>, swap_assets: &[String], bridge_assets: &[String]) -> Result<Self> {
        let mut index = HashMap::with_capacity(assets.len());
        for (pos, asset) in assets.iter().enumerate() {
            if asset.symbol.is_empty() {
                return Err(ExchangeError::Config("Asset with empty symbol".to_string()));
            }
            if index.insert(asset.symbol.clone(), pos).is_some() {
                return Err(ExchangeError::Config(format!(
                    "Duplicate asset symbol: {}",
                    asset.symbol
                )));
            }
            if let Some((network, address)) = asset
                .contracts
                .iter()
                .find(|(_, address)| !is_evm_address(address))
            {
                return Err(ExchangeError::Config(format!(
                    "{} has a malformed contract address on {}: {}",
                    asset.symbol, network, address
                )));
            }
        }

        let known = |list: &[String]| -> Vec<String> {
            list.iter()
                .filter(|symbol| index.contains_key(symbol.as_str()))
                .cloned()
                .collect()
        };
        let swap_assets = known(swap_assets);
        let bridge_assets = known(bridge_assets);

        Ok(Registry {
            assets,
            index,
            swap_assets,
            bridge_assets,
        })
    }

    /// Asset for `symbol`, if registered.
    pub fn get_asset(&self, symbol: &str) -> Option<&Asset> {
        self.index.get(symbol).map(|&pos| &self.assets[pos])
    }

    /// All assets in listing order.
    pub fn list_assets(&self) -> &[Asset] {
        &self.assets
    }

    /// Registered symbols in listing order.
    pub fn symbols(&self) -> Vec<&str> {
        self.assets.iter().map(|a| a.symbol.as_str()).collect()
    }

    /// Whether `symbol` is registered.
    pub fn contains(&self, symbol: &str) -> bool {
        self.index.contains_key(symbol)
    }

    /// An icon reference is an image when it is a path rather than a glyph.
    pub fn is_image_icon(icon: &str) -> bool {
        icon.starts_with('/')
    }

    /// Inline icon for `symbol`, empty when unknown.
    pub fn inline_icon(&self, symbol: &str) -> &str {
        self.get_asset(symbol).map(|a| a.icon.as_str()).unwrap_or("")
    }

    /// Large icon for `symbol`, falling back to the inline icon, empty when unknown.
    pub fn display_icon(&self, symbol: &str) -> &str {
        self.get_asset(symbol)
            .map(Asset::display_icon_or_inline)
            .unwrap_or("")
    }

    /// `"{icon} {symbol}"`, or the bare symbol when unknown.
    pub fn format_display(&self, symbol: &str) -> String {
        match self.get_asset(symbol) {
            Some(asset) => format!("{} {}", asset.icon, asset.symbol),
            None => symbol.to_string(),
        }
    }

    /// Selector entry for `symbol`.
    pub fn asset_option(&self, symbol: &str) -> AssetOption {
        match self.get_asset(symbol) {
            Some(asset) => AssetOption {
                display: format!("{} {}", asset.icon, asset.symbol),
                symbol: asset.symbol.clone(),
                name: asset.name.clone(),
            },
            None => AssetOption {
                display: symbol.to_string(),
                symbol: symbol.to_string(),
                name: String::new(),
            },
        }
    }

    /// Symbols offered in the swap selector.
    pub fn swap_assets(&self) -> &[String] {
        &self.swap_assets
    }

    /// Symbols offered in the bridge selector.
    pub fn bridge_assets(&self) -> &[String] {
        &self.bridge_assets
    }

    /// Contract address of `symbol` on `network`.
    pub fn contract_address(&self, symbol: &str, network: Network) -> Option<&str> {
        self.get_asset(symbol)
            .and_then(|a| a.contracts.get(&network))
            .map(String::as_str)
    }

    /// Whether `symbol` has a contract on `network`.
    pub fn is_supported_on_network(&self, symbol: &str, network: Network) -> bool {
        self.contract_address(symbol, network).is_some()
    }

    /// Networks where `symbol` has a contract, in network order. Empty when unknown.
    pub fn available_networks(&self, symbol: &str) -> Vec<Network> {
        match self.get_asset(symbol) {
            Some(asset) => asset.contracts.keys().copied().collect(),
            None => Vec::new(),
        }
    }

    /// Every ordered pair of distinct registered symbols.
    pub fn supported_pairs(&self) -> Vec<(String, String)> {
        let mut pairs = Vec::with_capacity(self.assets.len() * self.assets.len());
        for from in &self.assets {
            for to in &self.assets {
                if from.symbol != to.symbol {
                    pairs.push((from.symbol.clone(), to.symbol.clone()));
                }
            }
        }
        pairs
    }
}
