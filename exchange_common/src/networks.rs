//! Supported EVM networks and their static metadata.

use std::str::FromStr;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use strum::IntoEnumIterator;
use strum_macros::{Display, EnumIter, EnumString};

use crate::error::ExchangeError;
use crate::result::Result;

/// Networks the exchange can route deposits, withdrawals and bridges through.
///
/// Variant order is the display order used by registry listings.
#[allow(missing_docs)]
#[derive(
    Debug,
    Clone,
    Copy,
    Serialize,
    Deserialize,
    ValueEnum,
    Display,
    EnumString,
    EnumIter,
    Hash,
    Eq,
    PartialEq,
    Ord,
    PartialOrd,
)]
#[serde(rename_all = "lowercase")]
#[clap(rename_all = "lower")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum Network {
    Ethereum,
    Bsc,
    Polygon,
    Arbitrum,
    Optimism,
    Base,
    Avalanche,
}

impl Network {
    /// EIP-155 chain id.
    pub fn chain_id(self) -> u64 {
        match self {
            Network::Ethereum => 1,
            Network::Bsc => 56,
            Network::Polygon => 137,
            Network::Arbitrum => 42161,
            Network::Optimism => 10,
            Network::Base => 8453,
            Network::Avalanche => 43114,
        }
    }

    /// Human-readable network name.
    pub fn display_name(self) -> &'static str {
        match self {
            Network::Ethereum => "Ethereum",
            Network::Bsc => "BSC",
            Network::Polygon => "Polygon",
            Network::Arbitrum => "Arbitrum",
            Network::Optimism => "Optimism",
            Network::Base => "Base",
            Network::Avalanche => "Avalanche",
        }
    }

    /// Public RPC endpoint. Only used for display; nothing in the workspace dials it.
    pub fn rpc_url(self) -> &'static str {
        match self {
            Network::Ethereum => "https://eth.llamarpc.com",
            Network::Bsc => "https://bsc.llamarpc.com",
            Network::Polygon => "https://polygon.llamarpc.com",
            Network::Arbitrum => "https://arbitrum.llamarpc.com",
            Network::Optimism => "https://optimism.llamarpc.com",
            Network::Base => "https://base.llamarpc.com",
            Network::Avalanche => "https://avalanche.llamarpc.com",
        }
    }

    /// Block explorer page for `address` on this network.
    pub fn explorer_url(self, address: &str) -> String {
        let base = match self {
            Network::Ethereum => "https://etherscan.io/address/",
            Network::Bsc => "https://bscscan.com/address/",
            Network::Polygon => "https://polygonscan.com/address/",
            Network::Arbitrum => "https://arbiscan.io/address/",
            Network::Optimism => "https://optimistic.etherscan.io/address/",
            Network::Base => "https://basescan.org/address/",
            Network::Avalanche => "https://snowtrace.io/address/",
        };
        format!("{}{}", base, address)
    }

    /// Parse a network name, case-insensitively.
    pub fn parse(name: &str) -> Result<Network> {
        <Network as FromStr>::from_str(name.trim()).map_err(|_| ExchangeError::UnknownNetwork(name.to_string()))
    }

    /// Resolve a network from its chain id.
    pub fn from_chain_id(chain_id: u64) -> Option<Network> {
        Network::iter().find(|n| n.chain_id() == chain_id)
    }

    /// All networks in display order.
    pub fn all() -> Vec<Network> {
        Network::iter().collect()
    }

    /// Network name for a chain id, or `Chain {id}` when the id is not supported.
    pub fn name_for_chain_id(chain_id: u64) -> String {
        Network::from_chain_id(chain_id)
            .map(|n| n.display_name().to_string())
            .unwrap_or_else(|| format!("Chain {}", chain_id))
    }
}
