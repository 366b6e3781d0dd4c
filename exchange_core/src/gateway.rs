//! Chain access capability.
//!
//! Signing, broadcasting and chain reads belong to an external wallet library and node
//! provider. The core only sees the `ChainGateway` trait; `MockChainGateway` is the
//! in-memory implementation used by the CLI and the tests.

use std::collections::HashMap;

use chrono::Utc;
use exchange_common::address::ensure_evm_address;
use exchange_common::{ExchangeError, Network, Result};
use log::debug;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::model::ledger::TransactionStatus;

/// Token transfer to sign and broadcast.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferRequest {
    /// Asset symbol.
    pub asset: String,
    /// Token contract on `network`.
    pub contract: String,
    /// Amount in whole token units.
    pub amount: Decimal,
    /// Sending account.
    pub from: String,
    /// Receiving account.
    pub destination: String,
    /// Network to broadcast on.
    pub network: Network,
}

/// Transaction receipt as reported by the chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Receipt {
    /// Transaction hash.
    pub hash: String,
    /// Network the transaction was mined on.
    pub network: Network,
    /// Final status.
    pub status: TransactionStatus,
    /// Block that included the transaction.
    pub block_number: u64,
    /// Blocks mined on top of `block_number`.
    pub confirmations: u64,
    /// UTC timestamp in milliseconds since Unix epoch.
    pub timestamp: u64,
}

/// Capability to move tokens and read chain state.
pub trait ChainGateway {
    /// Sign and broadcast `request`, returning the transaction hash.
    fn transfer(&mut self, request: &TransferRequest) -> Result<String>;

    /// Token balance of `address` on `network`, in whole token units.
    fn balance(&self, asset: &str, network: Network, address: &str) -> Result<Decimal>;

    /// Receipt for `hash`, or `None` when the transaction is unknown or still pending.
    fn receipt(&self, hash: &str, network: Network) -> Result<Option<Receipt>>;
}

/// In-memory gateway: random hashes, instant confirmation, configurable balances.
///
/// Transfers debit `from` and credit `destination`; an overdraft fails with a gateway error.
#[derive(Debug, Default)]
pub struct MockChainGateway {
    balances: HashMap<(Network, String, String), Decimal>,
    receipts: HashMap<String, Receipt>,
    block_number: u64,
    failure: Option<String>,
}

impl MockChainGateway {
    /// Empty gateway with every balance at zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the balance of `address` for `asset` on `network`.
    pub fn set_balance(&mut self, asset: &str, network: Network, address: &str, amount: Decimal) {
        self.balances.insert(Self::key(asset, network, address), amount);
    }

    /// Make every subsequent transfer fail with `reason`.
    pub fn fail_transfers(&mut self, reason: &str) {
        self.failure = Some(reason.to_string());
    }

    fn key(asset: &str, network: Network, address: &str) -> (Network, String, String) {
        (network, asset.to_string(), address.to_lowercase())
    }

    fn held(&self, asset: &str, network: Network, address: &str) -> Decimal {
        self.balances
            .get(&Self::key(asset, network, address))
            .copied()
            .unwrap_or(Decimal::ZERO)
    }

    /// Number of transfers broadcast so far.
    pub fn transfer_count(&self) -> usize {
        self.receipts.len()
    }

    fn random_hash() -> String {
        let bytes: [u8; 32] = rand::random();
        let hex: String = bytes.iter().map(|b| format!("{:02x}", b)).collect();
        format!("0x{}", hex)
    }
}

impl ChainGateway for MockChainGateway {
    fn transfer(&mut self, request: &TransferRequest) -> Result<String> {
        if let Some(reason) = &self.failure {
            return Err(ExchangeError::Gateway(reason.clone()));
        }
        ensure_evm_address(&request.from)?;
        ensure_evm_address(&request.destination)?;

        let (asset, network) = (request.asset.as_str(), request.network);
        let from_key = Self::key(asset, network, &request.from);
        let to_key = Self::key(asset, network, &request.destination);
        let remaining = self
            .held(asset, network, &request.from)
            .checked_sub(request.amount)
            .filter(|left| !left.is_sign_negative())
            .ok_or_else(|| {
                let reason = format!("insufficient {} balance at {}", asset, request.from);
                ExchangeError::Gateway(reason)
            })?;
        if from_key != to_key {
            let credited = self
                .held(asset, network, &request.destination)
                .checked_add(request.amount)
                .ok_or_else(|| {
                    ExchangeError::Overflow(format!("{} balance of {}", asset, request.destination))
                })?;
            self.balances.insert(from_key, remaining);
            self.balances.insert(to_key, credited);
        }

        let hash = Self::random_hash();
        self.block_number += 1;
        self.receipts.insert(
            hash.clone(),
            Receipt {
                hash: hash.clone(),
                network: request.network,
                status: TransactionStatus::Confirmed,
                block_number: self.block_number,
                confirmations: 0,
                timestamp: Utc::now().timestamp_millis() as u64,
            },
        );
        debug!(
            "Mock transfer {} {} on {} -> {}",
            request.amount, request.asset, request.network, hash
        );
        Ok(hash)
    }

    fn balance(&self, asset: &str, network: Network, address: &str) -> Result<Decimal> {
        ensure_evm_address(address)?;
        Ok(self.held(asset, network, address))
    }

    fn receipt(&self, hash: &str, network: Network) -> Result<Option<Receipt>> {
        Ok(self
            .receipts
            .get(hash)
            .filter(|r| r.network == network)
            .map(|r| Receipt {
                confirmations: self.block_number - r.block_number,
                ..r.clone()
            }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use exchange_common::address::is_tx_hash;

    const ALICE: &str = "0x1111111111111111111111111111111111111111";
    const BOB: &str = "0x2222222222222222222222222222222222222222";

    fn request() -> TransferRequest {
        TransferRequest {
            asset: "USDT".to_string(),
            contract: "0xdAC17F958D2ee523a2206206994597C13D831ec7".to_string(),
            amount: Decimal::from(25),
            from: ALICE.to_string(),
            destination: BOB.to_string(),
            network: Network::Ethereum,
        }
    }

    #[test]
    fn transfer_issues_unique_confirmed_hashes() {
        let mut gateway = MockChainGateway::new();
        gateway.set_balance("USDT", Network::Ethereum, ALICE, Decimal::from(50));
        let first = gateway.transfer(&request()).unwrap();
        let second = gateway.transfer(&request()).unwrap();
        assert!(is_tx_hash(&first));
        assert_ne!(first, second);

        let receipt = gateway.receipt(&first, Network::Ethereum).unwrap().unwrap();
        assert_eq!(receipt.status, TransactionStatus::Confirmed);
        assert_eq!(receipt.confirmations, 1);
        assert!(gateway.receipt(&first, Network::Bsc).unwrap().is_none());
    }

    #[test]
    fn failure_mode_and_bad_destination() {
        let mut gateway = MockChainGateway::new();
        let mut bad = request();
        bad.destination = "alice".to_string();
        assert!(matches!(gateway.transfer(&bad), Err(ExchangeError::InvalidAddress(_))));

        gateway.fail_transfers("nonce too low");
        assert!(matches!(gateway.transfer(&request()), Err(ExchangeError::Gateway(_))));
        assert_eq!(gateway.transfer_count(), 0);
    }

    #[test]
    fn transfers_move_balances_and_refuse_overdrafts() {
        let mut gateway = MockChainGateway::new();
        gateway.set_balance("USDT", Network::Ethereum, ALICE, Decimal::from(30));
        gateway.transfer(&request()).unwrap();
        assert_eq!(gateway.balance("USDT", Network::Ethereum, ALICE).unwrap(), Decimal::from(5));
        assert_eq!(gateway.balance("USDT", Network::Ethereum, BOB).unwrap(), Decimal::from(25));

        let err = gateway.transfer(&request()).unwrap_err();
        assert!(matches!(err, ExchangeError::Gateway(ref m) if m.starts_with("insufficient USDT")));
        assert_eq!(gateway.balance("USDT", Network::Ethereum, ALICE).unwrap(), Decimal::from(5));
        assert_eq!(gateway.transfer_count(), 1);
    }

    #[test]
    fn balances_default_to_zero_and_ignore_address_case() {
        let mixed = "0xABCDEFabcdef0123456789ABCDEFabcdef012345";
        let mut gateway = MockChainGateway::new();
        assert_eq!(gateway.balance("USDT", Network::Base, mixed).unwrap(), Decimal::ZERO);
        gateway.set_balance("USDT", Network::Base, &mixed.to_lowercase(), Decimal::from(7));
        assert_eq!(gateway.balance("USDT", Network::Base, mixed).unwrap(), Decimal::from(7));
        assert!(gateway.balance("USDT", Network::Base, "nope").is_err());
    }
}
