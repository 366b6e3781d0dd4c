//! Capped in-memory transaction history.
//!
//! The ledger records synthetic deposit/withdraw entries for the history view. It
//! exposes three core operations:
//!
//! - `TransactionLedger::record(tx)` — append an entry, evicting the oldest one once the
//!   ledger is at capacity.
//! - `TransactionLedger::history(limit)` — the most recent `limit` entries, oldest first.
//! - `TransactionLedger::find(hash)` — look up an entry by transaction hash.
//!
//! Design notes:
//! - Entries live for the lifetime of the value; nothing is persisted.
//! - The ledger is not synchronized; if it is shared across threads, wrap it with a
//!   synchronization primitive (e.g., `Mutex`).
//! - Statuses never move past `Confirmed` because no real chain is watched.

use std::collections::VecDeque;

use chrono::Utc;
use exchange_common::Network;
use log::debug;
use serde::{Deserialize, Serialize};
use strum_macros::Display;

/// Default number of entries kept.
pub const DEFAULT_CAPACITY: usize = 1000;
/// Default page size for `history`.
pub const DEFAULT_HISTORY_LIMIT: usize = 50;

/// Direction of a recorded transfer.
#[allow(missing_docs)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum TransactionKind {
    Deposit,
    Withdraw,
}

/// Settlement status of a recorded transfer.
#[allow(missing_docs)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum TransactionStatus {
    Pending,
    Confirmed,
    Failed,
}

/// One entry of the transaction history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    /// Entry id; equal to the hash for gateway-issued transfers.
    pub id: String,
    /// Deposit or withdraw.
    pub kind: TransactionKind,
    /// Asset symbol.
    pub asset: String,
    /// Amount as entered by the user.
    pub amount: String,
    /// Network the transfer ran on.
    pub network: Network,
    /// Settlement status.
    pub status: TransactionStatus,
    /// Transaction hash.
    pub hash: String,
    /// UTC timestamp in milliseconds since Unix epoch.
    pub timestamp: u64,
}

impl Transaction {
    /// Build a confirmed entry stamped with the current time.
    pub fn confirmed(
        kind: TransactionKind,
        asset: &str,
        amount: &str,
        network: Network,
        hash: &str,
    ) -> Self {
        Transaction {
            id: hash.to_string(),
            kind,
            asset: asset.to_string(),
            amount: amount.to_string(),
            network,
            status: TransactionStatus::Confirmed,
            hash: hash.to_string(),
            timestamp: Utc::now().timestamp_millis() as u64,
        }
    }
}

/// FIFO transaction history with a hard capacity.
#[derive(Debug, Clone)]
pub struct TransactionLedger {
    entries: VecDeque<Transaction>,
    capacity: usize,
}

impl Default for TransactionLedger {
    fn default() -> Self {
        TransactionLedger::new(DEFAULT_CAPACITY)
    }
}

impl TransactionLedger {
    /// Create an empty ledger keeping at most `capacity` entries (minimum 1).
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: VecDeque::with_capacity(capacity.min(DEFAULT_CAPACITY)),
            capacity,
        }
    }

    /// Append an entry, evicting the oldest one when full.
    pub fn record(&mut self, tx: Transaction) {
        self.entries.push_back(tx);
        while self.entries.len() > self.capacity {
            if let Some(evicted) = self.entries.pop_front() {
                debug!("Ledger full, evicted {}", evicted.hash);
            }
        }
    }

    /// The most recent `limit` entries, oldest first.
    pub fn history(&self, limit: usize) -> Vec<Transaction> {
        let skip = self.entries.len().saturating_sub(limit);
        self.entries.iter().skip(skip).cloned().collect()
    }

    /// Entry with the given hash, if still retained.
    pub fn find(&self, hash: &str) -> Option<&Transaction> {
        self.entries.iter().find(|tx| tx.hash == hash)
    }

    /// Number of retained entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the ledger holds no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Maximum number of retained entries.
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tx(n: usize) -> Transaction {
        Transaction::confirmed(
            TransactionKind::Deposit,
            "USDT",
            "10",
            Network::Ethereum,
            &format!("0x{:064x}", n),
        )
    }

    #[test]
    fn history_returns_latest_entries_oldest_first() {
        let mut ledger = TransactionLedger::new(10);
        for n in 0..5 {
            ledger.record(tx(n));
        }
        let page = ledger.history(2);
        assert_eq!(page.len(), 2);
        assert_eq!(page[0].hash, tx(3).hash);
        assert_eq!(page[1].hash, tx(4).hash);
        assert_eq!(ledger.history(DEFAULT_HISTORY_LIMIT).len(), 5);
    }

    #[test]
    fn evicts_oldest_at_capacity() {
        let mut ledger = TransactionLedger::new(3);
        for n in 0..4 {
            ledger.record(tx(n));
        }
        assert_eq!(ledger.len(), 3);
        assert!(ledger.find(&tx(0).hash).is_none());
        assert!(ledger.find(&tx(3).hash).is_some());
    }

    #[test]
    fn zero_capacity_is_raised_to_one() {
        let mut ledger = TransactionLedger::new(0);
        ledger.record(tx(1));
        ledger.record(tx(2));
        assert_eq!(ledger.capacity(), 1);
        assert_eq!(ledger.history(5)[0].hash, tx(2).hash);
    }

    #[test]
    fn kind_and_status_display_lowercase() {
        assert_eq!(TransactionKind::Withdraw.to_string(), "withdraw");
        assert_eq!(TransactionStatus::Confirmed.to_string(), "confirmed");
    }
}
