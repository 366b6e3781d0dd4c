//! Quote, fee and ledger core of the multi-chain exchange.
//!
//! Everything here is plain data and pure functions except for two explicitly
//! constructed stateful values: the `TransactionLedger` and the `PegMonitor`.
//! Nothing is a process-wide singleton; callers build a `Registry` and a
//! `QuoteEngine` from an `ExchangeConfig` and pass them around.
//!
//! - `config` — JSON configuration artifact and the built-in tables.
//! - `registry` — asset registry with per-network contract addresses.
//! - `model` — quotes, fees, ledger records and peg health types.
//! - `gateway` — `ChainGateway` capability plus an in-memory mock.
//! - `desk` — deposit/withdraw processing through a gateway into the ledger.
//! - `peg_watcher` — background peg polling with channel broadcast.
#![warn(missing_docs)]
pub mod config;
pub mod desk;
pub mod gateway;
pub mod model;
pub mod peg_watcher;
pub mod registry;

pub use config::ExchangeConfig;
pub use desk::TransferDesk;
pub use gateway::{ChainGateway, MockChainGateway};
pub use model::fees::{FeeCalculator, FeeStructure, Validation};
pub use model::ledger::TransactionLedger;
pub use model::quote::{PairKey, Quote, QuoteEngine};
pub use registry::Registry;
