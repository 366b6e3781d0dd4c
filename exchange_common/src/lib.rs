//!
//! Common types and utilities shared by the exchange core library and the CLI.
//!
//! This crate aggregates:
//! - `error` — unified error type `ExchangeError` used across the workspace.
//! - `result` — handy `Result<T, ExchangeError>` alias.
//! - `networks` — supported EVM networks with chain ids and RPC endpoints.
//! - `address` — EVM address and transaction hash helpers.
#![warn(missing_docs)]
pub mod address;
pub mod error;
pub mod networks;
pub mod result;

pub use error::ExchangeError;
pub use networks::Network;
pub use result::Result;
