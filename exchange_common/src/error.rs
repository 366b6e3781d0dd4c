//! Error types shared between the core library and the CLI.
//!
//! The `ExchangeError` enum covers amount validation, registry lookups, config
//! loading, gateway failures and the usual I/O and serialization problems, so
//! every crate in the workspace can propagate a single error type with `?`.
use std::io;

use rust_decimal::Decimal;
use thiserror::Error;

/// Unified error type shared by the library and the CLI.
#[derive(Error, Debug)]
pub enum ExchangeError {
    /// Amount is not a number or is not strictly positive.
    #[error("Amount must be greater than 0 (got {0:?})")]
    InvalidAmount(String),

    /// Amount parsed fine but falls outside the accepted window.
    #[error("{message}")]
    OutOfRange {
        /// Human-readable reason shown to the user.
        message: String,
        /// The rejected amount.
        amount: Decimal,
        /// Lower bound of the window (inclusive).
        min: Decimal,
        /// Upper bound of the window (inclusive).
        max: Decimal,
    },

    /// Symbol is not present in the asset registry.
    #[error("Unknown asset: {0}")]
    UnknownAsset(String),

    /// Network name could not be resolved.
    #[error("Unknown network: {0}")]
    UnknownNetwork(String),

    /// No preset rate exists for the pair in either direction.
    #[error("Unsupported pair: {from}-{to}")]
    UnsupportedPair {
        /// Source asset symbol.
        from: String,
        /// Destination asset symbol.
        to: String,
    },

    /// A swap was requested from an asset into itself.
    #[error("Cannot swap {0} into itself")]
    SameAsset(String),

    /// Asset has no contract address on the requested network.
    #[error("{asset} not supported on {network}")]
    UnsupportedOnNetwork {
        /// Asset symbol.
        asset: String,
        /// Network name.
        network: String,
    },

    /// Address is not a `0x`-prefixed 20-byte hex string.
    #[error("Invalid address: {0}")]
    InvalidAddress(String),

    /// The chain gateway refused or failed the call.
    #[error("Gateway error: {0}")]
    Gateway(String),

    /// Configuration file is malformed or inconsistent.
    #[error("Config error: {0}")]
    Config(String),

    /// I/O error originating from the standard library or files.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Failure while encoding/decoding JSON via serde_json.
    #[error("JSON serialization/deserialization error: {0}")]
    SerdeJson(#[from] serde_json::Error),

    /// Crossbeam/channel send failed (e.g., receiver dropped); contains a short context string.
    #[error("Channel send failed: {0}")]
    ChannelSend(String),

    /// A background thread panicked before it could be joined.
    #[error("Thread panicked: {0}")]
    Thread(String),

    /// Decimal arithmetic left the representable range.
    #[error("Arithmetic overflow: {0}")]
    Overflow(String),
}
