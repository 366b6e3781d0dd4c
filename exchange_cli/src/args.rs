//! Command-line arguments for the exchange CLI.
//!
//! This module defines the CLI interface using `clap`. See `main` for end-to-end usage.
use clap::{Parser, Subcommand};
use exchange_common::Network;
use exchange_core::model::amount::parse_amount;
use rust_decimal::Decimal;

/// Parsed command-line arguments.
#[derive(Debug, Parser)]
#[command(version, about, long_about = None)]
pub struct Args {
    /// Path to a JSON exchange config. The built-in tables are used when omitted.
    #[arg(long, global = true)]
    pub config: Option<String>,

    /// Operation to run.
    #[command(subcommand)]
    pub command: Command,
}

/// Supported operations. Every result is printed as JSON.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// List registered assets with their icons and networks.
    Assets,

    /// List supported networks with chain ids.
    Networks,

    /// Quote a swap between two assets.
    Swap {
        /// Amount of the source asset.
        #[arg(long)]
        amount: String,
        /// Source asset symbol.
        #[arg(long)]
        from: String,
        /// Destination asset symbol.
        #[arg(long)]
        to: String,
    },

    /// Quote a cross-chain bridge of one asset.
    Bridge {
        /// Amount to bridge.
        #[arg(long)]
        amount: String,
        /// Asset symbol.
        #[arg(long)]
        token: String,
    },

    /// Deposit/withdraw fee breakdown for a USD amount.
    Fees {
        /// Amount in USD.
        #[arg(long)]
        amount: String,
    },

    /// Deposit through the in-memory gateway.
    Deposit {
        /// Asset symbol.
        #[arg(long)]
        asset: String,
        /// Amount to deposit.
        #[arg(long)]
        amount: String,
        /// Network to deposit on.
        #[arg(long, value_enum, ignore_case = true)]
        network: Network,
        /// Depositing account.
        #[arg(long)]
        address: String,
        /// Balance the in-memory gateway credits to `address` before the deposit.
        #[arg(long, default_value = "1000000")]
        balance: Decimal,
    },

    /// Withdraw through the in-memory gateway.
    Withdraw {
        /// Asset symbol.
        #[arg(long)]
        asset: String,
        /// Amount to withdraw.
        #[arg(long)]
        amount: String,
        /// Network to withdraw on.
        #[arg(long, value_enum, ignore_case = true)]
        network: Network,
        /// Requesting account.
        #[arg(long)]
        address: String,
        /// Receiving account.
        #[arg(long)]
        destination: String,
        /// Balance the in-memory gateway credits to `address` before the withdrawal.
        #[arg(long, default_value = "1000000")]
        balance: Decimal,
    },

    /// Grade a single market price against the peg.
    Peg {
        /// Observed market price in USD.
        #[arg(long, value_parser = parse_price)]
        price: Decimal,
        /// Circulating supply, for the collateral section of the report.
        #[arg(long, requires = "collateral")]
        supply: Option<Decimal>,
        /// Collateral backing the supply, in USD.
        #[arg(long, requires = "supply")]
        collateral: Option<Decimal>,
    },

    /// Poll a simulated price feed until Ctrl+C.
    Watch {
        /// Starting market price in USD.
        #[arg(long, default_value = "1", value_parser = parse_price)]
        price: Decimal,
        /// Poll interval in milliseconds.
        #[arg(long, default_value_t = 1000)]
        interval_ms: u64,
        /// Stop after this many reports.
        #[arg(long)]
        count: Option<usize>,
    },
}

/// Prices must be positive decimals.
fn parse_price(raw: &str) -> Result<Decimal, String> {
    parse_amount(raw).map_err(|_| format!("price must be a positive decimal, got {:?}", raw))
}
