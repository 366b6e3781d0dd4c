//! Domain models and calculators.
//!
//! - `amount` — decimal parsing and fixed-scale formatting helpers.
//! - `asset` — `Asset` registry entries.
//! - `quote` — `Quote` results and the `QuoteEngine` rate/fee resolution.
//! - `fees` — deposit/withdraw fee split and deposit parameter validation.
//! - `ledger` — capped in-memory transaction history.
//! - `peg` — peg health checks, collateral ratio and stabilization pricing.
pub mod amount;
pub mod asset;
pub mod fees;
pub mod ledger;
pub mod peg;
pub mod quote;
