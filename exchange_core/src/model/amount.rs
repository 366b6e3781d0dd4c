//! Decimal parsing and fixed-scale formatting.
//!
//! Every amount, rate and fee in the crate is a `rust_decimal::Decimal`. User input
//! arrives as text from forms; results leave as decimals rescaled to a fixed number
//! of fractional digits so that `Display` yields e.g. `"0.997000"`.
use std::str::FromStr;

use exchange_common::{ExchangeError, Result};
use rust_decimal::{Decimal, RoundingStrategy};

/// Fractional digits for swap and bridge quote amounts.
pub const QUOTE_SCALE: u32 = 6;
/// Fractional digits for USD-denominated fee structures.
pub const USD_SCALE: u32 = 2;

/// Parse a user-supplied amount. Accepts plain and scientific notation.
///
/// Returns `InvalidAmount` for empty, non-numeric, zero or negative input.
pub fn parse_amount(raw: &str) -> Result<Decimal> {
    let trimmed = raw.trim();
    let value = Decimal::from_str(trimmed)
        .or_else(|_| Decimal::from_scientific(trimmed))
        .map_err(|_| ExchangeError::InvalidAmount(raw.to_string()))?;
    if value <= Decimal::ZERO {
        return Err(ExchangeError::InvalidAmount(raw.to_string()));
    }
    Ok(value)
}

/// Round half away from zero to `scale` digits and pad with trailing zeros.
pub fn to_scale(value: Decimal, scale: u32) -> Decimal {
    let mut rounded = value.round_dp_with_strategy(scale, RoundingStrategy::MidpointAwayFromZero);
    rounded.rescale(scale);
    rounded
}

/// Like [`to_scale`], but `None` when `value` is too large to carry `scale` digits.
///
/// `Decimal` holds at most 28 significant digits; past that `rescale` quietly keeps
/// fewer fractional digits than asked for.
pub fn to_exact_scale(value: Decimal, scale: u32) -> Option<Decimal> {
    let scaled = to_scale(value, scale);
    (scaled.scale() == scale).then_some(scaled)
}

/// Convert a fee fraction (`0.005`) into a percentage (`0.5`).
pub fn fraction_to_percent(fraction: Decimal) -> Decimal {
    (fraction * Decimal::ONE_HUNDRED).normalize()
}
