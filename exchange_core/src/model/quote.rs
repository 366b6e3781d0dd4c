//! Swap and bridge quotes.
//!
//! A `Quote` is derived on every request and never stored. The `QuoteEngine` owns the
//! static rate and fee tables and resolves them in a fixed order:
//!
//! - rate: exact `(from, to)` entry, then the reciprocal of `(to, from)`, then `1`;
//! - swap fee: exact `(from, to)` entry, then the default fee;
//! - bridge fee: per-asset entry, then the default fee.
//!
//! The fee is charged on the converted (gross) amount, so it is denominated in the
//! destination asset. Amounts are rounded to six fractional digits independent of the
//! asset's native decimals, and `net_amount` is computed from the rounded gross and
//! fee so that `fee_amount + net_amount == gross_amount` holds exactly.
//!
//! Invalid input never fails: a non-numeric or non-positive amount produces
//! [`Quote::zero`], which forms render as "no quote yet".

use std::collections::HashMap;
use std::fmt;

use exchange_common::{ExchangeError, Result};
use log::{debug, warn};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::model::amount::{QUOTE_SCALE, fraction_to_percent, parse_amount, to_exact_scale};

/// Fee fraction applied when no specific entry exists (0.5%).
pub const DEFAULT_FEE: Decimal = Decimal::from_parts(5, 0, 0, false, 3);

/// Ordered asset pair.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PairKey {
    /// Source asset symbol.
    pub from: String,
    /// Destination asset symbol.
    pub to: String,
}

impl PairKey {
    /// Build a pair key from two symbols.
    pub fn new(from: &str, to: &str) -> Self {
        PairKey {
            from: from.to_string(),
            to: to.to_string(),
        }
    }

    /// Parse the on-disk `"{from}-{to}"` form. Both halves must be non-empty.
    pub fn parse(key: &str) -> Result<Self> {
        match key.split_once('-') {
            Some((from, to)) if !from.is_empty() && !to.is_empty() && !to.contains('-') => {
                Ok(PairKey::new(from, to))
            }
            _ => Err(ExchangeError::Config(format!("Malformed pair key: {:?}", key))),
        }
    }

    /// The same pair in the opposite direction.
    pub fn reversed(&self) -> Self {
        PairKey::new(&self.to, &self.from)
    }
}

impl fmt::Display for PairKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.from, self.to)
    }
}

/// Two-level `from -> to -> value` table looked up by `&str` without allocating.
#[derive(Debug, Clone, Default)]
pub struct PairTable<V> {
    entries: HashMap<String, HashMap<String, V>>,
}

impl<V> PairTable<V> {
    /// Create an empty table.
    pub fn new() -> Self {
        PairTable {
            entries: HashMap::new(),
        }
    }

    /// Insert or replace the value for `(from, to)`.
    pub fn insert(&mut self, from: &str, to: &str, value: V) -> Option<V> {
        self.entries
            .entry(from.to_string())
            .or_default()
            .insert(to.to_string(), value)
    }

    /// Value stored for exactly `(from, to)`.
    pub fn get(&self, from: &str, to: &str) -> Option<&V> {
        self.entries.get(from).and_then(|inner| inner.get(to))
    }

    /// Whether `(from, to)` has an entry.
    pub fn contains(&self, from: &str, to: &str) -> bool {
        self.get(from, to).is_some()
    }

    /// Number of stored pairs.
    pub fn len(&self) -> usize {
        self.entries.values().map(HashMap::len).sum()
    }

    /// Whether no pair is stored.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// All entries as `(PairKey, &V)`, sorted by key.
    pub fn entries(&self) -> Vec<(PairKey, &V)> {
        let mut out: Vec<(PairKey, &V)> = self
            .entries
            .iter()
            .flat_map(|(from, inner)| {
                inner
                    .iter()
                    .map(move |(to, value)| (PairKey::new(from, to), value))
            })
            .collect();
        out.sort_by(|a, b| a.0.cmp(&b.0));
        out
    }
}

/// Result of a swap or bridge quote.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Quote {
    /// Input amount converted at `rate`, before fees.
    pub gross_amount: Decimal,
    /// Fee charged, in the destination asset.
    pub fee_amount: Decimal,
    /// Amount received after the fee.
    pub net_amount: Decimal,
    /// Fee as a fraction (`0.003`).
    pub fee_rate: Decimal,
    /// Fee as a percentage (`0.3`).
    pub fee_percentage: Decimal,
    /// Conversion rate applied; `1` for bridges.
    pub rate: Decimal,
}

impl Quote {
    /// Placeholder returned for amounts that are not (yet) valid.
    pub fn zero() -> Self {
        Quote {
            gross_amount: Decimal::ZERO,
            fee_amount: Decimal::ZERO,
            net_amount: Decimal::ZERO,
            fee_rate: Decimal::ZERO,
            fee_percentage: Decimal::ZERO,
            rate: Decimal::ZERO,
        }
    }

    /// Whether this is the zero placeholder.
    pub fn is_zero(&self) -> bool {
        self.gross_amount.is_zero() && self.rate.is_zero()
    }

    fn compute(amount: Decimal, rate: Decimal, fee_rate: Decimal) -> Option<Quote> {
        let gross = amount.checked_mul(rate)?;
        let fee = gross.checked_mul(fee_rate)?;
        let gross_amount = to_exact_scale(gross, QUOTE_SCALE)?;
        let fee_amount = to_exact_scale(fee, QUOTE_SCALE)?;
        let net_amount = gross_amount.checked_sub(fee_amount)?;
        Some(Quote {
            gross_amount,
            fee_amount,
            net_amount,
            fee_rate,
            fee_percentage: fraction_to_percent(fee_rate),
            rate,
        })
    }
}

/// Rate and fee tables plus the quote arithmetic over them.
#[derive(Debug, Clone)]
pub struct QuoteEngine {
    rates: PairTable<Decimal>,
    swap_fees: PairTable<Decimal>,
    bridge_fees: HashMap<String, Decimal>,
    default_fee: Decimal,
}

impl Default for QuoteEngine {
    fn default() -> Self {
        QuoteEngine::new(DEFAULT_FEE)
    }
}

impl QuoteEngine {
    /// Create an engine with empty tables and the given fallback fee fraction.
    pub fn new(default_fee: Decimal) -> Self {
        QuoteEngine {
            rates: PairTable::new(),
            swap_fees: PairTable::new(),
            bridge_fees: HashMap::new(),
            default_fee,
        }
    }

    /// Register a preset rate. Rates must be strictly positive.
    pub fn insert_rate(&mut self, from: &str, to: &str, rate: Decimal) -> Result<()> {
        if rate <= Decimal::ZERO {
            return Err(ExchangeError::Config(format!(
                "Rate for {}-{} must be positive, got {}",
                from, to, rate
            )));
        }
        self.rates.insert(from, to, rate);
        Ok(())
    }

    /// Register a pair-specific swap fee fraction.
    pub fn insert_swap_fee(&mut self, from: &str, to: &str, fee: Decimal) -> Result<()> {
        ensure_fee_fraction(&format!("{}-{}", from, to), fee)?;
        self.swap_fees.insert(from, to, fee);
        Ok(())
    }

    /// Register a per-asset bridge fee fraction.
    pub fn insert_bridge_fee(&mut self, symbol: &str, fee: Decimal) -> Result<()> {
        ensure_fee_fraction(symbol, fee)?;
        self.bridge_fees.insert(symbol.to_string(), fee);
        Ok(())
    }

    /// Fallback fee fraction.
    pub fn default_fee(&self) -> Decimal {
        self.default_fee
    }

    /// Preset rate table.
    pub fn rates(&self) -> &PairTable<Decimal> {
        &self.rates
    }

    /// Resolve the conversion rate from `from` into `to`.
    ///
    /// Unknown pairs resolve to `1`. This silently implies parity between unrelated
    /// assets; callers that care must check [`Self::is_swap_possible`] first.
    pub fn rate(&self, from: &str, to: &str) -> Decimal {
        self.preset_rate(from, to).unwrap_or_else(|e| {
            debug!("{}, defaulting to 1", e);
            Decimal::ONE
        })
    }

    /// Preset rate from `from` into `to`: the direct entry, else the reciprocal of the
    /// reverse entry. `UnsupportedPair` when neither exists.
    pub fn preset_rate(&self, from: &str, to: &str) -> Result<Decimal> {
        if let Some(rate) = self.rates.get(from, to) {
            return Ok(*rate);
        }
        if let Some(reverse) = self.rates.get(to, from) {
            return Ok(Decimal::ONE / *reverse);
        }
        Err(ExchangeError::UnsupportedPair {
            from: from.to_string(),
            to: to.to_string(),
        })
    }

    /// Swap fee fraction for the ordered pair.
    pub fn swap_fee(&self, from: &str, to: &str) -> Decimal {
        self.swap_fees
            .get(from, to)
            .copied()
            .unwrap_or(self.default_fee)
    }

    /// Bridge fee fraction for an asset.
    pub fn bridge_fee(&self, symbol: &str) -> Decimal {
        self.bridge_fees
            .get(symbol)
            .copied()
            .unwrap_or(self.default_fee)
    }

    /// Quote converting `amount` of `from` into `to`.
    pub fn quote_swap(&self, amount: &str, from: &str, to: &str) -> Quote {
        let amount = match parse_amount(amount) {
            Ok(amount) => amount,
            Err(e) => {
                debug!("Swap quote {}->{} skipped: {}", from, to, e);
                return Quote::zero();
            }
        };
        let rate = self.rate(from, to);
        let fee_rate = self.swap_fee(from, to);
        Quote::compute(amount, rate, fee_rate).unwrap_or_else(|| {
            warn!("Swap quote {} {}->{} overflowed", amount, from, to);
            Quote::zero()
        })
    }

    /// Quote for the form layer: refuses same-asset swaps before touching any table.
    pub fn checked_quote_swap(&self, amount: &str, from: &str, to: &str) -> Result<Quote> {
        if from == to {
            return Err(ExchangeError::SameAsset(from.to_string()));
        }
        Ok(self.quote_swap(amount, from, to))
    }

    /// Quote moving `amount` of `symbol` across networks. No conversion is applied.
    pub fn quote_bridge(&self, amount: &str, symbol: &str) -> Quote {
        let amount = match parse_amount(amount) {
            Ok(amount) => amount,
            Err(e) => {
                debug!("Bridge quote for {} skipped: {}", symbol, e);
                return Quote::zero();
            }
        };
        let fee_rate = self.bridge_fee(symbol);
        Quote::compute(amount, Decimal::ONE, fee_rate).unwrap_or_else(|| {
            warn!("Bridge quote {} {} overflowed", amount, symbol);
            Quote::zero()
        })
    }

    /// A swap is possible between distinct assets with a preset rate in either direction.
    pub fn is_swap_possible(&self, from: &str, to: &str) -> bool {
        if from == to {
            return false;
        }
        self.rates.contains(from, to) || self.rates.contains(to, from)
    }

    /// A bridge is possible for assets with a bridge fee entry.
    pub fn is_bridge_possible(&self, symbol: &str) -> bool {
        self.bridge_fees.contains_key(symbol)
    }
}

fn ensure_fee_fraction(key: &str, fee: Decimal) -> Result<()> {
    if fee < Decimal::ZERO || fee >= Decimal::ONE {
        return Err(ExchangeError::Config(format!(
            "Fee for {} must be in [0, 1), got {}",
            key, fee
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn engine() -> QuoteEngine {
        let mut engine = QuoteEngine::default();
        engine.insert_rate("ETH", "USDT", Decimal::new(245050, 2)).unwrap();
        engine.insert_rate("USDT", "USDC", Decimal::ONE).unwrap();
        engine.insert_swap_fee("USDT", "USDC", Decimal::new(3, 3)).unwrap();
        engine.insert_bridge_fee("USDC", Decimal::new(1, 3)).unwrap();
        engine
    }

    #[test]
    fn pair_key_parses_dash_form() {
        let key = PairKey::parse("USDT-USDTz").unwrap();
        assert_eq!(key, PairKey::new("USDT", "USDTz"));
        assert_eq!(key.to_string(), "USDT-USDTz");
        assert_eq!(key.reversed(), PairKey::new("USDTz", "USDT"));
        assert!(PairKey::parse("USDT").is_err());
        assert!(PairKey::parse("-USDT").is_err());
        assert!(PairKey::parse("A-B-C").is_err());
    }

    #[test]
    fn rate_prefers_direct_then_reciprocal_then_one() {
        let engine = engine();
        assert_eq!(engine.rate("ETH", "USDT"), Decimal::new(245050, 2));
        assert_eq!(engine.rate("USDT", "ETH"), Decimal::ONE / Decimal::new(245050, 2));
        assert_eq!(engine.rate("ARB", "OP"), Decimal::ONE);
    }

    #[test]
    fn preset_rate_reports_unsupported_pairs() {
        let engine = engine();
        assert_eq!(engine.preset_rate("USDC", "USDT").unwrap(), Decimal::ONE);
        assert!(matches!(
            engine.preset_rate("ARB", "OP"),
            Err(ExchangeError::UnsupportedPair { from, to }) if from == "ARB" && to == "OP"
        ));
    }

    #[test]
    fn oversized_amounts_yield_zero_quote_never_short_scale() {
        let engine = engine();
        let fits = engine.quote_bridge("1000000000000000000000", "USDC");
        assert_eq!(fits.gross_amount.scale(), QUOTE_SCALE);
        assert_eq!(fits.fee_amount.scale(), QUOTE_SCALE);

        // product fits in a Decimal but not with six fractional digits
        assert!(engine.quote_swap("100000000000000000000", "ETH", "USDT").is_zero());
        // product overflows the multiplication itself
        assert!(engine
            .quote_swap("79228162514264337593543950335", "ETH", "USDT")
            .is_zero());
    }

    #[test]
    fn swap_fee_is_pair_specific_and_directional() {
        let engine = engine();
        assert_eq!(engine.swap_fee("USDT", "USDC"), Decimal::new(3, 3));
        assert_eq!(engine.swap_fee("USDC", "USDT"), DEFAULT_FEE);
    }

    #[test]
    fn swap_quote_charges_fee_in_destination_asset() {
        let quote = engine().quote_swap("2", "ETH", "USDT");
        assert_eq!(quote.gross_amount.to_string(), "4901.000000");
        assert_eq!(quote.fee_amount.to_string(), "24.505000");
        assert_eq!(quote.net_amount.to_string(), "4876.495000");
        assert_eq!(quote.fee_percentage.to_string(), "0.5");
    }

    #[test]
    fn invalid_amount_yields_zero_quote() {
        let engine = engine();
        for raw in ["", "abc", "0", "-3"] {
            let quote = engine.quote_swap(raw, "ETH", "USDT");
            assert!(quote.is_zero());
            assert_eq!(quote.net_amount.to_string(), "0");
            assert!(engine.quote_bridge(raw, "ETH").is_zero());
        }
    }

    #[test]
    fn bridge_uses_asset_fee_without_conversion() {
        let quote = engine().quote_bridge("1000", "USDC");
        assert_eq!(quote.rate, Decimal::ONE);
        assert_eq!(quote.fee_amount.to_string(), "1.000000");
        assert_eq!(quote.net_amount.to_string(), "999.000000");
    }

    #[test]
    fn rejects_bad_table_entries() {
        let mut engine = QuoteEngine::default();
        assert!(engine.insert_rate("A", "B", Decimal::ZERO).is_err());
        assert!(engine.insert_rate("A", "B", Decimal::NEGATIVE_ONE).is_err());
        assert!(engine.insert_swap_fee("A", "B", Decimal::ONE).is_err());
        assert!(engine.insert_bridge_fee("A", Decimal::new(-1, 3)).is_err());
    }

    #[test]
    fn same_asset_is_never_quoted_by_checked_path() {
        let engine = engine();
        assert!(!engine.is_swap_possible("ETH", "ETH"));
        assert!(matches!(
            engine.checked_quote_swap("1", "ETH", "ETH"),
            Err(ExchangeError::SameAsset(_))
        ));
    }

    #[test]
    fn pair_table_lists_sorted_entries() {
        let engine = engine();
        let keys: Vec<String> = engine
            .rates()
            .entries()
            .into_iter()
            .map(|(key, _)| key.to_string())
            .collect();
        assert_eq!(keys, vec!["ETH-USDT", "USDT-USDC"]);
        assert_eq!(engine.rates().len(), 2);
    }
}
