//! Stablecoin peg health and collateral checks.
//!
//! `PegMonitor` grades an observed market price against the 1 USD peg and keeps a
//! capped history of reports. `PegStabilizer` prices mint and redeem operations so that
//! arbitrage pulls the market back toward the peg. The collateral helpers are pure.

use std::collections::VecDeque;

use chrono::{SecondsFormat, Utc};
use log::{info, warn};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use strum_macros::Display;

/// Reports kept by a `PegMonitor`.
pub const DEFAULT_HISTORY_CAPACITY: usize = 1000;
/// Default page size for `PegMonitor::history`.
pub const DEFAULT_HISTORY_LIMIT: usize = 100;
/// Collateral ratio assumed when nothing has been minted yet (percent).
pub const EMPTY_SUPPLY_RATIO: Decimal = Decimal::from_parts(110, 0, 0, false, 0);
/// Minimum healthy collateral ratio (percent).
pub const MIN_HEALTHY_RATIO: Decimal = Decimal::ONE_HUNDRED;

/// Deviation fraction above which the peg is critical (0.1%).
const CRITICAL_DEVIATION: Decimal = Decimal::from_parts(1, 0, 0, false, 3);
/// Deviation fraction above which the peg needs watching (0.01%).
const WARNING_DEVIATION: Decimal = Decimal::from_parts(1, 0, 0, false, 4);

/// Severity of a peg report.
#[allow(missing_docs)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "UPPERCASE")]
pub enum PegStatus {
    Healthy,
    Warning,
    Critical,
}

/// One peg observation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PegHealthReport {
    /// UTC timestamp in milliseconds since Unix epoch.
    pub timestamp: u64,
    /// Observed market price in USD.
    pub price: Decimal,
    /// Peg target in USD.
    pub expected_price: Decimal,
    /// Absolute deviation from the peg, in percent.
    pub deviation: Decimal,
    /// False only for critical deviations.
    pub is_healthy: bool,
    /// Severity grade.
    pub status: PegStatus,
    /// Operator guidance.
    pub recommendation: String,
}

/// Supply and collateral totals across chains.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollateralMetrics {
    /// Circulating supply.
    pub total_supply: Decimal,
    /// Collateral backing the supply, in USD.
    pub total_collateral: Decimal,
    /// `collateral × 100 / supply`.
    pub collateral_ratio: Decimal,
    /// Problems found while building the metrics.
    pub alerts: Vec<String>,
}

impl CollateralMetrics {
    /// Compute the ratio and alerts for the given totals.
    pub fn new(total_supply: Decimal, total_collateral: Decimal) -> Self {
        let collateral_ratio = collateral_ratio(total_collateral, total_supply);
        let mut alerts = Vec::new();
        if !is_collateral_healthy(collateral_ratio) {
            alerts.push(format!(
                "Collateral ratio {}% is below {}%",
                collateral_ratio.round_dp(2),
                MIN_HEALTHY_RATIO
            ));
        }
        CollateralMetrics {
            total_supply,
            total_collateral,
            collateral_ratio,
            alerts,
        }
    }

    /// Whether the collateral ratio meets the minimum.
    pub fn is_healthy(&self) -> bool {
        is_collateral_healthy(self.collateral_ratio)
    }
}

/// Collateral ratio in percent. Returns [`EMPTY_SUPPLY_RATIO`] when `supply` is zero.
///
/// Ratios past the `Decimal` range saturate at `Decimal::MAX` (or `MIN` for opposite signs).
pub fn collateral_ratio(collateral: Decimal, supply: Decimal) -> Decimal {
    if supply.is_zero() {
        return EMPTY_SUPPLY_RATIO;
    }
    collateral
        .checked_mul(Decimal::ONE_HUNDRED)
        .and_then(|scaled| scaled.checked_div(supply))
        .or_else(|| {
            collateral
                .checked_div(supply)
                .and_then(|ratio| ratio.checked_mul(Decimal::ONE_HUNDRED))
        })
        .unwrap_or(if collateral.is_sign_negative() == supply.is_sign_negative() {
            Decimal::MAX
        } else {
            Decimal::MIN
        })
}

/// A ratio of at least 100% is healthy.
pub fn is_collateral_healthy(ratio: Decimal) -> bool {
    ratio >= MIN_HEALTHY_RATIO
}

/// Absolute deviation of `actual` from `expected`, in percent.
///
/// `None` when `expected` is zero or the deviation does not fit in a `Decimal`.
pub fn price_deviation(actual: Decimal, expected: Decimal) -> Option<Decimal> {
    actual
        .checked_sub(expected)?
        .abs()
        .checked_div(expected)?
        .checked_mul(Decimal::ONE_HUNDRED)
}

/// Whether `price` is within `max_deviation` percent of 1 USD.
pub fn is_peg_within_range(price: Decimal, max_deviation: Decimal) -> bool {
    price_deviation(price, Decimal::ONE).is_some_and(|deviation| deviation <= max_deviation)
}

/// Grades peg observations and keeps their history.
#[derive(Debug, Clone)]
pub struct PegMonitor {
    expected_price: Decimal,
    history: VecDeque<PegHealthReport>,
    capacity: usize,
}

impl Default for PegMonitor {
    fn default() -> Self {
        PegMonitor::new(Decimal::ONE, DEFAULT_HISTORY_CAPACITY)
    }
}

impl PegMonitor {
    /// Monitor for a peg at `expected_price` (must be positive) keeping `capacity` reports.
    pub fn new(expected_price: Decimal, capacity: usize) -> Self {
        PegMonitor {
            expected_price,
            history: VecDeque::new(),
            capacity: capacity.max(1),
        }
    }

    /// Grade `price` against the peg and record the report.
    pub fn check_peg_health(&mut self, price: Decimal) -> PegHealthReport {
        let fraction = price
            .saturating_sub(self.expected_price)
            .abs()
            .checked_div(self.expected_price)
            .unwrap_or(Decimal::MAX);
        let (status, recommendation) = if fraction > CRITICAL_DEVIATION {
            (
                PegStatus::Critical,
                "CRITICAL: Peg deviation > 0.1%. Activate circuit breaker.",
            )
        } else if fraction > WARNING_DEVIATION {
            (
                PegStatus::Warning,
                "WARNING: Peg deviation > 0.01%. Monitor closely.",
            )
        } else {
            (PegStatus::Healthy, "Peg is healthy. No action required.")
        };

        let report = PegHealthReport {
            timestamp: Utc::now().timestamp_millis() as u64,
            price,
            expected_price: self.expected_price,
            deviation: fraction.saturating_mul(Decimal::ONE_HUNDRED),
            is_healthy: status != PegStatus::Critical,
            status,
            recommendation: recommendation.to_string(),
        };
        match status {
            PegStatus::Critical => warn!("Peg critical at ${}: {}", price, report.recommendation),
            PegStatus::Warning => info!("Peg drifting at ${}", price),
            PegStatus::Healthy => {}
        }

        self.history.push_back(report.clone());
        if self.history.len() > self.capacity {
            self.history.pop_front();
        }
        report
    }

    /// The most recent `limit` reports, oldest first.
    pub fn history(&self, limit: usize) -> Vec<PegHealthReport> {
        let skip = self.history.len().saturating_sub(limit);
        self.history.iter().skip(skip).cloned().collect()
    }

    /// Plain-text report combining collateral metrics and a peg observation.
    pub fn health_report(&self, metrics: &CollateralMetrics, peg: &PegHealthReport) -> String {
        let collateral_status = if metrics.is_healthy() {
            PegStatus::Healthy
        } else {
            PegStatus::Critical
        };
        let alerts = if metrics.alerts.is_empty() {
            "No alerts".to_string()
        } else {
            metrics.alerts.join("\n")
        };
        format!(
            "=== USDTz Health Report ===\n\
             Timestamp: {}\n\
             \n\
             --- Collateral Status ---\n\
             Total Supply: {}\n\
             Total Collateral: {}\n\
             Collateral Ratio: {}%\n\
             Status: {}\n\
             \n\
             --- Peg Status ---\n\
             Current Price: ${}\n\
             Expected Price: ${}\n\
             Deviation: {:.4}%\n\
             Health: {}\n\
             \n\
             --- Recommendations ---\n\
             {}\n\
             \n\
             --- Alerts ---\n\
             {}\n",
            Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
            metrics.total_supply,
            metrics.total_collateral,
            metrics.collateral_ratio.round_dp(2),
            collateral_status,
            peg.price,
            peg.expected_price,
            peg.deviation,
            if peg.is_healthy { "HEALTHY" } else { "UNHEALTHY" },
            peg.recommendation,
            alerts,
        )
    }
}

/// Mint/redeem pricing around the peg.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PegStabilizer {
    /// Peg target in USD.
    pub peg_price: Decimal,
    /// Tolerated absolute distance from the peg before market pricing kicks in.
    pub band: Decimal,
}

impl Default for PegStabilizer {
    fn default() -> Self {
        PegStabilizer {
            peg_price: Decimal::ONE,
            band: WARNING_DEVIATION,
        }
    }
}

impl PegStabilizer {
    /// Above the band, minting costs the market price; otherwise the peg.
    pub fn mint_price(&self, market_price: Decimal) -> Decimal {
        if market_price > self.peg_price.saturating_add(self.band) {
            market_price
        } else {
            self.peg_price
        }
    }

    /// Below the band, redemption pays the market price; otherwise the peg.
    pub fn redeem_price(&self, market_price: Decimal) -> Decimal {
        if market_price < self.peg_price.saturating_sub(self.band) {
            market_price
        } else {
            self.peg_price
        }
    }

    /// Whether the relative distance from the peg exceeds the band.
    ///
    /// A distance too large to represent always counts as an opportunity.
    pub fn has_arbitrage_opportunity(&self, market_price: Decimal) -> bool {
        match market_price.checked_sub(self.peg_price) {
            Some(distance) => distance
                .abs()
                .checked_div(self.peg_price)
                .is_some_and(|fraction| fraction > self.band),
            None => true,
        }
    }
}
