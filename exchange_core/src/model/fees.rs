//! Deposit and withdraw fee split.
//!
//! Deposits and withdrawals are charged a flat percentage on a USD-denominated amount.
//! Amounts outside the `[min, max]` window are rejected, never clamped.

use exchange_common::address::is_evm_address;
use exchange_common::{ExchangeError, Network, Result};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::model::amount::{
    QUOTE_SCALE, USD_SCALE, fraction_to_percent, parse_amount, to_exact_scale,
};

/// Outcome of a form validation, rendered inline by the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Validation {
    /// Whether the input is acceptable.
    pub valid: bool,
    /// Message for the user when `valid` is false.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl Validation {
    /// Accepting result.
    pub fn ok() -> Self {
        Validation {
            valid: true,
            error: None,
        }
    }

    /// Rejecting result with a message.
    pub fn invalid(message: impl Into<String>) -> Self {
        Validation {
            valid: false,
            error: Some(message.into()),
        }
    }
}

impl<T> From<Result<T>> for Validation {
    fn from(result: Result<T>) -> Self {
        match result {
            Ok(_) => Validation::ok(),
            Err(ExchangeError::InvalidAmount(_)) => Validation::invalid("Amount must be greater than 0"),
            Err(e) => Validation::invalid(e.to_string()),
        }
    }
}

/// Deposit fee breakdown at two fractional digits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeeStructure {
    /// Requested amount.
    pub amount: Decimal,
    /// Fee charged.
    pub fee: Decimal,
    /// Fee as a percentage (`0.5`).
    pub fee_percentage: Decimal,
    /// Amount credited after the fee.
    pub net: Decimal,
    /// Requested amount in USD at the peg.
    pub amount_usd: Decimal,
    /// Credited amount in USD at the peg.
    pub net_usd: Decimal,
}

/// Single fee figure with its percentage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeeQuote {
    /// Fee amount at six fractional digits.
    pub amount: Decimal,
    /// Fee as a percentage.
    pub percentage: Decimal,
}

/// Flat-rate deposit/withdraw fee calculator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeeCalculator {
    /// Fee fraction (`0.005`).
    pub fee_rate: Decimal,
    /// Smallest accepted deposit in USD.
    pub min_amount: Decimal,
    /// Largest accepted deposit in USD.
    pub max_amount: Decimal,
    /// Smallest accepted withdrawal in USD.
    pub min_withdrawal: Decimal,
    /// USD value of one unit of the deposited stablecoin.
    pub usd_peg: Decimal,
}

impl Default for FeeCalculator {
    fn default() -> Self {
        FeeCalculator {
            fee_rate: Decimal::new(5, 3),
            min_amount: Decimal::from(10),
            max_amount: Decimal::from(1_000_000),
            min_withdrawal: Decimal::ONE,
            usd_peg: Decimal::ONE,
        }
    }
}

impl FeeCalculator {
    /// Check the settings: fee in `[0, 1)`, `0 < min_amount <= max_amount`,
    /// non-negative withdrawal minimum and a positive USD peg.
    pub fn validate(&self) -> Result<()> {
        if self.fee_rate < Decimal::ZERO || self.fee_rate >= Decimal::ONE {
            return Err(ExchangeError::Config(format!(
                "Deposit fee must be in [0, 1), got {}",
                self.fee_rate
            )));
        }
        if self.min_amount <= Decimal::ZERO || self.min_amount > self.max_amount {
            return Err(ExchangeError::Config(format!(
                "Deposit window [{}, {}] is empty or not positive",
                self.min_amount, self.max_amount
            )));
        }
        if self.min_withdrawal < Decimal::ZERO {
            return Err(ExchangeError::Config(format!(
                "Minimum withdrawal must not be negative, got {}",
                self.min_withdrawal
            )));
        }
        if self.usd_peg <= Decimal::ZERO {
            return Err(ExchangeError::Config(format!(
                "USD peg must be positive, got {}",
                self.usd_peg
            )));
        }
        Ok(())
    }

    /// Parse `raw` and check it against the deposit window.
    pub fn validate_amount(&self, raw: &str) -> Result<Decimal> {
        let amount = parse_amount(raw)?;
        if amount < self.min_amount {
            return Err(ExchangeError::OutOfRange {
                message: format!("Minimum deposit is ${}", format_usd(self.min_amount)),
                amount,
                min: self.min_amount,
                max: self.max_amount,
            });
        }
        if amount > self.max_amount {
            return Err(ExchangeError::OutOfRange {
                message: format!("Maximum deposit is ${}", format_usd(self.max_amount)),
                amount,
                min: self.min_amount,
                max: self.max_amount,
            });
        }
        Ok(amount)
    }

    /// Fee breakdown for a deposit of `raw` USD.
    ///
    /// Fee and net are both taken from the unrounded amount and rounded on their own,
    /// so `amount` is display-only and may differ from `fee + net` by a cent.
    pub fn fee_structure(&self, raw: &str) -> Result<FeeStructure> {
        let amount = self.validate_amount(raw)?;
        let overflow = || ExchangeError::Overflow(format!("fee structure for {}", raw));
        let usd = |value: Option<Decimal>| {
            value
                .and_then(|v| to_exact_scale(v, USD_SCALE))
                .ok_or_else(overflow)
        };

        let fee_raw = amount.checked_mul(self.fee_rate).ok_or_else(overflow)?;
        let net_raw = amount.checked_sub(fee_raw).ok_or_else(overflow)?;
        let net = usd(Some(net_raw))?;
        Ok(FeeStructure {
            amount: usd(Some(amount))?,
            fee: usd(Some(fee_raw))?,
            fee_percentage: fraction_to_percent(self.fee_rate),
            net,
            amount_usd: usd(amount.checked_mul(self.usd_peg))?,
            net_usd: usd(net.checked_mul(self.usd_peg))?,
        })
    }

    /// Fee charged on a deposit of `raw`.
    pub fn deposit_fee(&self, raw: &str) -> Result<FeeQuote> {
        self.flat_fee(raw)
    }

    /// Fee charged on a withdrawal of `raw`.
    pub fn withdraw_fee(&self, raw: &str) -> Result<FeeQuote> {
        self.flat_fee(raw)
    }

    fn flat_fee(&self, raw: &str) -> Result<FeeQuote> {
        let amount = parse_amount(raw)?;
        let fee = amount
            .checked_mul(self.fee_rate)
            .and_then(|fee| to_exact_scale(fee, QUOTE_SCALE))
            .ok_or_else(|| ExchangeError::Overflow(format!("fee for {}", raw)))?;
        Ok(FeeQuote {
            amount: fee,
            percentage: fraction_to_percent(self.fee_rate),
        })
    }

    /// `raw × (1 − percentage / 100)` at six fractional digits.
    pub fn net_amount(&self, raw: &str, percentage: Decimal) -> Result<Decimal> {
        let amount = parse_amount(raw)?;
        percentage
            .checked_div(Decimal::ONE_HUNDRED)
            .and_then(|fraction| Decimal::ONE.checked_sub(fraction))
            .and_then(|keep| amount.checked_mul(keep))
            .and_then(|net| to_exact_scale(net, QUOTE_SCALE))
            .ok_or_else(|| ExchangeError::Overflow(format!("net of {} at {}%", raw, percentage)))
    }

    /// Check a stablecoin deposit form: amount window, recipient address, network.
    pub fn validate_deposit_params(&self, amount: &str, recipient: &str, network: &str) -> Validation {
        let amount_check = Validation::from(self.validate_amount(amount));
        if !amount_check.valid {
            return amount_check;
        }
        if !is_evm_address(recipient) {
            return Validation::invalid("Invalid recipient address");
        }
        if Network::parse(network).is_err() {
            return Validation::invalid("Invalid network");
        }
        Validation::ok()
    }

    /// Check a withdrawal of `amount` against the available `balance` and the minimum.
    pub fn validate_withdrawal_amount(&self, amount: &str, balance: Decimal) -> Validation {
        let amount = match parse_amount(amount) {
            Ok(amount) => amount,
            Err(e) => return Validation::from(Err::<(), _>(e)),
        };
        if amount > balance {
            return Validation::invalid("Insufficient balance");
        }
        if amount < self.min_withdrawal {
            return Validation::invalid(format!(
                "Minimum withdrawal is ${}",
                format_usd(self.min_withdrawal)
            ));
        }
        Validation::ok()
    }
}

/// `1000000` -> `1,000,000`; fractional digits are dropped when zero.
fn format_usd(value: Decimal) -> String {
    let normalized = value.normalize().to_string();
    let (int_part, frac_part) = match normalized.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (normalized.as_str(), None),
    };
    let mut grouped = String::new();
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    match frac_part {
        Some(f) => format!("{}.{}", grouped, f),
        None => grouped,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const RECIPIENT: &str = "0xB537A89b71F34985433d3A3E17A0824F1e30FD17";

    #[test]
    fn minimum_boundary_is_inclusive() {
        let calc = FeeCalculator::default();
        assert!(calc.fee_structure("9.99").is_err());
        let fees = calc.fee_structure("10").unwrap();
        assert_eq!(fees.amount.to_string(), "10.00");
        assert_eq!(fees.fee.to_string(), "0.05");
        assert_eq!(fees.net.to_string(), "9.95");
        assert_eq!(fees.fee_percentage.to_string(), "0.5");
        assert_eq!(fees.net_usd.to_string(), "9.95");
    }

    #[test]
    fn maximum_boundary_is_inclusive() {
        let calc = FeeCalculator::default();
        assert!(calc.fee_structure("1000000").is_ok());
        match calc.fee_structure("1000000.01") {
            Err(ExchangeError::OutOfRange { message, .. }) => {
                assert_eq!(message, "Maximum deposit is $1,000,000")
            }
            other => panic!("expected OutOfRange, got {:?}", other),
        }
    }

    #[test]
    fn deposit_and_withdraw_fee_are_half_percent() {
        let calc = FeeCalculator::default();
        let fee = calc.deposit_fee("250").unwrap();
        assert_eq!(fee.amount.to_string(), "1.250000");
        assert_eq!(fee.percentage.to_string(), "0.5");
        assert_eq!(calc.withdraw_fee("250").unwrap(), fee);
        assert_eq!(
            calc.net_amount("250", Decimal::new(5, 1)).unwrap().to_string(),
            "248.750000"
        );
    }

    #[test]
    fn validation_reports_first_problem() {
        let calc = FeeCalculator::default();
        assert_eq!(
            calc.validate_deposit_params("abc", RECIPIENT, "ethereum"),
            Validation::invalid("Amount must be greater than 0")
        );
        assert_eq!(
            calc.validate_deposit_params("5", RECIPIENT, "ethereum"),
            Validation::invalid("Minimum deposit is $10")
        );
        assert_eq!(
            calc.validate_deposit_params("50", "0x123", "ethereum"),
            Validation::invalid("Invalid recipient address")
        );
        assert_eq!(
            calc.validate_deposit_params("50", RECIPIENT, "solana"),
            Validation::invalid("Invalid network")
        );
        assert_eq!(calc.validate_deposit_params("50", RECIPIENT, "base"), Validation::ok());
    }

    #[test]
    fn net_is_taken_from_the_unrounded_amount() {
        let fees = FeeCalculator::default().fee_structure("10.005").unwrap();
        assert_eq!(fees.amount.to_string(), "10.01");
        assert_eq!(fees.fee.to_string(), "0.05");
        assert_eq!(fees.net.to_string(), "9.95");
        assert_eq!(fees.net_usd.to_string(), "9.95");
    }

    #[test]
    fn settings_are_checked() {
        assert!(FeeCalculator::default().validate().is_ok());
        let broken = [
            FeeCalculator { fee_rate: Decimal::new(15, 1), ..FeeCalculator::default() },
            FeeCalculator { fee_rate: Decimal::NEGATIVE_ONE, ..FeeCalculator::default() },
            FeeCalculator { min_amount: Decimal::ZERO, ..FeeCalculator::default() },
            FeeCalculator { max_amount: Decimal::ONE, ..FeeCalculator::default() },
            FeeCalculator { min_withdrawal: Decimal::NEGATIVE_ONE, ..FeeCalculator::default() },
            FeeCalculator { usd_peg: Decimal::ZERO, ..FeeCalculator::default() },
        ];
        for calc in broken {
            assert!(matches!(calc.validate(), Err(ExchangeError::Config(_))), "{calc:?}");
        }
    }

    #[test]
    fn huge_amounts_overflow_into_errors() {
        let calc = FeeCalculator {
            fee_rate: Decimal::new(9, 1),
            max_amount: Decimal::MAX,
            usd_peg: Decimal::from(2),
            ..FeeCalculator::default()
        };
        assert!(matches!(calc.fee_structure("5e28"), Err(ExchangeError::Overflow(_))));
        assert!(matches!(calc.deposit_fee("5e28"), Err(ExchangeError::Overflow(_))));
        assert!(matches!(
            calc.net_amount("5e28", Decimal::new(5, 1)),
            Err(ExchangeError::Overflow(_))
        ));
    }

    #[test]
    fn withdrawal_checks_balance_then_minimum() {
        let calc = FeeCalculator::default();
        let balance = Decimal::from(50);
        assert_eq!(
            calc.validate_withdrawal_amount("0", balance),
            Validation::invalid("Amount must be greater than 0")
        );
        assert_eq!(
            calc.validate_withdrawal_amount("50.01", balance),
            Validation::invalid("Insufficient balance")
        );
        assert_eq!(
            calc.validate_withdrawal_amount("0.5", balance),
            Validation::invalid("Minimum withdrawal is $1")
        );
        assert_eq!(calc.validate_withdrawal_amount("1", balance), Validation::ok());
        assert_eq!(calc.validate_withdrawal_amount("50", balance), Validation::ok());
    }

    #[test]
    fn validation_serializes_without_error_when_valid() {
        let json = serde_json::to_string(&Validation::ok()).unwrap();
        assert_eq!(json, r#"{"valid":true}"#);
    }

    #[test]
    fn usd_grouping() {
        assert_eq!(format_usd(Decimal::from(10)), "10");
        assert_eq!(format_usd(Decimal::from(1_000_000)), "1,000,000");
        assert_eq!(format_usd(Decimal::new(123456789, 2)), "1,234,567.89");
    }
}
