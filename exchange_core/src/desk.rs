//! Deposit and withdraw processing.
//!
//! `TransferDesk` validates a request against the registry, checks the sender's
//! balance through a `ChainGateway`, hands the transfer to the gateway and records the
//! confirmed result in the ledger. Failures never escape as errors: every path ends in
//! a `TransferOutcome` the caller can render.

use exchange_common::{ExchangeError, Network, Result};
use log::{error, info, warn};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::gateway::{ChainGateway, TransferRequest};
use crate::model::amount::parse_amount;
use crate::model::fees::FeeCalculator;
use crate::model::ledger::{Transaction, TransactionKind, TransactionLedger};
use crate::registry::Registry;

/// User deposit into the exchange contract.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DepositRequest {
    /// Asset symbol.
    pub asset: String,
    /// Amount as entered.
    pub amount: String,
    /// Network name (`ethereum`, `bsc`, ...).
    pub network: String,
    /// Depositing account.
    pub user_address: String,
}

/// User withdrawal out of the exchange contract.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WithdrawRequest {
    /// Asset symbol.
    pub asset: String,
    /// Amount as entered.
    pub amount: String,
    /// Network name.
    pub network: String,
    /// Requesting account.
    pub user_address: String,
    /// Receiving account.
    pub destination: String,
}

/// Result of a deposit or withdrawal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferOutcome {
    /// Whether the transfer was broadcast and recorded.
    pub success: bool,
    /// Transaction hash, empty on failure.
    pub tx_hash: String,
    /// Message for the user.
    pub message: String,
}

impl TransferOutcome {
    fn failed(message: impl Into<String>) -> Self {
        TransferOutcome {
            success: false,
            tx_hash: String::new(),
            message: message.into(),
        }
    }
}

struct Validated {
    network: Network,
    amount: Decimal,
}

/// Routes deposits and withdrawals through a gateway into the ledger.
pub struct TransferDesk<'a, G: ChainGateway> {
    registry: &'a Registry,
    ledger: &'a mut TransactionLedger,
    gateway: G,
    fees: FeeCalculator,
}

impl<'a, G: ChainGateway> TransferDesk<'a, G> {
    /// Desk over an explicit registry, ledger and gateway, with the default fee settings.
    pub fn new(registry: &'a Registry, ledger: &'a mut TransactionLedger, gateway: G) -> Self {
        TransferDesk {
            registry,
            ledger,
            gateway,
            fees: FeeCalculator::default(),
        }
    }

    /// Use `fees` for the withdrawal minimum.
    pub fn with_fee_calculator(mut self, fees: FeeCalculator) -> Self {
        self.fees = fees;
        self
    }

    /// The underlying gateway.
    pub fn gateway(&self) -> &G {
        &self.gateway
    }

    /// The ledger transfers are recorded in.
    pub fn ledger(&self) -> &TransactionLedger {
        &*self.ledger
    }

    /// Process a deposit of `request.amount` from the user into the asset contract.
    pub fn process_deposit(&mut self, request: &DepositRequest) -> TransferOutcome {
        let valid = match self.validate(
            &request.asset,
            &request.amount,
            &request.network,
            &request.user_address,
        ) {
            Ok(valid) => valid,
            Err(e) => {
                warn!("Rejected deposit: {}", e);
                return TransferOutcome::failed("Invalid deposit request");
            }
        };
        let contract = match self.contract(&request.asset, valid.network) {
            Ok(contract) => contract,
            Err(e) => return TransferOutcome::failed(e.to_string()),
        };
        match self
            .gateway
            .balance(&request.asset, valid.network, &request.user_address)
        {
            Ok(balance) if valid.amount > balance => {
                warn!(
                    "Deposit of {} {} exceeds source balance {}",
                    valid.amount, request.asset, balance
                );
                return TransferOutcome::failed("Insufficient balance at source address");
            }
            Ok(_) => {}
            Err(e) => {
                error!("Balance lookup for {} failed: {}", request.user_address, e);
                return TransferOutcome::failed(format!("Deposit failed: {}", e));
            }
        }

        let transfer = TransferRequest {
            asset: request.asset.clone(),
            contract: contract.clone(),
            amount: valid.amount,
            from: request.user_address.clone(),
            destination: contract,
            network: valid.network,
        };
        match self.gateway.transfer(&transfer) {
            Ok(hash) => {
                self.ledger.record(Transaction::confirmed(
                    TransactionKind::Deposit,
                    &request.asset,
                    &request.amount,
                    valid.network,
                    &hash,
                ));
                info!(
                    "Deposit {} {} on {} confirmed: {}",
                    request.amount, request.asset, valid.network, hash
                );
                TransferOutcome {
                    success: true,
                    tx_hash: hash,
                    message: format!(
                        "Successfully deposited {} {} on {}",
                        request.amount, request.asset, request.network
                    ),
                }
            }
            Err(e) => {
                error!("Deposit of {} {} failed: {}", request.amount, request.asset, e);
                TransferOutcome::failed(format!("Deposit failed: {}", e))
            }
        }
    }

    /// Process a withdrawal of `request.amount` from the user's account to `destination`.
    ///
    /// The user's balance must cover the amount and the amount must meet the withdrawal
    /// minimum of the desk's `FeeCalculator`.
    pub fn process_withdraw(&mut self, request: &WithdrawRequest) -> TransferOutcome {
        let validated = self
            .validate(
                &request.asset,
                &request.amount,
                &request.network,
                &request.user_address,
            )
            .and_then(|valid| match request.destination.trim() {
                "" => Err(ExchangeError::InvalidAddress(request.destination.clone())),
                _ => Ok(valid),
            });
        let valid = match validated {
            Ok(valid) => valid,
            Err(e) => {
                warn!("Rejected withdrawal: {}", e);
                return TransferOutcome::failed("Invalid withdrawal request");
            }
        };
        let contract = match self.contract(&request.asset, valid.network) {
            Ok(contract) => contract,
            Err(e) => return TransferOutcome::failed(e.to_string()),
        };
        let balance = match self
            .gateway
            .balance(&request.asset, valid.network, &request.user_address)
        {
            Ok(balance) => balance,
            Err(e) => {
                error!("Balance lookup for {} failed: {}", request.user_address, e);
                return TransferOutcome::failed(format!("Withdrawal failed: {}", e));
            }
        };
        let check = self.fees.validate_withdrawal_amount(&request.amount, balance);
        if !check.valid {
            let message = check.error.unwrap_or_else(|| "Invalid withdrawal request".to_string());
            warn!("Rejected withdrawal of {} {}: {}", request.amount, request.asset, message);
            return TransferOutcome::failed(message);
        }

        let transfer = TransferRequest {
            asset: request.asset.clone(),
            contract,
            amount: valid.amount,
            from: request.user_address.clone(),
            destination: request.destination.clone(),
            network: valid.network,
        };
        match self.gateway.transfer(&transfer) {
            Ok(hash) => {
                self.ledger.record(Transaction::confirmed(
                    TransactionKind::Withdraw,
                    &request.asset,
                    &request.amount,
                    valid.network,
                    &hash,
                ));
                info!(
                    "Withdrawal {} {} on {} confirmed: {}",
                    request.amount, request.asset, valid.network, hash
                );
                TransferOutcome {
                    success: true,
                    tx_hash: hash,
                    message: format!(
                        "Successfully withdrew {} {} on {}",
                        request.amount, request.asset, request.network
                    ),
                }
            }
            Err(e) => {
                error!("Withdrawal of {} {} failed: {}", request.amount, request.asset, e);
                TransferOutcome::failed(format!("Withdrawal failed: {}", e))
            }
        }
    }

    fn validate(&self, asset: &str, amount: &str, network: &str, user: &str) -> Result<Validated> {
        if !self.registry.contains(asset) {
            return Err(ExchangeError::UnknownAsset(asset.to_string()));
        }
        if user.trim().is_empty() {
            return Err(ExchangeError::InvalidAddress(user.to_string()));
        }
        let network = Network::parse(network)?;
        let amount = parse_amount(amount)?;
        Ok(Validated { network, amount })
    }

    fn contract(&self, asset: &str, network: Network) -> Result<String> {
        self.registry
            .contract_address(asset, network)
            .map(str::to_string)
            .ok_or_else(|| ExchangeError::UnsupportedOnNetwork {
                asset: asset.to_string(),
                network: network.to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::MockChainGateway;
    use crate::model::asset::Asset;
    use crate::model::ledger::TransactionStatus;

    const USER: &str = "0x1111111111111111111111111111111111111111";
    const DEST: &str = "0x2222222222222222222222222222222222222222";
    const USDT_ETH: &str = "0xdAC17F958D2ee523a2206206994597C13D831ec7";

    fn registry() -> Registry {
        let assets = vec![
            Asset::new("USDT", "Tether USD", 6, "💵").with_contract(Network::Ethereum, USDT_ETH),
            Asset::new("OP", "Optimism", 18, "🔴"),
        ];
        Registry::new(assets, &[], &[]).unwrap()
    }

    fn funded(amount: i64) -> MockChainGateway {
        let mut gateway = MockChainGateway::new();
        gateway.set_balance("USDT", Network::Ethereum, USER, Decimal::from(amount));
        gateway
    }

    fn deposit(asset: &str, amount: &str, network: &str) -> DepositRequest {
        DepositRequest {
            asset: asset.to_string(),
            amount: amount.to_string(),
            network: network.to_string(),
            user_address: USER.to_string(),
        }
    }

    fn withdraw(amount: &str) -> WithdrawRequest {
        WithdrawRequest {
            asset: "USDT".to_string(),
            amount: amount.to_string(),
            network: "ethereum".to_string(),
            user_address: USER.to_string(),
            destination: DEST.to_string(),
        }
    }

    #[test]
    fn deposit_is_recorded_as_confirmed() {
        let registry = registry();
        let mut ledger = TransactionLedger::default();
        let mut desk = TransferDesk::new(&registry, &mut ledger, funded(100));

        let outcome = desk.process_deposit(&deposit("USDT", "25", "ethereum"));
        assert!(outcome.success);
        assert_eq!(outcome.message, "Successfully deposited 25 USDT on ethereum");
        assert_eq!(desk.gateway().transfer_count(), 1);
        let gateway = desk.gateway();
        let held = |address: &str| gateway.balance("USDT", Network::Ethereum, address).unwrap();
        assert_eq!(held(USER), Decimal::from(75));
        assert_eq!(held(USDT_ETH), Decimal::from(25));

        let tx = desk.ledger().find(&outcome.tx_hash).unwrap();
        assert_eq!(tx.kind, TransactionKind::Deposit);
        assert_eq!(tx.status, TransactionStatus::Confirmed);
        assert_eq!(tx.amount, "25");
    }

    #[test]
    fn deposit_needs_source_balance() {
        let registry = registry();
        let mut ledger = TransactionLedger::default();
        let mut desk = TransferDesk::new(&registry, &mut ledger, funded(20));

        let outcome = desk.process_deposit(&deposit("USDT", "25", "ethereum"));
        assert!(!outcome.success);
        assert_eq!(outcome.message, "Insufficient balance at source address");
        assert_eq!(desk.gateway().transfer_count(), 0);

        let outcome = desk.process_deposit(&DepositRequest {
            user_address: "alice".to_string(),
            ..deposit("USDT", "5", "ethereum")
        });
        assert_eq!(outcome.message, "Deposit failed: Invalid address: alice");
        assert!(desk.ledger().is_empty());
    }

    #[test]
    fn invalid_deposits_are_rejected_before_the_gateway() {
        let registry = registry();
        let mut ledger = TransactionLedger::default();
        let mut desk = TransferDesk::new(&registry, &mut ledger, funded(100));

        for request in [
            deposit("DOGE", "25", "ethereum"),
            deposit("USDT", "0", "ethereum"),
            deposit("USDT", "25", "solana"),
            DepositRequest {
                user_address: " ".to_string(),
                ..deposit("USDT", "25", "ethereum")
            },
        ] {
            let outcome = desk.process_deposit(&request);
            assert!(!outcome.success);
            assert_eq!(outcome.message, "Invalid deposit request");
            assert!(outcome.tx_hash.is_empty());
        }

        let outcome = desk.process_deposit(&deposit("OP", "25", "optimism"));
        assert_eq!(outcome.message, "OP not supported on optimism");
        assert_eq!(desk.gateway().transfer_count(), 0);
        assert!(desk.ledger().is_empty());
    }

    #[test]
    fn validation_names_the_failing_field() {
        let registry = registry();
        let mut ledger = TransactionLedger::default();
        let desk = TransferDesk::new(&registry, &mut ledger, MockChainGateway::new());

        assert!(matches!(
            desk.validate("DOGE", "1", "ethereum", USER),
            Err(ExchangeError::UnknownAsset(symbol)) if symbol == "DOGE"
        ));
        assert!(matches!(
            desk.validate("USDT", "1", "ethereum", "  "),
            Err(ExchangeError::InvalidAddress(_))
        ));
        assert!(matches!(
            desk.validate("USDT", "1", "solana", USER),
            Err(ExchangeError::UnknownNetwork(name)) if name == "solana"
        ));
        assert!(matches!(
            desk.validate("USDT", "-1", "ethereum", USER),
            Err(ExchangeError::InvalidAmount(_))
        ));
        let valid = desk.validate("USDT", "1.5", "Ethereum", USER).unwrap();
        assert_eq!((valid.network, valid.amount), (Network::Ethereum, Decimal::new(15, 1)));
    }

    #[test]
    fn withdraw_requires_destination_and_reports_gateway_errors() {
        let registry = registry();
        let mut ledger = TransactionLedger::default();
        let mut gateway = funded(100);
        gateway.fail_transfers("nonce too low");
        let mut desk = TransferDesk::new(&registry, &mut ledger, gateway);

        let mut request = WithdrawRequest {
            destination: String::new(),
            ..withdraw("10")
        };
        assert_eq!(desk.process_withdraw(&request).message, "Invalid withdrawal request");

        request.destination = DEST.to_string();
        let outcome = desk.process_withdraw(&request);
        assert!(!outcome.success);
        assert_eq!(outcome.message, "Withdrawal failed: Gateway error: nonce too low");
        assert!(desk.ledger().is_empty());
    }

    #[test]
    fn withdraw_checks_balance_then_minimum() {
        let registry = registry();
        let mut ledger = TransactionLedger::default();
        let mut desk = TransferDesk::new(&registry, &mut ledger, funded(5));

        assert_eq!(desk.process_withdraw(&withdraw("10")).message, "Insufficient balance");
        assert_eq!(desk.process_withdraw(&withdraw("0.5")).message, "Minimum withdrawal is $1");
        let outcome = desk.process_withdraw(&WithdrawRequest {
            user_address: "alice".to_string(),
            ..withdraw("2")
        });
        assert_eq!(outcome.message, "Withdrawal failed: Invalid address: alice");
        assert_eq!(desk.gateway().transfer_count(), 0);

        let fees = FeeCalculator {
            min_withdrawal: Decimal::from(3),
            ..FeeCalculator::default()
        };
        let mut desk = desk.with_fee_calculator(fees);
        assert_eq!(desk.process_withdraw(&withdraw("2")).message, "Minimum withdrawal is $3");
        assert!(desk.process_withdraw(&withdraw("5")).success);
        assert_eq!(
            desk.gateway().balance("USDT", Network::Ethereum, USER).unwrap(),
            Decimal::ZERO
        );
    }

    #[test]
    fn withdraw_success() {
        let registry = registry();
        let mut ledger = TransactionLedger::default();
        {
            let mut desk = TransferDesk::new(&registry, &mut ledger, funded(50));
            let outcome = desk.process_withdraw(&WithdrawRequest {
                network: "Ethereum".to_string(),
                ..withdraw("10.5")
            });
            assert!(outcome.success, "{}", outcome.message);
            assert_eq!(outcome.message, "Successfully withdrew 10.5 USDT on Ethereum");
            let gateway = desk.gateway();
            assert_eq!(
                gateway.balance("USDT", Network::Ethereum, USER).unwrap(),
                Decimal::new(395, 1)
            );
            assert_eq!(
                gateway.balance("USDT", Network::Ethereum, DEST).unwrap(),
                Decimal::new(105, 1)
            );
        }
        assert_eq!(ledger.history(50)[0].kind, TransactionKind::Withdraw);
    }
}
