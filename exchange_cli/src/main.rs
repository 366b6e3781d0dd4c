//! Exchange CLI — quotes swaps and bridges, prices deposit fees, runs deposits and
//! withdrawals through the in-memory chain gateway and grades the stablecoin peg.
//!
//! Usage example (CLI):
//! ```bash
//! exchange_cli swap --amount 1 --from USDT --to USDTz
//! exchange_cli --config ./exchange.json bridge --amount 100 --token ETH
//! exchange_cli withdraw --asset USDTz --amount 25 --network base \
//!     --address 0x... --destination 0x...
//! exchange_cli watch --price 1.0002 --interval-ms 500
//! ```
//!
//! Every command prints its result as JSON on stdout; logs go to stderr and follow
//! `RUST_LOG`.
#![warn(missing_docs)]
mod args;
mod render;

use crate::args::{Args, Command};
use crate::render::{
    AssetView, BridgeView, FeesView, NetworkView, PegView, SwapView, TransferView, print_json,
};
use clap::Parser;
use crossbeam_channel::{bounded, select};
use exchange_common::{ExchangeError, Network, Result};
use exchange_core::desk::{DepositRequest, WithdrawRequest};
use exchange_core::model::peg::{CollateralMetrics, PegMonitor};
use exchange_core::peg_watcher::{PegEvent, PegWatcher, simulated_feed};
use exchange_core::{ExchangeConfig, MockChainGateway, TransferDesk};
use log::{error, info, warn};
use rust_decimal::Decimal;
use std::io;
use std::path::PathBuf;
use std::time::Duration;

fn main() {
    init_logger();
    let args = Args::parse();
    if let Err(e) = run(args) {
        error!("{}", e);
        std::process::exit(1);
    }
}

fn run(args: Args) -> Result<()> {
    let config_path = args.config.as_deref().map(normalize_path);
    let config = ExchangeConfig::load_or_builtin(config_path.as_deref())?;

    match args.command {
        Command::Assets => {
            let registry = config.registry()?;
            print_json(&AssetView::all(&registry))
        }
        Command::Networks => {
            let networks: Vec<NetworkView> =
                Network::all().into_iter().map(NetworkView::from).collect();
            print_json(&networks)
        }
        Command::Swap { amount, from, to } => {
            let engine = config.quote_engine()?;
            let quote = engine.checked_quote_swap(&amount, &from, &to)?;
            let preset_rate = engine.is_swap_possible(&from, &to);
            if !preset_rate {
                warn!("No preset rate for {}-{}, quoting at parity", from, to);
            }
            print_json(&SwapView {
                from,
                to,
                amount,
                preset_rate,
                quote,
            })
        }
        Command::Bridge { amount, token } => {
            let registry = config.registry()?;
            let engine = config.quote_engine()?;
            if !registry.contains(&token) {
                return Err(ExchangeError::UnknownAsset(token));
            }
            print_json(&BridgeView {
                quote: engine.quote_bridge(&amount, &token),
                networks: registry.available_networks(&token),
                token,
                amount,
            })
        }
        Command::Fees { amount } => {
            let fees = config.fee_calculator()?;
            print_json(&FeesView {
                structure: fees.fee_structure(&amount)?,
                deposit_fee: fees.deposit_fee(&amount)?,
                withdraw_fee: fees.withdraw_fee(&amount)?,
            })
        }
        Command::Deposit {
            asset,
            amount,
            network,
            address,
            balance,
        } => {
            let registry = config.registry()?;
            let mut ledger = config.ledger();
            let gateway = funded_gateway(&asset, network, &address, balance);
            let mut desk = TransferDesk::new(&registry, &mut ledger, gateway)
                .with_fee_calculator(config.fee_calculator()?);
            let outcome = desk.process_deposit(&DepositRequest {
                asset,
                amount,
                network: network.to_string(),
                user_address: address.clone(),
            });
            print_json(&TransferView::new(outcome, network, &address))
        }
        Command::Withdraw {
            asset,
            amount,
            network,
            address,
            destination,
            balance,
        } => {
            let registry = config.registry()?;
            let mut ledger = config.ledger();
            let gateway = funded_gateway(&asset, network, &address, balance);
            let mut desk = TransferDesk::new(&registry, &mut ledger, gateway)
                .with_fee_calculator(config.fee_calculator()?);
            let outcome = desk.process_withdraw(&WithdrawRequest {
                asset,
                amount,
                network: network.to_string(),
                user_address: address,
                destination: destination.clone(),
            });
            print_json(&TransferView::new(outcome, network, &destination))
        }
        Command::Peg {
            price,
            supply,
            collateral,
        } => {
            let mut monitor = PegMonitor::default();
            let report = monitor.check_peg_health(price);
            let health_report = match (supply, collateral) {
                (Some(supply), Some(collateral)) => {
                    let metrics = CollateralMetrics::new(supply, collateral);
                    Some(monitor.health_report(&metrics, &report))
                }
                _ => None,
            };
            print_json(&PegView::new(report, health_report))
        }
        Command::Watch {
            price,
            interval_ms,
            count,
        } => watch(price, Duration::from_millis(interval_ms), count),
    }
}

/// Mock gateway where `address` holds `balance` of `asset` on `network`.
fn funded_gateway(
    asset: &str,
    network: Network,
    address: &str,
    balance: Decimal,
) -> MockChainGateway {
    let mut gateway = MockChainGateway::new();
    gateway.set_balance(asset, network, address, balance);
    gateway
}

/// Print peg reports from a simulated feed until Ctrl+C or `count` reports.
fn watch(price: Decimal, interval: Duration, count: Option<usize>) -> Result<()> {
    let (interrupt_tx, interrupt_rx) = bounded::<()>(1);
    ctrlc::set_handler(move || {
        info!("Ctrl+C received. Stopping peg watcher...");
        let _ = interrupt_tx.try_send(());
    })
    .map_err(|e| ExchangeError::Io(io::Error::other(e.to_string())))?;

    let watcher = PegWatcher::start(PegMonitor::default(), interval, simulated_feed(price));
    let events = watcher.subscribe()?;
    info!("Watching peg from ${}. Press Ctrl+C to exit.", price);

    let mut seen = 0usize;
    loop {
        select! {
            recv(interrupt_rx) -> _ => break,
            recv(events) -> msg => match msg {
                Ok(PegEvent::Report(report)) => {
                    println!("{}", serde_json::to_string(&report)?);
                    seen += 1;
                    if count.is_some_and(|limit| seen >= limit) {
                        break;
                    }
                }
                Ok(PegEvent::Shutdown) | Err(_) => break,
            }
        }
    }

    let monitor = watcher.stop()?;
    info!("Peg watcher recorded {} reports", monitor.history(usize::MAX).len());
    Ok(())
}

fn init_logger() {
    env_logger::Builder::new()
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .init();
}

/// Normalize a CLI-provided path string by trimming whitespace and matching quotes.
fn normalize_path(raw: &str) -> PathBuf {
    let trimmed = raw.trim();
    let no_quotes = trimmed
        .strip_prefix('"')
        .and_then(|s| s.strip_suffix('"'))
        .unwrap_or(trimmed);
    PathBuf::from(no_quotes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_wrapping_quotes() {
        assert_eq!(normalize_path("  \"./exchange.json\" "), PathBuf::from("./exchange.json"));
        assert_eq!(normalize_path("conf.json"), PathBuf::from("conf.json"));
    }

    #[test]
    fn funded_gateway_holds_the_seeded_balance() {
        use exchange_core::ChainGateway;
        let address = "0x1111111111111111111111111111111111111111";
        let gateway = funded_gateway("USDTz", Network::Polygon, address, Decimal::from(40));
        assert_eq!(gateway.balance("USDTz", Network::Polygon, address).unwrap(), Decimal::from(40));
        assert_eq!(gateway.balance("USDTz", Network::Base, address).unwrap(), Decimal::ZERO);
    }
}
