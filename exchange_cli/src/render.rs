//! JSON views printed by the CLI.
use exchange_common::{Network, Result};
use exchange_core::Registry;
use exchange_core::desk::TransferOutcome;
use exchange_core::model::fees::{FeeQuote, FeeStructure};
use exchange_core::model::peg::{PegHealthReport, PegStabilizer};
use exchange_core::model::quote::Quote;
use rust_decimal::Decimal;
use serde::Serialize;

/// One registry entry with its routing flags.
#[derive(Debug, Serialize)]
pub struct AssetView {
    pub display: String,
    pub symbol: String,
    pub name: String,
    pub decimals: u8,
    pub icon: String,
    pub icon_is_image: bool,
    pub display_icon: String,
    pub networks: Vec<Network>,
    pub swappable: bool,
    pub bridgeable: bool,
}

impl AssetView {
    pub fn all(registry: &Registry) -> Vec<AssetView> {
        registry
            .list_assets()
            .iter()
            .map(|asset| {
                let symbol = asset.symbol.as_str();
                AssetView {
                    display: registry.format_display(symbol),
                    symbol: asset.symbol.clone(),
                    name: asset.name.clone(),
                    decimals: asset.decimals,
                    icon: asset.icon.clone(),
                    icon_is_image: Registry::is_image_icon(&asset.icon),
                    display_icon: registry.display_icon(symbol).to_string(),
                    networks: registry.available_networks(symbol),
                    swappable: registry.swap_assets().iter().any(|s| s == symbol),
                    bridgeable: registry.bridge_assets().iter().any(|s| s == symbol),
                }
            })
            .collect()
    }
}

#[derive(Debug, Serialize)]
pub struct NetworkView {
    pub network: Network,
    pub name: &'static str,
    pub chain_id: u64,
    pub rpc_url: &'static str,
}

impl From<Network> for NetworkView {
    fn from(network: Network) -> Self {
        NetworkView {
            network,
            name: network.display_name(),
            chain_id: network.chain_id(),
            rpc_url: network.rpc_url(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct SwapView {
    pub from: String,
    pub to: String,
    pub amount: String,
    /// False when no preset rate exists and the quote fell back to parity.
    pub preset_rate: bool,
    pub quote: Quote,
}

#[derive(Debug, Serialize)]
pub struct BridgeView {
    pub token: String,
    pub amount: String,
    pub networks: Vec<Network>,
    pub quote: Quote,
}

#[derive(Debug, Serialize)]
pub struct FeesView {
    pub structure: FeeStructure,
    pub deposit_fee: FeeQuote,
    pub withdraw_fee: FeeQuote,
}

#[derive(Debug, Serialize)]
pub struct PegView {
    pub report: PegHealthReport,
    pub mint_price: Decimal,
    pub redeem_price: Decimal,
    pub arbitrage: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub health_report: Option<String>,
}

impl PegView {
    pub fn new(report: PegHealthReport, health_report: Option<String>) -> Self {
        let stabilizer = PegStabilizer::default();
        PegView {
            mint_price: stabilizer.mint_price(report.price),
            redeem_price: stabilizer.redeem_price(report.price),
            arbitrage: stabilizer.has_arbitrage_opportunity(report.price),
            report,
            health_report,
        }
    }
}

/// Deposit or withdrawal result with a block explorer link to the receiving account.
#[derive(Debug, Serialize)]
pub struct TransferView {
    #[serde(flatten)]
    pub outcome: TransferOutcome,
    pub network: Network,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub explorer_url: Option<String>,
}

impl TransferView {
    pub fn new(outcome: TransferOutcome, network: Network, account: &str) -> Self {
        let explorer_url = outcome.success.then(|| network.explorer_url(account));
        TransferView {
            outcome,
            network,
            explorer_url,
        }
    }
}

/// Pretty-print `value` as JSON on stdout.
pub fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use exchange_core::ExchangeConfig;

    #[test]
    fn asset_views_follow_listing_order() {
        let registry = ExchangeConfig::builtin().registry().unwrap();
        let views = AssetView::all(&registry);
        assert_eq!(views.len(), registry.list_assets().len());
        assert_eq!(views[0].display, "⟠ ETH");

        let usdtz = views.iter().find(|v| v.symbol == "USDTz").unwrap();
        assert!(usdtz.icon_is_image);
        assert_eq!(usdtz.display_icon, "/USDTz-token.png");
        assert!(usdtz.swappable && usdtz.bridgeable);

        let arb = views.iter().find(|v| v.symbol == "ARB").unwrap();
        assert!(!arb.swappable);
    }

    #[test]
    fn peg_view_prices_around_the_band() {
        let view = PegView::new(
            exchange_core::model::peg::PegMonitor::default().check_peg_health(Decimal::new(102, 2)),
            None,
        );
        assert_eq!(view.mint_price, Decimal::new(102, 2));
        assert_eq!(view.redeem_price, Decimal::ONE);
        assert!(view.arbitrage);
        let json = serde_json::to_value(&view).unwrap();
        assert!(json.get("health_report").is_none());
    }

    #[test]
    fn transfer_view_links_only_successful_transfers() {
        let account = "0x2222222222222222222222222222222222222222";
        let ok = TransferOutcome {
            success: true,
            tx_hash: format!("0x{}", "ab".repeat(32)),
            message: "Successfully withdrew 5 USDTz on base".to_string(),
        };
        let json = serde_json::to_value(TransferView::new(ok, Network::Base, account)).unwrap();
        assert_eq!(json["success"], true);
        assert_eq!(json["network"], "base");
        assert_eq!(
            json["explorer_url"],
            "https://basescan.org/address/0x2222222222222222222222222222222222222222"
        );

        let failed = TransferOutcome {
            success: false,
            tx_hash: String::new(),
            message: "Insufficient balance".to_string(),
        };
        let json = serde_json::to_value(TransferView::new(failed, Network::Base, account)).unwrap();
        assert!(json.get("explorer_url").is_none());
        assert_eq!(json["message"], "Insufficient balance");
    }
}
