//! Exchange configuration artifact.
//!
//! The asset table, preset rates and fee schedules are static data. They are loaded
//! from a JSON file at startup or taken from the built-in tables below. Pair keys are
//! written as `"{from}-{to}"` on disk and parsed into `PairKey`s when the engine is
//! built, so a malformed key fails loading instead of silently never matching.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use exchange_common::{ExchangeError, Network, Result};
use log::{info, warn};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::model::asset::Asset;
use crate::model::fees::FeeCalculator;
use crate::model::ledger::{DEFAULT_CAPACITY, TransactionLedger};
use crate::model::quote::{DEFAULT_FEE, PairKey, QuoteEngine};
use crate::registry::Registry;

fn default_fee() -> Decimal {
    DEFAULT_FEE
}

fn default_ledger_capacity() -> usize {
    DEFAULT_CAPACITY
}

/// Everything needed to build a `Registry`, a `QuoteEngine` and a `TransactionLedger`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExchangeConfig {
    /// Asset table in listing order.
    pub assets: Vec<Asset>,
    /// Symbols offered by the swap selector.
    #[serde(default)]
    pub swap_assets: Vec<String>,
    /// Symbols offered by the bridge selector.
    #[serde(default)]
    pub bridge_assets: Vec<String>,
    /// Preset rates keyed by `"{from}-{to}"`.
    #[serde(default)]
    pub rates: BTreeMap<String, Decimal>,
    /// Pair-specific swap fee fractions keyed by `"{from}-{to}"`.
    #[serde(default)]
    pub swap_fees: BTreeMap<String, Decimal>,
    /// Per-asset bridge fee fractions.
    #[serde(default)]
    pub bridge_fees: BTreeMap<String, Decimal>,
    /// Fallback fee fraction.
    #[serde(default = "default_fee")]
    pub default_fee: Decimal,
    /// Deposit/withdraw fee window.
    #[serde(default)]
    pub deposit: FeeCalculator,
    /// Entries kept by the transaction ledger.
    #[serde(default = "default_ledger_capacity")]
    pub ledger_capacity: usize,
}

impl Default for ExchangeConfig {
    fn default() -> Self {
        ExchangeConfig::builtin()
    }
}

impl ExchangeConfig {
    /// Read a JSON config from `reader`.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        let config: ExchangeConfig = serde_json::from_reader(reader)?;
        Ok(config)
    }

    /// Read a JSON config file.
    pub fn load(path: &Path) -> Result<Self> {
        let file = File::open(path)?;
        let config = Self::from_reader(BufReader::new(file))?;
        info!(
            "Loaded {} assets and {} rates from {}",
            config.assets.len(),
            config.rates.len(),
            path.display()
        );
        Ok(config)
    }

    /// Load `path` when given, otherwise the built-in tables.
    pub fn load_or_builtin(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Self::builtin()),
        }
    }

    /// Build the asset registry.
    pub fn registry(&self) -> Result<Registry> {
        Registry::new(self.assets.clone(), &self.swap_assets, &self.bridge_assets)
    }

    /// Build the quote engine, validating every key and value.
    pub fn quote_engine(&self) -> Result<QuoteEngine> {
        if self.default_fee < Decimal::ZERO || self.default_fee >= Decimal::ONE {
            return Err(ExchangeError::Config(format!(
                "Default fee must be in [0, 1), got {}",
                self.default_fee
            )));
        }
        let known: Vec<&str> = self.assets.iter().map(|a| a.symbol.as_str()).collect();
        let mut engine = QuoteEngine::new(self.default_fee);

        for (raw, rate) in &self.rates {
            let key = PairKey::parse(raw)?;
            if !known.contains(&key.from.as_str()) || !known.contains(&key.to.as_str()) {
                warn!("Rate {} references an unlisted asset", key);
            }
            engine.insert_rate(&key.from, &key.to, *rate)?;
        }
        for (raw, fee) in &self.swap_fees {
            let key = PairKey::parse(raw)?;
            engine.insert_swap_fee(&key.from, &key.to, *fee)?;
        }
        for (symbol, fee) in &self.bridge_fees {
            engine.insert_bridge_fee(symbol, *fee)?;
        }
        Ok(engine)
    }

    /// Build an empty ledger with the configured capacity.
    pub fn ledger(&self) -> TransactionLedger {
        TransactionLedger::new(self.ledger_capacity)
    }

    /// Fee calculator for deposits and withdrawals, after checking its settings.
    pub fn fee_calculator(&self) -> Result<FeeCalculator> {
        self.deposit.validate()?;
        Ok(self.deposit.clone())
    }

    /// The built-in asset, rate and fee tables.
    pub fn builtin() -> Self {
        let usd = |units: i64, scale: u32| Decimal::new(units, scale);
        let eth = usd(245050, 2);
        let btc = usd(4250000, 2);
        let bnb = usd(61275, 2);
        let pol = usd(85, 2);

        let mut rates = BTreeMap::new();
        for quote in ["USDT", "USDC", "USDTz"] {
            rates.insert(format!("ETH-{}", quote), eth);
            rates.insert(format!("BTC-{}", quote), btc);
            rates.insert(format!("BNB-{}", quote), bnb);
            rates.insert(format!("POL-{}", quote), pol);
        }
        for pair in [
            "USDT-USDC",
            "USDT-USDTz",
            "USDC-USDTz",
            "USDC-USDT",
            "USDTz-USDT",
            "USDTz-USDC",
        ] {
            rates.insert(pair.to_string(), Decimal::ONE);
        }
        rates.insert("USDTz-ETH".to_string(), Decimal::ONE / eth);
        rates.insert("USDTz-BTC".to_string(), Decimal::ONE / btc);
        rates.insert("USDTz-BNB".to_string(), Decimal::ONE / bnb);
        rates.insert("USDTz-POL".to_string(), Decimal::ONE / pol);

        let mut swap_fees = BTreeMap::new();
        for pair in [
            "ETH-USDT", "ETH-USDC", "ETH-USDTz", "BTC-USDT", "BTC-USDC", "BTC-USDTz",
        ] {
            swap_fees.insert(pair.to_string(), DEFAULT_FEE);
        }
        for pair in ["USDT-USDC", "USDT-USDTz", "USDC-USDTz"] {
            swap_fees.insert(pair.to_string(), usd(3, 3));
        }

        let assets = builtin_assets();
        let bridge_assets: Vec<String> = assets.iter().map(|a| a.symbol.clone()).collect();
        let bridge_fees = bridge_assets
            .iter()
            .map(|symbol| (symbol.clone(), DEFAULT_FEE))
            .collect();
        let swap_assets = ["ETH", "USDT", "USDC", "USDTz", "BTC", "BNB"]
            .iter()
            .map(|s| s.to_string())
            .collect();

        ExchangeConfig {
            assets,
            swap_assets,
            bridge_assets,
            rates,
            swap_fees,
            bridge_fees,
            default_fee: DEFAULT_FEE,
            deposit: FeeCalculator::default(),
            ledger_capacity: DEFAULT_CAPACITY,
        }
    }
}

fn builtin_assets() -> Vec<Asset> {
    use Network::*;
    vec![
        Asset::new("ETH", "Ethereum", 18, "⟠")
            .with_contract(Ethereum, "0xC02aaA39b223FE8D0A0e5C4F27eAD9083C756Cc2")
            .with_contract(Bsc, "0x2170Ed0880ac9A755fd29B2688956BD959e9F5a6")
            .with_contract(Polygon, "0x7ceB23fD6bC0adD59E62ac25578270cFf1b9f619")
            .with_contract(Arbitrum, "0x82aF49447d8a07e3bd95bd0d56f313302c4dF82e")
            .with_contract(Optimism, "0x4200000000000000000000000000000000000006")
            .with_contract(Base, "0x4200000000000000000000000000000000000006")
            .with_contract(Avalanche, "0x49D5c2BdFfAe6377B375eFb50c3108529C10DB93"),
        Asset::new("USDT", "Tether", 6, "💵")
            .with_contract(Ethereum, "0xdAC17F958D2ee523a2206206994597C13D831ec7")
            .with_contract(Bsc, "0x55d398326f99059fF775485246999027B3197955")
            .with_contract(Polygon, "0xc2132D05D31c914a87C6611C10748AEb04B58e8F")
            .with_contract(Arbitrum, "0xFd086bC7CD5C481DCC9C85ebE478A1C0b69FCbb9")
            .with_contract(Optimism, "0x94b008aA00579c1307B0EF2c499aD98a8ce58e58")
            .with_contract(Base, "0xfde4C96c8593536E31F26E3DAfF3f3D5879e4a7F")
            .with_contract(Avalanche, "0x9702230A8657203E2F72603d013f2585a9cbbA08"),
        Asset::new("USDC", "USD Coin", 6, "🪙")
            .with_contract(Ethereum, "0xA0b86991c6218b36c1d19D4a2e9Eb0cE3606eB48")
            .with_contract(Bsc, "0x8AC76a51cc950d9822D68b83FE1Ad97B32Cd580d")
            .with_contract(Polygon, "0x2791Bca1f2de4661ED88A30C99A7a9449Aa84174")
            .with_contract(Arbitrum, "0xFF970A61A04b1cA14834A43f5dE4533eBDDB5F86")
            .with_contract(Optimism, "0x7F5c764cBc14f9669B88837ca1490cCa17c31607")
            .with_contract(Base, "0x833589fCD6eDb6E08f4c7C32D4f71b1566469c3d")
            .with_contract(Avalanche, "0xB97EF9Ef8734C71904D8002F8b6Bc66Dd9c48a6E"),
        Asset::new("USDTz", "USDTz Hybrid", 6, "/USDTz-token-inline.png")
            .with_display_icon("/USDTz-token.png")
            .with_contract(Ethereum, "0xB537A89b71F34985433d3A3E17A0824F1e30FD17")
            .with_contract(Bsc, "0xB537A89b71F34985433d3A3E17A0824F1e30FD17")
            .with_contract(Polygon, "0xB537A89b71F34985433d3A3E17A0824F1e30FD17")
            .with_contract(Arbitrum, "0xB537A89b71F34985433d3A3E17A0824F1e30FD17")
            .with_contract(Optimism, "0xB537A89b71F34985433d3A3E17A0824F1e30FD17")
            .with_contract(Base, "0xB537A89b71F34985433d3A3E17A0824F1e30FD17")
            .with_contract(Avalanche, "0xB537A89b71F34985433d3A3E17A0824F1e30FD17"),
        Asset::new("BTC", "Bitcoin", 8, "🟠")
            .with_contract(Ethereum, "0x2260FAC5E5542a773Aa44fBCfeDd66d50A1699b5")
            .with_contract(Bsc, "0x7130d2A12B9BCbFdd356A9Bb94a8eCF15c88424e")
            .with_contract(Polygon, "0x1bfd67037b42cf73acF2047067bd4303c2640802")
            .with_contract(Arbitrum, "0x2f2a2540f7e7a7a4b3b3b3b3b3b3b3b3b3b3b3b3")
            .with_contract(Optimism, "0x68f180fcCe6836688e9084f035309E29Bf00A150")
            .with_contract(Base, "0xcbB7C0000aB88B473b1f5aFd9369C663dd60Efbb")
            .with_contract(Avalanche, "0x152b9d0FdC40C096757F570A51E494bd4b943E50"),
        Asset::new("BNB", "Binance Coin", 18, "🟡")
            .with_contract(Ethereum, "0xB8c77482e45F1F44dE1745F52C74426C631bDD52")
            .with_contract(Bsc, "0xbb4CdB9CBd36B01bD1cBaEBF2De08d9173bc095c")
            .with_contract(Polygon, "0x3BA4c387f786d093c86f5FD8577ab92e5418b312")
            .with_contract(Arbitrum, "0x20865e63b751cc2e4e0c4c9ff3c1b8babdacb6c7")
            .with_contract(Optimism, "0x9e5aac409d7e6ba8fd63ad8ef9ad7beda81db854")
            .with_contract(Base, "0x4200000000000000000000000000000000000007")
            .with_contract(Avalanche, "0x264c1383ea520f852c2ca02e8d3d11b2e76e0bdc"),
        Asset::new("POL", "Polygon", 18, "🟣")
            .with_contract(Ethereum, "0x455e53CBB86018Ac2B8092FdCd39B507cc2469C3")
            .with_contract(Bsc, "0xCC42724C6683B7E57334c4E856f4c9965ED682bD")
            .with_contract(Polygon, "0x0000000000000000000000000000000000001010")
            .with_contract(Arbitrum, "0x3d9907645020c4e328b81a27ebc724ecc1ad8e4c")
            .with_contract(Optimism, "0x7c6b91d9be155d5cc12cda6cdc852652f447f00f")
            .with_contract(Base, "0x7c6b91d9be155d5cc12cda6cdc852652f447f00f")
            .with_contract(Avalanche, "0x60781c2d6b3172d93eef251c4b6d4ee15faf27f3"),
        Asset::new("ARB", "Arbitrum", 18, "🔵")
            .with_contract(Ethereum, "0xB50721BCF8d664c30412Cfbc6cf7a15145234ad1")
            .with_contract(Bsc, "0xEf1c6E67703c7BD7107eed8303Fbe6EC2554BF6B")
            .with_contract(Polygon, "0x1c4a937346d187753ccc9c32c149927a3a7f1338")
            .with_contract(Arbitrum, "0x912CE59144191c1204E64559FE8253a0e108FF3e")
            .with_contract(Optimism, "0x850c4b4c289e938e7e38ee5e5806a263879628d7")
            .with_contract(Base, "0x850c4b4c289e938e7e38ee5e5806a263879628d7")
            .with_contract(Avalanche, "0x1c4a937346d187753ccc9c32c149927a3a7f1338"),
        Asset::new("OP", "Optimism", 18, "🔴")
            .with_contract(Ethereum, "0x4200000000000000000000000000000000000042")
            .with_contract(Bsc, "0x7c6b91d9be155d5cc12cda6cdc852652f447f00f")
            .with_contract(Polygon, "0x7c6b91d9be155d5cc12cda6cdc852652f447f00f")
            .with_contract(Arbitrum, "0x7c6b91d9be155d5cc12cda6cdc852652f447f00f")
            .with_contract(Optimism, "0x4200000000000000000000000000000000000042")
            .with_contract(Base, "0x4200000000000000000000000000000000000042")
            .with_contract(Avalanche, "0x7c6b91d9be155d5cc12cda6cdc852652f447f00f"),
        Asset::new("AVAX", "Avalanche", 18, "🔺")
            .with_contract(Ethereum, "0x85f138bfEE4ef8e540890CFb48F620571d67Eda3")
            .with_contract(Bsc, "0x1CE0c2827e2eF14D5C4f29a091d735aA938BC08D")
            .with_contract(Polygon, "0x2C48857Ab7C04A8D9E860Ea1581b7a76c3ecda09")
            .with_contract(Arbitrum, "0x565609674eB3e6E6299E9c2B753e6328eD3e45A1")
            .with_contract(Optimism, "0x7c6b91d9be155d5cc12cda6cdc852652f447f00f")
            .with_contract(Base, "0x7c6b91d9be155d5cc12cda6cdc852652f447f00f")
            .with_contract(Avalanche, "0xB31f66AA3C1e785363F0875A1B74789c1116BC7B"),
    ]
}
