use std::time::Duration;

use chain_api::PriceSource;
use chain_btc::transaction::MAX_FEE_RATE_SAT_VBYTE;
use chain_btc::BtcNetwork;
use clap::Parser;

use crate::error::LabError;
use crate::lab::LabSettings;
use crate::types::SegwitStyle;

/// Command-line and environment configuration.
#[derive(Debug, Clone, Parser)]
#[command(name = "bitcoin-lab")]
#[command(about = "Interactive Bitcoin laboratory: wallets, balances, fees and simulated transactions", long_about = None)]
pub struct LabConfig {
    /// mainnet, testnet, signet or regtest
    #[arg(long, env = "BITCOIN_LAB_NETWORK", default_value = "mainnet")]
    pub network: BtcNetwork,

    /// Esplora REST base URL (defaults to a public server for the network)
    #[arg(long, env = "BITCOIN_LAB_ESPLORA_URL")]
    pub esplora_url: Option<String>,

    /// coingecko or coindesk
    #[arg(long, env = "BITCOIN_LAB_PRICE_SOURCE", default_value = "coingecko")]
    pub price_source: PriceSource,

    /// Override the price feed endpoint
    #[arg(long, env = "BITCOIN_LAB_PRICE_URL")]
    pub price_url: Option<String>,

    /// Fiat currency for price quotes
    #[arg(long, env = "BITCOIN_LAB_CURRENCY", default_value = "USD")]
    pub currency: String,

    /// Address style for SegWit wallets: nested (3...) or native (bc1q...)
    #[arg(long, env = "BITCOIN_LAB_SEGWIT_STYLE", default_value = "nested")]
    pub segwit_style: SegwitStyle,

    /// Confirmation target used for fee estimates
    #[arg(long, env = "BITCOIN_LAB_FEE_TARGET_BLOCKS", default_value_t = 1)]
    pub fee_target_blocks: u16,

    /// sat/vB used for simulations when no estimate is available
    #[arg(long, env = "BITCOIN_LAB_FALLBACK_FEE_RATE", default_value_t = 2)]
    pub fallback_fee_rate: u64,

    /// Refuse to simulate from addresses without coins
    #[arg(long, env = "BITCOIN_LAB_NO_SYNTHETIC_FUNDING")]
    pub no_synthetic_funding: bool,

    /// Do not wait for Enter after each action
    #[arg(long, env = "BITCOIN_LAB_NO_PAUSE")]
    pub no_pause: bool,

    /// Make no network requests; chain lookups report empty addresses
    #[arg(long, env = "BITCOIN_LAB_OFFLINE")]
    pub offline: bool,

    /// HTTP request timeout in seconds
    #[arg(long, env = "BITCOIN_LAB_TIMEOUT_SECS", default_value_t = 15)]
    pub timeout_secs: u64,

    /// Log filter when RUST_LOG is unset
    #[arg(long, env = "BITCOIN_LAB_LOG_LEVEL", default_value = "warn")]
    pub log_level: String,
}

impl Default for LabConfig {
    fn default() -> Self {
        Self {
            network: BtcNetwork::Mainnet,
            esplora_url: None,
            price_source: PriceSource::CoinGecko,
            price_url: None,
            currency: "USD".into(),
            segwit_style: SegwitStyle::Nested,
            fee_target_blocks: 1,
            fallback_fee_rate: 2,
            no_synthetic_funding: false,
            no_pause: false,
            offline: false,
            timeout_secs: 15,
            log_level: "warn".into(),
        }
    }
}

impl LabConfig {
    /// Check every setting and report all problems at once.
    pub fn validate(&self) -> Result<(), LabError> {
        let mut problems = Vec::new();

        if let Some(url) = &self.esplora_url {
            if !has_http_scheme(url) {
                problems.push(format!("esplora url '{url}' must start with http:// or https://"));
            }
        }
        if let Some(url) = &self.price_url {
            if !has_http_scheme(url) {
                problems.push(format!("price url '{url}' must start with http:// or https://"));
            }
        }
        let currency = self.currency.trim();
        if currency.len() != 3 || !currency.chars().all(|c| c.is_ascii_alphabetic()) {
            problems.push(format!("currency '{currency}' must be a three-letter code"));
        }
        if self.timeout_secs == 0 {
            problems.push("timeout must be at least 1 second".into());
        }
        if self.fee_target_blocks == 0 {
            problems.push("fee target must be at least 1 block".into());
        }
        if self.fallback_fee_rate == 0 {
            problems.push("fallback fee rate must be at least 1 sat/vB".into());
        } else if self.fallback_fee_rate > MAX_FEE_RATE_SAT_VBYTE {
            problems.push(format!(
                "fallback fee rate must not exceed {MAX_FEE_RATE_SAT_VBYTE} sat/vB"
            ));
        }
        if tracing_subscriber::EnvFilter::try_new(&self.log_level).is_err() {
            problems.push(format!("log level '{}' is not a valid filter", self.log_level));
        }

        if problems.is_empty() {
            Ok(())
        } else {
            Err(LabError::Config(problems.join("; ")))
        }
    }

    pub fn esplora_url(&self) -> &str {
        self.esplora_url
            .as_deref()
            .unwrap_or(self.network.default_esplora_url())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn lab_settings(&self) -> LabSettings {
        LabSettings {
            network: self.network,
            segwit_style: self.segwit_style,
            fee_target_blocks: self.fee_target_blocks,
            fallback_fee_rate: self.fallback_fee_rate,
            synthetic_funding: !self.no_synthetic_funding,
        }
    }
}

fn has_http_scheme(url: &str) -> bool {
    let url = url.trim();
    url.starts_with("http://") || url.starts_with("https://")
}
