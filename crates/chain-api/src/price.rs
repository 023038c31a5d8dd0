use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use serde::Deserialize;

use crate::error::ApiError;
use crate::http::{build_client, get_json, normalize_base_url};
use crate::types::PriceQuote;

pub const COINGECKO_URL: &str = "https://api.coingecko.com/api/v3/simple/price";
pub const COINDESK_URL: &str = "https://api.coindesk.com/v1/bpi/currentprice";

/// Which price feed format to speak.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PriceSource {
    /// `GET {base}?ids=bitcoin&vs_currencies=usd` → `{"bitcoin":{"usd":67187.0}}`
    #[default]
    CoinGecko,
    /// `GET {base}/USD.json` → `{"bpi":{"USD":{"rate":"67,187.12","rate_float":67187.12}}}`
    Coindesk,
}

impl PriceSource {
    pub fn default_url(self) -> &'static str {
        match self {
            PriceSource::CoinGecko => COINGECKO_URL,
            PriceSource::Coindesk => COINDESK_URL,
        }
    }
}

impl fmt::Display for PriceSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PriceSource::CoinGecko => write!(f, "coingecko"),
            PriceSource::Coindesk => write!(f, "coindesk"),
        }
    }
}

impl FromStr for PriceSource {
    type Err = ApiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "coingecko" => Ok(PriceSource::CoinGecko),
            "coindesk" => Ok(PriceSource::Coindesk),
            other => Err(ApiError::InvalidRequest(format!(
                "unknown price source '{other}' (expected coingecko or coindesk)"
            ))),
        }
    }
}

#[derive(Debug, Deserialize)]
struct CoindeskResponse {
    bpi: HashMap<String, CoindeskRate>,
}

#[derive(Debug, Deserialize)]
struct CoindeskRate {
    #[serde(default)]
    rate: Option<String>,
    #[serde(default)]
    rate_float: Option<f64>,
}

type CoinGeckoResponse = HashMap<String, HashMap<String, f64>>;

/// Client for the BTC spot price in one fiat currency.
#[derive(Debug, Clone)]
pub struct PriceClient {
    http: reqwest::Client,
    source: PriceSource,
    base_url: String,
    currency: String,
}

impl PriceClient {
    /// `base_url` defaults to the source's public endpoint.
    pub fn new(
        source: PriceSource,
        base_url: Option<&str>,
        currency: &str,
        timeout: Duration,
    ) -> Result<Self, ApiError> {
        let currency = currency.trim().to_ascii_uppercase();
        if currency.len() != 3 || !currency.chars().all(|c| c.is_ascii_alphabetic()) {
            return Err(ApiError::InvalidRequest(format!(
                "'{currency}' is not a three-letter currency code"
            )));
        }
        Ok(Self {
            http: build_client(timeout)?,
            source,
            base_url: normalize_base_url(base_url.unwrap_or(source.default_url())),
            currency,
        })
    }

    pub fn source(&self) -> PriceSource {
        self.source
    }

    pub fn currency(&self) -> &str {
        &self.currency
    }

    pub fn request_url(&self) -> String {
        match self.source {
            PriceSource::CoinGecko => format!(
                "{}?ids=bitcoin&vs_currencies={}",
                self.base_url,
                self.currency.to_ascii_lowercase()
            ),
            PriceSource::Coindesk => format!("{}/{}.json", self.base_url, self.currency),
        }
    }

    pub async fn btc_price(&self) -> Result<PriceQuote, ApiError> {
        let url = self.request_url();
        let price = match self.source {
            PriceSource::CoinGecko => {
                let body: CoinGeckoResponse = get_json(&self.http, &url).await?;
                coingecko_price(&body, &self.currency)?
            }
            PriceSource::Coindesk => {
                let body: CoindeskResponse = get_json(&self.http, &url).await?;
                coindesk_price(&body, &self.currency)?
            }
        };
        tracing::debug!(source = %self.source, currency = %self.currency, price, "fetched price");
        Ok(PriceQuote {
            currency: self.currency.clone(),
            price,
            source: self.source,
        })
    }
}

fn coingecko_price(body: &CoinGeckoResponse, currency: &str) -> Result<f64, ApiError> {
    let price = body
        .get("bitcoin")
        .and_then(|rates| rates.get(&currency.to_ascii_lowercase()))
        .copied()
        .ok_or_else(|| ApiError::InvalidResponse(format!("no bitcoin/{currency} rate in response")))?;
    checked_price(price)
}

fn coindesk_price(body: &CoindeskResponse, currency: &str) -> Result<f64, ApiError> {
    let rate = body
        .bpi
        .get(currency)
        .ok_or_else(|| ApiError::InvalidResponse(format!("no {currency} entry in bpi")))?;

    let price = match (rate.rate_float, rate.rate.as_deref()) {
        (Some(value), _) => value,
        (None, Some(text)) => text.replace(',', "").trim().parse::<f64>().map_err(|e| {
            ApiError::InvalidResponse(format!("unparsable {currency} rate '{text}': {e}"))
        })?,
        (None, None) => {
            return Err(ApiError::InvalidResponse(format!("{currency} entry has no rate")))
        }
    };
    checked_price(price)
}

fn checked_price(price: f64) -> Result<f64, ApiError> {
    if price.is_finite() && price > 0.0 {
        Ok(price)
    } else {
        Err(ApiError::InvalidResponse(format!("implausible price {price}")))
    }
}
