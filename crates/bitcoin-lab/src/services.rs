use std::collections::HashMap;

use chain_api::{
    AddressBalance, AddressUtxo, ApiError, EsploraClient, FeeEstimates, PriceClient, PriceQuote,
    TxSummary,
};

use crate::config::LabConfig;
use crate::error::LabError;

/// Read-only chain and market data the lab displays.
#[allow(async_fn_in_trait)]
pub trait ChainData {
    async fn balance(&self, address: &str) -> Result<AddressBalance, ApiError>;
    async fn history(&self, address: &str) -> Result<Vec<TxSummary>, ApiError>;
    async fn utxos(&self, address: &str) -> Result<Vec<AddressUtxo>, ApiError>;
    async fn fee_estimates(&self) -> Result<FeeEstimates, ApiError>;
    async fn btc_price(&self) -> Result<PriceQuote, ApiError>;
}

/// Esplora for chain data and a public feed for prices.
#[derive(Debug, Clone)]
pub struct LiveChainData {
    esplora: EsploraClient,
    price: PriceClient,
}

impl LiveChainData {
    pub fn new(esplora: EsploraClient, price: PriceClient) -> Self {
        Self { esplora, price }
    }

    pub fn from_config(config: &LabConfig) -> Result<Self, LabError> {
        let esplora = EsploraClient::new(config.esplora_url(), config.timeout())?;
        let price = PriceClient::new(
            config.price_source,
            config.price_url.as_deref(),
            &config.currency,
            config.timeout(),
        )?;
        tracing::debug!(
            esplora = esplora.base_url(),
            price_source = %price.source(),
            currency = price.currency(),
            "configured live data sources"
        );
        Ok(Self::new(esplora, price))
    }
}

impl ChainData for LiveChainData {
    async fn balance(&self, address: &str) -> Result<AddressBalance, ApiError> {
        self.esplora.address_balance(address).await
    }

    async fn history(&self, address: &str) -> Result<Vec<TxSummary>, ApiError> {
        self.esplora.address_history(address).await
    }

    async fn utxos(&self, address: &str) -> Result<Vec<AddressUtxo>, ApiError> {
        self.esplora.address_utxos(address).await
    }

    async fn fee_estimates(&self) -> Result<FeeEstimates, ApiError> {
        self.esplora.fee_estimates().await
    }

    async fn btc_price(&self) -> Result<PriceQuote, ApiError> {
        self.price.btc_price().await
    }
}

/// Fixed data held in memory. Addresses without an entry look unused.
///
/// Backs `--offline` sessions, where fee and price lookups fail until data
/// is supplied.
#[derive(Debug, Clone, Default)]
pub struct MemoryChainData {
    balances: HashMap<String, AddressBalance>,
    histories: HashMap<String, Vec<TxSummary>>,
    utxos: HashMap<String, Vec<AddressUtxo>>,
    fees: Option<FeeEstimates>,
    price: Option<PriceQuote>,
    fail_with_status: Option<u16>,
}

impl MemoryChainData {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_balance(mut self, balance: AddressBalance) -> Self {
        self.balances.insert(balance.address.clone(), balance);
        self
    }

    pub fn with_history(mut self, address: &str, history: Vec<TxSummary>) -> Self {
        self.histories.insert(address.to_string(), history);
        self
    }

    pub fn with_utxos(mut self, address: &str, utxos: Vec<AddressUtxo>) -> Self {
        self.utxos.insert(address.to_string(), utxos);
        self
    }

    pub fn with_fee_estimates(mut self, fees: FeeEstimates) -> Self {
        self.fees = Some(fees);
        self
    }

    pub fn with_price(mut self, price: PriceQuote) -> Self {
        self.price = Some(price);
        self
    }

    /// Every lookup fails as if the server answered `status`.
    pub fn failing(mut self, status: u16) -> Self {
        self.fail_with_status = Some(status);
        self
    }

    fn check(&self, what: &str) -> Result<(), ApiError> {
        match self.fail_with_status {
            Some(status) => Err(ApiError::Status {
                url: format!("memory://{what}"),
                status,
                body: "unavailable".into(),
            }),
            None => Ok(()),
        }
    }
}

impl ChainData for MemoryChainData {
    async fn balance(&self, address: &str) -> Result<AddressBalance, ApiError> {
        self.check("balance")?;
        Ok(self.balances.get(address).cloned().unwrap_or_else(|| AddressBalance {
            address: address.to_string(),
            confirmed_sat: 0,
            pending_sat: 0,
            tx_count: 0,
        }))
    }

    async fn history(&self, address: &str) -> Result<Vec<TxSummary>, ApiError> {
        self.check("history")?;
        Ok(self.histories.get(address).cloned().unwrap_or_default())
    }

    async fn utxos(&self, address: &str) -> Result<Vec<AddressUtxo>, ApiError> {
        self.check("utxos")?;
        Ok(self.utxos.get(address).cloned().unwrap_or_default())
    }

    async fn fee_estimates(&self) -> Result<FeeEstimates, ApiError> {
        self.check("fee-estimates")?;
        self.fees
            .clone()
            .ok_or_else(|| ApiError::InvalidResponse("no fee estimates available offline".into()))
    }

    async fn btc_price(&self) -> Result<PriceQuote, ApiError> {
        self.check("price")?;
        self.price
            .clone()
            .ok_or_else(|| ApiError::InvalidResponse("no price available offline".into()))
    }
}
