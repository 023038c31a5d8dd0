use std::collections::{BTreeMap, HashMap};
use std::fmt;

use serde::Deserialize;

use crate::price::PriceSource;

// ─── Esplora wire formats ────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct AddressStatsResponse {
    pub address: String,
    pub chain_stats: TxoStats,
    pub mempool_stats: TxoStats,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct TxoStats {
    pub funded_txo_sum: u64,
    pub spent_txo_sum: u64,
    pub tx_count: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct EsploraTx {
    pub txid: String,
    pub status: EsploraStatus,
    #[serde(default)]
    pub fee: Option<u64>,
    #[serde(default)]
    pub vin: Vec<EsploraVin>,
    #[serde(default)]
    pub vout: Vec<EsploraVout>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct EsploraStatus {
    pub confirmed: bool,
    #[serde(default)]
    pub block_height: Option<u32>,
    #[serde(default)]
    pub block_time: Option<u64>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct EsploraVin {
    /// Absent for coinbase inputs.
    #[serde(default)]
    pub prevout: Option<EsploraVout>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct EsploraVout {
    #[serde(default)]
    pub scriptpubkey_address: Option<String>,
    pub value: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct EsploraUtxo {
    pub txid: String,
    pub vout: u32,
    pub value: u64,
    #[serde(default)]
    pub status: EsploraStatus,
}

// ─── Public models ───────────────────────────────────────────────────

/// Balance of one address, split by confirmation state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddressBalance {
    pub address: String,
    /// Funded minus spent in confirmed transactions.
    pub confirmed_sat: i64,
    /// Net effect of unconfirmed transactions; negative while a spend is pending.
    pub pending_sat: i64,
    pub tx_count: u64,
}

impl AddressBalance {
    pub fn total_sat(&self) -> i64 {
        self.confirmed_sat + self.pending_sat
    }

    pub(crate) fn from_stats(stats: AddressStatsResponse) -> Self {
        let net = |s: &TxoStats| s.funded_txo_sum as i64 - s.spent_txo_sum as i64;
        Self {
            confirmed_sat: net(&stats.chain_stats),
            pending_sat: net(&stats.mempool_stats),
            tx_count: stats.chain_stats.tx_count + stats.mempool_stats.tx_count,
            address: stats.address,
        }
    }
}

/// One entry of an address's transaction history.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TxSummary {
    pub txid: String,
    pub confirmed: bool,
    pub block_height: Option<u32>,
    pub block_time: Option<u64>,
    pub fee_sat: Option<u64>,
    /// Received minus spent by the queried address in this transaction.
    pub net_sat: i64,
}

impl TxSummary {
    pub(crate) fn from_esplora(tx: EsploraTx, address: &str) -> Self {
        let is_ours = |out: &EsploraVout| out.scriptpubkey_address.as_deref() == Some(address);

        let received: u64 = tx.vout.iter().filter(|o| is_ours(*o)).map(|o| o.value).sum();
        let spent: u64 = tx
            .vin
            .iter()
            .filter_map(|i| i.prevout.as_ref())
            .filter(|o| is_ours(*o))
            .map(|o| o.value)
            .sum();

        Self {
            txid: tx.txid,
            confirmed: tx.status.confirmed,
            block_height: tx.status.block_height,
            block_time: tx.status.block_time,
            fee_sat: tx.fee,
            net_sat: received as i64 - spent as i64,
        }
    }
}

/// An unspent output owned by an address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddressUtxo {
    pub txid: String,
    pub vout: u32,
    pub value_sat: u64,
    pub confirmed: bool,
}

impl From<EsploraUtxo> for AddressUtxo {
    fn from(utxo: EsploraUtxo) -> Self {
        Self {
            txid: utxo.txid,
            vout: utxo.vout,
            value_sat: utxo.value,
            confirmed: utxo.status.confirmed,
        }
    }
}

/// Fee-rate estimates keyed by confirmation target in blocks (sat/vB).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeeEstimates(BTreeMap<u16, f64>);

impl FeeEstimates {
    /// Keep only numeric targets with finite, non-negative rates.
    pub fn from_raw(raw: HashMap<String, f64>) -> Self {
        let rates = raw
            .into_iter()
            .filter_map(|(target, rate)| {
                let target = target.trim().parse::<u16>().ok()?;
                (rate.is_finite() && rate >= 0.0).then_some((target, rate))
            })
            .collect();
        Self(rates)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn targets(&self) -> impl Iterator<Item = (u16, f64)> + '_ {
        self.0.iter().map(|(t, r)| (*t, *r))
    }

    /// Rate for the largest target not above `blocks`; falls back to the
    /// quickest target when every target is slower than requested.
    pub fn rate_for_target(&self, blocks: u16) -> Option<(u16, f64)> {
        self.0
            .range(..=blocks)
            .next_back()
            .or_else(|| self.0.iter().next())
            .map(|(t, r)| (*t, *r))
    }
}

/// Spot price of one bitcoin.
#[derive(Debug, Clone, PartialEq)]
pub struct PriceQuote {
    /// Upper-case ISO code, e.g. `USD`.
    pub currency: String,
    pub price: f64,
    pub source: PriceSource,
}

impl fmt::Display for PriceQuote {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2} {} ({})", self.price, self.currency, self.source)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ADDRESS: &str = "bc1qw508d6qejxtdg4y5r3zarvary0c5xw7kv8f3t4";

    #[test]
    fn balance_from_esplora_stats() {
        let json = r#"{
            "address": "bc1qw508d6qejxtdg4y5r3zarvary0c5xw7kv8f3t4",
            "chain_stats": {"funded_txo_count": 3, "funded_txo_sum": 150000,
                            "spent_txo_count": 1, "spent_txo_sum": 50000, "tx_count": 4},
            "mempool_stats": {"funded_txo_count": 0, "funded_txo_sum": 0,
                              "spent_txo_count": 1, "spent_txo_sum": 20000, "tx_count": 1}
        }"#;
        let stats: AddressStatsResponse = serde_json::from_str(json).unwrap();
        let balance = AddressBalance::from_stats(stats);

        assert_eq!(balance.address, ADDRESS);
        assert_eq!(balance.confirmed_sat, 100_000);
        assert_eq!(balance.pending_sat, -20_000);
        assert_eq!(balance.total_sat(), 80_000);
        assert_eq!(balance.tx_count, 5);
    }

    #[test]
    fn tx_summary_nets_inputs_and_outputs() {
        let json = r#"{
            "txid": "f4184fc596403b9d638783cf57adfe4c75c605f6356fbc91338530e9831e9e16",
            "status": {"confirmed": true, "block_height": 170, "block_time": 1231731025},
            "fee": 0,
            "vin": [{"prevout": {"scriptpubkey_address": "bc1qw508d6qejxtdg4y5r3zarvary0c5xw7kv8f3t4", "value": 5000}}],
            "vout": [
                {"scriptpubkey_address": "1A1zP1eP5QGefi2DMPTfTL5SLmv7DivfNa", "value": 3000},
                {"scriptpubkey_address": "bc1qw508d6qejxtdg4y5r3zarvary0c5xw7kv8f3t4", "value": 1500},
                {"value": 0}
            ]
        }"#;
        let tx: EsploraTx = serde_json::from_str(json).unwrap();
        let summary = TxSummary::from_esplora(tx, ADDRESS);

        assert!(summary.confirmed);
        assert_eq!(summary.block_height, Some(170));
        assert_eq!(summary.fee_sat, Some(0));
        assert_eq!(summary.net_sat, -3_500);
    }

    #[test]
    fn tx_summary_handles_coinbase_and_mempool() {
        let json = r#"{
            "txid": "aa",
            "status": {"confirmed": false},
            "vin": [{"prevout": null}],
            "vout": [{"scriptpubkey_address": "bc1qw508d6qejxtdg4y5r3zarvary0c5xw7kv8f3t4", "value": 625000000}]
        }"#;
        let tx: EsploraTx = serde_json::from_str(json).unwrap();
        let summary = TxSummary::from_esplora(tx, ADDRESS);

        assert!(!summary.confirmed);
        assert_eq!(summary.block_height, None);
        assert_eq!(summary.net_sat, 625_000_000);
    }

    #[test]
    fn utxo_conversion() {
        let json = r#"[{"txid": "bb", "vout": 1, "value": 42000,
                        "status": {"confirmed": true, "block_height": 800000}}]"#;
        let utxos: Vec<EsploraUtxo> = serde_json::from_str(json).unwrap();
        let utxo = AddressUtxo::from(utxos[0].clone());
        assert_eq!(utxo.vout, 1);
        assert_eq!(utxo.value_sat, 42_000);
        assert!(utxo.confirmed);
    }

    fn estimates() -> FeeEstimates {
        let raw: HashMap<String, f64> =
            serde_json::from_str(r#"{"1": 25.1, "3": 18.0, "6": 12.5, "144": 2.0, "x": 9.0}"#)
                .unwrap();
        FeeEstimates::from_raw(raw)
    }

    #[test]
    fn fee_estimates_drop_bad_keys() {
        assert_eq!(estimates().targets().count(), 4);
    }

    #[test]
    fn rate_for_exact_target() {
        assert_eq!(estimates().rate_for_target(6), Some((6, 12.5)));
    }

    #[test]
    fn rate_for_target_between_entries_uses_faster_one() {
        assert_eq!(estimates().rate_for_target(5), Some((3, 18.0)));
        assert_eq!(estimates().rate_for_target(1000), Some((144, 2.0)));
    }

    #[test]
    fn rate_for_target_below_all_entries_uses_quickest() {
        let raw: HashMap<String, f64> = [("2".to_string(), 30.0), ("6".to_string(), 10.0)].into();
        let est = FeeEstimates::from_raw(raw);
        assert_eq!(est.rate_for_target(1), Some((2, 30.0)));
    }

    #[test]
    fn empty_estimates_have_no_rate() {
        assert_eq!(FeeEstimates::default().rate_for_target(1), None);
        assert!(FeeEstimates::default().is_empty());
    }

    #[test]
    fn price_quote_display() {
        let quote = PriceQuote {
            currency: "USD".into(),
            price: 67187.123,
            source: PriceSource::CoinGecko,
        };
        assert_eq!(quote.to_string(), "67187.12 USD (coingecko)");
    }
}
