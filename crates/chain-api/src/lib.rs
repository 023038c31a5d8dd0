//! HTTP clients for the public data the lab displays.
//!
//! [`esplora::EsploraClient`] reads address balances, history, spendable
//! coins and fee estimates from an Esplora REST server (Blockstream,
//! mempool.space or a local instance). [`price::PriceClient`] reads the
//! BTC spot price from CoinGecko or a Coindesk-style feed.

pub mod error;
pub mod esplora;
mod http;
pub mod price;
pub mod types;

pub use error::ApiError;
pub use esplora::EsploraClient;
pub use price::{PriceClient, PriceSource};
pub use types::{AddressBalance, AddressUtxo, FeeEstimates, PriceQuote, TxSummary};
