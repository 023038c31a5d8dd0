//! Bitcoin chain support for the lab.
//!
//! Key generation and WIF handling, Legacy/SegWit address derivation,
//! amount parsing, fee sizing, coin selection, and building and signing
//! transactions that are never broadcast.

pub mod address;
pub mod amount;
pub mod error;
pub mod key;
pub mod network;
pub mod transaction;
pub mod utxo;

pub use address::ScriptKind;
pub use error::BtcError;
pub use network::BtcNetwork;
