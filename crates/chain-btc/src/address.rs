use bitcoin::address::{Address, NetworkUnchecked};
use bitcoin::CompressedPublicKey;

use crate::error::BtcError;
use crate::network::BtcNetwork;

/// Single-key output script types the lab can create and spend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScriptKind {
    /// Pay-to-public-key-hash, base58 `1...` / `m...`.
    P2pkh,
    /// P2WPKH nested in P2SH, base58 `3...` / `2...`.
    P2shP2wpkh,
    /// Native P2WPKH, bech32 `bc1q...` / `tb1q...`.
    P2wpkh,
}

impl ScriptKind {
    pub fn label(self) -> &'static str {
        match self {
            ScriptKind::P2pkh => "P2PKH (Legacy)",
            ScriptKind::P2shP2wpkh => "P2SH-P2WPKH (SegWit)",
            ScriptKind::P2wpkh => "P2WPKH (Native SegWit)",
        }
    }
}

/// Derive the address of `kind` for a compressed public key.
pub fn derive_address(pubkey: &CompressedPublicKey, kind: ScriptKind, network: BtcNetwork) -> Address {
    let net = network.to_bitcoin_network();
    match kind {
        ScriptKind::P2pkh => Address::p2pkh(pubkey.pubkey_hash(), net),
        ScriptKind::P2shP2wpkh => Address::p2shwpkh(pubkey, net),
        ScriptKind::P2wpkh => Address::p2wpkh(pubkey, net),
    }
}

/// Validate a Bitcoin address string for the given network.
///
/// Returns `true` if the address is valid for the specified network,
/// `false` if it is valid but for a different network.
pub fn validate_address(address: &str, network: BtcNetwork) -> Result<bool, BtcError> {
    let parsed = parse_unchecked(address)?;
    Ok(parsed.is_valid_for_network(network.to_bitcoin_network()))
}

/// Parse an address and require that it belongs to `network`.
pub fn parse_address(address: &str, network: BtcNetwork) -> Result<Address, BtcError> {
    parse_unchecked(address)?
        .require_network(network.to_bitcoin_network())
        .map_err(|_| BtcError::InvalidAddress(format!("{} is not a {network} address", address.trim())))
}

fn parse_unchecked(address: &str) -> Result<Address<NetworkUnchecked>, BtcError> {
    address
        .trim()
        .parse::<Address<NetworkUnchecked>>()
        .map_err(|e| BtcError::InvalidAddress(format!("failed to parse address: {e}")))
}
