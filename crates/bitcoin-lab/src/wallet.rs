use bitcoin::PrivateKey;
use chain_btc::address::derive_address;
use chain_btc::key::{compressed_public_key, generate_private_key, private_key_from_wif, private_key_to_wif};
use chain_btc::BtcNetwork;

use crate::error::LabError;
use crate::types::{LabWallet, SegwitStyle, WalletFormat};

/// Generate a fresh key and derive its address in `format`.
pub fn create_wallet(
    format: WalletFormat,
    segwit_style: SegwitStyle,
    network: BtcNetwork,
) -> Result<LabWallet, LabError> {
    let key = generate_private_key(network)?;
    wallet_from_private_key(&key, format, segwit_style, network)
}

/// Rebuild a wallet from its WIF.
pub fn wallet_from_wif(
    wif: &str,
    format: WalletFormat,
    segwit_style: SegwitStyle,
    network: BtcNetwork,
) -> Result<LabWallet, LabError> {
    let key = private_key_from_wif(wif, network)?;
    wallet_from_private_key(&key, format, segwit_style, network)
}

fn wallet_from_private_key(
    key: &PrivateKey,
    format: WalletFormat,
    segwit_style: SegwitStyle,
    network: BtcNetwork,
) -> Result<LabWallet, LabError> {
    let pubkey = compressed_public_key(key)?;
    let kind = format.script_kind(segwit_style);
    let address = derive_address(&pubkey, kind, network).to_string();

    tracing::info!(%address, kind = kind.label(), %network, "created wallet");

    Ok(LabWallet {
        address,
        private_key: private_key_to_wif(key),
        kind,
        format,
    })
}

/// Decode the signing key held by `wallet`.
pub fn signing_key(wallet: &LabWallet, network: BtcNetwork) -> Result<PrivateKey, LabError> {
    Ok(private_key_from_wif(wallet.private_key.expose(), network)?)
}
