use bitcoin::secp256k1::{Secp256k1, SecretKey};
use bitcoin::{CompressedPublicKey, PrivateKey};
use crypto_utils::random::random_bytes_where;
use crypto_utils::ZeroizingString;
use zeroize::Zeroize;

use crate::error::BtcError;
use crate::network::BtcNetwork;

/// Draws allowed before giving up on finding a valid scalar. A uniformly
/// random 32-byte string falls outside the curve order with probability
/// ~2^-128, so hitting this limit means the entropy source is broken.
const MAX_KEYGEN_ATTEMPTS: usize = 16;

/// Generate a fresh compressed private key from OS entropy.
pub fn generate_private_key(network: BtcNetwork) -> Result<PrivateKey, BtcError> {
    let mut bytes = random_bytes_where::<32, _>(MAX_KEYGEN_ATTEMPTS, |candidate| {
        SecretKey::from_slice(candidate).is_ok()
    })
    .ok_or_else(|| {
        BtcError::InvalidPrivateKey("entropy source produced no valid secp256k1 scalar".into())
    })?;

    let result = private_key_from_bytes(&bytes, network);
    bytes.zeroize();
    result
}

/// Build a compressed private key from a raw 32-byte scalar.
pub fn private_key_from_bytes(bytes: &[u8; 32], network: BtcNetwork) -> Result<PrivateKey, BtcError> {
    let secret = SecretKey::from_slice(bytes)
        .map_err(|e| BtcError::InvalidPrivateKey(format!("invalid secret key: {e}")))?;
    Ok(PrivateKey::new(secret, network.kind()))
}

/// Encode a private key in Wallet Import Format.
pub fn private_key_to_wif(key: &PrivateKey) -> ZeroizingString {
    ZeroizingString::new(key.to_wif())
}

/// Decode a WIF private key and check it belongs to `network`.
///
/// Only compressed keys are accepted; every address format the lab derives
/// requires a compressed public key.
pub fn private_key_from_wif(wif: &str, network: BtcNetwork) -> Result<PrivateKey, BtcError> {
    let key = PrivateKey::from_wif(wif.trim())
        .map_err(|e| BtcError::InvalidPrivateKey(format!("failed to decode WIF: {e}")))?;

    if !key.compressed {
        return Err(BtcError::InvalidPrivateKey(
            "uncompressed WIF keys are not supported".into(),
        ));
    }
    if key.network != network.kind() {
        return Err(BtcError::InvalidPrivateKey(format!(
            "WIF key does not belong to {network}"
        )));
    }
    Ok(key)
}

/// Derive the compressed public key for `key`.
pub fn compressed_public_key(key: &PrivateKey) -> Result<CompressedPublicKey, BtcError> {
    let secp = Secp256k1::signing_only();
    CompressedPublicKey::from_private_key(&secp, key)
        .map_err(|e| BtcError::InvalidPublicKey(format!("failed to derive public key: {e}")))
}
