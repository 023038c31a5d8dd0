use bitcoin::hashes::Hash;
use bitcoin::{PrivateKey, Txid};
use chain_api::AddressUtxo;
use chain_btc::address::parse_address;
use chain_btc::transaction::{build_transaction, estimate_fee, sign_transaction, TransactionRequest};
use chain_btc::utxo::Utxo;
use chain_btc::{BtcError, BtcNetwork};

use crate::error::LabError;
use crate::types::{LabWallet, SimulatedTransaction};

/// OP_RETURN payload attached to every simulated transaction.
pub const SIMULATION_MEMO: &str = "Test transaction from Bitcoin Laboratory";

const SYNTHETIC_TAG: &[u8] = b"bitcoin-lab synthetic funding";

/// Attach the wallet's locking script to coins reported by the server.
pub fn wallet_coins(
    wallet: &LabWallet,
    coins: &[AddressUtxo],
    network: BtcNetwork,
) -> Result<Vec<Utxo>, LabError> {
    let script_pubkey = parse_address(&wallet.address, network)?.script_pubkey().to_bytes();
    Ok(coins
        .iter()
        .map(|coin| Utxo {
            txid: coin.txid.clone(),
            vout: coin.vout,
            amount_sat: coin.value_sat,
            script_pubkey: script_pubkey.clone(),
        })
        .collect())
}

/// A made-up coin paying `wallet` exactly the amount plus the fee of a
/// one-input transaction with change and memo. The txid is derived from
/// the address and amount, so it never matches a real transaction.
pub fn synthetic_funding(
    wallet: &LabWallet,
    amount_sat: u64,
    fee_rate_sat_vbyte: u64,
    network: BtcNetwork,
) -> Result<Utxo, LabError> {
    let fee = estimate_fee(wallet.kind, 1, 2, Some(SIMULATION_MEMO.len()), fee_rate_sat_vbyte);
    let value = amount_sat.checked_add(fee).ok_or_else(|| {
        BtcError::InvalidAmount(format!("{amount_sat} sat plus a {fee} sat fee overflows"))
    })?;

    let mut preimage = SYNTHETIC_TAG.to_vec();
    preimage.extend_from_slice(wallet.address.as_bytes());
    preimage.extend_from_slice(&value.to_le_bytes());

    let script_pubkey = parse_address(&wallet.address, network)?.script_pubkey().to_bytes();

    Ok(Utxo {
        txid: Txid::hash(&preimage).to_string(),
        vout: 0,
        amount_sat: value,
        script_pubkey,
    })
}

/// Build and sign a payment from `wallet` to `destination`, returning
/// change to the wallet. Nothing is broadcast.
///
/// `synthetic_funding` is left unset; the caller knows where the coins came from.
pub fn build_simulation(
    wallet: &LabWallet,
    key: &PrivateKey,
    destination: &str,
    amount_sat: u64,
    coins: &[Utxo],
    fee_rate_sat_vbyte: u64,
    network: BtcNetwork,
) -> Result<SimulatedTransaction, LabError> {
    let request = TransactionRequest {
        recipient: destination,
        amount_sat,
        change_address: &wallet.address,
        fee_rate_sat_vbyte,
        memo: Some(SIMULATION_MEMO),
        input_kind: wallet.kind,
        network,
    };

    let unsigned = build_transaction(coins, &request)?;
    let signed = sign_transaction(&unsigned, key)?;

    Ok(SimulatedTransaction {
        source: wallet.address.clone(),
        destination: destination.to_string(),
        amount_sat,
        fee_sat: signed.fee_sat,
        change_sat: signed.change_sat,
        fee_rate_sat_vbyte,
        txid: signed.txid(),
        tx_hex: signed.to_hex(),
        vsize: signed.vsize(),
        synthetic_funding: false,
    })
}
