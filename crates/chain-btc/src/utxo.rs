use crate::error::BtcError;

/// A single unspent transaction output (UTXO).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Utxo {
    /// Transaction ID as a hex string (big-endian / display order).
    pub txid: String,
    /// Output index within the transaction.
    pub vout: u32,
    /// Value in satoshis.
    pub amount_sat: u64,
    /// The locking script (scriptPubKey) serialized bytes.
    pub script_pubkey: Vec<u8>,
}

/// Result of UTXO selection: the chosen UTXOs and their aggregate value.
#[derive(Debug, Clone)]
pub struct UtxoSelection {
    pub selected: Vec<Utxo>,
    pub total_sat: u64,
}

/// Select UTXOs to cover `target_sat` plus the fee.
///
/// Largest-first. `fee_for_inputs` returns the fee of the transaction being
/// built when it spends the given number of inputs, so the caller decides
/// the script type and output layout.
pub fn select_utxos<F>(utxos: &[Utxo], target_sat: u64, fee_for_inputs: F) -> Result<UtxoSelection, BtcError>
where
    F: Fn(usize) -> u64,
{
    if utxos.is_empty() {
        return Err(BtcError::TransactionBuildError("no UTXOs available".into()));
    }

    let mut sorted: Vec<&Utxo> = utxos.iter().collect();
    sorted.sort_by(|a, b| b.amount_sat.cmp(&a.amount_sat));

    let mut selected: Vec<Utxo> = Vec::new();
    let mut total_sat: u64 = 0;
    let mut required = target_sat;

    for utxo in sorted {
        selected.push(utxo.clone());
        total_sat = total_sat.saturating_add(utxo.amount_sat);

        required = target_sat.saturating_add(fee_for_inputs(selected.len()));
        if total_sat >= required {
            return Ok(UtxoSelection { selected, total_sat });
        }
    }

    Err(BtcError::InsufficientFunds {
        available_sat: total_sat,
        required_sat: required,
    })
}
