use bitcoin::absolute::LockTime;
use bitcoin::hashes::Hash;
use bitcoin::script::{Builder, PushBytes, PushBytesBuf, ScriptBuf};
use bitcoin::secp256k1::{Message, Secp256k1};
use bitcoin::sighash::{EcdsaSighashType, SighashCache};
use bitcoin::transaction::Version;
use bitcoin::{
    Amount, CompressedPublicKey, OutPoint, PrivateKey, Sequence, Transaction, TxIn, TxOut, Txid,
    Witness,
};

use crate::address::{parse_address, ScriptKind};
use crate::amount::DUST_LIMIT_SAT;
use crate::error::BtcError;
use crate::key::compressed_public_key;
use crate::network::BtcNetwork;
use crate::utxo::Utxo;

/// Version, lock time, counts, and the segwit marker/flag rounded up.
const TX_OVERHEAD_VBYTES: u64 = 11;

/// Outpoint + sequence + scriptSig with a 72-byte signature and 33-byte key.
const P2PKH_INPUT_VBYTES: u64 = 148;

/// 41 bytes non-witness + 23-byte redeem script push + witness / 4.
const P2SH_P2WPKH_INPUT_VBYTES: u64 = 91;

/// 41 bytes non-witness + ~27 witness bytes / 4.
const P2WPKH_INPUT_VBYTES: u64 = 68;

/// Upper bound for a payment output (P2PKH is the largest single-key form).
const OUTPUT_VBYTES: u64 = 34;

/// Value + script length + OP_RETURN + push opcode; the memo bytes come on top.
const OP_RETURN_BASE_VBYTES: u64 = 11;

/// Highest fee rate a transaction may be built with, in sat/vB.
pub const MAX_FEE_RATE_SAT_VBYTE: u64 = 10_000;

/// Largest OP_RETURN payload relayed by default policy.
pub const MAX_MEMO_BYTES: usize = 80;

/// Estimated virtual size of one input spending `kind`.
pub fn input_vbytes(kind: ScriptKind) -> u64 {
    match kind {
        ScriptKind::P2pkh => P2PKH_INPUT_VBYTES,
        ScriptKind::P2shP2wpkh => P2SH_P2WPKH_INPUT_VBYTES,
        ScriptKind::P2wpkh => P2WPKH_INPUT_VBYTES,
    }
}

/// Estimate the virtual size of a transaction spending `num_inputs` coins
/// of `kind` into `num_outputs` payment outputs plus an optional memo.
pub fn estimate_vsize(
    kind: ScriptKind,
    num_inputs: usize,
    num_outputs: usize,
    memo_len: Option<usize>,
) -> u64 {
    let memo = memo_len.map_or(0, |len| OP_RETURN_BASE_VBYTES + len as u64);
    TX_OVERHEAD_VBYTES
        + num_inputs as u64 * input_vbytes(kind)
        + num_outputs as u64 * OUTPUT_VBYTES
        + memo
}

/// Fee for the estimated size at `fee_rate_sat_vbyte`. Saturates at
/// `u64::MAX` instead of overflowing.
pub fn estimate_fee(
    kind: ScriptKind,
    num_inputs: usize,
    num_outputs: usize,
    memo_len: Option<usize>,
    fee_rate_sat_vbyte: u64,
) -> u64 {
    estimate_vsize(kind, num_inputs, num_outputs, memo_len).saturating_mul(fee_rate_sat_vbyte)
}

/// Everything needed to build a single-recipient payment.
#[derive(Debug, Clone)]
pub struct TransactionRequest<'a> {
    pub recipient: &'a str,
    pub amount_sat: u64,
    pub change_address: &'a str,
    pub fee_rate_sat_vbyte: u64,
    pub memo: Option<&'a str>,
    /// Script type of every coin being spent.
    pub input_kind: ScriptKind,
    pub network: BtcNetwork,
}

/// An unsigned Bitcoin transaction ready for signing.
#[derive(Debug, Clone)]
pub struct UnsignedBtcTx {
    /// The transaction with empty scriptSigs and witnesses.
    pub tx: Transaction,
    /// The outputs being spent, in input order. Needed for sighashes.
    pub prevouts: Vec<TxOut>,
    pub input_kind: ScriptKind,
    /// Inputs minus outputs.
    pub fee_sat: u64,
    /// Zero when no change output was created.
    pub change_sat: u64,
}

/// A fully signed transaction.
#[derive(Debug, Clone)]
pub struct SignedBtcTx {
    pub tx: Transaction,
    pub fee_sat: u64,
    pub change_sat: u64,
}

impl SignedBtcTx {
    pub fn txid(&self) -> String {
        self.tx.compute_txid().to_string()
    }

    /// Consensus serialization as lowercase hex.
    pub fn to_hex(&self) -> String {
        bitcoin::consensus::encode::serialize_hex(&self.tx)
    }

    pub fn vsize(&self) -> usize {
        self.tx.vsize()
    }
}

/// Build an unsigned transaction paying `request.amount_sat` to the recipient.
///
/// Coins are chosen largest-first. Change goes back to `change_address`
/// when it exceeds the dust limit, otherwise it is added to the fee. Output
/// order is recipient, change, memo.
pub fn build_transaction(
    utxos: &[Utxo],
    request: &TransactionRequest<'_>,
) -> Result<UnsignedBtcTx, BtcError> {
    let recipient_addr = parse_address(request.recipient, request.network)
        .map_err(|e| BtcError::InvalidAddress(format!("recipient: {e}")))?;
    let change_addr = parse_address(request.change_address, request.network)
        .map_err(|e| BtcError::InvalidAddress(format!("change: {e}")))?;

    if request.amount_sat < DUST_LIMIT_SAT {
        return Err(BtcError::InvalidAmount(format!(
            "{} sat is below the dust limit of {DUST_LIMIT_SAT} sat",
            request.amount_sat
        )));
    }

    if request.fee_rate_sat_vbyte > MAX_FEE_RATE_SAT_VBYTE {
        return Err(BtcError::TransactionBuildError(format!(
            "fee rate {} sat/vB is above the limit of {MAX_FEE_RATE_SAT_VBYTE} sat/vB",
            request.fee_rate_sat_vbyte
        )));
    }

    let memo_script = request.memo.map(memo_script).transpose()?;
    let memo_len = request.memo.map(str::len);
    let kind = request.input_kind;
    let rate = request.fee_rate_sat_vbyte;

    let selection = crate::utxo::select_utxos(utxos, request.amount_sat, |inputs| {
        estimate_fee(kind, inputs, 2, memo_len, rate)
    })?;

    let mut inputs = Vec::with_capacity(selection.selected.len());
    let mut prevouts = Vec::with_capacity(selection.selected.len());

    for utxo in &selection.selected {
        let txid: Txid = utxo
            .txid
            .parse()
            .map_err(|e| BtcError::TransactionBuildError(format!("invalid txid {}: {e}", utxo.txid)))?;

        inputs.push(TxIn {
            previous_output: OutPoint::new(txid, utxo.vout),
            script_sig: ScriptBuf::new(),
            sequence: Sequence::ENABLE_RBF_NO_LOCKTIME,
            witness: Witness::default(),
        });

        prevouts.push(TxOut {
            value: Amount::from_sat(utxo.amount_sat),
            script_pubkey: ScriptBuf::from(utxo.script_pubkey.clone()),
        });
    }

    let fee_with_change = estimate_fee(kind, inputs.len(), 2, memo_len, rate);
    let change_sat = selection
        .total_sat
        .saturating_sub(request.amount_sat.saturating_add(fee_with_change));

    let mut outputs = vec![TxOut {
        value: Amount::from_sat(request.amount_sat),
        script_pubkey: recipient_addr.script_pubkey(),
    }];

    let (fee_sat, change_sat) = if change_sat > DUST_LIMIT_SAT {
        outputs.push(TxOut {
            value: Amount::from_sat(change_sat),
            script_pubkey: change_addr.script_pubkey(),
        });
        (fee_with_change, change_sat)
    } else {
        (selection.total_sat - request.amount_sat, 0)
    };

    if let Some(script) = memo_script {
        outputs.push(TxOut {
            value: Amount::ZERO,
            script_pubkey: script,
        });
    }

    tracing::debug!(
        inputs = inputs.len(),
        outputs = outputs.len(),
        fee_sat,
        change_sat,
        "built unsigned transaction"
    );

    let tx = Transaction {
        version: Version::TWO,
        lock_time: LockTime::ZERO,
        input: inputs,
        output: outputs,
    };

    Ok(UnsignedBtcTx {
        tx,
        prevouts,
        input_kind: kind,
        fee_sat,
        change_sat,
    })
}

fn memo_script(memo: &str) -> Result<ScriptBuf, BtcError> {
    if memo.len() > MAX_MEMO_BYTES {
        return Err(BtcError::TransactionBuildError(format!(
            "memo is {} bytes, limit is {MAX_MEMO_BYTES}",
            memo.len()
        )));
    }
    let data: &PushBytes = memo
        .as_bytes()
        .try_into()
        .map_err(|e| BtcError::TransactionBuildError(format!("memo: {e}")))?;
    Ok(ScriptBuf::new_op_return(data))
}

/// The scriptPubKey `key` can spend as `kind`.
fn owned_script_pubkey(pubkey: &CompressedPublicKey, kind: ScriptKind) -> ScriptBuf {
    match kind {
        ScriptKind::P2pkh => ScriptBuf::new_p2pkh(&pubkey.pubkey_hash()),
        ScriptKind::P2shP2wpkh => {
            let redeem = ScriptBuf::new_p2wpkh(&pubkey.wpubkey_hash());
            ScriptBuf::new_p2sh(&redeem.script_hash())
        }
        ScriptKind::P2wpkh => ScriptBuf::new_p2wpkh(&pubkey.wpubkey_hash()),
    }
}

/// Sign every input of `unsigned` with `private_key` using `SIGHASH_ALL`.
///
/// All inputs must pay to `private_key` in the form given by
/// `unsigned.input_kind`.
pub fn sign_transaction(
    unsigned: &UnsignedBtcTx,
    private_key: &PrivateKey,
) -> Result<SignedBtcTx, BtcError> {
    let secp = Secp256k1::new();
    let compressed_pk = compressed_public_key(private_key)?;
    let kind = unsigned.input_kind;
    let expected_spk = owned_script_pubkey(&compressed_pk, kind);
    let wpkh_script = ScriptBuf::new_p2wpkh(&compressed_pk.wpubkey_hash());

    if unsigned.prevouts.len() != unsigned.tx.input.len() {
        return Err(BtcError::SigningError(format!(
            "{} prevouts for {} inputs",
            unsigned.prevouts.len(),
            unsigned.tx.input.len()
        )));
    }

    let mut signed_tx = unsigned.tx.clone();
    let mut sighash_cache = SighashCache::new(&unsigned.tx);

    for (input_index, prevout) in unsigned.prevouts.iter().enumerate() {
        if prevout.script_pubkey != expected_spk {
            return Err(BtcError::SigningError(format!(
                "input {input_index} is not controlled by this key"
            )));
        }

        let digest = match kind {
            ScriptKind::P2pkh => sighash_cache
                .legacy_signature_hash(
                    input_index,
                    &prevout.script_pubkey,
                    EcdsaSighashType::All.to_u32(),
                )
                .map_err(|e| BtcError::SigningError(format!("sighash computation failed: {e}")))?
                .to_byte_array(),
            ScriptKind::P2shP2wpkh | ScriptKind::P2wpkh => sighash_cache
                .p2wpkh_signature_hash(
                    input_index,
                    &wpkh_script,
                    prevout.value,
                    EcdsaSighashType::All,
                )
                .map_err(|e| BtcError::SigningError(format!("sighash computation failed: {e}")))?
                .to_byte_array(),
        };

        let msg = Message::from_digest(digest);
        let signature = secp.sign_ecdsa(&msg, &private_key.inner);

        // DER signature followed by the sighash type byte.
        let mut sig_bytes = signature.serialize_der().to_vec();
        sig_bytes.push(EcdsaSighashType::All as u8);

        let input = &mut signed_tx.input[input_index];
        match kind {
            ScriptKind::P2pkh => {
                let sig_push = PushBytesBuf::try_from(sig_bytes)
                    .map_err(|e| BtcError::SigningError(format!("signature push: {e}")))?;
                input.script_sig = Builder::new()
                    .push_slice(sig_push)
                    .push_key(&bitcoin::PublicKey::new(compressed_pk.0))
                    .into_script();
            }
            ScriptKind::P2shP2wpkh | ScriptKind::P2wpkh => {
                let mut witness = Witness::new();
                witness.push(&sig_bytes);
                witness.push(compressed_pk.to_bytes());
                input.witness = witness;

                if kind == ScriptKind::P2shP2wpkh {
                    let redeem: &PushBytes = wpkh_script
                        .as_bytes()
                        .try_into()
                        .map_err(|e| BtcError::SigningError(format!("redeem script push: {e}")))?;
                    input.script_sig = Builder::new().push_slice(redeem).into_script();
                }
            }
        }
    }

    Ok(SignedBtcTx {
        tx: signed_tx,
        fee_sat: unsigned.fee_sat,
        change_sat: unsigned.change_sat,
    })
}
