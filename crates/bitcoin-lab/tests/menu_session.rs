//! End-to-end menu sessions driven by scripted input:
//! create wallets -> look up chain data -> simulate a payment.
//!
//! Chain data comes from `MemoryChainData`, so nothing touches the network.

use std::collections::HashMap;
use std::io::Cursor;

use bitcoin::consensus::encode::deserialize_hex;
use bitcoin::Transaction;
use bitcoin_lab::menu::{run, MenuOptions};
use bitcoin_lab::{Lab, LabSettings, MemoryChainData, SegwitStyle, WalletFormat};
use chain_api::{AddressBalance, AddressUtxo, FeeEstimates, PriceQuote, PriceSource, TxSummary};

const WATCHED: &str = "bc1qw508d6qejxtdg4y5r3zarvary0c5xw7kv8f3t4";
const DESTINATION: &str = "1BgGZ9tcN4rm9KBzDn7KprQz87SZ26SAMH";

fn fees() -> FeeEstimates {
    let raw: HashMap<String, f64> = [("1", 15.4), ("3", 9.0), ("144", 1.0)]
        .into_iter()
        .map(|(t, r)| (t.to_string(), r))
        .collect();
    FeeEstimates::from_raw(raw)
}

fn market_data() -> MemoryChainData {
    MemoryChainData::new()
        .with_balance(AddressBalance {
            address: WATCHED.into(),
            confirmed_sat: 250_000,
            pending_sat: -10_000,
            tx_count: 3,
        })
        .with_history(
            WATCHED,
            vec![
                TxSummary {
                    txid: "ab".repeat(32),
                    confirmed: true,
                    block_height: Some(840_000),
                    block_time: Some(1_713_571_767),
                    fee_sat: Some(1_200),
                    net_sat: 250_000,
                },
                TxSummary {
                    txid: "cd".repeat(32),
                    confirmed: false,
                    block_height: None,
                    block_time: None,
                    fee_sat: Some(900),
                    net_sat: -10_000,
                },
            ],
        )
        .with_fee_estimates(fees())
        .with_price(PriceQuote {
            currency: "USD".into(),
            price: 67_187.12,
            source: PriceSource::CoinGecko,
        })
}

async fn run_script(lab: &mut Lab<MemoryChainData>, script: &str) -> String {
    let mut input = Cursor::new(script.as_bytes().to_vec());
    let mut output = Vec::new();
    run(lab, &mut input, &mut output, &MenuOptions { pause: false })
        .await
        .unwrap();
    String::from_utf8(output).unwrap()
}

/// Text after the first line starting with `label`.
fn field<'a>(out: &'a str, label: &str) -> &'a str {
    out.lines()
        .find_map(|line| line.strip_prefix(label))
        .unwrap_or_else(|| panic!("no line starting with {label:?} in:\n{out}"))
        .trim()
}

#[tokio::test]
async fn create_legacy_and_segwit_wallets() {
    let mut lab = Lab::new(LabSettings::default(), MemoryChainData::new());
    let out = run_script(&mut lab, "1\n2\n0\n").await;

    assert!(out.contains("--- NEW WALLET CREATED (LEGACY) ---"));
    assert!(out.contains("--- NEW WALLET CREATED (SEGWIT) ---"));
    assert!(out.contains("IMPORTANT: Save your private key in a secure place!"));

    let wallets = lab.wallets();
    assert_eq!(wallets.len(), 2);
    assert!(wallets[0].address.starts_with('1'));
    assert!(wallets[1].address.starts_with('3'));
    assert!(out.contains(&format!("Address: {}", wallets[0].address)));
    assert!(out.contains(&format!("Private key (WIF): {}", wallets[1].private_key.expose())));
}

#[tokio::test]
async fn native_segwit_style_is_honoured() {
    let settings = LabSettings {
        segwit_style: SegwitStyle::Native,
        ..LabSettings::default()
    };
    let mut lab = Lab::new(settings, MemoryChainData::new());
    run_script(&mut lab, "2\n0\n").await;
    assert!(lab.wallets()[0].address.starts_with("bc1q"));
}

#[tokio::test]
async fn balance_history_fee_and_price() {
    let mut lab = Lab::new(LabSettings::default(), market_data());
    let script = format!("3\n{WATCHED}\n4\n{WATCHED}\n5\n6\n0\n");
    let out = run_script(&mut lab, &script).await;

    assert!(out.contains("Balance: 240000 satoshis (0.00240000 BTC)"));
    assert!(out.contains("Confirmed: 250000 satoshis, pending: -10000 satoshis"));

    assert!(out.contains(&format!("Transaction history for {WATCHED}:")));
    assert!(out.contains(&format!("1. TxID: {} (confirmed in block 840000, +250000 sat)", "ab".repeat(32))));
    assert!(out.contains(&format!("2. TxID: {} (unconfirmed, -10000 sat)", "cd".repeat(32))));

    assert!(out.contains("Estimated fee: 16 sat/vB (target 1 block)"));
    assert!(out.contains("Current Bitcoin price: $67,187.12 USD"));
    assert!(out.contains("Goodbye!"));
}

#[tokio::test]
async fn lookups_for_unused_or_wrong_addresses() {
    let mut lab = Lab::new(LabSettings::default(), MemoryChainData::new());
    let script = format!("4\n{DESTINATION}\n3\ntb1qw508d6qejxtdg4y5r3zarvary0c5xw7kxpjzsx\n3\nhello\n0\n");
    let out = run_script(&mut lab, &script).await;

    assert!(out.contains(&format!("No transactions found for {DESTINATION}.")));
    assert!(out.contains("Error checking balance: tb1qw508d6qejxtdg4y5r3zarvary0c5xw7kxpjzsx is not a mainnet address"));
    assert!(out.contains("Error checking balance: invalid address: hello"));
}

#[tokio::test]
async fn failing_service_does_not_end_the_session() {
    let mut lab = Lab::new(LabSettings::default(), MemoryChainData::new().failing(503));
    let out = run_script(&mut lab, &format!("3\n{WATCHED}\n6\n0\n")).await;

    assert!(out.contains("Error checking balance:"));
    assert!(out.contains("Error fetching price:"));
    assert!(out.contains("HTTP 503"));
    assert!(out.contains("Goodbye!"));
}

#[tokio::test]
async fn simulate_with_synthetic_funding() {
    let mut lab = Lab::new(LabSettings::default(), market_data());
    let out = run_script(&mut lab, &format!("1\n7\n1\n{WATCHED}\n0.0015\n0\n")).await;

    let source = lab.wallets()[0].address.clone();
    assert!(out.contains(&format!("1. {source} (P2PKH (Legacy))")));
    assert!(out.contains("--- TRANSACTION SIMULATION ---"));
    assert_eq!(field(&out, "Source:"), source);
    assert_eq!(field(&out, "Destination:"), WATCHED);
    assert_eq!(field(&out, "Amount:"), "0.00150000 BTC");
    assert!(out.contains("synthetic input was used"));
    assert!(out.contains("NOTE: This is just a simulation, no actual transaction has been sent."));

    let preview = field(&out, "Transaction hex:");
    assert!(preview.ends_with("..."));
    assert_eq!(preview.len(), 67);
}

#[tokio::test]
async fn simulate_spends_real_coins_with_change() {
    let mut lab = Lab::new(LabSettings::default(), market_data());
    let source = lab.create_wallet(WalletFormat::SegWit).unwrap().address.clone();

    let data = std::mem::take(lab.data_mut());
    *lab.data_mut() = data.with_utxos(
        &source,
        vec![AddressUtxo {
            txid: "42".repeat(32),
            vout: 3,
            value_sat: 1_000_000,
            confirmed: true,
        }],
    );

    let out = run_script(&mut lab, &format!("7\n1\n{WATCHED}\n0.002\n0\n")).await;

    // 221 vB estimate at 16 sat/vB
    assert!(field(&out, "Fee:").starts_with("3536 satoshis (16 sat/vB"));
    assert_eq!(field(&out, "Change:"), "796464 satoshis");
    assert!(!out.contains("synthetic input"));
}

#[tokio::test]
async fn simulated_transaction_decodes() {
    let mut lab = Lab::new(LabSettings::default(), market_data());
    lab.create_wallet(WalletFormat::SegWit).unwrap();

    let sim = lab.simulate_transaction(1, WATCHED, "0.01").await.unwrap();
    let tx: Transaction = deserialize_hex(&sim.tx_hex).unwrap();

    assert_eq!(tx.compute_txid().to_string(), sim.txid);
    assert_eq!(tx.input.len(), 1);
    // payment + memo, change was folded into the fee
    assert_eq!(tx.output.len(), 2);
    assert_eq!(tx.output[0].value.to_sat(), 1_000_000);
    assert!(tx.output[1].script_pubkey.is_op_return());
    assert_eq!(tx.input[0].witness.len(), 2);
    assert!(!tx.input[0].script_sig.is_empty());
    assert_eq!(sim.fee_rate_sat_vbyte, 16);
}
