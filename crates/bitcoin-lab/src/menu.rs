use std::io::{BufRead, Write};

use chain_api::{AddressBalance, PriceQuote, TxSummary};
use chain_btc::amount::format_btc;

use crate::error::LabError;
use crate::lab::Lab;
use crate::services::ChainData;
use crate::types::{FeeQuote, LabWallet, SimulatedTransaction, WalletFormat};

const MENU: &str = "\n===== BITCOIN LABORATORY =====
1. Create new Bitcoin wallet (Legacy)
2. Create new Bitcoin wallet (SegWit)
3. Check address balance
4. Check transaction history
5. Estimate current network fee
6. Check current Bitcoin price
7. Simulate transaction
0. Exit
==============================";

const DISCLAIMER: &str =
    "Educational tool: generated keys and simulated transactions are not for real funds.";
const GOODBYE: &str = "\nThank you for using the Bitcoin Laboratory. Goodbye!";
const INVALID_OPTION: &str = "\nInvalid option. Please select a valid option.";
const INVALID_NUMBER: &str = "Invalid input. Please enter a valid number.";
const NO_WALLETS: &str = "\nYou must create at least one wallet first (option 1 or 2).";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MenuOptions {
    /// Wait for Enter after each action.
    pub pause: bool,
}

impl Default for MenuOptions {
    fn default() -> Self {
        Self { pause: true }
    }
}

/// Drive the interactive menu until the user exits or input ends.
///
/// Operation failures are printed and the loop continues; only console
/// I/O errors end the session early.
pub async fn run<D, R, W>(
    lab: &mut Lab<D>,
    input: &mut R,
    output: &mut W,
    options: &MenuOptions,
) -> Result<(), LabError>
where
    D: ChainData,
    R: BufRead,
    W: Write,
{
    writeln!(output, "{DISCLAIMER}")?;

    loop {
        writeln!(output, "{MENU}")?;
        let Some(choice) = prompt(input, output, "\nSelect an option: ")? else {
            writeln!(output, "{GOODBYE}")?;
            return Ok(());
        };

        match choice.as_str() {
            "1" => create_wallet(lab, output, WalletFormat::Legacy)?,
            "2" => create_wallet(lab, output, WalletFormat::SegWit)?,
            "3" => check_balance(lab, input, output).await?,
            "4" => transaction_history(lab, input, output).await?,
            "5" => estimate_fee(lab, output).await?,
            "6" => bitcoin_price(lab, output).await?,
            "7" => simulate_transaction(lab, input, output).await?,
            "0" => {
                writeln!(output, "{GOODBYE}")?;
                return Ok(());
            }
            other => {
                tracing::debug!(choice = other, "unknown menu option");
                writeln!(output, "{INVALID_OPTION}")?;
            }
        }

        if options.pause && prompt(input, output, "\nPress Enter to continue...")?.is_none() {
            writeln!(output, "{GOODBYE}")?;
            return Ok(());
        }
    }
}

/// Print `message` and read one trimmed line; `None` at end of input.
fn prompt<R: BufRead, W: Write>(
    input: &mut R,
    output: &mut W,
    message: &str,
) -> Result<Option<String>, LabError> {
    write!(output, "{message}")?;
    output.flush()?;

    let mut line = String::new();
    if input.read_line(&mut line)? == 0 {
        return Ok(None);
    }
    Ok(Some(line.trim().to_string()))
}

fn create_wallet<D: ChainData, W: Write>(
    lab: &mut Lab<D>,
    output: &mut W,
    format: WalletFormat,
) -> Result<(), LabError> {
    match lab.create_wallet(format) {
        Ok(wallet) => print_wallet(output, wallet),
        Err(e) => report(output, "creating wallet", &e),
    }
}

async fn check_balance<D: ChainData, R: BufRead, W: Write>(
    lab: &Lab<D>,
    input: &mut R,
    output: &mut W,
) -> Result<(), LabError> {
    let address = prompt(input, output, "Enter Bitcoin address: ")?.unwrap_or_default();
    match lab.check_balance(&address).await {
        Ok(balance) => print_balance(output, &balance),
        Err(e) => report(output, "checking balance", &e),
    }
}

async fn transaction_history<D: ChainData, R: BufRead, W: Write>(
    lab: &Lab<D>,
    input: &mut R,
    output: &mut W,
) -> Result<(), LabError> {
    let address = prompt(input, output, "Enter Bitcoin address: ")?.unwrap_or_default();
    match lab.transaction_history(&address).await {
        Ok(history) => print_history(output, &address, &history),
        Err(e) => report(output, "fetching transaction history", &e),
    }
}

async fn estimate_fee<D: ChainData, W: Write>(lab: &Lab<D>, output: &mut W) -> Result<(), LabError> {
    match lab.estimate_fee().await {
        Ok(quote) => print_fee(output, &quote),
        Err(e) => report(output, "estimating fee", &e),
    }
}

async fn bitcoin_price<D: ChainData, W: Write>(lab: &Lab<D>, output: &mut W) -> Result<(), LabError> {
    match lab.bitcoin_price().await {
        Ok(quote) => print_price(output, &quote),
        Err(e) => report(output, "fetching price", &e),
    }
}

async fn simulate_transaction<D: ChainData, R: BufRead, W: Write>(
    lab: &Lab<D>,
    input: &mut R,
    output: &mut W,
) -> Result<(), LabError> {
    if lab.wallets().is_empty() {
        writeln!(output, "{NO_WALLETS}")?;
        return Ok(());
    }

    writeln!(output, "\nAvailable wallets:")?;
    for (i, wallet) in lab.wallets().iter().enumerate() {
        writeln!(output, "{}. {} ({})", i + 1, wallet.address, wallet.label())?;
    }

    let selection = prompt(input, output, "\nSelect source wallet (number): ")?.unwrap_or_default();
    let Ok(number) = selection.parse::<usize>() else {
        writeln!(output, "{INVALID_NUMBER}")?;
        return Ok(());
    };
    if number == 0 || number > lab.wallets().len() {
        writeln!(output, "Invalid selection.")?;
        return Ok(());
    }

    let destination = prompt(input, output, "Enter destination address: ")?.unwrap_or_default();
    let amount = prompt(input, output, "Enter amount in BTC: ")?.unwrap_or_default();

    match lab.simulate_transaction(number, &destination, &amount).await {
        Ok(simulation) => print_simulation(output, &simulation),
        Err(e) => report(output, "simulating transaction", &e),
    }
}

fn report<W: Write>(output: &mut W, doing: &str, error: &LabError) -> Result<(), LabError> {
    tracing::warn!(error = %error, "{doing} failed");
    writeln!(output, "\nError {doing}: {error}")?;
    Ok(())
}

fn print_wallet<W: Write>(output: &mut W, wallet: &LabWallet) -> Result<(), LabError> {
    writeln!(output, "\n--- NEW WALLET CREATED ({}) ---", wallet.format.banner_name())?;
    writeln!(output, "Address: {}", wallet.address)?;
    writeln!(output, "Type: {}", wallet.label())?;
    writeln!(output, "Private key (WIF): {}", wallet.private_key.expose())?;
    writeln!(output, "IMPORTANT: Save your private key in a secure place!")?;
    writeln!(output, "WARNING: This key is for experiments only. Do not send real funds to it.")?;
    Ok(())
}

fn print_balance<W: Write>(output: &mut W, balance: &AddressBalance) -> Result<(), LabError> {
    let total = balance.total_sat();
    writeln!(output, "\nBalance: {total} satoshis ({} BTC)", format_btc(total))?;
    if balance.pending_sat != 0 {
        writeln!(
            output,
            "  Confirmed: {} satoshis, pending: {:+} satoshis",
            balance.confirmed_sat, balance.pending_sat
        )?;
    }
    Ok(())
}

fn print_history<W: Write>(output: &mut W, address: &str, history: &[TxSummary]) -> Result<(), LabError> {
    let address = address.trim();
    if history.is_empty() {
        writeln!(output, "\nNo transactions found for {address}.")?;
        return Ok(());
    }

    writeln!(output, "\nTransaction history for {address}:")?;
    for (i, tx) in history.iter().enumerate() {
        let status = match (tx.confirmed, tx.block_height) {
            (true, Some(height)) => format!("confirmed in block {height}"),
            (true, None) => "confirmed".to_string(),
            (false, _) => "unconfirmed".to_string(),
        };
        writeln!(output, "{}. TxID: {} ({status}, {:+} sat)", i + 1, tx.txid, tx.net_sat)?;
    }
    Ok(())
}

fn print_fee<W: Write>(output: &mut W, quote: &FeeQuote) -> Result<(), LabError> {
    let blocks = if quote.target_blocks == 1 { "block" } else { "blocks" };
    writeln!(
        output,
        "\nEstimated fee: {} sat/vB (target {} {blocks})",
        quote.sat_per_vbyte, quote.target_blocks
    )?;
    Ok(())
}

fn print_price<W: Write>(output: &mut W, quote: &PriceQuote) -> Result<(), LabError> {
    tracing::debug!(source = %quote.source, price = quote.price, "price quote");
    let symbol = if quote.currency == "USD" { "$" } else { "" };
    writeln!(
        output,
        "\nCurrent Bitcoin price: {symbol}{} {}",
        format_fiat(quote.price),
        quote.currency
    )?;
    Ok(())
}

fn print_simulation<W: Write>(output: &mut W, sim: &SimulatedTransaction) -> Result<(), LabError> {
    writeln!(output, "\n--- TRANSACTION SIMULATION ---")?;
    writeln!(output, "Source: {}", sim.source)?;
    writeln!(output, "Destination: {}", sim.destination)?;
    writeln!(output, "Amount: {} BTC", format_btc(sim.amount_sat as i64))?;
    writeln!(output, "Fee: {} satoshis ({} sat/vB, {} vB)", sim.fee_sat, sim.fee_rate_sat_vbyte, sim.vsize)?;
    if sim.change_sat > 0 {
        writeln!(output, "Change: {} satoshis", sim.change_sat)?;
    }
    writeln!(output, "TxID: {}", sim.txid)?;
    writeln!(output, "Transaction hex: {}", sim.tx_hex_preview())?;
    if sim.synthetic_funding {
        writeln!(
            output,
            "Funding: the source address has no coins, so a synthetic input was used."
        )?;
    }
    writeln!(output, "NOTE: This is just a simulation, no actual transaction has been sent.")?;
    Ok(())
}

/// Two decimals with comma thousands separators, e.g. `67,187.12`.
pub fn format_fiat(amount: f64) -> String {
    let cents = (amount.abs() * 100.0).round() as u64;
    let whole = (cents / 100).to_string();

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, digit) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }

    let sign = if amount < 0.0 && cents > 0 { "-" } else { "" };
    format!("{sign}{grouped}.{:02}", cents % 100)
}
