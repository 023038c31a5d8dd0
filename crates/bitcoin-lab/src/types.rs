use std::fmt;
use std::str::FromStr;

use chain_btc::transaction::MAX_FEE_RATE_SAT_VBYTE;
use chain_btc::ScriptKind;
use crypto_utils::ZeroizingString;

use crate::error::LabError;

/// Address family chosen from the menu.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WalletFormat {
    Legacy,
    SegWit,
}

impl WalletFormat {
    pub fn script_kind(self, segwit_style: SegwitStyle) -> ScriptKind {
        match self {
            WalletFormat::Legacy => ScriptKind::P2pkh,
            WalletFormat::SegWit => segwit_style.script_kind(),
        }
    }

    /// Upper-case name used in menu banners.
    pub fn banner_name(self) -> &'static str {
        match self {
            WalletFormat::Legacy => "LEGACY",
            WalletFormat::SegWit => "SEGWIT",
        }
    }
}

/// How SegWit wallets encode their address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SegwitStyle {
    /// P2SH-wrapped P2WPKH (`3...`).
    #[default]
    Nested,
    /// Bech32 P2WPKH (`bc1q...`).
    Native,
}

impl SegwitStyle {
    pub fn script_kind(self) -> ScriptKind {
        match self {
            SegwitStyle::Nested => ScriptKind::P2shP2wpkh,
            SegwitStyle::Native => ScriptKind::P2wpkh,
        }
    }
}

impl fmt::Display for SegwitStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SegwitStyle::Nested => write!(f, "nested"),
            SegwitStyle::Native => write!(f, "native"),
        }
    }
}

impl FromStr for SegwitStyle {
    type Err = LabError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "nested" | "p2sh-p2wpkh" => Ok(SegwitStyle::Nested),
            "native" | "p2wpkh" | "bech32" => Ok(SegwitStyle::Native),
            other => Err(LabError::Config(format!(
                "unknown segwit style '{other}' (expected nested or native)"
            ))),
        }
    }
}

/// A key pair created during this session. Lives in memory only.
#[derive(Debug, Clone)]
pub struct LabWallet {
    pub address: String,
    /// WIF, zeroed on drop.
    pub private_key: ZeroizingString,
    pub kind: ScriptKind,
    pub format: WalletFormat,
}

impl LabWallet {
    pub fn label(&self) -> &'static str {
        self.kind.label()
    }
}

/// Fee rate chosen for the configured confirmation target.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FeeQuote {
    /// Whole sat/vB, rounded up, at least 1, capped at the build limit.
    pub sat_per_vbyte: u64,
    /// Target the rate was taken from; may differ from the requested one.
    pub target_blocks: u16,
    /// Rate as reported by the server.
    pub raw_rate: f64,
}

impl FeeQuote {
    /// Rounds up and clamps to `1..=MAX_FEE_RATE_SAT_VBYTE`.
    pub fn from_rate(target_blocks: u16, raw_rate: f64) -> Self {
        Self {
            sat_per_vbyte: (raw_rate.ceil() as u64).clamp(1, MAX_FEE_RATE_SAT_VBYTE),
            target_blocks,
            raw_rate,
        }
    }
}

/// A signed transaction that was built but never broadcast.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimulatedTransaction {
    pub source: String,
    pub destination: String,
    pub amount_sat: u64,
    pub fee_sat: u64,
    pub change_sat: u64,
    pub fee_rate_sat_vbyte: u64,
    pub txid: String,
    pub tx_hex: String,
    pub vsize: usize,
    /// True when the input was fabricated because the source had no coins.
    pub synthetic_funding: bool,
}

impl SimulatedTransaction {
    const PREVIEW_CHARS: usize = 64;

    /// First 64 hex characters followed by `...`.
    pub fn tx_hex_preview(&self) -> String {
        let end = self.tx_hex.len().min(Self::PREVIEW_CHARS);
        format!("{}...", &self.tx_hex[..end])
    }
}
