use bitcoin::{Amount, Denomination};

use crate::error::BtcError;

pub const SATS_PER_BTC: u64 = 100_000_000;

/// Payments below this value are rejected; change at or below it is left
/// to the miner instead of creating an output.
pub const DUST_LIMIT_SAT: u64 = 546;

/// Parse a decimal BTC amount (`"0.0015"`) into satoshis.
///
/// At most 8 decimal places; zero, negative and above-supply amounts are
/// rejected.
pub fn parse_btc_amount(input: &str) -> Result<u64, BtcError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(BtcError::InvalidAmount("amount is empty".into()));
    }
    let amount = Amount::from_str_in(trimmed, Denomination::Bitcoin)
        .map_err(|e| BtcError::InvalidAmount(format!("'{trimmed}': {e}")))?;
    if amount == Amount::ZERO {
        return Err(BtcError::InvalidAmount("amount must be greater than zero".into()));
    }
    if amount > Amount::MAX_MONEY {
        return Err(BtcError::InvalidAmount(format!(
            "'{trimmed}' exceeds the 21,000,000 BTC supply"
        )));
    }
    Ok(amount.to_sat())
}

/// Render satoshis as an exact BTC decimal with 8 places.
pub fn format_btc(sat: i64) -> String {
    let sign = if sat < 0 { "-" } else { "" };
    let abs = sat.unsigned_abs();
    format!("{sign}{}.{:08}", abs / SATS_PER_BTC, abs % SATS_PER_BTC)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_whole_and_fractional_btc() {
        assert_eq!(parse_btc_amount("1").unwrap(), 100_000_000);
        assert_eq!(parse_btc_amount("0.0015").unwrap(), 150_000);
        assert_eq!(parse_btc_amount(" 0.00000546 ").unwrap(), 546);
    }

    #[test]
    fn rejects_more_than_eight_decimals() {
        assert!(parse_btc_amount("0.000000001").is_err());
    }

    #[test]
    fn rejects_zero_negative_and_garbage() {
        assert!(parse_btc_amount("0").is_err());
        assert!(parse_btc_amount("-0.1").is_err());
        assert!(parse_btc_amount("abc").is_err());
        assert!(parse_btc_amount("").is_err());
    }

    #[test]
    fn rejects_amounts_above_money_supply() {
        assert_eq!(parse_btc_amount("21000000").unwrap(), 2_100_000_000_000_000);
        assert!(matches!(
            parse_btc_amount("21000000.00000001"),
            Err(BtcError::InvalidAmount(_))
        ));
        assert!(parse_btc_amount("50000000").is_err());
        assert!(parse_btc_amount("184467440737.09551615").is_err());
    }

    #[test]
    fn formats_exactly() {
        assert_eq!(format_btc(0), "0.00000000");
        assert_eq!(format_btc(150_000), "0.00150000");
        assert_eq!(format_btc(2_100_000_000_000_000), "21000000.00000000");
        assert_eq!(format_btc(-5_000), "-0.00005000");
    }
}
