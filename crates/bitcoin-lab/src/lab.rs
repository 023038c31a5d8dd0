use chain_api::{AddressBalance, ApiError, PriceQuote, TxSummary};
use chain_btc::address::validate_address;
use chain_btc::amount::parse_btc_amount;
use chain_btc::transaction::estimate_fee;
use chain_btc::{BtcError, BtcNetwork};

use crate::error::LabError;
use crate::services::ChainData;
use crate::simulate::{build_simulation, synthetic_funding, wallet_coins, SIMULATION_MEMO};
use crate::types::{FeeQuote, LabWallet, SegwitStyle, SimulatedTransaction, WalletFormat};
use crate::wallet::{self, signing_key};

/// Session behaviour that does not depend on where data comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LabSettings {
    pub network: BtcNetwork,
    pub segwit_style: SegwitStyle,
    pub fee_target_blocks: u16,
    /// sat/vB for simulations when estimates are unavailable.
    pub fallback_fee_rate: u64,
    /// Fabricate a funding coin when the source address has none.
    pub synthetic_funding: bool,
}

impl Default for LabSettings {
    fn default() -> Self {
        Self {
            network: BtcNetwork::Mainnet,
            segwit_style: SegwitStyle::Nested,
            fee_target_blocks: 1,
            fallback_fee_rate: 2,
            synthetic_funding: true,
        }
    }
}

/// One interactive session: the wallets created so far plus a data source.
pub struct Lab<D> {
    settings: LabSettings,
    data: D,
    wallets: Vec<LabWallet>,
}

impl<D: ChainData> Lab<D> {
    pub fn new(settings: LabSettings, data: D) -> Self {
        Self {
            settings,
            data,
            wallets: Vec::new(),
        }
    }

    pub fn settings(&self) -> &LabSettings {
        &self.settings
    }

    pub fn data_mut(&mut self) -> &mut D {
        &mut self.data
    }

    pub fn wallets(&self) -> &[LabWallet] {
        &self.wallets
    }

    /// Generate a wallet and keep it for the rest of the session.
    pub fn create_wallet(&mut self, format: WalletFormat) -> Result<&LabWallet, LabError> {
        let wallet = wallet::create_wallet(format, self.settings.segwit_style, self.settings.network)?;
        self.wallets.push(wallet);
        self.wallets.last().ok_or(LabError::NoWallets)
    }

    pub async fn check_balance(&self, address: &str) -> Result<AddressBalance, LabError> {
        let address = self.checked_address(address)?;
        tracing::debug!(address, "fetching balance");
        Ok(self.data.balance(address).await?)
    }

    pub async fn transaction_history(&self, address: &str) -> Result<Vec<TxSummary>, LabError> {
        let address = self.checked_address(address)?;
        tracing::debug!(address, "fetching history");
        Ok(self.data.history(address).await?)
    }

    pub async fn estimate_fee(&self) -> Result<FeeQuote, LabError> {
        let estimates = self.data.fee_estimates().await?;
        let (target, rate) = estimates
            .rate_for_target(self.settings.fee_target_blocks)
            .ok_or_else(|| ApiError::InvalidResponse("no fee estimates returned".into()))?;
        let quote = FeeQuote::from_rate(target, rate);
        tracing::debug!(
            target,
            rate,
            sat_per_vbyte = quote.sat_per_vbyte,
            targets = estimates.targets().count(),
            "fee estimate"
        );
        Ok(quote)
    }

    pub async fn bitcoin_price(&self) -> Result<PriceQuote, LabError> {
        Ok(self.data.btc_price().await?)
    }

    /// Build and sign a payment from wallet `wallet_number` (1-based, as
    /// listed in the menu). The result is never broadcast.
    pub async fn simulate_transaction(
        &self,
        wallet_number: usize,
        destination: &str,
        amount_btc: &str,
    ) -> Result<SimulatedTransaction, LabError> {
        if self.wallets.is_empty() {
            return Err(LabError::NoWallets);
        }
        let source = wallet_number
            .checked_sub(1)
            .and_then(|i| self.wallets.get(i))
            .ok_or(LabError::InvalidSelection {
                selected: wallet_number,
                available: self.wallets.len(),
            })?;

        let network = self.settings.network;
        let destination = self.checked_address(destination)?;
        let amount_sat = parse_btc_amount(amount_btc)?;

        let fee_rate = match self.estimate_fee().await {
            Ok(quote) => quote.sat_per_vbyte,
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    fallback = self.settings.fallback_fee_rate,
                    "fee estimate unavailable, using fallback rate"
                );
                self.settings.fallback_fee_rate
            }
        };

        let reported = self.data.utxos(&source.address).await?;
        let (coins, synthetic) = if !reported.is_empty() {
            (wallet_coins(source, &reported, network)?, false)
        } else if self.settings.synthetic_funding {
            tracing::info!(address = %source.address, "no coins found, using synthetic funding");
            (vec![synthetic_funding(source, amount_sat, fee_rate, network)?], true)
        } else {
            let fee = estimate_fee(source.kind, 1, 2, Some(SIMULATION_MEMO.len()), fee_rate);
            let required_sat = amount_sat.checked_add(fee).ok_or_else(|| {
                BtcError::InvalidAmount(format!("{amount_sat} sat plus a {fee} sat fee overflows"))
            })?;
            return Err(BtcError::InsufficientFunds {
                available_sat: 0,
                required_sat,
            }
            .into());
        };

        let key = signing_key(source, network)?;
        let mut simulation =
            build_simulation(source, &key, destination, amount_sat, &coins, fee_rate, network)?;
        simulation.synthetic_funding = synthetic;

        tracing::info!(
            txid = %simulation.txid,
            fee_sat = simulation.fee_sat,
            synthetic,
            "simulated transaction"
        );
        Ok(simulation)
    }

    /// Trim `address` and require it to be valid for the session network.
    fn checked_address<'a>(&self, address: &'a str) -> Result<&'a str, LabError> {
        let address = address.trim();
        if address.is_empty() {
            return Err(LabError::InvalidAddress("address is empty".into()));
        }
        let network = self.settings.network;
        match validate_address(address, network) {
            Ok(true) => Ok(address),
            Ok(false) => Err(LabError::WrongNetwork {
                address: address.to_string(),
                network,
            }),
            Err(e) => {
                tracing::debug!(address, error = %e, "address rejected");
                Err(LabError::InvalidAddress(address.to_string()))
            }
        }
    }
}
