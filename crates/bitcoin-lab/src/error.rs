use chain_api::ApiError;
use chain_btc::{BtcError, BtcNetwork};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LabError {
    #[error(transparent)]
    Btc(#[from] BtcError),

    #[error(transparent)]
    Api(#[from] ApiError),

    #[error("invalid address: {0}")]
    InvalidAddress(String),

    #[error("{address} is not a {network} address")]
    WrongNetwork { address: String, network: BtcNetwork },

    #[error("no wallets have been created in this session")]
    NoWallets,

    #[error("wallet {selected} does not exist (choose 1 to {available})")]
    InvalidSelection { selected: usize, available: usize },

    #[error("configuration error: {0}")]
    Config(String),

    #[error("logging setup failed: {0}")]
    Logging(String),

    #[error("console i/o failed: {0}")]
    Io(#[from] std::io::Error),
}
