//! Bitcoin Laboratory: an interactive menu for creating throwaway wallets,
//! looking up balances, history, fees and prices, and building signed
//! transactions that are never broadcast.

pub mod config;
pub mod error;
pub mod lab;
pub mod logging;
pub mod menu;
pub mod services;
pub mod simulate;
pub mod types;
pub mod wallet;

pub use config::LabConfig;
pub use error::LabError;
pub use lab::{Lab, LabSettings};
pub use menu::MenuOptions;
pub use services::{ChainData, LiveChainData, MemoryChainData};
pub use types::{FeeQuote, LabWallet, SegwitStyle, SimulatedTransaction, WalletFormat};

// ─── Session entry point ─────────────────────────────────────────────

/// Run a whole menu session on stdin/stdout with `data` as the source.
pub async fn run_session<D: ChainData>(config: &LabConfig, data: D) -> Result<(), LabError> {
    let mut lab = Lab::new(config.lab_settings(), data);
    let options = MenuOptions {
        pause: !config.no_pause,
    };

    let stdin = std::io::stdin();
    let stdout = std::io::stdout();
    let mut input = stdin.lock();
    let mut output = stdout.lock();
    menu::run(&mut lab, &mut input, &mut output, &options).await
}
