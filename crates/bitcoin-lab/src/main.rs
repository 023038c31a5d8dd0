use std::process::ExitCode;

use bitcoin_lab::logging::init_logging;
use bitcoin_lab::{run_session, LabConfig, LabError, LiveChainData, MemoryChainData};
use clap::Parser;

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    dotenv::dotenv().ok();
    let config = LabConfig::parse();

    match start(config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("bitcoin-lab: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn start(config: LabConfig) -> Result<(), LabError> {
    config.validate()?;
    init_logging(&config.log_level)?;

    tracing::info!(
        network = %config.network,
        segwit_style = %config.segwit_style,
        offline = config.offline,
        "starting bitcoin lab"
    );

    if config.offline {
        run_session(&config, MemoryChainData::new()).await
    } else {
        let data = LiveChainData::from_config(&config)?;
        run_session(&config, data).await
    }
}
