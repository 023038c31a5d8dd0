use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use crate::error::LabError;

/// Install the global subscriber. Events go to stderr so the menu on
/// stdout stays readable. `RUST_LOG` overrides `default_level`.
pub fn init_logging(default_level: &str) -> Result<(), LabError> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(default_level)
            .map_err(|e| LabError::Logging(format!("invalid log level '{default_level}': {e}")))?,
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false),
        )
        .try_init()
        .map_err(|e| LabError::Logging(e.to_string()))
}
