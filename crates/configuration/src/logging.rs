use crate::error::ConfigError;
use crate::settings::LoggingConfig;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

/// Installs the global stderr subscriber.
///
/// `RUST_LOG` takes precedence over `config.level`. Library users that want their
/// log output somewhere else install their own subscriber and skip this call.
pub fn init_tracing(config: &LoggingConfig) -> Result<(), ConfigError> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.level))
        .map_err(|e| ConfigError::LoggingError(e.to_string()))?;

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(config.with_target)
        .with_writer(std::io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .map_err(|e| ConfigError::LoggingError(e.to_string()))
}
