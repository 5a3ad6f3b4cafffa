use crate::error::ConfigError;
use std::path::Path;

// Declare the modules that make up this crate.
pub mod error;
pub mod logging;
pub mod settings;

// Re-export the core types to provide a clean public API.
pub use logging::init_tracing;
pub use settings::{ConnectorConfig, LoggingConfig, Settings};

/// Name of the configuration file looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "connector.toml";

/// Loads the application configuration from `connector.toml` and the environment.
///
/// The file is optional so a connector can be configured entirely through
/// `WEBTREKK_CONNECTOR__*` variables.
pub fn load_config() -> Result<Settings, ConfigError> {
    build(config::File::with_name(DEFAULT_CONFIG_FILE).required(false))
}

/// Loads the application configuration from an explicit file path.
pub fn load_config_from(path: impl AsRef<Path>) -> Result<Settings, ConfigError> {
    build(config::File::from(path.as_ref()).required(true))
}

fn build<S>(file: S) -> Result<Settings, ConfigError>
where
    S: config::Source + Send + Sync + 'static,
{
    let builder = config::Config::builder()
        .add_source(file)
        // e.g. WEBTREKK_CONNECTOR__PWD overrides `connector.pwd`
        .add_source(
            config::Environment::with_prefix("WEBTREKK")
                .prefix_separator("_")
                .separator("__"),
        )
        .build()?;

    // Attempt to deserialize the entire configuration into our `Settings` struct
    let settings = builder.try_deserialize::<Settings>()?;
    settings.connector.validate()?;

    Ok(settings)
}
