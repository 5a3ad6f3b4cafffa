use crate::error::ConfigError;
use serde::Deserialize;
use std::fmt;
use std::time::Duration;

/// The root configuration structure for the connector application.
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub connector: ConnectorConfig,
    #[serde(default)] // Use default values if the [logging] section is missing
    pub logging: LoggingConfig,
}

/// Everything the connector needs to reach and authenticate against the JSON-RPC API.
///
/// Supplied once when the connector is built and never mutated afterwards.
#[derive(Clone, Deserialize)]
pub struct ConnectorConfig {
    /// The API endpoint, e.g. `https://xyz.webtrekk.com/cgi-bin/wt/JSONRPC.cgi`.
    pub endpoint: String,
    /// The user name to log in with.
    pub user: String,
    /// The password for `user`.
    pub pwd: String,
    /// The customer id used for all requests.
    /// If not set, the id of the first account returned by `getAccountList` is used.
    #[serde(default)]
    pub customer_id: Option<String>,
    /// Disables TLS certificate verification. Off unless explicitly enabled.
    #[serde(default)]
    pub accept_invalid_certs: bool,
    /// Upper bound for a single request, in seconds. No timeout when absent.
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

impl ConnectorConfig {
    pub fn new(
        endpoint: impl Into<String>,
        user: impl Into<String>,
        pwd: impl Into<String>,
    ) -> Self {
        Self {
            endpoint: endpoint.into(),
            user: user.into(),
            pwd: pwd.into(),
            customer_id: None,
            accept_invalid_certs: false,
            timeout_secs: None,
        }
    }

    pub fn with_customer_id(mut self, customer_id: impl Into<String>) -> Self {
        self.customer_id = Some(customer_id.into());
        self
    }

    pub fn with_accept_invalid_certs(mut self, accept: bool) -> Self {
        self.accept_invalid_certs = accept;
        self
    }

    /// Sets the request timeout. Fractions of a second round up to the next second.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        let secs = timeout.as_secs() + u64::from(timeout.subsec_nanos() > 0);
        self.timeout_secs = Some(secs);
        self
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }

    /// Checks that the required fields are present.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.endpoint.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "`endpoint` must not be empty".to_string(),
            ));
        }
        if self.user.trim().is_empty() {
            return Err(ConfigError::ValidationError("`user` must not be empty".to_string()));
        }
        if self.pwd.is_empty() {
            return Err(ConfigError::ValidationError("`pwd` must not be empty".to_string()));
        }
        if matches!(self.customer_id.as_deref(), Some(id) if id.trim().is_empty()) {
            return Err(ConfigError::ValidationError(
                "`customer_id` must not be empty when set".to_string(),
            ));
        }
        if self.timeout_secs == Some(0) {
            return Err(ConfigError::ValidationError(
                "`timeout_secs` must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

// The password never ends up in logs.
impl fmt::Debug for ConnectorConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectorConfig")
            .field("endpoint", &self.endpoint)
            .field("user", &self.user)
            .field("pwd", &"***")
            .field("customer_id", &self.customer_id)
            .field("accept_invalid_certs", &self.accept_invalid_certs)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

/// Controls the stderr log output installed by `init_tracing`.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default filter directive, used when `RUST_LOG` is not set.
    pub level: String,
    /// Include the module path of each event.
    pub with_target: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            with_target: false,
        }
    }
}
