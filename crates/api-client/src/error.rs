use configuration::error::ConfigError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConnectorError {
    /// The endpoint answered with anything other than HTTP 200.
    #[error("The API endpoint returned HTTP {code} {message}")]
    Transport { code: u16, message: String },

    #[error("Malformed JSON-RPC response: {0}")]
    Protocol(String),

    #[error("`{method}` returned an empty result")]
    EmptyResult { method: String },

    #[error("Failed to perform the HTTP request: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Invalid connector configuration: {0}")]
    InvalidConfig(#[from] ConfigError),

    #[error("Invalid API endpoint: {0}")]
    InvalidEndpoint(#[from] url::ParseError),

    #[error("Unsupported endpoint scheme `{0}`, expected http or https")]
    UnsupportedScheme(String),

    #[error("Failed to serialize the request parameters: {0}")]
    Encode(#[source] serde_json::Error),
}
