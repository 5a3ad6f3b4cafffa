use crate::envelope::RpcEnvelope;
use crate::error::ConnectorError;
use async_trait::async_trait;
use configuration::ConnectorConfig;
use reqwest::{Client, StatusCode};
use url::Url;

/// Sends one serialized envelope and hands back the raw response body.
///
/// The connector only ever talks to the network through this trait, which lets
/// tests swap the HTTP implementation for a scripted one.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send_request(
        &self,
        endpoint: &Url,
        payload: &RpcEnvelope,
    ) -> Result<String, ConnectorError>;
}

/// The `reqwest`-backed transport used against the real service.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    pub fn new(config: &ConnectorConfig) -> Result<Self, ConnectorError> {
        // No idle connections are kept, so every call opens and releases its own.
        let mut builder = Client::builder().pool_max_idle_per_host(0);

        if config.accept_invalid_certs {
            tracing::warn!(
                endpoint = %config.endpoint,
                "TLS certificate verification is disabled for this connector."
            );
            builder = builder.danger_accept_invalid_certs(true);
        }
        if let Some(timeout) = config.timeout() {
            builder = builder.timeout(timeout);
        }

        Ok(Self {
            client: builder.build()?,
        })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send_request(
        &self,
        endpoint: &Url,
        payload: &RpcEnvelope,
    ) -> Result<String, ConnectorError> {
        tracing::info!(method = %payload.method, "sending request (method {}) ...", payload.method);

        let response = self.client.post(endpoint.clone()).json(payload).send().await?;
        let status = response.status();

        // Only a plain 200 counts; the body of any other answer is never read.
        if status != StatusCode::OK {
            return Err(ConnectorError::Transport {
                code: status.as_u16(),
                message: status.canonical_reason().unwrap_or_default().to_string(),
            });
        }

        let body = response.text().await?;
        tracing::debug!(method = %payload.method, bytes = body.len(), "received response");
        Ok(body)
    }
}
