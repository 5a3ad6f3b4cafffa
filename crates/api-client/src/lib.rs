//! # Webtrekk API Client Crate
//!
//! A connector for the Webtrekk / Mapp Analytics JSON-RPC API. The `Connector`
//! hides the stateless remote protocol behind a handful of typed operations and
//! keeps the session state (customer id and token) the remote calls depend on.
//!
//! Every operation goes through `Connector::call_method`, which wraps a method name
//! and its parameters into an `RpcEnvelope`, posts it through a `Transport`, and
//! unwraps the `result` field of the response.
use crate::auth::Credentials;
use crate::envelope::{AnalysisParams, NoParams, TokenParams, extract_result, methods};
use configuration::ConnectorConfig;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use url::Url;

pub mod auth;
pub mod envelope;
pub mod error;
pub mod responses;
pub mod transport;
// --- Public API ---
pub use envelope::RpcEnvelope;
pub use error::ConnectorError;
pub use responses::{Account, Token};
pub use transport::{HttpTransport, Transport};

/// A stateful client for one user session against the analytics endpoint.
///
/// The session starts unauthenticated; `login` stores the token that the analysis
/// calls send along. The connector never checks for a token itself: calling
/// `request_analysis` before `login` sends `token: null` and the remote service
/// is expected to reject it.
#[derive(Debug)]
pub struct Connector<T = HttpTransport> {
    transport: T,
    endpoint: Url,
    credentials: Credentials,
    customer_id: Option<Value>,
    token: Option<Token>,
}

impl Connector<HttpTransport> {
    /// Creates a connector that talks HTTP(S) to `config.endpoint`.
    pub fn new(config: &ConnectorConfig) -> Result<Self, ConnectorError> {
        config.validate()?;
        let transport = HttpTransport::new(config)?;
        Self::with_transport(config, transport)
    }
}

impl<T: Transport> Connector<T> {
    /// Creates a connector on top of an arbitrary transport.
    pub fn with_transport(config: &ConnectorConfig, transport: T) -> Result<Self, ConnectorError> {
        config.validate()?;
        let endpoint = Url::parse(&config.endpoint)?;
        if !matches!(endpoint.scheme(), "http" | "https") {
            return Err(ConnectorError::UnsupportedScheme(endpoint.scheme().to_string()));
        }

        tracing::info!(endpoint = %endpoint, "Connector set up for {}.", endpoint);

        Ok(Self {
            transport,
            endpoint,
            credentials: Credentials::new(config.user.clone(), config.pwd.clone()),
            customer_id: config.customer_id.clone().map(Value::String),
            token: None,
        })
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// The configured customer id, or the one adopted by the last `get_token`.
    pub fn customer_id(&self) -> Option<&Value> {
        self.customer_id.as_ref()
    }

    /// The token stored by the last successful `login`.
    pub fn token(&self) -> Option<&Token> {
        self.token.as_ref()
    }

    pub fn is_authenticated(&self) -> bool {
        self.token.is_some()
    }

    /// Calls a remote method and returns the `result` field of its response.
    ///
    /// Use `serde_json::Value` as `R` to get the result untyped.
    pub async fn call_method<P, R>(&self, method: &str, params: &P) -> Result<R, ConnectorError>
    where
        P: Serialize,
        R: DeserializeOwned,
    {
        tracing::info!(method, "call_method: {}", method);
        let payload = RpcEnvelope::new(method, params)?;
        let body = self.transport.send_request(&self.endpoint, &payload).await?;
        extract_result(&body)
    }

    /// Calls `getConnectionTest`.
    pub async fn test_connection(&self) -> Result<Value, ConnectorError> {
        self.call_method(methods::GET_CONNECTION_TEST, &NoParams {}).await
    }

    /// Lists the accounts available to the configured user.
    pub async fn list_accounts(&self) -> Result<Vec<Account>, ConnectorError> {
        self.call_method(methods::GET_ACCOUNT_LIST, &self.credentials.account_list_params())
            .await
    }

    /// Returns the first account of `list_accounts`.
    pub async fn first_account(&self) -> Result<Account, ConnectorError> {
        self.list_accounts()
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| ConnectorError::EmptyResult {
                method: methods::GET_ACCOUNT_LIST.to_string(),
            })
    }

    /// Requests a session token via the remote `login` method.
    ///
    /// Without a configured customer id, the id of the first account is adopted
    /// first and kept for the lifetime of the connector.
    pub async fn get_token(&mut self) -> Result<Token, ConnectorError> {
        let customer_id = match self.customer_id.clone() {
            Some(id) => id,
            None => {
                let account = self.first_account().await?;
                tracing::info!(
                    customer_id = %account.customer_id,
                    "Using the first account's customer id."
                );
                self.customer_id = Some(account.customer_id.clone());
                account.customer_id
            }
        };

        let params = self.credentials.login_params(&customer_id);
        self.call_method(methods::LOGIN, &params).await
    }

    /// Logs in and stores the returned token for the following calls.
    ///
    /// Every call issues a fresh remote login and replaces the stored token.
    pub async fn login(&mut self) -> Result<Token, ConnectorError> {
        let token = self.get_token().await?;
        self.token = Some(token.clone());
        Ok(token)
    }

    /// Calls `getAnalysisData` with the current token and `analysis_config` as is.
    pub async fn request_analysis<A: Serialize>(
        &self,
        analysis_config: &A,
    ) -> Result<Value, ConnectorError> {
        let params = AnalysisParams {
            token: self.token.as_ref().map(Token::as_value),
            analysis_config,
        };
        self.call_method(methods::GET_ANALYSIS_DATA, &params).await
    }

    /// Calls `getAnalysisObjectsAndMetricsList` with the current token.
    pub async fn list_analysis_objects_and_metrics(&self) -> Result<Value, ConnectorError> {
        let params = TokenParams {
            token: self.token.as_ref().map(Token::as_value),
        };
        self.call_method(methods::GET_ANALYSIS_OBJECTS_AND_METRICS_LIST, &params)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use serde_json::json;
    use std::collections::HashMap;
    use std::sync::Mutex;

    #[derive(Debug)]
    enum Reply {
        Body(String),
        Status(u16, &'static str),
    }

    /// Answers each method with a scripted reply and records every envelope sent.
    #[derive(Debug, Default)]
    struct ScriptedTransport {
        replies: HashMap<String, Reply>,
        sent: Mutex<Vec<RpcEnvelope>>,
    }

    impl ScriptedTransport {
        fn reply(mut self, method: &str, body: Value) -> Self {
            self.replies.insert(method.to_string(), Reply::Body(body.to_string()));
            self
        }

        fn reply_raw(mut self, method: &str, body: &str) -> Self {
            self.replies.insert(method.to_string(), Reply::Body(body.to_string()));
            self
        }

        fn fail(mut self, method: &str, code: u16, message: &'static str) -> Self {
            self.replies.insert(method.to_string(), Reply::Status(code, message));
            self
        }

        fn sent(&self) -> Vec<RpcEnvelope> {
            self.sent.lock().unwrap().clone()
        }

        fn sent_methods(&self) -> Vec<String> {
            self.sent().into_iter().map(|e| e.method).collect()
        }
    }

    #[async_trait]
    impl Transport for ScriptedTransport {
        async fn send_request(
            &self,
            _endpoint: &Url,
            payload: &RpcEnvelope,
        ) -> Result<String, ConnectorError> {
            self.sent.lock().unwrap().push(payload.clone());
            match self.replies.get(&payload.method) {
                Some(Reply::Body(body)) => Ok(body.clone()),
                Some(Reply::Status(code, message)) => Err(ConnectorError::Transport {
                    code: *code,
                    message: message.to_string(),
                }),
                None => panic!("unexpected method {}", payload.method),
            }
        }
    }

    fn config() -> ConnectorConfig {
        ConnectorConfig::new("https://example.test/api", "u", "p")
    }

    fn connector(transport: ScriptedTransport) -> Connector<ScriptedTransport> {
        Connector::with_transport(&config(), transport).unwrap()
    }

    fn script() -> ScriptedTransport {
        ScriptedTransport::default()
    }

    #[tokio::test]
    async fn call_method_sends_envelope_and_returns_result() {
        let connector = connector(script().reply("getSomething", json!({ "result": { "a": 1 } })));

        let result: Value = connector
            .call_method("getSomething", &json!({ "x": [1, 2] }))
            .await
            .unwrap();

        assert_eq!(result, json!({ "a": 1 }));
        let sent = connector.transport().sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(
            serde_json::to_value(&sent[0]).unwrap(),
            json!({ "method": "getSomething", "params": { "x": [1, 2] }, "version": "1.1" })
        );
    }

    #[tokio::test]
    async fn test_connection_passes_result_through() {
        let connector = connector(script().reply("getConnectionTest", json!({ "result": "ok" })));

        assert_eq!(connector.test_connection().await.unwrap(), json!("ok"));
        assert_eq!(connector.transport().sent()[0].params, json!({}));
        assert!(!connector.is_authenticated());
    }

    #[tokio::test]
    async fn transport_errors_propagate_unchanged() {
        let connector = connector(script().fail("getConnectionTest", 404, "Not Found"));

        let err = connector.test_connection().await.unwrap_err();
        assert!(matches!(err, ConnectorError::Transport { code: 404, .. }));
    }

    #[tokio::test]
    async fn missing_result_field_is_a_protocol_error() {
        let connector = connector(
            script().reply("getConnectionTest", json!({ "error": { "message": "denied" } })),
        );

        let err = connector.test_connection().await.unwrap_err();
        assert!(matches!(err, ConnectorError::Protocol(_)));
    }

    #[tokio::test]
    async fn invalid_json_is_a_protocol_error() {
        let connector = connector(script().reply_raw("getConnectionTest", "not json"));

        let err = connector.test_connection().await.unwrap_err();
        assert!(matches!(err, ConnectorError::Protocol(_)));
    }

    #[tokio::test]
    async fn list_accounts_sends_credentials() {
        let connector = connector(script().reply(
            "getAccountList",
            json!({ "result": [{ "customerId": "1", "title": "A" }, { "customerId": "2" }] }),
        ));

        let accounts = connector.list_accounts().await.unwrap();

        assert_eq!(accounts.len(), 2);
        assert_eq!(accounts[1].customer_id, json!("2"));
        assert_eq!(
            connector.transport().sent()[0].params,
            json!({ "login": "u", "pass": "p" })
        );
    }

    #[tokio::test]
    async fn first_account_on_empty_list_is_an_empty_result() {
        let connector = connector(script().reply("getAccountList", json!({ "result": [] })));

        let err = connector.first_account().await.unwrap_err();
        assert!(matches!(
            err,
            ConnectorError::EmptyResult { ref method } if method == "getAccountList"
        ));
    }

    #[tokio::test]
    async fn get_token_resolves_customer_id_from_first_account() {
        let transport = script()
            .reply("getAccountList", json!({ "result": [{ "customerId": "42", "title": "Shop" }] }))
            .reply("login", json!({ "result": "tok" }));
        let mut connector = connector(transport);

        let token = connector.get_token().await.unwrap();

        assert_eq!(token.as_str(), Some("tok"));
        assert_eq!(connector.customer_id(), Some(&json!("42")));
        // `get_token` alone does not store the token.
        assert!(connector.token().is_none());

        let sent = connector.transport().sent();
        assert_eq!(connector.transport().sent_methods(), ["getAccountList", "login"]);
        assert_eq!(
            sent[1].params,
            json!({ "login": "u", "pass": "p", "customerId": "42", "language": "en" })
        );
    }

    #[tokio::test]
    async fn numeric_customer_id_is_passed_to_login_unchanged() {
        let transport = script()
            .reply("getAccountList", json!({ "result": [{ "customerId": 7 }] }))
            .reply("login", json!({ "result": "tok" }));
        let mut connector = connector(transport);

        connector.login().await.unwrap();

        assert_eq!(connector.customer_id(), Some(&json!(7)));
        assert_eq!(connector.transport().sent()[1].params["customerId"], json!(7));
    }

    #[tokio::test]
    async fn configured_customer_id_skips_account_list() {
        let transport = script().reply("login", json!({ "result": "tok" }));
        let mut connector =
            Connector::with_transport(&config().with_customer_id("99"), transport).unwrap();

        connector.login().await.unwrap();

        assert_eq!(connector.transport().sent_methods(), ["login"]);
        assert_eq!(connector.transport().sent()[0].params["customerId"], json!("99"));
    }

    #[tokio::test]
    async fn empty_account_list_aborts_login() {
        let mut connector = connector(script().reply("getAccountList", json!({ "result": [] })));

        let err = connector.login().await.unwrap_err();

        assert!(matches!(err, ConnectorError::EmptyResult { .. }));
        assert_eq!(connector.transport().sent_methods(), ["getAccountList"]);
        assert!(connector.customer_id().is_none());
        assert!(!connector.is_authenticated());
    }

    #[tokio::test]
    async fn login_stores_and_returns_token() {
        let transport = script()
            .reply("getAccountList", json!({ "result": [{ "customerId": "7" }] }))
            .reply("login", json!({ "result": "tok123" }));
        let mut connector = connector(transport);

        let token = connector.login().await.unwrap();

        assert_eq!(token, Token::new("tok123"));
        assert_eq!(connector.token(), Some(&Token::new("tok123")));
        assert_eq!(connector.customer_id(), Some(&json!("7")));
        assert!(connector.is_authenticated());
    }

    #[tokio::test]
    async fn repeated_login_reuses_resolved_customer_id() {
        let transport = script()
            .reply("getAccountList", json!({ "result": [{ "customerId": "7" }] }))
            .reply("login", json!({ "result": "tok123" }));
        let mut connector = connector(transport);

        connector.login().await.unwrap();
        connector.login().await.unwrap();

        assert_eq!(
            connector.transport().sent_methods(),
            ["getAccountList", "login", "login"]
        );
    }

    #[tokio::test]
    async fn failed_login_keeps_previous_state() {
        let transport = script()
            .reply("getAccountList", json!({ "result": [{ "customerId": "7" }] }))
            .fail("login", 500, "Internal Server Error");
        let mut connector = connector(transport);

        let err = connector.login().await.unwrap_err();

        assert!(matches!(err, ConnectorError::Transport { code: 500, .. }));
        assert_eq!(connector.customer_id(), Some(&json!("7")));
        assert!(connector.token().is_none());
    }

    #[tokio::test]
    async fn request_analysis_embeds_config_verbatim() {
        let analysis_config = json!({
            "analysisObjects": [{ "title": "Pages" }],
            "metrics": [{ "title": "Page Impressions", "sortOrder": "desc" }],
            "startTime": "2024-01-01 00:00:00",
            "stopTime": "2024-01-31 23:59:59",
            "rowLimit": 10
        });
        let transport = script()
            .reply("login", json!({ "result": "tok123" }))
            .reply("getAnalysisData", json!({ "result": { "analysisData": [["Home", "12"]] } }));
        let mut connector =
            Connector::with_transport(&config().with_customer_id("7"), transport).unwrap();

        connector.login().await.unwrap();
        let result = connector.request_analysis(&analysis_config).await.unwrap();

        assert_eq!(result["analysisData"][0][0], json!("Home"));
        let sent = connector.transport().sent();
        assert_eq!(sent[1].method, "getAnalysisData");
        assert_eq!(
            sent[1].params,
            json!({ "token": "tok123", "analysisConfig": analysis_config })
        );
    }

    #[tokio::test]
    async fn analysis_before_login_sends_null_token() {
        let transport = script()
            .reply(
                "getAnalysisObjectsAndMetricsList",
                json!({ "result": { "analysisObjects": [] } }),
            )
            .fail("getAnalysisData", 403, "Forbidden");
        let connector = connector(transport);

        connector.list_analysis_objects_and_metrics().await.unwrap();
        let err = connector.request_analysis(&json!({})).await.unwrap_err();

        assert!(matches!(err, ConnectorError::Transport { code: 403, .. }));
        let sent = connector.transport().sent();
        assert_eq!(sent[0].params, json!({ "token": null }));
        assert_eq!(sent[1].params, json!({ "token": null, "analysisConfig": {} }));
    }

    #[tokio::test]
    async fn non_string_token_is_stored_and_sent_unchanged() {
        let transport = script()
            .reply("login", json!({ "result": 12345 }))
            .reply(
                "getAnalysisObjectsAndMetricsList",
                json!({ "result": { "analysisObjects": [] } }),
            );
        let mut connector =
            Connector::with_transport(&config().with_customer_id("7"), transport).unwrap();

        let token = connector.login().await.unwrap();
        connector.list_analysis_objects_and_metrics().await.unwrap();

        assert_eq!(token.as_value(), &json!(12345));
        assert_eq!(connector.token(), Some(&token));
        assert_eq!(connector.transport().sent()[1].params, json!({ "token": 12345 }));
    }

    #[test]
    fn rejects_malformed_or_non_http_endpoints() {
        let err = Connector::with_transport(
            &ConnectorConfig::new("not a url", "u", "p"),
            ScriptedTransport::default(),
        )
        .unwrap_err();
        assert!(matches!(err, ConnectorError::InvalidEndpoint(_)));

        let err = Connector::with_transport(
            &ConnectorConfig::new("ftp://example.test/api", "u", "p"),
            ScriptedTransport::default(),
        )
        .unwrap_err();
        assert!(matches!(err, ConnectorError::UnsupportedScheme(ref s) if s == "ftp"));
    }

    #[test]
    fn invalid_configuration_is_rejected_before_any_call() {
        let config = config().with_timeout(std::time::Duration::ZERO);

        let err = Connector::with_transport(&config, script()).unwrap_err();
        assert!(matches!(err, ConnectorError::InvalidConfig(_)));

        let err = Connector::new(&config).unwrap_err();
        assert!(matches!(err, ConnectorError::InvalidConfig(_)));
    }
}
