use crate::error::ConnectorError;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// The JSON-RPC protocol version sent with every request.
pub const RPC_VERSION: &str = "1.1";

/// Remote method names understood by the analytics endpoint.
pub mod methods {
    pub const GET_CONNECTION_TEST: &str = "getConnectionTest";
    pub const GET_ACCOUNT_LIST: &str = "getAccountList";
    pub const LOGIN: &str = "login";
    pub const GET_ANALYSIS_DATA: &str = "getAnalysisData";
    pub const GET_ANALYSIS_OBJECTS_AND_METRICS_LIST: &str = "getAnalysisObjectsAndMetricsList";
}

/// The POST body of every call: `{method, params, version}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RpcEnvelope {
    pub method: String,
    pub params: Value,
    pub version: String,
}

impl RpcEnvelope {
    /// Builds a fresh envelope. Parameters that serialize to `null` become `{}`.
    pub fn new<P: Serialize>(method: &str, params: &P) -> Result<Self, ConnectorError> {
        let params = match serde_json::to_value(params).map_err(ConnectorError::Encode)? {
            Value::Null => Value::Object(Default::default()),
            other => other,
        };
        Ok(Self {
            method: method.to_string(),
            params,
            version: RPC_VERSION.to_string(),
        })
    }
}

/// Parameters of a method that takes none. Serializes to `{}`.
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct NoParams {}

/// Parameters of the token-only calls such as `getAnalysisObjectsAndMetricsList`.
///
/// A missing token is sent as `null`; rejecting it is left to the remote service.
#[derive(Debug, Serialize)]
pub struct TokenParams<'a> {
    pub token: Option<&'a Value>,
}

/// Parameters of `getAnalysisData`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisParams<'a, A> {
    pub token: Option<&'a Value>,
    pub analysis_config: &'a A,
}

/// Parses a response body and pulls out its `result` field.
///
/// Error fields the service may add next to `result` are ignored.
pub fn extract_result<R: DeserializeOwned>(body: &str) -> Result<R, ConnectorError> {
    let response: Value = serde_json::from_str(body)
        .map_err(|e| ConnectorError::Protocol(format!("response body is not valid JSON: {}", e)))?;

    let Value::Object(mut fields) = response else {
        return Err(ConnectorError::Protocol(
            "response body is not a JSON object".to_string(),
        ));
    };

    let result = fields
        .remove("result")
        .ok_or_else(|| ConnectorError::Protocol("response has no `result` field".to_string()))?;

    serde_json::from_value(result)
        .map_err(|e| ConnectorError::Protocol(format!("unexpected `result` shape: {}", e)))
}
