use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

// Using `#[serde(rename_all = "camelCase")]` to automatically map from JSON camelCase to Rust snake_case.

/// A single entry of the `getAccountList` result.
///
/// Only the presence of `customerId` is required; its value is kept as the
/// service sent it (string or number) and passed to `login` unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    pub customer_id: Value,
    /// Every other field of the account, passed through untouched.
    #[serde(flatten)]
    pub details: Map<String, Value>,
}

/// The session token returned by the remote `login` method.
///
/// The service normally answers with a string, but the value is stored as is;
/// callers that need a particular shape check it themselves.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Token(Value);

impl Token {
    pub fn new(token: impl Into<Value>) -> Self {
        Self(token.into())
    }

    pub fn as_value(&self) -> &Value {
        &self.0
    }

    /// The token text, when the service returned a string.
    pub fn as_str(&self) -> Option<&str> {
        self.0.as_str()
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.0 {
            Value::String(token) => f.write_str(token),
            other => write!(f, "{}", other),
        }
    }
}
