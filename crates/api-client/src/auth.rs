use serde::Serialize;
use serde_json::Value;
use std::fmt;

/// Language requested from the remote `login` method.
pub const LOGIN_LANGUAGE: &str = "en";

/// Parameters of `getAccountList`.
#[derive(Debug, Serialize)]
pub struct AccountListParams<'a> {
    pub login: &'a str,
    pub pass: &'a str,
}

/// Parameters of `login`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginParams<'a> {
    pub login: &'a str,
    pub pass: &'a str,
    pub customer_id: &'a Value,
    pub language: &'a str,
}

/// The user name and password sent with the authenticating calls.
#[derive(Clone)]
pub struct Credentials {
    user: String,
    pwd: String,
}

impl Credentials {
    pub fn new(user: impl Into<String>, pwd: impl Into<String>) -> Self {
        Self {
            user: user.into(),
            pwd: pwd.into(),
        }
    }

    pub fn account_list_params(&self) -> AccountListParams<'_> {
        AccountListParams {
            login: &self.user,
            pass: &self.pwd,
        }
    }

    pub fn login_params<'a>(&'a self, customer_id: &'a Value) -> LoginParams<'a> {
        LoginParams {
            login: &self.user,
            pass: &self.pwd,
            customer_id,
            language: LOGIN_LANGUAGE,
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("user", &self.user)
            .field("pwd", &"***")
            .finish()
    }
}
