//! Wire types for the Bitrix24 REST and OAuth endpoints.
//!
//! ## Key Types
//!
//! - [`ApiResponse`] - the envelope every REST method answers with
//! - [`TokenResponse`] - access/refresh token grant from `oauth/token/`

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{Error, Result};

/// Envelope returned by every REST method.
///
/// Successful calls carry `result` (plus paging fields for list methods);
/// failures carry `error` and usually `error_description`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ApiResponse {
    #[serde(default)]
    pub result: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_description: Option<String>,
    /// Total number of records for list methods
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total: Option<u64>,
    /// Offset of the next page, absent on the last page
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next: Option<u64>,
    /// Server-side timing information
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time: Option<Value>,
}

impl ApiResponse {
    /// The error message if the response reports one, either at the top level
    /// or as a `result_error` string inside `result`.
    pub fn error_message(&self) -> Option<&str> {
        if let Some(error) = self.error.as_deref() {
            return Some(error);
        }
        self.result
            .as_ref()
            .and_then(|result| result.get("result_error"))
            .and_then(Value::as_str)
    }

    /// Converts the envelope into an [`Error::Api`] if it carries a top-level error.
    pub fn into_checked(self) -> Result<Self> {
        match self.error {
            Some(error) => Err(Error::Api {
                description: self.error_description.unwrap_or_default(),
                error,
            }),
            None => Ok(self),
        }
    }

    /// Deserializes `result` into `T`.
    pub fn result_as<T: DeserializeOwned>(&self) -> Result<T> {
        let result = self.result.clone().unwrap_or(Value::Null);
        Ok(serde_json::from_value(result)?)
    }
}

/// Token grant from the OAuth endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub refresh_token: String,
    /// Lifetime of the access token in seconds
    #[serde(default)]
    pub expires_in: Option<i64>,
    /// Absolute expiry as a unix timestamp
    #[serde(default)]
    pub expires: Option<i64>,
    #[serde(default)]
    pub scope: Option<String>,
    #[serde(default)]
    pub domain: Option<String>,
    #[serde(default)]
    pub server_endpoint: Option<String>,
    #[serde(default)]
    pub client_endpoint: Option<String>,
    #[serde(default)]
    pub member_id: Option<String>,
    #[serde(default)]
    pub user_id: Option<u64>,
    #[serde(default)]
    pub status: Option<String>,
}
