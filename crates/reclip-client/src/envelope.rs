//! The `{data}` / `{error}` response envelope.

use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::{ClientError, ClientResult};

/// Result of every API call: exactly one of `{"data": T}` or `{"error": "..."}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApiResponse<T> {
    Data(T),
    Error(String),
}

/// Server error body shapes we know how to read.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    detail: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn error(msg: impl Into<String>) -> Self {
        Self::Error(msg.into())
    }

    pub fn is_ok(&self) -> bool {
        matches!(self, ApiResponse::Data(_))
    }

    pub fn data(&self) -> Option<&T> {
        match self {
            ApiResponse::Data(data) => Some(data),
            ApiResponse::Error(_) => None,
        }
    }

    pub fn error_message(&self) -> Option<&str> {
        match self {
            ApiResponse::Data(_) => None,
            ApiResponse::Error(msg) => Some(msg),
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> ApiResponse<U> {
        match self {
            ApiResponse::Data(data) => ApiResponse::Data(f(data)),
            ApiResponse::Error(msg) => ApiResponse::Error(msg),
        }
    }

    pub fn into_result(self) -> ClientResult<T> {
        match self {
            ApiResponse::Data(data) => Ok(data),
            ApiResponse::Error(msg) => Err(ClientError::Server(msg)),
        }
    }

    /// Collapse a client result into the envelope.
    pub fn from_result(result: ClientResult<T>) -> Self {
        match result {
            Ok(data) => ApiResponse::Data(data),
            Err(err) => err.into(),
        }
    }
}

impl<T: DeserializeOwned> ApiResponse<T> {
    /// Build the envelope from a transport status and raw body.
    ///
    /// A success status with an unparsable body is a parse failure, not an
    /// error envelope.
    pub fn from_status(status: StatusCode, body: &str) -> ClientResult<Self> {
        if status.is_success() {
            let body = if body.trim().is_empty() { "null" } else { body };
            return Ok(ApiResponse::Data(serde_json::from_str(body)?));
        }
        Ok(ApiResponse::Error(server_message(status, body)))
    }
}

impl<T> From<ClientError> for ApiResponse<T> {
    fn from(err: ClientError) -> Self {
        ApiResponse::Error(err.to_string())
    }
}

/// The server's message field if present, else a generic failure string.
fn server_message(status: StatusCode, body: &str) -> String {
    serde_json::from_str::<ErrorBody>(body)
        .ok()
        .and_then(|b| b.error.or(b.message).or(b.detail))
        .filter(|m| !m.trim().is_empty())
        .unwrap_or_else(|| format!("Request failed with status {}", status.as_u16()))
}
