// External error envelope shared with the platform and the upstream broker

use crate::core::errors::ProxyError;
use axum::http::StatusCode;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error body exchanged on the wire as `{"error": ..., "description": ...}`
///
/// The status code travels with the value but is never serialized.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[error("error: '{error}', description: '{description}'")]
pub struct HttpError {
    #[serde(default)]
    pub error: String,
    #[serde(default)]
    pub description: String,
    #[serde(skip)]
    pub status_code: u16,
}

impl HttpError {
    pub fn new(error: impl Into<String>, description: impl Into<String>, status_code: u16) -> Self {
        Self {
            error: error.into(),
            description: description.into(),
            status_code,
        }
    }

    /// Translate any error into the external envelope
    ///
    /// An upstream error envelope is returned unchanged. Everything else gets
    /// the reason phrase of `default_status` without spaces as its message and
    /// the error text as its description.
    pub fn from_error(err: &ProxyError, default_status: u16) -> Self {
        if let ProxyError::Upstream(http_error) = err {
            return http_error.clone();
        }
        Self::new(status_message(default_status), err.to_string(), default_status)
    }

    /// Translate an upstream response into an error, `None` for 2xx
    pub fn from_response(status: u16, body: &[u8], url: &str, method: &str) -> Option<Self> {
        if (200..300).contains(&status) {
            return None;
        }

        let origin = format!("from call to {} {}", method, url);
        match serde_json::from_slice::<HttpError>(body) {
            Ok(mut parsed) => {
                parsed.description = format!("{}: {}", parsed.description, origin);
                parsed.status_code = status;
                Some(parsed)
            }
            Err(_) => Some(Self::new(
                "InvalidJSON",
                format!("invalid JSON '{}': {}", String::from_utf8_lossy(body), origin),
                status,
            )),
        }
    }
}

fn status_message(status: u16) -> String {
    StatusCode::from_u16(status)
        .ok()
        .and_then(|code| code.canonical_reason())
        .unwrap_or("InternalServerError")
        .replace(' ', "")
}
