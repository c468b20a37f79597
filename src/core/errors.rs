// Domain error types for envelope decoding, credential translation and proxying

use crate::core::http_error::HttpError;
use thiserror::Error;

/// Errors raised while decoding or encoding a schema-tolerant envelope
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ModelError {
    /// A known field is present but has the wrong shape
    #[error("Invalid value for '{key}': {reason}")]
    InvalidField { key: String, reason: String },

    /// A port is neither a JSON number nor a numeric string
    #[error("Invalid port '{0}'")]
    InvalidPort(String),

    /// A known field could not be serialized back into the envelope
    #[error("Cannot serialize '{key}': {reason}")]
    Serialization { key: String, reason: String },
}

/// Errors raised by the protocol views and the adaptation dispatcher
#[derive(Error, Debug)]
pub enum CredentialsError {
    #[error("No endpoint mappings available")]
    NoEndpointMappings,

    /// A mapping source without a host would match any pair of delimiters
    #[error("Endpoint mapping {index} has an empty source host")]
    EmptySourceHost { index: usize },

    /// A recognized credential set lacks a mandatory field
    #[error("Invalid {protocol} credentials: {reason}")]
    Incomplete {
        protocol: &'static str,
        reason: String,
    },

    #[error("Invalid uri '{uri}': {reason}")]
    InvalidUri { uri: String, reason: String },

    #[error(transparent)]
    Model(#[from] ModelError),

    #[error("Cannot build endpoint pattern: {0}")]
    Pattern(#[from] regex::Error),
}

/// Rejections of the standalone adapt_credentials validation
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("Error in unmarshalling: {0}")]
    InvalidJson(String),

    #[error("Invalid json, field not found: {0}")]
    MissingField(String),

    #[error("Invalid json, '{field}' must be {expected}")]
    WrongType {
        field: String,
        expected: &'static str,
    },

    #[error("Invalid uri '{uri}': {reason}")]
    InvalidUri { uri: String, reason: String },

    #[error("Expected exactly one endpoint mapping, found {0}")]
    MappingCount(usize),

    #[error("Endpoint mapping source '{mapping_source}' does not match credentials '{credentials}'")]
    NotApplicable {
        mapping_source: String,
        credentials: String,
    },
}

/// Main error type for the proxy
#[derive(Error, Debug)]
pub enum ProxyError {
    /// Malformed inbound request (HTTP 400)
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Standalone validation rejected the request (HTTP 400)
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Credential translation failed (HTTP 400)
    #[error(transparent)]
    Credentials(#[from] CredentialsError),

    /// Envelope decoding failed (HTTP 400)
    #[error(transparent)]
    Model(#[from] ModelError),

    /// Upstream answered with a non-2xx status (upstream status)
    #[error(transparent)]
    Upstream(HttpError),

    /// Upstream could not be reached (HTTP 502)
    #[error("Request to {url} failed: {reason}")]
    Transport { url: String, reason: String },

    /// Upstream answered 2xx with an undecodable body (HTTP 502)
    #[error("Can't unmarshal response from {url}: {reason}")]
    Unmarshal { url: String, reason: String },

    /// A role hook failed (HTTP 500)
    #[error("Interceptor error: {0}")]
    Interceptor(String),

    /// Routing objects could not be written or removed (HTTP 500)
    #[error("Config store error: {0}")]
    ConfigStore(String),

    /// Configuration error (HTTP 500)
    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl ProxyError {
    /// Get HTTP status code for this error
    pub fn status_code(&self) -> u16 {
        match self {
            ProxyError::InvalidRequest(_) => 400,
            ProxyError::Validation(_) => 400,
            ProxyError::Credentials(_) => 400,
            ProxyError::Model(_) => 400,
            ProxyError::Upstream(err) => err.status_code,
            ProxyError::Transport { .. } => 502,
            ProxyError::Unmarshal { .. } => 502,
            ProxyError::Interceptor(_) => 500,
            ProxyError::ConfigStore(_) => 500,
            ProxyError::Configuration(_) => 500,
        }
    }
}
