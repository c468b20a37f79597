// Core error types shared by every layer

pub mod errors;
pub mod http_error;

pub use errors::{CredentialsError, ModelError, ProxyError, ValidationError};
pub use http_error::HttpError;
