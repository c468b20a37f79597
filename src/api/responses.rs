// Response types for API endpoints

use crate::core::errors::ProxyError;
use crate::core::http_error::HttpError;
use crate::proxy::ForwardedResponse;
use axum::{
    body::Body,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub role: String,
}

/// API error rendered as the `{error, description}` envelope
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub body: HttpError,
}

impl ApiError {
    /// Translate `err`, using `default_status` unless it carries its own
    pub fn with_default_status(err: &ProxyError, default_status: StatusCode) -> Self {
        let body = HttpError::from_error(err, default_status.as_u16());
        let status =
            StatusCode::from_u16(body.status_code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        Self { status, body }
    }

    pub fn from_proxy_error(err: &ProxyError) -> Self {
        let status =
            StatusCode::from_u16(err.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        Self::with_default_status(err, status)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(self.body)).into_response()
    }
}

impl From<ProxyError> for ApiError {
    fn from(err: ProxyError) -> Self {
        ApiError::from_proxy_error(&err)
    }
}

impl IntoResponse for ForwardedResponse {
    fn into_response(self) -> Response {
        let mut response = Response::new(Body::from(self.body));
        *response.status_mut() = self.status;
        *response.headers_mut() = self.headers;
        response
    }
}
