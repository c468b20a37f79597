// Request handlers

use crate::api::middleware::request_id;
use crate::api::responses::{ApiError, HealthResponse};
use crate::api::AppState;
use crate::core::errors::ProxyError;
use crate::credentials::{self, validate_adapt_request};
use crate::model::{AdaptCredentialsRequest, BindRequest, BindResponse, Catalog};
use crate::proxy::{BindingRef, ForwardedResponse};
use axum::{
    body::Bytes,
    extract::{Path, RawQuery, State},
    http::{HeaderMap, Method, Uri},
    Json,
};
use tracing::{error, info, warn};

/// Health check handler
///
/// GET /health
pub async fn health_handler(State(app_state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        role: app_state.broker.interceptor().role().to_string(),
    })
}

/// GET /v2/catalog
///
/// Fetches the upstream catalog and lets the role rewrite it.
pub async fn catalog_handler(
    State(app_state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<Catalog>, ApiError> {
    let request_id = request_id(&headers);
    let catalog = app_state.broker.catalog(&headers).await.map_err(|e| {
        error!(error = %e, request_id = %request_id, "Catalog request failed");
        ApiError::from(e)
    })?;
    Ok(Json(catalog))
}

/// PUT /v2/service_instances/:instance_id/service_bindings/:binding_id
pub async fn bind_handler(
    State(app_state): State<AppState>,
    Path((instance_id, binding_id)): Path<(String, String)>,
    RawQuery(query): RawQuery,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<BindResponse>, ApiError> {
    let request_id = request_id(&headers);
    info!(
        request_id = %request_id,
        instance_id = %instance_id,
        binding_id = %binding_id,
        "Bind request received"
    );

    let request: BindRequest = serde_json::from_slice(&body).map_err(|e| {
        warn!(error = %e, request_id = %request_id, "Malformed bind request");
        ApiError::from(ProxyError::InvalidRequest(format!(
            "Invalid bind request: {}",
            e
        )))
    })?;

    let binding = BindingRef::new(instance_id, binding_id).with_query(query);
    let response = app_state
        .broker
        .bind(&binding, &headers, request)
        .await
        .map_err(|e| {
            error!(
                error = %e,
                request_id = %request_id,
                binding_id = %binding.binding_id,
                "Bind failed"
            );
            ApiError::from(e)
        })?;

    Ok(Json(response))
}

/// DELETE /v2/service_instances/:instance_id/service_bindings/:binding_id
///
/// Forwarded as is; the role's post-delete hook runs only on upstream success.
pub async fn unbind_handler(
    State(app_state): State<AppState>,
    Path((instance_id, binding_id)): Path<(String, String)>,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Result<ForwardedResponse, ApiError> {
    let request_id = request_id(&headers);
    info!(
        request_id = %request_id,
        instance_id = %instance_id,
        binding_id = %binding_id,
        "Unbind request received"
    );

    let binding = BindingRef::new(instance_id, binding_id);
    app_state
        .broker
        .unbind(&binding, path_and_query(&uri), &headers, body)
        .await
        .map_err(|e| {
            error!(error = %e, request_id = %request_id, "Unbind failed");
            ApiError::from(e)
        })
}

/// POST .../service_bindings/:binding_id/adapt_credentials
///
/// Runs the credential dispatcher on the request body; any number of
/// mappings is accepted.
pub async fn adapt_credentials_handler(
    Path((_instance_id, binding_id)): Path<(String, String)>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<BindResponse>, ApiError> {
    let request_id = request_id(&headers);
    let request: AdaptCredentialsRequest = serde_json::from_slice(&body).map_err(|e| {
        warn!(error = %e, request_id = %request_id, "Malformed adapt_credentials request");
        ApiError::from(ProxyError::InvalidRequest(format!(
            "Invalid adapt_credentials request: {}",
            e
        )))
    })?;
    adapt(&request, &binding_id, &request_id)
}

/// PUT .../service_bindings/:binding_id/adapt_credentials
///
/// Strict entry point: the body must pass standalone validation first.
pub async fn validated_adapt_credentials_handler(
    Path((_instance_id, binding_id)): Path<(String, String)>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<BindResponse>, ApiError> {
    let request_id = request_id(&headers);
    validate_adapt_request(&body).map_err(|e| {
        warn!(error = %e, request_id = %request_id, "adapt_credentials request rejected");
        ApiError::from(ProxyError::from(e))
    })?;
    let request: AdaptCredentialsRequest = serde_json::from_slice(&body).map_err(|e| {
        ApiError::from(ProxyError::InvalidRequest(format!(
            "Invalid adapt_credentials request: {}",
            e
        )))
    })?;
    adapt(&request, &binding_id, &request_id)
}

fn adapt(
    request: &AdaptCredentialsRequest,
    binding_id: &str,
    request_id: &str,
) -> Result<Json<BindResponse>, ApiError> {
    let response = credentials::adapt(&request.credentials, &request.endpoint_mappings).map_err(|e| {
        warn!(error = %e, request_id = %request_id, binding_id = %binding_id, "Credential adaptation failed");
        ApiError::from(ProxyError::from(e))
    })?;
    info!(
        request_id = %request_id,
        binding_id = %binding_id,
        endpoints = response.endpoints.len(),
        "Credentials adapted"
    );
    Ok(Json(response))
}

/// Any other route: opaque forward to the upstream broker
pub async fn forward_handler(
    State(app_state): State<AppState>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Result<ForwardedResponse, ApiError> {
    let request_id = request_id(&headers);
    let target = path_and_query(&uri);
    info!(request_id = %request_id, method = %method, path = %target, "Forwarding request");

    app_state
        .broker
        .forward(method, target, &headers, body)
        .await
        .map_err(|e| {
            error!(error = %e, request_id = %request_id, "Forward failed");
            ApiError::from(e)
        })
}

fn path_and_query(uri: &Uri) -> &str {
    uri.path_and_query()
        .map(|pq| pq.as_str())
        .unwrap_or_else(|| uri.path())
}
