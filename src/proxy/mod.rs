// Upstream broker access and the interceptor pipeline around it

pub mod client;
pub mod pipeline;
pub mod rest;

pub use client::OsbClient;
pub use pipeline::{InterceptedBroker, UpstreamAdapter};
pub use rest::{RestClient, RestRequest, RestResponse};

use crate::core::errors::ProxyError;
use crate::model::{AdaptCredentialsRequest, BindRequest, BindResponse, Catalog};
use async_trait::async_trait;
use axum::body::Bytes;
use axum::http::{header, HeaderMap, Method, StatusCode};

/// Instance and binding addressed by a binding call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BindingRef {
    pub instance_id: String,
    pub binding_id: String,
    /// Raw query string of the inbound call, forwarded as is
    pub query: Option<String>,
}

impl BindingRef {
    pub fn new(instance_id: impl Into<String>, binding_id: impl Into<String>) -> Self {
        Self {
            instance_id: instance_id.into(),
            binding_id: binding_id.into(),
            query: None,
        }
    }

    pub fn with_query(mut self, query: Option<String>) -> Self {
        self.query = query;
        self
    }

    pub fn path(&self) -> String {
        format!(
            "v2/service_instances/{}/service_bindings/{}",
            self.instance_id, self.binding_id
        )
    }
}

/// Upstream response relayed without interpretation
#[derive(Debug, Clone)]
pub struct ForwardedResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
}

/// Calls made against the upstream service broker
#[async_trait]
pub trait BrokerClient: Send + Sync {
    async fn get_catalog(&self, headers: &HeaderMap) -> Result<Catalog, ProxyError>;

    async fn bind(
        &self,
        binding: &BindingRef,
        headers: &HeaderMap,
        request: &BindRequest,
    ) -> Result<BindResponse, ProxyError>;

    async fn adapt_credentials(
        &self,
        binding: &BindingRef,
        headers: &HeaderMap,
        request: &AdaptCredentialsRequest,
    ) -> Result<BindResponse, ProxyError>;

    /// Opaque forward; any upstream status is returned as a response
    async fn forward(
        &self,
        method: Method,
        path_and_query: &str,
        headers: &HeaderMap,
        body: Bytes,
    ) -> Result<ForwardedResponse, ProxyError>;
}

const HOP_BY_HOP: [header::HeaderName; 8] = [
    header::CONNECTION,
    header::CONTENT_LENGTH,
    header::HOST,
    header::PROXY_AUTHENTICATE,
    header::PROXY_AUTHORIZATION,
    header::TE,
    header::TRAILER,
    header::TRANSFER_ENCODING,
];

/// Headers that may be copied from one hop to the next
pub fn forwardable_headers(headers: &HeaderMap) -> HeaderMap {
    let mut forwarded = headers.clone();
    for name in HOP_BY_HOP.iter() {
        forwarded.remove(name);
    }
    forwarded.remove(header::UPGRADE);
    forwarded.remove("keep-alive");
    forwarded
}
