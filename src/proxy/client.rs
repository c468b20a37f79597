// OSB client for the upstream service broker

use crate::core::errors::ProxyError;
use crate::model::{AdaptCredentialsRequest, BindRequest, BindResponse, Catalog};
use crate::proxy::rest::RestClient;
use crate::proxy::{BindingRef, BrokerClient, ForwardedResponse};
use async_trait::async_trait;
use axum::body::Bytes;
use axum::http::{HeaderMap, Method};
use tracing::info;

pub struct OsbClient {
    rest: RestClient,
}

impl OsbClient {
    pub fn new(rest: RestClient) -> Self {
        Self { rest }
    }
}

#[async_trait]
impl BrokerClient for OsbClient {
    async fn get_catalog(&self, headers: &HeaderMap) -> Result<Catalog, ProxyError> {
        self.rest
            .get()
            .append_path("v2/catalog")
            .headers(headers)
            .send()
            .await?
            .decode()
    }

    async fn bind(
        &self,
        binding: &BindingRef,
        headers: &HeaderMap,
        request: &BindRequest,
    ) -> Result<BindResponse, ProxyError> {
        let response = self
            .rest
            .put(request)
            .append_path(&binding.path())
            .query(binding.query.as_deref())
            .headers(headers)
            .send()
            .await?;
        info!(
            binding_id = %binding.binding_id,
            status = response.status.as_u16(),
            "Upstream bind succeeded"
        );
        response.decode()
    }

    async fn adapt_credentials(
        &self,
        binding: &BindingRef,
        headers: &HeaderMap,
        request: &AdaptCredentialsRequest,
    ) -> Result<BindResponse, ProxyError> {
        self.rest
            .post(request)
            .append_path(&binding.path())
            .append_path("adapt_credentials")
            .headers(headers)
            .send()
            .await?
            .decode()
    }

    async fn forward(
        &self,
        method: Method,
        path_and_query: &str,
        headers: &HeaderMap,
        body: Bytes,
    ) -> Result<ForwardedResponse, ProxyError> {
        self.rest.forward(method, path_and_query, headers, body).await
    }
}
