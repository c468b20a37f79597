// Interceptor pipeline: pre-bind, forward, post-bind

use crate::core::errors::ProxyError;
use crate::interceptor::{CredentialsAdapter, ServiceBrokerInterceptor};
use crate::model::{AdaptCredentialsRequest, BindRequest, BindResponse, Catalog, Credentials, EndpointMapping};
use crate::proxy::{BindingRef, BrokerClient, ForwardedResponse};
use async_trait::async_trait;
use axum::body::Bytes;
use axum::http::{HeaderMap, Method};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Adapter that asks the upstream broker to adapt credentials for a binding
pub struct UpstreamAdapter<'a> {
    broker: &'a dyn BrokerClient,
    binding: &'a BindingRef,
    headers: &'a HeaderMap,
}

impl<'a> UpstreamAdapter<'a> {
    pub fn new(broker: &'a dyn BrokerClient, binding: &'a BindingRef, headers: &'a HeaderMap) -> Self {
        Self {
            broker,
            binding,
            headers,
        }
    }
}

#[async_trait]
impl<'a> CredentialsAdapter for UpstreamAdapter<'a> {
    async fn adapt(
        &self,
        credentials: &Credentials,
        mappings: &[EndpointMapping],
    ) -> Result<BindResponse, ProxyError> {
        let request = AdaptCredentialsRequest::new(credentials.clone(), mappings.to_vec());
        self.broker
            .adapt_credentials(self.binding, self.headers, &request)
            .await
    }
}

/// Upstream broker wrapped by the active role
#[derive(Clone)]
pub struct InterceptedBroker {
    broker: Arc<dyn BrokerClient>,
    interceptor: Arc<dyn ServiceBrokerInterceptor>,
}

impl InterceptedBroker {
    pub fn new(
        broker: Arc<dyn BrokerClient>,
        interceptor: Arc<dyn ServiceBrokerInterceptor>,
    ) -> Self {
        Self {
            broker,
            interceptor,
        }
    }

    pub fn interceptor(&self) -> &dyn ServiceBrokerInterceptor {
        self.interceptor.as_ref()
    }

    pub async fn catalog(&self, headers: &HeaderMap) -> Result<Catalog, ProxyError> {
        let mut catalog = self.broker.get_catalog(headers).await?;
        self.interceptor.post_catalog(&mut catalog)?;
        debug!(services = catalog.services.len(), "Catalog intercepted");
        Ok(catalog)
    }

    /// Run a bind through the role hooks; a failing hook aborts the call
    pub async fn bind(
        &self,
        binding: &BindingRef,
        headers: &HeaderMap,
        request: BindRequest,
    ) -> Result<BindResponse, ProxyError> {
        let request = self.interceptor.pre_bind(request).await?;
        let response = self.broker.bind(binding, headers, &request).await?;
        let adapter = UpstreamAdapter::new(self.broker.as_ref(), binding, headers);
        let response = self
            .interceptor
            .post_bind(&request, response, &binding.binding_id, &adapter)
            .await?;
        info!(
            binding_id = %binding.binding_id,
            role = %self.interceptor.role(),
            "Bind intercepted"
        );
        Ok(response)
    }

    /// Forward an unbind; the role is told only when upstream accepted it
    pub async fn unbind(
        &self,
        binding: &BindingRef,
        path_and_query: &str,
        headers: &HeaderMap,
        body: Bytes,
    ) -> Result<ForwardedResponse, ProxyError> {
        let response = self
            .broker
            .forward(Method::DELETE, path_and_query, headers, body)
            .await?;
        if response.status.is_success() {
            self.interceptor.post_delete(&binding.binding_id).await?;
        } else {
            warn!(
                binding_id = %binding.binding_id,
                status = response.status.as_u16(),
                "Upstream rejected unbind"
            );
        }
        Ok(response)
    }

    pub async fn forward(
        &self,
        method: Method,
        path_and_query: &str,
        headers: &HeaderMap,
        body: Bytes,
    ) -> Result<ForwardedResponse, ProxyError> {
        self.broker
            .forward(method, path_and_query, headers, body)
            .await
    }
}
