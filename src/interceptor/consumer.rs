// Consumer role: stamps bind requests with the consumer's network identity
// and redirects returned credentials to local services routed through the mesh

use crate::config::{Config, ProxyRole};
use crate::core::errors::ProxyError;
use crate::interceptor::{CredentialsAdapter, ServiceBrokerInterceptor};
use crate::mesh::{consumer_routing_objects, consumer_service_endpoint, ConfigStore, ConsumerRouting};
use crate::model::{BindRequest, BindResponse, Catalog, EndpointMapping};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

#[derive(Clone)]
pub struct ConsumerInterceptor {
    pub consumer_id: String,
    pub network_profile: String,
    pub service_name_prefix: String,
    pub config_store: Arc<dyn ConfigStore>,
}

impl ConsumerInterceptor {
    pub fn from_config(config: &Config, config_store: Arc<dyn ConfigStore>) -> Self {
        Self {
            consumer_id: config.consumer_id.clone().unwrap_or_default(),
            network_profile: config.network_profile.clone().unwrap_or_default(),
            service_name_prefix: config.service_name_prefix.clone(),
            config_store,
        }
    }

    async fn clean_up(&self, binding_id: &str) {
        if let Err(e) = self.config_store.delete_binding(binding_id).await {
            warn!(error = %e, binding_id = %binding_id, "Failed to remove routing objects");
        }
    }

    async fn redirect(
        &self,
        response: &BindResponse,
        binding_id: &str,
        adapter: &dyn CredentialsAdapter,
    ) -> Result<BindResponse, ProxyError> {
        let remote = &response.network_data.data.endpoints;
        let objects = consumer_routing_objects(&ConsumerRouting {
            binding_id,
            provider_id: &response.network_data.data.provider_id,
            endpoints: remote,
        });
        self.config_store
            .create_routing_objects(binding_id, &objects)
            .await?;

        let mappings: Vec<EndpointMapping> = response
            .endpoints
            .iter()
            .enumerate()
            .map(|(index, source)| {
                EndpointMapping::new(source.clone(), consumer_service_endpoint(index, binding_id))
            })
            .collect();
        adapter.adapt(&response.credentials, &mappings).await
    }
}

#[async_trait]
impl ServiceBrokerInterceptor for ConsumerInterceptor {
    async fn pre_bind(&self, mut request: BindRequest) -> Result<BindRequest, ProxyError> {
        if self.network_profile.is_empty() {
            return Err(ProxyError::Interceptor(
                "network profile not configured".to_string(),
            ));
        }
        request.network_data.network_profile_id = self.network_profile.clone();
        request.network_data.data.consumer_id = self.consumer_id.clone();
        debug!(consumer_id = %self.consumer_id, "Bind request stamped with network data");
        Ok(request)
    }

    /// Route the producer endpoints through local services and let upstream
    /// rewrite the credentials onto them
    async fn post_bind(
        &self,
        _request: &BindRequest,
        response: BindResponse,
        binding_id: &str,
        adapter: &dyn CredentialsAdapter,
    ) -> Result<BindResponse, ProxyError> {
        if response.network_data.network_profile_id != self.network_profile {
            info!(
                network_profile_id = %response.network_data.network_profile_id,
                binding_id = %binding_id,
                "Ignoring bind response for another network profile"
            );
            return Ok(response);
        }

        let remote = response.network_data.data.endpoints.len();
        if remote != response.endpoints.len() {
            return Err(ProxyError::Interceptor(format!(
                "Number of endpoints in network data ({}) doesn't match number of endpoints in root ({})",
                remote,
                response.endpoints.len()
            )));
        }

        match self.redirect(&response, binding_id, adapter).await {
            Ok(mut adapted) => {
                adapted.network_data = response.network_data;
                adapted.additional_properties = response.additional_properties;
                info!(binding_id = %binding_id, endpoints = remote, "Consumer endpoints redirected");
                Ok(adapted)
            }
            Err(e) => {
                error!(error = %e, binding_id = %binding_id, "Failed to redirect consumer endpoints");
                self.clean_up(binding_id).await;
                Err(e)
            }
        }
    }

    async fn post_delete(&self, binding_id: &str) -> Result<(), ProxyError> {
        self.clean_up(binding_id).await;
        Ok(())
    }

    fn post_catalog(&self, catalog: &mut Catalog) -> Result<(), ProxyError> {
        if self.service_name_prefix.is_empty() {
            return Ok(());
        }
        for service in &mut catalog.services {
            if let Some(name) = service.name.strip_prefix(&self.service_name_prefix) {
                service.name = name.to_string();
            }
        }
        Ok(())
    }

    fn role(&self) -> ProxyRole {
        ProxyRole::Consumer
    }
}
