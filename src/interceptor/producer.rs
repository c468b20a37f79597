// Producer role: publishes mesh-reachable endpoints for the backing service

use crate::config::{Config, ProxyRole};
use crate::core::errors::ProxyError;
use crate::interceptor::{CredentialsAdapter, ServiceBrokerInterceptor};
use crate::mesh::{endpoint_host, provider_routing_objects, ConfigStore, ProviderRouting};
use crate::model::{BindRequest, BindResponse, Catalog, DataResponse, Endpoint, NetworkDataResponse};
use async_trait::async_trait;
use serde_json::{Map, Value};
use std::sync::Arc;
use tracing::{error, info, warn};

#[derive(Debug, Clone, Default)]
pub struct ProducerSettings {
    pub provider_id: String,
    pub system_domain: String,
    pub network_profile: String,
    pub load_balancer_port: u16,
    pub service_name_prefix: String,
    /// Merged into the metadata of every catalog plan
    pub plan_metadata: Map<String, Value>,
}

impl ProducerSettings {
    pub fn from_config(config: &Config) -> Result<Self, ProxyError> {
        Ok(Self {
            provider_id: config.provider_id.clone().unwrap_or_default(),
            system_domain: config.system_domain.clone().unwrap_or_default(),
            network_profile: config.network_profile.clone().unwrap_or_default(),
            load_balancer_port: config.load_balancer_port,
            service_name_prefix: config.service_name_prefix.clone(),
            plan_metadata: parse_plan_metadata(config.plan_metadata.as_deref())?,
        })
    }
}

/// Parse the configured plan metadata, which must be a JSON object
pub fn parse_plan_metadata(raw: Option<&str>) -> Result<Map<String, Value>, ProxyError> {
    match raw.map(str::trim) {
        None | Some("") => Ok(Map::new()),
        Some(text) => match serde_json::from_str::<Value>(text) {
            Ok(Value::Object(metadata)) => Ok(metadata),
            Ok(_) => Err(ProxyError::Configuration(
                "PLAN_METADATA must be a JSON object".to_string(),
            )),
            Err(e) => Err(ProxyError::Configuration(format!(
                "Invalid PLAN_METADATA: {}",
                e
            ))),
        },
    }
}

pub struct ProducerInterceptor {
    settings: ProducerSettings,
    config_store: Arc<dyn ConfigStore>,
}

impl ProducerInterceptor {
    pub fn new(settings: ProducerSettings, config_store: Arc<dyn ConfigStore>) -> Self {
        Self {
            settings,
            config_store,
        }
    }

    pub fn settings(&self) -> &ProducerSettings {
        &self.settings
    }

    fn synthesized_endpoints(&self, count: usize, binding_id: &str) -> Vec<Endpoint> {
        (0..count)
            .map(|index| {
                Endpoint::new(
                    endpoint_host(index, binding_id, &self.settings.system_domain),
                    self.settings.load_balancer_port,
                )
            })
            .collect()
    }
}

#[async_trait]
impl ServiceBrokerInterceptor for ProducerInterceptor {
    async fn pre_bind(&self, request: BindRequest) -> Result<BindRequest, ProxyError> {
        Ok(request)
    }

    async fn post_bind(
        &self,
        request: &BindRequest,
        mut response: BindResponse,
        binding_id: &str,
        _adapter: &dyn CredentialsAdapter,
    ) -> Result<BindResponse, ProxyError> {
        if self.settings.network_profile.is_empty() {
            return Err(ProxyError::Interceptor(
                "network profile not configured".to_string(),
            ));
        }

        let own_endpoints = std::mem::take(&mut response.credentials.endpoints);
        if response.endpoints.is_empty() {
            response.endpoints = own_endpoints;
        }

        response.network_data = NetworkDataResponse {
            network_profile_id: self.settings.network_profile.clone(),
            data: DataResponse {
                provider_id: self.settings.provider_id.clone(),
                endpoints: self.synthesized_endpoints(response.endpoints.len(), binding_id),
            },
        };

        let objects = provider_routing_objects(&ProviderRouting {
            binding_id,
            consumer_id: &request.network_data.data.consumer_id,
            provider_id: &self.settings.provider_id,
            system_domain: &self.settings.system_domain,
            ingress_port: self.settings.load_balancer_port,
            endpoints: &response.endpoints,
        });

        if let Err(e) = self
            .config_store
            .create_routing_objects(binding_id, &objects)
            .await
        {
            error!(error = %e, binding_id = %binding_id, "Failed to create routing objects");
            self.post_delete(binding_id).await?;
            return Err(e);
        }

        info!(
            binding_id = %binding_id,
            endpoints = response.endpoints.len(),
            "Producer endpoints published"
        );
        Ok(response)
    }

    async fn post_delete(&self, binding_id: &str) -> Result<(), ProxyError> {
        if let Err(e) = self.config_store.delete_binding(binding_id).await {
            warn!(error = %e, binding_id = %binding_id, "Failed to remove routing objects");
        }
        Ok(())
    }

    fn post_catalog(&self, catalog: &mut Catalog) -> Result<(), ProxyError> {
        for service in &mut catalog.services {
            service.name = format!("{}{}", self.settings.service_name_prefix, service.name);
            if self.settings.plan_metadata.is_empty() {
                continue;
            }
            for plan in &mut service.plans {
                plan.merge_metadata(&self.settings.plan_metadata);
            }
        }
        Ok(())
    }

    fn has_adapt_credentials(&self) -> bool {
        true
    }

    fn role(&self) -> ProxyRole {
        ProxyRole::Producer
    }
}
