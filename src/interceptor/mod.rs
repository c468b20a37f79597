// Role hooks around the upstream broker calls
//
// Exactly one role is selected from configuration at startup and shared by
// every request for the lifetime of the process.

pub mod consumer;
pub mod noop;
pub mod producer;

pub use consumer::ConsumerInterceptor;
pub use noop::NoOpInterceptor;
pub use producer::{ProducerInterceptor, ProducerSettings};

use crate::config::{Config, ProxyRole};
use crate::core::errors::ProxyError;
use crate::mesh::FileConfigStore;
use crate::model::{BindRequest, BindResponse, Catalog, Credentials, EndpointMapping};
use async_trait::async_trait;
use std::sync::Arc;

/// Credential rewriting handed to `post_bind`
#[async_trait]
pub trait CredentialsAdapter: Send + Sync {
    async fn adapt(
        &self,
        credentials: &Credentials,
        mappings: &[EndpointMapping],
    ) -> Result<BindResponse, ProxyError>;
}

/// Hooks a role applies to bind, unbind and catalog calls
#[async_trait]
pub trait ServiceBrokerInterceptor: Send + Sync {
    /// Mutate the bind request before it is forwarded
    async fn pre_bind(&self, request: BindRequest) -> Result<BindRequest, ProxyError>;

    /// Mutate the upstream bind response before it is returned
    async fn post_bind(
        &self,
        request: &BindRequest,
        response: BindResponse,
        binding_id: &str,
        adapter: &dyn CredentialsAdapter,
    ) -> Result<BindResponse, ProxyError>;

    /// Called after the upstream broker accepted an unbind
    async fn post_delete(&self, binding_id: &str) -> Result<(), ProxyError>;

    fn post_catalog(&self, catalog: &mut Catalog) -> Result<(), ProxyError>;

    /// Whether this role serves the adapt_credentials endpoint
    fn has_adapt_credentials(&self) -> bool {
        false
    }

    fn role(&self) -> ProxyRole;
}

/// Build the interceptor for the configured role
pub fn build_interceptor(config: &Config) -> Result<Arc<dyn ServiceBrokerInterceptor>, ProxyError> {
    let interceptor: Arc<dyn ServiceBrokerInterceptor> = match config.role {
        ProxyRole::NoOp => Arc::new(NoOpInterceptor),
        ProxyRole::Consumer => {
            let store = Arc::new(FileConfigStore::new(config.mesh_config_dir.clone()));
            Arc::new(ConsumerInterceptor::from_config(config, store))
        }
        ProxyRole::Producer => {
            let store = Arc::new(FileConfigStore::new(config.mesh_config_dir.clone()));
            Arc::new(ProducerInterceptor::new(ProducerSettings::from_config(config)?, store))
        }
    };
    Ok(interceptor)
}
