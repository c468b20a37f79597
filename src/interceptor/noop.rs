use crate::config::ProxyRole;
use crate::core::errors::ProxyError;
use crate::interceptor::{CredentialsAdapter, ServiceBrokerInterceptor};
use crate::model::{BindRequest, BindResponse, Catalog};
use async_trait::async_trait;

/// Pure pass-through role
pub struct NoOpInterceptor;

#[async_trait]
impl ServiceBrokerInterceptor for NoOpInterceptor {
    async fn pre_bind(&self, request: BindRequest) -> Result<BindRequest, ProxyError> {
        Ok(request)
    }

    async fn post_bind(
        &self,
        _request: &BindRequest,
        response: BindResponse,
        _binding_id: &str,
        _adapter: &dyn CredentialsAdapter,
    ) -> Result<BindResponse, ProxyError> {
        Ok(response)
    }

    async fn post_delete(&self, _binding_id: &str) -> Result<(), ProxyError> {
        Ok(())
    }

    fn post_catalog(&self, _catalog: &mut Catalog) -> Result<(), ProxyError> {
        Ok(())
    }

    fn role(&self) -> ProxyRole {
        ProxyRole::NoOp
    }
}
