// HTTP API: OSB routes intercepted by the active role, everything else forwarded

pub mod handlers;
pub mod middleware;
pub mod responses;

use crate::config::Config;
use crate::interceptor::ServiceBrokerInterceptor;
use crate::proxy::{BrokerClient, InterceptedBroker};
use axum::routing::{get, post, put};
use axum::Router;
use std::sync::Arc;

pub use responses::{ApiError, HealthResponse};

pub const CATALOG_PATH: &str = "/v2/catalog";
pub const BINDING_PATH: &str = "/v2/service_instances/:instance_id/service_bindings/:binding_id";
pub const ADAPT_CREDENTIALS_PATH: &str =
    "/v2/service_instances/:instance_id/service_bindings/:binding_id/adapt_credentials";

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub broker: InterceptedBroker,
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(
        broker: Arc<dyn BrokerClient>,
        interceptor: Arc<dyn ServiceBrokerInterceptor>,
        config: Arc<Config>,
    ) -> Self {
        Self {
            broker: InterceptedBroker::new(broker, interceptor),
            config,
        }
    }
}

/// Create the router
///
/// The adapt_credentials routes are mounted only when the role supports
/// adaptation; otherwise those paths fall through to the opaque forward.
pub fn create_router(app_state: AppState) -> Router {
    let mut router = Router::new()
        .route("/health", get(handlers::health_handler))
        .route(
            CATALOG_PATH,
            get(handlers::catalog_handler).fallback(handlers::forward_handler),
        )
        .route(
            BINDING_PATH,
            put(handlers::bind_handler)
                .delete(handlers::unbind_handler)
                .fallback(handlers::forward_handler),
        );

    if app_state.broker.interceptor().has_adapt_credentials() {
        router = router.route(
            ADAPT_CREDENTIALS_PATH,
            post(handlers::adapt_credentials_handler)
                .put(handlers::validated_adapt_credentials_handler)
                .fallback(handlers::forward_handler),
        );
    }

    router
        .fallback(handlers::forward_handler)
        .layer(middleware::body_size_limit_layer(
            app_state.config.body_size_limit_bytes,
        ))
        .layer(middleware::tracing_layer())
        .with_state(app_state)
}
