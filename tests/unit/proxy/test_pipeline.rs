// Unit tests for the interceptor pipeline around the upstream broker

use crate::common::*;
use axum::body::Bytes;
use axum::http::{HeaderMap, Method, StatusCode};
use mesh_broker_proxy::core::errors::ProxyError;
use mesh_broker_proxy::interceptor::{CredentialsAdapter, NoOpInterceptor};
use mesh_broker_proxy::model::{BindRequest, Endpoint, EndpointMapping};
use mesh_broker_proxy::proxy::{BindingRef, InterceptedBroker, UpstreamAdapter};
use serde_json::json;
use std::sync::Arc;

fn binding() -> BindingRef {
    BindingRef::new("instance-1", "binding-1")
}

#[tokio::test]
async fn test_consumer_bind_forwards_stamped_request() {
    let broker = Arc::new(MockBrokerClient::default());
    let pipeline = InterceptedBroker::new(broker.clone(), Arc::new(consumer()));

    let request: BindRequest = serde_json::from_value(json!({"service_id": "postgres"})).unwrap();
    pipeline
        .bind(&binding(), &HeaderMap::new(), request)
        .await
        .unwrap();

    let forwarded = broker.bind_requests.lock().unwrap();
    assert_eq!(forwarded.len(), 1);
    assert_eq!(forwarded[0].network_data.network_profile_id, NETWORK_PROFILE);
    assert_eq!(forwarded[0].network_data.data.consumer_id, CONSUMER_ID);
}

#[tokio::test]
async fn test_consumer_bind_asks_upstream_to_adapt() {
    let broker = Arc::new(MockBrokerClient {
        bind_response: producer_bind_response(),
        ..Default::default()
    });
    let store = Arc::new(MockConfigStore::default());
    let pipeline = InterceptedBroker::new(broker.clone(), Arc::new(consumer_with(store.clone())));

    let response = pipeline
        .bind(&binding(), &HeaderMap::new(), BindRequest::default())
        .await
        .unwrap();

    let adapt_requests = broker.adapt_requests.lock().unwrap();
    assert_eq!(adapt_requests.len(), 1);
    assert_eq!(
        adapt_requests[0].endpoint_mappings,
        vec![EndpointMapping::new(
            Endpoint::new("10.11.241.0", 47637),
            Endpoint::new("svc-0-binding-1", 5555),
        )]
    );
    assert_eq!(response.endpoints, vec![Endpoint::new("svc-0-binding-1", 5555)]);
    assert_eq!(response.network_data.data.provider_id, PROVIDER_ID);
    assert_eq!(store.created.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn test_pre_bind_failure_skips_upstream() {
    let broker = Arc::new(MockBrokerClient::default());
    let interceptor = mesh_broker_proxy::interceptor::ConsumerInterceptor {
        network_profile: String::new(),
        ..consumer()
    };
    let pipeline = InterceptedBroker::new(broker.clone(), Arc::new(interceptor));

    let result = pipeline
        .bind(&binding(), &HeaderMap::new(), BindRequest::default())
        .await;
    assert!(result.is_err());
    assert!(broker.bind_requests.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_upstream_error_skips_post_bind() {
    let broker = Arc::new(MockBrokerClient {
        fail_status: Some(409),
        ..Default::default()
    });
    let store = Arc::new(MockConfigStore::default());
    let pipeline = InterceptedBroker::new(broker, Arc::new(producer(store.clone())));

    let err = pipeline
        .bind(&binding(), &HeaderMap::new(), BindRequest::default())
        .await
        .unwrap_err();
    assert_eq!(err.status_code(), 409);
    assert!(store.created.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_unbind_notifies_role_on_success_only() {
    let store = Arc::new(MockConfigStore::default());

    let accepting = Arc::new(MockBrokerClient::default());
    let pipeline = InterceptedBroker::new(accepting.clone(), Arc::new(producer(store.clone())));
    let response = pipeline
        .unbind(
            &binding(),
            "/v2/service_instances/instance-1/service_bindings/binding-1",
            &HeaderMap::new(),
            Bytes::new(),
        )
        .await
        .unwrap();
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(accepting.forwarded.lock().unwrap()[0].0, Method::DELETE);
    assert_eq!(*store.deleted.lock().unwrap(), vec!["binding-1".to_string()]);

    let rejecting = Arc::new(MockBrokerClient {
        forward_status: StatusCode::GONE,
        ..Default::default()
    });
    let pipeline = InterceptedBroker::new(rejecting, Arc::new(producer(store.clone())));
    let response = pipeline
        .unbind(&binding(), "/v2/x", &HeaderMap::new(), Bytes::new())
        .await
        .unwrap();
    assert_eq!(response.status, StatusCode::GONE);
    assert_eq!(store.deleted.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn test_unbind_transport_failure_is_bad_gateway() {
    let broker = Arc::new(MockBrokerClient {
        transport_failure: true,
        ..Default::default()
    });
    let pipeline = InterceptedBroker::new(broker, Arc::new(NoOpInterceptor));
    let err = pipeline
        .unbind(&binding(), "/v2/x", &HeaderMap::new(), Bytes::new())
        .await
        .unwrap_err();
    assert!(matches!(err, ProxyError::Transport { .. }));
    assert_eq!(err.status_code(), 502);
}

#[tokio::test]
async fn test_upstream_adapter_calls_broker() {
    let broker = MockBrokerClient::default();
    let binding = binding();
    let headers = HeaderMap::new();
    let adapter = UpstreamAdapter::new(&broker, &binding, &headers);

    let credentials = serde_json::from_value(postgres_credentials()).unwrap();
    let mapping = EndpointMapping::new(
        Endpoint::new("10.11.241.0", 47637),
        Endpoint::new("appnethost", 9876),
    );
    let response = adapter.adapt(&credentials, &[mapping]).await.unwrap();

    assert_eq!(response.endpoints, vec![Endpoint::new("appnethost", 9876)]);
    assert_eq!(broker.adapt_requests.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn test_catalog_passes_through_role() {
    let broker = Arc::new(MockBrokerClient::default());
    let mut settings = producer_settings();
    settings.service_name_prefix = "mesh-".to_string();
    let interceptor = mesh_broker_proxy::interceptor::ProducerInterceptor::new(
        settings,
        Arc::new(MockConfigStore::default()),
    );
    let pipeline = InterceptedBroker::new(broker, Arc::new(interceptor));

    let catalog = pipeline.catalog(&HeaderMap::new()).await.unwrap();
    assert_eq!(catalog.services[0].name, "mesh-postgres");
}
