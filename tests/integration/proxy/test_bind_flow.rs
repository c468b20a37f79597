// End-to-end bind and unbind through the router, a real upstream client and
// the file-backed routing store

use crate::common::*;
use axum::body::{to_bytes, Body};
use axum::http::{Method, Request, StatusCode};
use axum::Router;
use mesh_broker_proxy::api::{create_router, AppState};
use mesh_broker_proxy::config::{Config, ProxyRole};
use mesh_broker_proxy::interceptor::build_interceptor;
use mesh_broker_proxy::proxy::{OsbClient, RestClient};
use mockito::{Matcher, Server};
use serde_json::{json, Value};
use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;
use tower::ServiceExt;

const BINDING_PATH: &str = "/v2/service_instances/instance-1/service_bindings/postgres-34de6ac";

fn router(upstream: &str, role: ProxyRole, mesh_dir: &Path) -> Router {
    let mut config = Config::test_config();
    config.forward_url = upstream.to_string();
    config.role = role;
    config.mesh_config_dir = mesh_dir.to_path_buf();

    let rest = RestClient::new(&config.forward_url, config.upstream_timeout_secs, false).unwrap();
    let interceptor = build_interceptor(&config).unwrap();
    create_router(AppState::new(
        Arc::new(OsbClient::new(rest)),
        interceptor,
        Arc::new(config),
    ))
}

async fn body_json(response: axum::response::Response) -> Value {
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&body).unwrap()
}

#[tokio::test]
async fn test_producer_bind_and_unbind() {
    let mut server = Server::new_async().await;
    let mesh_dir = TempDir::new().unwrap();
    let bind_mock = server
        .mock("PUT", BINDING_PATH)
        .match_body(Matcher::PartialJson(json!({
            "network_data": {"data": {"consumer_id": CONSUMER_ID}}
        })))
        .with_status(201)
        .with_header("content-type", "application/json")
        .with_body(postgres_bind_response().to_string())
        .create_async()
        .await;
    let unbind_mock = server
        .mock("DELETE", BINDING_PATH)
        .match_query(Matcher::Any)
        .with_status(200)
        .with_body("{}")
        .create_async()
        .await;

    let app = router(&server.url(), ProxyRole::Producer, mesh_dir.path());

    let request = Request::builder()
        .method(Method::PUT)
        .uri(BINDING_PATH)
        .header("content-type", "application/json")
        .body(Body::from(
            json!({
                "service_id": "postgres",
                "plan_id": "small",
                "network_data": {
                    "network_profile_id": NETWORK_PROFILE,
                    "data": {"consumer_id": CONSUMER_ID}
                }
            })
            .to_string(),
        ))
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    bind_mock.assert_async().await;

    let body = body_json(response).await;
    assert_eq!(
        body["network_data"],
        json!({
            "network_profile_id": NETWORK_PROFILE,
            "data": {
                "provider_id": PROVIDER_ID,
                "endpoints": [{"host": "1.postgres-34de6ac.istio.sapcloud.io", "port": 9000}]
            }
        })
    );
    assert_eq!(body["endpoints"], json!([{"host": "10.11.241.0", "port": 47637}]));
    assert_eq!(body["credentials"]["username"], "mma4G8N0isoxe17v");

    let routing_file = mesh_dir.path().join("postgres-34de6ac.yml");
    let documents = std::fs::read_to_string(&routing_file).unwrap();
    assert_eq!(documents.matches("---\n").count(), 3);
    assert!(documents.contains("kind: Gateway"));
    assert!(documents.contains("kind: VirtualService"));
    assert!(documents.contains("kind: ServiceEntry"));
    assert!(documents.contains("1.postgres-34de6ac.istio.sapcloud.io"));

    let request = Request::builder()
        .method(Method::DELETE)
        .uri(format!("{}?service_id=postgres&plan_id=small", BINDING_PATH))
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    unbind_mock.assert_async().await;
    assert!(!routing_file.exists());
}

#[tokio::test]
async fn test_consumer_bind_redirects_to_local_service() {
    let mut server = Server::new_async().await;
    let mesh_dir = TempDir::new().unwrap();
    let producer_answer = json!({
        "credentials": {
            "hostname": "10.11.241.0",
            "port": 47637,
            "uri": "postgres://u:p@10.11.241.0:47637/db"
        },
        "endpoints": [{"host": "10.11.241.0", "port": 47637}],
        "network_data": {
            "network_profile_id": NETWORK_PROFILE,
            "data": {
                "provider_id": PROVIDER_ID,
                "endpoints": [{"host": "1.postgres-34de6ac.istio.sapcloud.io", "port": 9000}]
            }
        }
    });
    let bind_mock = server
        .mock("PUT", BINDING_PATH)
        .with_status(201)
        .with_body(producer_answer.to_string())
        .create_async()
        .await;
    let adapt_mock = server
        .mock("POST", format!("{}/adapt_credentials", BINDING_PATH).as_str())
        .match_body(Matcher::PartialJson(json!({
            "endpoint_mappings": [{
                "source": {"host": "10.11.241.0", "port": 47637},
                "target": {"host": "svc-0-postgres-34de6ac", "port": 5555}
            }]
        })))
        .with_status(200)
        .with_body(
            json!({
                "credentials": {
                    "hostname": "svc-0-postgres-34de6ac",
                    "port": 5555,
                    "uri": "postgres://u:p@svc-0-postgres-34de6ac:5555/db"
                },
                "endpoints": [{"host": "svc-0-postgres-34de6ac", "port": 5555}]
            })
            .to_string(),
        )
        .create_async()
        .await;
    let unbind_mock = server
        .mock("DELETE", BINDING_PATH)
        .with_status(200)
        .with_body("{}")
        .create_async()
        .await;

    let app = router(&server.url(), ProxyRole::Consumer, mesh_dir.path());
    let request = Request::builder()
        .method(Method::PUT)
        .uri(BINDING_PATH)
        .body(Body::from(json!({"service_id": "postgres"}).to_string()))
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    bind_mock.assert_async().await;
    adapt_mock.assert_async().await;

    let body = body_json(response).await;
    assert_eq!(body["credentials"]["uri"], "postgres://u:p@svc-0-postgres-34de6ac:5555/db");
    assert_eq!(body["network_data"], producer_answer["network_data"]);

    let routing_file = mesh_dir.path().join("postgres-34de6ac.yml");
    let documents = std::fs::read_to_string(&routing_file).unwrap();
    assert_eq!(documents.matches("---\n").count(), 7);
    assert!(documents.contains("kind: Service\n"));
    assert!(documents.contains("kind: DestinationRule"));

    let request = Request::builder()
        .method(Method::DELETE)
        .uri(BINDING_PATH)
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    unbind_mock.assert_async().await;
    assert!(!routing_file.exists());
}

#[tokio::test]
async fn test_consumer_bind_passes_upstream_error_through() {
    let mut server = Server::new_async().await;
    let mesh_dir = TempDir::new().unwrap();
    server
        .mock("PUT", BINDING_PATH)
        .with_status(422)
        .with_body(json!({"error": "RequiresApp", "description": "app_guid missing"}).to_string())
        .create_async()
        .await;

    let app = router(&server.url(), ProxyRole::Consumer, mesh_dir.path());
    let request = Request::builder()
        .method(Method::PUT)
        .uri(BINDING_PATH)
        .body(Body::from(json!({"service_id": "postgres"}).to_string()))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let error = body_json(response).await;
    assert_eq!(error["error"], "RequiresApp");
    assert!(error["description"]
        .as_str()
        .unwrap()
        .starts_with("app_guid missing: from call to PUT"));
}

#[tokio::test]
async fn test_unknown_route_reaches_upstream() {
    let mut server = Server::new_async().await;
    let mesh_dir = TempDir::new().unwrap();
    let mock = server
        .mock("GET", "/v2/service_instances/instance-1/last_operation")
        .match_query(Matcher::UrlEncoded("operation".into(), "op-1".into()))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(json!({"state": "succeeded"}).to_string())
        .create_async()
        .await;

    let app = router(&server.url(), ProxyRole::NoOp, mesh_dir.path());
    let request = Request::builder()
        .uri("/v2/service_instances/instance-1/last_operation?operation=op-1")
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    mock.assert_async().await;
    assert_eq!(body_json(response).await, json!({"state": "succeeded"}));
}
