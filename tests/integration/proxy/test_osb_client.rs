// Integration tests for the OSB client against a mock upstream broker

use axum::body::Bytes;
use axum::http::{HeaderMap, HeaderValue, Method, StatusCode};
use mesh_broker_proxy::core::errors::ProxyError;
use mesh_broker_proxy::model::{AdaptCredentialsRequest, BindRequest, Endpoint, EndpointMapping};
use mesh_broker_proxy::proxy::{BindingRef, BrokerClient, OsbClient, RestClient};
use mockito::{Matcher, Server};
use serde_json::json;

fn client(url: &str) -> OsbClient {
    OsbClient::new(RestClient::new(url, 5, false).unwrap())
}

fn broker_headers() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert("x-broker-api-version", HeaderValue::from_static("2.14"));
    headers.insert("authorization", HeaderValue::from_static("Basic dXNlcjpwYXNz"));
    headers
}

#[tokio::test]
async fn test_get_catalog_forwards_headers() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("GET", "/v2/catalog")
        .match_header("x-broker-api-version", "2.14")
        .match_header("authorization", "Basic dXNlcjpwYXNz")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(json!({"services": [{"name": "postgres", "bindable": true}]}).to_string())
        .create_async()
        .await;

    let catalog = client(&server.url()).get_catalog(&broker_headers()).await.unwrap();

    mock.assert_async().await;
    assert_eq!(catalog.services.len(), 1);
    assert_eq!(catalog.services[0].name, "postgres");
    assert_eq!(
        serde_json::to_value(&catalog).unwrap()["services"][0]["bindable"],
        true
    );
}

#[tokio::test]
async fn test_bind_sends_query_and_body() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("PUT", "/v2/service_instances/i1/service_bindings/b1")
        .match_query(Matcher::UrlEncoded("accepts_incomplete".into(), "true".into()))
        .match_header("content-type", "application/json")
        .match_body(Matcher::Json(json!({"service_id": "postgres", "plan_id": "small"})))
        .with_status(201)
        .with_body(json!({"credentials": {"uri": "postgres://db:5432/x"}}).to_string())
        .create_async()
        .await;

    let binding = BindingRef::new("i1", "b1").with_query(Some("accepts_incomplete=true".to_string()));
    let request: BindRequest =
        serde_json::from_value(json!({"service_id": "postgres", "plan_id": "small"})).unwrap();
    let response = client(&server.url())
        .bind(&binding, &HeaderMap::new(), &request)
        .await
        .unwrap();

    mock.assert_async().await;
    assert_eq!(
        serde_json::to_value(&response).unwrap(),
        json!({"credentials": {"uri": "postgres://db:5432/x"}})
    );
}

#[tokio::test]
async fn test_upstream_error_envelope_is_preserved() {
    let mut server = Server::new_async().await;
    server
        .mock("PUT", "/v2/service_instances/i1/service_bindings/b1")
        .with_status(409)
        .with_body(json!({"error": "Conflict", "description": "binding exists"}).to_string())
        .create_async()
        .await;

    let err = client(&server.url())
        .bind(&BindingRef::new("i1", "b1"), &HeaderMap::new(), &BindRequest::default())
        .await
        .unwrap_err();

    assert_eq!(err.status_code(), 409);
    let ProxyError::Upstream(http_error) = err else {
        panic!("expected an upstream error");
    };
    assert_eq!(http_error.error, "Conflict");
    assert_eq!(
        http_error.description,
        format!(
            "binding exists: from call to PUT {}/v2/service_instances/i1/service_bindings/b1",
            server.url()
        )
    );
}

#[tokio::test]
async fn test_non_json_error_body_is_wrapped() {
    let mut server = Server::new_async().await;
    server
        .mock("GET", "/v2/catalog")
        .with_status(500)
        .with_body("oops")
        .create_async()
        .await;

    let err = client(&server.url())
        .get_catalog(&HeaderMap::new())
        .await
        .unwrap_err();

    assert_eq!(err.status_code(), 500);
    let ProxyError::Upstream(http_error) = err else {
        panic!("expected an upstream error");
    };
    assert_eq!(http_error.error, "InvalidJSON");
    assert_eq!(
        http_error.description,
        format!("invalid JSON 'oops': from call to GET {}/v2/catalog", server.url())
    );
}

#[tokio::test]
async fn test_undecodable_success_body_is_bad_gateway() {
    let mut server = Server::new_async().await;
    server
        .mock("GET", "/v2/catalog")
        .with_status(200)
        .with_body("not json")
        .create_async()
        .await;

    let err = client(&server.url())
        .get_catalog(&HeaderMap::new())
        .await
        .unwrap_err();
    assert!(matches!(err, ProxyError::Unmarshal { .. }));
    assert_eq!(err.status_code(), 502);
    assert!(err.to_string().starts_with("Can't unmarshal response from"));
}

#[tokio::test]
async fn test_unreachable_upstream_is_transport_error() {
    let err = client("http://127.0.0.1:1")
        .get_catalog(&HeaderMap::new())
        .await
        .unwrap_err();
    assert!(matches!(err, ProxyError::Transport { .. }));
    assert_eq!(err.status_code(), 502);
}

#[tokio::test]
async fn test_adapt_credentials_posts_to_binding() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock(
            "POST",
            "/v2/service_instances/i1/service_bindings/b1/adapt_credentials",
        )
        .match_body(Matcher::PartialJson(json!({
            "endpoint_mappings": [{"source": {"host": "db", "port": 5432}, "target": {"host": "mesh", "port": 9000}}]
        })))
        .with_status(200)
        .with_body(
            json!({
                "credentials": {"uri": "postgres://mesh:9000/x"},
                "endpoints": [{"host": "mesh", "port": 9000}]
            })
            .to_string(),
        )
        .create_async()
        .await;

    let request = AdaptCredentialsRequest::new(
        serde_json::from_value(json!({"uri": "postgres://db:5432/x"})).unwrap(),
        vec![EndpointMapping::new(Endpoint::new("db", 5432), Endpoint::new("mesh", 9000))],
    );
    let response = client(&server.url())
        .adapt_credentials(&BindingRef::new("i1", "b1"), &HeaderMap::new(), &request)
        .await
        .unwrap();

    mock.assert_async().await;
    assert_eq!(response.endpoints, vec![Endpoint::new("mesh", 9000)]);
}

#[tokio::test]
async fn test_forward_relays_any_status() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("DELETE", "/v2/service_instances/i1")
        .match_query(Matcher::UrlEncoded("plan_id".into(), "small".into()))
        .with_status(410)
        .with_header("content-type", "application/json")
        .with_body("{}")
        .create_async()
        .await;

    let response = client(&server.url())
        .forward(
            Method::DELETE,
            "/v2/service_instances/i1?plan_id=small",
            &broker_headers(),
            Bytes::new(),
        )
        .await
        .unwrap();

    mock.assert_async().await;
    assert_eq!(response.status, StatusCode::GONE);
    assert_eq!(response.headers["content-type"], "application/json");
    assert_eq!(&response.body[..], b"{}");
}
