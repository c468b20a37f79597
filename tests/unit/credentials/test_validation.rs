// Unit tests for strict adapt_credentials validation

use mesh_broker_proxy::core::errors::{ProxyError, ValidationError};
use mesh_broker_proxy::credentials::{self, validate_adapt_request};
use mesh_broker_proxy::model::AdaptCredentialsRequest;
use serde_json::{json, Value};

fn body(credentials: Value, mappings: Value) -> Vec<u8> {
    json!({"credentials": credentials, "endpoint_mappings": mappings})
        .to_string()
        .into_bytes()
}

#[test]
fn test_mismatched_source_fails_although_parts_are_well_formed() {
    let request = body(
        json!({"uri": "postgres://user:pw@c:1/db", "hostname": "c", "port": 1}),
        json!([{"source": {"host": "a", "port": 1}, "target": {"host": "b", "port": 2}}]),
    );
    let err = validate_adapt_request(&request).unwrap_err();
    assert!(matches!(err, ValidationError::NotApplicable { .. }));
    assert_eq!(
        err.to_string(),
        "Endpoint mapping source 'a:1' does not match credentials 'c:1'"
    );
}

#[test]
fn test_string_and_numeric_ports_compare_equal() {
    let request = body(
        json!({"uri": "postgres://user:pw@c:47637/db", "hostname": "c", "port": "47637"}),
        json!([{"source": {"host": "c", "port": 47637}, "target": {"host": "b", "port": "2"}}]),
    );
    assert!(validate_adapt_request(&request).is_ok());
}

#[test]
fn test_validated_body_adapts() {
    let request = body(
        json!({"uri": "postgres://user:pw@c:47637/db", "hostname": "c", "port": 47637, "username": "user"}),
        json!([{"source": {"host": "c", "port": 47637}, "target": {"host": "appnethost", "port": 9876}}]),
    );
    validate_adapt_request(&request).unwrap();

    let decoded: AdaptCredentialsRequest = serde_json::from_slice(&request).unwrap();
    let response = credentials::adapt(&decoded.credentials, &decoded.endpoint_mappings).unwrap();
    let adapted = serde_json::to_value(&response.credentials).unwrap();
    assert_eq!(adapted["uri"], "postgres://user:pw@appnethost:9876/db");
    assert_eq!(adapted["username"], "user");
}

#[test]
fn test_two_mappings_are_rejected() {
    let mapping = json!({"source": {"host": "c", "port": 1}, "target": {"host": "b", "port": 2}});
    let request = body(
        json!({"uri": "postgres://user:pw@c:1/db", "hostname": "c", "port": 1}),
        json!([mapping.clone(), mapping]),
    );
    assert!(matches!(
        validate_adapt_request(&request),
        Err(ValidationError::MappingCount(2))
    ));
}

#[test]
fn test_validation_errors_are_client_errors() {
    let err = ProxyError::from(validate_adapt_request(b"{").unwrap_err());
    assert_eq!(err.status_code(), 400);

    let err = ProxyError::from(validate_adapt_request(br#"{"credentials": {}}"#).unwrap_err());
    assert_eq!(err.status_code(), 400);
}
