// Property tests: unknown envelope fields survive decode and re-encode

use mesh_broker_proxy::model::{BindRequest, BindResponse, Credentials, Endpoint};
use proptest::prelude::*;
use serde_json::{json, Map, Value};

fn scalar() -> impl Strategy<Value = Value> {
    prop_oneof![
        any::<i64>().prop_map(Value::from),
        any::<bool>().prop_map(Value::from),
        "[a-zA-Z0-9 :/@.-]{0,24}".prop_map(Value::from),
        Just(Value::Null),
    ]
}

fn unknown_value() -> impl Strategy<Value = Value> {
    scalar().prop_recursive(3, 16, 4, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..4).prop_map(Value::Array),
            prop::collection::btree_map("[a-z]{1,6}", inner, 0..4)
                .prop_map(|m| Value::Object(m.into_iter().collect())),
        ]
    })
}

// Keys of at most eight lowercase letters never collide with a known field
fn unknown_fields() -> impl Strategy<Value = Map<String, Value>> {
    prop::collection::btree_map("[a-z]{1,8}", unknown_value(), 0..6)
        .prop_map(|m| m.into_iter().collect())
}

fn endpoints() -> impl Strategy<Value = Vec<Endpoint>> {
    prop::collection::vec(
        ("[a-z][a-z0-9.-]{0,15}", 1u16..=u16::MAX).prop_map(|(host, port)| Endpoint::new(host, port)),
        0..4,
    )
}

proptest! {
    #[test]
    fn credentials_keep_unknown_fields(fields in unknown_fields()) {
        let body = Value::Object(fields);
        let credentials: Credentials = serde_json::from_value(body.clone()).unwrap();
        prop_assert!(credentials.endpoints.is_empty());
        prop_assert_eq!(serde_json::to_value(&credentials).unwrap(), body);
    }

    #[test]
    fn credentials_endpoints_are_stable(fields in unknown_fields(), endpoints in endpoints()) {
        let credentials = Credentials {
            additional_properties: fields.into(),
            endpoints: endpoints.clone(),
        };
        let encoded = serde_json::to_value(&credentials).unwrap();
        let decoded: Credentials = serde_json::from_value(encoded.clone()).unwrap();
        prop_assert_eq!(&decoded.endpoints, &endpoints);
        prop_assert_eq!(serde_json::to_value(&decoded).unwrap(), encoded);
    }

    #[test]
    fn bind_request_keeps_unknown_fields(fields in unknown_fields()) {
        let body = Value::Object(fields);
        let request: BindRequest = serde_json::from_value(body.clone()).unwrap();
        prop_assert!(request.network_data.is_empty());
        prop_assert_eq!(serde_json::to_value(&request).unwrap(), body);
    }

    #[test]
    fn bind_response_keeps_unknown_fields(fields in unknown_fields(), credential_fields in unknown_fields()) {
        let mut body = fields;
        body.insert("credentials".to_string(), Value::Object(credential_fields));
        let body = Value::Object(body);
        let response: BindResponse = serde_json::from_value(body.clone()).unwrap();
        prop_assert_eq!(serde_json::to_value(&response).unwrap(), body);
    }
}

#[test]
fn test_bind_response_without_credentials_gains_empty_object() {
    let response: BindResponse = serde_json::from_value(json!({"route_service_url": "r"})).unwrap();
    assert_eq!(
        serde_json::to_value(&response).unwrap(),
        json!({"route_service_url": "r", "credentials": {}})
    );
}
