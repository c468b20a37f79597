// Mesh routing objects that make producer endpoints reachable from consumers

pub mod file_store;

pub use file_store::FileConfigStore;

use crate::core::errors::ProxyError;
use crate::model::Endpoint;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::BTreeMap;

/// Label carried by every object created for a binding
pub const BINDING_ID_LABEL: &str = "mesh-broker-proxy/binding-id";

/// Port of the local service a consumer application connects to
pub const CONSUMER_SERVICE_PORT: u16 = 5555;

const NETWORKING_API_VERSION: &str = "networking.istio.io/v1beta1";
const CORE_API_VERSION: &str = "v1";
const CERT_DIR: &str = "/etc/istio/certs";
const EGRESS_CERT_DIR: &str = "/etc/istio/egressgateway-certs";
const EGRESS_GATEWAY_HOST: &str = "istio-egressgateway.istio-system.svc.cluster.local";
const EGRESS_GATEWAY_PORT: u16 = 443;

/// Persistence of routing objects, keyed by binding id
#[async_trait]
pub trait ConfigStore: Send + Sync {
    async fn create_routing_objects(
        &self,
        binding_id: &str,
        objects: &[RoutingObject],
    ) -> Result<(), ProxyError>;

    /// Remove every object labelled with `binding_id`
    async fn delete_binding(&self, binding_id: &str) -> Result<(), ProxyError>;
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObjectMeta {
    pub name: String,
    #[serde(default)]
    pub labels: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoutingObject {
    pub api_version: String,
    pub kind: String,
    pub metadata: ObjectMeta,
    pub spec: Value,
}

impl RoutingObject {
    fn new(kind: &str, name: String, binding_id: &str, spec: Value) -> Self {
        Self::with_api_version(NETWORKING_API_VERSION, kind, name, binding_id, spec)
    }

    fn with_api_version(
        api_version: &str,
        kind: &str,
        name: String,
        binding_id: &str,
        spec: Value,
    ) -> Self {
        let mut labels = BTreeMap::new();
        labels.insert(BINDING_ID_LABEL.to_string(), binding_id.to_string());
        Self {
            api_version: api_version.to_string(),
            kind: kind.to_string(),
            metadata: ObjectMeta { name, labels },
            spec,
        }
    }
}

/// Inputs for the routing objects of one producer binding
#[derive(Debug, Clone)]
pub struct ProviderRouting<'a> {
    pub binding_id: &'a str,
    pub consumer_id: &'a str,
    pub provider_id: &'a str,
    pub system_domain: &'a str,
    pub ingress_port: u16,
    /// Backing-service endpoints, in the order their hosts were synthesized
    pub endpoints: &'a [Endpoint],
}

/// Reachable host synthesized for the endpoint at `index`
pub fn endpoint_host(index: usize, binding_id: &str, system_domain: &str) -> String {
    format!("{}.{}.{}", index + 1, binding_id, system_domain)
}

/// Gateway, VirtualService and ServiceEntry for every endpoint of a binding
pub fn provider_routing_objects(routing: &ProviderRouting<'_>) -> Vec<RoutingObject> {
    let mut objects = Vec::with_capacity(routing.endpoints.len() * 3);
    for (index, endpoint) in routing.endpoints.iter().enumerate() {
        let name = object_name(&format!("{}-{}", index + 1, routing.binding_id));
        let host = endpoint_host(index, routing.binding_id, routing.system_domain);
        let service_host = format!("{}.service-entry", name);

        let mut tls = json!({
            "mode": "MUTUAL",
            "serverCertificate": format!("{}/{}.crt", CERT_DIR, routing.provider_id),
            "privateKey": format!("{}/{}.key", CERT_DIR, routing.provider_id),
            "caCertificates": format!("{}/ca.crt", CERT_DIR),
        });
        if !routing.consumer_id.is_empty() {
            tls["subjectAltNames"] = json!([routing.consumer_id]);
        }

        objects.push(RoutingObject::new(
            "Gateway",
            format!("{}-gateway", name),
            routing.binding_id,
            json!({
                "selector": {"istio": "ingressgateway"},
                "servers": [{
                    "port": {"number": routing.ingress_port, "name": format!("tls-{}", name), "protocol": "TLS"},
                    "hosts": [host],
                    "tls": tls,
                }],
            }),
        ));
        objects.push(RoutingObject::new(
            "VirtualService",
            format!("{}-virtual-service", name),
            routing.binding_id,
            json!({
                "hosts": [host],
                "gateways": [format!("{}-gateway", name)],
                "tcp": [{
                    "match": [{"port": routing.ingress_port}],
                    "route": [{"destination": {"host": service_host, "port": {"number": endpoint.port}}}],
                }],
            }),
        ));
        objects.push(RoutingObject::new(
            "ServiceEntry",
            format!("{}-service-entry", name),
            routing.binding_id,
            json!({
                "hosts": [service_host],
                "ports": [{"number": endpoint.port, "name": format!("tcp-{}", endpoint.port), "protocol": "TCP"}],
                "resolution": "DNS",
                "location": "MESH_EXTERNAL",
                "endpoints": [{"address": endpoint.host}],
            }),
        ));
    }
    objects
}

/// Inputs for the routing objects of one consumer binding
#[derive(Debug, Clone)]
pub struct ConsumerRouting<'a> {
    pub binding_id: &'a str,
    pub provider_id: &'a str,
    /// Mesh-reachable producer endpoints from the bind response network data
    pub endpoints: &'a [Endpoint],
}

/// Local service name for the producer endpoint at `index`
pub fn consumer_service_name(index: usize, binding_id: &str) -> String {
    object_name(&format!("svc-{}-{}", index, binding_id))
}

/// Local endpoint the consumer application uses instead of the producer endpoint at `index`
pub fn consumer_service_endpoint(index: usize, binding_id: &str) -> Endpoint {
    Endpoint::new(consumer_service_name(index, binding_id), CONSUMER_SERVICE_PORT)
}

/// Local service plus egress routing towards every producer endpoint of a binding
pub fn consumer_routing_objects(routing: &ConsumerRouting<'_>) -> Vec<RoutingObject> {
    let mut objects = Vec::with_capacity(routing.endpoints.len() * 7);
    for (index, endpoint) in routing.endpoints.iter().enumerate() {
        let service = consumer_service_name(index, routing.binding_id);
        let gateway = format!("istio-egressgateway-{}", service);
        let subject = if routing.provider_id.is_empty() {
            endpoint.host.as_str()
        } else {
            routing.provider_id
        };

        objects.push(RoutingObject::with_api_version(
            CORE_API_VERSION,
            "Service",
            service.clone(),
            routing.binding_id,
            json!({
                "ports": [{"port": CONSUMER_SERVICE_PORT, "targetPort": CONSUMER_SERVICE_PORT}],
            }),
        ));
        objects.push(RoutingObject::new(
            "ServiceEntry",
            format!("{}-service", service),
            routing.binding_id,
            json!({
                "hosts": [endpoint.host],
                "ports": [{"number": endpoint.port, "name": format!("{}-port", service), "protocol": "TLS"}],
                "resolution": "DNS",
            }),
        ));
        objects.push(RoutingObject::new(
            "VirtualService",
            format!("direct-through-egress-mesh-{}", service),
            routing.binding_id,
            json!({
                "hosts": [service],
                "gateways": ["mesh"],
                "tcp": [{
                    "match": [{"gateways": ["mesh"], "port": CONSUMER_SERVICE_PORT}],
                    "route": [{"destination": {
                        "host": EGRESS_GATEWAY_HOST,
                        "port": {"number": EGRESS_GATEWAY_PORT},
                        "subset": service,
                    }}],
                }],
            }),
        ));
        objects.push(RoutingObject::new(
            "VirtualService",
            format!("egress-gateway-{}", service),
            routing.binding_id,
            json!({
                "hosts": [service],
                "gateways": [gateway],
                "tcp": [{
                    "match": [{"gateways": [gateway], "port": EGRESS_GATEWAY_PORT}],
                    "route": [{"destination": {
                        "host": endpoint.host,
                        "port": {"number": endpoint.port},
                        "subset": service,
                    }}],
                }],
            }),
        ));
        objects.push(RoutingObject::new(
            "Gateway",
            gateway.clone(),
            routing.binding_id,
            json!({
                "selector": {"istio": "egressgateway"},
                "servers": [{
                    "port": {
                        "number": EGRESS_GATEWAY_PORT,
                        "name": format!("tcp-port-{}", EGRESS_GATEWAY_PORT),
                        "protocol": "TLS",
                    },
                    "hosts": [endpoint.host],
                    "tls": {
                        "mode": "MUTUAL",
                        "serverCertificate": format!("{}/cert-chain.pem", CERT_DIR),
                        "privateKey": format!("{}/key.pem", CERT_DIR),
                        "caCertificates": format!("{}/root-cert.pem", CERT_DIR),
                    },
                }],
            }),
        ));
        objects.push(RoutingObject::new(
            "DestinationRule",
            format!("egressgateway-{}", service),
            routing.binding_id,
            json!({
                "host": endpoint.host,
                "subsets": [{
                    "name": service,
                    "trafficPolicy": {"portLevelSettings": [{
                        "port": {"number": endpoint.port},
                        "tls": {
                            "mode": "MUTUAL",
                            "caCertificates": format!("{}/ca.crt", EGRESS_CERT_DIR),
                            "clientCertificate": format!("{}/client.crt", EGRESS_CERT_DIR),
                            "privateKey": format!("{}/client.key", EGRESS_CERT_DIR),
                            "sni": endpoint.host,
                            "subjectAltNames": [subject],
                        },
                    }]},
                }],
            }),
        ));
        objects.push(RoutingObject::new(
            "DestinationRule",
            format!("sidecar-to-egress-{}", service),
            routing.binding_id,
            json!({
                "host": EGRESS_GATEWAY_HOST,
                "subsets": [{
                    "name": service,
                    "trafficPolicy": {"tls": {"mode": "ISTIO_MUTUAL", "sni": endpoint.host}},
                }],
            }),
        ));
    }
    objects
}

/// Lowercase DNS-label form of `raw`
fn object_name(raw: &str) -> String {
    let name: String = raw
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() {
                c.to_ascii_lowercase()
            } else {
                '-'
            }
        })
        .collect();
    name.trim_matches('-').to_string()
}
