// Network endpoints and the source/target mappings used to relocate them

use crate::core::errors::ModelError;
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::fmt;

/// A host/port pair
///
/// Decoding accepts the port as a JSON number or as a numeric string; a
/// missing or null port decodes as 0. Encoding always writes a number.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize)]
pub struct Endpoint {
    pub host: String,
    pub port: u16,
}

impl Endpoint {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

impl<'de> Deserialize<'de> for Endpoint {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        struct RawEndpoint {
            #[serde(default)]
            host: Option<String>,
            #[serde(default)]
            port: Option<Value>,
        }

        let raw = RawEndpoint::deserialize(deserializer)?;
        let port = match raw.port {
            None | Some(Value::Null) => 0,
            Some(value) => parse_port(&value).map_err(D::Error::custom)?,
        };
        Ok(Self {
            host: raw.host.unwrap_or_default(),
            port,
        })
    }
}

/// Relocation of one endpoint: connections to `source` must go to `target`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EndpointMapping {
    #[serde(default)]
    pub source: Endpoint,
    #[serde(default)]
    pub target: Endpoint,
}

impl EndpointMapping {
    pub fn new(source: Endpoint, target: Endpoint) -> Self {
        Self { source, target }
    }
}

/// Decode a port written either as a JSON number or as a numeric string
pub fn parse_port(value: &Value) -> Result<u16, ModelError> {
    let text = match value {
        Value::Number(number) => match number.as_f64() {
            Some(float) if number.is_f64() && float.fract() == 0.0 && (0.0..=65535.0).contains(&float) => {
                return Ok(float as u16)
            }
            _ => number.to_string(),
        },
        Value::String(text) => text.clone(),
        other => return Err(ModelError::InvalidPort(other.to_string())),
    };
    text.parse::<u16>().map_err(|_| ModelError::InvalidPort(text))
}
