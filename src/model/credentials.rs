// Credential envelope returned by a service broker bind

use crate::core::errors::ModelError;
use crate::model::{AdditionalProperties, Endpoint, Envelope};

pub const END_POINTS_KEY: &str = "end_points";

/// Opaque credentials with an optional list of endpoints under `end_points`
///
/// `end_points` is written back only when the list is non-empty.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Credentials {
    pub additional_properties: AdditionalProperties,
    pub endpoints: Vec<Endpoint>,
}

impl Envelope for Credentials {
    fn from_properties(mut properties: AdditionalProperties) -> Result<Self, ModelError> {
        let endpoints = properties.take(END_POINTS_KEY)?.unwrap_or_default();
        Ok(Self {
            additional_properties: properties,
            endpoints,
        })
    }

    fn to_properties(&self) -> Result<AdditionalProperties, ModelError> {
        let mut properties = self.additional_properties.clone();
        properties.set_non_empty_list(END_POINTS_KEY, &self.endpoints)?;
        Ok(properties)
    }
}

envelope_serde!(Credentials);
