// Bind request and response envelopes with their network metadata

use crate::core::errors::ModelError;
use crate::model::{AdditionalProperties, Credentials, Endpoint, Envelope};
use serde::{Deserialize, Serialize};

pub const NETWORK_DATA_KEY: &str = "network_data";
pub const CREDENTIALS_KEY: &str = "credentials";
pub const ENDPOINTS_KEY: &str = "endpoints";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DataRequest {
    pub consumer_id: String,
}

/// Network metadata a consumer attaches to a bind request
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkDataRequest {
    pub network_profile_id: String,
    pub data: DataRequest,
}

impl NetworkDataRequest {
    pub fn is_empty(&self) -> bool {
        self.network_profile_id.is_empty() && self.data.consumer_id.is_empty()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DataResponse {
    pub provider_id: String,
    pub endpoints: Vec<Endpoint>,
}

/// Network metadata a producer attaches to a bind response
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkDataResponse {
    pub network_profile_id: String,
    pub data: DataResponse,
}

impl NetworkDataResponse {
    /// Whether the response carries enough network data to be emitted
    pub fn is_present(&self) -> bool {
        !self.network_profile_id.is_empty() || !self.data.endpoints.is_empty()
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct BindRequest {
    pub additional_properties: AdditionalProperties,
    pub network_data: NetworkDataRequest,
}

impl Envelope for BindRequest {
    fn from_properties(mut properties: AdditionalProperties) -> Result<Self, ModelError> {
        let network_data = properties.take(NETWORK_DATA_KEY)?.unwrap_or_default();
        Ok(Self {
            additional_properties: properties,
            network_data,
        })
    }

    fn to_properties(&self) -> Result<AdditionalProperties, ModelError> {
        let mut properties = self.additional_properties.clone();
        if !self.network_data.is_empty() {
            properties.set(NETWORK_DATA_KEY, &self.network_data)?;
        }
        Ok(properties)
    }
}

/// Bind response: credentials are always written, endpoints only when
/// non-empty, network data only when it carries a profile or endpoints
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BindResponse {
    pub additional_properties: AdditionalProperties,
    pub network_data: NetworkDataResponse,
    pub credentials: Credentials,
    pub endpoints: Vec<Endpoint>,
}

impl Envelope for BindResponse {
    fn from_properties(mut properties: AdditionalProperties) -> Result<Self, ModelError> {
        let network_data = properties.take(NETWORK_DATA_KEY)?.unwrap_or_default();
        let credentials = properties.take(CREDENTIALS_KEY)?.unwrap_or_default();
        let endpoints = properties.take(ENDPOINTS_KEY)?.unwrap_or_default();
        Ok(Self {
            additional_properties: properties,
            network_data,
            credentials,
            endpoints,
        })
    }

    fn to_properties(&self) -> Result<AdditionalProperties, ModelError> {
        let mut properties = self.additional_properties.clone();
        properties.set(CREDENTIALS_KEY, &self.credentials)?;
        properties.set_non_empty_list(ENDPOINTS_KEY, &self.endpoints)?;
        if self.network_data.is_present() {
            properties.set(NETWORK_DATA_KEY, &self.network_data)?;
        }
        Ok(properties)
    }
}

envelope_serde!(BindRequest, BindResponse);
