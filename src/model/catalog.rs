// Catalog envelopes; only the parts the roles rewrite are typed

use crate::core::errors::ModelError;
use crate::model::{AdditionalProperties, Envelope};
use serde_json::{Map, Value};

pub const SERVICES_KEY: &str = "services";
pub const NAME_KEY: &str = "name";
pub const PLANS_KEY: &str = "plans";
pub const METADATA_KEY: &str = "metadata";

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Catalog {
    pub additional_properties: AdditionalProperties,
    pub services: Vec<Service>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Service {
    pub additional_properties: AdditionalProperties,
    pub name: String,
    pub plans: Vec<Plan>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Plan {
    pub additional_properties: AdditionalProperties,
    pub metadata: Map<String, Value>,
}

impl Plan {
    /// Merge `extra` into the plan metadata, overwriting keys present in both
    pub fn merge_metadata(&mut self, extra: &Map<String, Value>) {
        for (key, value) in extra {
            self.metadata.insert(key.clone(), value.clone());
        }
    }
}

impl Envelope for Catalog {
    fn from_properties(mut properties: AdditionalProperties) -> Result<Self, ModelError> {
        let services = properties.take(SERVICES_KEY)?.unwrap_or_default();
        Ok(Self {
            additional_properties: properties,
            services,
        })
    }

    fn to_properties(&self) -> Result<AdditionalProperties, ModelError> {
        let mut properties = self.additional_properties.clone();
        properties.set(SERVICES_KEY, &self.services)?;
        Ok(properties)
    }
}

impl Envelope for Service {
    fn from_properties(mut properties: AdditionalProperties) -> Result<Self, ModelError> {
        let name = properties.take(NAME_KEY)?.unwrap_or_default();
        let plans = properties.take(PLANS_KEY)?.unwrap_or_default();
        Ok(Self {
            additional_properties: properties,
            name,
            plans,
        })
    }

    fn to_properties(&self) -> Result<AdditionalProperties, ModelError> {
        let mut properties = self.additional_properties.clone();
        properties.set(NAME_KEY, &self.name)?;
        properties.set(PLANS_KEY, &self.plans)?;
        Ok(properties)
    }
}

impl Envelope for Plan {
    fn from_properties(mut properties: AdditionalProperties) -> Result<Self, ModelError> {
        let metadata = properties.take(METADATA_KEY)?.unwrap_or_default();
        Ok(Self {
            additional_properties: properties,
            metadata,
        })
    }

    fn to_properties(&self) -> Result<AdditionalProperties, ModelError> {
        let mut properties = self.additional_properties.clone();
        if !self.metadata.is_empty() {
            properties.set(METADATA_KEY, &self.metadata)?;
        }
        Ok(properties)
    }
}

envelope_serde!(Catalog, Service, Plan);
