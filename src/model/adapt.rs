// Body of the adapt_credentials call

use crate::model::{Credentials, EndpointMapping};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AdaptCredentialsRequest {
    #[serde(default)]
    pub credentials: Credentials,
    #[serde(default)]
    pub endpoint_mappings: Vec<EndpointMapping>,
}

impl AdaptCredentialsRequest {
    pub fn new(credentials: Credentials, endpoint_mappings: Vec<EndpointMapping>) -> Self {
        Self {
            credentials,
            endpoint_mappings,
        }
    }
}
