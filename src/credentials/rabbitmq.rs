// Messaging-style credential view: hostname, port and uri

use crate::core::errors::CredentialsError;
use crate::credentials::rewrite::EndpointRewrite;
use crate::credentials::{relocate, HOSTNAME_KEY, PORT_KEY, URI_KEY};
use crate::model::{Credentials, EndpointMapping};

pub const DEFAULT_RABBITMQ_PORT: u16 = 5672;

const PROTOCOL: &str = "rabbitmq";

#[derive(Debug, Clone, PartialEq)]
pub struct RabbitMqCredentials {
    pub credentials: Credentials,
    pub hostname: String,
    pub port: u16,
    pub uri: String,
}

impl RabbitMqCredentials {
    pub fn from_credentials(credentials: &Credentials) -> Result<Option<Self>, CredentialsError> {
        let mut properties = credentials.additional_properties.clone();
        let uri: String = properties.take(URI_KEY)?.unwrap_or_default();
        if !uri.starts_with("amqp:") {
            return Ok(None);
        }

        let hostname: String = properties.take(HOSTNAME_KEY)?.unwrap_or_default();
        let port = properties.take_port(PORT_KEY)?.unwrap_or(0);

        if hostname.is_empty() {
            return Err(CredentialsError::Incomplete {
                protocol: PROTOCOL,
                reason: "hostname is missing".to_string(),
            });
        }
        if port == 0 {
            return Err(CredentialsError::Incomplete {
                protocol: PROTOCOL,
                reason: "port is missing".to_string(),
            });
        }

        Ok(Some(Self {
            credentials: Credentials {
                additional_properties: properties,
                endpoints: credentials.endpoints.clone(),
            },
            hostname,
            port,
            uri,
        }))
    }

    pub fn adapt(&mut self, mappings: &[EndpointMapping]) -> Result<(), CredentialsError> {
        for mapping in mappings {
            relocate(&mut self.hostname, &mut self.port, mapping);
            self.uri = EndpointRewrite::new(mapping, DEFAULT_RABBITMQ_PORT)?.apply(&self.uri);
        }
        Ok(())
    }

    pub fn into_credentials(self) -> Credentials {
        let mut properties = self.credentials.additional_properties;
        properties.set_non_empty(HOSTNAME_KEY, &self.hostname);
        properties.set_non_zero(PORT_KEY, self.port);
        properties.set_non_empty(URI_KEY, &self.uri);
        Credentials {
            additional_properties: properties,
            endpoints: self.credentials.endpoints,
        }
    }
}
