// SQL-style credential view: hostname, port, uri, read_url and write_url

use crate::core::errors::CredentialsError;
use crate::credentials::rewrite::EndpointRewrite;
use crate::credentials::{relocate, uri, HOSTNAME_KEY, PORT_KEY, URI_KEY};
use crate::model::{Credentials, EndpointMapping};

pub const DEFAULT_POSTGRES_PORT: u16 = 5432;
pub const READ_URL_KEY: &str = "read_url";
pub const WRITE_URL_KEY: &str = "write_url";

const PROTOCOL: &str = "postgres";

#[derive(Debug, Clone, PartialEq)]
pub struct PostgresCredentials {
    /// Everything except the fields owned by this view
    pub credentials: Credentials,
    pub hostname: String,
    pub port: u16,
    pub uri: String,
    pub read_url: String,
    pub write_url: String,
}

impl PostgresCredentials {
    /// Recognize a postgres credential set, `None` when the uri scheme differs
    pub fn from_credentials(credentials: &Credentials) -> Result<Option<Self>, CredentialsError> {
        let mut properties = credentials.additional_properties.clone();
        let uri: String = properties.take(URI_KEY)?.unwrap_or_default();
        if !is_postgres_uri(&uri) {
            return Ok(None);
        }

        let hostname: String = properties.take(HOSTNAME_KEY)?.unwrap_or_default();
        let write_url: String = properties.take(WRITE_URL_KEY)?.unwrap_or_default();
        let read_url: String = properties.take(READ_URL_KEY)?.unwrap_or_default();
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
        uri::parse_strict(&uri).map_err(|reason| CredentialsError::InvalidUri {
            uri: uri.clone(),
            reason,
        })?;

        Ok(Some(Self {
            credentials: Credentials {
                additional_properties: properties,
                endpoints: credentials.endpoints.clone(),
            },
            hostname,
            port,
            uri,
            read_url,
            write_url,
        }))
    }

    /// Apply `mappings` in order; each sees the result of the previous one
    pub fn adapt(&mut self, mappings: &[EndpointMapping]) -> Result<(), CredentialsError> {
        for mapping in mappings {
            relocate(&mut self.hostname, &mut self.port, mapping);
            let rewrite = EndpointRewrite::new(mapping, DEFAULT_POSTGRES_PORT)?;
            self.uri = rewrite.apply(&self.uri);
            self.read_url = rewrite.apply(&self.read_url);
            self.write_url = rewrite.apply(&self.write_url);
        }
        Ok(())
    }

    pub fn into_credentials(self) -> Credentials {
        let mut properties = self.credentials.additional_properties;
        properties.set_non_empty(HOSTNAME_KEY, &self.hostname);
        properties.set_non_zero(PORT_KEY, self.port);
        properties.set_non_empty(URI_KEY, &self.uri);
        properties.set_non_empty(READ_URL_KEY, &self.read_url);
        properties.set_non_empty(WRITE_URL_KEY, &self.write_url);
        Credentials {
            additional_properties: properties,
            endpoints: self.credentials.endpoints,
        }
    }
}

fn is_postgres_uri(uri: &str) -> bool {
    uri.starts_with("postgres:") || uri.starts_with("jdbc:postgres:")
}
