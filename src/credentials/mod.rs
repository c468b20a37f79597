// Credential translation engine
//
// Protocol views recognize a credential set by its uri scheme and relocate
// every address they own. The dispatcher picks the first view that
// recognizes the credentials and falls back to passing them through.

pub mod postgres;
pub mod rabbitmq;
pub mod rewrite;
pub mod uri;
pub mod validation;

pub use postgres::PostgresCredentials;
pub use rabbitmq::RabbitMqCredentials;
pub use validation::validate_adapt_request;

use crate::core::errors::CredentialsError;
use crate::model::{BindResponse, Credentials, EndpointMapping};
use tracing::debug;

pub const HOSTNAME_KEY: &str = "hostname";
pub const PORT_KEY: &str = "port";
pub const URI_KEY: &str = "uri";

/// Closed set of protocol views
#[derive(Debug, Clone, PartialEq)]
pub enum ProtocolCredentials {
    Postgres(PostgresCredentials),
    RabbitMq(RabbitMqCredentials),
}

type Recognizer = fn(&Credentials) -> Result<Option<ProtocolCredentials>, CredentialsError>;

/// Recognizers in priority order
const RECOGNIZERS: [Recognizer; 2] = [recognize_postgres, recognize_rabbitmq];

fn recognize_postgres(credentials: &Credentials) -> Result<Option<ProtocolCredentials>, CredentialsError> {
    Ok(PostgresCredentials::from_credentials(credentials)?.map(ProtocolCredentials::Postgres))
}

fn recognize_rabbitmq(credentials: &Credentials) -> Result<Option<ProtocolCredentials>, CredentialsError> {
    Ok(RabbitMqCredentials::from_credentials(credentials)?.map(ProtocolCredentials::RabbitMq))
}

impl ProtocolCredentials {
    /// First view that recognizes `credentials`, `None` when no view does
    pub fn recognize(credentials: &Credentials) -> Result<Option<Self>, CredentialsError> {
        for recognizer in RECOGNIZERS {
            if let Some(view) = recognizer(credentials)? {
                return Ok(Some(view));
            }
        }
        Ok(None)
    }

    pub fn protocol(&self) -> &'static str {
        match self {
            ProtocolCredentials::Postgres(_) => "postgres",
            ProtocolCredentials::RabbitMq(_) => "rabbitmq",
        }
    }

    pub fn adapt(&mut self, mappings: &[EndpointMapping]) -> Result<(), CredentialsError> {
        match self {
            ProtocolCredentials::Postgres(view) => view.adapt(mappings),
            ProtocolCredentials::RabbitMq(view) => view.adapt(mappings),
        }
    }

    pub fn into_credentials(self) -> Credentials {
        match self {
            ProtocolCredentials::Postgres(view) => view.into_credentials(),
            ProtocolCredentials::RabbitMq(view) => view.into_credentials(),
        }
    }
}

/// Relocate `credentials` along `mappings`
///
/// The result always lists the mapping targets, in order, as its endpoints.
pub fn adapt(
    credentials: &Credentials,
    mappings: &[EndpointMapping],
) -> Result<BindResponse, CredentialsError> {
    if mappings.is_empty() {
        return Err(CredentialsError::NoEndpointMappings);
    }
    if let Some(index) = mappings.iter().position(|mapping| mapping.source.host.is_empty()) {
        return Err(CredentialsError::EmptySourceHost { index });
    }

    let credentials = match ProtocolCredentials::recognize(credentials)? {
        Some(mut view) => {
            debug!(protocol = view.protocol(), mappings = mappings.len(), "Adapting credentials");
            view.adapt(mappings)?;
            view.into_credentials()
        }
        None => {
            debug!("No protocol recognized, credentials passed through");
            credentials.clone()
        }
    };

    Ok(BindResponse {
        credentials,
        endpoints: mappings.iter().map(|mapping| mapping.target.clone()).collect(),
        ..Default::default()
    })
}

/// Move `hostname`/`port` to the mapping target when they equal its source
pub(crate) fn relocate(hostname: &mut String, port: &mut u16, mapping: &EndpointMapping) {
    if *hostname == mapping.source.host && *port == mapping.source.port {
        *hostname = mapping.target.host.clone();
        *port = mapping.target.port;
    }
}
