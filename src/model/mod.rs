// Schema-tolerant OSB envelopes
//
// Every envelope decodes its known fields out of an `AdditionalProperties`
// bag and encodes them back into it, so unknown fields survive a round trip.

use crate::core::errors::ModelError;

/// Generates `Serialize`/`Deserialize` for types implementing [`Envelope`]
macro_rules! envelope_serde {
    ($($ty:ty),+ $(,)?) => {$(
        impl serde::Serialize for $ty {
            fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                use serde::ser::Error as _;
                let properties = $crate::model::Envelope::to_properties(self).map_err(S::Error::custom)?;
                serde::Serialize::serialize(&properties, serializer)
            }
        }

        impl<'de> serde::Deserialize<'de> for $ty {
            fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                use serde::de::Error as _;
                let properties: $crate::model::AdditionalProperties =
                    serde::Deserialize::deserialize(deserializer)?;
                <$ty as $crate::model::Envelope>::from_properties(properties).map_err(D::Error::custom)
            }
        }
    )+};
}

pub mod adapt;
pub mod bind;
pub mod catalog;
pub mod credentials;
pub mod endpoint;
pub mod properties;

pub use adapt::AdaptCredentialsRequest;
pub use bind::{BindRequest, BindResponse, DataRequest, DataResponse, NetworkDataRequest, NetworkDataResponse};
pub use catalog::{Catalog, Plan, Service};
pub use credentials::Credentials;
pub use endpoint::{Endpoint, EndpointMapping};
pub use properties::AdditionalProperties;

/// A JSON object with typed known fields and a bag of unknown ones
pub trait Envelope: Sized {
    /// Move the known fields out of `properties`; what remains is kept verbatim
    fn from_properties(properties: AdditionalProperties) -> Result<Self, ModelError>;

    /// Unknown fields plus the known fields that pass their inclusion rule
    fn to_properties(&self) -> Result<AdditionalProperties, ModelError>;
}
