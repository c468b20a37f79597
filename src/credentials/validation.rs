// Structural and semantic checks for the strict adapt_credentials entry point

use crate::core::errors::ValidationError;
use crate::credentials::{uri, HOSTNAME_KEY, PORT_KEY, URI_KEY};
use serde_json::{Map, Value};

const CREDENTIALS_FIELD: &str = "credentials";
const MAPPINGS_FIELD: &str = "endpoint_mappings";

/// Validate a raw adapt_credentials body, returning the first failure found
///
/// The body must carry credentials with `uri`, `hostname` and `port`, and
/// exactly one endpoint mapping whose source is the credentials' own
/// `hostname:port`.
pub fn validate_adapt_request(body: &[u8]) -> Result<(), ValidationError> {
    let value: Value =
        serde_json::from_slice(body).map_err(|e| ValidationError::InvalidJson(e.to_string()))?;
    let request = value
        .as_object()
        .ok_or_else(|| ValidationError::InvalidJson("top-level value is not an object".to_string()))?;

    let credentials = required(request, CREDENTIALS_FIELD)?;
    let mappings = required(request, MAPPINGS_FIELD)?;
    let credentials = credentials.as_object().ok_or_else(|| ValidationError::WrongType {
        field: CREDENTIALS_FIELD.to_string(),
        expected: "an object",
    })?;
    let mappings = mappings.as_array().ok_or_else(|| ValidationError::WrongType {
        field: MAPPINGS_FIELD.to_string(),
        expected: "an array",
    })?;

    validate_credentials(credentials)?;

    if mappings.len() != 1 {
        return Err(ValidationError::MappingCount(mappings.len()));
    }
    for (index, mapping) in mappings.iter().enumerate() {
        validate_mapping(index, mapping)?;
    }

    let source = &mappings[0]["source"];
    let source = endpoint_key(source.get("host"), source.get("port"));
    let own = endpoint_key(credentials.get(HOSTNAME_KEY), credentials.get(PORT_KEY));
    if source != own {
        return Err(ValidationError::NotApplicable {
            mapping_source: source,
            credentials: own,
        });
    }
    Ok(())
}

fn validate_credentials(credentials: &Map<String, Value>) -> Result<(), ValidationError> {
    for field in [URI_KEY, HOSTNAME_KEY, PORT_KEY] {
        non_null(credentials, field, &format!("{}.{}", CREDENTIALS_FIELD, field))?;
    }

    let text = credentials
        .get(URI_KEY)
        .and_then(Value::as_str)
        .ok_or_else(|| ValidationError::WrongType {
            field: format!("{}.{}", CREDENTIALS_FIELD, URI_KEY),
            expected: "a string",
        })?;
    uri::parse_strict(text).map_err(|reason| ValidationError::InvalidUri {
        uri: text.to_string(),
        reason,
    })?;
    Ok(())
}

fn validate_mapping(index: usize, mapping: &Value) -> Result<(), ValidationError> {
    let path = format!("{}[{}]", MAPPINGS_FIELD, index);
    let mapping = mapping.as_object().ok_or_else(|| ValidationError::WrongType {
        field: path.clone(),
        expected: "an object",
    })?;

    for side in ["source", "target"] {
        let side_path = format!("{}.{}", path, side);
        let endpoint = non_null(mapping, side, &side_path)?
            .as_object()
            .ok_or_else(|| ValidationError::WrongType {
                field: side_path.clone(),
                expected: "an object",
            })?;
        for field in ["host", "port"] {
            non_null(endpoint, field, &format!("{}.{}", side_path, field))?;
        }
    }
    Ok(())
}

fn required<'a>(object: &'a Map<String, Value>, field: &str) -> Result<&'a Value, ValidationError> {
    object
        .get(field)
        .ok_or_else(|| ValidationError::MissingField(field.to_string()))
}

fn non_null<'a>(
    object: &'a Map<String, Value>,
    field: &str,
    path: &str,
) -> Result<&'a Value, ValidationError> {
    match object.get(field) {
        None | Some(Value::Null) => Err(ValidationError::MissingField(path.to_string())),
        Some(value) => Ok(value),
    }
}

/// `host:port` with both values rendered the way they appear in the JSON
fn endpoint_key(host: Option<&Value>, port: Option<&Value>) -> String {
    format!("{}:{}", scalar_text(host), scalar_text(port))
}

/// Integral floats such as `1.0` render as `1` so they compare equal to integer ports
fn scalar_text(value: Option<&Value>) -> String {
    match value {
        Some(Value::String(text)) => text.clone(),
        Some(Value::Number(number)) if number.is_f64() => match number.as_f64() {
            Some(float) if float.fract() == 0.0 && float.abs() < 1e15 => format!("{}", float as i64),
            _ => number.to_string(),
        },
        Some(other) => other.to_string(),
        None => String::new(),
    }
}
