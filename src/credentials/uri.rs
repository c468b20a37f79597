// Strict URI parsing shared by the protocol views and request validation

use url::Url;

/// Characters that may not appear unescaped anywhere in a URI
const FORBIDDEN: &[char] = &['<', '>', '"', '{', '}', '|', '\\', '^', '`'];

/// Parse `uri`, rejecting characters the `url` crate would silently escape
pub fn parse_strict(uri: &str) -> Result<Url, String> {
    if let Some(c) = uri
        .chars()
        .find(|c| c.is_whitespace() || c.is_control() || FORBIDDEN.contains(c))
    {
        return Err(format!("invalid character {:?} in uri", c));
    }
    Url::parse(uri).map_err(|e| e.to_string())
}
