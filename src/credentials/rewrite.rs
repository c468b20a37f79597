// Rewriting of endpoint references inside URL-shaped credential fields

use crate::model::EndpointMapping;
use regex::Regex;

/// Boundary around a host reference: string edge or an ASCII non-word character
const LEADING: &str = "(^|[^0-9A-Za-z_])";
const TRAILING: &str = "([^0-9A-Za-z_]|$)";

/// Compiled replacement of one mapping's source endpoint inside URLs
///
/// When the source port is the protocol's default port the reference may omit
/// the port; otherwise `host:port` must appear literally. The delimiters on
/// both sides are kept, so only whole host tokens are replaced.
#[derive(Debug, Clone)]
pub struct EndpointRewrite {
    pattern: Regex,
    replacement: String,
}

impl EndpointRewrite {
    pub fn new(mapping: &EndpointMapping, default_port: u16) -> Result<Self, regex::Error> {
        let host = regex::escape(&mapping.source.host);
        let port = mapping.source.port;
        let reference = if port == default_port {
            format!("{}(?::{})?", host, port)
        } else {
            format!("{}:{}", host, port)
        };
        Ok(Self {
            pattern: Regex::new(&format!("{}{}{}", LEADING, reference, TRAILING))?,
            replacement: mapping.target.to_string(),
        })
    }

    /// Replace every reference to the source endpoint in `url`
    ///
    /// A trailing delimiter can lead the next reference, so adjacent
    /// references such as `hosta,hosta` are both replaced.
    pub fn apply(&self, url: &str) -> String {
        let mut rewritten = String::with_capacity(url.len());
        let mut copied = 0;
        let mut start = 0;
        while start <= url.len() {
            let Some(caps) = self.pattern.captures_at(url, start) else {
                break;
            };
            let (Some(leading), Some(trailing)) = (caps.get(1), caps.get(2)) else {
                break;
            };
            rewritten.push_str(&url[copied..leading.end()]);
            rewritten.push_str(&self.replacement);
            copied = trailing.start();
            if trailing.is_empty() {
                break;
            }
            start = if trailing.start() > start {
                trailing.start()
            } else {
                trailing.end()
            };
        }
        rewritten.push_str(&url[copied..]);
        rewritten
    }
}
