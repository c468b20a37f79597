// Configuration management

use crate::core::errors::ProxyError;
use serde::{Deserialize, Serialize};
use std::env;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// Interceptor role of this deployment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProxyRole {
    #[serde(rename = "none")]
    NoOp,
    Consumer,
    Producer,
}

impl FromStr for ProxyRole {
    type Err = ProxyError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_lowercase().as_str() {
            "" | "none" | "noop" => Ok(ProxyRole::NoOp),
            "consumer" => Ok(ProxyRole::Consumer),
            "producer" => Ok(ProxyRole::Producer),
            other => Err(ProxyError::Configuration(format!(
                "Invalid PROXY_ROLE '{}'. Must be one of: none, consumer, producer",
                other
            ))),
        }
    }
}

impl fmt::Display for ProxyRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ProxyRole::NoOp => "none",
            ProxyRole::Consumer => "consumer",
            ProxyRole::Producer => "producer",
        };
        f.write_str(name)
    }
}

/// Application configuration loaded from environment variables
///
/// Role-specific settings are optional here and checked by `validate`
/// against the selected role.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    // Server configuration
    pub bind_address: String,
    pub port: u16,

    // Upstream broker
    pub forward_url: String,
    pub upstream_timeout_secs: u64,
    pub upstream_accept_invalid_certs: bool,

    // Role configuration
    pub role: ProxyRole,
    pub consumer_id: Option<String>,
    pub provider_id: Option<String>,
    pub system_domain: Option<String>,
    pub network_profile: Option<String>,
    pub load_balancer_port: u16,
    pub service_name_prefix: String,
    pub plan_metadata: Option<String>,
    pub mesh_config_dir: PathBuf,

    // Middleware configuration
    pub body_size_limit_bytes: usize,

    // Logging configuration
    pub log_level: String,
    pub log_format: String, // "json" or "text"
}

impl Config {
    /// Load configuration from environment variables
    ///
    /// Supports `.env` file loading in development (via dotenv crate).
    pub fn from_env() -> Result<Self, ProxyError> {
        #[cfg(not(test))]
        {
            dotenv::dotenv().ok();
        }

        let config = Self {
            bind_address: Self::get_env_or_default("BIND_ADDRESS", "0.0.0.0"),
            port: Self::parse_port_or_default("PORT", 8080)?,
            forward_url: Self::get_required_env("FORWARD_URL")?,
            upstream_timeout_secs: Self::parse_u64_or_default("UPSTREAM_TIMEOUT_SECS", 30)?,
            upstream_accept_invalid_certs: Self::parse_bool_or_default(
                "UPSTREAM_ACCEPT_INVALID_CERTS",
                false,
            )?,
            role: Self::get_env_or_default("PROXY_ROLE", "none").parse()?,
            consumer_id: Self::get_optional_env("CONSUMER_ID"),
            provider_id: Self::get_optional_env("PROVIDER_ID"),
            system_domain: Self::get_optional_env("SYSTEM_DOMAIN"),
            network_profile: Self::get_optional_env("NETWORK_PROFILE"),
            load_balancer_port: Self::parse_port_or_default("LOAD_BALANCER_PORT", 9000)?,
            service_name_prefix: Self::get_env_or_default("SERVICE_NAME_PREFIX", ""),
            plan_metadata: Self::get_optional_env("PLAN_METADATA"),
            mesh_config_dir: Self::get_optional_env("MESH_CONFIG_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(env::temp_dir),
            body_size_limit_bytes: Self::parse_usize_or_default(
                "BODY_SIZE_LIMIT_BYTES",
                2 * 1024 * 1024,
            )?,
            log_level: Self::get_env_or_default("LOG_LEVEL", "info"),
            log_format: Self::get_env_or_default("LOG_FORMAT", "json"),
        };

        config.validate()?;

        Ok(config)
    }

    fn get_env_or_default(key: &str, default: &str) -> String {
        env::var(key).unwrap_or_else(|_| default.to_string())
    }

    fn get_optional_env(key: &str) -> Option<String> {
        match env::var(key) {
            Ok(value) if !value.is_empty() => Some(value),
            _ => None,
        }
    }

    fn get_required_env(key: &str) -> Result<String, ProxyError> {
        Self::get_optional_env(key)
            .ok_or_else(|| ProxyError::Configuration(format!("{} not set", key)))
    }

    fn parse_port_or_default(key: &str, default: u16) -> Result<u16, ProxyError> {
        match env::var(key) {
            Ok(value) => {
                let port = value.parse::<u16>().map_err(|e| {
                    ProxyError::Configuration(format!("Invalid {} value '{}': {}", key, value, e))
                })?;
                if port == 0 {
                    return Err(ProxyError::Configuration(format!(
                        "{} must be between 1 and 65535",
                        key
                    )));
                }
                Ok(port)
            }
            _ => Ok(default),
        }
    }

    fn parse_u64_or_default(key: &str, default: u64) -> Result<u64, ProxyError> {
        match env::var(key) {
            Ok(value) => {
                let parsed = value.parse::<u64>().map_err(|e| {
                    ProxyError::Configuration(format!("Invalid {} value '{}': {}", key, value, e))
                })?;
                if parsed == 0 {
                    return Err(ProxyError::Configuration(format!(
                        "{} must be greater than 0",
                        key
                    )));
                }
                Ok(parsed)
            }
            _ => Ok(default),
        }
    }

    fn parse_usize_or_default(key: &str, default: usize) -> Result<usize, ProxyError> {
        match env::var(key) {
            Ok(value) => {
                let parsed = value.parse::<usize>().map_err(|e| {
                    ProxyError::Configuration(format!("Invalid {} value '{}': {}", key, value, e))
                })?;
                if parsed == 0 {
                    return Err(ProxyError::Configuration(format!(
                        "{} must be greater than 0",
                        key
                    )));
                }
                Ok(parsed)
            }
            _ => Ok(default),
        }
    }

    fn parse_bool_or_default(key: &str, default: bool) -> Result<bool, ProxyError> {
        match env::var(key) {
            Ok(value) => parse_bool(&value).ok_or_else(|| {
                ProxyError::Configuration(format!("Invalid {} value '{}'", key, value))
            }),
            _ => Ok(default),
        }
    }

    /// Validate configuration after loading
    pub fn validate(&self) -> Result<(), ProxyError> {
        validate_url(&self.forward_url)?;
        validate_log_level(&self.log_level)?;
        validate_log_format(&self.log_format)?;

        match self.role {
            ProxyRole::NoOp => {}
            ProxyRole::Consumer => {
                require(&self.consumer_id, "CONSUMER_ID", self.role)?;
                require(&self.network_profile, "NETWORK_PROFILE", self.role)?;
            }
            ProxyRole::Producer => {
                require(&self.provider_id, "PROVIDER_ID", self.role)?;
                require(&self.system_domain, "SYSTEM_DOMAIN", self.role)?;
                require(&self.network_profile, "NETWORK_PROFILE", self.role)?;
                crate::interceptor::producer::parse_plan_metadata(self.plan_metadata.as_deref())?;
            }
        }

        Ok(())
    }

    /// Configuration for tests; valid for every role
    pub fn test_config() -> Self {
        Self {
            bind_address: "127.0.0.1".to_string(),
            port: 8080,
            forward_url: "http://localhost:9999".to_string(),
            upstream_timeout_secs: 5,
            upstream_accept_invalid_certs: false,
            role: ProxyRole::NoOp,
            consumer_id: Some("client.istio.sapcloud.io".to_string()),
            provider_id: Some("provider.istio.sapcloud.io".to_string()),
            system_domain: Some("istio.sapcloud.io".to_string()),
            network_profile: Some("urn:local.test:public".to_string()),
            load_balancer_port: 9000,
            service_name_prefix: String::new(),
            plan_metadata: None,
            mesh_config_dir: env::temp_dir(),
            body_size_limit_bytes: 2 * 1024 * 1024,
            log_level: "info".to_string(),
            log_format: "json".to_string(),
        }
    }
}

fn require(value: &Option<String>, key: &str, role: ProxyRole) -> Result<(), ProxyError> {
    match value {
        Some(v) if !v.is_empty() => Ok(()),
        _ => Err(ProxyError::Configuration(format!(
            "{} is required for the {} role",
            key, role
        ))),
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

fn validate_url(url: &str) -> Result<(), ProxyError> {
    let parsed = url::Url::parse(url)
        .map_err(|e| ProxyError::Configuration(format!("Invalid FORWARD_URL '{}': {}", url, e)))?;
    match parsed.scheme() {
        "http" | "https" => Ok(()),
        scheme => Err(ProxyError::Configuration(format!(
            "FORWARD_URL must use http or https, got '{}'",
            scheme
        ))),
    }
}

fn validate_log_level(level: &str) -> Result<(), ProxyError> {
    match level.to_lowercase().as_str() {
        "trace" | "debug" | "info" | "warn" | "error" => Ok(()),
        _ => Err(ProxyError::Configuration(format!(
            "Invalid LOG_LEVEL '{}'. Must be one of: trace, debug, info, warn, error",
            level
        ))),
    }
}

fn validate_log_format(format: &str) -> Result<(), ProxyError> {
    match format.to_lowercase().as_str() {
        "json" | "text" => Ok(()),
        _ => Err(ProxyError::Configuration(format!(
            "Invalid LOG_FORMAT '{}'. Must be 'json' or 'text'",
            format
        ))),
    }
}
