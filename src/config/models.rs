// src/config/models.rs
use crate::proxy::{parse_backend_url, BackendError};
use serde::Deserialize;
use std::net::SocketAddr;
use std::time::Duration;
use url::Url;

pub const DEFAULT_ADDRESS: &str = "0.0.0.0:8080";
pub const DEFAULT_HEALTH_CHECK_INTERVAL_SECS: u64 = 5;
pub const DEFAULT_HEALTH_CHECK_TIMEOUT_SECS: u64 = 2;
pub const DEFAULT_PROXY_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_LIVENESS_PATH: &str = "/healthz";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("backend_urls is required (set BACKEND_URLS or backend_urls in the config file)")]
    MissingBackends,

    #[error("invalid listen address {address:?}: {source}")]
    InvalidAddress {
        address: String,
        source: std::net::AddrParseError,
    },

    #[error(transparent)]
    InvalidBackend(#[from] BackendError),

    #[error("{0} must be greater than zero")]
    ZeroDuration(&'static str),

    #[error("{0} must start with '/'")]
    InvalidPath(&'static str),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

/// Top-level service configuration.
///
/// Field names double as configuration keys, so `HEALTH_CHECK_PATH` in the
/// environment lands in `health_check_path`.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default = "default_address")]
    pub address: String,

    /// `None` when the key was never provided; an explicit empty list is allowed.
    #[serde(default)]
    pub backend_urls: Option<Vec<String>>,

    #[serde(default)]
    pub health_check_path: String,

    #[serde(default = "default_health_check_interval")]
    pub health_check_interval_seconds: u64,

    #[serde(default = "default_health_check_timeout")]
    pub health_check_timeout_seconds: u64,

    #[serde(default = "default_proxy_timeout")]
    pub proxy_timeout_seconds: u64,

    #[serde(default = "default_liveness_path")]
    pub liveness_path: String,

    #[serde(default)]
    pub log_format: LogFormat,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            address: default_address(),
            backend_urls: None,
            health_check_path: String::new(),
            health_check_interval_seconds: default_health_check_interval(),
            health_check_timeout_seconds: default_health_check_timeout(),
            proxy_timeout_seconds: default_proxy_timeout(),
            liveness_path: default_liveness_path(),
            log_format: LogFormat::default(),
        }
    }
}

impl Config {
    /// Checks everything that has to hold before the listener is bound.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.listen_addr()?;
        self.backends()?;

        if self.health_check_interval_seconds == 0 {
            return Err(ConfigError::ZeroDuration("health_check_interval_seconds"));
        }
        if self.health_check_timeout_seconds == 0 {
            return Err(ConfigError::ZeroDuration("health_check_timeout_seconds"));
        }
        if self.proxy_timeout_seconds == 0 {
            return Err(ConfigError::ZeroDuration("proxy_timeout_seconds"));
        }
        if !self.health_check_path.is_empty() && !self.health_check_path.starts_with('/') {
            return Err(ConfigError::InvalidPath("health_check_path"));
        }
        if !self.liveness_path.starts_with('/') {
            return Err(ConfigError::InvalidPath("liveness_path"));
        }

        Ok(())
    }

    pub fn listen_addr(&self) -> Result<SocketAddr, ConfigError> {
        self.address
            .parse()
            .map_err(|source| ConfigError::InvalidAddress {
                address: self.address.clone(),
                source,
            })
    }

    /// Parsed backend URLs in configuration order. Blank entries are skipped.
    pub fn backends(&self) -> Result<Vec<Url>, ConfigError> {
        let raw = self
            .backend_urls
            .as_ref()
            .ok_or(ConfigError::MissingBackends)?;

        raw.iter()
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
            .map(|s| parse_backend_url(s).map_err(ConfigError::from))
            .collect()
    }

    pub fn health_check(&self) -> HealthCheckConfig {
        HealthCheckConfig {
            path: self.health_check_path.clone(),
            interval_secs: self.health_check_interval_seconds,
            timeout_secs: self.health_check_timeout_seconds,
        }
    }

    pub fn proxy_timeout(&self) -> Duration {
        Duration::from_secs(self.proxy_timeout_seconds)
    }
}

/// The slice of [`Config`] the health monitor needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HealthCheckConfig {
    /// Appended to each backend's base URL; empty means the root.
    pub path: String,
    pub interval_secs: u64,
    pub timeout_secs: u64,
}

impl HealthCheckConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for HealthCheckConfig {
    fn default() -> Self {
        Self {
            path: String::new(),
            interval_secs: DEFAULT_HEALTH_CHECK_INTERVAL_SECS,
            timeout_secs: DEFAULT_HEALTH_CHECK_TIMEOUT_SECS,
        }
    }
}

fn default_address() -> String {
    DEFAULT_ADDRESS.to_string()
}

fn default_health_check_interval() -> u64 {
    DEFAULT_HEALTH_CHECK_INTERVAL_SECS
}

fn default_health_check_timeout() -> u64 {
    DEFAULT_HEALTH_CHECK_TIMEOUT_SECS
}

fn default_proxy_timeout() -> u64 {
    DEFAULT_PROXY_TIMEOUT_SECS
}

fn default_liveness_path() -> String {
    DEFAULT_LIVENESS_PATH.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn with_backends(urls: &[&str]) -> Config {
        Config {
            backend_urls: Some(urls.iter().map(|s| s.to_string()).collect()),
            ..Config::default()
        }
    }

    #[test]
    fn test_defaults_match_documented_values() {
        let config = Config::default();
        assert_eq!(config.address, "0.0.0.0:8080");
        assert_eq!(config.health_check_path, "");
        assert_eq!(config.health_check_interval_seconds, 5);
        assert_eq!(config.health_check_timeout_seconds, 2);
        assert_eq!(config.liveness_path, "/healthz");
        assert_eq!(config.log_format, LogFormat::Text);
    }

    #[test]
    fn test_missing_backend_list_is_rejected() {
        let err = Config::default().validate().unwrap_err();
        assert!(matches!(err, ConfigError::MissingBackends));
    }

    #[test]
    fn test_explicit_empty_backend_list_is_accepted() {
        let config = with_backends(&["", "  "]);
        config.validate().unwrap();
        assert!(config.backends().unwrap().is_empty());
    }

    #[test]
    fn test_backends_keep_configuration_order() {
        let config = with_backends(&["http://b:8081", " http://a:8080 "]);
        let urls = config.backends().unwrap();
        assert_eq!(urls[0].as_str(), "http://b:8081/");
        assert_eq!(urls[1].as_str(), "http://a:8080/");
    }

    #[test]
    fn test_malformed_backend_is_rejected() {
        let config = with_backends(&["http://ok:80", "not a url"]);
        assert!(matches!(
            config.validate().unwrap_err(),
            ConfigError::InvalidBackend(_)
        ));
    }

    #[test]
    fn test_bad_listen_address_is_rejected() {
        let config = Config {
            address: "localhost".to_string(),
            ..with_backends(&["http://a:80"])
        };
        assert!(matches!(
            config.validate().unwrap_err(),
            ConfigError::InvalidAddress { .. }
        ));
    }

    #[test]
    fn test_zero_interval_is_rejected() {
        let config = Config {
            health_check_interval_seconds: 0,
            ..with_backends(&["http://a:80"])
        };
        assert!(matches!(
            config.validate().unwrap_err(),
            ConfigError::ZeroDuration("health_check_interval_seconds")
        ));
    }

    #[test]
    fn test_health_check_path_must_be_absolute() {
        let config = Config {
            health_check_path: "health".to_string(),
            ..with_backends(&["http://a:80"])
        };
        assert!(matches!(
            config.validate().unwrap_err(),
            ConfigError::InvalidPath("health_check_path")
        ));
    }

    #[test]
    fn test_health_check_slice() {
        let config = Config {
            health_check_path: "/status".to_string(),
            health_check_interval_seconds: 7,
            ..with_backends(&["http://a:80"])
        };
        let hc = config.health_check();
        assert_eq!(hc.path, "/status");
        assert_eq!(hc.interval(), Duration::from_secs(7));
        assert_eq!(hc.timeout(), Duration::from_secs(2));
    }
}
