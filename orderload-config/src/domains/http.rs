//! HTTP client settings for talking to the target API

use crate::error::ConfigResult;
use crate::validation::{validate_positive, validate_required_string, Validatable};
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    /// Whole-request timeout; a request that exceeds it is a transport error
    #[serde(with = "crate::domains::utils::serde_duration")]
    pub timeout: Duration,

    /// Time allowed to establish a connection, at most `timeout`
    #[serde(with = "crate::domains::utils::serde_duration")]
    pub connect_timeout: Duration,

    pub user_agent: String,

    /// Disable only for test servers with self-signed certificates
    pub verify_ssl: bool,

    pub pool: PoolConfig,
}

/// Keep-alive pool of the shared client
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PoolConfig {
    /// Idle connections kept per host; 0 disables reuse
    pub max_idle_per_host: usize,

    #[serde(with = "crate::domains::utils::serde_duration")]
    pub idle_timeout: Duration,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            connect_timeout: Duration::from_secs(10),
            user_agent: concat!("orderload/", env!("CARGO_PKG_VERSION")).to_string(),
            verify_ssl: true,
            pool: PoolConfig::default(),
        }
    }
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            max_idle_per_host: 32,
            idle_timeout: Duration::from_secs(90),
        }
    }
}

impl Validatable for HttpConfig {
    fn validate(&self) -> ConfigResult<()> {
        validate_positive(self.timeout.as_secs(), "timeout", self.domain_name())?;
        validate_positive(
            self.connect_timeout.as_secs(),
            "connect_timeout",
            self.domain_name(),
        )?;
        if self.connect_timeout > self.timeout {
            return Err(self.validation_error(format!(
                "connect_timeout ({}s) exceeds timeout ({}s)",
                self.connect_timeout.as_secs(),
                self.timeout.as_secs()
            )));
        }
        validate_required_string(&self.user_agent, "user_agent", self.domain_name())?;
        validate_positive(
            self.pool.idle_timeout.as_secs(),
            "pool.idle_timeout",
            self.domain_name(),
        )
    }

    fn domain_name(&self) -> &'static str {
        "http"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = HttpConfig::default();
        assert_eq!(config.timeout, Duration::from_secs(30));
        assert!(config.user_agent.starts_with("orderload/"));
        assert!(config.verify_ssl);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_connect_timeout_bounded_by_timeout() {
        let mut config = HttpConfig::default();
        config.timeout = Duration::from_secs(5);
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("connect_timeout"));

        config.connect_timeout = Duration::from_secs(5);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_empty_user_agent_rejected() {
        let mut config = HttpConfig::default();
        config.user_agent = "  ".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_partial_yaml_keeps_pool_defaults() {
        let config: HttpConfig = serde_yaml::from_str("timeout: 12\nverify_ssl: false\n").unwrap();
        assert_eq!(config.timeout, Duration::from_secs(12));
        assert!(!config.verify_ssl);
        assert_eq!(config.pool.max_idle_per_host, 32);
    }
}
