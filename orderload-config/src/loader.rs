//! Configuration loading and environment variable handling

use crate::domains::OrderloadConfig;
use crate::error::{ConfigError, ConfigResult};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

/// Configuration loader with environment variable support.
///
/// Variable names match the deployment's existing `.env` files
/// (`API_BASE_URL`, `MAX_CONCURRENT_REQUESTS`, ...). A prefix can be set when
/// several harnesses share one environment; with a prefix `LOAD`, the loader
/// reads `LOAD_API_BASE_URL` and so on.
pub struct ConfigLoader {
    /// Environment variable prefix, empty for none
    prefix: String,
}

impl ConfigLoader {
    /// Create a new config loader without prefix
    pub fn new() -> Self {
        Self {
            prefix: String::new(),
        }
    }

    /// Create a new config loader with custom prefix
    pub fn with_prefix(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    /// Load a `.env` file from the working directory into the process
    /// environment. A missing file is not an error.
    pub fn load_dotenv() -> ConfigResult<Option<PathBuf>> {
        match dotenvy::dotenv() {
            Ok(path) => Ok(Some(path)),
            Err(e) if e.not_found() => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Load configuration from a YAML file with environment overrides
    pub fn from_file(&self, path: impl AsRef<Path>) -> ConfigResult<OrderloadConfig> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let mut config: OrderloadConfig = serde_yaml::from_str(&content)?;

        self.apply_env_overrides(&mut config)?;
        config.validate_all()?;

        Ok(config)
    }

    /// Load configuration from environment variables only
    pub fn from_env(&self) -> ConfigResult<OrderloadConfig> {
        let mut config = OrderloadConfig::default();
        self.apply_env_overrides(&mut config)?;
        config.validate_all()?;
        Ok(config)
    }

    /// Load configuration with fallback chain
    pub fn load(&self, config_path: Option<impl AsRef<Path>>) -> ConfigResult<OrderloadConfig> {
        match config_path {
            Some(path) => self.from_file(path),
            None => self.from_env(),
        }
    }

    /// Apply environment variable overrides to configuration
    fn apply_env_overrides(&self, config: &mut OrderloadConfig) -> ConfigResult<()> {
        self.apply_target_overrides(&mut config.target)?;
        self.apply_load_overrides(&mut config.load)?;
        self.apply_cascade_overrides(&mut config.cascade)?;
        self.apply_http_overrides(&mut config.http)?;
        self.apply_storage_overrides(&mut config.storage);
        self.apply_logging_overrides(&mut config.logging)?;
        Ok(())
    }

    fn apply_target_overrides(
        &self,
        config: &mut crate::domains::target::TargetConfig,
    ) -> ConfigResult<()> {
        if let Ok(base_url) = self.get_env_var("API_BASE_URL") {
            config.base_url = base_url;
        }

        if let Some(port) = self.parse_env_var::<u16>("API_PORT")? {
            config.port = Some(port);
        }

        Ok(())
    }

    fn apply_load_overrides(
        &self,
        config: &mut crate::domains::load::LoadConfig,
    ) -> ConfigResult<()> {
        if let Some(max) = self.parse_env_var("MAX_CONCURRENT_REQUESTS")? {
            config.max_concurrent_requests = max;
        }

        if let Some(duration) = self.parse_env_seconds("TEST_DURATION_SECONDS")? {
            config.duration = duration;
        }

        if let Some(users) = self.parse_env_var("SIMULATED_USERS")? {
            config.simulated_users = users;
        }

        if let Some(pause) = self.parse_env_seconds("PAUSE_BETWEEN_WAVES_SECONDS")? {
            config.pause_between_waves = pause;
        }

        if let Some(enabled) = self.parse_env_var("STATIC_ORDER_FALLBACK")? {
            config.static_order_fallback = enabled;
        }

        Ok(())
    }

    fn apply_cascade_overrides(
        &self,
        config: &mut crate::domains::cascade::CascadeConfig,
    ) -> ConfigResult<()> {
        if let Some(min) = self.parse_env_var("CASCADE_MIN_ITEMS")? {
            config.min_items = min;
        }

        if let Some(max) = self.parse_env_var("CASCADE_MAX_ITEMS")? {
            config.max_items = max;
        }

        Ok(())
    }

    fn apply_http_overrides(
        &self,
        config: &mut crate::domains::http::HttpConfig,
    ) -> ConfigResult<()> {
        if let Some(timeout) = self.parse_env_seconds("HTTP_TIMEOUT")? {
            config.timeout = timeout;
            config.connect_timeout = config.connect_timeout.min(config.timeout);
        }

        if let Ok(user_agent) = self.get_env_var("HTTP_USER_AGENT") {
            config.user_agent = user_agent;
        }

        if let Some(verify_ssl) = self.parse_env_var("HTTP_VERIFY_SSL")? {
            config.verify_ssl = verify_ssl;
        }

        Ok(())
    }

    fn apply_storage_overrides(&self, config: &mut crate::domains::storage::StorageConfig) {
        if let Ok(dir) = self.get_env_var("STATE_DIR") {
            config.state_dir = PathBuf::from(dir);
        }

        if let Ok(dir) = self.get_env_var("RESULTS_DIR") {
            config.results_dir = PathBuf::from(dir);
        }

        if let Ok(path) = self.get_env_var("PRODUCT_CODES_FILE") {
            config.product_codes_path = PathBuf::from(path);
        }
    }

    fn apply_logging_overrides(
        &self,
        config: &mut crate::domains::logging::LoggingConfig,
    ) -> ConfigResult<()> {
        if let Ok(log_level) = self.get_env_var("LOG_LEVEL") {
            config.level = log_level.parse().map_err(|message| ConfigError::Env {
                name: self.var_name("LOG_LEVEL"),
                message,
            })?;
        }

        if let Ok(format) = self.get_env_var("LOG_FORMAT") {
            config.format = format.parse().map_err(|message| ConfigError::Env {
                name: self.var_name("LOG_FORMAT"),
                message,
            })?;
        }

        Ok(())
    }

    /// Read and parse a variable; absent variables yield `None`.
    fn parse_env_var<T>(&self, name: &str) -> ConfigResult<Option<T>>
    where
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        match self.get_env_var(name) {
            Ok(raw) => raw
                .trim()
                .parse()
                .map(Some)
                .map_err(|e: T::Err| ConfigError::Env {
                    name: self.var_name(name),
                    message: format!("'{}': {}", raw.trim(), e),
                }),
            Err(_) => Ok(None),
        }
    }

    /// Read a duration given in seconds, fractions allowed
    fn parse_env_seconds(&self, name: &str) -> ConfigResult<Option<Duration>> {
        let Some(seconds) = self.parse_env_var::<f64>(name)? else {
            return Ok(None);
        };
        Duration::try_from_secs_f64(seconds)
            .map(Some)
            .map_err(|e| ConfigError::Env {
                name: self.var_name(name),
                message: format!("'{}': {}", seconds, e),
            })
    }

    /// Full variable name, prefix included
    fn var_name(&self, name: &str) -> String {
        if self.prefix.is_empty() {
            name.to_string()
        } else {
            format!("{}_{}", self.prefix, name)
        }
    }

    fn get_env_var(&self, name: &str) -> Result<String, std::env::VarError> {
        std::env::var(self.var_name(name))
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}
