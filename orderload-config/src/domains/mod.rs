//! Domain-specific configuration modules

pub mod cascade;
pub mod http;
pub mod load;
pub mod logging;
pub mod storage;
pub mod target;
pub mod utils;

use crate::error::ConfigResult;
use crate::validation::Validatable;
use serde::{Deserialize, Serialize};

/// Complete harness configuration combining all domains.
///
/// Built once at process start and handed to every component constructor.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct OrderloadConfig {
    /// Target API location
    #[serde(default)]
    pub target: target::TargetConfig,

    /// Load shape: concurrency, duration, wave size
    #[serde(default)]
    pub load: load::LoadConfig,

    /// Add-item cascade triggered after a successful order creation
    #[serde(default)]
    pub cascade: cascade::CascadeConfig,

    /// HTTP client configuration
    #[serde(default)]
    pub http: http::HttpConfig,

    /// State, results and static data locations
    #[serde(default)]
    pub storage: storage::StorageConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: logging::LoggingConfig,
}

impl OrderloadConfig {
    /// Validate all domain configurations
    pub fn validate_all(&self) -> ConfigResult<()> {
        self.target.validate()?;
        self.load.validate()?;
        self.cascade.validate()?;
        self.http.validate()?;
        self.storage.validate()?;
        self.logging.validate()?;
        Ok(())
    }

    /// Generate a sample configuration file
    pub fn generate_sample() -> String {
        let config = OrderloadConfig::default();
        serde_yaml::to_string(&config)
            .unwrap_or_else(|_| "# Failed to generate sample config".to_string())
    }
}
