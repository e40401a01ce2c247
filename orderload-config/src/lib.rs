//! Domain-driven configuration for the orderload harness
//!
//! Configuration is split by functional domain (target API, load shape,
//! item cascade, HTTP client, storage paths, logging). Every domain has
//! defaults, can be overridden from the environment, and is validated
//! before a run starts.

pub mod error;
pub mod loader;
pub mod validation;

// Domain-specific configuration modules
pub mod domains;

// Re-export main types
pub use error::{ConfigError, ConfigResult};
pub use loader::ConfigLoader;

// Re-export domain configurations
pub use domains::{
    cascade::CascadeConfig, http::HttpConfig, load::LoadConfig, logging::LoggingConfig,
    storage::StorageConfig, target::TargetConfig, OrderloadConfig,
};

// Re-export utilities
pub use domains::utils::serde_duration;
