//! Configuration error types

use std::path::PathBuf;
use thiserror::Error;

/// Configuration result type
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Configuration errors. All of them stop the harness before the first wave.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config: {0}")]
    Parse(#[from] serde_yaml::Error),

    /// A value outside what its domain accepts
    #[error("Invalid {domain} configuration: {message}")]
    Invalid { domain: String, message: String },

    /// An environment override that does not parse
    #[error("Invalid environment variable {name}: {message}")]
    Env { name: String, message: String },

    #[error("Failed to load .env file: {0}")]
    Dotenv(#[from] dotenvy::Error),

    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),
}
