//! Error types for the engine

use orderload_config::ConfigError;
use orderload_http::HttpError;
use std::path::PathBuf;
use thiserror::Error;

/// Result type for state store operations
pub type StateResult<T> = Result<T, StateError>;

/// Entity state persistence errors.
///
/// None of these abort a run: a failed load starts from empty state and a
/// failed save keeps the in-memory change.
#[derive(Error, Debug)]
pub enum StateError {
    #[error("Failed to read state file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Corrupt state file {path}: {source}")]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to persist state to {path}: {source}")]
    Persist {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to serialize state: {0}")]
    Serialize(#[from] serde_json::Error),
}

impl StateError {
    /// Whether the run can carry on with in-memory state
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, StateError::Serialize(_))
    }
}

/// Errors found while building the workload catalog. Always fatal.
#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("Cannot read product codes from {path}: {source}")]
    ProductCodesUnreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("No product codes found in {0}")]
    NoProductCodes(PathBuf),

    #[error("Unknown workload '{0}'")]
    UnknownWorkload(String),

    #[error("Workload mix is empty")]
    EmptyWorkloadMix,
}

/// Errors writing the run results snapshot
#[derive(Error, Debug)]
pub enum ResultsError {
    #[error("Failed to write results to {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to serialize results: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Errors that stop a run
#[derive(Error, Debug)]
pub enum EngineError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Catalog(#[from] CatalogError),

    #[error(transparent)]
    Http(#[from] HttpError),

    #[error(transparent)]
    Results(#[from] ResultsError),
}
