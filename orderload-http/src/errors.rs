//! HTTP error types

/// Failures before a response status is available
#[derive(Debug, thiserror::Error)]
pub enum HttpError {
    #[error("Network error: {0}")]
    NetworkError(#[from] reqwest::Error),

    #[error("Invalid base URL: {0}")]
    InvalidUrl(String),

    #[error("No mock response for {method} {path}")]
    NoMockResponse { method: String, path: String },

    #[error("Simulated transport failure: {0}")]
    Simulated(String),
}

impl HttpError {
    /// Whether the failure happened because the request ran out of time
    pub fn is_timeout(&self) -> bool {
        matches!(self, HttpError::NetworkError(e) if e.is_timeout())
    }
}
