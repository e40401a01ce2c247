//! HTTP transport for the orderload harness
//!
//! The engine talks to the API under load through the [`ApiTransport`]
//! trait. [`ApiClient`] is the production implementation on top of a
//! single pooled `reqwest::Client`; [`MockTransport`] serves scripted
//! responses for tests.

pub mod client;
pub mod config;
pub mod errors;
pub mod types;

#[cfg(feature = "mock")]
pub mod mock;

// Re-export main types for convenience
pub use client::{ApiClient, ApiTransport};
pub use config::HttpConfig;
pub use errors::HttpError;
pub use types::{ApiRequest, ApiResponse, HttpMethod, HttpMethodError, ResponseBody};

#[cfg(feature = "mock")]
pub use mock::{MockResponse, MockTransport};
