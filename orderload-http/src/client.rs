//! HTTP client implementation

use crate::config::HttpConfig;
use crate::errors::HttpError;
use crate::types::{ApiRequest, ApiResponse, ResponseBody};
use reqwest::Client;
use tracing::debug;

/// Transport used by the dispatcher to reach the API under load
#[async_trait::async_trait]
pub trait ApiTransport: Send + Sync {
    /// Execute one request. Non-2xx statuses are responses, not errors;
    /// only transport-level failures return `Err`.
    async fn send(&self, request: &ApiRequest) -> Result<ApiResponse, HttpError>;
}

/// `reqwest`-backed transport sharing one connection pool for the whole run
#[derive(Debug, Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
}

impl ApiClient {
    /// Build a client for `base_url` with the given configuration
    pub fn new(base_url: impl Into<String>, config: &HttpConfig) -> Result<Self, HttpError> {
        let base_url = base_url.into();
        if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
            return Err(HttpError::InvalidUrl(base_url));
        }

        debug!(
            "Creating ApiClient for {} with timeout: {}s",
            base_url,
            config.timeout.as_secs()
        );

        let client = Client::builder()
            .timeout(config.timeout)
            .connect_timeout(config.connect_timeout)
            .user_agent(&config.user_agent)
            .danger_accept_invalid_certs(!config.verify_ssl)
            .pool_max_idle_per_host(config.max_idle_per_host)
            .pool_idle_timeout(config.idle_timeout)
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Join the base URL and a request path without doubling slashes
    pub fn url_for(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }
}

#[async_trait::async_trait]
impl ApiTransport for ApiClient {
    async fn send(&self, request: &ApiRequest) -> Result<ApiResponse, HttpError> {
        let url = self.url_for(&request.path);
        debug!("Building {} request to {}", request.method, url);

        let mut builder = self
            .client
            .request(reqwest::Method::from(request.method), &url);

        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }

        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = builder.send().await?;
        let status = response.status().as_u16();

        // Read once as text; JSON parsing falls back to the raw text
        let text = response.text().await?;
        debug!("HTTP response received: {} ({} bytes)", status, text.len());

        Ok(ApiResponse::new(status, ResponseBody::from_text(text)))
    }
}
