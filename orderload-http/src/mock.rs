//! Scripted transport for tests and dry runs

use crate::client::ApiTransport;
use crate::errors::HttpError;
use crate::types::{ApiRequest, ApiResponse, HttpMethod};
use parking_lot::Mutex;
use serde_json::Value as JsonValue;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};
use tracing::debug;

/// What a matching rule answers with
#[derive(Debug, Clone)]
pub enum MockResponse {
    Reply(ApiResponse),
    TransportFailure(String),
}

#[derive(Debug, Clone)]
struct MockRule {
    method: HttpMethod,
    path_prefix: String,
    response: MockResponse,
}

/// Transport serving canned responses, matched by method and path prefix.
///
/// Rules are checked in registration order; the first match wins. Requests
/// with no matching rule fail with [`HttpError::NoMockResponse`] unless a
/// fallback is set. Every request is recorded.
#[derive(Debug, Default)]
pub struct MockTransport {
    rules: Mutex<Vec<MockRule>>,
    fallback: Mutex<Option<ApiResponse>>,
    requests: Mutex<Vec<ApiRequest>>,
    timeline: Mutex<Vec<(Instant, Instant)>>,
    latency: Option<Duration>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Delay every response, so concurrent requests overlap
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Answer every unmatched request with `response`
    pub fn with_fallback(self, response: ApiResponse) -> Self {
        *self.fallback.lock() = Some(response);
        self
    }

    pub fn respond(&self, method: HttpMethod, path_prefix: &str, response: ApiResponse) {
        self.push_rule(method, path_prefix, MockResponse::Reply(response));
        debug!("Added HTTP mock for {} {}", method, path_prefix);
    }

    pub fn respond_json(&self, method: HttpMethod, path_prefix: &str, status: u16, body: JsonValue) {
        self.respond(method, path_prefix, ApiResponse::json(status, body));
    }

    pub fn respond_text(&self, method: HttpMethod, path_prefix: &str, status: u16, body: &str) {
        self.respond(method, path_prefix, ApiResponse::text(status, body));
    }

    pub fn fail(&self, method: HttpMethod, path_prefix: &str, message: &str) {
        self.push_rule(
            method,
            path_prefix,
            MockResponse::TransportFailure(message.to_string()),
        );
    }

    fn push_rule(&self, method: HttpMethod, path_prefix: &str, response: MockResponse) {
        self.rules.lock().push(MockRule {
            method,
            path_prefix: path_prefix.to_string(),
            response,
        });
    }

    /// All requests seen so far, in arrival order
    pub fn requests(&self) -> Vec<ApiRequest> {
        self.requests.lock().clone()
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().len()
    }

    /// Requests whose path starts with `prefix`
    pub fn requests_to(&self, prefix: &str) -> Vec<ApiRequest> {
        self.requests
            .lock()
            .iter()
            .filter(|r| r.path.starts_with(prefix))
            .cloned()
            .collect()
    }

    /// Start and finish instant of every completed request, ordered by start
    pub fn timeline(&self) -> Vec<(Instant, Instant)> {
        let mut timeline = self.timeline.lock().clone();
        timeline.sort_by_key(|(started, _)| *started);
        timeline
    }

    /// Highest number of requests observed in flight at once
    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    fn lookup(&self, request: &ApiRequest) -> Option<MockResponse> {
        let rules = self.rules.lock();
        rules
            .iter()
            .find(|rule| rule.method == request.method && request.path.starts_with(&rule.path_prefix))
            .map(|rule| rule.response.clone())
            .or_else(|| self.fallback.lock().clone().map(MockResponse::Reply))
    }
}

#[async_trait::async_trait]
impl ApiTransport for MockTransport {
    async fn send(&self, request: &ApiRequest) -> Result<ApiResponse, HttpError> {
        self.requests.lock().push(request.clone());
        let started = Instant::now();

        let current = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(current, Ordering::SeqCst);

        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }

        let result = match self.lookup(request) {
            Some(MockResponse::Reply(response)) => Ok(response),
            Some(MockResponse::TransportFailure(message)) => Err(HttpError::Simulated(message)),
            None => Err(HttpError::NoMockResponse {
                method: request.method.to_string(),
                path: request.path.clone(),
            }),
        };

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        self.timeline.lock().push((started, Instant::now()));
        result
    }
}
