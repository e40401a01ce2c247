//! HTTP types and enums

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// HTTP methods understood by the transport
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    #[default]
    Get,
    Post,
    Put,
    Delete,
    Patch,
    Head,
    Options,
}

impl HttpMethod {
    pub const ALL: [HttpMethod; 7] = [
        HttpMethod::Get,
        HttpMethod::Post,
        HttpMethod::Put,
        HttpMethod::Delete,
        HttpMethod::Patch,
        HttpMethod::Head,
        HttpMethod::Options,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Delete => "DELETE",
            HttpMethod::Patch => "PATCH",
            HttpMethod::Head => "HEAD",
            HttpMethod::Options => "OPTIONS",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HttpMethod {
    type Err = HttpMethodError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Self::ALL
            .into_iter()
            .find(|method| method.as_str().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| HttpMethodError::Unknown(s.to_string()))
    }
}

impl From<HttpMethod> for reqwest::Method {
    fn from(method: HttpMethod) -> Self {
        match method {
            HttpMethod::Get => reqwest::Method::GET,
            HttpMethod::Post => reqwest::Method::POST,
            HttpMethod::Put => reqwest::Method::PUT,
            HttpMethod::Delete => reqwest::Method::DELETE,
            HttpMethod::Patch => reqwest::Method::PATCH,
            HttpMethod::Head => reqwest::Method::HEAD,
            HttpMethod::Options => reqwest::Method::OPTIONS,
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HttpMethodError {
    #[error("unknown HTTP method '{0}'")]
    Unknown(String),
}

/// A request relative to the API base URL
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ApiRequest {
    pub method: HttpMethod,
    /// Path below the base URL, placeholders already substituted
    pub path: String,
    /// Query string pairs, in order
    pub query: Vec<(String, String)>,
    /// JSON body, if any
    pub body: Option<JsonValue>,
}

impl ApiRequest {
    pub fn new(method: HttpMethod, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            body: None,
        }
    }

    pub fn with_body(mut self, body: JsonValue) -> Self {
        self.body = Some(body);
        self
    }

    pub fn with_query(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.query.push((key.into(), value.to_string()));
        self
    }
}

/// Response body, parsed as JSON when possible
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ResponseBody {
    Json(JsonValue),
    Text(String),
}

impl ResponseBody {
    /// Parse raw response text, falling back to plain text
    pub fn from_text(text: String) -> Self {
        if text.trim().is_empty() {
            return ResponseBody::Text(text);
        }
        match serde_json::from_str::<JsonValue>(&text) {
            Ok(json) => ResponseBody::Json(json),
            Err(_) => ResponseBody::Text(text),
        }
    }

    pub fn json(&self) -> Option<&JsonValue> {
        match self {
            ResponseBody::Json(value) => Some(value),
            ResponseBody::Text(_) => None,
        }
    }

    /// The body as text, JSON re-serialized compactly
    pub fn text(&self) -> String {
        match self {
            ResponseBody::Json(value) => value.to_string(),
            ResponseBody::Text(text) => text.clone(),
        }
    }
}

impl Default for ResponseBody {
    fn default() -> Self {
        ResponseBody::Text(String::new())
    }
}

/// A completed HTTP exchange
#[derive(Debug, Clone, PartialEq)]
pub struct ApiResponse {
    pub status: u16,
    pub body: ResponseBody,
}

impl ApiResponse {
    pub fn new(status: u16, body: ResponseBody) -> Self {
        Self { status, body }
    }

    pub fn json(status: u16, body: JsonValue) -> Self {
        Self::new(status, ResponseBody::Json(body))
    }

    pub fn text(status: u16, body: impl Into<String>) -> Self {
        Self::new(status, ResponseBody::Text(body.into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_http_method_from_str() {
        assert_eq!("GET".parse::<HttpMethod>().unwrap(), HttpMethod::Get);
        assert_eq!("post".parse::<HttpMethod>().unwrap(), HttpMethod::Post);
        assert_eq!("delete".parse::<HttpMethod>().unwrap(), HttpMethod::Delete);
        assert_eq!("PATCH".parse::<HttpMethod>().unwrap(), HttpMethod::Patch);

        assert!("INVALID".parse::<HttpMethod>().is_err());
    }

    #[test]
    fn test_http_method_to_reqwest() {
        assert_eq!(reqwest::Method::from(HttpMethod::Get), reqwest::Method::GET);
        assert_eq!(reqwest::Method::from(HttpMethod::Put), reqwest::Method::PUT);
        assert_eq!(reqwest::Method::from(HttpMethod::Options), reqwest::Method::OPTIONS);
    }

    #[test]
    fn test_response_body_parsing() {
        let body = ResponseBody::from_text(r#"{"pedidoNumero": 77}"#.to_string());
        assert_eq!(body.json(), Some(&json!({"pedidoNumero": 77})));

        let body = ResponseBody::from_text("Internal Server Error".to_string());
        assert_eq!(body, ResponseBody::Text("Internal Server Error".to_string()));
        assert!(body.json().is_none());

        let body = ResponseBody::from_text(String::new());
        assert_eq!(body.text(), "");
    }

    #[test]
    fn test_api_request_builder() {
        let request = ApiRequest::new(HttpMethod::Post, "/Pedido/imprime").with_query("nropedido", 42);
        assert_eq!(request.query, vec![("nropedido".to_string(), "42".to_string())]);
        assert!(request.body.is_none());
    }
}
