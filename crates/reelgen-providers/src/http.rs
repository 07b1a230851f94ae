//! Outbound HTTP wrapper.
//!
//! All vendor calls go through [`HttpClient`], which enforces a per-call
//! timeout and tolerates non-JSON bodies (some vendors return HTML error
//! pages or bare strings on failure).

use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::StatusCode;
use serde_json::Value;

use crate::error::{ProviderError, ProviderResult};

/// Default timeout for a single vendor call.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Maximum length of a raw body snippet kept for diagnostics.
const SNIPPET_MAX_LEN: usize = 300;

/// Response from a vendor call, body parsed leniently.
#[derive(Debug)]
pub struct HttpResponse {
    pub status: StatusCode,
    /// Parsed JSON body, or `Value::String` holding a truncated raw body
    /// when the vendor did not return JSON.
    pub body: Value,
    /// Truncated raw body for error messages.
    pub snippet: String,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }
}

/// Thin reqwest wrapper with a per-call timeout guard.
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: reqwest::Client,
}

impl HttpClient {
    /// Create a client with the given per-call timeout.
    pub fn new(timeout: Duration) -> ProviderResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(ProviderError::Network)?;
        Ok(Self { client })
    }

    /// POST a JSON body and parse the response leniently.
    pub async fn post_json(
        &self,
        url: &str,
        headers: &[(&str, &str)],
        body: &Value,
    ) -> ProviderResult<HttpResponse> {
        let request = self
            .client
            .post(url)
            .headers(build_headers(headers)?)
            .json(body);
        let response = request.send().await.map_err(ProviderError::Network)?;
        read_response(response).await
    }

    /// GET and parse the response leniently.
    pub async fn get_json(&self, url: &str, headers: &[(&str, &str)]) -> ProviderResult<HttpResponse> {
        let request = self.client.get(url).headers(build_headers(headers)?);
        let response = request.send().await.map_err(ProviderError::Network)?;
        read_response(response).await
    }
}

impl Default for HttpClient {
    fn default() -> Self {
        // The builder only fails on TLS backend misconfiguration
        Self::new(DEFAULT_TIMEOUT).unwrap_or_else(|_| Self {
            client: reqwest::Client::new(),
        })
    }
}

fn build_headers(pairs: &[(&str, &str)]) -> ProviderResult<HeaderMap> {
    let mut map = HeaderMap::with_capacity(pairs.len());
    for (name, value) in pairs {
        let name = HeaderName::from_bytes(name.as_bytes())
            .map_err(|e| ProviderError::invalid_response("http", format!("bad header name: {}", e)))?;
        let value = HeaderValue::from_str(value)
            .map_err(|e| ProviderError::invalid_response("http", format!("bad header value: {}", e)))?;
        map.insert(name, value);
    }
    Ok(map)
}

async fn read_response(response: reqwest::Response) -> ProviderResult<HttpResponse> {
    let status = response.status();
    let text = response.text().await.map_err(ProviderError::Network)?;
    let snippet = truncate(&text, SNIPPET_MAX_LEN);

    let body = match serde_json::from_str::<Value>(&text) {
        Ok(v) => v,
        Err(_) => Value::String(snippet.clone()),
    };

    Ok(HttpResponse {
        status,
        body,
        snippet,
    })
}

/// Truncate at a char boundary, appending an ellipsis marker.
fn truncate(s: &str, max: usize) -> String {
    if s.len() <= max {
        return s.to_string();
    }
    let mut end = max;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...", &s[..end])
}
