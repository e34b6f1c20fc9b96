use reqwest::{Client, Method, StatusCode, header::HeaderMap};
use serde_json::Value;

use crate::error::DnsError;

/// Raw outcome of a provider call: the status is returned untouched so each
/// driver can map it to a domain error.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    /// Parsed JSON body. Empty bodies are `Null`, non-JSON bodies a `String`.
    pub body: Value,
}

/// Transport used by the drivers. Implement it to swap out reqwest.
pub trait DnsHttpClient: Send + Sync {
    fn request(
        &self,
        method: Method,
        url: String,
        headers: HeaderMap,
        body: Option<String>,
    ) -> impl Future<Output = Result<HttpResponse, DnsError>> + Send;
}

pub struct DefaultDnsClient {
    inner: Client,
}

impl DefaultDnsClient {
    pub fn new() -> Self {
        Self {
            inner: Client::new(),
        }
    }
}

impl Default for DefaultDnsClient {
    fn default() -> Self {
        Self::new()
    }
}

impl DnsHttpClient for DefaultDnsClient {
    async fn request(
        &self,
        method: Method,
        url: String,
        headers: HeaderMap,
        body: Option<String>,
    ) -> Result<HttpResponse, DnsError> {
        let mut req = self.inner.request(method, url).headers(headers);
        if let Some(body) = body {
            req = req.body(body);
        }
        // Vultr authenticates in the query string, so errors must not carry the URL.
        let response = req.send().await.map_err(|e| DnsError::Http(e.without_url()))?;

        let status = response.status();
        let headers = response.headers().clone();
        let text = response.text().await.map_err(|e| DnsError::Http(e.without_url()))?;

        Ok(HttpResponse {
            status,
            headers,
            body: parse_body(&text),
        })
    }
}

/// Vultr answers errors in plain text and deletes with an empty body.
pub(crate) fn parse_body(text: &str) -> Value {
    if text.trim().is_empty() {
        return Value::Null;
    }
    serde_json::from_str(text).unwrap_or_else(|_| Value::String(text.to_string()))
}
