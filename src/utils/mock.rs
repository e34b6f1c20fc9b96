use std::collections::VecDeque;
use std::sync::Mutex;

use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::{Method, StatusCode};
use serde_json::Value;

use crate::error::DnsError;
use crate::utils::request::{DnsHttpClient, HttpResponse};

/// A request as seen by [`MockDnsClient`].
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: Method,
    pub url: String,
    pub headers: HeaderMap,
    pub body: Option<String>,
}

/// Replays queued responses in order and records every request.
#[derive(Default)]
pub struct MockDnsClient {
    responses: Mutex<VecDeque<HttpResponse>>,
    requests: Mutex<Vec<RecordedRequest>>,
}

impl MockDnsClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(self, status: u16, body: Value) -> Self {
        self.respond_with_headers(status, HeaderMap::new(), body)
    }

    pub fn respond_with_header(self, status: u16, name: &'static str, value: &str, body: Value) -> Self {
        let mut headers = HeaderMap::new();
        headers.insert(name, HeaderValue::from_str(value).unwrap());
        self.respond_with_headers(status, headers, body)
    }

    fn respond_with_headers(self, status: u16, headers: HeaderMap, body: Value) -> Self {
        self.responses.lock().unwrap().push_back(HttpResponse {
            status: StatusCode::from_u16(status).unwrap(),
            headers,
            body,
        });
        self
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn remaining(&self) -> usize {
        self.responses.lock().unwrap().len()
    }
}

impl DnsHttpClient for MockDnsClient {
    async fn request(
        &self,
        method: Method,
        url: String,
        headers: HeaderMap,
        body: Option<String>,
    ) -> Result<HttpResponse, DnsError> {
        self.requests.lock().unwrap().push(RecordedRequest {
            method,
            url: url.clone(),
            headers,
            body,
        });
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| DnsError::InvalidResponse(format!("no canned response for {}", url)))
    }
}
