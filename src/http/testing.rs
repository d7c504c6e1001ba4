//! Closure-backed transport double for unit tests

use crate::http::client::Transport;
use crate::http::request::HttpRequest;
use crate::http::response::HttpResponse;
use anyhow::Result;
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

type Responder = Box<dyn Fn(&HttpRequest) -> HttpResponse + Send + Sync>;

pub struct MockTransport {
    responder: Responder,
    sent: AtomicUsize,
}

impl MockTransport {
    pub fn new<F>(responder: F) -> Self
    where
        F: Fn(&HttpRequest) -> HttpResponse + Send + Sync + 'static,
    {
        Self {
            responder: Box::new(responder),
            sent: AtomicUsize::new(0),
        }
    }

    /// Number of requests dispatched through this transport
    pub fn sent(&self) -> usize {
        self.sent.load(Ordering::SeqCst)
    }
}

impl Transport for MockTransport {
    async fn send(&self, req: HttpRequest) -> Result<HttpResponse> {
        self.sent.fetch_add(1, Ordering::SeqCst);
        Ok((self.responder)(&req))
    }
}

/// Build a 200 text/html response around a body, with a real body hash so
/// differential comparisons behave like the live client.
pub fn html_response(body: &str) -> HttpResponse {
    response_with_timing(body, 50)
}

pub fn response_with_timing(body: &str, elapsed_ms: u128) -> HttpResponse {
    let bytes = body.as_bytes().to_vec();
    let mut hasher = Sha256::new();
    hasher.update(&bytes);
    let body_hash = format!("{:x}", hasher.finalize());

    let mut headers = HashMap::new();
    headers.insert("content-type".to_string(), "text/html".to_string());

    HttpResponse {
        status: 200,
        headers,
        body_len: bytes.len(),
        body_hash,
        body: bytes,
        elapsed_ms,
    }
}

/// Current value of a query parameter, if present
pub fn query_param(req: &HttpRequest, name: &str) -> Option<String> {
    req.url
        .query_pairs()
        .find(|(k, _)| k == name)
        .map(|(_, v)| v.to_string())
}
