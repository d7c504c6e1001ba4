//! HTTP transport with scope enforcement, rate limiting, and cookie support
//!
//! Analyzers and the intruder talk to the network only through the
//! [`Transport`] trait, so tests can substitute a simulated backend.

use crate::core::rate_limit::RateLimiter;
use crate::core::scope::Scope;
use crate::http::request::HttpRequest;
use crate::http::response::HttpResponse;
use anyhow::Result;
use reqwest::{header, redirect::Policy, Client};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::time::Instant;

/// The single capability the probing engine needs from the outside world.
///
/// 4xx/5xx are normal responses; an `Err` means a transport-level failure
/// (connection refused, timeout). Callers must treat transport failures as
/// negative classifications, not abort the scan.
#[allow(async_fn_in_trait)]
pub trait Transport {
    async fn send(&self, req: HttpRequest) -> Result<HttpResponse>;
}

pub struct HttpClient {
    client: Client,
    scope: Scope,
    limiter: RateLimiter,
    default_headers: HashMap<String, String>,
    cookies: Option<String>,
}

impl HttpClient {
    pub fn new(scope: Scope, limiter: RateLimiter) -> Result<Self> {
        Self::with_auth(scope, limiter, None, HashMap::new())
    }

    /// Create a client with cookies and custom headers for authenticated probing
    pub fn with_auth(
        scope: Scope,
        limiter: RateLimiter,
        cookies: Option<String>,
        headers: HashMap<String, String>,
    ) -> Result<Self> {
        let client = Client::builder()
            .danger_accept_invalid_certs(true)
            .redirect(Policy::none())
            .build()?;

        Ok(Self {
            client,
            scope,
            limiter,
            default_headers: headers,
            cookies,
        })
    }
}

impl Transport for HttpClient {
    async fn send(&self, req: HttpRequest) -> Result<HttpResponse> {
        self.limiter.wait().await;

        if !self.scope.is_in_scope(&req.url) {
            anyhow::bail!("Blocked out-of-scope request: {}", req.url);
        }

        let start = Instant::now();

        let mut request = self
            .client
            .request(req.method, req.url.clone())
            .headers(req.headers.clone());

        for (key, value) in &self.default_headers {
            if let Ok(header_name) = header::HeaderName::from_bytes(key.as_bytes()) {
                if let Ok(header_value) = header::HeaderValue::from_str(value) {
                    request = request.header(header_name, header_value);
                }
            }
        }

        if let Some(ref cookies) = self.cookies {
            request = request.header(header::COOKIE, cookies);
        }

        if let Some(body) = req.body {
            request = request.body(body);
        }

        let response = request.send().await?;
        let status = response.status().as_u16();

        // repeated headers (Set-Cookie in particular) are newline-joined so
        // none of them is lost in the map
        let mut headers: HashMap<String, String> = HashMap::new();
        for (k, v) in response.headers().iter() {
            let value = v.to_str().unwrap_or("").to_string();
            headers
                .entry(k.to_string())
                .and_modify(|existing| {
                    existing.push('\n');
                    existing.push_str(&value);
                })
                .or_insert(value);
        }

        let body_bytes = response.bytes().await.unwrap_or_default();
        let body_len = body_bytes.len();

        let mut hasher = Sha256::new();
        hasher.update(&body_bytes);
        let body_hash = format!("{:x}", hasher.finalize());

        Ok(HttpResponse {
            status,
            headers,
            body_len,
            body_hash,
            body: body_bytes.to_vec(),
            elapsed_ms: start.elapsed().as_millis(),
        })
    }
}
