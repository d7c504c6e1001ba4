//! Vulnerability analyzers.
//!
//! Each analyzer follows the same shape: mutate one parameter at a time with
//! catalog payloads, send the probe through a [`Transport`], classify the
//! response, and stop at the first positive result. Transport failures are
//! classification noise, never vulnerabilities.

use std::collections::BTreeMap;

use anyhow::Result;
use reqwest::header::HeaderMap;
use url::Url;

use crate::http::request::HttpRequest;

pub mod csrf;
pub mod sqli;
pub mod xss;
pub mod xxe;

pub use csrf::CsrfAnalyzer;
pub use sqli::SqlInjectionAnalyzer;
pub use xss::XssAnalyzer;
pub use xxe::XxeAnalyzer;

/// What a single analyzer run concluded. A default result means "nothing
/// found"; `vulnerable` results always carry the payload that triggered the
/// classification and an impact level in 1..=5.
#[derive(Debug, Clone, Default)]
pub struct AnalysisResult {
    pub vulnerable: bool,
    /// Human-readable class, e.g. "Reflected XSS" or "Error-based SQL Injection".
    pub vulnerability_type: String,
    /// Class-specific qualifier: execution context for XSS, database engine
    /// for SQLi, attack vector for XXE, request method for CSRF.
    pub detail: String,
    pub evidence: String,
    pub payload: String,
    pub impact_level: u8,
    /// Data pulled out of responses during exploitation, keyed by what it is.
    pub extracted_data: BTreeMap<String, String>,
}

impl AnalysisResult {
    pub fn negative() -> Self {
        Self::default()
    }
}

/// A parameterized location to probe. Params are ordered so probe sequences
/// are deterministic.
#[derive(Debug, Clone)]
pub struct ProbeTarget {
    pub url: Url,
    pub params: BTreeMap<String, String>,
    pub headers: HeaderMap,
}

impl ProbeTarget {
    pub fn new(url: Url) -> Self {
        Self {
            url,
            params: BTreeMap::new(),
            headers: HeaderMap::new(),
        }
    }

    pub fn with_params(url: Url, params: BTreeMap<String, String>) -> Self {
        Self {
            url,
            params,
            headers: HeaderMap::new(),
        }
    }

    /// Derive a target from the URL's own query string.
    pub fn from_url(url: Url) -> Self {
        let params = url
            .query_pairs()
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();
        Self {
            url,
            params,
            headers: HeaderMap::new(),
        }
    }
}

/// Build a GET probe for `target` with `params` as the full query string.
pub fn build_probe(target: &ProbeTarget, params: &BTreeMap<String, String>) -> Result<HttpRequest> {
    let mut url = target.url.clone();
    url.query_pairs_mut().clear().extend_pairs(params.iter());
    let mut req = HttpRequest::get(url);
    for (name, value) in target.headers.iter() {
        req.headers.insert(name.clone(), value.clone());
    }
    Ok(req)
}

/// Clamp a raw impact score into the 1..=5 scale.
pub fn clamp_impact(raw: i32) -> u8 {
    raw.clamp(1, 5) as u8
}
