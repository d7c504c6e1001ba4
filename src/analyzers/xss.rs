//! Cross-site scripting analyzer.

use anyhow::Result;
use regex::Regex;
use tracing::debug;

use crate::analyzers::{build_probe, clamp_impact, AnalysisResult, ProbeTarget};
use crate::http::client::Transport;
use crate::payloads::xss::{self, XssContext};
use crate::payloads::Tier;

/// DOM sinks that make a page worth a follow-up injection attempt.
const DOM_SINK_PATTERNS: &[&str] = &[
    "document.write(",
    "innerHTML",
    "outerHTML",
    "eval(",
    "setTimeout(",
    "setInterval(",
    "location.hash",
    "location.search",
    "document.URL",
    "document.documentURI",
];

const DOM_PROBE_PAYLOAD: &str = "<img src=x onerror=alert('XSS')>";

pub struct XssAnalyzer<'t, T> {
    transport: &'t T,
}

impl<'t, T: Transport> XssAnalyzer<'t, T> {
    pub fn new(transport: &'t T) -> Self {
        Self { transport }
    }

    /// Probe every parameter with escalating payload tiers, stopping at the
    /// first response that both reflects and executes a payload.
    pub async fn detect(&self, target: &ProbeTarget) -> Result<AnalysisResult> {
        for param in target.params.keys() {
            for tier in [Tier::Basic, Tier::Advanced, Tier::Evasion] {
                for payload in xss::tier(tier) {
                    let mut params = target.params.clone();
                    params.insert(param.clone(), payload.to_string());
                    let req = build_probe(target, &params)?;
                    let resp = match self.transport.send(req).await {
                        Ok(resp) => resp,
                        Err(err) => {
                            debug!(%param, error = %err, "XSS probe failed, skipping");
                            continue;
                        }
                    };
                    let result = classify(&resp.body_text(), payload);
                    if result.vulnerable {
                        return Ok(result);
                    }
                }
            }
        }
        Ok(AnalysisResult::negative())
    }

    /// Look for client-side sink patterns in the page, then confirm with an
    /// injected query parameter.
    pub async fn detect_dom_based(&self, target: &ProbeTarget) -> Result<AnalysisResult> {
        let page = match self.transport.send(build_probe(target, &target.params)?).await {
            Ok(resp) => resp.body_text(),
            Err(err) => {
                debug!(error = %err, "DOM XSS page fetch failed");
                return Ok(AnalysisResult::negative());
            }
        };

        if !DOM_SINK_PATTERNS.iter().any(|p| page.contains(p)) {
            return Ok(AnalysisResult::negative());
        }

        let mut params = target.params.clone();
        params.insert("xss".to_string(), DOM_PROBE_PAYLOAD.to_string());
        let resp = match self.transport.send(build_probe(target, &params)?).await {
            Ok(resp) => resp,
            Err(err) => {
                debug!(error = %err, "DOM XSS confirmation probe failed");
                return Ok(AnalysisResult::negative());
            }
        };
        let body = resp.body_text();
        if is_reflected(&body, DOM_PROBE_PAYLOAD) && is_executed(&body, DOM_PROBE_PAYLOAD) {
            return Ok(AnalysisResult {
                vulnerable: true,
                vulnerability_type: "DOM-based XSS".to_string(),
                detail: XssContext::JavaScript.name().to_string(),
                evidence: body,
                payload: DOM_PROBE_PAYLOAD.to_string(),
                impact_level: impact("DOM-based XSS", XssContext::JavaScript),
                ..Default::default()
            });
        }
        Ok(AnalysisResult::negative())
    }
}

/// Classify one response against the payload that was sent.
pub fn classify(body: &str, payload: &str) -> AnalysisResult {
    if !is_reflected(body, payload) || !is_executed(body, payload) {
        return AnalysisResult::negative();
    }
    let context = execution_context(body, payload);
    AnalysisResult {
        vulnerable: true,
        vulnerability_type: "Reflected XSS".to_string(),
        detail: context.name().to_string(),
        evidence: body.to_string(),
        payload: payload.to_string(),
        impact_level: impact("Reflected XSS", context),
        ..Default::default()
    }
}

fn is_reflected(body: &str, payload: &str) -> bool {
    body.contains(payload)
}

/// The payload counts as executed when an executable marker it carries shows
/// up unescaped in the response.
fn is_executed(body: &str, payload: &str) -> bool {
    const MARKERS: &[&str] = &[
        "<script>",
        "onerror=",
        "onload=",
        "javascript:",
        "eval(",
        "setTimeout(",
        "setInterval(",
    ];
    MARKERS
        .iter()
        .any(|m| payload.contains(m) && body.contains(m))
}

/// Figure out which syntactic context the reflection landed in.
fn execution_context(body: &str, payload: &str) -> XssContext {
    let escaped = regex::escape(payload);
    let in_script = Regex::new(&format!("(?is)<script[^>]*>.*?{escaped}")).ok();
    if in_script.is_some_and(|re| re.is_match(body)) {
        return XssContext::JavaScript;
    }
    let in_event_attr = Regex::new(&format!("(?i)\\s(on\\w+)\\s*=\\s*['\"][^'\"]*{escaped}")).ok();
    if in_event_attr.is_some_and(|re| re.is_match(body)) {
        return XssContext::HtmlAttribute;
    }
    let in_url = Regex::new(&format!(
        "(?i)(href|src|action)\\s*=\\s*['\"][^'\"]*{escaped}"
    ))
    .ok();
    if in_url.is_some_and(|re| re.is_match(body)) {
        return XssContext::Url;
    }
    XssContext::HtmlTag
}

fn impact(vulnerability_type: &str, context: XssContext) -> u8 {
    let mut level: i32 = match vulnerability_type {
        "Stored XSS" => 4,
        "Reflected XSS" | "DOM-based XSS" => 3,
        _ => 0,
    };
    match context {
        XssContext::JavaScript => level += 1,
        XssContext::Url => level -= 1,
        _ => {}
    }
    clamp_impact(level)
}
