//! SQL injection analyzer.
//!
//! Detection runs three escalating sweeps per parameter (basic, advanced,
//! WAF bypass), classifying each response on database error signatures and
//! on differential changes against a baseline response. Blind detection
//! pairs true/false conditions and falls back to timing probes.

use std::collections::BTreeMap;

use anyhow::Result;
use regex::Regex;
use tracing::debug;

use crate::analyzers::{build_probe, clamp_impact, AnalysisResult, ProbeTarget};
use crate::http::client::Transport;
use crate::http::response::HttpResponse;
use crate::payloads::sqli::{self, DatabaseType};
use crate::payloads::Tier;

/// Injected and baseline responses are considered meaningfully different
/// above this body-length delta.
const LENGTH_DELTA: usize = 50;

/// Minimum extra latency, in milliseconds, before a timing probe counts as a
/// confirmed time-based injection.
const TIME_DELTA_MS: u128 = 900;

const ERROR_SIGNATURES: &[&str] = &[
    "SQL syntax",
    "MySQL",
    "ORA-",
    "Microsoft SQL Server",
    "PostgreSQL",
    "SQLite",
    "syntax error",
    "Unclosed quotation mark",
    "unterminated string",
    "error in your SQL syntax",
    "unexpected end of SQL command",
    "ERROR:",
    "Warning:",
    "ODBC Driver",
    "DB2 SQL error",
    "Sybase message",
];

/// Markers whose appearance or disappearance flags a boolean flip.
const DIFF_MARKERS: &[&str] = &[
    "No results",
    "Error",
    "Exception",
    "<table>",
    "<tr>",
    "<div class='result'>",
];

pub struct SqlInjectionAnalyzer<'t, T> {
    transport: &'t T,
}

impl<'t, T: Transport> SqlInjectionAnalyzer<'t, T> {
    pub fn new(transport: &'t T) -> Self {
        Self { transport }
    }

    async fn probe(
        &self,
        target: &ProbeTarget,
        param: &str,
        value: String,
    ) -> Result<Option<HttpResponse>> {
        let mut params = target.params.clone();
        params.insert(param.to_string(), value);
        let req = build_probe(target, &params)?;
        match self.transport.send(req).await {
            Ok(resp) => Ok(Some(resp)),
            Err(err) => {
                debug!(%param, error = %err, "SQL injection probe failed, skipping");
                Ok(None)
            }
        }
    }

    /// Error-based and boolean-differential detection across all parameters.
    pub async fn detect(&self, target: &ProbeTarget) -> Result<AnalysisResult> {
        let baseline = match self.transport.send(build_probe(target, &target.params)?).await {
            Ok(resp) => resp,
            Err(err) => {
                debug!(error = %err, "baseline request failed");
                return Ok(AnalysisResult::negative());
            }
        };
        let baseline_text = baseline.body_text();

        for (param, original) in &target.params {
            for tier in [Tier::Basic, Tier::Advanced] {
                let boolean_impact = match tier {
                    Tier::Basic => 3,
                    _ => 4,
                };
                debug!(%param, tier = tier.name(), "escalating SQL payload tier");
                for payload in sqli::tier(tier) {
                    let Some(resp) = self
                        .probe(target, param, format!("{original}{payload}"))
                        .await?
                    else {
                        continue;
                    };
                    let body = resp.body_text();
                    let result = classify(&body, payload);
                    if result.vulnerable {
                        return Ok(result);
                    }
                    if !resp.same_body(&baseline) && response_changed(&baseline_text, &body) {
                        return Ok(AnalysisResult {
                            vulnerable: true,
                            vulnerability_type: "Boolean-based SQL Injection".to_string(),
                            evidence: body,
                            payload: payload.to_string(),
                            impact_level: boolean_impact,
                            ..Default::default()
                        });
                    }
                }
            }

            for payload in sqli::tier(Tier::Evasion) {
                let Some(resp) = self
                    .probe(target, param, format!("{original}{payload}"))
                    .await?
                else {
                    continue;
                };
                let body = resp.body_text();
                let mut result = classify(&body, payload);
                if result.vulnerable {
                    result.vulnerability_type = "WAF-bypass SQL Injection".to_string();
                    result.impact_level = 5;
                    return Ok(result);
                }
            }
        }
        Ok(AnalysisResult::negative())
    }

    /// Boolean-pair and timing-based blind detection.
    pub async fn detect_blind(&self, target: &ProbeTarget) -> Result<AnalysisResult> {
        for (param, original) in &target.params {
            for payload in sqli::blind(DatabaseType::Generic) {
                let true_resp = self
                    .probe(target, param, format!("{original}{payload} AND 1=1"))
                    .await?;
                let false_resp = self
                    .probe(target, param, format!("{original}{payload} AND 1=2"))
                    .await?;
                let (Some(true_resp), Some(false_resp)) = (true_resp, false_resp) else {
                    continue;
                };
                if !true_resp.same_body(&false_resp)
                    && response_changed(&true_resp.body_text(), &false_resp.body_text())
                {
                    let db = self.fingerprint_database(target, param).await?;
                    return Ok(AnalysisResult {
                        vulnerable: true,
                        vulnerability_type: "Blind SQL Injection".to_string(),
                        detail: db.name().to_string(),
                        evidence: "true and false conditions produced different responses"
                            .to_string(),
                        payload: payload.to_string(),
                        impact_level: impact("Blind SQL Injection", db.name()),
                        ..Default::default()
                    });
                }
            }

            for (payload, db) in sqli::time_based() {
                let Some(baseline) = self
                    .probe(target, param, original.clone())
                    .await?
                else {
                    continue;
                };
                let Some(injected) = self
                    .probe(target, param, format!("{original}{payload}"))
                    .await?
                else {
                    continue;
                };
                if injected.elapsed_ms > baseline.elapsed_ms + TIME_DELTA_MS {
                    return Ok(AnalysisResult {
                        vulnerable: true,
                        vulnerability_type: "Time-based Blind SQL Injection".to_string(),
                        detail: db.name().to_string(),
                        evidence: format!(
                            "response delayed {}ms against a {}ms baseline",
                            injected.elapsed_ms, baseline.elapsed_ms
                        ),
                        payload: payload.to_string(),
                        impact_level: impact("Time-based Blind SQL Injection", db.name()),
                        ..Default::default()
                    });
                }
            }
        }
        Ok(AnalysisResult::negative())
    }

    /// Identify the backend by sending engine-specific expressions; the first
    /// probe that comes back without a database error names the engine.
    pub async fn fingerprint_database(
        &self,
        target: &ProbeTarget,
        param: &str,
    ) -> Result<DatabaseType> {
        for (probe, db) in sqli::fingerprint_probes() {
            let Some(resp) = self.probe(target, param, format!("1{probe}")).await? else {
                continue;
            };
            if !detect_database_errors(&resp.body_text()) {
                return Ok(db);
            }
        }
        Ok(DatabaseType::Generic)
    }

    /// Run engine-tailored extraction payloads against a confirmed-vulnerable
    /// parameter and collect whatever leaks.
    pub async fn extract_database_info(
        &self,
        target: &ProbeTarget,
        param: &str,
        db: DatabaseType,
    ) -> Result<AnalysisResult> {
        let mut result = AnalysisResult {
            vulnerable: true,
            vulnerability_type: "Data Extraction SQL Injection".to_string(),
            detail: db.name().to_string(),
            impact_level: 5,
            ..Default::default()
        };
        for payload in sqli::data_extraction(db) {
            let Some(resp) = self.probe(target, param, format!("1{payload}")).await? else {
                continue;
            };
            let body = resp.body_text();
            let leaked = extract_leaked_data(&body);
            if !leaked.is_empty() && result.payload.is_empty() {
                result.payload = payload.to_string();
                result.evidence = body;
            }
            result.extracted_data.extend(leaked);
        }
        Ok(result)
    }
}

/// Error-signature classification of one response.
pub fn classify(body: &str, payload: &str) -> AnalysisResult {
    if !detect_database_errors(body) {
        return AnalysisResult::negative();
    }
    let database = if body.contains("MySQL") || body.contains("You have an error in your SQL syntax")
    {
        "MySQL"
    } else if body.contains("Microsoft SQL Server") || body.contains("Unclosed quotation mark") {
        "MSSQL"
    } else if body.contains("ORA-") {
        "Oracle"
    } else if body.contains("PostgreSQL") || body.contains("PSQLException") {
        "PostgreSQL"
    } else if body.contains("SQLite") {
        "SQLite"
    } else {
        "Unknown"
    };
    AnalysisResult {
        vulnerable: true,
        vulnerability_type: "Error-based SQL Injection".to_string(),
        detail: database.to_string(),
        evidence: body.to_string(),
        payload: payload.to_string(),
        impact_level: impact("Error-based SQL Injection", database),
        extracted_data: extract_leaked_data(body),
    }
}

pub fn detect_database_errors(body: &str) -> bool {
    ERROR_SIGNATURES.iter().any(|sig| body.contains(sig))
}

/// Two responses differ when body length moves beyond [`LENGTH_DELTA`] or a
/// diff marker flips presence.
pub fn response_changed(original: &str, injected: &str) -> bool {
    if original.len().abs_diff(injected.len()) > LENGTH_DELTA {
        return true;
    }
    DIFF_MARKERS
        .iter()
        .any(|m| original.contains(m) != injected.contains(m))
}

fn extract_leaked_data(body: &str) -> BTreeMap<String, String> {
    let patterns: &[(&str, &str)] = &[
        ("Database: ([^<]+)", "database_name"),
        ("Version: ([^<]+)", "database_version"),
        ("User: ([^<]+)", "database_user"),
        ("([a-zA-Z0-9_-]+):([^<]+)", "table_data"),
        ("Error in SQL syntax: ([^<]+)", "sql_error"),
    ];
    let mut extracted = BTreeMap::new();
    for (pattern, key) in patterns {
        let Ok(re) = Regex::new(pattern) else {
            continue;
        };
        for caps in re.captures_iter(body) {
            if let Some(m) = caps.get(1) {
                extracted.insert(key.to_string(), m.as_str().to_string());
            }
        }
    }
    extracted
}

fn impact(vulnerability_type: &str, database: &str) -> u8 {
    let mut level: i32 = match vulnerability_type {
        "Union-based SQL Injection" => 4,
        "Data Extraction SQL Injection" | "WAF-bypass SQL Injection" => 5,
        _ => 3,
    };
    // enterprise backends expose more dangerous primitives
    if database == "MSSQL" || database == "Oracle" {
        level += 1;
    }
    clamp_impact(level)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::testing::{html_response, query_param, response_with_timing, MockTransport};
    use url::Url;

    fn target() -> ProbeTarget {
        ProbeTarget::from_url(Url::parse("http://target.example/items?id=1").unwrap())
    }

    #[test]
    fn mysql_error_classifies_with_engine() {
        let body = "<div class='error'>You have an error in your SQL syntax near ''' at line 1</div>";
        let result = classify(body, "' OR '1'='1");
        assert!(result.vulnerable);
        assert_eq!(result.vulnerability_type, "Error-based SQL Injection");
        assert_eq!(result.detail, "MySQL");
        assert_eq!(result.impact_level, 3);
    }

    #[test]
    fn mssql_error_raises_impact() {
        let result = classify("Unclosed quotation mark after the character string", "'");
        assert_eq!(result.detail, "MSSQL");
        assert_eq!(result.impact_level, 4);
    }

    #[test]
    fn clean_response_is_negative() {
        assert!(!classify("<html><body>3 items found</body></html>", "'").vulnerable);
    }

    #[test]
    fn marker_flip_counts_as_change() {
        assert!(response_changed("<div>Item 1</div>", "<div>No results</div>"));
        assert!(!response_changed("<div>Item 1</div>", "<div>Item 2</div>"));
    }

    #[tokio::test]
    async fn error_based_detection_fires_on_first_payload() {
        let transport = MockTransport::new(|req| {
            let value = query_param(req, "id").unwrap_or_default();
            if value.contains('\'') {
                html_response("You have an error in your SQL syntax; MySQL server version")
            } else {
                html_response("<div>Item 1</div>")
            }
        });
        let analyzer = SqlInjectionAnalyzer::new(&transport);
        let result = analyzer.detect(&target()).await.unwrap();
        assert!(result.vulnerable);
        assert_eq!(result.vulnerability_type, "Error-based SQL Injection");
        assert_eq!(result.detail, "MySQL");
        // baseline plus one probe
        assert_eq!(transport.sent(), 2);
    }

    #[tokio::test]
    async fn blind_detection_sees_boolean_flip() {
        let transport = MockTransport::new(|req| {
            let value = query_param(req, "id").unwrap_or_default();
            if value.contains("AND 1=2") {
                html_response("<div>No results found</div>")
            } else {
                html_response("<div>Item 1</div><div>Item 2</div>")
            }
        });
        let analyzer = SqlInjectionAnalyzer::new(&transport);
        let result = analyzer.detect_blind(&target()).await.unwrap();
        assert!(result.vulnerable);
        assert_eq!(result.vulnerability_type, "Blind SQL Injection");
        assert_eq!(result.impact_level, 4);
    }

    #[tokio::test]
    async fn time_based_detection_compares_against_baseline() {
        let transport = MockTransport::new(|req| {
            let value = query_param(req, "id").unwrap_or_default();
            // identical bodies keep the boolean diff quiet
            if value.contains("SLEEP(1)") {
                response_with_timing("<div>Query executed</div>", 1200)
            } else {
                response_with_timing("<div>Query executed</div>", 80)
            }
        });
        let analyzer = SqlInjectionAnalyzer::new(&transport);
        let result = analyzer.detect_blind(&target()).await.unwrap();
        assert!(result.vulnerable);
        assert_eq!(result.vulnerability_type, "Time-based Blind SQL Injection");
        assert_eq!(result.detail, "MySQL");
    }

    #[tokio::test]
    async fn fingerprint_names_engine_whose_probe_runs_clean() {
        let transport = MockTransport::new(|req| {
            let value = query_param(req, "id").unwrap_or_default();
            if value.contains("@@version") {
                html_response("<div>Item 1</div>")
            } else {
                html_response("syntax error near unexpected token")
            }
        });
        let analyzer = SqlInjectionAnalyzer::new(&transport);
        let db = analyzer.fingerprint_database(&target(), "id").await.unwrap();
        assert_eq!(db, DatabaseType::MySql);
    }

    #[tokio::test]
    async fn extraction_collects_leaked_fields() {
        let transport = MockTransport::new(|_| {
            html_response("<div>Database: test_db</div><div>Version: 5.7.32</div><div>User: db_user</div>")
        });
        let analyzer = SqlInjectionAnalyzer::new(&transport);
        let result = analyzer
            .extract_database_info(&target(), "id", DatabaseType::MySql)
            .await
            .unwrap();
        assert!(result.vulnerable);
        assert_eq!(result.impact_level, 5);
        assert_eq!(
            result.extracted_data.get("database_name").map(String::as_str),
            Some("test_db")
        );
        assert_eq!(
            result.extracted_data.get("database_version").map(String::as_str),
            Some("5.7.32")
        );
    }
}
