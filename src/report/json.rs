//! JSON report serializer.
//!
//! The document layout is fixed: general info, statistics, then one array
//! per vulnerability class. XSS entries carry `context`, SQL entries carry
//! `database_type`, CSRF entries carry an `affected_functions` object keyed
//! by what was affected.

use anyhow::Result;
use serde_json::{json, Map, Value};

use crate::analyzers::AnalysisResult;
use crate::report::Report;

pub fn generate(report: &Report) -> Result<String> {
    let doc = json!({
        "target_url": report.target_url,
        "scan_date": report.scan_date,
        "vulnerabilities_found": report.vulnerabilities_found(),
        "statistics": report.statistics,
        "xss_vulnerabilities": report.xss_results.iter().map(xss_entry).collect::<Vec<_>>(),
        "xxe_vulnerabilities": report.xxe_results.iter().map(xxe_entry).collect::<Vec<_>>(),
        "sql_injection_vulnerabilities": report.sql_results.iter().map(sql_entry).collect::<Vec<_>>(),
        "csrf_vulnerabilities": report.csrf_results.iter().map(csrf_entry).collect::<Vec<_>>(),
    });
    Ok(serde_json::to_string_pretty(&doc)?)
}

fn extracted_data(result: &AnalysisResult) -> Value {
    let mut map = Map::new();
    for (k, v) in &result.extracted_data {
        map.insert(k.clone(), Value::String(v.clone()));
    }
    Value::Object(map)
}

fn xss_entry(result: &AnalysisResult) -> Value {
    json!({
        "vulnerable": result.vulnerable,
        "vulnerability_type": result.vulnerability_type,
        "context": result.detail,
        "evidence": result.evidence,
        "payload": result.payload,
        "impact_level": result.impact_level,
    })
}

fn xxe_entry(result: &AnalysisResult) -> Value {
    json!({
        "vulnerable": result.vulnerable,
        "vulnerability_type": result.vulnerability_type,
        "evidence": result.evidence,
        "payload": result.payload,
        "extracted_data": extracted_data(result),
    })
}

fn sql_entry(result: &AnalysisResult) -> Value {
    json!({
        "vulnerable": result.vulnerable,
        "vulnerability_type": result.vulnerability_type,
        "database_type": result.detail,
        "evidence": result.evidence,
        "payload": result.payload,
        "impact_level": result.impact_level,
        "extracted_data": extracted_data(result),
    })
}

fn csrf_entry(result: &AnalysisResult) -> Value {
    json!({
        "vulnerable": result.vulnerable,
        "vulnerability_type": result.vulnerability_type,
        "evidence": result.evidence,
        "payload": result.payload,
        "impact_level": result.impact_level,
        "affected_functions": extracted_data(result),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn sample_report() -> Report {
        let mut report = Report::new("http://target.example");
        report.scan_date = "2026-08-30 12:00:00".to_string();
        report.xss_results.push(AnalysisResult {
            vulnerable: true,
            vulnerability_type: "Reflected XSS".to_string(),
            detail: "JavaScript".to_string(),
            evidence: "<script>var q = '...'</script>".to_string(),
            payload: "';alert('XSS');//".to_string(),
            impact_level: 4,
            ..Default::default()
        });
        report.sql_results.push(AnalysisResult {
            vulnerable: true,
            vulnerability_type: "Error-based SQL Injection".to_string(),
            detail: "MySQL".to_string(),
            evidence: "You have an error in your SQL syntax".to_string(),
            payload: "' OR '1'='1".to_string(),
            impact_level: 3,
            extracted_data: BTreeMap::from([(
                "database_version".to_string(),
                "5.7.32".to_string(),
            )]),
        });
        report.csrf_results.push(AnalysisResult {
            vulnerable: true,
            vulnerability_type: "POST CSRF".to_string(),
            detail: "POST".to_string(),
            evidence: "<form>...</form>".to_string(),
            payload: "<html>...</html>".to_string(),
            impact_level: 5,
            extracted_data: BTreeMap::from([(
                "form_action".to_string(),
                "/account/change-password".to_string(),
            )]),
        });
        report.update_statistics();
        report
    }

    #[test]
    fn document_has_fixed_top_level_shape() {
        let doc: serde_json::Value =
            serde_json::from_str(&generate(&sample_report()).unwrap()).unwrap();
        assert_eq!(doc["target_url"], "http://target.example");
        assert_eq!(doc["scan_date"], "2026-08-30 12:00:00");
        assert_eq!(doc["vulnerabilities_found"], true);
        assert_eq!(doc["xss_vulnerabilities"][0]["context"], "JavaScript");
        assert_eq!(
            doc["sql_injection_vulnerabilities"][0]["database_type"],
            "MySQL"
        );
        assert_eq!(
            doc["csrf_vulnerabilities"][0]["affected_functions"]["form_action"],
            "/account/change-password"
        );
        assert!(doc["xxe_vulnerabilities"].as_array().unwrap().is_empty());
    }

    #[test]
    fn statistics_round_trip() {
        let report = sample_report();
        let doc: serde_json::Value = serde_json::from_str(&generate(&report).unwrap()).unwrap();
        let stats = &doc["statistics"];
        assert_eq!(
            stats["total_vulnerabilities"].as_u64().unwrap() as usize,
            report.statistics.total_vulnerabilities
        );
        assert_eq!(
            stats["critical_vulnerabilities"].as_u64().unwrap() as usize,
            report.statistics.critical_vulnerabilities
        );
        assert_eq!(
            stats["high_vulnerabilities"].as_u64().unwrap() as usize,
            report.statistics.high_vulnerabilities
        );
        assert_eq!(
            stats["medium_vulnerabilities"].as_u64().unwrap() as usize,
            report.statistics.medium_vulnerabilities
        );
        assert_eq!(
            stats["low_vulnerabilities"].as_u64().unwrap() as usize,
            report.statistics.low_vulnerabilities
        );
    }

    #[test]
    fn payload_quoting_survives_serialization() {
        let doc: serde_json::Value =
            serde_json::from_str(&generate(&sample_report()).unwrap()).unwrap();
        assert_eq!(
            doc["sql_injection_vulnerabilities"][0]["payload"],
            "' OR '1'='1"
        );
    }
}
