//! Self-contained HTML report.

use std::fmt::Write as _;

use crate::analyzers::AnalysisResult;
use crate::report::Report;

pub fn generate(report: &Report) -> String {
    let mut html = String::new();
    let _ = write!(
        html,
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>Security Report - Orbweaver</title>
    <style>
        body {{ font-family: Arial, sans-serif; margin: 0; padding: 20px; }}
        h1, h2, h3 {{ color: #333; }}
        .container {{ max-width: 1200px; margin: 0 auto; }}
        .header {{ background-color: #f5f5f5; padding: 20px; border-radius: 5px; margin-bottom: 20px; }}
        .summary {{ display: flex; justify-content: space-between; margin-bottom: 20px; }}
        .summary-box {{ background-color: #f9f9f9; padding: 15px; border-radius: 5px; width: 23%; text-align: center; }}
        .critical {{ border-left: 5px solid #d9534f; }}
        .high {{ border-left: 5px solid #f0ad4e; }}
        .medium {{ border-left: 5px solid #5bc0de; }}
        .low {{ border-left: 5px solid #5cb85c; }}
        .vulnerability {{ background-color: #fff; border: 1px solid #ddd; padding: 15px; margin-bottom: 10px; border-radius: 5px; }}
        .evidence {{ background-color: #f5f5f5; padding: 10px; border-radius: 3px; font-family: monospace; overflow-x: auto; }}
    </style>
</head>
<body>
    <div class="container">
        <div class="header">
            <h1>Security Analysis Report</h1>
            <p><strong>Target URL:</strong> {target}</p>
            <p><strong>Scan Date:</strong> {date}</p>
        </div>
        <div class="summary">
            <div class="summary-box critical"><h3>Critical</h3><h2>{critical}</h2></div>
            <div class="summary-box high"><h3>High</h3><h2>{high}</h2></div>
            <div class="summary-box medium"><h3>Medium</h3><h2>{medium}</h2></div>
            <div class="summary-box low"><h3>Low</h3><h2>{low}</h2></div>
        </div>
"#,
        target = escape(&report.target_url),
        date = escape(&report.scan_date),
        critical = report.statistics.critical_vulnerabilities,
        high = report.statistics.high_vulnerabilities,
        medium = report.statistics.medium_vulnerabilities,
        low = report.statistics.low_vulnerabilities,
    );

    section(&mut html, "XSS Vulnerabilities", &report.xss_results, "Context");
    section(&mut html, "XXE Vulnerabilities", &report.xxe_results, "Vector");
    section(
        &mut html,
        "SQL Injection Vulnerabilities",
        &report.sql_results,
        "Database",
    );
    section(&mut html, "CSRF Vulnerabilities", &report.csrf_results, "Method");

    html.push_str(
        r#"        <div class="footer">
            <p>Generated by Orbweaver Security Analyzer</p>
        </div>
    </div>
</body>
</html>"#,
    );
    html
}

fn section(html: &mut String, title: &str, results: &[AnalysisResult], detail_label: &str) {
    if results.is_empty() {
        return;
    }
    let _ = write!(html, "        <h2>{title}</h2>\n");
    for result in results {
        let _ = write!(
            html,
            r#"        <div class="vulnerability">
            <h3>{vtype} (Impact: {impact}/5)</h3>
            <p><strong>{detail_label}:</strong> {detail}</p>
            <p><strong>Payload:</strong> {payload}</p>
            <div class="evidence">
                <p><strong>Evidence:</strong></p>
                <pre>{evidence}</pre>
            </div>
"#,
            vtype = escape(&result.vulnerability_type),
            impact = result.impact_level,
            detail = escape(&result.detail),
            payload = escape(&result.payload),
            evidence = escape(&result.evidence),
        );
        if !result.extracted_data.is_empty() {
            html.push_str(
                "            <div class=\"evidence\">\n                <p><strong>Extracted Data:</strong></p>\n",
            );
            for (key, value) in &result.extracted_data {
                let _ = write!(
                    html,
                    "                <p>{}: {}</p>\n",
                    escape(key),
                    escape(value)
                );
            }
            html.push_str("            </div>\n");
        }
        html.push_str("        </div>\n");
    }
}

fn escape(input: &str) -> String {
    input
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}
