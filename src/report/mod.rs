//! Scan report assembly and serialization.

use chrono::Local;
use serde::Serialize;

use crate::analyzers::AnalysisResult;

pub mod html;
pub mod json;

/// Severity counters derived from the result lists. Never mutated in place;
/// always recomputed by [`Report::update_statistics`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Statistics {
    pub total_vulnerabilities: usize,
    pub critical_vulnerabilities: usize,
    pub high_vulnerabilities: usize,
    pub medium_vulnerabilities: usize,
    pub low_vulnerabilities: usize,
}

#[derive(Debug, Clone, Default)]
pub struct Report {
    pub target_url: String,
    pub scan_date: String,
    pub xss_results: Vec<AnalysisResult>,
    pub xxe_results: Vec<AnalysisResult>,
    pub sql_results: Vec<AnalysisResult>,
    pub csrf_results: Vec<AnalysisResult>,
    pub statistics: Statistics,
}

impl Report {
    pub fn new(target_url: impl Into<String>) -> Self {
        Self {
            target_url: target_url.into(),
            scan_date: Local::now().format("%Y-%m-%d %H:%M:%S").to_string(),
            ..Default::default()
        }
    }

    pub fn vulnerabilities_found(&self) -> bool {
        self.statistics.total_vulnerabilities > 0
    }

    /// Recompute every counter from scratch by scanning the result lists.
    /// Idempotent; call after any mutation of a result list. XXE findings are
    /// always counted critical regardless of their impact level.
    pub fn update_statistics(&mut self) {
        let mut stats = Statistics::default();
        for result in self
            .xss_results
            .iter()
            .chain(&self.sql_results)
            .chain(&self.csrf_results)
        {
            stats.total_vulnerabilities += 1;
            match result.impact_level {
                5 => stats.critical_vulnerabilities += 1,
                4 => stats.high_vulnerabilities += 1,
                3 => stats.medium_vulnerabilities += 1,
                _ => stats.low_vulnerabilities += 1,
            }
        }
        for _ in &self.xxe_results {
            stats.total_vulnerabilities += 1;
            stats.critical_vulnerabilities += 1;
        }
        self.statistics = stats;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(impact: u8) -> AnalysisResult {
        AnalysisResult {
            vulnerable: true,
            vulnerability_type: "test".to_string(),
            payload: "p".to_string(),
            impact_level: impact,
            ..Default::default()
        }
    }

    #[test]
    fn statistics_bucket_by_impact() {
        let mut report = Report::new("http://target.example");
        report.xss_results.push(result(5));
        report.xss_results.push(result(2));
        report.sql_results.push(result(4));
        report.csrf_results.push(result(3));
        report.update_statistics();

        assert_eq!(report.statistics.total_vulnerabilities, 4);
        assert_eq!(report.statistics.critical_vulnerabilities, 1);
        assert_eq!(report.statistics.high_vulnerabilities, 1);
        assert_eq!(report.statistics.medium_vulnerabilities, 1);
        assert_eq!(report.statistics.low_vulnerabilities, 1);
        assert!(report.vulnerabilities_found());
    }

    #[test]
    fn xxe_always_counts_critical() {
        let mut report = Report::new("http://target.example");
        report.xxe_results.push(result(3));
        report.update_statistics();
        assert_eq!(report.statistics.critical_vulnerabilities, 1);
        assert_eq!(report.statistics.medium_vulnerabilities, 0);
    }

    #[test]
    fn update_is_idempotent() {
        let mut report = Report::new("http://target.example");
        report.sql_results.push(result(5));
        report.update_statistics();
        let first = report.statistics.clone();
        report.update_statistics();
        assert_eq!(report.statistics, first);
    }

    #[test]
    fn severity_partition_sums_to_total() {
        let mut report = Report::new("http://target.example");
        for impact in [1, 2, 3, 4, 5] {
            report.xss_results.push(result(impact));
            report.xxe_results.push(result(impact));
        }
        report.update_statistics();
        let s = &report.statistics;
        assert_eq!(
            s.critical_vulnerabilities
                + s.high_vulnerabilities
                + s.medium_vulnerabilities
                + s.low_vulnerabilities,
            s.total_vulnerabilities
        );
    }
}
