//! Main orchestrator: builds the transport, drives the selected scan mode,
//! and renders the resulting report.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::time::Duration;

use anyhow::{Context as _, Result};
use reqwest::header::HeaderMap;
use tokio::sync::mpsc;
use tracing::info;
use url::Url;

use crate::core::context::{Context, ReportFormat, ScanMode};
use crate::core::rate_limit::RateLimiter;
use crate::http::client::HttpClient;
use crate::intruder::{load_payload_file, AttackPlan, AttackRecord, CancelHandle, Intruder, Progress, RequestTemplate};
use crate::report::{html, json, Report};
use crate::scanner::SecurityAnalyzer;

pub struct Engine {
    ctx: Context,
}

impl Engine {
    pub fn new(ctx: Context) -> Result<Self> {
        Ok(Self { ctx })
    }

    pub async fn run(&self) -> Result<()> {
        info!("Starting scan against {}", self.ctx.target);
        info!("Rate limit: {} req/sec", self.ctx.rate_limit);

        let limiter = RateLimiter::new(self.ctx.rate_limit);
        let client = if self.ctx.cookies.is_some() || !self.ctx.headers.is_empty() {
            info!("Using authenticated session");
            HttpClient::with_auth(
                self.ctx.scope.clone(),
                limiter,
                self.ctx.cookies.clone(),
                self.ctx.headers.clone(),
            )?
        } else {
            HttpClient::new(self.ctx.scope.clone(), limiter)?
        };

        if self.ctx.mode == ScanMode::Intruder {
            return self.run_intruder(client).await;
        }

        let url = Url::parse(&self.ctx.target)?;
        let mut analyzer = SecurityAnalyzer::new(client);
        if let Some(ref server) = self.ctx.exfiltration_server {
            analyzer.set_exfiltration_server(server.clone());
        }

        let report = match self.ctx.mode {
            ScanMode::Target => analyzer.analyze_target(&url, &self.ctx.classes).await?,
            ScanMode::Form => analyzer.analyze_form(&url).await?,
            ScanMode::XmlEndpoint => analyzer.analyze_xml_endpoint(&url).await?,
            ScanMode::Api => {
                let headers = header_map(&self.ctx.headers);
                analyzer
                    .analyze_api_endpoint(&url, &self.ctx.params, &headers)
                    .await?
            }
            ScanMode::AdvancedSql => analyzer.advanced_sql_analysis(&url).await?,
            ScanMode::AdvancedXss => analyzer.advanced_xss_analysis(&url).await?,
            ScanMode::Intruder => unreachable!("handled above"),
        };

        if !self.ctx.quiet {
            let stats = &report.statistics;
            info!(
                total = stats.total_vulnerabilities,
                critical = stats.critical_vulnerabilities,
                high = stats.high_vulnerabilities,
                medium = stats.medium_vulnerabilities,
                low = stats.low_vulnerabilities,
                "scan complete"
            );
        }

        self.emit_report(&report)
    }

    fn emit_report(&self, report: &Report) -> Result<()> {
        let rendered = match self.ctx.output_format {
            ReportFormat::Html => html::generate(report),
            ReportFormat::Json => json::generate(report)?,
        };
        match &self.ctx.output_file {
            Some(path) => {
                fs::write(path, &rendered)
                    .with_context(|| format!("failed to write report to {path}"))?;
                info!("Report written to {path}");
            }
            None => println!("{rendered}"),
        }
        Ok(())
    }

    async fn run_intruder(&self, client: HttpClient) -> Result<()> {
        let config = self
            .ctx
            .intruder
            .as_ref()
            .context("intruder mode without intruder config")?;

        let header_lines: Vec<String> = self
            .ctx
            .headers
            .iter()
            .map(|(name, value)| format!("{name}: {value}"))
            .collect();
        let (template, points) = RequestTemplate::from_marked(
            config.method.clone(),
            &self.ctx.target,
            &header_lines.join("\n"),
            config.data.as_deref().unwrap_or(""),
        )?;
        if points.is_empty() {
            anyhow::bail!("no \u{00a7}-marked insertion points in the target URL or --data");
        }

        let mut payload_lists = Vec::new();
        for file in &config.payload_files {
            payload_lists.push(load_payload_file(Path::new(file))?);
        }

        let plan = AttackPlan::new(template, config.attack, points, payload_lists)?;
        info!(
            attack = config.attack.name(),
            requests = plan.request_count(),
            "intruder plan validated"
        );

        let mut intruder = Intruder::new(client);
        intruder.set_request_interval(Duration::from_millis(config.interval_ms));

        let (tx, mut rx) = mpsc::unbounded_channel::<Progress>();
        let quiet = self.ctx.quiet;
        let reporter = tokio::spawn(async move {
            while let Some(progress) = rx.recv().await {
                if !quiet {
                    info!(
                        completed = progress.completed,
                        total = progress.total,
                        percent = progress.percent(),
                        "attack progress"
                    );
                }
            }
        });

        let records = intruder.run(&plan, Some(tx), &CancelHandle::new()).await?;
        let _ = reporter.await;

        self.summarize_attack(&records);
        Ok(())
    }

    fn summarize_attack(&self, records: &[AttackRecord]) {
        let mut by_status: BTreeMap<u16, usize> = BTreeMap::new();
        let mut failed = 0usize;
        for record in records {
            match &record.response {
                Some(response) => *by_status.entry(response.status).or_insert(0) += 1,
                None => failed += 1,
            }
        }
        info!(sent = records.len(), failed, "attack summary");
        for (status, count) in &by_status {
            info!(status, count, "responses");
        }
        if !self.ctx.quiet {
            for record in records {
                let (status, len) = match &record.response {
                    Some(response) => (response.status.to_string(), response.body_len),
                    None => ("failed".to_string(), 0),
                };
                println!("{:6} {:>8}  {}", status, len, record.request.url);
            }
        }
    }
}

fn header_map(headers: &std::collections::HashMap<String, String>) -> HeaderMap {
    use reqwest::header::{HeaderName, HeaderValue};
    let mut map = HeaderMap::new();
    for (name, value) in headers {
        if let (Ok(name), Ok(value)) = (
            HeaderName::from_bytes(name.as_bytes()),
            HeaderValue::from_str(value),
        ) {
            map.insert(name, value);
        }
    }
    map
}
