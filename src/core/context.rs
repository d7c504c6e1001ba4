//! Global context for scan execution

use std::collections::{BTreeMap, HashMap};

use anyhow::{bail, Result};
use url::Url;

use crate::cli::args::Cli;
use crate::core::scope::Scope;
use crate::intruder::AttackType;
use crate::scanner::VulnerabilityClass;

/// What the engine should do with the target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanMode {
    Target,
    Form,
    XmlEndpoint,
    Api,
    AdvancedSql,
    AdvancedXss,
    Intruder,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportFormat {
    Html,
    Json,
}

/// Intruder-mode settings lifted out of the CLI.
#[derive(Debug, Clone)]
pub struct IntruderConfig {
    pub attack: AttackType,
    pub payload_files: Vec<String>,
    pub data: Option<String>,
    pub method: String,
    pub interval_ms: u64,
}

pub struct Context {
    pub target: String,
    pub mode: ScanMode,
    pub classes: Vec<VulnerabilityClass>,
    pub params: BTreeMap<String, String>,
    pub scope: Scope,
    pub rate_limit: u32,
    pub quiet: bool,
    pub verbose: bool,
    pub output_format: ReportFormat,
    pub output_file: Option<String>,
    pub cookies: Option<String>,
    pub headers: HashMap<String, String>,
    pub exfiltration_server: Option<String>,
    pub intruder: Option<IntruderConfig>,
}

impl Context {
    pub fn from_cli(cli: Cli) -> Result<Self> {
        let mut scope = Scope::new(&cli.target)?;

        // the OOB listener is a deliberate second host, not a scope leak
        if let Some(ref server) = cli.exfil_server {
            if let Some(host) = Url::parse(server)?.host_str() {
                scope.allow(host);
            }
        }

        let mode = match (
            cli.intruder,
            cli.form,
            cli.xml_endpoint,
            cli.api,
            cli.advanced_sql,
            cli.advanced_xss,
        ) {
            (true, false, false, false, false, false) => ScanMode::Intruder,
            (false, true, false, false, false, false) => ScanMode::Form,
            (false, false, true, false, false, false) => ScanMode::XmlEndpoint,
            (false, false, false, true, false, false) => ScanMode::Api,
            (false, false, false, false, true, false) => ScanMode::AdvancedSql,
            (false, false, false, false, false, true) => ScanMode::AdvancedXss,
            (false, false, false, false, false, false) => ScanMode::Target,
            _ => bail!("pick at most one of --intruder, --form, --xml-endpoint, --api, --advanced-sql, --advanced-xss"),
        };

        let classes = if cli.all || !cli.has_class_selection() {
            vec![VulnerabilityClass::All]
        } else {
            let mut classes = Vec::new();
            if cli.xss {
                classes.push(VulnerabilityClass::Xss);
            }
            if cli.sqli {
                classes.push(VulnerabilityClass::SqlInjection);
            }
            if cli.xxe {
                classes.push(VulnerabilityClass::Xxe);
            }
            if cli.csrf {
                classes.push(VulnerabilityClass::Csrf);
            }
            classes
        };

        let params = parse_params(&cli.params)?;

        let mut headers = HashMap::new();
        for header in &cli.headers {
            if let Some((key, value)) = header.split_once(':') {
                headers.insert(key.trim().to_string(), value.trim().to_string());
            }
        }

        let output_format = match cli.format.to_ascii_lowercase().as_str() {
            "html" => ReportFormat::Html,
            "json" => ReportFormat::Json,
            other => bail!("unsupported report format '{other}' (expected html or json)"),
        };

        let intruder = if mode == ScanMode::Intruder {
            let attack = match AttackType::parse(&cli.attack) {
                Some(attack) => attack,
                None => bail!(
                    "unknown attack type '{}' (expected sniper, battering-ram, pitchfork, or cluster-bomb)",
                    cli.attack
                ),
            };
            if cli.payload_files.is_empty() {
                bail!("intruder mode needs at least one --payloads file");
            }
            Some(IntruderConfig {
                attack,
                payload_files: cli.payload_files.clone(),
                data: cli.data.clone(),
                method: cli.method.to_uppercase(),
                interval_ms: cli.interval,
            })
        } else {
            None
        };

        Ok(Self {
            target: cli.target,
            mode,
            classes,
            params,
            scope,
            rate_limit: cli.rate,
            quiet: cli.quiet,
            verbose: cli.verbose,
            output_format,
            output_file: cli.output,
            cookies: cli.cookie,
            headers,
            exfiltration_server: cli.exfil_server,
            intruder,
        })
    }
}

fn parse_params(pairs: &[String]) -> Result<BTreeMap<String, String>> {
    let mut params = BTreeMap::new();
    for pair in pairs {
        match pair.split_once('=') {
            Some((name, value)) if !name.is_empty() => {
                params.insert(name.to_string(), value.to_string());
            }
            _ => bail!("invalid --param '{pair}' (expected name=value)"),
        }
    }
    Ok(params)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    fn cli(args: &[&str]) -> Cli {
        let mut full = vec!["orbweaver"];
        full.extend_from_slice(args);
        Cli::parse_from(full)
    }

    #[test]
    fn no_class_flags_means_scan_everything() {
        let ctx = Context::from_cli(cli(&["-t", "http://target.example/"])).unwrap();
        assert_eq!(ctx.mode, ScanMode::Target);
        assert_eq!(ctx.classes, vec![VulnerabilityClass::All]);
    }

    #[test]
    fn class_flags_narrow_the_scan() {
        let ctx =
            Context::from_cli(cli(&["-t", "http://target.example/", "--xss", "--sqli"])).unwrap();
        assert_eq!(
            ctx.classes,
            vec![VulnerabilityClass::Xss, VulnerabilityClass::SqlInjection]
        );
    }

    #[test]
    fn conflicting_modes_are_rejected() {
        assert!(Context::from_cli(cli(&[
            "-t",
            "http://target.example/",
            "--form",
            "--api"
        ]))
        .is_err());
    }

    #[test]
    fn intruder_mode_requires_payload_files() {
        assert!(Context::from_cli(cli(&["-t", "http://target.example/", "--intruder"])).is_err());
        let ctx = Context::from_cli(cli(&[
            "-t",
            "http://target.example/",
            "--intruder",
            "--attack",
            "pitchfork",
            "--payloads",
            "words.txt",
        ]))
        .unwrap();
        let intruder = ctx.intruder.unwrap();
        assert_eq!(intruder.attack, AttackType::Pitchfork);
    }

    #[test]
    fn exfil_server_host_joins_the_scope() {
        let ctx = Context::from_cli(cli(&[
            "-t",
            "http://target.example/",
            "--exfil-server",
            "http://oob.example:8080",
        ]))
        .unwrap();
        assert!(ctx
            .scope
            .is_in_scope(&Url::parse("http://oob.example:8080/evil.dtd").unwrap()));
    }

    #[test]
    fn malformed_params_fail() {
        assert!(Context::from_cli(cli(&[
            "-t",
            "http://target.example/",
            "--api",
            "--param",
            "noequals"
        ]))
        .is_err());
        let ctx = Context::from_cli(cli(&[
            "-t",
            "http://target.example/",
            "--api",
            "--param",
            "id=1",
        ]))
        .unwrap();
        assert_eq!(ctx.params.get("id").map(String::as_str), Some("1"));
    }
}
