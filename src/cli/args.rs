use clap::Parser;

/// Orbweaver – web vulnerability probing & attack-request generation
#[derive(Parser, Debug)]
#[command(
    name = "orbweaver",
    version = "0.1.0",
    about = "Orbweaver – web vulnerability probing & attack-request generation",
    long_about = r#"
Orbweaver probes web targets for XSS, SQL injection, XXE, and CSRF using
curated payload catalogs, then reports findings as HTML or JSON. A
Burp-style intruder mode replays a templated request with payloads
substituted at marked insertion points.

DETECTION:
  • Reflected, DOM-based, and context-aware XSS
  • Error-based, boolean-blind, and time-based SQL injection
  • Database fingerprinting and data-extraction probes
  • XXE file read, SSRF, and out-of-band exfiltration
  • CSRF-unprotected forms and insecure session cookies

INTRUDER:
  • sniper / battering-ram / pitchfork / cluster-bomb strategies
  • Insertion points marked with § pairs in the URL or body
  • Rate-limited, cancellable replay with progress reporting
"#,
    after_help = r#"EXAMPLES:

Full scan:
  orbweaver -t http://testsite.local/page?id=1 --all

Scoped scans:
  orbweaver -t http://testsite.local/search --xss --sqli
  orbweaver -t http://testsite.local/login --form
  orbweaver -t http://testsite.local/api/import --xml-endpoint --exfil-server http://oob.local:8080
  orbweaver -t "http://testsite.local/api/items" --api --param id=1 --param sort=asc

Advanced technique sweeps:
  orbweaver -t http://testsite.local/page?id=1 --advanced-sql
  orbweaver -t http://testsite.local/search?q=x --advanced-xss

Intruder:
  orbweaver -t "http://testsite.local/login" --intruder --attack cluster-bomb \
      --data "user=§admin§&pass=§x§" --payloads users.txt --payloads passwords.txt

Reporting:
  orbweaver -t http://testsite.local --all --format json -o findings.json
  orbweaver -t http://testsite.local --all -o report.html"#
)]
pub struct Cli {
    /// Target URL (e.g. http://testsite.local/page?id=1)
    #[arg(short, long, required = true)]
    pub target: String,

    // ═══════════════════════════════════════════════════════════════════
    // VULNERABILITY CLASSES
    // ═══════════════════════════════════════════════════════════════════

    /// Scan for every vulnerability class
    #[arg(long, help_heading = "VULNERABILITY CLASSES")]
    pub all: bool,

    /// Scan for Cross-Site Scripting
    #[arg(long, help_heading = "VULNERABILITY CLASSES")]
    pub xss: bool,

    /// Scan for SQL injection
    #[arg(long, help_heading = "VULNERABILITY CLASSES")]
    pub sqli: bool,

    /// Scan for XML External Entity injection
    #[arg(long, help_heading = "VULNERABILITY CLASSES")]
    pub xxe: bool,

    /// Scan for Cross-Site Request Forgery
    #[arg(long, help_heading = "VULNERABILITY CLASSES")]
    pub csrf: bool,

    // ═══════════════════════════════════════════════════════════════════
    // SCAN MODES
    // ═══════════════════════════════════════════════════════════════════

    /// Analyze forms on the target page (CSRF + form-field XSS)
    #[arg(long, help_heading = "SCAN MODES")]
    pub form: bool,

    /// Treat the target as an XML-consuming endpoint (XXE chain)
    #[arg(long = "xml-endpoint", help_heading = "SCAN MODES")]
    pub xml_endpoint: bool,

    /// Treat the target as an API endpoint (header-aware probing)
    #[arg(long, help_heading = "SCAN MODES")]
    pub api: bool,

    /// Run the advanced SQL injection technique sweep
    #[arg(long = "advanced-sql", help_heading = "SCAN MODES")]
    pub advanced_sql: bool,

    /// Run the advanced XSS technique sweep
    #[arg(long = "advanced-xss", help_heading = "SCAN MODES")]
    pub advanced_xss: bool,

    /// API parameter as name=value (can be used multiple times)
    #[arg(long = "param", short = 'p', help_heading = "SCAN MODES")]
    pub params: Vec<String>,

    /// Listener URL for out-of-band XXE exfiltration
    #[arg(long = "exfil-server", help_heading = "SCAN MODES")]
    pub exfil_server: Option<String>,

    // ═══════════════════════════════════════════════════════════════════
    // INTRUDER
    // ═══════════════════════════════════════════════════════════════════

    /// Run in intruder mode (replay the base request with payloads)
    #[arg(long, help_heading = "INTRUDER")]
    pub intruder: bool,

    /// Attack strategy: sniper, battering-ram, pitchfork, cluster-bomb
    #[arg(long, default_value = "sniper", help_heading = "INTRUDER")]
    pub attack: String,

    /// Payload wordlist, one per insertion point position (repeatable)
    #[arg(long = "payloads", help_heading = "INTRUDER")]
    pub payload_files: Vec<String>,

    /// Request body; mark insertion points with § pairs
    #[arg(long, help_heading = "INTRUDER")]
    pub data: Option<String>,

    /// HTTP method for the base request
    #[arg(long, default_value = "GET", help_heading = "INTRUDER")]
    pub method: String,

    /// Milliseconds to pause between intruder requests
    #[arg(long, default_value_t = 0, help_heading = "INTRUDER")]
    pub interval: u64,

    // ═══════════════════════════════════════════════════════════════════
    // AUTHENTICATION
    // ═══════════════════════════════════════════════════════════════════

    /// Cookie string for authenticated scanning
    #[arg(long, help_heading = "AUTHENTICATION")]
    pub cookie: Option<String>,

    /// HTTP header as "Name: value" (can be used multiple times)
    #[arg(long = "header", short = 'H', help_heading = "AUTHENTICATION")]
    pub headers: Vec<String>,

    // ═══════════════════════════════════════════════════════════════════
    // PERFORMANCE
    // ═══════════════════════════════════════════════════════════════════

    /// Maximum HTTP requests per second
    #[arg(long, default_value_t = 5, help_heading = "PERFORMANCE")]
    pub rate: u32,

    // ═══════════════════════════════════════════════════════════════════
    // OUTPUT
    // ═══════════════════════════════════════════════════════════════════

    /// Report format (html, json)
    #[arg(long, default_value = "html", help_heading = "OUTPUT")]
    pub format: String,

    /// Write the report to a file instead of stdout
    #[arg(short, long, help_heading = "OUTPUT")]
    pub output: Option<String>,

    /// Skip the banner display
    #[arg(long, help_heading = "OUTPUT")]
    pub no_banner: bool,

    /// Quiet mode (minimal output)
    #[arg(short, long, help_heading = "OUTPUT")]
    pub quiet: bool,

    /// Verbose output (debug level)
    #[arg(short, long, help_heading = "OUTPUT")]
    pub verbose: bool,
}

impl Cli {
    /// True when any per-class scope flag is set.
    pub fn has_class_selection(&self) -> bool {
        self.all || self.xss || self.sqli || self.xxe || self.csrf
    }
}
