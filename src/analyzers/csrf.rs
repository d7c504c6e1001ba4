//! Cross-site request forgery analyzer.
//!
//! Works on fetched pages instead of injected parameters: every `<form>` is
//! checked for a token field, a token in the action URL, or a token data
//! attribute, and the first unprotected form is reported with a generated
//! auto-submit proof of concept. Session cookie attributes are analyzed
//! separately.

use std::collections::BTreeMap;

use anyhow::Result;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use tracing::debug;
use url::Url;

use crate::analyzers::{clamp_impact, AnalysisResult};
use crate::http::client::Transport;
use crate::http::request::HttpRequest;
use crate::payloads::csrf::{self, CsrfMethod};

const CRITICAL_ACTIONS: &[&str] = &[
    "password", "delete", "remove", "transfer", "payment", "admin", "config", "settings",
    "account", "user",
];

const CRITICAL_FIELDS: &[&str] = &[
    "password", "token", "key", "secret", "admin", "root", "amount", "account",
];

/// One parsed `<form>` with everything the classification needs.
#[derive(Debug, Clone)]
pub struct FormInfo {
    pub action: String,
    pub method: String,
    pub fields: BTreeMap<String, String>,
    pub html: String,
}

pub struct CsrfAnalyzer<'t, T> {
    transport: &'t T,
}

impl<'t, T: Transport> CsrfAnalyzer<'t, T> {
    pub fn new(transport: &'t T) -> Self {
        Self { transport }
    }

    /// Fetch the page and report the first unprotected form.
    pub async fn detect(&self, url: &Url) -> Result<AnalysisResult> {
        let resp = match self.transport.send(HttpRequest::get(url.clone())).await {
            Ok(resp) => resp,
            Err(err) => {
                debug!(error = %err, "CSRF page fetch failed");
                return Ok(AnalysisResult::negative());
            }
        };
        let page_result = analyze_page(&resp.body_text());
        if page_result.vulnerable {
            return Ok(page_result);
        }
        Ok(analyze_cookie_security(&resp.cookies()))
    }
}

/// Classify every form on a page; the first one without CSRF protection wins.
pub fn analyze_page(body: &str) -> AnalysisResult {
    for form in extract_forms(body) {
        if has_csrf_protection(&form) {
            continue;
        }
        let is_post = form.method.eq_ignore_ascii_case("POST");
        let method = if is_post { CsrfMethod::Post } else { CsrfMethod::Get };
        let mut extracted_data = BTreeMap::new();
        if !form.action.is_empty() {
            extracted_data.insert("form_action".to_string(), form.action.clone());
        }
        if !form.fields.is_empty() {
            extracted_data.insert(
                "form_fields".to_string(),
                form.fields.keys().cloned().collect::<Vec<_>>().join(", "),
            );
        }
        return AnalysisResult {
            vulnerable: true,
            vulnerability_type: if is_post { "POST CSRF" } else { "GET CSRF" }.to_string(),
            detail: method.verb().to_string(),
            evidence: form.html.clone(),
            payload: csrf::generate_auto_submit_form(method, &form.action, &form.fields),
            impact_level: impact(&form.action, &form.method, &form.fields),
            extracted_data,
        };
    }
    AnalysisResult::negative()
}

/// Flag session-class cookies that carry neither HttpOnly nor a
/// SameSite=Strict/Lax attribute. Either one alone is accepted.
pub fn analyze_cookie_security(cookies: &[(String, String)]) -> AnalysisResult {
    let mut evidence = String::new();
    for (name, attributes) in cookies {
        let session_class = ["session", "auth", "token", "id"]
            .iter()
            .any(|kw| name.to_ascii_lowercase().contains(kw));
        if !session_class {
            continue;
        }
        let has_http_only = attributes.contains("HttpOnly");
        let has_same_site =
            attributes.contains("SameSite=Strict") || attributes.contains("SameSite=Lax");
        if !has_http_only && !has_same_site {
            evidence.push_str(&format!(
                "insecure cookie: {name} (missing HttpOnly and SameSite)\n"
            ));
        }
    }
    if evidence.is_empty() {
        return AnalysisResult::negative();
    }
    AnalysisResult {
        vulnerable: true,
        vulnerability_type: "Insecure Cookies (CSRF Risk)".to_string(),
        detail: "cookie".to_string(),
        evidence,
        payload: "Set-Cookie attribute analysis".to_string(),
        impact_level: 3,
        ..Default::default()
    }
}

/// Build a standalone proof-of-concept document for a confirmed target.
pub fn generate_exploit_payload(
    target_url: &str,
    method: CsrfMethod,
    params: &BTreeMap<String, String>,
    auto_submit: bool,
) -> String {
    if auto_submit {
        csrf::generate_auto_submit_form(method, target_url, params)
    } else {
        csrf::generate_form(method, target_url, params)
    }
}

/// A token is considered strong when it is at least 10 characters, mixes at
/// least two character classes, and avoids obvious sequences.
pub fn is_token_secure(token: &str) -> bool {
    if token.len() < 10 {
        return false;
    }
    let has_lower = token.chars().any(|c| c.is_ascii_lowercase());
    let has_upper = token.chars().any(|c| c.is_ascii_uppercase());
    let has_digit = token.chars().any(|c| c.is_ascii_digit());
    let has_special = token
        .chars()
        .any(|c| !c.is_ascii_alphanumeric());
    let classes = [has_lower, has_upper, has_digit, has_special]
        .iter()
        .filter(|b| **b)
        .count();
    if classes < 2 {
        return false;
    }
    !(token.contains("123") || token.contains("abc") || token.contains("xyz"))
}

pub fn extract_forms(body: &str) -> Vec<FormInfo> {
    let document = Html::parse_document(body);
    let Ok(form_sel) = Selector::parse("form") else {
        return Vec::new();
    };
    document
        .select(&form_sel)
        .map(|form| FormInfo {
            action: form.value().attr("action").unwrap_or_default().to_string(),
            method: form
                .value()
                .attr("method")
                .unwrap_or("GET")
                .to_string(),
            fields: extract_form_fields(&form),
            html: form.html(),
        })
        .collect()
}

fn extract_form_fields(form: &ElementRef) -> BTreeMap<String, String> {
    let mut fields = BTreeMap::new();

    if let Ok(input_sel) = Selector::parse("input[name]") {
        for input in form.select(&input_sel) {
            let name = input.value().attr("name").unwrap_or_default();
            let value = input.value().attr("value").unwrap_or_default();
            fields.insert(name.to_string(), value.to_string());
        }
    }

    if let Ok(select_sel) = Selector::parse("select[name]") {
        let selected = Selector::parse("option[selected]").ok();
        let first = Selector::parse("option").ok();
        for select in form.select(&select_sel) {
            let name = select.value().attr("name").unwrap_or_default().to_string();
            let value = selected
                .as_ref()
                .and_then(|s| select.select(s).next())
                .or_else(|| first.as_ref().and_then(|s| select.select(s).next()))
                .and_then(|opt| opt.value().attr("value"))
                .unwrap_or_default();
            fields.insert(name, value.to_string());
        }
    }

    if let Ok(textarea_sel) = Selector::parse("textarea[name]") {
        for textarea in form.select(&textarea_sel) {
            let name = textarea.value().attr("name").unwrap_or_default().to_string();
            let value = textarea.text().collect::<String>();
            fields.insert(name, value);
        }
    }

    fields
}

/// A form is protected when any of three signals is present: a token input,
/// a token on the action query string, or a token data attribute.
pub fn has_csrf_protection(form: &FormInfo) -> bool {
    let token_name = Regex::new("(?i)^(csrf|_token|xsrf|authenticity_token)");
    if let Ok(re) = token_name {
        if form.fields.keys().any(|name| re.is_match(name)) {
            return true;
        }
    }
    if let Ok(re) = Regex::new("(?i)[?&](csrf|_token|xsrf|authenticity_token)=") {
        if re.is_match(&form.action) {
            return true;
        }
    }
    if let Ok(re) = Regex::new("(?i)<form[^>]*(data-csrf|data-token)") {
        if re.is_match(&form.html) {
            return true;
        }
    }
    false
}

fn impact(action: &str, method: &str, fields: &BTreeMap<String, String>) -> u8 {
    let mut level: i32 = 3;
    if CRITICAL_ACTIONS.iter().any(|kw| action.contains(kw)) {
        level += 1;
    }
    if fields
        .keys()
        .any(|name| CRITICAL_FIELDS.iter().any(|kw| name.contains(kw)))
    {
        level += 1;
    }
    if method.eq_ignore_ascii_case("POST") {
        level += 1;
    }
    clamp_impact(level)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::testing::MockTransport;

    const PROTECTED_FORM: &str = r#"<html><body>
        <form action="/profile/update" method="POST">
          <input type="hidden" name="csrf_token" value="a1b2c3d4e5f6g7h8i9j0">
          <input type="text" name="username" value="user1">
        </form>
    </body></html>"#;

    const VULNERABLE_FORM: &str = r#"<html><body>
        <form action="/account/change-password" method="POST">
          <input type="password" name="new_password" value="">
          <input type="password" name="confirm_password" value="">
        </form>
    </body></html>"#;

    #[test]
    fn token_field_counts_as_protection() {
        let forms = extract_forms(PROTECTED_FORM);
        assert_eq!(forms.len(), 1);
        assert!(has_csrf_protection(&forms[0]));
        assert!(!analyze_page(PROTECTED_FORM).vulnerable);
    }

    #[test]
    fn unprotected_password_form_is_flagged() {
        let result = analyze_page(VULNERABLE_FORM);
        assert!(result.vulnerable);
        assert_eq!(result.vulnerability_type, "POST CSRF");
        // base 3, critical action (password), critical field, POST: clamped to 5
        assert_eq!(result.impact_level, 5);
        assert!(result.payload.contains("csrfForm"));
        assert_eq!(
            result.extracted_data.get("form_action").map(String::as_str),
            Some("/account/change-password")
        );
    }

    #[test]
    fn get_form_without_critical_fields_scores_lower() {
        let page = r#"<form action="/search" method="GET">
            <input type="text" name="q" value="">
        </form>"#;
        let result = analyze_page(page);
        assert!(result.vulnerable);
        assert_eq!(result.vulnerability_type, "GET CSRF");
        assert_eq!(result.impact_level, 3);
    }

    #[test]
    fn token_on_action_url_counts_as_protection() {
        let page = r#"<form action="/update?csrf=abc123XYZ9" method="POST">
            <input type="text" name="bio" value="">
        </form>"#;
        assert!(!analyze_page(page).vulnerable);
    }

    #[test]
    fn cookie_with_either_flag_is_accepted() {
        let secure = vec![(
            "session_id".to_string(),
            "session_id=xyz; HttpOnly; Path=/".to_string(),
        )];
        assert!(!analyze_cookie_security(&secure).vulnerable);

        let lax = vec![(
            "auth".to_string(),
            "auth=xyz; SameSite=Lax".to_string(),
        )];
        assert!(!analyze_cookie_security(&lax).vulnerable);

        let bare = vec![("session".to_string(), "session=xyz; Path=/".to_string())];
        let result = analyze_cookie_security(&bare);
        assert!(result.vulnerable);
        assert_eq!(result.vulnerability_type, "Insecure Cookies (CSRF Risk)");
        assert_eq!(result.impact_level, 3);
    }

    #[test]
    fn token_strength_rules() {
        assert!(is_token_secure("a1b2c3d4e5f6g7h8i9j0"));
        assert!(!is_token_secure("short"));
        assert!(!is_token_secure("aaaaaaaaaaaaaaa")); // one character class
        assert!(!is_token_secure("A9fkq123mzpQ")); // predictable run
    }

    #[tokio::test]
    async fn detect_falls_through_to_cookie_analysis() {
        let transport = MockTransport::new(|_| {
            let mut resp = crate::http::testing::html_response(PROTECTED_FORM);
            resp.headers.insert(
                "set-cookie".to_string(),
                "session=abc123; Path=/".to_string(),
            );
            resp
        });
        let analyzer = CsrfAnalyzer::new(&transport);
        let url = Url::parse("http://target.example/profile").unwrap();
        let result = analyzer.detect(&url).await.unwrap();
        assert!(result.vulnerable);
        assert_eq!(result.vulnerability_type, "Insecure Cookies (CSRF Risk)");
    }
}
