use anyhow::{anyhow, bail, Context, Result};
use reqwest::Method;
use url::Url;

use crate::http::request::HttpRequest;

/// The three editable regions of a request template, in wire order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Section {
    Url,
    Headers,
    Body,
}

/// What a point substitutes into; determines which [`Section`] its byte
/// range is measured against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointKind {
    UrlPath,
    UrlParameter,
    BodyParameter,
    Cookie,
    Header,
    /// Offsets measured against the URL, headers, and body concatenated
    /// in that order.
    Custom,
}

impl PointKind {
    /// The section a non-custom point addresses.
    pub fn section(&self) -> Option<Section> {
        match self {
            PointKind::UrlPath | PointKind::UrlParameter => Some(Section::Url),
            PointKind::Cookie | PointKind::Header => Some(Section::Headers),
            PointKind::BodyParameter => Some(Section::Body),
            PointKind::Custom => None,
        }
    }
}

/// A half-open byte range `[start, end)` payloads are spliced into.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InsertionPoint {
    pub kind: PointKind,
    pub name: String,
    pub start: usize,
    pub end: usize,
}

impl InsertionPoint {
    pub fn new(kind: PointKind, name: impl Into<String>, start: usize, end: usize) -> Self {
        Self {
            kind,
            name: name.into(),
            start,
            end,
        }
    }
}

/// A base request held as raw text so byte-range substitution stays exact.
///
/// Headers are kept as `Name: value` lines separated by `\n`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestTemplate {
    pub method: String,
    pub url: String,
    pub headers: String,
    pub body: String,
}

/// Marker character delimiting insertion regions in a marked-up template.
const MARKER: char = '\u{00a7}'; // §

impl RequestTemplate {
    pub fn new(
        method: impl Into<String>,
        url: impl Into<String>,
        headers: impl Into<String>,
        body: impl Into<String>,
    ) -> Self {
        Self {
            method: method.into(),
            url: url.into(),
            headers: headers.into(),
            body: body.into(),
        }
    }

    pub fn section(&self, section: Section) -> &str {
        match section {
            Section::Url => &self.url,
            Section::Headers => &self.headers,
            Section::Body => &self.body,
        }
    }

    fn section_mut(&mut self, section: Section) -> &mut String {
        match section {
            Section::Url => &mut self.url,
            Section::Headers => &mut self.headers,
            Section::Body => &mut self.body,
        }
    }

    /// Parse `§`-delimited markers out of each section, returning the
    /// cleaned template plus one insertion point per marked region. The
    /// original bytes between each marker pair stay in place.
    pub fn from_marked(
        method: impl Into<String>,
        url: &str,
        headers: &str,
        body: &str,
    ) -> Result<(Self, Vec<InsertionPoint>)> {
        let mut points = Vec::new();
        let mut counter = 0usize;

        let (url, url_points) = strip_markers(url, &mut counter)?;
        let (headers, header_points) = strip_markers(headers, &mut counter)?;
        let (body, body_points) = strip_markers(body, &mut counter)?;

        for (name, start, end) in url_points {
            points.push(InsertionPoint::new(PointKind::UrlParameter, name, start, end));
        }
        for (name, start, end) in header_points {
            points.push(InsertionPoint::new(PointKind::Header, name, start, end));
        }
        for (name, start, end) in body_points {
            points.push(InsertionPoint::new(PointKind::BodyParameter, name, start, end));
        }

        Ok((Self::new(method, url, headers, body), points))
    }

    /// Resolve a point to its section and section-relative range.
    ///
    /// Custom points are measured against the URL, headers, and body
    /// concatenated; a range straddling a section boundary is rejected.
    pub fn resolve(&self, point: &InsertionPoint) -> Result<(Section, usize, usize)> {
        if point.start > point.end {
            bail!(
                "insertion point '{}' has inverted range {}..{}",
                point.name,
                point.start,
                point.end
            );
        }
        let (section, start, end) = match point.kind.section() {
            Some(section) => (section, point.start, point.end),
            None => {
                let url_len = self.url.len();
                let headers_len = self.headers.len();
                let (section, offset) = if point.end <= url_len {
                    (Section::Url, 0)
                } else if point.start >= url_len && point.end <= url_len + headers_len {
                    (Section::Headers, url_len)
                } else if point.start >= url_len + headers_len {
                    (Section::Body, url_len + headers_len)
                } else {
                    bail!(
                        "custom point '{}' range {}..{} straddles a section boundary",
                        point.name,
                        point.start,
                        point.end
                    );
                };
                (section, point.start - offset, point.end - offset)
            }
        };

        let text = self.section(section);
        if end > text.len() {
            bail!(
                "insertion point '{}' range {}..{} exceeds section length {}",
                point.name,
                start,
                end,
                text.len()
            );
        }
        if !text.is_char_boundary(start) || !text.is_char_boundary(end) {
            bail!(
                "insertion point '{}' range {}..{} splits a UTF-8 sequence",
                point.name,
                start,
                end
            );
        }
        Ok((section, start, end))
    }

    /// Splice `payload` into the point's byte range, leaving every byte
    /// outside the range untouched.
    pub fn apply(&self, point: &InsertionPoint, payload: &str) -> Result<RequestTemplate> {
        let (section, start, end) = self.resolve(point)?;
        let mut out = self.clone();
        out.section_mut(section).replace_range(start..end, payload);
        Ok(out)
    }

    /// Splice several payloads at once. Assignments are applied back to
    /// front within each section so earlier offsets stay valid.
    pub fn apply_all(&self, assignments: &[(&InsertionPoint, &str)]) -> Result<RequestTemplate> {
        let mut resolved = Vec::with_capacity(assignments.len());
        for (point, payload) in assignments {
            let (section, start, end) = self.resolve(point)?;
            resolved.push((section, start, end, *payload));
        }
        resolved.sort_by(|a, b| (b.0, b.1).cmp(&(a.0, a.1)));
        let mut out = self.clone();
        for (section, start, end, payload) in resolved {
            out.section_mut(section).replace_range(start..end, payload);
        }
        Ok(out)
    }

    /// Materialize the template into a sendable request.
    pub fn to_request(&self) -> Result<HttpRequest> {
        let url = Url::parse(&self.url)
            .with_context(|| format!("template URL is not absolute: {}", self.url))?;
        let method = Method::from_bytes(self.method.as_bytes())
            .map_err(|_| anyhow!("invalid request method: {}", self.method))?;
        let mut req = HttpRequest::new(method, url);
        for line in self.headers.lines() {
            if let Some((name, value)) = line.split_once(':') {
                req.set_header(name.trim(), value.trim());
            }
        }
        if !self.body.is_empty() {
            req.set_body(self.body.clone());
        }
        Ok(req)
    }
}

/// Remove `§value§` pairs from `text`, recording the byte range each pair
/// wrapped in the cleaned string. An unbalanced marker count is an error.
fn strip_markers(text: &str, counter: &mut usize) -> Result<(String, Vec<(String, usize, usize)>)> {
    let marker_count = text.chars().filter(|c| *c == MARKER).count();
    if marker_count % 2 != 0 {
        bail!("unbalanced \u{00a7} markers in template section");
    }

    let mut clean = String::with_capacity(text.len());
    let mut points = Vec::new();
    let mut open: Option<usize> = None;
    for ch in text.chars() {
        if ch == MARKER {
            match open.take() {
                Some(start) => {
                    *counter += 1;
                    points.push((format!("ip{}", *counter), start, clean.len()));
                }
                None => open = Some(clean.len()),
            }
        } else {
            clean.push(ch);
        }
    }
    Ok((clean, points))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> RequestTemplate {
        RequestTemplate::new(
            "POST",
            "http://example.com/login?next=home",
            "Cookie: session=abc123\nX-Api-Key: secret",
            "user=admin&pass=letmein",
        )
    }

    #[test]
    fn apply_replaces_only_the_target_range() {
        let tpl = base();
        // "letmein" occupies bytes 16..23 of the body
        let point = InsertionPoint::new(PointKind::BodyParameter, "pass", 16, 23);
        let out = tpl.apply(&point, "' OR '1'='1").unwrap();
        assert_eq!(out.body, "user=admin&pass=' OR '1'='1");
        assert_eq!(out.url, tpl.url);
        assert_eq!(out.headers, tpl.headers);
    }

    #[test]
    fn apply_all_applies_back_to_front() {
        let tpl = base();
        let user = InsertionPoint::new(PointKind::BodyParameter, "user", 5, 10);
        let pass = InsertionPoint::new(PointKind::BodyParameter, "pass", 16, 23);
        let out = tpl.apply_all(&[(&user, "root"), (&pass, "toor")]).unwrap();
        assert_eq!(out.body, "user=root&pass=toor");
    }

    #[test]
    fn custom_point_resolves_against_concatenation() {
        let tpl = base();
        let url_len = tpl.url.len();
        // headers start right after the URL in the concatenated view
        let point = InsertionPoint::new(
            PointKind::Custom,
            "session",
            url_len + 16,
            url_len + 22,
        );
        let out = tpl.apply(&point, "FUZZED").unwrap();
        assert_eq!(out.headers, "Cookie: session=FUZZED\nX-Api-Key: secret");
    }

    #[test]
    fn custom_point_straddling_sections_is_rejected() {
        let tpl = base();
        let url_len = tpl.url.len();
        let point = InsertionPoint::new(PointKind::Custom, "bad", url_len - 2, url_len + 2);
        assert!(tpl.apply(&point, "x").is_err());
    }

    #[test]
    fn out_of_bounds_range_is_rejected() {
        let tpl = base();
        let point = InsertionPoint::new(PointKind::BodyParameter, "oob", 0, 999);
        assert!(tpl.apply(&point, "x").is_err());
    }

    #[test]
    fn from_marked_strips_markers_and_records_ranges() {
        let (tpl, points) = RequestTemplate::from_marked(
            "POST",
            "http://example.com/login",
            "Cookie: session=\u{00a7}abc\u{00a7}",
            "user=\u{00a7}admin\u{00a7}&pass=\u{00a7}x\u{00a7}",
        )
        .unwrap();
        assert_eq!(tpl.headers, "Cookie: session=abc");
        assert_eq!(tpl.body, "user=admin&pass=x");
        assert_eq!(points.len(), 3);
        assert_eq!(points[0].kind, PointKind::Header);
        assert_eq!((points[1].start, points[1].end), (5, 10));
        let out = tpl.apply(&points[2], "payload").unwrap();
        assert_eq!(out.body, "user=admin&pass=payload");
    }

    #[test]
    fn to_request_parses_method_url_and_headers() {
        let req = base().to_request().unwrap();
        assert_eq!(req.method, Method::POST);
        assert_eq!(req.url.path(), "/login");
        assert!(req.headers.contains_key("x-api-key"));
        assert_eq!(req.body.as_deref(), Some(b"user=admin&pass=letmein".as_ref()));
    }
}
