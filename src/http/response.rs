use std::collections::HashMap;

#[derive(Debug, Clone, Default)]
pub struct HttpResponse {
    pub status: u16,
    pub headers: HashMap<String, String>,
    pub body_len: usize,
    pub body_hash: String,
    pub body: Vec<u8>,
    pub elapsed_ms: u128,
}

impl HttpResponse {
    /// Get body as UTF-8 string (lossy conversion)
    pub fn body_text(&self) -> String {
        String::from_utf8_lossy(&self.body).to_string()
    }

    /// Hash-based body equality. Differential checks use this as a fast path
    /// before falling back to marker and length comparison.
    pub fn same_body(&self, other: &HttpResponse) -> bool {
        if !self.body_hash.is_empty() && !other.body_hash.is_empty() {
            return self.body_hash == other.body_hash;
        }
        self.body == other.body
    }

    /// Set-Cookie headers parsed into (name, full attribute string) pairs.
    /// Repeated Set-Cookie values arrive newline-joined from the transport.
    pub fn cookies(&self) -> Vec<(String, String)> {
        self.headers
            .iter()
            .filter(|(k, _)| k.eq_ignore_ascii_case("set-cookie"))
            .flat_map(|(_, v)| v.split('\n'))
            .filter_map(|line| {
                let name = line.split('=').next()?.trim();
                if name.is_empty() {
                    None
                } else {
                    Some((name.to_string(), line.to_string()))
                }
            })
            .collect()
    }
}
