use url::Url;

#[derive(Debug, Clone)]
pub struct Scope {
    allowed_hosts: Vec<String>,
}

impl Scope {
    pub fn new(target: &str) -> anyhow::Result<Self> {
        let url = Url::parse(target)?;
        let host = url
            .host_str()
            .ok_or_else(|| anyhow::anyhow!("Invalid target host"))?;

        Ok(Self {
            allowed_hosts: vec![host.to_string()],
        })
    }

    /// Add another allowed host (exfiltration listener, second-stage target)
    pub fn allow(&mut self, host: &str) {
        if !self.allowed_hosts.iter().any(|h| h == host) {
            self.allowed_hosts.push(host.to_string());
        }
    }

    pub fn is_in_scope(&self, url: &Url) -> bool {
        if let Some(host) = url.host_str() {
            self.allowed_hosts.iter().any(|h| h == host)
        } else {
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scope_rejects_other_hosts() {
        let mut scope = Scope::new("http://target.example/app").unwrap();
        assert!(scope.is_in_scope(&Url::parse("http://target.example/other").unwrap()));
        assert!(!scope.is_in_scope(&Url::parse("http://evil.example/").unwrap()));

        scope.allow("oob.example");
        assert!(scope.is_in_scope(&Url::parse("http://oob.example/dtd").unwrap()));
    }
}
