//! Static attack-string catalogs, grouped by vulnerability class and tier.
//!
//! Every function here is pure: no I/O, deterministic ordered output.
//! Templates carry `[TARGET_URL]` / `[PARAM_NAME]` / `[PARAM_VALUE]`
//! placeholders resolved with [`render_template`].

pub mod csrf;
pub mod sqli;
pub mod xss;
pub mod xxe;

pub const TARGET_URL: &str = "[TARGET_URL]";
pub const PARAM_NAME: &str = "[PARAM_NAME]";
pub const PARAM_VALUE: &str = "[PARAM_VALUE]";

/// Escalating payload aggressiveness. Analyzers always walk tiers in
/// ascending order and stop at the first positive classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tier {
    Basic,
    Advanced,
    Evasion,
}

impl Tier {
    pub fn name(&self) -> &'static str {
        match self {
            Tier::Basic => "basic",
            Tier::Advanced => "advanced",
            Tier::Evasion => "evasion",
        }
    }
}

/// Replace every occurrence of each placeholder. Unresolved placeholders are
/// left intact; rendering never fails.
pub fn render_template(template: &str, values: &[(&str, &str)]) -> String {
    let mut out = template.to_string();
    for (placeholder, value) in values {
        out = out.replace(placeholder, value);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn render_replaces_every_occurrence() {
        let rendered = render_template(
            "<img src=\"[TARGET_URL]?[PARAM_NAME]=[PARAM_VALUE]&echo=[PARAM_NAME]\">",
            &[
                (TARGET_URL, "http://victim.example/transfer"),
                (PARAM_NAME, "amount"),
                (PARAM_VALUE, "1000"),
            ],
        );
        assert_eq!(
            rendered,
            "<img src=\"http://victim.example/transfer?amount=1000&echo=amount\">"
        );
    }

    #[test]
    fn render_leaves_unresolved_placeholders_intact() {
        let rendered = render_template(
            "fetch('[TARGET_URL]', {body: '[PARAM_NAME]=[PARAM_VALUE]'})",
            &[(TARGET_URL, "http://victim.example/api")],
        );
        assert!(rendered.contains("[PARAM_NAME]=[PARAM_VALUE]"));
        assert!(rendered.starts_with("fetch('http://victim.example/api'"));
    }

    #[test]
    fn tier_accessors_walk_the_escalation_order() {
        assert_eq!(sqli::tier(Tier::Basic), sqli::basic());
        assert_eq!(sqli::tier(Tier::Evasion), sqli::waf_bypass());
        assert_eq!(xss::tier(Tier::Advanced), xss::advanced());
        assert_eq!(xss::tier(Tier::Evasion), xss::polyglot());
        assert_eq!(Tier::Evasion.name(), "evasion");
    }

    #[test]
    fn catalogs_are_pure() {
        assert_eq!(xss::basic(), xss::basic());
        assert_eq!(
            sqli::database_specific(sqli::DatabaseType::MySql),
            sqli::database_specific(sqli::DatabaseType::MySql)
        );
        assert_eq!(xxe::advanced(), xxe::advanced());
        assert_eq!(csrf::html_templates(), csrf::html_templates());
    }
}
