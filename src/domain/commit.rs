use std::sync::OnceLock;

use regex::Regex;

/// Parsed representation of a conventional commit message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedCommit {
    pub r#type: String,
    pub scope: Option<String>,
    pub description: String,
    pub is_breaking_change: bool,
}

const DEFAULT_BREAKING_INDICATORS: [&str; 2] = ["BREAKING CHANGE:", "BREAKING-CHANGE:"];

fn header_regex() -> &'static Regex {
    static HEADER: OnceLock<Regex> = OnceLock::new();
    HEADER.get_or_init(|| {
        Regex::new(r"^(?P<type>[a-z]+)(?:\((?P<scope>[^)]+)\))?(?P<bang>!)?:\s*(?P<desc>.*)")
            .expect("conventional commit header regex is valid")
    })
}

impl ParsedCommit {
    /// Parse a commit message according to conventional commits spec
    /// Supports formats:
    /// - type(scope)!: description
    /// - type(scope): description
    /// - type!: description
    /// - type: description
    /// - non-conventional text
    pub fn parse(message: &str) -> Self {
        Self::parse_with(message, &DEFAULT_BREAKING_INDICATORS)
    }

    /// Parse with a custom list of breaking-change footers
    pub fn parse_with<S: AsRef<str>>(message: &str, breaking_indicators: &[S]) -> Self {
        let has_footer = breaking_indicators
            .iter()
            .any(|indicator| message.contains(indicator.as_ref()));
        let header = message.lines().next().unwrap_or_default();

        match header_regex().captures(header) {
            Some(captures) => ParsedCommit {
                r#type: captures["type"].to_string(),
                scope: captures.name("scope").map(|m| m.as_str().to_string()),
                description: captures["desc"].to_string(),
                is_breaking_change: captures.name("bang").is_some() || has_footer,
            },
            None => ParsedCommit {
                r#type: "chore".to_string(),
                scope: None,
                description: message.to_string(),
                is_breaking_change: has_footer,
            },
        }
    }
}
