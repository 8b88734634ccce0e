use regex::Regex;
use semver::Version;

use super::version::parse_version;

/// Tag naming template (e.g. `${version}`, `v${version}`, `${name}@${version}`)
#[derive(Debug, Clone)]
pub struct TagPattern {
    pub pattern: String,
}

const VERSION_PLACEHOLDER: &str = "${version}";

impl TagPattern {
    pub fn new(pattern: impl Into<String>) -> Self {
        TagPattern {
            pattern: pattern.into(),
        }
    }

    /// Format a version according to pattern
    /// Example: pattern="v${version}", version="1.2.3" -> "v1.2.3"
    pub fn format(&self, version: &str) -> String {
        self.pattern.replace(VERSION_PLACEHOLDER, version)
    }

    /// Recover the version embedded in a tag created with this pattern.
    ///
    /// Placeholders other than `${version}` match any text. A pattern without a
    /// version placeholder falls back to reading the whole tag as a version.
    pub fn extract_version(&self, tag: &str) -> Option<Version> {
        if !self.pattern.contains(VERSION_PLACEHOLDER) {
            return parse_version(tag);
        }

        let placeholder = Regex::new(r"\$\{[^}]*\}").ok()?;
        let mut regex_pattern = String::from("^");
        let mut last = 0;
        for found in placeholder.find_iter(&self.pattern) {
            regex_pattern.push_str(&regex::escape(&self.pattern[last..found.start()]));
            if found.as_str() == VERSION_PLACEHOLDER {
                regex_pattern.push_str(r"[vV]?(?P<version>\d+\.\d+\.\d+\S*)");
            } else {
                regex_pattern.push_str(".+?");
            }
            last = found.end();
        }
        regex_pattern.push_str(&regex::escape(&self.pattern[last..]));
        regex_pattern.push('$');

        let re = Regex::new(&regex_pattern).ok()?;
        let captures = re.captures(tag)?;
        parse_version(captures.name("version")?.as_str())
    }
}

impl Default for TagPattern {
    fn default() -> Self {
        TagPattern::new(VERSION_PLACEHOLDER)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pattern_format() {
        let pattern = TagPattern::new("v${version}");
        assert_eq!(pattern.format("1.2.3"), "v1.2.3");
    }

    #[test]
    fn test_pattern_format_with_suffix() {
        let pattern = TagPattern::new("release-${version}");
        assert_eq!(pattern.format("1.2.3"), "release-1.2.3");
    }

    #[test]
    fn test_extract_default_pattern() {
        let pattern = TagPattern::default();
        assert_eq!(
            pattern.extract_version("1.2.3"),
            Some(Version::parse("1.2.3").unwrap())
        );
        assert_eq!(
            pattern.extract_version("v1.2.3"),
            Some(Version::parse("1.2.3").unwrap())
        );
    }

    #[test]
    fn test_extract_with_prefix_and_other_placeholder() {
        let pattern = TagPattern::new("${name}@${version}");
        assert_eq!(
            pattern.extract_version("my-package@2.0.0-beta.1"),
            Some(Version::parse("2.0.0-beta.1").unwrap())
        );
    }

    #[test]
    fn test_extract_mismatch() {
        let pattern = TagPattern::new("release-${version}");
        assert_eq!(pattern.extract_version("v1.2.3"), None);
        assert_eq!(pattern.extract_version("release-latest"), None);
    }
}
