use crate::config::ConventionalCommitsConfig;
use crate::domain::{ParsedCommit, VersionBump};

/// Recommends a version bump from conventional commit messages
pub struct VersionAnalyzer {
    config: ConventionalCommitsConfig,
}

impl VersionAnalyzer {
    pub fn new(config: ConventionalCommitsConfig) -> Self {
        VersionAnalyzer { config }
    }

    /// Breaking changes win, then feature types, then everything else is a patch
    pub fn analyze_messages(&self, messages: &[String]) -> VersionBump {
        let mut has_features = false;

        for message in messages {
            let parsed = ParsedCommit::parse_with(message, &self.config.breaking_change_indicators);

            if parsed.is_breaking_change {
                return VersionBump::Major;
            }

            if self.config.minor_types.iter().any(|t| *t == parsed.r#type) {
                has_features = true;
            }
        }

        if has_features {
            VersionBump::Minor
        } else {
            VersionBump::Patch
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::git::{MockRepository, Repository};

    fn analyzer() -> VersionAnalyzer {
        VersionAnalyzer::new(ConventionalCommitsConfig::default())
    }

    fn messages(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_analyze_major() {
        let messages = messages(&["feat: new feature", "fix(api)!: breaking change"]);
        assert_eq!(analyzer().analyze_messages(&messages), VersionBump::Major);
    }

    #[test]
    fn test_analyze_breaking_footer() {
        let messages = messages(&["refactor: drop v1 api\n\nBREAKING CHANGE: v1 is gone"]);
        assert_eq!(analyzer().analyze_messages(&messages), VersionBump::Major);
    }

    #[test]
    fn test_analyze_minor() {
        let messages = messages(&["feat: new feature", "fix: bug fix"]);
        assert_eq!(analyzer().analyze_messages(&messages), VersionBump::Minor);
    }

    #[test]
    fn test_analyze_patch() {
        let messages = messages(&["fix: bug fix", "refactor: code cleanup"]);
        assert_eq!(analyzer().analyze_messages(&messages), VersionBump::Patch);
    }

    #[test]
    fn test_analyze_non_conventional_is_patch() {
        let messages = messages(&["docs: update readme", "Merge branch 'main'"]);
        assert_eq!(analyzer().analyze_messages(&messages), VersionBump::Patch);
        assert_eq!(analyzer().analyze_messages(&[]), VersionBump::Patch);
    }

    #[test]
    fn test_custom_minor_types() {
        let config = ConventionalCommitsConfig {
            minor_types: vec!["docs".to_string()],
            ..ConventionalCommitsConfig::default()
        };
        let messages = messages(&["docs: new guide"]);
        assert_eq!(
            VersionAnalyzer::new(config).analyze_messages(&messages),
            VersionBump::Minor
        );
    }

    #[test]
    fn test_analyze_mock_history() {
        let mut repo = MockRepository::new().with_tag("1.0.0");
        repo.add_commit("a1", "fix: typo");
        repo.add_commit("b2", "feat(cli): add flag");
        let messages: Vec<String> = repo
            .commits_since(Some("1.0.0"))
            .unwrap()
            .into_iter()
            .map(|c| c.message)
            .collect();
        assert_eq!(analyzer().analyze_messages(&messages), VersionBump::Minor);
    }
}
