use std::collections::HashMap;
use std::path::Path;

use crate::error::Result;
use crate::git::{CommitInfo, Repository};

/// Mock repository for testing without actual git operations
#[derive(Debug, Clone)]
pub struct MockRepository {
    pub latest_tag: Option<String>,
    pub is_root_dir: bool,
    pub remotes: HashMap<String, String>,
    pub is_clean: bool,
    pub has_upstream: bool,
    /// Newest first
    pub commits: Vec<CommitInfo>,
}

impl MockRepository {
    /// A clean repository at the root with an `origin` remote and upstream
    pub fn new() -> Self {
        MockRepository {
            latest_tag: None,
            is_root_dir: true,
            remotes: HashMap::from([(
                "origin".to_string(),
                "https://github.com/owner/repo.git".to_string(),
            )]),
            is_clean: true,
            has_upstream: true,
            commits: Vec::new(),
        }
    }

    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.latest_tag = Some(tag.into());
        self
    }

    /// Add a commit on top of the history
    pub fn add_commit(&mut self, hash: impl Into<String>, message: impl Into<String>) {
        self.commits.insert(
            0,
            CommitInfo {
                hash: hash.into(),
                message: message.into(),
            },
        );
    }
}

impl Default for MockRepository {
    fn default() -> Self {
        Self::new()
    }
}

impl Repository for MockRepository {
    fn latest_tag(&self) -> Result<Option<String>> {
        Ok(self.latest_tag.clone())
    }

    fn is_root_dir(&self, _cwd: &Path) -> bool {
        self.is_root_dir
    }

    fn remote_url(&self, remote: &str) -> Result<Option<String>> {
        Ok(self.remotes.get(remote).cloned())
    }

    fn is_working_dir_clean(&self) -> Result<bool> {
        Ok(self.is_clean)
    }

    fn has_upstream(&self) -> Result<bool> {
        Ok(self.has_upstream)
    }

    // Simplified: every recorded commit is newer than the tag
    fn commits_since(&self, _tag: Option<&str>) -> Result<Vec<CommitInfo>> {
        Ok(self.commits.clone())
    }
}
