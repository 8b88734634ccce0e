//! Git operations abstraction layer
//!
//! Inspection goes through the [Repository] trait so it can be mocked:
//!
//! - [repository::Git2Repository]: A real implementation using the `git2` crate
//! - [mock::MockRepository]: A mock implementation for testing
//!
//! Anything that changes the repository (staging, commit, tag, push, clone)
//! runs the system `git` through [crate::shell::Shell] in [client::GitClient],
//! so that a dry run only echoes it.
//!
//! ```rust
//! # use git_release::git::Repository;
//! # fn example<R: Repository>(repo: &R) -> Result<(), Box<dyn std::error::Error>> {
//! let latest = repo.latest_tag()?;
//! let commits = repo.commits_since(latest.as_deref())?;
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod mock;
pub mod repository;

pub use client::GitClient;
pub use mock::MockRepository;
pub use repository::Git2Repository;

use std::path::Path;

use crate::error::Result;

/// Commit information for analysis
#[derive(Debug, Clone, PartialEq)]
pub struct CommitInfo {
    /// The commit hash
    pub hash: String,
    /// The commit message
    pub message: String,
}

/// Read-only view of a repository
///
/// ## Error Handling
///
/// All methods return [crate::error::Result<T>]. Implementations map
/// `git2::Error` into [crate::error::GitReleaseError::Git].
pub trait Repository {
    /// Most recent tag reachable from HEAD
    ///
    /// # Returns
    /// * `Ok(Some(String))` - Tag name
    /// * `Ok(None)` - If no tag is reachable (or HEAD is unborn)
    fn latest_tag(&self) -> Result<Option<String>>;

    /// Whether `cwd` is the top level of the working tree
    fn is_root_dir(&self, cwd: &Path) -> bool;

    /// Url configured for the named remote
    ///
    /// # Returns
    /// * `Ok(None)` - If the remote does not exist or has no url
    fn remote_url(&self, remote: &str) -> Result<Option<String>>;

    /// No changes to tracked files, staged or not
    fn is_working_dir_clean(&self) -> Result<bool>;

    /// The checked-out branch has an upstream
    fn has_upstream(&self) -> Result<bool>;

    /// Commits reachable from HEAD but not from `tag`, newest first
    fn commits_since(&self, tag: Option<&str>) -> Result<Vec<CommitInfo>>;
}
