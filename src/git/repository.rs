use std::fs;
use std::path::Path;

use git2::{
    BranchType, DescribeFormatOptions, DescribeOptions, ErrorCode, Repository as Git2Repo,
    StatusOptions,
};

use crate::error::{GitReleaseError, Result};
use crate::git::CommitInfo;

/// Wrapper around git2::Repository with our trait interface
pub struct Git2Repository {
    repo: Git2Repo,
}

impl Git2Repository {
    /// Open or discover a git repository
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let repo = Git2Repo::discover(path)
            .map_err(|_| GitReleaseError::RepoNotFound(path.display().to_string()))?;

        Ok(Git2Repository { repo })
    }

    /// Create from existing git2::Repository
    pub fn from_git2(repo: Git2Repo) -> Self {
        Git2Repository { repo }
    }
}

impl super::Repository for Git2Repository {
    fn latest_tag(&self) -> Result<Option<String>> {
        let mut options = DescribeOptions::new();
        options.describe_tags();

        let describe = match self.repo.describe(&options) {
            Ok(describe) => describe,
            Err(e) if matches!(e.code(), ErrorCode::NotFound | ErrorCode::UnbornBranch) => {
                return Ok(None)
            }
            Err(e) => {
                tracing::debug!(error = %e, "describe failed");
                return Ok(None);
            }
        };

        let mut format = DescribeFormatOptions::new();
        format.abbreviated_size(0);
        let tag = describe.format(Some(&format))?;
        Ok(Some(tag))
    }

    fn is_root_dir(&self, cwd: &Path) -> bool {
        let Some(workdir) = self.repo.workdir() else {
            return false;
        };

        match (fs::canonicalize(workdir), fs::canonicalize(cwd)) {
            (Ok(root), Ok(cwd)) => root == cwd,
            _ => false,
        }
    }

    fn remote_url(&self, remote: &str) -> Result<Option<String>> {
        match self.repo.find_remote(remote) {
            Ok(remote) => Ok(remote.url().map(str::to_string)),
            Err(e) if e.code() == ErrorCode::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn is_working_dir_clean(&self) -> Result<bool> {
        let mut options = StatusOptions::new();
        options.include_untracked(false).include_ignored(false);

        let statuses = self.repo.statuses(Some(&mut options))?;
        Ok(statuses.iter().all(|entry| entry.status().is_empty()))
    }

    fn has_upstream(&self) -> Result<bool> {
        let head = match self.repo.head() {
            Ok(head) => head,
            Err(_) => return Ok(false),
        };

        if !head.is_branch() {
            return Ok(false);
        }

        let Some(name) = head.shorthand() else {
            return Ok(false);
        };

        let branch = self.repo.find_branch(name, BranchType::Local)?;
        Ok(branch.upstream().is_ok())
    }

    fn commits_since(&self, tag: Option<&str>) -> Result<Vec<CommitInfo>> {
        let mut revwalk = self.repo.revwalk()?;

        if let Err(e) = revwalk.push_head() {
            tracing::debug!(error = %e, "no HEAD to walk");
            return Ok(Vec::new());
        }

        if let Some(tag) = tag {
            let reference = format!("refs/tags/{}", tag);
            match self.repo.revparse_single(&format!("{}^{{commit}}", reference)) {
                Ok(object) => revwalk.hide(object.id())?,
                Err(e) => tracing::debug!(tag, error = %e, "tag not found, walking all commits"),
            }
        }

        let mut commits = Vec::new();
        for oid in revwalk {
            let oid = oid?;
            let commit = self.repo.find_commit(oid)?;
            commits.push(CommitInfo {
                hash: oid.to_string(),
                message: commit.message().unwrap_or("(empty message)").to_string(),
            });
        }

        Ok(commits)
    }
}
