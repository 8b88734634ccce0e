use std::path::Path;
use std::sync::Arc;

use serde_json::Value;

use crate::config::GitOptions;
use crate::context::RuntimeContext;
use crate::error::{GitReleaseError, Result};
use crate::git::{Git2Repository, Repository};
use crate::shell::{Access, Shell};
use crate::warning::ReleaseWarning;

/// Which repository a [`GitClient`] drives
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RepoKind {
    Source,
    /// The staged clone of the distribution repository
    Dist,
}

/// Git operations of a release run for one repository
pub struct GitClient {
    options: GitOptions,
    shell: Shell,
    kind: RepoKind,
    repo: Option<Box<dyn Repository>>,
    latest_tag: Option<String>,
    is_root_dir: bool,
    remote_url: Option<String>,
}

fn split_args(args: &str) -> Vec<String> {
    args.split_whitespace().map(str::to_string).collect()
}

/// `git commit` refusing because the index has no changes, whatever else the tree holds
fn is_nothing_to_commit(output: &str) -> bool {
    [
        "nothing to commit",
        "nothing added to commit",
        "no changes added to commit",
    ]
    .iter()
    .any(|message| output.contains(message))
}

fn looks_like_url(remote: &str) -> bool {
    remote.contains("://") || remote.contains('@') || remote.starts_with('/') || remote.starts_with('.')
}

impl GitClient {
    pub fn new(options: GitOptions, shell: Shell) -> Self {
        GitClient {
            options,
            shell,
            kind: RepoKind::Source,
            repo: None,
            latest_tag: None,
            is_root_dir: false,
            remote_url: None,
        }
    }

    pub fn for_dist(options: GitOptions, shell: Shell) -> Self {
        GitClient {
            kind: RepoKind::Dist,
            ..GitClient::new(options, shell)
        }
    }

    /// Use `repo` for inspection instead of opening the working directory
    pub fn with_repository(mut self, repo: Box<dyn Repository>) -> Self {
        self.repo = Some(repo);
        self
    }

    /// Open the repository and read the latest tag, root check and remote url
    pub fn init(&mut self) -> Result<()> {
        if self.repo.is_none() {
            match Git2Repository::open(self.shell.cwd()) {
                Ok(repo) => self.repo = Some(Box::new(repo)),
                // A dry run never clones the distribution repository
                Err(e) if self.kind == RepoKind::Dist && self.shell.is_dry_run() => {
                    tracing::debug!(error = %e, "no distribution clone in dry run");
                    return Ok(());
                }
                Err(e) => return Err(e),
            }
        }

        let Some(repo) = self.repo.as_deref() else {
            return Ok(());
        };

        self.latest_tag = repo.latest_tag()?;
        self.is_root_dir = repo.is_root_dir(self.shell.cwd());
        self.remote_url = if looks_like_url(&self.options.push_repo) {
            Some(self.options.push_repo.clone())
        } else {
            match repo.remote_url(&self.options.push_repo)? {
                Some(url) => Some(url),
                None => repo.remote_url("origin")?,
            }
        };

        tracing::debug!(
            latest_tag = ?self.latest_tag,
            is_root_dir = self.is_root_dir,
            remote_url = ?self.remote_url,
            "git client initialized"
        );
        Ok(())
    }

    /// Check the repository state required before anything changes.
    ///
    /// The distribution clone is fresh, so only the source repository is checked.
    pub fn validate(&self) -> Result<()> {
        if self.kind == RepoKind::Dist {
            return Ok(());
        }

        let repo = self
            .repo
            .as_deref()
            .ok_or_else(|| GitReleaseError::RepoNotFound(self.shell.cwd().display().to_string()))?;

        if self.remote_url.is_none() {
            return Err(GitReleaseError::RemoteUrlMissing);
        }

        if self.options.require_clean_working_dir && !repo.is_working_dir_clean()? {
            return Err(GitReleaseError::CleanWorkingDir);
        }

        if self.options.require_upstream && !repo.has_upstream()? {
            return Err(GitReleaseError::NoUpstream);
        }

        Ok(())
    }

    pub fn options(&self) -> &GitOptions {
        &self.options
    }

    pub fn shell(&self) -> &Shell {
        &self.shell
    }

    pub fn latest_tag(&self) -> Option<&str> {
        self.latest_tag.as_deref()
    }

    pub fn is_root_dir(&self) -> bool {
        self.is_root_dir
    }

    pub fn remote_url(&self) -> Option<&str> {
        self.remote_url.as_deref()
    }

    /// Public options for hook templates
    pub fn snapshot(&self) -> Result<Value> {
        Ok(serde_json::to_value(&self.options)?)
    }

    /// Messages of the commits since the latest tag, newest first
    pub fn commit_messages_since_latest_tag(&self) -> Result<Vec<String>> {
        let Some(repo) = self.repo.as_deref() else {
            return Ok(Vec::new());
        };
        Ok(repo
            .commits_since(self.latest_tag.as_deref())?
            .into_iter()
            .map(|c| c.message)
            .collect())
    }

    /// Don't tag the distribution repository twice when it is the source repository
    pub fn handle_tag_options(&mut self, source: &GitClient) {
        let is_same_repo = self.remote_url.is_some() && self.remote_url == source.remote_url;
        let is_same_tag_name = self.options.tag_name == source.options.tag_name;
        if self.options.tag && is_same_repo && is_same_tag_name {
            tracing::debug!("distribution repository is the source repository, skipping tag");
            self.options.tag = false;
        }
    }

    /// Add each file to the index; failures are warnings
    pub fn stage(&self, files: &[String]) -> Vec<ReleaseWarning> {
        let mut warnings = Vec::new();
        for file in files.iter().filter(|f| !f.trim().is_empty()) {
            if let Err(e) = self.shell.exec("git", &["add", file.as_str()], Access::Write) {
                tracing::debug!(file = %file, error = %e, "stage failed");
                let warning = ReleaseWarning::StageFailed { file: file.clone() };
                self.shell.logger().warning(&warning);
                warnings.push(warning);
            }
        }
        warnings
    }

    /// Stage every change in the working tree.
    ///
    /// Untracked files are included for the distribution clone or when
    /// `add_untracked_files` is set.
    pub fn stage_dir(&self) -> Result<()> {
        let mode = if self.kind == RepoKind::Dist || self.options.add_untracked_files {
            "--all"
        } else {
            "--update"
        };
        self.shell.exec("git", &["add", ".", mode], Access::Write)?;
        Ok(())
    }

    /// Short status of tracked files, used for the changeset preview
    pub fn status(&self) -> Result<String> {
        if self.repo.is_none() {
            return Ok(String::new());
        }
        self.shell.exec(
            "git",
            &["status", "--short", "--untracked-files=no"],
            Access::ReadOnly,
        )
    }

    /// Commit the staged changes; having nothing to commit is a warning
    pub fn commit(&self, ctx: &RuntimeContext) -> Result<()> {
        let message = ctx.render(&self.options.commit_message);
        let mut args = vec!["commit".to_string(), "--message".to_string(), message];
        args.extend(split_args(&self.options.commit_args));

        match self.shell.exec("git", &args, Access::Write) {
            Ok(_) => Ok(()),
            Err(GitReleaseError::Command { output, .. }) if is_nothing_to_commit(&output) => {
                self.shell.logger().warning(&ReleaseWarning::NothingToCommit);
                Ok(())
            }
            Err(e) => Err(e),
        }
    }

    /// Create the annotated release tag and return its name
    pub fn tag(&self, ctx: &RuntimeContext) -> Result<String> {
        let name = ctx.render(&self.options.tag_name);
        let annotation = ctx.render(&self.options.tag_annotation);

        let mut args = vec![
            "tag".to_string(),
            "--annotate".to_string(),
            "--message".to_string(),
            annotation,
        ];
        args.extend(split_args(&self.options.tag_args));
        args.push(name.clone());

        self.shell.exec("git", &args, Access::Write)?;
        Ok(name)
    }

    pub fn push(&self) -> Result<()> {
        let mut args = vec!["push".to_string()];
        args.extend(split_args(&self.options.push_args));
        if !self.options.push_repo.is_empty() {
            args.push(self.options.push_repo.clone());
        }
        self.shell.exec("git", &args, Access::Write)?;
        Ok(())
    }

    /// Restore `files` to their committed content
    pub fn reset(&self, files: &[String]) -> Result<()> {
        reset_files(&self.shell, files)
    }

    /// A detached reset of `files`, for running from the interrupt listener
    pub fn reset_action(&self, files: &[String]) -> Arc<dyn Fn() + Send + Sync> {
        let shell = self.shell.clone();
        let files = files.to_vec();
        Arc::new(move || {
            if let Err(e) = reset_files(&shell, &files) {
                tracing::debug!(error = %e, "reset after interrupt failed");
            }
        })
    }

    /// Clone `repo` (`url` or `url#branch`) into `target`, shallow and single-branch
    pub fn clone_repo(&self, repo: &str, target: &Path) -> Result<()> {
        let (url, branch) = match repo.split_once('#') {
            Some((url, branch)) if !branch.is_empty() => (url, Some(branch)),
            _ => (repo.trim_end_matches('#'), None),
        };

        let mut args = vec![
            "clone".to_string(),
            url.to_string(),
            "--depth=1".to_string(),
            "--single-branch".to_string(),
        ];
        if let Some(branch) = branch {
            args.push("--branch".to_string());
            args.push(branch.to_string());
        }
        args.push(target.display().to_string());

        self.shell.exec("git", &args, Access::Write)?;
        Ok(())
    }
}

fn reset_files(shell: &Shell, files: &[String]) -> Result<()> {
    let files: Vec<&str> = files
        .iter()
        .map(String::as_str)
        .filter(|f| !f.trim().is_empty())
        .collect();
    if files.is_empty() {
        return Ok(());
    }

    let mut args = vec!["checkout", "HEAD", "--"];
    args.extend(files);
    shell.exec("git", &args, Access::Write)?;
    Ok(())
}
