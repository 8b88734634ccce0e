//! Hosted git releases (GitHub, GitLab)
//!
//! Both clients share the [HostedRelease] contract so the release phase can
//! drive them the same way for the source and the distribution repository.

pub mod github;
pub mod gitlab;

pub use github::GitHubClient;
pub use gitlab::GitLabClient;

use std::time::Duration;

use serde_json::Value;

use crate::context::RuntimeContext;
use crate::error::{GitReleaseError, Result};
use crate::shell::{Access, Shell};

/// What a hosted release is created from
#[derive(Debug, Clone)]
pub struct ReleaseArgs<'a> {
    pub version: &'a str,
    /// The rendered tag name the release points at
    pub tag_name: &'a str,
    pub is_pre_release: bool,
    pub changelog: &'a str,
}

/// A hosted-git release service
pub trait HostedRelease {
    /// Display name, e.g. "GitHub"
    fn service(&self) -> &'static str;

    fn is_enabled(&self) -> bool;

    /// Fails with `TokenMissing` when releases are enabled without a token
    fn validate(&self) -> Result<()>;

    fn release(&mut self, args: &ReleaseArgs, ctx: &RuntimeContext) -> Result<()>;

    /// Upload configured assets to the created release
    fn upload_assets(&mut self) -> Result<()>;

    /// Output of the `release_notes` command, when configured
    fn notes(&self, ctx: &RuntimeContext) -> Result<Option<String>>;

    fn release_url(&self) -> Option<&str>;

    fn is_released(&self) -> bool;

    /// Public options for hook templates
    fn snapshot(&self) -> Result<Value>;
}

/// Host, owner and project of a git remote
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteRepo {
    /// Empty for local paths
    pub host: String,
    pub owner: String,
    pub project: String,
}

impl RemoteRepo {
    /// Parse https, `ssh://`, scp-like (`git@host:owner/repo`) and local path remotes
    pub fn parse(url: &str) -> Option<Self> {
        let url = url.trim().trim_end_matches('/');
        if url.is_empty() {
            return None;
        }

        let (host, path, is_local) = if let Some((_, rest)) = url.split_once("://") {
            let (authority, path) = rest.split_once('/')?;
            let host = authority.rsplit('@').next().unwrap_or(authority);
            let host = host.split(':').next().unwrap_or(host);
            (host.to_string(), path, host.is_empty())
        } else if let Some((left, path)) = url.split_once(':').filter(|(left, _)| !left.contains('/')) {
            let host = left.rsplit('@').next().unwrap_or(left);
            (host.to_string(), path, false)
        } else {
            (String::new(), url, true)
        };

        let path = path.trim_end_matches('/').trim_end_matches(".git");
        let mut segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
        let project = segments.pop()?.to_string();
        let owner = if is_local {
            segments.last().map(|s| s.to_string()).unwrap_or_default()
        } else {
            segments.join("/")
        };

        Some(RemoteRepo {
            host,
            owner,
            project,
        })
    }

    /// `owner/project`
    pub fn repository(&self) -> String {
        if self.owner.is_empty() {
            self.project.clone()
        } else {
            format!("{}/{}", self.owner, self.project)
        }
    }
}

pub(crate) fn http_client(timeout_secs: u64) -> Result<reqwest::blocking::Client> {
    let mut builder = reqwest::blocking::Client::builder()
        .user_agent(concat!("git-release/", env!("CARGO_PKG_VERSION")));
    if timeout_secs > 0 {
        builder = builder.timeout(Duration::from_secs(timeout_secs));
    }
    builder
        .build()
        .map_err(|e| GitReleaseError::config(format!("http client: {}", e)))
}

/// Read the token named by `token_ref` from the environment
pub(crate) fn token(service: &str, token_ref: &str) -> Result<String> {
    std::env::var(token_ref)
        .ok()
        .filter(|t| !t.is_empty())
        .ok_or_else(|| GitReleaseError::token_missing(service, token_ref))
}

/// Run a configured release notes command
pub(crate) fn run_notes(shell: &Shell, command: Option<&str>, ctx: &RuntimeContext) -> Result<Option<String>> {
    match command.filter(|c| !c.trim().is_empty()) {
        Some(command) => shell.run(&ctx.render(command), Access::ReadOnly).map(Some),
        None => Ok(None),
    }
}

/// Map a failed response to an `Http` error carrying the body
pub(crate) fn check_response(
    service: &str,
    response: reqwest::blocking::Response,
) -> Result<reqwest::blocking::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().unwrap_or_default();
    Err(GitReleaseError::http(service, format!("HTTP {}: {}", status, body)))
}
