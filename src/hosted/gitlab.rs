use serde::Deserialize;
use serde_json::{json, Value};

use super::{check_response, http_client, run_notes, token, HostedRelease, ReleaseArgs, RemoteRepo};
use crate::config::GitLabOptions;
use crate::context::RuntimeContext;
use crate::error::{GitReleaseError, Result};
use crate::shell::Shell;

const SERVICE: &str = "GitLab";

#[derive(Debug, Deserialize)]
struct ReleaseLinks {
    #[serde(rename = "self")]
    self_url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CreatedRelease {
    #[serde(rename = "_links")]
    links: Option<ReleaseLinks>,
}

/// Creates GitLab releases through the v4 REST API
pub struct GitLabClient {
    options: GitLabOptions,
    remote: Option<RemoteRepo>,
    shell: Shell,
    release_url: Option<String>,
    is_released: bool,
}

impl GitLabClient {
    pub fn new(options: GitLabOptions, remote_url: Option<&str>, shell: Shell) -> Self {
        GitLabClient {
            options,
            remote: remote_url.and_then(RemoteRepo::parse),
            shell,
            release_url: None,
            is_released: false,
        }
    }

    pub fn options(&self) -> &GitLabOptions {
        &self.options
    }

    fn host(&self) -> String {
        self.options
            .host
            .clone()
            .or_else(|| self.remote.as_ref().map(|r| r.host.clone()))
            .filter(|h| !h.is_empty())
            .unwrap_or_else(|| "gitlab.com".to_string())
    }

    pub fn api_url(&self) -> String {
        match &self.options.api_url {
            Some(api_url) => api_url.trim_end_matches('/').to_string(),
            None => format!("https://{}/api/v4", self.host()),
        }
    }

    fn repository(&self) -> Result<String> {
        self.remote
            .as_ref()
            .map(RemoteRepo::repository)
            .ok_or(GitReleaseError::RemoteUrlMissing)
    }
}

impl HostedRelease for GitLabClient {
    fn service(&self) -> &'static str {
        SERVICE
    }

    fn is_enabled(&self) -> bool {
        self.options.release
    }

    fn validate(&self) -> Result<()> {
        if !self.options.release {
            return Ok(());
        }
        token(SERVICE, &self.options.token_ref).map(|_| ())
    }

    fn release(&mut self, args: &ReleaseArgs, ctx: &RuntimeContext) -> Result<()> {
        let repository = self.repository()?;
        let name = ctx.render(&self.options.release_name);
        let description = match self.notes(ctx)? {
            Some(notes) => notes,
            None => args.changelog.to_string(),
        };
        let endpoint = format!(
            "{}/projects/{}/releases",
            self.api_url(),
            urlencoding::encode(&repository)
        );
        let fallback_url = format!(
            "https://{}/{}/-/releases/{}",
            self.host(),
            repository,
            args.tag_name
        );

        let logger = self.shell.logger();
        logger.exec(&format!("POST {} (tag_name: {}, name: {})", endpoint, args.tag_name, name));
        if self.shell.is_dry_run() {
            logger.dry();
            self.release_url = Some(fallback_url);
            self.is_released = true;
            return Ok(());
        }

        let token = token(SERVICE, &self.options.token_ref)?;
        let client = http_client(self.options.timeout_secs)?;
        let response = client
            .post(&endpoint)
            .header("PRIVATE-TOKEN", token)
            .json(&json!({
                "name": name,
                "tag_name": args.tag_name,
                "description": description,
            }))
            .send()
            .map_err(|e| GitReleaseError::http(SERVICE, e.to_string()))?;

        let created: CreatedRelease = check_response(SERVICE, response)?
            .json()
            .map_err(|e| GitReleaseError::http(SERVICE, format!("invalid response: {}", e)))?;

        self.release_url = created
            .links
            .and_then(|l| l.self_url)
            .or(Some(fallback_url));
        self.is_released = true;
        Ok(())
    }

    /// GitLab assets are attached as release links, which this client does not manage
    fn upload_assets(&mut self) -> Result<()> {
        Ok(())
    }

    fn notes(&self, ctx: &RuntimeContext) -> Result<Option<String>> {
        run_notes(&self.shell, self.options.release_notes.as_deref(), ctx)
    }

    fn release_url(&self) -> Option<&str> {
        self.release_url.as_deref()
    }

    fn is_released(&self) -> bool {
        self.is_released
    }

    fn snapshot(&self) -> Result<Value> {
        Ok(serde_json::to_value(&self.options)?)
    }
}
