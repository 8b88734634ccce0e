use std::fs;
use std::path::Path;

use serde::Deserialize;
use serde_json::{json, Value};

use super::{check_response, http_client, run_notes, token, HostedRelease, ReleaseArgs, RemoteRepo};
use crate::config::GitHubOptions;
use crate::context::RuntimeContext;
use crate::error::{GitReleaseError, Result};
use crate::shell::Shell;

const SERVICE: &str = "GitHub";

#[derive(Debug, Deserialize)]
struct CreatedRelease {
    html_url: Option<String>,
    upload_url: Option<String>,
}

/// Creates GitHub releases and uploads their assets through the REST API
pub struct GitHubClient {
    options: GitHubOptions,
    remote: Option<RemoteRepo>,
    shell: Shell,
    release_url: Option<String>,
    upload_url: Option<String>,
    is_released: bool,
}

impl GitHubClient {
    pub fn new(options: GitHubOptions, remote_url: Option<&str>, shell: Shell) -> Self {
        GitHubClient {
            options,
            remote: remote_url.and_then(RemoteRepo::parse),
            shell,
            release_url: None,
            upload_url: None,
            is_released: false,
        }
    }

    pub fn options(&self) -> &GitHubOptions {
        &self.options
    }

    fn host(&self) -> String {
        self.options
            .host
            .clone()
            .or_else(|| self.remote.as_ref().map(|r| r.host.clone()))
            .filter(|h| !h.is_empty())
            .unwrap_or_else(|| "github.com".to_string())
    }

    /// `https://api.github.com`, or `https://<host>/api/v3` for enterprise hosts
    pub fn api_url(&self) -> String {
        if let Some(api_url) = &self.options.api_url {
            return api_url.trim_end_matches('/').to_string();
        }
        match self.host().as_str() {
            "github.com" => "https://api.github.com".to_string(),
            host => format!("https://{}/api/v3", host),
        }
    }

    fn repository(&self) -> Result<String> {
        self.remote
            .as_ref()
            .map(RemoteRepo::repository)
            .ok_or(GitReleaseError::RemoteUrlMissing)
    }

    fn asset_files(&self) -> Result<Vec<std::path::PathBuf>> {
        let mut files = Vec::new();
        for pattern in &self.options.assets {
            let full = self.shell.cwd().join(pattern);
            let entries = glob::glob(&full.to_string_lossy()).map_err(|e| {
                GitReleaseError::config(format!("Invalid asset pattern '{}': {}", pattern, e))
            })?;
            for entry in entries {
                let path = entry.map_err(|e| e.into_error())?;
                if path.is_file() {
                    files.push(path);
                }
            }
        }
        Ok(files)
    }

    fn upload_asset(
        &self,
        client: &reqwest::blocking::Client,
        token: &str,
        upload_url: &str,
        path: &Path,
    ) -> Result<()> {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let body = fs::read(path)?;

        let response = client
            .post(format!("{}?name={}", upload_url, urlencoding::encode(&name)))
            .header("Authorization", format!("token {}", token))
            .header("Accept", "application/vnd.github.v3+json")
            .header("Content-Type", "application/octet-stream")
            .body(body)
            .send()
            .map_err(|e| GitReleaseError::http(SERVICE, e.to_string()))?;
        check_response(SERVICE, response)?;

        tracing::debug!(asset = %name, "uploaded asset");
        Ok(())
    }
}

impl HostedRelease for GitHubClient {
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
        let body = match self.notes(ctx)? {
            Some(notes) => notes,
            None => args.changelog.to_string(),
        };
        let endpoint = format!("{}/repos/{}/releases", self.api_url(), repository);

        let logger = self.shell.logger();
        logger.exec(&format!("POST {} (tag_name: {}, name: {})", endpoint, args.tag_name, name));
        if self.shell.is_dry_run() {
            logger.dry();
            self.release_url = Some(format!(
                "https://{}/{}/releases/tag/{}",
                self.host(),
                repository,
                args.tag_name
            ));
            self.is_released = true;
            return Ok(());
        }

        let token = token(SERVICE, &self.options.token_ref)?;
        let client = http_client(self.options.timeout_secs)?;
        let response = client
            .post(&endpoint)
            .header("Authorization", format!("token {}", token))
            .header("Accept", "application/vnd.github.v3+json")
            .json(&json!({
                "tag_name": args.tag_name,
                "name": name,
                "body": body,
                "prerelease": args.is_pre_release,
                "draft": self.options.draft,
            }))
            .send()
            .map_err(|e| GitReleaseError::http(SERVICE, e.to_string()))?;

        let created: CreatedRelease = check_response(SERVICE, response)?
            .json()
            .map_err(|e| GitReleaseError::http(SERVICE, format!("invalid response: {}", e)))?;

        tracing::debug!(release_url = ?created.html_url, "created release");
        self.release_url = created.html_url;
        self.upload_url = created
            .upload_url
            .map(|url| url.split('{').next().unwrap_or_default().to_string());
        self.is_released = true;
        Ok(())
    }

    fn upload_assets(&mut self) -> Result<()> {
        if self.options.assets.is_empty() {
            return Ok(());
        }

        if !self.is_released {
            tracing::debug!("no release created, skipping asset upload");
            return Ok(());
        }

        let files = self.asset_files()?;
        let logger = self.shell.logger();
        for file in &files {
            logger.exec(&format!("upload asset {}", file.display()));
        }

        if self.shell.is_dry_run() {
            logger.dry();
            return Ok(());
        }

        let Some(upload_url) = self.upload_url.clone() else {
            return Err(GitReleaseError::http(SERVICE, "release has no upload url"));
        };

        let token = token(SERVICE, &self.options.token_ref)?;
        let client = http_client(self.options.timeout_secs)?;
        for file in &files {
            self.upload_asset(&client, &token, &upload_url, file)?;
        }
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
