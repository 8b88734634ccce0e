//! Release orchestration
//!
//! [`Orchestrator`] validates everything that can be checked up front, then
//! drives a [`sequence::ReleaseSequence`] over the source repository and, when
//! `dist.repo` is set, the staged distribution clone.

pub mod guard;
pub mod sequence;

pub use guard::InterruptGuard;
pub use sequence::{DistPlan, ReleaseSequence, ReleaseTargets};

use std::path::{Component, Path, PathBuf};
use std::time::Instant;

use serde::Serialize;
use serde_json::json;

use crate::config::ReleaseOptions;
use crate::context::RuntimeContext;
use crate::domain::prerelease::validate_identifier;
use crate::domain::Increment;
use crate::error::{GitReleaseError, Result};
use crate::git::{GitClient, Repository};
use crate::hooks::Hook;
use crate::hosted::{GitHubClient, GitLabClient, HostedRelease};
use crate::metrics::Metrics;
use crate::registry::NpmClient;
use crate::shell::Shell;
use crate::step::StepExecutor;
use crate::ui::{Logger, Prompt, Spinner, StdinPrompt};

/// Summary of a completed release
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReleaseResult {
    pub name: String,
    pub changelog: String,
    pub latest_version: String,
    pub version: String,
}

/// Resolve `stage_dir` lexically against the working directory.
///
/// The result must be a strict sub directory; `..`, `.` and paths leaving the
/// tree are rejected.
pub fn resolve_stage_dir(cwd: &Path, stage_dir: &str) -> Result<PathBuf> {
    let invalid = || GitReleaseError::DistStageDir(stage_dir.to_string());

    let path = Path::new(stage_dir);
    let relative = if path.is_absolute() {
        path.strip_prefix(cwd).map_err(|_| invalid())?
    } else {
        path
    };

    let mut resolved = PathBuf::new();
    for component in relative.components() {
        match component {
            Component::Normal(part) => resolved.push(part),
            Component::CurDir => {}
            Component::ParentDir => {
                if !resolved.pop() {
                    return Err(invalid());
                }
            }
            Component::RootDir | Component::Prefix(_) => return Err(invalid()),
        }
    }

    if resolved.as_os_str().is_empty() {
        return Err(invalid());
    }
    Ok(resolved)
}

/// Top-level driver of a release run
pub struct Orchestrator<'p> {
    options: ReleaseOptions,
    cwd: PathBuf,
    logger: Logger,
    spinner: Spinner,
    prompt: Box<dyn Prompt + 'p>,
    repository: Option<Box<dyn Repository>>,
    metrics: Metrics,
}

impl<'p> Orchestrator<'p> {
    pub fn new(options: ReleaseOptions, cwd: impl Into<PathBuf>) -> Self {
        let is_interactive = options.is_interactive();
        let logger = Logger::new(is_interactive, options.verbose, options.dry_run);
        let spinner = Spinner::new(is_interactive, options.verbose, options.dry_run, options.debug);
        let metrics = Metrics::new(options.is_collect_metrics(), options.metrics_url.clone());

        Orchestrator {
            options,
            cwd: cwd.into(),
            logger,
            spinner,
            prompt: Box::new(StdinPrompt),
            repository: None,
            metrics,
        }
    }

    pub fn with_logger(mut self, logger: Logger) -> Self {
        self.logger = logger;
        self
    }

    pub fn with_spinner(mut self, spinner: Spinner) -> Self {
        self.spinner = spinner;
        self
    }

    pub fn with_prompt(mut self, prompt: impl Prompt + 'p) -> Self {
        self.prompt = Box::new(prompt);
        self
    }

    /// Inspect the source repository through `repo` instead of opening it with git2
    pub fn with_repository(mut self, repo: Box<dyn Repository>) -> Self {
        self.repository = Some(repo);
        self
    }

    pub fn options(&self) -> &ReleaseOptions {
        &self.options
    }

    /// Run the release.
    ///
    /// Any error is reported to metrics and logged on one line before it is
    /// returned.
    pub fn run(mut self) -> Result<ReleaseResult> {
        let started = Instant::now();
        self.metrics.track_event(
            "start",
            json!({
                "increment": self.options.increment,
                "pre_release": self.options.pre_release,
                "ci": self.options.ci,
                "dry_run": self.options.dry_run,
                "dist": self.options.dist.repo.is_some(),
            }),
        );

        match self.execute() {
            Ok(result) => {
                self.metrics.track_event("end", json!({}));
                self.logger
                    .log(&format!("🏁 Done (in {}s.)", started.elapsed().as_secs()));
                Ok(result)
            }
            Err(e) => {
                self.metrics.track_exception(&e);
                self.logger.error(&e.to_string());
                tracing::debug!(error = ?e, "release failed");
                Err(e)
            }
        }
    }

    fn execute(&mut self) -> Result<ReleaseResult> {
        let options = &self.options;

        let requested = options
            .increment
            .as_deref()
            .map(Increment::parse)
            .transpose()?;
        if let Some(id) = options.pre_release_id.as_deref() {
            validate_identifier(id)?;
        }

        let shell = Shell::new(self.cwd.clone(), self.logger.clone());

        let mut git = GitClient::new(options.git.clone(), shell.clone());
        if let Some(repo) = self.repository.take() {
            git = git.with_repository(repo);
        }
        git.init()?;
        git.validate()?;

        let mut dist = match options.dist.repo.as_deref().filter(|r| !r.is_empty()) {
            Some(repo) => Some(self.dist_plan(repo, &shell)?),
            None => None,
        };

        let remote_url = git.remote_url().map(str::to_string);
        let mut source = ReleaseTargets {
            github: GitHubClient::new(options.github.clone(), remote_url.as_deref(), shell.clone()),
            gitlab: GitLabClient::new(options.gitlab.clone(), remote_url.as_deref(), shell.clone()),
            npm: NpmClient::new(options.npm.clone(), shell.clone()),
            git,
            after_release: Hook::AfterRelease
                .command(&options.scripts)
                .map(str::to_string),
        };
        source.github.validate()?;
        source.gitlab.validate()?;
        if let Some(dist) = &dist {
            dist.targets.github.validate()?;
            dist.targets.gitlab.validate()?;
        }

        let ctx = RuntimeContext::from_options(options)?;
        let executor = StepExecutor::new(
            options.is_interactive(),
            self.spinner.clone(),
            &*self.prompt,
        );

        ReleaseSequence::new(options, shell, executor, ctx).run(
            &mut source,
            dist.as_mut(),
            requested,
        )
    }

    /// Collaborators for the distribution repository, bound to its stage directory
    fn dist_plan(&self, repo: &str, shell: &Shell) -> Result<DistPlan> {
        let options = &self.options;
        let dist = &options.dist;

        let stage_dir = resolve_stage_dir(&self.cwd, &dist.stage_dir)?;
        let stage_shell = shell.with_cwd(self.cwd.join(&stage_dir));
        let remote_url = repo.split('#').next().unwrap_or(repo);

        let targets = ReleaseTargets {
            git: GitClient::for_dist(dist.git_options(&options.git)?, stage_shell.clone()),
            github: GitHubClient::new(
                dist.github_options(&options.github)?,
                Some(remote_url),
                stage_shell.clone(),
            ),
            gitlab: GitLabClient::new(
                dist.gitlab_options(&options.gitlab)?,
                Some(remote_url),
                stage_shell.clone(),
            ),
            npm: NpmClient::new(dist.npm_options(&options.npm)?, stage_shell),
            after_release: Hook::AfterRelease
                .dist_command(&dist.scripts)
                .map(str::to_string),
        };

        Ok(DistPlan {
            repo: repo.to_string(),
            stage_dir,
            base_dir: PathBuf::from(&dist.base_dir),
            files: dist.files.clone(),
            pkg_files: dist.pkg_files.clone(),
            before_stage: Hook::BeforeStage
                .dist_command(&dist.scripts)
                .map(str::to_string),
            targets,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::git::MockRepository;
    use crate::ui::ScriptedPrompt;
    use tempfile::TempDir;

    #[test]
    fn test_resolve_stage_dir() {
        let cwd = Path::new("/work/project");
        assert_eq!(resolve_stage_dir(cwd, ".stage").unwrap(), PathBuf::from(".stage"));
        assert_eq!(
            resolve_stage_dir(cwd, "./build/../dist-stage").unwrap(),
            PathBuf::from("dist-stage")
        );
        assert_eq!(
            resolve_stage_dir(cwd, "/work/project/tmp/stage").unwrap(),
            PathBuf::from("tmp/stage")
        );
    }

    #[test]
    fn test_resolve_stage_dir_rejects_escapes() {
        let cwd = Path::new("/work/project");
        for bad in ["..", ".", "", "a/../..", "../sibling", "/tmp/stage"] {
            assert!(
                matches!(resolve_stage_dir(cwd, bad), Err(GitReleaseError::DistStageDir(_))),
                "{}",
                bad
            );
        }
    }

    fn orchestrator<'p>(
        options: ReleaseOptions,
        dir: &TempDir,
        prompt: &'p ScriptedPrompt,
    ) -> (Orchestrator<'p>, crate::ui::CaptureBuffer) {
        let (logger, buffer) = Logger::capture(options.is_interactive(), false, options.dry_run);
        let orchestrator = Orchestrator::new(options, dir.path())
            .with_logger(logger)
            .with_spinner(Spinner::hidden())
            .with_prompt(prompt)
            .with_repository(Box::new(MockRepository::new().with_tag("1.0.0")));
        (orchestrator, buffer)
    }

    fn options() -> ReleaseOptions {
        ReleaseOptions {
            name: "pkg".to_string(),
            ci: true,
            dry_run: true,
            disable_metrics: true,
            ..ReleaseOptions::default()
        }
    }

    #[test]
    fn test_invalid_increment_fails_first() {
        let dir = TempDir::new().unwrap();
        let prompt = ScriptedPrompt::default();
        let mut options = options();
        options.increment = Some("mini".to_string());
        let (orchestrator, buffer) = orchestrator(options, &dir, &prompt);

        let err = orchestrator.run().unwrap_err();
        assert!(matches!(err, GitReleaseError::InvalidVersion(_)));
        assert!(buffer.contains("ERROR An invalid version was provided: \"mini\""));
        assert!(!buffer.contains("$ git"));
    }

    #[test]
    fn test_dist_stage_dir_validated_before_clone() {
        let dir = TempDir::new().unwrap();
        let prompt = ScriptedPrompt::default();
        let mut options = options();
        options.increment = Some("patch".to_string());
        options.dist.repo = Some("https://github.com/owner/dist.git".to_string());
        options.dist.stage_dir = "..".to_string();
        let (orchestrator, buffer) = orchestrator(options, &dir, &prompt);

        let err = orchestrator.run().unwrap_err();
        assert!(matches!(err, GitReleaseError::DistStageDir(_)));
        assert!(!buffer.contains("git clone"));
    }

    #[test]
    fn test_missing_token_is_validation_error() {
        let dir = TempDir::new().unwrap();
        let prompt = ScriptedPrompt::default();
        let mut options = options();
        options.increment = Some("patch".to_string());
        options.github.release = true;
        options.github.token_ref = "GIT_RELEASE_ORCHESTRATOR_TOKEN_UNSET".to_string();
        let (orchestrator, buffer) = orchestrator(options, &dir, &prompt);

        let err = orchestrator.run().unwrap_err();
        assert!(err.is_validation());
        assert!(!buffer.contains("Let's release"));
    }
}
