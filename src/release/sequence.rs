//! The ordered phases of one release run.

use std::path::PathBuf;

use crate::analyzer::VersionAnalyzer;
use crate::changelog::Changelog;
use crate::config::ReleaseOptions;
use crate::context::RuntimeContext;
use crate::domain::{Increment, TagPattern};
use crate::error::{GitReleaseError, Result};
use crate::git::GitClient;
use crate::hooks::{Hook, HookExecutor};
use crate::hosted::{GitHubClient, GitLabClient, HostedRelease, ReleaseArgs};
use crate::registry::{NpmClient, OtpCallback};
use crate::resolver::{ChangelogTiming, VersionDetails, VersionResolver};
use crate::shell::Shell;
use crate::step::{PromptKind, Step, StepExecutor, StepOutcome};
use crate::ui::Logger;

use super::guard::InterruptGuard;
use super::ReleaseResult;

/// Collaborators the release phase drives for one repository
pub struct ReleaseTargets {
    pub git: GitClient,
    pub github: GitHubClient,
    pub gitlab: GitLabClient,
    pub npm: NpmClient,
    pub after_release: Option<String>,
}

/// The distribution repository: where it is cloned and what releases it
pub struct DistPlan {
    pub repo: String,
    /// Relative to the source working directory
    pub stage_dir: PathBuf,
    pub base_dir: PathBuf,
    pub files: Vec<String>,
    pub pkg_files: Vec<String>,
    pub before_stage: Option<String>,
    pub targets: ReleaseTargets,
}

pub struct ReleaseSequence<'a> {
    options: &'a ReleaseOptions,
    shell: Shell,
    executor: StepExecutor<'a>,
    ctx: RuntimeContext,
    changelog: String,
}

impl<'a> ReleaseSequence<'a> {
    pub fn new(
        options: &'a ReleaseOptions,
        shell: Shell,
        executor: StepExecutor<'a>,
        ctx: RuntimeContext,
    ) -> Self {
        ReleaseSequence {
            options,
            shell,
            executor,
            ctx,
            changelog: String::new(),
        }
    }

    fn logger(&self) -> &Logger {
        self.shell.logger()
    }

    /// Run every phase for the source repository, then the release phase for
    /// the distribution repository when there is one.
    pub fn run(
        mut self,
        source: &mut ReleaseTargets,
        dist: Option<&mut DistPlan>,
        requested: Option<Increment>,
    ) -> Result<ReleaseResult> {
        let options = self.options;

        self.run_hook(Hook::BeforeStart, Hook::BeforeStart.command(&options.scripts), &self.shell)?;

        let timing = ChangelogTiming::for_increment(requested.as_ref());
        let mut resolver = VersionResolver::new(
            options.pre_release_id.clone(),
            TagPattern::new(options.git.tag_name.as_str()),
        );
        let warnings = resolver.set_latest_version(
            options.version_source,
            source.git.latest_tag(),
            options.npm.version.as_deref(),
            source.git.is_root_dir(),
        );
        for warning in &warnings {
            self.logger().warning(warning);
        }
        self.ctx.set_once("latest_version", resolver.latest_version())?;

        let requested = match requested {
            Some(Increment::Conventional) => Some(Increment::Release(self.recommend(&source.git)?)),
            other => other,
        };
        resolver.bump(requested.as_ref(), options.pre_release)?;

        let summary = match resolver.version() {
            Some(version) => format!("{}...{}", resolver.latest_version(), version),
            None => format!("currently at {}", resolver.latest_version()),
        };
        self.logger()
            .log(&format!("\n🚀 Let's release {} ({})", options.name, summary));

        if timing == ChangelogTiming::BeforeBump {
            self.generate_changelog(&source.git)?;
        }

        if self.executor.is_interactive() && resolver.version().is_none() {
            self.prompt_version(&mut resolver)?;
        }

        let details = resolver.validate()?;
        self.publish_version(&details)?;
        let version = details.version.as_str();

        let guard = if self.executor.is_interactive()
            && !options.pkg_files.is_empty()
            && options.git.require_clean_working_dir
        {
            Some(InterruptGuard::arm(source.git.reset_action(&options.pkg_files)))
        } else {
            None
        };

        let released = self.bump_and_release(source, dist.as_deref(), version, timing);
        if let Some(guard) = guard {
            guard.disarm();
            if released.is_err() {
                if let Err(e) = source.git.reset(&options.pkg_files) {
                    tracing::debug!(error = %e, "manifest reset failed");
                }
            }
        }
        released?;

        if let Some(dist) = dist {
            self.logger().log(&format!(
                "\n🚀 Let's release the distribution repo for {}",
                options.name
            ));
            dist.targets.git.init()?;
            dist.targets.git.handle_tag_options(&source.git);
            self.release(&mut dist.targets)?;
            self.shell.remove_dir(&dist.stage_dir)?;
        }

        tracing::debug!(context = %self.ctx.view(), "release finished");
        Ok(ReleaseResult {
            name: options.name.clone(),
            changelog: self.changelog,
            latest_version: details.latest_version,
            version: details.version,
        })
    }

    /// Bump, stage and release the source repository. Any error leaves the
    /// bumped manifests for the caller to reset.
    fn bump_and_release(
        &mut self,
        source: &mut ReleaseTargets,
        dist: Option<&DistPlan>,
        version: &str,
        timing: ChangelogTiming,
    ) -> Result<()> {
        let options = self.options;

        self.run_hook(Hook::BeforeBump, Hook::BeforeBump.command(&options.scripts), &self.shell)?;
        let bump = Step::new("Bump version", || {
            self.shell.bump(&options.pkg_files, version);
            Ok(())
        });
        self.executor.run(bump, &self.ctx)?;
        self.run_hook(Hook::AfterBump, Hook::AfterBump.command(&options.scripts), &self.shell)?;

        if timing == ChangelogTiming::AfterBump {
            self.generate_changelog(&source.git)?;
        }

        self.run_hook(Hook::BeforeStage, Hook::BeforeStage.command(&options.scripts), &self.shell)?;
        let git = &source.git;
        let stage = Step::new("Stage files", || {
            git.stage(&options.pkg_files);
            git.stage_dir()
        });
        self.executor.run(stage, &self.ctx)?;

        if let Some(dist) = dist {
            self.stage_dist(&source.git, dist, version)?;
        }

        self.release(source)
    }

    fn run_hook(&self, hook: Hook, command: Option<&str>, shell: &Shell) -> Result<()> {
        let Some(command) = command else {
            return Ok(());
        };
        let ctx = &self.ctx;
        let step = Step::new(command, || {
            HookExecutor::execute(shell, hook, command, ctx).map(|_| ())
        })
        .forced();
        self.executor.run(step, ctx)?;
        Ok(())
    }

    fn recommend(&self, git: &GitClient) -> Result<crate::domain::ReleaseType> {
        let messages = git.commit_messages_since_latest_tag()?;
        let bump = VersionAnalyzer::new(self.options.conventional_commits.clone())
            .analyze_messages(&messages);
        tracing::debug!(?bump, commits = messages.len(), "recommended increment");
        Ok(bump.into())
    }

    fn generate_changelog(&mut self, git: &GitClient) -> Result<()> {
        let changelog =
            Changelog::new(&self.shell).create(&self.options.scripts.changelog, git.latest_tag())?;
        self.logger().preview("changelog", &changelog);
        self.ctx.set_once("changelog", &changelog)?;
        self.changelog = changelog;
        Ok(())
    }

    /// Ask for the increment, or an explicit version through "Other"
    fn prompt_version(&self, resolver: &mut VersionResolver) -> Result<()> {
        let prompt = self.executor.prompt();
        let previews = resolver.previews(self.options.pre_release);
        let mut choices: Vec<String> = previews
            .iter()
            .map(|(release, version)| format!("{} ({})", release, version))
            .collect();
        choices.push("Other, please specify...".to_string());

        let selected = prompt.select("Select increment (next version):", &choices, 0)?;
        match previews.get(selected) {
            Some((release, _)) => {
                resolver.bump(Some(&Increment::Release(*release)), self.options.pre_release)
            }
            // A typo asks again; an empty answer gives up
            None => loop {
                let version = prompt.input("Please enter a valid version:", None)?;
                if version.is_empty() {
                    return Err(GitReleaseError::invalid_version("no version entered"));
                }
                match resolver.set_version(&version) {
                    Err(err @ GitReleaseError::InvalidVersion(_)) => {
                        self.logger().log(&err.to_string())
                    }
                    result => return result,
                }
            },
        }
    }

    fn publish_version(&mut self, details: &VersionDetails) -> Result<()> {
        self.ctx.set_once("version", &details.version)?;
        self.ctx.set_once("is_pre_release", details.is_pre_release)?;
        // Refines the configured identifier, hence merge
        self.ctx.merge("pre_release_id", &details.pre_release_id)?;
        Ok(())
    }

    /// Clone the distribution repository and prepare its release commit
    fn stage_dist(&self, source_git: &GitClient, dist: &DistPlan, version: &str) -> Result<()> {
        let clone = Step::new("Clone", || source_git.clone_repo(&dist.repo, &dist.stage_dir));
        self.executor.run(clone, &self.ctx)?;

        self.shell.copy(&dist.files, &dist.stage_dir, &dist.base_dir)?;

        let stage_shell = dist.targets.git.shell();
        stage_shell.bump(&dist.pkg_files, version);
        self.run_hook(Hook::BeforeStage, dist.before_stage.as_deref(), stage_shell)?;
        dist.targets.git.stage_dir()
    }

    /// Commit, tag, push, hosted releases, publish and the `after_release` hook
    fn release(&mut self, targets: &mut ReleaseTargets) -> Result<()> {
        let ReleaseTargets {
            git,
            github,
            gitlab,
            npm,
            after_release,
        } = targets;

        self.ctx.merge("git", git.snapshot()?)?;
        self.ctx.merge("github", github.snapshot()?)?;
        self.ctx.merge("gitlab", gitlab.snapshot()?)?;
        self.ctx.merge("npm", npm.snapshot()?)?;

        let ctx = &self.ctx;
        let executor = &self.executor;
        let logger = self.shell.logger();
        let is_interactive = executor.is_interactive();

        let version = ctx.get_str("version").unwrap_or_default().to_string();
        let is_pre_release = ctx
            .get("is_pre_release")
            .and_then(|v| v.as_bool())
            .unwrap_or_default();
        let tag_name = ctx.render(&git.options().tag_name);
        let args = ReleaseArgs {
            version: &version,
            tag_name: &tag_name,
            is_pre_release,
            changelog: &self.changelog,
        };

        logger.preview("changeset", &git.status()?);

        let options = git.options();
        let git = &*git;
        executor.run(
            Step::new("Git commit", || git.commit(ctx))
                .enabled(options.commit)
                .prompt(PromptKind::Commit),
            ctx,
        )?;
        executor.run(
            Step::new("Git tag", || git.tag(ctx).map(|_| ()))
                .enabled(options.tag)
                .prompt(PromptKind::Tag),
            ctx,
        )?;
        executor.run(
            Step::new("Git push", || git.push())
                .enabled(options.push)
                .prompt(PromptKind::Push),
            ctx,
        )?;

        let is_enabled = github.is_enabled();
        if is_enabled && github.options().release_notes.is_some() {
            if let Some(notes) = github.notes(ctx)? {
                logger.preview("release notes", &notes);
            }
        }
        let has_assets = !github.options().assets.is_empty();
        let outcome = executor.run(
            Step::new(format!("{} release", github.service()), || github.release(&args, ctx))
                .enabled(is_enabled)
                .prompt(PromptKind::GitHubRelease),
            ctx,
        )?;
        executor.run(
            Step::new(format!("{} upload assets", github.service()), || github.upload_assets())
                .enabled(has_assets && outcome == StepOutcome::Done),
            ctx,
        )?;

        let is_enabled = gitlab.is_enabled();
        if is_enabled && gitlab.options().release_notes.is_some() {
            if let Some(notes) = gitlab.notes(ctx)? {
                logger.preview("release notes", &notes);
            }
        }
        executor.run(
            Step::new(format!("{} release", gitlab.service()), || gitlab.release(&args, ctx))
                .enabled(is_enabled)
                .prompt(PromptKind::GitLabRelease),
            ctx,
        )?;

        let prompt = executor.prompt();
        let ask_otp = || prompt.input("Please enter OTP for npm:", None);
        let otp_callback: Option<OtpCallback> = if is_interactive { Some(&ask_otp) } else { None };
        let is_enabled = npm.options().publish;
        executor.run(
            Step::new("npm publish", || npm.publish(is_pre_release, otp_callback))
                .enabled(is_enabled)
                .prompt(PromptKind::Publish),
            ctx,
        )?;

        self.run_hook(Hook::AfterRelease, after_release.as_deref(), git.shell())?;

        for url in [github.release_url(), gitlab.release_url()]
            .into_iter()
            .flatten()
        {
            logger.log(&format!("🔗 {}", url));
        }
        if npm.is_published() {
            if let Some(url) = npm.package_url() {
                logger.log(&format!("🔗 {}", url));
            }
        }
        Ok(())
    }
}
