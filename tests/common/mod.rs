// Shared fixtures for the integration tests: throwaway repositories with a
// bare "origin" next to them, driven with the system git.
#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::Once;

use serde_json::{json, Value};
use tempfile::TempDir;

use git_release::config::{load_options, merge_values, ConfigSources};
use git_release::ui::{CaptureBuffer, Logger, Spinner};
use git_release::{Orchestrator, ReleaseResult};

pub const BRANCH: &str = "main";

static IDENTITY: Once = Once::new();

/// Commits made by the release run (including in fresh clones) need an identity
fn init_identity() {
    IDENTITY.call_once(|| {
        std::env::set_var("GIT_AUTHOR_NAME", "Release Bot");
        std::env::set_var("GIT_AUTHOR_EMAIL", "release-bot@example.com");
        std::env::set_var("GIT_COMMITTER_NAME", "Release Bot");
        std::env::set_var("GIT_COMMITTER_EMAIL", "release-bot@example.com");
    });
}

pub fn git(dir: &Path, args: &[&str]) -> String {
    let output = Command::new("git")
        .args(args)
        .current_dir(dir)
        .output()
        .expect("Failed to run git");
    assert!(
        output.status.success(),
        "git {:?} failed: {}",
        args,
        String::from_utf8_lossy(&output.stderr)
    );
    String::from_utf8_lossy(&output.stdout).trim().to_string()
}

fn init_bare(path: &Path) {
    fs::create_dir_all(path).unwrap();
    git(path, &["init", "--bare", "--quiet"]);
    git(path, &["symbolic-ref", "HEAD", &format!("refs/heads/{}", BRANCH)]);
}

fn init_work(path: &Path, remote: &Path) {
    fs::create_dir_all(path).unwrap();
    git(path, &["init", "--quiet"]);
    git(path, &["symbolic-ref", "HEAD", &format!("refs/heads/{}", BRANCH)]);
    git(path, &["config", "commit.gpgsign", "false"]);
    git(path, &["config", "tag.gpgsign", "false"]);
    git(path, &["remote", "add", "origin", &remote.display().to_string()]);
}

/// A working repository whose `origin` is a bare repository at `<root>/owner/<name>.git`
pub struct Project {
    pub root: TempDir,
    pub work: PathBuf,
    pub remote: PathBuf,
}

impl Project {
    pub fn new() -> Self {
        init_identity();
        let root = TempDir::new().unwrap();
        let work = root.path().join("work");
        let remote = root.path().join("owner").join("project.git");

        init_bare(&remote);
        init_work(&work, &remote);

        let project = Project { root, work, remote };
        project.write("README.md", "# project\n");
        project.commit_all("Initial commit");
        git(&project.work, &["push", "--quiet", "-u", "origin", BRANCH]);
        project
    }

    pub fn write(&self, path: &str, content: &str) {
        let full = self.work.join(path);
        if let Some(parent) = full.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(full, content).unwrap();
    }

    pub fn read(&self, path: &str) -> String {
        fs::read_to_string(self.work.join(path)).unwrap()
    }

    pub fn commit_all(&self, message: &str) {
        git(&self.work, &["add", "--all"]);
        git(&self.work, &["commit", "--quiet", "--message", message]);
    }

    pub fn tag(&self, name: &str) {
        git(&self.work, &["tag", "--annotate", "--message", name, name]);
    }

    /// Tags that made it to `origin`
    pub fn remote_tags(&self) -> Vec<String> {
        remote_tags(&self.remote)
    }

    /// A file as committed on the remote branch
    pub fn remote_file(&self, path: &str) -> String {
        remote_file(&self.remote, path)
    }

    pub fn remote_log(&self) -> Vec<String> {
        let log = git(&self.remote, &["log", "--format=%s", BRANCH]);
        log.lines().map(str::to_string).collect()
    }

    /// A second bare repository with one commit, to release build output into
    pub fn dist_remote(&self) -> PathBuf {
        let remote = self.root.path().join("owner").join("project-dist.git");
        let seed = self.root.path().join("dist-seed");
        init_bare(&remote);
        init_work(&seed, &remote);
        fs::write(seed.join("README.md"), "# dist\n").unwrap();
        git(&seed, &["add", "--all"]);
        git(&seed, &["commit", "--quiet", "--message", "Initial commit"]);
        git(&seed, &["push", "--quiet", "origin", BRANCH]);
        remote
    }
}

pub fn remote_tags(remote: &Path) -> Vec<String> {
    let tags = git(remote, &["tag", "--list"]);
    tags.lines().map(str::to_string).collect()
}

pub fn remote_file(remote: &Path, path: &str) -> String {
    git(remote, &["show", &format!("{}:{}", BRANCH, path)])
}

/// Load options for `cwd` on top of `overrides`, then run a release with
/// captured output. Runs are unattended and don't send metrics.
pub fn release(cwd: &Path, overrides: Value) -> (git_release::Result<ReleaseResult>, CaptureBuffer) {
    let mut layer = json!({ "ci": true, "disable_metrics": true });
    merge_values(&mut layer, overrides);

    let options = load_options(layer, &ConfigSources::isolated(cwd)).expect("Failed to load options");
    let (logger, buffer) = Logger::capture(options.is_interactive(), false, options.dry_run);
    let result = Orchestrator::new(options, cwd)
        .with_logger(logger)
        .with_spinner(Spinner::hidden())
        .run();
    (result, buffer)
}
