//! Subprocess execution and the file helpers of a release run.
//!
//! Every operation that changes the world is tagged [`Access::Write`] and is
//! only echoed in dry-run mode.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use rayon::prelude::*;
use serde::Serialize;
use serde_json::ser::{PrettyFormatter, Serializer};
use serde_json::Value;

use crate::context::RuntimeContext;
use crate::error::{GitReleaseError, Result};
use crate::ui::Logger;
use crate::warning::ReleaseWarning;

/// Whether a command may run during a dry run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    ReadOnly,
    Write,
}

/// Runs commands and file operations relative to a working directory
#[derive(Debug, Clone)]
pub struct Shell {
    cwd: PathBuf,
    logger: Logger,
}

impl Shell {
    pub fn new(cwd: impl Into<PathBuf>, logger: Logger) -> Self {
        Shell {
            cwd: cwd.into(),
            logger,
        }
    }

    /// A shell for another directory sharing this shell's output settings
    pub fn with_cwd(&self, cwd: impl Into<PathBuf>) -> Self {
        Shell {
            cwd: cwd.into(),
            logger: self.logger.clone(),
        }
    }

    pub fn cwd(&self) -> &Path {
        &self.cwd
    }

    pub fn logger(&self) -> &Logger {
        &self.logger
    }

    pub fn is_dry_run(&self) -> bool {
        self.logger.is_dry_run()
    }

    /// Run `program` with `args` directly, without a shell
    pub fn exec<S: AsRef<str>>(&self, program: &str, args: &[S], access: Access) -> Result<String> {
        let display = std::iter::once(program)
            .chain(args.iter().map(AsRef::as_ref))
            .collect::<Vec<_>>()
            .join(" ");

        let mut cmd = Command::new(program);
        cmd.args(args.iter().map(AsRef::as_ref));
        self.execute(cmd, &display, access)
    }

    /// Run a command line through `sh -c`
    pub fn run(&self, command: &str, access: Access) -> Result<String> {
        self.run_with_env(command, &HashMap::new(), access)
    }

    pub fn run_with_env(
        &self,
        command: &str,
        env: &HashMap<String, String>,
        access: Access,
    ) -> Result<String> {
        let mut cmd = Command::new("sh");
        cmd.arg("-c").arg(command).envs(env);
        self.execute(cmd, command, access)
    }

    /// Render `template` against `ctx` and run it as a write.
    ///
    /// An empty template is a no-op.
    pub fn run_template_command(
        &self,
        template: &str,
        ctx: &RuntimeContext,
        env: &HashMap<String, String>,
    ) -> Result<String> {
        if template.trim().is_empty() {
            return Ok(String::new());
        }
        let command = ctx.render(template);
        self.run_with_env(&command, env, Access::Write)
    }

    fn execute(&self, mut cmd: Command, shown: &str, access: Access) -> Result<String> {
        self.logger.exec(shown);

        if self.is_dry_run() && access == Access::Write {
            self.logger.dry();
            return Ok(String::new());
        }

        cmd.current_dir(&self.cwd);
        let output = cmd
            .output()
            .map_err(|e| GitReleaseError::command(shown, e.to_string()))?;

        let stdout = String::from_utf8_lossy(&output.stdout).trim().to_string();
        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
        tracing::debug!(
            command = shown,
            cwd = %self.cwd.display(),
            code = ?output.status.code(),
            %stdout,
            %stderr,
            "command finished"
        );

        if !output.status.success() {
            let message = if stderr.is_empty() { stdout } else { stderr };
            return Err(GitReleaseError::command(shown, message));
        }

        if self.logger.is_verbose() && !stdout.is_empty() {
            self.logger.log(&stdout);
        }
        Ok(stdout)
    }

    /// Write `version` into each file in parallel.
    ///
    /// A file that cannot be bumped produces a warning; the others still change.
    pub fn bump(&self, files: &[String], version: &str) -> Vec<ReleaseWarning> {
        let files: Vec<&String> = files.iter().filter(|f| !f.trim().is_empty()).collect();
        if files.is_empty() {
            return Vec::new();
        }

        let listed = files.iter().map(|f| f.as_str()).collect::<Vec<_>>().join(" ");
        self.logger.exec(&format!("bump {} {}", listed, version));
        if self.is_dry_run() {
            self.logger.dry();
            return Vec::new();
        }

        let warnings: Vec<ReleaseWarning> = files
            .par_iter()
            .filter_map(|file| match bump_file(&self.cwd.join(file), version) {
                Ok(()) => None,
                Err(e) => {
                    tracing::debug!(file = %file, error = %e, "bump failed");
                    Some(ReleaseWarning::BumpFailed {
                        file: file.to_string(),
                    })
                }
            })
            .collect();

        for warning in &warnings {
            self.logger.warning(warning);
        }
        warnings
    }

    /// Copy files matching `patterns` (relative to `base_dir`) into `target`,
    /// keeping their directory structure. Directories themselves are skipped.
    pub fn copy(&self, patterns: &[String], target: &Path, base_dir: &Path) -> Result<usize> {
        self.logger.exec(&format!(
            "copy {} {} (cwd: {})",
            patterns.join(" "),
            target.display(),
            base_dir.display()
        ));
        if self.is_dry_run() {
            self.logger.dry();
            return Ok(0);
        }

        let base = self.cwd.join(base_dir);
        let target = self.cwd.join(target);
        let mut copied = 0;

        for pattern in patterns {
            let full_pattern = base.join(pattern);
            let entries = glob::glob(&full_pattern.to_string_lossy()).map_err(|e| {
                GitReleaseError::config(format!("Invalid file pattern '{}': {}", pattern, e))
            })?;

            for entry in entries {
                let path = entry.map_err(|e| e.into_error())?;
                if !path.is_file() {
                    continue;
                }

                let relative = path.strip_prefix(&base).unwrap_or(&path);
                let destination = target.join(relative);
                if let Some(parent) = destination.parent() {
                    fs::create_dir_all(parent)?;
                }
                fs::copy(&path, &destination)?;
                copied += 1;
            }
        }

        Ok(copied)
    }

    /// Remove a directory tree below the working directory
    pub fn remove_dir(&self, path: &Path) -> Result<()> {
        self.logger.exec(&format!("rm -rf {}", path.display()));
        if self.is_dry_run() {
            self.logger.dry();
            return Ok(());
        }

        let full = self.cwd.join(path);
        if full.exists() {
            fs::remove_dir_all(full)?;
        }
        Ok(())
    }
}

/// Set the version inside one file.
///
/// JSON manifests get their `version` key updated with key order kept, TOML
/// manifests their `package.version` (or top-level `version`), and any other
/// file is replaced by the bare version.
pub fn bump_file(path: &Path, version: &str) -> Result<()> {
    let content = fs::read_to_string(path)?;
    let trailing_newline = content.ends_with('\n');

    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_lowercase);

    let mut updated = match extension.as_deref() {
        Some("json") => {
            let mut manifest: Value = serde_json::from_str(&content)?;
            let Some(object) = manifest.as_object_mut() else {
                return Err(GitReleaseError::config(format!(
                    "{} is not a JSON object",
                    path.display()
                )));
            };
            object.insert("version".to_string(), Value::String(version.to_string()));
            let mut out = Vec::new();
            let formatter = PrettyFormatter::with_indent(json_indent(&content).as_bytes());
            manifest.serialize(&mut Serializer::with_formatter(&mut out, formatter))?;
            String::from_utf8_lossy(&out).into_owned()
        }
        Some("toml") => {
            let mut doc: toml_edit::DocumentMut = content.parse().map_err(|e| {
                GitReleaseError::config(format!("Failed to parse {}: {}", path.display(), e))
            })?;
            match doc.get_mut("package").and_then(|p| p.as_table_like_mut()) {
                Some(package) => {
                    package.insert("version", toml_edit::value(version));
                }
                None => doc["version"] = toml_edit::value(version),
            }
            doc.to_string().trim_end().to_string()
        }
        _ => version.to_string(),
    };

    if trailing_newline || extension.as_deref() != Some("toml") {
        updated.push('\n');
    }
    fs::write(path, updated)?;
    Ok(())
}

/// Leading whitespace of the first indented line; two spaces for a flat document
fn json_indent(content: &str) -> &str {
    content
        .lines()
        .filter(|line| !line.trim().is_empty())
        .map(|line| &line[..line.len() - line.trim_start_matches([' ', '\t']).len()])
        .find(|indent| !indent.is_empty())
        .unwrap_or("  ")
}
