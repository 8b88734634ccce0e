//! Command line interface
//!
//! Flags map one to one onto [`crate::config::ReleaseOptions`] fields and form
//! the highest precedence configuration layer.

use std::path::{Path, PathBuf};

use clap::Parser;
use serde_json::{Map, Value};

use crate::config::{ConfigSources, FileSource};

#[derive(Debug, Clone, Parser)]
#[command(
    name = "git-release",
    version,
    about = "Bump the version, tag, push, create hosted releases and publish to npm"
)]
pub struct Cli {
    #[arg(help = "Increment (major, minor, patch, premajor, preminor, prepatch, prerelease, conventional) or an explicit version")]
    pub increment: Option<String>,

    #[arg(
        long = "pre-release",
        value_name = "ID",
        num_args = 0..=1,
        require_equals = true,
        default_missing_value = "",
        help = "Release a pre-release version, optionally with an identifier (e.g. --pre-release=beta)"
    )]
    pub pre_release: Option<String>,

    #[arg(short = 'd', long, help = "Show what would happen without changing anything")]
    pub dry_run: bool,

    #[arg(short, long, help = "Print every command that runs")]
    pub verbose: bool,

    #[arg(long, visible_alias = "non-interactive", help = "Run without prompts")]
    pub ci: bool,

    #[arg(long, help = "Print diagnostic logs (RUST_LOG overrides the filter)")]
    pub debug: bool,

    #[arg(long, help = "Don't send usage metrics")]
    pub no_metrics: bool,

    #[arg(short, long, value_name = "FILE", conflicts_with = "no_config", help = "Configuration file path")]
    pub config: Option<PathBuf>,

    #[arg(long, help = "Ignore the local configuration file")]
    pub no_config: bool,

    #[arg(long, value_name = "FILE", conflicts_with = "no_manifest", help = "Package manifest path")]
    pub manifest: Option<PathBuf>,

    #[arg(long, help = "Don't read the package manifest")]
    pub no_manifest: bool,
}

impl Cli {
    /// The configuration layer set by the flags.
    ///
    /// Flags that are off are left out, so they don't override configuration files.
    pub fn to_overrides(&self) -> Value {
        let mut overrides = Map::new();

        if let Some(increment) = self.increment.as_deref().filter(|i| !i.is_empty()) {
            overrides.insert("increment".to_string(), Value::from(increment));
        }

        match self.pre_release.as_deref() {
            Some("") => {
                overrides.insert("pre_release".to_string(), Value::Bool(true));
            }
            Some(id) => {
                overrides.insert("pre_release_id".to_string(), Value::from(id));
            }
            None => {}
        }

        let flags = [
            ("dry_run", self.dry_run),
            ("verbose", self.verbose),
            ("ci", self.ci),
            ("debug", self.debug),
            ("disable_metrics", self.no_metrics),
        ];
        for (key, is_set) in flags {
            if is_set {
                overrides.insert(key.to_string(), Value::Bool(true));
            }
        }

        Value::Object(overrides)
    }

    pub fn sources(&self, cwd: &Path) -> ConfigSources {
        let file_source = |path: &Option<PathBuf>, disabled: bool| match path {
            _ if disabled => FileSource::Disabled,
            Some(path) => FileSource::Path(path.clone()),
            None => FileSource::Default,
        };

        ConfigSources {
            config: file_source(&self.config, self.no_config),
            manifest: file_source(&self.manifest, self.no_manifest),
            ..ConfigSources::new(cwd)
        }
    }
}
