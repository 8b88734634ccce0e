//! Resolution of the version to release.
//!
//! [`VersionResolver`] moves through three states: the latest version is
//! picked, the next version is computed from an increment (or assigned), and
//! finally validated. After validation the state no longer changes.

use semver::Version;
use serde::Serialize;

use crate::config::VersionSource;
use crate::domain::{increment, parse_version, Increment, PreRelease, ReleaseType, TagPattern};
use crate::error::{GitReleaseError, Result};
use crate::warning::ReleaseWarning;

const INITIAL_VERSION: &str = "0.0.0";

/// Version facts of one release run
#[derive(Debug, Clone)]
struct VersionState {
    latest_version: String,
    version: Option<String>,
    pre_release_id: Option<String>,
    is_pre_release: bool,
}

/// The validated outcome published to the runtime context
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VersionDetails {
    pub latest_version: String,
    pub version: String,
    pub is_pre_release: bool,
    pub pre_release_id: Option<String>,
}

/// When the changelog is generated relative to the manifest bump
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangelogTiming {
    BeforeBump,
    /// The increment is a recommendation, so the log is read once the bump is done
    AfterBump,
}

impl ChangelogTiming {
    pub fn for_increment(increment: Option<&Increment>) -> Self {
        match increment {
            Some(inc) if inc.is_recommendation() => ChangelogTiming::AfterBump,
            _ => ChangelogTiming::BeforeBump,
        }
    }
}

pub struct VersionResolver {
    state: VersionState,
    tag_pattern: TagPattern,
    is_validated: bool,
}

impl VersionResolver {
    /// `tag_pattern` is the configured tag name, used to read versions back out of tags
    pub fn new(pre_release_id: Option<String>, tag_pattern: TagPattern) -> Self {
        VersionResolver {
            state: VersionState {
                latest_version: INITIAL_VERSION.to_string(),
                version: None,
                pre_release_id: pre_release_id.filter(|id| !id.is_empty()),
                is_pre_release: false,
            },
            tag_pattern,
            is_validated: false,
        }
    }

    pub fn latest_version(&self) -> &str {
        &self.state.latest_version
    }

    pub fn version(&self) -> Option<&str> {
        self.state.version.as_deref()
    }

    /// Pick the version the release starts from.
    ///
    /// An explicit `source` wins. Without one, the latest tag counts only at
    /// the repository root and the manifest version otherwise. Candidates
    /// that don't parse are skipped; with none left it is `0.0.0`.
    pub fn set_latest_version(
        &mut self,
        source: Option<VersionSource>,
        git_tag: Option<&str>,
        manifest_version: Option<&str>,
        is_root_dir: bool,
    ) -> Vec<ReleaseWarning> {
        let mut warnings = Vec::new();
        let tag_version = git_tag.and_then(|tag| {
            let version = self.tag_pattern.extract_version(tag);
            if version.is_none() {
                warnings.push(ReleaseWarning::UnparsableTag {
                    tag: tag.to_string(),
                });
            }
            version
        });
        let manifest_version = manifest_version.and_then(parse_version);

        let latest = match source {
            Some(VersionSource::GitTag) => tag_version.or(manifest_version),
            Some(VersionSource::Manifest) => manifest_version.or(tag_version),
            None if is_root_dir => tag_version.or(manifest_version),
            None => manifest_version,
        };

        self.state.latest_version = latest
            .map(|v| v.to_string())
            .unwrap_or_else(|| INITIAL_VERSION.to_string());
        tracing::debug!(latest_version = %self.state.latest_version, ?source, is_root_dir, "latest version");
        warnings
    }

    /// Compute the next version.
    ///
    /// With `wants_pre_release` a plain keyword becomes its `pre*` form, or
    /// `prerelease` when the latest version already is one. Without an
    /// increment only a pre-release request produces a version. A
    /// `conventional` increment must be turned into a keyword first.
    pub fn bump(&mut self, requested: Option<&Increment>, wants_pre_release: bool) -> Result<()> {
        if self.is_validated {
            return Err(GitReleaseError::invalid_version(
                "the version was already validated",
            ));
        }

        let release = match requested {
            Some(Increment::Exact(version)) => return self.assign(version.clone()),
            Some(Increment::Conventional) => {
                return Err(GitReleaseError::invalid_version(
                    "a conventional increment needs a recommendation",
                ))
            }
            Some(Increment::Release(release)) => *release,
            None if wants_pre_release => ReleaseType::PreRelease,
            None => return Ok(()),
        };

        let latest = self.parsed_latest()?;
        let release = match release {
            r if !wants_pre_release || r.is_pre() => r,
            _ if !latest.pre.is_empty() => ReleaseType::PreRelease,
            r => r.to_pre(),
        };
        let pre_id = if release.is_pre() {
            self.state.pre_release_id.as_deref()
        } else {
            None
        };

        let next = increment(&latest, release, pre_id)?;
        tracing::debug!(%latest, %release, %next, "bumped version");
        self.assign(next)
    }

    /// Assign an explicit version, as typed by the user
    pub fn set_version(&mut self, version: &str) -> Result<()> {
        let parsed = parse_version(version)
            .ok_or_else(|| GitReleaseError::invalid_version(format!("\"{}\"", version)))?;
        self.assign(parsed)
    }

    fn assign(&mut self, version: Version) -> Result<()> {
        if self.is_validated {
            return Err(GitReleaseError::invalid_version(
                "the version was already validated",
            ));
        }
        self.state.is_pre_release = !version.pre.is_empty();
        if self.state.is_pre_release {
            if let Some(id) = PreRelease::from_semver(&version.pre).identifier() {
                self.state.pre_release_id = Some(id.to_string());
            }
        }
        self.state.version = Some(version.to_string());
        Ok(())
    }

    fn parsed_latest(&self) -> Result<Version> {
        parse_version(&self.state.latest_version).ok_or_else(|| {
            GitReleaseError::invalid_version(format!("\"{}\"", self.state.latest_version))
        })
    }

    /// Require a version strictly greater than the latest one. Repeatable.
    pub fn validate(&mut self) -> Result<VersionDetails> {
        let Some(version) = self.state.version.as_deref() else {
            return Err(GitReleaseError::invalid_version(format!(
                "no version to release after {}",
                self.state.latest_version
            )));
        };
        let next = parse_version(version)
            .ok_or_else(|| GitReleaseError::invalid_version(format!("\"{}\"", version)))?;
        let latest = self.parsed_latest()?;
        if next <= latest {
            return Err(GitReleaseError::invalid_version(format!(
                "{} is not greater than {}",
                next, latest
            )));
        }

        self.is_validated = true;
        Ok(VersionDetails {
            latest_version: self.state.latest_version.clone(),
            version: next.to_string(),
            is_pre_release: self.state.is_pre_release,
            pre_release_id: self.state.pre_release_id.clone().filter(|_| self.state.is_pre_release),
        })
    }

    /// What each keyword would produce from the latest version, for the
    /// interactive increment list
    pub fn previews(&self, wants_pre_release: bool) -> Vec<(ReleaseType, String)> {
        let Ok(latest) = self.parsed_latest() else {
            return Vec::new();
        };
        let pre_id = self.state.pre_release_id.as_deref();
        ReleaseType::ALL
            .iter()
            .filter(|r| !wants_pre_release || r.is_pre())
            .filter_map(|r| {
                let id = if r.is_pre() { pre_id } else { None };
                increment(&latest, *r, id).ok().map(|v| (*r, v.to_string()))
            })
            .collect()
    }
}
