use std::fmt;
use std::str::FromStr;

use semver::{BuildMetadata, Prerelease, Version};

use super::prerelease::PreRelease;
use crate::error::{GitReleaseError, Result};

/// Semver increment kinds, with node-semver `inc` semantics
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReleaseType {
    Major,
    Minor,
    Patch,
    PreMajor,
    PreMinor,
    PrePatch,
    PreRelease,
}

impl ReleaseType {
    /// Every keyword, in the order the interactive increment list shows them
    pub const ALL: [ReleaseType; 7] = [
        ReleaseType::Patch,
        ReleaseType::Minor,
        ReleaseType::Major,
        ReleaseType::PrePatch,
        ReleaseType::PreMinor,
        ReleaseType::PreMajor,
        ReleaseType::PreRelease,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            ReleaseType::Major => "major",
            ReleaseType::Minor => "minor",
            ReleaseType::Patch => "patch",
            ReleaseType::PreMajor => "premajor",
            ReleaseType::PreMinor => "preminor",
            ReleaseType::PrePatch => "prepatch",
            ReleaseType::PreRelease => "prerelease",
        }
    }

    pub fn is_pre(&self) -> bool {
        matches!(
            self,
            ReleaseType::PreMajor
                | ReleaseType::PreMinor
                | ReleaseType::PrePatch
                | ReleaseType::PreRelease
        )
    }

    /// The `pre*` counterpart of a plain keyword
    pub fn to_pre(self) -> Self {
        match self {
            ReleaseType::Major => ReleaseType::PreMajor,
            ReleaseType::Minor => ReleaseType::PreMinor,
            ReleaseType::Patch => ReleaseType::PrePatch,
            other => other,
        }
    }
}

impl fmt::Display for ReleaseType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Version bump type decided by commit analysis
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VersionBump {
    Major,
    Minor,
    Patch,
}

impl From<VersionBump> for ReleaseType {
    fn from(bump: VersionBump) -> Self {
        match bump {
            VersionBump::Major => ReleaseType::Major,
            VersionBump::Minor => ReleaseType::Minor,
            VersionBump::Patch => ReleaseType::Patch,
        }
    }
}

/// A requested increment: a keyword, a recommendation, or an exact version
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Increment {
    Release(ReleaseType),
    /// Derived from conventional commit messages since the latest tag
    Conventional,
    Exact(Version),
}

impl Increment {
    pub fn parse(s: &str) -> Result<Self> {
        s.parse()
    }

    pub fn is_recommendation(&self) -> bool {
        matches!(self, Increment::Conventional)
    }
}

impl FromStr for Increment {
    type Err = GitReleaseError;

    fn from_str(s: &str) -> Result<Self> {
        let trimmed = s.trim();
        let lowered = trimmed.to_lowercase();

        if let Some(release) = ReleaseType::ALL.iter().find(|r| r.name() == lowered) {
            return Ok(Increment::Release(*release));
        }

        if lowered == "conventional" || lowered.starts_with("conventional:") {
            return Ok(Increment::Conventional);
        }

        parse_version(trimmed)
            .map(Increment::Exact)
            .ok_or_else(|| GitReleaseError::invalid_version(format!("\"{}\"", s)))
    }
}

impl fmt::Display for Increment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Increment::Release(release) => write!(f, "{}", release),
            Increment::Conventional => write!(f, "conventional"),
            Increment::Exact(version) => write!(f, "{}", version),
        }
    }
}

/// Parse a version string, tolerating surrounding whitespace and a `v` prefix
pub fn parse_version(s: &str) -> Option<Version> {
    let clean = s.trim().trim_start_matches('v').trim_start_matches('V');
    Version::parse(clean).ok()
}

/// Compute the next version for `release`, optionally tagging pre-releases with `pre_id`
pub fn increment(version: &Version, release: ReleaseType, pre_id: Option<&str>) -> Result<Version> {
    let mut next = version.clone();
    next.build = BuildMetadata::EMPTY;

    match release {
        ReleaseType::Major => {
            // 2.0.0-rc.1 -> 2.0.0
            if next.minor != 0 || next.patch != 0 || next.pre.is_empty() {
                next.major += 1;
            }
            next.minor = 0;
            next.patch = 0;
            next.pre = Prerelease::EMPTY;
        }
        ReleaseType::Minor => {
            if next.patch != 0 || next.pre.is_empty() {
                next.minor += 1;
            }
            next.patch = 0;
            next.pre = Prerelease::EMPTY;
        }
        ReleaseType::Patch => {
            if next.pre.is_empty() {
                next.patch += 1;
            }
            next.pre = Prerelease::EMPTY;
        }
        ReleaseType::PreMajor => {
            next.major += 1;
            next.minor = 0;
            next.patch = 0;
            next.pre = PreRelease::default().next(pre_id)?.to_semver()?;
        }
        ReleaseType::PreMinor => {
            next.minor += 1;
            next.patch = 0;
            next.pre = PreRelease::default().next(pre_id)?.to_semver()?;
        }
        ReleaseType::PrePatch => {
            next.patch += 1;
            next.pre = PreRelease::default().next(pre_id)?.to_semver()?;
        }
        ReleaseType::PreRelease => {
            if next.pre.is_empty() {
                next.patch += 1;
            }
            next.pre = PreRelease::from_semver(&next.pre)
                .next(pre_id)?
                .to_semver()?;
        }
    }

    Ok(next)
}
