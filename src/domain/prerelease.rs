//! Pre-release identifier handling
//!
//! A pre-release such as `alpha.3` is treated as a list of dot-separated
//! identifiers. Bumping increments the last numeric identifier and, when a
//! different identifier is requested, restarts the counter at `<id>.0`.
//! According to semver.org: https://semver.org/#spec-item-9

use std::fmt;

use semver::Prerelease;

use crate::error::{GitReleaseError, Result};

/// Pre-release version split into its dot-separated identifiers
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PreRelease {
    identifiers: Vec<String>,
}

fn is_numeric(part: &str) -> bool {
    !part.is_empty() && part.chars().all(|c| c.is_ascii_digit())
}

/// Check that a user-supplied identifier is usable in a semver pre-release
pub fn validate_identifier(id: &str) -> Result<()> {
    if id.is_empty() {
        return Err(GitReleaseError::invalid_version(
            "Empty pre-release identifier",
        ));
    }

    if !id.chars().all(|c| c.is_ascii_alphanumeric() || c == '-') {
        return Err(GitReleaseError::invalid_version(format!(
            "Invalid pre-release identifier: '{}'",
            id
        )));
    }

    Ok(())
}

impl PreRelease {
    pub fn from_semver(pre: &Prerelease) -> Self {
        if pre.is_empty() {
            return PreRelease::default();
        }

        PreRelease {
            identifiers: pre.as_str().split('.').map(str::to_string).collect(),
        }
    }

    /// The leading non-numeric identifier (`alpha` in `alpha.3`)
    pub fn identifier(&self) -> Option<&str> {
        self.identifiers
            .first()
            .map(String::as_str)
            .filter(|first| !is_numeric(first))
    }

    /// The trailing counter (`3` in `alpha.3`)
    pub fn counter(&self) -> Option<u64> {
        self.identifiers
            .iter()
            .rev()
            .find(|part| is_numeric(part))
            .and_then(|part| part.parse().ok())
    }

    pub fn is_empty(&self) -> bool {
        self.identifiers.is_empty()
    }

    /// Next pre-release in the sequence, optionally switching to identifier `id`
    pub fn next(&self, id: Option<&str>) -> Result<Self> {
        let mut identifiers = self.identifiers.clone();

        if identifiers.is_empty() {
            identifiers.push("0".to_string());
        } else {
            match identifiers.iter().rposition(|part| is_numeric(part)) {
                Some(index) => {
                    let current: u64 = identifiers[index].parse().map_err(|_| {
                        GitReleaseError::invalid_version(format!(
                            "Pre-release counter out of range: '{}'",
                            identifiers[index]
                        ))
                    })?;
                    identifiers[index] = (current + 1).to_string();
                }
                None => identifiers.push("0".to_string()),
            }
        }

        if let Some(id) = id.filter(|id| !id.is_empty()) {
            validate_identifier(id)?;
            let keeps_counter =
                identifiers[0] == id && identifiers.get(1).is_some_and(|part| is_numeric(part));
            if !keeps_counter {
                identifiers = vec![id.to_string(), "0".to_string()];
            }
        }

        Ok(PreRelease { identifiers })
    }

    pub fn to_semver(&self) -> Result<Prerelease> {
        Prerelease::new(&self.to_string()).map_err(|e| {
            GitReleaseError::invalid_version(format!("Invalid pre-release '{}': {}", self, e))
        })
    }
}

impl fmt::Display for PreRelease {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.identifiers.join("."))
    }
}
