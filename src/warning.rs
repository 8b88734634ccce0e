use std::fmt;

/// Non-fatal issues met during a release run.
/// These are reported to the user and the run continues.
#[derive(Debug, Clone, PartialEq)]
pub enum ReleaseWarning {
    /// A version file could not be read or rewritten
    BumpFailed { file: String },
    /// A file could not be added to the index
    StageFailed { file: String },
    /// The latest tag does not carry a semantic version
    UnparsableTag { tag: String },
    /// Staging produced no changes, so the commit step had nothing to record
    NothingToCommit,
    /// The manifest is marked private and will not be published
    PrivatePackage { name: String },
}

impl fmt::Display for ReleaseWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReleaseWarning::BumpFailed { file } => write!(f, "Could not bump {}", file),
            ReleaseWarning::StageFailed { file } => write!(f, "Could not stage {}", file),
            ReleaseWarning::UnparsableTag { tag } => {
                write!(f, "Cannot parse version from tag '{}'", tag)
            }
            ReleaseWarning::NothingToCommit => {
                write!(f, "No changes to commit. The latest commit will be tagged.")
            }
            ReleaseWarning::PrivatePackage { name } => {
                write!(f, "Skip publish: package {} is private.", name)
            }
        }
    }
}
