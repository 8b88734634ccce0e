//! Domain logic - pure versioning rules independent of git or the network

pub mod commit;
pub mod prerelease;
pub mod tag;
pub mod version;

pub use commit::ParsedCommit;
pub use prerelease::PreRelease;
pub use tag::TagPattern;
pub use version::{increment, parse_version, Increment, ReleaseType, VersionBump};
