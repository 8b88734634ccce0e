use std::path::PathBuf;

use thiserror::Error;

/// Unified error type for git-release operations
#[derive(Error, Debug)]
pub enum GitReleaseError {
    #[error("Not a git repository: {0}")]
    RepoNotFound(String),

    #[error("Could not get remote Git url. Please add a remote repository.")]
    RemoteUrlMissing,

    #[error("Working dir must be clean. Please stage and commit your changes.")]
    CleanWorkingDir,

    #[error("No upstream configured for current branch. Please set an upstream branch.")]
    NoUpstream,

    #[error("Environment variable \"{env_var}\" is required for {service} releases.")]
    TokenMissing { service: String, env_var: String },

    #[error("An invalid version was provided: {0}")]
    InvalidVersion(String),

    #[error("`dist.stage_dir` (\"{0}\") must resolve to a sub directory of the working directory.")]
    DistStageDir(String),

    #[error("File not found: {}", .0.display())]
    ConfigFileNotFound(PathBuf),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Command failed: {command}\n{output}")]
    Command { command: String, output: String },

    #[error("{service} request failed: {message}")]
    Http { service: String, message: String },

    #[error("Git operation failed: {0}")]
    Git(#[from] git2::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience type alias for Results in git-release
pub type Result<T> = std::result::Result<T, GitReleaseError>;

impl GitReleaseError {
    /// Create a configuration error with context
    pub fn config(msg: impl Into<String>) -> Self {
        GitReleaseError::Config(msg.into())
    }

    /// Create an invalid-version error with context
    pub fn invalid_version(msg: impl Into<String>) -> Self {
        GitReleaseError::InvalidVersion(msg.into())
    }

    /// Create a subprocess failure
    pub fn command(command: impl Into<String>, output: impl Into<String>) -> Self {
        GitReleaseError::Command {
            command: command.into(),
            output: output.into(),
        }
    }

    /// Create an HTTP failure for the named service
    pub fn http(service: impl Into<String>, message: impl Into<String>) -> Self {
        GitReleaseError::Http {
            service: service.into(),
            message: message.into(),
        }
    }

    pub fn token_missing(service: impl Into<String>, env_var: impl Into<String>) -> Self {
        GitReleaseError::TokenMissing {
            service: service.into(),
            env_var: env_var.into(),
        }
    }

    /// Whether this error was raised by a pre-flight validation rather than a step
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            GitReleaseError::RepoNotFound(_)
                | GitReleaseError::RemoteUrlMissing
                | GitReleaseError::CleanWorkingDir
                | GitReleaseError::NoUpstream
                | GitReleaseError::TokenMissing { .. }
                | GitReleaseError::InvalidVersion(_)
                | GitReleaseError::DistStageDir(_)
                | GitReleaseError::ConfigFileNotFound(_)
        )
    }
}

impl From<serde_json::Error> for GitReleaseError {
    fn from(err: serde_json::Error) -> Self {
        GitReleaseError::Config(err.to_string())
    }
}

impl From<toml::de::Error> for GitReleaseError {
    fn from(err: toml::de::Error) -> Self {
        GitReleaseError::Config(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = GitReleaseError::config("test config issue");
        assert_eq!(err.to_string(), "Configuration error: test config issue");
    }

    #[test]
    fn test_error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: GitReleaseError = io_err.into();
        assert!(err.to_string().contains("I/O error"));
    }

    #[test]
    fn test_token_missing_names_env_var() {
        let err = GitReleaseError::token_missing("GitHub", "GITHUB_FOO");
        assert_eq!(
            err.to_string(),
            "Environment variable \"GITHUB_FOO\" is required for GitHub releases."
        );
    }

    #[test]
    fn test_invalid_version_message() {
        let err = GitReleaseError::invalid_version("mini");
        assert!(err.to_string().contains("invalid version was provided"));
    }

    #[test]
    fn test_dist_stage_dir_message() {
        let err = GitReleaseError::DistStageDir("..".to_string());
        assert!(err.to_string().contains("(\"..\") must resolve to a sub directory"));
    }

    #[test]
    fn test_validation_classification() {
        assert!(GitReleaseError::CleanWorkingDir.is_validation());
        assert!(GitReleaseError::NoUpstream.is_validation());
        assert!(GitReleaseError::invalid_version("x").is_validation());
        assert!(!GitReleaseError::command("git push", "rejected").is_validation());
        assert!(!GitReleaseError::http("GitHub", "502").is_validation());
    }

    #[test]
    fn test_command_error_includes_output() {
        let err = GitReleaseError::command("git push", "fatal: rejected");
        let msg = err.to_string();
        assert!(msg.starts_with("Command failed: git push"));
        assert!(msg.contains("fatal: rejected"));
    }

    #[test]
    fn test_toml_error_conversion() {
        let toml_err = toml::from_str::<toml::Value>("= broken").unwrap_err();
        let err: GitReleaseError = toml_err.into();
        assert!(err.to_string().starts_with("Configuration error"));
    }
}
