pub mod analyzer;
pub mod changelog;
pub mod cli;
pub mod config;
pub mod context;
pub mod domain;
pub mod error;
pub mod git;
pub mod hooks;
pub mod hosted;
pub mod metrics;
pub mod registry;
pub mod release;
pub mod resolver;
pub mod shell;
pub mod step;
pub mod ui;
pub mod warning;

pub use error::{GitReleaseError, Result};
pub use release::{Orchestrator, ReleaseResult};
