//! Lifecycle hooks for extensibility
//!
//! Users can run commands at key workflow points:
//! - before_start: Before anything else
//! - before_bump / after_bump: Around the manifest version bump
//! - before_stage: Before changes are staged for the release commit
//! - after_release: After the release phase of a repository

pub mod executor;
pub mod lifecycle;

pub use executor::HookExecutor;
pub use lifecycle::{Hook, HookContext};
