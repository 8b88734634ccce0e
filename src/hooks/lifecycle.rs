use std::collections::HashMap;

use crate::config::{DistScripts, Scripts};
use crate::context::RuntimeContext;

/// Points in the release workflow where a user command may run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Hook {
    BeforeStart,
    BeforeBump,
    AfterBump,
    BeforeStage,
    AfterRelease,
}

impl Hook {
    /// Get the hook name as a string
    pub fn name(&self) -> &'static str {
        match self {
            Hook::BeforeStart => "before_start",
            Hook::BeforeBump => "before_bump",
            Hook::AfterBump => "after_bump",
            Hook::BeforeStage => "before_stage",
            Hook::AfterRelease => "after_release",
        }
    }

    /// The configured command for this hook, if any
    pub fn command<'a>(&self, scripts: &'a Scripts) -> Option<&'a str> {
        let command = match self {
            Hook::BeforeStart => scripts.before_start.as_deref(),
            Hook::BeforeBump => scripts.before_bump.as_deref(),
            Hook::AfterBump => scripts.after_bump.as_deref(),
            Hook::BeforeStage => scripts.before_stage.as_deref(),
            Hook::AfterRelease => scripts.after_release.as_deref(),
        };
        command.filter(|c| !c.trim().is_empty())
    }

    /// The distribution repository only runs `before_stage` and `after_release`
    pub fn dist_command<'a>(&self, scripts: &'a DistScripts) -> Option<&'a str> {
        let command = match self {
            Hook::BeforeStage => scripts.before_stage.as_deref(),
            Hook::AfterRelease => scripts.after_release.as_deref(),
            _ => None,
        };
        command.filter(|c| !c.trim().is_empty())
    }
}

/// Context information passed to a hook
#[derive(Debug, Clone)]
pub struct HookContext {
    /// Hook being executed
    pub hook: Hook,
    /// Release name
    pub name: String,
    /// Version before this release
    pub latest_version: Option<String>,
    /// Version being released, once resolved
    pub version: Option<String>,
    pub dry_run: bool,
}

impl HookContext {
    /// Collect what a hook can know from the runtime context at this point
    pub fn from_runtime(hook: Hook, ctx: &RuntimeContext, dry_run: bool) -> Self {
        HookContext {
            hook,
            name: ctx.get_str("name").unwrap_or_default().to_string(),
            latest_version: ctx.get_str("latest_version").map(str::to_string),
            version: ctx.get_str("version").map(str::to_string),
            dry_run,
        }
    }

    /// Convert context to environment variables for the hook command
    ///
    /// Maps context fields to GIT_RELEASE_* environment variables
    pub fn to_env_vars(&self) -> HashMap<String, String> {
        let mut env = HashMap::new();

        env.insert("GIT_RELEASE_HOOK".to_string(), self.hook.name().to_string());
        env.insert("GIT_RELEASE_NAME".to_string(), self.name.clone());
        env.insert("GIT_RELEASE_DRY_RUN".to_string(), self.dry_run.to_string());

        if let Some(ref latest) = self.latest_version {
            env.insert("GIT_RELEASE_LATEST_VERSION".to_string(), latest.clone());
        }

        if let Some(ref version) = self.version {
            env.insert("GIT_RELEASE_VERSION".to_string(), version.clone());
        }

        env
    }
}
