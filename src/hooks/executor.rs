use crate::context::RuntimeContext;
use crate::error::Result;
use crate::hooks::{Hook, HookContext};
use crate::shell::Shell;

/// Executes lifecycle hook commands
pub struct HookExecutor;

impl HookExecutor {
    /// Execute a hook command with the given context
    ///
    /// The command is rendered against the runtime context and run through
    /// the shell with `GIT_RELEASE_*` environment variables set. Hooks count
    /// as writes, so a dry run only echoes them.
    ///
    /// # Returns
    /// * `Ok(String)` - The command's output
    /// * `Err` - If the command exits with a non-zero code
    pub fn execute(shell: &Shell, hook: Hook, command: &str, ctx: &RuntimeContext) -> Result<String> {
        let hook_context = HookContext::from_runtime(hook, ctx, shell.is_dry_run());
        tracing::debug!(hook = hook.name(), command, "running hook");
        shell.run_template_command(command, ctx, &hook_context.to_env_vars())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ui::Logger;
    use tempfile::TempDir;

    #[test]
    fn test_hook_sees_env_and_template() {
        let dir = TempDir::new().unwrap();
        let (logger, _) = Logger::capture(false, false, false);
        let shell = Shell::new(dir.path(), logger);
        let mut ctx = RuntimeContext::new();
        ctx.set_once("name", "pkg").unwrap();
        ctx.set_once("version", "2.0.0").unwrap();

        let out = HookExecutor::execute(
            &shell,
            Hook::AfterBump,
            "echo ${name} $GIT_RELEASE_VERSION $GIT_RELEASE_HOOK",
            &ctx,
        )
        .unwrap();
        assert_eq!(out, "pkg 2.0.0 after_bump");
    }

    #[test]
    fn test_failing_hook_is_error() {
        let dir = TempDir::new().unwrap();
        let (logger, _) = Logger::capture(false, false, false);
        let shell = Shell::new(dir.path(), logger);

        let result = HookExecutor::execute(&shell, Hook::BeforeStart, "exit 1", &RuntimeContext::new());
        assert!(result.is_err());
    }

    #[test]
    fn test_dry_run_hook_not_executed() {
        let dir = TempDir::new().unwrap();
        let (logger, buffer) = Logger::capture(false, false, true);
        let shell = Shell::new(dir.path(), logger);

        HookExecutor::execute(&shell, Hook::BeforeStage, "touch hooked", &RuntimeContext::new())
            .unwrap();
        assert!(!dir.path().join("hooked").exists());
        assert!(buffer.contains("$ touch hooked"));
    }
}
