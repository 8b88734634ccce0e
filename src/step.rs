//! One unit of release work and the executor that runs it in either mode.
//!
//! Unattended, every enabled step runs with a spinner. Interactive, steps
//! carrying a [`PromptKind`] ask first; the others run as they are.

use crate::context::RuntimeContext;
use crate::error::Result;
use crate::ui::{Prompt, Spinner};

/// Confirmation questions of the interactive release phase
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptKind {
    Commit,
    Tag,
    Push,
    GitHubRelease,
    GitLabRelease,
    Publish,
}

impl PromptKind {
    /// The question, with option templates rendered against `ctx`
    pub fn question(&self, ctx: &RuntimeContext) -> String {
        let nested = |path: &str| ctx.render(ctx.get_str(path).unwrap_or_default());
        match self {
            PromptKind::Commit => format!("Commit ({})?", nested("git.commit_message")),
            PromptKind::Tag => format!("Tag ({})?", nested("git.tag_name")),
            PromptKind::Push => "Push?".to_string(),
            PromptKind::GitHubRelease => format!(
                "Create a release on GitHub ({})?",
                nested("github.release_name")
            ),
            PromptKind::GitLabRelease => format!(
                "Create a release on GitLab ({})?",
                nested("gitlab.release_name")
            ),
            PromptKind::Publish => {
                let name = nested("npm.name");
                match ctx.get_str("npm.tag").filter(|t| !t.is_empty() && *t != "latest") {
                    Some(tag) => format!("Publish {}@{} to npm?", name, tag),
                    None => format!("Publish {} to npm?", name),
                }
            }
        }
    }
}

pub type Task<'a> = Box<dyn FnOnce() -> Result<()> + 'a>;

pub struct Step<'a> {
    pub label: String,
    pub enabled: bool,
    pub task: Task<'a>,
    pub prompt: Option<PromptKind>,
    /// Hooks: shown with a spinner even in interactive mode
    pub forced: bool,
}

impl<'a> Step<'a> {
    pub fn new(label: impl Into<String>, task: impl FnOnce() -> Result<()> + 'a) -> Self {
        Step {
            label: label.into(),
            enabled: true,
            task: Box::new(task),
            prompt: None,
            forced: false,
        }
    }

    pub fn enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    pub fn prompt(mut self, kind: PromptKind) -> Self {
        self.prompt = Some(kind);
        self
    }

    pub fn forced(mut self) -> Self {
        self.forced = true;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    Skipped,
    Declined,
    Done,
}

pub struct StepExecutor<'p> {
    is_interactive: bool,
    spinner: Spinner,
    prompt: &'p dyn Prompt,
}

impl<'p> StepExecutor<'p> {
    pub fn new(is_interactive: bool, spinner: Spinner, prompt: &'p dyn Prompt) -> Self {
        StepExecutor {
            is_interactive,
            spinner,
            prompt,
        }
    }

    pub fn is_interactive(&self) -> bool {
        self.is_interactive
    }

    pub fn prompt(&self) -> &'p dyn Prompt {
        self.prompt
    }

    /// Run `step`; its errors come back unchanged
    pub fn run(&self, step: Step<'_>, ctx: &RuntimeContext) -> Result<StepOutcome> {
        if !step.enabled {
            tracing::debug!(step = %step.label, "step disabled");
            return Ok(StepOutcome::Skipped);
        }

        if let (true, Some(kind)) = (self.is_interactive, step.prompt) {
            let question = kind.question(ctx);
            if !self.prompt.confirm(&question, true)? {
                tracing::debug!(step = %step.label, "step declined");
                return Ok(StepOutcome::Declined);
            }
            (step.task)()?;
            return Ok(StepOutcome::Done);
        }

        self.spinner.show(&step.label, step.forced, step.task)?;
        Ok(StepOutcome::Done)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::GitReleaseError;
    use crate::ui::{Answer, ScriptedPrompt};
    use serde_json::json;
    use std::cell::Cell;

    fn context() -> RuntimeContext {
        let mut ctx = RuntimeContext::new();
        ctx.set_once("version", "1.2.4").unwrap();
        ctx.merge("git", json!({ "commit_message": "Release ${version}", "tag_name": "v${version}" }))
            .unwrap();
        ctx.merge("npm", json!({ "name": "pkg", "tag": "next" })).unwrap();
        ctx
    }

    #[test]
    fn test_questions_render_templates() {
        let ctx = context();
        assert_eq!(PromptKind::Commit.question(&ctx), "Commit (Release 1.2.4)?");
        assert_eq!(PromptKind::Tag.question(&ctx), "Tag (v1.2.4)?");
        assert_eq!(PromptKind::Publish.question(&ctx), "Publish pkg@next to npm?");
    }

    #[test]
    fn test_disabled_step_is_skipped() {
        let prompt = ScriptedPrompt::default();
        let executor = StepExecutor::new(false, Spinner::hidden(), &prompt);
        let ran = Cell::new(false);

        let step = Step::new("Git push", || {
            ran.set(true);
            Ok(())
        })
        .enabled(false);
        assert_eq!(executor.run(step, &context()).unwrap(), StepOutcome::Skipped);
        assert!(!ran.get());
    }

    #[test]
    fn test_unattended_runs_without_asking() {
        let prompt = ScriptedPrompt::default();
        let executor = StepExecutor::new(false, Spinner::hidden(), &prompt);
        let ran = Cell::new(false);

        let step = Step::new("Git commit", || {
            ran.set(true);
            Ok(())
        })
        .prompt(PromptKind::Commit);
        assert_eq!(executor.run(step, &context()).unwrap(), StepOutcome::Done);
        assert!(ran.get());
        assert!(prompt.asked().is_empty());
    }

    #[test]
    fn test_interactive_declined() {
        let prompt = ScriptedPrompt::new([Answer::Confirm(false)]);
        let executor = StepExecutor::new(true, Spinner::hidden(), &prompt);
        let ran = Cell::new(false);

        let step = Step::new("Git tag", || {
            ran.set(true);
            Ok(())
        })
        .prompt(PromptKind::Tag);
        assert_eq!(executor.run(step, &context()).unwrap(), StepOutcome::Declined);
        assert!(!ran.get());
        assert_eq!(prompt.asked(), vec!["Tag (v1.2.4)?".to_string()]);
    }

    #[test]
    fn test_interactive_step_without_prompt_runs() {
        let prompt = ScriptedPrompt::default();
        let executor = StepExecutor::new(true, Spinner::hidden(), &prompt);
        let ran = Cell::new(false);

        let step = Step::new("npm run build", || {
            ran.set(true);
            Ok(())
        })
        .forced();
        assert_eq!(executor.run(step, &context()).unwrap(), StepOutcome::Done);
        assert!(ran.get());
        assert!(prompt.asked().is_empty());
    }

    #[test]
    fn test_errors_propagate_unchanged() {
        let prompt = ScriptedPrompt::default();
        let executor = StepExecutor::new(false, Spinner::hidden(), &prompt);
        let step = Step::new("Git push", || Err(GitReleaseError::NoUpstream));
        assert!(matches!(
            executor.run(step, &context()),
            Err(GitReleaseError::NoUpstream)
        ));
    }
}
