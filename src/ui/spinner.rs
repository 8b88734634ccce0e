use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};

/// Progress indication for steps that run without user confirmation.
///
/// Disabled in interactive, verbose, dry-run and debug mode, and when stderr
/// is not attended. Forced steps (hooks) still show it in interactive mode.
#[derive(Debug, Clone)]
pub struct Spinner {
    is_interactive: bool,
    is_disabled: bool,
}

impl Spinner {
    pub fn new(is_interactive: bool, is_verbose: bool, is_dry_run: bool, is_debug: bool) -> Self {
        Spinner {
            is_interactive,
            is_disabled: is_interactive
                || is_verbose
                || is_dry_run
                || is_debug
                || !console::user_attended_stderr(),
        }
    }

    pub fn hidden() -> Self {
        Spinner {
            is_interactive: false,
            is_disabled: true,
        }
    }

    pub fn is_visible(&self, forced: bool) -> bool {
        !self.is_disabled || (forced && self.is_interactive)
    }

    /// Run `task`, showing `label` next to a spinner while it is busy
    pub fn show<T, E>(
        &self,
        label: &str,
        forced: bool,
        task: impl FnOnce() -> Result<T, E>,
    ) -> Result<T, E> {
        if !self.is_visible(forced) {
            return task();
        }

        let pb = ProgressBar::new_spinner();
        let spinner_style = ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner());
        pb.set_style(spinner_style);
        pb.set_message(label.to_string());
        pb.enable_steady_tick(Duration::from_millis(80));

        let result = task();
        match &result {
            Ok(_) => pb.finish_with_message(format!("✔ {}", label)),
            Err(_) => pb.abandon_with_message(format!("✖ {}", label)),
        }
        result
    }
}
