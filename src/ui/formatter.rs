//! User-facing output.
//!
//! `Logger` is the only place that writes release progress to the terminal.
//! Diagnostics go through `tracing` instead.

use std::sync::{Arc, Mutex};

use console::style;

use crate::warning::ReleaseWarning;

/// Lines shown by [`Logger::preview`] before truncation
const PREVIEW_MAX_LINES: usize = 20;

/// Lines recorded by a capturing [`Logger`]
#[derive(Debug, Clone, Default)]
pub struct CaptureBuffer {
    lines: Arc<Mutex<Vec<String>>>,
}

impl CaptureBuffer {
    fn push(&self, line: String) {
        if let Ok(mut lines) = self.lines.lock() {
            lines.push(line);
        }
    }

    pub fn lines(&self) -> Vec<String> {
        self.lines.lock().map(|l| l.clone()).unwrap_or_default()
    }

    pub fn contents(&self) -> String {
        self.lines().join("\n")
    }

    pub fn contains(&self, needle: &str) -> bool {
        self.lines().iter().any(|line| line.contains(needle))
    }
}

#[derive(Debug, Clone)]
enum Sink {
    Terminal,
    Capture(CaptureBuffer),
}

/// Prints release progress, warnings and the would-be commands of a dry run
#[derive(Debug, Clone)]
pub struct Logger {
    sink: Sink,
    is_interactive: bool,
    is_verbose: bool,
    is_dry_run: bool,
}

impl Logger {
    pub fn new(is_interactive: bool, is_verbose: bool, is_dry_run: bool) -> Self {
        Logger {
            sink: Sink::Terminal,
            is_interactive,
            is_verbose,
            is_dry_run,
        }
    }

    /// A logger that records plain, unstyled lines instead of printing them
    pub fn capture(is_interactive: bool, is_verbose: bool, is_dry_run: bool) -> (Self, CaptureBuffer) {
        let buffer = CaptureBuffer::default();
        let logger = Logger {
            sink: Sink::Capture(buffer.clone()),
            is_interactive,
            is_verbose,
            is_dry_run,
        };
        (logger, buffer)
    }

    pub fn is_dry_run(&self) -> bool {
        self.is_dry_run
    }

    pub fn is_verbose(&self) -> bool {
        self.is_verbose
    }

    fn out(&self, plain: String, styled: String) {
        match &self.sink {
            Sink::Terminal => println!("{}", styled),
            Sink::Capture(buffer) => buffer.push(plain),
        }
    }

    fn err(&self, plain: String, styled: String) {
        match &self.sink {
            Sink::Terminal => eprintln!("{}", styled),
            Sink::Capture(buffer) => buffer.push(plain),
        }
    }

    pub fn log(&self, message: &str) {
        self.out(message.to_string(), message.to_string());
    }

    pub fn warn(&self, message: &str) {
        self.err(
            format!("WARNING {}", message),
            format!("{} {}", style("WARNING").yellow(), message),
        );
    }

    pub fn warning(&self, warning: &ReleaseWarning) {
        self.warn(&warning.to_string());
    }

    pub fn error(&self, message: &str) {
        self.err(
            format!("ERROR {}", message),
            format!("{} {}", style("ERROR").red(), message),
        );
    }

    /// Echo a command about to run; only visible in verbose and dry-run mode
    pub fn exec(&self, command: &str) {
        if self.is_verbose || self.is_dry_run {
            self.out(format!("$ {}", command), style(format!("$ {}", command)).dim().to_string());
        }
    }

    /// Mark the previously echoed command as skipped
    pub fn dry(&self) {
        let message = "! not executed in dry run";
        self.out(message.to_string(), style(message).dim().to_string());
    }

    /// Show a titled block of text such as a changelog or changeset.
    ///
    /// Long text is cut to the first lines with a count of the remainder.
    pub fn preview(&self, title: &str, text: &str) {
        if text.trim().is_empty() || !(self.is_interactive || self.is_verbose || self.is_dry_run) {
            return;
        }

        let lines: Vec<&str> = text.lines().collect();
        let mut body = lines
            .iter()
            .take(PREVIEW_MAX_LINES)
            .copied()
            .collect::<Vec<_>>()
            .join("\n");
        if lines.len() > PREVIEW_MAX_LINES {
            body.push_str(&format!(
                "\n...truncated {} more lines",
                lines.len() - PREVIEW_MAX_LINES
            ));
        }

        let heading = capitalize(title);
        self.out(
            format!("{}:\n{}", heading, body),
            format!("{}:\n{}", style(heading).bold().underlined(), body),
        );
    }
}

fn capitalize(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
