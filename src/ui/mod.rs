//! User interface module - interaction (prompts), output and progress.
//!
//! Separates concerns:
//! - `formatter` - The `Logger` writing release progress
//! - `spinner` - Progress indication for unattended steps
//! - This module - Interactive prompts and user input handling

use std::collections::VecDeque;
use std::io::{self, Write};
use std::sync::Mutex;

use crate::error::{GitReleaseError, Result};

pub mod formatter;
pub mod spinner;

pub use formatter::{CaptureBuffer, Logger};
pub use spinner::Spinner;

/// Questions the release flow asks the user
pub trait Prompt {
    /// Yes/no question; `default` applies on empty input
    fn confirm(&self, question: &str, default: bool) -> Result<bool>;

    /// Choose one entry; returns its index
    fn select(&self, question: &str, choices: &[String], default: usize) -> Result<usize>;

    /// Free text answer; `default` applies on empty input
    fn input(&self, question: &str, default: Option<&str>) -> Result<String>;
}

impl<P: Prompt + ?Sized> Prompt for &P {
    fn confirm(&self, question: &str, default: bool) -> Result<bool> {
        (**self).confirm(question, default)
    }

    fn select(&self, question: &str, choices: &[String], default: usize) -> Result<usize> {
        (**self).select(question, choices, default)
    }

    fn input(&self, question: &str, default: Option<&str>) -> Result<String> {
        (**self).input(question, default)
    }
}

/// Prompts on the terminal through stdin/stdout
#[derive(Debug, Default)]
pub struct StdinPrompt;

fn read_line() -> Result<String> {
    io::stdout().flush()?;
    let mut input = String::new();
    io::stdin().read_line(&mut input)?;
    Ok(input.trim().to_string())
}

/// Zero-based index for a typed 1-based selection; empty input takes `default`
fn parse_selection(selection: &str, len: usize, default: usize) -> Option<usize> {
    if selection.is_empty() {
        return Some(default).filter(|d| *d < len);
    }
    selection
        .parse::<usize>()
        .ok()
        .filter(|index| (1..=len).contains(index))
        .map(|index| index - 1)
}

impl Prompt for StdinPrompt {
    /// Accepts "y"/"yes" and "n"/"no" (case-insensitive).
    fn confirm(&self, question: &str, default: bool) -> Result<bool> {
        let hint = if default { "Y/n" } else { "y/N" };
        print!("\n{} ({}): ", question, hint);

        let response = read_line()?.to_lowercase();
        Ok(match response.as_str() {
            "" => default,
            "y" | "yes" => true,
            "n" | "no" => false,
            _ => default,
        })
    }

    /// Displays a numbered list and accepts a 1-based index, asking again
    /// until the answer is one of the entries.
    fn select(&self, question: &str, choices: &[String], default: usize) -> Result<usize> {
        println!("\n\x1b[1m{}\x1b[0m", question);
        for (i, choice) in choices.iter().enumerate() {
            println!("  {}. {}", i + 1, choice);
        }

        loop {
            print!("\nSelect (1-{}) [default: {}]: ", choices.len(), default + 1);
            let selection = read_line()?;
            match parse_selection(&selection, choices.len(), default) {
                Some(index) => return Ok(index),
                None => println!("Invalid selection: {}", selection),
            }
        }
    }

    fn input(&self, question: &str, default: Option<&str>) -> Result<String> {
        match default {
            Some(default) => print!("\n{} [{}]: ", question, default),
            None => print!("\n{}: ", question),
        }

        let answer = read_line()?;
        if answer.is_empty() {
            Ok(default.unwrap_or_default().to_string())
        } else {
            Ok(answer)
        }
    }
}

/// A pre-recorded answer for [`ScriptedPrompt`]
#[derive(Debug, Clone, PartialEq)]
pub enum Answer {
    Confirm(bool),
    Select(usize),
    Input(String),
}

/// Answers questions from a fixed script and records what was asked.
///
/// When the script runs out, every question takes its default.
#[derive(Debug, Default)]
pub struct ScriptedPrompt {
    answers: Mutex<VecDeque<Answer>>,
    asked: Mutex<Vec<String>>,
}

impl ScriptedPrompt {
    pub fn new(answers: impl IntoIterator<Item = Answer>) -> Self {
        ScriptedPrompt {
            answers: Mutex::new(answers.into_iter().collect()),
            asked: Mutex::new(Vec::new()),
        }
    }

    /// Every question asked so far, in order
    pub fn asked(&self) -> Vec<String> {
        self.asked.lock().map(|a| a.clone()).unwrap_or_default()
    }

    fn next(&self, question: &str) -> Option<Answer> {
        if let Ok(mut asked) = self.asked.lock() {
            asked.push(question.to_string());
        }
        self.answers.lock().ok().and_then(|mut a| a.pop_front())
    }
}

impl Prompt for ScriptedPrompt {
    fn confirm(&self, question: &str, default: bool) -> Result<bool> {
        match self.next(question) {
            Some(Answer::Confirm(answer)) => Ok(answer),
            None => Ok(default),
            Some(other) => Err(GitReleaseError::config(format!(
                "Scripted answer {:?} does not fit confirm \"{}\"",
                other, question
            ))),
        }
    }

    fn select(&self, question: &str, choices: &[String], default: usize) -> Result<usize> {
        match self.next(question) {
            Some(Answer::Select(index)) if index < choices.len() => Ok(index),
            None => Ok(default),
            Some(other) => Err(GitReleaseError::config(format!(
                "Scripted answer {:?} does not fit select \"{}\"",
                other, question
            ))),
        }
    }

    fn input(&self, question: &str, default: Option<&str>) -> Result<String> {
        match self.next(question) {
            Some(Answer::Input(answer)) => Ok(answer),
            None => Ok(default.unwrap_or_default().to_string()),
            Some(other) => Err(GitReleaseError::config(format!(
                "Scripted answer {:?} does not fit input \"{}\"",
                other, question
            ))),
        }
    }
}
