use crate::error::Result;
use crate::shell::{Access, Shell};

/// Placeholder in the changelog command replaced by the commit range
pub const REV_RANGE: &str = "[REV_RANGE]";

/// Produces the changelog text by running the configured command
pub struct Changelog<'a> {
    shell: &'a Shell,
}

impl<'a> Changelog<'a> {
    pub fn new(shell: &'a Shell) -> Self {
        Changelog { shell }
    }

    /// Run `script` with `[REV_RANGE]` expanded to `<latest_tag>...HEAD`, or
    /// removed when there is no tag yet.
    ///
    /// The command only reads, so it also runs during a dry run.
    pub fn create(&self, script: &str, latest_tag: Option<&str>) -> Result<String> {
        if script.trim().is_empty() {
            return Ok(String::new());
        }
        let command = expand_rev_range(script, latest_tag);
        self.shell.run(&command, Access::ReadOnly)
    }
}

pub fn expand_rev_range(script: &str, latest_tag: Option<&str>) -> String {
    let range = latest_tag
        .map(|tag| format!("{}...HEAD", tag))
        .unwrap_or_default();
    script.replace(REV_RANGE, &range).trim().to_string()
}
