use std::sync::OnceLock;

use regex::{Captures, Regex};
use serde::Serialize;
use serde_json::{Map, Value};

use crate::config::{merge_values, ReleaseOptions};
use crate::error::{GitReleaseError, Result};

fn placeholder_regex() -> &'static Regex {
    static PLACEHOLDER: OnceLock<Regex> = OnceLock::new();
    PLACEHOLDER.get_or_init(|| {
        Regex::new(r"\$\{\s*([A-Za-z0-9_.\-]+)\s*\}").expect("placeholder regex is valid")
    })
}

/// Facts derived during one release run, readable by later steps and hook templates.
///
/// A field is written once with [`RuntimeContext::set_once`]; the only way to
/// replace a value is [`RuntimeContext::merge`].
#[derive(Debug, Clone, Default)]
pub struct RuntimeContext {
    values: Map<String, Value>,
}

impl RuntimeContext {
    pub fn new() -> Self {
        RuntimeContext::default()
    }

    /// Seed the context with the merged options so templates can read them
    pub fn from_options(options: &ReleaseOptions) -> Result<Self> {
        match serde_json::to_value(options)? {
            Value::Object(values) => Ok(RuntimeContext { values }),
            _ => Ok(RuntimeContext::new()),
        }
    }

    pub fn set_once(&mut self, key: &str, value: impl Serialize) -> Result<()> {
        if self.values.contains_key(key) {
            return Err(GitReleaseError::config(format!(
                "Runtime context field `{}` is already set",
                key
            )));
        }
        self.values.insert(key.to_string(), serde_json::to_value(value)?);
        Ok(())
    }

    /// Merge `value` into `key`, replacing what was there
    pub fn merge(&mut self, key: &str, value: impl Serialize) -> Result<()> {
        let value = serde_json::to_value(value)?;
        match self.values.get_mut(key) {
            Some(existing @ Value::Object(_)) if value.is_object() => merge_values(existing, value),
            _ => {
                self.values.insert(key.to_string(), value);
            }
        }
        Ok(())
    }

    /// Look up a dotted path such as `git.tag_name`
    pub fn get(&self, path: &str) -> Option<&Value> {
        let mut parts = path.split('.');
        let mut current = self.values.get(parts.next()?)?;
        for part in parts {
            current = match current {
                Value::Object(map) => map.get(part)?,
                Value::Array(items) => items.get(part.parse::<usize>().ok()?)?,
                _ => return None,
            };
        }
        Some(current)
    }

    pub fn get_str(&self, path: &str) -> Option<&str> {
        self.get(path).and_then(Value::as_str)
    }

    /// Snapshot of every field
    pub fn view(&self) -> Value {
        Value::Object(self.values.clone())
    }

    /// Substitute `${dotted.path}` placeholders; unknown paths render as empty text
    pub fn render(&self, template: &str) -> String {
        placeholder_regex()
            .replace_all(template, |caps: &Captures| {
                self.get(&caps[1]).map(display_value).unwrap_or_default()
            })
            .into_owned()
    }
}

fn display_value(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
