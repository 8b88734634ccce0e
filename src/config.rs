use std::fs;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use crate::error::{GitReleaseError, Result};

/// Local configuration file looked up in the working directory
pub const LOCAL_CONFIG_FILE: &str = ".git-release.toml";

/// Package manifest read for the name, version and embedded configuration
pub const LOCAL_MANIFEST_FILE: &str = "package.json";

/// Key under which a manifest may embed configuration
pub const MANIFEST_CONFIG_KEY: &str = "git-release";

/// Which reference version wins when both a tag and a manifest version exist
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum VersionSource {
    GitTag,
    Manifest,
}

/// The complete, merged configuration for one release run.
///
/// Built by [`load_options`]; read-only once the run starts.
#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct ReleaseOptions {
    pub name: String,
    pub increment: Option<String>,
    pub pre_release: bool,
    pub pre_release_id: Option<String>,
    pub ci: bool,
    pub dry_run: bool,
    pub verbose: bool,
    pub debug: bool,
    pub disable_metrics: bool,
    pub metrics_url: Option<String>,
    #[serde(rename = "use")]
    pub version_source: Option<VersionSource>,
    pub pkg_files: Vec<String>,
    pub scripts: Scripts,
    pub git: GitOptions,
    pub github: GitHubOptions,
    pub gitlab: GitLabOptions,
    pub npm: NpmOptions,
    pub dist: DistOptions,
    pub conventional_commits: ConventionalCommitsConfig,
}

impl Default for ReleaseOptions {
    fn default() -> Self {
        ReleaseOptions {
            name: String::new(),
            increment: None,
            pre_release: false,
            pre_release_id: None,
            ci: false,
            dry_run: false,
            verbose: false,
            debug: false,
            disable_metrics: false,
            metrics_url: None,
            version_source: None,
            pkg_files: vec![LOCAL_MANIFEST_FILE.to_string()],
            scripts: Scripts::default(),
            git: GitOptions::default(),
            github: GitHubOptions::default(),
            gitlab: GitLabOptions::default(),
            npm: NpmOptions::default(),
            dist: DistOptions::default(),
            conventional_commits: ConventionalCommitsConfig::default(),
        }
    }
}

impl ReleaseOptions {
    pub fn is_interactive(&self) -> bool {
        !self.ci
    }

    pub fn is_collect_metrics(&self) -> bool {
        !self.disable_metrics
    }

    /// Apply the shorthands and defaults that depend on several fields at once
    fn normalize(&mut self) {
        if self.increment.as_deref().is_some_and(|i| i.trim().is_empty()) {
            self.increment = None;
        }

        match self.pre_release_id.as_deref() {
            Some("") => self.pre_release_id = None,
            Some(id) => {
                self.pre_release = true;
                if self.npm.tag.is_none() {
                    self.npm.tag = Some(id.to_string());
                }
            }
            None => {}
        }

        if self.increment.is_none() && !self.is_interactive() && !self.pre_release {
            self.increment = Some("patch".to_string());
        }
    }
}

/// Lifecycle hook commands; each may use `${...}` placeholders
#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct Scripts {
    pub before_start: Option<String>,
    pub before_bump: Option<String>,
    pub after_bump: Option<String>,
    pub before_stage: Option<String>,
    pub after_release: Option<String>,
    /// Command producing the changelog; `[REV_RANGE]` expands to `<latest tag>...HEAD`
    pub changelog: String,
}

impl Default for Scripts {
    fn default() -> Self {
        Scripts {
            before_start: None,
            before_bump: None,
            after_bump: None,
            before_stage: None,
            after_release: None,
            changelog: "git log --pretty=format:\"* %s (%h)\" [REV_RANGE]".to_string(),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct GitOptions {
    pub require_clean_working_dir: bool,
    pub require_upstream: bool,
    pub add_untracked_files: bool,
    pub commit: bool,
    pub commit_message: String,
    pub commit_args: String,
    pub tag: bool,
    pub tag_name: String,
    pub tag_annotation: String,
    pub tag_args: String,
    pub push: bool,
    pub push_args: String,
    pub push_repo: String,
}

impl Default for GitOptions {
    fn default() -> Self {
        GitOptions {
            require_clean_working_dir: true,
            require_upstream: true,
            add_untracked_files: false,
            commit: true,
            commit_message: "Release ${version}".to_string(),
            commit_args: String::new(),
            tag: true,
            tag_name: "${version}".to_string(),
            tag_annotation: "Release ${version}".to_string(),
            tag_args: String::new(),
            push: true,
            push_args: "--follow-tags".to_string(),
            push_repo: "origin".to_string(),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct GitHubOptions {
    pub release: bool,
    pub release_name: String,
    /// Command whose output replaces the changelog as release body
    pub release_notes: Option<String>,
    pub draft: bool,
    pub token_ref: String,
    pub assets: Vec<String>,
    pub host: Option<String>,
    pub api_url: Option<String>,
    pub timeout_secs: u64,
}

impl Default for GitHubOptions {
    fn default() -> Self {
        GitHubOptions {
            release: false,
            release_name: "Release ${version}".to_string(),
            release_notes: None,
            draft: false,
            token_ref: "GITHUB_TOKEN".to_string(),
            assets: Vec::new(),
            host: None,
            api_url: None,
            timeout_secs: 30,
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct GitLabOptions {
    pub release: bool,
    pub release_name: String,
    pub release_notes: Option<String>,
    pub token_ref: String,
    pub host: Option<String>,
    pub api_url: Option<String>,
    pub timeout_secs: u64,
}

impl Default for GitLabOptions {
    fn default() -> Self {
        GitLabOptions {
            release: false,
            release_name: "Release ${version}".to_string(),
            release_notes: None,
            token_ref: "GITLAB_TOKEN".to_string(),
            host: None,
            api_url: None,
            timeout_secs: 30,
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct NpmOptions {
    pub name: Option<String>,
    pub version: Option<String>,
    pub private: bool,
    pub publish: bool,
    pub publish_path: String,
    pub tag: Option<String>,
    pub access: Option<String>,
    pub otp: Option<String>,
}

impl Default for NpmOptions {
    fn default() -> Self {
        NpmOptions {
            name: None,
            version: None,
            private: false,
            publish: false,
            publish_path: ".".to_string(),
            tag: None,
            access: None,
            otp: None,
        }
    }
}

/// Distribution repository settings.
///
/// `git`, `github`, `gitlab` and `npm` are partial overrides layered on top of
/// the source repository's options for the distribution release phase.
#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct DistOptions {
    /// Clone url, optionally suffixed with `#branch`
    pub repo: Option<String>,
    pub stage_dir: String,
    pub base_dir: String,
    pub files: Vec<String>,
    pub pkg_files: Vec<String>,
    pub scripts: DistScripts,
    pub git: Map<String, Value>,
    pub github: Map<String, Value>,
    pub gitlab: Map<String, Value>,
    pub npm: Map<String, Value>,
}

impl Default for DistOptions {
    fn default() -> Self {
        DistOptions {
            repo: None,
            stage_dir: ".stage".to_string(),
            base_dir: "dist".to_string(),
            files: vec!["**/*".to_string()],
            pkg_files: Vec::new(),
            scripts: DistScripts::default(),
            git: Map::new(),
            github: object(json!({ "release": false })),
            gitlab: object(json!({ "release": false })),
            npm: object(json!({ "publish": false })),
        }
    }
}

impl DistOptions {
    pub fn git_options(&self, base: &GitOptions) -> Result<GitOptions> {
        overlay(base, &self.git)
    }

    pub fn github_options(&self, base: &GitHubOptions) -> Result<GitHubOptions> {
        overlay(base, &self.github)
    }

    pub fn gitlab_options(&self, base: &GitLabOptions) -> Result<GitLabOptions> {
        overlay(base, &self.gitlab)
    }

    pub fn npm_options(&self, base: &NpmOptions) -> Result<NpmOptions> {
        overlay(base, &self.npm)
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
#[serde(default)]
pub struct DistScripts {
    pub before_stage: Option<String>,
    pub after_release: Option<String>,
}

/// Returns the default list of breaking change indicators.
fn default_breaking_change_indicators() -> Vec<String> {
    vec![
        "BREAKING CHANGE:".to_string(),
        "BREAKING-CHANGE:".to_string(),
    ]
}

/// Configuration for the `conventional` increment recommendation.
///
/// Defines the breaking change footers and the commit types that map to a
/// minor bump. Any other commit is a patch.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ConventionalCommitsConfig {
    #[serde(default = "default_breaking_change_indicators")]
    pub breaking_change_indicators: Vec<String>,

    #[serde(default = "default_minor_types")]
    pub minor_types: Vec<String>,
}

fn default_minor_types() -> Vec<String> {
    vec!["feat".to_string(), "feature".to_string()]
}

impl Default for ConventionalCommitsConfig {
    fn default() -> Self {
        ConventionalCommitsConfig {
            breaking_change_indicators: default_breaking_change_indicators(),
            minor_types: default_minor_types(),
        }
    }
}

fn object(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        _ => Map::new(),
    }
}

/// Deep-merge `overlay` into `base`.
///
/// Objects merge key by key; any other overlay value replaces the base value.
/// `null` in the overlay leaves the base untouched.
pub fn merge_values(base: &mut Value, overlay: Value) {
    match (base, overlay) {
        (_, Value::Null) => {}
        (Value::Object(base_map), Value::Object(overlay_map)) => {
            for (key, value) in overlay_map {
                match base_map.get_mut(&key) {
                    Some(existing) => merge_values(existing, value),
                    None => {
                        base_map.insert(key, value);
                    }
                }
            }
        }
        (base, overlay) => *base = overlay,
    }
}

/// Merge layers in order, lowest precedence first
pub fn merge_layers<I: IntoIterator<Item = Value>>(layers: I) -> Value {
    let mut merged = Value::Object(Map::new());
    for layer in layers {
        merge_values(&mut merged, layer);
    }
    merged
}

/// Layer a partial override on top of a typed options record
pub fn overlay<T: Serialize + DeserializeOwned>(base: &T, patch: &Map<String, Value>) -> Result<T> {
    let mut value = serde_json::to_value(base)?;
    merge_values(&mut value, Value::Object(patch.clone()));
    Ok(serde_json::from_value(value)?)
}

/// Where a configuration file comes from
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum FileSource {
    /// The conventional file name in the working directory, if present
    #[default]
    Default,
    /// An explicitly named file, which must exist
    Path(PathBuf),
    Disabled,
}

/// Inputs to [`load_options`] besides the CLI overrides
#[derive(Debug, Clone)]
pub struct ConfigSources {
    pub cwd: PathBuf,
    pub config: FileSource,
    pub manifest: FileSource,
    pub include_user_config: bool,
    pub detect_ci: bool,
}

impl ConfigSources {
    pub fn new(cwd: impl Into<PathBuf>) -> Self {
        ConfigSources {
            cwd: cwd.into(),
            config: FileSource::Default,
            manifest: FileSource::Default,
            include_user_config: true,
            detect_ci: true,
        }
    }

    /// Sources that only consider the working directory, for tests and embedding
    pub fn isolated(cwd: impl Into<PathBuf>) -> Self {
        ConfigSources {
            include_user_config: false,
            detect_ci: false,
            ..ConfigSources::new(cwd)
        }
    }
}

/// Loads and merges the release configuration.
///
/// Layers, lowest precedence first:
/// 1. Built-in defaults
/// 2. Values derived from the manifest (`name`, `npm.*`)
/// 3. User configuration in `<config_dir>/git-release/config.toml`
/// 4. Local `.git-release.toml` (or the file given with `--config`)
/// 5. Configuration embedded in the manifest under `"git-release"`
/// 6. `ci = true` when the `CI` environment variable is set
/// 7. `overrides` (CLI flags or programmatic options)
///
/// # Returns
/// * `Ok(ReleaseOptions)` - Merged and normalized options
/// * `Err` - If an explicit config file is missing or any layer fails to parse
pub fn load_options(overrides: Value, sources: &ConfigSources) -> Result<ReleaseOptions> {
    let manifest = read_manifest(sources)?;

    let mut layers = vec![
        serde_json::to_value(ReleaseOptions::default())?,
        derived_layer(&manifest, &sources.cwd),
    ];

    if sources.include_user_config {
        if let Some(user) = user_config_layer()? {
            layers.push(user);
        }
    }

    if let Some(local) = local_config_layer(sources)? {
        layers.push(local);
    }

    if let Some(embedded) = manifest.get(MANIFEST_CONFIG_KEY) {
        layers.push(embedded.clone());
    }

    if sources.detect_ci && std::env::var_os("CI").is_some() {
        layers.push(json!({ "ci": true }));
    }

    layers.push(overrides);

    let merged = merge_layers(layers);
    tracing::debug!(config = %merged, "merged release options");

    let mut options: ReleaseOptions = serde_json::from_value(merged)?;
    options.normalize();
    Ok(options)
}

fn read_toml(path: &Path) -> Result<Value> {
    let content = fs::read_to_string(path)?;
    let parsed: toml::Value = toml::from_str(&content)?;
    Ok(serde_json::to_value(parsed)?)
}

fn local_config_layer(sources: &ConfigSources) -> Result<Option<Value>> {
    match &sources.config {
        FileSource::Disabled => Ok(None),
        FileSource::Default => {
            let path = sources.cwd.join(LOCAL_CONFIG_FILE);
            if path.exists() {
                read_toml(&path).map(Some)
            } else {
                Ok(None)
            }
        }
        FileSource::Path(path) => {
            let path = sources.cwd.join(path);
            if !path.exists() {
                return Err(GitReleaseError::ConfigFileNotFound(path));
            }
            read_toml(&path).map(Some)
        }
    }
}

fn user_config_layer() -> Result<Option<Value>> {
    let Some(config_dir) = dirs::config_dir() else {
        return Ok(None);
    };

    let path = config_dir.join("git-release").join("config.toml");
    if path.exists() {
        read_toml(&path).map(Some)
    } else {
        Ok(None)
    }
}

/// Reads the package manifest; a missing or unreadable manifest is an empty object
fn read_manifest(sources: &ConfigSources) -> Result<Value> {
    let path = match &sources.manifest {
        FileSource::Disabled => return Ok(Value::Object(Map::new())),
        FileSource::Default => sources.cwd.join(LOCAL_MANIFEST_FILE),
        FileSource::Path(path) => sources.cwd.join(path),
    };

    let manifest = fs::read_to_string(&path)
        .ok()
        .and_then(|content| serde_json::from_str::<Value>(&content).ok())
        .filter(Value::is_object);

    match manifest {
        Some(manifest) => Ok(manifest),
        None => {
            tracing::debug!(path = %path.display(), "no usable manifest");
            Ok(Value::Object(Map::new()))
        }
    }
}

fn derived_layer(manifest: &Value, cwd: &Path) -> Value {
    let manifest_name = manifest.get("name").and_then(Value::as_str);
    let name = manifest_name.map(str::to_string).unwrap_or_else(|| {
        cwd.file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    });

    json!({
        "name": name,
        "npm": {
            "name": manifest_name,
            "version": manifest.get("version").and_then(Value::as_str),
            "private": manifest.get("private").and_then(Value::as_bool).unwrap_or(false),
            "publish": manifest_name.is_some(),
        }
    })
}
