// tests/config_test.rs
use std::fs;
use std::path::PathBuf;

use serde_json::json;
use tempfile::TempDir;

use git_release::config::{
    load_options, ConfigSources, FileSource, ReleaseOptions, VersionSource,
};
use git_release::GitReleaseError;

fn project_dir(name: &str) -> (TempDir, PathBuf) {
    let root = TempDir::new().unwrap();
    let dir = root.path().join(name);
    fs::create_dir_all(&dir).unwrap();
    (root, dir)
}

#[test]
fn test_default_options() {
    let (_root, dir) = project_dir("my-project");

    let options = load_options(json!({}), &ConfigSources::isolated(&dir)).unwrap();

    assert_eq!(options.name, "my-project");
    assert_eq!(options.pkg_files, vec!["package.json".to_string()]);
    assert!(options.git.commit && options.git.tag && options.git.push);
    assert_eq!(options.git.tag_name, "${version}");
    assert_eq!(options.git.commit_message, "Release ${version}");
    assert!(!options.github.release);
    assert!(!options.npm.publish);
    assert_eq!(options.dist.stage_dir, ".stage");
    assert!(options
        .conventional_commits
        .breaking_change_indicators
        .contains(&"BREAKING CHANGE:".to_string()));
    assert!(options
        .conventional_commits
        .minor_types
        .contains(&"feat".to_string()));
}

#[test]
fn test_manifest_provides_name_and_npm_facts() {
    let (_root, dir) = project_dir("checkout");
    fs::write(
        dir.join("package.json"),
        r#"{ "name": "my-pkg", "version": "1.2.3", "private": true }"#,
    )
    .unwrap();

    let options = load_options(json!({}), &ConfigSources::isolated(&dir)).unwrap();

    assert_eq!(options.name, "my-pkg");
    assert_eq!(options.npm.name.as_deref(), Some("my-pkg"));
    assert_eq!(options.npm.version.as_deref(), Some("1.2.3"));
    assert!(options.npm.private);
    assert!(options.npm.publish);
}

#[test]
fn test_unreadable_manifest_is_ignored() {
    let (_root, dir) = project_dir("broken");
    fs::write(dir.join("package.json"), "{ not json").unwrap();

    let options = load_options(json!({}), &ConfigSources::isolated(&dir)).unwrap();
    assert_eq!(options.name, "broken");
    assert_eq!(options.npm.version, None);
}

#[test]
fn test_local_config_file_is_merged_deeply() {
    let (_root, dir) = project_dir("project");
    fs::write(
        dir.join(".git-release.toml"),
        r#"
use = "git-tag"

[git]
push = false
tag_name = "v${version}"

[github]
release = true
assets = ["dist/*.zip"]
"#,
    )
    .unwrap();

    let options = load_options(json!({}), &ConfigSources::isolated(&dir)).unwrap();

    assert!(!options.git.push);
    assert!(options.git.commit, "keys not in the file keep their defaults");
    assert_eq!(options.git.tag_name, "v${version}");
    assert_eq!(options.version_source, Some(VersionSource::GitTag));
    assert!(options.github.release);
    assert_eq!(options.github.assets, vec!["dist/*.zip".to_string()]);
    assert_eq!(options.github.token_ref, "GITHUB_TOKEN");
}

#[test]
fn test_manifest_config_beats_local_file() {
    let (_root, dir) = project_dir("project");
    fs::write(dir.join(".git-release.toml"), "[git]\npush = false\ncommit = false\n").unwrap();
    fs::write(
        dir.join("package.json"),
        r#"{ "name": "pkg", "git-release": { "git": { "push": true } } }"#,
    )
    .unwrap();

    let options = load_options(json!({}), &ConfigSources::isolated(&dir)).unwrap();

    assert!(options.git.push);
    assert!(!options.git.commit);
}

#[test]
fn test_overrides_beat_every_file() {
    let (_root, dir) = project_dir("project");
    fs::write(dir.join(".git-release.toml"), "increment = \"major\"\ndry_run = false\n").unwrap();

    let options = load_options(
        json!({ "increment": "minor", "dry_run": true, "npm": { "tag": "next" } }),
        &ConfigSources::isolated(&dir),
    )
    .unwrap();

    assert_eq!(options.increment.as_deref(), Some("minor"));
    assert!(options.dry_run);
    assert_eq!(options.npm.tag.as_deref(), Some("next"));
}

#[test]
fn test_explicit_config_file_must_exist() {
    let (_root, dir) = project_dir("project");
    let sources = ConfigSources {
        config: FileSource::Path(PathBuf::from("custom.toml")),
        ..ConfigSources::isolated(&dir)
    };

    let err = load_options(json!({}), &sources).unwrap_err();
    assert!(matches!(err, GitReleaseError::ConfigFileNotFound(_)));
    assert!(err.is_validation());
}

#[test]
fn test_explicit_config_file_replaces_local_file() {
    let (_root, dir) = project_dir("project");
    fs::write(dir.join(".git-release.toml"), "name = \"local\"\n").unwrap();
    fs::write(dir.join("custom.toml"), "name = \"custom\"\n").unwrap();
    let sources = ConfigSources {
        config: FileSource::Path(PathBuf::from("custom.toml")),
        ..ConfigSources::isolated(&dir)
    };

    let options = load_options(json!({}), &sources).unwrap();
    assert_eq!(options.name, "custom");
}

#[test]
fn test_disabled_sources_are_skipped() {
    let (_root, dir) = project_dir("project");
    fs::write(dir.join(".git-release.toml"), "name = \"local\"\n").unwrap();
    fs::write(dir.join("package.json"), r#"{ "name": "pkg", "version": "1.0.0" }"#).unwrap();
    let sources = ConfigSources {
        config: FileSource::Disabled,
        manifest: FileSource::Disabled,
        ..ConfigSources::isolated(&dir)
    };

    let options = load_options(json!({}), &sources).unwrap();
    assert_eq!(options.name, "project");
    assert_eq!(options.npm.version, None);
}

#[test]
fn test_invalid_toml_is_an_error() {
    let (_root, dir) = project_dir("project");
    fs::write(dir.join(".git-release.toml"), "[git\npush = false").unwrap();

    assert!(load_options(json!({}), &ConfigSources::isolated(&dir)).is_err());
}

#[test]
fn test_pre_release_id_implies_pre_release() {
    let (_root, dir) = project_dir("project");

    let options = load_options(
        json!({ "pre_release_id": "beta" }),
        &ConfigSources::isolated(&dir),
    )
    .unwrap();

    assert!(options.pre_release);
    assert_eq!(options.pre_release_id.as_deref(), Some("beta"));
    assert_eq!(options.npm.tag.as_deref(), Some("beta"));
}

#[test]
fn test_unattended_run_defaults_to_patch() {
    let (_root, dir) = project_dir("project");

    let options = load_options(json!({ "ci": true }), &ConfigSources::isolated(&dir)).unwrap();
    assert_eq!(options.increment.as_deref(), Some("patch"));

    let options = load_options(
        json!({ "ci": true, "pre_release": true }),
        &ConfigSources::isolated(&dir),
    )
    .unwrap();
    assert_eq!(options.increment, None);
}

#[test]
fn test_dist_overrides_layer_on_source_options() {
    let (_root, dir) = project_dir("project");
    fs::write(
        dir.join(".git-release.toml"),
        r#"
[git]
tag_name = "v${version}"
commit_message = "Release v${version}"

[dist]
repo = "https://github.com/owner/project-dist.git#gh-pages"

[dist.git]
commit_message = "Build v${version}"
"#,
    )
    .unwrap();

    let options: ReleaseOptions = load_options(json!({}), &ConfigSources::isolated(&dir)).unwrap();
    let dist_git = options.dist.git_options(&options.git).unwrap();

    assert_eq!(dist_git.commit_message, "Build v${version}");
    assert_eq!(dist_git.tag_name, "v${version}");
    assert!(!options.dist.npm_options(&options.npm).unwrap().publish);
}
