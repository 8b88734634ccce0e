// tests/cli_test.rs
use std::path::{Path, PathBuf};

use clap::Parser;
use serde_json::json;

use git_release::cli::Cli;
use git_release::config::FileSource;

fn parse(args: &[&str]) -> Cli {
    Cli::try_parse_from(std::iter::once("git-release").chain(args.iter().copied()))
        .expect("arguments should parse")
}

#[test]
fn test_no_flags_means_no_overrides() {
    let cli = parse(&[]);
    assert_eq!(cli.to_overrides(), json!({}));
}

#[test]
fn test_increment_and_switches() {
    let cli = parse(&["minor", "--dry-run", "--verbose", "--ci", "--no-metrics"]);
    assert_eq!(
        cli.to_overrides(),
        json!({
            "increment": "minor",
            "dry_run": true,
            "verbose": true,
            "ci": true,
            "disable_metrics": true,
        })
    );
}

#[test]
fn test_short_flags() {
    let cli = parse(&["-d", "-v", "2.0.0"]);
    assert!(cli.dry_run);
    assert!(cli.verbose);
    assert_eq!(cli.increment.as_deref(), Some("2.0.0"));
}

#[test]
fn test_non_interactive_alias() {
    let cli = parse(&["--non-interactive"]);
    assert!(cli.ci);
}

#[test]
fn test_pre_release_without_identifier() {
    let cli = parse(&["--pre-release"]);
    assert_eq!(cli.pre_release.as_deref(), Some(""));
    assert_eq!(cli.to_overrides(), json!({ "pre_release": true }));
}

#[test]
fn test_pre_release_with_identifier() {
    let cli = parse(&["major", "--pre-release=beta"]);
    assert_eq!(
        cli.to_overrides(),
        json!({ "increment": "major", "pre_release_id": "beta" })
    );
}

#[test]
fn test_pre_release_identifier_needs_equals() {
    // Without `=` the next word is the increment, not the identifier
    let cli = parse(&["--pre-release", "minor"]);
    assert_eq!(cli.pre_release.as_deref(), Some(""));
    assert_eq!(cli.increment.as_deref(), Some("minor"));
}

#[test]
fn test_config_sources() {
    let cwd = Path::new("/work/project");

    let sources = parse(&[]).sources(cwd);
    assert_eq!(sources.cwd, cwd);
    assert_eq!(sources.config, FileSource::Default);
    assert_eq!(sources.manifest, FileSource::Default);
    assert!(sources.include_user_config);

    let sources = parse(&["-c", "release.toml", "--no-manifest"]).sources(cwd);
    assert_eq!(sources.config, FileSource::Path(PathBuf::from("release.toml")));
    assert_eq!(sources.manifest, FileSource::Disabled);

    let sources = parse(&["--no-config", "--manifest", "pkg/package.json"]).sources(cwd);
    assert_eq!(sources.config, FileSource::Disabled);
    assert_eq!(
        sources.manifest,
        FileSource::Path(PathBuf::from("pkg/package.json"))
    );
}

#[test]
fn test_conflicting_config_flags_are_rejected() {
    let result = Cli::try_parse_from(["git-release", "--config", "a.toml", "--no-config"]);
    assert!(result.is_err());
}
