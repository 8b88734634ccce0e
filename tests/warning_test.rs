use git_release::ui::Logger;
use git_release::warning::ReleaseWarning;

// ============================================================================
// ReleaseWarning Display Tests
// ============================================================================

#[test]
fn test_bump_failed_display() {
    let warning = ReleaseWarning::BumpFailed {
        file: "package.json".to_string(),
    };
    assert_eq!(warning.to_string(), "Could not bump package.json");
}

#[test]
fn test_stage_failed_display() {
    let warning = ReleaseWarning::StageFailed {
        file: "CHANGELOG.md".to_string(),
    };
    assert_eq!(warning.to_string(), "Could not stage CHANGELOG.md");
}

#[test]
fn test_unparsable_tag_display() {
    let warning = ReleaseWarning::UnparsableTag {
        tag: "release-candidate".to_string(),
    };

    let display_msg = warning.to_string();
    assert!(
        display_msg.contains("Cannot parse version"),
        "Message should contain 'Cannot parse version', got: {}",
        display_msg
    );
    assert!(
        display_msg.contains("release-candidate"),
        "Message should contain tag 'release-candidate', got: {}",
        display_msg
    );
}

#[test]
fn test_nothing_to_commit_display() {
    assert_eq!(
        ReleaseWarning::NothingToCommit.to_string(),
        "No changes to commit. The latest commit will be tagged."
    );
}

#[test]
fn test_private_package_display() {
    let warning = ReleaseWarning::PrivatePackage {
        name: "@scope/internal".to_string(),
    };
    assert_eq!(
        warning.to_string(),
        "Skip publish: package @scope/internal is private."
    );
}

// ============================================================================
// Reporting
// ============================================================================

#[test]
fn test_warnings_are_logged_with_prefix() {
    let (logger, buffer) = Logger::capture(false, false, false);

    logger.warning(&ReleaseWarning::BumpFailed {
        file: "VERSION".to_string(),
    });
    logger.warning(&ReleaseWarning::NothingToCommit);

    assert_eq!(
        buffer.lines(),
        vec![
            "WARNING Could not bump VERSION".to_string(),
            "WARNING No changes to commit. The latest commit will be tagged.".to_string(),
        ]
    );
}

#[test]
fn test_warnings_are_comparable() {
    let a = ReleaseWarning::UnparsableTag {
        tag: "latest".to_string(),
    };
    assert_eq!(a.clone(), a);
    assert_ne!(a, ReleaseWarning::NothingToCommit);
}
