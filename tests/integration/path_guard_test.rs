//! Path Guard Integration Tests
//!
//! Exercises the containment invariant with real directories: traversal,
//! absolute escapes, sibling-name collisions, and batch extraction.

use farsight::{validate, validate_batch};
use std::path::PathBuf;

fn project_root() -> (tempfile::TempDir, PathBuf) {
    let dir = tempfile::tempdir().expect("tempdir");
    std::fs::create_dir_all(dir.path().join("src")).unwrap();
    std::fs::write(dir.path().join("src/main.rs"), "fn main() {}\n").unwrap();
    std::fs::write(dir.path().join("README.md"), "# readme\n").unwrap();
    let path = dir.path().to_path_buf();
    (dir, path)
}

#[test]
fn traversal_outside_root_is_rejected_with_reason() {
    let (_dir, root) = project_root();
    let verdict = validate("../../../etc/passwd", &root);
    assert!(!verdict.allowed);
    let reason = verdict.reason.expect("reason set");
    assert!(reason.contains("traversal"), "reason was: {reason}");
}

#[test]
fn absolute_path_outside_root_is_rejected_as_outside() {
    let (_dir, root) = project_root();
    let verdict = validate("/etc/passwd", &root);
    assert!(!verdict.allowed);
    assert_eq!(
        verdict.reason.as_deref(),
        Some("resolves outside the trusted root")
    );
}

#[test]
fn sibling_directory_with_shared_prefix_is_rejected() {
    let (_dir, root) = project_root();
    // `/a/b` must not admit `/a/b-other`
    let sibling = format!("{}-other", root.display());
    let verdict = validate(&sibling, &root);
    assert!(!verdict.allowed);
}

#[test]
fn existing_file_inside_root_is_allowed() {
    let (_dir, root) = project_root();
    let verdict = validate("src/main.rs", &root);
    assert!(verdict.allowed);
    assert!(verdict.exists);
    assert!(verdict.reason.is_none());
}

#[test]
fn absolute_path_inside_root_is_allowed() {
    let (_dir, root) = project_root();
    let inside = root.join("README.md");
    let verdict = validate(inside.to_str().unwrap(), &root);
    assert!(verdict.allowed);
    assert!(verdict.exists);
}

#[test]
fn missing_file_inside_root_is_allowed_but_flagged() {
    let (_dir, root) = project_root();
    let verdict = validate("src/not_written_yet.rs", &root);
    assert!(verdict.allowed);
    assert!(!verdict.exists);
    assert_eq!(verdict.reason.as_deref(), Some("does not exist"));
}

#[test]
fn dotdot_that_stays_inside_root_is_allowed() {
    let (_dir, root) = project_root();
    let verdict = validate("src/../README.md", &root);
    assert!(verdict.allowed);
    assert_eq!(verdict.resolved, root.join("README.md"));
}

#[test]
fn root_itself_is_allowed() {
    let (_dir, root) = project_root();
    let verdict = validate(root.to_str().unwrap(), &root);
    assert!(verdict.allowed);
}

#[test]
fn batch_with_only_contained_references_is_fully_valid() {
    let (_dir, root) = project_root();
    let batch = validate_batch("summarize @src/main.rs and @README.md", &root);
    assert!(batch.all_valid);
    assert!(batch.invalid.is_empty());
}

#[test]
fn batch_reports_each_escaping_reference() {
    let (_dir, root) = project_root();
    let text = "read @src/main.rs then @../escape.txt and @/etc/hosts";
    let batch = validate_batch(text, &root);
    assert!(!batch.all_valid);
    assert_eq!(batch.invalid.len(), 2);
}

#[test]
fn batch_with_no_references_is_trivially_valid() {
    let (_dir, root) = project_root();
    assert!(validate_batch("plain question, no markers", &root).all_valid);
}
