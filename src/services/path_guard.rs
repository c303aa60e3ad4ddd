//! Path Guard
//!
//! Validates user-supplied path references against the single trusted root
//! before any external call is made. Verdicts are data: a disallowed path is
//! reported to the caller, never raised as an error.
//!
//! Normalization is purely lexical (`.` and `..` segments are resolved
//! without touching the filesystem), so a reference is judged by where it
//! points, not by what currently exists there.

use regex::Regex;
use std::path::{Component, Path, PathBuf};
use std::sync::OnceLock;

use crate::models::path::{BatchVerdict, PathVerdict};

/// Pattern for path references embedded in free text: a marker character
/// followed by a contiguous run of path characters.
fn reference_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"@([\w./~\-]+)").expect("reference pattern compiles"))
}

/// Resolve `.` and `..` segments lexically.
///
/// `..` at the filesystem root stays at the root, matching how an absolute
/// path like `/../etc` resolves to `/etc`.
fn normalize_lexically(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::Prefix(prefix) => out.push(prefix.as_os_str()),
            Component::RootDir => out.push(std::path::MAIN_SEPARATOR_STR),
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            Component::Normal(segment) => out.push(segment),
        }
    }
    out
}

/// Validate a single path reference against the trusted root.
///
/// Absolute inputs are taken as-is; relative inputs are resolved against the
/// root. Containment is checked component-wise, so a sibling directory whose
/// name merely starts with the root's name (`/a/project` vs
/// `/a/project-evil`) is rejected.
pub fn validate(input: &str, trusted_root: &Path) -> PathVerdict {
    let raw = input.trim();
    let candidate = if Path::new(raw).is_absolute() {
        PathBuf::from(raw)
    } else {
        trusted_root.join(raw)
    };
    let resolved = normalize_lexically(&candidate);
    let root = normalize_lexically(trusted_root);

    if !resolved.starts_with(&root) {
        let reason = if raw.contains("..") {
            "path contains parent traversal"
        } else {
            "resolves outside the trusted root"
        };
        return PathVerdict::denied(raw, resolved, reason);
    }

    let exists = std::fs::metadata(&resolved).is_ok();
    PathVerdict::allowed(raw, resolved, exists)
}

/// Extract every `@`-marked path reference from free text and validate each.
///
/// The batch is fully valid iff every extracted reference is allowed; text
/// with no references is trivially valid.
pub fn validate_batch(text: &str, trusted_root: &Path) -> BatchVerdict {
    let mut invalid = Vec::new();
    for caps in reference_pattern().captures_iter(text) {
        if let Some(reference) = caps.get(1) {
            let verdict = validate(reference.as_str(), trusted_root);
            if !verdict.allowed {
                invalid.push(verdict);
            }
        }
    }
    BatchVerdict {
        all_valid: invalid.is_empty(),
        invalid,
    }
}
