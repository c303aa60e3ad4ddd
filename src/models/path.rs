//! Path Validation Models
//!
//! Verdict types produced by the path guard. A verdict is data: disallowed
//! paths are reported, never thrown.

use serde::Serialize;
use std::path::PathBuf;

/// Outcome of validating a single path reference against the trusted root
#[derive(Debug, Clone, Serialize)]
pub struct PathVerdict {
    /// The raw input as supplied by the caller
    pub input: String,
    /// Absolute, lexically normalized resolution of the input
    pub resolved: PathBuf,
    /// Whether the resolved path exists (meaningful only when `allowed`)
    pub exists: bool,
    /// Whether the resolved path is the trusted root or a descendant of it
    pub allowed: bool,
    /// Why the path was rejected, or why `exists` is false
    pub reason: Option<String>,
}

impl PathVerdict {
    /// Build an allowed verdict; `reason` is set when the path is missing
    pub fn allowed(input: impl Into<String>, resolved: PathBuf, exists: bool) -> Self {
        Self {
            input: input.into(),
            resolved,
            exists,
            allowed: true,
            reason: (!exists).then(|| "does not exist".to_string()),
        }
    }

    /// Build a denied verdict with the given reason
    pub fn denied(input: impl Into<String>, resolved: PathBuf, reason: impl Into<String>) -> Self {
        Self {
            input: input.into(),
            resolved,
            exists: false,
            allowed: false,
            reason: Some(reason.into()),
        }
    }
}

/// Outcome of validating every path reference extracted from free text
#[derive(Debug, Clone, Serialize)]
pub struct BatchVerdict {
    /// True iff every extracted reference was allowed
    pub all_valid: bool,
    /// Verdicts for the references that were rejected
    pub invalid: Vec<PathVerdict>,
}
