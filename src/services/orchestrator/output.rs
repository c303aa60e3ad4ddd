//! Engine Output Normalization
//!
//! The engine is asked for structured output, but never trusted to deliver
//! it: a strict parse of the JSON envelope is attempted first, and anything
//! that does not match is treated as the answer verbatim. The result is a
//! tagged variant, not a guess at field names.

use regex::Regex;
use serde::Deserialize;
use std::sync::OnceLock;

/// Usage statistics reported by the engine alongside a structured answer
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct EngineStats {
    /// Total tokens consumed across the call
    #[serde(default)]
    pub total_tokens: Option<u64>,
    /// Number of upstream API calls the engine made
    #[serde(default)]
    pub external_calls: Option<u64>,
}

/// The structured envelope the engine emits when asked for JSON output
#[derive(Debug, Deserialize)]
struct EngineEnvelope {
    response: String,
    #[serde(default)]
    stats: Option<EngineStats>,
}

/// Parsed engine stdout
#[derive(Debug, Clone, PartialEq)]
pub enum EngineOutput {
    /// Stdout matched the structured envelope
    Structured {
        response: String,
        stats: Option<EngineStats>,
    },
    /// Stdout was not machine-structured; the payload is the answer as-is
    Raw(String),
}

impl EngineOutput {
    /// Parse engine stdout, falling back to the raw payload on any mismatch
    pub fn parse(stdout: &str) -> Self {
        match serde_json::from_str::<EngineEnvelope>(stdout.trim()) {
            Ok(envelope) => EngineOutput::Structured {
                response: envelope.response,
                stats: envelope.stats,
            },
            Err(_) => EngineOutput::Raw(stdout.trim().to_string()),
        }
    }

    /// The answer text, wherever it came from
    pub fn text(&self) -> &str {
        match self {
            EngineOutput::Structured { response, .. } => response,
            EngineOutput::Raw(raw) => raw,
        }
    }

    /// Consume the output, yielding the answer text
    pub fn into_text(self) -> String {
        match self {
            EngineOutput::Structured { response, .. } => response,
            EngineOutput::Raw(raw) => raw,
        }
    }

    /// Usage stats, present only on the structured branch
    pub fn stats(&self) -> Option<&EngineStats> {
        match self {
            EngineOutput::Structured { stats, .. } => stats.as_ref(),
            EngineOutput::Raw(_) => None,
        }
    }
}

/// Pattern for the delimited "Files referenced" listing in an answer
fn files_referenced_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"(?mi)^\s*files referenced:[ \t]*(.*)$").expect("files pattern compiles")
    })
}

/// Extract the file listing the engine appended to its answer, if any.
///
/// Accepts an inline comma/whitespace separated list after the header, or a
/// bullet list on the following lines.
pub fn extract_files_referenced(text: &str) -> Vec<String> {
    let caps = match files_referenced_pattern().captures(text) {
        Some(caps) => caps,
        None => return Vec::new(),
    };

    let inline = caps.get(1).map(|m| m.as_str().trim()).unwrap_or_default();
    let mut files: Vec<String> = inline
        .split([',', ' ', '\t'])
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect();

    if files.is_empty() {
        let after = caps.get(0).map(|m| m.end()).unwrap_or(text.len());
        for line in text[after..].lines() {
            let trimmed = line.trim();
            if trimmed.is_empty() && files.is_empty() {
                continue;
            }
            match trimmed
                .strip_prefix("- ")
                .or_else(|| trimmed.strip_prefix("* "))
            {
                Some(rest) => files.push(rest.trim().to_string()),
                None => break,
            }
        }
    }

    files
}
