//! Research Request Models
//!
//! Data structures for orchestrated research calls and their outcomes.

use serde::{Deserialize, Serialize};

/// Class of an incoming research request, selecting the model tier plan
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestClass {
    /// Latency-sensitive lookups; starts on the cheaper model tier
    Fast,
    /// Thorough analysis; starts on the strongest model tier
    Deep,
}

impl std::fmt::Display for RequestClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RequestClass::Fast => write!(f, "fast"),
            RequestClass::Deep => write!(f, "deep"),
        }
    }
}

/// Record of a single tier attempt during an orchestrated call
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TierAttempt {
    /// Tier identifier that was tried ("auto" when the engine self-selected)
    pub tier: String,
    /// Whether this attempt succeeded
    pub success: bool,
    /// Error classification if failed (`kind()` of the underlying error)
    pub failure_kind: Option<String>,
    /// Redacted error message if failed
    pub error_message: Option<String>,
    /// Duration of the attempt in milliseconds
    pub duration_ms: u64,
    /// Timestamp when the attempt started
    pub started_at: String,
}

impl TierAttempt {
    /// Create a successful attempt record
    pub fn success(tier: impl Into<String>, duration_ms: u64) -> Self {
        Self {
            tier: tier.into(),
            success: true,
            failure_kind: None,
            error_message: None,
            duration_ms,
            started_at: chrono::Utc::now().to_rfc3339(),
        }
    }

    /// Create a failed attempt record
    pub fn failure(
        tier: impl Into<String>,
        failure_kind: impl Into<String>,
        error: impl Into<String>,
        duration_ms: u64,
    ) -> Self {
        Self {
            tier: tier.into(),
            success: false,
            failure_kind: Some(failure_kind.into()),
            error_message: Some(error.into()),
            duration_ms,
            started_at: chrono::Utc::now().to_rfc3339(),
        }
    }
}

/// Normalized result of one successful orchestrated call
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResearchOutcome {
    /// The engine's answer text
    pub text: String,
    /// File paths the engine reported consulting
    pub files_referenced: Vec<String>,
    /// Total tokens consumed, when the engine reported stats
    pub tokens_used: Option<u64>,
    /// Upstream API calls made, when the engine reported stats
    pub external_call_count: Option<u64>,
    /// Wall-clock latency of the whole call, including fallback attempts
    pub latency_ms: u64,
    /// Identifier of the tier that actually produced the answer
    pub model_used: String,
    /// Per-tier audit log of every attempt made for this call
    pub attempts: Vec<TierAttempt>,
}
