//! Error Handling
//!
//! Classified error types for the relay core.
//! Uses thiserror for ergonomic error definitions.
//!
//! Every failure surfaced to a caller carries a machine-readable `kind()`
//! and a one-line actionable `hint()`. Raw subprocess stderr is never merged
//! into the primary message; it rides along in a dedicated, pre-redacted
//! field on the variants that capture it.

use thiserror::Error;

/// Crate-wide error type
#[derive(Error, Debug)]
pub enum RelayError {
    /// The external analysis engine binary could not be found
    #[error("analysis engine `{binary}` not found")]
    EngineNotFound {
        /// Binary name that failed to spawn
        binary: String,
    },

    /// The engine is installed but has no usable credentials
    #[error("analysis engine is not authenticated: {detail}")]
    AuthenticationMissing {
        /// Short description of what the engine reported
        detail: String,
    },

    /// Every tier in the fallback plan failed with a quota-pattern error
    #[error("all {} model tiers exhausted ({})", .tried.len(), .tried.join(", "))]
    QuotaExhausted {
        /// Tier identifiers in the order they were attempted
        tried: Vec<String>,
        /// Message from the final failed attempt (redacted)
        last_error: String,
    },

    /// The engine exited non-zero for a reason other than the above
    #[error("engine execution failed{}: {message}", .code.map(|c| format!(" (exit {c})")).unwrap_or_default())]
    EngineFailure {
        /// Exit code, if the process exited normally
        code: Option<i32>,
        /// First line of stderr, or a generic description
        message: String,
        /// Redacted, truncated stderr excerpt (side channel, never merged
        /// into the primary message)
        stderr: String,
    },

    /// The hard per-call timeout expired and the engine was killed
    #[error("engine call timed out after {seconds}s")]
    Timeout {
        /// Configured timeout that expired
        seconds: u64,
    },

    /// Configuration errors
    #[error("configuration error: {0}")]
    Config(String),

    /// File I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type alias for relay errors
pub type RelayResult<T> = Result<T, RelayError>;

impl RelayError {
    /// Create a not-found error for a missing engine binary
    pub fn engine_not_found(binary: impl Into<String>) -> Self {
        Self::EngineNotFound {
            binary: binary.into(),
        }
    }

    /// Create an authentication-missing error
    pub fn authentication_missing(detail: impl Into<String>) -> Self {
        Self::AuthenticationMissing {
            detail: detail.into(),
        }
    }

    /// Create an engine-failure error
    pub fn engine_failure(
        code: Option<i32>,
        message: impl Into<String>,
        stderr: impl Into<String>,
    ) -> Self {
        Self::EngineFailure {
            code,
            message: message.into(),
            stderr: stderr.into(),
        }
    }

    /// Create a config error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Machine-readable classification of this error
    pub fn kind(&self) -> &'static str {
        match self {
            Self::EngineNotFound { .. } => "engine_not_found",
            Self::AuthenticationMissing { .. } => "authentication_missing",
            Self::QuotaExhausted { .. } => "quota_exhausted",
            Self::EngineFailure { .. } => "engine_failure",
            Self::Timeout { .. } => "timeout",
            Self::Config(_) => "config",
            Self::Io(_) => "io",
            Self::Serialization(_) => "serialization",
        }
    }

    /// One-line remediation hint for user-visible failures
    pub fn hint(&self) -> &'static str {
        match self {
            Self::EngineNotFound { .. } => {
                "Install the analysis engine CLI and make sure it is on PATH"
            }
            Self::AuthenticationMissing { .. } => {
                "Run the engine's login command to refresh its credentials"
            }
            Self::QuotaExhausted { .. } => {
                "Wait for the quota window to reset or configure an additional fallback tier"
            }
            Self::EngineFailure { .. } => {
                "Inspect the attached stderr excerpt for the engine's own diagnostics"
            }
            Self::Timeout { .. } => "Raise the per-call timeout or narrow the request",
            Self::Config(_) => "Fix the relay configuration value named in the message",
            Self::Io(_) => "Check filesystem permissions and available disk space",
            Self::Serialization(_) => "The engine emitted malformed JSON; retry the request",
        }
    }
}
