//! Relay Configuration
//!
//! Configuration for the relay core: engine binary, model tier plans,
//! chunking threshold, cache lifetimes, and timer intervals.

use serde::{Deserialize, Serialize};

use crate::models::request::RequestClass;
use crate::utils::error::{RelayError, RelayResult};

/// Environment variable overriding the chunk target size, read once at load
pub const CHUNK_BYTES_ENV: &str = "FARSIGHT_CHUNK_BYTES";

/// One candidate in a model fallback sequence
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "model", rename_all = "snake_case")]
pub enum ModelTier {
    /// A concrete model identifier passed to the engine
    Named(String),
    /// Omit the model argument entirely and let the engine auto-select
    Auto,
}

impl ModelTier {
    /// Identifier recorded in attempt logs and outcomes
    pub fn label(&self) -> &str {
        match self {
            ModelTier::Named(name) => name,
            ModelTier::Auto => "auto",
        }
    }
}

/// Ordered fallback sequence of 2-3 tiers for one request class
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelTierPlan {
    /// Candidates in the order they are attempted
    pub tiers: Vec<ModelTier>,
}

impl ModelTierPlan {
    /// Create a plan from an explicit tier sequence
    pub fn new(tiers: Vec<ModelTier>) -> Self {
        Self { tiers }
    }

    /// Default plan for latency-sensitive requests
    pub fn fast_default() -> Self {
        Self::new(vec![
            ModelTier::Named("gemini-2.5-flash".to_string()),
            ModelTier::Auto,
        ])
    }

    /// Default plan for thorough analysis requests
    pub fn deep_default() -> Self {
        Self::new(vec![
            ModelTier::Named("gemini-2.5-pro".to_string()),
            ModelTier::Named("gemini-2.5-flash".to_string()),
            ModelTier::Auto,
        ])
    }

    /// Tier labels in attempt order
    pub fn labels(&self) -> Vec<String> {
        self.tiers.iter().map(|t| t.label().to_string()).collect()
    }
}

/// Relay core configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelayConfig {
    /// Analysis engine binary name (resolved via PATH)
    #[serde(default = "default_engine_binary")]
    pub engine_binary: String,
    /// Hard per-call timeout in seconds; the child is killed on expiry
    #[serde(default = "default_call_timeout")]
    pub call_timeout_seconds: u64,
    /// Target size of one stored segment in bytes
    #[serde(default = "default_chunk_target_bytes")]
    pub chunk_target_bytes: usize,
    /// Lifetime of a stored segment bundle in seconds
    #[serde(default = "default_segment_ttl")]
    pub segment_ttl_seconds: u64,
    /// Interval of the segment store's background sweep in seconds
    #[serde(default = "default_sweep_interval")]
    pub sweep_interval_seconds: u64,
    /// Interval of the liveness heartbeat in seconds
    #[serde(default = "default_liveness_interval")]
    pub liveness_interval_seconds: u64,
    /// Fallback plan for fast requests
    #[serde(default = "ModelTierPlan::fast_default")]
    pub fast_tiers: ModelTierPlan,
    /// Fallback plan for deep requests
    #[serde(default = "ModelTierPlan::deep_default")]
    pub deep_tiers: ModelTierPlan,
}

fn default_engine_binary() -> String {
    "gemini".to_string()
}

fn default_call_timeout() -> u64 {
    600
}

fn default_chunk_target_bytes() -> usize {
    // Sits comfortably under downstream per-response token limits
    50_000
}

fn default_segment_ttl() -> u64 {
    3600
}

fn default_sweep_interval() -> u64 {
    300
}

fn default_liveness_interval() -> u64 {
    25
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            engine_binary: default_engine_binary(),
            call_timeout_seconds: default_call_timeout(),
            chunk_target_bytes: default_chunk_target_bytes(),
            segment_ttl_seconds: default_segment_ttl(),
            sweep_interval_seconds: default_sweep_interval(),
            liveness_interval_seconds: default_liveness_interval(),
            fast_tiers: ModelTierPlan::fast_default(),
            deep_tiers: ModelTierPlan::deep_default(),
        }
    }
}

impl RelayConfig {
    /// Defaults plus the one-time chunk-size override from the environment
    pub fn load() -> RelayResult<Self> {
        let mut config = Self::default();
        if let Ok(raw) = std::env::var(CHUNK_BYTES_ENV) {
            let bytes: usize = raw.parse().map_err(|_| {
                RelayError::config(format!(
                    "{CHUNK_BYTES_ENV} must be a positive integer, got `{raw}`"
                ))
            })?;
            if bytes == 0 {
                return Err(RelayError::config(format!(
                    "{CHUNK_BYTES_ENV} must be non-zero"
                )));
            }
            config.chunk_target_bytes = bytes;
        }
        Ok(config)
    }

    /// The fallback plan for a request class
    pub fn plan_for(&self, class: RequestClass) -> &ModelTierPlan {
        match class {
            RequestClass::Fast => &self.fast_tiers,
            RequestClass::Deep => &self.deep_tiers,
        }
    }
}
