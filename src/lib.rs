//! Farsight - Research Request Relay Core
//!
//! The execution-orchestration and response-management core of a research
//! relay: it validates path references against a trusted root, drives a
//! tiered-fallback invocation of an external large-context analysis CLI,
//! partitions oversized answers into retrievable segments with bounded
//! lifetime, and emits liveness signals for long-running calls.
//!
//! The outer dispatch envelope (request parsing, transport, setup wizard)
//! lives in the embedding system; this crate owns the state machines,
//! timing, and failure recovery underneath it.

pub mod models;
pub mod services;
pub mod utils;

// Re-export the crate surface callers actually use
pub use models::path::{BatchVerdict, PathVerdict};
pub use models::request::{RequestClass, ResearchOutcome, TierAttempt};
pub use models::segment::{BundleMetadata, Segment};
pub use models::settings::{ModelTier, ModelTierPlan, RelayConfig};
pub use services::liveness::{CallMonitor, LivenessMonitor, StatusEmitter};
pub use services::orchestrator::{Orchestrator, ProgressEvent, ProgressSink, SAFETY_PREAMBLE};
pub use services::path_guard::{validate, validate_batch};
pub use services::runner::{CommandSpec, EngineInvoker, OutputSink, ProcessRunner};
pub use services::segment_store::{SegmentBundle, SegmentStore};
pub use services::segmenter::split;
pub use utils::error::{RelayError, RelayResult};
