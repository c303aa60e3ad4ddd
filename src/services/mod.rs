//! Services
//!
//! Business logic services for the relay core. Leaves first: the path
//! guard, process runner, segmenter, and segment store have no dependencies
//! on each other; the orchestrator composes the runner, and the liveness
//! notifier consumes the orchestrator's progress channel.

pub mod liveness;
pub mod orchestrator;
pub mod path_guard;
pub mod runner;
pub mod segment_store;
pub mod segmenter;

pub use liveness::{CallMonitor, LivenessMonitor, StatusEmitter};
pub use orchestrator::{Orchestrator, ProgressEvent, ProgressSink, SAFETY_PREAMBLE};
pub use path_guard::{validate, validate_batch};
pub use runner::{CommandSpec, EngineInvoker, OutputSink, ProcessRunner};
pub use segment_store::{SegmentBundle, SegmentStore};
pub use segmenter::split;
