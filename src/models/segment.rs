//! Segment Models
//!
//! Bounded slices of an oversized research result, retrievable by key from
//! the segment store until their bundle expires.

use serde::{Deserialize, Serialize};

/// A contiguous slice of one result's text
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Segment {
    /// 1-based position of this slice within its bundle
    pub index: u32,
    /// Number of segments in the bundle
    pub total_count: u32,
    /// The slice content; concatenating all segments in index order
    /// reproduces the original text exactly
    pub content: String,
}

impl Segment {
    /// Create a segment; `total_count` is usually back-filled by the splitter
    pub fn new(index: u32, total_count: u32, content: impl Into<String>) -> Self {
        Self {
            index,
            total_count,
            content: content.into(),
        }
    }
}

/// Surfaced metadata for a stored bundle
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BundleMetadata {
    /// Number of segments stored under the key
    pub total_count: u32,
    /// Expiry timestamp (RFC 3339); retrieval keys are non-durable and a
    /// process restart discards all bundles regardless
    pub expires_at: String,
}
