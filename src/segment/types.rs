//! Core types for the segment collaborator

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_SEGMENT_KEY: AtomicU64 = AtomicU64::new(1);

/// Process-stable identity of one immutable segment core.
///
/// Every reader over the same core reports the same key; a reader over new
/// data must allocate a fresh one.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SegmentKey(pub u64);

impl SegmentKey {
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    /// Allocate a key that no other core in this process has used
    pub fn allocate() -> Self {
        Self(NEXT_SEGMENT_KEY.fetch_add(1, Ordering::Relaxed))
    }

    pub fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Display for SegmentKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "segment_{}", self.0)
    }
}

/// Dense document number within a segment (0..max_doc)
pub type DocId = u32;
