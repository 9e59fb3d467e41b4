//! Diagnostic view of one live cache entry

use std::fmt;
use std::sync::{Arc, OnceLock};

use super::key::{EntryCustom, EntryKind};
use super::value::CachedValue;
use crate::parser::ParserId;
use crate::segment::SegmentKey;
use crate::values::human_readable_units;

/// Snapshot of a filled entry.
///
/// Size estimation is deferred until [`CacheEntry::estimate_size`] is called
/// and is then shared by every clone of the snapshot.
#[derive(Clone)]
pub struct CacheEntry {
    segment: SegmentKey,
    field: Arc<str>,
    kind: EntryKind,
    parser: Option<ParserId>,
    custom: EntryCustom,
    value: CachedValue,
    size: Arc<OnceLock<usize>>,
}

impl CacheEntry {
    pub(crate) fn new(
        segment: SegmentKey,
        field: Arc<str>,
        kind: EntryKind,
        parser: Option<ParserId>,
        custom: EntryCustom,
        value: CachedValue,
    ) -> Self {
        Self {
            segment,
            field,
            kind,
            parser,
            custom,
            value,
            size: Arc::new(OnceLock::new()),
        }
    }

    pub fn segment(&self) -> SegmentKey {
        self.segment
    }

    pub fn field(&self) -> &str {
        &self.field
    }

    pub fn kind(&self) -> EntryKind {
        self.kind
    }

    /// Parser identity in the key, `None` for the cache-chosen default
    pub fn parser(&self) -> Option<ParserId> {
        self.parser
    }

    pub fn custom(&self) -> EntryCustom {
        self.custom
    }

    pub fn value(&self) -> &CachedValue {
        &self.value
    }

    /// Compute (once) the approximate heap size of the value
    pub fn estimate_size(&self) -> usize {
        *self.size.get_or_init(|| self.value.ram_bytes_used())
    }

    /// Human readable size, if it has been estimated
    pub fn estimated_size(&self) -> Option<String> {
        self.size.get().map(|&bytes| human_readable_units(bytes))
    }
}

impl fmt::Display for CacheEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "'{}'=>'{}',{},{}=>{}#{}",
            self.segment,
            self.field,
            self.kind,
            self.custom,
            self.value.type_name(),
            self.value.instance_id()
        )?;
        if let Some(size) = self.estimated_size() {
            write!(f, " (size =~ {})", size)?;
        }
        Ok(())
    }
}

impl fmt::Debug for CacheEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CacheEntry({})", self)
    }
}
