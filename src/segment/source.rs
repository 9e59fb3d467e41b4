//! The read-side seam between the field cache and a segment
//!
//! The cache never touches segment files itself. Everything it needs comes
//! through [`SegmentSource`]: an identity, a document count, ordered term
//! enumeration with postings, and an optional pre-decoded numeric channel.

use std::io;
use std::sync::Arc;

use bytes::Bytes;

use super::docvalues::NumericColumn;
use super::types::{DocId, SegmentKey};

/// Iterator over the document ids of one term's postings
pub type DocIdIter<'a> = Box<dyn Iterator<Item = DocId> + 'a>;

/// Callback fired once when a segment core is closed
pub type CoreClosedListener = Box<dyn FnOnce(SegmentKey) + Send>;

/// Forward-only enumeration of a field's terms in ascending byte order
pub trait TermsEnum {
    /// Advance to the next term, or `None` once exhausted
    fn next_term(&mut self) -> io::Result<Option<Bytes>>;

    /// Postings of the current term
    fn postings(&self) -> io::Result<DocIdIter<'_>>;
}

/// Read access to one immutable segment
pub trait SegmentSource: Send + Sync {
    /// Identity of the underlying core. Equal for readers sharing a core.
    fn core_key(&self) -> SegmentKey;

    /// Number of documents in the segment, deleted ones included
    fn max_doc(&self) -> u32;

    /// Terms of `field`, or `None` if the field is not indexed
    fn terms(&self, field: &str) -> io::Result<Option<Box<dyn TermsEnum + '_>>>;

    /// Pre-decoded per-document numeric values for `field`, if it has them
    fn numeric_values(&self, _field: &str) -> io::Result<Option<Arc<NumericColumn>>> {
        Ok(None)
    }

    /// Register a callback for when the core is closed.
    ///
    /// Sources without a close hook may ignore this; cached entries then
    /// live until purged explicitly.
    fn add_core_closed_listener(&self, _listener: CoreClosedListener) {}
}

impl<S: SegmentSource + ?Sized> SegmentSource for Arc<S> {
    fn core_key(&self) -> SegmentKey {
        (**self).core_key()
    }

    fn max_doc(&self) -> u32 {
        (**self).max_doc()
    }

    fn terms(&self, field: &str) -> io::Result<Option<Box<dyn TermsEnum + '_>>> {
        (**self).terms(field)
    }

    fn numeric_values(&self, field: &str) -> io::Result<Option<Arc<NumericColumn>>> {
        (**self).numeric_values(field)
    }

    fn add_core_closed_listener(&self, listener: CoreClosedListener) {
        (**self).add_core_closed_listener(listener)
    }
}
