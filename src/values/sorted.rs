//! Sorted single-valued terms index
//!
//! Each document maps to at most one ordinal; ordinals index the field's
//! distinct terms in ascending byte order.

use std::fmt;
use std::mem;

use bytes::Bytes;

use super::packed::PackedOrds;
use super::ram::RamUsage;
use crate::config::overhead;
use crate::segment::DocId;

pub struct SortedTerms {
    terms: Vec<Bytes>,
    doc_ords: PackedOrds,
    max_doc: u32,
}

impl SortedTerms {
    /// Build from sorted distinct `terms` and per-doc `ord + 1` values
    pub fn new(terms: Vec<Bytes>, doc_ords: PackedOrds, max_doc: u32) -> Self {
        Self {
            terms,
            doc_ords,
            max_doc,
        }
    }

    pub fn empty(max_doc: u32) -> Self {
        Self::new(Vec::new(), PackedOrds::from_values(&[], overhead::COMPACT), max_doc)
    }

    /// Ordinal of the document's term, `None` when it has none
    pub fn ord(&self, doc: DocId) -> Option<u32> {
        match self.doc_ords.get(doc as usize) {
            0 => None,
            stored => Some(stored - 1),
        }
    }

    pub fn lookup_ord(&self, ord: u32) -> Option<&[u8]> {
        self.terms.get(ord as usize).map(|t| t.as_ref())
    }

    /// Term of the document
    pub fn get(&self, doc: DocId) -> Option<&[u8]> {
        self.ord(doc).and_then(|ord| self.lookup_ord(ord))
    }

    /// Number of distinct terms
    pub fn value_count(&self) -> u32 {
        self.terms.len() as u32
    }

    /// Binary search for `term`: `Ok(ord)` if present, else `Err(insertion point)`
    pub fn lookup_term(&self, term: &[u8]) -> Result<u32, u32> {
        self.terms
            .binary_search_by(|probe| probe.as_ref().cmp(term))
            .map(|i| i as u32)
            .map_err(|i| i as u32)
    }

    pub fn term_iter(&self) -> impl Iterator<Item = &[u8]> {
        self.terms.iter().map(|t| t.as_ref())
    }

    pub fn len(&self) -> usize {
        self.max_doc as usize
    }

    pub fn is_empty(&self) -> bool {
        self.max_doc == 0
    }

    /// Bits per document ordinal
    pub fn bits_per_ord(&self) -> u32 {
        self.doc_ords.bits_per_value()
    }
}

pub(crate) fn terms_ram_bytes(terms: &[Bytes]) -> usize {
    terms.iter().map(|t| t.len() + mem::size_of::<Bytes>()).sum()
}

impl RamUsage for SortedTerms {
    fn ram_bytes_used(&self) -> usize {
        mem::size_of::<Self>() + terms_ram_bytes(&self.terms) + self.doc_ords.ram_bytes_used()
    }
}

impl fmt::Debug for SortedTerms {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SortedTerms")
            .field("value_count", &self.terms.len())
            .field("max_doc", &self.max_doc)
            .field("doc_ords", &self.doc_ords)
            .finish()
    }
}
