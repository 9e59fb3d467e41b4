//! Per-document byte values
//!
//! Distinct terms are concatenated into one buffer; each document points at
//! one of them.

use std::fmt;
use std::mem;

use bytes::{Bytes, BytesMut};

use super::packed::PackedOrds;
use super::ram::RamUsage;
use crate::config::overhead;
use crate::segment::DocId;

pub struct TermValues {
    data: Bytes,
    /// Start of each stored term, plus a trailing end offset
    offsets: Box<[u32]>,
    /// `term index + 1` per document
    doc_terms: PackedOrds,
    max_doc: u32,
}

impl TermValues {
    pub fn empty(max_doc: u32) -> Self {
        TermValuesBuilder::new().build(&[], max_doc, overhead::COMPACT)
    }

    /// Value of `doc`, empty when it has none
    pub fn get(&self, doc: DocId) -> &[u8] {
        match self.doc_terms.get(doc as usize) {
            0 => &[],
            stored => {
                let i = (stored - 1) as usize;
                &self.data[self.offsets[i] as usize..self.offsets[i + 1] as usize]
            }
        }
    }

    pub fn has_value(&self, doc: DocId) -> bool {
        self.doc_terms.get(doc as usize) != 0
    }

    pub fn len(&self) -> usize {
        self.max_doc as usize
    }

    pub fn is_empty(&self) -> bool {
        self.max_doc == 0
    }

    /// Number of distinct stored values
    pub fn value_count(&self) -> usize {
        self.offsets.len().saturating_sub(1)
    }
}

impl RamUsage for TermValues {
    fn ram_bytes_used(&self) -> usize {
        mem::size_of::<Self>()
            + self.data.len()
            + self.offsets.ram_bytes_used()
            + self.doc_terms.ram_bytes_used()
    }
}

impl fmt::Debug for TermValues {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TermValues")
            .field("value_count", &self.value_count())
            .field("data_bytes", &self.data.len())
            .field("max_doc", &self.max_doc)
            .finish()
    }
}

/// Accumulates distinct terms in enumeration order
#[derive(Default)]
pub struct TermValuesBuilder {
    data: BytesMut,
    offsets: Vec<u32>,
}

impl TermValuesBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a term and return its `index + 1`
    pub fn push(&mut self, term: &[u8]) -> u32 {
        self.offsets.push(self.data.len() as u32);
        self.data.extend_from_slice(term);
        self.offsets.len() as u32
    }

    /// Finish with per-document `index + 1` values
    pub fn build(mut self, doc_terms: &[u32], max_doc: u32, overhead_ratio: f32) -> TermValues {
        self.offsets.push(self.data.len() as u32);
        TermValues {
            data: self.data.freeze(),
            offsets: self.offsets.into_boxed_slice(),
            doc_terms: PackedOrds::from_values(doc_terms, overhead_ratio),
            max_doc,
        }
    }
}
