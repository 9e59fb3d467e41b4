//! Multi-valued sorted-set ordinals

use std::fmt;
use std::mem;

use bytes::Bytes;

use super::ram::RamUsage;
use super::sorted::terms_ram_bytes;
use crate::segment::DocId;

/// Per-document ordinal sets in compressed sparse row form
pub struct TermOrdinals {
    terms: Vec<Bytes>,
    /// `doc_starts[d]..doc_starts[d + 1]` slices `ords`
    doc_starts: Box<[u32]>,
    ords: Box<[u32]>,
}

impl TermOrdinals {
    /// Build from sorted distinct `terms` and `(doc, ord)` pairs.
    ///
    /// Pairs may arrive in any order; duplicates are dropped.
    pub fn new(terms: Vec<Bytes>, mut pairs: Vec<(DocId, u32)>, max_doc: u32) -> Self {
        pairs.sort_unstable();
        pairs.dedup();

        let mut doc_starts = vec![0u32; max_doc as usize + 1];
        for &(doc, _) in &pairs {
            if (doc as usize) < max_doc as usize {
                doc_starts[doc as usize + 1] += 1;
            }
        }
        for i in 1..doc_starts.len() {
            doc_starts[i] += doc_starts[i - 1];
        }

        let ords: Vec<u32> = pairs
            .into_iter()
            .filter(|&(doc, _)| doc < max_doc)
            .map(|(_, ord)| ord)
            .collect();

        Self {
            terms,
            doc_starts: doc_starts.into_boxed_slice(),
            ords: ords.into_boxed_slice(),
        }
    }

    pub fn empty(max_doc: u32) -> Self {
        Self::new(Vec::new(), Vec::new(), max_doc)
    }

    /// Ascending ordinals of `doc`
    pub fn ords(&self, doc: DocId) -> &[u32] {
        let doc = doc as usize;
        if doc + 1 >= self.doc_starts.len() {
            return &[];
        }
        &self.ords[self.doc_starts[doc] as usize..self.doc_starts[doc + 1] as usize]
    }

    pub fn lookup_ord(&self, ord: u32) -> Option<&[u8]> {
        self.terms.get(ord as usize).map(|t| t.as_ref())
    }

    /// Terms of `doc` in ascending order
    pub fn terms_of(&self, doc: DocId) -> impl Iterator<Item = &[u8]> {
        self.ords(doc)
            .iter()
            .filter_map(move |&ord| self.lookup_ord(ord))
    }

    pub fn lookup_term(&self, term: &[u8]) -> Result<u32, u32> {
        self.terms
            .binary_search_by(|probe| probe.as_ref().cmp(term))
            .map(|i| i as u32)
            .map_err(|i| i as u32)
    }

    pub fn value_count(&self) -> u32 {
        self.terms.len() as u32
    }

    pub fn len(&self) -> usize {
        self.doc_starts.len() - 1
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl RamUsage for TermOrdinals {
    fn ram_bytes_used(&self) -> usize {
        mem::size_of::<Self>()
            + terms_ram_bytes(&self.terms)
            + self.doc_starts.ram_bytes_used()
            + self.ords.ram_bytes_used()
    }
}

impl fmt::Debug for TermOrdinals {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TermOrdinals")
            .field("value_count", &self.terms.len())
            .field("max_doc", &self.len())
            .field("ords", &self.ords.len())
            .finish()
    }
}
