//! Term dictionary using FST (Finite State Transducer)
//!
//! Maps raw term bytes to an index into a parallel array of roaring posting
//! bitmaps. The FST stream yields terms in byte order, which is the order
//! every uninversion routine relies on.

use std::collections::BTreeMap;
use std::io;

use bytes::Bytes;
use fst::{Map, MapBuilder, Streamer};
use roaring::RoaringBitmap;

use super::source::{DocIdIter, TermsEnum};
use super::types::DocId;

/// Term dictionary backed by FST
pub struct TermDictionary {
    /// FST mapping term -> index in postings array
    fst: Map<Vec<u8>>,
    /// Postings for each term (parallel to FST output values)
    postings: Vec<RoaringBitmap>,
}

impl TermDictionary {
    /// Create a term dictionary from FST data and postings
    pub fn new(fst_data: Vec<u8>, postings: Vec<RoaringBitmap>) -> io::Result<Self> {
        let fst = Map::new(fst_data).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
        if fst.len() != postings.len() {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!(
                    "term count {} does not match postings count {}",
                    fst.len(),
                    postings.len()
                ),
            ));
        }
        Ok(Self { fst, postings })
    }

    /// Look up a term and return its postings
    pub fn get(&self, term: &[u8]) -> Option<&RoaringBitmap> {
        self.fst.get(term).map(|idx| &self.postings[idx as usize])
    }

    /// Check if a term exists
    pub fn contains(&self, term: &[u8]) -> bool {
        self.fst.contains_key(term)
    }

    /// Get the number of terms
    pub fn len(&self) -> usize {
        self.postings.len()
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.postings.is_empty()
    }

    /// Enumerate all terms with their postings
    pub fn terms_enum(&self) -> TermDictionaryEnum<'_> {
        TermDictionaryEnum {
            stream: self.fst.stream(),
            postings: &self.postings,
            current: None,
        }
    }

    /// Get the raw FST data (for serialization)
    pub fn fst_bytes(&self) -> &[u8] {
        self.fst.as_fst().as_bytes()
    }
}

/// [`TermsEnum`] over a [`TermDictionary`]
pub struct TermDictionaryEnum<'a> {
    stream: fst::map::Stream<'a>,
    postings: &'a [RoaringBitmap],
    current: Option<usize>,
}

impl<'a> TermsEnum for TermDictionaryEnum<'a> {
    fn next_term(&mut self) -> io::Result<Option<Bytes>> {
        match self.stream.next() {
            Some((key, idx)) => {
                self.current = Some(idx as usize);
                Ok(Some(Bytes::copy_from_slice(key)))
            }
            None => {
                self.current = None;
                Ok(None)
            }
        }
    }

    fn postings(&self) -> io::Result<DocIdIter<'_>> {
        match self.current {
            Some(idx) => Ok(Box::new(self.postings[idx].iter())),
            None => Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "postings requested without a current term",
            )),
        }
    }
}

/// Builder for term dictionaries. Terms may be added in any order.
#[derive(Default)]
pub struct TermDictionaryBuilder {
    terms: BTreeMap<Vec<u8>, RoaringBitmap>,
}

impl TermDictionaryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record that `doc` contains `term`
    pub fn add(&mut self, term: &[u8], doc: DocId) {
        self.terms.entry(term.to_vec()).or_default().insert(doc);
    }

    /// Record a whole posting list for `term`
    pub fn add_postings(&mut self, term: &[u8], docs: impl IntoIterator<Item = DocId>) {
        self.terms.entry(term.to_vec()).or_default().extend(docs);
    }

    /// Highest document id seen so far
    pub fn max_doc_id(&self) -> Option<DocId> {
        self.terms.values().filter_map(|p| p.max()).max()
    }

    pub fn len(&self) -> usize {
        self.terms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    /// Build the term dictionary
    pub fn build(self) -> io::Result<TermDictionary> {
        let mut fst_builder = MapBuilder::memory();
        let mut postings = Vec::with_capacity(self.terms.len());

        for (idx, (term, docs)) in self.terms.into_iter().enumerate() {
            fst_builder
                .insert(&term, idx as u64)
                .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
            postings.push(docs);
        }

        let fst_data = fst_builder
            .into_inner()
            .map_err(|e| io::Error::new(io::ErrorKind::Other, e))?;

        TermDictionary::new(fst_data, postings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn build_dict() -> TermDictionary {
        let mut builder = TermDictionaryBuilder::new();
        builder.add_postings(b"cherry", [4]);
        builder.add_postings(b"apple", [0, 2]);
        builder.add(b"banana", 1);
        builder.add(b"banana", 3);
        builder.build().unwrap()
    }

    #[test]
    fn test_term_dictionary_builder() {
        let dict = build_dict();

        assert_eq!(dict.len(), 3);
        assert!(dict.contains(b"apple"));
        assert!(dict.contains(b"banana"));
        assert!(!dict.contains(b"date"));

        assert_eq!(dict.get(b"banana").unwrap().len(), 2);
        assert!(dict.get(b"date").is_none());
        assert!(dict.get(b"cherry").unwrap().contains(4));
    }

    #[test]
    fn test_terms_enum_is_sorted() {
        let dict = build_dict();
        let mut terms = dict.terms_enum();

        let mut seen = Vec::new();
        while let Some(term) = terms.next_term().unwrap() {
            let docs: Vec<DocId> = terms.postings().unwrap().collect();
            seen.push((term, docs));
        }

        assert_eq!(seen.len(), 3);
        assert_eq!(&seen[0].0[..], b"apple");
        assert_eq!(seen[0].1, vec![0, 2]);
        assert_eq!(&seen[1].0[..], b"banana");
        assert_eq!(seen[1].1, vec![1, 3]);
        assert_eq!(&seen[2].0[..], b"cherry");
        assert!(terms.postings().is_err());
    }

    #[test]
    fn test_mismatched_postings_rejected() {
        let builder = TermDictionaryBuilder::new();
        let dict = builder.build().unwrap();
        let err = TermDictionary::new(dict.fst_bytes().to_vec(), vec![RoaringBitmap::new()]);
        assert!(err.is_err());
    }
}
