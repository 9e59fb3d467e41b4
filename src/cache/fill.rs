//! Uninversion: turning a field's terms and postings into per-document
//! containers. Every routine makes exactly one pass over the enumeration.

use std::io;

use bytes::Bytes;
use roaring::RoaringBitmap;

use crate::error::Result;
use crate::parser::ParserRef;
use crate::segment::{DocId, SegmentSource};
use crate::values::{
    DocsWithField, NumericScalar, NumericValues, PackedOrds, SortedTerms, TermOrdinals,
    TermValues, TermValuesBuilder,
};

fn check_doc(field: &str, doc: DocId, max_doc: u32) -> io::Result<usize> {
    if doc >= max_doc {
        return Err(io::Error::new(
            io::ErrorKind::InvalidData,
            format!(
                "postings of field '{}' reference doc {} but max_doc is {}",
                field, doc, max_doc
            ),
        ));
    }
    Ok(doc as usize)
}

/// Decode every term of `field` with `parser` into a dense array.
///
/// The array is only allocated once the first term is seen; a field with no
/// (accepted) terms yields an empty container.
pub(crate) fn uninvert_numeric<T: NumericScalar>(
    segment: &dyn SegmentSource,
    field: &str,
    parser: ParserRef<T>,
    set_docs_with_field: bool,
) -> Result<(NumericValues<T>, Option<RoaringBitmap>)> {
    let max_doc = segment.max_doc();
    let mut docs_with_field = set_docs_with_field.then(RoaringBitmap::new);

    let terms = match segment.terms(field)? {
        Some(terms) => terms,
        None => return Ok((NumericValues::empty(max_doc), docs_with_field)),
    };
    let mut terms = parser.terms_enum(terms);
    let mut values: Option<Vec<T>> = None;

    while let Some(term) = terms.next_term()? {
        let value = parser.parse(&term)?;
        let slots = values.get_or_insert_with(|| vec![T::default(); max_doc as usize]);
        for doc in terms.postings()? {
            slots[check_doc(field, doc, max_doc)?] = value;
            if let Some(bits) = docs_with_field.as_mut() {
                bits.insert(doc);
            }
        }
    }

    let values = values.map_or_else(|| NumericValues::empty(max_doc), NumericValues::dense);
    Ok((values, docs_with_field))
}

/// Mark every document with at least one term in `field`
pub(crate) fn docs_with_field(segment: &dyn SegmentSource, field: &str) -> Result<DocsWithField> {
    let max_doc = segment.max_doc();
    let mut bits = RoaringBitmap::new();

    if let Some(mut terms) = segment.terms(field)? {
        while terms.next_term()?.is_some() {
            for doc in terms.postings()? {
                check_doc(field, doc, max_doc)?;
                bits.insert(doc);
            }
            if bits.len() >= max_doc as u64 {
                break;
            }
        }
    }

    Ok(DocsWithField::from_bits(bits, max_doc))
}

/// One byte value per document, the last term in term order winning
pub(crate) fn uninvert_terms(
    segment: &dyn SegmentSource,
    field: &str,
    set_docs_with_field: bool,
    overhead_ratio: f32,
) -> Result<(TermValues, Option<RoaringBitmap>)> {
    let max_doc = segment.max_doc();
    let mut docs_with_field = set_docs_with_field.then(RoaringBitmap::new);

    let mut terms = match segment.terms(field)? {
        Some(terms) => terms,
        None => return Ok((TermValues::empty(max_doc), docs_with_field)),
    };

    let mut builder = TermValuesBuilder::new();
    let mut doc_terms = vec![0u32; max_doc as usize];
    while let Some(term) = terms.next_term()? {
        let stored = builder.push(&term);
        for doc in terms.postings()? {
            doc_terms[check_doc(field, doc, max_doc)?] = stored;
            if let Some(bits) = docs_with_field.as_mut() {
                bits.insert(doc);
            }
        }
    }

    Ok((
        builder.build(&doc_terms, max_doc, overhead_ratio),
        docs_with_field,
    ))
}

/// Sorted terms plus one ordinal per document
pub(crate) fn uninvert_terms_index(
    segment: &dyn SegmentSource,
    field: &str,
    overhead_ratio: f32,
) -> Result<SortedTerms> {
    let max_doc = segment.max_doc();
    let mut terms = match segment.terms(field)? {
        Some(terms) => terms,
        None => return Ok(SortedTerms::empty(max_doc)),
    };

    let mut distinct: Vec<Bytes> = Vec::new();
    let mut doc_ords = vec![0u32; max_doc as usize];
    while let Some(term) = terms.next_term()? {
        distinct.push(term);
        let stored = distinct.len() as u32;
        for doc in terms.postings()? {
            doc_ords[check_doc(field, doc, max_doc)?] = stored;
        }
    }

    let doc_ords = PackedOrds::from_values(&doc_ords, overhead_ratio);
    Ok(SortedTerms::new(distinct, doc_ords, max_doc))
}

/// Sorted terms plus an ordinal set per document
pub(crate) fn uninvert_doc_term_ords(
    segment: &dyn SegmentSource,
    field: &str,
) -> Result<TermOrdinals> {
    let max_doc = segment.max_doc();
    let mut terms = match segment.terms(field)? {
        Some(terms) => terms,
        None => return Ok(TermOrdinals::empty(max_doc)),
    };

    let mut distinct: Vec<Bytes> = Vec::new();
    let mut pairs: Vec<(DocId, u32)> = Vec::new();
    while let Some(term) = terms.next_term()? {
        let ord = distinct.len() as u32;
        distinct.push(term);
        for doc in terms.postings()? {
            check_doc(field, doc, max_doc)?;
            pairs.push((doc, ord));
        }
    }

    Ok(TermOrdinals::new(distinct, pairs, max_doc))
}
