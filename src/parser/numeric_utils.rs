//! Sortable numeric prefix coding
//!
//! Numeric fields are indexed as byte terms whose lexicographic order matches
//! numeric order. Each value is written at several precisions: the full value
//! at shift 0, then with the low `shift` bits dropped for range queries. Only
//! the shift-0 term carries the exact value, so uninversion must skip the
//! rest.
//!
//! Layout of one term: a header byte `SHIFT_START + shift`, followed by the
//! sign-flipped value (`value ^ MIN`) shifted right by `shift` and split into
//! big-endian 7-bit groups.

use std::io;

use bytes::Bytes;

use crate::error::{FieldCacheError, Result};
use crate::segment::{DocIdIter, TermsEnum};

/// Header byte of a shift-0 `i64` term
pub const SHIFT_START_LONG: u8 = 0x20;
/// Header byte of a shift-0 `i32` term
pub const SHIFT_START_INT: u8 = 0x60;
/// Maximum encoded length of an `i64` term
pub const BUF_SIZE_LONG: usize = 63 / 7 + 2;
/// Maximum encoded length of an `i32` term
pub const BUF_SIZE_INT: usize = 31 / 7 + 2;
/// Precision step used by numeric fields unless configured otherwise
pub const PRECISION_STEP_DEFAULT: u32 = 4;

/// Encode `value` with its low `shift` bits dropped
pub fn long_to_prefix_coded(value: i64, shift: u32) -> Result<Vec<u8>> {
    if shift > 63 {
        return Err(FieldCacheError::InvalidArgument(format!(
            "illegal shift value {} (must be 0..=63)",
            shift
        )));
    }
    let mut n_chars = ((63 - shift) / 7 + 1) as usize;
    let mut bytes = vec![0u8; n_chars + 1];
    bytes[0] = SHIFT_START_LONG + shift as u8;
    let mut sortable_bits = ((value as u64) ^ 0x8000_0000_0000_0000) >> shift;
    while n_chars > 0 {
        bytes[n_chars] = (sortable_bits & 0x7f) as u8;
        sortable_bits >>= 7;
        n_chars -= 1;
    }
    Ok(bytes)
}

/// Encode `value` with its low `shift` bits dropped
pub fn int_to_prefix_coded(value: i32, shift: u32) -> Result<Vec<u8>> {
    if shift > 31 {
        return Err(FieldCacheError::InvalidArgument(format!(
            "illegal shift value {} (must be 0..=31)",
            shift
        )));
    }
    let mut n_chars = ((31 - shift) / 7 + 1) as usize;
    let mut bytes = vec![0u8; n_chars + 1];
    bytes[0] = SHIFT_START_INT + shift as u8;
    let mut sortable_bits = ((value as u32) ^ 0x8000_0000) >> shift;
    while n_chars > 0 {
        bytes[n_chars] = (sortable_bits & 0x7f) as u8;
        sortable_bits >>= 7;
        n_chars -= 1;
    }
    Ok(bytes)
}

/// Shift encoded in an `i64` term's header byte
pub fn prefix_coded_long_shift(bytes: &[u8]) -> Result<u32> {
    let header = *bytes
        .first()
        .ok_or_else(|| FieldCacheError::malformed(bytes, "empty prefix coded term"))?;
    let shift = header as i32 - SHIFT_START_LONG as i32;
    if !(0..=63).contains(&shift) {
        return Err(FieldCacheError::malformed(
            bytes,
            format!(
                "invalid shift value ({}) in prefix coded bytes (is encoded value really an INT64?)",
                shift
            ),
        ));
    }
    Ok(shift as u32)
}

/// Shift encoded in an `i32` term's header byte
pub fn prefix_coded_int_shift(bytes: &[u8]) -> Result<u32> {
    let header = *bytes
        .first()
        .ok_or_else(|| FieldCacheError::malformed(bytes, "empty prefix coded term"))?;
    let shift = header as i32 - SHIFT_START_INT as i32;
    if !(0..=31).contains(&shift) {
        return Err(FieldCacheError::malformed(
            bytes,
            format!(
                "invalid shift value ({}) in prefix coded bytes (is encoded value really an INT32?)",
                shift
            ),
        ));
    }
    Ok(shift as u32)
}

/// Decode an `i64` term. Terms at a non-zero shift decode to the value with
/// its low bits cleared.
pub fn prefix_coded_to_long(bytes: &[u8]) -> Result<i64> {
    let shift = prefix_coded_long_shift(bytes)?;
    let mut sortable_bits: u64 = 0;
    for (pos, &b) in bytes.iter().enumerate().skip(1) {
        if b > 0x7f {
            return Err(FieldCacheError::malformed(
                bytes,
                format!("byte {:#04x} at position {} is invalid", b, pos),
            ));
        }
        sortable_bits = (sortable_bits << 7) | b as u64;
    }
    Ok(((sortable_bits << shift) ^ 0x8000_0000_0000_0000) as i64)
}

/// Decode an `i32` term. Terms at a non-zero shift decode to the value with
/// its low bits cleared.
pub fn prefix_coded_to_int(bytes: &[u8]) -> Result<i32> {
    let shift = prefix_coded_int_shift(bytes)?;
    let mut sortable_bits: u32 = 0;
    for (pos, &b) in bytes.iter().enumerate().skip(1) {
        if b > 0x7f {
            return Err(FieldCacheError::malformed(
                bytes,
                format!("byte {:#04x} at position {} is invalid", b, pos),
            ));
        }
        sortable_bits = (sortable_bits << 7) | b as u32;
    }
    Ok(((sortable_bits << shift) ^ 0x8000_0000) as i32)
}

/// Map a double onto an `i64` with the same ordering
pub fn double_to_sortable_long(value: f64) -> i64 {
    let bits = value.to_bits() as i64;
    if bits < 0 {
        bits ^ 0x7fff_ffff_ffff_ffff
    } else {
        bits
    }
}

pub fn sortable_long_to_double(bits: i64) -> f64 {
    let bits = if bits < 0 {
        bits ^ 0x7fff_ffff_ffff_ffff
    } else {
        bits
    };
    f64::from_bits(bits as u64)
}

/// Map a float onto an `i32` with the same ordering
pub fn float_to_sortable_int(value: f32) -> i32 {
    let bits = value.to_bits() as i32;
    if bits < 0 {
        bits ^ 0x7fff_ffff
    } else {
        bits
    }
}

pub fn sortable_int_to_float(bits: i32) -> f32 {
    let bits = if bits < 0 { bits ^ 0x7fff_ffff } else { bits };
    f32::from_bits(bits as u32)
}

/// Every term a numeric field indexes for `value`, one per precision level
pub fn int_prefix_coded_terms(value: i32, precision_step: u32) -> Result<Vec<Vec<u8>>> {
    if precision_step == 0 {
        return Err(FieldCacheError::InvalidArgument(
            "precision step must be >= 1".to_string(),
        ));
    }
    (0..32)
        .step_by(precision_step as usize)
        .map(|shift| int_to_prefix_coded(value, shift))
        .collect()
}

/// Every term a numeric field indexes for `value`, one per precision level
pub fn long_prefix_coded_terms(value: i64, precision_step: u32) -> Result<Vec<Vec<u8>>> {
    if precision_step == 0 {
        return Err(FieldCacheError::InvalidArgument(
            "precision step must be >= 1".to_string(),
        ));
    }
    (0..64)
        .step_by(precision_step as usize)
        .map(|shift| long_to_prefix_coded(value, shift))
        .collect()
}

/// Width of the prefix coded values a filter accepts
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PrefixCodedWidth {
    Int,
    Long,
}

impl PrefixCodedWidth {
    fn shift(self, term: &[u8]) -> Result<u32> {
        match self {
            PrefixCodedWidth::Int => prefix_coded_int_shift(term),
            PrefixCodedWidth::Long => prefix_coded_long_shift(term),
        }
    }
}

/// Passes only full-precision (shift 0) terms through.
///
/// Lower-precision terms sort after every shift-0 term, so the first one
/// ends the enumeration. Terms with an unreadable header are passed on for
/// the parser to reject.
pub struct PrefixCodedTermsFilter<'a> {
    inner: Box<dyn TermsEnum + 'a>,
    width: PrefixCodedWidth,
    exhausted: bool,
}

impl<'a> PrefixCodedTermsFilter<'a> {
    pub fn new(inner: Box<dyn TermsEnum + 'a>, width: PrefixCodedWidth) -> Self {
        Self {
            inner,
            width,
            exhausted: false,
        }
    }
}

impl<'a> TermsEnum for PrefixCodedTermsFilter<'a> {
    fn next_term(&mut self) -> io::Result<Option<Bytes>> {
        if self.exhausted {
            return Ok(None);
        }
        match self.inner.next_term()? {
            Some(term) => match self.width.shift(&term) {
                Ok(0) | Err(_) => Ok(Some(term)),
                Ok(_) => {
                    self.exhausted = true;
                    Ok(None)
                }
            },
            None => {
                self.exhausted = true;
                Ok(None)
            }
        }
    }

    fn postings(&self) -> io::Result<DocIdIter<'_>> {
        self.inner.postings()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::segment::TermDictionaryBuilder;

    #[test]
    fn test_int_roundtrip_extremes() {
        for value in [0, 1, -1, 42, i32::MIN, i32::MAX] {
            let bytes = int_to_prefix_coded(value, 0).unwrap();
            assert_eq!(bytes.len(), BUF_SIZE_INT);
            assert_eq!(prefix_coded_to_int(&bytes).unwrap(), value);
        }
    }

    #[test]
    fn test_long_roundtrip_extremes() {
        for value in [0, 1, -1, 1 << 40, i64::MIN, i64::MAX] {
            let bytes = long_to_prefix_coded(value, 0).unwrap();
            assert_eq!(bytes.len(), BUF_SIZE_LONG);
            assert_eq!(prefix_coded_to_long(&bytes).unwrap(), value);
        }
    }

    #[test]
    fn test_lexicographic_order_matches_numeric_order() {
        let values = [i64::MIN, -1000, -1, 0, 1, 7, 1000, i64::MAX];
        let encoded: Vec<Vec<u8>> = values
            .iter()
            .map(|v| long_to_prefix_coded(*v, 0).unwrap())
            .collect();
        assert!(encoded.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_shifted_terms_drop_low_bits() {
        let bytes = int_to_prefix_coded(0x1234_5678, 8).unwrap();
        assert_eq!(prefix_coded_int_shift(&bytes).unwrap(), 8);
        assert_eq!(prefix_coded_to_int(&bytes).unwrap(), 0x1234_5600);
    }

    #[test]
    fn test_invalid_terms_are_malformed() {
        assert!(prefix_coded_to_int(b"19.99").unwrap_err().is_malformed());
        assert!(prefix_coded_to_long(b"").unwrap_err().is_malformed());
        assert!(prefix_coded_to_int(&[SHIFT_START_INT, 0x80]).unwrap_err().is_malformed());
        assert!(int_to_prefix_coded(1, 32).is_err());
    }

    #[test]
    fn test_sortable_float_bits() {
        for value in [0.0f64, -0.0, 1.5, -1.5, f64::INFINITY, f64::NEG_INFINITY, f64::MIN_POSITIVE] {
            let back = sortable_long_to_double(double_to_sortable_long(value));
            assert_eq!(back.to_bits(), value.to_bits());
        }
        for value in [0.0f32, -0.0, 3.25, f32::INFINITY, f32::NEG_INFINITY] {
            let back = sortable_int_to_float(float_to_sortable_int(value));
            assert_eq!(back.to_bits(), value.to_bits());
        }
        assert!(double_to_sortable_long(-0.0) < double_to_sortable_long(0.0));
        assert!(float_to_sortable_int(-2.0) < float_to_sortable_int(-1.0));
    }

    #[test]
    fn test_filter_stops_at_first_lower_precision_term() {
        let mut builder = TermDictionaryBuilder::new();
        for (doc, value) in [5, -3, 70_000].iter().enumerate() {
            for term in int_prefix_coded_terms(*value, PRECISION_STEP_DEFAULT).unwrap() {
                builder.add(&term, doc as u32);
            }
        }
        let dict = builder.build().unwrap();
        assert!(dict.len() > 3);

        let mut filter =
            PrefixCodedTermsFilter::new(Box::new(dict.terms_enum()), PrefixCodedWidth::Int);
        let mut decoded = Vec::new();
        while let Some(term) = filter.next_term().unwrap() {
            decoded.push(prefix_coded_to_int(&term).unwrap());
        }
        assert_eq!(decoded, vec![-3, 5, 70_000]);
        assert!(filter.next_term().unwrap().is_none());
    }
}
