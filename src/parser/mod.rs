//! Value parsers
//!
//! A parser turns one raw term into a typed scalar and may narrow the term
//! enumeration it is fed (prefix coded fields only expose their shift-0
//! terms). Parsers take part in cache keys by identity: every parser is
//! reached through a [`ParserRef`] carrying a [`ParserId`], and two refs are
//! the same cache participant only when their ids match. Callers are expected
//! to reuse the built-in constants below; custom parsers get a fresh id from
//! [`register_parser`].

pub mod numeric_utils;

use std::fmt;
use std::marker::PhantomData;
use std::str::FromStr;
use std::sync::atomic::{AtomicU32, Ordering};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{FieldCacheError, Result};
use crate::segment::TermsEnum;
use numeric_utils::{PrefixCodedTermsFilter, PrefixCodedWidth};

/// Strategy for decoding one term into a scalar
pub trait ValueParser<T>: Send + Sync {
    /// Decode a raw term
    fn parse(&self, term: &[u8]) -> Result<T>;

    /// Narrow the enumeration before uninversion. Defaults to every term.
    fn terms_enum<'a>(&self, terms: Box<dyn TermsEnum + 'a>) -> Box<dyn TermsEnum + 'a> {
        terms
    }

    /// Name shown in diagnostics
    fn name(&self) -> &str;
}

/// Identity of a parser inside cache keys
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ParserId(pub u32);

impl ParserId {
    pub const DEFAULT_BYTE: ParserId = ParserId(1);
    pub const DEFAULT_INT16: ParserId = ParserId(2);
    pub const DEFAULT_INT32: ParserId = ParserId(3);
    pub const DEFAULT_SINGLE: ParserId = ParserId(4);
    pub const DEFAULT_INT64: ParserId = ParserId(5);
    pub const DEFAULT_DOUBLE: ParserId = ParserId(6);
    pub const PREFIX_CODED_INT32: ParserId = ParserId(7);
    pub const PREFIX_CODED_SINGLE: ParserId = ParserId(8);
    pub const PREFIX_CODED_INT64: ParserId = ParserId(9);
    pub const PREFIX_CODED_DOUBLE: ParserId = ParserId(10);

    /// First id handed to registered parsers
    pub const FIRST_CUSTOM: u32 = 64;

    pub fn is_builtin(self) -> bool {
        self.0 < Self::FIRST_CUSTOM
    }
}

impl fmt::Display for ParserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "parser_{}", self.0)
    }
}

/// Handle onto a process-lifetime parser instance
pub struct ParserRef<T: 'static> {
    id: ParserId,
    parser: &'static dyn ValueParser<T>,
}

impl<T: 'static> ParserRef<T> {
    pub fn id(&self) -> ParserId {
        self.id
    }

    pub fn name(&self) -> &'static str {
        self.parser.name()
    }

    pub fn parse(&self, term: &[u8]) -> Result<T> {
        self.parser.parse(term)
    }

    pub fn terms_enum<'a>(&self, terms: Box<dyn TermsEnum + 'a>) -> Box<dyn TermsEnum + 'a> {
        self.parser.terms_enum(terms)
    }
}

impl<T: 'static> Clone for ParserRef<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T: 'static> Copy for ParserRef<T> {}

impl<T: 'static> PartialEq for ParserRef<T> {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl<T: 'static> Eq for ParserRef<T> {}

impl<T: 'static> fmt::Debug for ParserRef<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ParserRef")
            .field("id", &self.id)
            .field("name", &self.name())
            .finish()
    }
}

static NEXT_PARSER_ID: AtomicU32 = AtomicU32::new(ParserId::FIRST_CUSTOM);

/// Register a custom parser and get a handle with a fresh identity.
///
/// The instance is kept for the rest of the process. Register each parser
/// once and reuse the handle: registering the same logic twice yields two
/// distinct cache participants.
pub fn register_parser<T: 'static>(parser: Box<dyn ValueParser<T>>) -> ParserRef<T> {
    let id = ParserId(NEXT_PARSER_ID.fetch_add(1, Ordering::Relaxed));
    let parser: &'static dyn ValueParser<T> = Box::leak(parser);
    debug!("Registered value parser {} as {}", parser.name(), id);
    ParserRef { id, parser }
}

fn term_text(term: &[u8]) -> Result<&str> {
    std::str::from_utf8(term).map_err(|e| FieldCacheError::malformed(term, e.to_string()))
}

/// Base-10 integer text, optional sign, surrounding whitespace allowed
pub struct IntegerTextParser<T> {
    name: &'static str,
    _marker: PhantomData<fn() -> T>,
}

impl<T> ValueParser<T> for IntegerTextParser<T>
where
    T: FromStr<Err = std::num::ParseIntError>,
{
    fn parse(&self, term: &[u8]) -> Result<T> {
        term_text(term)?
            .trim()
            .parse::<T>()
            .map_err(|e| FieldCacheError::malformed(term, e.to_string()))
    }

    fn name(&self) -> &str {
        self.name
    }
}

/// Decimal or exponent text. Overflow yields infinity and `-0` keeps its sign.
pub struct DoubleTextParser;

impl ValueParser<f64> for DoubleTextParser {
    fn parse(&self, term: &[u8]) -> Result<f64> {
        let text = term_text(term)?.trim();
        let value = text
            .parse::<f64>()
            .map_err(|e| FieldCacheError::malformed(term, e.to_string()))?;
        // Some float grammars normalize "-0" to +0.0; force the sign back.
        if value == 0.0 && text.starts_with('-') {
            return Ok(-0.0);
        }
        Ok(value)
    }

    fn name(&self) -> &str {
        "DEFAULT_DOUBLE_PARSER"
    }
}

/// Parses as a double, then narrows
pub struct SingleTextParser;

impl ValueParser<f32> for SingleTextParser {
    fn parse(&self, term: &[u8]) -> Result<f32> {
        DoubleTextParser.parse(term).map(|v| v as f32)
    }

    fn name(&self) -> &str {
        "DEFAULT_SINGLE_PARSER"
    }
}

pub struct PrefixCodedInt32Parser;

impl ValueParser<i32> for PrefixCodedInt32Parser {
    fn parse(&self, term: &[u8]) -> Result<i32> {
        numeric_utils::prefix_coded_to_int(term)
    }

    fn terms_enum<'a>(&self, terms: Box<dyn TermsEnum + 'a>) -> Box<dyn TermsEnum + 'a> {
        Box::new(PrefixCodedTermsFilter::new(terms, PrefixCodedWidth::Int))
    }

    fn name(&self) -> &str {
        "PREFIX_CODED_INT32_PARSER"
    }
}

pub struct PrefixCodedSingleParser;

impl ValueParser<f32> for PrefixCodedSingleParser {
    fn parse(&self, term: &[u8]) -> Result<f32> {
        numeric_utils::prefix_coded_to_int(term).map(numeric_utils::sortable_int_to_float)
    }

    fn terms_enum<'a>(&self, terms: Box<dyn TermsEnum + 'a>) -> Box<dyn TermsEnum + 'a> {
        Box::new(PrefixCodedTermsFilter::new(terms, PrefixCodedWidth::Int))
    }

    fn name(&self) -> &str {
        "PREFIX_CODED_SINGLE_PARSER"
    }
}

pub struct PrefixCodedInt64Parser;

impl ValueParser<i64> for PrefixCodedInt64Parser {
    fn parse(&self, term: &[u8]) -> Result<i64> {
        numeric_utils::prefix_coded_to_long(term)
    }

    fn terms_enum<'a>(&self, terms: Box<dyn TermsEnum + 'a>) -> Box<dyn TermsEnum + 'a> {
        Box::new(PrefixCodedTermsFilter::new(terms, PrefixCodedWidth::Long))
    }

    fn name(&self) -> &str {
        "PREFIX_CODED_INT64_PARSER"
    }
}

pub struct PrefixCodedDoubleParser;

impl ValueParser<f64> for PrefixCodedDoubleParser {
    fn parse(&self, term: &[u8]) -> Result<f64> {
        numeric_utils::prefix_coded_to_long(term).map(numeric_utils::sortable_long_to_double)
    }

    fn terms_enum<'a>(&self, terms: Box<dyn TermsEnum + 'a>) -> Box<dyn TermsEnum + 'a> {
        Box::new(PrefixCodedTermsFilter::new(terms, PrefixCodedWidth::Long))
    }

    fn name(&self) -> &str {
        "PREFIX_CODED_DOUBLE_PARSER"
    }
}

pub const DEFAULT_BYTE_PARSER: ParserRef<i8> = ParserRef {
    id: ParserId::DEFAULT_BYTE,
    parser: &IntegerTextParser::<i8> {
        name: "DEFAULT_BYTE_PARSER",
        _marker: PhantomData,
    },
};

pub const DEFAULT_INT16_PARSER: ParserRef<i16> = ParserRef {
    id: ParserId::DEFAULT_INT16,
    parser: &IntegerTextParser::<i16> {
        name: "DEFAULT_INT16_PARSER",
        _marker: PhantomData,
    },
};

pub const DEFAULT_INT32_PARSER: ParserRef<i32> = ParserRef {
    id: ParserId::DEFAULT_INT32,
    parser: &IntegerTextParser::<i32> {
        name: "DEFAULT_INT32_PARSER",
        _marker: PhantomData,
    },
};

pub const DEFAULT_SINGLE_PARSER: ParserRef<f32> = ParserRef {
    id: ParserId::DEFAULT_SINGLE,
    parser: &SingleTextParser,
};

pub const DEFAULT_INT64_PARSER: ParserRef<i64> = ParserRef {
    id: ParserId::DEFAULT_INT64,
    parser: &IntegerTextParser::<i64> {
        name: "DEFAULT_INT64_PARSER",
        _marker: PhantomData,
    },
};

pub const DEFAULT_DOUBLE_PARSER: ParserRef<f64> = ParserRef {
    id: ParserId::DEFAULT_DOUBLE,
    parser: &DoubleTextParser,
};

pub const PREFIX_CODED_INT32_PARSER: ParserRef<i32> = ParserRef {
    id: ParserId::PREFIX_CODED_INT32,
    parser: &PrefixCodedInt32Parser,
};

pub const PREFIX_CODED_SINGLE_PARSER: ParserRef<f32> = ParserRef {
    id: ParserId::PREFIX_CODED_SINGLE,
    parser: &PrefixCodedSingleParser,
};

pub const PREFIX_CODED_INT64_PARSER: ParserRef<i64> = ParserRef {
    id: ParserId::PREFIX_CODED_INT64,
    parser: &PrefixCodedInt64Parser,
};

pub const PREFIX_CODED_DOUBLE_PARSER: ParserRef<f64> = ParserRef {
    id: ParserId::PREFIX_CODED_DOUBLE,
    parser: &PrefixCodedDoubleParser,
};

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::numeric_utils::{double_to_sortable_long, long_to_prefix_coded};

    #[test]
    fn test_integer_parsers() {
        assert_eq!(DEFAULT_INT32_PARSER.parse(b"-42").unwrap(), -42);
        assert_eq!(DEFAULT_INT32_PARSER.parse(b" +7 ").unwrap(), 7);
        assert_eq!(DEFAULT_INT64_PARSER.parse(b"9000000000").unwrap(), 9_000_000_000);
        assert_eq!(DEFAULT_INT16_PARSER.parse(b"-32768").unwrap(), i16::MIN);
        assert_eq!(DEFAULT_BYTE_PARSER.parse(b"-128").unwrap(), i8::MIN);
    }

    #[test]
    fn test_integer_out_of_range_fails() {
        assert!(DEFAULT_BYTE_PARSER.parse(b"128").unwrap_err().is_malformed());
        assert!(DEFAULT_INT16_PARSER.parse(b"40000").unwrap_err().is_malformed());
        assert!(DEFAULT_INT32_PARSER.parse(b"2147483648").unwrap_err().is_malformed());
        assert!(DEFAULT_INT32_PARSER.parse(b"1.5").unwrap_err().is_malformed());
        assert!(DEFAULT_INT32_PARSER.parse(&[0xff, 0xfe]).unwrap_err().is_malformed());
    }

    #[test]
    fn test_double_parser_edge_values() {
        assert_eq!(DEFAULT_DOUBLE_PARSER.parse(b"19.99").unwrap(), 19.99);

        let neg_zero = DEFAULT_DOUBLE_PARSER.parse(b"-0").unwrap();
        assert_eq!(neg_zero, 0.0);
        assert!(neg_zero.is_sign_negative());

        let neg_zero = DEFAULT_DOUBLE_PARSER.parse(b" -0.000").unwrap();
        assert!(neg_zero.is_sign_negative());
        assert!(DEFAULT_DOUBLE_PARSER.parse(b"0").unwrap().is_sign_positive());

        assert_eq!(DEFAULT_DOUBLE_PARSER.parse(b"1e400").unwrap(), f64::INFINITY);
        assert!(DEFAULT_DOUBLE_PARSER.parse(b"abc").unwrap_err().is_malformed());
    }

    #[test]
    fn test_single_parser_narrows_through_double() {
        assert_eq!(DEFAULT_SINGLE_PARSER.parse(b"1e300").unwrap(), f32::INFINITY);
        assert_eq!(DEFAULT_SINGLE_PARSER.parse(b"-1e300").unwrap(), f32::NEG_INFINITY);
        assert!(DEFAULT_SINGLE_PARSER.parse(b"-0").unwrap().is_sign_negative());
        assert_eq!(DEFAULT_SINGLE_PARSER.parse(b"2.5").unwrap(), 2.5);
    }

    #[test]
    fn test_prefix_coded_double_parser() {
        let term = long_to_prefix_coded(double_to_sortable_long(-0.0), 0).unwrap();
        let parsed = PREFIX_CODED_DOUBLE_PARSER.parse(&term).unwrap();
        assert_eq!(parsed.to_bits(), (-0.0f64).to_bits());

        // Byte above 0x7f after the header
        assert!(PREFIX_CODED_DOUBLE_PARSER.parse(&[0x20, 0x80]).unwrap_err().is_malformed());
        // Header below the long shift range
        assert!(PREFIX_CODED_DOUBLE_PARSER.parse(&[0x1f, 0x01]).unwrap_err().is_malformed());
        assert!(PREFIX_CODED_DOUBLE_PARSER.parse(b"").unwrap_err().is_malformed());
    }

    #[test]
    fn test_prefix_coded_double_parser_shifted_term() {
        let sortable = double_to_sortable_long(19.99);
        let term = long_to_prefix_coded(sortable, 8).unwrap();
        let parsed = PREFIX_CODED_DOUBLE_PARSER.parse(&term).unwrap();
        assert_eq!(parsed.to_bits(), 19.99f64.to_bits() & !0xff);
    }

    #[test]
    fn test_builtin_identities_are_distinct() {
        let ids = [
            DEFAULT_BYTE_PARSER.id(),
            DEFAULT_INT16_PARSER.id(),
            DEFAULT_INT32_PARSER.id(),
            DEFAULT_SINGLE_PARSER.id(),
            DEFAULT_INT64_PARSER.id(),
            DEFAULT_DOUBLE_PARSER.id(),
            PREFIX_CODED_INT32_PARSER.id(),
            PREFIX_CODED_SINGLE_PARSER.id(),
            PREFIX_CODED_INT64_PARSER.id(),
            PREFIX_CODED_DOUBLE_PARSER.id(),
        ];
        let unique: std::collections::HashSet<_> = ids.iter().collect();
        assert_eq!(unique.len(), ids.len());
        assert!(ids.iter().all(|id| id.is_builtin()));
        assert_eq!(DEFAULT_INT32_PARSER.name(), "DEFAULT_INT32_PARSER");
    }

    struct HexParser;

    impl ValueParser<i32> for HexParser {
        fn parse(&self, term: &[u8]) -> Result<i32> {
            let text = term_text(term)?;
            i32::from_str_radix(text, 16).map_err(|e| FieldCacheError::malformed(term, e.to_string()))
        }

        fn name(&self) -> &str {
            "HexParser"
        }
    }

    #[test]
    fn test_registered_parsers_get_fresh_identities() {
        let a = register_parser::<i32>(Box::new(HexParser));
        let b = register_parser::<i32>(Box::new(HexParser));

        assert_ne!(a, b);
        assert!(!a.id().is_builtin());
        assert_eq!(a.parse(b"ff").unwrap(), 255);
        assert_eq!(a, a.clone());
    }
}
