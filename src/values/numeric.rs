//! Dense per-document scalar arrays

use std::fmt;
use std::mem;
use std::sync::Arc;

use crate::cache::{CachedValue, EntryKind};
use crate::parser::{self, ParserRef};
use crate::segment::{DocId, NumericColumn};

use super::ram::RamUsage;

/// Per-kind table for the scalar types the cache can uninvert.
///
/// One generic fill routine serves every kind; this trait supplies what
/// differs between them: the zero value (`Default`), the parse grammar,
/// the doc-values narrowing rule, and the cache entry variant.
pub trait NumericScalar: Copy + Default + PartialEq + fmt::Debug + Send + Sync + 'static {
    const KIND: EntryKind;
    const TYPE_NAME: &'static str;

    /// Plain text parser used when the caller passes none
    fn text_parser() -> ParserRef<Self>;

    /// Prefix coded parser tried after the text parser rejects a term
    fn prefix_coded_parser() -> Option<ParserRef<Self>>;

    /// Convert a raw doc-values long
    fn from_doc_value(value: i64) -> Self;

    fn into_cached(values: Arc<NumericValues<Self>>) -> CachedValue;

    fn from_cached(value: &CachedValue) -> Option<Arc<NumericValues<Self>>>;
}

macro_rules! numeric_scalar {
    ($ty:ty, $kind:ident, $name:literal, $text:expr, $prefix:expr, $from:expr) => {
        impl NumericScalar for $ty {
            const KIND: EntryKind = EntryKind::$kind;
            const TYPE_NAME: &'static str = $name;

            fn text_parser() -> ParserRef<Self> {
                $text
            }

            fn prefix_coded_parser() -> Option<ParserRef<Self>> {
                $prefix
            }

            fn from_doc_value(value: i64) -> Self {
                ($from)(value)
            }

            fn into_cached(values: Arc<NumericValues<Self>>) -> CachedValue {
                CachedValue::$kind(values)
            }

            fn from_cached(value: &CachedValue) -> Option<Arc<NumericValues<Self>>> {
                match value {
                    CachedValue::$kind(values) => Some(values.clone()),
                    _ => None,
                }
            }
        }
    };
}

numeric_scalar!(i8, Byte, "i8", parser::DEFAULT_BYTE_PARSER, None, |v: i64| v as i8);
numeric_scalar!(i16, Int16, "i16", parser::DEFAULT_INT16_PARSER, None, |v: i64| v as i16);
numeric_scalar!(
    i32,
    Int32,
    "i32",
    parser::DEFAULT_INT32_PARSER,
    Some(parser::PREFIX_CODED_INT32_PARSER),
    |v: i64| v as i32
);
numeric_scalar!(
    i64,
    Int64,
    "i64",
    parser::DEFAULT_INT64_PARSER,
    Some(parser::PREFIX_CODED_INT64_PARSER),
    |v: i64| v
);
numeric_scalar!(
    f32,
    Single,
    "f32",
    parser::DEFAULT_SINGLE_PARSER,
    Some(parser::PREFIX_CODED_SINGLE_PARSER),
    |v: i64| f32::from_bits(v as u32)
);
numeric_scalar!(
    f64,
    Double,
    "f64",
    parser::DEFAULT_DOUBLE_PARSER,
    Some(parser::PREFIX_CODED_DOUBLE_PARSER),
    |v: i64| f64::from_bits(v as u64)
);

enum Source<T> {
    Dense(Box<[T]>),
    Column(Arc<NumericColumn>),
    Empty,
}

/// Value-by-doc-id container for one scalar kind.
///
/// Documents without a value read as the zero value of `T`.
pub struct NumericValues<T> {
    source: Source<T>,
    max_doc: u32,
}

impl<T: NumericScalar> NumericValues<T> {
    /// Wrap an uninverted array; its length is the segment's doc count
    pub fn dense(values: Vec<T>) -> Self {
        let max_doc = values.len() as u32;
        Self {
            source: Source::Dense(values.into_boxed_slice()),
            max_doc,
        }
    }

    /// View over a pre-decoded numeric channel
    pub fn from_column(column: Arc<NumericColumn>, max_doc: u32) -> Self {
        Self {
            source: Source::Column(column),
            max_doc,
        }
    }

    /// Every document reads as zero
    pub fn empty(max_doc: u32) -> Self {
        Self {
            source: Source::Empty,
            max_doc,
        }
    }

    pub fn get(&self, doc: DocId) -> T {
        match &self.source {
            Source::Dense(values) => values.get(doc as usize).copied().unwrap_or_default(),
            Source::Column(column) => column.get(doc).map(T::from_doc_value).unwrap_or_default(),
            Source::Empty => T::default(),
        }
    }

    /// Number of documents covered
    pub fn len(&self) -> usize {
        self.max_doc as usize
    }

    pub fn is_empty(&self) -> bool {
        self.max_doc == 0
    }

    /// The backing array, when values were uninverted from terms
    pub fn as_slice(&self) -> Option<&[T]> {
        match &self.source {
            Source::Dense(values) => Some(values),
            _ => None,
        }
    }

    pub fn is_doc_values_backed(&self) -> bool {
        matches!(self.source, Source::Column(_))
    }

    pub fn iter(&self) -> impl Iterator<Item = T> + '_ {
        (0..self.max_doc).map(move |doc| self.get(doc))
    }
}

impl<T> RamUsage for NumericValues<T> {
    fn ram_bytes_used(&self) -> usize {
        mem::size_of::<Self>()
            + match &self.source {
                Source::Dense(values) => mem::size_of_val(&**values),
                Source::Column(column) => column.ram_bytes_used(),
                Source::Empty => 0,
            }
    }
}

impl<T: NumericScalar> fmt::Debug for NumericValues<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let source = match &self.source {
            Source::Dense(_) => "dense",
            Source::Column(_) => "doc_values",
            Source::Empty => "empty",
        };
        f.debug_struct("NumericValues")
            .field("type", &T::TYPE_NAME)
            .field("source", &source)
            .field("max_doc", &self.max_doc)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dense_values() {
        let values = NumericValues::dense(vec![3i32, 0, -7]);
        assert_eq!(values.len(), 3);
        assert_eq!(values.get(2), -7);
        assert_eq!(values.get(99), 0);
        assert_eq!(values.as_slice(), Some(&[3, 0, -7][..]));
        assert!(!values.is_doc_values_backed());
    }

    #[test]
    fn test_column_narrowing() {
        let column: NumericColumn = vec![Some(300), None, Some(-1)].into_iter().collect();
        let column = Arc::new(column);

        let bytes = NumericValues::<i8>::from_column(column.clone(), 3);
        assert_eq!(bytes.get(0), 300i64 as i8);
        assert_eq!(bytes.get(1), 0);
        assert!(bytes.is_doc_values_backed());
        assert!(bytes.as_slice().is_none());

        let longs = NumericValues::<i64>::from_column(column, 3);
        assert_eq!(longs.iter().collect::<Vec<_>>(), vec![300, 0, -1]);
    }

    #[test]
    fn test_column_float_bits() {
        let bits = 2.5f64.to_bits() as i64;
        let column: NumericColumn = vec![Some(bits)].into_iter().collect();
        let doubles = NumericValues::<f64>::from_column(Arc::new(column), 1);
        assert_eq!(doubles.get(0), 2.5);

        let bits = (-1.5f32).to_bits() as i64;
        let column: NumericColumn = vec![Some(bits)].into_iter().collect();
        let singles = NumericValues::<f32>::from_column(Arc::new(column), 1);
        assert_eq!(singles.get(0), -1.5);
    }

    #[test]
    fn test_empty_values() {
        let values = NumericValues::<f64>::empty(5);
        assert_eq!(values.len(), 5);
        assert_eq!(values.get(4), 0.0);
        assert!(values.as_slice().is_none());
    }

    #[test]
    fn test_kind_table() {
        assert_eq!(i8::KIND, EntryKind::Byte);
        assert_eq!(f64::KIND, EntryKind::Double);
        assert!(i16::prefix_coded_parser().is_none());
        assert_eq!(
            i64::prefix_coded_parser().map(|p| p.id()),
            Some(parser::PREFIX_CODED_INT64_PARSER.id())
        );
        assert_eq!(f32::text_parser().id(), parser::DEFAULT_SINGLE_PARSER.id());
    }
}
