//! Cache keys

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::parser::ParserId;

/// What a cache entry holds
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum EntryKind {
    Byte,
    Int16,
    Int32,
    Int64,
    Single,
    Double,
    DocsWithField,
    Terms,
    TermsIndex,
    DocTermOrds,
}

impl EntryKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntryKind::Byte => "Byte",
            EntryKind::Int16 => "Int16",
            EntryKind::Int32 => "Int32",
            EntryKind::Int64 => "Int64",
            EntryKind::Single => "Single",
            EntryKind::Double => "Double",
            EntryKind::DocsWithField => "DocsWithField",
            EntryKind::Terms => "Terms",
            EntryKind::TermsIndex => "TermsIndex",
            EntryKind::DocTermOrds => "DocTermOrds",
        }
    }

    pub fn is_numeric(&self) -> bool {
        matches!(
            self,
            EntryKind::Byte
                | EntryKind::Int16
                | EntryKind::Int32
                | EntryKind::Int64
                | EntryKind::Single
                | EntryKind::Double
        )
    }

    /// Whether both kinds may be cached for one field without a mismatch.
    ///
    /// Docs-with-field is a side product of every other kind.
    pub fn is_compatible_with(&self, other: EntryKind) -> bool {
        *self == other || *self == EntryKind::DocsWithField || other == EntryKind::DocsWithField
    }
}

impl fmt::Display for EntryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Key within one segment's entry table
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub field: Arc<str>,
    pub kind: EntryKind,
    /// `None` when the caller let the cache pick a parser
    pub parser: Option<ParserId>,
}

impl CacheKey {
    pub fn new(field: &str, kind: EntryKind, parser: Option<ParserId>) -> Self {
        Self {
            field: Arc::from(field),
            kind,
            parser,
        }
    }
}

/// Diagnostic discriminator recorded next to an entry.
///
/// Never part of key equality: the overhead ratio shown here is whatever
/// the first filling caller asked for.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum EntryCustom {
    Default,
    Parser(ParserId, &'static str),
    OverheadRatio(f32),
}

impl fmt::Display for EntryCustom {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntryCustom::Default => f.write_str("null"),
            EntryCustom::Parser(_, name) => f.write_str(name),
            EntryCustom::OverheadRatio(ratio) => write!(f, "acceptableOverheadRatio={}", ratio),
        }
    }
}
