//! Which documents carry a value for a field

use std::fmt;
use std::mem;

use roaring::RoaringBitmap;

use super::ram::RamUsage;
use crate::segment::DocId;

/// Docs-with-field bitset, compacted when every or no document matches
#[derive(Clone, PartialEq)]
pub enum DocsWithField {
    /// Every document below `max_doc` has a value
    All(u32),
    /// No document has a value
    None(u32),
    Bits { bits: RoaringBitmap, max_doc: u32 },
}

impl DocsWithField {
    /// Store `bits`, collapsing full and empty sets
    pub fn from_bits(bits: RoaringBitmap, max_doc: u32) -> Self {
        let cardinality = bits.len();
        if cardinality == 0 {
            DocsWithField::None(max_doc)
        } else if cardinality >= max_doc as u64 {
            DocsWithField::All(max_doc)
        } else {
            DocsWithField::Bits { bits, max_doc }
        }
    }

    pub fn get(&self, doc: DocId) -> bool {
        match self {
            DocsWithField::All(max_doc) => doc < *max_doc,
            DocsWithField::None(_) => false,
            DocsWithField::Bits { bits, .. } => bits.contains(doc),
        }
    }

    /// Number of documents covered
    pub fn len(&self) -> u32 {
        match self {
            DocsWithField::All(max_doc) | DocsWithField::None(max_doc) => *max_doc,
            DocsWithField::Bits { max_doc, .. } => *max_doc,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of documents with a value
    pub fn cardinality(&self) -> u64 {
        match self {
            DocsWithField::All(max_doc) => *max_doc as u64,
            DocsWithField::None(_) => 0,
            DocsWithField::Bits { bits, .. } => bits.len(),
        }
    }

    /// Materialize as a bitmap
    pub fn to_bitmap(&self) -> RoaringBitmap {
        match self {
            DocsWithField::All(max_doc) => {
                let mut all = RoaringBitmap::new();
                all.insert_range(0..*max_doc);
                all
            }
            DocsWithField::None(_) => RoaringBitmap::new(),
            DocsWithField::Bits { bits, .. } => bits.clone(),
        }
    }
}

impl RamUsage for DocsWithField {
    fn ram_bytes_used(&self) -> usize {
        mem::size_of::<Self>()
            + match self {
                DocsWithField::Bits { bits, .. } => bits.ram_bytes_used(),
                _ => 0,
            }
    }
}

impl fmt::Debug for DocsWithField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DocsWithField::All(max_doc) => write!(f, "DocsWithField::All({})", max_doc),
            DocsWithField::None(max_doc) => write!(f, "DocsWithField::None({})", max_doc),
            DocsWithField::Bits { bits, max_doc } => f
                .debug_struct("DocsWithField::Bits")
                .field("cardinality", &bits.len())
                .field("max_doc", max_doc)
                .finish(),
        }
    }
}
