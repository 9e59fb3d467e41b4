//! Type-erased cached containers

use std::sync::Arc;

use super::key::EntryKind;
use crate::values::{
    DocsWithField, NumericValues, RamUsage, SortedTerms, TermOrdinals, TermValues,
};

/// A filled container as stored in an entry table
#[derive(Clone, Debug)]
pub enum CachedValue {
    Byte(Arc<NumericValues<i8>>),
    Int16(Arc<NumericValues<i16>>),
    Int32(Arc<NumericValues<i32>>),
    Int64(Arc<NumericValues<i64>>),
    Single(Arc<NumericValues<f32>>),
    Double(Arc<NumericValues<f64>>),
    DocsWithField(Arc<DocsWithField>),
    Terms(Arc<TermValues>),
    TermsIndex(Arc<SortedTerms>),
    DocTermOrds(Arc<TermOrdinals>),
}

macro_rules! each_value {
    ($value:expr, $inner:ident => $body:expr) => {
        match $value {
            CachedValue::Byte($inner) => $body,
            CachedValue::Int16($inner) => $body,
            CachedValue::Int32($inner) => $body,
            CachedValue::Int64($inner) => $body,
            CachedValue::Single($inner) => $body,
            CachedValue::Double($inner) => $body,
            CachedValue::DocsWithField($inner) => $body,
            CachedValue::Terms($inner) => $body,
            CachedValue::TermsIndex($inner) => $body,
            CachedValue::DocTermOrds($inner) => $body,
        }
    };
}

impl CachedValue {
    pub fn kind(&self) -> EntryKind {
        match self {
            CachedValue::Byte(_) => EntryKind::Byte,
            CachedValue::Int16(_) => EntryKind::Int16,
            CachedValue::Int32(_) => EntryKind::Int32,
            CachedValue::Int64(_) => EntryKind::Int64,
            CachedValue::Single(_) => EntryKind::Single,
            CachedValue::Double(_) => EntryKind::Double,
            CachedValue::DocsWithField(_) => EntryKind::DocsWithField,
            CachedValue::Terms(_) => EntryKind::Terms,
            CachedValue::TermsIndex(_) => EntryKind::TermsIndex,
            CachedValue::DocTermOrds(_) => EntryKind::DocTermOrds,
        }
    }

    /// Address of the shared container, stable while any clone lives
    pub fn instance_id(&self) -> usize {
        each_value!(self, inner => Arc::as_ptr(inner) as *const () as usize)
    }

    /// Whether both values point at the same container
    pub fn same_instance(&self, other: &CachedValue) -> bool {
        self.kind() == other.kind() && self.instance_id() == other.instance_id()
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            CachedValue::Byte(_) => "NumericValues<i8>",
            CachedValue::Int16(_) => "NumericValues<i16>",
            CachedValue::Int32(_) => "NumericValues<i32>",
            CachedValue::Int64(_) => "NumericValues<i64>",
            CachedValue::Single(_) => "NumericValues<f32>",
            CachedValue::Double(_) => "NumericValues<f64>",
            CachedValue::DocsWithField(_) => "DocsWithField",
            CachedValue::Terms(_) => "TermValues",
            CachedValue::TermsIndex(_) => "SortedTerms",
            CachedValue::DocTermOrds(_) => "TermOrdinals",
        }
    }

    pub fn ram_bytes_used(&self) -> usize {
        each_value!(self, inner => inner.ram_bytes_used())
    }
}
