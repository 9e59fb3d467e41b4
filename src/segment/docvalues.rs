//! Pre-decoded numeric doc values
//!
//! Fields indexed with a per-document numeric channel skip term parsing
//! entirely: the cache reads values straight out of a [`NumericColumn`].

use roaring::RoaringBitmap;

use super::types::DocId;

/// Numeric column indexed by doc id
#[derive(Clone, Debug, Default)]
pub struct NumericColumn {
    /// Values indexed by doc id (None for missing values)
    values: Vec<Option<i64>>,
    /// Null bitmap
    nulls: RoaringBitmap,
}

impl NumericColumn {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            values: Vec::with_capacity(capacity),
            ..Self::default()
        }
    }

    /// Add a value for the next doc id
    pub fn add(&mut self, value: Option<i64>) {
        let doc = self.values.len() as DocId;

        if value.is_none() {
            self.nulls.insert(doc);
        }

        self.values.push(value);
    }

    /// Get value for a doc id
    pub fn get(&self, doc: DocId) -> Option<i64> {
        self.values.get(doc as usize).copied().flatten()
    }

    /// Check if a doc id has no value. Ids past the end count as null.
    pub fn is_null(&self, doc: DocId) -> bool {
        (doc as usize) >= self.values.len() || self.nulls.contains(doc)
    }

    /// Documents that carry a value
    pub fn docs_with_value(&self) -> RoaringBitmap {
        let mut all = RoaringBitmap::new();
        all.insert_range(0..self.values.len() as u32);
        all - &self.nulls
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Approximate heap footprint in bytes
    pub fn ram_bytes_used(&self) -> usize {
        self.values.capacity() * std::mem::size_of::<Option<i64>>()
            + self.nulls.serialized_size()
    }
}

impl FromIterator<Option<i64>> for NumericColumn {
    fn from_iter<I: IntoIterator<Item = Option<i64>>>(iter: I) -> Self {
        let mut column = NumericColumn::new();
        for value in iter {
            column.add(value);
        }
        column
    }
}
