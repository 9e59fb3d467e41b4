//! In-memory segment reader
//!
//! A `MemorySegment` is a cheap handle onto a shared, immutable core. Clones
//! share the core and therefore its [`SegmentKey`]; every build allocates a
//! new key. When the last handle goes away the core fires its closed
//! listeners, which is how the field cache learns to drop the segment.

use std::collections::HashMap;
use std::fmt;
use std::io;
use std::sync::Arc;

use parking_lot::Mutex;

use super::docvalues::NumericColumn;
use super::source::{CoreClosedListener, SegmentSource, TermsEnum};
use super::term_dict::{TermDictionary, TermDictionaryBuilder};
use super::types::{DocId, SegmentKey};

struct SegmentCore {
    key: SegmentKey,
    max_doc: u32,
    fields: HashMap<String, TermDictionary>,
    numeric: HashMap<String, Arc<NumericColumn>>,
    listeners: Mutex<Vec<CoreClosedListener>>,
}

impl Drop for SegmentCore {
    fn drop(&mut self) {
        let listeners = std::mem::take(self.listeners.get_mut());
        for listener in listeners {
            listener(self.key);
        }
    }
}

/// Immutable segment held entirely in memory
#[derive(Clone)]
pub struct MemorySegment {
    core: Arc<SegmentCore>,
}

impl MemorySegment {
    /// Start building a segment with `max_doc` documents
    pub fn builder(max_doc: u32) -> MemorySegmentBuilder {
        MemorySegmentBuilder::new(max_doc)
    }

    pub fn key(&self) -> SegmentKey {
        self.core.key
    }

    /// Get the term dictionary of a field
    pub fn term_dictionary(&self, field: &str) -> Option<&TermDictionary> {
        self.core.fields.get(field)
    }

    /// Names of all indexed fields
    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.core.fields.keys().map(|f| f.as_str())
    }

    /// Get the number of unique terms in a field
    pub fn term_count(&self, field: &str) -> usize {
        self.core.fields.get(field).map(|d| d.len()).unwrap_or(0)
    }

    /// Number of live handles onto the core
    pub fn handle_count(&self) -> usize {
        Arc::strong_count(&self.core)
    }
}

impl fmt::Debug for MemorySegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemorySegment")
            .field("key", &self.core.key)
            .field("max_doc", &self.core.max_doc)
            .field("fields", &self.core.fields.len())
            .field("numeric_fields", &self.core.numeric.len())
            .finish()
    }
}

impl SegmentSource for MemorySegment {
    fn core_key(&self) -> SegmentKey {
        self.core.key
    }

    fn max_doc(&self) -> u32 {
        self.core.max_doc
    }

    fn terms(&self, field: &str) -> io::Result<Option<Box<dyn TermsEnum + '_>>> {
        Ok(self
            .core
            .fields
            .get(field)
            .map(|dict| Box::new(dict.terms_enum()) as Box<dyn TermsEnum + '_>))
    }

    fn numeric_values(&self, field: &str) -> io::Result<Option<Arc<NumericColumn>>> {
        Ok(self.core.numeric.get(field).cloned())
    }

    fn add_core_closed_listener(&self, listener: CoreClosedListener) {
        self.core.listeners.lock().push(listener);
    }
}

/// Builder for in-memory segments
pub struct MemorySegmentBuilder {
    max_doc: u32,
    fields: HashMap<String, TermDictionaryBuilder>,
    numeric: HashMap<String, NumericColumn>,
}

impl MemorySegmentBuilder {
    pub fn new(max_doc: u32) -> Self {
        Self {
            max_doc,
            fields: HashMap::new(),
            numeric: HashMap::new(),
        }
    }

    /// Index `term` for `doc` in `field`
    pub fn add_term(&mut self, field: &str, term: impl AsRef<[u8]>, doc: DocId) -> &mut Self {
        self.fields
            .entry(field.to_string())
            .or_default()
            .add(term.as_ref(), doc);
        self
    }

    /// Index one text value per document; `None` leaves the document out
    pub fn add_text_values<'a>(
        &mut self,
        field: &str,
        values: impl IntoIterator<Item = Option<&'a str>>,
    ) -> &mut Self {
        for (doc, value) in values.into_iter().enumerate() {
            if let Some(text) = value {
                self.add_term(field, text.as_bytes(), doc as DocId);
            }
        }
        self
    }

    /// Attach a pre-decoded numeric channel to `field`
    pub fn add_numeric_column(&mut self, field: &str, column: NumericColumn) -> &mut Self {
        self.numeric.insert(field.to_string(), column);
        self
    }

    pub fn build(self) -> io::Result<MemorySegment> {
        let mut fields = HashMap::with_capacity(self.fields.len());
        for (name, builder) in self.fields {
            if let Some(max_id) = builder.max_doc_id() {
                if max_id >= self.max_doc {
                    return Err(io::Error::new(
                        io::ErrorKind::InvalidInput,
                        format!(
                            "field '{}' references doc {} but max_doc is {}",
                            name, max_id, self.max_doc
                        ),
                    ));
                }
            }
            fields.insert(name, builder.build()?);
        }

        let mut numeric = HashMap::with_capacity(self.numeric.len());
        for (name, column) in self.numeric {
            if column.len() > self.max_doc as usize {
                return Err(io::Error::new(
                    io::ErrorKind::InvalidInput,
                    format!(
                        "numeric column '{}' has {} values but max_doc is {}",
                        name,
                        column.len(),
                        self.max_doc
                    ),
                ));
            }
            numeric.insert(name, Arc::new(column));
        }

        Ok(MemorySegment {
            core: Arc::new(SegmentCore {
                key: SegmentKey::allocate(),
                max_doc: self.max_doc,
                fields,
                numeric,
                listeners: Mutex::new(Vec::new()),
            }),
        })
    }
}
