//! Per-segment field value cache
//!
//! `FieldCache` decodes a field's terms into per-document containers on
//! first access and keeps them for as long as the segment core lives.
//!
//! # Architecture
//!
//! - One `SegmentTable` per `SegmentKey`, held in a `DashMap`
//! - Each table maps `(field, kind, parser)` to a single-flight fill cell
//! - Uninversion routines live in `fill`, one pass per request
//! - A core-closed listener drops a segment's table when its core goes away
//!
//! Tuning parameters that are not part of the key (the overhead ratio of the
//! terms accessors) are decided by whichever caller fills the entry first.
//! Later callers receive that entry unchanged until it is purged; the winning
//! value is visible through [`CacheEntry::custom`].

mod entry;
mod fill;
mod info_stream;
mod key;
mod table;
mod value;

pub use entry::CacheEntry;
pub use info_stream::{CollectingInfoStream, InfoStream, TracingInfoStream, WriterInfoStream};
pub use key::{CacheKey, EntryCustom, EntryKind};
pub use value::CachedValue;

use std::fmt;
use std::sync::{Arc, OnceLock};
use std::time::Instant;

use arc_swap::ArcSwapOption;
use dashmap::mapref::entry::Entry;
use dashmap::{DashMap, DashSet};
use roaring::RoaringBitmap;
use tracing::{debug, trace};

use crate::config::FieldCacheConfig;
use crate::error::{FieldCacheError, Result};
use crate::metrics::CacheMetrics;
use crate::parser::ParserRef;
use crate::sanity::{self, Insanity};
use crate::segment::{SegmentKey, SegmentSource};
use crate::values::{
    DocsWithField, NumericScalar, NumericValues, SortedTerms, TermOrdinals, TermValues,
};
use table::{Claim, SegmentTable};

struct CacheInner {
    config: FieldCacheConfig,
    tables: DashMap<SegmentKey, Arc<SegmentTable>>,
    /// Segments carrying this cache's core-closed listener
    listening: DashSet<SegmentKey>,
    info_stream: ArcSwapOption<Arc<dyn InfoStream>>,
    metrics: CacheMetrics,
}

impl CacheInner {
    fn purge_segment(&self, segment: SegmentKey) -> bool {
        let removed = self.tables.remove(&segment).is_some();
        if removed {
            self.metrics.record_purge();
            self.metrics.set_segments(self.tables.len());
            debug!("Purged field cache entries of {}", segment);
        }
        removed
    }
}

/// Process-local cache of uninverted field values, keyed per segment
#[derive(Clone)]
pub struct FieldCache {
    inner: Arc<CacheInner>,
}

impl Default for FieldCache {
    fn default() -> Self {
        Self::new(FieldCacheConfig::default())
    }
}

/// Shared cache for callers that do not manage their own
pub fn default_cache() -> &'static FieldCache {
    static DEFAULT: OnceLock<FieldCache> = OnceLock::new();
    DEFAULT.get_or_init(FieldCache::default)
}

impl FieldCache {
    pub fn new(config: FieldCacheConfig) -> Self {
        Self::with_metrics(config, CacheMetrics::default())
    }

    pub fn with_metrics(config: FieldCacheConfig, metrics: CacheMetrics) -> Self {
        Self {
            inner: Arc::new(CacheInner {
                config,
                tables: DashMap::new(),
                listening: DashSet::new(),
                info_stream: ArcSwapOption::empty(),
                metrics,
            }),
        }
    }

    pub fn config(&self) -> &FieldCacheConfig {
        &self.inner.config
    }

    pub fn metrics(&self) -> &CacheMetrics {
        &self.inner.metrics
    }

    // ------------------------------------------------------------------
    // Numeric accessors
    // ------------------------------------------------------------------

    pub fn get_bytes(
        &self,
        segment: &dyn SegmentSource,
        field: &str,
        parser: Option<ParserRef<i8>>,
        set_docs_with_field: bool,
    ) -> Result<Arc<NumericValues<i8>>> {
        self.get_numeric(segment, field, parser, set_docs_with_field)
    }

    pub fn get_int16s(
        &self,
        segment: &dyn SegmentSource,
        field: &str,
        parser: Option<ParserRef<i16>>,
        set_docs_with_field: bool,
    ) -> Result<Arc<NumericValues<i16>>> {
        self.get_numeric(segment, field, parser, set_docs_with_field)
    }

    pub fn get_int32s(
        &self,
        segment: &dyn SegmentSource,
        field: &str,
        parser: Option<ParserRef<i32>>,
        set_docs_with_field: bool,
    ) -> Result<Arc<NumericValues<i32>>> {
        self.get_numeric(segment, field, parser, set_docs_with_field)
    }

    pub fn get_int64s(
        &self,
        segment: &dyn SegmentSource,
        field: &str,
        parser: Option<ParserRef<i64>>,
        set_docs_with_field: bool,
    ) -> Result<Arc<NumericValues<i64>>> {
        self.get_numeric(segment, field, parser, set_docs_with_field)
    }

    pub fn get_singles(
        &self,
        segment: &dyn SegmentSource,
        field: &str,
        parser: Option<ParserRef<f32>>,
        set_docs_with_field: bool,
    ) -> Result<Arc<NumericValues<f32>>> {
        self.get_numeric(segment, field, parser, set_docs_with_field)
    }

    pub fn get_doubles(
        &self,
        segment: &dyn SegmentSource,
        field: &str,
        parser: Option<ParserRef<f64>>,
        set_docs_with_field: bool,
    ) -> Result<Arc<NumericValues<f64>>> {
        self.get_numeric(segment, field, parser, set_docs_with_field)
    }

    /// Per-document values of `field` decoded as `T`.
    ///
    /// A field with a numeric doc-values channel is read from it directly and
    /// nothing is cached. Otherwise the field's terms are parsed with `parser`;
    /// with `None` the plain-text parser is tried first and the prefix coded
    /// parser second. When `set_docs_with_field` is set the same pass also
    /// records which documents have a value, retrievable through
    /// [`FieldCache::get_docs_with_field`].
    pub fn get_numeric<T: NumericScalar>(
        &self,
        segment: &dyn SegmentSource,
        field: &str,
        parser: Option<ParserRef<T>>,
        set_docs_with_field: bool,
    ) -> Result<Arc<NumericValues<T>>> {
        let max_doc = segment.max_doc();
        if let Some(column) = segment.numeric_values(field)? {
            trace!(
                "Reading '{}' as {} from doc values of {}",
                field,
                T::KIND,
                segment.core_key()
            );
            return Ok(Arc::new(NumericValues::from_column(column, max_doc)));
        }

        let key = CacheKey::new(field, T::KIND, parser.map(|p| p.id()));
        let custom = parser.map_or(EntryCustom::Default, |p| EntryCustom::Parser(p.id(), p.name()));

        let value = self.get_or_fill(segment, key, custom, |table| match parser {
            Some(parser) => {
                let (values, docs) =
                    fill::uninvert_numeric(segment, field, parser, set_docs_with_field)?;
                if let Some(bits) = docs {
                    store_docs_with_field(table, field, bits, max_doc);
                }
                Ok(T::into_cached(Arc::new(values)))
            }
            None => self.fill_with_default_parsers::<T>(segment, field, set_docs_with_field),
        })?;

        T::from_cached(&value).ok_or_else(|| unexpected_value(field, T::KIND, &value))
    }

    /// Fill through the built-in parsers so both entries share one container
    fn fill_with_default_parsers<T: NumericScalar>(
        &self,
        segment: &dyn SegmentSource,
        field: &str,
        set_docs_with_field: bool,
    ) -> Result<CachedValue> {
        match self.get_numeric(segment, field, Some(T::text_parser()), set_docs_with_field) {
            Ok(values) => Ok(T::into_cached(values)),
            Err(err) if err.is_malformed() => match T::prefix_coded_parser() {
                Some(parser) => {
                    debug!(
                        "Field '{}' is not plain text ({}), retrying with {}",
                        field,
                        err,
                        parser.name()
                    );
                    self.get_numeric(segment, field, Some(parser), set_docs_with_field)
                        .map(T::into_cached)
                }
                None => Err(err),
            },
            Err(err) => Err(err),
        }
    }

    // ------------------------------------------------------------------
    // Docs-with-field and terms accessors
    // ------------------------------------------------------------------

    /// Documents with at least one value for `field`
    pub fn get_docs_with_field(
        &self,
        segment: &dyn SegmentSource,
        field: &str,
    ) -> Result<Arc<DocsWithField>> {
        let max_doc = segment.max_doc();
        if let Some(column) = segment.numeric_values(field)? {
            return Ok(Arc::new(DocsWithField::from_bits(
                column.docs_with_value(),
                max_doc,
            )));
        }

        let key = CacheKey::new(field, EntryKind::DocsWithField, None);
        let value = self.get_or_fill(segment, key, EntryCustom::Default, |_| {
            fill::docs_with_field(segment, field).map(|docs| CachedValue::DocsWithField(Arc::new(docs)))
        })?;

        match value {
            CachedValue::DocsWithField(docs) => Ok(docs),
            other => Err(unexpected_value(field, EntryKind::DocsWithField, &other)),
        }
    }

    /// One byte value per document, using the configured overhead ratio
    pub fn get_terms(
        &self,
        segment: &dyn SegmentSource,
        field: &str,
        set_docs_with_field: bool,
    ) -> Result<Arc<TermValues>> {
        let ratio = self.inner.config.default_overhead_ratio;
        self.get_terms_with_overhead(segment, field, set_docs_with_field, ratio)
    }

    /// One byte value per document.
    ///
    /// `overhead_ratio` is not part of the cache key: if the entry already
    /// exists it is returned as filled by the first caller.
    pub fn get_terms_with_overhead(
        &self,
        segment: &dyn SegmentSource,
        field: &str,
        set_docs_with_field: bool,
        overhead_ratio: f32,
    ) -> Result<Arc<TermValues>> {
        reject_numeric_channel(segment, field, EntryKind::Terms)?;
        let max_doc = segment.max_doc();

        let key = CacheKey::new(field, EntryKind::Terms, None);
        let custom = EntryCustom::OverheadRatio(overhead_ratio);
        let value = self.get_or_fill(segment, key, custom, |table| {
            let (values, docs) =
                fill::uninvert_terms(segment, field, set_docs_with_field, overhead_ratio)?;
            if let Some(bits) = docs {
                store_docs_with_field(table, field, bits, max_doc);
            }
            Ok(CachedValue::Terms(Arc::new(values)))
        })?;

        match value {
            CachedValue::Terms(values) => Ok(values),
            other => Err(unexpected_value(field, EntryKind::Terms, &other)),
        }
    }

    /// Sorted terms index, using the configured overhead ratio
    pub fn get_terms_index(
        &self,
        segment: &dyn SegmentSource,
        field: &str,
    ) -> Result<Arc<SortedTerms>> {
        let ratio = self.inner.config.default_overhead_ratio;
        self.get_terms_index_with_overhead(segment, field, ratio)
    }

    /// Sorted terms index.
    ///
    /// `overhead_ratio` is not part of the cache key: if the entry already
    /// exists it is returned as filled by the first caller.
    pub fn get_terms_index_with_overhead(
        &self,
        segment: &dyn SegmentSource,
        field: &str,
        overhead_ratio: f32,
    ) -> Result<Arc<SortedTerms>> {
        reject_numeric_channel(segment, field, EntryKind::TermsIndex)?;

        let key = CacheKey::new(field, EntryKind::TermsIndex, None);
        let custom = EntryCustom::OverheadRatio(overhead_ratio);
        let value = self.get_or_fill(segment, key, custom, |_| {
            fill::uninvert_terms_index(segment, field, overhead_ratio)
                .map(|index| CachedValue::TermsIndex(Arc::new(index)))
        })?;

        match value {
            CachedValue::TermsIndex(index) => Ok(index),
            other => Err(unexpected_value(field, EntryKind::TermsIndex, &other)),
        }
    }

    /// Multi-valued ordinals per document
    pub fn get_doc_term_ords(
        &self,
        segment: &dyn SegmentSource,
        field: &str,
    ) -> Result<Arc<TermOrdinals>> {
        reject_numeric_channel(segment, field, EntryKind::DocTermOrds)?;

        let key = CacheKey::new(field, EntryKind::DocTermOrds, None);
        let value = self.get_or_fill(segment, key, EntryCustom::Default, |_| {
            fill::uninvert_doc_term_ords(segment, field)
                .map(|ords| CachedValue::DocTermOrds(Arc::new(ords)))
        })?;

        match value {
            CachedValue::DocTermOrds(ords) => Ok(ords),
            other => Err(unexpected_value(field, EntryKind::DocTermOrds, &other)),
        }
    }

    // ------------------------------------------------------------------
    // Fill coordination
    // ------------------------------------------------------------------

    fn table_for(&self, segment: &dyn SegmentSource) -> Arc<SegmentTable> {
        let key = segment.core_key();
        if let Some(table) = self.inner.tables.get(&key) {
            return table.value().clone();
        }

        let (table, created) = match self.inner.tables.entry(key) {
            Entry::Occupied(e) => (e.get().clone(), false),
            Entry::Vacant(e) => {
                let table = Arc::new(SegmentTable::new());
                e.insert(table.clone());
                (table, true)
            }
        };

        if created {
            self.inner.metrics.set_segments(self.inner.tables.len());
            // One listener per segment, however often its table is purged
            if self.inner.config.register_core_listeners && self.inner.listening.insert(key) {
                let cache = Arc::downgrade(&self.inner);
                segment.add_core_closed_listener(Box::new(move |closed| {
                    if let Some(inner) = cache.upgrade() {
                        inner.listening.remove(&closed);
                        inner.purge_segment(closed);
                    }
                }));
            }
        }
        table
    }

    fn get_or_fill<F>(
        &self,
        segment: &dyn SegmentSource,
        key: CacheKey,
        custom: EntryCustom,
        fill: F,
    ) -> Result<CachedValue>
    where
        F: FnOnce(&SegmentTable) -> Result<CachedValue>,
    {
        let segment_key = segment.core_key();
        let table = self.table_for(segment);
        let metrics = &self.inner.metrics;

        if self.inner.config.reject_type_mismatch {
            if let Some(existing) = table.conflicting_kind(&key.field, key.kind) {
                return Err(FieldCacheError::FieldTypeMismatch {
                    field: key.field.to_string(),
                    existing: existing.to_string(),
                    requested: key.kind,
                });
            }
        }

        match table.claim(&key, custom) {
            Claim::Hit(value) => {
                metrics.record_hit(key.kind.as_str());
                trace!("Field cache hit for '{}' as {} in {}", key.field, key.kind, segment_key);
                Ok(value)
            }
            Claim::Waiter(cell) => {
                metrics.record_wait();
                trace!(
                    "Waiting on in-flight fill of '{}' as {} in {}",
                    key.field,
                    key.kind,
                    segment_key
                );
                cell.wait()
            }
            Claim::Leader(guard) => {
                metrics.record_miss(key.kind.as_str());
                debug!("Filling '{}' as {} for {}", key.field, key.kind, segment_key);

                let start = Instant::now();
                let result = fill(&*table);
                guard.complete(&result);

                match &result {
                    Ok(value) => {
                        let elapsed = start.elapsed();
                        metrics.record_fill(key.kind.as_str(), elapsed.as_secs_f64());
                        debug!(
                            "Filled '{}' as {} for {} in {:?}",
                            key.field, key.kind, segment_key, elapsed
                        );
                        // The parser-less numeric key aliases an inner entry already reported.
                        if key.parser.is_some() || !key.kind.is_numeric() {
                            self.report_insanity(value);
                        }
                    }
                    Err(err) => {
                        metrics.record_fill_failure(key.kind.as_str());
                        debug!(
                            "Fill of '{}' as {} for {} failed: {}",
                            key.field, key.kind, segment_key, err
                        );
                    }
                }
                result
            }
        }
    }

    fn report_insanity(&self, value: &CachedValue) {
        let stream = match self.info_stream() {
            Some(stream) => stream,
            None => return,
        };

        let entries = self.cache_entries();
        for insanity in sanity::check_sanity(&entries)
            .into_iter()
            .filter(|insanity| insanity.involves(value))
        {
            if self.inner.config.estimate_sizes_in_diagnostics {
                for entry in &insanity.entries {
                    entry.estimate_size();
                }
            }
            stream.message(&format!(
                "WARNING: new FieldCache insanity created\nDetails: {}",
                insanity
            ));
        }
    }

    // ------------------------------------------------------------------
    // Diagnostics and maintenance
    // ------------------------------------------------------------------

    /// Every filled entry, ordered by segment, field, kind and parser.
    ///
    /// Fills still in flight are not included.
    pub fn cache_entries(&self) -> Vec<CacheEntry> {
        let mut entries = Vec::new();
        for table in self.inner.tables.iter() {
            let segment = *table.key();
            for (key, custom, value) in table.value().filled_entries() {
                entries.push(CacheEntry::new(
                    segment, key.field, key.kind, key.parser, custom, value,
                ));
            }
        }
        entries.sort_by(|a, b| {
            (a.segment(), a.field(), a.kind(), a.parser())
                .cmp(&(b.segment(), b.field(), b.kind(), b.parser()))
        });
        entries
    }

    /// Run the default sanity checks against the live entries
    pub fn check_sanity(&self) -> Vec<Insanity> {
        sanity::check_sanity(&self.cache_entries())
    }

    /// Drop every entry of every segment
    pub fn purge_all_caches(&self) {
        self.inner.tables.clear();
        self.inner.metrics.record_purge();
        self.inner.metrics.set_segments(0);
        debug!("Purged all field cache entries");
    }

    /// Drop every entry cached for exactly `segment`.
    ///
    /// Returns whether anything was cached for it.
    pub fn purge_by_segment(&self, segment: SegmentKey) -> bool {
        self.inner.purge_segment(segment)
    }

    /// Number of segments with at least one table
    pub fn segment_count(&self) -> usize {
        self.inner.tables.len()
    }

    /// Install or remove the diagnostic sink
    pub fn set_info_stream(&self, stream: Option<Arc<dyn InfoStream>>) {
        self.inner.info_stream.store(stream.map(Arc::new));
    }

    pub fn info_stream(&self) -> Option<Arc<dyn InfoStream>> {
        self.inner
            .info_stream
            .load_full()
            .map(|stream| Arc::clone(&*stream))
    }
}

impl fmt::Debug for FieldCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldCache")
            .field("config", &self.inner.config)
            .field("segments", &self.inner.tables.len())
            .finish()
    }
}

fn store_docs_with_field(table: &SegmentTable, field: &str, bits: RoaringBitmap, max_doc: u32) {
    table.put_if_absent(
        CacheKey::new(field, EntryKind::DocsWithField, None),
        EntryCustom::Default,
        CachedValue::DocsWithField(Arc::new(DocsWithField::from_bits(bits, max_doc))),
    );
}

fn reject_numeric_channel(
    segment: &dyn SegmentSource,
    field: &str,
    requested: EntryKind,
) -> Result<()> {
    if segment.numeric_values(field)?.is_some() {
        return Err(FieldCacheError::FieldTypeMismatch {
            field: field.to_string(),
            existing: "numeric doc values".to_string(),
            requested,
        });
    }
    Ok(())
}

fn unexpected_value(field: &str, expected: EntryKind, value: &CachedValue) -> FieldCacheError {
    FieldCacheError::Internal(format!(
        "entry for field '{}' holds {} where {} was expected",
        field,
        value.type_name(),
        expected
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::overhead;
    use crate::parser::numeric_utils::{int_prefix_coded_terms, PRECISION_STEP_DEFAULT};
    use crate::parser::{DEFAULT_DOUBLE_PARSER, DEFAULT_INT32_PARSER, PREFIX_CODED_INT32_PARSER};
    use crate::segment::{MemorySegment, NumericColumn};

    fn create_test_segment() -> MemorySegment {
        let mut builder = MemorySegment::builder(4);
        builder
            .add_text_values("count", [Some("5"), Some("-2"), None, Some("5")])
            .add_text_values("price", [Some("19.99"), Some("-0"), Some("1e400"), None])
            .add_text_values("color", [Some("red"), None, Some("blue"), Some("red")])
            .add_numeric_column(
                "rank",
                vec![Some(10), None, Some(30), Some(40)].into_iter().collect::<NumericColumn>(),
            );
        builder.build().unwrap()
    }

    #[test]
    fn test_default_cache_is_shared() {
        let a = default_cache();
        let b = default_cache();
        assert!(std::ptr::eq(a, b));
        assert!(Arc::ptr_eq(&a.inner, &b.inner));
    }

    #[test]
    fn test_hit_returns_same_instance() {
        let cache = FieldCache::default();
        let segment = create_test_segment();

        let a = cache.get_int32s(&segment, "count", Some(DEFAULT_INT32_PARSER), false).unwrap();
        let b = cache.get_int32s(&segment, "count", Some(DEFAULT_INT32_PARSER), false).unwrap();

        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(a.as_slice(), Some(&[5, -2, 0, 5][..]));
        assert_eq!(cache.metrics().fill_count("Int32"), 1);
    }

    #[test]
    fn test_default_parser_alias_shares_container() {
        let cache = FieldCache::default();
        let segment = create_test_segment();

        let by_default = cache.get_int32s(&segment, "count", None, false).unwrap();
        let by_text = cache.get_int32s(&segment, "count", Some(DEFAULT_INT32_PARSER), false).unwrap();

        assert!(Arc::ptr_eq(&by_default, &by_text));
        assert_eq!(cache.cache_entries().len(), 2);
        assert!(cache.check_sanity().is_empty());
    }

    #[test]
    fn test_default_parser_falls_back_to_prefix_coded() {
        let mut builder = MemorySegment::builder(2);
        for (doc, value) in [(0u32, 77i32), (1, -3)] {
            for term in int_prefix_coded_terms(value, PRECISION_STEP_DEFAULT).unwrap() {
                builder.add_term("year", term, doc);
            }
        }
        let segment = builder.build().unwrap();
        let cache = FieldCache::default();

        let values = cache.get_int32s(&segment, "year", None, false).unwrap();
        assert_eq!(values.as_slice(), Some(&[77, -3][..]));

        let direct = cache
            .get_int32s(&segment, "year", Some(PREFIX_CODED_INT32_PARSER), false)
            .unwrap();
        assert!(Arc::ptr_eq(&values, &direct));
    }

    #[test]
    fn test_doc_values_bypass_cache() {
        let cache = FieldCache::default();
        let segment = create_test_segment();

        let ranks = cache.get_int64s(&segment, "rank", None, true).unwrap();
        assert!(ranks.is_doc_values_backed());
        assert_eq!(ranks.get(2), 30);
        assert_eq!(ranks.get(1), 0);
        assert!(cache.cache_entries().is_empty());

        let docs = cache.get_docs_with_field(&segment, "rank").unwrap();
        assert!(!docs.get(1));
        assert!(docs.get(3));

        let err = cache.get_terms_index(&segment, "rank").unwrap_err();
        assert!(matches!(err, FieldCacheError::FieldTypeMismatch { .. }));
    }

    #[test]
    fn test_docs_with_field_sibling_entry() {
        let cache = FieldCache::default();
        let segment = create_test_segment();

        cache.get_doubles(&segment, "price", Some(DEFAULT_DOUBLE_PARSER), true).unwrap();
        let kinds: Vec<EntryKind> = cache.cache_entries().iter().map(|e| e.kind()).collect();
        assert_eq!(kinds, vec![EntryKind::Double, EntryKind::DocsWithField]);

        let docs = cache.get_docs_with_field(&segment, "price").unwrap();
        assert_eq!(docs.cardinality(), 3);
        assert_eq!(cache.metrics().fill_count("DocsWithField"), 0);
    }

    #[test]
    fn test_missing_field_yields_empty() {
        let cache = FieldCache::default();
        let segment = create_test_segment();

        let values = cache.get_singles(&segment, "nope", None, true).unwrap();
        assert_eq!(values.len(), 4);
        assert_eq!(values.get(0), 0.0);

        let docs = cache.get_docs_with_field(&segment, "nope").unwrap();
        assert_eq!(*docs, DocsWithField::None(4));

        let index = cache.get_terms_index(&segment, "nope").unwrap();
        assert_eq!(index.value_count(), 0);
    }

    #[test]
    fn test_terms_overhead_first_caller_wins() {
        let cache = FieldCache::default();
        let segment = create_test_segment();

        let first = cache
            .get_terms_index_with_overhead(&segment, "color", overhead::COMPACT)
            .unwrap();
        let second = cache
            .get_terms_index_with_overhead(&segment, "color", overhead::FASTEST)
            .unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(first.bits_per_ord(), 2);
        let entry = &cache.cache_entries()[0];
        assert_eq!(entry.custom(), EntryCustom::OverheadRatio(overhead::COMPACT));
    }

    #[test]
    fn test_terms_and_ords() {
        let cache = FieldCache::default();
        let segment = create_test_segment();

        let terms = cache.get_terms(&segment, "color", false).unwrap();
        assert_eq!(terms.get(0), b"red");
        assert_eq!(terms.get(1), b"");

        let ords = cache.get_doc_term_ords(&segment, "color").unwrap();
        assert_eq!(ords.ords(2), &[0]);
        assert_eq!(ords.lookup_ord(1), Some(&b"red"[..]));
    }

    #[test]
    fn test_reject_type_mismatch() {
        let cache = FieldCache::new(FieldCacheConfig::default().with_reject_type_mismatch(true));
        let segment = create_test_segment();

        cache.get_int32s(&segment, "count", None, true).unwrap();
        let err = cache.get_int64s(&segment, "count", None, false).unwrap_err();
        assert!(matches!(
            err,
            FieldCacheError::FieldTypeMismatch { requested: EntryKind::Int64, .. }
        ));
        cache.get_docs_with_field(&segment, "count").unwrap();
    }

    #[test]
    fn test_purge_by_segment() {
        let cache = FieldCache::default();
        let a = create_test_segment();
        let b = create_test_segment();

        cache.get_int32s(&a, "count", None, false).unwrap();
        cache.get_int32s(&b, "count", None, false).unwrap();
        assert_eq!(cache.segment_count(), 2);

        assert!(cache.purge_by_segment(a.core_key()));
        assert!(!cache.purge_by_segment(a.core_key()));
        assert!(cache.cache_entries().iter().all(|e| e.segment() == b.core_key()));
    }

    #[test]
    fn test_core_close_reclaims_table() {
        let cache = FieldCache::default();
        let segment = create_test_segment();
        cache.get_int32s(&segment, "count", None, false).unwrap();
        assert_eq!(cache.segment_count(), 1);

        drop(segment);
        assert_eq!(cache.segment_count(), 0);
    }

    #[test]
    fn test_insanity_reported_to_info_stream() {
        let cache = FieldCache::default();
        let stream = Arc::new(CollectingInfoStream::new());
        cache.set_info_stream(Some(stream.clone()));
        let segment = create_test_segment();

        cache.get_int32s(&segment, "count", None, false).unwrap();
        assert!(stream.is_empty());

        cache.get_int64s(&segment, "count", None, false).unwrap();
        let messages = stream.messages();
        assert_eq!(messages.len(), 1);
        assert!(messages[0].starts_with("WARNING: new FieldCache insanity created"));
        assert!(messages[0].contains("VALUEMISMATCH"));
        assert!(messages[0].contains("(size =~ "));
    }
}
