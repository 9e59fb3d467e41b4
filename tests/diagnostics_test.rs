mod common;

use std::io::{self, Write};
use std::sync::{Arc, Mutex};

use common::{create_test_segment, InstrumentedSource};
use squidex_fieldcache::config::overhead;
use squidex_fieldcache::parser::{DEFAULT_DOUBLE_PARSER, DEFAULT_INT32_PARSER};
use squidex_fieldcache::{
    CollectingInfoStream, EntryCustom, EntryKind, FieldCache, FieldCacheConfig, InfoStream,
    SegmentKey, SegmentSource, TracingInfoStream, WriterInfoStream,
};

#[test]
fn test_entry_snapshot_and_format() {
    let cache = FieldCache::default();
    let segment = create_test_segment();

    cache
        .get_doubles(&segment, "price", Some(DEFAULT_DOUBLE_PARSER), true)
        .unwrap();
    cache
        .get_terms_index_with_overhead(&segment, "color", overhead::COMPACT)
        .unwrap();

    let entries = cache.cache_entries();
    let summary: Vec<(&str, EntryKind)> = entries.iter().map(|e| (e.field(), e.kind())).collect();
    assert_eq!(
        summary,
        vec![
            ("color", EntryKind::TermsIndex),
            ("price", EntryKind::Double),
            ("price", EntryKind::DocsWithField),
        ]
    );

    let price = &entries[1];
    assert_eq!(price.segment(), segment.core_key());
    assert_eq!(price.parser(), Some(DEFAULT_DOUBLE_PARSER.id()));
    let text = price.to_string();
    let expected_prefix = format!(
        "'{}'=>'price',Double,DEFAULT_DOUBLE_PARSER=>NumericValues<f64>#",
        segment.core_key()
    );
    assert!(text.starts_with(&expected_prefix), "{}", text);
    assert!(!text.contains("size =~"));

    assert!(price.estimate_size() > 0);
    assert!(price.to_string().contains(" (size =~ "));

    assert_eq!(
        entries[0].custom(),
        EntryCustom::OverheadRatio(overhead::COMPACT)
    );
    assert!(entries[0].to_string().contains("acceptableOverheadRatio=0"));
}

#[test]
fn test_insanity_warning_on_new_entry() {
    let cache = FieldCache::default();
    let stream = Arc::new(CollectingInfoStream::new());
    cache.set_info_stream(Some(stream.clone()));
    let segment = create_test_segment();

    cache.get_int32s(&segment, "count", None, false).unwrap();
    cache.get_int32s(&segment, "count", Some(DEFAULT_INT32_PARSER), false).unwrap();
    assert!(stream.is_empty());

    cache.get_terms(&segment, "count", false).unwrap();
    let messages = stream.messages();
    assert_eq!(messages.len(), 1);
    assert!(messages[0].starts_with("WARNING: new FieldCache insanity created\nDetails: VALUEMISMATCH"));
    assert!(messages[0].contains("'count'"));

    // Unrelated fills do not repeat the warning
    stream.clear();
    cache.get_doubles(&segment, "price", None, false).unwrap();
    assert!(stream.is_empty());
}

#[test]
fn test_no_sink_means_no_diagnostics() {
    let cache = FieldCache::default();
    let segment = create_test_segment();
    assert!(cache.info_stream().is_none());

    cache.get_int32s(&segment, "count", None, false).unwrap();
    cache.get_int64s(&segment, "count", None, false).unwrap();
    assert_eq!(cache.check_sanity().len(), 1);

    let stream: Arc<dyn InfoStream> = Arc::new(TracingInfoStream);
    cache.set_info_stream(Some(stream));
    assert!(cache.info_stream().is_some());
    cache.set_info_stream(None);
    assert!(cache.info_stream().is_none());
}

/// Writer whose buffer stays readable after it is handed to a sink
#[derive(Clone, Default)]
struct SharedBuffer(Arc<Mutex<Vec<u8>>>);

impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[test]
fn test_writer_sink_without_size_estimates() {
    let cache =
        FieldCache::new(FieldCacheConfig::default().with_estimate_sizes_in_diagnostics(false));
    let buffer = SharedBuffer::default();
    cache.set_info_stream(Some(Arc::new(WriterInfoStream::new(buffer.clone()))));
    let segment = create_test_segment();

    cache.get_int32s(&segment, "count", None, false).unwrap();
    cache.get_singles(&segment, "count", None, false).unwrap();

    let written = String::from_utf8(buffer.0.lock().unwrap().clone()).unwrap();
    assert!(written.contains("WARNING: new FieldCache insanity created"));
    assert!(!written.contains("size =~"));
}

#[test]
fn test_purge_by_segment_is_exact() {
    let cache = FieldCache::default();
    let a = create_test_segment();
    let b = create_test_segment();

    cache.get_int32s(&a, "count", None, false).unwrap();
    cache.get_int32s(&b, "count", None, false).unwrap();

    assert!(!cache.purge_by_segment(SegmentKey::new(u64::MAX)));
    assert_eq!(cache.segment_count(), 2);

    assert!(cache.purge_by_segment(a.core_key()));
    let remaining: Vec<SegmentKey> = cache.cache_entries().iter().map(|e| e.segment()).collect();
    assert!(remaining.iter().all(|&key| key == b.core_key()));
    assert!(!remaining.is_empty());
}

#[test]
fn test_closing_segment_reclaims_entries() {
    let cache = FieldCache::default();
    let segment = create_test_segment();
    let reader = segment.clone();

    cache.get_terms(&reader, "color", true).unwrap();
    assert_eq!(cache.segment_count(), 1);

    drop(reader);
    assert_eq!(cache.segment_count(), 1);
    drop(segment);
    assert_eq!(cache.segment_count(), 0);
    assert!(cache.cache_entries().is_empty());
}

#[test]
fn test_repeated_purges_register_one_listener() {
    let cache = FieldCache::default();
    let source = InstrumentedSource::new(create_test_segment());

    for round in 0..100 {
        cache.get_int32s(&source, "count", None, false).unwrap();
        if round % 2 == 0 {
            cache.purge_all_caches();
        } else {
            assert!(cache.purge_by_segment(source.core_key()));
        }
    }
    cache.get_int32s(&source, "count", None, false).unwrap();
    assert_eq!(source.listener_count(), 1);

    // The single listener still reclaims the table on close
    assert_eq!(cache.segment_count(), 1);
    drop(source);
    assert_eq!(cache.segment_count(), 0);
}

#[test]
fn test_listeners_can_be_disabled() {
    let cache = FieldCache::new(FieldCacheConfig::default().with_register_core_listeners(false));
    let segment = create_test_segment();
    let key = segment.core_key();

    cache.get_int32s(&segment, "count", None, false).unwrap();
    drop(segment);
    assert_eq!(cache.segment_count(), 1);

    assert!(cache.purge_by_segment(key));
    assert_eq!(cache.segment_count(), 0);
}

#[test]
fn test_metrics_exposition() {
    let cache = FieldCache::default();
    let segment = create_test_segment();

    cache.get_int32s(&segment, "count", Some(DEFAULT_INT32_PARSER), false).unwrap();
    cache.get_int32s(&segment, "count", Some(DEFAULT_INT32_PARSER), false).unwrap();
    cache.purge_all_caches();

    let text = cache.metrics().gather();
    assert!(text.contains("fieldcache_fills_total"));
    assert!(text.contains("fieldcache_hits_total"));
    assert!(text.contains("fieldcache_purges_total 1"));
}
