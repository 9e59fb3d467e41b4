#![allow(dead_code)]

use std::io;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use squidex_fieldcache::segment::CoreClosedListener;
use squidex_fieldcache::{MemorySegment, NumericColumn, SegmentKey, SegmentSource, TermsEnum};

/// Segment wrapper that counts term enumerations and can inject failures
pub struct InstrumentedSource {
    inner: MemorySegment,
    term_passes: AtomicUsize,
    listeners: AtomicUsize,
    failures_left: AtomicUsize,
    delay: Duration,
}

impl InstrumentedSource {
    pub fn new(inner: MemorySegment) -> Self {
        Self {
            inner,
            term_passes: AtomicUsize::new(0),
            listeners: AtomicUsize::new(0),
            failures_left: AtomicUsize::new(0),
            delay: Duration::ZERO,
        }
    }

    /// Sleep inside every enumeration to widen race windows
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Fail the next `count` enumerations with an IO error
    pub fn with_failures(self, count: usize) -> Self {
        self.failures_left.store(count, Ordering::SeqCst);
        self
    }

    pub fn term_passes(&self) -> usize {
        self.term_passes.load(Ordering::SeqCst)
    }

    /// Core-closed listeners registered through this source
    pub fn listener_count(&self) -> usize {
        self.listeners.load(Ordering::SeqCst)
    }

    pub fn segment(&self) -> &MemorySegment {
        &self.inner
    }
}

impl SegmentSource for InstrumentedSource {
    fn core_key(&self) -> SegmentKey {
        self.inner.core_key()
    }

    fn max_doc(&self) -> u32 {
        self.inner.max_doc()
    }

    fn terms(&self, field: &str) -> io::Result<Option<Box<dyn TermsEnum + '_>>> {
        self.term_passes.fetch_add(1, Ordering::SeqCst);
        if !self.delay.is_zero() {
            thread::sleep(self.delay);
        }

        let failing = self
            .failures_left
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |left| left.checked_sub(1))
            .is_ok();
        if failing {
            return Err(io::Error::new(io::ErrorKind::Other, "simulated read failure"));
        }

        self.inner.terms(field)
    }

    fn numeric_values(&self, field: &str) -> io::Result<Option<Arc<NumericColumn>>> {
        self.inner.numeric_values(field)
    }

    fn add_core_closed_listener(&self, listener: CoreClosedListener) {
        self.listeners.fetch_add(1, Ordering::SeqCst);
        self.inner.add_core_closed_listener(listener)
    }
}

/// Route cache logs to the test harness; `RUST_LOG` raises the level
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .with_test_writer()
        .try_init();
}

/// Four documents with a mix of text fields; doc 2 has no "count"
pub fn create_test_segment() -> MemorySegment {
    let mut builder = MemorySegment::builder(4);
    builder
        .add_text_values("count", [Some("5"), Some("-2"), None, Some("5")])
        .add_text_values("price", [Some("19.99"), Some("-0"), Some("1e400"), None])
        .add_text_values("color", [Some("red"), None, Some("blue"), Some("red")]);
    builder.build().expect("valid segment")
}
