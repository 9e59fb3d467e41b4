use prometheus::{
    Encoder, Histogram, HistogramOpts, IntCounter, IntCounterVec, IntGauge, Opts, Registry,
    TextEncoder,
};
use std::sync::Arc;

/// Prometheus metrics for the field cache
#[derive(Clone)]
pub struct CacheMetrics {
    // Counters
    pub hits: IntCounterVec,
    pub misses: IntCounterVec,
    pub fills: IntCounterVec,
    pub fill_failures: IntCounterVec,
    pub waits: IntCounter,
    pub purges: IntCounter,

    // Gauges
    pub segments: IntGauge,

    // Histograms
    pub fill_latency: Histogram,

    // Registry
    registry: Arc<Registry>,
}

impl CacheMetrics {
    /// Create a new CacheMetrics instance on a private registry
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();

        let hits = IntCounterVec::new(
            Opts::new("fieldcache_hits_total", "Lookups answered from a filled entry"),
            &["kind"],
        )?;
        registry.register(Box::new(hits.clone()))?;

        let misses = IntCounterVec::new(
            Opts::new("fieldcache_misses_total", "Lookups that had to start a fill"),
            &["kind"],
        )?;
        registry.register(Box::new(misses.clone()))?;

        let fills = IntCounterVec::new(
            Opts::new("fieldcache_fills_total", "Completed uninversion passes"),
            &["kind"],
        )?;
        registry.register(Box::new(fills.clone()))?;

        let fill_failures = IntCounterVec::new(
            Opts::new("fieldcache_fill_failures_total", "Fills that ended in an error"),
            &["kind"],
        )?;
        registry.register(Box::new(fill_failures.clone()))?;

        let waits = IntCounter::with_opts(Opts::new(
            "fieldcache_waits_total",
            "Lookups that joined a fill already in flight",
        ))?;
        registry.register(Box::new(waits.clone()))?;

        let purges = IntCounter::with_opts(Opts::new(
            "fieldcache_purges_total",
            "Segment tables dropped by purge or core close",
        ))?;
        registry.register(Box::new(purges.clone()))?;

        let segments = IntGauge::with_opts(Opts::new(
            "fieldcache_segments",
            "Segments with at least one cache table",
        ))?;
        registry.register(Box::new(segments.clone()))?;

        let fill_latency = Histogram::with_opts(
            HistogramOpts::new("fieldcache_fill_latency_seconds", "Uninversion latency")
                .buckets(vec![0.0001, 0.001, 0.005, 0.01, 0.05, 0.1, 0.5, 1.0, 5.0]),
        )?;
        registry.register(Box::new(fill_latency.clone()))?;

        Ok(Self {
            hits,
            misses,
            fills,
            fill_failures,
            waits,
            purges,
            segments,
            fill_latency,
            registry: Arc::new(registry),
        })
    }

    /// Get the Prometheus registry
    pub fn registry(&self) -> Arc<Registry> {
        self.registry.clone()
    }

    pub fn record_hit(&self, kind: &str) {
        self.hits.with_label_values(&[kind]).inc();
    }

    pub fn record_miss(&self, kind: &str) {
        self.misses.with_label_values(&[kind]).inc();
    }

    pub fn record_wait(&self) {
        self.waits.inc();
    }

    /// Record a completed fill
    pub fn record_fill(&self, kind: &str, duration_secs: f64) {
        self.fills.with_label_values(&[kind]).inc();
        self.fill_latency.observe(duration_secs);
    }

    pub fn record_fill_failure(&self, kind: &str) {
        self.fill_failures.with_label_values(&[kind]).inc();
    }

    pub fn record_purge(&self) {
        self.purges.inc();
    }

    pub fn set_segments(&self, count: usize) {
        self.segments.set(count as i64);
    }

    /// Number of completed fills for a kind label
    pub fn fill_count(&self, kind: &str) -> u64 {
        self.fills.with_label_values(&[kind]).get()
    }

    /// Render all metrics in the Prometheus text format
    pub fn gather(&self) -> String {
        let mut buffer = Vec::new();
        let encoder = TextEncoder::new();
        if encoder.encode(&self.registry.gather(), &mut buffer).is_err() {
            return String::new();
        }
        String::from_utf8(buffer).unwrap_or_default()
    }
}

impl Default for CacheMetrics {
    fn default() -> Self {
        Self::new().expect("Failed to create metrics")
    }
}
