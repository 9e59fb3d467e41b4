//! Diagnostic output sinks

use std::io::Write;
use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::Mutex;
use tracing::warn;

/// Receives free-text diagnostics from the cache
pub trait InfoStream: Send + Sync {
    fn message(&self, message: &str);
}

/// Forwards diagnostics to `tracing` at warn level
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingInfoStream;

impl InfoStream for TracingInfoStream {
    fn message(&self, message: &str) {
        warn!("{}", message);
    }
}

/// Keeps every message in memory
#[derive(Debug, Default)]
pub struct CollectingInfoStream {
    messages: Mutex<Vec<String>>,
}

impl CollectingInfoStream {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages(&self) -> Vec<String> {
        self.messages.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.messages.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.lock().is_empty()
    }

    pub fn clear(&self) {
        self.messages.lock().clear();
    }
}

impl InfoStream for CollectingInfoStream {
    fn message(&self, message: &str) {
        self.messages.lock().push(message.to_string());
    }
}

/// Writes one line per message to any writer.
///
/// The first write error is logged through `tracing`; later ones are dropped.
pub struct WriterInfoStream<W> {
    writer: Mutex<W>,
    write_failed: AtomicBool,
}

impl<W: Write + Send> WriterInfoStream<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer: Mutex::new(writer),
            write_failed: AtomicBool::new(false),
        }
    }

    /// Whether any message could not be written
    pub fn has_write_failed(&self) -> bool {
        self.write_failed.load(Ordering::Relaxed)
    }

    pub fn into_inner(self) -> W {
        self.writer.into_inner()
    }
}

impl<W: Write + Send> InfoStream for WriterInfoStream<W> {
    fn message(&self, message: &str) {
        let mut writer = self.writer.lock();
        if let Err(err) = writeln!(writer, "{}", message) {
            if !self.write_failed.swap(true, Ordering::Relaxed) {
                warn!("Field cache info stream write failed: {}", err);
            }
        }
    }
}
