//! Memory accounting for cached containers

use std::mem;

/// Approximate heap footprint of a cached container
pub trait RamUsage {
    fn ram_bytes_used(&self) -> usize;
}

impl RamUsage for roaring::RoaringBitmap {
    fn ram_bytes_used(&self) -> usize {
        self.serialized_size()
    }
}

impl<T: Copy> RamUsage for [T] {
    fn ram_bytes_used(&self) -> usize {
        mem::size_of_val(self)
    }
}

/// Render a byte count as "12 bytes", "1.2 KB", "3.4 MB" or "1.1 GB"
pub fn human_readable_units(bytes: usize) -> String {
    const KB: f64 = 1024.0;
    const MB: f64 = KB * 1024.0;
    const GB: f64 = MB * 1024.0;

    let b = bytes as f64;
    if b >= GB {
        format!("{:.1} GB", b / GB)
    } else if b >= MB {
        format!("{:.1} MB", b / MB)
    } else if b >= KB {
        format!("{:.1} KB", b / KB)
    } else {
        format!("{} bytes", bytes)
    }
}
