use serde::{Deserialize, Serialize};

/// Acceptable memory overhead ratios for per-document ordinal storage.
///
/// A ratio of `r` allows `bits * (1 + r)` bits per value when that lets the
/// storage round up to a byte-aligned width.
pub mod overhead {
    /// Always pack at the minimal bit width
    pub const COMPACT: f32 = 0.0;
    /// Allow up to 20% waste
    pub const DEFAULT: f32 = 0.2;
    /// Allow up to 50% waste
    pub const FAST: f32 = 0.5;
    /// Always pick the fastest aligned width
    pub const FASTEST: f32 = 7.0;
}

/// Field cache configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct FieldCacheConfig {
    /// Fail fetches that would cache a field under a second, incompatible
    /// kind for the same segment instead of only reporting it
    pub reject_type_mismatch: bool,
    /// Overhead ratio used by the terms accessors that do not take one
    pub default_overhead_ratio: f32,
    /// Estimate entry sizes before printing an insanity warning
    pub estimate_sizes_in_diagnostics: bool,
    /// Register a core-closed listener on each segment the cache sees
    pub register_core_listeners: bool,
}

impl Default for FieldCacheConfig {
    fn default() -> Self {
        Self {
            reject_type_mismatch: false,
            default_overhead_ratio: overhead::FAST,
            estimate_sizes_in_diagnostics: true,
            register_core_listeners: true,
        }
    }
}

/// Configuration profiles for different workloads
#[derive(Clone, Debug)]
pub enum CacheProfile {
    /// Smallest ordinal storage, lenient type checking
    MemoryLean,
    Balanced,
    /// Aligned ordinal storage for the fastest lookups
    LowLatency,
    /// Reject any (segment, field) cached under two incompatible kinds
    Strict,
}

impl CacheProfile {
    /// Get the default overhead ratio for this profile
    pub fn overhead_ratio(&self) -> f32 {
        match self {
            CacheProfile::MemoryLean => overhead::COMPACT,
            CacheProfile::Balanced => overhead::FAST,
            CacheProfile::LowLatency => overhead::FASTEST,
            CacheProfile::Strict => overhead::FAST,
        }
    }

    /// Whether type mismatches are rejected under this profile
    pub fn rejects_type_mismatch(&self) -> bool {
        matches!(self, CacheProfile::Strict)
    }

    /// Apply this profile to a FieldCacheConfig
    pub fn apply_to(&self, config: &mut FieldCacheConfig) {
        config.default_overhead_ratio = self.overhead_ratio();
        config.reject_type_mismatch = self.rejects_type_mismatch();
    }
}

impl FieldCacheConfig {
    /// Apply a cache profile to this configuration
    pub fn with_profile(mut self, profile: CacheProfile) -> Self {
        profile.apply_to(&mut self);
        self
    }

    pub fn with_reject_type_mismatch(mut self, reject: bool) -> Self {
        self.reject_type_mismatch = reject;
        self
    }

    /// Set the overhead ratio for terms accessors without an explicit one.
    /// Negative ratios are clamped to `COMPACT`.
    pub fn with_default_overhead_ratio(mut self, ratio: f32) -> Self {
        self.default_overhead_ratio = ratio.max(overhead::COMPACT);
        self
    }

    pub fn with_estimate_sizes_in_diagnostics(mut self, estimate: bool) -> Self {
        self.estimate_sizes_in_diagnostics = estimate;
        self
    }

    pub fn with_register_core_listeners(mut self, register: bool) -> Self {
        self.register_core_listeners = register;
        self
    }
}
