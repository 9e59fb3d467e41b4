pub mod cache;
pub mod config;
pub mod error;
pub mod metrics;
pub mod parser;
pub mod sanity;
pub mod segment;
pub mod values;

pub use cache::{
    default_cache, CacheEntry, CachedValue, CollectingInfoStream, EntryCustom, EntryKind,
    FieldCache, InfoStream, TracingInfoStream, WriterInfoStream,
};
pub use config::{overhead, CacheProfile, FieldCacheConfig};
pub use error::{FieldCacheError, Result};
pub use metrics::CacheMetrics;
pub use parser::{register_parser, ParserId, ParserRef, ValueParser};
pub use sanity::{check_sanity, Insanity, InsanityKind, SanityCheck};
pub use segment::{
    DocId, MemorySegment, MemorySegmentBuilder, NumericColumn, SegmentKey, SegmentSource,
    TermsEnum,
};
pub use values::{
    DocsWithField, NumericScalar, NumericValues, SortedTerms, TermOrdinals, TermValues,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
