//! Segment collaborator model
//!
//! The field cache reads segments only through [`SegmentSource`]. This module
//! defines that seam and ships an in-memory implementation.
//!
//! # Architecture
//!
//! - `SegmentKey`: process-stable identity of a segment core
//! - `SegmentSource` / `TermsEnum`: what the cache consumes
//! - `TermDictionary`: FST term dictionary with roaring postings
//! - `NumericColumn`: pre-decoded per-document numeric channel
//! - `MemorySegment`: shared-core reader that fires close listeners on drop

mod types;
mod source;
mod term_dict;
mod docvalues;
mod reader;

pub use types::*;
pub use source::*;
pub use term_dict::*;
pub use docvalues::*;
pub use reader::*;
