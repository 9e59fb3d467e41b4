//! Value containers handed out by the field cache
//!
//! Every container is immutable once built and sized to the segment's
//! document count at fill time.

mod binary;
mod docs_with_field;
mod numeric;
mod packed;
mod ram;
mod sorted;
mod sorted_set;

pub use binary::{TermValues, TermValuesBuilder};
pub use docs_with_field::DocsWithField;
pub use numeric::{NumericScalar, NumericValues};
pub use packed::{bits_required, PackedOrds};
pub use ram::{human_readable_units, RamUsage};
pub use sorted::SortedTerms;
pub use sorted_set::TermOrdinals;
