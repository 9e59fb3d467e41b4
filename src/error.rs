use std::io;
use std::sync::Arc;

use thiserror::Error;

use crate::cache::EntryKind;

/// Main error type for field cache operations
///
/// Errors are `Clone` so that a single failed fill can be handed to the
/// triggering caller and to every caller that was waiting on it.
#[derive(Error, Debug, Clone)]
pub enum FieldCacheError {
    #[error("Malformed value {term:?}: {reason}")]
    MalformedValue { term: String, reason: String },

    #[error("Type mismatch on field '{field}': cached as {existing}, requested as {requested}")]
    FieldTypeMismatch {
        field: String,
        existing: String,
        requested: EntryKind,
    },

    #[error("IO error: {0}")]
    Io(Arc<io::Error>),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type alias for field cache operations
pub type Result<T> = std::result::Result<T, FieldCacheError>;

impl From<io::Error> for FieldCacheError {
    fn from(err: io::Error) -> Self {
        FieldCacheError::Io(Arc::new(err))
    }
}

impl FieldCacheError {
    /// Build a `MalformedValue` from raw term bytes
    pub fn malformed(term: &[u8], reason: impl Into<String>) -> Self {
        FieldCacheError::MalformedValue {
            term: String::from_utf8_lossy(term).into_owned(),
            reason: reason.into(),
        }
    }

    /// Check if this error indicates a transient failure that could be retried
    pub fn is_retriable(&self) -> bool {
        matches!(self, FieldCacheError::Io(_))
    }

    pub fn is_malformed(&self) -> bool {
        matches!(self, FieldCacheError::MalformedValue { .. })
    }
}
