//! Error types for spectral library search.

use std::fmt;

/// Errors that can occur during candidate filtering, scoring, and index management.
#[derive(Debug, Clone, PartialEq)]
pub enum SearchError {
    /// Invalid argument at the call site: bad metric axis, non-positive `top`,
    /// negative tolerance, zero-width bin range.
    BadArgument(String),
    /// A required resource (library file, ANN backend) was missing at initialization.
    NotFound(String),
    /// The persisted index is stale: fingerprint mismatch or missing per-charge file.
    /// Recovered locally by rebuilding the affected charge.
    IndexStale { charge: i8, reason: String },
    /// ANN backend failed to load, build, or query. Fatal for the current query batch.
    BackendFailure(String),
    /// A single candidate spectrum could not be read. The driver logs and skips it.
    TransientIo(String),
    /// Query/document vector dimension mismatch.
    DimensionMismatch { expected: usize, actual: usize },
    /// Other error, for extensibility.
    Other(String),
}

impl fmt::Display for SearchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SearchError::BadArgument(msg) => write!(f, "bad argument: {}", msg),
            SearchError::NotFound(what) => write!(f, "not found: {}", what),
            SearchError::IndexStale { charge, reason } => {
                write!(f, "stale index for charge {}: {}", charge, reason)
            }
            SearchError::BackendFailure(msg) => write!(f, "ANN backend failure: {}", msg),
            SearchError::TransientIo(msg) => write!(f, "transient I/O error: {}", msg),
            SearchError::DimensionMismatch { expected, actual } => {
                write!(f, "dimension mismatch: expected {}, got {}", expected, actual)
            }
            SearchError::Other(msg) => write!(f, "{}", msg),
        }
    }
}

impl std::error::Error for SearchError {}

impl From<crate::persistence::PersistenceError> for SearchError {
    fn from(e: crate::persistence::PersistenceError) -> Self {
        SearchError::BackendFailure(e.to_string())
    }
}

pub type SearchResult<T> = Result<T, SearchError>;
