use std::io;
use thiserror::Error;

/// Error type for alignment sources and counting runs.
#[derive(Error, Debug)]
pub enum CountingError {
    #[error(transparent)]
    Io(#[from] io::Error),

    /// The alignment source does not know this reference.
    #[error("Unknown reference: {0}")]
    UnknownReference(String),

    /// A region could not be turned into a query.
    #[error("Invalid region: {0}")]
    InvalidRegion(String),

    /// A record could not be turned into an alignment.
    #[error("Invalid alignment record: {0}")]
    InvalidRecord(String),

    #[error("Failed to build thread pool: {0}")]
    ThreadPool(String),
}

/// Result type alias for genecount-counting operations.
pub type Result<T> = std::result::Result<T, CountingError>;
