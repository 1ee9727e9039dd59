use std::io;
use thiserror::Error;

/// Error type for genecount-io operations.
#[derive(Error, Debug)]
pub enum FeatureFileError {
    /// IO error occurred during file operations.
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// Failed to create parent directories for file.
    #[error("Failed to create parent directories for file: {0}")]
    ParentDirectoryCreation(String),

    /// No usable feature was found in the file.
    #[error("No features found in file: {0}")]
    NoFeatures(String),
}

/// Result type alias for genecount-io operations.
pub type Result<T> = std::result::Result<T, FeatureFileError>;
