use thiserror::Error;

/// Errors that can occur when configuring overlap classification.
#[derive(Debug, Error)]
pub enum OverlapError {
    /// The counting mode is not one of SIMPLE, UNION, STRICT or NONEMPTY.
    #[error("Invalid counting mode: {0}. Valid options are SIMPLE, UNION, STRICT or NONEMPTY")]
    InvalidCountMode(String),
}
