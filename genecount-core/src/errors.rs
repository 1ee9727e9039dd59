use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Error parsing range section: {0}")]
    RangeParseError(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
