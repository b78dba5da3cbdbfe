use thiserror::Error;

#[derive(Debug, Error)]
pub enum ChartingError {
    /// A required field was missing or empty; nothing was written.
    #[error("{0}")]
    Validation(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("storage error: {0}")]
    Storage(#[from] rusqlite::Error),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

pub type ChartingResult<T> = Result<T, ChartingError>;
