/*!
Core types and error handling for EvoVis data services.
*/

use thiserror::Error;

/// Result type for EvoVis data operations
pub type EvoVisResult<T> = Result<T, EvoVisError>;

/// Error types for EvoVis data operations
#[derive(Error, Debug)]
pub enum EvoVisError {
    #[error("run configuration not found: {0}")]
    ConfigNotFound(String),

    #[error("invalid search space: {0}")]
    InvalidSearchSpace(String),

    #[error("unknown start layer '{0}': not a node of the layer graph")]
    UnknownStartLayer(String),

    #[error("JSON parsing error: {0}")]
    JsonError(String),

    #[error("CSV parsing error: {0}")]
    CsvError(String),

    #[error("I/O error: {0}")]
    IoError(String),
}

// Convert from serde_json::Error
impl From<serde_json::Error> for EvoVisError {
    fn from(err: serde_json::Error) -> Self {
        EvoVisError::JsonError(err.to_string())
    }
}

// Convert from std::io::Error
impl From<std::io::Error> for EvoVisError {
    fn from(err: std::io::Error) -> Self {
        EvoVisError::IoError(err.to_string())
    }
}

// Convert from csv::Error
impl From<csv::Error> for EvoVisError {
    fn from(err: csv::Error) -> Self {
        EvoVisError::CsvError(err.to_string())
    }
}
