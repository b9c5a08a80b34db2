//! Error taxonomy for the rating pipeline.
//!
//! Malformed numeric cells and rule courses missing from the table are not
//! errors; they are excluded from the weighted average instead.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum RaterError {
    /// A required request field was absent or empty.
    #[error("missing {0}")]
    InputMissing(&'static str),

    #[error("credit for course '{course}' is not a number: {value}")]
    InvalidCredit { course: String, value: String },

    #[error("file type not allowed: {0}")]
    UnsupportedFormat(String),

    #[error("invalid artifact name: {0:?}")]
    InvalidName(String),

    #[error("artifact not found: {0}")]
    NotFound(String),

    /// The tabular codec could not read or write the artifact.
    #[error("codec failure: {0}")]
    Codec(#[from] csv::Error),

    #[error("storage failure: {0}")]
    Storage(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, RaterError>;
