//! Error types for the alignment engine.
//!
//! The taxonomy follows three fatal classes: configuration problems
//! (reported before any work is done), data inconsistencies discovered
//! mid-run (the run aborts because downstream counters would be
//! unreliable), and database file problems at load time. Ambiguity is
//! *not* an error anywhere in the engine; it is the documented
//! "don't know" outcome and lives in [`crate::database::CellValue`].

use thiserror::Error;

/// Errors that can occur while analyzing or augmenting a document.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Unknown mode code or otherwise malformed run configuration.
    #[error("configuration error: {message}")]
    Config { message: String },

    /// Inconsistent annotation data at a specific reference.
    #[error("data error at {reference}: {message}")]
    Data { reference: String, message: String },

    /// Unreadable or corrupt database file.
    #[error("database error in {path}: {message}")]
    Database { path: String, message: String },

    /// I/O failure while reading or writing a run artifact.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl EngineError {
    pub fn config(message: impl Into<String>) -> Self {
        EngineError::Config {
            message: message.into(),
        }
    }

    pub fn data(reference: impl ToString, message: impl Into<String>) -> Self {
        EngineError::Data {
            reference: reference.to_string(),
            message: message.into(),
        }
    }
}

/// Result type for engine operations.
pub type EngineResult<T> = Result<T, EngineError>;
