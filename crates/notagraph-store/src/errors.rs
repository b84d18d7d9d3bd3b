//! Error handling for notagraph-store
//!
//! Wraps notagraph-core ExError with store-specific helpers

use notagraph_core::errors::{ExError, ExErrorKind};
use std::path::Path;

/// Result type alias using ExError
pub type Result<T> = std::result::Result<T, ExError>;

/// Create an IO error
pub fn io_error(operation: &str, err: std::io::Error) -> ExError {
    ExError::new(ExErrorKind::Io)
        .with_op(operation.to_string())
        .with_message(err.to_string())
}

/// Create a serialization error from serde_json::Error
pub fn serialization_error(operation: &str, err: serde_json::Error) -> ExError {
    ExError::new(ExErrorKind::Serialization)
        .with_op(operation.to_string())
        .with_message(err.to_string())
}

/// Wrap a lower-level failure as a persistence error
pub fn persistence_error(operation: &str, source: ExError) -> ExError {
    ExError::new(ExErrorKind::Persistence)
        .with_op(operation.to_string())
        .with_message(format!("{} failed", operation))
        .with_source(source)
}

/// Create a missing model file error
pub fn not_found(path: &Path) -> ExError {
    ExError::new(ExErrorKind::NotFound)
        .with_op("load_model")
        .with_message(format!("No model stored at {}", path.display()))
}
