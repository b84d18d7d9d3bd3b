//! Error handling for notagraph-engine
//!
//! The engine speaks `ExError` at its boundaries; these helpers build the
//! engine-specific ones.

use notagraph_core::errors::{ExError, ExErrorKind};

use crate::actions::ActionKind;

/// Result type alias using ExError
pub type Result<T> = std::result::Result<T, ExError>;

/// Two handlers declare the same action kind under strict registration
pub fn ambiguous_handler(handler: &str, existing: &str, kind: ActionKind) -> ExError {
    ExError::new(ExErrorKind::AmbiguousHandler)
        .with_op("register_handler")
        .with_message(format!(
            "Handler {} declares {} which is already handled by {}",
            handler,
            kind.as_str(),
            existing
        ))
}

/// Create a configuration error
pub fn config_error(reason: impl Into<String>) -> ExError {
    ExError::new(ExErrorKind::InvalidInput)
        .with_op("load_config")
        .with_message(reason.into())
}

/// The session no longer accepts actions
pub fn session_closed() -> ExError {
    ExError::new(ExErrorKind::IllegalState)
        .with_op("send_action")
        .with_message("session is closed")
}
