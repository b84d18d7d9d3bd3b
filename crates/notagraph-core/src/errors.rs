use notagraph_core_types::RequestId;
use thiserror::Error;

/// Result type alias using NotationError
pub type Result<T> = std::result::Result<T, NotationError>;

// ========== Error Facility ==========

/// Canonical error kind taxonomy
///
/// Each kind maps to a stable error code that can be used for programmatic
/// error handling, testing, and diagnostic responses sent to clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExErrorKind {
    // Structural/Validation
    InvalidInput,
    NotFound,
    /// Dual ownership, ownership cycle or corrupt history. Indicates a bug.
    InvariantViolation,

    // History
    /// Undo/redo requested while the history cannot move in that direction
    IllegalState,

    // Dispatch
    UnhandledAction,
    AmbiguousHandler,

    // Integration/IO
    Io,
    Serialization,
    Persistence,

    // Internal
    Internal,
}

impl ExErrorKind {
    /// Get the stable error code for this kind
    pub fn code(&self) -> &'static str {
        match self {
            ExErrorKind::InvalidInput => "ERR_INVALID_INPUT",
            ExErrorKind::NotFound => "ERR_NOT_FOUND",
            ExErrorKind::InvariantViolation => "ERR_INVARIANT_VIOLATION",
            ExErrorKind::IllegalState => "ERR_ILLEGAL_STATE",
            ExErrorKind::UnhandledAction => "ERR_UNHANDLED_ACTION",
            ExErrorKind::AmbiguousHandler => "ERR_AMBIGUOUS_HANDLER",
            ExErrorKind::Io => "ERR_IO",
            ExErrorKind::Serialization => "ERR_SERIALIZATION",
            ExErrorKind::Persistence => "ERR_PERSISTENCE",
            ExErrorKind::Internal => "ERR_INTERNAL",
        }
    }

    /// Whether a session can continue after an error of this kind
    pub fn is_recoverable(&self) -> bool {
        !matches!(
            self,
            ExErrorKind::InvariantViolation | ExErrorKind::Internal
        )
    }
}

/// Canonical structured error type
///
/// Carries a classification plus optional context for debugging. Crates
/// above the model (store, engine) speak this type at their boundaries.
#[derive(Debug, Clone)]
pub struct ExError {
    kind: ExErrorKind,
    op: Option<String>,
    element_id: Option<String>,
    feature: Option<String>,
    request_id: Option<RequestId>,
    message: String,
    source: Option<Box<ExError>>,
}

impl ExError {
    /// Create a new error with the specified kind
    pub fn new(kind: ExErrorKind) -> Self {
        Self {
            kind,
            op: None,
            element_id: None,
            feature: None,
            request_id: None,
            message: String::new(),
            source: None,
        }
    }

    /// Add operation context
    pub fn with_op(mut self, op: impl Into<String>) -> Self {
        self.op = Some(op.into());
        self
    }

    /// Add element ID context
    pub fn with_element_id(mut self, id: impl Into<String>) -> Self {
        self.element_id = Some(id.into());
        self
    }

    /// Add feature key context
    pub fn with_feature(mut self, feature: impl Into<String>) -> Self {
        self.feature = Some(feature.into());
        self
    }

    /// Add request ID context
    pub fn with_request_id(mut self, request_id: RequestId) -> Self {
        self.request_id = Some(request_id);
        self
    }

    /// Add custom message
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    /// Add source error
    pub fn with_source(mut self, source: ExError) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    pub fn kind(&self) -> ExErrorKind {
        self.kind
    }

    /// Get the stable error code
    pub fn code(&self) -> &'static str {
        self.kind.code()
    }

    pub fn op(&self) -> Option<&str> {
        self.op.as_deref()
    }

    pub fn element_id(&self) -> Option<&str> {
        self.element_id.as_deref()
    }

    pub fn feature(&self) -> Option<&str> {
        self.feature.as_deref()
    }

    pub fn request_id(&self) -> Option<&RequestId> {
        self.request_id.as_ref()
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// Get the source error, if any
    pub fn source_error(&self) -> Option<&ExError> {
        self.source.as_deref()
    }
}

impl std::fmt::Display for ExError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}]", self.code())?;
        if let Some(op) = &self.op {
            write!(f, " in operation '{}'", op)?;
        }
        if !self.message.is_empty() {
            write!(f, ": {}", self.message)?;
        }
        if let Some(element_id) = &self.element_id {
            write!(f, " (element_id: {})", element_id)?;
        }
        if let Some(feature) = &self.feature {
            write!(f, " (feature: {})", feature)?;
        }
        Ok(())
    }
}

impl std::error::Error for ExError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_deref()
            .map(|e| e as &(dyn std::error::Error + 'static))
    }
}

// ========== End Error Facility ==========

/// Error taxonomy for model and history operations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum NotationError {
    // ===== Lookup Errors =====
    /// Element not found in the model
    #[error("Element not found: {element_id}")]
    ElementNotFound { element_id: String },

    // ===== Ownership Invariants =====
    /// A value would end up with two owners at once
    #[error("Element {element_id} is already owned by {owner}.{feature}")]
    DualOwnership {
        element_id: String,
        owner: String,
        feature: String,
    },

    /// Attaching would make an element (transitively) contain itself
    #[error("Attaching {element_id} under {owner} would create an ownership cycle")]
    OwnershipCycle { element_id: String, owner: String },

    /// The root element can never be contained
    #[error("Root element {element_id} cannot be contained")]
    RootContainment { element_id: String },

    /// A recorded change no longer matches the model it is replayed on
    #[error("History out of sync at {element_id}.{feature}: {reason}")]
    HistoryOutOfSync {
        element_id: String,
        feature: String,
        reason: String,
    },

    // ===== Validation Errors =====
    /// Root element cannot be removed
    #[error("Cannot remove root element {element_id}")]
    CannotRemoveRoot { element_id: String },

    /// Feature is single-valued where a list was expected, or vice versa
    #[error("Feature {feature} on {element_id} is not a {expected} feature")]
    FeatureKindMismatch {
        element_id: String,
        feature: String,
        expected: &'static str,
    },

    /// List index outside the containment list
    #[error("Index {index} out of bounds for {element_id}.{feature} (len {len})")]
    IndexOutOfBounds {
        element_id: String,
        feature: String,
        index: usize,
        len: usize,
    },

    /// Numbers must be finite to survive persistence
    #[error("Non-finite number for {element_id}.{feature}")]
    NonFiniteNumber { element_id: String, feature: String },

    /// References on the visible model must point into the visible model
    #[error("Reference {element_id}.{feature} targets {target}, which is not attached")]
    DetachedReference {
        element_id: String,
        feature: String,
        target: String,
    },

    /// Element kind lacks the capability an edit needs
    #[error("Element {element_id} has no {capability} capability")]
    MissingCapability {
        element_id: String,
        capability: &'static str,
    },

    /// Snapshot cannot be turned into a model
    #[error("Invalid snapshot: {reason}")]
    InvalidSnapshot { reason: String },

    /// Snapshot written by a newer format
    #[error("Unsupported snapshot format version {found} (supported: {supported})")]
    UnsupportedSnapshotVersion { found: u32, supported: u32 },

    // ===== History Errors =====
    /// Undo requested with nothing applied
    #[error("Nothing to undo")]
    NothingToUndo,

    /// Redo requested with nothing undone
    #[error("Nothing to redo")]
    NothingToRedo,

    /// Command inverted before it was ever applied
    #[error("Command '{label}' was never applied")]
    CommandNotApplied { label: String },

    // ===== Generic Errors =====
    /// Serialization error (JSON encoding/decoding)
    #[error("Serialization error: {message}")]
    Serialization { message: String },

    /// Generic internal error
    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl NotationError {
    /// Classification of this error in the canonical taxonomy
    pub fn kind(&self) -> ExErrorKind {
        match self {
            NotationError::ElementNotFound { .. } => ExErrorKind::NotFound,
            NotationError::DualOwnership { .. }
            | NotationError::OwnershipCycle { .. }
            | NotationError::RootContainment { .. }
            | NotationError::HistoryOutOfSync { .. } => ExErrorKind::InvariantViolation,
            NotationError::CannotRemoveRoot { .. }
            | NotationError::FeatureKindMismatch { .. }
            | NotationError::IndexOutOfBounds { .. }
            | NotationError::NonFiniteNumber { .. }
            | NotationError::DetachedReference { .. }
            | NotationError::MissingCapability { .. }
            | NotationError::InvalidSnapshot { .. }
            | NotationError::UnsupportedSnapshotVersion { .. } => ExErrorKind::InvalidInput,
            NotationError::NothingToUndo
            | NotationError::NothingToRedo
            | NotationError::CommandNotApplied { .. } => ExErrorKind::IllegalState,
            NotationError::Serialization { .. } => ExErrorKind::Serialization,
            NotationError::Internal { .. } => ExErrorKind::Internal,
        }
    }
}

/// Conversion from NotationError to ExError
impl From<NotationError> for ExError {
    fn from(err: NotationError) -> Self {
        let ex = ExError::new(err.kind()).with_message(err.to_string());
        match err {
            NotationError::ElementNotFound { element_id }
            | NotationError::OwnershipCycle { element_id, .. }
            | NotationError::RootContainment { element_id }
            | NotationError::CannotRemoveRoot { element_id }
            | NotationError::MissingCapability { element_id, .. } => {
                ex.with_element_id(element_id)
            }
            NotationError::DualOwnership {
                element_id,
                feature,
                ..
            } => ex.with_element_id(element_id).with_feature(feature),
            NotationError::HistoryOutOfSync {
                element_id,
                feature,
                ..
            }
            | NotationError::FeatureKindMismatch {
                element_id,
                feature,
                ..
            }
            | NotationError::IndexOutOfBounds {
                element_id,
                feature,
                ..
            }
            | NotationError::NonFiniteNumber {
                element_id,
                feature,
            }
            | NotationError::DetachedReference {
                element_id,
                feature,
                ..
            } => ex.with_element_id(element_id).with_feature(feature),
            NotationError::InvalidSnapshot { .. }
            | NotationError::UnsupportedSnapshotVersion { .. } => ex.with_op("load_snapshot"),
            NotationError::NothingToUndo => ex.with_op("undo"),
            NotationError::NothingToRedo => ex.with_op("redo"),
            NotationError::CommandNotApplied { .. } => ex.with_op("invert"),
            NotationError::Serialization { .. } | NotationError::Internal { .. } => ex,
        }
    }
}

/// Conversion from serde_json::Error to NotationError
impl From<serde_json::Error> for NotationError {
    fn from(err: serde_json::Error) -> Self {
        NotationError::Serialization {
            message: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kind_codes() {
        let cases = [
            (ExErrorKind::InvariantViolation, "ERR_INVARIANT_VIOLATION"),
            (ExErrorKind::IllegalState, "ERR_ILLEGAL_STATE"),
            (ExErrorKind::Persistence, "ERR_PERSISTENCE"),
            (ExErrorKind::UnhandledAction, "ERR_UNHANDLED_ACTION"),
            (ExErrorKind::AmbiguousHandler, "ERR_AMBIGUOUS_HANDLER"),
        ];
        for (kind, expected_code) in cases {
            assert_eq!(kind.code(), expected_code, "Wrong code for {:?}", kind);
        }
    }

    #[test]
    fn test_ownership_errors_are_invariant_violations() {
        let err = NotationError::DualOwnership {
            element_id: "p1".to_string(),
            owner: "shape-a".to_string(),
            feature: "position".to_string(),
        };
        assert_eq!(err.kind(), ExErrorKind::InvariantViolation);
        assert!(!err.kind().is_recoverable());

        let ex: ExError = err.into();
        assert_eq!(ex.code(), "ERR_INVARIANT_VIOLATION");
        assert_eq!(ex.element_id(), Some("p1"));
        assert_eq!(ex.feature(), Some("position"));
    }

    #[test]
    fn test_empty_history_is_illegal_state() {
        let ex: ExError = NotationError::NothingToUndo.into();
        assert_eq!(ex.kind(), ExErrorKind::IllegalState);
        assert_eq!(ex.op(), Some("undo"));
        assert!(ex.kind().is_recoverable());
    }

    #[test]
    fn test_display_includes_context() {
        let err = ExError::new(ExErrorKind::Persistence)
            .with_op("save")
            .with_message("disk full");
        let rendered = err.to_string();
        assert!(rendered.contains("ERR_PERSISTENCE"));
        assert!(rendered.contains("save"));
        assert!(rendered.contains("disk full"));
    }

    #[test]
    fn test_source_chain() {
        let inner = ExError::new(ExErrorKind::Io).with_message("rename failed");
        let outer = ExError::new(ExErrorKind::Persistence).with_source(inner);
        assert_eq!(
            outer.source_error().map(|e| e.kind()),
            Some(ExErrorKind::Io)
        );
        assert!(std::error::Error::source(&outer).is_some());
    }
}
