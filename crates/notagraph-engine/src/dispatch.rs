//! Action dispatch
//!
//! Handlers are scanned in registration order and the first one whose
//! `handles` returns true runs. A dispatch produces at most one response.
//!
//! Overlapping declared kinds are detected when a handler is registered.
//! By default a warning is logged and the first registered handler keeps
//! winning; with `strict_handler_kinds` registration fails instead.

use notagraph_core::errors::{ExError, ExErrorKind};

use crate::actions::{Action, ActionKind};
use crate::errors::{ambiguous_handler, Result};
use crate::handlers;
use crate::state::ModelStateManager;

/// Processor of one or more action kinds
///
/// Handlers never fail across this boundary: they log their own diagnostic
/// and return `None`.
pub trait ActionHandler: Send {
    fn name(&self) -> &'static str;

    /// Action kinds this handler declares
    fn kinds(&self) -> &'static [ActionKind];

    fn handles(&self, action: &Action) -> bool {
        self.kinds().contains(&action.kind())
    }

    fn execute(&self, action: &Action, state: &mut ModelStateManager) -> Option<Action>;
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatcherConfig {
    pub strict_handler_kinds: bool,
}

#[derive(Default)]
pub struct ActionDispatcher {
    handlers: Vec<Box<dyn ActionHandler>>,
    config: DispatcherConfig,
}

impl std::fmt::Debug for ActionDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ActionDispatcher")
            .field("handlers", &self.handler_names())
            .field("config", &self.config)
            .finish()
    }
}

impl ActionDispatcher {
    pub fn new(config: DispatcherConfig) -> Self {
        Self {
            handlers: Vec::new(),
            config,
        }
    }

    /// Dispatcher with the stock handlers for every request kind
    ///
    /// # Errors
    ///
    /// Never fails for the stock set; the signature follows [`Self::register`].
    pub fn with_default_handlers(config: DispatcherConfig) -> Result<Self> {
        let mut dispatcher = Self::new(config);
        for handler in handlers::default_handlers() {
            dispatcher.register(handler)?;
        }
        Ok(dispatcher)
    }

    /// Append a handler to the scan order
    ///
    /// # Errors
    ///
    /// Returns `AmbiguousHandler` in strict mode when a declared kind is
    /// already claimed by an earlier handler.
    pub fn register(&mut self, handler: Box<dyn ActionHandler>) -> Result<()> {
        for kind in handler.kinds() {
            if let Some(existing) = self.handlers.iter().find(|h| h.kinds().contains(kind)) {
                if self.config.strict_handler_kinds {
                    return Err(ambiguous_handler(handler.name(), existing.name(), *kind));
                }
                tracing::warn!(
                    handler = handler.name(),
                    existing = existing.name(),
                    action_kind = kind.as_str(),
                    "overlapping handler kinds, first registered wins"
                );
            }
        }
        tracing::debug!(handler = handler.name(), "handler registered");
        self.handlers.push(handler);
        Ok(())
    }

    /// Run the first matching handler
    pub fn dispatch(&self, action: &Action, state: &mut ModelStateManager) -> Option<Action> {
        let kind = action.kind();
        match self.handlers.iter().find(|h| h.handles(action)) {
            Some(handler) => {
                tracing::debug!(
                    handler = handler.name(),
                    action_kind = kind.as_str(),
                    "dispatching"
                );
                handler.execute(action, state)
            }
            None => {
                let err = unhandled(kind);
                tracing::debug!(
                    action_kind = kind.as_str(),
                    err_kind = ?err.kind(),
                    err_code = err.code(),
                    "no handler for action"
                );
                None
            }
        }
    }

    pub fn handler_names(&self) -> Vec<&'static str> {
        self.handlers.iter().map(|h| h.name()).collect()
    }

    pub fn config(&self) -> DispatcherConfig {
        self.config
    }
}

fn unhandled(kind: ActionKind) -> ExError {
    ExError::new(ExErrorKind::UnhandledAction)
        .with_op("dispatch")
        .with_message(format!("no handler for {}", kind.as_str()))
}
