//! notagraph engine - action-driven editing sessions
//!
//! Wraps the core model in the pieces a diagram client talks to:
//! - [`ModelStateManager`]: model, history, notifier, collaborators and the
//!   saved marker behind one mutation point
//! - [`ActionDispatcher`] with the stock [`handlers`]
//! - [`Session`]: the single-threaded loop feeding actions to the dispatcher
//!   and running saves off-loop
//! - [`EngineConfig`] loaded from TOML

pub mod actions;
pub mod config;
pub mod dispatch;
pub mod errors;
pub mod handlers;
pub mod session;
pub mod state;

pub use actions::{Action, ActionKind, Severity};
pub use config::EngineConfig;
pub use dispatch::{ActionDispatcher, ActionHandler, DispatcherConfig};
pub use errors::Result;
pub use session::{ActionSender, ResponseReceiver, Session};
pub use state::{ModelStateManager, PendingSave, SaveOutcome};
