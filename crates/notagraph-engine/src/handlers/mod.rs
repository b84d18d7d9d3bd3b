//! Stock action handlers
//!
//! ## Logging Ownership
//!
//! Handlers own lifecycle logging for edits that reach the model:
//! - `log_op_start!` at entry
//! - `log_op_end!` on success
//! - `log_op_error!` on failure
//!
//! The manager and the core use only `tracing::debug!()` for internal details.

pub mod edit;
pub mod model;

use notagraph_core::history::Edit;
use notagraph_core::{log_op_end, log_op_error, log_op_start};

use crate::actions::Action;
use crate::dispatch::ActionHandler;
use crate::state::ModelStateManager;

pub use edit::{ChangeBoundsHandler, CreateNodeHandler, DeleteElementHandler, SetFeatureHandler};
pub use model::{RequestModelHandler, SaveModelHandler, UndoRedoHandler};

/// One handler per request kind, in dispatch order
pub fn default_handlers() -> Vec<Box<dyn ActionHandler>> {
    vec![
        Box::new(UndoRedoHandler),
        Box::new(SaveModelHandler),
        Box::new(RequestModelHandler),
        Box::new(SetFeatureHandler),
        Box::new(ChangeBoundsHandler),
        Box::new(CreateNodeHandler),
        Box::new(DeleteElementHandler),
    ]
}

/// Fresh render snapshot as a response
pub(crate) fn update_model(state: &ModelStateManager) -> Action {
    Action::UpdateModel {
        graph: state.render(),
    }
}

/// Execute an edit with boundary logging; `None` on failure
pub(crate) fn apply_edit(op: &str, edit: Edit, state: &mut ModelStateManager) -> Option<Action> {
    log_op_start!(op, label = %edit.label());
    let start = std::time::Instant::now();

    match state.execute(edit) {
        Ok(records) => {
            log_op_end!(
                op,
                duration_ms = start.elapsed().as_millis() as u64,
                record_count = records.len(),
                revision = state.revision()
            );
            Some(update_model(state))
        }
        Err(err) => {
            log_op_error!(
                op,
                err.clone(),
                duration_ms = start.elapsed().as_millis() as u64,
                element_id = err.element_id().unwrap_or_default()
            );
            None
        }
    }
}
