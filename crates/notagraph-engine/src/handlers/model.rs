//! Handlers working on the model as a whole: history, saving and fetching

use crate::actions::{Action, ActionKind};
use crate::dispatch::ActionHandler;
use crate::state::ModelStateManager;

use super::update_model;

/// Undo or redo the adjacent command and answer with the new render snapshot
#[derive(Debug, Clone, Copy, Default)]
pub struct UndoRedoHandler;

impl ActionHandler for UndoRedoHandler {
    fn name(&self) -> &'static str {
        "undo_redo"
    }

    fn kinds(&self) -> &'static [ActionKind] {
        &[ActionKind::Undo, ActionKind::Redo]
    }

    fn execute(&self, action: &Action, state: &mut ModelStateManager) -> Option<Action> {
        let moved = match action {
            Action::Undo => state.undo(),
            Action::Redo => state.redo(),
            _ => return None,
        };
        moved.then(|| update_model(state))
    }
}

/// Queue a save; the session answers once the write has finished
#[derive(Debug, Clone, Copy, Default)]
pub struct SaveModelHandler;

impl ActionHandler for SaveModelHandler {
    fn name(&self) -> &'static str {
        "save_model"
    }

    fn kinds(&self) -> &'static [ActionKind] {
        &[ActionKind::SaveModel]
    }

    fn execute(&self, _: &Action, state: &mut ModelStateManager) -> Option<Action> {
        state.request_save();
        None
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct RequestModelHandler;

impl ActionHandler for RequestModelHandler {
    fn name(&self) -> &'static str {
        "request_model"
    }

    fn kinds(&self) -> &'static [ActionKind] {
        &[ActionKind::RequestModel]
    }

    fn execute(&self, _: &Action, state: &mut ModelStateManager) -> Option<Action> {
        Some(update_model(state))
    }
}
