//! Handlers that turn client edits into undoable commands
//!
//! Every successful edit is answered with the new render snapshot.
//! Rejected edits are logged and answered with nothing.

use notagraph_core::history::Edit;

use crate::actions::{Action, ActionKind};
use crate::dispatch::ActionHandler;
use crate::state::ModelStateManager;

use super::apply_edit;

#[derive(Debug, Clone, Copy, Default)]
pub struct SetFeatureHandler;

impl ActionHandler for SetFeatureHandler {
    fn name(&self) -> &'static str {
        "set_feature"
    }

    fn kinds(&self) -> &'static [ActionKind] {
        &[ActionKind::SetFeature]
    }

    fn execute(&self, action: &Action, state: &mut ModelStateManager) -> Option<Action> {
        let Action::SetFeature {
            element,
            feature,
            value,
        } = action
        else {
            return None;
        };
        let edit = Edit::SetFeature {
            element: element.clone(),
            feature: feature.clone(),
            value: value.clone(),
        };
        apply_edit("set_feature", edit, state)
    }
}

/// Move and/or resize; both at once form a single undo step
#[derive(Debug, Clone, Copy, Default)]
pub struct ChangeBoundsHandler;

impl ActionHandler for ChangeBoundsHandler {
    fn name(&self) -> &'static str {
        "change_bounds"
    }

    fn kinds(&self) -> &'static [ActionKind] {
        &[ActionKind::ChangeBounds]
    }

    fn execute(&self, action: &Action, state: &mut ModelStateManager) -> Option<Action> {
        let Action::ChangeBounds {
            element,
            position,
            size,
        } = action
        else {
            return None;
        };
        let edit = match (position, size) {
            (Some(position), None) => Edit::MoveTo {
                element: element.clone(),
                position: *position,
            },
            (None, Some(size)) => Edit::Resize {
                element: element.clone(),
                size: *size,
            },
            (Some(position), Some(size)) => Edit::Compound {
                label: "Change bounds".to_string(),
                edits: vec![
                    Edit::MoveTo {
                        element: element.clone(),
                        position: *position,
                    },
                    Edit::Resize {
                        element: element.clone(),
                        size: *size,
                    },
                ],
            },
            (None, None) => {
                tracing::debug!(element_id = %element, "change bounds without position or size");
                return None;
            }
        };
        apply_edit("change_bounds", edit, state)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct CreateNodeHandler;

impl ActionHandler for CreateNodeHandler {
    fn name(&self) -> &'static str {
        "create_node"
    }

    fn kinds(&self) -> &'static [ActionKind] {
        &[ActionKind::CreateNode]
    }

    fn execute(&self, action: &Action, state: &mut ModelStateManager) -> Option<Action> {
        let Action::CreateNode {
            parent,
            element_kind,
            position,
            size,
        } = action
        else {
            return None;
        };
        let edit = Edit::CreateNode {
            parent: parent.clone(),
            kind: *element_kind,
            position: *position,
            size: *size,
        };
        apply_edit("create_node", edit, state)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct DeleteElementHandler;

impl ActionHandler for DeleteElementHandler {
    fn name(&self) -> &'static str {
        "delete_element"
    }

    fn kinds(&self) -> &'static [ActionKind] {
        &[ActionKind::DeleteElement]
    }

    fn execute(&self, action: &Action, state: &mut ModelStateManager) -> Option<Action> {
        let Action::DeleteElement { element } = action else {
            return None;
        };
        apply_edit(
            "delete_element",
            Edit::RemoveElement {
                element: element.clone(),
            },
            state,
        )
    }
}
