use serde::{Deserialize, Serialize};
use std::fmt;

use crate::errors::{NotationError, Result};
use crate::model::{
    keys, ChangeRecord, Dimension, Direction, ElementId, ElementKind, FeatureKey, FeatureValue,
    NotationModel, Point,
};

/// Reversible unit of model mutation
///
/// `apply` and `invert` return the records they produced, in causal order,
/// for the caller to publish.
pub trait Command: fmt::Debug + Send {
    fn label(&self) -> &str;

    /// # Errors
    ///
    /// Returns the model error; the model must be unchanged on failure.
    fn apply(&mut self, model: &mut NotationModel) -> Result<Vec<ChangeRecord>>;

    /// # Errors
    ///
    /// Returns the model error; the model must be unchanged on failure.
    fn invert(&mut self, model: &mut NotationModel) -> Result<Vec<ChangeRecord>>;

    /// Elements this command may attach or release when replayed
    ///
    /// The history keeps these in the arena while the command is held.
    fn held_elements(&self) -> Vec<ElementId> {
        Vec::new()
    }
}

/// Mutation intent carried by an [`EditCommand`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "edit", rename_all = "camelCase")]
pub enum Edit {
    SetFeature {
        element: ElementId,
        feature: FeatureKey,
        value: Option<FeatureValue>,
    },
    /// Replace the element's position with a fresh `Point`
    MoveTo { element: ElementId, position: Point },
    /// Replace the element's size with a fresh `Dimension`
    Resize { element: ElementId, size: Dimension },
    AddChild {
        owner: ElementId,
        feature: FeatureKey,
        child: ElementId,
        index: Option<usize>,
    },
    CreateNode {
        parent: ElementId,
        kind: ElementKind,
        position: Point,
        size: Dimension,
    },
    RemoveElement { element: ElementId },
    /// Several edits applied as one undo step
    Compound { label: String, edits: Vec<Edit> },
}

impl Edit {
    pub fn label(&self) -> String {
        match self {
            Edit::SetFeature { feature, .. } => format!("Set {}", feature),
            Edit::MoveTo { .. } => "Move".to_string(),
            Edit::Resize { .. } => "Resize".to_string(),
            Edit::AddChild { .. } => "Add child".to_string(),
            Edit::CreateNode { kind, .. } => format!("Create {}", kind.as_str()),
            Edit::RemoveElement { .. } => "Delete".to_string(),
            Edit::Compound { label, .. } => label.clone(),
        }
    }

    /// Perform the edit against the model
    ///
    /// # Errors
    ///
    /// Returns the first model error. Compound edits roll back the steps
    /// they already applied, so the model is unchanged on failure.
    pub fn perform(&self, model: &mut NotationModel) -> Result<Vec<ChangeRecord>> {
        match self {
            Edit::SetFeature {
                element,
                feature,
                value,
            } => model.set_feature(element, feature.as_str(), value.clone()),
            Edit::MoveTo { element, position } => {
                require_bounds(model, element)?;
                let point = model.create_point(position.x, position.y)?;
                replace_value(model, element, keys::POSITION, point)
            }
            Edit::Resize { element, size } => {
                require_bounds(model, element)?;
                let dimension = model.create_dimension(size.width, size.height)?;
                replace_value(model, element, keys::SIZE, dimension)
            }
            Edit::AddChild {
                owner,
                feature,
                child,
                index,
            } => model.add_child(owner, feature.as_str(), child, *index),
            Edit::CreateNode {
                parent,
                kind,
                position,
                size,
            } => model
                .create_node(parent, *kind, *position, *size)
                .map(|(_, records)| records),
            Edit::RemoveElement { element } => model.remove_element(element),
            Edit::Compound { edits, .. } => {
                let mut records = Vec::new();
                for edit in edits {
                    match edit.perform(model) {
                        Ok(produced) => records.extend(produced),
                        Err(err) => {
                            model.revert(&records);
                            return Err(err);
                        }
                    }
                }
                Ok(records)
            }
        }
    }
}

fn require_bounds(model: &NotationModel, element: &ElementId) -> Result<()> {
    let target = model
        .element(element)
        .ok_or_else(|| NotationError::ElementNotFound {
            element_id: element.to_string(),
        })?;
    if target.kind().has_bounds() {
        Ok(())
    } else {
        Err(NotationError::MissingCapability {
            element_id: element.to_string(),
            capability: "bounds",
        })
    }
}

/// Assign a freshly created value, discarding it if the assignment fails
fn replace_value(
    model: &mut NotationModel,
    element: &ElementId,
    key: &str,
    value: ElementId,
) -> Result<Vec<ChangeRecord>> {
    match model.set_feature(element, key, Some(FeatureValue::Contained(value.clone()))) {
        Ok(records) => Ok(records),
        Err(err) => {
            model.discard(&value)?;
            Err(err)
        }
    }
}

/// Command that performs an [`Edit`] once and then replays its records
///
/// The first `apply` runs the edit and keeps the exact records it produced.
/// Later `apply` calls (redo) replay those records forward; `invert` (undo)
/// replays them backward. Element ids created by the first run are
/// therefore stable across undo and redo.
#[derive(Debug)]
pub struct EditCommand {
    label: String,
    edit: Edit,
    records: Option<Vec<ChangeRecord>>,
}

impl EditCommand {
    pub fn new(edit: Edit) -> Self {
        Self {
            label: edit.label(),
            edit,
            records: None,
        }
    }

    pub fn edit(&self) -> &Edit {
        &self.edit
    }

    /// Records captured on first application
    pub fn records(&self) -> Option<&[ChangeRecord]> {
        self.records.as_deref()
    }
}

impl Command for EditCommand {
    fn label(&self) -> &str {
        &self.label
    }

    fn apply(&mut self, model: &mut NotationModel) -> Result<Vec<ChangeRecord>> {
        match &self.records {
            Some(records) => {
                model.apply_batch(records, Direction::Forward)?;
                Ok(records.clone())
            }
            None => {
                let records = self.edit.perform(model)?;
                self.records = Some(records.clone());
                Ok(records)
            }
        }
    }

    fn invert(&mut self, model: &mut NotationModel) -> Result<Vec<ChangeRecord>> {
        let records = self
            .records
            .as_ref()
            .ok_or_else(|| NotationError::CommandNotApplied {
                label: self.label.clone(),
            })?;
        model.apply_batch(records, Direction::Reverse)?;
        Ok(records.iter().rev().map(ChangeRecord::inverted).collect())
    }

    fn held_elements(&self) -> Vec<ElementId> {
        self.records
            .iter()
            .flatten()
            .flat_map(ChangeRecord::contained_elements)
            .cloned()
            .collect()
    }
}
