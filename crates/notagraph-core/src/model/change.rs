use serde::{Deserialize, Serialize};

use super::element::ElementId;
use super::value::{FeatureKey, FeatureValue};

/// Kind of structural transition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ChangeKind {
    /// Single-valued feature assignment (`None` means unset)
    Set,
    /// Element inserted into a containment list at `index`
    Add,
    /// Element removed from a containment list at `index`
    Remove,
}

/// Direction in which a record is replayed against a model
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Forward,
    Reverse,
}

/// One feature value transition
///
/// Records double as undo data: the old/new pair is enough to replay the
/// transition in either direction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChangeRecord {
    pub element: ElementId,
    pub feature: FeatureKey,
    pub kind: ChangeKind,
    pub old_value: Option<FeatureValue>,
    pub new_value: Option<FeatureValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub index: Option<usize>,
}

impl ChangeRecord {
    pub fn set(
        element: ElementId,
        feature: FeatureKey,
        old_value: Option<FeatureValue>,
        new_value: Option<FeatureValue>,
    ) -> Self {
        Self {
            element,
            feature,
            kind: ChangeKind::Set,
            old_value,
            new_value,
            index: None,
        }
    }

    pub fn add(owner: ElementId, feature: FeatureKey, child: ElementId, index: usize) -> Self {
        Self {
            element: owner,
            feature,
            kind: ChangeKind::Add,
            old_value: None,
            new_value: Some(FeatureValue::Contained(child)),
            index: Some(index),
        }
    }

    pub fn remove(owner: ElementId, feature: FeatureKey, child: ElementId, index: usize) -> Self {
        Self {
            element: owner,
            feature,
            kind: ChangeKind::Remove,
            old_value: Some(FeatureValue::Contained(child)),
            new_value: None,
            index: Some(index),
        }
    }

    /// A `Set` whose old and new values are equal
    pub fn is_touch(&self) -> bool {
        self.kind == ChangeKind::Set && self.old_value == self.new_value
    }

    /// The record that undoes this one
    pub fn inverted(&self) -> Self {
        let kind = match self.kind {
            ChangeKind::Set => ChangeKind::Set,
            ChangeKind::Add => ChangeKind::Remove,
            ChangeKind::Remove => ChangeKind::Add,
        };
        Self {
            element: self.element.clone(),
            feature: self.feature.clone(),
            kind,
            old_value: self.new_value.clone(),
            new_value: self.old_value.clone(),
            index: self.index,
        }
    }

    /// Every element this record attaches or releases
    pub fn contained_elements(&self) -> impl Iterator<Item = &ElementId> {
        [self.old_value.as_ref(), self.new_value.as_ref()]
            .into_iter()
            .flatten()
            .filter_map(FeatureValue::as_contained)
    }

    /// Element that changed owner through this record, if any
    pub fn contained_child(&self) -> Option<&ElementId> {
        self.new_value
            .as_ref()
            .and_then(FeatureValue::as_contained)
            .or_else(|| self.old_value.as_ref().and_then(FeatureValue::as_contained))
    }
}
