//! Client actions and server responses
//!
//! Actions travel as JSON objects discriminated by `kind`, in the camelCase
//! vocabulary of the diagram protocol.

use notagraph_core::model::{Dimension, ElementId, ElementKind, FeatureKey, FeatureValue, Point};
use notagraph_core::render::RenderGraph;
use serde::{Deserialize, Serialize};

/// Severity of a `serverStatus` response
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Severity {
    Info,
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum Action {
    // ===== Requests =====
    Undo,
    Redo,
    SaveModel,
    RequestModel,
    SetFeature {
        element: ElementId,
        feature: FeatureKey,
        #[serde(default)]
        value: Option<FeatureValue>,
    },
    /// Move and/or resize a bounded element
    ChangeBounds {
        element: ElementId,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        position: Option<Point>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        size: Option<Dimension>,
    },
    CreateNode {
        parent: ElementId,
        #[serde(rename = "elementKind", default = "default_node_kind")]
        element_kind: ElementKind,
        position: Point,
        size: Dimension,
    },
    DeleteElement {
        element: ElementId,
    },

    // ===== Responses =====
    /// Fresh render snapshot; the graph carries the dirty flag
    UpdateModel {
        graph: RenderGraph,
    },
    SetDirtyState {
        dirty: bool,
        reason: String,
    },
    ServerStatus {
        severity: Severity,
        message: String,
    },
}

fn default_node_kind() -> ElementKind {
    ElementKind::Shape
}

/// Discriminant of an [`Action`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActionKind {
    Undo,
    Redo,
    SaveModel,
    RequestModel,
    SetFeature,
    ChangeBounds,
    CreateNode,
    DeleteElement,
    UpdateModel,
    SetDirtyState,
    ServerStatus,
}

impl ActionKind {
    /// Wire name of the kind
    pub fn as_str(self) -> &'static str {
        match self {
            ActionKind::Undo => "undo",
            ActionKind::Redo => "redo",
            ActionKind::SaveModel => "saveModel",
            ActionKind::RequestModel => "requestModel",
            ActionKind::SetFeature => "setFeature",
            ActionKind::ChangeBounds => "changeBounds",
            ActionKind::CreateNode => "createNode",
            ActionKind::DeleteElement => "deleteElement",
            ActionKind::UpdateModel => "updateModel",
            ActionKind::SetDirtyState => "setDirtyState",
            ActionKind::ServerStatus => "serverStatus",
        }
    }
}

impl Action {
    pub fn kind(&self) -> ActionKind {
        match self {
            Action::Undo => ActionKind::Undo,
            Action::Redo => ActionKind::Redo,
            Action::SaveModel => ActionKind::SaveModel,
            Action::RequestModel => ActionKind::RequestModel,
            Action::SetFeature { .. } => ActionKind::SetFeature,
            Action::ChangeBounds { .. } => ActionKind::ChangeBounds,
            Action::CreateNode { .. } => ActionKind::CreateNode,
            Action::DeleteElement { .. } => ActionKind::DeleteElement,
            Action::UpdateModel { .. } => ActionKind::UpdateModel,
            Action::SetDirtyState { .. } => ActionKind::SetDirtyState,
            Action::ServerStatus { .. } => ActionKind::ServerStatus,
        }
    }

    /// Parse one JSON-encoded action
    ///
    /// # Errors
    ///
    /// Returns a `Serialization` error for malformed or unknown actions.
    pub fn from_json(json: &str) -> crate::errors::Result<Self> {
        serde_json::from_str(json).map_err(|e| {
            notagraph_core::ExError::new(notagraph_core::ExErrorKind::Serialization)
                .with_op("parse_action")
                .with_message(e.to_string())
        })
    }
}
