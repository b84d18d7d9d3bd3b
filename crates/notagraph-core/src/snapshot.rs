//! Point-in-time model snapshots
//!
//! A snapshot is the canonical serialisable form of the visible model. It is
//! what the persistence collaborator writes and reads, and it doubles as the
//! structural-equality witness used by history tests.
//!
//! ## Format Version
//!
//! Current snapshot format version: **1**
//!
//! ## Fields
//!
//! - `format_version`: Format version (currently 1)
//! - `root`: Id of the diagram root
//! - `elements`: Elements reachable from the root, depth-first pre-order
//!
//! Containment back-references are not stored; they are rebuilt from the
//! owners' `Contained` values and lists on load.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};

use crate::errors::{NotationError, Result};
use crate::model::{
    Containment, ElementId, ElementKind, FeatureKey, FeatureValue, NotationElement, NotationModel,
};

/// Current snapshot format version
pub const SNAPSHOT_FORMAT_VERSION: u32 = 1;

/// Serialisable image of the visible model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelSnapshot {
    pub format_version: u32,
    pub root: ElementId,
    pub elements: Vec<ElementSnapshot>,
}

/// Serialisable image of one element
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ElementSnapshot {
    pub id: ElementId,
    pub kind: ElementKind,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub features: BTreeMap<FeatureKey, FeatureValue>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub lists: BTreeMap<FeatureKey, Vec<ElementId>>,
}

impl ModelSnapshot {
    pub fn element(&self, id: &ElementId) -> Option<&ElementSnapshot> {
        self.elements.iter().find(|e| &e.id == id)
    }

    /// Encode as pretty-printed JSON
    ///
    /// # Errors
    ///
    /// Returns `Serialization` if encoding fails.
    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Decode from JSON without structural validation
    ///
    /// # Errors
    ///
    /// Returns `Serialization` for malformed input.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

impl NotationModel {
    /// Capture the visible model
    ///
    /// Only elements reachable from the root are listed, in deterministic
    /// depth-first order, so two snapshots are equal iff the visible models
    /// are structurally equal.
    pub fn snapshot(&self) -> ModelSnapshot {
        let mut order = vec![self.root.clone()];
        order.extend(self.descendants(&self.root));

        let elements = order
            .iter()
            .filter_map(|id| self.elements.get(id))
            .map(|element| ElementSnapshot {
                id: element.id().clone(),
                kind: element.kind(),
                features: element.features.clone(),
                lists: element.lists.clone(),
            })
            .collect();

        ModelSnapshot {
            format_version: SNAPSHOT_FORMAT_VERSION,
            root: self.root.clone(),
            elements,
        }
    }

    /// Rebuild a model from a snapshot
    ///
    /// # Errors
    ///
    /// - `UnsupportedSnapshotVersion` for a newer format
    /// - `InvalidSnapshot` for duplicate ids, a missing root, dangling ids,
    ///   non-finite numbers or unreachable elements
    /// - `RootContainment` / `DualOwnership` when ownership is corrupt
    pub fn from_snapshot(snapshot: &ModelSnapshot) -> Result<Self> {
        if snapshot.format_version > SNAPSHOT_FORMAT_VERSION {
            return Err(NotationError::UnsupportedSnapshotVersion {
                found: snapshot.format_version,
                supported: SNAPSHOT_FORMAT_VERSION,
            });
        }

        let mut elements: HashMap<ElementId, NotationElement> = HashMap::new();
        for entry in &snapshot.elements {
            if entry.id.as_str().is_empty() {
                return Err(invalid("element with empty id"));
            }
            let mut element = NotationElement::new(entry.id.clone(), entry.kind);
            element.features = entry.features.clone();
            element.lists.extend(entry.lists.clone());
            if element.lists.keys().any(|k| element.features.contains_key(k)) {
                return Err(invalid(format!(
                    "element {} uses a key as both value and list",
                    entry.id
                )));
            }
            if elements.insert(entry.id.clone(), element).is_some() {
                return Err(invalid(format!("duplicate element id {}", entry.id)));
            }
        }
        if !elements.contains_key(&snapshot.root) {
            return Err(invalid(format!("root {} is missing", snapshot.root)));
        }

        // Rebuild back-references, rejecting anything owned twice.
        let mut edges: Vec<(ElementId, Containment)> = Vec::new();
        for element in elements.values() {
            for (key, value) in element.features() {
                match value {
                    FeatureValue::Number(n) if !n.is_finite() => {
                        return Err(invalid(format!(
                            "non-finite number at {}.{}",
                            element.id(),
                            key
                        )));
                    }
                    FeatureValue::Contained(child) => edges.push((
                        child.clone(),
                        Containment {
                            owner: element.id().clone(),
                            feature: key.clone(),
                        },
                    )),
                    FeatureValue::Reference(target) if !elements.contains_key(target) => {
                        return Err(invalid(format!(
                            "dangling reference {} at {}.{}",
                            target,
                            element.id(),
                            key
                        )));
                    }
                    _ => {}
                }
            }
            for (key, ids) in element.lists() {
                for child in ids {
                    edges.push((
                        child.clone(),
                        Containment {
                            owner: element.id().clone(),
                            feature: key.clone(),
                        },
                    ));
                }
            }
        }

        for (child, containment) in edges {
            if child == snapshot.root {
                return Err(NotationError::RootContainment {
                    element_id: child.to_string(),
                });
            }
            let Some(target) = elements.get_mut(&child) else {
                return Err(invalid(format!(
                    "dangling containment {} at {}.{}",
                    child, containment.owner, containment.feature
                )));
            };
            if let Some(existing) = &target.container {
                return Err(NotationError::DualOwnership {
                    element_id: child.to_string(),
                    owner: existing.owner.to_string(),
                    feature: existing.feature.to_string(),
                });
            }
            target.container = Some(containment);
        }

        let model = NotationModel {
            root: snapshot.root.clone(),
            elements,
        };

        // With single ownership and a free root, anything not reachable
        // from the root sits on a detached island or a cycle.
        let reachable: HashSet<ElementId> = model.descendants(&model.root).into_iter().collect();
        if let Some(stray) = model
            .elements
            .keys()
            .find(|id| **id != model.root && !reachable.contains(*id))
        {
            return Err(invalid(format!("element {} is not reachable from root", stray)));
        }
        Ok(model)
    }
}

fn invalid(reason: impl Into<String>) -> NotationError {
    NotationError::InvalidSnapshot {
        reason: reason.into(),
    }
}
