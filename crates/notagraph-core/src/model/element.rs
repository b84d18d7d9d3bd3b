use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use uuid::Uuid;

use super::value::{keys, FeatureKey, FeatureValue};

/// Stable identity of a notation element
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ElementId(String);

impl ElementId {
    /// Generate a fresh id (UUID v7)
    pub fn generate() -> Self {
        Self(Uuid::now_v7().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ElementId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for ElementId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl fmt::Display for ElementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Element kinds, read as capability sets rather than a type hierarchy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ElementKind {
    /// Diagram root
    Diagram,
    /// Generic container node
    Node,
    /// Node with position and size
    Shape,
    Edge,
    /// Position value (`x`, `y`)
    Point,
    /// Size value (`width`, `height`)
    Dimension,
}

impl ElementKind {
    /// Whether the element carries `position` and `size`
    pub fn has_bounds(self) -> bool {
        matches!(self, ElementKind::Shape | ElementKind::Node)
    }

    /// Whether the element owns an ordered `children` list
    pub fn has_children(self) -> bool {
        matches!(
            self,
            ElementKind::Diagram | ElementKind::Node | ElementKind::Shape
        )
    }

    /// Point and Dimension elements are values owned by a shape
    pub fn is_value(self) -> bool {
        matches!(self, ElementKind::Point | ElementKind::Dimension)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ElementKind::Diagram => "diagram",
            ElementKind::Node => "node",
            ElementKind::Shape => "shape",
            ElementKind::Edge => "edge",
            ElementKind::Point => "point",
            ElementKind::Dimension => "dimension",
        }
    }
}

/// Back-reference from a contained element to its single owner slot
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Containment {
    pub owner: ElementId,
    pub feature: FeatureKey,
}

/// Node of the containment graph
///
/// Single-valued features live in `features`; ordered containment lists
/// (e.g. `children`) live in `lists`. A key is never present in both.
/// Mutation goes through `NotationModel` so the `container`
/// back-reference always mirrors the owning slot.
#[derive(Debug, Clone, PartialEq)]
pub struct NotationElement {
    id: ElementId,
    kind: ElementKind,
    pub(crate) features: BTreeMap<FeatureKey, FeatureValue>,
    pub(crate) lists: BTreeMap<FeatureKey, Vec<ElementId>>,
    pub(crate) container: Option<Containment>,
}

impl NotationElement {
    pub(crate) fn new(id: ElementId, kind: ElementKind) -> Self {
        let mut lists = BTreeMap::new();
        if kind.has_children() {
            lists.insert(FeatureKey::from(keys::CHILDREN), Vec::new());
        }
        Self {
            id,
            kind,
            features: BTreeMap::new(),
            lists,
            container: None,
        }
    }

    pub fn id(&self) -> &ElementId {
        &self.id
    }

    pub fn kind(&self) -> ElementKind {
        self.kind
    }

    pub fn feature(&self, key: &str) -> Option<&FeatureValue> {
        self.features.get(key)
    }

    pub fn features(&self) -> impl Iterator<Item = (&FeatureKey, &FeatureValue)> {
        self.features.iter()
    }

    /// Contained ids of a list feature; empty when the list is unset
    pub fn list(&self, key: &str) -> &[ElementId] {
        self.lists.get(key).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn lists(&self) -> impl Iterator<Item = (&FeatureKey, &Vec<ElementId>)> {
        self.lists.iter()
    }

    pub fn container(&self) -> Option<&Containment> {
        self.container.as_ref()
    }

    /// Ids this element owns directly, single-valued slots first, then lists
    pub fn contained_ids(&self) -> Vec<ElementId> {
        let mut owned: Vec<ElementId> = self
            .features
            .values()
            .filter_map(|v| v.as_contained().cloned())
            .collect();
        for ids in self.lists.values() {
            owned.extend(ids.iter().cloned());
        }
        owned
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_element_is_free() {
        let element = NotationElement::new(ElementId::from("e1"), ElementKind::Shape);
        assert_eq!(element.id().as_str(), "e1");
        assert!(element.container().is_none());
        assert!(element.list("children").is_empty());
        assert!(element.contained_ids().is_empty());
    }

    #[test]
    fn test_capabilities() {
        assert!(ElementKind::Shape.has_bounds());
        assert!(ElementKind::Node.has_bounds());
        assert!(!ElementKind::Diagram.has_bounds());
        assert!(ElementKind::Point.is_value());
        assert!(!ElementKind::Edge.is_value());
        assert!(ElementKind::Diagram.has_children());
        assert!(!ElementKind::Point.has_children());
    }

    #[test]
    fn test_generated_ids_are_unique() {
        assert_ne!(ElementId::generate(), ElementId::generate());
    }
}
