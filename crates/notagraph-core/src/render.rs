//! Render snapshot contract and the stock tree projection

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::model::{
    keys, Dimension, ElementId, ElementKind, FeatureKey, FeatureValue, NotationModel, Point,
};

/// Client-displayable projection of the model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderGraph {
    pub root: RenderNode,
    pub dirty: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderNode {
    pub id: ElementId,
    pub kind: ElementKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<Point>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<Dimension>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub properties: BTreeMap<FeatureKey, FeatureValue>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<RenderNode>,
}

impl RenderGraph {
    /// Depth-first lookup of a rendered node
    pub fn find(&self, id: &ElementId) -> Option<&RenderNode> {
        let mut stack = vec![&self.root];
        while let Some(node) = stack.pop() {
            if &node.id == id {
                return Some(node);
            }
            stack.extend(node.children.iter());
        }
        None
    }
}

/// Builds the render snapshot sent to clients
///
/// Implementations must be pure: the model is only read.
pub trait RenderSnapshotFactory: Send + Sync {
    fn create(&self, model: &NotationModel, dirty: bool) -> RenderGraph;
}

/// Tree projection with no layout
///
/// Position and size values are folded into their owner; other contained
/// elements and list entries become child nodes; plain values become
/// properties.
#[derive(Debug, Clone, Copy, Default)]
pub struct GraphRenderer;

impl GraphRenderer {
    pub fn new() -> Self {
        Self
    }

    fn node(&self, model: &NotationModel, id: &ElementId, depth: usize) -> Option<RenderNode> {
        let element = model.element(id)?;
        let mut properties = BTreeMap::new();
        let mut children = Vec::new();

        // Depth is bounded by the element count: containment is acyclic.
        if depth > model.element_count() {
            return None;
        }

        for (key, value) in element.features() {
            match value {
                FeatureValue::Contained(_) if key == keys::POSITION || key == keys::SIZE => {}
                FeatureValue::Contained(child) => {
                    children.extend(self.node(model, child, depth + 1));
                }
                other => {
                    properties.insert(key.clone(), other.clone());
                }
            }
        }
        for (_, ids) in element.lists() {
            children.extend(ids.iter().filter_map(|c| self.node(model, c, depth + 1)));
        }

        Some(RenderNode {
            id: id.clone(),
            kind: element.kind(),
            position: model.position_of(id),
            size: model.size_of(id),
            properties,
            children,
        })
    }
}

impl RenderSnapshotFactory for GraphRenderer {
    fn create(&self, model: &NotationModel, dirty: bool) -> RenderGraph {
        let root = self
            .node(model, model.root(), 0)
            .unwrap_or_else(|| RenderNode {
                id: model.root().clone(),
                kind: ElementKind::Diagram,
                position: None,
                size: None,
                properties: BTreeMap::new(),
                children: Vec::new(),
            });
        RenderGraph { root, dirty }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_renders_shape_bounds_and_properties() {
        let mut model = NotationModel::new();
        let root = model.root().clone();
        let (shape, _) = model.create_shape(&root, (1.0, 2.0), (3.0, 4.0)).unwrap();
        model.set_feature(&shape, keys::NAME, Some("box".into())).unwrap();

        let graph = GraphRenderer::new().create(&model, true);

        assert!(graph.dirty);
        assert_eq!(graph.root.children.len(), 1);
        let node = graph.find(&shape).unwrap();
        assert_eq!(node.position, Some(Point::new(1.0, 2.0)));
        assert_eq!(node.size, Some(Dimension::new(3.0, 4.0)));
        assert_eq!(node.properties.get("name"), Some(&FeatureValue::from("box")));
        assert!(node.children.is_empty());
    }

    #[test]
    fn test_render_graph_json_is_camel_case() {
        let model = NotationModel::new();
        let graph = GraphRenderer::new().create(&model, false);
        let json = serde_json::to_value(&graph).unwrap();
        assert_eq!(json["dirty"], false);
        assert_eq!(json["root"]["kind"], "diagram");
    }
}
