use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt;

use super::element::ElementId;

/// Well-known feature keys
pub mod keys {
    /// Containment of a shape's `Point`
    pub const POSITION: &str = "position";
    /// Containment of a shape's `Dimension`
    pub const SIZE: &str = "size";
    /// Ordered containment list of child nodes
    pub const CHILDREN: &str = "children";
    pub const X: &str = "x";
    pub const Y: &str = "y";
    pub const WIDTH: &str = "width";
    pub const HEIGHT: &str = "height";
    pub const NAME: &str = "name";
    pub const SOURCE: &str = "source";
    pub const TARGET: &str = "target";
}

/// Name of a structural feature on an element
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FeatureKey(String);

impl FeatureKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for FeatureKey {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<&str> for FeatureKey {
    fn from(key: &str) -> Self {
        Self(key.to_string())
    }
}

impl From<String> for FeatureKey {
    fn from(key: String) -> Self {
        Self(key)
    }
}

impl PartialEq<str> for FeatureKey {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for FeatureKey {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

impl fmt::Display for FeatureKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Value held by a single-valued feature
///
/// `Contained` is an ownership edge: the target element's lifetime is bound
/// to the owner and it can have only one owner. `Reference` is a plain
/// cross reference with no ownership.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "camelCase")]
pub enum FeatureValue {
    Bool(bool),
    Number(f64),
    Text(String),
    Contained(ElementId),
    Reference(ElementId),
}

impl FeatureValue {
    pub fn as_contained(&self) -> Option<&ElementId> {
        match self {
            FeatureValue::Contained(id) => Some(id),
            _ => None,
        }
    }

    pub fn as_reference(&self) -> Option<&ElementId> {
        match self {
            FeatureValue::Reference(id) => Some(id),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            FeatureValue::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            FeatureValue::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            FeatureValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Whether assigning this value creates an ownership edge
    pub fn is_containment(&self) -> bool {
        matches!(self, FeatureValue::Contained(_))
    }
}

impl From<f64> for FeatureValue {
    fn from(n: f64) -> Self {
        FeatureValue::Number(n)
    }
}

impl From<bool> for FeatureValue {
    fn from(b: bool) -> Self {
        FeatureValue::Bool(b)
    }
}

impl From<&str> for FeatureValue {
    fn from(s: &str) -> Self {
        FeatureValue::Text(s.to_string())
    }
}

/// Location of a shape in diagram coordinates
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Extent of a shape
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Dimension {
    pub width: f64,
    pub height: f64,
}

impl Dimension {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }
}

/// Position and size of a shape, read through its owned values
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub position: Point,
    pub size: Dimension,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_feature_key_lookup_by_str() {
        let mut map = std::collections::BTreeMap::new();
        map.insert(FeatureKey::from(keys::POSITION), 1);
        assert_eq!(map.get("position"), Some(&1));
        assert_eq!(FeatureKey::from("size"), "size");
    }

    #[test]
    fn test_feature_value_json_shape() {
        let value = FeatureValue::Contained(ElementId::from("p1"));
        let json = serde_json::to_value(&value).unwrap();
        assert_eq!(json["type"], "contained");
        assert_eq!(json["value"], "p1");

        let number: FeatureValue =
            serde_json::from_str(r#"{"type":"number","value":5.0}"#).unwrap();
        assert_eq!(number.as_number(), Some(5.0));
    }

    #[test]
    fn test_containment_flag() {
        assert!(FeatureValue::Contained(ElementId::from("a")).is_containment());
        assert!(!FeatureValue::Reference(ElementId::from("a")).is_containment());
        assert!(!FeatureValue::from(1.0).is_containment());
    }
}
