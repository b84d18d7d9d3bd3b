//! Containment-graph model of notation elements

pub mod change;
pub mod element;
pub mod notation;
pub mod value;

pub use change::{ChangeKind, ChangeRecord, Direction};
pub use element::{Containment, ElementId, ElementKind, NotationElement};
pub use notation::NotationModel;
pub use value::{keys, Bounds, Dimension, FeatureKey, FeatureValue, Point};
