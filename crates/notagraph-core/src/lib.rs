//! notagraph core - observable containment-graph model
//!
//! This crate provides the in-memory kernel of the diagram editing backend:
//! - Notation elements and their structural features, with single ownership
//!   of contained values enforced on every mutation
//! - Ordered change records for every mutation
//! - Synchronous change notification
//! - Reversible commands and a linear undo/redo stack
//! - Snapshots plus the persistence and render collaborator contracts

pub mod errors;
pub mod history;
pub mod logging_facility;
pub mod model;
pub mod notify;
pub mod persistence;
pub mod render;
pub mod snapshot;

pub use notagraph_core_types as core_types;

// Re-export commonly used types
pub use errors::{ExError, ExErrorKind, NotationError, Result};
pub use history::{Command, CommandStack, Edit, EditCommand};
pub use model::{
    ChangeKind, ChangeRecord, Direction, ElementId, ElementKind, FeatureKey, FeatureValue,
    NotationModel,
};
pub use notify::{ChangeListener, ChangeNotifier, SubscriptionId};
pub use persistence::ModelPersistence;
pub use render::{GraphRenderer, RenderGraph, RenderNode, RenderSnapshotFactory};
pub use snapshot::{ModelSnapshot, SNAPSHOT_FORMAT_VERSION};
