//! Persistence collaborator contract

use crate::errors::ExError;
use crate::snapshot::ModelSnapshot;

/// Reader/writer of model snapshots
///
/// Implementations live outside the core. `save` must be atomic from the
/// caller's point of view: after a failed save the previously stored
/// snapshot is still intact. Errors use the `Persistence`, `Io`,
/// `Serialization` or `NotFound` kinds.
pub trait ModelPersistence: Send + Sync {
    /// # Errors
    ///
    /// Returns an `ExError` when the snapshot could not be stored.
    fn save(&self, snapshot: &ModelSnapshot) -> Result<(), ExError>;

    /// # Errors
    ///
    /// Returns an `ExError` with kind `NotFound` when nothing was stored yet.
    fn load(&self) -> Result<ModelSnapshot, ExError>;
}
