//! In-process persistence

use notagraph_core::errors::{ExError, ExErrorKind};
use notagraph_core::persistence::ModelPersistence;
use notagraph_core::snapshot::ModelSnapshot;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

/// Keeps the last saved snapshot in memory
///
/// Failures can be switched on to exercise error paths of callers.
#[derive(Debug, Default)]
pub struct MemoryStore {
    stored: Mutex<Option<ModelSnapshot>>,
    saves: AtomicUsize,
    failing: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-populated with a snapshot for loading
    pub fn seeded(snapshot: ModelSnapshot) -> Self {
        Self {
            stored: Mutex::new(Some(snapshot)),
            ..Self::default()
        }
    }

    /// Make subsequent saves fail (or succeed again)
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Number of successful saves
    pub fn save_count(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }

    pub fn stored(&self) -> Option<ModelSnapshot> {
        self.stored.lock().ok().and_then(|s| s.clone())
    }
}

fn poisoned(op: &str) -> ExError {
    ExError::new(ExErrorKind::Internal)
        .with_op(op.to_string())
        .with_message("memory store lock poisoned")
}

impl ModelPersistence for MemoryStore {
    fn save(&self, snapshot: &ModelSnapshot) -> Result<(), ExError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(ExError::new(ExErrorKind::Persistence)
                .with_op("save_model")
                .with_message("memory store is set to fail"));
        }
        let mut stored = self.stored.lock().map_err(|_| poisoned("save_model"))?;
        *stored = Some(snapshot.clone());
        self.saves.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn load(&self) -> Result<ModelSnapshot, ExError> {
        self.stored
            .lock()
            .map_err(|_| poisoned("load_model"))?
            .clone()
            .ok_or_else(|| {
                ExError::new(ExErrorKind::NotFound)
                    .with_op("load_model")
                    .with_message("memory store is empty")
            })
    }
}
