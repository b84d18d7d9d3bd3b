//! Model snapshots stored as a single JSON file

use chrono::{DateTime, Utc};
use notagraph_core::persistence::ModelPersistence;
use notagraph_core::snapshot::ModelSnapshot;
use notagraph_core::ExError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::Instant;

use crate::atomic::atomic_write;
use crate::errors::{io_error, not_found, persistence_error, serialization_error, Result};

/// On-disk wrapper around a snapshot
#[derive(Debug, Clone, Serialize, Deserialize)]
struct StoredModel {
    saved_at: DateTime<Utc>,
    snapshot: ModelSnapshot,
}

/// File-backed persistence
///
/// `save` is atomic: the file holds either the previous or the new snapshot.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.is_file()
    }

    /// Timestamp of the last successful save, if a file exists
    pub fn saved_at(&self) -> Result<DateTime<Utc>> {
        Ok(self.read_stored()?.saved_at)
    }

    fn read_stored(&self) -> Result<StoredModel> {
        let bytes = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return Err(not_found(&self.path)),
            Err(e) => return Err(io_error("read_model", e)),
        };
        serde_json::from_slice(&bytes).map_err(|e| serialization_error("parse_model", e))
    }
}

impl ModelPersistence for JsonFileStore {
    fn save(&self, snapshot: &ModelSnapshot) -> std::result::Result<(), ExError> {
        let start = Instant::now();
        let stored = StoredModel {
            saved_at: Utc::now(),
            snapshot: snapshot.clone(),
        };
        let json = serde_json::to_vec_pretty(&stored)
            .map_err(|e| persistence_error("save_model", serialization_error("encode_model", e)))?;
        atomic_write(&self.path, &json).map_err(|e| persistence_error("save_model", e))?;

        tracing::debug!(
            path = %self.path.display(),
            elements = snapshot.elements.len(),
            duration_ms = start.elapsed().as_millis() as u64,
            "model saved"
        );
        Ok(())
    }

    fn load(&self) -> std::result::Result<ModelSnapshot, ExError> {
        let stored = self.read_stored()?;
        tracing::debug!(
            path = %self.path.display(),
            saved_at = %stored.saved_at,
            "model loaded"
        );
        Ok(stored.snapshot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use notagraph_core::{ExErrorKind, NotationModel};
    use tempfile::TempDir;

    #[test]
    fn test_save_then_load() {
        let dir = TempDir::new().unwrap();
        let store = JsonFileStore::new(dir.path().join("model.json"));
        let snapshot = NotationModel::new().snapshot();

        store.save(&snapshot).unwrap();

        assert!(store.exists());
        assert_eq!(store.load().unwrap(), snapshot);
        assert!(store.saved_at().unwrap() <= Utc::now());
    }

    #[test]
    fn test_missing_file_is_not_found() {
        let dir = TempDir::new().unwrap();
        let store = JsonFileStore::new(dir.path().join("absent.json"));
        assert_eq!(store.load().unwrap_err().kind(), ExErrorKind::NotFound);
    }

    #[test]
    fn test_garbage_file_is_serialization_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("model.json");
        fs::write(&path, b"{not json").unwrap();
        let err = JsonFileStore::new(path).load().unwrap_err();
        assert_eq!(err.kind(), ExErrorKind::Serialization);
    }
}
