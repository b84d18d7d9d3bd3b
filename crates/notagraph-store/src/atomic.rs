//! Atomic file writes
//!
//! Content goes to a temp file next to the target and is renamed over it, so
//! readers observe either the old or the new file, never a torn write.

use crate::errors::{io_error, Result};
use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// Write content to a file atomically using temp→rename
pub fn atomic_write(target_path: &Path, content: &[u8]) -> Result<()> {
    write_via_temp(target_path, |file| {
        file.write_all(content)?;
        file.sync_all()
    })
}

/// Create the temp file, let `fill` write it, then rename it into place
///
/// The temp file is removed on every failure path.
fn write_via_temp<F>(target_path: &Path, fill: F) -> Result<()>
where
    F: FnOnce(&mut File) -> io::Result<()>,
{
    if let Some(parent) = target_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| io_error("create_model_dir", e))?;
    }

    // Unique per write so overlapping saves never share a temp file
    let temp_path = temp_path_for(target_path);

    let written = File::create(&temp_path).and_then(|mut file| fill(&mut file));
    if let Err(e) = written {
        fs::remove_file(&temp_path).ok();
        return Err(io_error("write_model_temp", e));
    }

    if let Err(e) = fs::rename(&temp_path, target_path) {
        fs::remove_file(&temp_path).ok();
        return Err(io_error("rename_model_temp", e));
    }

    Ok(())
}

fn temp_path_for(target_path: &Path) -> PathBuf {
    let name = target_path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    target_path.with_file_name(format!(".{}.{}.tmp", name, Uuid::new_v4()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn temp_files(dir: &Path) -> usize {
        fs::read_dir(dir)
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_name().to_string_lossy().ends_with(".tmp"))
            .count()
    }

    #[test]
    fn test_interrupted_write_removes_temp_file() {
        let temp_dir = TempDir::new().unwrap();
        let target = temp_dir.path().join("model.json");
        atomic_write(&target, b"previous").unwrap();

        let err = write_via_temp(&target, |file| {
            file.write_all(b"par")?;
            Err(io::Error::other("disk full"))
        })
        .unwrap_err();

        assert_eq!(err.op(), Some("write_model_temp"));
        assert_eq!(temp_files(temp_dir.path()), 0);
        assert_eq!(fs::read(&target).unwrap(), b"previous");
    }

    #[test]
    fn test_atomic_write() {
        let temp_dir = TempDir::new().unwrap();
        let target = temp_dir.path().join("nested").join("model.json");

        atomic_write(&target, b"first").unwrap();
        atomic_write(&target, b"second").unwrap();

        assert_eq!(fs::read(&target).unwrap(), b"second");
        assert_eq!(temp_files(target.parent().unwrap()), 0);
    }

    #[test]
    fn test_failed_rename_keeps_previous_file() {
        let temp_dir = TempDir::new().unwrap();
        // A directory at the target path makes the rename fail
        let target = temp_dir.path().join("model.json");
        fs::create_dir(&target).unwrap();
        fs::write(target.join("keep"), b"x").unwrap();

        let err = atomic_write(&target, b"data").unwrap_err();

        assert_eq!(err.op(), Some("rename_model_temp"));
        assert!(target.join("keep").exists());
    }
}
