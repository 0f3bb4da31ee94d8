use std::io::Write;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::app_dirs;
use crate::dataset::DatasetKind;
use crate::ml::logreg::LinearModel;

/// File name used for the default snapshot slot.
pub const SNAPSHOT_FILE_NAME: &str = "model.json";

/// Trained numeric model persisted between sessions.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ModelSnapshot {
    pub model: LinearModel,
    pub epoch: u64,
    pub dataset_kind: DatasetKind,
}

#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("Failed to resolve model directory: {0}")]
    AppDir(#[from] app_dirs::AppDirError),
    #[error("Failed to read model snapshot {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to write model snapshot {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Invalid model snapshot {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("Model snapshot {path} holds non-finite weights")]
    NonFinite { path: PathBuf },
}

/// Default snapshot location inside the app models directory.
pub fn default_snapshot_path() -> Result<PathBuf, SnapshotError> {
    Ok(app_dirs::models_dir()?.join(SNAPSHOT_FILE_NAME))
}

/// Write `snapshot` as pretty JSON through a temp file and rename.
pub fn write_snapshot(snapshot: &ModelSnapshot, path: &Path) -> Result<(), SnapshotError> {
    let write_err = |source| SnapshotError::Write {
        path: path.to_path_buf(),
        source,
    };
    let data = serde_json::to_vec_pretty(snapshot)
        .map_err(|err| write_err(std::io::Error::other(err)))?;
    let dir = match path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
        Some(dir) => dir.to_path_buf(),
        None => PathBuf::from("."),
    };
    std::fs::create_dir_all(&dir).map_err(write_err)?;
    let tmp_path = dir.join(format!(".{SNAPSHOT_FILE_NAME}.{:08x}.tmp", rand::random::<u32>()));
    let mut file = std::fs::File::create(&tmp_path).map_err(write_err)?;
    file.write_all(&data).map_err(write_err)?;
    file.sync_all().map_err(write_err)?;
    drop(file);
    if let Err(source) = std::fs::rename(&tmp_path, path) {
        let _ = std::fs::remove_file(&tmp_path);
        return Err(write_err(source));
    }
    Ok(())
}

/// Read and validate a snapshot file.
pub fn read_snapshot(path: &Path) -> Result<ModelSnapshot, SnapshotError> {
    let bytes = std::fs::read(path).map_err(|source| SnapshotError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let snapshot: ModelSnapshot =
        serde_json::from_slice(&bytes).map_err(|source| SnapshotError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
    if !snapshot.model.is_finite() {
        return Err(SnapshotError::NonFinite {
            path: path.to_path_buf(),
        });
    }
    Ok(snapshot)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn snapshot_file_is_plain_json() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("model.json");
        let snapshot = ModelSnapshot {
            model: LinearModel::new(1.5, -2.0, 0.25),
            epoch: 42,
            dataset_kind: DatasetKind::FruitVeg,
        };
        write_snapshot(&snapshot, &path).unwrap();
        let value: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(value["epoch"], 42);
        assert_eq!(value["dataset_kind"], "fruit_veg");
        assert_eq!(value["model"]["w1"], 1.5);
        assert_eq!(read_snapshot(&path).unwrap(), snapshot);
    }

    #[test]
    fn garbage_and_missing_files_are_reported() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("model.json");
        assert!(matches!(read_snapshot(&path), Err(SnapshotError::Read { .. })));
        std::fs::write(&path, "{\"model\":").unwrap();
        assert!(matches!(read_snapshot(&path), Err(SnapshotError::Parse { .. })));
    }
}
