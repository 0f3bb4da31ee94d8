//! Where the workbench keeps its files.
//!
//! Config, logs and saved model snapshots share one `.learnonauts` folder
//! under the OS config directory. `LEARNONAUTS_CONFIG_HOME` replaces the OS
//! directory for tests and portable installs.

use std::path::{Path, PathBuf};

use directories::BaseDirs;
use thiserror::Error;

/// Name of the application directory that lives under the config root.
pub const APP_DIR_NAME: &str = ".learnonauts";
/// Environment variable that replaces the OS config root.
pub const CONFIG_HOME_ENV: &str = "LEARNONAUTS_CONFIG_HOME";

const LOGS_DIR_NAME: &str = "logs";
const MODELS_DIR_NAME: &str = "models";

#[derive(Debug, Error)]
pub enum AppDirError {
    #[error("No config directory available; set LEARNONAUTS_CONFIG_HOME")]
    NoBaseDir,
    #[error("Failed to create application directory at {path}: {source}")]
    CreateDir {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// The `.learnonauts` root, created on first use.
pub fn app_root_dir() -> Result<PathBuf, AppDirError> {
    let base = config_base_dir().ok_or(AppDirError::NoBaseDir)?;
    root_in(&base)
}

pub fn logs_dir() -> Result<PathBuf, AppDirError> {
    ensure_dir(app_root_dir()?.join(LOGS_DIR_NAME))
}

pub fn models_dir() -> Result<PathBuf, AppDirError> {
    ensure_dir(app_root_dir()?.join(MODELS_DIR_NAME))
}

fn root_in(base: &Path) -> Result<PathBuf, AppDirError> {
    ensure_dir(base.join(APP_DIR_NAME))
}

fn ensure_dir(path: PathBuf) -> Result<PathBuf, AppDirError> {
    match std::fs::create_dir_all(&path) {
        Ok(()) => Ok(path),
        Err(source) => Err(AppDirError::CreateDir { path, source }),
    }
}

fn config_base_dir() -> Option<PathBuf> {
    std::env::var_os(CONFIG_HOME_ENV)
        .filter(|value| !value.is_empty())
        .map(PathBuf::from)
        .or_else(|| BaseDirs::new().map(|dirs| dirs.config_dir().to_path_buf()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn root_is_created_under_the_base() {
        let base = tempdir().unwrap();
        let root = root_in(base.path()).unwrap();
        assert_eq!(root, base.path().join(APP_DIR_NAME));
        assert!(root.is_dir());
    }

    #[test]
    fn blocked_directory_reports_its_path() {
        let base = tempdir().unwrap();
        let file = base.path().join("taken");
        std::fs::write(&file, b"x").unwrap();
        match root_in(&file) {
            Err(AppDirError::CreateDir { path, .. }) => assert_eq!(path, file.join(APP_DIR_NAME)),
            other => panic!("expected CreateDir, got {other:?}"),
        }
    }
}
