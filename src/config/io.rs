use std::io::Write;
use std::path::{Path, PathBuf};

use crate::app_dirs;

use super::{CONFIG_FILE_NAME, ConfigError, LabSettings};

/// Resolve the configuration file path, ensuring the parent directory exists.
pub fn config_path() -> Result<PathBuf, ConfigError> {
    let dir = app_dirs::app_root_dir().map_err(map_app_dir_error)?;
    Ok(dir.join(CONFIG_FILE_NAME))
}

/// Load settings from the app root, returning defaults if the file is missing.
pub fn load_or_default() -> Result<LabSettings, ConfigError> {
    load_settings_from(&config_path()?)
}

/// Load settings from a specific TOML file, returning defaults if it does not exist.
pub fn load_settings_from(path: &Path) -> Result<LabSettings, ConfigError> {
    if !path.exists() {
        return Ok(LabSettings::default());
    }
    let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let settings: LabSettings = toml::from_str(&text).map_err(|source| ConfigError::ParseToml {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(settings.normalized())
}

/// Persist settings to the app root config file.
pub fn save_settings(settings: &LabSettings) -> Result<(), ConfigError> {
    save_settings_to_path(settings, &config_path()?)
}

/// Write the TOML settings file atomically to prevent partial writes on crash.
pub fn save_settings_to_path(settings: &LabSettings, path: &Path) -> Result<(), ConfigError> {
    let data = toml::to_string_pretty(settings).map_err(|source| ConfigError::SerializeToml {
        path: path.to_path_buf(),
        source,
    })?;
    let dir = path.parent().ok_or_else(|| ConfigError::Write {
        path: path.to_path_buf(),
        source: std::io::Error::other("config path has no parent directory"),
    })?;
    std::fs::create_dir_all(dir).map_err(|source| ConfigError::CreateDir {
        path: dir.to_path_buf(),
        source,
    })?;
    let tmp_path = dir.join(format!(".{CONFIG_FILE_NAME}.{:08x}.tmp", rand::random::<u32>()));
    let write_err = |source| ConfigError::Write {
        path: path.to_path_buf(),
        source,
    };
    let mut file = std::fs::File::create(&tmp_path).map_err(write_err)?;
    file.write_all(data.as_bytes()).map_err(write_err)?;
    file.sync_all().map_err(write_err)?;
    drop(file);
    if let Err(source) = std::fs::rename(&tmp_path, path) {
        let _ = std::fs::remove_file(&tmp_path);
        return Err(write_err(source));
    }
    Ok(())
}

fn map_app_dir_error(error: app_dirs::AppDirError) -> ConfigError {
    match error {
        app_dirs::AppDirError::NoBaseDir => ConfigError::NoConfigDir,
        app_dirs::AppDirError::CreateDir { path, source } => {
            ConfigError::CreateDir { path, source }
        }
    }
}
