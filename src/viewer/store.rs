//! Loading and saving `viewer.json`.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use tracing::{debug, info};

use crate::error::PrepareError;

use super::document::{PriorConfig, ViewerConfig};

/// File name of the configuration document in the output root.
pub const CONFIG_FILE_NAME: &str = "viewer.json";

/// Timestamp suffix of backups; no colons so it stays a portable file name.
const BACKUP_TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H%M%S%.6f";

/// Path of the configuration document for an output root.
pub fn config_path(output_root: &Path) -> PathBuf {
    output_root.join(CONFIG_FILE_NAME)
}

/// Load the previous document, if any.
///
/// # Errors
///
/// - [`PrepareError::ConfigConflict`] if `path` exists but is not a file
/// - [`PrepareError::Io`] / [`PrepareError::Json`] if it cannot be read
pub fn load_prior(path: &Path) -> Result<Option<PriorConfig>, PrepareError> {
    if !path.exists() {
        debug!("No previous configuration at {}", path.display());
        return Ok(None);
    }
    if !path.is_file() {
        return Err(PrepareError::ConfigConflict {
            path: path.to_path_buf(),
        });
    }

    let text = fs::read_to_string(path).map_err(|e| PrepareError::io(path, e))?;
    let prior = serde_json::from_str(&text).map_err(|source| PrepareError::Json {
        path: path.to_path_buf(),
        source,
    })?;
    info!("Loaded previous configuration {}", path.display());
    Ok(Some(prior))
}

/// Backup path for a document replaced at `now`.
pub fn backup_path(path: &Path, now: DateTime<Local>) -> PathBuf {
    let mut name = path.as_os_str().to_os_string();
    name.push(".");
    name.push(now.format(BACKUP_TIMESTAMP_FORMAT).to_string());
    PathBuf::from(name)
}

/// Write `config` to `path` as pretty JSON.
///
/// An existing document is renamed to a timestamped backup first; the
/// backup path is returned.
pub fn save(
    path: &Path,
    config: &ViewerConfig,
    had_prior: bool,
) -> Result<Option<PathBuf>, PrepareError> {
    let json = serde_json::to_string_pretty(config).map_err(|source| PrepareError::Json {
        path: path.to_path_buf(),
        source,
    })?;

    let backup = if had_prior && path.is_file() {
        let backup = backup_path(path, Local::now());
        fs::rename(path, &backup).map_err(|e| PrepareError::io(path, e))?;
        info!("Previous configuration saved as {}", backup.display());
        Some(backup)
    } else {
        None
    };

    fs::write(path, json).map_err(|e| PrepareError::io(path, e))?;
    info!("Configuration written to {}", path.display());
    Ok(backup)
}
