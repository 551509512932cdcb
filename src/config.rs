use std::ffi::OsString;
use std::path::{Path, PathBuf};

use crate::storage::StorageError;

pub const APP_DIR_NAME: &str = "daily-focus";
pub const DATA_DIR_ENV: &str = "DAILY_FOCUS_DIR";
pub const LOG_ENV: &str = "DAILY_FOCUS_LOG";

/// Where the store, logs and default exports live: an explicit path wins,
/// then `DAILY_FOCUS_DIR`, then the platform's local data directory.
pub fn resolve_data_dir(explicit: Option<&Path>) -> Result<PathBuf, StorageError> {
    resolve_data_dir_from(
        explicit,
        std::env::var_os(DATA_DIR_ENV),
        dirs::data_local_dir(),
    )
}

fn resolve_data_dir_from(
    explicit: Option<&Path>,
    env_value: Option<OsString>,
    platform_dir: Option<PathBuf>,
) -> Result<PathBuf, StorageError> {
    if let Some(path) = explicit {
        return Ok(path.to_path_buf());
    }
    if let Some(value) = env_value.filter(|value| !value.is_empty()) {
        return Ok(PathBuf::from(value));
    }
    platform_dir
        .map(|dir| dir.join(APP_DIR_NAME))
        .ok_or_else(|| {
            StorageError::Io(std::io::Error::other(format!(
                "no data directory found; pass --data-dir or set {DATA_DIR_ENV}"
            )))
        })
}

/// Picks the logger spec: `DAILY_FOCUS_LOG`, then `RUST_LOG`, then a default.
pub fn log_spec(primary: Option<String>, fallback: Option<String>) -> String {
    let default_spec = if cfg!(debug_assertions) {
        "warn,daily_focus_lib=debug"
    } else {
        "warn,daily_focus_lib=info"
    };
    primary
        .filter(|value| !value.trim().is_empty())
        .or_else(|| fallback.filter(|value| !value.trim().is_empty()))
        .unwrap_or_else(|| default_spec.to_string())
}
