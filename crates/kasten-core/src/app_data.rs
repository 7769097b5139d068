//! Where Kasten stores its own data (app config, current workspace).
//!
//! Workspaces live wherever the user bootstraps them. We only store app state here.

use std::path::PathBuf;

/// Overrides the app data directory (useful for scripting and sandboxed runs).
pub const DATA_DIR_ENV: &str = "KASTEN_DATA_DIR";

/// Returns the directory where Kasten stores its app config.
/// On macOS: `~/Library/Application Support/Kasten/`, unless `KASTEN_DATA_DIR` is set.
/// Creates the directory if it doesn't exist; returns `None` if we can't determine the path.
pub fn app_data_dir() -> Option<PathBuf> {
    let dir = match std::env::var_os(DATA_DIR_ENV).filter(|v| !v.is_empty()) {
        Some(dir) => PathBuf::from(dir),
        None => directories::ProjectDirs::from("app", "Kasten", "Kasten")?
            .data_local_dir()
            .to_path_buf(),
    };
    std::fs::create_dir_all(&dir).ok()?;
    Some(dir)
}
