//! Path helpers: `~` expansion and the suggested location for new workspaces.

use std::path::{Component, Path, PathBuf};

/// Directory name suggested under the home directory when bootstrapping.
pub const DEFAULT_WORKSPACE_DIR: &str = "Kasten";

/// The current user's home directory, if one can be determined.
pub fn home_dir() -> Option<PathBuf> {
    directories::BaseDirs::new().map(|d| d.home_dir().to_path_buf())
}

/// Expands a leading `~` in `path` to the home directory.
/// Paths without a leading `~` (and `~user` forms) are returned unchanged.
pub fn resolve_tilde(path: &Path) -> PathBuf {
    match home_dir() {
        Some(home) => resolve_tilde_with(path, &home),
        None => path.to_path_buf(),
    }
}

fn resolve_tilde_with(path: &Path, home: &Path) -> PathBuf {
    let mut components = path.components();
    match components.next() {
        Some(Component::Normal(first)) if first == "~" => home.join(components.as_path()),
        _ => path.to_path_buf(),
    }
}

/// Suggested root for a new workspace: `~/Kasten`.
pub fn default_workspace_root() -> PathBuf {
    resolve_tilde(&Path::new("~").join(DEFAULT_WORKSPACE_DIR))
}
