//! The workspace marker: `kasten.toml` at a workspace root.
//!
//! Writing it is what turns a plain folder into a workspace. The path of this
//! file is what gets handed to the host when a workspace is opened.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::config::ConfigError;

/// File name of the workspace marker inside a workspace root.
pub const WORKSPACE_FILE: &str = "kasten.toml";

const CONFIG_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkspaceConfig {
    pub version: u32,
    /// Note folders, relative to the workspace root.
    #[serde(default = "default_vaults")]
    pub vaults: Vec<String>,
    #[serde(default)]
    pub settings: WorkspaceSettings,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkspaceSettings {
    /// Hierarchy prefix for daily journal notes.
    pub journal_prefix: String,
    /// Hierarchy prefix for throwaway notes.
    pub scratch_prefix: String,
}

impl Default for WorkspaceSettings {
    fn default() -> Self {
        Self {
            journal_prefix: "daily.journal".to_string(),
            scratch_prefix: "scratch".to_string(),
        }
    }
}

fn default_vaults() -> Vec<String> {
    vec![".".to_string()]
}

impl Default for WorkspaceConfig {
    fn default() -> Self {
        Self {
            version: CONFIG_VERSION,
            vaults: default_vaults(),
            settings: WorkspaceSettings::default(),
        }
    }
}

impl WorkspaceConfig {
    /// Path of the marker file for the workspace at `root`.
    pub fn path(root: &Path) -> PathBuf {
        root.join(WORKSPACE_FILE)
    }

    /// Writes the default config into `root`, replacing any existing marker.
    /// Returns the marker path.
    pub fn write(root: &Path) -> Result<PathBuf, ConfigError> {
        Self::default().save(root)
    }

    /// Persists this config into `root`, replacing any existing marker.
    pub fn save(&self, root: &Path) -> Result<PathBuf, ConfigError> {
        let path = Self::path(root);
        let s = toml::to_string_pretty(self).map_err(ConfigError::Serialize)?;
        std::fs::write(&path, s).map_err(ConfigError::Write)?;
        tracing::debug!(path = %path.display(), "wrote workspace config");
        Ok(path)
    }

    /// Reads the marker from `root`.
    pub fn load(root: &Path) -> Result<Self, ConfigError> {
        let s = std::fs::read_to_string(Self::path(root)).map_err(ConfigError::Read)?;
        toml::from_str(&s).map_err(ConfigError::Parse)
    }

    /// Whether `root` carries a workspace marker.
    pub fn exists(root: &Path) -> bool {
        Self::path(root).is_file()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn write_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = WorkspaceConfig::write(dir.path()).unwrap();
        assert_eq!(path, dir.path().join(WORKSPACE_FILE));
        assert!(WorkspaceConfig::exists(dir.path()));
        assert_eq!(WorkspaceConfig::load(dir.path()).unwrap(), WorkspaceConfig::default());
    }

    #[test]
    fn write_overwrites_existing_marker() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(WORKSPACE_FILE), "version = 7\nvaults = [\"old\"]\n").unwrap();
        WorkspaceConfig::write(dir.path()).unwrap();
        let cfg = WorkspaceConfig::load(dir.path()).unwrap();
        assert_eq!(cfg.version, CONFIG_VERSION);
        assert_eq!(cfg.vaults, vec![".".to_string()]);
    }

    #[test]
    fn missing_sections_take_defaults() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(WORKSPACE_FILE), "version = 1\n").unwrap();
        let cfg = WorkspaceConfig::load(dir.path()).unwrap();
        assert_eq!(cfg.vaults, vec![".".to_string()]);
        assert_eq!(cfg.settings.scratch_prefix, "scratch");
    }

    #[test]
    fn load_without_marker_fails() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(WorkspaceConfig::load(dir.path()), Err(ConfigError::Read(_))));
    }
}
