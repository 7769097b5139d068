//! Discovering and parsing markdown notes under a workspace root.
//!
//! Notes are named by their file stem, which doubles as their place in the
//! hierarchy: `project.ideas.md` is the `ideas` child of `project`.

use std::path::{Path, PathBuf};

use serde::Deserialize;
use walkdir::WalkDir;

/// A note file we found: path, hierarchical name, frontmatter and body.
#[derive(Debug, Clone)]
pub struct Note {
    pub path: PathBuf,
    /// Hierarchical name, e.g. `project.ideas`.
    pub name: String,
    pub meta: NoteMeta,
    /// Content without YAML frontmatter (the main markdown body).
    pub body: String,
}

/// Optional YAML frontmatter fields.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct NoteMeta {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub desc: Option<String>,
}

impl Note {
    /// Title from frontmatter, falling back to the last hierarchy segment.
    pub fn title(&self) -> &str {
        match &self.meta.title {
            Some(t) if !t.is_empty() => t,
            _ => self.name.rsplit('.').next().unwrap_or(&self.name),
        }
    }

    /// Name of the parent in the hierarchy, `None` for top-level notes.
    pub fn parent_name(&self) -> Option<&str> {
        self.name.rsplit_once('.').map(|(parent, _)| parent)
    }
}

/// Scans `root` for all `.md` files and returns them parsed.
/// Hidden files and directories are skipped; symlinks into directories are not followed.
pub fn scan_notes(root: &Path) -> Result<Vec<Note>, ScanError> {
    if !root.is_dir() {
        return Err(ScanError::NotADirectory(root.to_path_buf()));
    }
    let mut notes = Vec::new();
    for entry in WalkDir::new(root)
        .follow_links(false)
        .into_iter()
        .filter_entry(|e| e.depth() == 0 || !is_hidden(e))
    {
        let entry = entry.map_err(|e| ScanError::Walk(e.to_string()))?;
        let path = entry.path();
        if path.extension().map_or(false, |e| e == "md") && path.is_file() {
            let raw = std::fs::read_to_string(path).map_err(|e| ScanError::Read(path.to_path_buf(), e))?;
            notes.push(parse_note(path, &raw)?);
        }
    }
    notes.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(notes)
}

fn parse_note(path: &Path, raw: &str) -> Result<Note, ScanError> {
    let name = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let (meta, body) = match split_frontmatter(raw) {
        Some((yaml, body)) => {
            let meta = if yaml.trim().is_empty() {
                NoteMeta::default()
            } else {
                serde_yaml::from_str(yaml).map_err(|e| ScanError::Frontmatter(path.to_path_buf(), e))?
            };
            (meta, body.to_string())
        }
        None => (NoteMeta::default(), raw.to_string()),
    };
    Ok(Note {
        path: path.to_path_buf(),
        name,
        meta,
        body,
    })
}

fn is_hidden(entry: &walkdir::DirEntry) -> bool {
    entry
        .file_name()
        .to_str()
        .map(|s| s.starts_with('.'))
        .unwrap_or(false)
}

/// Splits optional YAML frontmatter (lines between first --- and second ---) from the body.
fn split_frontmatter(content: &str) -> Option<(&str, &str)> {
    let s = content.trim_start();
    let after_first = s.strip_prefix("---")?;
    let end = after_first.find("\n---")?;
    let yaml = &after_first[..end];
    let rest = &after_first[end + 4..];
    Some((yaml, rest.trim_start()))
}

#[derive(Debug, thiserror::Error)]
pub enum ScanError {
    #[error("not a directory: {0}")]
    NotADirectory(PathBuf),
    #[error("walk error: {0}")]
    Walk(String),
    #[error("read error for {0}: {1}")]
    Read(PathBuf, std::io::Error),
    #[error("bad frontmatter in {0}: {1}")]
    Frontmatter(PathBuf, serde_yaml::Error),
}
