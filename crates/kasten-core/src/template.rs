//! Starter content copied into every new workspace.
//!
//! The default tree is compiled into the binary from `assets/notes`. A folder on
//! disk can be used instead. Either way the copy overwrites same-named files at
//! the destination and leaves everything else alone.

use std::path::{Path, PathBuf};

use include_dir::{include_dir, Dir};
use walkdir::WalkDir;

static BUNDLED_NOTES: Dir<'_> = include_dir!("$CARGO_MANIFEST_DIR/assets/notes");

/// Where template content comes from.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum TemplateSource {
    /// The tree bundled with Kasten.
    #[default]
    Bundled,
    /// A directory on disk.
    Dir(PathBuf),
}

impl TemplateSource {
    /// Copies the template tree into `dest`. Returns the number of files written.
    /// Refuses to copy from a source folder that overlaps `dest`.
    pub fn copy_into(&self, dest: &Path) -> Result<usize, TemplateError> {
        self.check_target(dest)?;
        let written = match self {
            Self::Bundled => copy_bundled(&BUNDLED_NOTES, dest)?,
            Self::Dir(src) => copy_dir(src, dest)?,
        };
        tracing::debug!(dest = %dest.display(), files = written, "copied template");
        Ok(written)
    }

    /// Checks that copying into `dest` cannot clobber or remove the template
    /// itself: a source folder must not be `dest`, live inside it, or contain it.
    /// A `dest` that does not exist yet is only checked once it does.
    pub fn check_target(&self, dest: &Path) -> Result<(), TemplateError> {
        let Self::Dir(src) = self else {
            return Ok(());
        };
        ensure_source(src)?;
        let Ok(dest) = dest.canonicalize() else {
            return Ok(());
        };
        let src = src
            .canonicalize()
            .map_err(|e| TemplateError::Resolve(src.clone(), e))?;
        if src.starts_with(&dest) || dest.starts_with(&src) {
            return Err(TemplateError::Overlap { src, dest });
        }
        Ok(())
    }

    /// Relative paths of every file in the template, sorted.
    pub fn files(&self) -> Result<Vec<PathBuf>, TemplateError> {
        let mut out = Vec::new();
        match self {
            Self::Bundled => collect_bundled(&BUNDLED_NOTES, &mut out),
            Self::Dir(src) => {
                ensure_source(src)?;
                for entry in WalkDir::new(src).min_depth(1) {
                    let entry = entry.map_err(|e| TemplateError::Walk(e.to_string()))?;
                    if entry.file_type().is_file() {
                        out.push(relative(src, entry.path())?);
                    }
                }
            }
        }
        out.sort();
        Ok(out)
    }
}

fn copy_bundled(dir: &Dir<'_>, dest: &Path) -> Result<usize, TemplateError> {
    let mut written = 0;
    for file in dir.files() {
        let target = dest.join(file.path());
        write_file(&target, file.contents())?;
        written += 1;
    }
    for sub in dir.dirs() {
        create_dir(&dest.join(sub.path()))?;
        written += copy_bundled(sub, dest)?;
    }
    Ok(written)
}

fn collect_bundled(dir: &Dir<'_>, out: &mut Vec<PathBuf>) {
    out.extend(dir.files().map(|f| f.path().to_path_buf()));
    for sub in dir.dirs() {
        collect_bundled(sub, out);
    }
}

fn copy_dir(src: &Path, dest: &Path) -> Result<usize, TemplateError> {
    ensure_source(src)?;
    let mut written = 0;
    for entry in WalkDir::new(src).min_depth(1) {
        let entry = entry.map_err(|e| TemplateError::Walk(e.to_string()))?;
        let target = dest.join(relative(src, entry.path())?);
        if entry.file_type().is_dir() {
            create_dir(&target)?;
        } else if entry.file_type().is_file() {
            std::fs::copy(entry.path(), &target).map_err(|e| TemplateError::Write(target.clone(), e))?;
            written += 1;
        }
    }
    Ok(written)
}

fn ensure_source(src: &Path) -> Result<(), TemplateError> {
    if src.is_dir() {
        Ok(())
    } else {
        Err(TemplateError::NotADirectory(src.to_path_buf()))
    }
}

fn relative(src: &Path, path: &Path) -> Result<PathBuf, TemplateError> {
    path.strip_prefix(src)
        .map(Path::to_path_buf)
        .map_err(|_| TemplateError::Walk(format!("{} is outside {}", path.display(), src.display())))
}

fn create_dir(path: &Path) -> Result<(), TemplateError> {
    std::fs::create_dir_all(path).map_err(|e| TemplateError::Write(path.to_path_buf(), e))
}

fn write_file(path: &Path, contents: &[u8]) -> Result<(), TemplateError> {
    if let Some(parent) = path.parent() {
        create_dir(parent)?;
    }
    std::fs::write(path, contents).map_err(|e| TemplateError::Write(path.to_path_buf(), e))
}

#[derive(Debug, thiserror::Error)]
pub enum TemplateError {
    #[error("template source is not a directory: {0}")]
    NotADirectory(PathBuf),
    #[error("walk error: {0}")]
    Walk(String),
    #[error("failed to resolve template path {0}: {1}")]
    Resolve(PathBuf, std::io::Error),
    #[error("template {src} overlaps workspace {dest}")]
    Overlap { src: PathBuf, dest: PathBuf },
    #[error("failed to write {0}: {1}")]
    Write(PathBuf, std::io::Error),
}
