//! The note engine and the registry that hands out one engine per workspace root.
//!
//! An [`Engine`] starts out `Created`, and [`Engine::init`] scans the workspace
//! into a [`NoteIndex`]. The [`EngineRegistry`] keeps at most one live engine per
//! root; asking for one with `force_new` drops whatever was there before.

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError, RwLock};

use crate::config::ConfigError;
use crate::notes::{scan_notes, Note, ScanError};
use crate::workspace_config::WorkspaceConfig;

/// Notes of one workspace, keyed by hierarchical name.
#[derive(Debug, Default)]
pub struct NoteIndex {
    notes: BTreeMap<String, Note>,
}

impl NoteIndex {
    /// Scans every vault of the workspace at `root`. Without a workspace marker
    /// the root itself is the only vault.
    pub fn build(root: &Path) -> Result<Self, EngineInitError> {
        let vaults = if WorkspaceConfig::exists(root) {
            WorkspaceConfig::load(root)?.vaults
        } else {
            vec![".".to_string()]
        };
        let mut notes: BTreeMap<String, Note> = BTreeMap::new();
        for vault in vaults {
            for note in scan_notes(&root.join(&vault))? {
                if let Some(existing) = notes.get(&note.name) {
                    return Err(EngineInitError::DuplicateNote {
                        name: note.name.clone(),
                        first: existing.path.clone(),
                        second: note.path,
                    });
                }
                notes.insert(note.name.clone(), note);
            }
        }
        Ok(Self { notes })
    }

    pub fn len(&self) -> usize {
        self.notes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.notes.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<&Note> {
        self.notes.get(name)
    }

    /// All note names in sorted order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.notes.keys().map(String::as_str)
    }

    /// Direct children of `name` in the hierarchy.
    pub fn children<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Note> + 'a {
        self.notes
            .values()
            .filter(move |n| n.parent_name() == Some(name))
    }
}

/// Lifecycle state of an engine.
#[derive(Debug, Clone)]
pub enum EngineState {
    Created,
    Ready(Arc<NoteIndex>),
    Failed(String),
}

/// An engine bound to one workspace root.
#[derive(Debug)]
pub struct Engine {
    root: PathBuf,
    /// Unique per registry; tells a replaced engine apart from its successor.
    generation: u64,
    state: RwLock<EngineState>,
}

impl Engine {
    fn new(root: PathBuf, generation: u64) -> Self {
        Self {
            root,
            generation,
            state: RwLock::new(EngineState::Created),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn state(&self) -> EngineState {
        self.state.read().unwrap_or_else(PoisonError::into_inner).clone()
    }

    pub fn is_ready(&self) -> bool {
        matches!(self.state(), EngineState::Ready(_))
    }

    /// The index built by the last successful [`init`](Self::init).
    pub fn index(&self) -> Option<Arc<NoteIndex>> {
        match self.state() {
            EngineState::Ready(index) => Some(index),
            _ => None,
        }
    }

    /// Scans and indexes the workspace. On failure the engine is left `Failed`
    /// and the error is returned as-is.
    pub async fn init(&self) -> Result<(), EngineInitError> {
        let root = self.root.clone();
        let built = tokio::task::spawn_blocking(move || NoteIndex::build(&root))
            .await
            .map_err(|e| EngineInitError::Interrupted(e.to_string()))
            .and_then(|r| r);
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        match built {
            Ok(index) => {
                tracing::info!(
                    root = %self.root.display(),
                    generation = self.generation,
                    notes = index.len(),
                    "engine ready"
                );
                *state = EngineState::Ready(Arc::new(index));
                Ok(())
            }
            Err(e) => {
                tracing::warn!(root = %self.root.display(), generation = self.generation, error = %e, "engine init failed");
                *state = EngineState::Failed(e.to_string());
                Err(e)
            }
        }
    }
}

/// Options for [`EngineRegistry::get_or_create_engine`].
#[derive(Debug, Clone)]
pub struct EngineOptions {
    pub root: PathBuf,
    /// Discard any existing engine for `root` and build a fresh one.
    pub force_new: bool,
}

/// Hands out at most one live engine per workspace root.
#[derive(Debug, Default)]
pub struct EngineRegistry {
    engines: Mutex<HashMap<PathBuf, Arc<Engine>>>,
    next_generation: AtomicU64,
}

impl EngineRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the engine registered for `opts.root`, creating one if there is
    /// none or if `force_new` is set. The returned engine is not initialized.
    pub fn get_or_create_engine(&self, opts: EngineOptions) -> Arc<Engine> {
        let key = registry_key(&opts.root);
        let mut engines = self.engines.lock().unwrap_or_else(PoisonError::into_inner);
        if !opts.force_new {
            if let Some(engine) = engines.get(&key) {
                return Arc::clone(engine);
            }
        }
        let generation = self.next_generation.fetch_add(1, Ordering::Relaxed) + 1;
        let engine = Arc::new(Engine::new(opts.root, generation));
        if let Some(old) = engines.insert(key, Arc::clone(&engine)) {
            tracing::debug!(
                root = %engine.root.display(),
                replaced = old.generation,
                generation,
                "replaced engine"
            );
        } else {
            tracing::debug!(root = %engine.root.display(), generation, "created engine");
        }
        engine
    }

    /// The engine currently registered for `root`, if any.
    pub fn get(&self, root: &Path) -> Option<Arc<Engine>> {
        let engines = self.engines.lock().unwrap_or_else(PoisonError::into_inner);
        engines.get(&registry_key(root)).cloned()
    }

    /// Number of registered engines.
    pub fn len(&self) -> usize {
        self.engines.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn registry_key(root: &Path) -> PathBuf {
    root.canonicalize().unwrap_or_else(|_| root.to_path_buf())
}

#[derive(Debug, thiserror::Error)]
pub enum EngineInitError {
    #[error("scan error: {0}")]
    Scan(#[from] ScanError),
    #[error("workspace config error: {0}")]
    Config(#[from] ConfigError),
    #[error("duplicate note {name}: {first} and {second}")]
    DuplicateNote {
        name: String,
        first: PathBuf,
        second: PathBuf,
    },
    #[error("indexing interrupted: {0}")]
    Interrupted(String),
}
