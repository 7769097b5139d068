//! Force-reloading the note index of a workspace.

use std::path::Path;
use std::sync::Arc;

use crate::engine::{Engine, EngineInitError, EngineOptions, EngineRegistry};

/// Rebuilds the engine for a root from scratch, dropping any engine the
/// registry held for it.
#[derive(Debug, Clone)]
pub struct EngineReloadController {
    registry: Arc<EngineRegistry>,
}

impl EngineReloadController {
    pub fn new(registry: Arc<EngineRegistry>) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &Arc<EngineRegistry> {
        &self.registry
    }

    /// Replaces the engine for `root` and initializes it. Init errors are
    /// returned unchanged; the previous engine is gone either way.
    pub async fn reload(&self, root: &Path) -> Result<Arc<Engine>, EngineInitError> {
        let opts = EngineOptions {
            root: root.to_path_buf(),
            force_new: true,
        };
        tracing::info!(ctx = "reload", ?opts, "reloading index");
        let engine = self.registry.get_or_create_engine(opts);
        engine.init().await?;
        Ok(engine)
    }
}
