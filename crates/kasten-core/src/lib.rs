//! All backend logic independent of how Kasten is run.
//!
//! Two entry points matter: [`WorkspaceBootstrapController`] sets up a new
//! workspace folder, and [`EngineReloadController`] rebuilds the note index of
//! an existing one. Both talk to the operator only through [`Prompter`] and
//! [`Host`], and share engines through an [`EngineRegistry`].

pub mod app_data;
pub mod bootstrap;
pub mod config;
pub mod engine;
pub mod host;
pub mod notes;
pub mod paths;
pub mod reload;
pub mod template;
pub mod workspace_config;

pub use app_data::app_data_dir;
pub use bootstrap::{
    gather_root_dir, BootstrapError, BootstrapOutcome, ConflictDecision, ConflictInputError,
    RootState, WorkspaceBootstrapController,
};
pub use config::{get_notes_root, load_config, set_notes_root, AppConfig, ConfigError};
pub use engine::{Engine, EngineInitError, EngineOptions, EngineRegistry, EngineState, NoteIndex};
pub use host::{Host, HostError, InputRequest, Prompter};
pub use notes::{scan_notes, Note, NoteMeta, ScanError};
pub use paths::{default_workspace_root, resolve_tilde};
pub use reload::EngineReloadController;
pub use template::{TemplateError, TemplateSource};
pub use workspace_config::{WorkspaceConfig, WORKSPACE_FILE};

/// Returns a short status string. Used to verify the backend is wired up.
pub fn status() -> &'static str {
    "kasten-core ready"
}
