//! Setting up a new workspace folder.
//!
//! If the target already exists the operator decides what happens to it
//! (delete, abort or continue into it). Then the folder is created, seeded from
//! the template, given a workspace marker, and optionally opened.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::config::ConfigError;
use crate::host::{Host, HostError, InputRequest, Prompter};
use crate::paths::{default_workspace_root, resolve_tilde};
use crate::template::{TemplateError, TemplateSource};
use crate::workspace_config::WorkspaceConfig;

/// What to do with a target folder that already exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConflictDecision {
    Delete,
    Abort,
    Continue,
}

impl ConflictDecision {
    pub const ALL: [ConflictDecision; 3] = [Self::Delete, Self::Abort, Self::Continue];

    /// Pre-filled answer when asking.
    pub const DEFAULT: ConflictDecision = Self::Continue;

    pub fn key(self) -> &'static str {
        match self {
            Self::Delete => "delete",
            Self::Abort => "abort",
            Self::Continue => "continue",
        }
    }

    pub fn alias(self) -> &'static str {
        match self {
            Self::Delete => "d",
            Self::Abort => "a",
            Self::Continue => "c",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            Self::Delete => "delete existing folder",
            Self::Abort => "abort current operation",
            Self::Continue => "initialize workspace into current folder",
        }
    }
}

impl fmt::Display for ConflictDecision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for ConflictDecision {
    type Err = ConflictInputError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let input = s.trim().to_lowercase();
        Self::ALL
            .into_iter()
            .find(|d| input == d.key() || input == d.alias())
            .ok_or(ConflictInputError { input: s.to_string() })
    }
}

/// Operator typed something that is not one of the three decisions.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("not valid input. valid inputs: delete, abort, continue")]
pub struct ConflictInputError {
    pub input: String,
}

/// Existence state of a target folder before bootstrap.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RootState {
    Absent,
    Empty,
    NonEmpty,
}

impl RootState {
    pub fn probe(path: &Path) -> Self {
        if !path.exists() {
            return Self::Absent;
        }
        match std::fs::read_dir(path) {
            Ok(mut entries) => {
                if entries.next().is_none() {
                    Self::Empty
                } else {
                    Self::NonEmpty
                }
            }
            Err(_) => Self::NonEmpty,
        }
    }
}

/// How a bootstrap run ended.
#[derive(Debug, Clone, PartialEq)]
pub enum BootstrapOutcome {
    /// Workspace set up and handed to the host to open.
    Opened { workspace_file: PathBuf },
    /// Workspace set up; opening was skipped on request.
    Skipped,
    /// Operator chose not to touch the existing folder.
    Aborted,
    /// Existing folder could not be removed.
    Failed { message: String },
}

#[derive(Debug, thiserror::Error)]
pub enum BootstrapError {
    #[error("failed to create {0}: {1}")]
    CreateRoot(PathBuf, std::io::Error),
    #[error("template error: {0}")]
    Template(#[from] TemplateError),
    #[error("workspace config error: {0}")]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Host(#[from] HostError),
}

type RemoveFn = fn(&Path) -> std::io::Result<()>;

/// Asks the operator where to put the new workspace, suggesting `~/Kasten`.
/// Returns `None` if they dismiss the question; an empty answer takes the suggestion.
pub async fn gather_root_dir(prompter: &dyn Prompter) -> Option<PathBuf> {
    let default = default_workspace_root();
    let request = InputRequest::new("Folder for the new workspace")
        .with_value(default.to_string_lossy());
    let answer = prompter.input(request).await?;
    let answer = answer.trim();
    if answer.is_empty() {
        Some(default)
    } else {
        Some(PathBuf::from(answer))
    }
}

/// Runs workspace bootstrap against a prompter and a host.
pub struct WorkspaceBootstrapController<'a> {
    prompter: &'a dyn Prompter,
    host: &'a dyn Host,
    template: TemplateSource,
    remove: RemoveFn,
}

impl<'a> WorkspaceBootstrapController<'a> {
    pub fn new(prompter: &'a dyn Prompter, host: &'a dyn Host) -> Self {
        Self {
            prompter,
            host,
            template: TemplateSource::default(),
            remove: remove_existing,
        }
    }

    pub fn with_template(mut self, template: TemplateSource) -> Self {
        self.template = template;
        self
    }

    /// Replaces how an existing target is removed on `delete`.
    pub fn with_remove_fn(mut self, remove: RemoveFn) -> Self {
        self.remove = remove;
        self
    }

    /// Sets up a workspace at `root_dir_raw` (a leading `~` is expanded, an
    /// empty path is the current directory).
    ///
    /// Returns `Ok` for every path the operator can steer into, including
    /// abort and a failed delete. Filesystem errors while seeding, and a host
    /// that cannot open the result, are returned as [`BootstrapError`].
    pub async fn bootstrap(
        &self,
        root_dir_raw: &Path,
        skip_open_ws: bool,
    ) -> Result<BootstrapOutcome, BootstrapError> {
        let root = normalize_root(root_dir_raw);
        let state = RootState::probe(&root);
        tracing::info!(
            ctx = "bootstrap",
            root = %root.display(),
            skip_open_ws,
            ?state,
            "setting up workspace"
        );

        self.template.check_target(&root)?;

        if state != RootState::Absent {
            match self.resolve_conflict(&root).await {
                ConflictDecision::Abort => {
                    self.host.show_info("did not initialize workspace");
                    return Ok(BootstrapOutcome::Aborted);
                }
                ConflictDecision::Delete => {
                    if let Err(e) = (self.remove)(&root) {
                        tracing::error!(root = %root.display(), error = ?e, "failed to remove existing folder");
                        let message = format!(
                            "error removing {}. please check that it's not currently open",
                            root.display()
                        );
                        self.host.show_error(&message);
                        return Ok(BootstrapOutcome::Failed { message });
                    }
                    self.host.show_info(&format!("removed {}", root.display()));
                }
                ConflictDecision::Continue => {}
            }
        }

        std::fs::create_dir_all(&root).map_err(|e| BootstrapError::CreateRoot(root.clone(), e))?;
        self.template.copy_into(&root)?;
        let workspace_file = WorkspaceConfig::write(&root)?;

        if skip_open_ws {
            return Ok(BootstrapOutcome::Skipped);
        }
        self.host.show_info("opening workspace");
        self.host.open_workspace(&workspace_file).await?;
        Ok(BootstrapOutcome::Opened { workspace_file })
    }

    /// Asks until the operator gives a valid decision.
    ///
    /// Dismissing the question counts as `abort`, so a closed prompt never
    /// seeds into an existing folder.
    async fn resolve_conflict(&self, root: &Path) -> ConflictDecision {
        let prompt = conflict_prompt(root);
        let mut validation_message = None;
        loop {
            let request = InputRequest {
                prompt: prompt.clone(),
                value: Some(ConflictDecision::DEFAULT.key().to_string()),
                validation_message: validation_message.take(),
            };
            let Some(answer) = self.prompter.input(request).await else {
                tracing::debug!(root = %root.display(), "conflict prompt dismissed");
                return ConflictDecision::Abort;
            };
            match answer.parse::<ConflictDecision>() {
                Ok(decision) => {
                    tracing::debug!(root = %root.display(), %decision, "conflict resolved");
                    return decision;
                }
                Err(e) => {
                    tracing::debug!(input = %e.input, "rejected conflict input");
                    validation_message = Some(e.to_string());
                }
            }
        }
    }
}

/// Expands `~`; an empty path means the current directory.
fn normalize_root(raw: &Path) -> PathBuf {
    let root = resolve_tilde(raw);
    if root.as_os_str().is_empty() {
        PathBuf::from(".")
    } else {
        root
    }
}

fn conflict_prompt(root: &Path) -> String {
    let options: Vec<String> = ConflictDecision::ALL
        .iter()
        .map(|d| format!("({}: {})", d.key(), d.description()))
        .collect();
    format!(
        "{} exists. Please specify the next action. Your options: {}",
        root.display(),
        options.join(", ")
    )
}

fn remove_existing(path: &Path) -> std::io::Result<()> {
    if path.is_dir() {
        std::fs::remove_dir_all(path)
    } else {
        std::fs::remove_file(path)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use walkdir::WalkDir;

    use super::*;
    use crate::host::fakes::{RecordingHost, ScriptedPrompter};
    use crate::workspace_config::WORKSPACE_FILE;

    /// Every file under `root` with its contents.
    fn snapshot(root: &Path) -> BTreeMap<PathBuf, Vec<u8>> {
        WalkDir::new(root)
            .min_depth(1)
            .into_iter()
            .map(|e| e.unwrap())
            .filter(|e| e.file_type().is_file())
            .map(|e| {
                let rel = e.path().strip_prefix(root).unwrap().to_path_buf();
                (rel, std::fs::read(e.path()).unwrap())
            })
            .collect()
    }

    fn expected_files() -> Vec<PathBuf> {
        let mut files = TemplateSource::Bundled.files().unwrap();
        files.push(PathBuf::from(WORKSPACE_FILE));
        files.sort();
        files
    }

    fn seed_existing(root: &Path) {
        std::fs::create_dir_all(root.join("old")).unwrap();
        std::fs::write(root.join("old").join("keep.md"), "old note").unwrap();
        std::fs::write(root.join("root.md"), "my own root").unwrap();
    }

    fn permission_denied(_: &Path) -> std::io::Result<()> {
        Err(std::io::Error::new(std::io::ErrorKind::PermissionDenied, "in use"))
    }

    #[test]
    fn decisions_parse_keys_and_aliases() {
        let parse = |s: &str| s.parse::<ConflictDecision>();
        assert_eq!(parse("delete"), Ok(ConflictDecision::Delete));
        assert_eq!(parse("d"), Ok(ConflictDecision::Delete));
        assert_eq!(parse("A"), Ok(ConflictDecision::Abort));
        assert_eq!(parse(" Continue "), Ok(ConflictDecision::Continue));
        assert_eq!(parse("c"), Ok(ConflictDecision::Continue));
    }

    #[test]
    fn unknown_decision_is_rejected() {
        let err = "x".parse::<ConflictDecision>().unwrap_err();
        assert_eq!(err.input, "x");
        assert_eq!(err.to_string(), "not valid input. valid inputs: delete, abort, continue");
        assert!("".parse::<ConflictDecision>().is_err());
        assert!("deletee".parse::<ConflictDecision>().is_err());
    }

    #[test]
    fn root_state_probe() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(RootState::probe(&dir.path().join("nope")), RootState::Absent);
        assert_eq!(RootState::probe(dir.path()), RootState::Empty);
        std::fs::write(dir.path().join("f"), "x").unwrap();
        assert_eq!(RootState::probe(dir.path()), RootState::NonEmpty);
    }

    #[test]
    fn prompt_lists_all_options() {
        let p = conflict_prompt(Path::new("/ws"));
        assert!(p.starts_with("/ws exists."));
        assert!(p.contains("(delete: delete existing folder)"));
        assert!(p.contains("(abort: abort current operation)"));
        assert!(p.contains("(continue: initialize workspace into current folder)"));
    }

    #[tokio::test]
    async fn absent_root_is_seeded_and_opened() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("ws");
        let prompter = ScriptedPrompter::default();
        let host = RecordingHost::default();

        let outcome = WorkspaceBootstrapController::new(&prompter, &host)
            .bootstrap(&root, false)
            .await
            .unwrap();

        let marker = root.join(WORKSPACE_FILE);
        assert_eq!(outcome, BootstrapOutcome::Opened { workspace_file: marker.clone() });
        assert!(prompter.requests().is_empty());
        assert_eq!(snapshot(&root).into_keys().collect::<Vec<_>>(), expected_files());
        assert_eq!(host.opened(), vec![marker]);
        assert_eq!(host.infos(), vec!["opening workspace".to_string()]);
    }

    #[tokio::test]
    async fn skip_open_leaves_host_alone() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("ws");
        let prompter = ScriptedPrompter::default();
        let host = RecordingHost::default();

        let outcome = WorkspaceBootstrapController::new(&prompter, &host)
            .bootstrap(&root, true)
            .await
            .unwrap();

        assert_eq!(outcome, BootstrapOutcome::Skipped);
        assert!(WorkspaceConfig::exists(&root));
        assert!(host.opened().is_empty());
        assert!(host.infos().is_empty());
    }

    #[tokio::test]
    async fn abort_changes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("ws");
        seed_existing(&root);
        let before = snapshot(&root);
        let prompter = ScriptedPrompter::new([Some("a")]);
        let host = RecordingHost::default();

        let outcome = WorkspaceBootstrapController::new(&prompter, &host)
            .bootstrap(&root, false)
            .await
            .unwrap();

        assert_eq!(outcome, BootstrapOutcome::Aborted);
        assert_eq!(snapshot(&root), before);
        assert_eq!(host.infos(), vec!["did not initialize workspace".to_string()]);
        assert!(host.opened().is_empty());
    }

    #[tokio::test]
    async fn delete_replaces_existing_content() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("ws");
        seed_existing(&root);
        let prompter = ScriptedPrompter::new([Some("d")]);
        let host = RecordingHost::default();

        let outcome = WorkspaceBootstrapController::new(&prompter, &host)
            .bootstrap(&root, false)
            .await
            .unwrap();

        assert!(matches!(outcome, BootstrapOutcome::Opened { .. }));
        assert_eq!(snapshot(&root).into_keys().collect::<Vec<_>>(), expected_files());
        assert_ne!(std::fs::read_to_string(root.join("root.md")).unwrap(), "my own root");
        assert_eq!(host.infos()[0], format!("removed {}", root.display()));
    }

    #[tokio::test]
    async fn continue_overlays_template() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("ws");
        seed_existing(&root);
        let prompter = ScriptedPrompter::new([Some("continue")]);
        let host = RecordingHost::default();

        WorkspaceBootstrapController::new(&prompter, &host)
            .bootstrap(&root, true)
            .await
            .unwrap();

        let after = snapshot(&root);
        assert_eq!(after[Path::new("old/keep.md")], b"old note".to_vec());
        assert_ne!(after[Path::new("root.md")], b"my own root".to_vec());
        for f in expected_files() {
            assert!(after.contains_key(&f), "missing {}", f.display());
        }
    }

    #[tokio::test]
    async fn conflict_prompt_prefills_continue() {
        let dir = tempfile::tempdir().unwrap();
        let prompter = ScriptedPrompter::new([Some("abort")]);
        let host = RecordingHost::default();

        WorkspaceBootstrapController::new(&prompter, &host)
            .bootstrap(dir.path(), false)
            .await
            .unwrap();

        let requests = prompter.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].value.as_deref(), Some("continue"));
        assert_eq!(requests[0].validation_message, None);
    }

    #[tokio::test]
    async fn invalid_input_reprompts_without_touching_disk() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("ws");
        seed_existing(&root);
        let before = snapshot(&root);
        let prompter = ScriptedPrompter::new([Some("x"), Some("ABORT")]);
        let host = RecordingHost::default();

        let outcome = WorkspaceBootstrapController::new(&prompter, &host)
            .bootstrap(&root, false)
            .await
            .unwrap();

        assert_eq!(outcome, BootstrapOutcome::Aborted);
        assert_eq!(snapshot(&root), before);
        let requests = prompter.requests();
        assert_eq!(requests.len(), 2);
        assert_eq!(
            requests[1].validation_message.as_deref(),
            Some("not valid input. valid inputs: delete, abort, continue")
        );
    }

    #[tokio::test]
    async fn dismissed_conflict_prompt_aborts() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("ws");
        seed_existing(&root);
        let before = snapshot(&root);
        let prompter = ScriptedPrompter::new([None]);
        let host = RecordingHost::default();

        let outcome = WorkspaceBootstrapController::new(&prompter, &host)
            .bootstrap(&root, false)
            .await
            .unwrap();

        assert_eq!(outcome, BootstrapOutcome::Aborted);
        assert_eq!(snapshot(&root), before);
    }

    #[tokio::test]
    async fn failed_delete_reports_and_stops() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("ws");
        seed_existing(&root);
        let before = snapshot(&root);
        let prompter = ScriptedPrompter::new([Some("delete")]);
        let host = RecordingHost::default();

        let outcome = WorkspaceBootstrapController::new(&prompter, &host)
            .with_remove_fn(permission_denied)
            .bootstrap(&root, false)
            .await
            .unwrap();

        let message = match outcome {
            BootstrapOutcome::Failed { message } => message,
            other => panic!("expected failure, got {other:?}"),
        };
        assert!(message.contains(&root.display().to_string()));
        assert_eq!(host.errors(), vec![message]);
        assert_eq!(snapshot(&root), before);
        assert!(!WorkspaceConfig::exists(&root));
        assert!(host.opened().is_empty());
    }

    #[tokio::test]
    async fn open_failure_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("ws");
        let prompter = ScriptedPrompter::default();
        let host = RecordingHost {
            fail_open: true,
            ..RecordingHost::default()
        };

        let err = WorkspaceBootstrapController::new(&prompter, &host)
            .bootstrap(&root, false)
            .await
            .unwrap_err();

        assert!(matches!(err, BootstrapError::Host(_)));
        assert!(WorkspaceConfig::exists(&root));
    }

    #[tokio::test]
    async fn custom_template_dir_is_used() {
        let dir = tempfile::tempdir().unwrap();
        let template = dir.path().join("tpl");
        std::fs::create_dir(&template).unwrap();
        std::fs::write(template.join("start.md"), "hello").unwrap();
        let root = dir.path().join("ws");
        let prompter = ScriptedPrompter::default();
        let host = RecordingHost::default();

        WorkspaceBootstrapController::new(&prompter, &host)
            .with_template(TemplateSource::Dir(template))
            .bootstrap(&root, true)
            .await
            .unwrap();

        assert_eq!(
            snapshot(&root).into_keys().collect::<Vec<_>>(),
            vec![PathBuf::from(WORKSPACE_FILE), PathBuf::from("start.md")]
        );
    }

    #[test]
    fn empty_root_means_current_dir() {
        assert_eq!(normalize_root(Path::new("")), PathBuf::from("."));
        assert_eq!(normalize_root(Path::new("/ws")), PathBuf::from("/ws"));
    }

    #[tokio::test]
    async fn empty_root_still_asks_before_touching_cwd() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("root.md"), "user data").unwrap();
        let before = snapshot(dir.path());
        let prompter = ScriptedPrompter::new([Some("abort")]);
        let host = RecordingHost::default();

        let previous = std::env::current_dir().unwrap();
        std::env::set_current_dir(dir.path()).unwrap();
        let outcome = WorkspaceBootstrapController::new(&prompter, &host)
            .bootstrap(Path::new(""), true)
            .await;
        std::env::set_current_dir(previous).unwrap();

        assert_eq!(outcome.unwrap(), BootstrapOutcome::Aborted);
        assert_eq!(prompter.requests().len(), 1);
        assert_eq!(snapshot(dir.path()), before);
    }

    #[tokio::test]
    async fn template_equal_to_root_is_refused() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("ws");
        std::fs::create_dir(&root).unwrap();
        std::fs::write(root.join("mine.md"), "precious").unwrap();
        let before = snapshot(&root);
        let prompter = ScriptedPrompter::new([Some("continue")]);
        let host = RecordingHost::default();

        let err = WorkspaceBootstrapController::new(&prompter, &host)
            .with_template(TemplateSource::Dir(root.clone()))
            .bootstrap(&root, true)
            .await
            .unwrap_err();

        assert!(matches!(err, BootstrapError::Template(TemplateError::Overlap { .. })));
        assert_eq!(snapshot(&root), before);
    }

    #[tokio::test]
    async fn template_inside_root_is_refused_before_delete() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("ws");
        seed_existing(&root);
        let before = snapshot(&root);
        let prompter = ScriptedPrompter::new([Some("delete")]);
        let host = RecordingHost::default();

        let err = WorkspaceBootstrapController::new(&prompter, &host)
            .with_template(TemplateSource::Dir(root.join("old")))
            .bootstrap(&root, false)
            .await
            .unwrap_err();

        assert!(matches!(err, BootstrapError::Template(TemplateError::Overlap { .. })));
        assert!(prompter.requests().is_empty());
        assert_eq!(snapshot(&root), before);
    }

    #[tokio::test]
    async fn gather_root_dir_defaults_and_cancels() {
        let prompter = ScriptedPrompter::new([Some(""), Some(" /tmp/elsewhere "), None]);
        assert_eq!(gather_root_dir(&prompter).await, Some(default_workspace_root()));
        assert_eq!(gather_root_dir(&prompter).await, Some(PathBuf::from("/tmp/elsewhere")));
        assert_eq!(gather_root_dir(&prompter).await, None);
        let requests = prompter.requests();
        assert_eq!(
            requests[0].value,
            Some(default_workspace_root().to_string_lossy().into_owned())
        );
    }
}
