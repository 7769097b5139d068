//! What the controllers need from whoever is running them: a way to ask the
//! operator a question, show messages, and open a workspace.

use std::path::{Path, PathBuf};

use async_trait::async_trait;

/// A single free-text question for the operator.
#[derive(Debug, Clone, PartialEq)]
pub struct InputRequest {
    pub prompt: String,
    /// Pre-filled answer, accepted when the operator just confirms.
    pub value: Option<String>,
    /// Set when re-asking after the previous answer was rejected.
    pub validation_message: Option<String>,
}

impl InputRequest {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            value: None,
            validation_message: None,
        }
    }

    pub fn with_value(mut self, value: impl Into<String>) -> Self {
        self.value = Some(value.into());
        self
    }
}

/// Asks the operator for input. `None` means the question was dismissed.
#[async_trait]
pub trait Prompter: Send + Sync {
    async fn input(&self, request: InputRequest) -> Option<String>;
}

/// Messages to the operator and the "open this workspace" capability.
#[async_trait]
pub trait Host: Send + Sync {
    fn show_info(&self, message: &str);

    fn show_error(&self, message: &str);

    /// Opens the workspace whose marker file is at `workspace_file`.
    async fn open_workspace(&self, workspace_file: &Path) -> Result<(), HostError>;
}

#[derive(Debug, thiserror::Error)]
pub enum HostError {
    #[error("failed to open workspace {path}: {reason}")]
    OpenWorkspace { path: PathBuf, reason: String },
}
