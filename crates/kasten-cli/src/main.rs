//! CLI entry point for Kasten: set up workspaces and reload their note index.

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{anyhow, Context};
use async_trait::async_trait;
use clap::Parser;
use kasten_core::{
    app_data_dir, gather_root_dir, get_notes_root, resolve_tilde, set_notes_root, status,
    BootstrapOutcome, EngineRegistry, EngineReloadController, Host, HostError, InputRequest,
    Prompter, TemplateSource, WorkspaceBootstrapController,
};
use serde::Serialize;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser)]
#[command(name = "kasten")]
#[command(about = "Kasten: plain-markdown note workspaces")]
struct Cli {
    /// Log debug output to stderr (RUST_LOG overrides).
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(clap::Subcommand)]
enum Commands {
    /// Show backend status and the current workspace.
    Status {
        /// Print as JSON.
        #[arg(long)]
        json: bool,
    },
    /// Show where Kasten stores its own config (app data directory).
    DataDir,
    /// Set up a new workspace folder, seeded with starter notes.
    Init {
        /// Workspace folder. Asked for interactively when omitted.
        #[arg(value_name = "PATH")]
        path: Option<PathBuf>,
        /// Don't make the new workspace the current one.
        #[arg(long)]
        skip_open: bool,
        /// Copy starter content from this folder instead of the bundled notes.
        #[arg(long, value_name = "DIR")]
        template: Option<PathBuf>,
    },
    /// Rebuild the note index of a workspace from scratch.
    Reload {
        /// Workspace folder. Defaults to the current workspace.
        #[arg(value_name = "PATH")]
        path: Option<PathBuf>,
    },
}

#[derive(Serialize)]
struct StatusReport {
    core: &'static str,
    data_dir: Option<PathBuf>,
    workspace: Option<PathBuf>,
}

/// Reads answers from stdin. End of input counts as dismissing the question.
struct TerminalPrompter;

#[async_trait]
impl Prompter for TerminalPrompter {
    async fn input(&self, request: InputRequest) -> Option<String> {
        if let Some(msg) = &request.validation_message {
            eprintln!("{msg}");
        }
        match &request.value {
            Some(value) => eprint!("{} [{}]: ", request.prompt, value),
            None => eprint!("{}: ", request.prompt),
        }
        let line = tokio::task::spawn_blocking(|| {
            let mut line = String::new();
            match std::io::stdin().read_line(&mut line) {
                Ok(0) | Err(_) => None,
                Ok(_) => Some(line),
            }
        })
        .await
        .ok()
        .flatten()?;
        let answer = line.trim();
        if answer.is_empty() {
            Some(request.value.unwrap_or_default())
        } else {
            Some(answer.to_string())
        }
    }
}

/// Prints messages and records opened workspaces as the current one.
struct TerminalHost;

#[async_trait]
impl Host for TerminalHost {
    fn show_info(&self, message: &str) {
        println!("{message}");
    }

    fn show_error(&self, message: &str) {
        eprintln!("{message}");
    }

    async fn open_workspace(&self, workspace_file: &Path) -> Result<(), HostError> {
        let root = workspace_file.parent().unwrap_or(workspace_file);
        set_notes_root(root).map_err(|e| HostError::OpenWorkspace {
            path: workspace_file.to_path_buf(),
            reason: e.to_string(),
        })?;
        println!("Current workspace: {}", workspace_file.display());
        Ok(())
    }
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| default.into()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run(cli.command.unwrap_or(Commands::Status { json: false })).await {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

/// Exit status for a finished bootstrap. The host has already shown any
/// failure message, so a failed run only changes the status.
fn bootstrap_exit_code(outcome: &BootstrapOutcome) -> u8 {
    match outcome {
        BootstrapOutcome::Failed { .. } => 1,
        _ => 0,
    }
}

async fn run(command: Commands) -> anyhow::Result<u8> {
    match command {
        Commands::Status { json } => {
            let report = StatusReport {
                core: status(),
                data_dir: app_data_dir(),
                workspace: get_notes_root(),
            };
            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                println!("Kasten");
                println!("  core: {}", report.core);
                match report.workspace {
                    Some(p) => println!("  workspace: {}", p.display()),
                    None => println!("  workspace: (none, run `kasten init`)"),
                }
            }
        }
        Commands::DataDir => match app_data_dir() {
            Some(p) => println!("{}", p.display()),
            None => eprintln!("Could not determine app data directory."),
        },
        Commands::Init {
            path,
            skip_open,
            template,
        } => {
            let prompter = TerminalPrompter;
            let host = TerminalHost;
            let root = match path {
                Some(p) => p,
                None => match gather_root_dir(&prompter).await {
                    Some(p) => p,
                    None => return Ok(0),
                },
            };
            let template = template.map_or(TemplateSource::Bundled, |t| {
                TemplateSource::Dir(resolve_tilde(&t))
            });
            let outcome = WorkspaceBootstrapController::new(&prompter, &host)
                .with_template(template)
                .bootstrap(&root, skip_open)
                .await
                .with_context(|| format!("setting up {}", root.display()))?;
            if outcome == BootstrapOutcome::Skipped {
                println!("Workspace ready at {}", resolve_tilde(&root).display());
            }
            return Ok(bootstrap_exit_code(&outcome));
        }
        Commands::Reload { path } => {
            let root = path
                .or_else(get_notes_root)
                .ok_or_else(|| anyhow!("no current workspace; pass a PATH or run `kasten init`"))?;
            let root = resolve_tilde(&root);
            tracing::debug!(root = %root.display(), "reload requested");
            let controller = EngineReloadController::new(Arc::new(EngineRegistry::new()));
            let engine = controller
                .reload(&root)
                .await
                .with_context(|| format!("reloading {}", root.display()))?;
            let index = engine.index().unwrap_or_default();
            println!("Indexed {} note(s) under {}", index.len(), root.display());
            for name in index.names() {
                if let Some(note) = index.get(name) {
                    println!("  {}  {}", name, note.title());
                }
            }
        }
    }
    Ok(0)
}
