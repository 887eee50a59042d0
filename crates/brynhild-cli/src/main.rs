//! `brynhild`: the command-line entry point for the agentic runtime
//! (spec.md §6).
//!
//! Exit codes: 0 success; 1 failure (including no prompt and no API
//! key); 2 invalid usage. Clap's own argument-parsing errors already
//! exit with code 2, so only command bodies need to map their own
//! failures to 1.

mod app;
mod callbacks;
mod commands;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};

use app::App;

#[derive(Parser)]
#[command(name = "brynhild", version, about = "Agentic coding assistant runtime")]
struct Cli {
    /// Project directory to operate in (defaults to the current directory).
    #[arg(long, global = true)]
    cwd: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Send a prompt and stream back the assistant's reply.
    Chat {
        /// The prompt text. If omitted, read from stdin.
        prompt: Option<String>,
        /// Resume (or create) a specific session id.
        #[arg(long)]
        session: Option<String>,
        /// Non-interactive: auto-deny permission-requiring tools instead
        /// of prompting on stdin.
        #[arg(short = 'p', long)]
        print: bool,
        /// Emit machine-readable JSON instead of streamed text.
        #[arg(long)]
        json: bool,
    },
    /// Inspect merged configuration.
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
    /// Manage persisted sessions.
    Session {
        #[command(subcommand)]
        action: SessionAction,
    },
    /// Inspect append-only conversation logs.
    Logs {
        #[command(subcommand)]
        action: LogsAction,
    },
    /// Check provider connectivity prerequisites.
    Api {
        #[command(subcommand)]
        action: ApiAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Print the fully merged configuration as YAML.
    Show,
    /// Print which configuration layers contributed.
    Path,
}

#[derive(Subcommand)]
enum SessionAction {
    /// List every saved session.
    List,
    /// Show a session's full message history.
    Show { session_id: String },
    /// Delete a session.
    Delete { session_id: String },
    /// Rename a session.
    Rename { old_id: String, new_id: String },
}

#[derive(Subcommand)]
enum LogsAction {
    /// List every log file.
    List,
    /// Print a log file's events.
    View { path: PathBuf },
    /// Validate a log file's internal consistency.
    Validate { path: PathBuf },
}

#[derive(Subcommand)]
enum ApiAction {
    /// Check that the configured provider's credential is present.
    Test,
}

fn init_tracing() {
    use tracing_subscriber::EnvFilter;
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> ExitCode {
    init_tracing();
    let cli = Cli::parse();
    let cwd = match cli.cwd {
        Some(p) => p,
        None => match std::env::current_dir() {
            Ok(p) => p,
            Err(e) => {
                eprintln!("error: could not determine current directory: {e}");
                return ExitCode::FAILURE;
            }
        },
    };

    let result = run(cwd, cli.command).await;
    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err:?}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cwd: PathBuf, command: Commands) -> anyhow::Result<()> {
    match command {
        Commands::Chat { prompt, session, print, json } => {
            let mut app = App::bootstrap(cwd)?;
            commands::chat::run(&mut app, prompt, session, print, json).await
        }
        Commands::Config { action } => match action {
            ConfigAction::Show => {
                let app = App::bootstrap(cwd)?;
                commands::config::show(&app)
            }
            ConfigAction::Path => commands::config::path(cwd),
        },
        Commands::Session { action } => {
            let app = App::bootstrap(cwd)?;
            match action {
                SessionAction::List => commands::session::list(&app),
                SessionAction::Show { session_id } => commands::session::show(&app, &session_id),
                SessionAction::Delete { session_id } => commands::session::delete(&app, &session_id),
                SessionAction::Rename { old_id, new_id } => commands::session::rename(&app, &old_id, &new_id),
            }
        }
        Commands::Logs { action } => {
            let app = App::bootstrap(cwd)?;
            match action {
                LogsAction::List => commands::logs::list(&app),
                LogsAction::View { path } => commands::logs::view(&path),
                LogsAction::Validate { path } => commands::logs::validate(&path),
            }
        }
        Commands::Api { action } => {
            let app = App::bootstrap(cwd)?;
            match action {
                ApiAction::Test => commands::api::test(&app),
            }
        }
    }
}
