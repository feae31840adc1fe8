//! SMARTIO admin console in the terminal.
//!
//! Hosts the console's login and dashboard pages: `login` runs the login
//! form and lands on the dashboard, `dashboard` validates the stored token
//! and shows who it belongs to, `logout` drops the token.

mod page;
mod router;
mod storage;

use std::io;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use smartio_admin_core::{AuthorizedClient, Config, Fetched, HttpClient};
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use router::{Console, Visit};
use storage::{Storage, StoreKind};

#[derive(Parser)]
#[command(name = "smartio-admin")]
#[command(author, version, about = "SMARTIO admin console session client")]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Backend base URL (overrides config)
    #[arg(long, global = true, env = "SMARTIO_BASE_URL")]
    base_url: Option<String>,

    /// Where the access token is kept
    #[arg(long, global = true, value_enum, default_value_t = StoreKind::File)]
    store: StoreKind,

    /// Also write logs to this file
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Sign in and open the dashboard
    Login {
        /// Username to offer at the prompt
        #[arg(short, long, env = "SMARTIO_USERNAME")]
        username: Option<String>,
    },

    /// Open the dashboard with the stored token
    Dashboard {
        /// Stop instead of showing the login form when the session is gone
        #[arg(long)]
        no_follow: bool,
    },

    /// Drop the stored token
    Logout,

    /// Report whether a token is stored, without checking it
    Status,

    /// GET an admin API path with the stored token and print the JSON
    Fetch {
        /// API path, e.g. /api/admin/clients/
        path: String,
    },
}

/// Initialize the tracing subscriber for logging
fn init_tracing(log_file: Option<&PathBuf>) -> Result<Option<WorkerGuard>> {
    // Use RUST_LOG env var to control log level (e.g., RUST_LOG=debug)
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    let (file_layer, guard) = match log_file {
        Some(path) => {
            let dir = path.parent().filter(|p| !p.as_os_str().is_empty());
            let name = path
                .file_name()
                .context("Log file path has no file name")?;
            let appender = tracing_appender::rolling::never(
                dir.unwrap_or_else(|| std::path::Path::new(".")),
                name,
            );
            let (writer, guard) = tracing_appender::non_blocking(appender);
            (
                Some(fmt::layer().with_ansi(false).with_writer(writer)),
                Some(guard),
            )
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(file_layer)
        .with(filter)
        .init();

    Ok(guard)
}

fn load_config(cli: &Cli) -> Result<Config> {
    let mut config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load().unwrap_or_else(|e| {
            warn!(error = %e, "Failed to load config, using defaults");
            Config::default()
        }),
    };
    if let Some(ref base_url) = cli.base_url {
        config.base_url = base_url.clone();
    }
    Ok(config)
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();
    let _log_guard = init_tracing(cli.log_file.as_ref())?;

    let config = load_config(&cli)?;
    info!(base_url = %config.base_url, store = ?cli.store, "smartio-admin starting");

    let store = Storage::open(cli.store)?;
    let transport = HttpClient::new(&config)?;

    match cli.command {
        Commands::Login { username } => {
            let mut console = Console::new(&transport, &store, &config).with_username(username);
            console.run(&config.login_path).await?;
            Ok(ExitCode::SUCCESS)
        }
        Commands::Dashboard { no_follow } => {
            let mut console =
                Console::new(&transport, &store, &config).follow_to_login(!no_follow);
            match console.run(&config.dashboard_path).await? {
                Visit::Stayed => Ok(ExitCode::SUCCESS),
                Visit::Navigated(_) => {
                    eprintln!("Not signed in. Run `smartio-admin login`.");
                    Ok(ExitCode::FAILURE)
                }
            }
        }
        Commands::Logout => match Console::new(&transport, &store, &config).logout() {
            Ok(_) => {
                println!("Logged out");
                Ok(ExitCode::SUCCESS)
            }
            Err(e) => {
                eprintln!("Logout failed: {:#}", e);
                Ok(ExitCode::FAILURE)
            }
        },
        Commands::Status => {
            println!("{}", store.describe(&config.storage_key)?);
            Ok(ExitCode::SUCCESS)
        }
        Commands::Fetch { path } => {
            let client = AuthorizedClient::new(&transport, &store, &config);
            match client.get_json::<serde_json::Value>(&path).await? {
                Fetched::Data(value) => {
                    println!("{}", serde_json::to_string_pretty(&value)?);
                    Ok(ExitCode::SUCCESS)
                }
                Fetched::Redirect { .. } => {
                    eprintln!("Session expired or missing. Run `smartio-admin login`.");
                    Ok(ExitCode::FAILURE)
                }
            }
        }
    }
}
