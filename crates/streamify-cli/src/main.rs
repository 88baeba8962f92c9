//! Streamify CLI - sign in to the identity provider and inspect the session.
//!
//! A thin front end over `streamify-core`: it builds the session manager,
//! rehydrates the stored session, and runs one command against it.

mod app;

use std::io;

use anyhow::{bail, Result};
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use app::App;

/// Directory for an optional log file
const LOG_DIR_ENV: &str = "STREAMIFY_LOG_DIR";

const USAGE: &str = "\
Usage: streamify <command>

Commands:
  login [username]              Sign in with the identity provider
  logout                        Sign out and forget the stored session
  status [--verify]             Show the current session
  theme [light|dark|system]     Show or set the theme preference
  open <path>                   Navigate to a route, e.g. /saved or /movies/550";

/// Initialize the tracing subscriber for logging
fn init_tracing() -> Option<WorkerGuard> {
    // Use RUST_LOG env var to control log level (e.g., RUST_LOG=debug)
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    let (file_layer, guard) = match std::env::var(LOG_DIR_ENV) {
        Ok(dir) if !dir.is_empty() => {
            let appender = tracing_appender::rolling::daily(dir, "streamify.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            (
                Some(fmt::layer().with_writer(writer).with_ansi(false)),
                Some(guard),
            )
        }
        _ => (None, None),
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(file_layer)
        .with(filter)
        .init();

    guard
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    let _log_guard = init_tracing();

    let args: Vec<String> = std::env::args().collect();
    let command = args.get(1).map(String::as_str);
    let arg = args.get(2).map(String::as_str);

    info!(command = ?command, "Streamify starting");

    match command {
        Some("login") => App::new().await?.login(arg.map(str::to_string)).await,
        Some("logout") => App::new().await?.logout().await,
        Some("status") => App::new().await?.status(arg == Some("--verify")).await,
        Some("theme") => app::theme(arg),
        Some("open") => match arg {
            Some(path) => App::new().await?.open(path),
            None => bail!("open needs a path\n\n{}", USAGE),
        },
        Some("help") | Some("--help") | Some("-h") | None => {
            println!("{}", USAGE);
            Ok(())
        }
        Some(other) => bail!("Unknown command: {}\n\n{}", other, USAGE),
    }
}
