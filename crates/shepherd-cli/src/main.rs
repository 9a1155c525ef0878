//! Shepherd - a command-line front end for church home groups.
//!
//! Manages role hierarchies, meeting attendance and member listings against
//! the church-management API, with an offline cache for read-only use.

mod app;
mod cli;
mod commands;
mod render;

use std::io;
use std::process::ExitCode;

use clap::Parser;
use shepherd_core::Config;
use tracing::{debug, info};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use app::App;
use cli::Cli;

/// Log file prefix inside `<state_dir>/logs`
const LOG_FILE_PREFIX: &str = "shepherd.log";

/// Initialize the tracing subscriber for logging.
///
/// `RUST_LOG` controls the level (default `warn`). Logs go to stderr and to a
/// daily file under the state directory; the returned guard flushes the file
/// writer on drop.
fn init_tracing() -> Option<WorkerGuard> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    let file = Config::state_dir().ok().map(|dir| {
        let appender = tracing_appender::rolling::daily(dir.join("logs"), LOG_FILE_PREFIX);
        tracing_appender::non_blocking(appender)
    });

    match file {
        Some((writer, guard)) => {
            tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer().with_writer(io::stderr))
                .with(fmt::layer().with_ansi(false).with_writer(writer))
                .init();
            Some(guard)
        }
        None => {
            tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer().with_writer(io::stderr))
                .init();
            None
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();
    let _log_guard = init_tracing();
    info!("Shepherd starting");

    let mut app = match App::new(cli.offline) {
        Ok(app) => app,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            return ExitCode::FAILURE;
        }
    };

    match commands::run(&mut app, cli.command).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            if app.handle_unauthorized(&e) {
                eprintln!("Session expired. Run `shepherd login` to sign in again.");
            } else {
                debug!(error = ?e, "Command failed");
                eprintln!("Error: {:#}", e);
            }
            ExitCode::FAILURE
        }
    }
}
