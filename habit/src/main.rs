//! `habit`: command-line client for the habit tracker task API.
//!
//! Configuration via CLI flags, environment variables, or config file
//! (`~/.config/habit/config.toml`).
//!
//! ```bash
//! # List every task
//! cargo run --bin habit
//!
//! # Tasks active today, against a remote API
//! cargo run --bin habit -- --api-url https://habits.example.com/api list --active
//!
//! # Or via environment variables
//! HABIT_API_URL=http://10.0.0.2:8080/api cargo run --bin habit -- rollover
//! ```

use std::io;
use std::path::Path;
use std::process::ExitCode;

use clap::Parser;
use tracing_appender::non_blocking::WorkerGuard;

use habit::api::HttpTaskApi;
use habit::cli;
use habit::config::{CliArgs, ClientConfig};
use habit::render::{self, Renderer};
use habit::store::TaskStore;

#[tokio::main]
async fn main() -> ExitCode {
    let args = CliArgs::parse();

    // CLI args > env > config file > defaults.
    // An explicit --config must load; a broken default file only warns.
    let config = match ClientConfig::load(&args) {
        Ok(c) => c,
        Err(e) if args.config.is_some() => {
            eprint!("{}", render::error_message(&e.to_string(), None));
            return ExitCode::FAILURE;
        }
        Err(e) => {
            eprintln!("Warning: failed to load config file: {e}");
            ClientConfig::from_cli(&args)
        }
    };

    // Logs go to a file so stdout carries only rendered output.
    let _log_guard = init_logging(&args.log_level, args.log_file.as_deref());

    tracing::info!(base_url = %config.api.base_url, "habit starting");

    let api = match HttpTaskApi::new(&config.api) {
        Ok(api) => api,
        Err(e) => {
            tracing::error!(error = %e, "failed to build API client");
            eprint!("{}", render::error_message(&e.to_string(), None));
            return ExitCode::FAILURE;
        }
    };
    let store = TaskStore::new(api);
    let renderer = Renderer::new(config.date_format.clone());

    let command = args.command.unwrap_or_default();
    let mut stdout = io::stdout();
    let result = cli::run(command, &store, &renderer, &mut stdout).await;

    match result {
        Ok(()) => {
            tracing::info!("habit exiting");
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::warn!(error = %e, "command failed");
            eprint!("{}", e.render());
            ExitCode::FAILURE
        }
    }
}

/// Initialize file-based logging.
///
/// Returns a [`WorkerGuard`] that must be held until shutdown to ensure all
/// buffered log entries are flushed.
fn init_logging(level: &str, file_path: Option<&Path>) -> Option<WorkerGuard> {
    let default_path = std::env::temp_dir().join("habit.log");
    let log_path = file_path.unwrap_or(&default_path);

    let log_dir = log_path.parent()?;
    let file_name = log_path.file_name()?.to_str()?;

    let file_appender = tracing_appender::rolling::never(log_dir, file_name);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_writer(non_blocking)
        .with_env_filter(env_filter)
        .with_ansi(false)
        .init();

    Some(guard)
}
