use std::io::{self, BufWriter};
use std::process::ExitCode;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use clap::Parser;
use slack_history::{AppError, Cli, ExportConfig, Settings, commands};
use tracing::warn;
use tracing_subscriber::EnvFilter;

const EXIT_INTERRUPTED: u8 = 130;

fn init_logging(default_level: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .try_init();
}

fn run(cli: Cli) -> slack_history::Result<bool> {
    let settings = Settings::load_from(&cli.config)?;
    let config = ExportConfig::resolve(&cli, settings, |key| std::env::var(key).ok())?;
    init_logging(&config.log_level);

    let _ = rustls::crypto::aws_lc_rs::default_provider().install_default();

    let runtime = tokio::runtime::Runtime::new()?;
    let cancel = Arc::new(AtomicBool::new(false));
    let flag = cancel.clone();
    runtime.spawn(async move {
        if tokio::signal::ctrl_c().await.is_err() {
            return;
        }
        warn!("interrupted, stopping after the current request (Ctrl-C again to quit now)");
        flag.store(true, Ordering::Relaxed);
        if tokio::signal::ctrl_c().await.is_ok() {
            std::process::exit(EXIT_INTERRUPTED.into());
        }
    });

    let stdout = io::stdout();
    let summary = commands::run_export(
        &config,
        runtime.handle().clone(),
        cancel,
        BufWriter::new(stdout.lock()),
    )?;
    Ok(!summary.cancelled)
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) | Err(AppError::Cancelled) => ExitCode::from(EXIT_INTERRUPTED),
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}
