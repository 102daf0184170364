mod acpi;
mod bridge;
mod cli;
mod error;
mod player;

use crate::acpi::AcpiReader;
use crate::bridge::Bridge;
use crate::cli::Cli;
use crate::error::App;
use crate::player::{MpdConnector, PlayerSession};
use clap::Parser;
use flexi_logger::{Logger, LoggerHandle};
use log::{error, info, warn};
use std::path::PathBuf;
use std::process::ExitCode;
use tokio::signal::unix::{signal, SignalKind};

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let _logger = match init_logger(cli.verbose) {
        Ok(handle) => handle,
        Err(e) => {
            eprintln!("acpi-mpd: {e}");
            return ExitCode::FAILURE;
        }
    };

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            ExitCode::FAILURE
        }
    }
}

fn init_logger(verbose: bool) -> Result<LoggerHandle, App> {
    let level = if verbose { "debug" } else { "info" };
    Ok(Logger::try_with_env_or_str(level)?.log_to_stderr().start()?)
}

async fn run(cli: Cli) -> Result<(), App> {
    let reader = AcpiReader::open(&cli.socket).await?;

    let runtime_dir = std::env::var_os("XDG_RUNTIME_DIR").map(PathBuf::from);
    let address = cli.control_address(runtime_dir.as_deref())?;
    let mut session = PlayerSession::new(MpdConnector::new(address, cli.timeout()));
    session.open()?;

    info!("acpi-mpd v{} started", env!("CARGO_PKG_VERSION"));

    Bridge::new(reader, session)
        .run_until(shutdown_signal())
        .await
}

/// Resolves on SIGINT or SIGTERM.
async fn shutdown_signal() -> &'static str {
    let mut term = match signal(SignalKind::terminate()) {
        Ok(term) => term,
        Err(e) => {
            warn!("Can't listen for SIGTERM: {e}");
            return std::future::pending().await;
        }
    };
    tokio::select! {
        _ = term.recv() => "SIGTERM",
        Ok(()) = tokio::signal::ctrl_c() => "SIGINT",
    }
}
