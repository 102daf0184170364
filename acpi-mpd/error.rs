use crate::acpi::Command;
use crate::player::PlayerError;
use flexi_logger::FlexiLoggerError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum App {
    #[error("Can't open acpid socket {}: {}", .path.display(), .reason)]
    Unreachable { path: PathBuf, reason: String },

    #[error("acpid socket I/O failed: {0}")]
    NotificationIo(#[from] std::io::Error),

    #[error("acpid closed the connection")]
    NotificationClosed,

    #[error("MPD error: {0}")]
    Player(#[from] PlayerError),

    #[error("Giving up on {command:?} after {attempts} attempts")]
    CommandFailed { command: Command, attempts: u32 },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Logger initialization error: {0}")]
    Logger(#[from] FlexiLoggerError),
}
