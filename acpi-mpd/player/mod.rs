//! MPD side of the bridge.
//!
//! - `connection.rs` - one live `mpd::Client` over a Unix socket or TCP
//! - `session.rs` - connection ownership, command dispatch and reconnect

mod connection;
mod session;

use std::time::Duration;
use thiserror::Error;

pub use connection::{ControlAddress, MpdConnector};
pub use mpd::status::State as PlayState;
pub use session::{PlayerSession, SessionState};

#[cfg(test)]
pub(crate) use session::{tests as fakes, RETRY_BUDGET};

#[derive(Error, Debug)]
pub enum PlayerError {
    #[error("Connection to {0} failed: {1}")]
    Connect(String, std::io::Error),
    #[error("No reply within {0:?}")]
    Timeout(Duration),
    #[error("{0}")]
    Mpd(#[from] mpd::error::Error),
    #[error("Not connected")]
    NotConnected,
}

/// Playback requests the bridge can issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MpdCommand {
    Play,
    TogglePause,
    Stop,
    Previous,
    Next,
}

impl MpdCommand {
    pub fn name(self) -> &'static str {
        match self {
            Self::Play => "play",
            Self::TogglePause => "pause",
            Self::Stop => "stop",
            Self::Previous => "previous",
            Self::Next => "next",
        }
    }
}

/// A live control connection that can run commands.
pub trait PlayerControl {
    /// Runs `status` and returns the current playback state.
    fn state(&mut self) -> Result<PlayState, PlayerError>;

    fn run(&mut self, command: MpdCommand) -> Result<(), PlayerError>;

    /// Releases the connection.
    fn close(self);
}

/// Opens new control connections on demand.
pub trait Connector {
    type Control: PlayerControl;

    fn connect(&self) -> Result<Self::Control, PlayerError>;
}
