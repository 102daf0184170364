use crate::acpi::reader::DEFAULT_ACPID_SOCKET;
use crate::error::App;
use crate::player::ControlAddress;
use clap::Parser;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// MPD socket location relative to `$XDG_RUNTIME_DIR`.
const MPD_SOCKET_SUFFIX: &str = "mpd/socket";

const DEFAULT_TIMEOUT_SECS: u64 = 30;

#[derive(Parser, Debug)]
#[command(
    name = "acpi-mpd",
    about = "Forward acpid media-key events to MPD.",
    version
)]
pub struct Cli {
    #[arg(
        short = 'a',
        long = "host",
        value_name = "HOST",
        help = "MPD address: [password@]/path/to/socket or [password@]host[:port] (default: $XDG_RUNTIME_DIR/mpd/socket)"
    )]
    pub host: Option<ControlAddress>,

    #[arg(
        short = 's',
        long = "socket",
        value_name = "PATH",
        default_value = DEFAULT_ACPID_SOCKET,
        help = "acpid socket to listen on"
    )]
    pub socket: PathBuf,

    #[arg(
        short = 't',
        long = "timeout",
        value_name = "SECS",
        default_value_t = DEFAULT_TIMEOUT_SECS,
        value_parser = clap::value_parser!(u64).range(1..),
        help = "Give up on an MPD round trip after this many seconds"
    )]
    pub timeout: u64,

    #[arg(short = 'v', long = "verbose", help = "Log every acpid event")]
    pub verbose: bool,
}

impl Cli {
    /// The `-a` address, or the MPD socket under `runtime_dir`.
    pub fn control_address(&self, runtime_dir: Option<&Path>) -> Result<ControlAddress, App> {
        if let Some(host) = &self.host {
            return Ok(host.clone());
        }
        runtime_dir
            .map(|dir| ControlAddress::unix(dir.join(MPD_SOCKET_SUFFIX)))
            .ok_or_else(|| {
                App::Config("XDG_RUNTIME_DIR is not set; pass the MPD address with -a".to_string())
            })
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout)
    }
}
