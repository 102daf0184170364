use super::{Connector, MpdCommand, PlayState, PlayerControl, PlayerError};
use log::{debug, info, warn};
use mpd::Client;
use nix::sys::socket::{setsockopt, sockopt};
use std::fmt;
use std::io::{self, ErrorKind, Read, Write};
use std::net::{TcpStream, ToSocketAddrs};
use std::os::fd::AsFd;
use std::os::unix::net::UnixStream;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

pub const DEFAULT_PORT: u16 = 6600;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Endpoint {
    Unix(PathBuf),
    Tcp { host: String, port: u16 },
}

/// Where MPD listens, as given to `-a`: `/path/to/socket` or
/// `[password@]host[:port]`.
#[derive(Clone, PartialEq, Eq)]
pub struct ControlAddress {
    endpoint: Endpoint,
    password: Option<String>,
}

impl ControlAddress {
    pub fn unix(path: impl Into<PathBuf>) -> Self {
        Self {
            endpoint: Endpoint::Unix(path.into()),
            password: None,
        }
    }

    pub fn password(&self) -> Option<&str> {
        self.password.as_deref()
    }
}

impl FromStr for ControlAddress {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        // A socket path is taken verbatim, '@' included.
        if s.starts_with('/') {
            return Ok(Self::unix(s));
        }

        let (password, rest) = match s.split_once('@') {
            Some((pw, rest)) if !pw.is_empty() => (Some(pw.to_string()), rest),
            _ => (None, s),
        };
        if rest.is_empty() {
            return Err(format!("empty MPD host in {s:?}"));
        }

        let endpoint = match rest.rsplit_once(':') {
            Some((host, port)) if !host.is_empty() && !host.contains(':') => Endpoint::Tcp {
                host: host.to_string(),
                port: port
                    .parse()
                    .map_err(|_| format!("invalid MPD port {port:?}"))?,
            },
            _ => Endpoint::Tcp {
                host: rest.to_string(),
                port: DEFAULT_PORT,
            },
        };

        Ok(Self { endpoint, password })
    }
}

impl fmt::Display for ControlAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.endpoint {
            Endpoint::Unix(path) => write!(f, "{}", path.display()),
            Endpoint::Tcp { host, port } => write!(f, "{host}:{port}"),
        }
    }
}

// Keeps the password out of logs.
impl fmt::Debug for ControlAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ControlAddress")
            .field("endpoint", &self.endpoint)
            .field("password", &self.password.as_ref().map(|_| "***"))
            .finish()
    }
}

trait Stream: Read + Write + Send {}
impl<T: Read + Write + Send> Stream for T {}

fn enable_keepalive<F: AsFd>(socket: &F) {
    if let Err(e) = setsockopt(socket, sockopt::KeepAlive, &true) {
        warn!("KeepAlive not enabled: {e}");
    }
}

fn connect_unix(path: &Path, timeout: Duration) -> io::Result<UnixStream> {
    let stream = UnixStream::connect(path)?;
    stream.set_read_timeout(Some(timeout))?;
    stream.set_write_timeout(Some(timeout))?;
    enable_keepalive(&stream);
    Ok(stream)
}

fn connect_tcp(host: &str, port: u16, timeout: Duration) -> io::Result<TcpStream> {
    let mut last_error = None;
    for addr in (host, port).to_socket_addrs()? {
        match TcpStream::connect_timeout(&addr, timeout) {
            Ok(stream) => {
                stream.set_read_timeout(Some(timeout))?;
                stream.set_write_timeout(Some(timeout))?;
                enable_keepalive(&stream);
                return Ok(stream);
            }
            Err(e) => last_error = Some(e),
        }
    }
    Err(last_error.unwrap_or_else(|| {
        io::Error::new(ErrorKind::NotFound, format!("{host} did not resolve"))
    }))
}

/// One live connection to MPD.
pub struct MpdConnection {
    client: Client<Box<dyn Stream>>,
    timeout: Duration,
}

impl MpdConnection {
    /// Connects, reads the greeting and logs in if the address carries a
    /// password. Socket reads and writes are bounded by `timeout`.
    pub fn connect(address: &ControlAddress, timeout: Duration) -> Result<Self, PlayerError> {
        let stream = match &address.endpoint {
            Endpoint::Unix(path) => {
                connect_unix(path, timeout).map(|s| Box::new(s) as Box<dyn Stream>)
            }
            Endpoint::Tcp { host, port } => {
                connect_tcp(host, *port, timeout).map(|s| Box::new(s) as Box<dyn Stream>)
            }
        }
        .map_err(|e| PlayerError::Connect(address.to_string(), e))?;

        let client = classify(Client::new(stream), timeout)?;
        let mut conn = Self { client, timeout };
        if let Some(password) = address.password() {
            conn.check(|client| client.login(password))?;
        }
        Ok(conn)
    }

    fn check<T>(
        &mut self,
        call: impl FnOnce(&mut Client<Box<dyn Stream>>) -> mpd::error::Result<T>,
    ) -> Result<T, PlayerError> {
        classify(call(&mut self.client), self.timeout)
    }
}

/// Socket timeouts surface from the client as I/O errors.
fn classify<T>(result: mpd::error::Result<T>, timeout: Duration) -> Result<T, PlayerError> {
    result.map_err(|e| match e {
        mpd::error::Error::Io(io)
            if matches!(io.kind(), ErrorKind::WouldBlock | ErrorKind::TimedOut) =>
        {
            PlayerError::Timeout(timeout)
        }
        other => PlayerError::Mpd(other),
    })
}

impl PlayerControl for MpdConnection {
    fn state(&mut self) -> Result<PlayState, PlayerError> {
        self.check(|client| client.status().map(|status| status.state))
    }

    fn run(&mut self, command: MpdCommand) -> Result<(), PlayerError> {
        debug!("MPD <- {}", command.name());
        self.check(|client| match command {
            MpdCommand::Play => client.play(),
            MpdCommand::TogglePause => client.toggle_pause(),
            MpdCommand::Stop => client.stop(),
            MpdCommand::Previous => client.prev(),
            MpdCommand::Next => client.next(),
        })
    }

    fn close(mut self) {
        if let Err(e) = self.client.close() {
            debug!("MPD close failed: {e}");
        }
    }
}

/// Opens [`MpdConnection`]s to a fixed address.
#[derive(Debug, Clone)]
pub struct MpdConnector {
    address: ControlAddress,
    timeout: Duration,
}

impl MpdConnector {
    pub fn new(address: ControlAddress, timeout: Duration) -> Self {
        Self { address, timeout }
    }
}

impl Connector for MpdConnector {
    type Control = MpdConnection;

    fn connect(&self) -> Result<MpdConnection, PlayerError> {
        let conn = MpdConnection::connect(&self.address, self.timeout)?;
        info!("Connected to MPD at {}", self.address);
        Ok(conn)
    }
}
