use crate::acpi::event::{EventPayload, MAX_EVENT_SIZE};
use crate::error::App;
use log::{debug, info};
use std::future::Future;
use std::io::ErrorKind;
use std::path::Path;
use tokio::net::UnixStream;

/// `sun_path` holds 108 bytes including the trailing NUL.
pub const MAX_SOCKET_PATH_LEN: usize = 107;

pub const DEFAULT_ACPID_SOCKET: &str = "/var/run/acpid.socket";

/// Something the bridge can wait on for the next event.
pub trait EventSource {
    fn wait_for_event(&mut self) -> impl Future<Output = Result<EventPayload, App>>;
}

/// Long-lived connection to the acpid notification socket.
///
/// Opened once at startup and never reopened: if acpid goes away the
/// daemon has nothing left to do.
#[derive(Debug)]
pub struct AcpiReader {
    stream: UnixStream,
}

impl AcpiReader {
    /// Connects to the acpid socket at `path`. The path length is checked
    /// before any socket is created.
    pub async fn open(path: &Path) -> Result<Self, App> {
        let len = path.as_os_str().len();
        if len > MAX_SOCKET_PATH_LEN {
            return Err(App::Unreachable {
                path: path.to_path_buf(),
                reason: format!("path is {len} bytes, limit is {MAX_SOCKET_PATH_LEN}"),
            });
        }

        // tokio sockets are non-blocking and close-on-exec.
        let stream = UnixStream::connect(path)
            .await
            .map_err(|e| App::Unreachable {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })?;

        info!("Listening for acpid events on {}", path.display());
        Ok(Self { stream })
    }
}

impl EventSource for AcpiReader {
    /// Waits for readability, then does a single read of at most
    /// [`MAX_EVENT_SIZE`] bytes. acpid writes whole lines, so no
    /// reassembly across reads is attempted.
    async fn wait_for_event(&mut self) -> Result<EventPayload, App> {
        let mut buf = [0u8; MAX_EVENT_SIZE];
        loop {
            self.stream.readable().await?;
            match self.stream.try_read(&mut buf) {
                Ok(0) => return Err(App::NotificationClosed),
                Ok(n) => {
                    let payload = EventPayload::new(&buf[..n]);
                    debug!("acpid event: {payload:?}");
                    return Ok(payload);
                }
                // Spurious wakeup, readiness was cleared.
                Err(e) if e.kind() == ErrorKind::WouldBlock => continue,
                Err(e) => return Err(App::NotificationIo(e)),
            }
        }
    }
}
