use std::fmt;

/// Largest acpid message read in one go. Longer messages are truncated.
pub const MAX_EVENT_SIZE: usize = 128;

/// Number of leading bytes compared against the signature table.
pub const PREFIX_LEN: usize = 14;

/// acpid event lines we react to, and what each one asks MPD to do.
const SIGNATURES: [(&[u8; PREFIX_LEN], Command); 4] = [
    (b"cd/play CDPLAY", Command::Play),
    (b"cd/stop CDSTOP", Command::Stop),
    (b"cd/prev CDPREV", Command::Previous),
    (b"cd/next CDNEXT", Command::Next),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Play,
    Stop,
    Previous,
    Next,
}

/// Raw bytes of a single read from the acpid socket.
#[derive(Clone, PartialEq, Eq)]
pub struct EventPayload {
    bytes: Vec<u8>,
}

impl EventPayload {
    pub fn new(bytes: &[u8]) -> Self {
        let len = bytes.len().min(MAX_EVENT_SIZE);
        Self {
            bytes: bytes[..len].to_vec(),
        }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }
}

impl fmt::Debug for EventPayload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", String::from_utf8_lossy(&self.bytes).trim_end())
    }
}

/// Maps an acpid payload to a playback command. Only the first
/// [`PREFIX_LEN`] bytes matter, anything after them is ignored.
pub fn map_event(payload: &EventPayload) -> Option<Command> {
    let bytes = payload.as_bytes();
    SIGNATURES
        .iter()
        .find(|(signature, _)| bytes.starts_with(&signature[..]))
        .map(|&(_, command)| command)
}
