pub mod event;
pub mod reader;

pub use event::{map_event, Command};
pub use reader::{AcpiReader, EventSource};
