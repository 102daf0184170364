use crate::acpi::{map_event, EventSource};
use crate::error::App;
use crate::player::{Connector, PlayerSession, SessionState};
use log::{debug, info};
use std::future::Future;

/// Forwards recognized acpid events to MPD, one at a time.
pub struct Bridge<E: EventSource, C: Connector> {
    events: E,
    session: PlayerSession<C>,
}

impl<E: EventSource, C: Connector> Bridge<E, C> {
    pub fn new(events: E, session: PlayerSession<C>) -> Self {
        Self { events, session }
    }

    /// Only returns on a fatal error: the acpid socket failed, or a command
    /// still failed after all of its retries.
    pub async fn run(&mut self) -> Result<(), App> {
        loop {
            let payload = self.events.wait_for_event().await?;
            let Some(command) = map_event(&payload) else {
                debug!("Ignoring event {payload:?}");
                continue;
            };
            info!("Event {payload:?} -> {command:?}");
            self.session.execute(command)?;
        }
    }

    /// Runs until a fatal error or until `shutdown` resolves with the name of
    /// the signal that stopped us. Both connections are released either way.
    pub async fn run_until(
        mut self,
        shutdown: impl Future<Output = &'static str>,
    ) -> Result<(), App> {
        let result = tokio::select! {
            result = self.run() => result,
            name = shutdown => {
                info!("Received {name}, shutting down");
                Ok(())
            }
        };
        self.shutdown();
        result
    }

    /// Releases both connections.
    pub fn shutdown(self) {
        let Self {
            events,
            mut session,
        } = self;
        if session.state() == SessionState::Connected {
            info!("Closing MPD connection");
        }
        session.close();
        drop(events);
    }
}
