use super::{Connector, MpdCommand, PlayState, PlayerControl, PlayerError};
use crate::acpi::Command;
use crate::error::App;
use log::{info, warn};

/// Attempts per command before the daemon gives up.
pub const RETRY_BUDGET: u32 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Disconnected,
    Connecting,
    Connected,
    Failed,
}

/// Owns the one MPD control connection and hides transient disconnects
/// from the bridge by reconnecting between attempts.
pub struct PlayerSession<C: Connector> {
    connector: C,
    control: Option<C::Control>,
    state: SessionState,
}

impl<C: Connector> PlayerSession<C> {
    pub fn new(connector: C) -> Self {
        Self {
            connector,
            control: None,
            state: SessionState::Disconnected,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Replaces any live connection with a fresh one.
    pub fn open(&mut self) -> Result<(), PlayerError> {
        self.close();
        self.state = SessionState::Connecting;
        match self.connector.connect() {
            Ok(control) => {
                self.control = Some(control);
                self.state = SessionState::Connected;
                Ok(())
            }
            Err(e) => {
                self.state = SessionState::Failed;
                Err(e)
            }
        }
    }

    pub fn close(&mut self) {
        if let Some(control) = self.control.take() {
            control.close();
        }
        if self.state != SessionState::Failed {
            self.state = SessionState::Disconnected;
        }
    }

    /// Runs `command`, reconnecting after each failed attempt. Stops at the
    /// first success; fails once [`RETRY_BUDGET`] attempts are used up.
    pub fn execute(&mut self, command: Command) -> Result<(), App> {
        let mut budget = RETRY_BUDGET;
        let mut succeeded = false;

        while budget > 0 && !succeeded {
            match self.dispatch(command) {
                Ok(()) => succeeded = true,
                Err(e) => {
                    warn!("{command:?} failed: {e}, reconnecting");
                    self.reconnect();
                    budget -= 1;
                }
            }
        }

        if succeeded {
            Ok(())
        } else {
            Err(App::CommandFailed {
                command,
                attempts: RETRY_BUDGET,
            })
        }
    }

    fn dispatch(&mut self, command: Command) -> Result<(), PlayerError> {
        let control = self.control.as_mut().ok_or(PlayerError::NotConnected)?;
        let request = match command {
            Command::Play => match control.state()? {
                PlayState::Stop => MpdCommand::Play,
                PlayState::Play | PlayState::Pause => MpdCommand::TogglePause,
            },
            Command::Stop => MpdCommand::Stop,
            Command::Previous => MpdCommand::Previous,
            Command::Next => MpdCommand::Next,
        };
        info!("{command:?} -> {}", request.name());
        control.run(request)
    }

    /// Drops the current connection and opens a new one. A failed reopen
    /// still costs the caller its attempt.
    fn reconnect(&mut self) {
        self.state = SessionState::Disconnected;
        if let Err(e) = self.open() {
            warn!("Reconnect failed: {e}");
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::collections::VecDeque;
    use std::io;
    use std::rc::Rc;
    use std::time::Duration;

    /// What a scripted MPD did, shared between the test and its fakes.
    #[derive(Default)]
    pub(crate) struct Script {
        /// Result of each successive `run`; an empty queue means success.
        pub(crate) outcomes: VecDeque<bool>,
        pub(crate) state: Option<PlayState>,
        pub(crate) refuse_connect: bool,
        pub(crate) connects: u32,
        pub(crate) closes: u32,
        pub(crate) sent: Vec<MpdCommand>,
    }

    pub(crate) struct FakeControl(Rc<RefCell<Script>>);

    impl PlayerControl for FakeControl {
        fn state(&mut self) -> Result<PlayState, PlayerError> {
            self.0
                .borrow()
                .state
                .clone()
                .ok_or(PlayerError::NotConnected)
        }

        fn run(&mut self, command: MpdCommand) -> Result<(), PlayerError> {
            let mut script = self.0.borrow_mut();
            script.sent.push(command);
            if script.outcomes.pop_front().unwrap_or(true) {
                Ok(())
            } else {
                Err(PlayerError::Timeout(Duration::ZERO))
            }
        }

        fn close(self) {
            self.0.borrow_mut().closes += 1;
        }
    }

    #[derive(Clone, Default)]
    pub(crate) struct FakeConnector(pub(crate) Rc<RefCell<Script>>);

    impl Connector for FakeConnector {
        type Control = FakeControl;

        fn connect(&self) -> Result<FakeControl, PlayerError> {
            let mut script = self.0.borrow_mut();
            script.connects += 1;
            if script.refuse_connect {
                return Err(PlayerError::Connect(
                    "fake".into(),
                    io::Error::from(io::ErrorKind::ConnectionRefused),
                ));
            }
            Ok(FakeControl(Rc::clone(&self.0)))
        }
    }

    pub(crate) fn connected(script: Script) -> (PlayerSession<FakeConnector>, FakeConnector) {
        let connector = FakeConnector(Rc::new(RefCell::new(script)));
        let mut session = PlayerSession::new(connector.clone());
        session.open().unwrap();
        (session, connector)
    }

    #[test]
    fn starts_disconnected_then_connects() {
        let connector = FakeConnector::default();
        let mut session = PlayerSession::new(connector.clone());
        assert_eq!(session.state(), SessionState::Disconnected);

        session.open().unwrap();
        assert_eq!(session.state(), SessionState::Connected);

        session.close();
        assert_eq!(session.state(), SessionState::Disconnected);
        assert_eq!(connector.0.borrow().closes, 1);
    }

    #[test]
    fn refused_initial_connect_is_failed() {
        let connector = FakeConnector::default();
        connector.0.borrow_mut().refuse_connect = true;
        let mut session = PlayerSession::new(connector);

        assert!(session.open().is_err());
        assert_eq!(session.state(), SessionState::Failed);
    }

    #[test]
    fn play_starts_when_stopped() {
        let (mut session, connector) = connected(Script {
            state: Some(PlayState::Stop),
            ..Script::default()
        })
        ;

        session.execute(Command::Play).unwrap();
        assert_eq!(connector.0.borrow().sent, vec![MpdCommand::Play]);
    }

    #[test]
    fn play_toggles_pause_otherwise() {
        for state in [PlayState::Play, PlayState::Pause] {
            let (mut session, connector) = connected(Script {
                state: Some(state),
                ..Script::default()
            })
            ;

            session.execute(Command::Play).unwrap();
            assert_eq!(connector.0.borrow().sent, vec![MpdCommand::TogglePause]);
        }
    }

    #[test]
    fn direct_commands() {
        let (mut session, connector) = connected(Script::default());

        session.execute(Command::Stop).unwrap();
        session.execute(Command::Previous).unwrap();
        session.execute(Command::Next).unwrap();
        assert_eq!(
            connector.0.borrow().sent,
            vec![MpdCommand::Stop, MpdCommand::Previous, MpdCommand::Next]
        );
    }

    #[test]
    fn success_on_first_attempt_does_not_reconnect() {
        let (mut session, connector) = connected(Script::default());

        session.execute(Command::Next).unwrap();
        let script = connector.0.borrow();
        assert_eq!(script.connects, 1);
        assert_eq!(script.sent.len(), 1);
    }

    #[test]
    fn succeeds_on_third_attempt_after_two_reconnects() {
        let (mut session, connector) = connected(Script {
            outcomes: VecDeque::from([false, false, true]),
            ..Script::default()
        })
        ;

        session.execute(Command::Next).unwrap();
        let script = connector.0.borrow();
        assert_eq!(script.connects - 1, 2);
        assert_eq!(script.sent.len(), 3);
        assert_eq!(session.state(), SessionState::Connected);
    }

    #[test]
    fn gives_up_after_three_failures_and_three_reconnects() {
        let (mut session, connector) = connected(Script {
            outcomes: VecDeque::from([false, false, false, true]),
            ..Script::default()
        })
        ;

        let err = session.execute(Command::Stop).unwrap_err();
        assert!(matches!(
            err,
            App::CommandFailed {
                command: Command::Stop,
                attempts: RETRY_BUDGET
            }
        ));
        let script = connector.0.borrow();
        assert_eq!(script.connects - 1, 3);
        assert_eq!(script.sent.len(), 3);
    }

    #[test]
    fn failed_reconnect_still_consumes_attempt() {
        let (mut session, connector) = connected(Script {
            outcomes: VecDeque::from([false]),
            ..Script::default()
        })
        ;
        connector.0.borrow_mut().refuse_connect = true;

        assert!(session.execute(Command::Next).is_err());
        let script = connector.0.borrow();
        assert_eq!(script.sent.len(), 1);
        assert_eq!(script.connects - 1, RETRY_BUDGET);
        assert_eq!(session.state(), SessionState::Failed);
    }

    #[test]
    fn status_failure_counts_as_failed_attempt() {
        let (mut session, connector) = connected(Script::default());

        assert!(session.execute(Command::Play).is_err());
        let script = connector.0.borrow();
        assert!(script.sent.is_empty());
        assert_eq!(script.connects - 1, RETRY_BUDGET);
    }
}
