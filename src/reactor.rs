//! Reactor lifecycle observation.

use std::collections::VecDeque;
use std::time::Duration;

use tracing::trace;

use crate::shared::{Action, Command};

/// I/O poll timeout installed on the reactor at startup.
///
/// Keeps the event loop responsive to work queued from outside the reactor
/// thread between socket wake-ups.
pub const IO_POLL_TIMEOUT: Duration = Duration::from_millis(20);

/// Lifecycle events raised by the reactor itself.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum ReactorEvent {
    /// The reactor is about to enter its first poll iteration
    Init,
    /// The reactor has drained its work and is shutting down
    Final,
}

/// Observes reactor startup and shutdown.
///
/// Startup installs the I/O poll timeout; shutdown is diagnostic only.
#[derive(Debug, Default)]
pub struct ReactorHandler {
    actions: VecDeque<Action>,
}

impl ReactorHandler {
    /// Construct a reactor handler.
    pub fn new() -> Self {
        Self::default()
    }

    /// Consume one reactor event.
    pub fn handle_event(&mut self, event: ReactorEvent) {
        match event {
            ReactorEvent::Init => {
                trace!(timeout = ?IO_POLL_TIMEOUT, "reactor init");
                self.actions
                    .push_back(Action::Command(Command::SetIoPollTimeout(IO_POLL_TIMEOUT)));
            }
            ReactorEvent::Final => {
                trace!("reactor final");
            }
        }
    }

    /// Drain queued actions in emission order.
    pub fn poll(&mut self) -> Option<Action> {
        self.actions.pop_front()
    }
}
