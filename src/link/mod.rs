//! Link lifecycle handling.
//!
//! [`LinkHandler`] carries the teardown behavior every link type shares:
//! answering a remote close or detach, reporting the failure to the owner,
//! and closing the owning session so a torn-down link never leaves an open
//! session behind. Sender-specific behavior lives in
//! [`SenderHandler`](crate::SenderHandler), which embeds this handler.

use std::collections::VecDeque;

use bytes::Bytes;
use tracing::{debug, trace};

use crate::condition::{DeliveryState, ErrorCondition, LinkFailure, LocalError};
use crate::shared::{Action, Command, Notice};
use crate::EndpointState;

mod sender;
pub use sender::SenderHandler;

/// Link lifecycle events raised by the engine.
#[derive(Debug, Clone, Eq, PartialEq)]
pub enum LinkEvent {
    /// The local endpoint issued its attach
    LocalOpen,
    /// The local endpoint finished closing
    LocalClose {
        /// Owning session's local endpoint state, while the session exists
        session: Option<EndpointState>,
    },
    /// The peer's attach arrived
    RemoteOpen {
        /// Target echoed by the peer, if it supplied one
        target: Option<Target>,
    },
    /// The peer closed the link
    RemoteClose {
        /// Peer-supplied error condition, if any
        error: Option<ErrorCondition>,
        /// Link's local endpoint state when the close arrived
        local: EndpointState,
        /// Owning session's local endpoint state, while the session exists
        session: Option<EndpointState>,
    },
    /// The peer detached the link
    RemoteDetach {
        /// Peer-supplied error condition, if any
        error: Option<ErrorCondition>,
        /// Link's local endpoint state when the detach arrived
        local: EndpointState,
        /// Owning session's local endpoint state, while the session exists
        session: Option<EndpointState>,
    },
    /// The peer updated this sender's credit
    Flow {
        /// Remote-granted credit now available
        credit: u32,
    },
    /// One or more deliveries reached a remotely-updated state
    Delivery {
        /// Pending deliveries in the engine's chain order
        deliveries: Vec<Delivery>,
    },
}

/// Terminus descriptor echoed by the peer on attach.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Target {
    /// Node address the peer confirmed, if it named one
    pub address: Option<String>,
}

/// One in-flight delivery surfaced by a delivery event.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Delivery {
    /// Engine-assigned tag identifying the delivery on its link
    pub tag: Bytes,
    /// State reported by the peer, if it has updated one
    pub remote_state: Option<DeliveryState>,
}

/// Teardown behavior shared by every link type.
#[derive(Debug)]
pub struct LinkHandler {
    name: String,
    actions: VecDeque<Action>,
}

impl LinkHandler {
    /// Construct a handler for the link named `name`.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            actions: VecDeque::new(),
        }
    }

    /// Link name used in diagnostics.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Consume one link event.
    ///
    /// Only teardown events have shared behavior; open, flow, and delivery
    /// events are link-type specific and ignored here.
    pub fn handle_event(&mut self, event: LinkEvent) {
        match event {
            LinkEvent::LocalClose { session } => {
                trace!(link = %self.name, "link local close");
                self.close_session(session);
            }
            LinkEvent::RemoteClose {
                error,
                local,
                session,
            } => {
                debug!(link = %self.name, error = ?error, "link remote close");
                self.teardown(error, local, session);
            }
            LinkEvent::RemoteDetach {
                error,
                local,
                session,
            } => {
                debug!(link = %self.name, error = ?error, "link remote detach");
                self.teardown(error, local, session);
            }
            _ => {}
        }
    }

    /// Report a locally-raised failure to the owner.
    ///
    /// The second close-reporting channel: remote conditions arrive through
    /// close and detach events, local failures through this call.
    pub fn fail(&mut self, error: LocalError) {
        debug!(link = %self.name, %error, "link local failure");
        self.notify(Notice::LinkClosed(Some(LinkFailure::Local(error))));
    }

    /// Drain queued actions in emission order.
    pub fn poll(&mut self) -> Option<Action> {
        self.actions.pop_front()
    }

    // answer the peer if we have not closed yet, report, then clean up
    fn teardown(
        &mut self,
        error: Option<ErrorCondition>,
        local: EndpointState,
        session: Option<EndpointState>,
    ) {
        if !local.is_closed() {
            self.push(Command::CloseLink);
        }
        self.notify(Notice::LinkClosed(error.map(LinkFailure::Remote)));
        self.close_session(session);
    }

    // a teardown never leaves an orphaned open session
    fn close_session(&mut self, session: Option<EndpointState>) {
        if let Some(state) = session {
            if !state.is_closed() {
                self.push(Command::CloseSession);
            }
        }
    }

    pub(crate) fn push(&mut self, command: Command) {
        self.actions.push_back(Action::Command(command));
    }

    pub(crate) fn notify(&mut self, notice: Notice) {
        self.actions.push_back(Action::Notice(notice));
    }
}
