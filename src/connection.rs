//! Connection lifecycle handling.

use std::collections::VecDeque;

use rand::Rng;
use tracing::{debug, trace, warn};

use crate::condition::ErrorCondition;
use crate::shared::{Action, Command, ConnectionProperties, Notice, OpenConfig};
use crate::transport::{TransportLayer, TransportOptions};
use crate::EndpointState;

/// Configuration for a connection handler.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct ConnectionOptions {
    hostname: String,
    transport: TransportOptions,
}

impl ConnectionOptions {
    /// Options for connecting to `hostname`.
    pub fn new(hostname: impl Into<String>) -> Self {
        Self {
            hostname: hostname.into(),
            transport: TransportOptions::default(),
        }
    }

    /// Transport decorators to apply when the transport binds.
    pub fn transport(&mut self, transport: TransportOptions) -> &mut Self {
        self.transport = transport;
        self
    }

    /// Host name these options connect to.
    pub fn hostname(&self) -> &str {
        &self.hostname
    }

    /// Port the owner dials for these options.
    pub fn port(&self) -> u16 {
        self.transport.port()
    }

    /// Largest frame the owner may negotiate on the assembled transport.
    pub fn max_frame_size(&self) -> u32 {
        self.transport.max_frame_size()
    }
}

/// Connection lifecycle events raised by the engine.
///
/// Events carry the engine-state snapshots their transitions read, so
/// handling stays a pure function of handler configuration and event.
#[derive(Debug, Clone, Eq, PartialEq)]
pub enum ConnectionEvent {
    /// The connection object was created and needs identity before opening
    Init {
        /// Address the reactor resolved for this connection
        address: String,
    },
    /// A transport was bound to the connection; decorators, TLS and SASL go
    /// on now
    Bound,
    /// The transport was unbound from the connection
    Unbound {
        /// Local endpoint state at unbind
        local: EndpointState,
        /// Remote endpoint state at unbind
        remote: EndpointState,
    },
    /// The transport failed
    TransportError {
        /// Condition describing the failure, if the transport supplied one
        error: Option<ErrorCondition>,
        /// Whether the engine still holds the connection handle
        connection_present: bool,
    },
    /// The peer's open arrived
    RemoteOpen,
    /// The peer's close arrived
    RemoteClose {
        /// Peer-supplied error condition, if any
        error: Option<ErrorCondition>,
        /// Local endpoint state when the close arrived
        local: EndpointState,
        /// Whether the engine has already released the connection handle
        freed: bool,
    },
    /// The local endpoint finished closing
    LocalClose {
        /// Remote endpoint state at local close
        remote: EndpointState,
        /// Whether the engine has already released the connection handle
        freed: bool,
    },
    /// The connection reached the end of its lifecycle; its transport is
    /// released
    Final,
}

/// Connection lifecycle handling.
///
/// Brings a connection from initialization through transport layering to
/// open, reports remote closes and transport errors to the owner, and
/// releases the connection handle exactly once. Stateless apart from its
/// action queue: every transition reads only the handler's configuration and
/// the event's snapshot of engine state.
#[derive(Debug)]
pub struct ConnectionHandler {
    options: ConnectionOptions,
    actions: VecDeque<Action>,
}

impl ConnectionHandler {
    /// Construct a handler for `options`.
    pub fn new(options: ConnectionOptions) -> Self {
        Self {
            options,
            actions: VecDeque::new(),
        }
    }

    /// Consume one connection event.
    pub fn handle_event(&mut self, event: ConnectionEvent) {
        match event {
            ConnectionEvent::Init { address } => {
                let config = OpenConfig {
                    hostname: address,
                    container_id: container_id(),
                    properties: ConnectionProperties::default(),
                };
                debug!(
                    hostname = %config.hostname,
                    container = %config.container_id,
                    "connection init"
                );
                self.push(Command::OpenConnection(config));
            }
            ConnectionEvent::Bound => {
                debug!(hostname = %self.options.hostname, "transport bound");
                for layer in self.options.transport.layers(&self.options.hostname) {
                    self.push(match layer {
                        TransportLayer::Tls(domain) => Command::BindTls(domain),
                        TransportLayer::Sasl(mechanism) => Command::ConfigureSasl(mechanism),
                        decorator => Command::AddTransportLayer(decorator),
                    });
                }
            }
            ConnectionEvent::Unbound { local, remote } => {
                trace!(hostname = %self.options.hostname, ?local, ?remote, "transport unbound");
            }
            ConnectionEvent::TransportError {
                error,
                connection_present,
            } => {
                warn!(hostname = %self.options.hostname, error = ?error, "transport error");
                self.notify(Notice::TransportError(error));
                // terminal immediately: no close acknowledgment can arrive on
                // a dead transport
                if connection_present {
                    self.push(Command::FreeConnection);
                }
            }
            ConnectionEvent::RemoteOpen => {
                debug!(hostname = %self.options.hostname, "connection remote open");
                self.notify(Notice::OpenComplete);
            }
            ConnectionEvent::RemoteClose {
                error,
                local,
                freed,
            } => {
                debug!(hostname = %self.options.hostname, error = ?error, "connection remote close");
                let local = if local.is_closed() {
                    local
                } else {
                    self.push(Command::CloseConnection);
                    EndpointState::Closed
                };
                self.notify(Notice::ConnectionClosed(error));
                self.free_if_both_closed(local, EndpointState::Closed, freed);
            }
            ConnectionEvent::LocalClose { remote, freed } => {
                trace!(hostname = %self.options.hostname, ?remote, "connection local close");
                self.free_if_both_closed(EndpointState::Closed, remote, freed);
            }
            ConnectionEvent::Final => {
                trace!(hostname = %self.options.hostname, "connection final");
                self.push(Command::UnbindTransport);
                self.push(Command::FreeTransport);
            }
        }
    }

    /// Drain queued actions in emission order.
    pub fn poll(&mut self) -> Option<Action> {
        self.actions.pop_front()
    }

    fn free_if_both_closed(&mut self, local: EndpointState, remote: EndpointState, freed: bool) {
        if free_when_closed(local, remote) && !freed {
            self.push(Command::FreeConnection);
        }
    }

    fn push(&mut self, command: Command) {
        self.actions.push_back(Action::Command(command));
    }

    fn notify(&mut self, notice: Notice) {
        self.actions.push_back(Action::Notice(notice));
    }
}

/// Whether the symmetric-free rule permits releasing the connection.
///
/// Freeing before the peer's close has been observed would race its
/// acknowledgment of ours.
fn free_when_closed(local: EndpointState, remote: EndpointState) -> bool {
    local.is_closed() && remote.is_closed()
}

// short random identity, fresh per connection attempt
fn container_id() -> String {
    format!("alc-{:08x}", rand::thread_rng().gen::<u32>())
}
