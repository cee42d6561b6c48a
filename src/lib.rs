//! Protocol lifecycle logic for AMQP 1.0 client connections
//!
//! This crate contains a fully deterministic implementation of the lifecycle
//! rules for one AMQP 1.0 connection, session, and sending link. It contains
//! no networking code and performs no I/O: a protocol engine owning the
//! socket feeds lifecycle events into the handlers here, applies the engine
//! commands they queue, and forwards their notices to the owning client.
//!
//! The most important types are [`ConnectionHandler`], which takes a
//! connection from initialization through transport layering (proxy,
//! WebSocket, TLS, SASL) to open and guards its teardown, and
//! [`SenderHandler`], which completes a sending link's open exactly once,
//! surfaces credit for send flow control, and settles deliveries. Each
//! handler consumes events through `handle_event` and is drained through
//! `poll`; the drained [`Action`] order is part of the contract.

#![warn(missing_docs)]
#![cfg_attr(test, allow(dead_code))]

mod condition;
pub use crate::condition::{Condition, DeliveryState, ErrorCondition, LinkFailure, LocalError};

mod connection;
pub use crate::connection::{ConnectionEvent, ConnectionHandler, ConnectionOptions};

mod link;
pub use crate::link::{Delivery, LinkEvent, LinkHandler, SenderHandler, Target};

mod reactor;
pub use crate::reactor::{ReactorEvent, ReactorHandler, IO_POLL_TIMEOUT};

mod shared;
pub use crate::shared::{Action, Command, ConnectionProperties, Notice, OpenConfig};

#[cfg(test)]
mod tests;

mod transport;
pub use crate::transport::{
    PeerVerification, ProxyLayer, ProxyOptions, SaslMechanism, TlsDomain, TlsMode, TransportLayer,
    TransportOptions, WebSocketLayer, AMQPS_PORT, HTTPS_PORT, MAX_FRAME_SIZE,
    WEB_SOCKET_MAX_FRAME_SIZE, WEB_SOCKET_PATH, WEB_SOCKET_PROTOCOL,
};

/// Lifecycle state of one endpoint of a connection, session, or link.
///
/// Every entity has a local and a remote endpoint, each advancing
/// independently from uninitialized through active to closed.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum EndpointState {
    /// No open has been issued or observed
    Uninitialized,
    /// Open issued or observed, not yet closed
    Active,
    /// Close issued or observed
    Closed,
}

impl EndpointState {
    /// Whether this endpoint has closed.
    pub fn is_closed(self) -> bool {
        matches!(self, Self::Closed)
    }
}
