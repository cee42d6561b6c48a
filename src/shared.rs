use std::time::Duration;

use bytes::Bytes;

use crate::condition::{DeliveryState, ErrorCondition, LinkFailure};
use crate::transport::{SaslMechanism, TlsDomain, TransportLayer};

/// One output item drained from a handler through `poll()`.
///
/// The relative order of commands and notices is part of each handler's
/// contract: apply commands to the engine and deliver notices to the owner
/// exactly as drained. A link close command precedes the owner's close
/// notice, which precedes session cleanup; a delivery's settle command
/// follows its send-complete notice.
#[derive(Debug, Clone, Eq, PartialEq)]
pub enum Action {
    /// Imperative engine operation
    Command(Command),
    /// Owner-facing notification
    Notice(Notice),
}

/// Imperative operations the handlers issue back into the engine.
#[derive(Debug, Clone, Eq, PartialEq)]
pub enum Command {
    /// Set the reactor's I/O poll timeout before its first iteration runs
    SetIoPollTimeout(Duration),
    /// Stamp identity and properties onto the connection and open it
    OpenConnection(OpenConfig),
    /// Close the connection's local endpoint
    CloseConnection,
    /// Release the connection handle
    FreeConnection,
    /// Push a decorator onto the transport's layer stack
    AddTransportLayer(TransportLayer),
    /// Bind a TLS domain to the transport
    BindTls(TlsDomain),
    /// Restrict SASL negotiation to the given mechanism
    ConfigureSasl(SaslMechanism),
    /// Unbind the transport from its connection
    UnbindTransport,
    /// Release the transport object
    FreeTransport,
    /// Close the link's local endpoint
    CloseLink,
    /// Close the session owning the link
    CloseSession,
    /// Settle the delivery carrying this tag
    Settle {
        /// Engine-assigned delivery tag
        tag: Bytes,
    },
}

/// Notifications surfaced to the owning client.
#[derive(Debug, Clone, Eq, PartialEq)]
pub enum Notice {
    /// The entity completed its open handshake and is usable
    OpenComplete,
    /// The connection closed in an orderly fashion
    ConnectionClosed(Option<ErrorCondition>),
    /// The transport failed; terminal for the connection
    TransportError(Option<ErrorCondition>),
    /// The link closed or detached
    LinkClosed(Option<LinkFailure>),
    /// The peer updated the sender's credit
    Flow(u32),
    /// A delivery reached a remotely-updated state and is being settled
    SendComplete(Option<DeliveryState>),
}

/// Identity and properties stamped onto the connection at open.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct OpenConfig {
    /// Host name carried in the open frame
    pub hostname: String,
    /// Container identifier for this client process
    pub container_id: String,
    /// Client identification advertised to the peer
    pub properties: ConnectionProperties,
}

/// Client identification advertised in the connection's open properties.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct ConnectionProperties {
    /// Product name
    pub product: String,
    /// Client version
    pub version: String,
    /// Operating system and architecture of this process
    pub platform: String,
}

impl Default for ConnectionProperties {
    fn default() -> Self {
        Self {
            product: env!("CARGO_PKG_NAME").to_owned(),
            version: env!("CARGO_PKG_VERSION").to_owned(),
            platform: format!(
                "os:{};arch:{}",
                std::env::consts::OS,
                std::env::consts::ARCH
            ),
        }
    }
}
