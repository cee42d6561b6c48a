//! Transport decorator chain assembly.
//!
//! A connection's transport may be wrapped in optional decorators before
//! protocol negotiation begins: an HTTP CONNECT proxy tunnel, WebSocket
//! framing, and always TLS followed by SASL. The wire order is fixed
//! regardless of which optional decorators are active:
//!
//! Proxy → WebSocket → TLS → SASL → AMQP frames
//!
//! [`TransportOptions::layers`] produces that order as plain data, so the
//! ordering is enforced by a single assembly point rather than by call
//! discipline at every binding site.

use std::fmt;
use std::time::Duration;

/// Default port for AMQP over TLS.
pub const AMQPS_PORT: u16 = 5671;
/// Port used whenever the WebSocket decorator is active.
pub const HTTPS_PORT: u16 = 443;
/// Largest frame negotiated on a direct TLS transport.
pub const MAX_FRAME_SIZE: u32 = 65_536;
/// Largest frame the WebSocket sub-layer can carry.
pub const WEB_SOCKET_MAX_FRAME_SIZE: u32 = 4_096;
/// Sub-protocol identifier announced during the WebSocket upgrade.
pub const WEB_SOCKET_PROTOCOL: &str = "AMQPWSB10";
/// Resource path requested during the WebSocket upgrade.
pub const WEB_SOCKET_PATH: &str = "/$servicebus/websocket";

/// Optional transport decorators for a connection.
#[derive(Debug, Clone, Default, Eq, PartialEq)]
pub struct TransportOptions {
    web_socket: bool,
    proxy: Option<ProxyOptions>,
}

impl TransportOptions {
    /// Route AMQP frames through a WebSocket upgrade on the HTTPS port.
    ///
    /// Frames larger than [`WEB_SOCKET_MAX_FRAME_SIZE`] cannot be carried;
    /// owners must size outbound frames from [`max_frame_size`].
    ///
    /// [`max_frame_size`]: TransportOptions::max_frame_size
    pub fn web_socket(&mut self, enabled: bool) -> &mut Self {
        self.web_socket = enabled;
        self
    }

    /// Tunnel the connection through an HTTP CONNECT proxy before any other
    /// layer.
    pub fn proxy(&mut self, proxy: ProxyOptions) -> &mut Self {
        self.proxy = Some(proxy);
        self
    }

    /// Port the owner dials for these options.
    pub fn port(&self) -> u16 {
        if self.web_socket {
            HTTPS_PORT
        } else {
            AMQPS_PORT
        }
    }

    /// Largest frame the owner may negotiate on the assembled transport.
    pub fn max_frame_size(&self) -> u32 {
        if self.web_socket {
            WEB_SOCKET_MAX_FRAME_SIZE
        } else {
            MAX_FRAME_SIZE
        }
    }

    /// Assemble the full layer stack for `hostname`, outermost first.
    pub(crate) fn layers(&self, hostname: &str) -> Vec<TransportLayer> {
        let mut layers = Vec::with_capacity(4);
        if let Some(proxy) = &self.proxy {
            layers.push(TransportLayer::Proxy(ProxyLayer {
                target: format!("{}:{}", hostname, self.port()),
                authorization: proxy.authorization_header(),
            }));
        }
        if self.web_socket {
            layers.push(TransportLayer::WebSocket(WebSocketLayer {
                host: hostname.to_owned(),
                path: WEB_SOCKET_PATH.to_owned(),
                protocol: WEB_SOCKET_PROTOCOL.to_owned(),
                max_frame_size: WEB_SOCKET_MAX_FRAME_SIZE,
                keep_alive: Duration::ZERO,
            }));
        }
        layers.push(TransportLayer::Tls(TlsDomain::client_anonymous()));
        layers.push(TransportLayer::Sasl(SaslMechanism::Anonymous));
        layers
    }
}

/// HTTP CONNECT proxy configuration.
#[derive(Debug, Clone, Default, Eq, PartialEq)]
pub struct ProxyOptions {
    /// Proxy endpoint the owner dials, as `host:port`
    pub address: String,
    /// User name for Basic proxy authentication
    pub username: Option<String>,
    /// Password for Basic proxy authentication
    pub password: Option<String>,
}

impl ProxyOptions {
    /// `Proxy-Authorization` value, present only when both credentials are
    /// set.
    ///
    /// Partial credentials mean an anonymous proxy, not an error.
    fn authorization_header(&self) -> Option<String> {
        match (&self.username, &self.password) {
            (Some(username), Some(password)) => Some(format!(
                "Basic {}",
                base64(format!("{username}:{password}").as_bytes())
            )),
            _ => None,
        }
    }
}

/// One element of the assembled transport stack, outermost first.
#[derive(Debug, Clone, Eq, PartialEq)]
pub enum TransportLayer {
    /// HTTP CONNECT tunnel
    Proxy(ProxyLayer),
    /// WebSocket framing
    WebSocket(WebSocketLayer),
    /// TLS
    Tls(TlsDomain),
    /// SASL negotiation
    Sasl(SaslMechanism),
}

/// Parameters for the HTTP CONNECT tunnel.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct ProxyLayer {
    /// `host:port` the proxy is asked to connect to
    pub target: String,
    /// `Proxy-Authorization` header value, when credentials were supplied
    pub authorization: Option<String>,
}

/// Parameters for the WebSocket upgrade.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct WebSocketLayer {
    /// Host header for the upgrade request
    pub host: String,
    /// Resource path for the upgrade request
    pub path: String,
    /// Announced sub-protocol
    pub protocol: String,
    /// Largest frame the sub-layer will carry
    pub max_frame_size: u32,
    /// Ping interval; zero disables keep-alive pings
    pub keep_alive: Duration,
}

/// TLS parameters bound to the transport.
///
/// The connection handler always emits the client-mode, anonymous-peer
/// domain: the peer's certificate chain and host name are **not** verified at
/// this layer, and connections to endpoints presenting self-signed
/// certificates succeed. Owners that require verification must arrange it at
/// the engine or socket layer using the stricter [`PeerVerification`]
/// variants.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub struct TlsDomain {
    /// Which side of the handshake this endpoint plays
    pub mode: TlsMode,
    /// How the peer's certificate is checked
    pub verification: PeerVerification,
}

impl TlsDomain {
    /// Client-mode domain that skips certificate and host-name checks.
    pub fn client_anonymous() -> Self {
        Self {
            mode: TlsMode::Client,
            verification: PeerVerification::Anonymous,
        }
    }
}

/// TLS handshake role.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum TlsMode {
    /// Initiate the handshake
    Client,
    /// Accept the handshake
    Server,
}

/// Peer certificate checking policy.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum PeerVerification {
    /// Accept any peer without checking its certificate
    Anonymous,
    /// Verify the certificate chain but not the host name
    VerifyPeer,
    /// Verify the certificate chain and the host name
    VerifyPeerName,
}

/// SASL mechanisms this core will configure.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum SaslMechanism {
    /// RFC 4505 anonymous authentication; the peer authorizes by other means
    Anonymous,
}

impl SaslMechanism {
    /// Mechanism name as announced during SASL negotiation.
    pub fn name(self) -> &'static str {
        match self {
            Self::Anonymous => "ANONYMOUS",
        }
    }
}

impl fmt::Display for SaslMechanism {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.name())
    }
}

const BASE64_ALPHABET: &[u8; 64] =
    b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789+/";

fn base64(input: &[u8]) -> String {
    let mut out = String::with_capacity((input.len() + 2) / 3 * 4);
    for chunk in input.chunks(3) {
        let n = (u32::from(chunk[0]) << 16)
            | (u32::from(*chunk.get(1).unwrap_or(&0)) << 8)
            | u32::from(*chunk.get(2).unwrap_or(&0));
        out.push(BASE64_ALPHABET[(n >> 18 & 0x3f) as usize] as char);
        out.push(BASE64_ALPHABET[(n >> 12 & 0x3f) as usize] as char);
        out.push(if chunk.len() > 1 {
            BASE64_ALPHABET[(n >> 6 & 0x3f) as usize] as char
        } else {
            '='
        });
        out.push(if chunk.len() > 2 {
            BASE64_ALPHABET[(n & 0x3f) as usize] as char
        } else {
            '='
        });
    }
    out
}
