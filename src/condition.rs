use std::borrow::Cow;
use std::fmt;

use thiserror::Error;

/// Symbolic AMQP error condition code, e.g. `amqp:not-found`.
///
/// Well-known codes are provided as associated constants; codes supplied by a
/// peer outside that set are carried verbatim.
#[derive(Clone, Eq, PartialEq)]
pub struct Condition(Cow<'static, str>);

impl Condition {
    /// The code as it appears on the wire.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for Condition {
    fn from(code: String) -> Self {
        Self(Cow::Owned(code))
    }
}

impl From<&str> for Condition {
    fn from(code: &str) -> Self {
        Self(Cow::Owned(code.to_owned()))
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

macro_rules! conditions {
    {$($name:ident($code:literal) $desc:literal;)*} => {
        impl Condition {
            $(#[doc = $desc] pub const $name: Self = Self(Cow::Borrowed($code));)*
        }

        impl fmt::Debug for Condition {
            fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
                match self.0.as_ref() {
                    $($code => f.write_str(stringify!($name)),)*
                    other => write!(f, "Condition({:?})", other),
                }
            }
        }
    }
}

conditions! {
    INTERNAL_ERROR("amqp:internal-error") "an internal error occurred and operator intervention may be required";
    NOT_FOUND("amqp:not-found") "a peer attempted to work with a remote entity that does not exist";
    UNAUTHORIZED_ACCESS("amqp:unauthorized-access") "a peer attempted to work with a remote entity it has no permission to access";
    DECODE_ERROR("amqp:decode-error") "data could not be decoded";
    RESOURCE_LIMIT_EXCEEDED("amqp:resource-limit-exceeded") "a peer exceeded its resource allocation";
    NOT_ALLOWED("amqp:not-allowed") "the peer used a frame in a manner inconsistent with its defined semantics";
    INVALID_FIELD("amqp:invalid-field") "an invalid field was passed in a frame body and the operation could not proceed";
    NOT_IMPLEMENTED("amqp:not-implemented") "the peer tried to use functionality its partner does not implement";
    RESOURCE_LOCKED("amqp:resource-locked") "the client attempted to work with a server entity to which it has no access because another client is working with it";
    PRECONDITION_FAILED("amqp:precondition-failed") "the client made a request that was not allowed because some precondition failed";
    RESOURCE_DELETED("amqp:resource-deleted") "a server entity the client is working with has been deleted";
    ILLEGAL_STATE("amqp:illegal-state") "the peer sent a frame that is not permitted in the current state";
    FRAME_SIZE_TOO_SMALL("amqp:frame-size-too-small") "the smallest encoding of the performative would not fit within the agreed maximum frame size";
    CONNECTION_FORCED("amqp:connection:forced") "an operator intervened to close the connection";
    CONNECTION_FRAMING_ERROR("amqp:connection:framing-error") "a valid frame header could not be formed from the incoming byte stream";
    LINK_DETACH_FORCED("amqp:link:detach-forced") "an operator intervened to detach the link";
    LINK_TRANSFER_LIMIT_EXCEEDED("amqp:link:transfer-limit-exceeded") "the peer sent more message transfers than currently allowed on the link";
    LINK_MESSAGE_SIZE_EXCEEDED("amqp:link:message-size-exceeded") "the peer sent a larger message than is supported on the link";
    LINK_STOLEN("amqp:link:stolen") "the link has been attached elsewhere, forcibly closing this attachment";
}

/// Error information attached by a peer to a close, detach, or transport
/// failure.
///
/// `None` in the surfaces that carry an `Option<ErrorCondition>` is itself
/// meaningful: the peer closed without giving a reason.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ErrorCondition {
    /// Symbolic condition code
    pub condition: Condition,
    /// Human-readable explanation supplied alongside the code, if any
    pub description: Option<String>,
}

impl ErrorCondition {
    /// Condition carrying `condition` and `description`.
    pub fn new(condition: impl Into<Condition>, description: impl Into<String>) -> Self {
        Self {
            condition: condition.into(),
            description: Some(description.into()),
        }
    }

    /// Condition carrying only a code.
    pub fn bare(condition: impl Into<Condition>) -> Self {
        Self {
            condition: condition.into(),
            description: None,
        }
    }
}

impl fmt::Display for ErrorCondition {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.condition)?;
        if let Some(description) = &self.description {
            write!(f, ": {description}")?;
        }
        Ok(())
    }
}

impl std::error::Error for ErrorCondition {}

/// Reason a link was torn down, carried by the owner's close notice.
///
/// Remote conditions arrive on the peer's close or detach frame; local
/// failures are raised by this side without any peer involvement. The two
/// channels stay distinguishable all the way to the owner.
#[derive(Debug, Clone, Eq, PartialEq, Error)]
pub enum LinkFailure {
    /// The peer closed or detached the link and supplied a condition
    #[error("peer closed link: {0}")]
    Remote(#[from] ErrorCondition),
    /// This side failed the link
    #[error("link failed locally: {0}")]
    Local(#[from] LocalError),
}

/// Client-side failure attached to a link teardown.
#[derive(Debug, Clone, Eq, PartialEq, Error)]
#[error("{message}")]
pub struct LocalError {
    message: String,
}

impl LocalError {
    /// Failure described by `message`.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Terminal outcome reported by the receiving peer for a delivery.
#[derive(Debug, Clone, Eq, PartialEq)]
pub enum DeliveryState {
    /// The peer accepted the message
    Accepted,
    /// The peer rejected the message, optionally saying why
    Rejected(Option<ErrorCondition>),
    /// The peer released the message without processing it
    Released,
    /// The peer neither accepted nor rejected the message, but updated its
    /// delivery annotations
    Modified {
        /// Count this attempt against the message's delivery limit
        delivery_failed: bool,
        /// The message must not be redelivered to this node
        undeliverable_here: bool,
    },
}
