use crate::session::AgentId;

/// Per-connection failures. None of these are fatal to the process.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// Payload could not be parsed, or carried an invalid value.
    /// The message is dropped and the connection stays open.
    #[error("malformed message: {0}")]
    MalformedMessage(String),

    /// Another connection already holds this agent identifier.
    #[error("Agent ID {0} already registered")]
    DuplicateIdentity(AgentId),

    /// Position update from a connection without an agent session.
    #[error("connection is not registered as an agent")]
    NotRegistered,

    /// The transport went away while sending or receiving.
    #[error("transport closed: {0}")]
    TransportClosed(String),

    /// Message type this server does not handle; ignored.
    #[error("unknown message type")]
    UnknownMessageType,
}

/// Invalid world layout, raised once at startup.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum WorldError {
    #[error("region {region} is too small for a spawn margin of {margin}")]
    RegionTooSmall { region: String, margin: f64 },

    #[error("region {0} has non-finite bounds or an extent too large to sample")]
    InvalidBounds(String),

    #[error("region {0} is defined more than once")]
    DuplicateRegion(String),

    #[error("spawn margin must be a non-negative finite number, got {0}")]
    InvalidMargin(f64),
}
