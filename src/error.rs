use thiserror::Error;

/// The primary error type for `ramses-core`.
///
/// The receive path never propagates these past a single frame: every
/// variant below is either logged and dropped (structural/payload faults)
/// or surfaced once to the caller that owns the affected operation
/// (timeouts, transport/cancellation).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RamsesError {
    /// Frame failed structural parse: length, characters, or address shape.
    /// Fatal to this frame only.
    #[error("invalid packet: {0}")]
    InvalidPacket(String),

    /// Subcase of `InvalidPacket`: the address triplet is not one of the
    /// three legal shapes.
    #[error("invalid address set: {0}")]
    InvalidAddrSet(String),

    /// A single address field did not match `TT:SSSSSS` or a sentinel.
    #[error("invalid address: {0}")]
    InvalidAddress(String),

    /// The parser could not interpret the payload bytes for this opcode,
    /// or an index rule was violated (e.g. a domain-id index on a non-domain
    /// opcode).
    #[error("invalid payload for {code}: {reason}")]
    InvalidPayload { code: String, reason: String },

    /// Checksum/RSSI outside the allowed range.
    #[error("corrupt frame: {0}")]
    Corrupt(String),

    /// A transmit had no matching response within its window.
    #[error("timed out waiting for response to header {0}")]
    ProtocolTimeout(String),

    /// The transport collaborator disconnected.
    #[error("transport closed")]
    TransportClosed,

    /// Cooperative shutdown was signalled.
    #[error("cancelled")]
    Cancelled,
}

pub type Result<T> = std::result::Result<T, RamsesError>;
