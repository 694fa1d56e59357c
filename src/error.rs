//! Error types for the mysmartbike library.

use thiserror::Error;

use crate::protocol::MessageKind;

/// The main error type for bike client operations.
#[derive(Debug, Error)]
pub enum Error {
    /// Transport-level failure outside of a connect attempt.
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    /// The bike could not be reached (powered off, out of range, or no free
    /// connection slot on the adapter).
    #[error("device {address} is not reachable - turn on the bike")]
    Unreachable {
        address: String,
        #[source]
        source: TransportError,
    },

    /// Connecting failed for a reason other than reachability.
    #[error("failed to connect to {address}: {source}")]
    ConnectFailed {
        address: String,
        #[source]
        source: TransportError,
    },
}

impl Error {
    /// Returns true if the error means "bike not reachable, try again later".
    #[must_use]
    pub const fn is_unreachable(&self) -> bool {
        match self {
            Self::Unreachable { .. } => true,
            Self::Transport(e) => e.is_unreachable(),
            _ => false,
        }
    }
}

/// Errors reported by a [`Transport`](crate::transport::Transport) or
/// [`Session`](crate::transport::Session).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    /// Device is no longer reachable.
    #[error("device no longer reachable: {0}")]
    Unreachable(String),

    /// The adapter ran out of connection slots.
    #[error("out of connection slots: {0}")]
    OutOfSlots(String),

    /// Operation timed out.
    #[error("operation timed out after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },

    /// Any other failure.
    #[error("{0}")]
    Failed(String),
}

impl TransportError {
    /// Returns true for the failures that mean the bike is simply not
    /// available right now.
    #[must_use]
    pub const fn is_unreachable(&self) -> bool {
        matches!(self, Self::Unreachable(_) | Self::OutOfSlots(_))
    }
}

/// Per-frame decoding errors.
///
/// These never escape [`BikeDataParser::handle`](crate::protocol::BikeDataParser::handle);
/// a truncated frame over a noisy link is expected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    /// Frame shorter than the minimum for its kind.
    #[error("{kind} frame too short: need at least {need} bytes, got {got}")]
    TooShort {
        kind: MessageKind,
        need: usize,
        got: usize,
    },

    /// Frame length does not match any accepted shape.
    #[error("{kind} frame has unexpected length {got}")]
    UnexpectedLength { kind: MessageKind, got: usize },

    /// Expected an ASCII digit.
    #[error("invalid digit byte 0x{byte:02x}")]
    InvalidDigit { byte: u8 },

    /// Frame did not match any accepted shape.
    #[error("malformed {kind} frame")]
    Malformed { kind: MessageKind },

    /// The device answered with its error marker.
    #[error("device reported an error for {kind}")]
    DeviceError { kind: MessageKind },
}

/// Result type alias for bike client operations.
pub type Result<T> = std::result::Result<T, Error>;
