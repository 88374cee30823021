//! Crate-wide error type.
//!
//! Per-candidate failures (`DeviceOpenFailed`, `ConfigureFailed`, `WriteFailed`,
//! `HandshakeRejected`) are produced by
//! [`Handshake::attempt`](crate::handshake::Handshake::attempt) and swallowed by
//! [`Handshake::run`](crate::handshake::Handshake::run), which only surfaces
//! [`Error::DeviceNotFound`] once every candidate has been tried.

use crate::transport::TransportError;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The transport could not open a candidate interface.
    #[error("failed to open {device}: {source}")]
    DeviceOpenFailed {
        device: String,
        #[source]
        source: TransportError,
    },

    /// The handle could not be switched to non-blocking reads.
    #[error("failed to configure {device}: {source}")]
    ConfigureFailed {
        device: String,
        #[source]
        source: TransportError,
    },

    /// The discover report was not accepted by the candidate.
    #[error("discover write to {device} failed: {reason}")]
    WriteFailed { device: String, reason: String },

    /// No reply, or a reply without the handshake marker.
    #[error("{device} did not answer the handshake")]
    HandshakeRejected { device: String },

    /// Every candidate was tried and none completed the handshake.
    #[error("Arduino RawHID interface not found ({candidates} candidate(s) tried)")]
    DeviceNotFound { candidates: usize },

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("unknown command code 0x{0:02x}")]
    UnknownCommand(u8),

    #[error("malformed report: {0}")]
    MalformedReport(String),

    #[error("transport: {0}")]
    Transport(#[from] TransportError),

    #[error("config: {0}")]
    Config(#[from] toml::de::Error),

    #[error("I/O: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// `true` for failures that only disqualify a single candidate during discovery.
    pub fn is_candidate_local(&self) -> bool {
        matches!(
            self,
            Error::DeviceOpenFailed { .. }
                | Error::ConfigureFailed { .. }
                | Error::WriteFailed { .. }
                | Error::HandshakeRejected { .. }
        )
    }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
