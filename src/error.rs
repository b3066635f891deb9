//! Error types for bleedsim
//!
//! Provides a unified error type for all operations.

use thiserror::Error;

/// Result type alias using BleedError
pub type Result<T> = std::result::Result<T, BleedError>;

/// Unified error type for bleedsim operations
#[derive(Debug, Error)]
pub enum BleedError {
    // -------------------------------------------------------------------------
    // I/O Errors
    // -------------------------------------------------------------------------
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // -------------------------------------------------------------------------
    // Protocol Errors
    // -------------------------------------------------------------------------
    #[error("Protocol error: {0}")]
    Protocol(String),

    #[error("Unknown message kind: 0x{0:02x}")]
    UnknownKind(u8),

    #[error("Payload too large: {0} bytes (max 65535)")]
    PayloadTooLarge(usize),

    // -------------------------------------------------------------------------
    // Requester Errors
    // -------------------------------------------------------------------------
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    // -------------------------------------------------------------------------
    // Configuration Errors
    // -------------------------------------------------------------------------
    #[error("Configuration error: {0}")]
    Config(String),
}

impl BleedError {
    /// True when the error is a socket read/write timeout
    ///
    /// Unix reports `WouldBlock` for an expired `SO_RCVTIMEO`, Windows `TimedOut`.
    pub fn is_timeout(&self) -> bool {
        matches!(
            self,
            BleedError::Io(e) if matches!(
                e.kind(),
                std::io::ErrorKind::WouldBlock | std::io::ErrorKind::TimedOut
            )
        )
    }

    /// True when the peer went away underneath us
    pub fn is_disconnect(&self) -> bool {
        matches!(
            self,
            BleedError::Io(e) if matches!(
                e.kind(),
                std::io::ErrorKind::ConnectionReset
                    | std::io::ErrorKind::ConnectionAborted
                    | std::io::ErrorKind::BrokenPipe
                    | std::io::ErrorKind::UnexpectedEof
            )
        )
    }
}
