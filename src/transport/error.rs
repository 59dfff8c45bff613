//! Transport layer error types.
//!
//! Transport errors never escape the engine: each one is absorbed into a
//! connection state transition and, at most, logged.

use std::io;

use thiserror::Error;

/// Transport layer errors.
#[derive(Debug, Error)]
pub enum TransportError {
    /// Opening the connection failed.
    #[error("connect failed: {0}")]
    Connect(#[source] io::Error),

    /// Reading from the connection failed.
    #[error("read failed: {0}")]
    Read(#[source] io::Error),

    /// Writing to the connection failed.
    #[error("write failed: {0}")]
    Write(#[source] io::Error),

    /// Peer closed the connection.
    #[error("connection closed by peer")]
    EndOfStream,
}

impl TransportError {
    /// Check if this error means the network is temporarily unavailable.
    ///
    /// Such errors leave the connection in its current state while the
    /// connector keeps retrying.
    pub fn is_waiting(&self) -> bool {
        match self {
            TransportError::Connect(err) => is_network_unavailable(err),
            _ => false,
        }
    }
}

/// Check if an I/O error signals transient network unavailability.
fn is_network_unavailable(err: &io::Error) -> bool {
    matches!(
        err.kind(),
        io::ErrorKind::NetworkUnreachable
            | io::ErrorKind::HostUnreachable
            | io::ErrorKind::NetworkDown
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_waiting_classification() {
        let unreachable = TransportError::Connect(io::Error::from(io::ErrorKind::NetworkUnreachable));
        assert!(unreachable.is_waiting());

        let refused = TransportError::Connect(io::Error::from(io::ErrorKind::ConnectionRefused));
        assert!(!refused.is_waiting());

        assert!(!TransportError::EndOfStream.is_waiting());
    }
}
