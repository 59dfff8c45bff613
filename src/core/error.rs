//! Error types for TailBeat.

use thiserror::Error;

/// Errors that can occur when decoding an inbound record.
///
/// A decode error only ever discards the offending record; the receive loop
/// keeps draining.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DecodeError {
    /// Record is not valid UTF-8.
    #[error("record is not valid UTF-8")]
    InvalidUtf8,

    /// Record is not a well-formed message.
    #[error("malformed record: {0}")]
    Malformed(String),

    /// Record grew past the receive limit without a delimiter.
    #[error("record exceeds {limit} bytes")]
    TooLong {
        /// Limit in bytes.
        limit: usize,
    },
}

impl From<serde_json::Error> for DecodeError {
    fn from(err: serde_json::Error) -> Self {
        DecodeError::Malformed(err.to_string())
    }
}

/// Errors that can occur when encoding an outbound message.
///
/// The catalog is closed and serializable, so these are not expected in
/// practice. A record that fails to encode is dropped, never retried.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EncodeError {
    /// Serializer rejected the message.
    #[error("serialization failed: {0}")]
    Serialize(String),

    /// Serialized payload contains the record delimiter.
    #[error("payload contains a raw record delimiter")]
    EmbeddedDelimiter,
}

impl From<serde_json::Error> for EncodeError {
    fn from(err: serde_json::Error) -> Self {
        EncodeError::Serialize(err.to_string())
    }
}

/// Error returned by an external command handler.
///
/// Handler failures are logged locally and never reported over the wire.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum HandlerError {
    /// The requested target does not exist (unknown window, key, ...).
    #[error("not found: {0}")]
    NotFound(String),

    /// The request is understood but cannot be honored.
    #[error("rejected: {0}")]
    Rejected(String),
}

/// Configuration errors.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// An environment variable holds an unparsable value.
    #[error("invalid value {value:?} for {name}")]
    InvalidValue {
        /// Variable or field name.
        name: &'static str,
        /// Offending value.
        value: String,
    },

    /// Event Bus capacity must admit at least one event.
    #[error("event capacity must be greater than zero")]
    ZeroCapacity,
}

/// Top-level TailBeat errors.
#[derive(Debug, Error)]
pub enum TailbeatError {
    /// Decode error.
    #[error("decode error: {0}")]
    Decode(#[from] DecodeError),

    /// Encode error.
    #[error("encode error: {0}")]
    Encode(#[from] EncodeError),

    /// Handler error.
    #[error("handler error: {0}")]
    Handler(#[from] HandlerError),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// I/O error.
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
}
