//! Protocol constants shared by the engine and the companion tool.
//!
//! The wire values here are fixed by the companion protocol and MUST NOT be
//! changed without a matching change on the companion side.

use std::time::Duration;

// =============================================================================
// WIRE FORMAT
// =============================================================================

/// Boundary byte terminating every record on the wire.
pub const RECORD_DELIMITER: u8 = 0x0A;

/// Maximum number of bytes requested from the transport per receive.
pub const RECV_CHUNK_SIZE: usize = 64 * 1024;

/// Longest inbound record accepted before it is discarded unread.
pub const MAX_RECORD_LEN: usize = 16 * 1024 * 1024;

/// Schema version stamped into versioned payloads (app info, windows, ...).
pub const PAYLOAD_SCHEMA_VERSION: u32 = 1;

/// Text carried by the `Ack` that opens every handshake.
pub const HANDSHAKE_GREETING: &str = "hello";

/// Prefix of captured output lines that are echoes of OS log entries.
pub const OSLOG_ECHO_PREFIX: &str = "OSLOG-";

// =============================================================================
// DEFAULTS
// =============================================================================

/// Default companion host.
pub const DEFAULT_HOST: &str = "127.0.0.1";

/// Default companion port.
pub const DEFAULT_PORT: u16 = 8085;

/// Default Event Bus capacity before drop-oldest kicks in.
pub const DEFAULT_EVENT_CAPACITY: usize = 1_000;

/// Default capacity of the decoded inbound message channel.
pub const DEFAULT_INBOUND_CAPACITY: usize = 256;

/// Default delay before reconnecting after the companion went away.
pub const DEFAULT_RECONNECT_INTERVAL: Duration = Duration::from_secs(2);

/// Default delay between connection attempts while the network is unavailable.
pub const DEFAULT_WAITING_RETRY_INTERVAL: Duration = Duration::from_secs(1);

// =============================================================================
// ENVIRONMENT VARIABLES
// =============================================================================

/// Overrides the companion host.
pub const ENV_HOST: &str = "TAILBEAT_HOST";

/// Overrides the companion port.
pub const ENV_PORT: &str = "TAILBEAT_PORT";

/// Overrides the Event Bus capacity.
pub const ENV_EVENT_CAPACITY: &str = "TAILBEAT_EVENT_CAPACITY";

/// Overrides the minimum level accepted by the logger.
pub const ENV_MIN_LEVEL: &str = "TAILBEAT_MIN_LEVEL";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_delimiter_is_newline() {
        assert_eq!(RECORD_DELIMITER, b'\n');
    }

    #[test]
    fn test_chunk_size() {
        assert_eq!(RECV_CHUNK_SIZE, 65_536);
    }
}
