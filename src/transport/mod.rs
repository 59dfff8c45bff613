//! TailBeat - Transport layer
//!
//! Owns the single TCP connection to the companion tool:
//!
//! - **Connection state machine**: [`ConnectionState`] and the
//!   [`ConnectionManager`] actor that drives it
//! - **Outbound buffering**: [`OutboundBuffer`] holds records while the
//!   transport is not ready
//! - **Framing-aware receive**: [`RecordReader`] splits delimited records off
//!   a receive accumulator
//! - **Writer task**: drains records handed to a ready connection so the
//!   actor never waits on a slow peer
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │          Session Coordinator            │
//! ├─────────────────────────────────────────┤
//! │         Transport Layer                 │  ← This module
//! │   state machine, buffering, framing     │
//! ├─────────────────────────────────────────┤
//! │              TCP                        │
//! └─────────────────────────────────────────┘
//! ```

mod connection;
mod error;
mod outbound;
mod socket;
mod writer;

pub use connection::*;
pub use error::*;
pub use outbound::*;
pub use socket::*;
