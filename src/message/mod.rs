//! TailBeat - Message layer
//!
//! Pure data and the framing codec:
//! - Message catalog ([`OutboundMessage`], [`InboundMessage`]) and payloads
//! - Telemetry [`Event`] model
//! - Preference values and patches
//! - Newline-delimited JSON framing ([`codec`])

mod catalog;
pub mod codec;
mod event;
mod preference;

pub use catalog::*;
pub use event::*;
pub use preference::*;
