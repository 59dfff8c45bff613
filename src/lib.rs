//! # TailBeat
//!
//! Client-side engine that keeps one resilient TCP connection between an
//! instrumented application and a companion inspection tool. Two logical
//! streams share the connection:
//!
//! - **Outbound telemetry**: log events, lifecycle events, environment,
//!   window and preference snapshots
//! - **Inbound commands**: language/appearance changes, window geometry
//!   requests, preference patches
//!
//! The companion may start late, restart, or never appear. Logging never
//! blocks the host and never fails.
//!
//! ## Feature Flags
//!
//! - `bus`: Event Bus, [`Logger`](bus::Logger) and line capture
//! - `transport`: connection state machine, outbound buffer, record reader
//! - `client` (default): the [`Session`](client::Session) coordinator
//!
//! ## Modules
//!
//! - [`core`]: Constants, error types and collaborator traits (always included)
//! - [`message`]: Message catalog, event model and framing codec (always included)
//! - [`bus`]: Event Bus (requires `bus` feature)
//! - [`transport`]: Transport layer (requires `transport` feature)
//! - [`client`]: Session coordinator (requires `client` feature)
//!
//! ## Example Usage
//!
//! ```ignore
//! use std::sync::Arc;
//! use tailbeat::prelude::*;
//!
//! let session = Session::new(
//!     ClientConfig::from_env()?,
//!     Arc::new(environment),
//!     Arc::new(MemoryPreferences::default()),
//!     Arc::new(()),
//! )?;
//! session.start().await;
//!
//! let logger = session.logger();
//! tailbeat::log!(logger, Level::Info, "app", "window opened: {}", title);
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![cfg_attr(docsrs, feature(doc_cfg))]

// Core module (always included)
pub mod core;

// Message catalog and codec (always included)
pub mod message;

// Event Bus (feature-gated)
#[cfg(feature = "bus")]
#[cfg_attr(docsrs, doc(cfg(feature = "bus")))]
pub mod bus;

// Transport layer (feature-gated)
#[cfg(feature = "transport")]
#[cfg_attr(docsrs, doc(cfg(feature = "transport")))]
pub mod transport;

// Client API (feature-gated)
#[cfg(feature = "client")]
#[cfg_attr(docsrs, doc(cfg(feature = "client")))]
pub mod client;

/// Prelude module for convenient imports.
pub mod prelude {
    // Core traits and types
    pub use crate::core::*;

    // Message catalog
    pub use crate::message::{
        AppEnvironment, AppInfo, AppWindow, Appearance, Event, EventKind, Extra, InboundMessage,
        Level, Origin, OutboundMessage, PreferencePatch, PreferenceValue, Rect,
        SourceLocation, WindowResizeRequest,
    };

    #[cfg(feature = "bus")]
    pub use crate::bus::{EventBus, Logger, capture_lines};

    #[cfg(feature = "transport")]
    pub use crate::transport::{ConnectionEvent, ConnectionManager, ConnectionPhase};

    #[cfg(feature = "client")]
    pub use crate::client::{ClientConfig, ClientConfigBuilder, Session};
}

// Re-export commonly used items at crate root
pub use self::core::{DecodeError, EncodeError, TailbeatError};
pub use message::{Event, InboundMessage, Level, OutboundMessage};

#[cfg(feature = "bus")]
pub use bus::{EventBus, Logger};

#[cfg(feature = "client")]
pub use client::{ClientConfig, Session};
