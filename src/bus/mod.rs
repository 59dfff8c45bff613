//! TailBeat - Event Bus
//!
//! Decouples any number of log producers from the single network sender:
//! - [`EventBus`]: bounded drop-oldest queue, never blocks producers
//! - [`Logger`]: the public `log` entry point
//! - [`capture_lines`]: adapter for line-oriented output sources

mod capture;
mod logger;
mod queue;

pub use capture::*;
pub use logger::*;
pub use queue::*;
