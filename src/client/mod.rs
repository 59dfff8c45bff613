//! TailBeat - Client
//!
//! The [`Session`] coordinator and its [`ClientConfig`].

mod config;
mod session;

pub use config::*;
pub use session::*;
