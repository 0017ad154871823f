//! # Bomberbots Client
//!
//! Mediator between a local rendering GUI and the game server. The GUI
//! speaks high-frequency unreliable datagrams; the server speaks a
//! reliable ordered event stream. This crate translates one into the
//! other in both directions:
//!
//! - GUI input datagrams become reliable client commands (or `Join`
//!   while the lobby is open);
//! - the server's incremental event log is folded into a complete,
//!   renderable draw snapshot, one datagram per server turn.

#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod config;
pub mod io;
pub mod reducer;

pub use config::{ClientError, ClientOptions};
pub use reducer::{Phase, Reducer};

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
