//! # Bomberbots Wire Protocol
//!
//! Shared codec, message model and transports for the bomberbots server
//! and client.
//!
//! ## Architecture
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────┐
//! │                  BOMBERBOTS PROTOCOL                       │
//! ├────────────────────────────────────────────────────────────┤
//! │  error.rs    - BadType / BadRead / BadWrite taxonomy       │
//! │  buffer.rs   - pure big-endian cursor reader/writer        │
//! │  types.rs    - Position, Player, BombInfo, Direction       │
//! │  message.rs  - ClientMessage, ServerMessage, Event         │
//! │  gui.rs      - InputMessage, DrawMessage (GUI datagrams)   │
//! │  net.rs      - TCP stream + UDP datagram transports        │
//! └────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Determinism Guarantee
//!
//! Encoding is byte-for-byte deterministic: fixed big-endian widths,
//! `u8`-length strings, and maps serialized in ascending key order
//! (`BTreeMap` throughout). Given equal values, `encode` always produces
//! identical bytes, which is what makes whole broadcast streams
//! comparable across server runs.

#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod buffer;
pub mod error;
pub mod gui;
pub mod message;
pub mod net;
pub mod types;

pub use buffer::{Reader, Writer};
pub use error::{WireError, WireResult};
pub use gui::{DrawMessage, InputMessage};
pub use message::{ClientMessage, Event, ServerMessage};
pub use net::{TcpReader, TcpWriter, UdpTransport};
pub use types::{BombInfo, Direction, Player, Position, Wire};

/// Hard cap for a single encoded UDP message (maximum UDP payload).
pub const UDP_DATAGRAM_MAX: usize = 65507;

/// Initial capacity of the TCP working buffers.
pub const TCP_BUFFER_SIZE: usize = 2048;

/// Longest representable wire string (`u8` length prefix).
pub const STRING_MAX: usize = 255;
