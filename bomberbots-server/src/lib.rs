//! # Bomberbots Game Server
//!
//! Authoritative server for the bomberbots arena. Clients connect over
//! TCP, join a lobby, and the server simulates the game turn by turn,
//! broadcasting an append-only event stream every client sees in the
//! same order.
//!
//! ## Architecture
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────┐
//! │                   BOMBERBOTS SERVER                        │
//! ├────────────────────────────────────────────────────────────┤
//! │  game/            - deterministic simulation               │
//! │  ├── rng.rs       - seeded LCG, single-owner               │
//! │  ├── world.rs     - per-game state and turn phases         │
//! │  └── engine.rs    - lobby → game → lobby lifecycle task    │
//! │                                                            │
//! │  net/             - sessions and broadcasting              │
//! │  ├── broadcast.rs - append-only message list + cursors     │
//! │  ├── connection.rs- mailbox, listener/emitter tasks        │
//! │  ├── session.rs   - registry, segment heads, join point    │
//! │  └── server.rs    - accept loop, shutdown sequence         │
//! └────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Determinism Guarantee
//!
//! The `game/` module is fully deterministic: all randomness comes from
//! one seeded LCG owned by the engine task, state uses ordered
//! collections, and the RNG stream is consumed in a fixed order (turn-0
//! generation, then per-turn teleports in ascending player id). Two runs
//! with the same seed and the same ordered Join arrivals broadcast the
//! same turns.

#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod config;
pub mod game;
pub mod net;

pub use config::{GameConfig, ServerOptions};
pub use net::server::{GameServer, ServerError};

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
