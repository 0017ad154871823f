//! Sessions and broadcasting: the non-deterministic half of the server.

pub mod broadcast;
pub mod connection;
pub mod server;
pub mod session;
