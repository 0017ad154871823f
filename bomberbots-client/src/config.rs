//! Command-line options, address resolution, and the client error type.

use std::net::SocketAddr;

use bomberbots_protocol::WireError;
use clap::Parser;
use tokio::net::lookup_host;

/// Command-line surface of the client binary.
#[derive(Parser, Debug)]
#[command(name = "bomberbots-client", version, about = "Bomberbots GUI client")]
pub struct ClientOptions {
    /// GUI endpoint to send draw messages to, as host:port.
    #[arg(long)]
    pub gui_address: String,

    /// Display name sent with Join.
    #[arg(long)]
    pub player_name: String,

    /// UDP port to listen on for GUI input.
    #[arg(long)]
    pub port: u16,

    /// Game server endpoint, as host:port.
    #[arg(long)]
    pub server_address: String,
}

/// Client errors.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// A recoverable startup failure: options, resolution, bind or
    /// connect.
    #[error("{0}")]
    Startup(String),

    /// The connection to the server or GUI failed mid-run.
    #[error("connection error: {0}")]
    Wire(#[from] WireError),

    /// SIGINT was received.
    #[error("interrupted")]
    Interrupted,

    /// A worker task died unexpectedly.
    #[error("internal error: {0}")]
    Internal(String),
}

/// Splits `host:port` on the last colon, so bracketed and bare IPv6
/// literals keep their inner colons.
pub fn split_host_port(address: &str) -> Result<(&str, u16), ClientError> {
    let colon = address
        .rfind(':')
        .ok_or_else(|| ClientError::Startup(format!("'{address}' has no port")))?;
    let host = &address[..colon];
    let port = address[colon + 1..]
        .parse::<u16>()
        .map_err(|_| ClientError::Startup(format!("'{address}' has an invalid port")))?;
    Ok((host.trim_start_matches('[').trim_end_matches(']'), port))
}

/// Resolves `host:port` to its first address.
pub async fn resolve(address: &str) -> Result<SocketAddr, ClientError> {
    let (host, port) = split_host_port(address)?;
    lookup_host((host, port))
        .await
        .map_err(|e| ClientError::Startup(format!("cannot resolve '{address}': {e}")))?
        .next()
        .ok_or_else(|| ClientError::Startup(format!("'{address}' resolved to no addresses")))
}
