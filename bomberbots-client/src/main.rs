//! Bomberbots GUI Client
//!
//! Bridges a local rendering GUI (UDP datagrams) and the game server
//! (reliable TCP stream).

use std::process::ExitCode;
use std::sync::Arc;

use clap::error::ErrorKind;
use clap::Parser;
use tokio::net::{TcpStream, UdpSocket};
use tokio::sync::Mutex;
use tracing::{error, info, Level};
use tracing_subscriber::FmtSubscriber;

use bomberbots_client::config::{resolve, ClientError, ClientOptions};
use bomberbots_client::io::{gui_to_server, server_to_gui};
use bomberbots_client::{Reducer, VERSION};
use bomberbots_protocol::net::split_stream;
use bomberbots_protocol::UdpTransport;

fn parse_options() -> Result<ClientOptions, ExitCode> {
    match ClientOptions::try_parse() {
        Ok(options) => Ok(options),
        Err(e) => {
            let code = match e.kind() {
                ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => ExitCode::SUCCESS,
                _ => ExitCode::from(1),
            };
            let _ = e.print();
            Err(code)
        }
    }
}

async fn run(options: ClientOptions) -> Result<(), ClientError> {
    let gui_addr = resolve(&options.gui_address).await?;
    let server_addr = resolve(&options.server_address).await?;

    let socket = UdpSocket::bind(("0.0.0.0", options.port))
        .await
        .map_err(|e| ClientError::Startup(format!("cannot bind UDP port {}: {e}", options.port)))?;
    let socket = Arc::new(socket);

    let stream = TcpStream::connect(server_addr)
        .await
        .map_err(|e| ClientError::Startup(format!("cannot connect to {server_addr}: {e}")))?;
    let (tcp_reader, tcp_writer) = split_stream(stream)
        .map_err(|e| ClientError::Startup(format!("cannot set up the connection: {e}")))?;

    info!(
        "connected to server at {server_addr}; GUI at {gui_addr}; listening on UDP port {}",
        options.port
    );

    let state = Arc::new(Mutex::new(Reducer::new()));
    let gui_in = UdpTransport::new(socket.clone(), gui_addr);
    let gui_out = UdpTransport::new(socket, gui_addr);

    let mut input_loop = tokio::spawn(gui_to_server(
        gui_in,
        tcp_writer,
        state.clone(),
        options.player_name,
    ));
    let mut draw_loop = tokio::spawn(server_to_gui(tcp_reader, gui_out, state));

    // The first loop to fail tears the client down; so does SIGINT.
    let result = tokio::select! {
        joined = &mut input_loop => joined,
        joined = &mut draw_loop => joined,
        _ = tokio::signal::ctrl_c() => {
            info!("interrupt received, shutting down");
            Ok(Err(ClientError::Interrupted))
        }
    };
    input_loop.abort();
    draw_loop.abort();

    match result {
        Ok(loop_result) => loop_result,
        Err(e) => Err(ClientError::Internal(format!("worker task died: {e}"))),
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    // Diagnostics go to stderr; stdout is reserved for --help.
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .expect("Failed to set tracing subscriber");

    let options = match parse_options() {
        Ok(options) => options,
        Err(code) => return code,
    };

    info!("Bomberbots Client v{VERSION}, player '{}'", options.player_name);

    match run(options).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e @ ClientError::Startup(_)) => {
            eprintln!("{e}");
            ExitCode::from(1)
        }
        Err(e) => {
            error!("fatal: {e}");
            ExitCode::from(2)
        }
    }
}
