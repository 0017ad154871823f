//! Bomberbots Game Server
//!
//! Authoritative server for the bomberbots arena: admits players over
//! TCP, simulates turns on a fixed cadence, and broadcasts the event
//! stream to every connected client.

use std::process::ExitCode;
use std::sync::Arc;

use clap::error::ErrorKind;
use clap::Parser;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use bomberbots_server::{GameServer, ServerError, ServerOptions, VERSION};

fn parse_options() -> Result<ServerOptions, ExitCode> {
    match ServerOptions::try_parse() {
        Ok(options) => Ok(options),
        Err(e) => {
            // --help and --version go to stdout and exit cleanly; real
            // parse errors are startup failures.
            let code = match e.kind() {
                ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => ExitCode::SUCCESS,
                _ => ExitCode::from(1),
            };
            let _ = e.print();
            Err(code)
        }
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
    let config = options.into_config();

    info!("Bomberbots Server v{VERSION}");
    info!(
        "'{}': {}x{} board, {} players, {} turns of {} ms",
        config.server_name,
        config.size_x,
        config.size_y,
        config.player_count,
        config.game_length,
        config.turn_duration
    );

    let server = Arc::new(GameServer::new(config));

    let interrupt = {
        let server = server.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                info!("interrupt received, shutting down");
                server.shutdown();
            }
        })
    };

    let result = server.run().await;
    interrupt.abort();

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e @ ServerError::Bind(_)) => {
            eprintln!("{e}");
            ExitCode::from(1)
        }
        Err(ServerError::Interrupted) => ExitCode::from(2),
        Err(e) => {
            eprintln!("{e}");
            ExitCode::from(2)
        }
    }
}
