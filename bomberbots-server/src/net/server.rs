//! The TCP accept loop and the shutdown sequence.

use std::sync::Arc;

use tokio::net::TcpListener;
use tokio::task::JoinSet;
use tracing::{error, info, warn};

use crate::config::GameConfig;
use crate::game::engine;
use crate::net::session::Session;

/// Game server errors.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    /// Failed to bind the listening socket (startup failure).
    #[error("failed to bind: {0}")]
    Bind(#[source] std::io::Error),

    /// Shutdown was requested (SIGINT or fatal task failure).
    #[error("interrupted")]
    Interrupted,

    /// A worker task died unexpectedly.
    #[error("internal error: {0}")]
    Internal(String),
}

/// The game server: one session, one engine task, one accept loop.
pub struct GameServer {
    session: Arc<Session>,
}

impl GameServer {
    /// Creates a server for the given configuration.
    pub fn new(config: GameConfig) -> Self {
        Self {
            session: Arc::new(Session::new(config)),
        }
    }

    /// Requests shutdown; `run` returns once every worker has been
    /// joined.
    pub fn shutdown(&self) {
        self.session.shutdown();
    }

    /// Binds the configured port and serves until shutdown.
    pub async fn run(&self) -> Result<(), ServerError> {
        let listener = TcpListener::bind(("0.0.0.0", self.session.config.port))
            .await
            .map_err(ServerError::Bind)?;
        self.run_with_listener(listener).await
    }

    /// Serves on an already-bound listener (tests bind port 0 first).
    pub async fn run_with_listener(&self, listener: TcpListener) -> Result<(), ServerError> {
        if let Ok(addr) = listener.local_addr() {
            info!("listening on {addr}");
        }

        let mut engine = tokio::spawn(engine::run(self.session.clone()));
        let mut shutdown_rx = self.session.subscribe_shutdown();
        let mut workers = JoinSet::new();

        let engine_result = loop {
            tokio::select! {
                accepted = listener.accept() => match accepted {
                    Ok((stream, addr)) => {
                        match self.session.register_connection(stream, addr) {
                            Ok((listen, emit)) => {
                                workers.spawn(listen);
                                workers.spawn(emit);
                            }
                            Err(e) => warn!("failed to set up connection from {addr}: {e}"),
                        }
                    }
                    Err(e) => error!("accept error: {e}"),
                },
                _ = shutdown_rx.wait_for(|s| *s) => break None,
                joined = &mut engine => break Some(joined),
            }
        };

        // Shutdown sequence: stop accepting, flag everyone, join every
        // worker (their sockets close as the tasks drop), then collect
        // the engine's verdict.
        drop(listener);
        self.session.shutdown();
        while workers.join_next().await.is_some() {}

        let engine_result = match engine_result {
            Some(joined) => joined,
            None => engine.await,
        };
        match engine_result {
            Ok(result) => result,
            Err(e) => Err(ServerError::Internal(format!("engine task died: {e}"))),
        }
    }
}
