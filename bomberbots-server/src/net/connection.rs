//! Per-connection state and the listener/emitter task pair.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use bomberbots_protocol::{ClientMessage, ServerMessage, TcpReader, TcpWriter};
use tokio::sync::watch;
use tracing::debug;

use crate::net::session::Session;

/// Counter of non-empty mailboxes across all connections.
///
/// The engine's admission loop sleeps on this instead of polling every
/// mailbox: it wakes whenever some connection holds an undelivered
/// message.
pub struct PendingMessages {
    count_tx: watch::Sender<usize>,
}

impl PendingMessages {
    /// Creates a zeroed counter.
    pub fn new() -> Self {
        let (count_tx, _) = watch::channel(0);
        Self { count_tx }
    }

    fn add(&self) {
        self.count_tx.send_modify(|count| *count += 1);
    }

    fn sub(&self) {
        self.count_tx
            .send_modify(|count| *count = count.saturating_sub(1));
    }

    /// A watch for the engine to wait on.
    pub fn subscribe(&self) -> watch::Receiver<usize> {
        self.count_tx.subscribe()
    }
}

impl Default for PendingMessages {
    fn default() -> Self {
        Self::new()
    }
}

/// One accepted TCP connection.
///
/// Holds everything both tasks and the engine touch: the single-slot
/// mailbox, the per-game `joined` flag, and the cancellation switch that
/// either task flips to tear the whole connection down.
pub struct Connection {
    /// Dense connection id, assigned at accept time.
    pub id: u64,
    /// Remote address, used as the player's wire address.
    pub addr: SocketAddr,
    mailbox: Mutex<Option<ClientMessage>>,
    joined: AtomicBool,
    cancel_tx: watch::Sender<bool>,
}

impl Connection {
    /// Creates connection state for an accepted socket.
    pub fn new(id: u64, addr: SocketAddr) -> Self {
        let (cancel_tx, _) = watch::channel(false);
        Self {
            id,
            addr,
            mailbox: Mutex::new(None),
            joined: AtomicBool::new(false),
            cancel_tx,
        }
    }

    /// Stores the most recent undelivered message, overwriting any older
    /// one. The pending counter is bumped only on the empty→full edge.
    pub fn push_message(&self, message: ClientMessage, pending: &PendingMessages) {
        let mut slot = self.mailbox.lock().expect("mailbox lock poisoned");
        if slot.replace(message).is_none() {
            pending.add();
        }
    }

    /// Takes and clears the pending message, if any.
    pub fn take_message(&self, pending: &PendingMessages) -> Option<ClientMessage> {
        let mut slot = self.mailbox.lock().expect("mailbox lock poisoned");
        let message = slot.take();
        if message.is_some() {
            pending.sub();
        }
        message
    }

    /// Marks the Join consumed. Returns the previous value.
    pub fn set_joined(&self) -> bool {
        self.joined.swap(true, Ordering::AcqRel)
    }

    /// Re-arms the Join flag when the server returns to lobby.
    pub fn reset_joined(&self) {
        self.joined.store(false, Ordering::Release);
    }

    /// Tears the connection down: both tasks observe this and exit,
    /// dropping their socket halves.
    pub fn cancel(&self) {
        self.cancel_tx.send_replace(true);
    }

    /// Whether the connection is being torn down.
    pub fn is_disconnected(&self) -> bool {
        *self.cancel_tx.borrow()
    }

    fn subscribe_cancel(&self) -> watch::Receiver<bool> {
        self.cancel_tx.subscribe()
    }
}

/// Waits until `rx` carries `true`, without holding the watch's read
/// guard across an await point (needed so selects that also await a
/// socket write stay `Send`).
async fn wait_true(rx: &mut watch::Receiver<bool>) {
    loop {
        if *rx.borrow() {
            return;
        }
        if rx.changed().await.is_err() {
            return;
        }
    }
}

/// Reads client messages into the mailbox until the peer goes away.
pub async fn listener_task(session: Arc<Session>, conn: Arc<Connection>, mut reader: TcpReader) {
    let mut shutdown = session.subscribe_shutdown();
    let mut cancel = conn.subscribe_cancel();

    loop {
        tokio::select! {
            result = reader.recv::<ClientMessage>() => match result {
                Ok(message) => {
                    conn.push_message(message, session.pending());
                }
                Err(e) => {
                    debug!("connection {} read ended: {e}", conn.id);
                    break;
                }
            },
            _ = cancel.wait_for(|c| *c) => break,
            _ = shutdown.wait_for(|s| *s) => break,
        }
    }

    conn.cancel();
    // Release the pending count held by an unread message, so the
    // admission loop never waits on a dead connection.
    let _ = conn.take_message(session.pending());
}

/// Sends the per-connection Hello, then drains the broadcast list from
/// the connection's join point.
pub async fn emitter_task(
    session: Arc<Session>,
    conn: Arc<Connection>,
    mut writer: TcpWriter,
    hello: ServerMessage,
    start_cursor: usize,
) {
    let mut shutdown = session.subscribe_shutdown();
    let mut cancel = conn.subscribe_cancel();
    let mut len_rx = session.broadcast().subscribe();

    if writer.send(&hello).await.is_err() {
        conn.cancel();
        return;
    }

    let mut cursor = start_cursor;
    loop {
        tokio::select! {
            message = session.broadcast().next(cursor, &mut len_rx) => {
                let Some(message) = message else { break };
                if writer.send(&*message).await.is_err() {
                    debug!("connection {} write failed", conn.id);
                    break;
                }
                cursor += 1;
            }
            _ = wait_true(&mut cancel) => break,
            _ = wait_true(&mut shutdown) => break,
        }
    }

    conn.cancel();
}
