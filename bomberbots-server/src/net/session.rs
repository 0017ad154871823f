//! Server-wide session state: the connection registry, the lobby/game
//! phase, and the join-point rule.
//!
//! One mutex guards the registry, the phase and the two segment heads.
//! Every broadcast append that moves a head, and every cursor decision
//! for a new connection, happens under that lock — so no append can
//! interleave between "pick the segment head" and "start emitting".

use std::collections::BTreeMap;
use std::net::SocketAddr;
use std::ops::Bound;
use std::sync::{Arc, Mutex};

use bomberbots_protocol::net::split_stream;
use bomberbots_protocol::{ClientMessage, ServerMessage};
use tokio::net::TcpStream;
use tokio::sync::watch;
use tracing::info;

use crate::config::GameConfig;
use crate::net::broadcast::BroadcastList;
use crate::net::connection::{emitter_task, listener_task, Connection, PendingMessages};

/// Lobby/game phase of the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Waiting for players to join.
    Lobby,
    /// A game is being simulated.
    Game,
}

struct SessionState {
    phase: Phase,
    /// Index of the first `AcceptedPlayer` of the upcoming game, if any.
    accepted_head: Option<usize>,
    /// Index of the running game's `GameStarted`, if any.
    game_head: Option<usize>,
    connections: BTreeMap<u64, Arc<Connection>>,
    next_connection_id: u64,
}

/// Shared state of one server run.
pub struct Session {
    /// Immutable run configuration.
    pub config: GameConfig,
    state: Mutex<SessionState>,
    broadcast: BroadcastList,
    pending: PendingMessages,
    shutdown_tx: watch::Sender<bool>,
}

impl Session {
    /// Creates the session for a run.
    pub fn new(config: GameConfig) -> Self {
        let (shutdown_tx, _) = watch::channel(false);
        Self {
            config,
            state: Mutex::new(SessionState {
                phase: Phase::Lobby,
                accepted_head: None,
                game_head: None,
                connections: BTreeMap::new(),
                next_connection_id: 0,
            }),
            broadcast: BroadcastList::new(),
            pending: PendingMessages::new(),
            shutdown_tx,
        }
    }

    /// The shared broadcast list.
    pub fn broadcast(&self) -> &BroadcastList {
        &self.broadcast
    }

    /// The shared pending-messages counter.
    pub fn pending(&self) -> &PendingMessages {
        &self.pending
    }

    /// Builds this run's greeting. Each connection gets its own copy.
    pub fn hello(&self) -> ServerMessage {
        ServerMessage::Hello {
            server_name: self.config.server_name.clone(),
            player_count: self.config.player_count,
            size_x: self.config.size_x,
            size_y: self.config.size_y,
            game_length: self.config.game_length,
            explosion_radius: self.config.explosion_radius,
            bomb_timer: self.config.bomb_timer,
        }
    }

    // =========================================================================
    // CONNECTION REGISTRY
    // =========================================================================

    /// Admits an accepted socket: assigns the next dense connection id,
    /// anchors the emitter per the join-point rule, and returns the two
    /// tasks to spawn.
    pub fn register_connection(
        self: &Arc<Self>,
        stream: TcpStream,
        addr: SocketAddr,
    ) -> std::io::Result<(
        impl std::future::Future<Output = ()>,
        impl std::future::Future<Output = ()>,
    )> {
        let (reader, writer) = split_stream(stream)?;

        let (conn, cursor) = {
            let mut state = self.state.lock().expect("session lock poisoned");
            let id = state.next_connection_id;
            state.next_connection_id += 1;
            let conn = Arc::new(Connection::new(id, addr));
            state.connections.insert(id, conn.clone());

            // The join-point rule: mid-game joiners start at the current
            // game segment (GameStarted + all turns); lobby joiners start
            // at the accepted-player segment, or just past the list end
            // when nobody was accepted yet.
            let cursor = match state.phase {
                Phase::Game => state.game_head.unwrap_or_else(|| self.broadcast.len()),
                Phase::Lobby => state.accepted_head.unwrap_or_else(|| self.broadcast.len()),
            };
            (conn, cursor)
        };

        info!("connection {} accepted from {addr}", conn.id);
        let listen = listener_task(self.clone(), conn.clone(), reader);
        let emit = emitter_task(self.clone(), conn, writer, self.hello(), cursor);
        Ok((listen, emit))
    }

    /// The connection after `after` in id order, wrapping to the first.
    /// This is the admission loop's round-robin step.
    pub fn next_connection(&self, after: Option<u64>) -> Option<(u64, Arc<Connection>)> {
        let state = self.state.lock().expect("session lock poisoned");
        let bound = match after {
            Some(id) => (Bound::Excluded(id), Bound::Unbounded),
            None => (Bound::Unbounded, Bound::Unbounded),
        };
        state
            .connections
            .range(bound)
            .next()
            .or_else(|| state.connections.iter().next())
            .map(|(id, conn)| (*id, conn.clone()))
    }

    /// Drops a connection from the registry (lobby reaping).
    pub fn remove_connection(&self, id: u64) {
        let mut state = self.state.lock().expect("session lock poisoned");
        state.connections.remove(&id);
    }

    /// Takes the pending message of a player's connection, clearing the
    /// slot whether or not the message gets dispatched.
    pub fn take_player_message(&self, connection_id: u64) -> Option<ClientMessage> {
        let conn = {
            let state = self.state.lock().expect("session lock poisoned");
            state.connections.get(&connection_id).cloned()
        };
        conn.and_then(|c| c.take_message(&self.pending))
    }

    // =========================================================================
    // BROADCAST SEGMENTS
    // =========================================================================

    /// Appends an `AcceptedPlayer`, starting the accepted-player segment
    /// if this is the first admission of the upcoming game.
    pub fn broadcast_accepted(&self, message: ServerMessage) {
        let mut state = self.state.lock().expect("session lock poisoned");
        let index = self.broadcast.append(message);
        state.accepted_head.get_or_insert(index);
    }

    /// Atomically enters the game phase and appends `GameStarted` plus
    /// turn 0, so late joiners are anchored before anything else lands.
    pub fn begin_game(&self, game_started: ServerMessage, turn_zero: ServerMessage) {
        let mut state = self.state.lock().expect("session lock poisoned");
        state.phase = Phase::Game;
        let head = self.broadcast.append(game_started);
        state.game_head = Some(head);
        self.broadcast.append(turn_zero);
    }

    /// Appends a mid-game `Turn`.
    pub fn broadcast_turn(&self, message: ServerMessage) {
        self.broadcast.append(message);
    }

    /// Appends `GameEnded` and resets to lobby: segment heads cleared,
    /// per-connection Join flags re-armed, leftover mailboxes drained.
    pub fn end_game(&self, game_ended: ServerMessage) {
        let mut state = self.state.lock().expect("session lock poisoned");
        self.broadcast.append(game_ended);
        state.phase = Phase::Lobby;
        state.accepted_head = None;
        state.game_head = None;
        for conn in state.connections.values() {
            conn.reset_joined();
            let _ = conn.take_message(&self.pending);
        }
    }

    /// Current phase (for diagnostics and tests).
    pub fn phase(&self) -> Phase {
        self.state.lock().expect("session lock poisoned").phase
    }

    // =========================================================================
    // SHUTDOWN
    // =========================================================================

    /// Flips the shutdown flag; every task observes it at its next
    /// suspension point.
    pub fn shutdown(&self) {
        self.shutdown_tx.send_replace(true);
    }

    /// A shutdown watch for a task to select on.
    pub fn subscribe_shutdown(&self) -> watch::Receiver<bool> {
        self.shutdown_tx.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bomberbots_protocol::Player;

    fn test_config() -> GameConfig {
        GameConfig {
            server_name: "arena".into(),
            port: 0,
            player_count: 2,
            size_x: 8,
            size_y: 8,
            game_length: 5,
            explosion_radius: 2,
            bomb_timer: 3,
            turn_duration: 50,
            initial_blocks: 0,
            seed: 7,
        }
    }

    fn accepted(id: u8) -> ServerMessage {
        ServerMessage::AcceptedPlayer {
            id,
            player: Player {
                name: format!("p{id}"),
                address: "127.0.0.1:1".into(),
            },
        }
    }

    fn game_started() -> ServerMessage {
        ServerMessage::GameStarted {
            players: BTreeMap::new(),
        }
    }

    fn turn(n: u16) -> ServerMessage {
        ServerMessage::Turn {
            turn: n,
            events: Vec::new(),
        }
    }

    #[test]
    fn accepted_head_points_at_first_admission() {
        let session = Session::new(test_config());
        session.broadcast_accepted(accepted(0));
        session.broadcast_accepted(accepted(1));

        let state = session.state.lock().unwrap();
        assert_eq!(state.accepted_head, Some(0));
        assert_eq!(session.broadcast.len(), 2);
    }

    #[test]
    fn begin_game_anchors_the_game_segment() {
        let session = Session::new(test_config());
        session.broadcast_accepted(accepted(0));
        session.broadcast_accepted(accepted(1));
        session.begin_game(game_started(), turn(0));

        let state = session.state.lock().unwrap();
        assert_eq!(state.phase, Phase::Game);
        assert_eq!(state.game_head, Some(2));
        assert_eq!(session.broadcast.len(), 4, "GameStarted and Turn 0");
    }

    #[test]
    fn end_game_resets_segments_and_phase() {
        let session = Session::new(test_config());
        session.broadcast_accepted(accepted(0));
        session.begin_game(game_started(), turn(0));
        session.end_game(ServerMessage::GameEnded {
            scores: BTreeMap::new(),
        });

        assert_eq!(session.phase(), Phase::Lobby);
        let state = session.state.lock().unwrap();
        assert_eq!(state.accepted_head, None);
        assert_eq!(state.game_head, None);
    }

    #[test]
    fn round_robin_wraps_and_skips_nothing() {
        let session = Session::new(test_config());
        {
            let mut state = session.state.lock().unwrap();
            for id in [0u64, 1, 2] {
                state
                    .connections
                    .insert(id, Arc::new(Connection::new(id, "127.0.0.1:1".parse().unwrap())));
            }
        }

        let (first, _) = session.next_connection(None).unwrap();
        let (second, _) = session.next_connection(Some(first)).unwrap();
        let (third, _) = session.next_connection(Some(second)).unwrap();
        let (wrapped, _) = session.next_connection(Some(third)).unwrap();
        assert_eq!((first, second, third, wrapped), (0, 1, 2, 0));
    }

    #[test]
    fn next_connection_on_empty_registry() {
        let session = Session::new(test_config());
        assert!(session.next_connection(None).is_none());
    }
}
