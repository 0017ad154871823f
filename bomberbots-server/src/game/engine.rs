//! The engine task: lobby admission, the turn loop, and the return to
//! lobby.
//!
//! This task is the single owner of the RNG and of all world mutation,
//! which is what keeps games deterministic: the only nondeterminism that
//! reaches the simulation is the admission order of Joins and the
//! content of each mailbox at the moment a turn fires.

use std::sync::Arc;
use std::time::Duration;

use bomberbots_protocol::{ClientMessage, Player, ServerMessage};
use tokio::sync::watch;
use tracing::{debug, info};

use crate::game::rng::GameRng;
use crate::game::world::World;
use crate::net::server::ServerError;
use crate::net::session::Session;

/// Runs the lobby → game → lobby lifecycle until shutdown.
pub async fn run(session: Arc<Session>) -> Result<(), ServerError> {
    let mut rng = GameRng::new(session.config.seed);
    let mut shutdown = session.subscribe_shutdown();
    let mut pending = session.pending().subscribe();

    loop {
        let players = collect_players(&session, &mut pending, &mut shutdown).await?;
        let mut world = World::new(session.config.clone(), players);

        start_game(&session, &mut world, &mut rng);
        run_game(&session, &mut world, &mut rng, &mut shutdown).await?;
        finish_game(&session, &world);
    }
}

/// Lobby admission: round-robins over connections until `player_count`
/// Joins are consumed, one connection per pending-message wakeup.
async fn collect_players(
    session: &Arc<Session>,
    pending: &mut watch::Receiver<usize>,
    shutdown: &mut watch::Receiver<bool>,
) -> Result<Vec<(u64, Player)>, ServerError> {
    let player_count = session.config.player_count as usize;
    let mut joined: Vec<(u64, Player)> = Vec::with_capacity(player_count);
    let mut last_visited: Option<u64> = None;

    info!("lobby open, waiting for {player_count} players");
    while joined.len() < player_count {
        tokio::select! {
            _ = pending.wait_for(|count| *count > 0) => {}
            _ = shutdown.wait_for(|s| *s) => return Err(ServerError::Interrupted),
        }

        // One round-robin step per wakeup; no connection is starved.
        let Some((id, conn)) = session.next_connection(last_visited) else {
            continue;
        };
        last_visited = Some(id);

        if conn.is_disconnected() {
            session.remove_connection(id);
            continue;
        }
        let Some(message) = conn.take_message(session.pending()) else {
            continue;
        };
        // Only the first Join per connection and game counts; anything
        // else is meaningless in the lobby and is dropped.
        if let ClientMessage::Join { name } = message {
            if !conn.set_joined() {
                let player_id = joined.len() as u8;
                let player = Player {
                    name,
                    address: conn.addr.to_string(),
                };
                info!(
                    "accepted player {player_id} '{}' from {}",
                    player.name, player.address
                );
                joined.push((id, player.clone()));
                session.broadcast_accepted(ServerMessage::AcceptedPlayer {
                    id: player_id,
                    player,
                });
            }
        }
    }
    Ok(joined)
}

/// Enters the game phase: `GameStarted` and turn 0 are generated and
/// appended atomically so every joiner sees a consistent prefix.
fn start_game(session: &Arc<Session>, world: &mut World, rng: &mut GameRng) {
    let game_started = ServerMessage::GameStarted {
        players: world.roster(),
    };
    let events = world.opening_turn(rng);
    let turn_zero = ServerMessage::Turn { turn: 0, events };
    session.begin_game(game_started, turn_zero);
    info!("game started with {} players", world.player_count());
}

/// The tick loop: one turn per `turn_duration` sleep.
async fn run_game(
    session: &Arc<Session>,
    world: &mut World,
    rng: &mut GameRng,
    shutdown: &mut watch::Receiver<bool>,
) -> Result<(), ServerError> {
    let turn_duration = Duration::from_millis(session.config.turn_duration);

    for turn in 1..=session.config.game_length {
        tokio::select! {
            _ = tokio::time::sleep(turn_duration) => {}
            _ = shutdown.wait_for(|s| *s) => return Err(ServerError::Interrupted),
        }

        let mut events = world.explosion_phase(turn);
        for player_id in 0..world.player_count() as u8 {
            // The mailbox is cleared regardless of what happens to the
            // action; a destroyed player's command is discarded unread.
            let action = session.take_player_message(world.connection_of(player_id));
            if let Some(event) = world.player_phase(player_id, action, turn, rng) {
                events.push(event);
            }
        }

        debug!("turn {turn}: {} events", events.len());
        session.broadcast_turn(ServerMessage::Turn { turn, events });
    }
    Ok(())
}

/// Broadcasts the final scores and returns the session to lobby.
fn finish_game(session: &Arc<Session>, world: &World) {
    let scores = world.scores();
    info!("game ended, scores: {scores:?}");
    session.end_game(ServerMessage::GameEnded { scores });
}
