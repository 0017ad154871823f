//! The two client I/O loops.
//!
//! Both loops share the reducer behind one mutex; each owns its own
//! socket halves, so neither can interleave partial messages on a
//! transport the other uses.

use std::sync::Arc;

use bomberbots_protocol::{
    ClientMessage, InputMessage, ServerMessage, TcpReader, TcpWriter, UdpTransport, WireError,
};
use tokio::sync::Mutex;
use tracing::debug;

use crate::config::ClientError;
use crate::reducer::{Phase, Reducer};

/// Translates one GUI input under the current phase.
///
/// While the lobby is open every input kind becomes `Join` — the GUI has
/// no join button, so any keypress volunteers the player. In a game,
/// inputs forward one-to-one.
pub fn translate_input(input: InputMessage, phase: Phase, player_name: &str) -> ClientMessage {
    match phase {
        Phase::Lobby => ClientMessage::Join {
            name: player_name.to_string(),
        },
        Phase::Game => match input {
            InputMessage::PlaceBomb => ClientMessage::PlaceBomb,
            InputMessage::PlaceBlock => ClientMessage::PlaceBlock,
            InputMessage::Move { direction } => ClientMessage::Move { direction },
        },
    }
}

/// GUI→server loop: decode a datagram, translate, send reliably.
///
/// Undecodable datagrams are skipped without touching any state; a
/// failed TCP send is fatal.
pub async fn gui_to_server(
    mut gui: UdpTransport,
    mut server: TcpWriter,
    state: Arc<Mutex<Reducer>>,
    player_name: String,
) -> Result<(), ClientError> {
    loop {
        let input = match gui.recv::<InputMessage>().await {
            Ok(input) => input,
            Err(WireError::BadType(d)) => {
                debug!("dropping GUI datagram with unknown discriminant {d}");
                continue;
            }
            Err(WireError::BadRead) => {
                debug!("dropping malformed GUI datagram");
                continue;
            }
            Err(e) => return Err(e.into()),
        };

        let message = {
            let reducer = state.lock().await;
            translate_input(input, reducer.phase(), &player_name)
        };
        server.send(&message).await?;
    }
}

/// Server→GUI loop: fold each server message into the reducer and
/// forward the resulting snapshot, one datagram per message.
///
/// Any server-side read failure is fatal to the client; `GameStarted`
/// folds silently (the next `Turn(0)` produces the first game frame).
pub async fn server_to_gui(
    mut server: TcpReader,
    gui: UdpTransport,
    state: Arc<Mutex<Reducer>>,
) -> Result<(), ClientError> {
    loop {
        let message: ServerMessage = server.recv().await?;
        let draw = {
            let mut reducer = state.lock().await;
            reducer.apply(&message)
        };
        if let Some(draw) = draw {
            gui.send(&draw).await?;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bomberbots_protocol::Direction;

    #[test]
    fn lobby_always_joins() {
        for input in [
            InputMessage::PlaceBomb,
            InputMessage::PlaceBlock,
            InputMessage::Move {
                direction: Direction::Up,
            },
        ] {
            let message = translate_input(input, Phase::Lobby, "alice");
            assert_eq!(
                message,
                ClientMessage::Join {
                    name: "alice".into()
                }
            );
        }
    }

    #[test]
    fn game_forwards_one_to_one() {
        assert_eq!(
            translate_input(InputMessage::PlaceBomb, Phase::Game, "alice"),
            ClientMessage::PlaceBomb
        );
        assert_eq!(
            translate_input(InputMessage::PlaceBlock, Phase::Game, "alice"),
            ClientMessage::PlaceBlock
        );
        assert_eq!(
            translate_input(
                InputMessage::Move {
                    direction: Direction::Left
                },
                Phase::Game,
                "alice"
            ),
            ClientMessage::Move {
                direction: Direction::Left
            }
        );
    }
}
