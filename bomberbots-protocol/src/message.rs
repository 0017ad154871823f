//! Client↔server wire messages.
//!
//! Every message leads with a single discriminant byte; payload fields
//! follow in declaration order, big-endian. Discriminants outside the
//! declared range fail with [`WireError::BadType`].

use std::collections::BTreeMap;

use crate::buffer::{Reader, Writer};
use crate::error::{WireError, WireResult};
use crate::types::{Direction, Player, Position, Wire};

// =============================================================================
// CLIENT -> SERVER MESSAGES
// =============================================================================

/// Messages sent from client to server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientMessage {
    /// Request to join the next game under the given display name.
    Join {
        /// Display name shown to other players.
        name: String,
    },

    /// Drop a bomb on the player's current cell.
    PlaceBomb,

    /// Place a block on the player's current cell.
    PlaceBlock,

    /// Step one cell in the given direction.
    Move {
        /// Where to step.
        direction: Direction,
    },
}

impl Wire for ClientMessage {
    fn encode(&self, w: &mut Writer) -> WireResult<()> {
        match self {
            Self::Join { name } => {
                w.write_u8(0)?;
                w.write_string(name)
            }
            Self::PlaceBomb => w.write_u8(1),
            Self::PlaceBlock => w.write_u8(2),
            Self::Move { direction } => {
                w.write_u8(3)?;
                direction.encode(w)
            }
        }
    }

    fn decode(r: &mut Reader<'_>) -> WireResult<Self> {
        match r.read_u8()? {
            0 => Ok(Self::Join {
                name: r.read_string()?,
            }),
            1 => Ok(Self::PlaceBomb),
            2 => Ok(Self::PlaceBlock),
            3 => Ok(Self::Move {
                direction: Direction::decode(r)?,
            }),
            other => Err(WireError::BadType(other)),
        }
    }
}

// =============================================================================
// SERVER -> CLIENT MESSAGES
// =============================================================================

/// One thing that happened during a turn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    /// A bomb was placed.
    BombPlaced {
        /// Bomb id, strictly increasing within a run.
        id: u32,
        /// Cell the bomb occupies.
        position: Position,
    },

    /// A bomb exploded. Cell lists may repeat entries across simultaneous
    /// bombs; consumers deduplicate.
    BombExploded {
        /// Id of the exploded bomb.
        id: u32,
        /// Players caught in the blast.
        players_destroyed: Vec<u8>,
        /// Blocks destroyed by the blast.
        blocks_destroyed: Vec<Position>,
    },

    /// A player occupies a new cell (spawn, step or teleport).
    PlayerMoved {
        /// Player id.
        id: u8,
        /// New cell.
        position: Position,
    },

    /// A block appeared on the board.
    BlockPlaced {
        /// Cell of the new block.
        position: Position,
    },
}

impl Wire for Event {
    fn encode(&self, w: &mut Writer) -> WireResult<()> {
        match self {
            Self::BombPlaced { id, position } => {
                w.write_u8(0)?;
                w.write_u32(*id)?;
                position.encode(w)
            }
            Self::BombExploded {
                id,
                players_destroyed,
                blocks_destroyed,
            } => {
                w.write_u8(1)?;
                w.write_u32(*id)?;
                players_destroyed.encode(w)?;
                blocks_destroyed.encode(w)
            }
            Self::PlayerMoved { id, position } => {
                w.write_u8(2)?;
                w.write_u8(*id)?;
                position.encode(w)
            }
            Self::BlockPlaced { position } => {
                w.write_u8(3)?;
                position.encode(w)
            }
        }
    }

    fn decode(r: &mut Reader<'_>) -> WireResult<Self> {
        match r.read_u8()? {
            0 => Ok(Self::BombPlaced {
                id: r.read_u32()?,
                position: Position::decode(r)?,
            }),
            1 => Ok(Self::BombExploded {
                id: r.read_u32()?,
                players_destroyed: Vec::decode(r)?,
                blocks_destroyed: Vec::decode(r)?,
            }),
            2 => Ok(Self::PlayerMoved {
                id: r.read_u8()?,
                position: Position::decode(r)?,
            }),
            3 => Ok(Self::BlockPlaced {
                position: Position::decode(r)?,
            }),
            other => Err(WireError::BadType(other)),
        }
    }
}

/// Messages sent from server to client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServerMessage {
    /// Greeting with the immutable game parameters.
    Hello {
        /// Server display name.
        server_name: String,
        /// Number of players a game waits for.
        player_count: u8,
        /// Board width.
        size_x: u16,
        /// Board height.
        size_y: u16,
        /// Number of simulated turns per game.
        game_length: u16,
        /// Blast radius of every bomb.
        explosion_radius: u16,
        /// Turns from placement to explosion.
        bomb_timer: u16,
    },

    /// A player was admitted to the upcoming game.
    AcceptedPlayer {
        /// Assigned player id, dense from 0 in admission order.
        id: u8,
        /// The player's name and address.
        player: Player,
    },

    /// The game begins; carries the full roster.
    GameStarted {
        /// Admitted players keyed by id.
        players: BTreeMap<u8, Player>,
    },

    /// One simulated turn and everything that happened in it.
    Turn {
        /// Turn number; 0 is the opening turn.
        turn: u16,
        /// Events in simulation order.
        events: Vec<Event>,
    },

    /// The game is over.
    GameEnded {
        /// Total deaths per player id.
        scores: BTreeMap<u8, u32>,
    },
}

impl Wire for ServerMessage {
    fn encode(&self, w: &mut Writer) -> WireResult<()> {
        match self {
            Self::Hello {
                server_name,
                player_count,
                size_x,
                size_y,
                game_length,
                explosion_radius,
                bomb_timer,
            } => {
                w.write_u8(0)?;
                w.write_string(server_name)?;
                w.write_u8(*player_count)?;
                w.write_u16(*size_x)?;
                w.write_u16(*size_y)?;
                w.write_u16(*game_length)?;
                w.write_u16(*explosion_radius)?;
                w.write_u16(*bomb_timer)
            }
            Self::AcceptedPlayer { id, player } => {
                w.write_u8(1)?;
                w.write_u8(*id)?;
                player.encode(w)
            }
            Self::GameStarted { players } => {
                w.write_u8(2)?;
                players.encode(w)
            }
            Self::Turn { turn, events } => {
                w.write_u8(3)?;
                w.write_u16(*turn)?;
                events.encode(w)
            }
            Self::GameEnded { scores } => {
                w.write_u8(4)?;
                scores.encode(w)
            }
        }
    }

    fn decode(r: &mut Reader<'_>) -> WireResult<Self> {
        match r.read_u8()? {
            0 => Ok(Self::Hello {
                server_name: r.read_string()?,
                player_count: r.read_u8()?,
                size_x: r.read_u16()?,
                size_y: r.read_u16()?,
                game_length: r.read_u16()?,
                explosion_radius: r.read_u16()?,
                bomb_timer: r.read_u16()?,
            }),
            1 => Ok(Self::AcceptedPlayer {
                id: r.read_u8()?,
                player: Player::decode(r)?,
            }),
            2 => Ok(Self::GameStarted {
                players: BTreeMap::decode(r)?,
            }),
            3 => Ok(Self::Turn {
                turn: r.read_u16()?,
                events: Vec::decode(r)?,
            }),
            4 => Ok(Self::GameEnded {
                scores: BTreeMap::decode(r)?,
            }),
            other => Err(WireError::BadType(other)),
        }
    }
}
