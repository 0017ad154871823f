//! GUI↔client datagram messages.
//!
//! Input messages arrive from the rendering GUI over UDP; draw messages
//! go back the other way. Both sides fit in single datagrams.

use std::collections::BTreeMap;

use crate::buffer::{Reader, Writer};
use crate::error::{WireError, WireResult};
use crate::types::{BombInfo, Direction, Player, Position, Wire};

/// High-frequency input from the GUI.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMessage {
    /// Drop a bomb.
    PlaceBomb,
    /// Place a block.
    PlaceBlock,
    /// Step in a direction.
    Move {
        /// Where to step.
        direction: Direction,
    },
}

impl Wire for InputMessage {
    fn encode(&self, w: &mut Writer) -> WireResult<()> {
        match self {
            Self::PlaceBomb => w.write_u8(0),
            Self::PlaceBlock => w.write_u8(1),
            Self::Move { direction } => {
                w.write_u8(2)?;
                direction.encode(w)
            }
        }
    }

    fn decode(r: &mut Reader<'_>) -> WireResult<Self> {
        match r.read_u8()? {
            0 => Ok(Self::PlaceBomb),
            1 => Ok(Self::PlaceBlock),
            2 => Ok(Self::Move {
                direction: Direction::decode(r)?,
            }),
            other => Err(WireError::BadType(other)),
        }
    }
}

/// A complete renderable world snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DrawMessage {
    /// Waiting room: static parameters plus the players seen so far.
    Lobby {
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
        /// Accepted players keyed by id.
        players: BTreeMap<u8, Player>,
    },

    /// A game in progress.
    Game {
        /// Server display name.
        server_name: String,
        /// Board width.
        size_x: u16,
        /// Board height.
        size_y: u16,
        /// Number of simulated turns per game.
        game_length: u16,
        /// Last folded turn number.
        turn: u16,
        /// Roster keyed by id.
        players: BTreeMap<u8, Player>,
        /// Current cell of every player.
        player_positions: BTreeMap<u8, Position>,
        /// Blocks on the board.
        blocks: Vec<Position>,
        /// Active bombs with their countdowns.
        bombs: Vec<BombInfo>,
        /// Cells caught in last turn's explosions.
        explosions: Vec<Position>,
        /// Deaths per player id so far.
        scores: BTreeMap<u8, u32>,
    },
}

impl Wire for DrawMessage {
    fn encode(&self, w: &mut Writer) -> WireResult<()> {
        match self {
            Self::Lobby {
                server_name,
                player_count,
                size_x,
                size_y,
                game_length,
                explosion_radius,
                bomb_timer,
                players,
            } => {
                w.write_u8(0)?;
                w.write_string(server_name)?;
                w.write_u8(*player_count)?;
                w.write_u16(*size_x)?;
                w.write_u16(*size_y)?;
                w.write_u16(*game_length)?;
                w.write_u16(*explosion_radius)?;
                w.write_u16(*bomb_timer)?;
                players.encode(w)
            }
            Self::Game {
                server_name,
                size_x,
                size_y,
                game_length,
                turn,
                players,
                player_positions,
                blocks,
                bombs,
                explosions,
                scores,
            } => {
                w.write_u8(1)?;
                w.write_string(server_name)?;
                w.write_u16(*size_x)?;
                w.write_u16(*size_y)?;
                w.write_u16(*game_length)?;
                w.write_u16(*turn)?;
                players.encode(w)?;
                player_positions.encode(w)?;
                blocks.encode(w)?;
                bombs.encode(w)?;
                explosions.encode(w)?;
                scores.encode(w)
            }
        }
    }

    fn decode(r: &mut Reader<'_>) -> WireResult<Self> {
        match r.read_u8()? {
            0 => Ok(Self::Lobby {
                server_name: r.read_string()?,
                player_count: r.read_u8()?,
                size_x: r.read_u16()?,
                size_y: r.read_u16()?,
                game_length: r.read_u16()?,
                explosion_radius: r.read_u16()?,
                bomb_timer: r.read_u16()?,
                players: BTreeMap::decode(r)?,
            }),
            1 => Ok(Self::Game {
                server_name: r.read_string()?,
                size_x: r.read_u16()?,
                size_y: r.read_u16()?,
                game_length: r.read_u16()?,
                turn: r.read_u16()?,
                players: BTreeMap::decode(r)?,
                player_positions: BTreeMap::decode(r)?,
                blocks: Vec::decode(r)?,
                bombs: Vec::decode(r)?,
                explosions: Vec::decode(r)?,
                scores: BTreeMap::decode(r)?,
            }),
            other => Err(WireError::BadType(other)),
        }
    }
}
