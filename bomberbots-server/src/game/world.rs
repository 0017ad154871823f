//! Authoritative per-game world state and the turn phases.
//!
//! Everything here is pure simulation: no sockets, no clocks, no
//! channels. The engine task feeds in player actions and the RNG; each
//! phase returns the events it produced, in the exact order they are
//! broadcast.

use std::cmp::Reverse;
use std::collections::{BTreeMap, BTreeSet, BinaryHeap};

use bomberbots_protocol::{ClientMessage, Direction, Event, Player, Position};

use crate::config::GameConfig;
use crate::game::rng::GameRng;

/// An admitted player, bound to the connection that joined them.
#[derive(Debug, Clone)]
pub struct JoinedPlayer {
    /// Connection the player joined from. The bond is fixed for the
    /// whole game even if the connection drops.
    pub connection_id: u64,
    /// Wire identity (name and address).
    pub player: Player,
    position: Position,
}

/// A bomb waiting to explode, ordered by (explosion turn, position, id).
type FusedBomb = Reverse<(u16, Position, u32)>;

/// Authoritative state of one game.
pub struct World {
    config: GameConfig,
    players: Vec<JoinedPlayer>,
    blocks: BTreeSet<Position>,
    bombs: BinaryHeap<FusedBomb>,
    next_bomb_id: u32,
    scores: BTreeMap<u8, u32>,
    players_by_position: BTreeMap<Position, BTreeSet<u8>>,
    destroyed_players: BTreeSet<u8>,
    destroyed_blocks: BTreeSet<Position>,
}

impl World {
    /// Creates the world for one game from the admission result.
    pub fn new(config: GameConfig, players: Vec<(u64, Player)>) -> Self {
        let scores = (0..players.len() as u8).map(|id| (id, 0)).collect();
        let players = players
            .into_iter()
            .map(|(connection_id, player)| JoinedPlayer {
                connection_id,
                player,
                position: Position::default(),
            })
            .collect();
        Self {
            config,
            players,
            blocks: BTreeSet::new(),
            bombs: BinaryHeap::new(),
            next_bomb_id: 0,
            scores,
            players_by_position: BTreeMap::new(),
            destroyed_players: BTreeSet::new(),
            destroyed_blocks: BTreeSet::new(),
        }
    }

    /// Number of players in the game.
    pub fn player_count(&self) -> usize {
        self.players.len()
    }

    /// Connection a player joined from.
    pub fn connection_of(&self, id: u8) -> u64 {
        self.players[id as usize].connection_id
    }

    /// The roster carried by `GameStarted`.
    pub fn roster(&self) -> BTreeMap<u8, Player> {
        self.players
            .iter()
            .enumerate()
            .map(|(id, p)| (id as u8, p.player.clone()))
            .collect()
    }

    /// Death totals carried by `GameEnded`.
    pub fn scores(&self) -> BTreeMap<u8, u32> {
        self.scores.clone()
    }

    /// Generates turn 0: spawns every player on a drawn cell (in join
    /// order), then draws the initial blocks, silently skipping cells
    /// drawn twice.
    pub fn opening_turn(&mut self, rng: &mut GameRng) -> Vec<Event> {
        let mut events = Vec::new();
        for id in 0..self.players.len() as u8 {
            let position = self.draw_cell(rng);
            self.players[id as usize].position = position;
            self.players_by_position
                .entry(position)
                .or_default()
                .insert(id);
            events.push(Event::PlayerMoved { id, position });
        }
        for _ in 0..self.config.initial_blocks {
            let position = self.draw_cell(rng);
            if self.blocks.insert(position) {
                events.push(Event::BlockPlaced { position });
            }
        }
        events
    }

    /// Detonates every bomb whose fuse reaches `turn`, in ascending
    /// (explosion turn, position, id) order, then clears the destroyed
    /// blocks off the board.
    pub fn explosion_phase(&mut self, turn: u16) -> Vec<Event> {
        self.destroyed_players.clear();
        self.destroyed_blocks.clear();

        let mut events = Vec::new();
        loop {
            match self.bombs.peek() {
                Some(&Reverse((fuse, _, _))) if fuse == turn => {}
                _ => break,
            }
            let Some(Reverse((_, position, id))) = self.bombs.pop() else {
                break;
            };

            let mut players_destroyed = Vec::new();
            let mut blocks_destroyed = Vec::new();

            // The bomb cell goes first; a block there absorbs the whole
            // blast and no ray extends.
            if self.blast_cell(position, &mut players_destroyed, &mut blocks_destroyed) {
                const RAYS: [(i32, i32); 4] = [(-1, 0), (1, 0), (0, -1), (0, 1)];
                for (dx, dy) in RAYS {
                    for step in 1..=i32::from(self.config.explosion_radius) {
                        let x = i32::from(position.x) + dx * step;
                        let y = i32::from(position.y) + dy * step;
                        if x < 0
                            || y < 0
                            || x >= i32::from(self.config.size_x)
                            || y >= i32::from(self.config.size_y)
                        {
                            break;
                        }
                        let cell = Position::new(x as u16, y as u16);
                        if !self.blast_cell(cell, &mut players_destroyed, &mut blocks_destroyed) {
                            break;
                        }
                    }
                }
            }

            events.push(Event::BombExploded {
                id,
                players_destroyed,
                blocks_destroyed,
            });
        }

        for block in &self.destroyed_blocks {
            self.blocks.remove(block);
        }
        events
    }

    /// Runs one player's slot of the action phase.
    ///
    /// A player destroyed this turn teleports to a drawn cell (two RNG
    /// draws, x then y) and scores a death; their pending action, already
    /// taken from the mailbox, is discarded unread. Otherwise the action
    /// is dispatched, and any failed precondition silently does nothing.
    pub fn player_phase(
        &mut self,
        id: u8,
        action: Option<ClientMessage>,
        turn: u16,
        rng: &mut GameRng,
    ) -> Option<Event> {
        let position = self.players[id as usize].position;

        if self.destroyed_players.contains(&id) {
            let next = self.draw_cell(rng);
            self.relocate(id, position, next);
            *self.scores.entry(id).or_insert(0) += 1;
            return Some(Event::PlayerMoved { id, position: next });
        }

        match action? {
            ClientMessage::PlaceBomb => {
                let bomb_id = self.next_bomb_id;
                self.next_bomb_id += 1;
                let fuse = turn.saturating_add(self.config.bomb_timer);
                self.bombs.push(Reverse((fuse, position, bomb_id)));
                Some(Event::BombPlaced {
                    id: bomb_id,
                    position,
                })
            }
            ClientMessage::PlaceBlock => {
                if !self.blocks.insert(position) {
                    return None;
                }
                Some(Event::BlockPlaced { position })
            }
            ClientMessage::Move { direction } => {
                let (dx, dy) = match direction {
                    Direction::Up => (0, 1),
                    Direction::Right => (1, 0),
                    Direction::Down => (0, -1),
                    Direction::Left => (-1, 0),
                };
                let x = i32::from(position.x) + dx;
                let y = i32::from(position.y) + dy;
                if x < 0
                    || y < 0
                    || x >= i32::from(self.config.size_x)
                    || y >= i32::from(self.config.size_y)
                {
                    return None;
                }
                let next = Position::new(x as u16, y as u16);
                if self.blocks.contains(&next) {
                    return None;
                }
                self.relocate(id, position, next);
                Some(Event::PlayerMoved { id, position: next })
            }
            // Join is only meaningful in the lobby.
            ClientMessage::Join { .. } => None,
        }
    }

    fn draw_cell(&self, rng: &mut GameRng) -> Position {
        let x = rng.next_coord(self.config.size_x);
        let y = rng.next_coord(self.config.size_y);
        Position::new(x, y)
    }

    /// Destroys everything on one blast cell. Returns whether the blast
    /// continues past it.
    fn blast_cell(
        &mut self,
        cell: Position,
        players_destroyed: &mut Vec<u8>,
        blocks_destroyed: &mut Vec<Position>,
    ) -> bool {
        if let Some(ids) = self.players_by_position.get(&cell) {
            for id in ids {
                players_destroyed.push(*id);
                self.destroyed_players.insert(*id);
            }
        }
        if self.blocks.contains(&cell) {
            blocks_destroyed.push(cell);
            self.destroyed_blocks.insert(cell);
            return false;
        }
        true
    }

    fn relocate(&mut self, id: u8, from: Position, to: Position) {
        if let Some(ids) = self.players_by_position.get_mut(&from) {
            ids.remove(&id);
            if ids.is_empty() {
                self.players_by_position.remove(&from);
            }
        }
        self.players_by_position.entry(to).or_default().insert(id);
        self.players[id as usize].position = to;
    }

    #[cfg(test)]
    fn position_of(&self, id: u8) -> Position {
        self.players[id as usize].position
    }

    #[cfg(test)]
    fn has_block(&self, position: Position) -> bool {
        self.blocks.contains(&position)
    }
}
