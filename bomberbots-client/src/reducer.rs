//! The client state reducer.
//!
//! The server's event log is incremental: turns carry only what changed.
//! The reducer folds each server message into derived state (active
//! bombs, last-turn explosions, cumulative scores, destroyed
//! players/blocks) and projects a complete draw snapshot after every
//! message that changes what the GUI should render.

use std::collections::{BTreeMap, BTreeSet};

use bomberbots_protocol::types::block_list;
use bomberbots_protocol::{
    BombInfo, DrawMessage, Event, Player, Position, ServerMessage,
};

/// Whether the client is in the waiting room or watching a game.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// No game running; inputs translate to `Join`.
    Lobby,
    /// A game is running; inputs forward one-to-one.
    Game,
}

/// Folds server messages into a renderable world state.
pub struct Reducer {
    phase: Phase,

    // Static parameters cached from Hello.
    server_name: String,
    player_count: u8,
    size_x: u16,
    size_y: u16,
    game_length: u16,
    explosion_radius: u16,
    bomb_timer: u16,

    turn: u16,
    players: BTreeMap<u8, Player>,
    positions: BTreeMap<u8, Position>,
    blocks: BTreeSet<Position>,
    active_bombs: BTreeMap<u32, BombInfo>,
    explosions: BTreeSet<Position>,
    scores: BTreeMap<u8, u32>,

    // Per-turn scratch, rebuilt while folding each Turn.
    destroyed_players: BTreeSet<u8>,
    destroyed_blocks: BTreeSet<Position>,
}

impl Reducer {
    /// Creates an empty lobby-state reducer.
    pub fn new() -> Self {
        Self {
            phase: Phase::Lobby,
            server_name: String::new(),
            player_count: 0,
            size_x: 0,
            size_y: 0,
            game_length: 0,
            explosion_radius: 0,
            bomb_timer: 0,
            turn: 0,
            players: BTreeMap::new(),
            positions: BTreeMap::new(),
            blocks: BTreeSet::new(),
            active_bombs: BTreeMap::new(),
            explosions: BTreeSet::new(),
            scores: BTreeMap::new(),
            destroyed_players: BTreeSet::new(),
            destroyed_blocks: BTreeSet::new(),
        }
    }

    /// Current phase, deciding the input translation.
    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Folds one server message. Returns the draw snapshot to forward,
    /// or `None` for `GameStarted`: the next `Turn(0)` carries the
    /// material changes, so emitting here would flash an empty board.
    pub fn apply(&mut self, message: &ServerMessage) -> Option<DrawMessage> {
        match message {
            ServerMessage::Hello {
                server_name,
                player_count,
                size_x,
                size_y,
                game_length,
                explosion_radius,
                bomb_timer,
            } => {
                self.server_name = server_name.clone();
                self.player_count = *player_count;
                self.size_x = *size_x;
                self.size_y = *size_y;
                self.game_length = *game_length;
                self.explosion_radius = *explosion_radius;
                self.bomb_timer = *bomb_timer;
                self.phase = Phase::Lobby;
                Some(self.draw())
            }
            ServerMessage::AcceptedPlayer { id, player } => {
                self.players.insert(*id, player.clone());
                self.scores.insert(*id, 0);
                Some(self.draw())
            }
            ServerMessage::GameStarted { players } => {
                self.phase = Phase::Game;
                self.players = players.clone();
                self.positions.clear();
                self.blocks.clear();
                self.active_bombs.clear();
                self.explosions.clear();
                self.turn = 0;
                self.scores = players.keys().map(|id| (*id, 0)).collect();
                None
            }
            ServerMessage::Turn { turn, events } => {
                self.apply_turn(*turn, events);
                Some(self.draw())
            }
            ServerMessage::GameEnded { scores } => {
                self.phase = Phase::Lobby;
                self.positions.clear();
                self.blocks.clear();
                self.active_bombs.clear();
                self.explosions.clear();
                self.scores = scores.clone();
                Some(self.draw())
            }
        }
    }

    fn apply_turn(&mut self, turn: u16, events: &[Event]) {
        self.turn = turn;
        self.destroyed_players.clear();
        self.destroyed_blocks.clear();
        self.explosions.clear();
        for bomb in self.active_bombs.values_mut() {
            bomb.timer = bomb.timer.saturating_sub(1);
        }

        for event in events {
            match event {
                Event::BombPlaced { id, position } => {
                    self.active_bombs.insert(
                        *id,
                        BombInfo {
                            position: *position,
                            timer: self.bomb_timer,
                        },
                    );
                }
                Event::BombExploded {
                    id,
                    players_destroyed,
                    blocks_destroyed,
                } => {
                    if let Some(bomb) = self.active_bombs.remove(id) {
                        self.spread_explosion(bomb.position);
                    }
                    self.destroyed_players.extend(players_destroyed.iter());
                    self.destroyed_blocks.extend(blocks_destroyed.iter());
                }
                Event::PlayerMoved { id, position } => {
                    self.positions.insert(*id, *position);
                }
                Event::BlockPlaced { position } => {
                    self.blocks.insert(*position);
                }
            }
        }

        // Post-processing: one death per destroyed player per turn, and
        // the blasted blocks leave the board only now — mid-turn they
        // still stop explosion rays.
        for id in &self.destroyed_players {
            *self.scores.entry(*id).or_insert(0) += 1;
        }
        for block in &self.destroyed_blocks {
            self.blocks.remove(block);
        }
    }

    /// Recomputes the blast cells of one bomb: four cardinal rays out of
    /// the bomb cell, each stopped by the first block it touches.
    fn spread_explosion(&mut self, from: Position) {
        const RAYS: [(i32, i32); 4] = [(-1, 0), (1, 0), (0, -1), (0, 1)];
        for (dx, dy) in RAYS {
            for step in 0..=i32::from(self.explosion_radius) {
                let x = i32::from(from.x) + dx * step;
                let y = i32::from(from.y) + dy * step;
                if x < 0 || y < 0 || x >= i32::from(self.size_x) || y >= i32::from(self.size_y) {
                    break;
                }
                let cell = Position::new(x as u16, y as u16);
                self.explosions.insert(cell);
                if self.blocks.contains(&cell) {
                    break;
                }
            }
        }
    }

    /// Projects the complete draw snapshot for the current phase.
    pub fn draw(&self) -> DrawMessage {
        match self.phase {
            Phase::Lobby => DrawMessage::Lobby {
                server_name: self.server_name.clone(),
                player_count: self.player_count,
                size_x: self.size_x,
                size_y: self.size_y,
                game_length: self.game_length,
                explosion_radius: self.explosion_radius,
                bomb_timer: self.bomb_timer,
                players: self.players.clone(),
            },
            Phase::Game => DrawMessage::Game {
                server_name: self.server_name.clone(),
                size_x: self.size_x,
                size_y: self.size_y,
                game_length: self.game_length,
                turn: self.turn,
                players: self.players.clone(),
                player_positions: self.positions.clone(),
                blocks: block_list(&self.blocks),
                bombs: self.active_bombs.values().copied().collect(),
                explosions: self.explosions.iter().copied().collect(),
                scores: self.scores.clone(),
            },
        }
    }
}

impl Default for Reducer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hello() -> ServerMessage {
        ServerMessage::Hello {
            server_name: "arena".into(),
            player_count: 2,
            size_x: 8,
            size_y: 8,
            game_length: 5,
            explosion_radius: 2,
            bomb_timer: 3,
        }
    }

    fn player(name: &str) -> Player {
        Player {
            name: name.into(),
            address: "127.0.0.1:1".into(),
        }
    }

    fn started() -> ServerMessage {
        let players = [(0u8, player("alice")), (1u8, player("bob"))]
            .into_iter()
            .collect();
        ServerMessage::GameStarted { players }
    }

    fn turn(n: u16, events: Vec<Event>) -> ServerMessage {
        ServerMessage::Turn { turn: n, events }
    }

    /// Hello + two admissions + game start, with spawns on `a` and `b`.
    fn game_reducer(a: Position, b: Position) -> Reducer {
        let mut reducer = Reducer::new();
        reducer.apply(&hello());
        reducer.apply(&ServerMessage::AcceptedPlayer {
            id: 0,
            player: player("alice"),
        });
        reducer.apply(&ServerMessage::AcceptedPlayer {
            id: 1,
            player: player("bob"),
        });
        assert!(reducer.apply(&started()).is_none());
        reducer.apply(&turn(
            0,
            vec![
                Event::PlayerMoved { id: 0, position: a },
                Event::PlayerMoved { id: 1, position: b },
            ],
        ));
        reducer
    }

    #[test]
    fn hello_is_idempotent() {
        let mut reducer = Reducer::new();
        let first = reducer.apply(&hello()).unwrap();
        let second = reducer.apply(&hello()).unwrap();
        assert_eq!(first, second, "a reconnect greeting redraws the same lobby");
        assert!(matches!(first, DrawMessage::Lobby { .. }));
    }

    #[test]
    fn accepted_player_stays_in_lobby() {
        let mut reducer = Reducer::new();
        reducer.apply(&hello());
        let draw = reducer
            .apply(&ServerMessage::AcceptedPlayer {
                id: 0,
                player: player("alice"),
            })
            .unwrap();
        let DrawMessage::Lobby { players, .. } = draw else {
            panic!("admissions must not flip the draw discriminant");
        };
        assert_eq!(players[&0].name, "alice");
    }

    #[test]
    fn game_started_suppresses_the_draw() {
        let mut reducer = Reducer::new();
        reducer.apply(&hello());
        assert!(reducer.apply(&started()).is_none());
        assert_eq!(reducer.phase(), Phase::Game);
    }

    #[test]
    fn turn_zero_renders_the_opening_state() {
        let reducer = game_reducer(Position::new(1, 6), Position::new(4, 2));
        let DrawMessage::Game {
            turn,
            player_positions,
            scores,
            bombs,
            ..
        } = reducer.draw()
        else {
            panic!("expected a game draw");
        };
        assert_eq!(turn, 0);
        assert_eq!(player_positions[&0], Position::new(1, 6));
        assert_eq!(player_positions[&1], Position::new(4, 2));
        assert_eq!(scores, [(0u8, 0u32), (1u8, 0u32)].into_iter().collect());
        assert!(bombs.is_empty());
    }

    #[test]
    fn bomb_timers_count_down_each_turn() {
        let mut reducer = game_reducer(Position::new(3, 3), Position::new(7, 7));
        reducer.apply(&turn(
            1,
            vec![Event::BombPlaced {
                id: 0,
                position: Position::new(3, 3),
            }],
        ));
        let DrawMessage::Game { bombs, .. } = reducer.draw() else {
            panic!()
        };
        assert_eq!(bombs[0].timer, 3, "a fresh bomb shows the full timer");

        reducer.apply(&turn(2, vec![]));
        reducer.apply(&turn(3, vec![]));
        let DrawMessage::Game { bombs, .. } = reducer.draw() else {
            panic!()
        };
        assert_eq!(bombs[0].timer, 1);
    }

    #[test]
    fn explosion_recomputes_rays_and_scores_once() {
        let mut reducer = game_reducer(Position::new(3, 3), Position::new(5, 3));
        // A block at (4,3) shields bob's cell from the +x ray.
        reducer.apply(&turn(
            1,
            vec![
                Event::BombPlaced {
                    id: 0,
                    position: Position::new(3, 3),
                },
                Event::BlockPlaced {
                    position: Position::new(4, 3),
                },
            ],
        ));
        reducer.apply(&turn(2, vec![]));
        reducer.apply(&turn(3, vec![]));
        let draw = reducer
            .apply(&turn(
                4,
                vec![
                    Event::BombExploded {
                        id: 0,
                        players_destroyed: vec![0],
                        blocks_destroyed: vec![Position::new(4, 3)],
                    },
                    Event::PlayerMoved {
                        id: 0,
                        position: Position::new(6, 1),
                    },
                ],
            ))
            .unwrap();

        let DrawMessage::Game {
            explosions,
            blocks,
            bombs,
            scores,
            player_positions,
            ..
        } = draw
        else {
            panic!()
        };

        // The +x ray stops on the block cell; (5,3) stays clear.
        assert!(explosions.contains(&Position::new(3, 3)));
        assert!(explosions.contains(&Position::new(4, 3)));
        assert!(!explosions.contains(&Position::new(5, 3)));
        // Rays reach radius 2 in the other directions.
        assert!(explosions.contains(&Position::new(1, 3)));
        assert!(explosions.contains(&Position::new(3, 5)));

        assert!(bombs.is_empty(), "the bomb left the active set");
        assert!(!blocks.contains(&Position::new(4, 3)), "blast ate the block");
        assert_eq!(scores[&0], 1);
        assert_eq!(scores[&1], 0);
        assert_eq!(player_positions[&0], Position::new(6, 1));
    }

    #[test]
    fn simultaneous_bombs_score_a_single_death() {
        let mut reducer = game_reducer(Position::new(3, 3), Position::new(3, 4));
        reducer.apply(&turn(
            1,
            vec![
                Event::BombPlaced {
                    id: 0,
                    position: Position::new(3, 3),
                },
                Event::BombPlaced {
                    id: 1,
                    position: Position::new(3, 4),
                },
            ],
        ));
        reducer.apply(&turn(2, vec![]));
        reducer.apply(&turn(3, vec![]));
        let draw = reducer
            .apply(&turn(
                4,
                vec![
                    Event::BombExploded {
                        id: 0,
                        players_destroyed: vec![0, 1],
                        blocks_destroyed: vec![],
                    },
                    Event::BombExploded {
                        id: 1,
                        players_destroyed: vec![1, 0],
                        blocks_destroyed: vec![],
                    },
                ],
            ))
            .unwrap();
        let DrawMessage::Game { scores, .. } = draw else {
            panic!()
        };
        // Both players were listed twice; each dies once this turn.
        assert_eq!(scores[&0], 1);
        assert_eq!(scores[&1], 1);
    }

    #[test]
    fn explosions_clear_on_the_next_turn() {
        let mut reducer = game_reducer(Position::new(3, 3), Position::new(7, 7));
        reducer.apply(&turn(
            1,
            vec![Event::BombPlaced {
                id: 0,
                position: Position::new(3, 3),
            }],
        ));
        reducer.apply(&turn(
            2,
            vec![Event::BombExploded {
                id: 0,
                players_destroyed: vec![],
                blocks_destroyed: vec![],
            }],
        ));
        let draw = reducer.apply(&turn(3, vec![])).unwrap();
        let DrawMessage::Game { explosions, .. } = draw else {
            panic!()
        };
        assert!(explosions.is_empty());
    }

    #[test]
    fn repeated_block_placement_stays_a_set() {
        let mut reducer = game_reducer(Position::new(2, 2), Position::new(7, 7));
        reducer.apply(&turn(
            1,
            vec![Event::BlockPlaced {
                position: Position::new(2, 2),
            }],
        ));
        let draw = reducer
            .apply(&turn(
                2,
                vec![Event::BlockPlaced {
                    position: Position::new(2, 2),
                }],
            ))
            .unwrap();
        let DrawMessage::Game { blocks, .. } = draw else {
            panic!()
        };
        assert_eq!(blocks, vec![Position::new(2, 2)]);
    }

    #[test]
    fn game_ended_returns_to_lobby_with_server_scores() {
        let mut reducer = game_reducer(Position::new(1, 1), Position::new(2, 2));
        let scores: BTreeMap<u8, u32> = [(0u8, 2u32), (1u8, 0u32)].into_iter().collect();
        let draw = reducer
            .apply(&ServerMessage::GameEnded {
                scores: scores.clone(),
            })
            .unwrap();
        assert!(matches!(draw, DrawMessage::Lobby { .. }));
        assert_eq!(reducer.phase(), Phase::Lobby);
        assert_eq!(reducer.scores, scores);
        assert!(reducer.active_bombs.is_empty());
        assert!(reducer.blocks.is_empty());
        assert!(reducer.positions.is_empty());
    }

    #[test]
    fn next_game_starts_clean() {
        let mut reducer = game_reducer(Position::new(1, 1), Position::new(2, 2));
        reducer.apply(&ServerMessage::GameEnded {
            scores: [(0u8, 2u32), (1u8, 1u32)].into_iter().collect(),
        });
        assert!(reducer.apply(&started()).is_none());
        let DrawMessage::Game { scores, turn, .. } = reducer.draw() else {
            panic!()
        };
        assert_eq!(turn, 0);
        assert_eq!(scores.values().sum::<u32>(), 0, "scores reset for the roster");
    }
}
