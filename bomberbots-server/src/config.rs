//! Command-line options and the immutable per-run game configuration.

use clap::Parser;

/// Command-line surface of the server binary.
#[derive(Parser, Debug)]
#[command(name = "bomberbots-server", version, about = "Bomberbots game server")]
pub struct ServerOptions {
    /// Server display name sent in every Hello.
    #[arg(long)]
    pub server_name: String,

    /// TCP port to listen on.
    #[arg(long)]
    pub port: u16,

    /// Number of players a game waits for.
    #[arg(long, value_parser = clap::value_parser!(u8).range(1..))]
    pub players_count: u8,

    /// Board width in cells.
    #[arg(long, value_parser = clap::value_parser!(u16).range(1..))]
    pub size_x: u16,

    /// Board height in cells.
    #[arg(long, value_parser = clap::value_parser!(u16).range(1..))]
    pub size_y: u16,

    /// Number of simulated turns per game.
    #[arg(long)]
    pub game_length: u16,

    /// Blast radius of every bomb, in cells.
    #[arg(long)]
    pub explosion_radius: u16,

    /// Turns from bomb placement to explosion.
    #[arg(long)]
    pub bomb_timer: u16,

    /// Wall-clock duration of one turn, in milliseconds.
    #[arg(long)]
    pub turn_duration: u64,

    /// Number of random blocks drawn for the opening turn.
    #[arg(long)]
    pub initial_blocks: u16,

    /// RNG seed; the same seed and join order replay the same game.
    #[arg(long, default_value_t = 0)]
    pub seed: u32,
}

impl ServerOptions {
    /// Freezes the options into the per-run configuration.
    pub fn into_config(self) -> GameConfig {
        GameConfig {
            server_name: self.server_name,
            port: self.port,
            player_count: self.players_count,
            size_x: self.size_x,
            size_y: self.size_y,
            game_length: self.game_length,
            explosion_radius: self.explosion_radius,
            bomb_timer: self.bomb_timer,
            turn_duration: self.turn_duration,
            initial_blocks: self.initial_blocks,
            seed: self.seed,
        }
    }
}

/// Immutable configuration of a server run.
#[derive(Debug, Clone)]
pub struct GameConfig {
    /// Server display name.
    pub server_name: String,
    /// TCP port to listen on.
    pub port: u16,
    /// Number of players a game waits for.
    pub player_count: u8,
    /// Board width.
    pub size_x: u16,
    /// Board height.
    pub size_y: u16,
    /// Number of simulated turns per game.
    pub game_length: u16,
    /// Blast radius of every bomb.
    pub explosion_radius: u16,
    /// Turns from placement to explosion.
    pub bomb_timer: u16,
    /// Milliseconds per turn.
    pub turn_duration: u64,
    /// Random blocks drawn for the opening turn.
    pub initial_blocks: u16,
    /// RNG seed.
    pub seed: u32,
}
