//! Robot Arena - A turn-based terminal survival game
//!
//! Core modules:
//! - `sim`: Arena engine (board generation, turns, collisions, tools)
//! - `highscores`: Top-10 leaderboard store
//! - `settings`: Player and arena configuration

pub mod highscores;
pub mod settings;
pub mod sim;

pub use highscores::{HighScores, Leaderboard, ScoreEntry};
pub use settings::Settings;

/// Game tuning constants
pub mod consts {
    /// Tool stock at the start of a game
    pub const START_TELEPORTS: u32 = 5;
    pub const START_EMPS: u32 = 3;
    pub const START_BLASTERS: u32 = 2;

    /// Tool stock granted on every level advance (added, not reset)
    pub const LEVEL_TELEPORT_BONUS: u32 = 5;
    pub const LEVEL_EMP_BONUS: u32 = 3;
    pub const LEVEL_BLASTER_BONUS: u32 = 1;

    /// Score awarded for clearing a level
    pub const LEVEL_CLEAR_BONUS: i64 = 50;
    /// Base points per destroyed robot
    pub const POINTS_PER_KILL: i64 = 10;
    /// Consecutive kills needed for each +1x multiplier step
    pub const KILLS_PER_MULTIPLIER: u32 = 5;
    /// Score cost of a teleport
    pub const TELEPORT_PENALTY: i64 = 2;

    /// Turns robots stay frozen after an EMP
    pub const EMP_DURATION_TURNS: u32 = 5;
    /// Random cells tried before a teleport gives up
    pub const TELEPORT_MAX_ATTEMPTS: u32 = 100;
    /// Blast zone half-width (1 => 3x3)
    pub const BLAST_RADIUS: i32 = 1;

    /// Level 1 difficulty
    pub const BASE_ROBOTS: usize = 10;
    pub const BASE_OBSTACLES: usize = 15;
    pub const BASE_MIN_SPAWN_DIST: i32 = 5;
    /// Per-level difficulty growth
    pub const ROBOTS_PER_LEVEL: usize = 2;
    pub const OBSTACLES_PER_LEVEL: usize = 3;
    /// Spawn distance never shrinks below this
    pub const MIN_SPAWN_DIST_FLOOR: i32 = 3;
}
