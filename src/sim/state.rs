//! Game state and core simulation types
//!
//! Everything the presentation layer reads once per frame lives here.

use glam::IVec2;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::spawn::{self, CellSampler};
use crate::consts::*;

/// Grid cell coordinate, `0 <= x < width`, `0 <= y < height`
pub type Position = IVec2;

/// Cardinal step for the player or the blaster target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    pub const ALL: [Direction; 4] = [
        Direction::Up,
        Direction::Down,
        Direction::Left,
        Direction::Right,
    ];

    /// Unit offset (y grows downward)
    pub fn delta(self) -> IVec2 {
        match self {
            Direction::Up => IVec2::NEG_Y,
            Direction::Down => IVec2::Y,
            Direction::Left => IVec2::NEG_X,
            Direction::Right => IVec2::X,
        }
    }

    /// Parse a raw `(dx, dy)` pair; anything but a cardinal unit step is rejected
    pub fn from_delta(dx: i32, dy: i32) -> Option<Self> {
        match (dx, dy) {
            (0, -1) => Some(Direction::Up),
            (0, 1) => Some(Direction::Down),
            (-1, 0) => Some(Direction::Left),
            (1, 0) => Some(Direction::Right),
            _ => None,
        }
    }
}

/// Entity types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntityKind {
    /// Chases the player one step per turn
    Robot,
    /// Blocks robots, kills the player
    Obstacle,
    /// Wreckage from merged robots; wrecks robots that step into it
    Junk,
    /// Decorative only, never spawned by the current ruleset
    Shrub,
}

impl EntityKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::Robot => "robot",
            EntityKind::Obstacle => "obstacle",
            EntityKind::Junk => "junk",
            EntityKind::Shrub => "shrub",
        }
    }
}

/// A single occupant of the grid
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entity {
    pub position: Position,
    pub kind: EntityKind,
}

impl Entity {
    pub fn new(position: Position, kind: EntityKind) -> Self {
        Self { position, kind }
    }

    pub fn robot(position: Position) -> Self {
        Self::new(position, EntityKind::Robot)
    }

    pub fn obstacle(position: Position) -> Self {
        Self::new(position, EntityKind::Obstacle)
    }

    pub fn junk(position: Position) -> Self {
        Self::new(position, EntityKind::Junk)
    }

    pub fn is_robot(&self) -> bool {
        self.kind == EntityKind::Robot
    }
}

/// Board generation parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Difficulty {
    pub robot_count: usize,
    pub obstacle_count: usize,
    /// Minimum Euclidean distance between a new robot and every earlier
    /// occupant (player and robots). 0 disables the check.
    pub min_spawn_dist: i32,
}

impl Default for Difficulty {
    fn default() -> Self {
        Self {
            robot_count: BASE_ROBOTS,
            obstacle_count: BASE_OBSTACLES,
            min_spawn_dist: BASE_MIN_SPAWN_DIST,
        }
    }
}

impl Difficulty {
    /// Robots that rejection sampling is guaranteed to place on a
    /// `width` x `height` board.
    ///
    /// Every placed occupant rules out at most `exclusion_cells` cells, so as
    /// long as the occupants placed so far rule out fewer cells than the
    /// board holds, a free cell exists and sampling terminates.
    pub fn robot_capacity(&self, width: i32, height: i32) -> usize {
        let cells = cell_count(width, height);
        if cells == 0 {
            return 0;
        }
        (cells - 1) / spawn::exclusion_cells(self.min_spawn_dist)
    }

    /// Whether board generation is guaranteed to terminate
    pub fn fits(&self, width: i32, height: i32) -> bool {
        let cells = cell_count(width, height);
        self.robot_count <= self.robot_capacity(width, height)
            && 1 + self.robot_count + self.obstacle_count <= cells
    }

    /// Shrink the spawn distance (not below `MIN_SPAWN_DIST_FLOOR`), then clamp
    /// counts, until the board is guaranteed to hold everything
    pub fn fit_to(self, width: i32, height: i32) -> Self {
        let cells = cell_count(width, height);
        let mut fitted = self;
        while fitted.robot_count > fitted.robot_capacity(width, height)
            && fitted.min_spawn_dist > MIN_SPAWN_DIST_FLOOR
        {
            fitted.min_spawn_dist -= 1;
        }

        let robot_count = fitted
            .robot_count
            .min(fitted.robot_capacity(width, height));
        let obstacle_count = self
            .obstacle_count
            .min(cells.saturating_sub(1 + robot_count));
        Self {
            robot_count,
            obstacle_count,
            min_spawn_dist: fitted.min_spawn_dist,
        }
    }
}

fn cell_count(width: i32, height: i32) -> usize {
    (width.max(0) as usize) * (height.max(0) as usize)
}

/// Remaining tool charges
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolStock {
    pub teleports: u32,
    pub emps: u32,
    pub blasters: u32,
}

impl Default for ToolStock {
    fn default() -> Self {
        Self {
            teleports: START_TELEPORTS,
            emps: START_EMPS,
            blasters: START_BLASTERS,
        }
    }
}

impl ToolStock {
    /// Refill granted when a level is cleared
    pub fn grant_level_bonus(&mut self) {
        self.teleports += LEVEL_TELEPORT_BONUS;
        self.emps += LEVEL_EMP_BONUS;
        self.blasters += LEVEL_BLASTER_BONUS;
    }
}

/// Blaster sub-state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum BlasterState {
    #[default]
    Idle,
    /// Armed and aiming; the 3x3 zone around `target` is always in bounds
    Targeting { target: Position },
}

/// Why the run ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameOverCause {
    /// Player walked into an occupied cell
    Collided(EntityKind),
    /// A robot reached the player
    Caught,
    /// Player stood inside their own blast zone
    SelfDestruct,
}

/// Current phase of gameplay
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum GamePhase {
    #[default]
    Playing,
    GameOver(GameOverCause),
}

/// Errors from setting up a new game
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SetupError {
    #[error("arena must be at least 3x3, got {width}x{height}")]
    ArenaTooSmall { width: i32, height: i32 },
    #[error(
        "{robots} robots and {obstacles} obstacles (spawn distance {min_spawn_dist}) \
         do not fit a {width}x{height} arena"
    )]
    Unsatisfiable {
        width: i32,
        height: i32,
        robots: usize,
        obstacles: usize,
        min_spawn_dist: i32,
    },
}

/// Complete arena state
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameState {
    /// Arena size, fixed for the whole game
    pub width: i32,
    pub height: i32,
    pub player: Position,
    /// Unordered, but survivors keep their relative order across turns
    pub entities: Vec<Entity>,
    pub phase: GamePhase,
    /// Signed: teleport penalties can dip below zero
    pub score: i64,
    /// Current level (1-based)
    pub level: u32,
    /// Robots destroyed since the last level advance
    pub consecutive_kills: u32,
    pub tools: ToolStock,
    /// Upcoming turns in which robots stay frozen
    pub emp_turns_left: u32,
    pub blaster: BlasterState,
}

impl GameState {
    /// Create a fresh level-1 game with the player centered
    pub fn new<S: CellSampler + ?Sized>(
        width: i32,
        height: i32,
        difficulty: Difficulty,
        sampler: &mut S,
    ) -> Result<Self, SetupError> {
        if width < 3 || height < 3 {
            return Err(SetupError::ArenaTooSmall { width, height });
        }
        if !difficulty.fits(width, height) {
            return Err(SetupError::Unsatisfiable {
                width,
                height,
                robots: difficulty.robot_count,
                obstacles: difficulty.obstacle_count,
                min_spawn_dist: difficulty.min_spawn_dist,
            });
        }

        let (player, entities) = spawn::generate_board(width, height, &difficulty, sampler);
        log::info!(
            "New {}x{} arena: {} robots, {} obstacles",
            width,
            height,
            difficulty.robot_count,
            difficulty.obstacle_count
        );

        Ok(Self::from_parts(width, height, player, entities))
    }

    /// Build a level-1 state around a hand-placed board
    pub fn from_parts(width: i32, height: i32, player: Position, entities: Vec<Entity>) -> Self {
        Self {
            width,
            height,
            player,
            entities,
            phase: GamePhase::Playing,
            score: 0,
            level: 1,
            consecutive_kills: 0,
            tools: ToolStock::default(),
            emp_turns_left: 0,
            blaster: BlasterState::Idle,
        }
    }

    pub fn center(&self) -> Position {
        IVec2::new(self.width / 2, self.height / 2)
    }

    pub fn in_bounds(&self, pos: Position) -> bool {
        pos.x >= 0 && pos.x < self.width && pos.y >= 0 && pos.y < self.height
    }

    pub fn is_game_over(&self) -> bool {
        matches!(self.phase, GamePhase::GameOver(_))
    }

    pub fn game_over_cause(&self) -> Option<GameOverCause> {
        match self.phase {
            GamePhase::GameOver(cause) => Some(cause),
            GamePhase::Playing => None,
        }
    }

    pub fn is_self_destruct(&self) -> bool {
        self.phase == GamePhase::GameOver(GameOverCause::SelfDestruct)
    }

    pub fn is_targeting(&self) -> bool {
        matches!(self.blaster, BlasterState::Targeting { .. })
    }

    pub fn blaster_target(&self) -> Option<Position> {
        match self.blaster {
            BlasterState::Targeting { target } => Some(target),
            BlasterState::Idle => None,
        }
    }

    /// First entity at `pos`, if any
    pub fn entity_at(&self, pos: Position) -> Option<&Entity> {
        self.entities.iter().find(|e| e.position == pos)
    }

    pub fn robots(&self) -> impl Iterator<Item = &Entity> {
        self.entities.iter().filter(|e| e.is_robot())
    }

    pub fn robot_count(&self) -> usize {
        self.robots().count()
    }

    /// Score multiplier for the current kill streak
    pub fn multiplier(&self) -> u32 {
        1 + self.consecutive_kills / KILLS_PER_MULTIPLIER
    }

    pub(crate) fn end_game(&mut self, cause: GameOverCause) {
        log::info!(
            "Game over ({:?}) at level {} with score {}",
            cause,
            self.level,
            self.score
        );
        self.phase = GamePhase::GameOver(cause);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    #[test]
    fn test_new_game_layout() {
        let mut rng = Pcg32::seed_from_u64(7);
        let state = GameState::new(40, 20, Difficulty::default(), &mut rng).unwrap();

        assert_eq!(state.player, IVec2::new(20, 10));
        assert_eq!(state.robot_count(), BASE_ROBOTS);
        assert_eq!(state.entities.len(), BASE_ROBOTS + BASE_OBSTACLES);
        assert_eq!(state.level, 1);
        assert_eq!(state.tools, ToolStock::default());
        assert_eq!(state.phase, GamePhase::Playing);
        assert!(state.entity_at(state.player).is_none());
        assert!(state.entities.iter().all(|e| state.in_bounds(e.position)));
    }

    #[test]
    fn test_new_game_rejects_tiny_arena() {
        let mut rng = Pcg32::seed_from_u64(1);
        let err = GameState::new(2, 10, Difficulty::default(), &mut rng).unwrap_err();
        assert_eq!(err, SetupError::ArenaTooSmall { width: 2, height: 10 });
    }

    #[test]
    fn test_new_game_rejects_overcrowded_arena() {
        let mut rng = Pcg32::seed_from_u64(1);
        let difficulty = Difficulty {
            robot_count: 30,
            obstacle_count: 0,
            min_spawn_dist: 5,
        };
        let err = GameState::new(10, 10, difficulty, &mut rng).unwrap_err();
        assert!(matches!(err, SetupError::Unsatisfiable { robots: 30, .. }));
    }

    #[test]
    fn test_difficulty_capacity() {
        // No spacing: every cell but the player's is usable
        let open = Difficulty {
            robot_count: 8,
            obstacle_count: 0,
            min_spawn_dist: 0,
        };
        assert_eq!(open.robot_capacity(3, 3), 8);
        assert!(open.fits(3, 3));

        let crowded = Difficulty {
            robot_count: 8,
            obstacle_count: 1,
            min_spawn_dist: 0,
        };
        assert!(!crowded.fits(3, 3));
        let fitted = crowded.fit_to(3, 3);
        assert_eq!(fitted.robot_count, 8);
        assert_eq!(fitted.obstacle_count, 0);
        assert!(fitted.fits(3, 3));
    }

    #[test]
    fn test_fit_to_shrinks_spacing_before_counts() {
        // 38x19 is the arena of an 80x24 terminal
        let level_two = Difficulty {
            robot_count: 12,
            obstacle_count: 18,
            min_spawn_dist: 5,
        };
        assert!(!level_two.fits(38, 19));

        let fitted = level_two.fit_to(38, 19);
        assert_eq!(fitted.robot_count, 12);
        assert_eq!(fitted.obstacle_count, 18);
        assert_eq!(fitted.min_spawn_dist, 4);
        assert!(fitted.fits(38, 19));
    }

    #[test]
    fn test_direction_from_delta() {
        assert_eq!(Direction::from_delta(1, 0), Some(Direction::Right));
        assert_eq!(Direction::from_delta(0, -1), Some(Direction::Up));
        assert_eq!(Direction::from_delta(1, 1), None);
        assert_eq!(Direction::from_delta(0, 0), None);
        for dir in Direction::ALL {
            let d = dir.delta();
            assert_eq!(Direction::from_delta(d.x, d.y), Some(dir));
        }
    }

    #[test]
    fn test_multiplier_steps() {
        let mut state = GameState::from_parts(10, 10, IVec2::new(5, 5), Vec::new());
        assert_eq!(state.multiplier(), 1);
        state.consecutive_kills = 4;
        assert_eq!(state.multiplier(), 1);
        state.consecutive_kills = 5;
        assert_eq!(state.multiplier(), 2);
        state.consecutive_kills = 14;
        assert_eq!(state.multiplier(), 3);
    }
}
