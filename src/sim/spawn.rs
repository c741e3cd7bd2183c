//! Board generation
//!
//! Rejection sampling over uniformly random cells. There is no attempt cap
//! here: callers validate counts with `Difficulty::fits`/`fit_to` first,
//! otherwise generation may never finish.

use glam::IVec2;
use rand::Rng;

use super::state::{Difficulty, Entity, Position};
use crate::consts::*;

/// Source of uniformly random arena cells
pub trait CellSampler {
    /// Draw a cell in `[0, width) x [0, height)`
    fn sample_cell(&mut self, width: i32, height: i32) -> Position;
}

impl<R: Rng> CellSampler for R {
    fn sample_cell(&mut self, width: i32, height: i32) -> Position {
        IVec2::new(self.random_range(0..width), self.random_range(0..height))
    }
}

/// Number of cells a single occupant rules out for a robot spawned with
/// minimum distance `min_dist` (its own cell included)
pub fn exclusion_cells(min_dist: i32) -> usize {
    if min_dist <= 0 {
        return 1;
    }
    let min_dist_sq = min_dist * min_dist;
    let mut count = 0;
    for dy in -min_dist..=min_dist {
        for dx in -min_dist..=min_dist {
            if dx * dx + dy * dy < min_dist_sq {
                count += 1;
            }
        }
    }
    count
}

fn far_enough(pos: Position, others: &[Position], min_dist: i32) -> bool {
    let min_dist_sq = min_dist * min_dist;
    others
        .iter()
        .all(|&p| (pos - p).length_squared() >= min_dist_sq)
}

/// Place `count` unique cells that avoid `occupied`.
///
/// With `min_dist > 0` every new cell must also be at least `min_dist` away
/// (squared comparison) from `occupied` and from the cells already placed in
/// this batch.
pub fn generate_positions<S: CellSampler + ?Sized>(
    width: i32,
    height: i32,
    count: usize,
    min_dist: i32,
    occupied: &[Position],
    sampler: &mut S,
) -> Vec<Position> {
    let mut positions: Vec<Position> = Vec::with_capacity(count);

    while positions.len() < count {
        let pos = sampler.sample_cell(width, height);

        if occupied.contains(&pos) || positions.contains(&pos) {
            continue;
        }

        if min_dist > 0
            && !(far_enough(pos, occupied, min_dist) && far_enough(pos, &positions, min_dist))
        {
            continue;
        }

        positions.push(pos);
    }

    positions
}

/// Generate a board: player centered, robots first (spaced out), then
/// obstacles anywhere free
pub fn generate_board<S: CellSampler + ?Sized>(
    width: i32,
    height: i32,
    difficulty: &Difficulty,
    sampler: &mut S,
) -> (Position, Vec<Entity>) {
    let player = IVec2::new(width / 2, height / 2);
    let mut occupied = vec![player];

    let robots = generate_positions(
        width,
        height,
        difficulty.robot_count,
        difficulty.min_spawn_dist,
        &occupied,
        sampler,
    );
    occupied.extend_from_slice(&robots);

    let obstacles = generate_positions(
        width,
        height,
        difficulty.obstacle_count,
        0,
        &occupied,
        sampler,
    );

    let mut entities = Vec::with_capacity(robots.len() + obstacles.len());
    entities.extend(robots.into_iter().map(Entity::robot));
    entities.extend(obstacles.into_iter().map(Entity::obstacle));

    log::debug!(
        "Generated board: {} robots, {} obstacles, spawn distance {}",
        difficulty.robot_count,
        difficulty.obstacle_count,
        difficulty.min_spawn_dist
    );

    (player, entities)
}

/// Difficulty for `level` (1-based) before any fitting to the arena
pub fn difficulty_for_level(level: u32) -> Difficulty {
    let step = level.saturating_sub(1);
    Difficulty {
        robot_count: BASE_ROBOTS + ROBOTS_PER_LEVEL * step as usize,
        obstacle_count: BASE_OBSTACLES + OBSTACLES_PER_LEVEL * step as usize,
        min_spawn_dist: (BASE_MIN_SPAWN_DIST - (step / 2) as i32).max(MIN_SPAWN_DIST_FLOOR),
    }
}
