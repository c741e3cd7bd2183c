//! Turn resolution
//!
//! One player step drives one robot step followed by collision resolution.
//! Processing order:
//!   1. Player move (walls are no-ops, occupied cells are lethal)
//!   2. Robot movement (skipped while an EMP is active)
//!   3. Collision resolution (catch check, merges into junk, scoring)
//!   4. Level advance when no robots remain

use std::collections::HashMap;

use super::event::GameEvent;
use super::spawn::{CellSampler, difficulty_for_level, generate_board};
use super::state::{
    BlasterState, Direction, Entity, EntityKind, GameOverCause, GameState, Position,
};
use crate::consts::*;

/// Step the player one cell, then run the robots' half of the turn.
///
/// Out-of-bounds steps are ignored without advancing the turn. Stepping onto
/// any occupied cell ends the game with the player left where they stood.
pub fn move_player<S: CellSampler + ?Sized>(
    state: &mut GameState,
    direction: Direction,
    sampler: &mut S,
    events: &mut Vec<GameEvent>,
) {
    if state.is_game_over() {
        return;
    }

    let target = state.player + direction.delta();
    if !state.in_bounds(target) {
        return;
    }

    if let Some(kind) = state.entity_at(target).map(|e| e.kind) {
        end_game(state, GameOverCause::Collided(kind), events);
        return;
    }

    state.player = target;
    events.push(GameEvent::PlayerMoved { to: target });

    move_robots(state, events);
    resolve_collisions(state, sampler, events);
}

/// Greedy chase: every robot steps one cell (diagonals allowed) toward the
/// player.
///
/// Robots are updated in collection order and each one sees the current,
/// partially updated collection, so a robot wrecked earlier in the pass is
/// already junk for the robots after it.
pub fn move_robots(state: &mut GameState, events: &mut Vec<GameEvent>) {
    if state.emp_turns_left > 0 {
        state.emp_turns_left -= 1;
        events.push(GameEvent::RobotsFrozen {
            turns_left: state.emp_turns_left,
        });
        return;
    }

    let player = state.player;
    for i in 0..state.entities.len() {
        if !state.entities[i].is_robot() {
            continue;
        }

        let from = state.entities[i].position;
        let to = from + (player - from).signum();
        if !state.in_bounds(to) {
            continue;
        }

        let blocker = state
            .entities
            .iter()
            .find(|e| {
                e.position == to && matches!(e.kind, EntityKind::Obstacle | EntityKind::Junk)
            })
            .map(|e| e.kind);

        match blocker {
            Some(EntityKind::Obstacle) => {}
            Some(EntityKind::Junk) => {
                state.entities[i].kind = EntityKind::Junk;
                events.push(GameEvent::RobotWrecked { at: from });
            }
            _ => state.entities[i].position = to,
        }
    }
}

/// Resolve robot pile-ups after a movement step.
///
/// A robot on the player's cell ends the game before anything merges. Every
/// cell holding two or more robots becomes a single junk pile; groups are
/// scored in order of first appearance so the streak multiplier compounds
/// deterministically.
pub fn resolve_collisions<S: CellSampler + ?Sized>(
    state: &mut GameState,
    sampler: &mut S,
    events: &mut Vec<GameEvent>,
) {
    if state.robots().any(|e| e.position == state.player) {
        end_game(state, GameOverCause::Caught, events);
        return;
    }

    let mut groups: Vec<(Position, Vec<usize>)> = Vec::new();
    let mut group_index: HashMap<Position, usize> = HashMap::new();

    for (i, entity) in state.entities.iter().enumerate() {
        if !entity.is_robot() {
            continue;
        }
        match group_index.get(&entity.position) {
            Some(&g) => groups[g].1.push(i),
            None => {
                group_index.insert(entity.position, groups.len());
                groups.push((entity.position, vec![i]));
            }
        }
    }

    let mut doomed = vec![false; state.entities.len()];
    let mut piles = Vec::new();
    for (at, members) in groups.into_iter().filter(|(_, m)| m.len() > 1) {
        for &i in &members {
            doomed[i] = true;
        }
        let count = members.len() as u32;
        let points = award_kills(state, count);
        log::debug!(
            "{} robots merged at ({}, {}) for {} points",
            count,
            at.x,
            at.y,
            points
        );
        events.push(GameEvent::RobotsMerged { at, count, points });
        piles.push(Entity::junk(at));
    }

    if !piles.is_empty() {
        let mut index = 0;
        state.entities.retain(|_| {
            let keep = !doomed[index];
            index += 1;
            keep
        });
        state.entities.extend(piles);
    }

    if state.robot_count() == 0 {
        advance_level(state, sampler, events);
    }
}

/// Add `kills` to the streak and score them with the updated multiplier
pub(crate) fn award_kills(state: &mut GameState, kills: u32) -> i64 {
    state.consecutive_kills += kills;
    let points = POINTS_PER_KILL * kills as i64 * state.multiplier() as i64;
    state.score += points;
    points
}

/// Regenerate a harder board, keeping score and adding to the tool stock
pub fn advance_level<S: CellSampler + ?Sized>(
    state: &mut GameState,
    sampler: &mut S,
    events: &mut Vec<GameEvent>,
) {
    state.level += 1;

    let scaled = difficulty_for_level(state.level);
    let difficulty = scaled.fit_to(state.width, state.height);
    if difficulty != scaled {
        log::warn!(
            "Level {} difficulty {:?} does not fit a {}x{} arena, using {:?}",
            state.level,
            scaled,
            state.width,
            state.height,
            difficulty
        );
    }

    let (player, entities) = generate_board(state.width, state.height, &difficulty, sampler);
    state.player = player;
    state.entities = entities;
    state.emp_turns_left = 0;
    state.blaster = BlasterState::Idle;
    state.tools.grant_level_bonus();
    state.score += LEVEL_CLEAR_BONUS;
    state.consecutive_kills = 0;

    log::info!(
        "Level {} reached: {} robots, score {}",
        state.level,
        difficulty.robot_count,
        state.score
    );
    events.push(GameEvent::LevelAdvanced { level: state.level });
}

pub(crate) fn end_game(
    state: &mut GameState,
    cause: GameOverCause,
    events: &mut Vec<GameEvent>,
) {
    state.end_game(cause);
    events.push(GameEvent::GameOver {
        cause,
        level: state.level,
        score: state.score,
    });
}
