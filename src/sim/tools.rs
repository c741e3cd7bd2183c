//! Limited-use tools: teleport, EMP and the two-phase blaster
//!
//! Every tool fails quietly: no charge, game over or no free cell returns
//! `false` and leaves the state untouched. None of them advance the turn.

use std::collections::HashSet;

use glam::IVec2;

use super::event::GameEvent;
use super::spawn::CellSampler;
use super::state::{BlasterState, Direction, GameOverCause, GameState, Position};
use super::turn::{advance_level, award_kills, end_game};
use crate::consts::*;

/// Jump to a random unoccupied cell for `TELEPORT_PENALTY` points.
///
/// Gives up after `TELEPORT_MAX_ATTEMPTS` draws without consuming a charge.
pub fn teleport<S: CellSampler + ?Sized>(
    state: &mut GameState,
    sampler: &mut S,
    events: &mut Vec<GameEvent>,
) -> bool {
    if state.is_game_over() || state.tools.teleports == 0 {
        return false;
    }

    let occupied: HashSet<Position> = state.entities.iter().map(|e| e.position).collect();
    for _ in 0..TELEPORT_MAX_ATTEMPTS {
        let cell = sampler.sample_cell(state.width, state.height);
        if occupied.contains(&cell) {
            continue;
        }

        state.player = cell;
        state.tools.teleports -= 1;
        state.score -= TELEPORT_PENALTY;
        events.push(GameEvent::Teleported { to: cell });
        return true;
    }

    log::debug!(
        "Teleport found no free cell in {} attempts",
        TELEPORT_MAX_ATTEMPTS
    );
    false
}

/// Freeze robots for the next `EMP_DURATION_TURNS` turns.
///
/// Re-using it while active restarts the countdown rather than extending it.
pub fn use_emp(state: &mut GameState, events: &mut Vec<GameEvent>) -> bool {
    if state.is_game_over() || state.tools.emps == 0 {
        return false;
    }

    state.tools.emps -= 1;
    state.emp_turns_left = EMP_DURATION_TURNS;
    events.push(GameEvent::EmpActivated {
        turns: EMP_DURATION_TURNS,
    });
    true
}

/// Arm the blaster, or fire it when already armed.
///
/// Arming aims at the player (pulled inside the margin that keeps the blast
/// zone on the board) and costs nothing. Firing spends a charge, destroys
/// every robot in the zone and scores them like a merge. A player inside the
/// zone self-destructs, which wins over a level clear.
pub fn toggle_blaster<S: CellSampler + ?Sized>(
    state: &mut GameState,
    sampler: &mut S,
    events: &mut Vec<GameEvent>,
) -> bool {
    if state.is_game_over() {
        return false;
    }

    match state.blaster {
        BlasterState::Idle => {
            if state.tools.blasters == 0 {
                return false;
            }
            let target = clamp_target(state, state.player);
            state.blaster = BlasterState::Targeting { target };
            events.push(GameEvent::BlasterArmed { target });
            true
        }
        BlasterState::Targeting { target } => {
            fire(state, target, sampler, events);
            true
        }
    }
}

fn fire<S: CellSampler + ?Sized>(
    state: &mut GameState,
    target: Position,
    sampler: &mut S,
    events: &mut Vec<GameEvent>,
) {
    state.blaster = BlasterState::Idle;
    state.tools.blasters = state.tools.blasters.saturating_sub(1);

    let before = state.entities.len();
    state
        .entities
        .retain(|e| !(e.is_robot() && in_blast_zone(target, e.position)));
    let kills = (before - state.entities.len()) as u32;

    let points = if kills > 0 { award_kills(state, kills) } else { 0 };
    log::debug!(
        "Blaster fired at ({}, {}): {} robots, {} points",
        target.x,
        target.y,
        kills,
        points
    );
    events.push(GameEvent::BlasterFired {
        target,
        kills,
        points,
    });

    if in_blast_zone(target, state.player) {
        end_game(state, GameOverCause::SelfDestruct, events);
        return;
    }

    if state.robot_count() == 0 {
        advance_level(state, sampler, events);
    }
}

/// Nudge the armed blaster's aim; steps that would push the blast zone off
/// the board are ignored
pub fn move_blaster_target(
    state: &mut GameState,
    direction: Direction,
    events: &mut Vec<GameEvent>,
) -> bool {
    let BlasterState::Targeting { target } = state.blaster else {
        return false;
    };

    let moved = target + direction.delta();
    if clamp_target(state, moved) != moved {
        return false;
    }

    state.blaster = BlasterState::Targeting { target: moved };
    events.push(GameEvent::BlasterTargetMoved { target: moved });
    true
}

/// Disarm without firing; no charge is spent
pub fn cancel_blaster(state: &mut GameState, events: &mut Vec<GameEvent>) -> bool {
    if !state.is_targeting() {
        return false;
    }
    state.blaster = BlasterState::Idle;
    events.push(GameEvent::BlasterCancelled);
    true
}

/// Inclusive square of half-width `BLAST_RADIUS` around `center`
pub fn in_blast_zone(center: Position, pos: Position) -> bool {
    (pos - center).abs().max_element() <= BLAST_RADIUS
}

fn clamp_target(state: &GameState, pos: Position) -> Position {
    pos.clamp(
        IVec2::splat(BLAST_RADIUS),
        IVec2::new(
            state.width - 1 - BLAST_RADIUS,
            state.height - 1 - BLAST_RADIUS,
        ),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::state::{Entity, ToolStock};
    use crate::sim::testing::{Fixed, Scripted};
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    fn at(x: i32, y: i32) -> Position {
        IVec2::new(x, y)
    }

    fn arena(player: Position, entities: Vec<Entity>) -> GameState {
        GameState::from_parts(20, 10, player, entities)
    }

    #[test]
    fn test_teleport_skips_occupied_cells() {
        let mut state = arena(at(5, 5), vec![Entity::robot(at(1, 1))]);
        let mut sampler = Scripted::new([at(1, 1), at(8, 2)]);
        let mut events = Vec::new();

        assert!(teleport(&mut state, &mut sampler, &mut events));

        assert_eq!(state.player, at(8, 2));
        assert_eq!(state.tools.teleports, START_TELEPORTS - 1);
        assert_eq!(state.score, -TELEPORT_PENALTY);
        assert_eq!(events, vec![GameEvent::Teleported { to: at(8, 2) }]);
        // Robots do not get a turn
        assert_eq!(state.entities, vec![Entity::robot(at(1, 1))]);
    }

    #[test]
    fn test_teleport_gives_up_after_max_attempts() {
        let mut state = arena(at(5, 5), vec![Entity::obstacle(at(3, 3))]);
        let mut sampler = Fixed::new(at(3, 3));
        let mut events = Vec::new();

        assert!(!teleport(&mut state, &mut sampler, &mut events));

        assert_eq!(sampler.draws, TELEPORT_MAX_ATTEMPTS);
        assert_eq!(state.tools.teleports, START_TELEPORTS);
        assert_eq!(state.player, at(5, 5));
        assert_eq!(state.score, 0);
        assert!(events.is_empty());
    }

    #[test]
    fn test_teleport_needs_a_charge() {
        let mut state = arena(at(5, 5), Vec::new());
        state.tools.teleports = 0;
        let mut sampler = Fixed::new(at(0, 0));
        let mut events = Vec::new();

        assert!(!teleport(&mut state, &mut sampler, &mut events));
        assert_eq!(sampler.draws, 0);
        assert_eq!(state.player, at(5, 5));
    }

    #[test]
    fn test_tools_disabled_after_game_over() {
        let mut state = arena(at(5, 5), vec![Entity::robot(at(0, 0))]);
        state.end_game(GameOverCause::Caught);
        let mut sampler = Fixed::new(at(9, 9));
        let mut events = Vec::new();

        assert!(!teleport(&mut state, &mut sampler, &mut events));
        assert!(!use_emp(&mut state, &mut events));
        assert!(!toggle_blaster(&mut state, &mut sampler, &mut events));
        assert_eq!(state.tools, ToolStock::default());
        assert!(events.is_empty());
    }

    #[test]
    fn test_emp_resets_rather_than_stacks() {
        let mut state = arena(at(5, 5), Vec::new());
        let mut events = Vec::new();

        assert!(use_emp(&mut state, &mut events));
        assert_eq!(state.emp_turns_left, EMP_DURATION_TURNS);
        state.emp_turns_left = 2;

        assert!(use_emp(&mut state, &mut events));
        assert_eq!(state.emp_turns_left, EMP_DURATION_TURNS);
        assert_eq!(state.tools.emps, START_EMPS - 2);

        state.tools.emps = 0;
        assert!(!use_emp(&mut state, &mut events));
        assert_eq!(events.len(), 2);
    }

    #[test]
    fn test_arm_aims_at_player() {
        let mut state = arena(at(5, 5), vec![Entity::robot(at(0, 0))]);
        let mut sampler = Fixed::new(at(0, 0));
        let mut events = Vec::new();

        assert!(toggle_blaster(&mut state, &mut sampler, &mut events));

        assert_eq!(state.blaster_target(), Some(at(5, 5)));
        assert_eq!(state.tools.blasters, START_BLASTERS);
        assert_eq!(events, vec![GameEvent::BlasterArmed { target: at(5, 5) }]);
    }

    #[test]
    fn test_arm_near_wall_keeps_zone_on_board() {
        let mut state = arena(at(0, 9), vec![Entity::robot(at(10, 0))]);
        let mut sampler = Fixed::new(at(0, 0));
        let mut events = Vec::new();

        assert!(toggle_blaster(&mut state, &mut sampler, &mut events));
        assert_eq!(state.blaster_target(), Some(at(1, 8)));
    }

    #[test]
    fn test_arm_needs_a_charge() {
        let mut state = arena(at(5, 5), vec![Entity::robot(at(0, 0))]);
        state.tools.blasters = 0;
        let mut sampler = Fixed::new(at(0, 0));
        let mut events = Vec::new();

        assert!(!toggle_blaster(&mut state, &mut sampler, &mut events));
        assert!(!state.is_targeting());
    }

    #[test]
    fn test_target_moves_within_margin() {
        let mut state = arena(at(2, 5), vec![Entity::robot(at(15, 5))]);
        state.blaster = BlasterState::Targeting { target: at(2, 5) };
        let mut events = Vec::new();

        assert!(move_blaster_target(&mut state, Direction::Left, &mut events));
        assert_eq!(state.blaster_target(), Some(at(1, 5)));

        // x = 0 would put part of the zone off the board
        assert!(!move_blaster_target(&mut state, Direction::Left, &mut events));
        assert_eq!(state.blaster_target(), Some(at(1, 5)));

        assert!(move_blaster_target(&mut state, Direction::Up, &mut events));
        assert_eq!(state.blaster_target(), Some(at(1, 4)));

        // Aiming is free: nothing else moves
        assert_eq!(state.player, at(2, 5));
        assert_eq!(state.entities, vec![Entity::robot(at(15, 5))]);
    }

    #[test]
    fn test_target_ignored_when_idle() {
        let mut state = arena(at(5, 5), Vec::new());
        let mut events = Vec::new();

        assert!(!move_blaster_target(&mut state, Direction::Up, &mut events));
        assert_eq!(state.blaster, BlasterState::Idle);
        assert!(events.is_empty());
    }

    #[test]
    fn test_fire_destroys_robots_in_zone() {
        let mut state = arena(
            at(2, 2),
            vec![
                Entity::robot(at(9, 5)),
                Entity::robot(at(10, 6)),
                Entity::obstacle(at(11, 4)),
                Entity::junk(at(9, 4)),
                Entity::robot(at(12, 5)),
            ],
        );
        state.consecutive_kills = 3;
        state.blaster = BlasterState::Targeting { target: at(10, 5) };
        let mut sampler = Fixed::new(at(0, 0));
        let mut events = Vec::new();

        assert!(toggle_blaster(&mut state, &mut sampler, &mut events));

        assert_eq!(state.blaster, BlasterState::Idle);
        assert_eq!(state.tools.blasters, START_BLASTERS - 1);
        assert_eq!(
            state.entities,
            vec![
                Entity::obstacle(at(11, 4)),
                Entity::junk(at(9, 4)),
                Entity::robot(at(12, 5)),
            ]
        );
        // 3 + 2 = 5 kills => 2x
        assert_eq!(state.consecutive_kills, 5);
        assert_eq!(state.score, 40);
        assert_eq!(
            events,
            vec![GameEvent::BlasterFired {
                target: at(10, 5),
                kills: 2,
                points: 40,
            }]
        );
    }

    #[test]
    fn test_fire_clearing_last_robot_advances_level() {
        let mut state = arena(at(2, 2), vec![Entity::robot(at(10, 5))]);
        state.blaster = BlasterState::Targeting { target: at(10, 5) };
        let mut rng = Pcg32::seed_from_u64(5);
        let mut events = Vec::new();

        assert!(toggle_blaster(&mut state, &mut rng, &mut events));

        assert_eq!(state.level, 2);
        assert_eq!(state.score, 10 + LEVEL_CLEAR_BONUS);
        assert_eq!(state.tools.blasters, START_BLASTERS - 1 + LEVEL_BLASTER_BONUS);
        assert!(!state.is_game_over());
        assert!(matches!(events.last(), Some(GameEvent::LevelAdvanced { level: 2 })));
    }

    #[test]
    fn test_self_destruct_beats_level_clear() {
        let mut state = arena(at(5, 5), vec![Entity::robot(at(6, 6))]);
        state.blaster = BlasterState::Targeting { target: at(6, 5) };
        let mut sampler = Fixed::new(at(0, 0));
        let mut events = Vec::new();

        assert!(toggle_blaster(&mut state, &mut sampler, &mut events));

        assert!(state.is_self_destruct());
        assert_eq!(state.robot_count(), 0);
        assert_eq!(state.level, 1);
        assert_eq!(sampler.draws, 0, "no new board was generated");
        assert_eq!(
            events.last(),
            Some(&GameEvent::GameOver {
                cause: GameOverCause::SelfDestruct,
                level: 1,
                score: 10,
            })
        );
    }

    #[test]
    fn test_cancel_spends_nothing() {
        let mut state = arena(at(5, 5), vec![Entity::robot(at(5, 6))]);
        state.blaster = BlasterState::Targeting { target: at(5, 5) };
        let mut events = Vec::new();

        assert!(cancel_blaster(&mut state, &mut events));
        assert_eq!(state.blaster, BlasterState::Idle);
        assert_eq!(state.tools.blasters, START_BLASTERS);
        assert_eq!(state.entities, vec![Entity::robot(at(5, 6))]);
        assert!(!state.is_game_over());

        assert!(!cancel_blaster(&mut state, &mut events));
        assert_eq!(events, vec![GameEvent::BlasterCancelled]);
    }

    #[test]
    fn test_blast_zone_is_three_by_three() {
        let center = at(4, 4);
        let inside = (3..=5)
            .flat_map(|y| (3..=5).map(move |x| at(x, y)))
            .all(|p| in_blast_zone(center, p));
        assert!(inside);
        assert!(!in_blast_zone(center, at(6, 4)));
        assert!(!in_blast_zone(center, at(2, 2)));
    }
}
